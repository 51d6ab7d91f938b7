use std::path::PathBuf;

use card_render::CardTheme;

/// Portal configuration.
///
/// # Environment variables
///
/// | Variable | Default | Purpose |
/// |----------|---------|---------|
/// | GATEWAY_URL | http://localhost:8000 | Remote data gateway base URL |
/// | GATEWAY_KEY | (empty) | Gateway API key (apikey + bearer) |
/// | MEMBERSHIP_TABLE | membership | Base table name |
/// | MEMBERSHIP_VIEW | member_with_area_district | Joined view name |
/// | PHOTO_BUCKET | profile | Storage bucket for member photos |
/// | DATA_DIR | ./data | Local cache directory |
/// | DOWNLOAD_DIR | ./downloads | Card download directory |
/// | CARD_BACKGROUND | (none) | Card background artwork path |
/// | CARD_FONT | ./assets/card-font.ttf | TTF used for card text |
/// | CARD_TITLE / CARD_SUBTITLE | see defaults | Card header copy |
/// | PLACEHOLDER_PHOTO_URL | (none) | Photo used when a record has none |
/// | POLL_INTERVAL_MS | 5000 | Status change-feed poll interval |
/// | REQUEST_TIMEOUT_S | 30 | Gateway request timeout |
/// | ENVIRONMENT | development | Runtime environment |
#[derive(Debug, Clone)]
pub struct Config {
    pub gateway_url: String,
    pub gateway_key: String,
    pub membership_table: String,
    pub membership_view: String,
    pub photo_bucket: String,
    pub data_dir: PathBuf,
    pub download_dir: PathBuf,
    pub card_background: Option<PathBuf>,
    pub card_font: PathBuf,
    pub card_title: String,
    pub card_subtitle: String,
    pub placeholder_photo_url: Option<String>,
    pub poll_interval_ms: u64,
    pub request_timeout_s: u64,
    pub environment: String,
}

impl Config {
    /// Load configuration from the environment, with defaults.
    pub fn from_env() -> Self {
        Self {
            gateway_url: std::env::var("GATEWAY_URL")
                .unwrap_or_else(|_| "http://localhost:8000".into()),
            gateway_key: std::env::var("GATEWAY_KEY").unwrap_or_default(),
            membership_table: std::env::var("MEMBERSHIP_TABLE")
                .unwrap_or_else(|_| "membership".into()),
            membership_view: std::env::var("MEMBERSHIP_VIEW")
                .unwrap_or_else(|_| "member_with_area_district".into()),
            photo_bucket: std::env::var("PHOTO_BUCKET").unwrap_or_else(|_| "profile".into()),
            data_dir: std::env::var("DATA_DIR").unwrap_or_else(|_| "./data".into()).into(),
            download_dir: std::env::var("DOWNLOAD_DIR")
                .unwrap_or_else(|_| "./downloads".into())
                .into(),
            card_background: std::env::var("CARD_BACKGROUND").ok().map(Into::into),
            card_font: std::env::var("CARD_FONT")
                .unwrap_or_else(|_| "./assets/card-font.ttf".into())
                .into(),
            card_title: std::env::var("CARD_TITLE")
                .unwrap_or_else(|_| "MEMBERSHIP ASSOCIATION".into()),
            card_subtitle: std::env::var("CARD_SUBTITLE")
                .unwrap_or_else(|_| "Membership Card".into()),
            placeholder_photo_url: std::env::var("PLACEHOLDER_PHOTO_URL").ok(),
            poll_interval_ms: std::env::var("POLL_INTERVAL_MS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(5000),
            request_timeout_s: std::env::var("REQUEST_TIMEOUT_S")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(30),
            environment: std::env::var("ENVIRONMENT").unwrap_or_else(|_| "development".into()),
        }
    }

    /// Card theme derived from this configuration.
    pub fn card_theme(&self) -> CardTheme {
        CardTheme {
            title: self.card_title.clone(),
            subtitle: self.card_subtitle.clone(),
            background: self.card_background.clone(),
            placeholder_photo_url: self.placeholder_photo_url.clone(),
            ..CardTheme::default()
        }
    }

    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::from_env()
    }
}
