//! Card download flows
//!
//! Both download paths read the cached record, build the matching offscreen
//! scene, render, and deliver the PNG. The binary file is the preferred
//! artifact; if it cannot be written the flow falls back to a base64 data
//! URL so the user still gets the card.

use std::path::PathBuf;
use std::time::Duration;

use tracing::warn;

use card_render::{
    CardData, CardRenderer, CardTheme, data_url, direct_card, direct_card_stem, download_filename,
    full_card, full_card_stem, save_download,
};
use shared::MemberWithNames;

use super::{NextPage, Notice};
use crate::cache::RecordCache;
use crate::error::{FlowError, FlowResult};

/// Delay before returning to the landing page after a download.
pub const REDIRECT_DELAY: Duration = Duration::from_secs(2);

/// Which rendering path produced the card.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CardVariant {
    /// Full-resolution card page surface.
    Full,
    /// In-place download from the record page.
    Direct,
}

/// The delivered artifact.
#[derive(Debug)]
pub enum DownloadArtifact {
    File(PathBuf),
    DataUrl(String),
}

/// Result of a successful download.
#[derive(Debug)]
pub struct DownloadOutcome {
    pub artifact: DownloadArtifact,
    pub notice: Notice,
    pub next: NextPage,
}

/// Card download flow.
pub struct CardDownloader {
    cache: RecordCache,
    renderer: CardRenderer,
    theme: CardTheme,
    download_dir: PathBuf,
}

impl CardDownloader {
    pub fn new(
        cache: RecordCache,
        renderer: CardRenderer,
        theme: CardTheme,
        download_dir: PathBuf,
    ) -> Self {
        Self { cache, renderer, theme, download_dir }
    }

    /// Render and deliver the card for the cached record.
    ///
    /// Fails with [`FlowError::MissingRecord`] when no record is cached;
    /// render failures propagate with their message and leave the user on
    /// the current page.
    pub async fn download(&self, variant: CardVariant) -> FlowResult<DownloadOutcome> {
        let record = self.cache.load()?.ok_or(FlowError::MissingRecord)?;
        let data = card_data(&record);

        let (scene, stem) = match variant {
            CardVariant::Full => (full_card(&data, &self.theme), full_card_stem(&data)),
            CardVariant::Direct => (direct_card(&data, &self.theme), direct_card_stem(&data)),
        };

        let rendered = self.renderer.render(scene).await?;
        let bytes = rendered.encode_png()?;
        let filename = download_filename(&self.theme.file_prefix, &stem);

        let artifact = match save_download(&self.download_dir, &filename, &bytes) {
            Ok(path) => DownloadArtifact::File(path),
            Err(e) => {
                warn!(error = %e, "file download failed, falling back to data URL");
                DownloadArtifact::DataUrl(data_url(&bytes))
            }
        };

        Ok(DownloadOutcome {
            artifact,
            notice: Notice::snackbar("Card downloaded successfully"),
            next: NextPage::Landing,
        })
    }
}

/// Project the cached record onto the card fields.
fn card_data(record: &MemberWithNames) -> CardData {
    CardData {
        member_no: record.id.map(|id| id.to_string()).unwrap_or_default(),
        civil_id: record.civil_id.clone(),
        name: record.name.clone(),
        area_name: record.area_name.clone().unwrap_or_default(),
        district_name: record.district_name.clone().unwrap_or_default(),
        mobile: record.mobile_number.clone(),
        blood_group: record.blood_group.clone().unwrap_or_default(),
        photo_url: record.photo_url.clone(),
        medical: record.medical,
    }
}
