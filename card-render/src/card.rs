//! Card builders
//!
//! Two scene variants with matching content fidelity: the full-resolution
//! card page surface and the compact direct-download surface. Text values
//! are upper-cased here so the compositor never formats anything.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::scene::{Badge, CardScene, ImageSlot, PhotoBox, TextRow};

/// Full-resolution card surface, in pixels.
pub const FULL_WIDTH: u32 = 1667;
pub const FULL_HEIGHT: u32 = 834;

/// Direct-download card surface (logical pixels) and composition scale.
pub const DIRECT_WIDTH: u32 = 400;
pub const DIRECT_HEIGHT: u32 = 210;
pub const DIRECT_SCALE: u32 = 2;

/// The member fields a card displays.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CardData {
    /// Display membership number.
    pub member_no: String,
    pub civil_id: String,
    pub name: String,
    pub area_name: String,
    pub district_name: String,
    pub mobile: String,
    pub blood_group: String,
    pub photo_url: Option<String>,
    pub medical: bool,
}

/// Visual theme: titles, asset locations, badge copy, filename prefix.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CardTheme {
    pub title: String,
    pub subtitle: String,
    /// Label of the membership-number row.
    pub number_label: String,
    /// Background artwork path.
    pub background: Option<PathBuf>,
    /// Photo shown when the record has none.
    pub placeholder_photo_url: Option<String>,
    /// Badge lines shown when the member is medically enrolled.
    pub badge_lines: Vec<String>,
    /// Download filename prefix.
    pub file_prefix: String,
}

impl Default for CardTheme {
    fn default() -> Self {
        Self {
            title: "MEMBERSHIP ASSOCIATION".to_string(),
            subtitle: "Membership Card".to_string(),
            number_label: "MEMBER NO.".to_string(),
            background: None,
            placeholder_photo_url: None,
            badge_lines: vec!["Medical: YES".to_string(), "Valid till: Dec 2026".to_string()],
            file_prefix: "ID_CARD".to_string(),
        }
    }
}

fn build_scene(data: &CardData, theme: &CardTheme, width: u32, height: u32, scale: u32) -> CardScene {
    let mut scene = CardScene::new(width, height, scale);
    scene.title = theme.title.clone();
    scene.subtitle = theme.subtitle.clone();

    if let Some(path) = &theme.background {
        scene.background = ImageSlot::path(path.clone());
    }

    scene.rows = vec![
        row(&theme.number_label, &data.member_no, true),
        row("NAME", &data.name, false),
        row("AREA", &data.area_name, false),
        row("MOBILE", &data.mobile, false),
        row("DISTRICT", &data.district_name, false),
        row("BLOOD", &data.blood_group, false),
    ];

    let photo_source = data
        .photo_url
        .clone()
        .or_else(|| theme.placeholder_photo_url.clone());
    scene.photo = PhotoBox {
        slot: photo_source.map(ImageSlot::url).unwrap_or_default(),
        ..Default::default()
    };

    if data.medical {
        scene.badge = Some(Badge {
            lines: theme.badge_lines.iter().map(|l| l.to_uppercase()).collect(),
            ..Default::default()
        });
    }

    scene.arrange();
    scene
}

fn row(label: &str, value: &str, emphasis: bool) -> TextRow {
    TextRow {
        label: label.to_string(),
        value: value.to_uppercase(),
        emphasis,
        ..Default::default()
    }
}

/// Full-resolution card scene (1667x834, composed at scale 1).
pub fn full_card(data: &CardData, theme: &CardTheme) -> CardScene {
    build_scene(data, theme, FULL_WIDTH, FULL_HEIGHT, 1)
}

/// Direct-download card scene (400x210 logical, composed at scale 2).
pub fn direct_card(data: &CardData, theme: &CardTheme) -> CardScene {
    build_scene(data, theme, DIRECT_WIDTH, DIRECT_HEIGHT, DIRECT_SCALE)
}

/// Filename stem for the full card: civil id, else name, else "member".
pub fn full_card_stem(data: &CardData) -> String {
    if !data.civil_id.is_empty() {
        data.civil_id.clone()
    } else if !data.name.is_empty() {
        data.name.clone()
    } else {
        "member".to_string()
    }
}

/// Filename stem for the direct card: the display membership number.
pub fn direct_card_stem(data: &CardData) -> String {
    if !data.member_no.is_empty() {
        data.member_no.clone()
    } else {
        full_card_stem(data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> CardData {
        CardData {
            member_no: "1042".into(),
            civil_id: "11223344".into(),
            name: "Askar Ali".into(),
            area_name: "East Side".into(),
            district_name: "North".into(),
            mobile: "99887766".into(),
            blood_group: "o+".into(),
            photo_url: Some("https://cdn.example/p.jpg".into()),
            medical: true,
        }
    }

    #[test]
    fn test_values_are_upper_cased() {
        let scene = direct_card(&sample(), &CardTheme::default());
        assert_eq!(scene.rows[1].value, "ASKAR ALI");
        assert_eq!(scene.rows[5].value, "O+");
    }

    #[test]
    fn test_badge_follows_medical_flag() {
        let theme = CardTheme::default();
        let mut data = sample();
        assert!(direct_card(&data, &theme).badge.is_some());
        data.medical = false;
        assert!(direct_card(&data, &theme).badge.is_none());
    }

    #[test]
    fn test_surface_dimensions() {
        let theme = CardTheme::default();
        let data = sample();
        assert_eq!(direct_card(&data, &theme).output_size(), (800, 420));
        assert_eq!(full_card(&data, &theme).output_size(), (1667, 834));
    }

    #[test]
    fn test_placeholder_photo_used_when_record_has_none() {
        let mut data = sample();
        data.photo_url = None;
        let theme = CardTheme {
            placeholder_photo_url: Some("https://cdn.example/placeholder.jpg".into()),
            ..Default::default()
        };
        let scene = direct_card(&data, &theme);
        assert_eq!(
            scene.photo.slot.source,
            Some(crate::ImageSource::Url("https://cdn.example/placeholder.jpg".into()))
        );
    }

    #[test]
    fn test_filename_stems() {
        let data = sample();
        assert_eq!(full_card_stem(&data), "11223344");
        assert_eq!(direct_card_stem(&data), "1042");

        let anon = CardData { name: "Rafi".into(), ..Default::default() };
        assert_eq!(full_card_stem(&anon), "Rafi");
        assert_eq!(full_card_stem(&CardData::default()), "member");
    }
}
