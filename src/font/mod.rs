use image::{Rgba, RgbaImage};
use serde::Serialize;
use std::path::Path;
use thiserror::Error;
use tracing::info;

use crate::backgrounds::{self, BackgroundError, BackgroundMeta};
use crate::filesystem::{self, FilesystemError};

#[derive(Debug, Error)]
pub enum FontError {
    #[error(transparent)]
    Background(#[from] BackgroundError),
    #[error(transparent)]
    Filesystem(#[from] FilesystemError),
    #[error("Failed to serialize font: {0}")]
    Json(#[from] serde_json::Error),
}

/// Space glyphs as `(advance, codepoint)`: negative shifts pull the cursor
/// left so a background can be drawn over the GUI title origin.
pub const SPACE_CHARS: [(i32, char); 16] = [
    (-1, '\u{F801}'),
    (-2, '\u{F802}'),
    (-4, '\u{F803}'),
    (-8, '\u{F804}'),
    (-16, '\u{F805}'),
    (-32, '\u{F806}'),
    (-64, '\u{F807}'),
    (-128, '\u{F808}'),
    (1, '\u{F811}'),
    (2, '\u{F812}'),
    (4, '\u{F813}'),
    (8, '\u{F814}'),
    (16, '\u{F815}'),
    (32, '\u{F816}'),
    (64, '\u{F817}'),
    (128, '\u{F818}'),
];

/// Vertical offset between a glyph's height and its ascent for backgrounds.
const BACKGROUND_ASCENT_OFFSET: i32 = 12;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FontProvider {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub file: String,
    pub ascent: i32,
    pub height: i32,
    pub chars: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FontDefinition {
    pub providers: Vec<FontProvider>,
}

/// Builds the `gui` font: space glyphs first, then one glyph per background.
pub fn build_font(namespace: &str, backgrounds: &[BackgroundMeta]) -> FontDefinition {
    let space_file = format!("{namespace}:font/space.png");
    let spaces = SPACE_CHARS.iter().map(|(_, c)| FontProvider {
        kind: "bitmap",
        file: space_file.clone(),
        ascent: 0,
        height: 1,
        chars: vec![c.to_string()],
    });

    let glyphs = backgrounds.iter().map(|bg| FontProvider {
        kind: "bitmap",
        file: bg.file.clone(),
        ascent: bg.height as i32 - BACKGROUND_ASCENT_OFFSET,
        height: bg.height as i32,
        chars: vec![char::from_u32(bg.codepoint).map(String::from).unwrap_or_default()],
    });

    FontDefinition {
        providers: spaces.chain(glyphs).collect(),
    }
}

/// Writes `font/gui.json` and the blank `textures/font/space.png` it uses.
pub fn write_font(pack_dir: &Path, namespace: &str, backgrounds: &[BackgroundMeta]) -> Result<(), FontError> {
    let ns_dir = pack_dir.join("assets").join(namespace);
    let font_dir = ns_dir.join("font");
    let space_dir = ns_dir.join("textures").join("font");
    filesystem::create_if_not_exists(&font_dir)?;
    filesystem::create_if_not_exists(&space_dir)?;

    let blank = RgbaImage::from_pixel(1, 1, Rgba([0, 0, 0, 0]));
    backgrounds::save_png(&blank, &space_dir.join("space.png"))?;

    let font = build_font(namespace, backgrounds);
    let json = serde_json::to_string_pretty(&font)?;
    filesystem::write_atomic(font_dir.join("gui.json"), json.as_bytes())?;

    info!(providers = font.providers.len(), "created font config");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backgrounds::BackgroundSource;
    use serde_json::Value;

    fn shop() -> BackgroundMeta {
        BackgroundMeta {
            name: "shop".into(),
            file: "bitterharvest:gui/shop.png".into(),
            width: 176,
            height: 222,
            codepoint: 0xE004,
            source: BackgroundSource::Generated,
        }
    }

    #[test]
    fn space_glyphs_precede_backgrounds() {
        let font = build_font("bitterharvest", &[shop()]);
        assert_eq!(font.providers.len(), SPACE_CHARS.len() + 1);

        let first = &font.providers[0];
        assert_eq!(first.file, "bitterharvest:font/space.png");
        assert_eq!(first.chars, vec!["\u{F801}".to_string()]);
        assert_eq!((first.ascent, first.height), (0, 1));

        let last = font.providers.last().unwrap();
        assert_eq!(last.file, "bitterharvest:gui/shop.png");
        assert_eq!(last.ascent, 210);
        assert_eq!(last.height, 222);
        assert_eq!(last.chars, vec!["\u{E004}".to_string()]);
    }

    #[test]
    fn serializes_with_type_field() {
        let font = build_font("ns", &[shop()]);
        let value: Value = serde_json::to_value(&font).unwrap();
        assert_eq!(value["providers"][0]["type"], "bitmap");
        assert_eq!(value["providers"][16]["chars"][0], "\u{E004}");
    }

    #[test]
    fn write_font_creates_json_and_space_texture() {
        let dir = tempfile::tempdir().unwrap();
        write_font(dir.path(), "bitterharvest", &[shop()]).unwrap();

        let json = std::fs::read_to_string(dir.path().join("assets/bitterharvest/font/gui.json")).unwrap();
        let value: Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["providers"].as_array().unwrap().len(), 17);

        let space = image::open(dir.path().join("assets/bitterharvest/textures/font/space.png")).unwrap();
        assert_eq!(space.to_rgba8().dimensions(), (1, 1));
    }
}
