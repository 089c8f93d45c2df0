//! GUI background textures.
//!
//! Each background is a full-size chest GUI texture drawn through a font glyph,
//! so every entry carries the private-use codepoint that renders it.

use image::{ImageFormat, Rgba, RgbaImage};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{info, warn};

use crate::filesystem::{self, FilesystemError};

#[derive(Debug, Error)]
pub enum BackgroundError {
    #[error("image error for {path}: {source}")]
    Image {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
    #[error(transparent)]
    Filesystem(#[from] FilesystemError),
}

/// A GUI background the pack ships.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BackgroundDef {
    pub name: &'static str,
    pub width: u32,
    pub height: u32,
    pub base_color: [u8; 3],
    pub codepoint: u32,
}

pub const BACKGROUNDS: [BackgroundDef; 7] = [
    BackgroundDef { name: "pet_menu", width: 176, height: 222, base_color: [40, 40, 50], codepoint: 0xE000 },
    BackgroundDef { name: "all_pets", width: 176, height: 186, base_color: [30, 35, 45], codepoint: 0xE001 },
    BackgroundDef { name: "feed_selector", width: 176, height: 114, base_color: [50, 40, 40], codepoint: 0xE002 },
    BackgroundDef { name: "confirm_dialog", width: 176, height: 78, base_color: [60, 30, 30], codepoint: 0xE003 },
    BackgroundDef { name: "shop", width: 176, height: 222, base_color: [40, 50, 40], codepoint: 0xE004 },
    BackgroundDef { name: "default_small", width: 176, height: 114, base_color: [45, 45, 45], codepoint: 0xE005 },
    BackgroundDef { name: "default_large", width: 176, height: 222, base_color: [45, 45, 45], codepoint: 0xE006 },
];

/// Where a background texture came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackgroundSource {
    Custom,
    Generated,
}

/// What the font and codegen steps need to know about a written background.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackgroundMeta {
    pub name: String,
    /// Namespaced texture path, e.g. `bitterharvest:gui/shop.png`.
    pub file: String,
    pub width: u32,
    pub height: u32,
    pub codepoint: u32,
    pub source: BackgroundSource,
}

const PADDING: u32 = 4;
const INNER_PADDING: u32 = 6;
const GLOSS_ROWS: u32 = 20;

/// Draws the stand-in texture used when no custom art exists.
pub fn placeholder(def: &BackgroundDef) -> RgbaImage {
    let (w, h) = (def.width, def.height);
    let [r, g, b] = def.base_color;
    let mut img = RgbaImage::from_pixel(w, h, Rgba([0, 0, 0, 0]));

    fill_rect(&mut img, PADDING, PADDING, w - PADDING - 1, h - PADDING - 1, Rgba([r, g, b, 230]));

    let lift = |c: u8| c.saturating_add(30);
    outline_rect(
        &mut img,
        INNER_PADDING,
        INNER_PADDING,
        w - INNER_PADDING - 1,
        h - INNER_PADDING - 1,
        Rgba([lift(r), lift(g), lift(b), 200]),
    );

    let sink = |c: u8| c.saturating_sub(30);
    outline_rect(
        &mut img,
        PADDING,
        PADDING,
        w - PADDING - 1,
        h - PADDING - 1,
        Rgba([sink(r), sink(g), sink(b), 150]),
    );

    for row in 0..GLOSS_ROWS.min(h / 4) {
        let alpha = (40.0 * (1.0 - row as f64 / GLOSS_ROWS as f64)) as u8;
        let y = PADDING + 2 + row;
        for x in (PADDING + 2)..=(w - PADDING - 3) {
            img.put_pixel(x, y, Rgba([255, 255, 255, alpha]));
        }
    }

    img
}

/// Fills the inclusive rectangle `(x0, y0)..=(x1, y1)`.
fn fill_rect(img: &mut RgbaImage, x0: u32, y0: u32, x1: u32, y1: u32, color: Rgba<u8>) {
    for y in y0..=y1 {
        for x in x0..=x1 {
            img.put_pixel(x, y, color);
        }
    }
}

/// Draws a one pixel border on the inclusive rectangle `(x0, y0)..=(x1, y1)`.
fn outline_rect(img: &mut RgbaImage, x0: u32, y0: u32, x1: u32, y1: u32, color: Rgba<u8>) {
    for x in x0..=x1 {
        img.put_pixel(x, y0, color);
        img.put_pixel(x, y1, color);
    }
    for y in y0..=y1 {
        img.put_pixel(x0, y, color);
        img.put_pixel(x1, y, color);
    }
}

/// Returns `dir` if it exists and holds at least one `.png`.
pub fn usable_art_dir(dir: &Path) -> Option<&Path> {
    let entries = std::fs::read_dir(dir).ok()?;
    let pngs = entries
        .filter_map(Result::ok)
        .filter(|e| e.path().extension().is_some_and(|ext| ext.eq_ignore_ascii_case("png")))
        .count();
    if pngs == 0 {
        return None;
    }
    info!(dir = %dir.display(), count = pngs, "using custom art folder");
    Some(dir)
}

/// Writes every background into `assets/<namespace>/textures/gui/`, preferring
/// `<art_dir>/<name>.png` over a generated placeholder.
pub fn write_backgrounds(
    pack_dir: &Path,
    namespace: &str,
    art_dir: Option<&Path>,
) -> Result<Vec<BackgroundMeta>, BackgroundError> {
    let textures_dir = pack_dir.join("assets").join(namespace).join("textures").join("gui");
    filesystem::create_if_not_exists(&textures_dir)?;

    let mut metadata = Vec::with_capacity(BACKGROUNDS.len());
    for def in &BACKGROUNDS {
        let out_path = textures_dir.join(format!("{}.png", def.name));
        let custom_path = art_dir.map(|dir| dir.join(format!("{}.png", def.name)));

        let source = match custom_path.filter(|p| p.is_file()) {
            Some(custom) => {
                let img = image::open(&custom)
                    .map_err(|source| BackgroundError::Image { path: custom.clone(), source })?
                    .to_rgba8();
                if img.dimensions() != (def.width, def.height) {
                    warn!(
                        file = %custom.display(),
                        actual = ?img.dimensions(),
                        expected = ?(def.width, def.height),
                        "custom background has unexpected size"
                    );
                }
                save_png(&img, &out_path)?;
                info!(name = def.name, width = img.width(), height = img.height(), "custom background");
                BackgroundSource::Custom
            }
            None => {
                save_png(&placeholder(def), &out_path)?;
                info!(name = def.name, width = def.width, height = def.height, "generated background");
                BackgroundSource::Generated
            }
        };

        metadata.push(BackgroundMeta {
            name: def.name.to_string(),
            file: format!("{namespace}:gui/{}.png", def.name),
            width: def.width,
            height: def.height,
            codepoint: def.codepoint,
            source,
        });
    }

    Ok(metadata)
}

pub(crate) fn save_png(img: &RgbaImage, path: &Path) -> Result<(), BackgroundError> {
    img.save_with_format(path, ImageFormat::Png)
        .map_err(|source| BackgroundError::Image { path: path.to_path_buf(), source })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn def(name: &str) -> BackgroundDef {
        *BACKGROUNDS.iter().find(|d| d.name == name).unwrap()
    }

    #[test]
    fn codepoints_are_sequential_from_e000() {
        for (i, d) in BACKGROUNDS.iter().enumerate() {
            assert_eq!(d.codepoint, 0xE000 + i as u32);
        }
    }

    #[test]
    fn placeholder_has_transparent_margin_and_layered_body() {
        let d = def("confirm_dialog");
        let img = placeholder(&d);
        assert_eq!(img.dimensions(), (176, 78));

        assert_eq!(img.get_pixel(0, 0), &Rgba([0, 0, 0, 0]));
        assert_eq!(img.get_pixel(3, 40), &Rgba([0, 0, 0, 0]));
        // shadow border at the body edge
        assert_eq!(img.get_pixel(4, 40), &Rgba([30, 0, 0, 150]));
        // highlight border inside it
        assert_eq!(img.get_pixel(6, 40), &Rgba([90, 60, 60, 200]));
        // body fill
        assert_eq!(img.get_pixel(50, 60), &Rgba([60, 30, 30, 230]));
    }

    #[test]
    fn placeholder_gloss_fades_over_rows() {
        let img = placeholder(&def("pet_menu"));
        assert_eq!(img.get_pixel(40, 6), &Rgba([255, 255, 255, 40]));
        assert_eq!(img.get_pixel(40, 16), &Rgba([255, 255, 255, 20]));
        assert_eq!(img.get_pixel(40, 25), &Rgba([255, 255, 255, 2]));
        // past the gloss rows the body shows through
        assert_eq!(img.get_pixel(40, 26), &Rgba([40, 40, 50, 230]));
    }

    #[test]
    fn short_backgrounds_get_fewer_gloss_rows() {
        let img = placeholder(&def("confirm_dialog"));
        // 78 / 4 = 19 rows, the last at y = 6 + 18
        assert_eq!(img.get_pixel(40, 24).0[0], 255);
        assert_eq!(img.get_pixel(40, 25), &Rgba([60, 30, 30, 230]));
    }

    #[test]
    fn writes_generated_and_custom_backgrounds() {
        let pack = tempdir().unwrap();
        let art = tempdir().unwrap();
        let custom = RgbaImage::from_pixel(10, 10, Rgba([1, 2, 3, 255]));
        save_png(&custom, &art.path().join("shop.png")).unwrap();

        let meta = write_backgrounds(pack.path(), "bitterharvest", usable_art_dir(art.path())).unwrap();

        assert_eq!(meta.len(), BACKGROUNDS.len());
        let shop = meta.iter().find(|m| m.name == "shop").unwrap();
        assert_eq!(shop.source, BackgroundSource::Custom);
        assert_eq!(shop.file, "bitterharvest:gui/shop.png");
        assert_eq!(shop.height, 222);
        let pet = meta.iter().find(|m| m.name == "pet_menu").unwrap();
        assert_eq!(pet.source, BackgroundSource::Generated);

        let gui = pack.path().join("assets/bitterharvest/textures/gui");
        let written = image::open(gui.join("shop.png")).unwrap().to_rgba8();
        assert_eq!(written.dimensions(), (10, 10));
        assert!(gui.join("default_large.png").is_file());
    }

    #[test]
    fn art_dir_without_pngs_is_ignored() {
        let art = tempdir().unwrap();
        std::fs::write(art.path().join("notes.txt"), "todo").unwrap();
        assert!(usable_art_dir(art.path()).is_none());
        assert!(usable_art_dir(&art.path().join("missing")).is_none());
    }
}
