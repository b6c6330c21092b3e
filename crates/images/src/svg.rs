use std::{path::Path, sync::Arc};

use anyhow::{Context, Result, anyhow};
use resvg::{
    tiny_skia::{Pixmap, Transform},
    usvg::{Options, Tree, fontdb},
};

/// Family of the fonts compiled into the binary.
pub const BUNDLED_FONT_FAMILY: &str = "DejaVu Sans";

const BUNDLED_FONTS: [&[u8]; 2] = [
    include_bytes!("../../../assets/fonts/DejaVuSans.ttf"),
    include_bytes!("../../../assets/fonts/DejaVuSans-Bold.ttf"),
];

/// Rasterizes SVG documents with a shared font database.
#[derive(Clone)]
pub struct Rasterizer {
    fontdb: Arc<fontdb::Database>,
    font_family: String,
}

impl Rasterizer {
    pub fn new(fonts_dir: Option<&Path>, font_family: &str) -> Self {
        let mut db = fontdb::Database::new();
        for font in BUNDLED_FONTS {
            db.load_font_data(font.to_vec());
        }
        db.load_system_fonts();
        if let Some(dir) = fonts_dir {
            db.load_fonts_dir(dir);
        }
        db.set_sans_serif_family(BUNDLED_FONT_FAMILY);
        tracing::info!("Loaded {} font faces", db.len());
        Self { fontdb: Arc::new(db), font_family: font_family.to_string() }
    }

    fn options(&self) -> Options<'static> {
        Options {
            fontdb: self.fontdb.clone(),
            font_family: self.font_family.clone(),
            ..Options::default()
        }
    }

    /// Parse an SVG document without rendering it.
    pub fn parse(&self, data: &[u8]) -> Result<Tree> {
        Tree::from_data(data, &self.options()).context("Failed to parse SVG")
    }

    pub fn render_png(&self, svg: &str) -> Result<Vec<u8>> {
        let tree = self.parse(svg.as_bytes())?;
        let size = tree.size().to_int_size();
        let mut pixmap = Pixmap::new(size.width(), size.height())
            .ok_or_else(|| anyhow!("Invalid canvas size {}x{}", size.width(), size.height()))?;
        resvg::render(&tree, Transform::identity(), &mut pixmap.as_mut());
        pixmap.encode_png().context("Failed to encode PNG")
    }
}
