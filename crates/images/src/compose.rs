use std::path::PathBuf;

use anyhow::{Context, Result, anyhow};
use image::ImageFormat;
use ogimg_core::{
    config::RenderConfig,
    util::{absolute_url, query_values},
};
use percent_encoding::percent_decode_str;
use url::Url;

use crate::{
    card::{self, Card, EmbeddedImage},
    encode_image,
    source::{self, IMAGES_PATH, ImageLoader},
    svg::Rasterizer,
};

pub const DEFAULT_TITLE: &str = "Default Title";
pub const DEFAULT_DESCRIPTION: &str = "Default Description";
pub const DEFAULT_LOGO: &str = "logo.png";

/// Plain dark canvas returned when the error image itself cannot be rendered.
pub static FALLBACK_PNG: &[u8] = include_bytes!("../../../assets/error.png");

/// URL of the bundled logo, absolute when the deployment URL is known.
pub fn default_logo_url(base_url: Option<&Url>) -> String {
    let path = format!("/{IMAGES_PATH}{DEFAULT_LOGO}");
    match base_url {
        Some(base) => absolute_url(base, &path),
        None => path,
    }
}

/// Parameters for a single image, built from the `/api/og` query string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageRequest {
    pub title: String,
    pub description: String,
    /// `None` renders the card without a logo.
    pub image_url: Option<String>,
}

impl ImageRequest {
    /// Parse a raw query string. Only the first occurrence of each parameter
    /// counts, and malformed input never fails: unknown or undecodable values
    /// fall back to the defaults.
    ///
    /// `imgUrl` is percent-decoded once more after the query decoding, so
    /// both encoded and double-encoded URLs are accepted. An absent or empty
    /// `imgUrl` selects the bundled logo.
    pub fn from_query(query: Option<&str>, default_logo_url: &str) -> Self {
        let [title, description, img_url] = query_values(query, ["title", "description", "imgUrl"]);
        let image_url = match img_url.filter(|url| !url.is_empty()) {
            None => default_logo_url.to_string(),
            Some(url) => {
                let decoded = percent_decode_str(&url).decode_utf8().map(|s| s.into_owned());
                decoded.unwrap_or(url)
            }
        };
        Self {
            title: title.filter(|s| !s.is_empty()).unwrap_or_else(|| DEFAULT_TITLE.to_string()),
            description: description
                .filter(|s| !s.is_empty())
                .unwrap_or_else(|| DEFAULT_DESCRIPTION.to_string()),
            image_url: Some(image_url),
        }
    }
}

/// Validate fetched image bytes and prepare them for embedding.
/// Raster formats are re-encoded as PNG; SVG is embedded as-is once it parses.
fn embed_image(data: Vec<u8>, rasterizer: &Rasterizer) -> Result<EmbeddedImage> {
    if image::guess_format(&data).is_ok() {
        let image = image::load_from_memory(&data).context("Failed to decode image")?;
        let data = encode_image(&image, ImageFormat::Png)?;
        return Ok(EmbeddedImage { mime: "image/png", data });
    }
    if data.trim_ascii_start().starts_with(b"<") {
        rasterizer.parse(&data).context("Failed to decode image")?;
        return Ok(EmbeddedImage { mime: "image/svg+xml", data });
    }
    Err(anyhow!("Unsupported image format"))
}

/// Composes and rasterizes Open Graph images.
#[derive(Clone)]
pub struct OgRenderer {
    rasterizer: Rasterizer,
    loader: ImageLoader,
    assets_dir: PathBuf,
    font_family: String,
}

impl OgRenderer {
    pub fn new(config: &RenderConfig) -> Result<Self> {
        Ok(Self {
            rasterizer: Rasterizer::new(config.fonts_dir.as_deref(), &config.font_family),
            loader: ImageLoader::new(config.fetch_timeout(), config.max_image_bytes)?,
            assets_dir: config.assets_dir.clone(),
            font_family: config.font_family.clone(),
        })
    }

    pub async fn render(&self, request: &ImageRequest, base_url: Option<&Url>) -> Result<Vec<u8>> {
        let logo = match request.image_url.as_deref() {
            Some(url) => {
                let source = source::resolve(url, base_url, &self.assets_dir)?;
                Some(self.loader.load(source).await?)
            }
            None => None,
        };
        let rasterizer = self.rasterizer.clone();
        let font_family = self.font_family.clone();
        let request = request.clone();
        tokio::task::spawn_blocking(move || {
            let logo = logo.map(|data| embed_image(data, &rasterizer)).transpose()?;
            let svg = card::card_svg(&Card {
                title: &request.title,
                description: &request.description,
                logo: logo.as_ref(),
                font_family: &font_family,
            });
            rasterizer.render_png(&svg)
        })
        .await
        .context("Render task failed")?
    }

    /// Render the error fallback. Never fails: if the SVG cannot be
    /// rasterized, [`FALLBACK_PNG`] is returned.
    pub async fn render_error(&self, message: &str) -> Vec<u8> {
        let rasterizer = self.rasterizer.clone();
        let svg = card::error_svg(message, &self.font_family);
        let result = tokio::task::spawn_blocking(move || rasterizer.render_png(&svg))
            .await
            .context("Render task failed")
            .and_then(|result| result);
        match result {
            Ok(data) => data,
            Err(e) => {
                tracing::error!("Failed to render error image: {:?}", e);
                FALLBACK_PNG.to_vec()
            }
        }
    }
}
