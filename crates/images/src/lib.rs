pub mod card;
pub mod compose;
pub mod source;
pub mod svg;

use std::{io::Cursor, str::FromStr, sync::Arc};

use anyhow::{Context, Result};
use axum::{
    extract::{Path, State},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};
use image::{DynamicImage, ImageFormat};
use mime::Mime;
use ogimg_core::{AppError, config::Config, util::join_normalized};

pub use crate::compose::{ImageRequest, OgRenderer, default_logo_url};

pub fn image_mime_from_ext(ext: &str) -> Option<Mime> {
    ImageFormat::from_extension(ext).and_then(|format| Mime::from_str(format.to_mime_type()).ok())
}

pub fn encode_image(image: &DynamicImage, format: ImageFormat) -> Result<Vec<u8>> {
    let mut out = Cursor::new(Vec::new());
    image
        .write_to(&mut out, format)
        .with_context(|| format!("Failed to encode {}", format.to_mime_type()))?;
    Ok(out.into_inner())
}

/// Serve a file from `<assets_dir>/images`.
pub async fn get_asset(
    Path(filename): Path<String>,
    State(config): State<Arc<Config>>,
) -> Result<Response, AppError> {
    let path = join_normalized(config.render.assets_dir.join("images"), &filename);
    let Some(ext) = path.extension().and_then(|ext| ext.to_str()) else {
        return Err(AppError::Status(StatusCode::NOT_FOUND));
    };
    let content_type = match image_mime_from_ext(ext) {
        Some(mime) => mime,
        None if ext.eq_ignore_ascii_case("svg") => mime::IMAGE_SVG,
        None => return Err(AppError::Status(StatusCode::NOT_FOUND)),
    };
    let output = tokio::fs::read(&path).await.map_err(|_| AppError::Status(StatusCode::NOT_FOUND))?;
    Ok((
        [
            (header::CONTENT_TYPE, content_type.to_string()),
            #[cfg(not(debug_assertions))]
            (header::CACHE_CONTROL, "public, max-age=86400".to_string()),
            #[cfg(debug_assertions)]
            (header::CACHE_CONTROL, "no-cache".to_string()),
        ],
        output,
    )
        .into_response())
}
