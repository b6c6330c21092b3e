use std::sync::Arc;

use axum::{
    extract::{RawQuery, State},
    http::header,
    response::{IntoResponse, Response},
};
use ogimg_core::{BaseUrl, config::Config, util::truncate_chars};
use ogimg_images::{ImageRequest, OgRenderer, default_logo_url};

const MAX_ERROR_LEN: usize = 160;

/// `GET /api/og`: always answers 200 with a PNG, falling back to an error
/// image when composition fails.
pub async fn get_og(
    State(config): State<Arc<Config>>,
    State(renderer): State<Arc<OgRenderer>>,
    base_url: Option<BaseUrl>,
    RawQuery(query): RawQuery,
) -> Response {
    let base_url = base_url.map(|BaseUrl(url)| url);
    let default_logo = default_logo_url(base_url.as_ref());
    let request = ImageRequest::from_query(query.as_deref(), &default_logo);
    match renderer.render(&request, base_url.as_ref()).await {
        Ok(data) => (
            [
                (header::CONTENT_TYPE, "image/png"),
                (header::CACHE_CONTROL, "public, immutable, no-transform, max-age=31536000"),
            ],
            data,
        )
            .into_response(),
        Err(e) => {
            tracing::error!("Error generating image: {:?}", e);
            let message = error_message(&e, config.server.dev_mode);
            let data = renderer.render_error(&message).await;
            ([(header::CONTENT_TYPE, "image/png"), (header::CACHE_CONTROL, "no-store")], data)
                .into_response()
        }
    }
}

/// Text shown on the fallback image. Only the outermost context is shown
/// unless running in dev mode.
fn error_message(err: &anyhow::Error, dev_mode: bool) -> String {
    let message = if dev_mode { format!("{err:#}") } else { err.to_string() };
    let message = message.trim();
    if message.is_empty() {
        "Unknown Error".to_string()
    } else {
        truncate_chars(message, MAX_ERROR_LEN)
    }
}
