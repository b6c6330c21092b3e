use axum::{Router, routing::get};

use crate::AppState;

mod common;
pub mod csp;
pub mod home;
pub mod og;

pub fn build_router() -> Router<AppState> {
    Router::new()
        .route("/", get(home::get_home))
        .route("/api/og", get(og::get_og))
        .route("/images/{filename}", get(ogimg_images::get_asset))
}
