use std::path::PathBuf;

use axum::{
    Router,
    body::{Body, to_bytes},
    http::{Request, StatusCode, header},
    response::Response,
};
use ogimg_core::config::Config;
use ogimg_web::{AppState, app};
use tower::ServiceExt;
use url::Url;

fn config() -> Config {
    let mut config = Config::default();
    config.server.base_url = Some(Url::parse("https://og.example.com").unwrap());
    config.render.assets_dir = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../../assets");
    config.render.fetch_timeout_secs = 2;
    config
}

fn router(config: Config) -> Router { app(AppState::new(config).unwrap()) }

async fn get(router: Router, uri: &str) -> Response {
    let request = Request::builder().uri(uri).header(header::HOST, "localhost:3000");
    router.oneshot(request.body(Body::empty()).unwrap()).await.unwrap()
}

async fn body(response: Response) -> Vec<u8> {
    to_bytes(response.into_body(), usize::MAX).await.unwrap().to_vec()
}

fn header_value<'a>(response: &'a Response, name: header::HeaderName) -> &'a str {
    response.headers().get(name).and_then(|v| v.to_str().ok()).unwrap_or_default()
}

async fn assert_og_png(response: Response) {
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(header_value(&response, header::CONTENT_TYPE), "image/png");
    let image = image::load_from_memory(&body(response).await).unwrap();
    assert_eq!((image.width(), image.height()), (1200, 630));
}

#[tokio::test]
async fn og_defaults() {
    // Default logo is read from the bundled assets
    let response = get(router(config()), "/api/og").await;
    assert!(header_value(&response, header::CACHE_CONTROL).contains("immutable"));
    assert_og_png(response).await;
}

#[tokio::test]
async fn og_empty_img_url_uses_default_logo() {
    let response = get(router(config()), "/api/og?title=Hi&description=There&imgUrl=").await;
    assert!(header_value(&response, header::CACHE_CONTROL).contains("immutable"));
    let with_empty = body(response).await;
    let response = get(router(config()), "/api/og?title=Hi&description=There").await;
    assert_eq!(with_empty, body(response).await);
}

#[tokio::test]
async fn og_base_url_with_path() {
    let mut config = config();
    config.server.base_url = Some(Url::parse("https://og.example.com/app").unwrap());
    // The default logo resolves under the path prefix and is served from disk
    let response = get(router(config), "/api/og?title=Hi").await;
    assert!(header_value(&response, header::CACHE_CONTROL).contains("immutable"));
    assert_og_png(response).await;
}

#[tokio::test]
async fn og_unreachable_image() {
    let response = get(
        router(config()),
        "/api/og?title=Hi&description=There&imgUrl=http%3A%2F%2F127.0.0.1%3A9%2Flogo.png",
    )
    .await;
    assert_eq!(header_value(&response, header::CACHE_CONTROL), "no-store");
    assert_og_png(response).await;
}

#[tokio::test]
async fn og_error_fallback_is_dark() {
    let response = get(router(config()), "/api/og?imgUrl=ftp%3A%2F%2Fexample.com%2Fa.png").await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(header_value(&response, header::CACHE_CONTROL), "no-store");
    let image = image::load_from_memory(&body(response).await).unwrap().to_rgba8();
    assert_eq!(image.get_pixel(2, 2).0, [0x1a, 0x1a, 0x1a, 0xff]);
    let text = image.pixels().filter(|p| p.0[..3].iter().all(|&c| c >= 0xf0)).count();
    assert!(text > 1000, "expected rendered error text, found {text} white pixels");
}

#[tokio::test]
async fn og_missing_local_logo() {
    let mut config = config();
    config.render.assets_dir = PathBuf::from("does-not-exist");
    let response = get(router(config), "/api/og?title=Hi").await;
    assert_eq!(header_value(&response, header::CACHE_CONTROL), "no-store");
    assert_og_png(response).await;
}

#[tokio::test]
async fn og_derives_base_url_from_request() {
    let mut config = config();
    config.server.base_url = None;
    // Resolves to http://localhost:3000/images/logo.png, served from disk
    let response = get(router(config), "/api/og?title=Hi").await;
    assert!(header_value(&response, header::CACHE_CONTROL).contains("immutable"));
    assert_og_png(response).await;
}

#[tokio::test]
async fn images_served() {
    let response = get(router(config()), "/images/logo.png").await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(header_value(&response, header::CONTENT_TYPE), "image/png");
    assert_eq!(header_value(&response, header::X_CONTENT_TYPE_OPTIONS), "nosniff");
    let image = image::load_from_memory(&body(response).await).unwrap();
    assert_eq!((image.width(), image.height()), (200, 200));

    let response = get(router(config()), "/images/missing.png").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let response = get(router(config()), "/images/readme.txt").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn home_initial_preview() {
    let response = get(router(config()), "/").await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(header_value(&response, header::CONTENT_TYPE).starts_with("text/html"));
    let csp = header_value(&response, header::CONTENT_SECURITY_POLICY).to_string();
    assert!(csp.contains("script-src 'nonce-"));
    let html = String::from_utf8(body(response).await).unwrap();
    assert!(html.contains(
        "src=\"/api/og?title=Open+Graph+Img+Generator&amp;description=Create+beautiful+social+media+preview+Images+in+seconds&amp;imgUrl=https%3A%2F%2Fog.example.com%2Fimages%2Flogo.png\""
    ));
    assert!(html.contains("data-url=\"https://og.example.com/api/og?title=Open+Graph+Img+Generator"));
    assert!(!html.contains("class=\"error\""));
}

#[tokio::test]
async fn home_submitted_preview() {
    let response = get(router(config()), "/?title=Hi&description=There&imgUrl=").await;
    assert_eq!(response.status(), StatusCode::OK);
    let html = String::from_utf8(body(response).await).unwrap();
    assert!(html.contains(
        "src=\"/api/og?title=Hi&amp;description=There&amp;imgUrl=https%3A%2F%2Fog.example.com%2Fimages%2Flogo.png\""
    ));
    assert!(html.contains("value=\"Hi\""));
}

#[tokio::test]
async fn home_validation_errors() {
    let response = get(router(config()), "/?title=&description=&imgUrl=nope").await;
    assert_eq!(response.status(), StatusCode::OK);
    let html = String::from_utf8(body(response).await).unwrap();
    assert!(html.contains("Title is required"));
    assert!(html.contains("Description is required"));
    assert!(html.contains("Invalid URL"));
    // Falls back to the initial preview
    assert!(html.contains("src=\"/api/og?title=Open+Graph+Img+Generator"));
}

#[tokio::test]
async fn home_duplicate_keys() {
    let response = get(router(config()), "/?title=a&title=b&description=c").await;
    assert_eq!(response.status(), StatusCode::OK);
    let html = String::from_utf8(body(response).await).unwrap();
    assert!(html.contains("value=\"a\""));
    assert!(html.contains("src=\"/api/og?title=a&amp;description=c&amp;imgUrl="));
}
