use std::convert::Infallible;

use axum::{
    extract::{FromRequestParts, OptionalFromRequestParts, Request},
    http::{Extensions, HeaderValue, StatusCode, header::CONTENT_TYPE, request::Parts},
    middleware::Next,
    response::Response,
};
use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use rand::{TryRngCore, rngs::OsRng};

#[derive(Debug, Clone)]
pub struct Nonce(pub String);

impl Nonce {
    fn from_extensions(extensions: &Extensions) -> Option<Self> {
        extensions.get::<Nonce>().cloned()
    }
}

impl<S> FromRequestParts<S> for Nonce
where S: Send + Sync
{
    type Rejection = (StatusCode, &'static str);

    async fn from_request_parts(req: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Self::from_extensions(&req.extensions)
            .ok_or((StatusCode::INTERNAL_SERVER_ERROR, "Nonce not found"))
    }
}

impl<S> OptionalFromRequestParts<S> for Nonce
where S: Send + Sync
{
    type Rejection = Infallible;

    async fn from_request_parts(
        req: &mut Parts,
        _state: &S,
    ) -> Result<Option<Self>, Self::Rejection> {
        Ok(Self::from_extensions(&req.extensions))
    }
}

pub fn generate_nonce() -> String {
    let mut bytes = [0u8; 16];
    if let Err(e) = OsRng.try_fill_bytes(&mut bytes) {
        tracing::error!("Failed to generate nonce: {e}");
    }
    URL_SAFE_NO_PAD.encode(bytes)
}

pub async fn csp_middleware(mut req: Request, next: Next) -> Response {
    let nonce = generate_nonce();
    req.extensions_mut().insert(Nonce(nonce.clone()));
    let mut response = next.run(req).await;
    let content_type = response
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default();
    if content_type.starts_with("text/html") {
        let response_headers = response.headers_mut();
        let nonce_value = format!("'nonce-{nonce}'");
        let header = format!(
            "default-src 'none';base-uri 'none';form-action 'self';script-src {nonce_value};\
             style-src {nonce_value};img-src 'self' data:;font-src 'self';connect-src 'self'"
        );
        if let Ok(value) = HeaderValue::from_str(&header) {
            response_headers.insert("Content-Security-Policy", value);
        }
        response_headers
            .insert("Cross-Origin-Opener-Policy", HeaderValue::from_static("same-origin"));
        response_headers
            .insert("Referrer-Policy", HeaderValue::from_static("strict-origin-when-cross-origin"));
        response_headers.insert("X-Frame-Options", HeaderValue::from_static("DENY"));
    }
    let response_headers = response.headers_mut();
    response_headers.insert("X-Content-Type-Options", HeaderValue::from_static("nosniff"));
    response
}
