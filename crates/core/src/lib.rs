pub mod config;
pub mod util;

use std::{convert::Infallible, net::SocketAddr, sync::Arc};

use axum::{
    Extension,
    extract::{ConnectInfo, FromRef, FromRequestParts, OptionalFromRequestParts, OriginalUri},
    http::{StatusCode, Uri, header, request::Parts},
    response::{IntoResponse, Response},
};
use url::Url;

use crate::config::Config;

pub enum AppError {
    Status(StatusCode),
    Internal(anyhow::Error),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match self {
            Self::Status(status) if status == StatusCode::NOT_FOUND => {
                (status, "Not found").into_response()
            }
            Self::Status(status) => status.into_response(),
            Self::Internal(err) => {
                tracing::error!("{:?}", err);
                (StatusCode::INTERNAL_SERVER_ERROR, format!("Something went wrong: {}", err))
                    .into_response()
            }
        }
    }
}

impl<E: Into<anyhow::Error>> From<E> for AppError {
    fn from(err: E) -> Self { Self::Internal(err.into()) }
}

/// Extractor for the full URI of the request, including the scheme and authority.
/// Uses the `x-forwarded-proto` and `x-forwarded-host` headers if present.
pub struct FullUri(pub Uri);

impl<S> FromRequestParts<S> for FullUri
where S: Send + Sync
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let uri = <Extension<OriginalUri> as FromRequestParts<S>>::from_request_parts(parts, state)
            .await
            .map_or_else(|_| parts.uri.clone(), |Extension(OriginalUri(uri))| uri);
        let mut builder = Uri::builder();
        if let Some(scheme) =
            parts.headers.get("x-forwarded-proto").and_then(|value| value.to_str().ok())
        {
            builder = builder.scheme(scheme);
        } else if let Some(scheme) = uri.scheme().cloned() {
            builder = builder.scheme(scheme);
        } else {
            builder = builder.scheme("http");
        }
        if let Some(host) =
            parts.headers.get("x-forwarded-host").and_then(|value| value.to_str().ok())
        {
            builder = builder.authority(host);
        } else if let Some(host) =
            parts.headers.get(header::HOST).and_then(|value| value.to_str().ok())
        {
            builder = builder.authority(host);
        } else if let Some(authority) = uri.authority().cloned() {
            builder = builder.authority(authority);
        } else if let Ok(ConnectInfo(socket_addr)) =
            <ConnectInfo<SocketAddr> as FromRequestParts<S>>::from_request_parts(parts, state).await
        {
            builder = builder.authority(socket_addr.to_string());
        }
        if let Some(path_and_query) = uri.path_and_query().cloned() {
            builder = builder.path_and_query(path_and_query);
        }
        Ok(FullUri(builder.build().unwrap_or(uri)))
    }
}

/// Extractor for the public base URL of the deployment (scheme and authority).
/// Prefers `server.base_url` from the configuration, otherwise derives it
/// from the request via [`FullUri`].
#[derive(Debug, Clone)]
pub struct BaseUrl(pub Url);

impl BaseUrl {
    async fn resolve<S>(parts: &mut Parts, state: &S) -> Option<Self>
    where
        S: Send + Sync,
        Arc<Config>: FromRef<S>,
    {
        let config = Arc::<Config>::from_ref(state);
        if let Some(url) = &config.server.base_url {
            return Some(BaseUrl(url.clone()));
        }
        let Ok(FullUri(uri)) =
            <FullUri as FromRequestParts<S>>::from_request_parts(parts, state).await;
        let authority = uri.authority()?;
        let scheme = uri.scheme_str().unwrap_or("http");
        Url::parse(&format!("{scheme}://{authority}/")).ok().map(BaseUrl)
    }
}

impl<S> FromRequestParts<S> for BaseUrl
where
    S: Send + Sync,
    Arc<Config>: FromRef<S>,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        Self::resolve(parts, state).await.ok_or(AppError::Status(StatusCode::BAD_REQUEST))
    }
}

impl<S> OptionalFromRequestParts<S> for BaseUrl
where
    S: Send + Sync,
    Arc<Config>: FromRef<S>,
{
    type Rejection = Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &S,
    ) -> Result<Option<Self>, Self::Rejection> {
        Ok(Self::resolve(parts, state).await)
    }
}

#[cfg(test)]
mod tests {
    use axum::http::Request;

    use super::*;

    async fn base_url(config: Config, request: Request<()>) -> Option<Url> {
        let config = Arc::new(config);
        let (mut parts, _) = request.into_parts();
        <BaseUrl as OptionalFromRequestParts<_>>::from_request_parts(&mut parts, &config)
            .await
            .unwrap()
            .map(|BaseUrl(url)| url)
    }

    #[tokio::test]
    async fn test_base_url_from_config() {
        let mut config = Config::default();
        config.server.base_url = Some(Url::parse("https://og.example.com").unwrap());
        let request = Request::builder().uri("/api/og").header("host", "internal:3000");
        let url = base_url(config, request.body(()).unwrap()).await;
        assert_eq!(url.unwrap().as_str(), "https://og.example.com/");
    }

    #[tokio::test]
    async fn test_base_url_from_headers() {
        let request = Request::builder()
            .uri("/api/og?title=x")
            .header("host", "internal:3000")
            .header("x-forwarded-proto", "https")
            .header("x-forwarded-host", "og.example.com");
        let url = base_url(Config::default(), request.body(()).unwrap()).await;
        assert_eq!(url.unwrap().as_str(), "https://og.example.com/");

        let request = Request::builder().uri("/").header("host", "localhost:3000");
        let url = base_url(Config::default(), request.body(()).unwrap()).await;
        assert_eq!(url.unwrap().as_str(), "http://localhost:3000/");
    }

    #[tokio::test]
    async fn test_full_uri() {
        let request = Request::builder()
            .uri("/api/og?title=x")
            .header("host", "og.example.com")
            .header("x-forwarded-proto", "https")
            .body(())
            .unwrap();
        let (mut parts, _) = request.into_parts();
        let Ok(FullUri(uri)) =
            <FullUri as FromRequestParts<()>>::from_request_parts(&mut parts, &()).await;
        assert_eq!(uri.to_string(), "https://og.example.com/api/og?title=x");
    }

    #[tokio::test]
    async fn test_base_url_unknown_host() {
        let request = Request::builder().uri("/").body(()).unwrap();
        assert!(base_url(Config::default(), request).await.is_none());
    }
}
