use std::{
    path::{Path, PathBuf},
    time::Duration,
};

use anyhow::{Context, Result, anyhow, bail};
use base64::{Engine as _, engine::general_purpose::STANDARD};
use ogimg_core::util::join_normalized;
use percent_encoding::percent_decode_str;
use url::Url;

/// Path under the deployment root that maps to `<assets_dir>/images`.
pub const IMAGES_PATH: &str = "images/";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageSource {
    /// One of this deployment's own assets, read from disk.
    Local(PathBuf),
    /// Inline `data:` URI payload.
    Data(Vec<u8>),
    Remote(Url),
}

/// Decide where the bytes for an image URL come from.
///
/// URLs pointing at this deployment's `/images/` path (either root-relative or
/// under `base_url`) are served from `assets_dir` instead of looping back
/// through HTTP.
pub fn resolve(url: &str, base_url: Option<&Url>, assets_dir: &Path) -> Result<ImageSource> {
    let url = url.trim();
    if url.get(..5).is_some_and(|scheme| scheme.eq_ignore_ascii_case("data:")) {
        return parse_data_uri(&url[5..]).map(ImageSource::Data);
    }
    if let Some(path) = url.strip_prefix('/')
        && path.starts_with(IMAGES_PATH)
    {
        return Ok(local_asset(assets_dir, path));
    }
    let parsed = match base_url {
        Some(base) => base.join(url),
        None => Url::parse(url),
    }
    .with_context(|| format!("Invalid image URL: {url}"))?;
    if let Some(base) = base_url
        && parsed.origin() == base.origin()
        && let Some(path) = parsed.path().strip_prefix(base.path().trim_end_matches('/'))
        && let Some(path) = path.strip_prefix('/')
        && path.starts_with(IMAGES_PATH)
    {
        return Ok(local_asset(assets_dir, path));
    }
    match parsed.scheme() {
        "http" | "https" => Ok(ImageSource::Remote(parsed)),
        scheme => bail!("Unsupported image URL scheme: {scheme}"),
    }
}

fn local_asset(assets_dir: &Path, path: &str) -> ImageSource {
    let path = percent_decode_str(path).decode_utf8_lossy();
    ImageSource::Local(join_normalized(assets_dir, path.as_ref()))
}

/// Parse the part of a `data:` URI after the scheme.
fn parse_data_uri(rest: &str) -> Result<Vec<u8>> {
    let (meta, payload) = rest.split_once(',').ok_or_else(|| anyhow!("Malformed data URI"))?;
    let payload = percent_decode_str(payload);
    if meta.split(';').any(|param| param.trim().eq_ignore_ascii_case("base64")) {
        let encoded = payload
            .decode_utf8_lossy()
            .chars()
            .filter(|c| !c.is_ascii_whitespace())
            .collect::<String>();
        STANDARD.decode(encoded).context("Invalid base64 in data URI")
    } else {
        Ok(payload.collect())
    }
}

#[derive(Clone)]
pub struct ImageLoader {
    client: reqwest::Client,
    max_bytes: u64,
}

impl ImageLoader {
    pub fn new(timeout: Duration, max_bytes: u64) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("ogimg/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("Failed to create HTTP client")?;
        Ok(Self { client, max_bytes })
    }

    pub async fn load(&self, source: ImageSource) -> Result<Vec<u8>> {
        let data = match source {
            ImageSource::Local(path) => {
                let len = tokio::fs::metadata(&path)
                    .await
                    .with_context(|| format!("Image not found: {}", display_name(&path)))?
                    .len();
                self.check_size(len)?;
                tokio::fs::read(&path)
                    .await
                    .with_context(|| format!("Failed to read image {}", display_name(&path)))?
            }
            ImageSource::Data(data) => data,
            ImageSource::Remote(url) => self.fetch(&url).await?,
        };
        self.check_size(data.len() as u64)?;
        Ok(data)
    }

    async fn fetch(&self, url: &Url) -> Result<Vec<u8>> {
        let host = url.host_str().unwrap_or_default();
        let mut response = self
            .client
            .get(url.clone())
            .send()
            .await
            .with_context(|| format!("Failed to fetch image from {host}"))?;
        let status = response.status();
        if !status.is_success() {
            bail!("Image request to {host} returned {status}");
        }
        if let Some(len) = response.content_length() {
            self.check_size(len)?;
        }
        let mut data = Vec::new();
        while let Some(chunk) = response
            .chunk()
            .await
            .with_context(|| format!("Failed to fetch image from {host}"))?
        {
            data.extend_from_slice(&chunk);
            self.check_size(data.len() as u64)?;
        }
        Ok(data)
    }

    fn check_size(&self, len: u64) -> Result<()> {
        if len > self.max_bytes {
            bail!("Image is too large ({} bytes, limit {})", len, self.max_bytes);
        }
        Ok(())
    }
}

fn display_name(path: &Path) -> String {
    path.file_name().map(|name| name.to_string_lossy().into_owned()).unwrap_or_default()
}
