use std::{
    fs::File,
    io::{BufReader, ErrorKind},
    path::{Path, PathBuf},
    time::Duration,
};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use url::Url;

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub render: RenderConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_port")]
    pub port: u16,
    /// Public URL of the deployment, used for the default logo and absolute
    /// preview URLs. Derived from the request headers when unset.
    pub base_url: Option<Url>,
    /// Renders the full error chain into fallback images.
    #[serde(default)]
    pub dev_mode: bool,
}

impl Default for ServerConfig {
    fn default() -> Self { Self { port: default_port(), base_url: None, dev_mode: false } }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RenderConfig {
    pub assets_dir: PathBuf,
    pub fonts_dir: Option<PathBuf>,
    pub font_family: String,
    pub fetch_timeout_secs: u64,
    pub max_image_bytes: u64,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            assets_dir: PathBuf::from("assets"),
            fonts_dir: None,
            font_family: "DejaVu Sans".to_string(),
            fetch_timeout_secs: 10,
            max_image_bytes: 5 * 1024 * 1024,
        }
    }
}

impl RenderConfig {
    pub fn fetch_timeout(&self) -> Duration { Duration::from_secs(self.fetch_timeout_secs) }
}

fn default_port() -> u16 { 3000 }

impl Config {
    /// Load the configuration from a YAML file, falling back to defaults when
    /// the file does not exist.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = match File::open(path) {
            Ok(file) => file,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                tracing::warn!("{} not found, using default configuration", path.display());
                return Ok(Self::default());
            }
            Err(e) => {
                return Err(e).with_context(|| format!("Failed to open {}", path.display()));
            }
        };
        serde_yaml::from_reader(BufReader::new(file))
            .with_context(|| format!("Failed to parse {}", path.display()))
    }
}
