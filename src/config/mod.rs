use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use url::Url;

/// Top-level configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub capture: CaptureConfig,
    #[serde(default)]
    pub scan: ScanConfig,
    #[serde(default)]
    pub narrative: NarrativeConfig,
    #[serde(default)]
    pub demo: DemoConfig,
}

/// API server configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ApiConfig {
    /// API server address
    pub address: String,
    /// API server port
    pub port: u16,
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// Directory with the front-end assets
    #[serde(default = "default_static_dir")]
    pub static_dir: PathBuf,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_static_dir() -> PathBuf {
    PathBuf::from("public")
}

/// Which capture implementation backs the terminal camera
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum CaptureBackendKind {
    /// Synthetic frames, always available
    TestPattern,
    /// Probe a V4L device node directly
    DeviceNode,
    /// Live GStreamer pipeline (requires the `gstreamer` feature)
    Gstreamer,
}

/// Capture device configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CaptureConfig {
    pub backend: CaptureBackendKind,
    /// Device node, e.g. /dev/video0
    pub device: String,
    /// Preferred frame width
    pub width: u32,
    /// Preferred frame height
    pub height: u32,
}

/// Scan terminal timing
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ScanConfig {
    /// Simulated capture duration in milliseconds
    pub capture_delay_ms: u64,
    /// How long a completed result stays on the terminal, in milliseconds
    pub result_display_ms: u64,
    /// Roster id every scan is attributed to until face matching exists
    pub demo_employee_id: String,
}

/// Narrative (generative text) service configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct NarrativeConfig {
    /// API key; falls back to the API_KEY / GEMINI_API_KEY environment variables
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default = "default_narrative_base_url")]
    pub base_url: String,
    #[serde(default = "default_narrative_model")]
    pub model: String,
    /// Upper bound for one annotation call in milliseconds
    #[serde(default = "default_narrative_timeout")]
    pub timeout_ms: u64,
}

fn default_narrative_base_url() -> String {
    "https://generativelanguage.googleapis.com/v1beta".to_string()
}

fn default_narrative_model() -> String {
    "gemini-3-flash-preview".to_string()
}

fn default_narrative_timeout() -> u64 {
    10_000
}

/// Demo data configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DemoConfig {
    /// Seed the store with the sample RISK record at start-up
    pub seed_records: bool,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            address: "0.0.0.0".to_string(),
            port: 4750,
            log_level: default_log_level(),
            static_dir: default_static_dir(),
        }
    }
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            backend: CaptureBackendKind::TestPattern,
            device: "/dev/video0".to_string(),
            width: 640,
            height: 480,
        }
    }
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            capture_delay_ms: 2500,
            result_display_ms: 5000,
            demo_employee_id: "E001".to_string(),
        }
    }
}

impl Default for NarrativeConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: default_narrative_base_url(),
            model: default_narrative_model(),
            timeout_ms: default_narrative_timeout(),
        }
    }
}

impl Default for DemoConfig {
    fn default() -> Self {
        Self { seed_records: true }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api: ApiConfig::default(),
            capture: CaptureConfig::default(),
            scan: ScanConfig::default(),
            narrative: NarrativeConfig::default(),
            demo: DemoConfig::default(),
        }
    }
}

impl NarrativeConfig {
    /// Configured key, or the one from the environment. Blank keys count as absent.
    pub fn resolved_api_key(&self) -> Option<String> {
        self.api_key
            .clone()
            .or_else(|| std::env::var("API_KEY").ok())
            .or_else(|| std::env::var("GEMINI_API_KEY").ok())
            .filter(|key| !key.trim().is_empty())
    }
}

impl Config {
    /// Check values that serde cannot
    pub fn validate(&self) -> Result<()> {
        Url::parse(&self.narrative.base_url)
            .with_context(|| format!("Invalid narrative base_url: {}", self.narrative.base_url))?;

        if self.capture.width == 0 || self.capture.height == 0 {
            return Err(anyhow::anyhow!("Capture resolution must be non-zero"));
        }

        if self.scan.demo_employee_id.trim().is_empty() {
            return Err(anyhow::anyhow!("scan.demo_employee_id must not be empty"));
        }

        Ok(())
    }
}

/// Load configuration from a file or use default
pub fn load_config(config_path: Option<&Path>) -> Result<Config> {
    let config = match config_path {
        Some(path) => {
            let config_str = std::fs::read_to_string(path)
                .context(format!("Failed to read config file: {:?}", path))?;

            if path.extension().map_or(false, |ext| ext == "json") {
                serde_json::from_str(&config_str).context("Failed to parse JSON config")?
            } else if path.extension().map_or(false, |ext| ext == "toml") {
                toml::from_str(&config_str).context("Failed to parse TOML config")?
            } else {
                return Err(anyhow::anyhow!("Unsupported config file format"));
            }
        }
        None => Config::default(),
    };

    config.validate()?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_terminal_timing() {
        let config = Config::default();
        assert_eq!(config.scan.capture_delay_ms, 2500);
        assert_eq!(config.scan.result_display_ms, 5000);
        assert_eq!(config.capture.width, 640);
        assert_eq!(config.capture.height, 480);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_toml_fills_defaults() {
        let config: Config = toml::from_str(
            r#"
            [api]
            address = "127.0.0.1"
            port = 8080

            [narrative]
            timeout_ms = 1500
            "#,
        )
        .unwrap();

        assert_eq!(config.api.port, 8080);
        assert_eq!(config.api.log_level, "info");
        assert_eq!(config.narrative.timeout_ms, 1500);
        assert_eq!(config.narrative.model, "gemini-3-flash-preview");
        assert_eq!(config.capture.backend, CaptureBackendKind::TestPattern);
        assert!(config.demo.seed_records);
    }

    #[test]
    fn test_invalid_base_url_rejected() {
        let mut config = Config::default();
        config.narrative.base_url = "not a url".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_unsupported_extension() {
        let result = load_config(Some(Path::new("kiosk.yaml")));
        assert!(result.is_err());
    }
}
