//! Mixer Configuration
//!
//! Shared configuration crate for the ring mixer and the benchmark harness.
//!
//! Handles loading configuration from:
//! 1. MIXER_CONFIG env var (explicit path)
//! 2. ./mixer.toml (current directory)
//! 3. ~/.mixer/mixer.toml (user home)
//!
//! Environment variables take precedence over TOML config.

use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::{env, fs};

const CONFIG_FILE_NAME: &str = "mixer.toml";
const CONFIG_DIR_NAME: &str = ".mixer";

// ============================================================================
// Default Constants
// ============================================================================

const DEFAULT_RING_SIZE: usize = 4;
const DEFAULT_DENOMINATION: u64 = 1;
const DEFAULT_TOKEN_ID: u64 = 0;
const DEFAULT_TRIALS: usize = 5;
const DEFAULT_CONTROL_TRIALS: usize = 5;
const DEFAULT_OUTPUT_PATH: &str = "benchmark.json";
const DEFAULT_TOOL_NAME: &str = "orbital";

// ============================================================================
// Config Structs
// ============================================================================

/// Root configuration structure (matches TOML layout)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MixerConfig {
    #[serde(default)]
    pub protocol: ProtocolConfig,
    #[serde(default)]
    pub benchmark: BenchmarkConfig,
    #[serde(default)]
    pub signer: SignerConfig,
}

/// Ring protocol parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProtocolConfig {
    /// Ring capacity N. Must match the capacity the ledger was built with.
    #[serde(default = "default_ring_size")]
    pub ring_size: usize,
    #[serde(default = "default_denomination")]
    pub denomination: u64,
    /// 0 = native value
    #[serde(default = "default_token_id")]
    pub token_id: u64,
}

impl Default for ProtocolConfig {
    fn default() -> Self {
        Self {
            ring_size: DEFAULT_RING_SIZE,
            denomination: DEFAULT_DENOMINATION,
            token_id: DEFAULT_TOKEN_ID,
        }
    }
}

fn default_ring_size() -> usize {
    DEFAULT_RING_SIZE
}
fn default_denomination() -> u64 {
    DEFAULT_DENOMINATION
}
fn default_token_id() -> u64 {
    DEFAULT_TOKEN_ID
}

/// Benchmark harness parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BenchmarkConfig {
    /// Number of rings filled (and drained) per benchmark
    #[serde(default = "default_trials")]
    pub number_of_trials: usize,
    /// Number of control transactions per control variant
    #[serde(default = "default_control_trials")]
    pub control_trials: usize,
    #[serde(default = "default_output_path")]
    pub output_path: String,
}

impl Default for BenchmarkConfig {
    fn default() -> Self {
        Self {
            number_of_trials: DEFAULT_TRIALS,
            control_trials: DEFAULT_CONTROL_TRIALS,
            output_path: DEFAULT_OUTPUT_PATH.into(),
        }
    }
}

fn default_trials() -> usize {
    DEFAULT_TRIALS
}
fn default_control_trials() -> usize {
    DEFAULT_CONTROL_TRIALS
}
fn default_output_path() -> String {
    DEFAULT_OUTPUT_PATH.into()
}

/// Signer backend selection
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SignerBackend {
    /// External `orbital` process
    #[default]
    Orbital,
    /// In-process mock signer (not secure, dry runs only)
    Mock,
}

/// External signer tool configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SignerConfig {
    #[serde(default)]
    pub backend: SignerBackend,
    /// Binary name looked up on PATH
    #[serde(default = "default_tool_name")]
    pub tool_name: String,
    /// Used when the PATH lookup fails
    #[serde(default)]
    pub fallback_path: Option<String>,
}

impl Default for SignerConfig {
    fn default() -> Self {
        Self {
            backend: SignerBackend::Orbital,
            tool_name: DEFAULT_TOOL_NAME.into(),
            fallback_path: None,
        }
    }
}

fn default_tool_name() -> String {
    DEFAULT_TOOL_NAME.into()
}

// ============================================================================
// Environment Variable Helpers
// ============================================================================

/// Set field from env var if present
fn env_string(key: &str, field: &mut String) {
    if let Ok(v) = env::var(key) {
        *field = v;
    }
}

/// Set Option<String> from env var if present
fn env_option_string(key: &str, field: &mut Option<String>) {
    if let Ok(v) = env::var(key) {
        *field = Some(v);
    }
}

/// Set field from env var if present and parseable
fn env_parse<T: std::str::FromStr>(key: &str, field: &mut T) {
    if let Ok(v) = env::var(key) {
        match v.parse() {
            Ok(parsed) => *field = parsed,
            Err(_) => log::warn!("Ignoring unparseable {}={}", key, v),
        }
    }
}

// ============================================================================
// Implementation
// ============================================================================

impl MixerConfig {
    /// Load configuration from config file with env var overrides
    pub fn load() -> Result<Self> {
        let mut config = match Self::find_config_file() {
            Some(path) => {
                log::info!("Loading config from: {}", path.display());
                Self::parse_file(&path)?
            }
            None => {
                log::info!("No config file found, using defaults and environment variables");
                Self::default()
            }
        };

        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a specific file path
    pub fn load_from(path: &Path) -> Result<Self> {
        let mut config = Self::parse_file(path)?;
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    fn parse_file(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    /// Find the config file path
    fn find_config_file() -> Option<PathBuf> {
        if let Ok(path) = env::var("MIXER_CONFIG") {
            let path = PathBuf::from(path);
            if path.exists() {
                return Some(path);
            }
            log::warn!("MIXER_CONFIG points to {}, which does not exist", path.display());
        }

        let local_path = PathBuf::from(CONFIG_FILE_NAME);
        if local_path.exists() {
            return Some(local_path);
        }

        Self::default_config_path().filter(|p| p.exists())
    }

    /// Apply environment variable overrides
    fn apply_env_overrides(&mut self) {
        // Protocol
        env_parse("MIXER_RING_SIZE", &mut self.protocol.ring_size);
        env_parse("MIXER_DENOMINATION", &mut self.protocol.denomination);
        env_parse("MIXER_TOKEN_ID", &mut self.protocol.token_id);

        // Benchmark
        env_parse("MIXER_TRIALS", &mut self.benchmark.number_of_trials);
        env_parse("MIXER_CONTROL_TRIALS", &mut self.benchmark.control_trials);
        env_string("MIXER_OUTPUT", &mut self.benchmark.output_path);

        // Signer
        if let Ok(v) = env::var("MIXER_SIGNER") {
            self.signer.backend = match v.to_ascii_lowercase().as_str() {
                "mock" => SignerBackend::Mock,
                _ => SignerBackend::Orbital,
            };
        }
        env_option_string("MIXER_SIGNER_PATH", &mut self.signer.fallback_path);
    }

    /// Reject configurations the protocol cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.protocol.ring_size < 2 {
            bail!(
                "protocol.ring_size must be at least 2, got {}",
                self.protocol.ring_size
            );
        }
        if self.protocol.denomination == 0 {
            bail!("protocol.denomination must be non-zero");
        }
        if self.benchmark.number_of_trials == 0 {
            bail!("benchmark.number_of_trials must be at least 1");
        }
        Ok(())
    }

    /// Get the default config file path
    pub fn default_config_path() -> Option<PathBuf> {
        dirs::home_dir().map(|h| h.join(CONFIG_DIR_NAME).join(CONFIG_FILE_NAME))
    }

    /// Generate a sample config file
    pub fn generate_sample() -> String {
        let mut sample = Self::default();
        sample.signer.fallback_path = Some("/usr/local/bin/orbital".into());
        toml::to_string_pretty(&sample).unwrap_or_default()
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let config = MixerConfig::default();
        assert_eq!(config.protocol.ring_size, DEFAULT_RING_SIZE);
        assert_eq!(config.protocol.denomination, 1);
        assert_eq!(config.protocol.token_id, 0);
        assert_eq!(config.benchmark.number_of_trials, DEFAULT_TRIALS);
        assert_eq!(config.signer.backend, SignerBackend::Orbital);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_generate_sample() {
        let sample = MixerConfig::generate_sample();
        assert!(sample.contains("[protocol]"));
        assert!(sample.contains("[benchmark]"));
        assert!(sample.contains("[signer]"));
    }

    #[test]
    fn test_parse_sample() {
        let sample = MixerConfig::generate_sample();
        let parsed: MixerConfig = toml::from_str(&sample).unwrap();
        assert_eq!(parsed.protocol.ring_size, DEFAULT_RING_SIZE);
        assert_eq!(
            parsed.signer.fallback_path.as_deref(),
            Some("/usr/local/bin/orbital")
        );
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[protocol]\nring_size = 10\n\n[signer]\nbackend = \"mock\"").unwrap();

        let config = MixerConfig::parse_file(file.path()).unwrap();
        assert_eq!(config.protocol.ring_size, 10);
        assert_eq!(config.protocol.denomination, DEFAULT_DENOMINATION);
        assert_eq!(config.benchmark.output_path, DEFAULT_OUTPUT_PATH);
        assert_eq!(config.signer.backend, SignerBackend::Mock);
    }

    #[test]
    fn test_validate_rejects_degenerate_rings() {
        let mut config = MixerConfig::default();
        config.protocol.ring_size = 1;
        assert!(config.validate().is_err());

        let mut config = MixerConfig::default();
        config.protocol.denomination = 0;
        assert!(config.validate().is_err());

        let mut config = MixerConfig::default();
        config.benchmark.number_of_trials = 0;
        assert!(config.validate().is_err());
    }
}
