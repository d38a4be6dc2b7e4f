//! Signer / verifier adapters.
//!
//! Key generation and ring signature construction live outside the mixer.
//! The harness reaches them through [`SignerVerifier`]; the ledger only sees
//! a synchronous [`RingVerifier`](crate::ledger::RingVerifier).
//!
//! Backends:
//! - [`OrbitalSigner`]: shells out to the external `orbital` tool
//! - [`MockSigner`]: in-process stand-in for tests and dry runs (NOT secure)

pub mod mock;
pub mod orbital;

use std::path::PathBuf;
use std::sync::Arc;

use log::{info, warn};
use mixer_config::{SignerBackend, SignerConfig};
use mixer_ring::{KeySet, RingMessage, SignatureSet};
use thiserror::Error;

use crate::ledger::{RejectAll, RingVerifier};

pub use mock::{MockSigner, MockVerifier};
pub use orbital::{OrbitalSigner, OrbitalTool, OrbitalVerifier};

#[derive(Error, Debug)]
pub enum AdapterError {
    #[error("Signer tool unavailable: {0}")]
    Unavailable(String),

    #[error("Failed to spawn {command}: {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{command} exited with {status}: {stderr}")]
    NonZeroExit {
        command: String,
        status: String,
        stderr: String,
    },

    #[error("Failed to decode tool output: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("Unexpected tool output: {0}")]
    UnexpectedOutput(String),

    #[error("Temporary file error: {0}")]
    TempFile(#[source] std::io::Error),

    #[error("Signatures failed verification: {0}")]
    VerificationFailed(String),
}

pub type Result<T> = std::result::Result<T, AdapterError>;

/// Interface to the key / signature tool. Stateless per call.
#[allow(async_fn_in_trait)]
pub trait SignerVerifier {
    fn name(&self) -> &'static str;

    /// `n` fresh keypairs
    async fn generate_keys(&self, n: usize) -> Result<KeySet>;

    /// One signature per key over the ring formed by `keys`, bound to `message`
    async fn derive_inputs(
        &self,
        keys: &KeySet,
        ring_size: usize,
        message: &RingMessage,
    ) -> Result<SignatureSet>;

    /// Check every signature in the set against `message`
    async fn verify_offline(&self, signatures: &SignatureSet, message: &RingMessage)
    -> Result<bool>;
}

/// Backend chosen from configuration
#[derive(Debug, Clone)]
pub enum AnySigner {
    Orbital(OrbitalSigner),
    Mock(MockSigner),
}

impl AnySigner {
    /// Build the configured backend.
    ///
    /// Returns `None` if the orbital tool cannot be found; workflows that need
    /// signatures are then skipped.
    pub fn from_config(config: &SignerConfig) -> Option<Self> {
        match config.backend {
            SignerBackend::Mock => {
                warn!("Using mock signer: signatures are NOT secure");
                Some(AnySigner::Mock(MockSigner::default()))
            }
            SignerBackend::Orbital => {
                let fallback = config.fallback_path.as_ref().map(PathBuf::from);
                match OrbitalTool::locate(&config.tool_name, fallback.as_deref()) {
                    Some(tool) => {
                        info!("Using {} at {}", config.tool_name, tool.path().display());
                        Some(AnySigner::Orbital(OrbitalSigner::new(tool)))
                    }
                    None => {
                        warn!("{} not found, signer adapter unavailable", config.tool_name);
                        None
                    }
                }
            }
        }
    }

    /// Ledger-side verifier matching this backend
    pub fn verifier(&self) -> Arc<dyn RingVerifier> {
        match self {
            AnySigner::Orbital(s) => Arc::new(OrbitalVerifier::new(s.tool().clone())),
            AnySigner::Mock(_) => Arc::new(MockVerifier),
        }
    }
}

/// Ledger verifier for an optional backend
pub fn verifier_for(signer: Option<&AnySigner>) -> Arc<dyn RingVerifier> {
    match signer {
        Some(s) => s.verifier(),
        None => Arc::new(RejectAll),
    }
}

impl SignerVerifier for AnySigner {
    fn name(&self) -> &'static str {
        match self {
            AnySigner::Orbital(s) => s.name(),
            AnySigner::Mock(s) => s.name(),
        }
    }

    async fn generate_keys(&self, n: usize) -> Result<KeySet> {
        match self {
            AnySigner::Orbital(s) => s.generate_keys(n).await,
            AnySigner::Mock(s) => s.generate_keys(n).await,
        }
    }

    async fn derive_inputs(
        &self,
        keys: &KeySet,
        ring_size: usize,
        message: &RingMessage,
    ) -> Result<SignatureSet> {
        match self {
            AnySigner::Orbital(s) => s.derive_inputs(keys, ring_size, message).await,
            AnySigner::Mock(s) => s.derive_inputs(keys, ring_size, message).await,
        }
    }

    async fn verify_offline(
        &self,
        signatures: &SignatureSet,
        message: &RingMessage,
    ) -> Result<bool> {
        match self {
            AnySigner::Orbital(s) => s.verify_offline(signatures, message).await,
            AnySigner::Mock(s) => s.verify_offline(signatures, message).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mock_backend_from_config() {
        let config = SignerConfig {
            backend: SignerBackend::Mock,
            ..SignerConfig::default()
        };
        let signer = AnySigner::from_config(&config).unwrap();
        assert_eq!(signer.name(), "mock");
    }

    #[test]
    fn test_missing_tool_is_unavailable() {
        let config = SignerConfig {
            backend: SignerBackend::Orbital,
            tool_name: "definitely-not-a-ring-signer-tool".to_string(),
            fallback_path: Some("/nonexistent/ring-signer".to_string()),
        };
        assert!(AnySigner::from_config(&config).is_none());
    }

    #[test]
    fn test_error_messages() {
        let err = AdapterError::NonZeroExit {
            command: "orbital verify".to_string(),
            status: "exit status: 1".to_string(),
            stderr: "bad input".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "orbital verify exited with exit status: 1: bad input"
        );
    }
}
