//! Orbital Adapter
//!
//! Wraps the `orbital` command line tool:
//!
//! ```text
//! orbital generate -n N                  -> { pubkeys, privkeys }
//! orbital inputs   -f keys.json -n N -m  -> { ring, signatures }
//! orbital verify   -f sigs.json -m MSG   -> "Signatures verified"
//! ```
//!
//! Keys and signatures travel through temporary JSON files; the message is
//! passed as bare hex.

use std::ffi::OsString;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::Stdio;

use log::{debug, error, warn};
use mixer_ring::{KeySet, LinkTag, PublicKey, RingMessage, RingSignature, SignatureSet};
use num_bigint::BigUint;
use serde::Serialize;
use tempfile::NamedTempFile;
use tokio::process::Command;

use super::{AdapterError, Result, SignerVerifier};
use crate::ledger::RingVerifier;

/// Output of a successful `verify`
pub const VERIFIED: &str = "Signatures verified";

/// Resolved location of the tool binary
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrbitalTool {
    path: PathBuf,
}

impl OrbitalTool {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Look `name` up on PATH, then try `fallback`.
    pub fn locate(name: &str, fallback: Option<&Path>) -> Option<Self> {
        let found = std::process::Command::new("which")
            .arg(name)
            .output()
            .ok()
            .filter(|out| out.status.success())
            .map(|out| PathBuf::from(String::from_utf8_lossy(&out.stdout).trim()))
            .filter(|p| p.exists());

        if let Some(path) = found {
            return Some(Self::new(path));
        }

        match fallback {
            Some(path) if path.exists() => Some(Self::new(path)),
            Some(path) => {
                debug!("{name} not on PATH and {} does not exist", path.display());
                None
            }
            None => {
                debug!("{name} not on PATH");
                None
            }
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn describe(&self, args: &[OsString]) -> String {
        let sub = args
            .first()
            .map(|a| a.to_string_lossy().into_owned())
            .unwrap_or_default();
        format!("{} {sub}", self.path.display())
    }

    async fn run(&self, args: Vec<OsString>) -> Result<String> {
        let command = self.describe(&args);
        debug!("Running {command}");

        let output = Command::new(&self.path)
            .args(&args)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await
            .map_err(|source| AdapterError::Spawn {
                command: command.clone(),
                source,
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            error!("{command} failed: {stderr}");
            return Err(AdapterError::NonZeroExit {
                command,
                status: output.status.to_string(),
                stderr,
            });
        }

        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }

    fn run_blocking(&self, args: Vec<OsString>) -> Result<String> {
        let command = self.describe(&args);
        let output = std::process::Command::new(&self.path)
            .args(&args)
            .output()
            .map_err(|source| AdapterError::Spawn {
                command: command.clone(),
                source,
            })?;

        if !output.status.success() {
            return Err(AdapterError::NonZeroExit {
                command,
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }
}

/// Serialize `value` into a temp file that lives as long as the handle
fn write_temp<T: Serialize>(value: &T) -> Result<NamedTempFile> {
    let mut file = NamedTempFile::new().map_err(AdapterError::TempFile)?;
    serde_json::to_writer(file.as_file_mut(), value)?;
    file.flush().map_err(AdapterError::TempFile)?;
    Ok(file)
}

fn verify_args(file: &NamedTempFile, message: &RingMessage) -> Vec<OsString> {
    vec![
        "verify".into(),
        "-f".into(),
        file.path().into(),
        "-m".into(),
        message.to_hex().into(),
    ]
}

#[derive(Debug, Clone)]
pub struct OrbitalSigner {
    tool: OrbitalTool,
}

impl OrbitalSigner {
    pub fn new(tool: OrbitalTool) -> Self {
        Self { tool }
    }

    pub fn tool(&self) -> &OrbitalTool {
        &self.tool
    }
}

impl SignerVerifier for OrbitalSigner {
    fn name(&self) -> &'static str {
        "orbital"
    }

    async fn generate_keys(&self, n: usize) -> Result<KeySet> {
        let out = self
            .tool
            .run(vec!["generate".into(), "-n".into(), n.to_string().into()])
            .await?;
        let keys: KeySet = serde_json::from_str(&out)?;
        if keys.len() != n {
            return Err(AdapterError::UnexpectedOutput(format!(
                "asked for {n} keys, tool returned {}",
                keys.len()
            )));
        }
        Ok(keys)
    }

    async fn derive_inputs(
        &self,
        keys: &KeySet,
        ring_size: usize,
        message: &RingMessage,
    ) -> Result<SignatureSet> {
        let keys_file = write_temp(keys)?;
        let out = self
            .tool
            .run(vec![
                "inputs".into(),
                "-f".into(),
                keys_file.path().into(),
                "-n".into(),
                ring_size.to_string().into(),
                "-m".into(),
                message.to_hex().into(),
            ])
            .await?;
        Ok(serde_json::from_str(&out)?)
    }

    async fn verify_offline(
        &self,
        signatures: &SignatureSet,
        message: &RingMessage,
    ) -> Result<bool> {
        let file = write_temp(signatures)?;
        match self.tool.run(verify_args(&file, message)).await {
            Ok(out) => Ok(out == VERIFIED),
            // the tool exits non-zero on a bad signature
            Err(AdapterError::NonZeroExit { stderr, .. }) => {
                warn!("Offline verification failed: {stderr}");
                Ok(false)
            }
            Err(e) => Err(e),
        }
    }
}

/// Ledger-side verifier that asks the tool about one signature at a time.
///
/// [`RingVerifier::verify`] is synchronous, so each call blocks the current
/// thread until the `verify` subprocess exits.
#[derive(Debug, Clone)]
pub struct OrbitalVerifier {
    tool: OrbitalTool,
}

impl OrbitalVerifier {
    pub fn new(tool: OrbitalTool) -> Self {
        Self { tool }
    }

    fn check(
        &self,
        participants: &[PublicKey],
        message: &RingMessage,
        tag: &LinkTag,
        payload: &[BigUint],
    ) -> Result<bool> {
        let set = SignatureSet {
            ring: participants.to_vec(),
            signatures: vec![RingSignature {
                tau: tag.point().clone(),
                ctlist: payload.to_vec(),
            }],
        };
        let file = write_temp(&set)?;
        Ok(self.tool.run_blocking(verify_args(&file, message))? == VERIFIED)
    }
}

impl RingVerifier for OrbitalVerifier {
    fn verify(
        &self,
        participants: &[PublicKey],
        message: &RingMessage,
        tag: &LinkTag,
        payload: &[BigUint],
    ) -> bool {
        match self.check(participants, message, tag, payload) {
            Ok(ok) => ok,
            Err(e) => {
                debug!("Signature check for {tag} failed: {e}");
                false
            }
        }
    }
}
