//! Artifact loading: fitted scaler and classifier read once at startup.
//!
//! # Integrity
//!
//! An artifact directory may carry a signed manifest:
//!
//! - `manifest.json` lists the SHA-256 of every bound file
//! - `artifacts.sig` is an Ed25519 signature over the raw manifest bytes
//!
//! When both are present the manifest is always verified, and both artifact
//! files must be bound by it. When neither is present loading proceeds
//! unsigned unless the loader was built with `require_signed(true)`.
//!
//! Artifact bytes are read once; the bytes that were hashed are the bytes
//! that get deserialized.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use base64::Engine;
use ed25519_dalek::{Signature, Signer, SigningKey, Verifier, VerifyingKey};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::adapters::sklearn::{ClassifierArtifact, ScalingParameters};
use crate::ports::Classifier;

/// Manifest file name inside an artifact directory.
pub const MANIFEST_FILE: &str = "manifest.json";

/// Detached signature file name inside an artifact directory.
pub const SIGNATURE_FILE: &str = "artifacts.sig";

/// Only manifest layout understood by this loader.
const MANIFEST_VERSION: u32 = 1;

/// Allowed clock skew for `created_at` (seconds).
const MAX_CLOCK_SKEW_SECS: i64 = 300;

/// Errors raised while loading artifacts.
#[derive(Debug, thiserror::Error)]
pub enum ArtifactError {
    #[error("Failed to read {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed artifact {path:?}: {source}")]
    Format {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Invalid artifact: {0}")]
    Invalid(String),

    #[error("Artifact signature check failed: {0}")]
    Signature(String),
}

/// Signed list of artifact files and their SHA-256 digests.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtifactManifest {
    pub version: u32,
    #[serde(default)]
    pub serial: Option<u64>,
    #[serde(default)]
    pub created_at: Option<i64>,
    #[serde(default)]
    pub nonce_b64: Option<String>,
    pub files: BTreeMap<String, String>,
}

impl ArtifactManifest {
    /// Hash the named files inside `dir` into a new manifest.
    ///
    /// # Errors
    /// Returns `ArtifactError::Io` if a file cannot be read.
    pub fn for_files(
        dir: &Path,
        names: &[&str],
        serial: u64,
        nonce_b64: String,
    ) -> Result<Self, ArtifactError> {
        let mut files = BTreeMap::new();
        for name in names {
            let bytes = read_file(&dir.join(name))?;
            files.insert((*name).to_string(), sha256_hex(&bytes));
        }
        Ok(Self {
            version: MANIFEST_VERSION,
            serial: Some(serial),
            created_at: Some(unix_now()),
            nonce_b64: Some(nonce_b64),
            files,
        })
    }

    /// Write `manifest.json` and its signature into `dir`.
    ///
    /// # Errors
    /// Returns `ArtifactError::Io` if either file cannot be written.
    pub fn write_signed(&self, dir: &Path, signing_key: &SigningKey) -> Result<(), ArtifactError> {
        let bytes = serde_json::to_vec_pretty(self).map_err(|e| ArtifactError::Format {
            path: dir.join(MANIFEST_FILE),
            source: e,
        })?;
        let signature: Signature = signing_key.sign(&bytes);

        write_file(&dir.join(MANIFEST_FILE), &bytes)?;
        write_file(&dir.join(SIGNATURE_FILE), &signature.to_bytes())?;
        Ok(())
    }
}

/// Artifacts ready to be shared across request handlers.
#[derive(Debug, Clone)]
pub struct LoadedArtifacts {
    pub scaler: ScalingParameters,
    pub classifier: ClassifierArtifact,
    /// Whether a signed manifest vouched for both files.
    pub signed: bool,
}

/// Loads the scaler and classifier artifacts, verifying a manifest if present.
#[derive(Debug, Clone, Default)]
pub struct ArtifactLoader {
    require_signed: bool,
    verifying_key: Option<VerifyingKey>,
}

impl ArtifactLoader {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Refuse to load artifacts without a signed manifest.
    #[must_use]
    pub fn require_signed(mut self, required: bool) -> Self {
        self.require_signed = required;
        self
    }

    /// Key used to verify `artifacts.sig`.
    #[must_use]
    pub fn with_verifying_key(mut self, key: VerifyingKey) -> Self {
        self.verifying_key = Some(key);
        self
    }

    /// Load both artifacts.
    ///
    /// # Errors
    /// Returns `ArtifactError` if a file is missing or malformed, fails
    /// validation, or fails manifest verification.
    pub fn load(
        &self,
        scaler_path: &Path,
        model_path: &Path,
    ) -> Result<LoadedArtifacts, ArtifactError> {
        let scaler_bytes = read_file(scaler_path)?;
        let model_bytes = read_file(model_path)?;

        let signed = self.verify_manifest(scaler_path, &scaler_bytes, model_path, &model_bytes)?;

        let scaler: ScalingParameters =
            serde_json::from_slice(&scaler_bytes).map_err(|e| ArtifactError::Format {
                path: scaler_path.to_path_buf(),
                source: e,
            })?;
        scaler.validate()?;

        let classifier: ClassifierArtifact =
            serde_json::from_slice(&model_bytes).map_err(|e| ArtifactError::Format {
                path: model_path.to_path_buf(),
                source: e,
            })?;
        classifier.validate()?;

        tracing::info!(
            "Loaded artifacts (scaler={:?}, model={:?}, kind={}, n_features={}, signed={})",
            scaler_path,
            model_path,
            classifier.describe(),
            classifier.n_features(),
            signed
        );

        Ok(LoadedArtifacts {
            scaler,
            classifier,
            signed,
        })
    }

    /// Verify the manifest next to the scaler, if any.
    ///
    /// Returns `true` when a manifest was present and verified.
    fn verify_manifest(
        &self,
        scaler_path: &Path,
        scaler_bytes: &[u8],
        model_path: &Path,
        model_bytes: &[u8],
    ) -> Result<bool, ArtifactError> {
        let dir = parent_dir(scaler_path);
        let manifest_path = dir.join(MANIFEST_FILE);
        let sig_path = dir.join(SIGNATURE_FILE);

        match (manifest_path.exists(), sig_path.exists()) {
            (false, false) => {
                if self.require_signed {
                    return Err(ArtifactError::Signature(format!(
                        "no {MANIFEST_FILE} in {dir:?} and signed artifacts are required"
                    )));
                }
                tracing::warn!("Loading UNSIGNED artifacts from {:?}", dir);
                return Ok(false);
            }
            (true, false) => {
                return Err(ArtifactError::Signature(format!(
                    "{MANIFEST_FILE} present without {SIGNATURE_FILE}"
                )))
            }
            (false, true) => {
                return Err(ArtifactError::Signature(format!(
                    "{SIGNATURE_FILE} present without {MANIFEST_FILE}"
                )))
            }
            (true, true) => {}
        }

        let key = self.verifying_key.ok_or_else(|| {
            ArtifactError::Signature("manifest found but no verifying key is configured".into())
        })?;

        let sig_bytes = read_file(&sig_path)?;
        let sig_array: [u8; 64] = sig_bytes.as_slice().try_into().map_err(|_| {
            ArtifactError::Signature("invalid signature length (expected 64 bytes)".into())
        })?;
        let signature = Signature::from_bytes(&sig_array);

        let manifest_bytes = read_file(&manifest_path)?;
        key.verify(&manifest_bytes, &signature)
            .map_err(|_| ArtifactError::Signature("invalid manifest signature".into()))?;

        let manifest: ArtifactManifest =
            serde_json::from_slice(&manifest_bytes).map_err(|e| ArtifactError::Format {
                path: manifest_path.clone(),
                source: e,
            })?;
        if manifest.version != MANIFEST_VERSION {
            return Err(ArtifactError::Signature(format!(
                "unsupported manifest version {}",
                manifest.version
            )));
        }
        if let Some(created_at) = manifest.created_at {
            if created_at > unix_now() + MAX_CLOCK_SKEW_SECS {
                return Err(ArtifactError::Signature(
                    "manifest created_at is in the future".into(),
                ));
            }
        }
        if let Some(nonce) = &manifest.nonce_b64 {
            validate_nonce_b64(nonce)?;
        }

        if parent_dir(model_path) != dir {
            return Err(ArtifactError::Signature(format!(
                "model {model_path:?} is outside the signed directory {dir:?}"
            )));
        }

        let mut loaded: BTreeMap<String, &[u8]> = BTreeMap::new();
        loaded.insert(file_name(scaler_path)?, scaler_bytes);
        loaded.insert(file_name(model_path)?, model_bytes);

        for name in loaded.keys() {
            if !manifest.files.contains_key(name) {
                return Err(ArtifactError::Signature(format!(
                    "{name} is not bound by {MANIFEST_FILE}"
                )));
            }
        }

        for (name, expected_hex) in &manifest.files {
            let actual_hex = match loaded.get(name) {
                Some(bytes) => sha256_hex(bytes),
                None => sha256_hex(&read_file(&dir.join(name))?),
            };
            if !constant_time_eq_str(&actual_hex, expected_hex) {
                return Err(ArtifactError::Signature(format!(
                    "file hash mismatch for {name}"
                )));
            }
        }

        tracing::info!("Artifact manifest signature and hashes verified");
        Ok(true)
    }
}

/// Parse a base64-encoded Ed25519 public key.
///
/// # Errors
/// Returns `ArtifactError::Signature` if the key is malformed.
pub fn verifying_key_from_b64(b64: &str) -> Result<VerifyingKey, ArtifactError> {
    let bytes = base64::engine::general_purpose::STANDARD
        .decode(b64.trim())
        .map_err(|_| ArtifactError::Signature("invalid public key base64".into()))?;
    let key: [u8; 32] = bytes.as_slice().try_into().map_err(|_| {
        ArtifactError::Signature("invalid public key length (expected 32 bytes)".into())
    })?;
    VerifyingKey::from_bytes(&key)
        .map_err(|_| ArtifactError::Signature("invalid verifying key".into()))
}

/// Check that a manifest nonce decodes to 16 bytes.
///
/// # Errors
/// Returns `ArtifactError::Signature` otherwise.
pub fn validate_nonce_b64(nonce_b64: &str) -> Result<(), ArtifactError> {
    let raw = base64::engine::general_purpose::STANDARD
        .decode(nonce_b64.trim())
        .map_err(|e| ArtifactError::Signature(format!("invalid nonce base64: {e}")))?;
    if raw.len() != 16 {
        return Err(ArtifactError::Signature(
            "nonce must decode to exactly 16 bytes".into(),
        ));
    }
    Ok(())
}

fn read_file(path: &Path) -> Result<Vec<u8>, ArtifactError> {
    fs::read(path).map_err(|e| ArtifactError::Io {
        path: path.to_path_buf(),
        source: e,
    })
}

fn write_file(path: &Path, bytes: &[u8]) -> Result<(), ArtifactError> {
    fs::write(path, bytes).map_err(|e| ArtifactError::Io {
        path: path.to_path_buf(),
        source: e,
    })
}

fn parent_dir(path: &Path) -> PathBuf {
    match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
        _ => PathBuf::from("."),
    }
}

fn file_name(path: &Path) -> Result<String, ArtifactError> {
    path.file_name()
        .and_then(|n| n.to_str())
        .map(str::to_string)
        .ok_or_else(|| ArtifactError::Invalid(format!("{path:?} has no file name")))
}

fn sha256_hex(bytes: &[u8]) -> String {
    Sha256::digest(bytes)
        .iter()
        .map(|b| format!("{b:02x}"))
        .collect()
}

fn unix_now() -> i64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or(0)
}

// Constant-time compare for SHA-256 hex digests.
fn constant_time_eq_str(a: &str, b: &str) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.bytes()
        .zip(b.bytes())
        .fold(0u8, |diff, (x, y)| diff | (x ^ y))
        == 0
}
