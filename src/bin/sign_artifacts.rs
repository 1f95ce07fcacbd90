//! Artifact signing utility.
//!
//! Writes a manifest (`manifest.json`) binding the SHA-256 of the scaler and
//! model artifacts, plus an Ed25519 signature over it (`artifacts.sig`).
//!
//! # Usage
//!
//! ```bash
//! cargo run --bin sign_artifacts -- <artifact_dir> [--serial <n>]
//! ```
//!
//! The signing seed (base64, 32 bytes) is read from the file named by
//! `WASTECAST_SIGNING_KEY_B64_FILE`, or from `WASTECAST_SIGNING_KEY_B64` in
//! debug builds. The matching public key is printed for
//! `WASTECAST_ARTIFACT_PUBKEY_B64`.

use std::env;
use std::fs;
use std::path::PathBuf;

use base64::engine::general_purpose;
use base64::Engine;
use ed25519_dalek::SigningKey;
use rand::RngCore;
use zeroize::{Zeroize, ZeroizeOnDrop, Zeroizing};

use wastecast::adapters::artifacts::ArtifactManifest;

const KEY_FILE_ENV: &str = "WASTECAST_SIGNING_KEY_B64_FILE";
const KEY_ENV: &str = "WASTECAST_SIGNING_KEY_B64";
const ARTIFACT_FILES: [&str; 2] = ["scaler.json", "model.json"];

#[derive(Zeroize, ZeroizeOnDrop)]
struct Seed([u8; 32]);

fn read_signing_seed_b64<F>(lookup: F) -> Result<Zeroizing<String>, String>
where
    F: Fn(&str) -> Option<String>,
{
    let secret = if let Some(path) = lookup(KEY_FILE_ENV) {
        fs::read_to_string(path.trim())
            .map_err(|e| format!("Failed reading signing key file: {e}"))?
    } else if cfg!(debug_assertions) {
        lookup(KEY_ENV).ok_or_else(|| {
            format!("Missing signing key. Set {KEY_FILE_ENV} (or {KEY_ENV} in debug builds).")
        })?
    } else {
        return Err(format!("Missing signing key. Set {KEY_FILE_ENV}."));
    };

    let secret = Zeroizing::new(secret);
    let trimmed = secret.trim_end_matches(['\n', '\r']);
    if trimmed.is_empty() {
        return Err("Empty signing key".to_string());
    }
    Ok(Zeroizing::new(trimmed.to_string()))
}

fn read_signing_seed<F>(lookup: F) -> Result<Seed, String>
where
    F: Fn(&str) -> Option<String>,
{
    let b64 = read_signing_seed_b64(lookup)?;

    let raw = Zeroizing::new(
        general_purpose::STANDARD
            .decode(b64.trim())
            .map_err(|e| format!("Invalid base64 in signing key: {e}"))?,
    );

    let bytes: [u8; 32] = raw.as_slice().try_into().map_err(|_| {
        format!(
            "Signing key seed must be 32 bytes after base64 decode (got {})",
            raw.len()
        )
    })?;
    Ok(Seed(bytes))
}

fn usage() -> String {
    "Usage: sign_artifacts <artifact_dir> [--serial <u64>]".to_string()
}

fn parse_args<I>(args: I) -> Result<(PathBuf, Option<u64>), String>
where
    I: IntoIterator<Item = String>,
{
    let mut args = args.into_iter();
    let mut dir: Option<PathBuf> = None;
    let mut serial: Option<u64> = None;

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--serial" => {
                let v = args.next().ok_or_else(usage)?;
                serial = Some(
                    v.trim()
                        .parse::<u64>()
                        .map_err(|_| "--serial must be a u64".to_string())?,
                );
            }
            "-h" | "--help" => return Err(usage()),
            _ => {
                if dir.is_some() {
                    return Err(usage());
                }
                dir = Some(PathBuf::from(arg));
            }
        }
    }

    Ok((dir.ok_or_else(usage)?, serial))
}

fn make_nonce_b64() -> String {
    let mut nonce = [0u8; 16];
    rand::rngs::OsRng.fill_bytes(&mut nonce);
    general_purpose::STANDARD.encode(nonce)
}

fn main() -> Result<(), String> {
    let (dir, serial_arg) = parse_args(env::args().skip(1))?;

    let seed = read_signing_seed(|key| env::var(key).ok())?;
    let signing_key = SigningKey::from_bytes(&seed.0);
    drop(seed);

    let manifest = ArtifactManifest::for_files(&dir, &ARTIFACT_FILES, 0, make_nonce_b64())
        .map_err(|e| e.to_string())?;
    let serial = serial_arg.unwrap_or_else(|| manifest.created_at.unwrap_or(1).max(1) as u64);
    let manifest = ArtifactManifest {
        serial: Some(serial),
        ..manifest
    };

    manifest
        .write_signed(&dir, &signing_key)
        .map_err(|e| e.to_string())?;

    println!("Signed {} files in {:?} (serial {serial})", manifest.files.len(), dir);
    println!(
        "WASTECAST_ARTIFACT_PUBKEY_B64={}",
        general_purpose::STANDARD.encode(signing_key.verifying_key().as_bytes())
    );
    Ok(())
}
