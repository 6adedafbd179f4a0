//! Machine-derived encryption-at-rest for profile credentials.
//!
//! A random data key seals each credential with AES-256-GCM-SIV. The data key
//! is itself wrapped by a key-encryption key derived (scrypt) from host and
//! user identity plus a per-write salt, so a copied `profiles.json` is useless
//! on another machine.

use aes_gcm_siv::aead::{Aead, KeyInit};
use aes_gcm_siv::{Aes256GcmSiv, Nonce};
use base64::engine::general_purpose::STANDARD as B64;
use base64::Engine;
use rand::RngCore;
use scrypt::{scrypt, Params as ScryptParams};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::error::StoreError;

const SALT_LEN: usize = 16;
const NONCE_LEN: usize = 12;
const KEY_LEN: usize = 32;
const SCRYPT_R: u32 = 8;
const SCRYPT_P: u32 = 1;
const MACHINE_KEY_CONTEXT: &str = "claudeswap-profile-kek-v1";

/// Wrapped data key stored once per file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub(super) struct KeyEnvelope {
    pub(super) salt: String,
    pub(super) kdf_log_n: u8,
    pub(super) wrapped_key_nonce: String,
    pub(super) wrapped_key: String,
}

/// One sealed credential.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub(super) struct SealedSecret {
    pub(super) nonce: String,
    pub(super) ciphertext: String,
}

/// Unwrapped data key, valid for one load or write.
pub(super) struct DataKey([u8; KEY_LEN]);

/// Create a fresh data key and its envelope at the given scrypt cost.
pub(super) fn new_data_key(kdf_log_n: u8) -> Result<(DataKey, KeyEnvelope), StoreError> {
    let mut salt = [0u8; SALT_LEN];
    rand::thread_rng().fill_bytes(&mut salt);
    let kek = derive_machine_kek(&salt, kdf_log_n)?;

    let mut dek = [0u8; KEY_LEN];
    rand::thread_rng().fill_bytes(&mut dek);
    let (nonce, wrapped) = encrypt_blob(&kek, &dek)?;

    Ok((
        DataKey(dek),
        KeyEnvelope {
            salt: B64.encode(salt),
            kdf_log_n,
            wrapped_key_nonce: B64.encode(nonce),
            wrapped_key: B64.encode(wrapped),
        },
    ))
}

/// Recover the data key from an envelope written on this machine.
pub(super) fn open_envelope(envelope: &KeyEnvelope) -> Result<DataKey, StoreError> {
    let salt = decode_fixed::<SALT_LEN>(&envelope.salt, "salt")?;
    let kek = derive_machine_kek(&salt, envelope.kdf_log_n)?;
    let nonce = decode_fixed::<NONCE_LEN>(&envelope.wrapped_key_nonce, "wrapped_key_nonce")?;
    let wrapped = decode_bytes(&envelope.wrapped_key, "wrapped_key")?;
    let raw = decrypt_blob(&kek, &nonce, &wrapped).map_err(|_| {
        StoreError::Corrupt(
            "failed to unlock stored credentials (machine identity may have changed); re-run `claudeswap setup` for each profile"
                .to_string(),
        )
    })?;
    if raw.len() != KEY_LEN {
        return Err(StoreError::Corrupt(
            "invalid data key length in profile store".to_string(),
        ));
    }
    let mut dek = [0u8; KEY_LEN];
    dek.copy_from_slice(&raw);
    Ok(DataKey(dek))
}

pub(super) fn seal(key: &DataKey, secret: &str) -> Result<SealedSecret, StoreError> {
    let (nonce, ciphertext) = encrypt_blob(&key.0, secret.as_bytes())?;
    Ok(SealedSecret {
        nonce: B64.encode(nonce),
        ciphertext: B64.encode(ciphertext),
    })
}

pub(super) fn unseal(key: &DataKey, sealed: &SealedSecret, profile: &str) -> Result<String, StoreError> {
    let nonce = decode_fixed::<NONCE_LEN>(&sealed.nonce, "nonce")?;
    let ciphertext = decode_bytes(&sealed.ciphertext, "ciphertext")?;
    let plain = decrypt_blob(&key.0, &nonce, &ciphertext).map_err(|_| {
        StoreError::Corrupt(format!(
            "failed to decrypt credential for profile `{profile}`"
        ))
    })?;
    String::from_utf8(plain).map_err(|_| {
        StoreError::Corrupt(format!(
            "decrypted credential for profile `{profile}` is not UTF-8"
        ))
    })
}

fn derive_machine_kek(salt: &[u8; SALT_LEN], log_n: u8) -> Result<[u8; KEY_LEN], StoreError> {
    let mut hashed = Sha256::new();
    hashed.update(MACHINE_KEY_CONTEXT.as_bytes());
    hashed.update(machine_secret_material());
    hashed.update(salt);
    let seed = hashed.finalize();

    let params = ScryptParams::new(log_n, SCRYPT_R, SCRYPT_P, KEY_LEN)
        .map_err(|err| StoreError::Corrupt(format!("invalid key derivation cost {log_n}: {err}")))?;
    let mut key = [0u8; KEY_LEN];
    scrypt(&seed, salt, &params, &mut key)
        .map_err(|err| StoreError::Corrupt(format!("failed to derive machine key: {err}")))?;
    Ok(key)
}

fn machine_secret_material() -> Vec<u8> {
    let host = hostname::get()
        .map(|value| value.to_string_lossy().to_string())
        .unwrap_or_else(|_| "unknown-host".to_string());
    let user = std::env::var("USER")
        .or_else(|_| std::env::var("USERNAME"))
        .unwrap_or_else(|_| "unknown-user".to_string());
    let home = dirs::home_dir()
        .map(|path| path.display().to_string())
        .unwrap_or_default();
    let machine_id = read_machine_id().unwrap_or_default();
    format!(
        "os={}|host={host}|user={user}|home={home}|machine_id={machine_id}",
        std::env::consts::OS
    )
    .into_bytes()
}

fn read_machine_id() -> Option<String> {
    ["/etc/machine-id", "/var/lib/dbus/machine-id", "/etc/hostid"]
        .into_iter()
        .filter_map(|path| std::fs::read_to_string(path).ok())
        .map(|value| value.trim().to_string())
        .find(|value| !value.is_empty())
}

fn encrypt_blob(key: &[u8; KEY_LEN], plaintext: &[u8]) -> Result<(Vec<u8>, Vec<u8>), StoreError> {
    let cipher = Aes256GcmSiv::new_from_slice(key)
        .map_err(|_| StoreError::Corrupt("invalid encryption key length".to_string()))?;
    let mut nonce = [0u8; NONCE_LEN];
    rand::thread_rng().fill_bytes(&mut nonce);
    let ciphertext = cipher
        .encrypt(Nonce::from_slice(&nonce), plaintext)
        .map_err(|_| StoreError::Corrupt("failed to encrypt credential".to_string()))?;
    Ok((nonce.to_vec(), ciphertext))
}

fn decrypt_blob(
    key: &[u8; KEY_LEN],
    nonce: &[u8; NONCE_LEN],
    ciphertext: &[u8],
) -> Result<Vec<u8>, StoreError> {
    let cipher = Aes256GcmSiv::new_from_slice(key)
        .map_err(|_| StoreError::Corrupt("invalid encryption key length".to_string()))?;
    cipher
        .decrypt(Nonce::from_slice(nonce), ciphertext)
        .map_err(|_| StoreError::Corrupt("failed to decrypt credential data".to_string()))
}

fn decode_bytes(value: &str, field: &str) -> Result<Vec<u8>, StoreError> {
    B64.decode(value).map_err(|err| {
        StoreError::Corrupt(format!("failed to decode field `{field}`: {err}"))
    })
}

fn decode_fixed<const N: usize>(value: &str, field: &str) -> Result<[u8; N], StoreError> {
    let bytes = decode_bytes(value, field)?;
    if bytes.len() != N {
        return Err(StoreError::Corrupt(format!(
            "invalid field `{field}` length: expected {N}, got {}",
            bytes.len()
        )));
    }
    let mut out = [0u8; N];
    out.copy_from_slice(&bytes);
    Ok(out)
}
