//! Encryptors for sensitive config values.

use aes_gcm::aead::Aead;
use aes_gcm::{Aes256Gcm, KeyInit, Nonce};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use konfig_rs_core::{ConfigEncryptor, ConfigError};
use log::error;
use rand::RngCore;
use sha2::{Digest, Sha256, Sha512};
use std::fmt;

/// AES-256 key size in bytes.
pub const AES_KEY_SIZE: usize = 32;
/// AES-GCM nonce size in bytes.
pub const AES_NONCE_SIZE: usize = 12;

/// Reversible AES-256-GCM encryption.
///
/// Ciphertext format: `base64(nonce || ciphertext_with_tag)`, with a fresh
/// random nonce per value.
#[derive(Clone)]
pub struct AesGcmEncryptor {
    key: [u8; AES_KEY_SIZE],
}

impl AesGcmEncryptor {
    pub fn new(key: [u8; AES_KEY_SIZE]) -> Self {
        Self { key }
    }

    /// Encryptor with a freshly generated random key.
    pub fn generate() -> Self {
        let mut key = [0u8; AES_KEY_SIZE];
        rand::rng().fill_bytes(&mut key);
        Self { key }
    }

    /// Decode a base64 (standard alphabet) 32-byte key.
    pub fn from_base64(encoded: &str) -> Result<Self, ConfigError> {
        let bytes = STANDARD
            .decode(encoded.trim())
            .map_err(|err| ConfigError::Encryption(format!("invalid key encoding: {err}")))?;
        let key: [u8; AES_KEY_SIZE] = bytes.as_slice().try_into().map_err(|_| {
            ConfigError::Encryption(format!(
                "invalid key size: expected {AES_KEY_SIZE}, got {}",
                bytes.len()
            ))
        })?;
        Ok(Self { key })
    }

    /// The key, base64 encoded. Suitable for `from_base64`.
    pub fn key_base64(&self) -> String {
        STANDARD.encode(self.key)
    }

    fn cipher(&self) -> Result<Aes256Gcm, ConfigError> {
        Aes256Gcm::new_from_slice(&self.key)
            .map_err(|err| ConfigError::Encryption(format!("invalid key: {err}")))
    }
}

impl fmt::Debug for AesGcmEncryptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AesGcmEncryptor").finish_non_exhaustive()
    }
}

impl ConfigEncryptor for AesGcmEncryptor {
    fn encrypt(&self, plaintext: &str) -> Result<String, ConfigError> {
        let cipher = self.cipher()?;
        let mut nonce_bytes = [0u8; AES_NONCE_SIZE];
        rand::rng().fill_bytes(&mut nonce_bytes);
        let ciphertext = cipher
            .encrypt(Nonce::from_slice(&nonce_bytes), plaintext.as_bytes())
            .map_err(|err| {
                error!("encryption failed: {}", err);
                ConfigError::Encryption(format!("encryption failed: {err}"))
            })?;

        let mut combined = Vec::with_capacity(AES_NONCE_SIZE + ciphertext.len());
        combined.extend_from_slice(&nonce_bytes);
        combined.extend_from_slice(&ciphertext);
        Ok(STANDARD.encode(combined))
    }

    fn decrypt(&self, ciphertext: &str) -> Result<String, ConfigError> {
        let combined = STANDARD
            .decode(ciphertext)
            .map_err(|err| ConfigError::Encryption(format!("invalid ciphertext encoding: {err}")))?;
        if combined.len() < AES_NONCE_SIZE {
            return Err(ConfigError::Encryption(format!(
                "ciphertext too short: {} bytes",
                combined.len()
            )));
        }
        let (nonce, body) = combined.split_at(AES_NONCE_SIZE);
        let plaintext = self
            .cipher()?
            .decrypt(Nonce::from_slice(nonce), body)
            .map_err(|err| {
                error!("decryption failed: {}", err);
                ConfigError::Encryption(format!("decryption failed: {err}"))
            })?;
        String::from_utf8(plaintext)
            .map_err(|err| ConfigError::Encryption(format!("decrypted value is not UTF-8: {err}")))
    }
}

/// Digest used by [`HashEncryptor`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HashAlgorithm {
    #[default]
    Sha256,
    Sha512,
}

/// One-way hashing. `encrypt` returns a lowercase hex digest and `decrypt`
/// always fails.
#[derive(Debug, Clone, Copy, Default)]
pub struct HashEncryptor {
    algorithm: HashAlgorithm,
}

impl HashEncryptor {
    pub fn new(algorithm: HashAlgorithm) -> Self {
        Self { algorithm }
    }

    pub fn algorithm(&self) -> HashAlgorithm {
        self.algorithm
    }
}

impl ConfigEncryptor for HashEncryptor {
    fn encrypt(&self, plaintext: &str) -> Result<String, ConfigError> {
        let digest = match self.algorithm {
            HashAlgorithm::Sha256 => hex::encode(Sha256::digest(plaintext.as_bytes())),
            HashAlgorithm::Sha512 => hex::encode(Sha512::digest(plaintext.as_bytes())),
        };
        Ok(digest)
    }

    fn decrypt(&self, _ciphertext: &str) -> Result<String, ConfigError> {
        Err(ConfigError::Encryption(
            "hash encryption is one-way, cannot decrypt".to_string(),
        ))
    }
}
