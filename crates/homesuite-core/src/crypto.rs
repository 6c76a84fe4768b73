//! Password encryption for PassFort vaults.
//!
//! Each vault derives a 256-bit key from its master password with Argon2id.
//! Entry passwords are sealed with AES-256-GCM under a fresh random 16-byte
//! IV; the stored blob is the IV followed by the ciphertext.

use std::fmt;

use aes_gcm::aead::consts::U16;
use aes_gcm::aead::{Aead, KeyInit};
use aes_gcm::aes::Aes256;
use aes_gcm::{AesGcm, Nonce};
use argon2::{Algorithm, Argon2, Params, Version};
use rand::rngs::OsRng;
use rand::RngCore;
use thiserror::Error;

use crate::codec::{self, CodecError, Record, RecordReader, RecordWriter};
use crate::models::ProfileId;

/// AES-256-GCM with a 16-byte nonce, matching the on-disk IV size.
type VaultCipher = AesGcm<Aes256, U16>;

pub const IV_SIZE: usize = 16;
pub const KEY_SIZE: usize = 32;

/// Prefix of every vault salt; the profile id makes up the rest.
const SALT_TAG: &[u8; 8] = b"passfort";

#[derive(Error, Debug)]
pub enum CryptoError {
    #[error("Key derivation failed: {reason}")]
    KeyDerivation { reason: String },

    #[error("Cipher initialization failed: {reason}")]
    CipherInit { reason: String },

    #[error("Encryption failed: {reason}")]
    Encryption { reason: String },

    #[error("Decryption failed - wrong master password or corrupted entry")]
    Decryption,

    #[error("Decrypted password is not valid UTF-8")]
    InvalidUtf8,
}

/// Argon2id work factors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KdfCost {
    pub memory_kib: u32,
    pub iterations: u32,
}

impl Default for KdfCost {
    fn default() -> Self {
        Self {
            memory_kib: Params::DEFAULT_M_COST,
            iterations: Params::DEFAULT_T_COST,
        }
    }
}

/// IV plus ciphertext (GCM tag included) of one password.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncryptedSecret {
    pub iv: [u8; IV_SIZE],
    pub ciphertext: Vec<u8>,
}

impl EncryptedSecret {
    pub fn to_blob(&self) -> Vec<u8> {
        let mut blob = Vec::with_capacity(IV_SIZE + self.ciphertext.len());
        blob.extend_from_slice(&self.iv);
        blob.extend_from_slice(&self.ciphertext);
        blob
    }

    pub fn from_blob(blob: &[u8]) -> Result<Self, CodecError> {
        if blob.len() < IV_SIZE {
            return Err(CodecError::InvalidField {
                field: "password blob",
                reason: format!("{} bytes is shorter than the {IV_SIZE}-byte IV", blob.len()),
            });
        }
        let (iv_bytes, ciphertext) = blob.split_at(IV_SIZE);
        let mut iv = [0u8; IV_SIZE];
        iv.copy_from_slice(iv_bytes);
        Ok(Self {
            iv,
            ciphertext: ciphertext.to_vec(),
        })
    }
}

impl Record for EncryptedSecret {
    fn encode(&self, w: &mut RecordWriter) -> codec::Result<()> {
        w.write_bytes(&self.to_blob())
    }

    fn decode(r: &mut RecordReader<'_>) -> codec::Result<Self> {
        Self::from_blob(r.read_byte_slice()?)
    }
}

/// Symmetric key for one vault.
#[derive(Clone)]
pub struct VaultKey {
    key: [u8; KEY_SIZE],
}

impl fmt::Debug for VaultKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("VaultKey(..)")
    }
}

impl VaultKey {
    /// Derive the key for vault `id` from its master password.
    pub fn derive(master_password: &str, id: ProfileId, cost: KdfCost) -> Result<Self, CryptoError> {
        let params = Params::new(cost.memory_kib, cost.iterations, 1, Some(KEY_SIZE)).map_err(
            |e| CryptoError::KeyDerivation {
                reason: e.to_string(),
            },
        )?;
        let argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, params);

        let mut salt = [0u8; 16];
        salt[..8].copy_from_slice(SALT_TAG);
        salt[8..].copy_from_slice(&id.0.to_le_bytes());

        let mut key = [0u8; KEY_SIZE];
        argon2
            .hash_password_into(master_password.as_bytes(), &salt, &mut key)
            .map_err(|e| CryptoError::KeyDerivation {
                reason: e.to_string(),
            })?;
        Ok(Self { key })
    }

    pub fn from_bytes(key: [u8; KEY_SIZE]) -> Self {
        Self { key }
    }

    fn cipher(&self) -> Result<VaultCipher, CryptoError> {
        VaultCipher::new_from_slice(&self.key).map_err(|e| CryptoError::CipherInit {
            reason: e.to_string(),
        })
    }

    /// Encrypt a password under a fresh random IV.
    pub fn seal(&self, plaintext: &str) -> Result<EncryptedSecret, CryptoError> {
        let mut iv = [0u8; IV_SIZE];
        OsRng.fill_bytes(&mut iv);
        let ciphertext = self
            .cipher()?
            .encrypt(Nonce::<U16>::from_slice(&iv), plaintext.as_bytes())
            .map_err(|e| CryptoError::Encryption {
                reason: e.to_string(),
            })?;
        Ok(EncryptedSecret { iv, ciphertext })
    }

    pub fn open(&self, secret: &EncryptedSecret) -> Result<String, CryptoError> {
        let plaintext = self
            .cipher()?
            .decrypt(
                Nonce::<U16>::from_slice(&secret.iv),
                secret.ciphertext.as_slice(),
            )
            .map_err(|_| CryptoError::Decryption)?;
        String::from_utf8(plaintext).map_err(|_| CryptoError::InvalidUtf8)
    }
}
