use aes_gcm::aead::{Aead, KeyInit};
use aes_gcm::{Aes256Gcm, Nonce};
use anyhow::{anyhow, Result};
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use sha2::{Digest, Sha256};

const NONCE_SIZE: usize = 12;
const KEY_SIZE: usize = 32;

/// AES-256-GCM cipher for refund sensitive details. Ciphertext layout:
/// nonce (12 bytes) || ciphertext.
#[derive(Clone)]
pub struct SecretCipher {
    key: [u8; KEY_SIZE],
}

impl SecretCipher {
    pub fn from_base64(encoded: &str) -> Result<Self> {
        let decoded = BASE64
            .decode(encoded.trim())
            .map_err(|e| anyhow!("invalid master key encoding: {e}"))?;
        if decoded.len() != KEY_SIZE {
            return Err(anyhow!("master key must be {} bytes, got {}", KEY_SIZE, decoded.len()));
        }
        let mut key = [0u8; KEY_SIZE];
        key.copy_from_slice(&decoded);
        Ok(Self { key })
    }

    pub fn from_bytes(key: [u8; KEY_SIZE]) -> Self {
        Self { key }
    }

    pub fn encrypt(&self, plaintext: &[u8]) -> Result<Vec<u8>> {
        use rand::RngCore;
        let mut nonce = [0u8; NONCE_SIZE];
        rand::rngs::OsRng.fill_bytes(&mut nonce);

        let cipher = Aes256Gcm::new((&self.key).into());
        let ciphertext = cipher
            .encrypt(Nonce::from_slice(&nonce), plaintext)
            .map_err(|_| anyhow!("encryption failed"))?;

        let mut out = Vec::with_capacity(NONCE_SIZE + ciphertext.len());
        out.extend_from_slice(&nonce);
        out.extend_from_slice(&ciphertext);
        Ok(out)
    }

    pub fn decrypt(&self, data: &[u8]) -> Result<Vec<u8>> {
        if data.len() < NONCE_SIZE {
            return Err(anyhow!("ciphertext too short"));
        }
        let (nonce, ciphertext) = data.split_at(NONCE_SIZE);
        let cipher = Aes256Gcm::new((&self.key).into());
        cipher
            .decrypt(Nonce::from_slice(nonce), ciphertext)
            .map_err(|_| anyhow!("decryption failed"))
    }
}

/// Deterministic digest used to locate encrypted rows without decryption.
pub fn lookup_hash(value: &str) -> String {
    let digest = Sha256::digest(value.as_bytes());
    hex::encode(digest)
}
