//! Authenticated encryption for session payloads and sealed cookies
//!
//! Values are serialized to JSON, encrypted with ChaCha20-Poly1305 under a key derived
//! from `application.key` (SHA-256), and encoded as URL-safe base64 of
//! `nonce || ciphertext`. Anything that fails authentication is rejected.

use crate::error::{Error, Result};
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use chacha20poly1305::aead::{Aead, KeyInit};
use chacha20poly1305::{ChaCha20Poly1305, Key, Nonce};
use rand::RngCore;
use serde::de::DeserializeOwned;
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::fmt;

const NONCE_LEN: usize = 12;

#[derive(Clone)]
pub struct Cipher {
    key: [u8; 32],
}

impl fmt::Debug for Cipher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Cipher").finish_non_exhaustive()
    }
}

impl Cipher {
    pub fn new(secret: &str) -> Self {
        let digest = Sha256::digest(secret.as_bytes());
        let mut key = [0u8; 32];
        key.copy_from_slice(&digest);
        Self { key }
    }

    fn aead(&self) -> ChaCha20Poly1305 {
        ChaCha20Poly1305::new(Key::from_slice(&self.key))
    }

    pub fn encrypt(&self, plaintext: &[u8]) -> Result<String> {
        let mut nonce_bytes = [0u8; NONCE_LEN];
        rand::thread_rng().fill_bytes(&mut nonce_bytes);

        let ciphertext = self
            .aead()
            .encrypt(Nonce::from_slice(&nonce_bytes), plaintext)
            .map_err(|_| Error::crypto("encryption failed"))?;

        let mut sealed = Vec::with_capacity(NONCE_LEN + ciphertext.len());
        sealed.extend_from_slice(&nonce_bytes);
        sealed.extend_from_slice(&ciphertext);
        Ok(URL_SAFE_NO_PAD.encode(sealed))
    }

    pub fn decrypt(&self, token: &str) -> Result<Vec<u8>> {
        let sealed = URL_SAFE_NO_PAD
            .decode(token.trim())
            .map_err(|e| Error::crypto(format!("invalid encoding: {}", e)))?;

        if sealed.len() <= NONCE_LEN {
            return Err(Error::crypto("sealed value too short"));
        }

        let (nonce, ciphertext) = sealed.split_at(NONCE_LEN);
        self.aead()
            .decrypt(Nonce::from_slice(nonce), ciphertext)
            .map_err(|_| Error::crypto("authentication failed"))
    }

    /// Serialize and encrypt a value
    pub fn seal<T: Serialize + ?Sized>(&self, value: &T) -> Result<String> {
        let json = serde_json::to_vec(value)?;
        self.encrypt(&json)
    }

    /// Decrypt and deserialize a value produced by [`Cipher::seal`]
    pub fn open<T: DeserializeOwned>(&self, token: &str) -> Result<T> {
        let plaintext = self.decrypt(token)?;
        serde_json::from_slice(&plaintext)
            .map_err(|e| Error::crypto(format!("invalid payload: {}", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};

    #[test]
    fn test_seal_and_open() {
        let cipher = Cipher::new("secret");
        let token = cipher.seal(&json!({"user": 7})).unwrap();

        assert!(!token.contains('+') && !token.contains('/') && !token.contains('='));
        let value: Value = cipher.open(&token).unwrap();
        assert_eq!(value, json!({"user": 7}));
    }

    #[test]
    fn test_nonce_differs_per_seal() {
        let cipher = Cipher::new("secret");
        assert_ne!(cipher.seal("same").unwrap(), cipher.seal("same").unwrap());
    }

    #[test]
    fn test_rejects_tampering_and_foreign_keys() {
        let cipher = Cipher::new("secret");
        let token = cipher.seal("payload").unwrap();

        let other = Cipher::new("another secret");
        assert!(matches!(other.open::<String>(&token), Err(Error::Crypto(_))));

        let mut bytes = URL_SAFE_NO_PAD.decode(&token).unwrap();
        let last = bytes.len() - 1;
        bytes[last] ^= 0x01;
        let tampered = URL_SAFE_NO_PAD.encode(bytes);
        assert!(cipher.open::<String>(&tampered).is_err());

        assert!(cipher.open::<String>("not base64 !!").is_err());
        assert!(cipher.open::<String>("").is_err());
    }
}
