//! At-rest encryption of scratch file contents.
//!
//! Keys are generated per table from the OS random source and never leave
//! memory. Entries are sealed with ChaCha20-Poly1305 (`nonce || ciphertext`);
//! content keys are replaced by a keyed BLAKE3 hash so the dedup map stays
//! a deterministic lookup without holding plaintext.

use chacha20poly1305::aead::{Aead, AeadCore, KeyInit, OsRng};
use chacha20poly1305::{ChaCha20Poly1305, Key, Nonce};
use rand::RngCore;
use zeroize::Zeroizing;

use crate::store::{StoreError, StoreResult};

const ENTRY_KEY_CONTEXT: &str = "duke-sst 2024-06-01 scratch entry encryption";
const CONTENT_KEY_CONTEXT: &str = "duke-sst 2024-06-01 scratch content key hashing";
const NONCE_LEN: usize = 12;

/// Per-table encryption state
pub struct EntryCipher {
    aead: ChaCha20Poly1305,
    hash_key: Zeroizing<[u8; 32]>,
}

impl EntryCipher {
    /// Draw a fresh random master key and derive the subkeys
    pub fn generate() -> Self {
        let mut master = Zeroizing::new([0u8; 32]);
        rand::rngs::OsRng.fill_bytes(master.as_mut());
        Self::from_master_key(&master)
    }

    fn from_master_key(master: &[u8; 32]) -> Self {
        let entry_key = Zeroizing::new(blake3::derive_key(ENTRY_KEY_CONTEXT, master));
        let hash_key = Zeroizing::new(blake3::derive_key(CONTENT_KEY_CONTEXT, master));
        Self {
            aead: ChaCha20Poly1305::new(Key::from_slice(entry_key.as_ref())),
            hash_key,
        }
    }

    /// Encrypt a record as `nonce || ciphertext`
    pub fn seal(&self, plaintext: &[u8]) -> StoreResult<Vec<u8>> {
        let nonce = ChaCha20Poly1305::generate_nonce(&mut OsRng);
        let ciphertext = self
            .aead
            .encrypt(&nonce, plaintext)
            .map_err(|e| StoreError::Cipher(format!("Encryption failed: {e}")))?;
        let mut sealed = Vec::with_capacity(NONCE_LEN + ciphertext.len());
        sealed.extend_from_slice(&nonce);
        sealed.extend_from_slice(&ciphertext);
        Ok(sealed)
    }

    /// Decrypt a record produced by [`EntryCipher::seal`]
    pub fn open(&self, sealed: &[u8]) -> StoreResult<Vec<u8>> {
        if sealed.len() < NONCE_LEN {
            return Err(StoreError::Cipher(format!(
                "sealed record too short: {} bytes",
                sealed.len()
            )));
        }
        let (nonce, ciphertext) = sealed.split_at(NONCE_LEN);
        self.aead
            .decrypt(Nonce::from_slice(nonce), ciphertext)
            .map_err(|e| StoreError::Cipher(format!("Decryption failed: {e}")))
    }

    /// Deterministic, keyed digest of a content key
    pub fn content_key(&self, key: &str) -> [u8; 32] {
        *blake3::keyed_hash(&self.hash_key, key.as_bytes()).as_bytes()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seal_and_open() {
        let cipher = EntryCipher::generate();
        let sealed = cipher.seal(b"<si><t>secret</t></si>").unwrap();
        assert!(!sealed
            .windows(b"secret".len())
            .any(|w| w == b"secret"));
        assert_eq!(cipher.open(&sealed).unwrap(), b"<si><t>secret</t></si>");
    }

    #[test]
    fn test_nonces_differ() {
        let cipher = EntryCipher::generate();
        assert_ne!(cipher.seal(b"same").unwrap(), cipher.seal(b"same").unwrap());
    }

    #[test]
    fn test_tampered_record_rejected() {
        let cipher = EntryCipher::generate();
        let mut sealed = cipher.seal(b"payload").unwrap();
        let last = sealed.len() - 1;
        sealed[last] ^= 0x01;
        assert!(matches!(cipher.open(&sealed), Err(StoreError::Cipher(_))));
        assert!(matches!(cipher.open(&[0u8; 4]), Err(StoreError::Cipher(_))));
    }

    #[test]
    fn test_content_keys_are_per_table() {
        let a = EntryCipher::generate();
        let b = EntryCipher::generate();
        assert_eq!(a.content_key("x"), a.content_key("x"));
        assert_ne!(a.content_key("x"), a.content_key("y"));
        assert_ne!(a.content_key("x"), b.content_key("x"));
    }

    #[test]
    fn test_other_table_cannot_open() {
        let a = EntryCipher::generate();
        let b = EntryCipher::generate();
        let sealed = a.seal(b"payload").unwrap();
        assert!(b.open(&sealed).is_err());
    }
}
