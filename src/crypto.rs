//! Passphrase-based sealing of the persisted log document.
//!
//! Layout: `version (1) || m_cost (4, LE) || t_cost (4, LE) || salt (32) ||
//! nonce (12) || ciphertext`, where the plaintext is `MAGIC || document`.
//! The KDF cost travels with the file so it can be raised without breaking
//! older vaults.

use aes_gcm::{
    aead::{Aead, KeyInit},
    Aes256Gcm, Nonce,
};
use argon2::{Algorithm, Argon2, Params, Version};
use rand::RngCore;
use zeroize::{Zeroize, Zeroizing};

const FORMAT_VERSION: u8 = 1;
const COST_LEN: usize = 8;
const SALT_LEN: usize = 32;
const NONCE_LEN: usize = 12;
const KEY_LEN: usize = 32;
const HEADER_LEN: usize = 1 + COST_LEN + SALT_LEN + NONCE_LEN;
/// Checked after decryption to tell a wrong passphrase from a valid document.
const MAGIC: &[u8] = b"LUNARA_V1";
/// Refuse headers asking for more than 1 GiB of KDF memory.
const MAX_MEMORY_KIB: u32 = 1 << 20;
/// Refuse headers asking for more than 64 Argon2 passes.
const MAX_ITERATIONS: u32 = 64;

/// Argon2id cost parameters (single lane).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KdfCost {
    pub memory_kib: u32,
    pub iterations: u32,
}

impl Default for KdfCost {
    /// 64 MiB, 3 passes.
    fn default() -> Self {
        Self {
            memory_kib: 65536,
            iterations: 3,
        }
    }
}

impl KdfCost {
    /// Minimum cost Argon2 accepts. Only for tests and throwaway vaults.
    pub fn minimal() -> Self {
        Self {
            memory_kib: 8,
            iterations: 1,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum CryptoError {
    #[error("key derivation failed")]
    KeyDerivation,
    #[error("encryption failed")]
    Encryption,
    #[error("decryption failed: wrong passphrase or corrupted data")]
    Decryption,
    #[error("invalid data format")]
    InvalidFormat,
    #[error("unsupported format version {0}")]
    UnsupportedVersion(u8),
}

fn derive_key(
    passphrase: &str,
    salt: &[u8],
    cost: KdfCost,
) -> Result<Zeroizing<[u8; KEY_LEN]>, CryptoError> {
    if cost.memory_kib > MAX_MEMORY_KIB || cost.iterations > MAX_ITERATIONS {
        return Err(CryptoError::InvalidFormat);
    }
    let params = Params::new(cost.memory_kib, cost.iterations, 1, Some(KEY_LEN))
        .map_err(|_| CryptoError::KeyDerivation)?;
    let argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, params);

    let mut key = Zeroizing::new([0u8; KEY_LEN]);
    argon2
        .hash_password_into(passphrase.as_bytes(), salt, &mut *key)
        .map_err(|_| CryptoError::KeyDerivation)?;
    Ok(key)
}

fn cipher_for(passphrase: &str, salt: &[u8], cost: KdfCost) -> Result<Aes256Gcm, CryptoError> {
    let key = derive_key(passphrase, salt, cost)?;
    Aes256Gcm::new_from_slice(&key[..]).map_err(|_| CryptoError::KeyDerivation)
}

/// Seal `document` under `passphrase` with a fresh salt and nonce.
pub fn seal(passphrase: &str, document: &[u8], cost: KdfCost) -> Result<Vec<u8>, CryptoError> {
    let mut header = [0u8; HEADER_LEN];
    header[0] = FORMAT_VERSION;
    header[1..5].copy_from_slice(&cost.memory_kib.to_le_bytes());
    header[5..9].copy_from_slice(&cost.iterations.to_le_bytes());
    rand::thread_rng().fill_bytes(&mut header[1 + COST_LEN..]);
    let (salt, nonce) = header[1 + COST_LEN..].split_at(SALT_LEN);

    let cipher = cipher_for(passphrase, salt, cost)?;

    let mut payload = Zeroizing::new(Vec::with_capacity(MAGIC.len() + document.len()));
    payload.extend_from_slice(MAGIC);
    payload.extend_from_slice(document);

    let ciphertext = cipher
        .encrypt(Nonce::from_slice(nonce), payload.as_slice())
        .map_err(|_| CryptoError::Encryption)?;

    let mut sealed = Vec::with_capacity(HEADER_LEN + ciphertext.len());
    sealed.extend_from_slice(&header);
    sealed.extend_from_slice(&ciphertext);
    Ok(sealed)
}

/// Open bytes produced by [`seal`].
pub fn open(passphrase: &str, sealed: &[u8]) -> Result<Vec<u8>, CryptoError> {
    if sealed.len() < HEADER_LEN + MAGIC.len() {
        return Err(CryptoError::InvalidFormat);
    }
    if sealed[0] != FORMAT_VERSION {
        return Err(CryptoError::UnsupportedVersion(sealed[0]));
    }

    let (cost_bytes, rest) = sealed[1..].split_at(COST_LEN);
    let (salt, rest) = rest.split_at(SALT_LEN);
    let (nonce, ciphertext) = rest.split_at(NONCE_LEN);
    let cost = KdfCost {
        memory_kib: u32::from_le_bytes([cost_bytes[0], cost_bytes[1], cost_bytes[2], cost_bytes[3]]),
        iterations: u32::from_le_bytes([cost_bytes[4], cost_bytes[5], cost_bytes[6], cost_bytes[7]]),
    };

    let cipher = cipher_for(passphrase, salt, cost)?;
    let mut decrypted = cipher
        .decrypt(Nonce::from_slice(nonce), ciphertext)
        .map_err(|_| CryptoError::Decryption)?;

    if !decrypted.starts_with(MAGIC) {
        decrypted.zeroize();
        return Err(CryptoError::Decryption);
    }
    let document = decrypted.split_off(MAGIC.len());
    decrypted.zeroize();
    Ok(document)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sealed_document_opens_with_same_passphrase() {
        let sealed = seal("correct horse", b"[]", KdfCost::minimal()).unwrap();
        assert_eq!(sealed[0], FORMAT_VERSION);
        assert_eq!(open("correct horse", &sealed).unwrap(), b"[]");
    }

    #[test]
    fn default_cost_round_trips() {
        let sealed = seal("pass", b"{}", KdfCost::default()).unwrap();
        assert_eq!(open("pass", &sealed).unwrap(), b"{}");
    }

    #[test]
    fn oversized_cost_header_rejected() {
        let mut sealed = seal("pass", b"logs", KdfCost::minimal()).unwrap();
        sealed[1..5].copy_from_slice(&u32::MAX.to_le_bytes());
        assert!(matches!(open("pass", &sealed), Err(CryptoError::InvalidFormat)));
    }

    #[test]
    fn excessive_iterations_header_rejected() {
        let mut sealed = seal("pass", b"logs", KdfCost::minimal()).unwrap();
        sealed[5..9].copy_from_slice(&u32::MAX.to_le_bytes());
        assert!(matches!(open("pass", &sealed), Err(CryptoError::InvalidFormat)));
    }

    #[test]
    fn wrong_passphrase_fails() {
        let sealed = seal("correct", b"logs", KdfCost::minimal()).unwrap();
        assert!(matches!(open("wrong", &sealed), Err(CryptoError::Decryption)));
    }

    #[test]
    fn tampered_ciphertext_fails() {
        let mut sealed = seal("pass", b"logs", KdfCost::minimal()).unwrap();
        let last = sealed.len() - 1;
        sealed[last] ^= 0xff;
        assert!(matches!(open("pass", &sealed), Err(CryptoError::Decryption)));
    }

    #[test]
    fn truncated_and_foreign_data_rejected() {
        assert!(matches!(open("any", &[0u8; 10]), Err(CryptoError::InvalidFormat)));

        let mut sealed = seal("pass", b"logs", KdfCost::minimal()).unwrap();
        sealed[0] = 9;
        assert!(matches!(
            open("pass", &sealed),
            Err(CryptoError::UnsupportedVersion(9))
        ));
    }
}
