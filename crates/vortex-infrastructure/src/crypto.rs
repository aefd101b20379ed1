//! Per-tenant AES-256-GCM content encryption.
//!
//! Each tenant's key derives from the master key (`SHA-256(master || tenant)`),
//! with optional explicit per-tenant keys layered on top. Ciphertexts are
//! `base64(nonce || ct)`; the nonce is random per encryption. Decryption for
//! the wrong tenant fails rather than yielding garbage; GCM authenticates.

use std::collections::HashMap;

use aes_gcm::aead::{Aead, AeadCore, KeyInit, OsRng};
use aes_gcm::{Aes256Gcm, Key, Nonce};
use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use sha2::{Digest, Sha256};

use vortex_domain::error::{Error, Result};
use vortex_domain::ports::crypto::ContentCipher;

const NONCE_LEN: usize = 12;

/// Per-tenant AEAD cipher.
pub struct TenantEncryption {
    master_key: Vec<u8>,
    explicit_keys: HashMap<String, [u8; 32]>,
}

impl TenantEncryption {
    /// Cipher deriving tenant keys from `master_key`.
    #[must_use]
    pub fn new(master_key: &str) -> Self {
        Self {
            master_key: master_key.as_bytes().to_vec(),
            explicit_keys: HashMap::new(),
        }
    }

    /// Register an explicit key for one tenant (from the secrets store).
    #[must_use]
    pub fn with_tenant_key(mut self, tenant_id: &str, key: [u8; 32]) -> Self {
        self.explicit_keys.insert(tenant_id.to_owned(), key);
        self
    }

    fn tenant_key(&self, tenant_id: &str) -> [u8; 32] {
        if let Some(key) = self.explicit_keys.get(tenant_id) {
            return *key;
        }
        let mut hasher = Sha256::new();
        hasher.update(&self.master_key);
        hasher.update(tenant_id.as_bytes());
        hasher.finalize().into()
    }

    fn cipher_for(&self, tenant_id: &str) -> Aes256Gcm {
        let key = self.tenant_key(tenant_id);
        Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(&key))
    }
}

impl ContentCipher for TenantEncryption {
    fn encrypt(&self, tenant_id: &str, plaintext: &str) -> Result<String> {
        let cipher = self.cipher_for(tenant_id);
        let nonce = Aes256Gcm::generate_nonce(&mut OsRng);
        let ciphertext = cipher
            .encrypt(&nonce, plaintext.as_bytes())
            .map_err(|_| Error::encryption(format!("encryption failed for tenant '{tenant_id}'")))?;

        let mut blob = Vec::with_capacity(NONCE_LEN + ciphertext.len());
        blob.extend_from_slice(&nonce);
        blob.extend_from_slice(&ciphertext);
        Ok(BASE64.encode(blob))
    }

    fn decrypt(&self, tenant_id: &str, ciphertext: &str) -> Result<String> {
        let blob = BASE64
            .decode(ciphertext)
            .map_err(|_| Error::encryption("ciphertext is not valid base64"))?;
        if blob.len() <= NONCE_LEN {
            return Err(Error::encryption("ciphertext too short"));
        }
        let (nonce, body) = blob.split_at(NONCE_LEN);

        let cipher = self.cipher_for(tenant_id);
        let plaintext = cipher
            .decrypt(Nonce::from_slice(nonce), body)
            .map_err(|_| Error::encryption(format!("decryption failed for tenant '{tenant_id}'")))?;
        String::from_utf8(plaintext).map_err(|_| Error::encryption("plaintext is not valid UTF-8"))
    }
}
