//! Per-tenant content encryption port.

use crate::error::Result;

/// Symmetric AEAD encryption of payload content, keyed per tenant.
///
/// A missing tenant key is a hard error for writes: plaintext is never
/// stored when encryption was intended.
pub trait ContentCipher: Send + Sync {
    /// Encrypt plaintext for a tenant; returns an opaque ciphertext string
    fn encrypt(&self, tenant_id: &str, plaintext: &str) -> Result<String>;

    /// Decrypt a ciphertext produced by [`ContentCipher::encrypt`]
    fn decrypt(&self, tenant_id: &str, ciphertext: &str) -> Result<String>;
}
