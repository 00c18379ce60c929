//! Secrets manager boundary.
//!
//! The platform's secrets manager is an external collaborator. The
//! provisioning pipeline treats it as a black box that maps opaque strings in
//! both directions: tenant secret values arrive encrypted and are decrypted
//! only at the moment an adapter materializes them into a platform secret
//! object. Decrypted values must never be logged.

use thiserror::Error;

/// Errors from the secrets boundary.
#[derive(Debug, Error)]
pub enum CipherError {
    /// The ciphertext could not be decrypted.
    #[error("failed to decrypt secret: {0}")]
    Decrypt(String),

    /// The plaintext could not be encrypted.
    #[error("failed to encrypt secret: {0}")]
    Encrypt(String),
}

/// Black-box encrypt/decrypt over opaque strings.
///
/// Implementations wrap whatever secrets manager the deployment uses. The
/// pipeline only ever calls these two methods and makes no assumption about
/// the ciphertext format.
pub trait SecretCipher: Send + Sync {
    /// Encrypt a plaintext secret value.
    ///
    /// # Errors
    ///
    /// Returns a [`CipherError`] if the backing secrets manager rejects the
    /// operation.
    fn encrypt(&self, plaintext: &str) -> Result<String, CipherError>;

    /// Decrypt a ciphertext secret value.
    ///
    /// # Errors
    ///
    /// Returns a [`CipherError`] if the ciphertext cannot be decrypted.
    fn decrypt(&self, ciphertext: &str) -> Result<String, CipherError>;
}

/// Identity cipher for development and tests.
///
/// Passes values through unchanged. Production deployments replace this with
/// a real secrets-manager client.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlaintextCipher;

impl SecretCipher for PlaintextCipher {
    fn encrypt(&self, plaintext: &str) -> Result<String, CipherError> {
        Ok(plaintext.to_string())
    }

    fn decrypt(&self, ciphertext: &str) -> Result<String, CipherError> {
        Ok(ciphertext.to_string())
    }
}
