use crate::errors::CoreError;
use crate::models::portfolio::PortfolioBook;

use super::encryption::{self, KdfParams};
use super::format;

/// Whole-document persistence: the entire book is read and replaced in one
/// operation — there are no partial updates.
pub struct StorageManager;

impl StorageManager {
    /// Encrypt and serialize the book to portable bytes.
    ///
    /// Flow: PortfolioBook → bincode → AES-256-GCM(Argon2id(password)) → PFLO bytes
    pub fn save_to_bytes(book: &PortfolioBook, password: &str) -> Result<Vec<u8>, CoreError> {
        let plaintext = bincode::serialize(book)
            .map_err(|e| CoreError::Serialization(format!("Failed to serialize book: {e}")))?;

        let salt = encryption::generate_salt()?;
        let nonce = encryption::generate_nonce()?;

        let kdf_params = KdfParams::default();
        let key = encryption::derive_key(password, &salt, &kdf_params)?;

        let ciphertext = encryption::encrypt(&plaintext, &key, &nonce)?;

        Ok(format::write_file(
            format::CURRENT_VERSION,
            &kdf_params,
            &salt,
            &nonce,
            &ciphertext,
        ))
    }

    /// Decrypt and deserialize a book from raw bytes.
    ///
    /// Flow: PFLO bytes → parse header → Argon2id(password, salt) → decrypt → bincode → PortfolioBook
    pub fn load_from_bytes(data: &[u8], password: &str) -> Result<PortfolioBook, CoreError> {
        let (header, ciphertext) = format::read_file(data)?;

        let key = encryption::derive_key(password, &header.salt, &header.kdf_params)?;
        let plaintext = encryption::decrypt(ciphertext, &key, &header.nonce)?;

        bincode::deserialize(&plaintext)
            .map_err(|e| CoreError::Deserialization(format!("Failed to deserialize book: {e}")))
    }

    /// Save the book to an encrypted file on disk (native only).
    #[cfg(not(target_arch = "wasm32"))]
    pub fn save_to_file(
        book: &PortfolioBook,
        path: &str,
        password: &str,
    ) -> Result<(), CoreError> {
        let bytes = Self::save_to_bytes(book, password)?;
        std::fs::write(path, bytes)?;
        Ok(())
    }

    /// Load a book from an encrypted file on disk (native only).
    #[cfg(not(target_arch = "wasm32"))]
    pub fn load_from_file(path: &str, password: &str) -> Result<PortfolioBook, CoreError> {
        let bytes = std::fs::read(path)?;
        Self::load_from_bytes(&bytes, password)
    }
}
