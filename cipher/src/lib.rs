mod error;
pub use error::CipherError;

pub use rand::{DefaultRand, Rand};

mod hash;
pub use hash::DigestX;

/// hash used when the caller has no preference
pub type DefaultDigest = sha2::Sha256;

pub mod ifc;
pub mod rsa;

pub trait Encrypt {
    // 写入ciphertext之前不清空
    fn encrypt(&self, plaintext: &[u8], ciphertext: &mut Vec<u8>) -> Result<(), CipherError>;
}

pub trait Decrypt {
    // 写入plaintext之前不清空
    fn decrypt(&self, ciphertext: &[u8], plaintext: &mut Vec<u8>) -> Result<(), CipherError>;
}
