//! Random byte source used by every key generation routine.
//!
//! Prime generation, seed drawing and OAEP seeds all pull their randomness
//! through [`Rand`], so the caller decides which generator backs them. The
//! default is [`DefaultRand`], the operating system's CSPRNG.

pub trait Rand: Default {
    /// fill `random` with fresh random bytes
    fn rand(&mut self, random: &mut [u8]);
}

mod default_rand;
pub use default_rand::DefaultRand;

impl<T: xrand::RngCore + xrand::CryptoRng + Default> Rand for T {
    fn rand(&mut self, random: &mut [u8]) {
        self.fill_bytes(random);
    }
}
