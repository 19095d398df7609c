use digest::{Digest, FixedOutputReset};

/// Hash capability injected into MGF1, OAEP and the hash-driven prime constructions.
///
/// Every RustCrypto hash (`sha2::Sha256`, `sha2::Sha512`, ...) implements it.
pub trait DigestX {
    fn digest_bits_x(&self) -> usize;
    fn write_x(&mut self, data: &[u8]);
    /// finalize and reset to the initial state
    fn finish_x(&mut self) -> Vec<u8>;
    fn reset_x(&mut self);

    fn digest_len_x(&self) -> usize {
        (self.digest_bits_x() + 7) >> 3
    }

    /// one-shot digest of `data`, discards any pending input
    fn digest_x(&mut self, data: &[u8]) -> Vec<u8> {
        self.reset_x();
        self.write_x(data);
        self.finish_x()
    }
}

impl<T> DigestX for T
where
    T: Digest + FixedOutputReset,
{
    fn digest_bits_x(&self) -> usize {
        <T as Digest>::output_size() << 3
    }

    fn write_x(&mut self, data: &[u8]) {
        Digest::update(self, data);
    }

    fn finish_x(&mut self) -> Vec<u8> {
        Digest::finalize_reset(self).to_vec()
    }

    fn reset_x(&mut self) {
        Digest::reset(self);
    }
}

#[cfg(test)]
mod tests {
    use crate::DigestX;
    use sha2::{Sha256, Sha512};

    #[test]
    fn sha2_capability() {
        let mut h = Sha256::default();
        assert_eq!(h.digest_len_x(), 32);
        let d = h.digest_x(b"abc");
        assert_eq!(
            d,
            [
                0xba, 0x78, 0x16, 0xbf, 0x8f, 0x01, 0xcf, 0xea, 0x41, 0x41, 0x40, 0xde, 0x5d, 0xae,
                0x22, 0x23, 0xb0, 0x03, 0x61, 0xa3, 0x96, 0x17, 0x7a, 0x9c, 0xb4, 0x10, 0xff, 0x61,
                0xf2, 0x00, 0x15, 0xad
            ]
        );

        h.write_x(b"ab");
        h.write_x(b"c");
        assert_eq!(h.finish_x(), d, "finish_x must leave the hasher reset");
        assert_eq!(Sha512::default().digest_len_x(), 64);
    }
}
