//! MGF1, RFC 8017 B.2.1

use crate::{CipherError, DigestX};
use utils::xor_in_place;
use zeroize::Zeroizing;

/// `dst ^= MGF1(seed, dst.len())`
pub fn mgf1_xor<H: DigestX>(hasher: &mut H, seed: &[u8], dst: &mut [u8]) -> Result<(), CipherError> {
    let hlen = hasher.digest_len_x();
    let max = (hlen as u128) << 32;
    if dst.len() as u128 > max {
        return Err(CipherError::MaskTooLong {
            max,
            real: dst.len(),
        });
    }

    // T = Hash(seed || C0) || Hash(seed || C1) || ...
    for (counter, block) in dst.chunks_mut(hlen).enumerate() {
        hasher.reset_x();
        hasher.write_x(seed);
        hasher.write_x(&(counter as u32).to_be_bytes());
        let digest = Zeroizing::new(hasher.finish_x());
        xor_in_place(block, digest.as_slice());
    }

    Ok(())
}

/// mask of `len` bytes generated from `seed`, `len` at most $2^{32} \cdot hLen$
pub fn mgf1<H: DigestX>(hasher: &mut H, seed: &[u8], len: usize) -> Result<Vec<u8>, CipherError> {
    let hlen = hasher.digest_len_x();
    if len as u128 > (hlen as u128) << 32 {
        return Err(CipherError::MaskTooLong {
            max: (hlen as u128) << 32,
            real: len,
        });
    }

    let mut mask = vec![0u8; len];
    mgf1_xor(hasher, seed, mask.as_mut_slice())?;
    Ok(mask)
}

#[cfg(test)]
mod tests {
    use crate::rsa::{mgf1, mgf1_xor};
    use crate::DefaultDigest;

    #[test]
    fn mgf1_sha256() {
        let mut h = DefaultDigest::default();
        let expect = [
            0xb0, 0x9c, 0x6b, 0xfc, 0x05, 0x94, 0xf0, 0xa3, 0xcc, 0xa2, 0x5c, 0xa1, 0xb2, 0x35,
            0x81, 0xd8, 0x9b, 0x6c, 0xed, 0xf8, 0xc5, 0x2a, 0x3b, 0x40, 0xf7, 0x32, 0x95, 0x1d,
            0x86, 0x0f, 0x51, 0x29, 0x56, 0x44, 0xe5, 0x67, 0x33, 0xd6, 0xa0, 0x87, 0x93, 0x30,
            0xe8, 0x2f, 0x19, 0x39, 0x3f, 0x9d, 0xf9, 0x9f, 0x63, 0x28, 0xda, 0x1b, 0x36, 0xfb,
            0x2d, 0xed, 0x58, 0xdd, 0x57, 0xfb, 0x2c, 0x61,
        ];

        let mask = mgf1(&mut h, b"mgf1Seed", expect.len()).unwrap();
        assert_eq!(mask, expect);

        // prefix of a longer mask
        let mask = mgf1(&mut h, b"mgf1Seed", 40).unwrap();
        assert_eq!(mask.as_slice(), &expect[..40]);
        assert!(mgf1(&mut h, b"mgf1Seed", 0).unwrap().is_empty());

        let mut x = expect;
        mgf1_xor(&mut h, b"mgf1Seed", &mut x).unwrap();
        assert!(x.iter().all(|&b| b == 0));
    }
}
