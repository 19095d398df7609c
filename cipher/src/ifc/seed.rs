use crate::ifc::{is_approved_length, security_strength};
use crate::{CipherError, DigestX, Rand};
use num_bigint::BigUint;
use std::fmt::{Debug, Formatter};
use utils::{BigUintExt, SecretUint};
use zeroize::Zeroizing;

/// Seed of the hash-driven prime constructions (FIPS 186-4 C.6, C.10).
///
/// `Seed` is consumed by every construction step and the successor is handed
/// back in the result, so one seed value has exactly one owner.
pub struct Seed {
    value: SecretUint,
    // byte width of `Hash(seed + i)` input
    len: usize,
}

impl Seed {
    /// wrap an externally supplied seed, the generators check its bit length
    pub fn from_biguint(value: BigUint) -> Self {
        let len = BigUintExt(&value).byte_len();
        Self {
            value: SecretUint::new(value),
            len,
        }
    }

    pub fn bits(&self) -> usize {
        self.value.bits() as usize
    }

    pub fn as_biguint(&self) -> &BigUint {
        self.value.as_biguint()
    }

    /// Hash(seed + offset), the input is the big-endian encoding of `seed + offset`
    /// with the width of the seed, or its natural width if the sum carries over.
    pub(super) fn hash_at<H: DigestX>(&self, offset: usize, hasher: &mut H) -> Zeroizing<Vec<u8>> {
        let v = SecretUint::new(self.value.as_biguint() + offset as u64);
        let bytes = Zeroizing::new(
            BigUintExt(v.as_biguint())
                .to_be_bytes_len(self.len)
                .unwrap_or_else(|| v.to_bytes_be()),
        );

        Zeroizing::new(hasher.digest_x(bytes.as_slice()))
    }

    /// $\sum_{i=0}^{iterations} Hash(seed + i) \cdot 2^{i \cdot outlen}$
    pub(super) fn hash_int<H: DigestX>(&self, iterations: usize, hasher: &mut H) -> SecretUint {
        let mut buf = Zeroizing::new(Vec::with_capacity((iterations + 1) * hasher.digest_len_x()));
        for i in (0..=iterations).rev() {
            buf.extend_from_slice(self.hash_at(i, hasher).as_slice());
        }

        SecretUint::new(BigUint::from_bytes_be(buf.as_slice()))
    }

    /// seed += n, the old value is wiped
    pub(super) fn advance(&mut self, n: usize) {
        self.value = SecretUint::new(self.value.as_biguint() + n as u64);
    }
}

impl Debug for Seed {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "Seed({} bits)", self.bits())
    }
}

/// FIPS 186-4 B.3.2.1 step 5 / B.3.4: a fresh seed of `2 * security_strength(nlen)` bits,
/// the most significant bit is always set.
pub fn get_seed<R: Rand>(nlen: usize, rng: &mut R) -> Result<Seed, CipherError> {
    let strength = security_strength(nlen)
        .filter(|_| is_approved_length(nlen))
        .ok_or_else(|| {
            CipherError::InvalidParameter(format!("ifc: unapproved modulus length `{nlen}`"))
        })?;

    let bits = strength << 1;
    let mut x = BigUintExt::<BigUint>::random_bits(bits, rng);
    x.set_bit(bits as u64 - 1, true);

    Ok(Seed::from_biguint(x))
}

#[cfg(test)]
mod tests {
    use crate::ifc::{get_seed, Seed};
    use crate::{DefaultDigest, DefaultRand, DigestX};
    use num_bigint::BigUint;

    #[test]
    fn seed_len() {
        let mut rng = DefaultRand::default();
        for (nlen, bits) in [(1024, 160), (2048, 224), (3072, 256)] {
            for _ in 0..8 {
                let seed = get_seed(nlen, &mut rng).unwrap();
                assert_eq!(seed.bits(), bits);
            }
        }

        for nlen in [512, 4096, 7680] {
            assert!(get_seed(nlen, &mut rng).is_err(), "{nlen}");
        }
    }

    #[test]
    fn seed_hash() {
        let mut h = DefaultDigest::default();
        // 0x80ff + 1 keeps the two byte width
        let seed = Seed::from_biguint(BigUint::from(0x80ffu32));
        assert_eq!(seed.hash_at(1, &mut h).as_slice(), h.digest_x(&[0x81, 0x00]).as_slice());

        // carry past the width falls back to the natural encoding
        let seed = Seed::from_biguint(BigUint::from(0xffu32));
        assert_eq!(seed.hash_at(1, &mut h).as_slice(), h.digest_x(&[0x01, 0x00]).as_slice());

        let mut seed = Seed::from_biguint(BigUint::from(0x80u32));
        let x = seed.hash_int(1, &mut h);
        let mut expect = h.digest_x(&[0x81]);
        expect.extend(h.digest_x(&[0x80]));
        assert_eq!(x.as_biguint(), &BigUint::from_bytes_be(&expect));

        seed.advance(2);
        assert_eq!(seed.as_biguint(), &BigUint::from(0x82u32));
        assert_eq!(format!("{seed:?}"), "Seed(8 bits)");
    }
}
