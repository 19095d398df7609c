//! IFC(Integer Factorization Cryptography) prime pair generation, FIPS 186-4 Appendix B.3 and C.
//!
//! - B.3.2.2: provable primes, [`generate_provable_primes`];
//! - B.3.3: probable primes, [`generate_probable_primes`];
//! - B.3.4: provable primes with conditions, [`generate_provable_primes_with_conditions`];
//! - B.3.5/B.3.6: probable primes with conditions, [`generate_probable_primes_with_conditions`];
//! - C.6: Shawe-Taylor random prime, [`st_random_prime`];
//! - C.9: probable prime from two auxiliary primes, [`probable_prime_with_aux`];
//! - C.10: provable prime from contemporaneously constructed auxiliary primes, [`provable_prime`];
//!
//! 生成过程中的种子, 辅助素数, 见证值以及候选素数都保存在[`SecretUint`]中, 无论成功还是失败, 返回前都会被清零.
//! 所有随机搜索都有迭代上限, 超过上限返回[`CipherError::GenerationExhausted`], 由调用者决定是否用新的种子重试.

use crate::{CipherError, Rand};
use num_bigint::BigUint;
use num_integer::Integer;
use num_traits::One;
use std::fmt::{Debug, Formatter};
use utils::{BigUintExt, SecretUint};

mod seed;
pub use seed::{get_seed, Seed};

mod shawe_taylor;
pub use shawe_taylor::{provable_prime, st_random_prime, ProvablePrime, StPrime};

mod aux_prime;
pub use aux_prime::{probable_prime_with_aux, AuxPrime};

mod generate;
pub use generate::{
    generate_probable_primes, generate_probable_primes_with_conditions, generate_provable_primes,
    generate_provable_primes_with_conditions, ConditionMode, PrimeGen, PrimeMethod,
};

/// modulus bit lengths approved for IFC key pair generation
pub const IFC_APPROVED_LENGTHS: [usize; 3] = [1024, 2048, 3072];

pub fn is_approved_length(nlen: usize) -> bool {
    IFC_APPROVED_LENGTHS.contains(&nlen)
}

/// security strength in bits of an `nlen`-bit modulus, SP 800-57 part 1 table 2
pub fn security_strength(nlen: usize) -> Option<usize> {
    match nlen {
        1024 => Some(80),
        2048 => Some(112),
        3072 => Some(128),
        7680 => Some(192),
        15360 => Some(256),
        _ => None,
    }
}

/// Minimum Miller-Rabin rounds, FIPS 186-4 table C.2.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MillerRabinRounds {
    /// rounds for the auxiliary primes p1, p2, q1, q2
    pub aux: usize,
    /// rounds for p and q
    pub prime: usize,
}

impl MillerRabinRounds {
    pub fn for_ifc(nlen: usize) -> Result<Self, CipherError> {
        let (aux, prime) = match nlen {
            1024 => (28, 5),
            2048 => (38, 5),
            3072 => (41, 4),
            _ => {
                return Err(CipherError::InvalidParameter(format!(
                    "ifc: unapproved modulus length `{nlen}`"
                )))
            }
        };

        Ok(Self { aux, prime })
    }
}

/// which column of table B.1 applies to the auxiliary primes
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AuxPrimeKind {
    Provable,
    Probable,
}

/// Bit lengths of the two auxiliary primes of p (or of q), FIPS 186-4 table B.1.
///
/// Table B.1 only bounds the lengths: each one must exceed the minimum and
/// their sum must stay below the maximum. Both get `min + 1` bits.
pub fn aux_prime_lengths(nlen: usize, kind: AuxPrimeKind) -> Result<(usize, usize), CipherError> {
    // (min len of each, max len of the sum)
    let (min, max_sum) = match (nlen, kind) {
        (1024, AuxPrimeKind::Provable) => (104, 496),
        (1024, AuxPrimeKind::Probable) => (100, 239),
        (2048, AuxPrimeKind::Provable) => (144, 1007),
        (2048, AuxPrimeKind::Probable) => (140, 494),
        (3072, AuxPrimeKind::Provable) => (176, 1518),
        (3072, AuxPrimeKind::Probable) => (170, 750),
        _ => {
            return Err(CipherError::InvalidParameter(format!(
                "ifc: unapproved modulus length `{nlen}`"
            )))
        }
    };

    let len = min + 1;
    debug_assert!(len + len < max_sum);
    Ok((len, len))
}

/// $\lfloor \sqrt{2} \cdot 2^{l-1} \rfloor$ approximated from above by `665857/470832`
pub(crate) fn sqrt2_lower_bound(l: usize) -> BigUint {
    (BigUint::from(665857u32) << (l - 1)) / 470832u32
}

/// $|a - b| > 2^{l-100}$
pub(crate) fn distance_ok(a: &BigUint, b: &BigUint, l: usize) -> bool {
    let bound = BigUint::one() << (l - 100);
    let diff = if a > b {
        SecretUint::new(a - b)
    } else {
        SecretUint::new(b - a)
    };
    diff.as_biguint() > &bound
}

/// public exponent must be odd and $2^{16} \lt e \lt 2^{256}$
pub(crate) fn check_exponent(e: &BigUint) -> Result<(), CipherError> {
    if e.is_even() || e.bits() <= 16 || e.bits() > 256 || e == &(BigUint::one() << 16u32) {
        Err(CipherError::InvalidParameter(format!(
            "ifc: public exponent {e:#x} must be odd and in (2^16, 2^256)"
        )))
    } else {
        Ok(())
    }
}

/// The generated primes `p` and `q`, wiped on drop.
pub struct PrimePair {
    p: SecretUint,
    q: SecretUint,
}

impl PrimePair {
    pub(crate) fn new(p: SecretUint, q: SecretUint) -> Self {
        Self { p, q }
    }

    pub fn p(&self) -> &BigUint {
        self.p.as_biguint()
    }

    pub fn q(&self) -> &BigUint {
        self.q.as_biguint()
    }

    /// n = p * q
    pub fn modulus(&self) -> BigUint {
        self.p.as_biguint() * self.q.as_biguint()
    }

    /// Check the pair against the IFC key requirements: both primes are
    /// `nlen/2` bits and pass `rounds` Miller-Rabin rounds, `gcd(p-1, e) = gcd(q-1, e) = 1`
    /// and $|p-q| \gt 2^{nlen/2-100}$.
    pub fn check<R: Rand>(
        &self,
        e: &BigUint,
        nlen: usize,
        rounds: usize,
        rng: &mut R,
    ) -> Result<(), CipherError> {
        let l = nlen >> 1;
        for (name, x) in [("p", self.p()), ("q", self.q())] {
            if x.bits() as usize != l {
                return Err(CipherError::InvalidPrivateKey(format!(
                    "ifc: {name} has {} bits, expect {l}",
                    x.bits()
                )));
            }

            if !(x - 1u32).gcd(e).is_one() {
                return Err(CipherError::InvalidPrivateKey(format!(
                    "ifc: gcd({name}-1, e) != 1"
                )));
            }

            if !BigUintExt(x).probably_prime_test(rounds, rng) {
                return Err(CipherError::InvalidPrivateKey(format!(
                    "ifc: {name} is not prime"
                )));
            }
        }

        if !distance_ok(self.p(), self.q(), l) {
            return Err(CipherError::InvalidPrivateKey(
                "ifc: p and q are too close".to_string(),
            ));
        }

        Ok(())
    }
}

impl Debug for PrimePair {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "PrimePair {{ p: {} bits, q: {} bits }}", self.p.bits(), self.q.bits())
    }
}
