use crate::ifc::{sqrt2_lower_bound, MillerRabinRounds};
use crate::{CipherError, Rand};
use num_bigint::BigUint;
use num_integer::Integer;
use num_traits::{One, Zero};
use utils::{BigUintExt, SecretUint};

/// output of [`probable_prime_with_aux`]
pub struct AuxPrime {
    pub prime: SecretUint,
    /// the random start value `X` the prime was searched from
    pub witness: SecretUint,
}

/// FIPS 186-4 C.9, probable prime `Y` of `nlen/2` bits from the auxiliary primes `p1` and `p2`,
/// so that $p_1 | Y-1$, $p_2 | Y+1$ and $gcd(Y-1, e) = 1$.
///
/// Candidates are `R + k * 2p1p2` where $R \equiv 1 \mod 2p_1$, $R \equiv -1 \mod p_2$.
/// Resampling the start value and stepping `Y` share one budget of `5 * nlen/2` candidates.
pub fn probable_prime_with_aux<R: Rand>(
    p1: &BigUint,
    p2: &BigUint,
    nlen: usize,
    e: &BigUint,
    rng: &mut R,
) -> Result<AuxPrime, CipherError> {
    let rounds = MillerRabinRounds::for_ifc(nlen)?.prime;

    let two_p1 = SecretUint::new(p1 << 1u32);
    if p1.is_zero() || p2.is_zero() || !two_p1.gcd(p2).is_one() {
        return Err(CipherError::InvalidParameter(
            "aux prime: gcd(2*p1, p2) != 1".to_string(),
        ));
    }

    let inv_p2 = SecretUint::new(BigUintExt(p2).modinv(&two_p1).ok_or_else(|| {
        CipherError::InvalidParameter("aux prime: p2 isn't invertible mod 2*p1".to_string())
    })?);
    let inv_2p1 = SecretUint::new(BigUintExt(two_p1.as_biguint()).modinv(p2).ok_or_else(|| {
        CipherError::InvalidParameter("aux prime: 2*p1 isn't invertible mod p2".to_string())
    })?);

    // R mod 2p1p2, both terms of R = inv_p2*p2 - inv_2p1*2p1 are already in [0, 2p1p2)
    let step = SecretUint::new(two_p1.as_biguint() * p2);
    let r_pos = SecretUint::new(inv_p2.as_biguint() * p2);
    let r_neg = SecretUint::new(inv_2p1.as_biguint() * two_p1.as_biguint());
    let r = SecretUint::new(
        (r_pos.as_biguint() + step.as_biguint() - r_neg.as_biguint()) % step.as_biguint(),
    );

    let l = nlen >> 1;
    let (low, upper) = (sqrt2_lower_bound(l), BigUint::one() << l);
    let mut i = 0usize;

    'resample: loop {
        let x = loop {
            let mut x = BigUintExt::<BigUint>::random_bits(l, rng);
            x.set_bit(l as u64 - 1, true);
            if x >= low {
                break SecretUint::new(x);
            }
            utils::wipe_biguint(&mut x);
        };

        let x_mod = SecretUint::new(x.as_biguint() % step.as_biguint());
        let offset = SecretUint::new(
            (r.as_biguint() + step.as_biguint() - x_mod.as_biguint()) % step.as_biguint(),
        );
        let mut y = SecretUint::new(x.as_biguint() + offset.as_biguint());

        loop {
            i += 1;
            if i > 5 * l {
                log::debug!("aux prime: {l} bits search exhausted after {} candidates", i - 1);
                return Err(CipherError::GenerationExhausted(format!(
                    "aux prime: no {l} bits prime after {} candidates",
                    i - 1
                )));
            }

            // 重新选取X也消耗同一个5L计数, 不按每个X重置
            if y.as_biguint() >= &upper {
                continue 'resample;
            }

            if (y.as_biguint() - 1u32).gcd(e).is_one()
                && BigUintExt(y.as_biguint()).probably_prime_test(rounds, rng)
            {
                return Ok(AuxPrime {
                    prime: y,
                    witness: x,
                });
            }

            *y += step.as_biguint();
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::ifc::tests::PanicRand;
    use crate::ifc::{get_seed, probable_prime_with_aux, st_random_prime};
    use crate::{CipherError, DefaultDigest, DefaultRand};
    use num_bigint::BigUint;
    use num_integer::Integer;
    use num_traits::{One, Zero};
    use utils::BigUintExt;

    #[test]
    fn combiner() {
        let (mut h, mut rng) = (DefaultDigest::default(), DefaultRand::default());
        let e = BigUint::from(65537u32);

        for nlen in [1024usize, 2048] {
            let seed = get_seed(nlen, &mut rng).unwrap();
            let p1 = st_random_prime(141, seed, &mut h).unwrap();
            let p2 = st_random_prime(141, p1.seed, &mut h).unwrap();
            let (p1, p2) = (p1.prime, p2.prime);

            let aux = probable_prime_with_aux(&p1, &p2, nlen, &e, &mut rng).unwrap();
            let y = aux.prime.as_biguint();
            assert_eq!(y.bits() as usize, nlen / 2);
            assert!(BigUintExt(y).probably_prime_test(40, &mut rng));
            assert!((y - 1u32).gcd(&e).is_one());
            assert!((y % (p1.as_biguint() << 1u32)).is_one());
            assert!(((y + 1u32) % p2.as_biguint()).is_zero());
            assert!(aux.witness.as_biguint() <= y);
            assert_eq!(aux.witness.bits() as usize, nlen / 2);
        }
    }

    #[test]
    fn combiner_rejects_common_factor() {
        let e = BigUint::from(65537u32);
        let (p1, p2) = (BigUint::from(101u32), BigUint::from(202u32));
        assert!(probable_prime_with_aux(&p1, &p2, 1024, &e, &mut PanicRand).is_err());
        assert!(probable_prime_with_aux(&p1, &p1, 1024, &e, &mut PanicRand).is_err());
        let p2 = BigUint::from(103u32);
        assert!(probable_prime_with_aux(&p1, &p2, 512, &e, &mut PanicRand).is_err());
    }

    #[test]
    fn combiner_exhausts() {
        // 2*p1*p2 is about 2^601, Y = X + offset practically never stays below 2^512
        let one = BigUint::one();
        let (p1, p2) = ((&one << 300u32) + 1u32, (&one << 300u32) - 1u32);
        let e = BigUint::from(65537u32);

        let res = probable_prime_with_aux(&p1, &p2, 1024, &e, &mut DefaultRand::default());
        let err = res.err().unwrap();
        assert!(matches!(err, CipherError::GenerationExhausted(_)), "{err:?}");
        assert!(err.is_retryable());
    }
}
