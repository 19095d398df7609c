//! Shawe-Taylor provable primes, FIPS 186-4 C.6 and C.10.

use crate::ifc::{sqrt2_lower_bound, Seed};
use crate::{CipherError, DigestX};
use num_bigint::BigUint;
use num_integer::Integer;
use num_traits::{One, ToPrimitive};
use utils::{is_prime_u64, xor_in_place, BigUintExt, SecretUint};
use zeroize::Zeroizing;

/// output of [`st_random_prime`]
pub struct StPrime {
    pub prime: SecretUint,
    /// successor of the input seed
    pub seed: Seed,
    pub counter: usize,
}

/// output of [`provable_prime`]
pub struct ProvablePrime {
    pub prime: SecretUint,
    pub p1: SecretUint,
    pub p2: SecretUint,
    /// successor of the input seed
    pub seed: Seed,
}

/// Pocklington: c is prime if $gcd(z-1, c) = 1$ and $z^{c_0} \equiv 1 \mod c$,
/// where $z = a^{(c-1)/c_0}$ and $c_0 \gt \sqrt{c}$ is prime.
fn pocklington(z: &BigUint, c: &BigUint, c0: &BigUint) -> bool {
    // z may be 0
    let z_m1 = SecretUint::new((z + c - 1u32) % c);
    z_m1.gcd(c).is_one() && z.modpow(c0, c).is_one()
}

/// FIPS 186-4 C.6, random prime of exactly `length` bits constructed from `input_seed`.
///
/// `length < 33` primes are found by trial with a deterministic test, longer ones are
/// built from a recursively constructed prime $c_0$ of `⌈length/2⌉+1` bits and proven by
/// Pocklington's criterion.
pub fn st_random_prime<H: DigestX>(
    length: usize,
    input_seed: Seed,
    hasher: &mut H,
) -> Result<StPrime, CipherError> {
    if length < 2 {
        return Err(CipherError::InvalidParameter(format!(
            "shawe-taylor: prime length `{length}` is less than 2"
        )));
    }

    if length < 33 {
        return st_small_prime(length, input_seed, hasher);
    }

    let StPrime {
        prime: c0,
        seed: mut prime_seed,
        counter,
    } = st_random_prime(length.div_ceil(2) + 1, input_seed, hasher)?;

    let (old_counter, mut counter) = (counter, counter);
    let iterations = length.div_ceil(hasher.digest_bits_x()) - 1;
    let top = BigUint::one() << (length - 1);
    let upper = BigUint::one() << length;

    let x = prime_seed.hash_int(iterations, hasher);
    prime_seed.advance(iterations + 1);
    let x = SecretUint::new(&top + (x.as_biguint() % &top));

    let two_c0 = SecretUint::new(c0.as_biguint() << 1u32);
    let mut t = SecretUint::new(x.div_ceil(&two_c0));
    loop {
        if t.as_biguint() * two_c0.as_biguint() + 1u32 > upper {
            t = SecretUint::new(top.div_ceil(&two_c0));
        }

        let c = SecretUint::new(t.as_biguint() * two_c0.as_biguint() + 1u32);
        counter += 1;

        if BigUintExt(c.as_biguint()).has_small_factor() {
            // 跳过的候选值仍然消耗种子, 保证种子序列与逐个检验时一致
            prime_seed.advance(iterations + 1);
        } else {
            let a = prime_seed.hash_int(iterations, hasher);
            prime_seed.advance(iterations + 1);
            let a = SecretUint::new(a.as_biguint() % (c.as_biguint() - 3u32) + 2u32);
            let z = SecretUint::new(a.modpow(&(t.as_biguint() << 1u32), &c));

            if pocklington(&z, &c, &c0) {
                return Ok(StPrime {
                    prime: c,
                    seed: prime_seed,
                    counter,
                });
            }
        }

        if counter >= 4 * length + old_counter {
            return Err(CipherError::GenerationExhausted(format!(
                "shawe-taylor: no {length} bits prime after {} candidates",
                counter - old_counter
            )));
        }

        *t += 1u32;
    }
}

fn st_small_prime<H: DigestX>(
    length: usize,
    input_seed: Seed,
    hasher: &mut H,
) -> Result<StPrime, CipherError> {
    let (mut prime_seed, mut counter) = (input_seed, 0usize);
    let top = 1u64 << (length - 1);

    loop {
        let mut c = Zeroizing::new(prime_seed.hash_at(0, hasher).to_vec());
        xor_in_place(c.as_mut_slice(), prime_seed.hash_at(1, hasher).as_slice());
        let low = (BigUint::from_bytes_be(c.as_slice()) % top)
            .to_u64()
            .unwrap_or_default();
        let c = (top + low) | 1;

        counter += 1;
        prime_seed.advance(2);

        if is_prime_u64(c) {
            return Ok(StPrime {
                prime: SecretUint::new(BigUint::from(c)),
                seed: prime_seed,
                counter,
            });
        }

        if counter > 4 * length {
            return Err(CipherError::GenerationExhausted(format!(
                "shawe-taylor: no {length} bits prime after {counter} candidates"
            )));
        }
    }
}

fn aux_or_one<H: DigestX>(
    length: usize,
    seed: Seed,
    hasher: &mut H,
) -> Result<(SecretUint, Seed), CipherError> {
    if length == 1 {
        Ok((SecretUint::new(BigUint::one()), seed))
    } else {
        let StPrime { prime, seed, .. } = st_random_prime(length, seed, hasher)?;
        Ok((prime, seed))
    }
}

/// FIPS 186-4 C.10, provable prime `p` of `l` bits with $p_1 | p-1$, $p_2 | p+1$
/// and $gcd(p-1, e) = 1$.
///
/// `n1`/`n2` are the bit lengths of the auxiliary primes $p_1$/$p_2$, `1` means the
/// auxiliary prime is `1` (B.3.2.2 uses `n1 = n2 = 1`).
pub fn provable_prime<H: DigestX>(
    l: usize,
    n1: usize,
    n2: usize,
    first_seed: Seed,
    e: &BigUint,
    hasher: &mut H,
) -> Result<ProvablePrime, CipherError> {
    if n1 == 0 || n2 == 0 || l < 8 || n1 + n2 + l.div_ceil(2) + 1 >= l {
        return Err(CipherError::InvalidParameter(format!(
            "provable prime: auxiliary lengths `{n1}`, `{n2}` don't fit a {l} bits prime"
        )));
    }

    let (p1, seed) = aux_or_one(n1, first_seed, hasher)?;
    let (p2, seed) = aux_or_one(n2, seed, hasher)?;
    let StPrime {
        prime: p0,
        seed: mut pseed,
        ..
    } = st_random_prime(l.div_ceil(2) + 1, seed, hasher)?;

    let iterations = l.div_ceil(hasher.digest_bits_x()) - 1;
    let low = sqrt2_lower_bound(l);
    let upper = BigUint::one() << l;

    let x = pseed.hash_int(iterations, hasher);
    pseed.advance(iterations + 1);
    let x = SecretUint::new(&low + (x.as_biguint() % (&upper - &low)));

    let p0p1 = SecretUint::new(p0.as_biguint() * p1.as_biguint());
    if !p0p1.gcd(&p2).is_one() {
        return Err(CipherError::GenerationExhausted(
            "provable prime: p0*p1 and p2 aren't coprime".to_string(),
        ));
    }

    // y in [1, p2), y*p0*p1 = 1 mod p2
    let y = if p2.is_one() {
        SecretUint::new(BigUint::one())
    } else {
        SecretUint::new(BigUintExt(p0p1.as_biguint()).modinv(&p2).ok_or_else(|| {
            CipherError::GenerationExhausted(
                "provable prime: p0*p1 isn't invertible mod p2".to_string(),
            )
        })?)
    };

    let two_p0p1 = SecretUint::new(p0p1.as_biguint() << 1u32);
    let step = SecretUint::new(two_p0p1.as_biguint() * p2.as_biguint());
    let two_y_p0p1 = SecretUint::new(two_p0p1.as_biguint() * y.as_biguint());
    let mut t = SecretUint::new((two_y_p0p1.as_biguint() + x.as_biguint()).div_ceil(&step));
    let mut pgen_counter = 0usize;

    loop {
        // p = 2(t*p2 - y)*p0*p1 + 1
        let mut k = SecretUint::new(t.as_biguint() * p2.as_biguint() - y.as_biguint());
        if k.as_biguint() * two_p0p1.as_biguint() + 1u32 > upper {
            t = SecretUint::new((two_y_p0p1.as_biguint() + &low).div_ceil(&step));
            k = SecretUint::new(t.as_biguint() * p2.as_biguint() - y.as_biguint());
        }

        let p = SecretUint::new(k.as_biguint() * two_p0p1.as_biguint() + 1u32);
        pgen_counter += 1;

        if (p.as_biguint() - 1u32).gcd(e).is_one() {
            if BigUintExt(p.as_biguint()).has_small_factor() {
                pseed.advance(iterations + 1);
            } else {
                let a = pseed.hash_int(iterations, hasher);
                pseed.advance(iterations + 1);
                let a = SecretUint::new(a.as_biguint() % (p.as_biguint() - 3u32) + 2u32);
                let exp = SecretUint::new((k.as_biguint() << 1u32) * p1.as_biguint());
                let z = SecretUint::new(a.modpow(&exp, &p));

                if pocklington(&z, &p, &p0) {
                    return Ok(ProvablePrime {
                        prime: p,
                        p1,
                        p2,
                        seed: pseed,
                    });
                }
            }
        }

        if pgen_counter >= 5 * l {
            return Err(CipherError::GenerationExhausted(format!(
                "provable prime: no {l} bits prime after {pgen_counter} candidates"
            )));
        }

        *t += 1u32;
    }
}
