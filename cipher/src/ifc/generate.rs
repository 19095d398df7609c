use crate::ifc::{
    aux_prime_lengths, check_exponent, distance_ok, get_seed, probable_prime_with_aux,
    provable_prime, security_strength, sqrt2_lower_bound, st_random_prime, AuxPrime, AuxPrimeKind,
    MillerRabinRounds, PrimePair, ProvablePrime, Seed, StPrime, IFC_APPROVED_LENGTHS,
};
use crate::{CipherError, DigestX, Rand};
use num_bigint::BigUint;
use num_integer::Integer;
use num_traits::One;
use std::fmt::{Display, Formatter};
use std::str::FromStr;
use utils::{BigUintExt, SecretUint};

const UNCONDITIONED_LENGTHS: [usize; 2] = [2048, 3072];

fn check_params(e: &BigUint, nlen: usize, lengths: &[usize]) -> Result<(), CipherError> {
    if !lengths.contains(&nlen) {
        return Err(CipherError::InvalidParameter(format!(
            "ifc: modulus length `{nlen}` isn't one of {lengths:?}"
        )));
    }

    check_exponent(e)
}

fn check_seed(seed: &Seed, nlen: usize) -> Result<(), CipherError> {
    let expect = security_strength(nlen).map(|s| s << 1).unwrap_or_default();
    if seed.bits() != expect {
        Err(CipherError::InvalidParameter(format!(
            "ifc: seed has {} bits, expect {expect} bits for {nlen} bits modulus",
            seed.bits()
        )))
    } else {
        Ok(())
    }
}

/// Draw `q` candidates from `next_q` until one is far enough from `p`.
///
/// C.10 and C.9 already bound their own search, this only bounds the number of
/// regenerated `q`.
fn far_enough_pair<F>(p: SecretUint, l: usize, mut next_q: F) -> Result<PrimePair, CipherError>
where
    F: FnMut() -> Result<SecretUint, CipherError>,
{
    for i in 0..(5 * l) {
        let q = next_q()?;
        if distance_ok(&p, &q, l) {
            return Ok(PrimePair::new(p, q));
        }
        log::trace!("ifc: q #{i} too close to p, regenerate");
    }

    Err(CipherError::GenerationExhausted(
        "ifc: every q is too close to p".to_string(),
    ))
}

/// FIPS 186-4 B.3.2.2, provable primes `p`, `q` of `nlen/2` bits constructed from `seed`.
///
/// `nlen` must be 2048 or 3072, `seed` must have `2 * security_strength(nlen)` bits.
pub fn generate_provable_primes<H: DigestX>(
    e: &BigUint,
    nlen: usize,
    seed: Seed,
    hasher: &mut H,
) -> Result<PrimePair, CipherError> {
    check_params(e, nlen, &UNCONDITIONED_LENGTHS)?;
    check_seed(&seed, nlen)?;

    let l = nlen >> 1;
    let ProvablePrime {
        prime: p, seed, ..
    } = provable_prime(l, 1, 1, seed, e, hasher)?;

    let mut working_seed = Some(seed);
    far_enough_pair(p, l, || {
        let seed = working_seed.take().ok_or_else(|| {
            CipherError::GenerationExhausted("ifc: seed consumed by a failed step".to_string())
        })?;
        let ProvablePrime { prime, seed, .. } = provable_prime(l, 1, 1, seed, e, hasher)?;
        working_seed = Some(seed);
        Ok(prime)
    })
}

fn probable_candidate<R, F>(
    l: usize,
    e: &BigUint,
    rounds: usize,
    rng: &mut R,
    far_enough: F,
) -> Result<SecretUint, CipherError>
where
    R: Rand,
    F: Fn(&BigUint) -> bool,
{
    let low = sqrt2_lower_bound(l);
    let mut i = 0usize;

    loop {
        let x = SecretUint::new(BigUintExt::<BigUint>::random_odd_bits(l, rng));
        if x.as_biguint() < &low || !far_enough(x.as_biguint()) {
            continue;
        }

        i += 1;
        if (x.as_biguint() - 1u32).gcd(e).is_one()
            && BigUintExt(x.as_biguint()).probably_prime_test(rounds, rng)
        {
            log::debug!("ifc: {l} bits probable prime found after {i} candidates");
            return Ok(x);
        }

        if i >= 5 * l {
            return Err(CipherError::GenerationExhausted(format!(
                "ifc: no {l} bits probable prime after {i} candidates"
            )));
        }
    }
}

/// FIPS 186-4 B.3.3, random probable primes `p`, `q` of `nlen/2` bits.
///
/// `nlen` must be 2048 or 3072.
pub fn generate_probable_primes<R: Rand>(
    e: &BigUint,
    nlen: usize,
    rng: &mut R,
) -> Result<PrimePair, CipherError> {
    check_params(e, nlen, &UNCONDITIONED_LENGTHS)?;
    let rounds = MillerRabinRounds::for_ifc(nlen)?.prime;

    let l = nlen >> 1;
    let p = probable_candidate(l, e, rounds, rng, |_| true)?;
    let q = probable_candidate(l, e, rounds, rng, |q| distance_ok(&p, q, l))?;

    Ok(PrimePair::new(p, q))
}

/// FIPS 186-4 B.3.4, provable primes with provable auxiliary primes, constructed from `seed`.
pub fn generate_provable_primes_with_conditions<H: DigestX>(
    e: &BigUint,
    nlen: usize,
    seed: Seed,
    hasher: &mut H,
) -> Result<PrimePair, CipherError> {
    check_params(e, nlen, &IFC_APPROVED_LENGTHS)?;
    check_seed(&seed, nlen)?;

    let l = nlen >> 1;
    let (n1, n2) = aux_prime_lengths(nlen, AuxPrimeKind::Provable)?;
    let ProvablePrime {
        prime: p, seed, ..
    } = provable_prime(l, n1, n2, seed, e, hasher)?;

    let mut working_seed = Some(seed);
    far_enough_pair(p, l, || {
        let seed = working_seed.take().ok_or_else(|| {
            CipherError::GenerationExhausted("ifc: seed consumed by a failed step".to_string())
        })?;
        let ProvablePrime { prime, seed, .. } = provable_prime(l, n1, n2, seed, e, hasher)?;
        working_seed = Some(seed);
        Ok(prime)
    })
}

/// where the auxiliary primes of B.3.5/B.3.6 come from
#[derive(Debug)]
pub enum ConditionMode {
    /// B.3.5: Shawe-Taylor auxiliary primes constructed from the seed
    SeedDriven(Seed),
    /// B.3.6: auxiliary primes searched from random odd start values
    DirectRandom,
}

/// smallest probable prime `>= x` for a random odd `x` of `bits` bits
fn next_probable_aux<R: Rand>(
    bits: usize,
    rounds: usize,
    rng: &mut R,
) -> Result<SecretUint, CipherError> {
    let mut x = SecretUint::new(BigUintExt::<BigUint>::random_odd_bits(bits, rng));
    for _ in 0..(5 * bits) {
        if x.bits() as usize != bits {
            x = SecretUint::new(BigUintExt::<BigUint>::random_odd_bits(bits, rng));
        }

        if BigUintExt(x.as_biguint()).probably_prime_test(rounds, rng) {
            return Ok(x);
        }

        *x += 2u32;
    }

    Err(CipherError::GenerationExhausted(format!(
        "ifc: no {bits} bits auxiliary prime after {} candidates",
        5 * bits
    )))
}

/// B.3.5/B.3.6 step 4 onwards: p from one auxiliary pair, then q from fresh auxiliary pairs
/// until both $|p-q|$ and $|X_p - X_q|$ exceed $2^{nlen/2-100}$.
fn combine_pair<R, F>(
    e: &BigUint,
    nlen: usize,
    rng: &mut R,
    mut aux_pair: F,
) -> Result<PrimePair, CipherError>
where
    R: Rand,
    F: FnMut(&mut R) -> Result<(SecretUint, SecretUint), CipherError>,
{
    let l = nlen >> 1;
    let (p1, p2) = aux_pair(&mut *rng)?;
    let AuxPrime {
        prime: p,
        witness: xp,
    } = probable_prime_with_aux(&p1, &p2, nlen, e, rng)?;

    for i in 0..(5 * l) {
        let (q1, q2) = aux_pair(&mut *rng)?;
        let AuxPrime {
            prime: q,
            witness: xq,
        } = probable_prime_with_aux(&q1, &q2, nlen, e, rng)?;

        if distance_ok(&p, &q, l) && distance_ok(&xp, &xq, l) {
            return Ok(PrimePair::new(p, q));
        }
        log::trace!("ifc: q #{i} too close to p, regenerate");
    }

    Err(CipherError::GenerationExhausted(
        "ifc: every q is too close to p".to_string(),
    ))
}

/// FIPS 186-4 B.3.5 (`SeedDriven`) and B.3.6 (`DirectRandom`), probable primes with
/// auxiliary primes.
pub fn generate_probable_primes_with_conditions<H: DigestX, R: Rand>(
    e: &BigUint,
    nlen: usize,
    mode: ConditionMode,
    hasher: &mut H,
    rng: &mut R,
) -> Result<PrimePair, CipherError> {
    check_params(e, nlen, &IFC_APPROVED_LENGTHS)?;

    match mode {
        ConditionMode::SeedDriven(seed) => {
            check_seed(&seed, nlen)?;
            let (n1, n2) = aux_prime_lengths(nlen, AuxPrimeKind::Provable)?;

            let mut working_seed = Some(seed);
            combine_pair(e, nlen, rng, |_| {
                let seed = working_seed.take().ok_or_else(|| {
                    CipherError::GenerationExhausted(
                        "ifc: seed consumed by a failed step".to_string(),
                    )
                })?;
                let StPrime {
                    prime: a1, seed, ..
                } = st_random_prime(n1, seed, hasher)?;
                let StPrime {
                    prime: a2, seed, ..
                } = st_random_prime(n2, seed, hasher)?;
                working_seed = Some(seed);
                Ok((a1, a2))
            })
        }
        ConditionMode::DirectRandom => {
            let (n1, n2) = aux_prime_lengths(nlen, AuxPrimeKind::Probable)?;
            let rounds = MillerRabinRounds::for_ifc(nlen)?.aux;

            combine_pair(e, nlen, rng, |rng| {
                let a1 = next_probable_aux(n1, rounds, rng)?;
                let a2 = next_probable_aux(n2, rounds, rng)?;
                Ok((a1, a2))
            })
        }
    }
}

/// A prime pair generation method together with its input.
#[derive(Debug)]
pub enum PrimeGen {
    Provable(Seed),
    Probable,
    ProvableWithConditions(Seed),
    ProbableWithConditions(ConditionMode),
}

impl PrimeGen {
    pub fn method(&self) -> PrimeMethod {
        match self {
            Self::Provable(_) => PrimeMethod::Provable,
            Self::Probable => PrimeMethod::Probable,
            Self::ProvableWithConditions(_) => PrimeMethod::ProvableWithConditions,
            Self::ProbableWithConditions(ConditionMode::SeedDriven(_)) => {
                PrimeMethod::ProbableWithConditions
            }
            Self::ProbableWithConditions(ConditionMode::DirectRandom) => {
                PrimeMethod::ProbableWithConditionsDirect
            }
        }
    }

    pub fn generate<H: DigestX, R: Rand>(
        self,
        e: &BigUint,
        nlen: usize,
        hasher: &mut H,
        rng: &mut R,
    ) -> Result<PrimePair, CipherError> {
        log::debug!("ifc: generate {nlen} bits modulus primes by `{}`", self.method());
        match self {
            Self::Provable(seed) => generate_provable_primes(e, nlen, seed, hasher),
            Self::Probable => generate_probable_primes(e, nlen, rng),
            Self::ProvableWithConditions(seed) => {
                generate_provable_primes_with_conditions(e, nlen, seed, hasher)
            }
            Self::ProbableWithConditions(mode) => {
                generate_probable_primes_with_conditions(e, nlen, mode, hasher, rng)
            }
        }
    }
}

/// Name of a [`PrimeGen`] method without its input.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PrimeMethod {
    /// B.3.2.2
    Provable,
    /// B.3.3
    Probable,
    /// B.3.4
    ProvableWithConditions,
    /// B.3.5
    ProbableWithConditions,
    /// B.3.6
    ProbableWithConditionsDirect,
}

impl PrimeMethod {
    pub const ALL: [PrimeMethod; 5] = [
        Self::Provable,
        Self::Probable,
        Self::ProvableWithConditions,
        Self::ProbableWithConditions,
        Self::ProbableWithConditionsDirect,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Self::Provable => "provable",
            Self::Probable => "probable",
            Self::ProvableWithConditions => "provable-cond",
            Self::ProbableWithConditions => "probable-cond",
            Self::ProbableWithConditionsDirect => "probable-cond-direct",
        }
    }

    pub fn needs_seed(&self) -> bool {
        matches!(
            self,
            Self::Provable | Self::ProvableWithConditions | Self::ProbableWithConditions
        )
    }

    pub fn approved_lengths(&self) -> &'static [usize] {
        match self {
            Self::Provable | Self::Probable => &UNCONDITIONED_LENGTHS,
            _ => &IFC_APPROVED_LENGTHS,
        }
    }

    /// Bind the method to its input. Seeded methods use `seed`, or a fresh one drawn
    /// from `rng` when `seed` is `None`; the other methods ignore `seed`.
    pub fn prime_gen<R: Rand>(
        self,
        nlen: usize,
        seed: Option<Seed>,
        rng: &mut R,
    ) -> Result<PrimeGen, CipherError> {
        let seed = match (self.needs_seed(), seed) {
            (true, Some(s)) => Some(s),
            (true, None) => Some(get_seed(nlen, rng)?),
            (false, _) => None,
        };

        Ok(match (self, seed) {
            (Self::Provable, Some(s)) => PrimeGen::Provable(s),
            (Self::ProvableWithConditions, Some(s)) => PrimeGen::ProvableWithConditions(s),
            (Self::ProbableWithConditions, Some(s)) => {
                PrimeGen::ProbableWithConditions(ConditionMode::SeedDriven(s))
            }
            (Self::ProbableWithConditionsDirect, _) => {
                PrimeGen::ProbableWithConditions(ConditionMode::DirectRandom)
            }
            _ => PrimeGen::Probable,
        })
    }
}

impl Display for PrimeMethod {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for PrimeMethod {
    type Err = CipherError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|m| m.name() == s)
            .ok_or_else(|| {
                CipherError::InvalidParameter(format!(
                    "ifc: unknown prime generation method `{s}`"
                ))
            })
    }
}

#[cfg(test)]
mod tests {
    use crate::ifc::tests::PanicRand;
    use crate::ifc::{
        generate_probable_primes, generate_probable_primes_with_conditions,
        generate_provable_primes, generate_provable_primes_with_conditions, get_seed,
        ConditionMode, PrimeGen, PrimeMethod, Seed,
    };
    use crate::{CipherError, DefaultDigest, DefaultRand};
    use num_bigint::BigUint;
    use num_traits::Num;
    use utils::SecretUint;

    fn e() -> BigUint {
        BigUint::from(65537u32)
    }

    #[test]
    fn provable_2048() {
        let (mut h, mut rng) = (DefaultDigest::default(), DefaultRand::default());
        let seed = get_seed(2048, &mut rng).unwrap();
        let pair = generate_provable_primes(&e(), 2048, seed, &mut h).unwrap();
        pair.check(&e(), 2048, 40, &mut rng).unwrap();
        assert_eq!(pair.modulus().bits(), 2048);
    }

    #[test]
    fn provable_is_deterministic() {
        let mut h = DefaultDigest::default();
        let s = "d5e8a3c1f09b47261e3c5a7f9b0d2e4f6a8c1e3b5d7f9a0c2e4b6d81";
        let seed = || Seed::from_biguint(BigUint::from_str_radix(s, 16).unwrap());
        let a = generate_provable_primes(&e(), 2048, seed(), &mut h).unwrap();
        let b = generate_provable_primes(&e(), 2048, seed(), &mut h).unwrap();
        assert_eq!(a.p(), b.p());
        assert_eq!(a.q(), b.q());
    }

    #[test]
    fn probable_2048() {
        let mut rng = DefaultRand::default();
        let pair = generate_probable_primes(&e(), 2048, &mut rng).unwrap();
        pair.check(&e(), 2048, 40, &mut rng).unwrap();
    }

    #[test]
    fn probable_3072() {
        let mut rng = DefaultRand::default();
        let pair = generate_probable_primes(&e(), 3072, &mut rng).unwrap();
        pair.check(&e(), 3072, 40, &mut rng).unwrap();
        assert_eq!(pair.modulus().bits(), 3072);
    }

    #[test]
    fn provable_with_conditions() {
        let (mut h, mut rng) = (DefaultDigest::default(), DefaultRand::default());
        // 224 bits seed, 2048 bits modulus
        let seed = get_seed(2048, &mut rng).unwrap();
        assert_eq!(seed.bits(), 224);
        let pair = generate_provable_primes_with_conditions(&e(), 2048, seed, &mut h).unwrap();
        pair.check(&e(), 2048, 40, &mut rng).unwrap();
        assert_eq!(pair.modulus().bits(), 2048);

        let seed = get_seed(1024, &mut rng).unwrap();
        let pair = generate_provable_primes_with_conditions(&e(), 1024, seed, &mut h).unwrap();
        pair.check(&e(), 1024, 40, &mut rng).unwrap();
    }

    #[test]
    fn probable_with_conditions() {
        let (mut h, mut rng) = (DefaultDigest::default(), DefaultRand::default());
        let seed = get_seed(1024, &mut rng).unwrap();
        let mode = ConditionMode::SeedDriven(seed);
        let pair =
            generate_probable_primes_with_conditions(&e(), 1024, mode, &mut h, &mut rng).unwrap();
        pair.check(&e(), 1024, 40, &mut rng).unwrap();

        let mode = ConditionMode::DirectRandom;
        let pair =
            generate_probable_primes_with_conditions(&e(), 1024, mode, &mut h, &mut rng).unwrap();
        pair.check(&e(), 1024, 40, &mut rng).unwrap();
        assert_eq!(pair.modulus().bits(), 1024);

        let mode = ConditionMode::DirectRandom;
        let pair =
            generate_probable_primes_with_conditions(&e(), 2048, mode, &mut h, &mut rng).unwrap();
        pair.check(&e(), 2048, 40, &mut rng).unwrap();
        assert_eq!(pair.modulus().bits(), 2048);

        let seed = get_seed(3072, &mut rng).unwrap();
        let mode = ConditionMode::SeedDriven(seed);
        let pair =
            generate_probable_primes_with_conditions(&e(), 3072, mode, &mut h, &mut rng).unwrap();
        pair.check(&e(), 3072, 40, &mut rng).unwrap();
        assert_eq!(pair.modulus().bits(), 3072);
    }

    #[test]
    fn close_q_exhausts() {
        let p = BigUint::from_str_radix("c5d1e4f3a2b19087", 16).unwrap() << 136u32;
        let mut calls = 0usize;
        let res = super::far_enough_pair(SecretUint::new(p.clone()), 200, || {
            calls += 1;
            Ok(SecretUint::new(p.clone() + 1u32))
        });
        let err = res.err().unwrap();
        assert!(matches!(err, CipherError::GenerationExhausted(_)), "{err:?}");
        assert!(err.is_retryable());
        assert_eq!(calls, 5 * 200);
    }

    #[test]
    fn probable_candidate_exhausts() {
        // x - 1 is always even, so gcd(x - 1, 2) never is 1
        let mut rng = DefaultRand::default();
        let res = super::probable_candidate(64, &BigUint::from(2u32), 1, &mut rng, |_| true);
        let err = res.err().unwrap();
        assert!(matches!(err, CipherError::GenerationExhausted(_)), "{err:?}");
        assert!(err.is_retryable());
    }

    #[test]
    fn aux_search_exhausts() {
        // the only odd 1 bit value is 1, and 1 + 2 already has 2 bits
        let mut rng = DefaultRand::default();
        let err = super::next_probable_aux(1, 1, &mut rng).err().unwrap();
        assert!(matches!(err, CipherError::GenerationExhausted(_)), "{err:?}");
        assert!(err.is_retryable());

        assert!(super::next_probable_aux(2, 1, &mut rng).is_ok());
    }

    #[test]
    fn small_exponent_rejected_before_any_work() {
        let (mut h, mut rng) = (DefaultDigest::default(), DefaultRand::default());
        let e = BigUint::from(3u32);

        for method in PrimeMethod::ALL {
            let gen = method.prime_gen(2048, None, &mut rng).unwrap();
            let res = gen.generate(&e, 2048, &mut h, &mut PanicRand);
            assert!(
                matches!(res, Err(CipherError::InvalidParameter(_))),
                "{method}: {res:?}"
            );
        }
    }

    #[test]
    fn bad_lengths() {
        let (mut h, mut rng) = (DefaultDigest::default(), DefaultRand::default());

        // B.3.2.2 and B.3.3 don't cover 1024
        let seed = get_seed(1024, &mut rng).unwrap();
        let res = generate_provable_primes(&e(), 1024, seed, &mut h);
        assert!(matches!(res, Err(CipherError::InvalidParameter(_))));
        let res = generate_probable_primes(&e(), 1024, &mut PanicRand);
        assert!(matches!(res, Err(CipherError::InvalidParameter(_))));

        // 160 bits seed for a 2048 bits modulus
        let seed = get_seed(1024, &mut rng).unwrap();
        let res = generate_provable_primes_with_conditions(&e(), 2048, seed, &mut h);
        assert!(matches!(res, Err(CipherError::InvalidParameter(_))));

        let seed = get_seed(3072, &mut rng).unwrap();
        let mode = ConditionMode::SeedDriven(seed);
        let res = generate_probable_primes_with_conditions(&e(), 2048, mode, &mut h, &mut PanicRand);
        assert!(matches!(res, Err(CipherError::InvalidParameter(_))));
    }

    #[test]
    fn method_names() {
        for method in PrimeMethod::ALL {
            assert_eq!(method.name().parse::<PrimeMethod>().unwrap(), method);
            assert_eq!(method.to_string(), method.name());
        }
        assert!("fast".parse::<PrimeMethod>().is_err());

        let mut rng = DefaultRand::default();
        let gen = PrimeMethod::ProbableWithConditions
            .prime_gen(1024, None, &mut rng)
            .unwrap();
        assert!(matches!(
            gen,
            PrimeGen::ProbableWithConditions(ConditionMode::SeedDriven(_))
        ));
        assert_eq!(gen.method(), PrimeMethod::ProbableWithConditions);
        assert!(PrimeMethod::Provable.prime_gen(512, None, &mut rng).is_err());
    }
}
