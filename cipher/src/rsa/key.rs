//! 参考RFC 8017 section 3 (key types) and 5 (cryptographic primitives)
use crate::CipherError;
use num_bigint::BigUint;
use num_integer::Integer;
use num_traits::{One, Zero};
use std::fmt::{Debug, Display, Formatter};
use utils::{BigUintExt, SecretUint};

#[derive(Clone, Debug, PartialOrd, PartialEq, Ord, Eq)]
pub struct PublicKey {
    // n = p * q
    n: BigUint,
    // public exponent, gcd(e, lambda(n)) = 1
    e: BigUint,
}

#[derive(Clone)]
pub struct PrivateKey {
    pk: PublicKey,
    // d * e = 1 % lambda(n)
    d: SecretUint,
    crt: Option<CrtValue>,
}

// 预计算值, 加速私钥的计算
#[derive(Clone)]
struct CrtValue {
    p: SecretUint,
    q: SecretUint,
    // d % (p - 1)
    d_p: SecretUint,
    // d % (q - 1)
    d_q: SecretUint,
    // q^{-1} % p
    q_inv: SecretUint,
}

impl PublicKey {
    /// n: RSA modulus
    /// e: public key exponent
    /// note: not to check the `n` and `exp` are right RSA parameters
    pub fn new_uncheck(n: BigUint, exp: BigUint) -> Self {
        Self { e: exp, n }
    }

    /// note: not to check the `n` and `exp` are right RSA parameters
    pub fn from_be_bytes(n: &[u8], exp: &[u8]) -> Self {
        Self {
            e: BigUint::from_bytes_be(exp),
            n: BigUint::from_bytes_be(n),
        }
    }

    /// n
    pub fn modulus(&self) -> &BigUint {
        &self.n
    }

    /// e
    pub fn exponent(&self) -> &BigUint {
        &self.e
    }

    /// byte length `k` of the modulus
    pub fn key_len(&self) -> usize {
        BigUintExt(&self.n).byte_len()
    }

    fn check_range(&self, x: &BigUint, op: &str) -> Result<(), CipherError> {
        if x < &self.n {
            Ok(())
        } else {
            Err(CipherError::OutOfRange(format!(
                "{op}: representative out of range, need less than {:#x}",
                self.n
            )))
        }
    }

    /// RSAEP: RSA Encrypt primitive, $m^e \mod n$
    pub fn rsaep(&self, m: &BigUint) -> Result<BigUint, CipherError> {
        self.check_range(m, "rsaep")?;
        Ok(m.modpow(&self.e, &self.n))
    }

    /// RSAVP1: RSA Verification primitive, $s^e \mod n$
    pub fn rsavp1(&self, s: &BigUint) -> Result<BigUint, CipherError> {
        self.check_range(s, "rsavp1")?;
        Ok(s.modpow(&self.e, &self.n))
    }

    pub fn is_valid(&self) -> Result<(), CipherError> {
        if self.n.is_even() || self.n.bits() < 16 {
            Err(CipherError::InvalidPublicKey(format!(
                "rsa: invalid modulus {:#x}",
                self.n
            )))
        } else if self.e < BigUint::from(3u8) || self.e.is_even() || self.e >= self.n {
            Err(CipherError::InvalidPublicKey(format!(
                "rsa: invalid public exponent {:#x}",
                self.e
            )))
        } else {
            Ok(())
        }
    }
}

impl PrivateKey {
    /// private key without the prime factors, `rsadp`/`rsasp1` fall back to $c^d \mod n$
    pub fn new_uncheck(modulus: BigUint, public_exp: BigUint, private_exp: BigUint) -> Self {
        Self {
            pk: PublicKey::new_uncheck(modulus, public_exp),
            d: SecretUint::new(private_exp),
            crt: None,
        }
    }

    /// FIPS 186-4 B.3.1: $n = p \cdot q$, $d = e^{-1} \mod lcm(p-1, q-1)$.
    ///
    /// `d` must be greater than $2^{nlen/2}$, otherwise the pair is rejected with the
    /// retryable [`CipherError::GenerationExhausted`].
    pub fn from_primes(p: &BigUint, q: &BigUint, e: &BigUint) -> Result<Self, CipherError> {
        if p == q || p <= &BigUint::one() || q <= &BigUint::one() {
            return Err(CipherError::InvalidParameter(
                "rsa: p and q must be distinct primes".to_string(),
            ));
        }

        let n = p * q;
        let (p_m1, q_m1) = (SecretUint::new(p - 1u32), SecretUint::new(q - 1u32));
        let lambda = SecretUint::new(p_m1.lcm(&q_m1));
        let d = SecretUint::new(BigUintExt(e).modinv(&lambda).ok_or_else(|| {
            CipherError::InvalidParameter(format!(
                "rsa: public exponent {e:#x} isn't invertible mod lcm(p-1, q-1)"
            ))
        })?);

        if private_exponent_too_small(&d, n.bits()) {
            return Err(CipherError::GenerationExhausted(
                "rsa: private exponent d <= 2^(nlen/2)".to_string(),
            ));
        }

        let q_inv = BigUintExt(q).modinv(p).ok_or_else(|| {
            CipherError::InvalidParameter("rsa: q isn't invertible mod p".to_string())
        })?;
        let crt = CrtValue {
            p: SecretUint::new(p.clone()),
            q: SecretUint::new(q.clone()),
            d_p: SecretUint::new(d.as_biguint() % p_m1.as_biguint()),
            d_q: SecretUint::new(d.as_biguint() % q_m1.as_biguint()),
            q_inv: SecretUint::new(q_inv),
        };

        Ok(Self {
            pk: PublicKey::new_uncheck(n, e.clone()),
            d,
            crt: Some(crt),
        })
    }

    pub fn public_key(&self) -> &PublicKey {
        &self.pk
    }

    pub fn private_exponent(&self) -> &BigUint {
        self.d.as_biguint()
    }

    /// RSADP: RSA Decrypt primitive, $c^d \mod n$
    pub fn rsadp(&self, c: &BigUint) -> Result<BigUint, CipherError> {
        self.pk.check_range(c, "rsadp")?;
        Ok(self.rsadp_uncheck(c))
    }

    /// RSASP1: RSA Signature primitive, $m^d \mod n$
    pub fn rsasp1(&self, m: &BigUint) -> Result<BigUint, CipherError> {
        self.pk.check_range(m, "rsasp1")?;
        Ok(self.rsadp_uncheck(m))
    }

    // m1 = c^{dp} % p, m2 = c^{dq} % q
    // h = (m1 - m2) * qinv % p
    // m = m2 + q * h
    fn rsadp_uncheck(&self, c: &BigUint) -> BigUint {
        match self.crt.as_ref() {
            Some(crt) => {
                let (p, q) = (crt.p.as_biguint(), crt.q.as_biguint());
                let m1 = SecretUint::new(c.modpow(&crt.d_p, p));
                let m2 = SecretUint::new(c.modpow(&crt.d_q, q));
                let m2_p = SecretUint::new(m2.as_biguint() % p);
                let diff = SecretUint::new(m1.as_biguint() + p - m2_p.as_biguint());
                let h = SecretUint::new((diff.as_biguint() * crt.q_inv.as_biguint()) % p);
                m2.as_biguint() + q * h.as_biguint()
            }
            None => c.modpow(&self.d, &self.pk.n),
        }
    }

    /// Check `n = p * q` and $d \cdot e \equiv 1$ modulo `p - 1` and `q - 1`. Keys without
    /// the prime factors only get the public key and `0 < d < n` checked.
    pub fn is_valid(&self) -> Result<(), CipherError> {
        self.pk.is_valid()?;
        if self.d.is_zero() || self.d.as_biguint() >= &self.pk.n {
            return Err(CipherError::InvalidPrivateKey(
                "rsa: invalid private exponent".to_string(),
            ));
        }

        let Some(crt) = self.crt.as_ref() else {
            return Ok(());
        };

        for prime in [crt.p.as_biguint(), crt.q.as_biguint()] {
            if prime.is_zero() || prime.is_one() {
                return Err(CipherError::InvalidPrivateKey(
                    "rsa: invalid prime value".to_string(),
                ));
            }
        }

        if crt.p.as_biguint() * crt.q.as_biguint() != self.pk.n {
            return Err(CipherError::InvalidPrivateKey(
                "rsa: invalid modulus".to_string(),
            ));
        }

        // d*e
        let de = SecretUint::new(self.d.as_biguint() * &self.pk.e);
        for prime in [crt.p.as_biguint(), crt.q.as_biguint()] {
            let m = SecretUint::new(de.as_biguint() % (prime - 1u32));
            if !m.is_one() {
                return Err(CipherError::InvalidPrivateKey(
                    "rsa: invalid exponent".to_string(),
                ));
            }
        }

        Ok(())
    }
}

impl Display for PublicKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{{n={:#x}, e={:#x}}}", self.n, self.e)
    }
}

impl Debug for PrivateKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "PrivateKey {{ pk: {}, d: {} bits, crt: {} }}",
            self.pk,
            self.d.bits(),
            self.crt.is_some()
        )
    }
}

/// $d \le 2^{nlen/2}$
fn private_exponent_too_small(d: &BigUint, nlen: u64) -> bool {
    d <= &(BigUint::one() << (nlen >> 1))
}

#[cfg(test)]
mod tests {
    use crate::rsa::key::{private_exponent_too_small, PrivateKey};
    use crate::rsa::PublicKey;
    use crate::CipherError;
    use num_bigint::BigUint;
    use num_traits::Num;

    fn key_basics(key: &PrivateKey) {
        key.is_valid().unwrap();
        let pk = key.public_key();
        for m in [0u32, 1, 2, 42, 0xdead_beef] {
            let m = BigUint::from(m);
            let c = pk.rsaep(&m).unwrap();
            assert_eq!(key.rsadp(&c).unwrap(), m, "encrypt message != decrypt message");

            let s = key.rsasp1(&m).unwrap();
            assert_eq!(pk.rsavp1(&s).unwrap(), m, "signature doesn't verify");
        }

        let n_m1 = pk.modulus() - 1u32;
        let c = pk.rsaep(&n_m1).unwrap();
        assert_eq!(key.rsadp(&c).unwrap(), n_m1);

        let n = pk.modulus().clone();
        assert!(matches!(pk.rsaep(&n), Err(CipherError::OutOfRange(_))));
        assert!(matches!(pk.rsavp1(&n), Err(CipherError::OutOfRange(_))));
        assert!(matches!(key.rsadp(&n), Err(CipherError::OutOfRange(_))));
        assert!(matches!(key.rsasp1(&n), Err(CipherError::OutOfRange(_))));
    }

    #[test]
    fn gnu_tls_key() {
        let n = BigUint::from_str_radix("290684273230919398108010081414538931343", 10).unwrap();
        let e = BigUint::from(65537u32);
        let d = BigUint::from_str_radix("31877380284581499213530787347443987241", 10).unwrap();
        let (p, q) = (
            BigUint::from_str_radix("16775196964030542637", 10).unwrap(),
            BigUint::from_str_radix("17328218193455850539", 10).unwrap(),
        );

        let key = PrivateKey::from_primes(&p, &q, &e).unwrap();
        assert_eq!(&e, key.public_key().exponent());
        assert_eq!(&n, key.public_key().modulus());
        assert_eq!(&d, key.private_exponent());
        key_basics(&key);

        // same key without the factors
        let key = PrivateKey::new_uncheck(n, e, d);
        key_basics(&key);
    }

    #[test]
    fn rsa_key_2048() {
        let n = BigUint::from_str_radix("14314132931241006650998084889274020608918049032671858325988396851334124245188214251956198731333464217832226406088020736932173064754214329009979944037640912127943488972644697423190955557435910767690712778463524983667852819010259499695177313115447116110358524558307947613422897787329221478860907963827160223559690523660574329011927531289655711860504630573766609239332569210831325633840174683944553667352219670930408593321661375473885147973879086994006440025257225431977751512374815915392249179976902953721486040787792801849818254465486633791826766873076617116727073077821584676715609985777563958286637185868165868520557", 10).unwrap();
        let (p, q) = (
           BigUint::from_str_radix("130903255182996722426771613606077755295583329135067340152947172868415809027537376306193179624298874215608270802054347609836776473930072411958753044562214537013874103802006369634761074377213995983876788718033850153719421695468704276694983032644416930879093914927146648402139231293035971427838068945045019075433",10).unwrap(),
           BigUint::from_str_radix("109348945610485453577574767652527472924289229538286649661240938988020367005475727988253438647560958573506159449538793540472829815903949343191091817779240101054552748665267574271163617694640513549693841337820602726596756351006149518830932261246698766355347898158548465400674856021497190430791824869615170301029",10).unwrap(),
            );

        for e in [3u32, 65537] {
            let key = PrivateKey::from_primes(&p, &q, &BigUint::from(e)).unwrap();
            assert_eq!(&n, key.public_key().modulus());
            assert_eq!(key.public_key().key_len(), 256);
            key_basics(&key);
        }
    }

    #[test]
    fn invalid_keys() {
        let (p, q) = (BigUint::from(61u32), BigUint::from(53u32));
        // lambda = lcm(60, 52) = 780, gcd(5, 780) != 1
        assert!(PrivateKey::from_primes(&p, &q, &BigUint::from(5u32)).is_err());
        assert!(PrivateKey::from_primes(&p, &p, &BigUint::from(7u32)).is_err());

        let (n, e) = (BigUint::from(3233u32), BigUint::from(17u32));
        let key = PrivateKey::new_uncheck(n.clone(), e.clone(), BigUint::from(0u32));
        assert!(key.is_valid().is_err());

        let pk = PublicKey::new_uncheck(BigUint::from(3234u32), BigUint::from(17u32));
        assert!(pk.is_valid().is_err());
        let pk = PublicKey::from_be_bytes(&[0x0c, 0xa1], &[0x01]);
        assert_eq!(pk.modulus(), &BigUint::from(3233u32));
        assert!(pk.is_valid().is_err());
        assert_eq!(PublicKey::new_uncheck(n, e).to_string(), "{n=0xca1, e=0x11}");
    }

    #[test]
    fn private_exponent_lower_bound() {
        let half = BigUint::from(1u32) << 1024u32;
        assert!(private_exponent_too_small(&half, 2048));
        assert!(private_exponent_too_small(&(&half - 1u32), 2048));
        assert!(!private_exponent_too_small(&(&half + 1u32), 2048));
        // odd modulus length rounds the half down
        assert!(!private_exponent_too_small(&(&half + 1u32), 2049));
    }
}
