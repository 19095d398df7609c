use num_bigint::{BigInt, BigUint};
use num_integer::Integer;
use num_traits::{Euclid, One, ToPrimitive, Zero};
use rand::Rand;
use std::borrow::Borrow;
use std::ops::Deref;
use zeroize::Zeroizing;

pub struct BigUintExt<T: Borrow<BigUint>>(pub T);

impl<T: Borrow<BigUint>> Deref for BigUintExt<T> {
    type Target = BigUint;
    fn deref(&self) -> &Self::Target {
        self.0.borrow()
    }
}

// products of small odd primes, each fits in a u32 so one big-number division
// screens several primes at once
const SIEVE: [(u32, &[u32]); 4] = [
    (3 * 5 * 7 * 11 * 13 * 17 * 19 * 23 * 37, &[3, 5, 7, 11, 13, 17, 19, 23, 37]),
    (29 * 31 * 41 * 43 * 47 * 53, &[29, 31, 41, 43, 47, 53]),
    (59 * 61 * 67 * 71 * 73, &[59, 61, 67, 71, 73]),
    (79 * 83 * 89 * 97, &[79, 83, 89, 97]),
];

impl<T: Borrow<BigUint>> BigUintExt<T> {
    /// <<算法导论>>
    /// 定理31.23: 若有d=gcd(a, n), 假设对于某些整数x'和y', 有d=ax'+ny'. 如果d|b, 则方程
    /// ax=b(mod n)有一个解的值位x0, 则x0=x'(b/d) mod n;
    /// self * inv = 1 \mod modules
    pub fn modinv(&self, modulus: &BigUint) -> Option<BigUint> {
        if modulus.is_zero() {
            return None;
        }

        let (a, n) = (BigInt::from(self.deref() % modulus), BigInt::from(modulus.clone()));
        let g = a.extended_gcd(&n);
        if g.gcd.is_one() {
            g.x.rem_euclid(&n).to_biguint()
        } else {
            None
        }
    }

    /// byte length of the big-endian encoding, `0` encodes to zero bytes
    pub fn byte_len(&self) -> usize {
        (self.bits() as usize + 7) >> 3
    }

    /// I2OSP: big-endian encoding left padded with zeros to exactly `len` bytes,
    /// `None` if the value does not fit.
    pub fn to_be_bytes_len(&self, len: usize) -> Option<Vec<u8>> {
        let blen = self.byte_len();
        if blen > len {
            return None;
        }

        let mut out = vec![0u8; len];
        if blen > 0 {
            out[(len - blen)..].copy_from_slice(self.to_bytes_be().as_slice());
        }
        Some(out)
    }

    /// 生成[0..self)之间的随机数
    pub fn gen_random<R: Rand>(&self, rng: &mut R) -> BigUint {
        if self.is_zero() {
            return BigUint::zero();
        }

        let bits = self.bits() as usize;
        loop {
            let r = BigUintExt::<BigUint>::random_bits(bits, rng);
            if &r < self.deref() {
                return r;
            }
        }
    }

    /// whether one of the sieve primes divides `self` (and `self` isn't that prime)
    pub fn has_small_factor(&self) -> bool {
        if self.is_even() {
            return self.deref() != &BigUint::from(2u8);
        }

        for (product, primes) in SIEVE.iter() {
            let r = (self.deref() % *product).to_u32().unwrap_or_default();
            for &p in primes.iter() {
                if r % p == 0 && self.deref() != &BigUint::from(p) {
                    return true;
                }
            }
        }

        false
    }

    /// probability prime test by the MillerRabin Pseudoprimes Algorithm.
    ///
    /// `test_rounds` means the number of test rounds, for any odd number that great than 2 and positive
    /// integer n, the probability of error in MillerRabinPrimeTest is at most $2^{-2n}$.
    /// Values of at most 64 bits are decided deterministically.
    pub fn probably_prime_test<Rng: Rand>(&self, test_rounds: usize, rng: &mut Rng) -> bool {
        if self.bits() <= 64 {
            return self.to_u64().map(is_prime_u64).unwrap_or(false);
        }

        if self.has_small_factor() {
            return false;
        }

        self.prime_validate_by_miller_rabin(test_rounds.max(1), rng)
    }

    /// 判断`n`是否是合数, n-1 = 2^s * r, a是在[2,n-2]之间随机选择的随机数.
    fn miller_rabin_witness(&self, s: u64, r: &BigUint, n_m1: &BigUint, a: &BigUint) -> bool {
        let n = self.deref();
        let mut y = a.modpow(r, n);
        if y.is_one() || &y == n_m1 {
            return false;
        }

        for _ in 1..s {
            y = y.modpow(&BigUint::from(2u8), n);
            if &y == n_m1 {
                return false;
            }
            if y.is_one() {
                return true;
            }
        }

        true
    }

    /// miller-rabin素数测试
    ///
    /// note: 内部调用函数, self是大于3的奇数, t>0
    fn prime_validate_by_miller_rabin<Rng: Rand>(&self, t: usize, rng: &mut Rng) -> bool {
        let n_m1 = self.deref() - 1u32;
        let s = n_m1.trailing_zeros().unwrap_or(0);
        let r = &n_m1 >> s;
        let n_m3 = self.deref() - 3u32;

        for _ in 0..t {
            // a in [2, n-2]
            let a = BigUintExt(&n_m3).gen_random(rng) + 2u32;
            if self.miller_rabin_witness(s, &r, &n_m1, &a) {
                return false;
            }
        }

        true
    }
}

impl BigUintExt<BigUint> {
    /// uniform random integer in $[0, 2^{bits})$
    pub fn random_bits<R: Rand>(bits: usize, rng: &mut R) -> BigUint {
        if bits == 0 {
            return BigUint::zero();
        }

        let mut buf = Zeroizing::new(vec![0u8; (bits + 7) >> 3]);
        rng.rand(buf.as_mut_slice());

        // 清除大于bits的位
        let b = bits & 7;
        if b != 0 {
            buf[0] &= (1u8 << b) - 1;
        }

        BigUint::from_bytes_be(buf.as_slice())
    }

    /// random odd integer of exactly `bits` bits (top bit and lowest bit forced)
    pub fn random_odd_bits<R: Rand>(bits: usize, rng: &mut R) -> BigUint {
        let mut x = Self::random_bits(bits, rng);
        if bits > 0 {
            x.set_bit(bits as u64 - 1, true);
            x.set_bit(0, true);
        }
        x
    }
}

/// deterministic primality for word sized integers, Miller-Rabin with the first
/// twelve prime bases has no pseudoprimes below $2^{64}$.
pub fn is_prime_u64(n: u64) -> bool {
    const BASES: [u64; 12] = [2, 3, 5, 7, 11, 13, 17, 19, 23, 29, 31, 37];

    if n < 2 {
        return false;
    }
    for &p in BASES.iter() {
        if n % p == 0 {
            return n == p;
        }
    }

    let (mut d, mut s) = (n - 1, 0u32);
    while d & 1 == 0 {
        d >>= 1;
        s += 1;
    }

    let mul = |a: u64, b: u64| ((a as u128 * b as u128) % n as u128) as u64;
    let pow = |mut b: u64, mut e: u64| {
        let mut r = 1u64;
        b %= n;
        while e > 0 {
            if e & 1 == 1 {
                r = mul(r, b);
            }
            b = mul(b, b);
            e >>= 1;
        }
        r
    };

    'next_base: for &a in BASES.iter() {
        let mut x = pow(a, d);
        if x == 1 || x == n - 1 {
            continue;
        }
        for _ in 1..s {
            x = mul(x, x);
            if x == n - 1 {
                continue 'next_base;
            }
        }
        return false;
    }

    true
}
