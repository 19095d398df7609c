//! = RFC 8017
//!
//! == PKCS #1: RSA Cryptography Specification Version 2.2
//!
//! === OAEP(Optimal Asymmetric Encryption Padding)
//!
//! EM = 0x00 || maskedSeed || maskedDB, DB = lHash || PS || 0x01 || M
//!

use crate::rsa::{mgf1_xor, PrivateKey, PublicKey};
use crate::{CipherError, Decrypt, DigestX, Encrypt, Rand};
use num_bigint::BigUint;
use std::cell::RefCell;
use subtle::{Choice, ConditionallySelectable, ConstantTimeEq};
use utils::{BigUintExt, SecretUint};
use zeroize::Zeroizing;

/// Optimal Asymmetric Encryption Padding
pub struct OAEPEncrypt<H: DigestX, R: Rand> {
    key: PublicKey,
    hasher: RefCell<H>,
    rng: RefCell<R>,
    hlen: usize,
    // Hash(label)
    lhash: Vec<u8>,
}

pub struct OAEPDecrypt<H: DigestX, R: Rand> {
    de: OAEPEncrypt<H, R>,
    key: PrivateKey,
}

impl<H: DigestX, R: Rand> OAEPEncrypt<H, R> {
    /// label: 和消息相关联的标签
    pub fn new(key: PublicKey, mut hasher: H, rng: R, label: &[u8]) -> Result<Self, CipherError> {
        let (klen, hlen) = (key.key_len(), hasher.digest_len_x());
        if klen < (hlen << 1) + 2 {
            return Err(CipherError::InvalidPublicKey(format!(
                "rsa-oaep: the public key modulus is too short, need at least {} bytes",
                (hlen << 1) + 2
            )));
        }
        key.is_valid()?;

        let lhash = hasher.digest_x(label);
        Ok(Self {
            key,
            hasher: RefCell::new(hasher),
            rng: RefCell::new(rng),
            lhash,
            hlen,
        })
    }

    pub fn set_label(&mut self, label: &[u8]) {
        self.lhash = self.hasher.get_mut().digest_x(label);
    }

    pub fn key_len(&self) -> usize {
        self.key.key_len()
    }

    const fn hash_len(&self) -> usize {
        self.hlen
    }

    pub fn max_msg_len(&self) -> usize {
        self.key_len() - (self.hash_len() << 1) - 2
    }

    fn encrypt_inner(&self, msg: &[u8], cipher: &mut Vec<u8>) -> Result<(), CipherError> {
        let (klen, hlen, max) = (self.key_len(), self.hash_len(), self.max_msg_len());
        if msg.len() > max {
            return Err(CipherError::MessageTooLong {
                max,
                real: msg.len(),
            });
        }

        let mut em = Zeroizing::new(vec![0u8; klen]);
        {
            let (seed, db) = em[1..].split_at_mut(hlen);
            self.rng.borrow_mut().rand(seed);

            // db = lhash || ps || 0x01 || M
            let sep = db.len() - msg.len() - 1;
            db[..hlen].copy_from_slice(self.lhash.as_slice());
            db[sep] = 0x01;
            db[(sep + 1)..].copy_from_slice(msg);

            let mut hasher = self.hasher.borrow_mut();
            // maskedDB = db ^ MGF(seed, klen - hlen - 1)
            mgf1_xor(&mut *hasher, seed, db)?;
            // maskedSeed = seed ^ MGF(maskedDB, hlen)
            mgf1_xor(&mut *hasher, db, seed)?;
        }

        let m = SecretUint::new(BigUint::from_bytes_be(em.as_slice()));
        let c = self.key.rsaep(&m)?;
        let c = BigUintExt(&c).to_be_bytes_len(klen).ok_or_else(|| {
            CipherError::OutOfRange("rsa-oaep: ciphertext longer than the modulus".to_string())
        })?;
        cipher.extend_from_slice(c.as_slice());

        Ok(())
    }
}

impl<H: DigestX, R: Rand> OAEPDecrypt<H, R> {
    pub fn new(key: PrivateKey, hasher: H, rng: R, label: &[u8]) -> Result<Self, CipherError> {
        key.is_valid()?;
        let de = OAEPEncrypt::new(key.public_key().clone(), hasher, rng, label)?;

        Ok(Self { de, key })
    }

    pub fn max_msg_len(&self) -> usize {
        self.de.max_msg_len()
    }

    pub fn key_len(&self) -> usize {
        self.de.key_len()
    }

    pub fn set_label(&mut self, label: &[u8]) {
        self.de.set_label(label)
    }

    /// 解密失败的原因不会被区分, 都返回`CipherError::DecryptionFailed`
    fn decrypt_inner(&self, cipher: &[u8], msg: &mut Vec<u8>) -> Result<(), CipherError> {
        let (klen, hlen) = (self.de.key_len(), self.de.hash_len());
        if cipher.len() != klen || klen < (hlen << 1) + 2 {
            return Err(CipherError::DecryptionFailed);
        }

        let c = BigUint::from_bytes_be(cipher);
        let m = SecretUint::new(
            self.key
                .rsadp(&c)
                .map_err(|_| CipherError::DecryptionFailed)?,
        );
        let mut em = Zeroizing::new(
            BigUintExt(m.as_biguint())
                .to_be_bytes_len(klen)
                .ok_or(CipherError::DecryptionFailed)?,
        );

        let y = em[0];
        let (seed, db) = em[1..].split_at_mut(hlen);
        {
            let mut hasher = self.de.hasher.borrow_mut();
            mgf1_xor(&mut *hasher, db, seed).map_err(|_| CipherError::DecryptionFailed)?;
            mgf1_xor(&mut *hasher, seed, db).map_err(|_| CipherError::DecryptionFailed)?;
        }

        let mut good = y.ct_eq(&0u8) & db[..hlen].ct_eq(self.de.lhash.as_slice());

        // 在整个PS || 0x01 || M上扫描, 记录第一个0x01的位置, 以及0x01之前是否出现非0字节
        let (mut looking, mut index, mut invalid) = (Choice::from(1u8), 0u32, Choice::from(0u8));
        for (i, &b) in db[hlen..].iter().enumerate() {
            let (is_zero, is_one) = (b.ct_eq(&0u8), b.ct_eq(&1u8));
            index.conditional_assign(&(i as u32), looking & is_one);
            invalid |= looking & !is_zero & !is_one;
            looking &= !is_one;
        }
        good &= !looking & !invalid;

        if !bool::from(good) {
            return Err(CipherError::DecryptionFailed);
        }

        msg.extend_from_slice(&db[(hlen + index as usize + 1)..]);
        Ok(())
    }
}

impl<H: DigestX, R: Rand> Encrypt for OAEPEncrypt<H, R> {
    fn encrypt(&self, plaintext: &[u8], ciphertext: &mut Vec<u8>) -> Result<(), CipherError> {
        self.encrypt_inner(plaintext, ciphertext)
    }
}

impl<H: DigestX, R: Rand> Encrypt for OAEPDecrypt<H, R> {
    fn encrypt(&self, plaintext: &[u8], ciphertext: &mut Vec<u8>) -> Result<(), CipherError> {
        self.de.encrypt_inner(plaintext, ciphertext)
    }
}

impl<H: DigestX, R: Rand> Decrypt for OAEPDecrypt<H, R> {
    fn decrypt(&self, ciphertext: &[u8], plaintext: &mut Vec<u8>) -> Result<(), CipherError> {
        self.decrypt_inner(ciphertext, plaintext)
    }
}

impl<H: DigestX, R: Rand> AsRef<PrivateKey> for OAEPDecrypt<H, R> {
    fn as_ref(&self) -> &PrivateKey {
        &self.key
    }
}
