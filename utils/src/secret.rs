use num_bigint::BigUint;
use num_traits::Zero;
use std::fmt::{Debug, Formatter};
use std::ops::{Deref, DerefMut};
use zeroize::{Zeroize, ZeroizeOnDrop};

/// Overwrite the limb buffer of `x` with zeros and leave `x == 0`.
///
/// `assign_from_slice` refills the existing allocation before normalizing, so
/// the old digits are overwritten in place rather than released as is.
pub fn wipe_biguint(x: &mut BigUint) {
    let digits = x.iter_u32_digits().len();
    if digits > 0 {
        x.assign_from_slice(vec![0u32; digits].as_slice());
    }
    x.set_zero();
}

/// A `BigUint` holding secret material (seeds, candidate primes, witnesses).
/// The value is wiped when dropped, whichever path the owner leaves through.
#[derive(Clone, Default, PartialEq, Eq, PartialOrd, Ord)]
pub struct SecretUint(BigUint);

impl SecretUint {
    pub fn new(x: BigUint) -> Self {
        Self(x)
    }

    pub fn as_biguint(&self) -> &BigUint {
        &self.0
    }

    /// move the value out, the wrapper left behind holds zero
    pub fn into_inner(mut self) -> BigUint {
        std::mem::take(&mut self.0)
    }
}

impl From<BigUint> for SecretUint {
    fn from(value: BigUint) -> Self {
        Self(value)
    }
}

impl Deref for SecretUint {
    type Target = BigUint;
    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl DerefMut for SecretUint {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.0
    }
}

impl AsRef<BigUint> for SecretUint {
    fn as_ref(&self) -> &BigUint {
        &self.0
    }
}

impl Zeroize for SecretUint {
    fn zeroize(&mut self) {
        wipe_biguint(&mut self.0);
    }
}

impl Drop for SecretUint {
    fn drop(&mut self) {
        self.zeroize();
    }
}

impl ZeroizeOnDrop for SecretUint {}

impl Debug for SecretUint {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "SecretUint({} bits)", self.0.bits())
    }
}
