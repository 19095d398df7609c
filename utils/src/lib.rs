mod biguint_ext;
pub use biguint_ext::{is_prime_u64, BigUintExt};

mod secret;
pub use secret::{wipe_biguint, SecretUint};

/// `dst[i] ^= mask[i]`, stops at the shorter of the two slices
pub fn xor_in_place(dst: &mut [u8], mask: &[u8]) {
    dst.iter_mut().zip(mask.iter()).for_each(|(a, &b)| *a ^= b);
}
