use crate::Rand;
use xrand::rngs::OsRng;
use xrand::RngCore;

/// OS-backed CSPRNG. <br>
/// Every instance reads from the kernel, so independent threads may each hold
/// their own copy without coordination.
#[derive(Copy, Clone, Default)]
pub struct DefaultRand {
    rng: OsRng,
}

impl Rand for DefaultRand {
    fn rand(&mut self, random: &mut [u8]) {
        self.rng.fill_bytes(random);
    }
}

#[cfg(test)]
mod tests {
    use crate::{DefaultRand, Rand};

    #[test]
    fn fill_is_not_constant() {
        let mut rng = DefaultRand::default();
        let (mut a, mut b) = ([0u8; 32], [0u8; 32]);
        rng.rand(&mut a);
        rng.rand(&mut b);
        assert_ne!(a, b, "two 256-bit draws should never collide");
    }
}
