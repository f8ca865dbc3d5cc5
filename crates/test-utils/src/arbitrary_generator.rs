use arbitrary::{Arbitrary, Unstructured};
use rand::{rngs::OsRng, RngCore};

/// The default buffer size for the `ArbitraryGenerator`.
const ARB_GEN_LEN: usize = 16_384;

/// Produces arbitrary values of any [`Arbitrary`] type from fresh random bytes.
#[derive(Debug)]
pub struct ArbitraryGenerator {
    buf: Vec<u8>,
}

impl Default for ArbitraryGenerator {
    fn default() -> Self {
        Self::new()
    }
}

impl ArbitraryGenerator {
    pub fn new() -> Self {
        Self::new_with_size(ARB_GEN_LEN)
    }

    pub fn new_with_size(s: usize) -> Self {
        Self { buf: vec![0u8; s] }
    }

    /// Generates an arbitrary instance of `T` using [`OsRng`].
    pub fn generate<T>(&mut self) -> T
    where
        T: for<'a> Arbitrary<'a>,
    {
        OsRng.fill_bytes(&mut self.buf);
        let mut u = Unstructured::new(&self.buf);
        T::arbitrary(&mut u).expect("failed to generate arbitrary instance")
    }
}
