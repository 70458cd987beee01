//! Secure randomness provider
//!
//! Key and serial generation take the random source as an explicit argument instead of
//! reaching for a process-wide generator. Production code passes [`OsRandom`]; tests can
//! pass a deterministic or failing source.

use openssl::pkey::{PKey, Private};
use openssl::rsa::Rsa;

use crate::error::CaError;

/// A cryptographically secure source of random bytes and RSA keys.
pub trait SecureRandom {
    /// Fill `buf` entirely with random bytes.
    fn fill(&self, buf: &mut [u8]) -> Result<(), CaError>;

    /// Generate an RSA private key with a modulus of `bits` bits.
    ///
    /// OpenSSL draws from its own DRBG during prime generation, so the default
    /// implementation only consults `self` to make sure the source is healthy first.
    fn generate_rsa(&self, bits: u32) -> Result<PKey<Private>, CaError> {
        let mut probe = [0u8; 1];
        self.fill(&mut probe)?;

        let rsa = Rsa::generate(bits).map_err(|e| {
            CaError::EntropyExhausted(format!("generate {}-bit RSA key: {}", bits, e))
        })?;
        PKey::from_rsa(rsa)
            .map_err(|e| CaError::EntropyExhausted(format!("wrap RSA key: {}", e)))
    }
}

/// The OpenSSL CSPRNG, seeded by the operating system.
#[derive(Debug, Default, Clone, Copy)]
pub struct OsRandom;

impl SecureRandom for OsRandom {
    fn fill(&self, buf: &mut [u8]) -> Result<(), CaError> {
        openssl::rand::rand_bytes(buf)
            .map_err(|e| CaError::EntropyExhausted(format!("read random bytes: {}", e)))
    }
}


#[cfg(test)]
mod tests {
    use super::testing::{CountingRandom, FailingRandom};
    use super::*;

    #[test]
    fn test_os_random_fills_buffer() {
        let mut a = [0u8; 32];
        let mut b = [0u8; 32];
        OsRandom.fill(&mut a).unwrap();
        OsRandom.fill(&mut b).unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_counting_random_is_deterministic() {
        let rng = CountingRandom::new(254);
        let mut buf = [0u8; 4];
        rng.fill(&mut buf).unwrap();
        assert_eq!(buf, [254, 255, 0, 1]);
    }

    #[test]
    fn test_failing_random_blocks_key_generation() {
        let err = FailingRandom.generate_rsa(2048).unwrap_err();
        assert!(matches!(err, CaError::EntropyExhausted(_)));
    }
}
