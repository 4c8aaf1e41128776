use der::Encode;
use rand_core::CryptoRngCore;
use rsa::pkcs1v15::{Signature, SigningKey, VerifyingKey};
use rsa::pkcs8::DecodePublicKey;
use rsa::signature::{SignatureEncoding, Signer, Verifier};
use rsa::traits::PublicKeyParts;
use rsa::{RsaPrivateKey, RsaPublicKey};
use sha1::Sha1;
use sha2::Sha256;
use x509_cert::serial_number::SerialNumber;
use x509_cert::spki::SubjectPublicKeyInfoOwned;

use crate::cert::SignatureAlgorithm;
use crate::error::{CaError, Result};
use crate::issuer::SigningAuthority;

/// Modulus size of every generated key pair.
pub const RSA_KEY_BITS: usize = 2048;

/// Number of random bytes in a generated serial number (128 bits).
pub const SERIAL_NUMBER_BYTES: usize = 16;

/// An RSA key pair.
///
/// The private half never leaves this struct; it is only reachable through
/// [`SigningAuthority::sign`].
#[derive(Clone)]
pub struct KeyPair {
    private: Box<RsaPrivateKey>,
    public: PublicKey,
}

impl std::fmt::Debug for KeyPair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeyPair")
            .field("public", &self.public)
            .finish_non_exhaustive()
    }
}

impl KeyPair {
    /// Generate an RSA key pair with the specified number of bits.
    pub fn generate_rsa<R: CryptoRngCore + ?Sized>(rng: &mut R, bits: usize) -> Result<Self> {
        tracing::debug!(bits, "generating RSA key pair");
        let private = RsaPrivateKey::new(rng, bits)
            .map_err(|e| CaError::CryptoProvider(format!("RSA key generation failed: {e}")))?;
        Ok(Self::from_rsa(private))
    }

    /// Wrap an existing RSA private key.
    pub fn from_rsa(private: RsaPrivateKey) -> Self {
        let public = PublicKey(RsaPublicKey::from(&private));
        KeyPair {
            private: Box::new(private),
            public,
        }
    }

    pub fn public_key(&self) -> &PublicKey {
        &self.public
    }
}

impl SigningAuthority for KeyPair {
    fn signature_algorithm(&self) -> SignatureAlgorithm {
        SignatureAlgorithm::Sha256WithRSA
    }

    fn public_key(&self) -> &PublicKey {
        &self.public
    }

    fn sign(&self, message: &[u8]) -> Result<Vec<u8>> {
        let signing_key = SigningKey::<Sha256>::new(self.private.as_ref().clone());
        let signature = signing_key.try_sign(message)?;
        Ok(signature.to_vec())
    }
}

/// The public half of a [`KeyPair`], as embedded in certificates and requests.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PublicKey(RsaPublicKey);

impl PublicKey {
    pub fn from_key_pair(key_pair: &KeyPair) -> Self {
        key_pair.public.clone()
    }

    /// Decodes the key carried in a `SubjectPublicKeyInfo`.
    ///
    /// Only `rsaEncryption` keys are accepted.
    pub fn from_x509spki(spki: &SubjectPublicKeyInfoOwned) -> Result<Self> {
        if spki.algorithm.oid != const_oid::db::rfc5912::RSA_ENCRYPTION {
            return Err(CaError::Decoding(format!(
                "Unsupported public key algorithm: {}",
                spki.algorithm.oid
            )));
        }
        let der = spki.to_der()?;
        let public = RsaPublicKey::from_public_key_der(&der)
            .map_err(|e| CaError::Decoding(e.to_string()))?;
        Ok(PublicKey(public))
    }

    /// Encodes the key as a `SubjectPublicKeyInfo`.
    pub fn as_spki(&self) -> Result<SubjectPublicKeyInfoOwned> {
        Ok(SubjectPublicKeyInfoOwned::from_key(self.0.clone())?)
    }

    /// Big-endian modulus bytes.
    pub fn modulus(&self) -> Vec<u8> {
        self.0.n().to_bytes_be()
    }

    /// SHA-1 over the subjectPublicKey bits (RFC 5280 section 4.2.1.2, method 1).
    pub fn key_identifier(&self) -> Result<Vec<u8>> {
        let spki = self.as_spki()?;
        let digest = <Sha1 as sha1::Digest>::digest(spki.subject_public_key.raw_bytes());
        Ok(digest.to_vec())
    }

    /// Checks a PKCS#1 v1.5 SHA-256 signature over `message`.
    pub fn verify(&self, message: &[u8], signature: &[u8]) -> Result<()> {
        let verifying_key = VerifyingKey::<Sha256>::new(self.0.clone());
        let signature = Signature::try_from(signature)
            .map_err(|e| CaError::InvalidSignature(e.to_string()))?;
        verifying_key
            .verify(message, &signature)
            .map_err(|e| CaError::InvalidSignature(e.to_string()))
    }
}

/// Draws a 128-bit positive serial number from `rng`.
///
/// An all-zero draw is discarded so the result is always greater than zero.
pub fn generate_serial_number<R: CryptoRngCore + ?Sized>(rng: &mut R) -> Result<SerialNumber> {
    let mut bytes = [0u8; SERIAL_NUMBER_BYTES];
    loop {
        rng.fill_bytes(&mut bytes);
        if bytes.iter().any(|b| *b != 0) {
            break;
        }
    }
    Ok(SerialNumber::new(&bytes)?)
}

#[cfg(test)]
mod tests {
    use rand_chacha::ChaCha8Rng;
    use rand_chacha::rand_core::SeedableRng;

    use super::*;

    #[test]
    fn serial_numbers_are_positive_and_distinct() {
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        let first = generate_serial_number(&mut rng).unwrap();
        let second = generate_serial_number(&mut rng).unwrap();
        assert_ne!(first, second);
        assert!(first.as_bytes().iter().any(|b| *b != 0));
        // 16 random bytes plus at most one sign byte
        assert!(first.as_bytes().len() <= SERIAL_NUMBER_BYTES + 1);
    }

    #[test]
    fn sign_and_verify_round_trip() {
        let mut rng = ChaCha8Rng::seed_from_u64(42);
        let key_pair = KeyPair::generate_rsa(&mut rng, RSA_KEY_BITS).unwrap();
        let signature = key_pair.sign(b"to be signed").unwrap();
        assert_eq!(signature.len(), RSA_KEY_BITS / 8);
        key_pair
            .public_key()
            .verify(b"to be signed", &signature)
            .unwrap();
        assert!(matches!(
            key_pair.public_key().verify(b"tampered", &signature),
            Err(CaError::InvalidSignature(_))
        ));
    }

    #[test]
    fn spki_round_trip_preserves_modulus() {
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        let key_pair = KeyPair::generate_rsa(&mut rng, RSA_KEY_BITS).unwrap();
        let spki = key_pair.public_key().as_spki().unwrap();
        let decoded = PublicKey::from_x509spki(&spki).unwrap();
        assert_eq!(decoded, *key_pair.public_key());
        assert_eq!(decoded.modulus().len(), RSA_KEY_BITS / 8);
        assert_eq!(decoded.key_identifier().unwrap().len(), 20);
    }
}
