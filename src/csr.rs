//! PKCS#10 certification requests.

use der::{Decode, Encode};
use x509_cert::request::{CertReq, CertReqInfo, Version};

use crate::cert::SignatureAlgorithm;
use crate::cert::params::DistinguishedName;
use crate::error::{CaError, Result};
use crate::issuer::SigningAuthority;
use crate::key::PublicKey;
use crate::pem_utils;

/// A certification request: a subject name and public key, signed by the
/// private half of that key.
///
/// Nothing in a request is trusted until [`CertificationRequest::verify`]
/// returns `true`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CertificationRequest {
    pub inner: CertReq,
}

impl CertificationRequest {
    /// Builds a request for `subject` and signs it with `authority`.
    ///
    /// The request carries no attributes.
    pub fn new(subject: &DistinguishedName, authority: &dyn SigningAuthority) -> Result<Self> {
        let info = CertReqInfo {
            version: Version::V1,
            subject: subject.as_x509_name(),
            public_key: authority.public_key().as_spki()?,
            attributes: Default::default(),
        };

        let signature = authority.sign(&info.to_der()?)?;
        tracing::debug!(subject = %subject, "signed certification request");

        Ok(Self {
            inner: CertReq {
                info,
                algorithm: authority.signature_algorithm().into(),
                signature: der::asn1::BitString::from_bytes(&signature)?,
            },
        })
    }

    pub fn subject(&self) -> DistinguishedName {
        DistinguishedName::from_x509_name(&self.inner.info.subject)
    }

    pub fn public_key(&self) -> Result<PublicKey> {
        PublicKey::from_x509spki(&self.inner.info.public_key)
    }

    /// Checks the self-signature against the embedded public key.
    ///
    /// Any failure along the way (unsupported algorithm, undecodable key,
    /// bad signature) yields `false`.
    pub fn verify(&self) -> bool {
        self.check_signature().is_ok()
    }

    fn check_signature(&self) -> Result<()> {
        SignatureAlgorithm::try_from(&self.inner.algorithm)?;
        let signature = self
            .inner
            .signature
            .as_bytes()
            .ok_or(CaError::InvalidCsrSignature)?;
        self.public_key()?
            .verify(&self.inner.info.to_der()?, signature)
    }

    pub fn to_der(&self) -> Result<Vec<u8>> {
        Ok(self.inner.to_der()?)
    }

    /// PEM form with the `CERTIFICATE REQUEST` label.
    pub fn to_pem(&self) -> Result<String> {
        Ok(pem_utils::der_to_pem(
            &self.to_der()?,
            pem_utils::CERTIFICATE_REQUEST_LABEL,
        ))
    }

    pub fn from_der(der: &[u8]) -> Result<Self> {
        let inner = CertReq::from_der(der).map_err(|e| CaError::Decoding(e.to_string()))?;
        Ok(Self { inner })
    }

    pub fn from_pem(pem: &str) -> Result<Self> {
        Self::from_der(&pem_utils::pem_to_der(
            pem,
            pem_utils::CERTIFICATE_REQUEST_LABEL,
        )?)
    }
}

#[cfg(test)]
mod tests {
    use rand_chacha::ChaCha8Rng;
    use rand_chacha::rand_core::SeedableRng;

    use super::*;
    use crate::key::{KeyPair, RSA_KEY_BITS};

    fn request(seed: u64) -> (KeyPair, CertificationRequest) {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let key_pair = KeyPair::generate_rsa(&mut rng, RSA_KEY_BITS).unwrap();
        let subject = DistinguishedName::parse("CN=user@example.com,O=Org,C=SA").unwrap();
        let csr = CertificationRequest::new(&subject, &key_pair).unwrap();
        (key_pair, csr)
    }

    #[test]
    fn fresh_request_verifies() {
        let (key_pair, csr) = request(11);
        assert!(csr.verify());
        assert_eq!(csr.public_key().unwrap(), *key_pair.public_key());
        assert_eq!(
            csr.subject().common_name().as_deref(),
            Some("user@example.com")
        );
    }

    #[test]
    fn altered_subject_fails_verification() {
        let (_, mut csr) = request(12);
        csr.inner.info.subject = DistinguishedName::parse("CN=mallory,O=Org,C=SA")
            .unwrap()
            .as_x509_name();
        assert!(!csr.verify());
    }

    #[test]
    fn swapped_key_fails_verification() {
        let (_, mut csr) = request(13);
        let (other, _) = request(14);
        csr.inner.info.public_key = other.public_key().as_spki().unwrap();
        assert!(!csr.verify());
    }

    #[test]
    fn pem_round_trip() {
        let (_, csr) = request(15);
        let pem = csr.to_pem().unwrap();
        assert!(pem.starts_with("-----BEGIN CERTIFICATE REQUEST-----"));
        let parsed = CertificationRequest::from_pem(&pem).unwrap();
        assert_eq!(parsed, csr);
        assert!(parsed.verify());
    }
}
