pub mod extensions;
pub mod params;

use der::{Decode, Encode};
use extensions::{BasicConstraints, CrlDistributionPoints, KeyUsage, ToAndFromX509Extension};
use params::{CertificationRequestInfo, DistinguishedName, ExtensionParam, Validity};
use x509_cert::certificate::CertificateInner;
use x509_cert::serial_number::SerialNumber;
use x509_cert::spki::AlgorithmIdentifierOwned;

use crate::error::{CaError, Result};
use crate::issuer::{Issuer, SigningAuthority};
use crate::key::PublicKey;
use crate::pem_utils;
use crate::tbs_certificate::TbsCertificate;

/// Represents the supported signature algorithms for certificates.
///
/// This enum provides a mapping to the corresponding OIDs for each algorithm.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignatureAlgorithm {
    /// SHA-256 with RSA encryption.
    Sha256WithRSA,
}

impl From<SignatureAlgorithm> for AlgorithmIdentifierOwned {
    /// Converts a `SignatureAlgorithm` into an `AlgorithmIdentifierOwned`.
    fn from(value: SignatureAlgorithm) -> Self {
        match value {
            // RFC 4055 section 5: the parameters MUST be NULL for the PKCS#1 v1.5 family
            SignatureAlgorithm::Sha256WithRSA => AlgorithmIdentifierOwned {
                oid: const_oid::db::rfc5912::SHA_256_WITH_RSA_ENCRYPTION,
                parameters: Some(der::asn1::AnyRef::NULL.into()),
            },
        }
    }
}

impl TryFrom<&AlgorithmIdentifierOwned> for SignatureAlgorithm {
    type Error = CaError;

    fn try_from(value: &AlgorithmIdentifierOwned) -> Result<Self> {
        match value.oid {
            const_oid::db::rfc5912::SHA_256_WITH_RSA_ENCRYPTION => Ok(Self::Sha256WithRSA),
            other => Err(CaError::Decoding(format!(
                "Unsupported signature algorithm: {other}"
            ))),
        }
    }
}

/// Represents an X.509 certificate.
///
/// Certificates are immutable once issued; accessors decode on demand from
/// the inner DER structure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Certificate {
    /// The inner representation of the certificate.
    pub inner: CertificateInner,
}

impl Certificate {
    /// Creates a new self-signed certificate.
    ///
    /// The issuer is the subject of `cert_info`, and the certificate is
    /// signed by `authority`, whose public key must be the subject key.
    pub fn new_self_signed(
        cert_info: &CertificationRequestInfo,
        authority: &dyn SigningAuthority,
        serial_number: SerialNumber,
        validity: Validity,
    ) -> Result<Self> {
        if *authority.public_key() != cert_info.subject_public_key {
            return Err(CaError::InvalidInput(
                "self-signed certificate must be signed by its own key".to_string(),
            ));
        }

        // For self-signed certificates, the issuer is the same as the subject
        let self_issuer = SelfIssuer {
            name: cert_info.subject.clone(),
            authority,
        };
        self_issuer.issue(cert_info, serial_number, validity)
    }

    /// Encodes the certificate into DER format.
    pub fn to_der(&self) -> Result<Vec<u8>> {
        self.inner
            .to_der()
            .map_err(|e| CaError::Encoding(e.to_string()))
    }

    /// Encodes the certificate into PEM format.
    pub fn to_pem(&self) -> Result<String> {
        Ok(pem_utils::der_to_pem(
            &self.to_der()?,
            pem_utils::CERTIFICATE_LABEL,
        ))
    }

    pub fn from_der(der: &[u8]) -> Result<Self> {
        let inner =
            CertificateInner::from_der(der).map_err(|e| CaError::Decoding(e.to_string()))?;
        Ok(Self { inner })
    }

    pub fn from_pem(pem: &str) -> Result<Self> {
        Self::from_der(&pem_utils::pem_to_der(pem, pem_utils::CERTIFICATE_LABEL)?)
    }

    pub fn subject(&self) -> DistinguishedName {
        DistinguishedName::from_x509_name(&self.inner.tbs_certificate.subject)
    }

    pub fn issuer(&self) -> DistinguishedName {
        DistinguishedName::from_x509_name(&self.inner.tbs_certificate.issuer)
    }

    pub fn serial_number(&self) -> &SerialNumber {
        &self.inner.tbs_certificate.serial_number
    }

    pub fn validity(&self) -> Validity {
        let validity = &self.inner.tbs_certificate.validity;
        Validity {
            not_before: crate::tbs_certificate::from_x509_time(&validity.not_before),
            not_after: crate::tbs_certificate::from_x509_time(&validity.not_after),
        }
    }

    pub fn public_key(&self) -> Result<PublicKey> {
        PublicKey::from_x509spki(&self.inner.tbs_certificate.subject_public_key_info)
    }

    /// Decodes the to-be-signed body into its parameter form.
    pub fn tbs(&self) -> Result<TbsCertificate> {
        TbsCertificate::from_tbs_certificate_inner(&self.inner.tbs_certificate)
    }

    /// All extensions in certificate order.
    pub fn extensions(&self) -> Vec<ExtensionParam> {
        self.inner
            .tbs_certificate
            .extensions
            .as_deref()
            .unwrap_or_default()
            .iter()
            .map(ExtensionParam::from_x509)
            .collect()
    }

    /// Finds and decodes the extension of type `E`, if present.
    pub fn find_extension<E: ToAndFromX509Extension>(&self) -> Result<Option<(E, bool)>> {
        self.extensions()
            .iter()
            .find(|ext| ext.oid == E::OID)
            .map(|ext| -> Result<(E, bool)> { Ok((ext.to_extension::<E>()?, ext.critical)) })
            .transpose()
    }

    pub fn basic_constraints(&self) -> Result<Option<BasicConstraints>> {
        Ok(self.find_extension::<BasicConstraints>()?.map(|(bc, _)| bc))
    }

    pub fn key_usage(&self) -> Result<Option<KeyUsage>> {
        Ok(self.find_extension::<KeyUsage>()?.map(|(ku, _)| ku))
    }

    /// URIs of the CRL distribution point extension, empty if absent.
    pub fn crl_distribution_points(&self) -> Result<Vec<String>> {
        Ok(self
            .find_extension::<CrlDistributionPoints>()?
            .map(|(dp, _)| dp.uris)
            .unwrap_or_default())
    }

    pub fn is_ca(&self) -> Result<bool> {
        Ok(self.basic_constraints()?.is_some_and(|bc| bc.is_ca))
    }

    pub fn is_self_issued(&self) -> bool {
        self.inner.tbs_certificate.subject == self.inner.tbs_certificate.issuer
    }

    /// Checks the certificate signature against `issuer_key`.
    ///
    /// The outer signature algorithm must agree with the one inside the
    /// signed body.
    pub fn verify(&self, issuer_key: &PublicKey) -> Result<()> {
        if self.inner.signature_algorithm != self.inner.tbs_certificate.signature {
            return Err(CaError::InvalidSignature(
                "signature algorithm does not match the signed body".to_string(),
            ));
        }
        SignatureAlgorithm::try_from(&self.inner.signature_algorithm)?;

        let tbs_der = self.inner.tbs_certificate.to_der()?;
        let signature = self.inner.signature.as_bytes().ok_or_else(|| {
            CaError::InvalidSignature("signature has unused bits".to_string())
        })?;
        issuer_key.verify(&tbs_der, signature)
    }
}

// Helper struct for self-signed certificates
struct SelfIssuer<'a> {
    name: DistinguishedName,
    authority: &'a dyn SigningAuthority,
}

impl Issuer for SelfIssuer<'_> {
    fn issuer_name(&self) -> DistinguishedName {
        self.name.clone()
    }

    fn signing_authority(&self) -> &dyn SigningAuthority {
        self.authority
    }
}
