use der::Encode;
use x509_cert::certificate::CertificateInner;
use x509_cert::serial_number::SerialNumber;

use crate::cert::Certificate;
use crate::cert::SignatureAlgorithm;
use crate::cert::extensions::{
    AuthorityKeyIdentifier, BasicConstraints, KeyUsage, SubjectKeyIdentifier,
};
use crate::cert::params::{CertificationRequestInfo, DistinguishedName, ExtensionParam, Validity};
use crate::error::{CaError, Result};
use crate::key::PublicKey;
use crate::tbs_certificate::TbsCertificate;

/// A capability that can produce signatures.
///
/// [`crate::key::KeyPair`] is the in-memory implementation; anything that can
/// sign with SHA-256/RSA on behalf of a key (an HSM session, a remote signer)
/// can stand in for it.
pub trait SigningAuthority {
    /// Algorithm recorded in the signed structure.
    fn signature_algorithm(&self) -> SignatureAlgorithm;

    /// Public half of the signing key.
    fn public_key(&self) -> &PublicKey;

    /// Signs `message` and returns the raw signature bytes.
    fn sign(&self, message: &[u8]) -> Result<Vec<u8>>;
}

/// Represents an entity capable of issuing certificates.
///
/// This trait provides methods to retrieve issuer details and issue certificates.
pub trait Issuer {
    /// Returns the distinguished name of the issuer.
    fn issuer_name(&self) -> DistinguishedName;

    /// Returns the authority that signs on behalf of the issuer.
    fn signing_authority(&self) -> &dyn SigningAuthority;

    /// Issues a certificate based on the provided certification request information.
    ///
    /// CA requests get critical basic constraints with the CA flag, critical
    /// keyCertSign/cRLSign key usage and a subject key identifier. Other
    /// requests get critical basic constraints without the CA flag, critical
    /// digitalSignature/nonRepudiation key usage and an authority key
    /// identifier. The request's own extensions follow the profile ones.
    fn issue(
        &self,
        cert_request: &CertificationRequestInfo,
        serial_number: SerialNumber,
        validity: Validity,
    ) -> Result<Certificate> {
        let authority = self.signing_authority();
        let issuer_dn = self.issuer_name();

        let mut extensions = if cert_request.is_ca {
            vec![
                ExtensionParam::from_extension(
                    &BasicConstraints {
                        is_ca: true,
                        max_path_length: None,
                    },
                    true,
                )?,
                ExtensionParam::from_extension(&KeyUsage::certificate_authority(), true)?,
                ExtensionParam::from_extension(
                    &SubjectKeyIdentifier(cert_request.subject_public_key.key_identifier()?),
                    false,
                )?,
            ]
        } else {
            vec![
                ExtensionParam::from_extension(&BasicConstraints::default(), true)?,
                ExtensionParam::from_extension(&KeyUsage::end_entity(), true)?,
                ExtensionParam::from_extension(
                    &AuthorityKeyIdentifier {
                        key_identifier: authority.public_key().key_identifier()?,
                    },
                    false,
                )?,
            ]
        };

        for ext in &cert_request.extensions {
            if extensions.iter().any(|existing| existing.oid == ext.oid) {
                return Err(CaError::InvalidInput(format!(
                    "extension {} is set by the issuance profile",
                    ext.oid
                )));
            }
            extensions.push(ext.clone());
        }

        let tbs_cert = TbsCertificate {
            serial_number,
            signature_algorithm: authority.signature_algorithm(),
            issuer: issuer_dn,
            validity,
            subject: cert_request.subject.clone(),
            subject_public_key: cert_request.subject_public_key.clone(),
            extensions,
        };

        let tbs_cert_inner = tbs_cert.to_tbs_certificate_inner()?;
        let signature = authority.sign(&tbs_cert_inner.to_der()?)?;

        let cert_inner = CertificateInner {
            signature_algorithm: tbs_cert_inner.signature.clone(),
            tbs_certificate: tbs_cert_inner,
            signature: der::asn1::BitString::from_bytes(&signature)?,
        };

        tracing::info!(
            subject = %tbs_cert.subject,
            issuer = %tbs_cert.issuer,
            serial = %tbs_cert.serial_number,
            ca = cert_request.is_ca,
            "issued certificate"
        );

        Ok(Certificate { inner: cert_inner })
    }
}

/// A CA certificate paired with the authority that holds its key.
///
/// The issuer name of everything issued through it is the certificate's
/// subject.
pub struct CertificateWithAuthority<'a> {
    pub cert: &'a Certificate,
    authority: &'a dyn SigningAuthority,
}

impl<'a> CertificateWithAuthority<'a> {
    /// Pairs `cert` with `authority`.
    ///
    /// Fails with [`CaError::InvalidInput`] if the authority's public key is
    /// not the key certified by `cert`.
    pub fn new(cert: &'a Certificate, authority: &'a dyn SigningAuthority) -> Result<Self> {
        if cert.public_key()? != *authority.public_key() {
            return Err(CaError::InvalidInput(format!(
                "signing key does not match the certificate of {}",
                cert.subject()
            )));
        }
        Ok(Self { cert, authority })
    }
}

impl Issuer for CertificateWithAuthority<'_> {
    fn issuer_name(&self) -> DistinguishedName {
        self.cert.subject()
    }

    fn signing_authority(&self) -> &dyn SigningAuthority {
        self.authority
    }
}
