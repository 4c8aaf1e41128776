use const_oid::AssociatedOid;
use der::{
    Decode, Encode,
    asn1::{Ia5String, OctetString, Uint},
    oid::ObjectIdentifier,
};
use x509_cert::ext::pkix::crl::dp::DistributionPoint;
use x509_cert::ext::pkix::name::{DistributionPointName, GeneralName};

pub use der::flagset::FlagSet;
use x509_cert::ext::pkix::KeyUsage as X509KeyUsage;
pub use x509_cert::ext::pkix::KeyUsages;

use crate::error::CaError;

/// Trait for converting to and from X.509 extensions.
///
/// This trait provides methods to encode and decode X.509 extension values.
///
/// # Example
/// ```
/// use casmith::cert::extensions::BasicConstraints;
/// use casmith::cert::extensions::ToAndFromX509Extension;
/// let bc = BasicConstraints { is_ca: true, max_path_length: None };
/// let encoded = bc.to_x509_extension_value().unwrap();
/// let decoded = BasicConstraints::from_x509_extension_value(&encoded).unwrap();
/// assert!(decoded.is_ca);
/// ```
pub trait ToAndFromX509Extension {
    /// The Object Identifier (OID) for the extension.
    const OID: ObjectIdentifier;

    /// Encodes the extension into a DER-encoded byte vector.
    fn to_x509_extension_value(&self) -> Result<Vec<u8>, CaError>;

    /// Decodes the extension from a DER-encoded byte slice.
    fn from_x509_extension_value(extension: &[u8]) -> Result<Self, CaError>
    where
        Self: Sized;
}

/// Represents the Basic Constraints extension.
///
/// This extension indicates whether the certificate is a CA certificate and its path length.
///
/// # Fields
/// * `is_ca` - Indicates if the certificate is a CA.
/// * `max_path_length` - The maximum number of intermediate CAs allowed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BasicConstraints {
    pub is_ca: bool,
    pub max_path_length: Option<u8>,
}

impl ToAndFromX509Extension for BasicConstraints {
    const OID: ObjectIdentifier = x509_cert::ext::pkix::BasicConstraints::OID;

    fn to_x509_extension_value(&self) -> Result<Vec<u8>, CaError> {
        let bc = x509_cert::ext::pkix::BasicConstraints {
            ca: self.is_ca,
            path_len_constraint: self.max_path_length,
        };

        Ok(bc.to_der()?)
    }

    fn from_x509_extension_value(der_bytes: &[u8]) -> Result<Self, CaError> {
        let bc = x509_cert::ext::pkix::BasicConstraints::from_der(der_bytes)
            .map_err(|e| CaError::Decoding(e.to_string()))?;
        Ok(Self {
            is_ca: bc.ca,
            max_path_length: bc.path_len_constraint,
        })
    }
}

/// Represents the Key Usage extension.
///
/// This extension defines the purpose of the key contained in the certificate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyUsage(pub FlagSet<KeyUsages>);

impl KeyUsage {
    /// keyCertSign and cRLSign, the usages of a signing CA.
    pub fn certificate_authority() -> Self {
        Self(KeyUsages::KeyCertSign | KeyUsages::CRLSign)
    }

    /// digitalSignature and nonRepudiation, the usages of an end-entity key.
    pub fn end_entity() -> Self {
        Self(KeyUsages::DigitalSignature | KeyUsages::NonRepudiation)
    }

    pub fn contains(&self, usage: KeyUsages) -> bool {
        self.0.contains(usage)
    }
}

impl ToAndFromX509Extension for KeyUsage {
    const OID: ObjectIdentifier = <X509KeyUsage as AssociatedOid>::OID;

    fn to_x509_extension_value(&self) -> Result<Vec<u8>, CaError> {
        let ku = X509KeyUsage::from(self.0);
        Ok(ku.to_der()?)
    }

    fn from_x509_extension_value(extension: &[u8]) -> Result<Self, CaError> {
        let ku =
            X509KeyUsage::from_der(extension).map_err(|e| CaError::Decoding(e.to_string()))?;
        Ok(Self(ku.0))
    }
}

/// Represents the Subject Key Identifier (SKI) extension.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubjectKeyIdentifier(pub Vec<u8>);

impl ToAndFromX509Extension for SubjectKeyIdentifier {
    const OID: ObjectIdentifier = x509_cert::ext::pkix::SubjectKeyIdentifier::OID;

    fn to_x509_extension_value(&self) -> Result<Vec<u8>, CaError> {
        let ski = x509_cert::ext::pkix::SubjectKeyIdentifier(OctetString::new(self.0.as_slice())?);
        Ok(ski.to_der()?)
    }

    fn from_x509_extension_value(extension: &[u8]) -> Result<Self, CaError> {
        let ski = x509_cert::ext::pkix::SubjectKeyIdentifier::from_der(extension)
            .map_err(|e| CaError::Decoding(e.to_string()))?;
        Ok(Self(ski.0.as_bytes().to_vec()))
    }
}

/// Represents the Authority Key Identifier (AKI) extension.
///
/// Only the `keyIdentifier` form is produced; it matches the subject key
/// identifier of the issuing certificate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthorityKeyIdentifier {
    pub key_identifier: Vec<u8>,
}

impl ToAndFromX509Extension for AuthorityKeyIdentifier {
    const OID: ObjectIdentifier = x509_cert::ext::pkix::AuthorityKeyIdentifier::OID;

    fn to_x509_extension_value(&self) -> Result<Vec<u8>, CaError> {
        let aki = x509_cert::ext::pkix::AuthorityKeyIdentifier {
            key_identifier: Some(OctetString::new(self.key_identifier.as_slice())?),
            authority_cert_issuer: None,
            authority_cert_serial_number: None,
        };

        Ok(aki.to_der()?)
    }

    fn from_x509_extension_value(extension: &[u8]) -> Result<Self, CaError> {
        let aki = x509_cert::ext::pkix::AuthorityKeyIdentifier::from_der(extension)
            .map_err(|e| CaError::Decoding(e.to_string()))?;

        Ok(Self {
            key_identifier: aki
                .key_identifier
                .map(|id| id.as_bytes().to_vec())
                .unwrap_or_default(),
        })
    }
}

/// Represents the CRL Distribution Points extension.
///
/// Each entry is a single `fullName` URI; reasons and cRLIssuer are never set.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CrlDistributionPoints {
    pub uris: Vec<String>,
}

impl CrlDistributionPoints {
    pub fn single(uri: impl Into<String>) -> Self {
        Self {
            uris: vec![uri.into()],
        }
    }
}

impl ToAndFromX509Extension for CrlDistributionPoints {
    const OID: ObjectIdentifier = x509_cert::ext::pkix::CrlDistributionPoints::OID;

    fn to_x509_extension_value(&self) -> Result<Vec<u8>, CaError> {
        if self.uris.is_empty() {
            return Err(CaError::InvalidInput(
                "CRL distribution points need at least one URI".to_string(),
            ));
        }
        let points = self
            .uris
            .iter()
            .map(|uri| {
                if !uri.contains("://") {
                    return Err(CaError::InvalidInput(format!(
                        "CRL distribution point is not a URI: {uri:?}"
                    )));
                }
                let uri = Ia5String::new(uri).map_err(|e| CaError::InvalidInput(e.to_string()))?;
                Ok(DistributionPoint {
                    distribution_point: Some(DistributionPointName::FullName(vec![
                        GeneralName::UniformResourceIdentifier(uri),
                    ])),
                    reasons: None,
                    crl_issuer: None,
                })
            })
            .collect::<Result<Vec<_>, CaError>>()?;

        Ok(x509_cert::ext::pkix::CrlDistributionPoints(points).to_der()?)
    }

    fn from_x509_extension_value(extension: &[u8]) -> Result<Self, CaError> {
        let points = x509_cert::ext::pkix::CrlDistributionPoints::from_der(extension)
            .map_err(|e| CaError::Decoding(e.to_string()))?;
        let uris = points
            .0
            .iter()
            .filter_map(|point| match &point.distribution_point {
                Some(DistributionPointName::FullName(names)) => Some(names),
                _ => None,
            })
            .flatten()
            .filter_map(|name| match name {
                GeneralName::UniformResourceIdentifier(uri) => Some(uri.to_string()),
                _ => None,
            })
            .collect();
        Ok(Self { uris })
    }
}

/// Represents the CRL Number extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CrlNumber(pub u64);

impl ToAndFromX509Extension for CrlNumber {
    const OID: ObjectIdentifier = x509_cert::ext::pkix::CrlNumber::OID;

    fn to_x509_extension_value(&self) -> Result<Vec<u8>, CaError> {
        let number = x509_cert::ext::pkix::CrlNumber(Uint::new(&self.0.to_be_bytes())?);
        Ok(number.to_der()?)
    }

    fn from_x509_extension_value(extension: &[u8]) -> Result<Self, CaError> {
        let number = x509_cert::ext::pkix::CrlNumber::from_der(extension)
            .map_err(|e| CaError::Decoding(e.to_string()))?;
        let bytes = number.0.as_bytes();
        if bytes.len() > 8 {
            return Err(CaError::Decoding(format!(
                "CRL number wider than 64 bits ({} bytes)",
                bytes.len()
            )));
        }
        let mut buf = [0u8; 8];
        buf[8 - bytes.len()..].copy_from_slice(bytes);
        Ok(Self(u64::from_be_bytes(buf)))
    }
}

/// Reason code carried by a revocation entry (RFC 5280 section 5.3.1).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
#[repr(u8)]
pub enum RevocationReason {
    #[default]
    Unspecified = 0,
    KeyCompromise = 1,
    CaCompromise = 2,
    AffiliationChanged = 3,
    Superseded = 4,
    CessationOfOperation = 5,
    CertificateHold = 6,
    RemoveFromCrl = 8,
    PrivilegeWithdrawn = 9,
    AaCompromise = 10,
}

impl RevocationReason {
    pub fn code(self) -> u8 {
        self as u8
    }
}

impl TryFrom<u8> for RevocationReason {
    type Error = CaError;

    fn try_from(code: u8) -> Result<Self, Self::Error> {
        Ok(match code {
            0 => Self::Unspecified,
            1 => Self::KeyCompromise,
            2 => Self::CaCompromise,
            3 => Self::AffiliationChanged,
            4 => Self::Superseded,
            5 => Self::CessationOfOperation,
            6 => Self::CertificateHold,
            8 => Self::RemoveFromCrl,
            9 => Self::PrivilegeWithdrawn,
            10 => Self::AaCompromise,
            other => {
                return Err(CaError::InvalidInput(format!(
                    "unknown revocation reason code {other}"
                )));
            }
        })
    }
}

impl From<RevocationReason> for x509_cert::ext::pkix::CrlReason {
    fn from(value: RevocationReason) -> Self {
        use x509_cert::ext::pkix::CrlReason;
        match value {
            RevocationReason::Unspecified => CrlReason::Unspecified,
            RevocationReason::KeyCompromise => CrlReason::KeyCompromise,
            RevocationReason::CaCompromise => CrlReason::CaCompromise,
            RevocationReason::AffiliationChanged => CrlReason::AffiliationChanged,
            RevocationReason::Superseded => CrlReason::Superseded,
            RevocationReason::CessationOfOperation => CrlReason::CessationOfOperation,
            RevocationReason::CertificateHold => CrlReason::CertificateHold,
            RevocationReason::RemoveFromCrl => CrlReason::RemoveFromCRL,
            RevocationReason::PrivilegeWithdrawn => CrlReason::PrivilegeWithdrawn,
            RevocationReason::AaCompromise => CrlReason::AaCompromise,
        }
    }
}

impl ToAndFromX509Extension for RevocationReason {
    const OID: ObjectIdentifier = x509_cert::ext::pkix::CrlReason::OID;

    fn to_x509_extension_value(&self) -> Result<Vec<u8>, CaError> {
        let reason: x509_cert::ext::pkix::CrlReason = (*self).into();
        Ok(reason.to_der()?)
    }

    fn from_x509_extension_value(extension: &[u8]) -> Result<Self, CaError> {
        let reason = x509_cert::ext::pkix::CrlReason::from_der(extension)
            .map_err(|e| CaError::Decoding(e.to_string()))?;
        Self::try_from(reason as u8)
    }
}
