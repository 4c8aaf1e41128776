use std::time::SystemTime;

use der::Encode;
use der::asn1::{GeneralizedTime, UtcTime};
use time::OffsetDateTime;
use x509_cert::Version;
use x509_cert::certificate::TbsCertificateInner;
use x509_cert::serial_number::SerialNumber;
use x509_cert::time::Time;

use crate::cert::SignatureAlgorithm;
use crate::cert::params::{DistinguishedName, ExtensionParam, Validity};
use crate::error::{CaError, Result};
use crate::key::PublicKey;

/// Represents the "To Be Signed" (TBS) portion of an X.509 certificate.
/// This struct contains all the fields required to generate a valid X.509 certificate.
///
/// # Fields
/// * `serial_number` - The unique identifier for the certificate.
/// * `signature_algorithm` - The algorithm used to sign the certificate.
/// * `issuer` - The distinguished name of the certificate issuer.
/// * `validity` - The `notBefore`/`notAfter` window.
/// * `subject` - The distinguished name of the certificate subject.
/// * `subject_public_key` - The public key of the certificate subject.
/// * `extensions` - Additional X.509 extensions for the certificate.
#[derive(Clone, Debug)]
pub struct TbsCertificate {
    /// Certificate serial number
    pub serial_number: SerialNumber,
    /// Certificate signature algorithm
    pub signature_algorithm: SignatureAlgorithm,
    /// Certificate issuer distinguished name
    pub issuer: DistinguishedName,
    /// Validity window
    pub validity: Validity,
    /// Certificate subject distinguished name
    pub subject: DistinguishedName,
    /// Subject's public key
    pub subject_public_key: PublicKey,
    /// Certificate extensions
    pub extensions: Vec<ExtensionParam>,
}

impl TbsCertificate {
    /// Converts the `TbsCertificate` into a `TbsCertificateInner` for DER encoding.
    ///
    /// Fails if `not_before` is not strictly before `not_after`.
    pub fn to_tbs_certificate_inner(&self) -> Result<TbsCertificateInner> {
        if self.validity.not_before >= self.validity.not_after {
            return Err(CaError::InvalidInput(format!(
                "notBefore {} is not before notAfter {}",
                self.validity.not_before, self.validity.not_after
            )));
        }

        let extensions = self
            .extensions
            .iter()
            .map(ExtensionParam::to_x509)
            .collect::<Result<Vec<_>>>()?;

        let validity = x509_cert::time::Validity {
            not_before: to_x509_time(self.validity.not_before)?,
            not_after: to_x509_time(self.validity.not_after)?,
        };

        Ok(TbsCertificateInner {
            version: Version::V3,
            serial_number: self.serial_number.clone(),
            signature: self.signature_algorithm.into(),
            issuer: self.issuer.as_x509_name(),
            validity,
            subject: self.subject.as_x509_name(),
            subject_public_key_info: self.subject_public_key.as_spki()?,
            issuer_unique_id: None,
            subject_unique_id: None,
            extensions: if extensions.is_empty() {
                None
            } else {
                Some(extensions)
            },
        })
    }

    /// Creates a `TbsCertificate` from a `TbsCertificateInner`.
    pub fn from_tbs_certificate_inner(inner: &TbsCertificateInner) -> Result<Self> {
        let signature_algorithm = SignatureAlgorithm::try_from(&inner.signature)?;

        let extensions = inner
            .extensions
            .as_deref()
            .unwrap_or_default()
            .iter()
            .map(ExtensionParam::from_x509)
            .collect::<Vec<_>>();

        Ok(Self {
            serial_number: inner.serial_number.clone(),
            signature_algorithm,
            issuer: DistinguishedName::from_x509_name(&inner.issuer),
            validity: Validity {
                not_before: from_x509_time(&inner.validity.not_before),
                not_after: from_x509_time(&inner.validity.not_after),
            },
            subject: DistinguishedName::from_x509_name(&inner.subject),
            subject_public_key: PublicKey::from_x509spki(&inner.subject_public_key_info)?,
            extensions,
        })
    }

    /// Encodes the `TbsCertificate` into DER format.
    pub fn to_der(&self) -> Result<Vec<u8>> {
        Ok(self.to_tbs_certificate_inner()?.to_der()?)
    }
}

/// Converts a timestamp to the X.509 `Time` choice.
///
/// RFC 5280 section 4.1.2.5: UTCTime through 2049, GeneralizedTime from 2050.
/// Sub-second precision is dropped.
pub(crate) fn to_x509_time(instant: OffsetDateTime) -> Result<Time> {
    let instant = instant
        .replace_nanosecond(0)
        .map_err(|e| CaError::InvalidInput(e.to_string()))?;
    let system_time: SystemTime = instant.into();
    if instant.year() < 2050 {
        Ok(Time::UtcTime(UtcTime::from_system_time(system_time)?))
    } else {
        Ok(Time::GeneralTime(GeneralizedTime::from_system_time(
            system_time,
        )?))
    }
}

pub(crate) fn from_x509_time(time: &Time) -> OffsetDateTime {
    OffsetDateTime::from(time.to_system_time())
}
