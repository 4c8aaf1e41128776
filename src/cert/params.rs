use core::fmt;
use core::str::FromStr;

use bon::Builder;
use const_oid::ObjectIdentifier;
use const_oid::db::rfc4519;
use der::Tag;
use der::Tagged;
use der::asn1::{Ia5StringRef, PrintableStringRef, Utf8StringRef};
use time::Duration;
use time::OffsetDateTime;
use x509_cert::attr::AttributeTypeAndValue;
use x509_cert::name::RdnSequence;

use super::extensions::ToAndFromX509Extension;
use crate::error::CaError;
use crate::key::PublicKey;

/// Parameters for building an X.509 certificate.
///
/// # Fields
/// * `subject` - The distinguished name of the certificate subject.
/// * `subject_public_key` - The public key of the certificate subject.
/// * `is_ca` - Indicates if the certificate is a CA.
/// * `extensions` - Additional X.509 extensions appended after the profile ones.
#[derive(Clone, Debug, Builder)]
pub struct CertificationRequestInfo {
    pub subject: DistinguishedName,
    pub subject_public_key: PublicKey,
    #[builder(default)]
    pub is_ca: bool,
    #[builder(default)]
    pub extensions: Vec<ExtensionParam>,
}

/// A subject or issuer name.
///
/// Parsed from the RFC 4514 string form, e.g. `CN=RootCA,O=Org,C=SA`, and
/// kept as the encoded RDN sequence so it round-trips through certificates
/// unchanged. Two names are equal when their RDN sequences are equal.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DistinguishedName(RdnSequence);

impl DistinguishedName {
    /// Parses an RFC 4514 string.
    ///
    /// Fails with [`CaError::InvalidSubject`] for empty strings, unknown
    /// attribute types and malformed `TYPE=value` pairs.
    pub fn parse(name: &str) -> Result<Self, CaError> {
        if name.trim().is_empty() {
            return Err(CaError::InvalidSubject(
                "distinguished name is empty".to_string(),
            ));
        }
        let rdns = RdnSequence::from_str(name)
            .map_err(|e| CaError::InvalidSubject(format!("{name:?}: {e}")))?;
        if rdns.is_empty() {
            return Err(CaError::InvalidSubject(format!(
                "{name:?}: no attributes"
            )));
        }
        Ok(Self(rdns))
    }

    /// Converts the distinguished name to an X.509-compatible format.
    pub fn as_x509_name(&self) -> x509_cert::name::DistinguishedName {
        self.0.clone()
    }

    /// Creates a `DistinguishedName` from an X.509-compatible format.
    pub fn from_x509_name(x509dn: &x509_cert::name::DistinguishedName) -> Self {
        Self(x509dn.clone())
    }

    pub fn common_name(&self) -> Option<String> {
        self.attribute(rfc4519::CN)
    }

    pub fn organization(&self) -> Option<String> {
        self.attribute(rfc4519::O)
    }

    pub fn organization_unit(&self) -> Option<String> {
        self.attribute(rfc4519::OU)
    }

    pub fn country(&self) -> Option<String> {
        self.attribute(rfc4519::C)
    }

    /// First value of the given attribute type, in RFC 4514 order.
    pub fn attribute(&self, oid: ObjectIdentifier) -> Option<String> {
        // RdnSequence stores the most significant RDN first; the string form is reversed.
        self.0
            .0
            .iter()
            .rev()
            .flat_map(|rdn| rdn.0.iter())
            .find(|atv| atv.oid == oid)
            .and_then(attribute_value)
    }
}

fn attribute_value(atv: &AttributeTypeAndValue) -> Option<String> {
    let value = match atv.value.tag() {
        Tag::Utf8String => Utf8StringRef::try_from(&atv.value).ok()?.as_str(),
        Tag::PrintableString => PrintableStringRef::try_from(&atv.value).ok()?.as_str(),
        Tag::Ia5String => Ia5StringRef::try_from(&atv.value).ok()?.as_str(),
        _ => return None,
    };
    Some(value.to_string())
}

impl FromStr for DistinguishedName {
    type Err = CaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for DistinguishedName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Certificate validity period.
///
/// This struct represents the `notBefore` and `notAfter` fields in a certificate.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Validity {
    pub not_before: OffsetDateTime,
    pub not_after: OffsetDateTime,
}

impl Validity {
    /// Creates a validity period starting now for the given number of days.
    ///
    /// Both bounds are truncated to whole seconds, the precision DER time
    /// types can carry, so the window read back from an encoded certificate
    /// is identical to this one.
    pub fn for_days(days: u32) -> Result<Self, CaError> {
        if days == 0 {
            return Err(CaError::InvalidInput(
                "validity must be at least one day".to_string(),
            ));
        }
        let now = OffsetDateTime::now_utc()
            .replace_nanosecond(0)
            .map_err(|e| CaError::InvalidInput(e.to_string()))?;
        let not_after = now.checked_add(Duration::days(i64::from(days))).ok_or_else(|| {
            CaError::InvalidInput(format!("validity of {days} days is out of range"))
        })?;
        Ok(Self {
            not_before: now,
            not_after,
        })
    }

    pub fn contains(&self, instant: OffsetDateTime) -> bool {
        self.not_before <= instant && instant < self.not_after
    }
}

/// Represents an X.509 extension.
///
/// # Fields
/// * `oid` - The object identifier of the extension.
/// * `critical` - Indicates if the extension is critical.
/// * `value` - The DER-encoded value of the extension.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExtensionParam {
    pub oid: ObjectIdentifier,
    pub critical: bool,
    /// DER-encoded extension value
    pub value: Vec<u8>,
}

impl ExtensionParam {
    /// Encodes `extension` into an `ExtensionParam`.
    pub fn from_extension<E: ToAndFromX509Extension>(
        extension: &E,
        critical: bool,
    ) -> Result<Self, CaError> {
        Ok(Self {
            oid: E::OID,
            critical,
            value: extension.to_x509_extension_value()?,
        })
    }

    /// Decodes an `ExtensionParam` into a specific extension.
    pub fn to_extension<E: ToAndFromX509Extension>(&self) -> Result<E, CaError> {
        E::from_x509_extension_value(&self.value)
    }

    pub(crate) fn from_x509(ext: &x509_cert::ext::Extension) -> Self {
        Self {
            oid: ext.extn_id,
            critical: ext.critical,
            value: ext.extn_value.as_bytes().to_vec(),
        }
    }

    pub(crate) fn to_x509(&self) -> Result<x509_cert::ext::Extension, CaError> {
        Ok(x509_cert::ext::Extension {
            extn_id: self.oid,
            critical: self.critical,
            extn_value: der::asn1::OctetString::new(self.value.clone())?,
        })
    }
}
