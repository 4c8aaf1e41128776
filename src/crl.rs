//! X.509 v2 certificate revocation lists.
//!
//! A [`RevocationList`] is an immutable, signed value. Revoking a certificate
//! never changes an existing list: the caller builds a new one from the
//! entries it wants to keep plus the new entry.

use der::{Decode, Encode};
use time::OffsetDateTime;
use x509_cert::Version;
use x509_cert::crl::{CertificateList, RevokedCert, TbsCertList};
use x509_cert::serial_number::SerialNumber;

use crate::cert::SignatureAlgorithm;
use crate::cert::extensions::{
    AuthorityKeyIdentifier, CrlNumber, RevocationReason, ToAndFromX509Extension,
};
use crate::cert::params::{DistinguishedName, ExtensionParam};
use crate::error::{CaError, Result};
use crate::issuer::Issuer;
use crate::key::PublicKey;
use crate::pem_utils;
use crate::tbs_certificate::{from_x509_time, to_x509_time};

/// One revoked certificate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RevocationEntry {
    pub serial_number: SerialNumber,
    pub revocation_date: OffsetDateTime,
    /// `None` and `Some(Unspecified)` both encode without a reason extension.
    pub reason: Option<RevocationReason>,
}

impl RevocationEntry {
    fn to_revoked_cert(&self) -> Result<RevokedCert> {
        let crl_entry_extensions = match self.reason {
            None | Some(RevocationReason::Unspecified) => None,
            Some(reason) => Some(vec![
                ExtensionParam::from_extension(&reason, false)?.to_x509()?,
            ]),
        };
        Ok(RevokedCert {
            serial_number: self.serial_number.clone(),
            revocation_date: to_x509_time(self.revocation_date)?,
            crl_entry_extensions,
        })
    }

    fn from_revoked_cert(revoked: &RevokedCert) -> Result<Self> {
        let reason = revoked
            .crl_entry_extensions
            .as_deref()
            .unwrap_or_default()
            .iter()
            .map(ExtensionParam::from_x509)
            .find(|ext| ext.oid == RevocationReason::OID)
            .map(|ext| ext.to_extension::<RevocationReason>())
            .transpose()?;
        Ok(Self {
            serial_number: revoked.serial_number.clone(),
            revocation_date: from_x509_time(&revoked.revocation_date),
            reason,
        })
    }
}

/// The update window of a revocation list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UpdateWindow {
    pub this_update: OffsetDateTime,
    pub next_update: OffsetDateTime,
}

/// A signed certificate revocation list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RevocationList {
    pub inner: CertificateList,
}

impl RevocationList {
    /// Builds and signs a list holding `entries` in the given order.
    ///
    /// The list carries an authority key identifier for the signing key and
    /// `crl_number`. Fails with [`CaError::AlreadyRevoked`] if a serial
    /// appears twice.
    pub fn sign(
        issuer: &dyn Issuer,
        entries: &[RevocationEntry],
        crl_number: CrlNumber,
        window: UpdateWindow,
    ) -> Result<Self> {
        if window.this_update >= window.next_update {
            return Err(CaError::InvalidInput(format!(
                "thisUpdate {} is not before nextUpdate {}",
                window.this_update, window.next_update
            )));
        }
        for (i, entry) in entries.iter().enumerate() {
            if entries[..i]
                .iter()
                .any(|earlier| earlier.serial_number == entry.serial_number)
            {
                return Err(CaError::AlreadyRevoked(entry.serial_number.to_string()));
            }
        }

        let authority = issuer.signing_authority();
        let issuer_dn = issuer.issuer_name();

        let revoked = entries
            .iter()
            .map(RevocationEntry::to_revoked_cert)
            .collect::<Result<Vec<_>>>()?;

        let crl_extensions = vec![
            ExtensionParam::from_extension(
                &AuthorityKeyIdentifier {
                    key_identifier: authority.public_key().key_identifier()?,
                },
                false,
            )?
            .to_x509()?,
            ExtensionParam::from_extension(&crl_number, false)?.to_x509()?,
        ];

        let tbs_cert_list = TbsCertList {
            version: Version::V2,
            signature: authority.signature_algorithm().into(),
            issuer: issuer_dn.as_x509_name(),
            this_update: to_x509_time(window.this_update)?,
            next_update: Some(to_x509_time(window.next_update)?),
            // An empty SEQUENCE OF is not allowed here; the field is omitted instead.
            revoked_certificates: if revoked.is_empty() {
                None
            } else {
                Some(revoked)
            },
            crl_extensions: Some(crl_extensions),
        };

        let signature = authority.sign(&tbs_cert_list.to_der()?)?;

        tracing::info!(
            issuer = %issuer_dn,
            entries = entries.len(),
            crl_number = crl_number.0,
            "signed revocation list"
        );

        Ok(Self {
            inner: CertificateList {
                signature_algorithm: tbs_cert_list.signature.clone(),
                tbs_cert_list,
                signature: der::asn1::BitString::from_bytes(&signature)?,
            },
        })
    }

    pub fn issuer(&self) -> DistinguishedName {
        DistinguishedName::from_x509_name(&self.inner.tbs_cert_list.issuer)
    }

    pub fn this_update(&self) -> OffsetDateTime {
        from_x509_time(&self.inner.tbs_cert_list.this_update)
    }

    pub fn next_update(&self) -> Option<OffsetDateTime> {
        self.inner
            .tbs_cert_list
            .next_update
            .as_ref()
            .map(from_x509_time)
    }

    /// Revocation entries in list order.
    pub fn entries(&self) -> Result<Vec<RevocationEntry>> {
        self.inner
            .tbs_cert_list
            .revoked_certificates
            .as_deref()
            .unwrap_or_default()
            .iter()
            .map(RevocationEntry::from_revoked_cert)
            .collect()
    }

    pub fn len(&self) -> usize {
        self.inner
            .tbs_cert_list
            .revoked_certificates
            .as_ref()
            .map_or(0, Vec::len)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn contains(&self, serial_number: &SerialNumber) -> bool {
        self.inner
            .tbs_cert_list
            .revoked_certificates
            .as_deref()
            .unwrap_or_default()
            .iter()
            .any(|revoked| revoked.serial_number == *serial_number)
    }

    /// The CRL number extension, if present.
    pub fn crl_number(&self) -> Result<Option<CrlNumber>> {
        self.inner
            .tbs_cert_list
            .crl_extensions
            .as_deref()
            .unwrap_or_default()
            .iter()
            .map(ExtensionParam::from_x509)
            .find(|ext| ext.oid == CrlNumber::OID)
            .map(|ext| ext.to_extension::<CrlNumber>())
            .transpose()
    }

    /// Checks the list signature against `issuer_key`.
    pub fn verify(&self, issuer_key: &PublicKey) -> Result<()> {
        if self.inner.signature_algorithm != self.inner.tbs_cert_list.signature {
            return Err(CaError::InvalidSignature(
                "signature algorithm does not match the signed body".to_string(),
            ));
        }
        SignatureAlgorithm::try_from(&self.inner.signature_algorithm)?;
        let signature = self.inner.signature.as_bytes().ok_or_else(|| {
            CaError::InvalidSignature("signature has unused bits".to_string())
        })?;
        issuer_key.verify(&self.inner.tbs_cert_list.to_der()?, signature)
    }

    pub fn to_der(&self) -> Result<Vec<u8>> {
        Ok(self.inner.to_der()?)
    }

    /// PEM form with the `X509 CRL` label.
    pub fn to_pem(&self) -> Result<String> {
        Ok(pem_utils::der_to_pem(&self.to_der()?, pem_utils::CRL_LABEL))
    }

    pub fn from_der(der: &[u8]) -> Result<Self> {
        let inner =
            CertificateList::from_der(der).map_err(|e| CaError::Decoding(e.to_string()))?;
        Ok(Self { inner })
    }

    pub fn from_pem(pem: &str) -> Result<Self> {
        Self::from_der(&pem_utils::pem_to_der(pem, pem_utils::CRL_LABEL)?)
    }
}

#[cfg(test)]
mod tests {
    use rand_chacha::ChaCha8Rng;
    use rand_chacha::rand_core::SeedableRng;
    use time::Duration;
    use time::macros::datetime;

    use super::*;
    use crate::cert::Certificate;
    use crate::cert::params::{CertificationRequestInfo, Validity};
    use crate::issuer::CertificateWithAuthority;
    use crate::key::{KeyPair, RSA_KEY_BITS};

    fn ca() -> (KeyPair, Certificate) {
        let mut rng = ChaCha8Rng::seed_from_u64(21);
        let key_pair = KeyPair::generate_rsa(&mut rng, RSA_KEY_BITS).unwrap();
        let info = CertificationRequestInfo::builder()
            .subject(DistinguishedName::parse("CN=TestCA,O=TestOrg,C=SA").unwrap())
            .subject_public_key(key_pair.public_key().clone())
            .is_ca(true)
            .build();
        let cert = Certificate::new_self_signed(
            &info,
            &key_pair,
            SerialNumber::from(1u64),
            Validity::for_days(30).unwrap(),
        )
        .unwrap();
        (key_pair, cert)
    }

    fn window() -> UpdateWindow {
        let this_update = datetime!(2030-03-01 10:00 UTC);
        UpdateWindow {
            this_update,
            next_update: this_update + Duration::days(30),
        }
    }

    fn entry(serial: u64, reason: Option<RevocationReason>) -> RevocationEntry {
        RevocationEntry {
            serial_number: SerialNumber::from(serial),
            revocation_date: datetime!(2030-03-01 09:00 UTC),
            reason,
        }
    }

    #[test]
    fn empty_list_omits_revoked_certificates() {
        let (key_pair, cert) = ca();
        let issuer = CertificateWithAuthority::new(&cert, &key_pair).unwrap();
        let crl = RevocationList::sign(&issuer, &[], CrlNumber(1), window()).unwrap();

        assert!(crl.is_empty());
        assert!(crl.inner.tbs_cert_list.revoked_certificates.is_none());
        assert_eq!(crl.issuer(), cert.subject());
        assert_eq!(crl.crl_number().unwrap(), Some(CrlNumber(1)));
        assert_eq!(crl.next_update(), Some(window().next_update));
        crl.verify(key_pair.public_key()).unwrap();
    }

    #[test]
    fn reasons_are_encoded_except_unspecified() {
        let (key_pair, cert) = ca();
        let issuer = CertificateWithAuthority::new(&cert, &key_pair).unwrap();
        let entries = [
            entry(10, Some(RevocationReason::KeyCompromise)),
            entry(11, Some(RevocationReason::Unspecified)),
            entry(12, None),
        ];
        let crl = RevocationList::sign(&issuer, &entries, CrlNumber(2), window()).unwrap();
        let decoded = RevocationList::from_der(&crl.to_der().unwrap()).unwrap();

        let read_back = decoded.entries().unwrap();
        assert_eq!(read_back.len(), 3);
        assert_eq!(read_back[0].reason, Some(RevocationReason::KeyCompromise));
        assert_eq!(read_back[1].reason, None);
        assert_eq!(read_back[2].reason, None);
        assert_eq!(read_back[0].revocation_date, entries[0].revocation_date);
        assert!(decoded.contains(&SerialNumber::from(11u64)));
        assert!(!decoded.contains(&SerialNumber::from(13u64)));
    }

    #[test]
    fn duplicate_serials_are_rejected() {
        let (key_pair, cert) = ca();
        let issuer = CertificateWithAuthority::new(&cert, &key_pair).unwrap();
        let entries = [entry(7, None), entry(7, Some(RevocationReason::Superseded))];
        assert!(matches!(
            RevocationList::sign(&issuer, &entries, CrlNumber(1), window()),
            Err(CaError::AlreadyRevoked(_))
        ));
    }

    #[test]
    fn tampered_list_fails_verification() {
        let (key_pair, cert) = ca();
        let issuer = CertificateWithAuthority::new(&cert, &key_pair).unwrap();
        let mut crl =
            RevocationList::sign(&issuer, &[entry(5, None)], CrlNumber(1), window()).unwrap();
        crl.inner.tbs_cert_list.revoked_certificates = None;
        assert!(matches!(
            crl.verify(key_pair.public_key()),
            Err(CaError::InvalidSignature(_))
        ));
    }

    #[test]
    fn pem_uses_crl_label() {
        let (key_pair, cert) = ca();
        let issuer = CertificateWithAuthority::new(&cert, &key_pair).unwrap();
        let crl = RevocationList::sign(&issuer, &[], CrlNumber(1), window()).unwrap();
        let pem = crl.to_pem().unwrap();
        assert!(pem.starts_with("-----BEGIN X509 CRL-----"));
        assert_eq!(RevocationList::from_pem(&pem).unwrap(), crl);
    }
}
