//! The certificate lifecycle facade.
//!
//! [`CertificateLifecycleManager`] strings the lower-level pieces together:
//! key pairs and serials from [`crate::key`], issuance through
//! [`crate::issuer::Issuer`], requests from [`crate::csr`] and revocation
//! lists from [`crate::crl`].

use std::collections::HashSet;

use rand_core::{CryptoRngCore, OsRng};
use time::{Duration, OffsetDateTime};
use x509_cert::serial_number::SerialNumber;

use crate::cert::Certificate;
use crate::cert::extensions::{CrlDistributionPoints, CrlNumber, RevocationReason};
use crate::cert::params::{CertificationRequestInfo, DistinguishedName, ExtensionParam, Validity};
use crate::crl::{RevocationEntry, RevocationList, UpdateWindow};
use crate::csr::CertificationRequest;
use crate::error::{CaError, Result};
use crate::issuer::{CertificateWithAuthority, Issuer, SigningAuthority};
use crate::key::{self, KeyPair, PublicKey, RSA_KEY_BITS};
use crate::policy::CaPolicy;

/// Runs every step of a small CA: keys, root, requests, leaves and CRLs.
///
/// The manager owns its random source and a [`CaPolicy`]; it keeps no other
/// state between calls. Operations that draw randomness take `&mut self`.
pub struct CertificateLifecycleManager<R = OsRng> {
    rng: R,
    policy: CaPolicy,
}

impl CertificateLifecycleManager<OsRng> {
    /// A manager drawing from the operating system RNG with the default policy.
    pub fn new() -> Self {
        Self::with_policy(CaPolicy::default())
    }

    pub fn with_policy(policy: CaPolicy) -> Self {
        Self::from_rng(OsRng, policy)
    }
}

impl Default for CertificateLifecycleManager<OsRng> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R: CryptoRngCore> CertificateLifecycleManager<R> {
    pub fn from_rng(rng: R, policy: CaPolicy) -> Self {
        Self { rng, policy }
    }

    pub fn policy(&self) -> &CaPolicy {
        &self.policy
    }

    /// Generates a fresh 2048-bit RSA key pair.
    pub fn generate_key_pair(&mut self) -> Result<KeyPair> {
        KeyPair::generate_rsa(&mut self.rng, RSA_KEY_BITS)
    }

    /// Draws a positive 128-bit serial number.
    pub fn generate_serial_number(&mut self) -> Result<SerialNumber> {
        key::generate_serial_number(&mut self.rng)
    }

    /// Issues a self-signed CA certificate for `key_pair`.
    ///
    /// Subject and issuer are both `subject_name`; the serial is freshly
    /// generated and the certificate is valid from now for `validity_days`.
    pub fn issue_self_signed_certificate(
        &mut self,
        key_pair: &dyn SigningAuthority,
        subject_name: &str,
        validity_days: u32,
    ) -> Result<Certificate> {
        let subject = DistinguishedName::parse(subject_name)?;
        let validity = Validity::for_days(validity_days)?;
        let serial_number = self.generate_serial_number()?;

        let cert_info = CertificationRequestInfo::builder()
            .subject(subject)
            .subject_public_key(key_pair.public_key().clone())
            .is_ca(true)
            .build();

        Certificate::new_self_signed(&cert_info, key_pair, serial_number, validity)
    }

    /// Builds a signed request for `subject_name` and returns its PEM form.
    pub fn generate_csr(
        &self,
        key_pair: &dyn SigningAuthority,
        subject_name: &str,
    ) -> Result<String> {
        self.generate_csr_object(key_pair, subject_name)?.to_pem()
    }

    pub fn generate_csr_object(
        &self,
        key_pair: &dyn SigningAuthority,
        subject_name: &str,
    ) -> Result<CertificationRequest> {
        let subject = DistinguishedName::parse(subject_name)?;
        CertificationRequest::new(&subject, key_pair)
    }

    /// Issues an end-entity certificate for a verified request.
    ///
    /// Subject and public key come from `csr`. Fails with
    /// [`CaError::InvalidCsrSignature`] before anything is signed if the
    /// request does not verify against its own key.
    pub fn issue_end_entity_certificate_from_csr(
        &self,
        ca_cert: &Certificate,
        ca_key: &dyn SigningAuthority,
        csr: &CertificationRequest,
        serial_number: SerialNumber,
        validity_days: u32,
    ) -> Result<Certificate> {
        if !csr.verify() {
            tracing::warn!(subject = %csr.subject(), "rejecting request with a bad signature");
            return Err(CaError::InvalidCsrSignature);
        }
        self.issue_end_entity(
            ca_cert,
            ca_key,
            csr.subject(),
            csr.public_key()?,
            serial_number,
            validity_days,
        )
    }

    /// Issues an end-entity certificate for a raw public key.
    ///
    /// No proof of possession is asked for on this path.
    pub fn issue_end_entity_certificate(
        &self,
        ca_cert: &Certificate,
        ca_key: &dyn SigningAuthority,
        public_key: &PublicKey,
        subject_name: &str,
        serial_number: SerialNumber,
        validity_days: u32,
    ) -> Result<Certificate> {
        let subject = DistinguishedName::parse(subject_name)?;
        self.issue_end_entity(
            ca_cert,
            ca_key,
            subject,
            public_key.clone(),
            serial_number,
            validity_days,
        )
    }

    fn issue_end_entity(
        &self,
        ca_cert: &Certificate,
        ca_key: &dyn SigningAuthority,
        subject: DistinguishedName,
        subject_public_key: PublicKey,
        serial_number: SerialNumber,
        validity_days: u32,
    ) -> Result<Certificate> {
        let issuer = CertificateWithAuthority::new(ca_cert, ca_key)?;
        let validity = Validity::for_days(validity_days)?;

        let cert_info = CertificationRequestInfo::builder()
            .subject(subject)
            .subject_public_key(subject_public_key)
            .extensions(self.crl_distribution_point())
            .build();

        issuer.issue(&cert_info, serial_number, validity)
    }

    // A distribution point that cannot be encoded is left out; issuance goes on.
    fn crl_distribution_point(&self) -> Vec<ExtensionParam> {
        if !self.policy.include_crl_distribution_point {
            return Vec::new();
        }
        let uri = &self.policy.crl_distribution_uri;
        match ExtensionParam::from_extension(&CrlDistributionPoints::single(uri.clone()), false) {
            Ok(ext) => vec![ext],
            Err(error) => {
                tracing::warn!(%uri, %error, "omitting CRL distribution point");
                Vec::new()
            }
        }
    }

    /// Signs a CRL with no entries.
    pub fn generate_empty_crl(
        &self,
        ca_cert: &Certificate,
        ca_key: &dyn SigningAuthority,
    ) -> Result<RevocationList> {
        let window = self.update_window()?;
        let issuer = CertificateWithAuthority::new(ca_cert, ca_key)?;
        RevocationList::sign(&issuer, &[], CrlNumber(1), window)
    }

    /// Signs a CRL holding only `cert`, revoked now for `reason`.
    ///
    /// Nothing from earlier lists is carried over.
    pub fn revoke_certificate_and_update_crl(
        &self,
        ca_cert: &Certificate,
        ca_key: &dyn SigningAuthority,
        cert: &Certificate,
        reason: RevocationReason,
    ) -> Result<RevocationList> {
        self.revoke_and_update_crl(None, ca_cert, ca_key, cert, reason)
    }

    /// Signs a CRL holding every entry of `existing` followed by `cert`,
    /// revoked now for `reason`.
    ///
    /// Carried entries keep their serial and revocation date but lose their
    /// reason. The CRL number is one above the existing list's, or 1 when
    /// there is no existing list. `existing` must verify against `ca_key`
    /// and must not already list `cert`.
    pub fn revoke_and_update_crl(
        &self,
        existing: Option<&RevocationList>,
        ca_cert: &Certificate,
        ca_key: &dyn SigningAuthority,
        cert: &Certificate,
        reason: RevocationReason,
    ) -> Result<RevocationList> {
        let window = self.update_window()?;
        let issuer = CertificateWithAuthority::new(ca_cert, ca_key)?;
        let issuer_name = issuer.issuer_name();
        if cert.issuer() != issuer_name {
            return Err(CaError::InvalidInput(format!(
                "certificate {} was issued by {}, not {}",
                cert.serial_number(),
                cert.issuer(),
                issuer_name
            )));
        }

        let (mut entries, crl_number) = match existing {
            Some(existing) => {
                if existing.issuer() != issuer_name {
                    return Err(CaError::InvalidInput(format!(
                        "revocation list belongs to {}, not {}",
                        existing.issuer(),
                        issuer_name
                    )));
                }
                existing.verify(ca_key.public_key())?;
                if existing.contains(cert.serial_number()) {
                    return Err(CaError::AlreadyRevoked(cert.serial_number().to_string()));
                }

                let entries = existing
                    .entries()?
                    .into_iter()
                    .map(|entry| RevocationEntry {
                        reason: None,
                        ..entry
                    })
                    .collect::<Vec<_>>();
                let next = match existing.crl_number()? {
                    Some(CrlNumber(n)) => n.checked_add(1).ok_or_else(|| {
                        CaError::InvalidInput("CRL number exhausted".to_string())
                    })?,
                    None => 1,
                };
                (entries, CrlNumber(next))
            }
            None => (Vec::new(), CrlNumber(1)),
        };

        entries.push(RevocationEntry {
            serial_number: cert.serial_number().clone(),
            revocation_date: window.this_update,
            reason: Some(reason),
        });

        tracing::info!(
            issuer = %issuer_name,
            serial = %cert.serial_number(),
            reason = reason.code(),
            "revoking certificate"
        );

        RevocationList::sign(&issuer, &entries, crl_number, window)
    }

    fn update_window(&self) -> Result<UpdateWindow> {
        let days = self.policy.crl_validity_days;
        if days == 0 {
            return Err(CaError::InvalidInput(
                "CRL validity must be at least one day".to_string(),
            ));
        }
        let this_update = OffsetDateTime::now_utc()
            .replace_nanosecond(0)
            .map_err(|e| CaError::InvalidInput(e.to_string()))?;
        let next_update = this_update
            .checked_add(Duration::days(i64::from(days)))
            .ok_or_else(|| {
                CaError::InvalidInput(format!("CRL validity of {days} days is out of range"))
            })?;
        Ok(UpdateWindow {
            this_update,
            next_update,
        })
    }
}

/// Serials already handed out by one issuer.
///
/// End-entity serials are chosen by the caller; issuing through
/// [`SerialRegistry::issue_with`] refuses a repeat before anything is signed.
#[derive(Debug, Default, Clone)]
pub struct SerialRegistry {
    issued: HashSet<Vec<u8>>,
}

impl SerialRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records `serial_number`, failing with [`CaError::InvalidInput`] if it
    /// was recorded before.
    pub fn reserve(&mut self, serial_number: &SerialNumber) -> Result<()> {
        if !self.issued.insert(serial_number.as_bytes().to_vec()) {
            return Err(CaError::InvalidInput(format!(
                "serial number {serial_number} already issued"
            )));
        }
        Ok(())
    }

    /// Reserves `serial_number` and runs `issue` with it.
    ///
    /// A repeated serial fails with [`CaError::InvalidInput`] before `issue`
    /// is called. If `issue` fails the reservation is released.
    pub fn issue_with<F>(&mut self, serial_number: SerialNumber, issue: F) -> Result<Certificate>
    where
        F: FnOnce(SerialNumber) -> Result<Certificate>,
    {
        self.reserve(&serial_number)?;
        let key = serial_number.as_bytes().to_vec();
        issue(serial_number).inspect_err(|_| {
            self.issued.remove(&key);
        })
    }

    pub fn contains(&self, serial_number: &SerialNumber) -> bool {
        self.issued.contains(serial_number.as_bytes())
    }

    pub fn len(&self) -> usize {
        self.issued.len()
    }

    pub fn is_empty(&self) -> bool {
        self.issued.is_empty()
    }
}
