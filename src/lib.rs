//! # casmith - Certificate Lifecycle Management for a Small CA
//!
//! casmith runs the lifecycle of a small certificate authority on the
//! rustcrypto libraries: RSA key generation, a self-signed root, PKCS#10
//! requests, end-entity issuance and X.509 v2 revocation lists that
//! accumulate entries from one version to the next.
//!
//! ## Algorithms
//!
//! Every key is a 2048-bit RSA key and every signature is
//! `sha256WithRSAEncryption` (PKCS#1 v1.5).
//!
//! ## Formats
//!
//! - **DER**: Distinguished Encoding Rules (binary format)
//! - **PEM**: `CERTIFICATE`, `CERTIFICATE REQUEST` and `X509 CRL` blocks,
//!   base64 wrapped at 64 columns with the platform line ending
//!
//! ## Quick Start
//!
//! ### Root, Request and Leaf
//!
//! ```rust,no_run
//! use casmith::lifecycle::CertificateLifecycleManager;
//! use casmith::policy::{DEFAULT_CA_VALIDITY_DAYS, DEFAULT_END_ENTITY_VALIDITY_DAYS};
//! use x509_cert::serial_number::SerialNumber;
//!
//! # fn main() -> Result<(), casmith::error::CaError> {
//! let mut manager = CertificateLifecycleManager::new();
//!
//! let ca_key = manager.generate_key_pair()?;
//! let root = manager.issue_self_signed_certificate(
//!     &ca_key,
//!     "CN=RootCA,O=Org,C=SA",
//!     DEFAULT_CA_VALIDITY_DAYS,
//! )?;
//!
//! let user_key = manager.generate_key_pair()?;
//! let csr = manager.generate_csr_object(&user_key, "CN=user@example.com,O=Org,C=SA")?;
//!
//! let leaf = manager.issue_end_entity_certificate_from_csr(
//!     &root,
//!     &ca_key,
//!     &csr,
//!     SerialNumber::from(500u64),
//!     DEFAULT_END_ENTITY_VALIDITY_DAYS,
//! )?;
//! leaf.verify(ca_key.public_key())?;
//!
//! println!("{}", leaf.to_pem()?);
//! # Ok(())
//! # }
//! ```
//!
//! ### Revocation
//!
//! ```rust,no_run
//! # use casmith::lifecycle::CertificateLifecycleManager;
//! # use x509_cert::serial_number::SerialNumber;
//! use casmith::cert::extensions::RevocationReason;
//!
//! # fn main() -> Result<(), casmith::error::CaError> {
//! # let mut manager = CertificateLifecycleManager::new();
//! # let ca_key = manager.generate_key_pair()?;
//! # let root = manager.issue_self_signed_certificate(&ca_key, "CN=RootCA", 3650)?;
//! # let user_key = manager.generate_key_pair()?;
//! # let leaf = manager.issue_end_entity_certificate(
//! #     &root, &ca_key, user_key.public_key(), "CN=user", SerialNumber::from(7u64), 365)?;
//! let crl = manager.generate_empty_crl(&root, &ca_key)?;
//! let crl = manager.revoke_and_update_crl(
//!     Some(&crl),
//!     &root,
//!     &ca_key,
//!     &leaf,
//!     RevocationReason::KeyCompromise,
//! )?;
//! assert!(crl.contains(leaf.serial_number()));
//! # Ok(())
//! # }
//! ```
//!
//! ## Error Handling
//!
//! Every fallible operation returns [`error::CaError`]:
//!
//! ```rust
//! use casmith::cert::params::DistinguishedName;
//! use casmith::error::CaError;
//!
//! match DistinguishedName::parse("not a name") {
//!     Ok(_) => unreachable!(),
//!     Err(CaError::InvalidSubject(msg)) => println!("rejected: {msg}"),
//!     Err(e) => println!("Other error: {e}"),
//! }
//! ```
//!
//! ## Logging
//!
//! Issuance, request signing and CRL signing emit [`tracing`] events. The
//! library never installs a subscriber.
//!
//! ## Module Organization
//!
//! - [`lifecycle`]: The manager facade and the serial registry
//! - [`key`]: Key pairs, public keys and serial numbers
//! - [`cert`]: Certificates, names, validity and extensions
//! - [`issuer`]: Signing authorities and certificate issuance
//! - [`csr`]: PKCS#10 certification requests
//! - [`crl`]: Revocation lists
//! - [`policy`]: Issuance and revocation settings
//! - [`error`]: Error type
//! - [`tbs_certificate`]: Low-level certificate structure manipulation

pub mod cert;
pub mod crl;
pub mod csr;
pub mod error;
pub mod issuer;
pub mod key;
pub mod lifecycle;
pub mod pem_utils;
pub mod policy;
pub mod tbs_certificate;
