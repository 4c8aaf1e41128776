#![allow(dead_code)]

use casmith::cert::Certificate;
use casmith::key::KeyPair;
use casmith::lifecycle::CertificateLifecycleManager;
use casmith::policy::CaPolicy;
use rand_chacha::ChaCha8Rng;
use rand_chacha::rand_core::SeedableRng;
use x509_cert::serial_number::SerialNumber;

pub const CA_SUBJECT: &str = "CN=TestCA,O=TestOrg,C=SA";

pub type Manager = CertificateLifecycleManager<ChaCha8Rng>;

/// A manager on a seeded RNG so key generation is reproducible.
pub fn manager(seed: u64) -> Manager {
    CertificateLifecycleManager::from_rng(ChaCha8Rng::seed_from_u64(seed), CaPolicy::default())
}

pub struct TestCa {
    pub key: KeyPair,
    pub cert: Certificate,
}

pub fn generate_ca_cert(manager: &mut Manager) -> TestCa {
    let key = manager.generate_key_pair().unwrap();
    let cert = manager
        .issue_self_signed_certificate(&key, CA_SUBJECT, 365)
        .unwrap();
    TestCa { key, cert }
}

pub fn issue_end_entity(
    manager: &mut Manager,
    ca: &TestCa,
    subject: &str,
    serial: u64,
) -> Certificate {
    let key = manager.generate_key_pair().unwrap();
    manager
        .issue_end_entity_certificate(
            &ca.cert,
            &ca.key,
            key.public_key(),
            subject,
            SerialNumber::from(serial),
            365,
        )
        .unwrap()
}
