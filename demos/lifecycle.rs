use casmith::cert::extensions::RevocationReason;
use casmith::lifecycle::CertificateLifecycleManager;
use casmith::policy::{DEFAULT_CA_VALIDITY_DAYS, DEFAULT_END_ENTITY_VALIDITY_DAYS};
use x509_cert::serial_number::SerialNumber;

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt().with_target(false).init();

    let mut manager = CertificateLifecycleManager::new();

    // Root CA
    let root_key = manager.generate_key_pair()?;
    let root_cert = manager.issue_self_signed_certificate(
        &root_key,
        "CN=MyRootCA,O=MyOrganization,C=SA",
        DEFAULT_CA_VALIDITY_DAYS,
    )?;
    let validity = root_cert.validity();
    println!("Root CA certificate");
    println!("  subject:    {}", root_cert.subject());
    println!("  issuer:     {}", root_cert.issuer());
    println!("  serial:     {}", root_cert.serial_number());
    println!("  not before: {}", validity.not_before);
    println!("  not after:  {}", validity.not_after);

    // End entity via CSR
    let user_key = manager.generate_key_pair()?;
    let subject = "CN=John.Doe,O=MyOrganization,C=SA";
    let csr = manager.generate_csr_object(&user_key, subject)?;
    println!("\nCertification request:\n{}", csr.to_pem()?);

    let user_cert = manager.issue_end_entity_certificate_from_csr(
        &root_cert,
        &root_key,
        &csr,
        SerialNumber::from(1001u64),
        DEFAULT_END_ENTITY_VALIDITY_DAYS,
    )?;
    user_cert.verify(root_key.public_key())?;
    println!("End-entity certificate");
    println!("  subject: {}", user_cert.subject());
    println!("  issuer:  {}", user_cert.issuer());
    println!("  serial:  {}", user_cert.serial_number());
    println!("  CRL:     {:?}", user_cert.crl_distribution_points()?);

    // Revocation
    let empty_crl = manager.generate_empty_crl(&root_cert, &root_key)?;
    println!("\nEmpty CRL");
    println!("  issuer:      {}", empty_crl.issuer());
    println!("  this update: {}", empty_crl.this_update());
    println!("  entries:     {}", empty_crl.len());

    let crl = manager.revoke_and_update_crl(
        Some(&empty_crl),
        &root_cert,
        &root_key,
        &user_cert,
        RevocationReason::KeyCompromise,
    )?;
    crl.verify(root_key.public_key())?;
    println!("\nUpdated CRL (number {:?})", crl.crl_number()?.map(|n| n.0));
    for entry in crl.entries()? {
        println!(
            "  revoked {} at {} ({:?})",
            entry.serial_number, entry.revocation_date, entry.reason
        );
    }
    println!(
        "  certificate {} revoked: {}",
        user_cert.serial_number(),
        crl.contains(user_cert.serial_number())
    );
    println!("\n{}", crl.to_pem()?);

    Ok(())
}
