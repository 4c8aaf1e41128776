mod util;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use casmith::csr::CertificationRequest;
use regex::Regex;

const EOL: &str = if cfg!(windows) { "\r\n" } else { "\n" };

fn assert_pem_layout(pem: &str, label: &str) -> Vec<u8> {
    let lines: Vec<&str> = pem.split_terminator(EOL).collect();
    assert_eq!(lines.first().copied(), Some(format!("-----BEGIN {label}-----").as_str()));
    assert_eq!(lines.last().copied(), Some(format!("-----END {label}-----").as_str()));
    assert!(pem.ends_with(EOL), "last line must be terminated");

    let body_line = Regex::new(r"^[A-Za-z0-9+/]{1,64}={0,2}$").unwrap();
    let body = &lines[1..lines.len() - 1];
    for (i, line) in body.iter().enumerate() {
        assert!(body_line.is_match(line), "bad base64 line {line:?}");
        if i + 1 < body.len() {
            assert_eq!(line.len(), 64, "only the last line may be short");
        }
    }
    STANDARD.decode(body.concat()).unwrap()
}

#[test]
fn csr_pem_is_wrapped_at_64() {
    let mut manager = util::manager(200);
    let key = manager.generate_key_pair().unwrap();
    let pem = manager
        .generate_csr(&key, "CN=user@example.com,O=Org,C=SA")
        .unwrap();

    let der = assert_pem_layout(&pem, "CERTIFICATE REQUEST");
    let csr = CertificationRequest::from_der(&der).unwrap();
    assert!(csr.verify());
}

#[test]
fn certificate_and_crl_pem_layout() {
    let mut manager = util::manager(201);
    let ca = util::generate_ca_cert(&mut manager);
    let crl = manager.generate_empty_crl(&ca.cert, &ca.key).unwrap();

    let der = assert_pem_layout(&ca.cert.to_pem().unwrap(), "CERTIFICATE");
    assert_eq!(der, ca.cert.to_der().unwrap());

    let der = assert_pem_layout(&crl.to_pem().unwrap(), "X509 CRL");
    assert_eq!(der, crl.to_der().unwrap());
}
