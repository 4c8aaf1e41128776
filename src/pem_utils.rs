use pem::{EncodeConfig, LineEnding};

use crate::error::{CaError, Result};

pub const CERTIFICATE_LABEL: &str = "CERTIFICATE";
pub const CERTIFICATE_REQUEST_LABEL: &str = "CERTIFICATE REQUEST";
pub const CRL_LABEL: &str = "X509 CRL";

/// Line ending used for PEM output on this platform.
pub fn platform_line_ending() -> LineEnding {
    if cfg!(windows) {
        LineEnding::CRLF
    } else {
        LineEnding::LF
    }
}

/// Convert DER-encoded data into a PEM-encoded string with the provided label.
///
/// Base64 lines are wrapped at 64 characters and every line, the
/// `BEGIN`/`END` markers included, ends with the platform line ending.
pub fn der_to_pem(der: &[u8], label: &str) -> String {
    let pem = pem::Pem::new(label, der);
    pem::encode_config(
        &pem,
        EncodeConfig::new().set_line_ending(platform_line_ending()),
    )
}

/// Convert a PEM-encoded string to DER-encoded bytes.
///
/// The block's label must be `expected_label`.
pub fn pem_to_der(pem_str: &str, expected_label: &str) -> Result<Vec<u8>> {
    let pem = pem::parse(pem_str)?;
    if pem.tag() != expected_label {
        return Err(CaError::Decoding(format!(
            "expected PEM label {expected_label:?}, found {:?}",
            pem.tag()
        )));
    }
    Ok(pem.into_contents())
}
