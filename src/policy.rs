use bon::Builder;

/// Validity of a self-signed CA certificate when the caller does not choose one.
pub const DEFAULT_CA_VALIDITY_DAYS: u32 = 3650;

/// Validity of an end-entity certificate when the caller does not choose one.
pub const DEFAULT_END_ENTITY_VALIDITY_DAYS: u32 = 365;

pub const DEFAULT_CRL_DISTRIBUTION_URI: &str = "http://example.com/crl";

pub const DEFAULT_CRL_VALIDITY_DAYS: u32 = 30;

/// Issuance and revocation settings of a CA.
///
/// # Fields
/// * `crl_distribution_uri` - URI written into the CRL distribution point
///   extension of end-entity certificates.
/// * `include_crl_distribution_point` - Whether end-entity certificates get
///   that extension at all.
/// * `crl_validity_days` - Distance between `thisUpdate` and `nextUpdate`
///   of every CRL.
#[derive(Clone, Debug, PartialEq, Eq, Builder)]
pub struct CaPolicy {
    #[builder(into, default = DEFAULT_CRL_DISTRIBUTION_URI.to_string())]
    pub crl_distribution_uri: String,
    #[builder(default = true)]
    pub include_crl_distribution_point: bool,
    #[builder(default = DEFAULT_CRL_VALIDITY_DAYS)]
    pub crl_validity_days: u32,
}

impl Default for CaPolicy {
    fn default() -> Self {
        Self::builder().build()
    }
}
