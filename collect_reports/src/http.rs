use crate::error::JobError;
use rustls::cipher_suite::{
    TLS13_AES_128_GCM_SHA256, TLS13_AES_256_GCM_SHA384, TLS13_CHACHA20_POLY1305_SHA256,
    TLS_ECDHE_RSA_WITH_AES_256_GCM_SHA384,
};
use rustls::version::{TLS12, TLS13};
use rustls::{ClientConfig, OwnedTrustAnchor, RootCertStore, SupportedCipherSuite};
use std::time::Duration;

// The upstream only negotiates this TLS 1.2 suite; TLS 1.3 suites are left unrestricted.
fn cipher_suites() -> [SupportedCipherSuite; 4] {
    [
        TLS13_AES_256_GCM_SHA384,
        TLS13_AES_128_GCM_SHA256,
        TLS13_CHACHA20_POLY1305_SHA256,
        TLS_ECDHE_RSA_WITH_AES_256_GCM_SHA384,
    ]
}

const CONNECT_TIMEOUT: Duration = Duration::from_secs(30);

fn tls_config() -> Result<ClientConfig, JobError> {
    let mut roots = RootCertStore::empty();
    roots.add_trust_anchors(webpki_roots::TLS_SERVER_ROOTS.iter().map(|ta| {
        OwnedTrustAnchor::from_subject_spki_name_constraints(
            ta.subject,
            ta.spki,
            ta.name_constraints,
        )
    }));
    let config = ClientConfig::builder()
        .with_cipher_suites(&cipher_suites())
        .with_safe_default_kx_groups()
        .with_protocol_versions(&[&TLS12, &TLS13])
        .map_err(|e| JobError::Client(e.to_string()))?
        .with_root_certificates(roots)
        .with_no_client_auth();
    Ok(config)
}

/// Builds the single HTTP client shared by every upstream call of one job.
pub fn build_http_client() -> Result<reqwest::Client, JobError> {
    reqwest::Client::builder()
        .use_preconfigured_tls(tls_config()?)
        .connect_timeout(CONNECT_TIMEOUT)
        .build()
        .map_err(|e| JobError::Client(e.to_string()))
}

#[test]
fn test_client_accepts_restricted_tls() {
    assert!(tls_config().is_ok());
    assert!(build_http_client().is_ok());
}
