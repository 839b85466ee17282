//! TLS certificate probe.
//!
//! The handshake runs with a verifier that accepts any certificate chain: the
//! probe reports reachability and expiry, not trust. Handshake signatures are
//! still checked so the peer has to hold the certificate's key.

use std::sync::{Arc, LazyLock};
use std::time::Instant;

use chrono::{DateTime, Utc};
use log::{debug, trace, warn};
use rustls::client::danger::{HandshakeSignatureValid, ServerCertVerified, ServerCertVerifier};
use rustls::crypto::{CryptoProvider, verify_tls12_signature, verify_tls13_signature};
use rustls::{ClientConfig, DigitallySignedStruct, SignatureScheme};
use rustls_pki_types::{CertificateDer, ServerName, UnixTime};
use tokio::net::TcpStream;
use tokio::time::timeout;
use tokio_rustls::TlsConnector;
use x509_parser::prelude::*;

use super::dns::elapsed_ms;
use crate::types::{LeafCertificate, ProbeOptions, TlsProbeResult};

static CRYPTO_PROVIDER: LazyLock<Arc<CryptoProvider>> =
    LazyLock::new(|| Arc::new(rustls::crypto::ring::default_provider()));

/// Accepts every server certificate; verifies handshake signatures only.
#[derive(Debug)]
struct AcceptAnyCertificate {
    provider: Arc<CryptoProvider>,
}

impl ServerCertVerifier for AcceptAnyCertificate {
    fn verify_server_cert(
        &self,
        _end_entity: &CertificateDer<'_>,
        _intermediates: &[CertificateDer<'_>],
        _server_name: &ServerName<'_>,
        _ocsp_response: &[u8],
        _now: UnixTime,
    ) -> Result<ServerCertVerified, rustls::Error> {
        Ok(ServerCertVerified::assertion())
    }

    fn verify_tls12_signature(
        &self,
        message: &[u8],
        cert: &CertificateDer<'_>,
        dss: &DigitallySignedStruct,
    ) -> Result<HandshakeSignatureValid, rustls::Error> {
        verify_tls12_signature(
            message,
            cert,
            dss,
            &self.provider.signature_verification_algorithms,
        )
    }

    fn verify_tls13_signature(
        &self,
        message: &[u8],
        cert: &CertificateDer<'_>,
        dss: &DigitallySignedStruct,
    ) -> Result<HandshakeSignatureValid, rustls::Error> {
        verify_tls13_signature(
            message,
            cert,
            dss,
            &self.provider.signature_verification_algorithms,
        )
    }

    fn supported_verify_schemes(&self) -> Vec<SignatureScheme> {
        self.provider
            .signature_verification_algorithms
            .supported_schemes()
    }
}

fn client_config() -> Result<ClientConfig, rustls::Error> {
    let provider = Arc::clone(&CRYPTO_PROVIDER);
    Ok(ClientConfig::builder_with_provider(Arc::clone(&provider))
        .with_safe_default_protocol_versions()?
        .dangerous()
        .with_custom_certificate_verifier(Arc::new(AcceptAnyCertificate { provider }))
        .with_no_client_auth())
}

/// Handshake with `domain:port` and read the leaf certificate's validity window.
pub(super) async fn probe(domain: &str, options: &ProbeOptions) -> TlsProbeResult {
    let start = Instant::now();
    let port = options.tls_port;
    let outcome = handshake(domain, options).await;
    let latency_ms = elapsed_ms(start);

    match outcome {
        Ok(certificate) => {
            debug!(
                "[SSL] {domain}:{port} handshake ok in {latency_ms}ms, not_after={}",
                certificate.not_after
            );
            TlsProbeResult {
                domain: domain.to_string(),
                port,
                certificate: Some(certificate),
                latency_ms,
                error: None,
            }
        }
        Err(error) => {
            warn!("[SSL] {domain}:{port} {error}");
            TlsProbeResult {
                domain: domain.to_string(),
                port,
                certificate: None,
                latency_ms,
                error: Some(error),
            }
        }
    }
}

async fn handshake(domain: &str, options: &ProbeOptions) -> Result<LeafCertificate, String> {
    trace!("[SSL] Connecting to {domain}:{}", options.tls_port);
    let stream = match timeout(
        options.connect_timeout,
        TcpStream::connect((domain, options.tls_port)),
    )
    .await
    {
        Ok(Ok(stream)) => stream,
        Ok(Err(e)) => return Err(format!("Connection failed: {e}")),
        Err(_) => return Err("Connection timed out".to_string()),
    };

    let config = client_config().map_err(|e| format!("TLS configuration failed: {e}"))?;
    let connector = TlsConnector::from(Arc::new(config));
    let server_name = ServerName::try_from(domain.to_string())
        .map_err(|_| format!("Invalid server name: {domain}"))?;

    trace!("[SSL] Performing TLS handshake...");
    let tls_stream = match timeout(options.tls_timeout, connector.connect(server_name, stream)).await
    {
        Ok(Ok(stream)) => stream,
        Ok(Err(e)) => return Err(format!("TLS handshake failed: {e}")),
        Err(_) => return Err("TLS handshake timed out".to_string()),
    };

    let (_, connection) = tls_stream.get_ref();
    let leaf = connection
        .peer_certificates()
        .and_then(|certs| certs.first())
        .ok_or_else(|| "No certificate presented".to_string())?;

    parse_leaf(leaf.as_ref(), Utc::now())
}

/// Extract subject, issuer and validity from a DER certificate.
fn parse_leaf(der: &[u8], now: DateTime<Utc>) -> Result<LeafCertificate, String> {
    let (_, cert) =
        X509Certificate::from_der(der).map_err(|e| format!("Certificate parsing failed: {e}"))?;

    let validity = cert.validity();
    let not_before = asn1_to_utc(&validity.not_before)?;
    let not_after = asn1_to_utc(&validity.not_after)?;

    Ok(LeafCertificate {
        subject: cert.subject().to_string(),
        issuer: cert.issuer().to_string(),
        not_before,
        not_after,
        is_valid: now >= not_before && now <= not_after,
    })
}

fn asn1_to_utc(time: &ASN1Time) -> Result<DateTime<Utc>, String> {
    DateTime::from_timestamp(time.timestamp(), 0)
        .ok_or_else(|| format!("Certificate time out of range: {time}"))
}
