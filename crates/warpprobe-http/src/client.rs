//! Probe HTTP client.
//!
//! One HTTP/1 connection per call, over plain TCP or TLS, with certificate
//! checks disabled so self-signed test endpoints answer. The response body
//! is drained before the connection is dropped.

use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use http::{Request, StatusCode, Uri};
use http_body_util::{BodyExt, Empty};
use hyper::body::Incoming;
use hyper::client::conn::http1::{self, SendRequest};
use hyper_util::rt::TokioIo;
use rustls::pki_types::ServerName;
use thiserror::Error;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::TcpStream;
use tokio::time::{timeout_at, Instant};
use tokio_rustls::TlsConnector;
use tracing::debug;

/// Overall deadline for one call, body drain included.
pub const CLIENT_TIMEOUT: Duration = Duration::from_secs(30);

pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

type Sender = SendRequest<Empty<Bytes>>;

/// Why a probe call produced no response.
#[derive(Debug, Error)]
pub enum CallError {
    /// The request could not be built (bad method, URL, or header value).
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// Connecting, the TLS handshake, or the HTTP exchange failed.
    #[error("{0}")]
    Transport(#[source] BoxError),

    #[error("request timed out after {0:?}")]
    Timeout(Duration),
}

fn transport(err: impl Into<BoxError>) -> CallError {
    CallError::Transport(err.into())
}

/// Something that can carry one probe request to its target.
pub(crate) trait Transport {
    async fn call(
        &mut self,
        target: &Uri,
        request: Request<Empty<Bytes>>,
    ) -> Result<StatusCode, CallError>;
}

/// HTTP client owned by a single probe run.
pub struct ProbeClient {
    tls: TlsConnector,
    timeout: Duration,
}

impl ProbeClient {
    /// Client with the standard 30s deadline.
    pub fn new() -> Result<Self, rustls::Error> {
        Ok(Self {
            tls: TlsConnector::from(Arc::new(insecure_tls_config()?)),
            timeout: CLIENT_TIMEOUT,
        })
    }

    /// Override the per-call deadline.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Send `request` to `target` on a fresh connection and drain the
    /// response body.
    ///
    /// Any HTTP response counts as answered, whatever its status. Errors
    /// while draining the body are only logged.
    pub async fn call(
        &self,
        target: &Uri,
        request: Request<Empty<Bytes>>,
    ) -> Result<StatusCode, CallError> {
        let timeout = self.timeout;
        let deadline = Instant::now() + timeout;

        let mut sender = timeout_at(deadline, self.connect(target))
            .await
            .map_err(|_| CallError::Timeout(timeout))??;

        let response = timeout_at(deadline, sender.send_request(request))
            .await
            .map_err(|_| CallError::Timeout(timeout))?
            .map_err(transport)?;

        let status = response.status();
        let mut body = response.into_body();
        match timeout_at(deadline, drain(&mut body)).await {
            Ok(Ok(bytes)) => debug!(%target, %status, bytes, "drained probe response"),
            Ok(Err(e)) => debug!(%target, error = %e, "failed to drain probe response"),
            Err(_) => debug!(%target, "timed out draining probe response"),
        }

        Ok(status)
    }

    async fn connect(&self, target: &Uri) -> Result<Sender, CallError> {
        let host = target
            .host()
            .ok_or_else(|| CallError::InvalidRequest(format!("missing host in {target}")))?
            .trim_start_matches('[')
            .trim_end_matches(']');

        let tls = match target.scheme_str() {
            Some("http") => false,
            Some("https") => true,
            other => {
                return Err(transport(format!(
                    "unsupported protocol scheme {}",
                    other.unwrap_or("")
                )));
            }
        };
        let port = target.port_u16().unwrap_or(if tls { 443 } else { 80 });

        let stream = TcpStream::connect((host, port)).await.map_err(transport)?;

        if tls {
            let server_name = ServerName::try_from(host.to_string())
                .map_err(|e| CallError::InvalidRequest(format!("invalid server name {host}: {e}")))?;
            let stream = self
                .tls
                .connect(server_name, stream)
                .await
                .map_err(transport)?;
            handshake(stream).await
        } else {
            handshake(stream).await
        }
    }
}

impl Transport for ProbeClient {
    async fn call(
        &mut self,
        target: &Uri,
        request: Request<Empty<Bytes>>,
    ) -> Result<StatusCode, CallError> {
        ProbeClient::call(self, target, request).await
    }
}

async fn handshake<S>(stream: S) -> Result<Sender, CallError>
where
    S: AsyncRead + AsyncWrite + Unpin + Send + 'static,
{
    let (sender, conn) = http1::handshake(TokioIo::new(stream))
        .await
        .map_err(transport)?;

    // Drive the connection in the background.
    tokio::spawn(async move {
        if let Err(e) = conn.await {
            debug!(error = %e, "probe connection closed");
        }
    });

    Ok(sender)
}

async fn drain(body: &mut Incoming) -> Result<usize, hyper::Error> {
    let mut total = 0;
    while let Some(frame) = body.frame().await {
        if let Ok(data) = frame?.into_data() {
            total += data.len();
        }
    }
    Ok(total)
}

fn insecure_tls_config() -> Result<rustls::ClientConfig, rustls::Error> {
    let mut config = rustls::ClientConfig::builder_with_provider(
        rustls::crypto::ring::default_provider().into(),
    )
    .with_safe_default_protocol_versions()?
    .dangerous()
    .with_custom_certificate_verifier(Arc::new(danger::NoVerifier))
    .with_no_client_auth();
    config.alpn_protocols = vec![b"http/1.1".to_vec()];
    Ok(config)
}

// ── Certificate verifier that accepts anything ───────────────────────

mod danger {
    use rustls::client::danger::{HandshakeSignatureValid, ServerCertVerified, ServerCertVerifier};
    use rustls::pki_types::{CertificateDer, ServerName, UnixTime};
    use rustls::{DigitallySignedStruct, Error, SignatureScheme};

    #[derive(Debug)]
    pub struct NoVerifier;

    impl ServerCertVerifier for NoVerifier {
        fn verify_server_cert(
            &self,
            _end_entity: &CertificateDer<'_>,
            _intermediates: &[CertificateDer<'_>],
            _server_name: &ServerName<'_>,
            _ocsp_response: &[u8],
            _now: UnixTime,
        ) -> Result<ServerCertVerified, Error> {
            Ok(ServerCertVerified::assertion())
        }

        fn verify_tls12_signature(
            &self,
            _message: &[u8],
            _cert: &CertificateDer<'_>,
            _dss: &DigitallySignedStruct,
        ) -> Result<HandshakeSignatureValid, Error> {
            Ok(HandshakeSignatureValid::assertion())
        }

        fn verify_tls13_signature(
            &self,
            _message: &[u8],
            _cert: &CertificateDer<'_>,
            _dss: &DigitallySignedStruct,
        ) -> Result<HandshakeSignatureValid, Error> {
            Ok(HandshakeSignatureValid::assertion())
        }

        fn supported_verify_schemes(&self) -> Vec<SignatureScheme> {
            rustls::crypto::ring::default_provider()
                .signature_verification_algorithms
                .supported_schemes()
        }
    }
}
