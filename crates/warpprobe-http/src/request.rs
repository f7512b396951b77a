//! Request construction for a single probe attempt.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use bytes::Bytes;
use http::header::{AUTHORIZATION, HOST, USER_AGENT};
use http::{HeaderMap, HeaderName, HeaderValue, Method, Request, Uri};
use http_body_util::Empty;
use tracing::debug;

use warpprobe_core::ProbeCommand;

use crate::client::CallError;

const PROBE_USER_AGENT: &str = concat!("warpprobe/", env!("CARGO_PKG_VERSION"));

/// A ready-to-send probe request plus the target it was built for.
#[derive(Debug)]
pub struct ProbeRequest {
    /// Full target URL, as reported in status lines.
    pub url: String,
    /// Parsed target; scheme and authority pick the connection.
    pub target: Uri,
    /// Origin-form request handed to the connection.
    pub request: Request<Empty<Bytes>>,
}

/// `{protocol}://{host}:{port}{resource}`, bracketing bare IPv6 hosts.
pub fn target_url(protocol: &str, host: &str, port: &str, resource: &str) -> String {
    if host.contains(':') && !host.starts_with('[') {
        format!("{protocol}://[{host}]:{port}{resource}")
    } else {
        format!("{protocol}://{host}:{port}{resource}")
    }
}

/// Split a raw `Name: Value` line on its first colon.
///
/// Returns `None` for lines without a colon.
pub fn parse_header_line(line: &str) -> Option<(&str, &str)> {
    let (name, value) = line.split_once(':')?;
    Some((name.trim(), value.trim()))
}

fn command_headers(cmd: &ProbeCommand) -> HeaderMap {
    let mut headers = HeaderMap::new();
    for line in &cmd.headers {
        let Some((name, value)) = parse_header_line(line) else {
            debug!(header = %line, "ignoring malformed header");
            continue;
        };
        match (
            HeaderName::from_bytes(name.as_bytes()),
            HeaderValue::from_str(value),
        ) {
            (Ok(name), Ok(value)) => {
                headers.append(name, value);
            }
            _ => debug!(header = %line, "ignoring invalid header"),
        }
    }
    headers
}

fn basic_auth(username: &str, password: &str) -> Result<HeaderValue, CallError> {
    let encoded = STANDARD.encode(format!("{username}:{password}"));
    HeaderValue::from_str(&format!("Basic {encoded}"))
        .map_err(|e| CallError::InvalidRequest(format!("invalid credentials: {e}")))
}

/// Build the request for one attempt of `cmd` against `host:port`.
pub fn build_request(
    cmd: &ProbeCommand,
    protocol: &str,
    host: &str,
    port: &str,
) -> Result<ProbeRequest, CallError> {
    let url = target_url(protocol, host, port, &cmd.resource);

    let target: Uri = url
        .parse()
        .map_err(|e| CallError::InvalidRequest(format!("invalid target {url}: {e}")))?;
    let authority = target
        .authority()
        .ok_or_else(|| CallError::InvalidRequest(format!("missing host in {url}")))?
        .clone();
    let method = if cmd.method.is_empty() {
        Method::GET
    } else {
        Method::from_bytes(cmd.method.as_bytes())
            .map_err(|e| CallError::InvalidRequest(format!("invalid method {}: {e}", cmd.method)))?
    };
    let path = target
        .path_and_query()
        .map(|p| p.as_str())
        .unwrap_or("/")
        .to_string();

    let mut headers = command_headers(cmd);
    if cmd.has_credentials() {
        headers.insert(AUTHORIZATION, basic_auth(&cmd.username, &cmd.password)?);
    }
    if !headers.contains_key(HOST) {
        let value = HeaderValue::from_str(authority.as_str())
            .map_err(|e| CallError::InvalidRequest(format!("invalid host {authority}: {e}")))?;
        headers.insert(HOST, value);
    }
    if !headers.contains_key(USER_AGENT) {
        headers.insert(USER_AGENT, HeaderValue::from_static(PROBE_USER_AGENT));
    }

    let mut request = Request::builder()
        .method(method)
        .uri(path)
        .body(Empty::<Bytes>::new())
        .map_err(|e| CallError::InvalidRequest(e.to_string()))?;
    *request.headers_mut() = headers;

    Ok(ProbeRequest {
        url,
        target,
        request,
    })
}
