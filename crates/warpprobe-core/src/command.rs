//! HTTP probe command model.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, ConfigResult};

/// Plaintext HTTP scheme.
pub const PLAIN_PROTOCOL: &str = "http";
/// TLS-wrapped HTTP scheme.
pub const TLS_PROTOCOL: &str = "https";

const DEFAULT_METHOD: &str = "GET";
const DEFAULT_RESOURCE: &str = "/";

/// A configured HTTP request template issued against every resolved port.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProbeCommand {
    /// HTTP method (`GET` when left empty).
    #[serde(default)]
    pub method: String,
    /// Request path, including any query string.
    #[serde(default)]
    pub resource: String,
    /// `http`, `https`, or empty to try both.
    #[serde(default)]
    pub protocol: String,
    /// Raw `Name: Value` header lines.
    #[serde(default)]
    pub headers: Vec<String>,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

impl Default for ProbeCommand {
    fn default() -> Self {
        Self {
            method: DEFAULT_METHOD.to_string(),
            resource: DEFAULT_RESOURCE.to_string(),
            protocol: String::new(),
            headers: Vec::new(),
            username: String::new(),
            password: String::new(),
        }
    }
}

impl ProbeCommand {
    /// Create a command for `method` on `resource`, trying both protocols.
    pub fn new(method: &str, resource: &str) -> Self {
        Self {
            method: method.to_string(),
            resource: resource.to_string(),
            ..Self::default()
        }
    }

    /// Restrict the command to a single protocol.
    pub fn with_protocol(mut self, protocol: &str) -> Self {
        self.protocol = protocol.to_string();
        self
    }

    /// Append a raw header line.
    pub fn with_header(mut self, line: &str) -> Self {
        self.headers.push(line.to_string());
        self
    }

    /// Attach basic-auth credentials.
    pub fn with_basic_auth(mut self, username: &str, password: &str) -> Self {
        self.username = username.to_string();
        self.password = password.to_string();
        self
    }

    /// Fill in defaults and validate the protocol.
    ///
    /// Empty method becomes `GET`, empty resource becomes `/`, and a resource
    /// without a leading slash gets one.
    pub fn normalize(mut self) -> ConfigResult<Self> {
        self.method = self.method.trim().to_ascii_uppercase();
        if self.method.is_empty() {
            self.method = DEFAULT_METHOD.to_string();
        }

        self.resource = self.resource.trim().to_string();
        if self.resource.is_empty() {
            self.resource = DEFAULT_RESOURCE.to_string();
        } else if !self.resource.starts_with('/') {
            self.resource.insert(0, '/');
        }

        self.protocol = self.protocol.trim().to_ascii_lowercase();
        match self.protocol.as_str() {
            "" | PLAIN_PROTOCOL | TLS_PROTOCOL => {}
            other => return Err(ConfigError::UnsupportedProtocol(other.to_string())),
        }

        Ok(self)
    }

    /// Protocols to attempt, in order.
    ///
    /// An unset protocol expands to plaintext first, then TLS.
    pub fn protocols(&self) -> Vec<&str> {
        if self.protocol.is_empty() {
            vec![PLAIN_PROTOCOL, TLS_PROTOCOL]
        } else {
            vec![self.protocol.as_str()]
        }
    }

    /// Whether basic auth should be applied.
    pub fn has_credentials(&self) -> bool {
        !self.username.is_empty() || !self.password.is_empty()
    }
}

fn is_protocol(token: &str) -> bool {
    token.eq_ignore_ascii_case(PLAIN_PROTOCOL) || token.eq_ignore_ascii_case(TLS_PROTOCOL)
}

/// Parse the inline `[PROTO:][METHOD:]PATH` form.
///
/// ```
/// use warpprobe_core::ProbeCommand;
///
/// let cmd: ProbeCommand = "https:POST:/api".parse().unwrap();
/// assert_eq!(cmd.protocol, "https");
/// assert_eq!(cmd.method, "POST");
/// assert_eq!(cmd.resource, "/api");
/// ```
impl FromStr for ProbeCommand {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            return Err(ConfigError::EmptyCommand);
        }

        let mut cmd = ProbeCommand::default();
        let mut rest = s;

        if !rest.starts_with('/') {
            if let Some((head, tail)) = rest.split_once(':') {
                if is_protocol(head) {
                    cmd.protocol = head.to_string();
                    rest = tail;
                }
            }
        }

        if !rest.starts_with('/') {
            match rest.split_once(':') {
                Some((method, path)) => {
                    cmd.method = method.to_string();
                    rest = path;
                }
                None if !cmd.protocol.is_empty() => {
                    // `https:health` style: the remainder is the path.
                }
                None => {
                    cmd.method = rest.to_string();
                    rest = "";
                }
            }
        }

        cmd.resource = rest.to_string();
        cmd.normalize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_command_is_get_root_on_both_protocols() {
        let cmd = ProbeCommand::default();
        assert_eq!(cmd.method, "GET");
        assert_eq!(cmd.resource, "/");
        assert_eq!(cmd.protocols(), vec!["http", "https"]);
        assert!(!cmd.has_credentials());
    }

    #[test]
    fn explicit_protocol_yields_single_attempt() {
        let cmd = ProbeCommand::new("GET", "/").with_protocol("https");
        assert_eq!(cmd.protocols(), vec!["https"]);
    }

    #[test]
    fn normalize_fills_defaults() {
        let cmd = ProbeCommand {
            method: " post ".to_string(),
            resource: "health".to_string(),
            protocol: "HTTP".to_string(),
            ..ProbeCommand::default()
        }
        .normalize()
        .unwrap();

        assert_eq!(cmd.method, "POST");
        assert_eq!(cmd.resource, "/health");
        assert_eq!(cmd.protocol, "http");
    }

    #[test]
    fn normalize_rejects_unknown_protocol() {
        let err = ProbeCommand::new("GET", "/")
            .with_protocol("ftp")
            .normalize()
            .unwrap_err();
        assert!(matches!(err, ConfigError::UnsupportedProtocol(p) if p == "ftp"));
    }

    #[test]
    fn credentials_apply_with_either_field() {
        assert!(ProbeCommand::default().with_basic_auth("user", "").has_credentials());
        assert!(ProbeCommand::default().with_basic_auth("", "secret").has_credentials());
    }

    #[test]
    fn parse_path_only() {
        let cmd: ProbeCommand = "/health".parse().unwrap();
        assert_eq!(cmd.method, "GET");
        assert_eq!(cmd.resource, "/health");
        assert!(cmd.protocol.is_empty());
    }

    #[test]
    fn parse_method_and_path() {
        let cmd: ProbeCommand = "post:/submit".parse().unwrap();
        assert_eq!(cmd.method, "POST");
        assert_eq!(cmd.resource, "/submit");
        assert!(cmd.protocol.is_empty());
    }

    #[test]
    fn parse_protocol_method_and_path() {
        let cmd: ProbeCommand = "https:PUT:/items/1".parse().unwrap();
        assert_eq!(cmd.protocol, "https");
        assert_eq!(cmd.method, "PUT");
        assert_eq!(cmd.resource, "/items/1");
    }

    #[test]
    fn parse_protocol_and_path() {
        let cmd: ProbeCommand = "http:/status".parse().unwrap();
        assert_eq!(cmd.protocol, "http");
        assert_eq!(cmd.method, "GET");
        assert_eq!(cmd.resource, "/status");
    }

    #[test]
    fn parse_keeps_colons_in_path() {
        let cmd: ProbeCommand = "GET:/a:b".parse().unwrap();
        assert_eq!(cmd.resource, "/a:b");
    }

    #[test]
    fn parse_method_only() {
        let cmd: ProbeCommand = "HEAD".parse().unwrap();
        assert_eq!(cmd.method, "HEAD");
        assert_eq!(cmd.resource, "/");
    }

    #[test]
    fn parse_empty_is_error() {
        assert!(matches!(
            "  ".parse::<ProbeCommand>(),
            Err(ConfigError::EmptyCommand)
        ));
    }
}
