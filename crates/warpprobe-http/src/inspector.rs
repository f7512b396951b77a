//! Target inspection seam.
//!
//! The probe never talks to a container runtime itself. Whatever started the
//! target service implements [`TargetInspector`] to hand over the host
//! address and the internal → host port mapping.

use std::str::FromStr;

/// Internal port the inspection agent listens on for commands.
pub const DEFAULT_COMMAND_PORT: &str = "65501/tcp";
/// Internal port the inspection agent publishes events on.
pub const DEFAULT_EVENT_PORT: &str = "65502/tcp";

/// One internal port published on the host.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PortBinding {
    /// Port key inside the target, e.g. `8080/tcp`.
    pub internal: String,
    /// Host-facing port identifier, e.g. `32768`.
    pub host: String,
}

impl PortBinding {
    pub fn new(internal: &str, host: &str) -> Self {
        Self {
            internal: internal.to_string(),
            host: host.to_string(),
        }
    }
}

/// Parses `INTERNAL=HOST`, or a bare `PORT` published on the same number.
impl FromStr for PortBinding {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let (internal, host) = match s.split_once('=') {
            Some((internal, host)) => (internal.trim(), host.trim()),
            None => (s, s.split('/').next().unwrap_or(s)),
        };
        if internal.is_empty() || host.is_empty() {
            return Err(format!("invalid port binding '{s}' (expected INTERNAL=HOST)"));
        }
        Ok(Self::new(internal, host))
    }
}

/// Supplies what the probe needs to know about the target under test.
pub trait TargetInspector {
    /// Address the host-facing ports are reachable on.
    fn host_address(&self) -> &str;
    /// All published ports, administrative ones included.
    fn port_bindings(&self) -> &[PortBinding];
    /// Internal key of the administrative command port.
    fn command_port(&self) -> &str;
    /// Internal key of the administrative event port.
    fn event_port(&self) -> &str;
    /// Ports declared as exposed by the target's build metadata, in
    /// declaration order.
    fn exposed_ports(&self) -> &[String];
}

/// Inspector backed by values known up front.
#[derive(Debug, Clone)]
pub struct StaticInspector {
    host_address: String,
    bindings: Vec<PortBinding>,
    command_port: String,
    event_port: String,
    exposed: Vec<String>,
}

impl StaticInspector {
    pub fn new(host_address: &str) -> Self {
        Self {
            host_address: host_address.to_string(),
            bindings: Vec::new(),
            command_port: DEFAULT_COMMAND_PORT.to_string(),
            event_port: DEFAULT_EVENT_PORT.to_string(),
            exposed: Vec::new(),
        }
    }

    pub fn with_bindings(mut self, bindings: impl IntoIterator<Item = PortBinding>) -> Self {
        self.bindings.extend(bindings);
        self
    }

    pub fn with_admin_ports(mut self, command_port: &str, event_port: &str) -> Self {
        self.command_port = command_port.to_string();
        self.event_port = event_port.to_string();
        self
    }

    pub fn with_exposed(mut self, exposed: impl IntoIterator<Item = String>) -> Self {
        self.exposed.extend(exposed);
        self
    }
}

impl TargetInspector for StaticInspector {
    fn host_address(&self) -> &str {
        &self.host_address
    }

    fn port_bindings(&self) -> &[PortBinding] {
        &self.bindings
    }

    fn command_port(&self) -> &str {
        &self.command_port
    }

    fn event_port(&self) -> &str {
        &self.event_port
    }

    fn exposed_ports(&self) -> &[String] {
        &self.exposed
    }
}
