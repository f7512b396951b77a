//! Port resolution.
//!
//! Decides which host ports the probe visits, and in what order.

use std::collections::HashSet;

use tracing::debug;

use crate::inspector::TargetInspector;

/// Host ports published by the target, minus the two administrative ports.
pub fn available_ports(inspector: &dyn TargetInspector) -> HashSet<String> {
    let command_port = inspector.command_port();
    let event_port = inspector.event_port();

    inspector
        .port_bindings()
        .iter()
        .filter(|b| b.internal != command_port && b.internal != event_port)
        .map(|b| b.host.clone())
        .collect()
}

/// Compute the ordered host ports to probe.
///
/// With a non-empty `target_ports` filter the result is the filter itself,
/// in caller order, restricted to available ports. Without one, exposed
/// ports come first in reverse declaration order, followed by every other
/// available port in no particular order.
pub fn resolve_ports(
    mut available: HashSet<String>,
    target_ports: &[u16],
    exposed: &[String],
) -> Vec<String> {
    debug!(?available, "HTTP probe available ports");

    let mut ports = Vec::new();

    if !target_ports.is_empty() {
        for port in target_ports {
            let port = port.to_string();
            if available.contains(&port) {
                ports.push(port);
            } else {
                debug!(%port, "HTTP probe ignoring target port");
            }
        }
        debug!(?ports, "HTTP probe filtered ports");
        return ports;
    }

    for port in exposed.iter().rev() {
        if available.remove(port) {
            ports.push(port.clone());
        } else {
            debug!(%port, "HTTP probe exposed port not published");
        }
    }

    ports.extend(available);
    ports
}

/// Resolve against everything the inspector reports.
pub fn resolve_for(inspector: &dyn TargetInspector, target_ports: &[u16]) -> Vec<String> {
    resolve_ports(
        available_ports(inspector),
        target_ports,
        inspector.exposed_ports(),
    )
}
