//! `warpprobe run` — probe the target and wait for the summary.

use std::time::Duration;

use anyhow::{bail, Result};
use tracing::{info, warn};
use warpprobe_core::{ProbeCommand, ProbeConfig};
use warpprobe_http::{ProbeEngine, ProbeOptions};

use super::{ProbeArgs, TargetArgs};

pub async fn run(target: &TargetArgs, probe: &ProbeArgs) -> Result<()> {
    let config = target.load_config()?;
    let commands = merge_commands(&config, &probe.cmds);
    let options = ProbeOptions {
        retry_count: probe.retry_count.unwrap_or(config.retry_count),
        retry_wait: probe.retry_wait.unwrap_or(config.retry_wait),
        target_ports: target.target_ports(&config),
        print_state: probe.print_state,
        print_prefix: probe.print_prefix.clone(),
    };

    let engine = ProbeEngine::new(&target.inspector(), commands, options)
        .with_warmup(Duration::from_secs(probe.warmup));
    info!(
        host = %target.host,
        ports = ?engine.ports(),
        commands = engine.commands().len(),
        "starting HTTP probe"
    );

    let Some(summary) = engine.start().wait().await else {
        bail!("HTTP probe stopped before finishing");
    };

    if summary.successes == 0 {
        warn!(calls = summary.calls, "HTTP probe got no successful calls");
    }
    info!(
        total = summary.calls,
        failures = summary.failures,
        successful = summary.successes,
        "HTTP probe summary"
    );

    Ok(())
}

/// File commands followed by inline ones; `GET /` when both are empty.
fn merge_commands(config: &ProbeConfig, inline: &[ProbeCommand]) -> Vec<ProbeCommand> {
    let mut commands = config.commands.clone();
    commands.extend(inline.iter().cloned());
    if commands.is_empty() {
        commands = config.commands_or_default();
    }
    commands
}
