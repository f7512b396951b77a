pub mod ports;
pub mod run;

use std::path::PathBuf;

use anyhow::Context;
use clap::Args;
use warpprobe_core::{ProbeCommand, ProbeConfig};
use warpprobe_http::inspector::{DEFAULT_COMMAND_PORT, DEFAULT_EVENT_PORT};
use warpprobe_http::{PortBinding, StaticInspector};

/// Where the target lives and which of its ports to consider.
#[derive(Args, Debug)]
pub struct TargetArgs {
    /// Address the published ports are reachable on
    #[arg(long, default_value = "127.0.0.1")]
    pub host: String,
    /// Published port as INTERNAL=HOST, e.g. 8080/tcp=32768 (repeatable)
    #[arg(short, long = "publish", value_name = "INTERNAL=HOST")]
    pub publish: Vec<PortBinding>,
    /// Port declared as exposed by the image, in declaration order (repeatable)
    #[arg(long = "expose", value_name = "PORT")]
    pub expose: Vec<String>,
    /// Probe only these host ports, in this order (repeatable)
    #[arg(long = "target-port", value_name = "PORT")]
    pub target_ports: Vec<u16>,
    /// Internal key of the inspection agent's command port
    #[arg(long, default_value = DEFAULT_COMMAND_PORT)]
    pub command_port: String,
    /// Internal key of the inspection agent's event port
    #[arg(long, default_value = DEFAULT_EVENT_PORT)]
    pub event_port: String,
    /// Probe command file (TOML, or JSON with a .json extension)
    #[arg(short = 'f', long, value_name = "FILE")]
    pub cmd_file: Option<PathBuf>,
}

/// How the probe behaves once it has its ports.
#[derive(Args, Debug)]
pub struct ProbeArgs {
    /// Inline probe command, [PROTO:][METHOD:]PATH (repeatable)
    #[arg(long = "cmd", value_name = "COMMAND")]
    pub cmds: Vec<ProbeCommand>,
    /// Attempts per port/command/protocol (overrides the command file)
    #[arg(long)]
    pub retry_count: Option<i32>,
    /// Backoff unit in seconds (overrides the command file)
    #[arg(long)]
    pub retry_wait: Option<u64>,
    /// Seconds to wait before the first attempt
    #[arg(long, default_value_t = 9)]
    pub warmup: u64,
    /// Print key=value status lines to stdout
    #[arg(long)]
    pub print_state: bool,
    /// Prefix for every status line
    #[arg(long, default_value = "")]
    pub print_prefix: String,
}

impl TargetArgs {
    pub fn inspector(&self) -> StaticInspector {
        StaticInspector::new(&self.host)
            .with_admin_ports(&self.command_port, &self.event_port)
            .with_bindings(self.publish.iter().cloned())
            .with_exposed(self.expose.iter().cloned())
    }

    /// The command file, or an empty config when none was given.
    pub fn load_config(&self) -> anyhow::Result<ProbeConfig> {
        match &self.cmd_file {
            Some(path) => ProbeConfig::from_file(path)
                .with_context(|| format!("loading probe commands from {}", path.display())),
            None => Ok(ProbeConfig::default()),
        }
    }

    /// Target ports from the command line, falling back to the file.
    pub fn target_ports(&self, config: &ProbeConfig) -> Vec<u16> {
        if self.target_ports.is_empty() {
            config.target_ports.clone()
        } else {
            self.target_ports.clone()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use warpprobe_http::ports::resolve_for;

    #[derive(Parser)]
    struct TestCli {
        #[command(flatten)]
        target: TargetArgs,
    }

    fn parse(args: &[&str]) -> TargetArgs {
        TestCli::try_parse_from(std::iter::once("warpprobe").chain(args.iter().copied()))
            .unwrap()
            .target
    }

    #[test]
    fn publish_and_expose_flags_build_inspector() {
        let target = parse(&[
            "--publish", "8080/tcp=8080",
            "--publish", "9090/tcp=9090",
            "--publish", "65501/tcp=40001",
            "--expose", "9090",
            "--expose", "8080",
        ]);
        let resolved = resolve_for(&target.inspector(), &target.target_ports(&ProbeConfig::default()));
        assert_eq!(resolved, vec!["8080".to_string(), "9090".to_string()]);
    }

    #[test]
    fn cli_target_ports_override_file() {
        let target = parse(&["--target-port", "9090"]);
        let config = ProbeConfig {
            target_ports: vec![8080],
            ..ProbeConfig::default()
        };
        assert_eq!(target.target_ports(&config), vec![9090]);

        let target = parse(&[]);
        assert_eq!(target.target_ports(&config), vec![8080]);
    }

    #[test]
    fn bad_publish_flag_is_rejected() {
        let args = ["warpprobe", "--publish", "8080/tcp="];
        assert!(TestCli::try_parse_from(args).is_err());
    }

    #[test]
    fn missing_cmd_file_is_error() {
        let target = parse(&["--cmd-file", "/nonexistent/probes.toml"]);
        assert!(target.load_config().is_err());
    }
}
