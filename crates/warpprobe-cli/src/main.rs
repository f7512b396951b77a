use clap::{Parser, Subcommand};

mod commands;

use commands::{ProbeArgs, TargetArgs};

#[derive(Parser)]
#[command(
    name = "warpprobe",
    about = "warpprobe — exercise a freshly started service over HTTP",
    version,
    propagate_version = true,
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Probe every resolved port with every command and report the results.
    ///
    /// Commands come from --cmd-file and --cmd; with neither, a single
    /// GET / is tried over http and then https.
    Run {
        #[command(flatten)]
        target: TargetArgs,
        #[command(flatten)]
        probe: ProbeArgs,
    },
    /// Print the ports a run would probe, in order, without probing.
    Ports {
        #[command(flatten)]
        target: TargetArgs,
        /// Output format: text or json
        #[arg(long, default_value = "text")]
        format: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("warpprobe=info".parse()?)
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Run { target, probe } => commands::run::run(&target, &probe).await,
        Commands::Ports { target, format } => commands::ports::ports(&target, &format),
    }
}
