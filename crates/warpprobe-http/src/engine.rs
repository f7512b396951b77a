//! Probe engine — resolves ports up front, then runs every combination in
//! one background task.

use std::time::Duration;

use chrono::Utc;
use http::StatusCode;
use tokio::sync::watch;
use tracing::{debug, error, info};

use warpprobe_core::ProbeCommand;

use crate::client::{ProbeClient, Transport, CLIENT_TIMEOUT};
use crate::inspector::TargetInspector;
use crate::ports;
use crate::report::{CallReport, StatusPrinter};
use crate::request::{build_request, target_url};
use crate::retry::{classify, FailureKind, RetryPolicy};

/// Delay before the first attempt; the target rarely accepts connections
/// the moment it starts.
pub const DEFAULT_WARMUP: Duration = Duration::from_secs(9);

/// Settings supplied alongside the commands.
#[derive(Debug, Clone, Default)]
pub struct ProbeOptions {
    /// Attempts per combination; zero or negative means the default of 5.
    pub retry_count: i32,
    /// Backoff unit in seconds; zero means the built-in waits.
    pub retry_wait: u64,
    /// Explicit host ports to probe, in order.
    pub target_ports: Vec<u16>,
    /// Print `key=value` status lines to stdout.
    pub print_state: bool,
    pub print_prefix: String,
}

/// Call counters for a finished run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProbeSummary {
    pub calls: u64,
    pub failures: u64,
    pub successes: u64,
}

/// How one (port, command, protocol) combination ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CombinationOutcome {
    /// A response arrived; no further attempts were made.
    Succeeded { attempts: u32, status: StatusCode },
    /// Every attempt failed.
    GaveUp { attempts: u32, last_failure: FailureKind },
}

/// One-shot completion signal for a probe run.
///
/// Set exactly once, when the background task has processed every
/// combination. Clones observe the same signal.
#[derive(Debug, Clone)]
pub struct DoneSignal {
    rx: watch::Receiver<Option<ProbeSummary>>,
}

impl DoneSignal {
    /// Whether the run has finished.
    pub fn is_done(&self) -> bool {
        self.rx.borrow().is_some()
    }

    /// Final counters, once the run has finished.
    pub fn summary(&self) -> Option<ProbeSummary> {
        *self.rx.borrow()
    }

    /// Wait for the run to finish.
    ///
    /// Returns `None` only if the background task was torn down before it
    /// finished, e.g. by runtime shutdown.
    pub async fn wait(&mut self) -> Option<ProbeSummary> {
        self.rx
            .wait_for(Option::is_some)
            .await
            .ok()
            .and_then(|summary| *summary)
    }
}

/// HTTP probe for one target instance.
///
/// Construct once, [`start`](Self::start) once, then wait on the returned
/// [`DoneSignal`].
#[derive(Debug)]
pub struct ProbeEngine {
    host_address: String,
    ports: Vec<String>,
    commands: Vec<ProbeCommand>,
    retry: RetryPolicy,
    warmup: Duration,
    client_timeout: Duration,
    printer: StatusPrinter,
}

impl ProbeEngine {
    /// Resolve the ports to probe and capture the run settings.
    pub fn new(
        inspector: &dyn TargetInspector,
        commands: Vec<ProbeCommand>,
        options: ProbeOptions,
    ) -> Self {
        let ports = ports::resolve_for(inspector, &options.target_ports);
        debug!(?ports, "HTTP probe resolved ports");

        Self {
            host_address: inspector.host_address().to_string(),
            ports,
            commands,
            retry: RetryPolicy::from_config(options.retry_count, options.retry_wait),
            warmup: DEFAULT_WARMUP,
            client_timeout: CLIENT_TIMEOUT,
            printer: StatusPrinter::new(options.print_state, &options.print_prefix),
        }
    }

    /// Override the warm-up delay.
    pub fn with_warmup(mut self, warmup: Duration) -> Self {
        self.warmup = warmup;
        self
    }

    /// Override the attempt budget and backoff table.
    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Override the per-call deadline.
    pub fn with_client_timeout(mut self, timeout: Duration) -> Self {
        self.client_timeout = timeout;
        self
    }

    /// Ports the run will visit, in order.
    pub fn ports(&self) -> &[String] {
        &self.ports
    }

    pub fn commands(&self) -> &[ProbeCommand] {
        &self.commands
    }

    pub fn retry_policy(&self) -> &RetryPolicy {
        &self.retry
    }

    /// Spawn the run on the current tokio runtime and return immediately.
    pub fn start(self) -> DoneSignal {
        let (tx, rx) = watch::channel(None);

        tokio::spawn(async move {
            let summary = self.run().await;
            tx.send_replace(Some(summary));
        });

        DoneSignal { rx }
    }

    async fn run(self) -> ProbeSummary {
        tokio::time::sleep(self.warmup).await;
        self.printer.starting();

        let client = match ProbeClient::new() {
            Ok(client) => client.with_timeout(self.client_timeout),
            Err(e) => {
                error!(error = %e, "HTTP probe could not build its TLS client");
                let summary = ProbeSummary::default();
                self.printer.done(&summary);
                return summary;
            }
        };

        info!("HTTP probe started...");

        let mut run = ProbeRun {
            client,
            retry: &self.retry,
            printer: &self.printer,
            host_address: &self.host_address,
            counters: ProbeSummary::default(),
        };

        for port in &self.ports {
            for cmd in &self.commands {
                for protocol in cmd.protocols() {
                    run.probe(port, cmd, protocol).await;
                }
            }
        }

        let summary = run.counters;
        info!(
            calls = summary.calls,
            failures = summary.failures,
            successes = summary.successes,
            "HTTP probe done."
        );
        self.printer.done(&summary);
        summary
    }
}

/// State owned by the background task for the length of one run.
struct ProbeRun<'a, T> {
    client: T,
    retry: &'a RetryPolicy,
    printer: &'a StatusPrinter,
    host_address: &'a str,
    counters: ProbeSummary,
}

impl<T: Transport> ProbeRun<'_, T> {
    /// Attempt one combination until it answers or the budget runs out.
    async fn probe(&mut self, port: &str, cmd: &ProbeCommand, protocol: &str) -> CombinationOutcome {
        let max_attempts = self.retry.max_attempts();
        let mut last_failure = FailureKind::Other;

        for attempt in 1..=max_attempts {
            let (url, result) = match build_request(cmd, protocol, self.host_address, port) {
                Ok(req) => {
                    let result = self.client.call(&req.target, req.request).await;
                    (req.url, result)
                }
                Err(e) => (
                    target_url(protocol, self.host_address, port, &cmd.resource),
                    Err(e),
                ),
            };
            self.counters.calls += 1;

            self.printer.call(&CallReport {
                status: result.as_ref().map(StatusCode::as_u16).unwrap_or(0),
                method: &cmd.method,
                target: &url,
                attempt,
                error: result.as_ref().err().map(ToString::to_string),
                time: Utc::now(),
            });

            let err = match result {
                Ok(status) => {
                    self.counters.successes += 1;
                    debug!(%url, %status, attempt, "HTTP probe call answered");
                    return CombinationOutcome::Succeeded { attempts: attempt, status };
                }
                Err(err) => err,
            };

            self.counters.failures += 1;
            last_failure = classify(&err);

            if attempt == max_attempts {
                debug!(%url, attempt, error = %err, "HTTP probe giving up");
                break;
            }

            let wait = self.retry.backoff(last_failure);
            match last_failure {
                FailureKind::NotReady => {
                    debug!(%url, ?wait, "HTTP probe - target not ready yet (retry again later)...")
                }
                FailureKind::TransportError => {
                    debug!(%url, ?wait, error = %err, "HTTP probe - web error... retry again later...")
                }
                FailureKind::Other => {
                    debug!(%url, ?wait, error = %err, "HTTP probe - other error... retry again later...")
                }
            }
            tokio::time::sleep(wait).await;
        }

        CombinationOutcome::GaveUp {
            attempts: max_attempts,
            last_failure,
        }
    }
}
