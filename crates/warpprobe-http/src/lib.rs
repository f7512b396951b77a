//! warpprobe-http — HTTP exercise probe for a freshly started service.
//!
//! Resolves which host ports to hit, then walks every
//! (port, command, protocol) combination in one background task,
//! retrying each with a backoff chosen by how the attempt failed.
//!
//! # Architecture
//!
//! ```text
//! ProbeEngine::new()
//!   └── resolve_ports(inspector) → ordered host ports (computed once)
//! ProbeEngine::start()  → DoneSignal
//!   └── background task
//!       ├── warm-up delay
//!       ├── for port → command → protocol
//!       │   ├── build_request()  headers, basic auth
//!       │   ├── ProbeClient::call()  30s deadline, no cert checks, one conn per call
//!       │   └── on failure: classify() → RetryPolicy::backoff() → sleep
//!       └── publish ProbeSummary on the DoneSignal
//! ```
//!
//! Everything inside the task is sequential: one request in flight at a
//! time, counters owned by the task.

pub mod client;
pub mod engine;
pub mod inspector;
pub mod ports;
pub mod report;
pub mod request;
pub mod retry;

pub use client::{CallError, ProbeClient};
pub use engine::{DoneSignal, ProbeEngine, ProbeOptions, ProbeSummary};
pub use inspector::{PortBinding, StaticInspector, TargetInspector};
pub use ports::resolve_ports;
pub use retry::{classify, FailureKind, RetryPolicy};
