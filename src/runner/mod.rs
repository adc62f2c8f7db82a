//! ns-3 discovery and simulation execution.

mod detect;
mod exec;

pub use detect::{detect_ns3, validate_install, Launcher, Ns3Install};
pub use exec::{Ns3Runner, RunError, RunMode, RunOutcome};
