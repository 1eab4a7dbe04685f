//! Host inspection: shell commands, snapshots and live probes

pub mod collector;
pub mod platform;
pub mod probes;
pub mod sockets;

pub use collector::{SystemDataCollector, SystemSnapshot};
pub use platform::{platform_name, run_command, run_program, CommandOutput};
