pub mod args;
pub mod assemble;
pub mod shutdown;
pub mod status;

pub use args::{parse_runtime_args, RuntimeArgs};
pub use assemble::build_dispatchers;
pub use shutdown::{wait_for_stop, StopReason};
pub use status::{emit_config_summary, emit_network_status, run_status_reporter};
