//! Managed process supervision
//!
//! - `log_buffer` - bounded FIFO of output chunks
//! - `launch` - program, arguments and startup-script memory overrides
//! - `supervisor` - the single owner of the child process
//! - `registry` - process-wide supervisor slots keyed by deployment instance

pub mod launch;
pub mod log_buffer;
pub mod registry;
pub mod supervisor;

pub use launch::{LaunchSpec, MemoryFlags};
pub use log_buffer::LogBuffer;
pub use registry::SupervisorRegistry;
pub use supervisor::{ControlAction, ControlOrigin, ProcessStatus, ProcessSupervisor};
