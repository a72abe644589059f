//! HTTP request handlers for the panel API.
//!
//! - `backups` - backup creation, listing, download and deletion
//! - `common` - response envelope and error helpers
//! - `schedules` - schedule and task editing
//! - `server` - managed process status and control

pub mod backups;
pub mod common;
pub mod schedules;
pub mod server;

pub use backups::*;
pub use schedules::*;
pub use server::*;
