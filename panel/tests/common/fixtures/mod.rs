//! This module provides reusable test utilities:
//! - A scripted managed process that echoes its stdin
//! - Test configuration builders
//! - In-memory test databases
//! - Common test data

// Allow unused code in test fixtures - each test binary uses a subset
#![allow(dead_code)]
#![allow(unused_imports)]

pub mod echo_server;
pub mod test_config;
pub mod test_data;
pub mod test_database;

// Re-export commonly used items
pub use echo_server::{joined_logs, wait_for_log, wait_until_stopped, EchoServer};
pub use test_config::{TestConfig, TestConfigBuilder};
pub use test_data::*;
pub use test_database::test_database;
