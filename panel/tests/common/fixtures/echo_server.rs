//! Managed process stand-in: a shell script that echoes every stdin line as
//! `> <line>` and exits with code 0 on `stop`.

use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;

use panel::process::{LaunchSpec, ProcessSupervisor};

const SCRIPT: &str = r#"#!/bin/sh
echo "ready"
while IFS= read -r line; do
  if [ "$line" = "stop" ]; then
    echo "stopping"
    exit 0
  fi
  echo "> $line"
done
"#;

pub struct EchoServer {
    dir: TempDir,
}

impl EchoServer {
    pub fn new() -> Self {
        let dir = TempDir::new().expect("Failed to create server dir");
        std::fs::write(dir.path().join("server.sh"), SCRIPT).expect("Failed to write script");
        Self { dir }
    }

    pub fn root(&self) -> &std::path::Path {
        self.dir.path()
    }

    pub fn launch_spec(&self) -> LaunchSpec {
        LaunchSpec {
            program: "/bin/sh".to_string(),
            args: vec!["server.sh".to_string()],
            working_dir: self.dir.path().to_path_buf(),
            startup_scripts: Vec::new(),
        }
    }

    pub fn supervisor(&self) -> Arc<ProcessSupervisor> {
        Arc::new(ProcessSupervisor::new(self.launch_spec(), 100))
    }
}

impl Default for EchoServer {
    fn default() -> Self {
        Self::new()
    }
}

/// Output chunks are not line aligned; search the concatenation
pub fn joined_logs(supervisor: &ProcessSupervisor) -> String {
    supervisor.status().logs.concat()
}

pub async fn wait_for_log(supervisor: &ProcessSupervisor, needle: &str) -> bool {
    for _ in 0..100 {
        if joined_logs(supervisor).contains(needle) {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
    false
}

pub async fn wait_until_stopped(supervisor: &ProcessSupervisor) -> bool {
    for _ in 0..100 {
        if !supervisor.is_running() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
    false
}
