//! Launch command resolution for the managed process.
//!
//! The compiled-in (or configured) arguments can be overridden by memory-size
//! flags found in a startup script inside the working directory, e.g. a
//! `start.bat` containing `java -Xms2G -Xmx8G -jar server.jar`.

use regex::Regex;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;
use tracing::{debug, info, warn};

use crate::config::ServerConfig;

static MAX_HEAP: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"-Xmx(\d+[GMK])").expect("valid -Xmx pattern"));
static INITIAL_HEAP: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"-Xms(\d+[GMK])").expect("valid -Xms pattern"));

/// Program, base arguments and working directory of the managed process
#[derive(Debug, Clone, PartialEq)]
pub struct LaunchSpec {
    pub program: String,
    pub args: Vec<String>,
    pub working_dir: PathBuf,
    /// Candidate startup scripts, checked in order
    pub startup_scripts: Vec<String>,
}

impl From<&ServerConfig> for LaunchSpec {
    fn from(server: &ServerConfig) -> Self {
        Self {
            program: server.program.clone(),
            args: server.args.clone(),
            working_dir: server.root.clone(),
            startup_scripts: server.startup_scripts.clone(),
        }
    }
}

impl LaunchSpec {
    /// Base arguments with any startup-script memory overrides applied
    pub async fn resolve_args(&self) -> Vec<String> {
        match read_memory_flags(&self.working_dir, &self.startup_scripts).await {
            Some(flags) => {
                info!(
                    "Loaded memory settings from startup script: max={:?} initial={:?}",
                    flags.max, flags.initial
                );
                flags.apply(&self.args)
            }
            None => self.args.clone(),
        }
    }
}

/// Heap sizes such as `4G` or `512M`
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MemoryFlags {
    pub max: Option<String>,
    pub initial: Option<String>,
}

impl MemoryFlags {
    pub fn parse(content: &str) -> Self {
        let capture = |re: &Regex| {
            re.captures(content)
                .and_then(|c| c.get(1))
                .map(|m| m.as_str().to_string())
        };

        Self {
            max: capture(&MAX_HEAP),
            initial: capture(&INITIAL_HEAP),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.max.is_none() && self.initial.is_none()
    }

    /// Replace the argument carrying the same flag, or prepend it when absent
    pub fn apply(&self, args: &[String]) -> Vec<String> {
        let mut resolved = args.to_vec();
        if let Some(max) = &self.max {
            set_flag(&mut resolved, "-Xmx", max);
        }
        if let Some(initial) = &self.initial {
            set_flag(&mut resolved, "-Xms", initial);
        }
        resolved
    }
}

fn set_flag(args: &mut Vec<String>, prefix: &str, value: &str) {
    let flag = format!("{}{}", prefix, value);
    match args.iter().position(|a| a.starts_with(prefix)) {
        Some(idx) => args[idx] = flag,
        None => args.insert(0, flag),
    }
}

/// Memory flags from the first existing startup script. `None` when no script
/// exists, it cannot be read, or it carries no flags.
pub async fn read_memory_flags(working_dir: &Path, scripts: &[String]) -> Option<MemoryFlags> {
    for script in scripts {
        let path = working_dir.join(script);
        match tokio::fs::read_to_string(&path).await {
            Ok(content) => {
                let flags = MemoryFlags::parse(&content);
                if flags.is_empty() {
                    debug!("No memory flags in {}", path.display());
                    return None;
                }
                return Some(flags);
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => continue,
            Err(e) => {
                warn!(
                    "Failed to read {} for memory settings, using defaults: {}",
                    path.display(),
                    e
                );
                return None;
            }
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_parse_flags_from_script() {
        let flags =
            MemoryFlags::parse("@echo off\r\njava -Xms2G -Xmx8G -jar server.jar nogui\r\npause");
        assert_eq!(flags.max.as_deref(), Some("8G"));
        assert_eq!(flags.initial.as_deref(), Some("2G"));
    }

    #[test]
    fn test_parse_ignores_malformed_sizes() {
        let flags = MemoryFlags::parse("java -Xmx -XmsLOTS -jar server.jar");
        assert!(flags.is_empty());
    }

    #[test]
    fn test_apply_replaces_existing_flags() {
        let flags = MemoryFlags {
            max: Some("12G".to_string()),
            initial: Some("6G".to_string()),
        };
        let resolved = flags.apply(&args(&["-Xms4G", "-Xmx4G", "-jar", "server.jar", "--nogui"]));
        assert_eq!(
            resolved,
            args(&["-Xms6G", "-Xmx12G", "-jar", "server.jar", "--nogui"])
        );
    }

    #[test]
    fn test_apply_prepends_missing_flags() {
        let flags = MemoryFlags {
            max: Some("1024M".to_string()),
            initial: Some("512M".to_string()),
        };
        let resolved = flags.apply(&args(&["-jar", "server.jar"]));
        assert_eq!(resolved, args(&["-Xms512M", "-Xmx1024M", "-jar", "server.jar"]));
    }

    #[tokio::test]
    async fn test_first_existing_script_wins() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("start.sh"), "java -Xmx3G -jar server.jar").unwrap();

        let scripts = args(&["start.bat", "start.sh"]);
        let flags = read_memory_flags(dir.path(), &scripts).await.unwrap();
        assert_eq!(flags.max.as_deref(), Some("3G"));
        assert_eq!(flags.initial, None);
    }

    #[tokio::test]
    async fn test_missing_script_keeps_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let spec = LaunchSpec {
            program: "java".to_string(),
            args: args(&["-Xms4G", "-Xmx4G", "-jar", "server.jar"]),
            working_dir: dir.path().to_path_buf(),
            startup_scripts: args(&["start.bat"]),
        };

        assert_eq!(spec.resolve_args().await, spec.args);
    }
}
