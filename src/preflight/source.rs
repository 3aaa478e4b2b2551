//! Evidence sources for configuration checks.
//!
//! Every check reads its evidence through [`DataSource`], never through the
//! filesystem directly. The production source maps onto the Linux
//! pseudo-filesystems; the in-memory source backs the test fixtures.

use std::collections::HashMap;
use std::fs;

/// Cap on a single pseudo-file read; `/proc/interrupts` on large boxes is
/// the biggest customer and stays well below this.
const MAX_FILE_SIZE: usize = 1 << 20;

/// Read-only view of the host configuration.
pub trait DataSource {
    /// Contents of a virtual file, or `None` if it cannot be read.
    fn read(&self, path: &str) -> Option<String>;

    /// Value of a kernel command-line parameter. A bare flag yields an
    /// empty string; an absent parameter yields `None`.
    fn cmdline_param(&self, key: &str) -> Option<String>;
}

pub(crate) fn param_from_cmdline(cmdline: &str, key: &str) -> Option<String> {
    for token in cmdline.split_whitespace() {
        match token.split_once('=') {
            None if token == key => return Some(String::new()),
            Some((name, value)) if name == key => return Some(value.to_string()),
            _ => {}
        }
    }
    None
}

/// The live host: procfs, sysfs, and friends.
#[derive(Debug, Clone, Copy, Default)]
pub struct FsSource;

impl DataSource for FsSource {
    fn read(&self, path: &str) -> Option<String> {
        let mut bytes = fs::read(path).ok()?;
        bytes.truncate(MAX_FILE_SIZE);
        Some(String::from_utf8_lossy(&bytes).into_owned())
    }

    fn cmdline_param(&self, key: &str) -> Option<String> {
        param_from_cmdline(&self.read("/proc/cmdline")?, key)
    }
}

/// In-memory source for tests: a plain path -> content map.
#[derive(Debug, Clone, Default)]
pub struct MemSource {
    files: HashMap<String, String>,
}

impl MemSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style file insertion.
    pub fn with(mut self, path: &str, content: &str) -> Self {
        self.files.insert(path.to_string(), content.to_string());
        self
    }
}

impl DataSource for MemSource {
    fn read(&self, path: &str) -> Option<String> {
        self.files.get(path).cloned()
    }

    fn cmdline_param(&self, key: &str) -> Option<String> {
        param_from_cmdline(self.files.get("/proc/cmdline")?, key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cmdline_param_extracts_values_and_flags() {
        let cmdline = "quiet nohz_full=2-3 isolcpus=2,3 rcu_nocbs=2-3 nosmt";
        assert_eq!(
            param_from_cmdline(cmdline, "nohz_full"),
            Some("2-3".to_string())
        );
        assert_eq!(param_from_cmdline(cmdline, "nosmt"), Some(String::new()));
        assert_eq!(param_from_cmdline(cmdline, "irqaffinity"), None);
        // Prefix of another key must not match.
        assert_eq!(param_from_cmdline(cmdline, "nohz"), None);
    }

    #[test]
    fn mem_source_round_trips() {
        let source = MemSource::new()
            .with("/proc/cmdline", "irqaffinity=0-1\n")
            .with("/sys/kernel/realtime", "1\n");
        assert_eq!(source.read("/sys/kernel/realtime"), Some("1\n".to_string()));
        assert_eq!(source.read("/sys/missing"), None);
        assert_eq!(
            source.cmdline_param("irqaffinity"),
            Some("0-1".to_string())
        );
    }

    #[test]
    fn missing_cmdline_means_no_params() {
        let source = MemSource::new();
        assert_eq!(source.cmdline_param("nohz_full"), None);
    }
}
