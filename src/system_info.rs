//! Description of the machine a campaign ran on.

use std::ffi::CStr;
use std::fs;

/// System information collected when a campaign starts.
#[derive(Debug, Clone)]
pub struct SystemInfo {
    /// Kernel release, e.g. `6.8.0-45-generic`
    pub kernel_release: String,
    /// First line of `/proc/version`
    pub kernel_version: String,
    /// CPU model name
    pub cpu_info: String,
    /// Total memory, formatted in GB
    pub memory_info: String,
    /// Collection time
    pub timestamp: chrono::DateTime<chrono::Utc>,
}

impl SystemInfo {
    /// Collects system information, substituting `"Unknown"` for anything
    /// that cannot be read.
    pub fn collect() -> Self {
        Self {
            kernel_release: kernel_release(),
            kernel_version: read_kernel_version(),
            cpu_info: read_cpu_info(),
            memory_info: read_memory_info(),
            timestamp: chrono::Utc::now(),
        }
    }

    /// Lines suitable for logging, one fact per line.
    pub fn describe(&self) -> Vec<String> {
        vec![
            format!("timestamp: {}", self.timestamp.format("%Y-%m-%d %H:%M:%S UTC")),
            format!("kernel: {}", self.kernel_version),
            format!("cpu: {}", self.cpu_info),
            format!("memory: {}", self.memory_info),
        ]
    }
}

/// Kernel release as reported by `uname -r`.
pub fn kernel_release() -> String {
    let mut uts = std::mem::MaybeUninit::<libc::utsname>::uninit();
    let rc = unsafe { libc::uname(uts.as_mut_ptr()) };
    if rc != 0 {
        return "Unknown".to_string();
    }

    // SAFETY: uname succeeded, so the struct is initialized and every field
    // is a NUL-terminated string.
    let uts = unsafe { uts.assume_init() };
    let release = unsafe { CStr::from_ptr(uts.release.as_ptr()) };
    release.to_string_lossy().into_owned()
}

fn read_kernel_version() -> String {
    fs::read_to_string("/proc/version")
        .ok()
        .and_then(|content| content.lines().next().map(str::to_string))
        .unwrap_or_else(|| "Unknown".to_string())
}

fn read_cpu_info() -> String {
    fs::read_to_string("/proc/cpuinfo")
        .ok()
        .and_then(|content| parse_cpu_model(&content))
        .unwrap_or_else(|| "Unknown".to_string())
}

fn read_memory_info() -> String {
    fs::read_to_string("/proc/meminfo")
        .ok()
        .and_then(|content| parse_mem_total(&content))
        .unwrap_or_else(|| "Unknown".to_string())
}

fn parse_cpu_model(cpuinfo: &str) -> Option<String> {
    cpuinfo
        .lines()
        .find(|line| line.starts_with("model name"))
        .and_then(|line| line.split(':').nth(1))
        .map(|model| model.trim().to_string())
}

/// Converts the `MemTotal` line (kB) into GB for display.
fn parse_mem_total(meminfo: &str) -> Option<String> {
    let kb = meminfo
        .lines()
        .find(|line| line.starts_with("MemTotal"))?
        .split_whitespace()
        .nth(1)?;

    match kb.parse::<u64>() {
        Ok(kb_num) => Some(format!("{:.1} GB", kb_num as f64 / 1024.0 / 1024.0)),
        Err(_) => Some(kb.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_cpu_model() {
        let cpuinfo = "processor\t: 0\nvendor_id\t: GenuineIntel\nmodel name\t: Intel(R) Xeon(R) CPU @ 2.20GHz\n";
        assert_eq!(
            parse_cpu_model(cpuinfo).as_deref(),
            Some("Intel(R) Xeon(R) CPU @ 2.20GHz")
        );
        assert_eq!(parse_cpu_model("processor : 0\n"), None);
    }

    #[test]
    fn parses_mem_total() {
        let meminfo = "MemTotal:       16384000 kB\nMemFree:         1000 kB\n";
        assert_eq!(parse_mem_total(meminfo).as_deref(), Some("15.6 GB"));
        assert_eq!(parse_mem_total("MemFree: 1 kB\n"), None);
    }

    #[test]
    fn kernel_release_is_single_line() {
        let release = kernel_release();
        assert!(!release.is_empty());
        assert!(!release.contains('\n'));
    }

    #[test]
    fn collect_never_fails() {
        let info = SystemInfo::collect();
        assert_eq!(info.describe().len(), 4);
        assert!(!info.kernel_version.is_empty());
    }
}
