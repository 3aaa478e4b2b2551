//! Host identity banner printed above the audit sections.

use std::collections::BTreeSet;
use std::ffi::CStr;
use std::fs;

fn uname() -> Option<libc::utsname> {
    let mut buffer: libc::utsname = unsafe { std::mem::zeroed() };
    (unsafe { libc::uname(&mut buffer) } == 0).then_some(buffer)
}

fn field(chars: &[libc::c_char]) -> String {
    unsafe { CStr::from_ptr(chars.as_ptr()) }
        .to_string_lossy()
        .into_owned()
}

pub fn hostname_line() -> String {
    match uname() {
        Some(uts) => format!("Hostname: {}", field(&uts.nodename)),
        None => "Hostname: unknown".to_string(),
    }
}

pub fn kernel_line() -> String {
    match uname() {
        Some(uts) => format!(
            "Kernel: {} {} {} {}",
            field(&uts.sysname),
            field(&uts.release),
            field(&uts.version),
            field(&uts.machine)
        ),
        None => "Kernel: unknown".to_string(),
    }
}

pub fn os_line() -> String {
    let Ok(release) = fs::read_to_string("/etc/os-release") else {
        return "OS: unknown".to_string();
    };
    let unquote = |value: &str| value.trim().trim_matches('"').to_string();
    for line in release.lines() {
        if let Some(value) = line.strip_prefix("PRETTY_NAME=") {
            return format!("OS: {}", unquote(value));
        }
    }
    let mut name = String::new();
    let mut version = String::new();
    for line in release.lines() {
        if let Some(value) = line.strip_prefix("NAME=") {
            name = unquote(value);
        } else if let Some(value) = line.strip_prefix("VERSION=") {
            version = unquote(value);
        }
    }
    match (name.is_empty(), version.is_empty()) {
        (false, false) => format!("OS: {name} {version}"),
        (false, true) => format!("OS: {name}"),
        _ => "OS: unknown".to_string(),
    }
}

pub fn logical_cpu_count() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
}

fn cpu_model() -> String {
    if let Ok(cpuinfo) = fs::read_to_string("/proc/cpuinfo") {
        for key in ["model name", "Hardware", "Processor", "cpu model"] {
            for line in cpuinfo.lines() {
                if line.starts_with(key) {
                    if let Some(value) = line.split(':').nth(1) {
                        let value = value.trim();
                        if !value.is_empty() {
                            return value.to_string();
                        }
                    }
                }
            }
        }
    }
    uname()
        .map(|uts| field(&uts.machine))
        .unwrap_or_else(|| "Unknown CPU".to_string())
}

pub fn cpu_line() -> String {
    let mut line = format!("CPU: {}", cpu_model());

    let mut physical: BTreeSet<(u32, u32)> = BTreeSet::new();
    let mut performance = 0u32;
    let mut efficiency = 0u32;
    if let Ok(entries) = fs::read_dir("/sys/devices/system/cpu") {
        for entry in entries.flatten() {
            let name = entry.file_name();
            let name = name.to_string_lossy();
            let Some(digits) = name.strip_prefix("cpu") else {
                continue;
            };
            if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_digit()) {
                continue;
            }
            let topology = entry.path().join("topology");
            let read_u32 = |file: &str| {
                fs::read_to_string(topology.join(file))
                    .ok()
                    .and_then(|s| s.trim().parse::<u32>().ok())
            };
            if let (Some(package), Some(core)) = (read_u32("physical_package_id"), read_u32("core_id"))
            {
                physical.insert((package, core));
            }
            if let Ok(core_type) = fs::read_to_string(topology.join("core_type")) {
                let core_type = core_type.trim().to_lowercase();
                if core_type.contains("perf") || core_type == "core" {
                    performance += 1;
                } else if core_type.contains("eff") || core_type == "atom" {
                    efficiency += 1;
                }
            }
        }
    }

    line.push_str(&format!(" ({} logical", logical_cpu_count()));
    if !physical.is_empty() {
        line.push_str(&format!(", {} physical", physical.len()));
    }
    if performance + efficiency > 0 {
        line.push_str(&format!("; P={performance}, E={efficiency}"));
    }
    line.push(')');
    line
}
