//! Host configuration audit.
//!
//! Rates the host against the preconditions of a deterministic real-time
//! workload: an ordered set of independent checks over `/proc` and `/sys`
//! evidence, grouped into System / CPU / NIC sections for display. The audit
//! only observes; it never writes a knob.

pub mod checks;
pub mod cpulist;
pub mod hostinfo;
pub mod source;

use colored::Colorize;

pub use checks::{Check, CheckContext, CheckResult, Domain, Status};
pub use cpulist::parse_cpu_list;
pub use source::{DataSource, FsSource, MemSource};

const SYSTEM_CHECKS: &[Check] = &[
    Check::PreemptRtActive,
    Check::SwapDisabled,
    Check::TimerMigration,
    Check::RtThrottling,
    Check::Clocksource,
];

const CORE_CHECKS: &[Check] = &[
    Check::CoreIsolated,
    Check::NohzFull,
    Check::RcuNocbs,
    Check::CpuGovernor,
    Check::CpuFrequency,
    Check::IrqAffinity,
    Check::UnrelatedIrqs,
    Check::SmtSibling,
    Check::CStatesCapped,
    Check::TurboDisabled,
];

const NIC_CHECKS: &[Check] = &[
    Check::NicLinkUp,
    Check::NicQuiet,
    Check::NicIrqsPinned,
    Check::RpsDisabled,
];

/// One display section of the audit.
#[derive(Debug)]
pub struct AuditSection {
    pub title: String,
    pub results: Vec<CheckResult>,
}

/// Evaluate every applicable check for the given context.
///
/// NIC checks beyond presence run only when the presence check passes; a
/// missing interface would turn them all into noise.
pub fn run_audit(ctx: &CheckContext, source: &dyn DataSource) -> Vec<AuditSection> {
    let evaluate =
        |checks: &[Check]| -> Vec<CheckResult> { checks.iter().map(|c| c.evaluate(ctx, source)).collect() };

    let mut sections = vec![AuditSection {
        title: "System Checks".to_string(),
        results: evaluate(SYSTEM_CHECKS),
    }];

    if let Some(cpu) = ctx.cpu {
        sections.push(AuditSection {
            title: format!("Core {cpu} Checks"),
            results: evaluate(CORE_CHECKS),
        });
    }

    if let Some(nic) = &ctx.nic {
        let presence = Check::NicPresent.evaluate(ctx, source);
        let nic_ok = presence.status == Status::Pass;
        let mut results = vec![presence];
        if nic_ok {
            results.extend(evaluate(NIC_CHECKS));
        }
        sections.push(AuditSection {
            title: format!("NIC {nic} Checks"),
            results,
        });
    }

    sections
}

/// Colored mark for a check outcome.
pub fn status_mark(status: Status) -> String {
    match status {
        Status::Pass => "\u{2714}".green().to_string(),
        Status::Fail => "\u{2718}".red().to_string(),
        Status::Unknown => "?".yellow().to_string(),
    }
}

/// One audit line: padded label, mark, reason.
pub fn render_result(result: &CheckResult) -> String {
    format!(
        "{:<36}{}   {}",
        result.label,
        status_mark(result.status),
        result.reason
    )
}

fn print_section_header(title: &str) {
    println!("\n{title}");
    println!("{}", "\u{2501}".repeat(73));
}

/// Print the host banner and every audit section to stdout.
///
/// An out-of-range CPU index is reported and skips the audit entirely; the
/// subject of most checks would be meaningless.
pub fn print_audit(cpu: usize, nic: Option<&str>, source: &dyn DataSource) {
    let cpu_count = hostinfo::logical_cpu_count();
    if cpu >= cpu_count {
        eprintln!("invalid CPU core {cpu}; must be between 0 and {}", cpu_count - 1);
        return;
    }

    println!("{} | {}", hostinfo::hostname_line(), hostinfo::os_line());
    println!("{}", hostinfo::cpu_line());
    println!("{}", hostinfo::kernel_line());

    let ctx = CheckContext {
        cpu: Some(cpu),
        nic: nic.map(str::to_string),
    };
    for section in run_audit(&ctx, source) {
        print_section_header(&section.title);
        for result in &section.results {
            println!("{}", render_result(result));
        }
    }
    println!();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn audit_skips_nic_section_without_a_nic() {
        let ctx = CheckContext {
            cpu: Some(1),
            nic: None,
        };
        let sections = run_audit(&ctx, &MemSource::new());
        assert_eq!(sections.len(), 2);
        assert_eq!(sections[0].title, "System Checks");
        assert_eq!(sections[1].title, "Core 1 Checks");
    }

    #[test]
    fn missing_nic_gates_the_dependent_checks() {
        let ctx = CheckContext {
            cpu: Some(1),
            nic: Some("nic0".to_string()),
        };
        let sections = run_audit(&ctx, &MemSource::new());
        let nic_section = &sections[2];
        assert_eq!(nic_section.results.len(), 1);
        assert_eq!(nic_section.results[0].check, Check::NicPresent);
        assert_eq!(nic_section.results[0].status, Status::Unknown);
    }

    #[test]
    fn rendered_line_carries_label_mark_and_reason() {
        colored::control::set_override(false);
        let result = Check::TimerMigration.evaluate(
            &CheckContext::default(),
            &MemSource::new().with("/proc/sys/kernel/timer_migration", "0\n"),
        );
        let line = render_result(&result);
        assert!(line.starts_with("Timer migration disabled"));
        assert!(line.contains('\u{2714}'));
        assert!(line.ends_with("timer_migration=0"));
    }
}
