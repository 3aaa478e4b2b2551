//! Audit behavior against in-memory host fixtures.

use metronome::preflight::{
    parse_cpu_list, render_result, run_audit, Check, CheckContext, MemSource, Status,
};

fn ctx(cpu: usize, nic: Option<&str>) -> CheckContext {
    CheckContext {
        cpu: Some(cpu),
        nic: nic.map(str::to_string),
    }
}

/// A host where every check has the evidence it wants.
fn all_pass_fixture(cpu: usize, nic: &str) -> MemSource {
    let cpufreq = format!("/sys/devices/system/cpu/cpu{cpu}/cpufreq");
    let interrupts = format!(
        "            CPU0       CPU1       CPU2\n\
  24:          0          0      51234   PCI-MSI 524288-edge {nic}-rx-0\n\
  25:       9000          0          0   PCI-MSI 524289-edge nvme0q1\n"
    );
    MemSource::new()
        .with("/sys/kernel/realtime", "1\n")
        .with("/proc/swaps", "Filename Type Size Used Priority\n")
        .with("/proc/sys/kernel/timer_migration", "0\n")
        .with("/proc/sys/kernel/sched_rt_runtime_us", "-1\n")
        .with(
            "/sys/devices/system/clocksource/clocksource0/current_clocksource",
            "tsc\n",
        )
        .with("/sys/devices/system/cpu/isolated", "2\n")
        .with("/sys/devices/system/cpu/nohz_full", "2\n")
        .with("/sys/devices/system/cpu/rcu_nocbs", "2\n")
        .with(&format!("{cpufreq}/scaling_governor"), "performance\n")
        .with(&format!("{cpufreq}/scaling_cur_freq"), "3000000\n")
        .with(&format!("{cpufreq}/scaling_min_freq"), "3000000\n")
        .with(&format!("{cpufreq}/scaling_max_freq"), "3000000\n")
        .with("/proc/cmdline", "quiet irqaffinity=0-1 intel_idle.max_cstate=1\n")
        .with("/proc/interrupts", &interrupts)
        .with(
            &format!("/sys/devices/system/cpu/cpu{cpu}/topology/thread_siblings_list"),
            &format!("{cpu}\n"),
        )
        .with("/sys/devices/system/cpu/intel_pstate/no_turbo", "1\n")
        .with(&format!("/sys/class/net/{nic}/operstate"), "up\n")
        .with(
            "/proc/net/route",
            "Iface\tDestination\tGateway\nwlan0\t00000000\t0102A8C0\n",
        )
        .with("/proc/irq/24/smp_affinity_list", &format!("{cpu}\n"))
        .with(
            &format!("/sys/class/net/{nic}/queues/rx-0/rps_cpus"),
            "00000000\n",
        )
}

#[test]
fn fully_tuned_host_passes_every_line() {
    colored::control::set_override(false);
    let source = all_pass_fixture(2, "nic0");
    let sections = run_audit(&ctx(2, Some("nic0")), &source);
    assert_eq!(sections.len(), 3);
    for section in &sections {
        assert!(!section.results.is_empty());
        for result in &section.results {
            assert_eq!(
                result.status,
                Status::Pass,
                "{} failed: {}",
                result.label,
                result.reason
            );
            assert!(render_result(result).contains('\u{2714}'));
        }
    }
    // Exactly the documented check population: 5 system, 10 core, 5 NIC.
    assert_eq!(sections[0].results.len(), 5);
    assert_eq!(sections[1].results.len(), 10);
    assert_eq!(sections[2].results.len(), 5);
}

#[test]
fn isolated_list_membership_decides_core_isolation() {
    let source = MemSource::new().with("/sys/devices/system/cpu/isolated", "1-3,5\n");
    assert_eq!(
        Check::CoreIsolated.evaluate(&ctx(2, None), &source).status,
        Status::Pass
    );
    assert_eq!(
        Check::CoreIsolated.evaluate(&ctx(4, None), &source).status,
        Status::Fail
    );
}

#[test]
fn timer_migration_enabled_reports_the_observed_value() {
    let source = MemSource::new().with("/proc/sys/kernel/timer_migration", "1\n");
    let result = Check::TimerMigration.evaluate(&CheckContext::default(), &source);
    assert_eq!(result.status, Status::Fail);
    assert_eq!(result.reason, "timer_migration=1");
}

#[test]
fn preempt_rt_falls_back_to_the_kernel_version_string() {
    let source = MemSource::new().with(
        "/proc/version",
        "Linux version 6.12.8-rt8 (builder@host) #1 SMP PREEMPT RT Thu Jan 2\n",
    );
    let result = Check::PreemptRtActive.evaluate(&CheckContext::default(), &source);
    assert_eq!(result.status, Status::Pass);
}

#[test]
fn header_only_swaps_means_swap_is_off() {
    let source = MemSource::new().with(
        "/proc/swaps",
        "Filename                                Type            Size            Used            Priority\n",
    );
    let result = Check::SwapDisabled.evaluate(&CheckContext::default(), &source);
    assert_eq!(result.status, Status::Pass);
}

#[test]
fn nohz_full_without_any_evidence_is_unknown_not_fail() {
    let source = MemSource::new().with("/proc/cmdline", "");
    let result = Check::NohzFull.evaluate(&ctx(2, None), &source);
    assert_eq!(result.status, Status::Unknown);
}

#[test]
fn cpu_list_parser_grammar() {
    let set = |cpus: &[usize]| cpus.iter().copied().collect::<std::collections::BTreeSet<_>>();
    assert_eq!(parse_cpu_list("1-3,5,7-8"), set(&[1, 2, 3, 5, 7, 8]));
    assert_eq!(parse_cpu_list("3-1"), set(&[1, 2, 3]));
    assert_eq!(parse_cpu_list(""), set(&[]));
}

#[test]
fn audit_never_panics_on_garbage_content() {
    let source = MemSource::new()
        .with("/proc/swaps", "\u{0}\u{1}binary")
        .with("/proc/interrupts", "no header here\n###\n")
        .with("/sys/devices/system/cpu/isolated", "not-a-list")
        .with("/proc/sys/kernel/timer_migration", "")
        .with("/proc/cmdline", "=== = ==");
    for section in run_audit(&ctx(2, Some("nic0")), &source) {
        for result in section.results {
            assert!(!result.reason.is_empty());
        }
    }
}
