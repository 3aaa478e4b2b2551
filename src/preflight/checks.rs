//! The configuration checks.
//!
//! Each check is one variant of a closed enum: a predicate over the
//! injectable [`DataSource`] plus a display label and a domain. Checks are
//! stateless and independent; evidence that cannot be obtained maps to
//! [`Status::Unknown`] with a reason, never to an error.

use serde::Serialize;

use super::cpulist::parse_cpu_list;
use super::source::DataSource;

/// Outcome class of one check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Status {
    Pass,
    Fail,
    /// Evidence unavailable, as opposed to "inconclusive but arguably okay".
    Unknown,
}

/// Display grouping; check identity and output are domain-independent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Domain {
    System,
    Cpu,
    Nic,
}

/// Subject of an audit run.
#[derive(Debug, Clone, Default)]
pub struct CheckContext {
    pub cpu: Option<usize>,
    pub nic: Option<String>,
}

/// One evaluated check.
#[derive(Debug, Clone, Serialize)]
pub struct CheckResult {
    pub check: Check,
    pub status: Status,
    pub label: &'static str,
    pub reason: String,
}

/// The closed set of host-configuration predicates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Check {
    PreemptRtActive,
    SwapDisabled,
    TimerMigration,
    RtThrottling,
    Clocksource,
    CoreIsolated,
    NohzFull,
    RcuNocbs,
    CpuGovernor,
    CpuFrequency,
    IrqAffinity,
    UnrelatedIrqs,
    SmtSibling,
    CStatesCapped,
    TurboDisabled,
    NicPresent,
    NicLinkUp,
    NicQuiet,
    NicIrqsPinned,
    RpsDisabled,
}

/// Offender cap in the unrelated-IRQ reason string.
const MAX_IRQS_TO_SHOW: usize = 6;

impl Check {
    pub fn label(self) -> &'static str {
        match self {
            Check::PreemptRtActive => "PREEMPT_RT active",
            Check::SwapDisabled => "Swap disabled",
            Check::TimerMigration => "Timer migration disabled",
            Check::RtThrottling => "RT throttling disabled",
            Check::Clocksource => "Clocksource stable",
            Check::CoreIsolated => "RT core isolated",
            Check::NohzFull => "nohz_full on RT core",
            Check::RcuNocbs => "rcu_nocbs includes RT core",
            Check::CpuGovernor => "CPU governor = performance",
            Check::CpuFrequency => "CPU frequency locked",
            Check::IrqAffinity => "irqaffinity excludes RT core",
            Check::UnrelatedIrqs => "No unrelated IRQs on RT core",
            Check::SmtSibling => "SMT sibling isolated/disabled",
            Check::CStatesCapped => "Deep C-states capped",
            Check::TurboDisabled => "Turbo/boost disabled",
            Check::NicPresent => "NIC interface present",
            Check::NicLinkUp => "NIC link is UP",
            Check::NicQuiet => "NIC is quiet",
            Check::NicIrqsPinned => "NIC IRQs pinned to RT core",
            Check::RpsDisabled => "RPS disabled on NIC",
        }
    }

    pub fn domain(self) -> Domain {
        match self {
            Check::PreemptRtActive
            | Check::SwapDisabled
            | Check::TimerMigration
            | Check::Clocksource
            | Check::UnrelatedIrqs => Domain::System,
            Check::RtThrottling
            | Check::CoreIsolated
            | Check::NohzFull
            | Check::RcuNocbs
            | Check::CpuGovernor
            | Check::CpuFrequency
            | Check::IrqAffinity
            | Check::SmtSibling
            | Check::CStatesCapped
            | Check::TurboDisabled => Domain::Cpu,
            Check::NicPresent
            | Check::NicLinkUp
            | Check::NicQuiet
            | Check::NicIrqsPinned
            | Check::RpsDisabled => Domain::Nic,
        }
    }

    pub fn evaluate(self, ctx: &CheckContext, source: &dyn DataSource) -> CheckResult {
        match self {
            Check::PreemptRtActive => preempt_rt(self, source),
            Check::SwapDisabled => swap_disabled(self, source),
            Check::TimerMigration => timer_migration(self, source),
            Check::RtThrottling => rt_throttling(self, source),
            Check::Clocksource => clocksource(self, source),
            Check::CoreIsolated => core_isolated(self, ctx, source),
            Check::NohzFull => nohz_full(self, ctx, source),
            Check::RcuNocbs => rcu_nocbs(self, ctx, source),
            Check::CpuGovernor => cpu_governor(self, ctx, source),
            Check::CpuFrequency => cpu_frequency(self, ctx, source),
            Check::IrqAffinity => irq_affinity(self, ctx, source),
            Check::UnrelatedIrqs => unrelated_irqs(self, ctx, source),
            Check::SmtSibling => smt_sibling(self, ctx, source),
            Check::CStatesCapped => cstates_capped(self, source),
            Check::TurboDisabled => turbo_disabled(self, source),
            Check::NicPresent => nic_present(self, ctx, source),
            Check::NicLinkUp => nic_link_up(self, ctx, source),
            Check::NicQuiet => nic_quiet(self, ctx, source),
            Check::NicIrqsPinned => nic_irqs_pinned(self, ctx, source),
            Check::RpsDisabled => rps_disabled(self, ctx, source),
        }
    }

    fn pass(self, reason: impl Into<String>) -> CheckResult {
        self.result(Status::Pass, reason)
    }

    fn fail(self, reason: impl Into<String>) -> CheckResult {
        self.result(Status::Fail, reason)
    }

    fn unknown(self, reason: impl Into<String>) -> CheckResult {
        self.result(Status::Unknown, reason)
    }

    fn result(self, status: Status, reason: impl Into<String>) -> CheckResult {
        CheckResult {
            check: self,
            status,
            label: self.label(),
            reason: reason.into(),
        }
    }
}

fn read_trimmed(source: &dyn DataSource, path: &str) -> Option<String> {
    source.read(path).map(|s| s.trim().to_string())
}

fn read_i64(source: &dyn DataSource, path: &str) -> Option<i64> {
    read_trimmed(source, path)?.parse().ok()
}

fn nic_exists(source: &dyn DataSource, nic: &str) -> bool {
    source.read(&format!("/sys/class/net/{nic}/operstate")).is_some()
        || source.read(&format!("/sys/class/net/{nic}/carrier")).is_some()
        || source.read(&format!("/sys/class/net/{nic}/address")).is_some()
}

fn or_empty(raw: &str) -> &str {
    if raw.is_empty() {
        "(empty)"
    } else {
        raw
    }
}

fn preempt_rt(check: Check, source: &dyn DataSource) -> CheckResult {
    if let Some(value) = read_trimmed(source, "/sys/kernel/realtime") {
        if value == "1" {
            return check.pass("/sys/kernel/realtime=1");
        }
        if value == "0" {
            return check.fail("/sys/kernel/realtime=0");
        }
    }
    if let Some(version) = source.read("/proc/version") {
        if version.contains("PREEMPT RT") || version.contains("PREEMPT_RT") {
            return check.pass(format!("/proc/version: {}", version.trim()));
        }
    }
    if let Some(release) = read_trimmed(source, "/proc/sys/kernel/osrelease") {
        if let Some(config) = source.read(&format!("/boot/config-{release}")) {
            if config.contains("CONFIG_PREEMPT_RT=y") || config.contains("CONFIG_PREEMPT_RT_FULL=y")
            {
                return check.pass(format!("/boot/config-{release} has CONFIG_PREEMPT_RT=y"));
            }
            if config.contains("CONFIG_PREEMPT=y") {
                return check.fail("only low-latency PREEMPT, not PREEMPT_RT");
            }
        }
    }
    check.fail("no evidence of an RT kernel")
}

fn swap_disabled(check: Check, source: &dyn DataSource) -> CheckResult {
    let Some(swaps) = source.read("/proc/swaps") else {
        return check.unknown("cannot read /proc/swaps");
    };
    let mut lines = swaps.lines();
    if lines.next().is_none() {
        return check.unknown("unexpected /proc/swaps format");
    }
    let mut active = Vec::new();
    for line in lines {
        let fields: Vec<&str> = line.split_whitespace().collect();
        match fields.as_slice() {
            [] => {}
            [name, _, size, used, ..] => active.push(format!("{name} size={size} used={used}")),
            [name, ..] => active.push(name.to_string()),
        }
    }
    if active.is_empty() {
        return check.pass("/proc/swaps empty");
    }
    check.fail(format!("active: {}", active.join(", ")))
}

fn timer_migration(check: Check, source: &dyn DataSource) -> CheckResult {
    let Some(value) = read_trimmed(source, "/proc/sys/kernel/timer_migration") else {
        return check.unknown("cannot read timer_migration");
    };
    if value == "0" {
        return check.pass("timer_migration=0");
    }
    check.fail(format!("timer_migration={value}"))
}

fn rt_throttling(check: Check, source: &dyn DataSource) -> CheckResult {
    let Some(value) = read_trimmed(source, "/proc/sys/kernel/sched_rt_runtime_us") else {
        return check.unknown("cannot read sched_rt_runtime_us");
    };
    if value == "-1" {
        return check.pass("sched_rt_runtime_us=-1");
    }
    check.fail(format!("sched_rt_runtime_us={value}"))
}

fn clocksource(check: Check, source: &dyn DataSource) -> CheckResult {
    const BASE: &str = "/sys/devices/system/clocksource/clocksource0";
    let Some(current) = read_trimmed(source, &format!("{BASE}/current_clocksource")) else {
        return check.unknown("cannot read current_clocksource");
    };
    match current.as_str() {
        "tsc" => return check.pass("tsc"),
        "hpet" => return check.pass("hpet"),
        // The standard, and usually only, clocksource on ARM systems.
        "arch_sys_counter" => return check.pass("arch_sys_counter"),
        _ => {}
    }
    let mut detail = current.clone();
    if let Some(available) = read_trimmed(source, &format!("{BASE}/available_clocksource")) {
        detail = format!("{detail}; available={available}");
    }
    if current == "jiffies" {
        return check.fail(detail);
    }
    check.unknown(detail)
}

fn core_isolated(check: Check, ctx: &CheckContext, source: &dyn DataSource) -> CheckResult {
    let Some(cpu) = ctx.cpu else {
        return check.unknown("no CPU subject");
    };
    let Some(raw) = read_trimmed(source, "/sys/devices/system/cpu/isolated") else {
        return check.unknown("no /sys/devices/system/cpu/isolated");
    };
    let isolated = parse_cpu_list(&raw);
    if cpu == 0 {
        if isolated.contains(&0) {
            return check.fail("CPU0 is isolated but should not be the RT core");
        }
        return check.fail("CPU0 selected; choose a non-zero RT core");
    }
    if isolated.contains(&cpu) {
        return check.pass(format!("isolated list: {}", or_empty(&raw)));
    }
    check.fail(format!("CPU{cpu} not in isolated: {}", or_empty(&raw)))
}

fn nohz_full(check: Check, ctx: &CheckContext, source: &dyn DataSource) -> CheckResult {
    let Some(cpu) = ctx.cpu else {
        return check.unknown("no CPU subject");
    };
    if let Some(raw) = read_trimmed(source, "/sys/devices/system/cpu/nohz_full") {
        if parse_cpu_list(&raw).contains(&cpu) {
            return check.pass(format!("nohz_full list: {}", or_empty(&raw)));
        }
        return check.fail(format!("CPU{cpu} not in nohz_full: {}", or_empty(&raw)));
    }
    if let Some(value) = source.cmdline_param("nohz_full") {
        if parse_cpu_list(&value).contains(&cpu) {
            return check.pass(format!("cmdline nohz_full={value}"));
        }
        return check.fail(format!("RT core not in cmdline nohz_full={value}"));
    }
    check.unknown("no sysfs entry and no cmdline param")
}

fn rcu_nocbs(check: Check, ctx: &CheckContext, source: &dyn DataSource) -> CheckResult {
    let Some(cpu) = ctx.cpu else {
        return check.unknown("no CPU subject");
    };
    let raw = if let Some(raw) = read_trimmed(source, "/sys/devices/system/cpu/rcu_nocbs") {
        raw
    } else if let Some(value) = source.cmdline_param("rcu_nocbs") {
        value.trim().to_string()
    } else {
        return check.unknown("no sysfs entry and no cmdline param");
    };
    if parse_cpu_list(&raw).contains(&cpu) {
        return check.pass(raw);
    }
    check.fail(format!("CPU{cpu} not in rcu_nocbs: {}", or_empty(&raw)))
}

fn cpu_governor(check: Check, ctx: &CheckContext, source: &dyn DataSource) -> CheckResult {
    let Some(cpu) = ctx.cpu else {
        return check.unknown("no CPU subject");
    };
    let path = format!("/sys/devices/system/cpu/cpu{cpu}/cpufreq/scaling_governor");
    let Some(governor) = read_trimmed(source, &path) else {
        return check.unknown(format!("no cpufreq governor for cpu{cpu}"));
    };
    if governor == "performance" {
        return check.pass(format!("governor={governor}"));
    }
    check.fail(format!("governor={governor}"))
}

fn cpu_frequency(check: Check, ctx: &CheckContext, source: &dyn DataSource) -> CheckResult {
    let Some(cpu) = ctx.cpu else {
        return check.unknown("no CPU subject");
    };
    let base = format!("/sys/devices/system/cpu/cpu{cpu}/cpufreq");
    let current = read_i64(source, &format!("{base}/scaling_cur_freq"));
    let min = read_i64(source, &format!("{base}/scaling_min_freq"));
    let max = read_i64(source, &format!("{base}/scaling_max_freq"));

    if let (Some(current), Some(min), Some(max)) = (current, min, max) {
        if min == max {
            let tolerance = max * 5 / 100;
            if (current - max).abs() <= tolerance {
                return check.pass(format!("{max} kHz (locked)"));
            }
            return check.fail(format!("cur={current} kHz, locked={max} kHz"));
        }
        return check.fail(format!("cur={current} kHz, min={min} kHz, max={max} kHz"));
    }
    if current.is_some() || min.is_some() || max.is_some() {
        let show = |v: Option<i64>| v.map_or("?".to_string(), |v| format!("{v} kHz"));
        return check.unknown(format!(
            "cur={}, min={}, max={}",
            show(current),
            show(min),
            show(max)
        ));
    }
    // No cpufreq at all; /proc/cpuinfo at least names a frequency.
    if let Some(cpuinfo) = source.read("/proc/cpuinfo") {
        let mut processor: Option<usize> = None;
        for line in cpuinfo.lines() {
            if let Some(value) = line.strip_prefix("processor") {
                processor = value.split(':').nth(1).and_then(|v| v.trim().parse().ok());
            } else if line.starts_with("cpu MHz") && processor == Some(cpu) {
                if let Some(mhz) = line.split(':').nth(1) {
                    return check.unknown(format!("{} MHz (/proc/cpuinfo)", mhz.trim()));
                }
            }
        }
    }
    check.unknown("unavailable")
}

fn irq_affinity(check: Check, ctx: &CheckContext, source: &dyn DataSource) -> CheckResult {
    let Some(cpu) = ctx.cpu else {
        return check.unknown("no CPU subject");
    };
    let Some(value) = source.cmdline_param("irqaffinity") else {
        return check.unknown("no irqaffinity kernel param");
    };
    let cpus = parse_cpu_list(&value);
    if cpus.is_empty() {
        return check.unknown("empty list");
    }
    if cpus.contains(&cpu) {
        return check.fail(format!("RT core present in irqaffinity: {value}"));
    }
    check.pass(value)
}

fn unrelated_irqs(check: Check, ctx: &CheckContext, source: &dyn DataSource) -> CheckResult {
    let Some(cpu) = ctx.cpu else {
        return check.unknown("no CPU subject");
    };
    let Some(content) = source.read("/proc/interrupts") else {
        return check.unknown("cannot read /proc/interrupts");
    };

    let mut cpu_column: Option<usize> = None;
    let mut header_done = false;
    let mut offenders: Vec<String> = Vec::new();
    let wanted = format!("CPU{cpu}");

    for line in content.lines() {
        if line.trim().is_empty() {
            continue;
        }
        if !header_done {
            if line.contains("CPU0") {
                let mut index = 0usize;
                for column in line.split_whitespace() {
                    if column.starts_with("CPU") {
                        if column == wanted {
                            cpu_column = Some(index);
                        }
                        index += 1;
                    }
                }
                header_done = true;
            }
            continue;
        }

        let row = line.trim_start();
        if !row.starts_with(|c: char| c.is_ascii_digit()) {
            continue;
        }
        let Some((irq, counts)) = row.split_once(':') else {
            continue;
        };

        let mut value_at_core: u64 = 0;
        let tokens: Vec<&str> = counts.split_whitespace().collect();
        let mut label: Option<String> = None;
        for (index, token) in tokens.iter().enumerate() {
            if token.chars().all(|c| c.is_ascii_digit()) {
                if Some(index) == cpu_column {
                    value_at_core = token.parse().unwrap_or(0);
                }
            } else {
                label = Some(tokens[index..].join(" "));
                break;
            }
        }

        if value_at_core == 0 {
            continue;
        }
        match (&label, &ctx.nic) {
            (Some(label), Some(nic)) if label.contains(nic.as_str()) => {}
            // Without a NIC subject there is no label to exempt, and the
            // original behavior is to not blame labelled rows at all.
            (Some(_), None) => {}
            (Some(label), Some(_)) => offenders.push(format!("{irq} {label}")),
            (None, _) => offenders.push(format!("{irq} (unlabeled)")),
        }
    }

    if cpu_column.is_none() {
        return check.unknown("could not map CPU column");
    }
    if offenders.is_empty() {
        return check.pass("clean");
    }
    let shown = offenders
        .iter()
        .take(MAX_IRQS_TO_SHOW)
        .cloned()
        .collect::<Vec<_>>()
        .join(", ");
    if offenders.len() > MAX_IRQS_TO_SHOW {
        return check.fail(format!("{shown}, +{} more", offenders.len() - MAX_IRQS_TO_SHOW));
    }
    check.fail(shown)
}

fn smt_sibling(check: Check, ctx: &CheckContext, source: &dyn DataSource) -> CheckResult {
    let Some(cpu) = ctx.cpu else {
        return check.unknown("no CPU subject");
    };
    let path = format!("/sys/devices/system/cpu/cpu{cpu}/topology/thread_siblings_list");
    let Some(raw) = source.read(&path) else {
        return check.unknown("no thread_siblings_list");
    };
    let mut siblings = parse_cpu_list(&raw);
    siblings.remove(&cpu);
    if siblings.is_empty() {
        return check.pass("no sibling");
    }
    let Some(isolated_raw) = source.read("/sys/devices/system/cpu/isolated") else {
        return check.unknown("cannot read isolated");
    };
    let isolated = parse_cpu_list(&isolated_raw);
    for sibling in siblings {
        if !isolated.contains(&sibling) {
            return check.fail(format!("sibling CPU{sibling} not isolated"));
        }
    }
    check.pass("siblings all isolated")
}

fn cstates_capped(check: Check, source: &dyn DataSource) -> CheckResult {
    if let Some(cmdline) = source.read("/proc/cmdline") {
        if cmdline.contains("cpuidle.off=1") {
            return check.pass("cpuidle.off=1");
        }
        if cmdline.contains("intel_idle.max_cstate=1")
            || cmdline.contains("processor.max_cstate=1")
        {
            return check.pass("cmdline caps to C1");
        }
    }
    if let Some(value) = read_trimmed(source, "/sys/module/intel_idle/parameters/max_cstate") {
        if value == "1" || value == "0" {
            return check.pass(format!("intel_idle.max_cstate={value}"));
        }
        return check.fail(format!("intel_idle.max_cstate={value}"));
    }
    if let Some(value) = read_trimmed(source, "/sys/module/processor/parameters/max_cstate") {
        if value == "1" || value == "0" {
            return check.pass(format!("processor.max_cstate={value}"));
        }
        return check.fail(format!("processor.max_cstate={value}"));
    }
    check.unknown("no indicators")
}

fn turbo_disabled(check: Check, source: &dyn DataSource) -> CheckResult {
    if let Some(value) = read_trimmed(source, "/sys/devices/system/cpu/cpufreq/boost") {
        if value == "0" {
            return check.pass("cpufreq/boost=0");
        }
        if value == "1" {
            return check.fail("cpufreq/boost=1");
        }
    }
    if let Some(value) = read_trimmed(source, "/sys/devices/system/cpu/intel_pstate/no_turbo") {
        if value == "1" {
            return check.pass("intel_pstate/no_turbo=1");
        }
        if value == "0" {
            return check.fail("intel_pstate/no_turbo=0");
        }
    }
    check.unknown("no boost knobs")
}

fn nic_present(check: Check, ctx: &CheckContext, source: &dyn DataSource) -> CheckResult {
    let Some(nic) = &ctx.nic else {
        return check.unknown("no NIC in context");
    };
    if nic_exists(source, nic) {
        return check.pass("exists");
    }
    check.unknown("interface not found")
}

fn nic_link_up(check: Check, ctx: &CheckContext, source: &dyn DataSource) -> CheckResult {
    let Some(nic) = &ctx.nic else {
        return check.unknown("no NIC in context");
    };
    if !nic_exists(source, nic) {
        return check.unknown("NIC not found");
    }
    if let Some(operstate) = read_trimmed(source, &format!("/sys/class/net/{nic}/operstate")) {
        if operstate == "up" {
            return check.pass("operstate=up");
        }
        if !operstate.is_empty() {
            return check.fail(format!("operstate={operstate}"));
        }
    }
    if let Some(carrier) = read_trimmed(source, &format!("/sys/class/net/{nic}/carrier")) {
        if carrier == "1" {
            return check.pass("carrier=1");
        }
        if carrier == "0" {
            return check.fail("carrier=0");
        }
    }
    check.unknown("no operstate/carrier")
}

/// Default IPv4 route destination in `/proc/net/route`.
const V4_DEFAULT_DEST: &str = "00000000";

fn nic_quiet(check: Check, ctx: &CheckContext, source: &dyn DataSource) -> CheckResult {
    let Some(nic) = &ctx.nic else {
        return check.unknown("no NIC in context");
    };
    if !nic_exists(source, nic) {
        return check.unknown("NIC not found");
    }

    // IPv4 evidence comes from the route table: an address on the interface
    // shows up as a connected-subnet route, the default route as dest 0.
    let Some(routes) = source.read("/proc/net/route") else {
        return check.unknown("cannot read /proc/net/route");
    };
    let mut v4_routes = 0u32;
    let mut default_v4 = false;
    for line in routes.lines().skip(1) {
        let mut fields = line.split_whitespace();
        let (Some(iface), Some(dest)) = (fields.next(), fields.next()) else {
            continue;
        };
        if iface != nic {
            continue;
        }
        if dest == V4_DEFAULT_DEST {
            default_v4 = true;
        } else {
            v4_routes += 1;
        }
    }

    // `/proc/net/if_inet6` lists one row per IPv6 address; the interface
    // name is the last field. The file is absent when IPv6 is off.
    let v6_addrs = source
        .read("/proc/net/if_inet6")
        .map(|content| {
            content
                .lines()
                .filter(|line| line.split_whitespace().last() == Some(nic.as_str()))
                .count() as u32
        })
        .unwrap_or(0);

    let default_v6 = source
        .read("/proc/net/ipv6_route")
        .map(|content| {
            let zeros = "0".repeat(32);
            content.lines().any(|line| {
                let fields: Vec<&str> = line.split_whitespace().collect();
                fields.len() >= 10
                    && fields[0] == zeros
                    && (fields[1] == "00" || fields[1] == "0")
                    && fields.last() == Some(&nic.as_str())
            })
        })
        .unwrap_or(false);

    if v4_routes == 0 && v6_addrs == 0 && !default_v4 && !default_v6 {
        return check.pass("no addresses, no default route");
    }
    check.fail(format!(
        "v4_routes={v4_routes}, v6_addrs={v6_addrs}, def4={}, def6={}",
        if default_v4 { "yes" } else { "no" },
        if default_v6 { "yes" } else { "no" }
    ))
}

fn nic_irqs_pinned(check: Check, ctx: &CheckContext, source: &dyn DataSource) -> CheckResult {
    let Some(cpu) = ctx.cpu else {
        return check.unknown("no CPU subject");
    };
    let Some(nic) = &ctx.nic else {
        return check.unknown("no NIC in context");
    };
    if !nic_exists(source, nic) {
        return check.unknown("NIC not found");
    }
    let Some(content) = source.read("/proc/interrupts") else {
        return check.unknown("cannot read /proc/interrupts");
    };

    let mut nic_irqs: Vec<u32> = Vec::new();
    for line in content.lines() {
        if !line.contains(nic.as_str()) {
            continue;
        }
        let row = line.trim_start();
        if !row.starts_with(|c: char| c.is_ascii_digit()) {
            continue;
        }
        if let Some((irq, _)) = row.split_once(':') {
            if let Ok(irq) = irq.parse() {
                nic_irqs.push(irq);
            }
        }
    }
    if nic_irqs.is_empty() {
        return check.unknown("no NIC IRQs seen");
    }

    let mut stray: Vec<String> = Vec::new();
    for irq in &nic_irqs {
        let Some(list) = source.read(&format!("/proc/irq/{irq}/smp_affinity_list")) else {
            return check.unknown(format!("cannot read smp_affinity_list for IRQ {irq}"));
        };
        let cpus = parse_cpu_list(&list);
        if !(cpus.len() == 1 && cpus.contains(&cpu)) {
            stray.push(irq.to_string());
        }
    }
    if stray.is_empty() {
        return check.pass(format!("all pinned to CPU{cpu}"));
    }
    check.fail(format!("not pinned: {}", stray.join(",")))
}

fn rps_disabled(check: Check, ctx: &CheckContext, source: &dyn DataSource) -> CheckResult {
    let Some(nic) = &ctx.nic else {
        return check.unknown("no NIC in context");
    };
    if !nic_exists(source, nic) {
        return check.unknown("NIC not found");
    }

    let all_zero = |mask: &str| {
        mask.chars()
            .filter(|c| !matches!(c, ',' | '\n' | ' ' | '\t'))
            .all(|c| c == '0')
    };

    // No readdir through the data source: probe rx-0, rx-1, ... until the
    // first queue that does not exist.
    let mut checked = 0usize;
    let mut any_bad = false;
    for queue in 0..1024 {
        let path = format!("/sys/class/net/{nic}/queues/rx-{queue}/rps_cpus");
        let Some(mask) = source.read(&path) else {
            break;
        };
        if !all_zero(mask.trim()) {
            any_bad = true;
        }
        checked += 1;
    }
    if checked == 0 {
        return check.unknown("no rx queues visible");
    }
    if any_bad {
        return check.fail("non-zero masks present");
    }
    check.pass("all zero masks")
}
