//! Test parameters and the command-line surface.

use clap::Parser;

use crate::measurement::{last_logical_cpu, NANOS_PER_MICRO, RUN_INDEFINITELY};

/// Immutable configuration of one evaluation run. Periods and widths are in
/// nanoseconds internally; the CLI speaks microseconds.
#[derive(Debug, Clone)]
pub struct TestParams {
    /// `None` selects cyclic-only mode (no frames on the wire).
    pub nic: Option<String>,
    /// Iteration cap, or [`RUN_INDEFINITELY`].
    pub iterations: u64,
    /// Target wake-to-wake period.
    pub period_ns: u64,
    pub send_priority: i32,
    pub receive_priority: i32,
    pub send_cpu: usize,
    pub receive_cpu: usize,
    pub verbose: bool,
    /// Width of the first severity band; the rest double from it.
    pub bucket_width_ns: u64,
}

/// Evaluate a Linux host's fitness for hard-real-time EtherCAT motion
/// control: cyclic jitter measurement over raw sockets plus a kernel/CPU/NIC
/// configuration audit.
#[derive(Parser, Debug)]
#[command(name = "metronome", version)]
pub struct Cli {
    /// Network interface card name (default: cyclic-only mode)
    #[arg(short = 'n', long)]
    pub nic: Option<String>,

    /// Number of iterations (default: run indefinitely)
    #[arg(short = 'i', long)]
    pub iterations: Option<u64>,

    /// Target period in microseconds
    #[arg(short = 's', long = "send-sleep", default_value_t = 1000,
          value_parser = clap::value_parser!(u64).range(1..))]
    pub send_sleep: u64,

    /// Sender thread SCHED_FIFO priority
    #[arg(long = "send-priority", visible_alias = "sp", default_value_t = 42)]
    pub send_priority: i32,

    /// Receiver thread SCHED_FIFO priority
    #[arg(long = "receive-priority", visible_alias = "rp", default_value_t = 45)]
    pub receive_priority: i32,

    /// CPU core for the sender thread (default: last logical core)
    #[arg(long = "send-cpu", visible_alias = "sc")]
    pub send_cpu: Option<usize>,

    /// CPU core for the receiver thread (default: last logical core)
    #[arg(long = "receive-cpu", visible_alias = "rc")]
    pub receive_cpu: Option<usize>,

    /// Also report hardware/software timestamp deltas
    #[arg(short = 'v', long)]
    pub verbose: bool,

    /// Skip the system configuration audit
    #[arg(long = "no-config", visible_alias = "nc")]
    pub no_config: bool,

    /// Run the configuration audit only, then exit
    #[arg(long = "only-config", visible_alias = "oc", conflicts_with = "no_config")]
    pub only_config: bool,

    /// Bucket width in microseconds for the severity bands (default: period / 8)
    #[arg(short = 'b', long = "bucket-width",
          value_parser = clap::value_parser!(u64).range(1..))]
    pub bucket_width: Option<u64>,
}

impl Cli {
    pub fn to_params(&self) -> TestParams {
        let period_ns = self.send_sleep * NANOS_PER_MICRO;
        TestParams {
            nic: self.nic.clone(),
            iterations: self.iterations.unwrap_or(RUN_INDEFINITELY),
            period_ns,
            send_priority: self.send_priority,
            receive_priority: self.receive_priority,
            send_cpu: self.send_cpu.unwrap_or_else(last_logical_cpu),
            receive_cpu: self.receive_cpu.unwrap_or_else(last_logical_cpu),
            verbose: self.verbose,
            bucket_width_ns: self
                .bucket_width
                .map(|us| us * NANOS_PER_MICRO)
                .unwrap_or(period_ns / 8),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_the_documented_surface() {
        let cli = Cli::parse_from(["metronome"]);
        let params = cli.to_params();
        assert_eq!(params.nic, None);
        assert_eq!(params.iterations, RUN_INDEFINITELY);
        assert_eq!(params.period_ns, 1_000_000);
        assert_eq!(params.send_priority, 42);
        assert_eq!(params.receive_priority, 45);
        assert_eq!(params.send_cpu, last_logical_cpu());
        assert_eq!(params.bucket_width_ns, 125_000);
        assert!(!params.verbose);
    }

    #[test]
    fn explicit_bucket_width_is_converted_to_nanoseconds() {
        let cli = Cli::parse_from(["metronome", "-s", "2000", "-b", "50"]);
        let params = cli.to_params();
        assert_eq!(params.period_ns, 2_000_000);
        assert_eq!(params.bucket_width_ns, 50_000);
    }

    #[test]
    fn config_flags_are_mutually_exclusive() {
        assert!(Cli::try_parse_from(["metronome", "--no-config", "--only-config"]).is_err());
        assert!(Cli::try_parse_from(["metronome", "--nc"]).is_ok());
        assert!(Cli::try_parse_from(["metronome", "--oc"]).is_ok());
    }

    #[test]
    fn long_form_aliases_cover_the_multi_letter_shorts() {
        let cli = Cli::parse_from([
            "metronome", "--sp", "50", "--rp", "55", "--sc", "2", "--rc", "3",
        ]);
        assert_eq!(cli.send_priority, 50);
        assert_eq!(cli.receive_priority, 55);
        assert_eq!(cli.send_cpu, Some(2));
        assert_eq!(cli.receive_cpu, Some(3));
    }
}
