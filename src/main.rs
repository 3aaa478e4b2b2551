//! Command-line entry point: audit first, then the measurement threads.

use std::process::ExitCode;
use std::thread;
use std::time::Instant;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use metronome::config::{Cli, TestParams};
use metronome::measurement::{run_receiver, run_sender, Probe, NANOS_PER_MICRO, RUN_INDEFINITELY};
use metronome::net::{NicProbe, VerboseReports};
use metronome::output::{format_hms_ns, live_report_loop, print_final, Table};
use metronome::preflight::{print_audit, FsSource};
use metronome::runtime;
use metronome::statistics::{ReportSlot, TimerReport};

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(error) => {
            let _ = error.print();
            return match error.kind() {
                clap::error::ErrorKind::DisplayHelp | clap::error::ErrorKind::DisplayVersion => {
                    ExitCode::SUCCESS
                }
                _ => ExitCode::from(1),
            };
        }
    };

    if !runtime::effective_uid_is_root() {
        eprintln!("error: not running as root; raw sockets, SCHED_FIFO and memory locking require euid 0");
        return ExitCode::from(1);
    }

    let params = cli.to_params();

    if !cli.no_config {
        print_audit(params.send_cpu, params.nic.as_deref(), &FsSource);
    }
    if cli.only_config {
        return ExitCode::SUCCESS;
    }

    if let Err(error) = runtime::lock_process_memory() {
        eprintln!("error: {error}");
        return ExitCode::from(1);
    }
    let _latency_target = runtime::LatencyTarget::acquire();
    runtime::install_signal_handler();

    if params.iterations != RUN_INDEFINITELY {
        println!(
            "Estimated run time: {}",
            format_hms_ns(params.iterations.saturating_mul(params.period_ns))
        );
    }
    println!("Target period: {} us\n", params.period_ns / NANOS_PER_MICRO);

    runtime::write_trace_marker("metronome: measurement start");
    let outcome = run_test(&params);
    runtime::write_trace_marker("metronome: measurement end");
    outcome
}

fn run_test(params: &TestParams) -> ExitCode {
    match &params.nic {
        None => run_cyclic_only(params),
        Some(nic) => run_nic_exchange(params, nic),
    }
}

fn run_cyclic_only(params: &TestParams) -> ExitCode {
    let table = Table::new(params.bucket_width_ns);
    let cyclic = ReportSlot::new(
        "Cyclic",
        TimerReport::new(params.period_ns, params.bucket_width_ns),
    );
    let rows = [&cyclic];
    let running = runtime::running();
    let start = Instant::now();

    let mut failed = false;
    let mut live_lines = 0usize;
    thread::scope(|scope| {
        let sender = scope.spawn(|| run_sender(running, params, Probe::Idle, &cyclic));
        let reporter = scope.spawn(|| live_report_loop(&table, &rows, start));

        failed = sender.join().map_or(true, |result| result.is_err());
        runtime::request_stop();
        runtime::stop_live_report();
        live_lines = reporter.join().unwrap_or(0);
    });

    print_final(&table, &rows, start, live_lines);
    if failed {
        ExitCode::from(1)
    } else {
        ExitCode::SUCCESS
    }
}

fn run_nic_exchange(params: &TestParams, nic: &str) -> ExitCode {
    let table = Table::new(params.bucket_width_ns);
    let report = || TimerReport::new(params.period_ns, params.bucket_width_ns);
    let sender_slot = ReportSlot::new("Sender", report());
    let receiver_slot = ReportSlot::new("Receiver", report());
    let hardware_slot = ReportSlot::new("HW delta", report());
    let software_slot = ReportSlot::new("SW delta", report());

    let verbose = params.verbose.then(|| VerboseReports {
        hardware: &hardware_slot,
        software: &software_slot,
    });
    let probe = match NicProbe::open(nic, verbose) {
        Ok(probe) => probe,
        Err(error) => {
            eprintln!("error: {error}");
            return ExitCode::from(1);
        }
    };

    let mut rows: Vec<&ReportSlot> = vec![&sender_slot, &receiver_slot];
    if params.verbose {
        rows.push(&hardware_slot);
        rows.push(&software_slot);
    }
    let running = runtime::running();
    let start = Instant::now();

    let mut failed = false;
    let mut live_lines = 0usize;
    thread::scope(|scope| {
        let receiver = scope.spawn(|| run_receiver(running, params, &probe, &receiver_slot));
        let sender = scope.spawn(|| run_sender(running, params, Probe::Nic(&probe), &sender_slot));
        let reporter = scope.spawn(|| live_report_loop(&table, &rows, start));

        // The receiver finishing (or failing) ends the exchange; the sender
        // notices the cleared flag at its next loop head.
        let receive_failed = receiver.join().map_or(true, |result| result.is_err());
        runtime::request_stop();
        let send_failed = sender.join().map_or(true, |result| result.is_err());
        runtime::stop_live_report();
        live_lines = reporter.join().unwrap_or(0);
        failed = receive_failed || send_failed;
    });

    print_final(&table, &rows, start, live_lines);
    if failed {
        ExitCode::from(1)
    } else {
        ExitCode::SUCCESS
    }
}
