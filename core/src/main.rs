// Copyright 2025 The Ring Mixer Authors
// Licensed under the Apache License, Version 2.0

//! Ring mixer benchmark
//!
//! Fills and drains rings against the in-process ledger and writes per-position
//! time / cost means to the configured output file.
//!
//! Usage:
//!   cargo run --package mixer-core --bin mixer-bench -- --config ./mixer.toml

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use log::{error, info};
use mixer_config::MixerConfig;
use mixer_core::bench::report::{save_raw, save_record};
use mixer_core::bench::{BenchmarkOrchestrator, BenchmarkParams, BenchmarkReport};
use mixer_core::ledger::{LocalLedger, RingLedger, reject_identity};
use mixer_core::signer::{AnySigner, verifier_for};

#[tokio::main]
async fn main() -> Result<()> {
    let args: Vec<String> = std::env::args().collect();

    let mut config_path: Option<PathBuf> = None;
    let mut output: Option<String> = None;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--config" | "-c" => {
                i += 1;
                if i < args.len() {
                    config_path = Some(PathBuf::from(&args[i]));
                }
            }
            "--output" | "-o" => {
                i += 1;
                if i < args.len() {
                    output = Some(args[i].clone());
                }
            }
            "--sample-config" => {
                print!("{}", MixerConfig::generate_sample());
                return Ok(());
            }
            "--help" | "-h" => {
                print_help();
                return Ok(());
            }
            _ => {
                eprintln!("Unknown argument: {}", args[i]);
                print_help();
                std::process::exit(1);
            }
        }
        i += 1;
    }

    env_logger::init();

    let mut config = match &config_path {
        Some(path) => MixerConfig::load_from(path)?,
        None => MixerConfig::load()?,
    };
    if let Some(output) = output {
        config.benchmark.output_path = output;
    }

    let signer = AnySigner::from_config(&config.signer);
    let ledger = LocalLedger::new(RingLedger::new(
        config.protocol.ring_size,
        Arc::new(reject_identity),
        verifier_for(signer.as_ref()),
    ));

    let params = BenchmarkParams::from_config(&config);
    info!(
        "Benchmarking rings of {} ({} trials, {} control trials)",
        params.ring_size, params.trials, params.control_trials
    );

    let mut orchestrator = BenchmarkOrchestrator::new(ledger, signer, params);
    let report = orchestrator.run().await.context("Benchmark run failed")?;

    print_summary(&report);
    persist(Path::new(&config.benchmark.output_path), &report)
}

fn persist(output: &Path, report: &BenchmarkReport) -> Result<()> {
    match report.record() {
        Ok(record) => save_record(output, &record),
        Err(e) => {
            error!("Aggregation failed: {e}");
            let raw = save_raw(output, report)?;
            println!("Aggregation failed ({e}); raw samples kept at {}", raw.display());
            Ok(())
        }
    }
}

fn print_summary(report: &BenchmarkReport) {
    println!("Ring Mixer Benchmark");
    println!("====================");
    println!("Ring size: {}", report.ring_size);
    println!();

    if let Some(avg) = report.control_deposit {
        println!("Benchmark deposit (control):");
        println!("  Average time: {}us", avg.time);
        println!("  Average cost: {}", avg.cost);
    }
    if let Some(avg) = report.control_withdraw {
        println!("Benchmark withdrawal (control):");
        println!("  Average time: {}us", avg.time);
        println!("  Average cost: {}", avg.cost);
    }

    if !report.signer_available {
        println!();
        println!("Signer unavailable: deposit and withdrawal trials skipped.");
        return;
    }

    if let Some(b) = report.deposit_breakdown() {
        println!();
        println!(
            "Deposits ({} total, {} trials aborted):",
            b.total_deposits, report.aborted_deposit_trials
        );
        println!(
            "  First (ring creation): {}us, cost {}",
            b.first.time, b.first.cost
        );
        if let Some(mid) = b.interior {
            println!("  Interior:              {}us, cost {}", mid.time, mid.cost);
        }
        println!("  Last (ring ready):     {}us, cost {}", b.last.time, b.last.cost);
    }

    if let Some(w) = report.withdrawal_summary() {
        println!();
        println!(
            "Withdrawals ({} total, {} trials aborted):",
            w.total_withdrawals, report.aborted_withdraw_trials
        );
        println!("  Average: {}us, cost {}", w.average.time, w.average.cost);
    }
}

fn print_help() {
    println!("Ring Mixer Benchmark");
    println!();
    println!("USAGE:");
    println!("    mixer-bench [OPTIONS]");
    println!();
    println!("OPTIONS:");
    println!("    -c, --config <PATH>    Config file (default: MIXER_CONFIG, ./mixer.toml, ~/.mixer/mixer.toml)");
    println!("    -o, --output <PATH>    Result file (default: benchmark.json)");
    println!("        --sample-config    Print a sample config and exit");
    println!("    -h, --help             Print help information");
    println!();
    println!("ENVIRONMENT:");
    println!("    RUST_LOG               Log filter, e.g. info or mixer_core=debug");
    println!("    MIXER_SIGNER           orbital | mock");
    println!("    MIXER_TRIALS           Trials per phase");
}
