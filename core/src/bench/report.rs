//! Benchmark report and result persistence.
//!
//! The persisted record keeps the shape downstream tooling reads:
//!
//! ```text
//! { "deposit":  { "time": [..], "cost": [..] },
//!   "withdraw": { "time": [..], "cost": [..] } }
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use log::info;
use serde::{Deserialize, Serialize};

use super::sample::{Average, BenchmarkMatrix, ColumnAnalysis};
use crate::stats;

/// Per-position means, the file written to `output_path`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BenchmarkRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deposit: Option<ColumnAnalysis>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub withdraw: Option<ColumnAnalysis>,
}

/// Ring creation, sealing and in-between deposits, averaged over all trials
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DepositBreakdown {
    pub first: Average,
    pub last: Average,
    /// `None` for rings of two
    pub interior: Option<Average>,
    pub total_deposits: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WithdrawalSummary {
    pub average: Average,
    pub total_withdrawals: usize,
}

/// Everything one orchestrator run measured
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BenchmarkReport {
    pub ring_size: usize,
    pub control_deposit: Option<Average>,
    pub control_withdraw: Option<Average>,
    pub deposits: BenchmarkMatrix,
    pub withdrawals: BenchmarkMatrix,
    pub aborted_deposit_trials: usize,
    pub aborted_withdraw_trials: usize,
    /// False if signer-dependent trials were skipped
    pub signer_available: bool,
}

impl BenchmarkReport {
    /// Column means per phase; phases with no completed trial are omitted.
    pub fn record(&self) -> stats::Result<BenchmarkRecord> {
        let analyse = |m: &BenchmarkMatrix| {
            if m.is_empty() {
                Ok(None)
            } else {
                m.column_analysis().map(Some)
            }
        };
        Ok(BenchmarkRecord {
            deposit: analyse(&self.deposits)?,
            withdraw: analyse(&self.withdrawals)?,
        })
    }

    pub fn deposit_breakdown(&self) -> Option<DepositBreakdown> {
        let views = self.deposits.views();
        Some(DepositBreakdown {
            first: Average::of(views.first).ok()?,
            last: Average::of(views.last).ok()?,
            interior: Average::of(views.interior).ok(),
            total_deposits: self.deposits.sample_count(),
        })
    }

    pub fn withdrawal_summary(&self) -> Option<WithdrawalSummary> {
        Some(WithdrawalSummary {
            average: Average::of(self.withdrawals.samples()).ok()?,
            total_withdrawals: self.withdrawals.sample_count(),
        })
    }
}

/// `<output>.raw.json`
pub fn raw_path(output: &Path) -> PathBuf {
    let mut name = output.as_os_str().to_owned();
    name.push(".raw.json");
    PathBuf::from(name)
}

fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    let json = serde_json::to_string_pretty(value).context("Failed to serialize results")?;
    fs::write(path, json).with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(())
}

pub fn save_record(path: &Path, record: &BenchmarkRecord) -> Result<()> {
    write_json(path, record)?;
    info!("Benchmark statistics saved to {}", path.display());
    Ok(())
}

/// Keep the unaggregated samples when the record cannot be built
pub fn save_raw(output: &Path, report: &BenchmarkReport) -> Result<PathBuf> {
    let path = raw_path(output);
    write_json(&path, report)?;
    info!("Raw samples saved to {}", path.display());
    Ok(path)
}

pub fn load_record(path: &Path) -> Result<BenchmarkRecord> {
    let content =
        fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))?;
    serde_json::from_str(&content).with_context(|| format!("Failed to parse {}", path.display()))
}
