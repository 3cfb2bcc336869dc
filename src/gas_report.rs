use anyhow::{Context, Result};
use chrono::{DateTime, SecondsFormat, Utc};
use ethers::types::TransactionReceipt;
use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::path::Path;
use std::sync::{Mutex, MutexGuard};
use tracing::info;

/// Collects gas used per contract method and renders a plain-text table.
#[derive(Debug, Default)]
pub struct GasReporter {
    enabled: bool,
    samples: Mutex<BTreeMap<(String, String), Vec<u64>>>,
}

impl GasReporter {
    pub fn new(enabled: bool) -> Self {
        Self {
            enabled,
            samples: Mutex::new(BTreeMap::new()),
        }
    }

    pub fn record(&self, contract: &str, method: &str, gas_used: u64) {
        if !self.enabled {
            return;
        }
        self.samples()
            .entry((contract.to_string(), method.to_string()))
            .or_default()
            .push(gas_used);
    }

    pub fn record_receipt(&self, contract: &str, method: &str, receipt: &TransactionReceipt) {
        if let Some(gas) = receipt.gas_used {
            self.record(contract, method, gas.low_u64());
        }
    }

    fn render_at(&self, generated_at: DateTime<Utc>) -> String {
        render_samples(&self.samples(), generated_at)
    }

    fn samples(&self) -> MutexGuard<'_, BTreeMap<(String, String), Vec<u64>>> {
        match self.samples.lock() {
            Ok(samples) => samples,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    /// Writes the report when enabled; does nothing otherwise. Holds the
    /// sample lock until the file is on disk.
    pub fn write(&self, path: &Path) -> Result<()> {
        if !self.enabled {
            return Ok(());
        }
        let samples = self.samples();
        std::fs::write(path, render_samples(&samples, Utc::now()))
            .with_context(|| format!("write gas report {}", path.display()))?;
        info!("Gas report written to {}", path.display());
        Ok(())
    }
}

fn render_samples(
    samples: &BTreeMap<(String, String), Vec<u64>>,
    generated_at: DateTime<Utc>,
) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "Gas report ({})",
        generated_at.to_rfc3339_opts(SecondsFormat::Secs, true)
    );
    let _ = writeln!(
        out,
        "{:<24} {:<24} {:>6} {:>10} {:>10} {:>10}",
        "Contract", "Method", "Calls", "Min", "Max", "Avg"
    );
    let _ = writeln!(out, "{}", "-".repeat(89));

    for ((contract, method), gas) in samples {
        let min = gas.iter().min().copied().unwrap_or_default();
        let max = gas.iter().max().copied().unwrap_or_default();
        let avg = gas.iter().sum::<u64>() / gas.len().max(1) as u64;
        let _ = writeln!(
            out,
            "{:<24} {:<24} {:>6} {:>10} {:>10} {:>10}",
            contract,
            method,
            gas.len(),
            min,
            max,
            avg
        );
    }
    out
}
