// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2025 Daniel Negri
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
// GNU Affero General Public License for more details.
//
// You should have received a copy of the GNU Affero General Public License
// along with this program. If not, see <https://www.gnu.org/licenses/>.

use bank_sim::{Config, Coordinator, write_csv};
use clap::Parser;
use std::process;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

/// Bank Simulation - Concurrent deposits, transfers and withdrawals
///
/// Runs the three worker pools against a shared ledger and writes the
/// per-thread totals and final account balances to stdout as CSV.
#[derive(Parser, Debug)]
#[command(name = "bank-sim")]
#[command(about = "Concurrent bank ledger simulation", long_about = None)]
struct Args {
    /// Worker threads per pool
    #[arg(short = 't', long, default_value_t = Config::DEFAULT_THREADS)]
    threads: usize,

    /// Deposit threads (overrides --threads)
    #[arg(long)]
    deposit_threads: Option<usize>,

    /// Transfer threads (overrides --threads)
    #[arg(long)]
    transfer_threads: Option<usize>,

    /// Withdrawal threads (overrides --threads)
    #[arg(long)]
    withdrawal_threads: Option<usize>,

    /// Number of accounts
    #[arg(short = 'a', long, default_value_t = Config::DEFAULT_ACCOUNTS)]
    accounts: usize,

    /// Operations per deposit and transfer thread
    #[arg(short = 'i', long, default_value_t = Config::DEFAULT_ITERATIONS)]
    iterations: usize,

    /// Delay inside each critical section, in microseconds
    #[arg(short = 'd', long, default_value_t = 10)]
    delay: u64,

    /// Random seed for reproducible choices. When omitted, entropy is used.
    #[arg(long)]
    seed: Option<u64>,

    /// Record every transfer and check that each debit matches its credit
    #[arg(long)]
    audit: bool,
}

impl Args {
    fn into_config(self) -> Config {
        let mut config = Config::default()
            .with_threads(self.threads)
            .with_accounts(self.accounts)
            .with_iterations(self.iterations)
            .with_delay(Duration::from_micros(self.delay))
            .with_audit_transfers(self.audit);

        if let Some(workers) = self.deposit_threads {
            config = config.with_deposit_workers(workers);
        }
        if let Some(workers) = self.transfer_threads {
            config = config.with_transfer_workers(workers);
        }
        if let Some(workers) = self.withdrawal_threads {
            config = config.with_withdrawal_workers(workers);
        }
        if let Some(seed) = self.seed {
            config = config.with_seed(seed);
        }
        config
    }
}

fn main() {
    // Logs go to stderr so stdout carries only the CSV report
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("warn,bank_sim=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let config = Args::parse().into_config();

    let coordinator = match Coordinator::new(config) {
        Ok(coordinator) => coordinator,
        Err(e) => {
            eprintln!("Error: {}", e);
            process::exit(1);
        }
    };

    let report = match coordinator.run() {
        Ok(report) => report,
        Err(e) => {
            eprintln!("Error: {}", e);
            process::exit(1);
        }
    };

    let unbalanced = report
        .transfer_log
        .iter()
        .filter(|t| !t.is_balanced())
        .count();
    if unbalanced > 0 {
        eprintln!("Error: {} transfers did not balance", unbalanced);
        process::exit(1);
    }

    if let Err(e) = write_csv(&report, std::io::stdout()) {
        eprintln!("Error writing output: {}", e);
        process::exit(1);
    }
}
