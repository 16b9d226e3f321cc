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

//! Worker lifecycle.
//!
//! The [`Coordinator`] walks a fixed sequence of phases:
//!
//! ```text
//! Setup ──► Active ──► Drain ──► Shutdown ──► Join withdrawals ──► Report
//! ```
//!
//! - **Setup**: validate the [`Config`] and build a zeroed [`Ledger`].
//! - **Active**: start the deposit, transfer and withdrawal pools.
//! - **Drain**: join deposits, then transfers.
//! - **Shutdown**: broadcast on every account so parked withdrawals give up.
//! - **Join withdrawals**: every withdrawal has either succeeded or been
//!   cancelled by now.
//! - **Report**: gather per-worker totals and final balances.

use crate::base::{Role, WorkerId};
use crate::config::Config;
use crate::ledger::Ledger;
use crate::report::Report;
use crate::worker::{self, DepositTotal, TransferTotal, WithdrawalTotal};
use crate::LedgerError;
use rand::SeedableRng;
use rand::rngs::StdRng;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use tracing::info;

/// A running worker and the handle its result comes back through.
struct Worker<T> {
    id: WorkerId,
    handle: JoinHandle<Result<T, LedgerError>>,
}

/// All workers of one role.
struct Pool<T> {
    role: Role,
    workers: Vec<Worker<T>>,
}

impl<T: Send + 'static> Pool<T> {
    /// Starts `count` threads, each running `body` against the shared ledger.
    ///
    /// # Errors
    ///
    /// - [`LedgerError::SpawnFailed`] - the OS refused a thread. Workers
    ///   already started keep running detached.
    fn spawn<F>(
        role: Role,
        count: usize,
        ledger: &Arc<Ledger>,
        body: F,
    ) -> Result<Self, LedgerError>
    where
        F: Fn(&Ledger, WorkerId) -> Result<T, LedgerError> + Clone + Send + 'static,
    {
        info!(%role, count, "creating threads");
        let mut workers = Vec::with_capacity(count);

        for index in 0..count {
            let id = WorkerId(index);
            let ledger = Arc::clone(ledger);
            let body = body.clone();

            let handle = thread::Builder::new()
                .name(format!("{role}-{index}"))
                .spawn(move || body(&*ledger, id))
                .map_err(|e| LedgerError::SpawnFailed {
                    role,
                    worker: id,
                    reason: e.to_string(),
                })?;

            workers.push(Worker { id, handle });
        }

        Ok(Self { role, workers })
    }

    /// Joins every worker in start order and collects their results.
    fn join(self) -> Result<Vec<T>, LedgerError> {
        let role = self.role;
        let mut results = Vec::with_capacity(self.workers.len());

        for worker in self.workers {
            let result = worker.handle.join().map_err(|_| LedgerError::WorkerPanicked {
                role,
                worker: worker.id,
            })?;
            results.push(result?);
        }

        Ok(results)
    }
}

/// Builds a worker's RNG, reproducible when the run is seeded.
fn worker_rng(seed: Option<u64>, role: Role, worker: WorkerId) -> StdRng {
    match seed {
        Some(seed) => {
            let stream = ((role as u64) << 32) | worker.0 as u64;
            StdRng::seed_from_u64(seed ^ stream.wrapping_mul(0x9E37_79B9_7F4A_7C15))
        }
        None => StdRng::from_entropy(),
    }
}

/// Owns the ledger and sequences the worker pools.
///
/// # Example
///
/// ```
/// use bank_sim::{Config, Coordinator};
/// use std::time::Duration;
///
/// let config = Config::default()
///     .with_threads(2)
///     .with_accounts(3)
///     .with_iterations(10)
///     .with_delay(Duration::ZERO);
///
/// let report = Coordinator::new(config).unwrap().run().unwrap();
/// assert!(report.is_conserved());
/// ```
pub struct Coordinator {
    config: Config,
    ledger: Arc<Ledger>,
}

impl Coordinator {
    /// Validates `config` and builds the ledger with every balance at zero.
    pub fn new(config: Config) -> Result<Self, LedgerError> {
        config.validate()?;

        let ledger = if config.audit_transfers {
            Ledger::with_transfer_log(config.accounts)
        } else {
            Ledger::new(config.accounts)
        };

        Ok(Self {
            config,
            ledger: Arc::new(ledger),
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn ledger(&self) -> &Arc<Ledger> {
        &self.ledger
    }

    /// Runs every phase to completion and returns the final report.
    ///
    /// On any error shutdown is still broadcast, so no withdrawal worker is
    /// left parked.
    pub fn run(self) -> Result<Report, LedgerError> {
        let result = self.run_phases();
        self.release_on_error(result)
    }

    /// Broadcasts shutdown when `result` failed.
    fn release_on_error<T>(&self, result: Result<T, LedgerError>) -> Result<T, LedgerError> {
        if result.is_err() {
            self.ledger.begin_shutdown();
        }
        result
    }

    fn run_phases(&self) -> Result<Report, LedgerError> {
        let Config {
            deposit_workers,
            transfer_workers,
            withdrawal_workers,
            iterations,
            delay,
            seed,
            ..
        } = self.config;

        info!(
            accounts = self.ledger.len(),
            deposit_workers,
            transfer_workers,
            withdrawal_workers,
            iterations,
            ?delay,
            ?seed,
            "starting workers"
        );

        let deposits = Pool::spawn(
            Role::Deposit,
            deposit_workers,
            &self.ledger,
            move |ledger, id| {
                let mut rng = worker_rng(seed, Role::Deposit, id);
                worker::run_deposits(ledger, id, &mut rng, iterations, delay)
            },
        )?;
        let transfers = Pool::spawn(
            Role::Transfer,
            transfer_workers,
            &self.ledger,
            move |ledger, id| {
                let mut rng = worker_rng(seed, Role::Transfer, id);
                worker::run_transfers(ledger, id, &mut rng, iterations, delay)
            },
        )?;
        let withdrawals = Pool::spawn(
            Role::Withdrawal,
            withdrawal_workers,
            &self.ledger,
            move |ledger, id| {
                let mut rng = worker_rng(seed, Role::Withdrawal, id);
                worker::run_withdrawal(ledger, id, &mut rng, delay)
            },
        )?;

        let deposits: Vec<DepositTotal> = deposits.join()?;
        let transfers: Vec<TransferTotal> = transfers.join()?;
        info!("deposits and transfers finished");

        self.ledger.begin_shutdown();
        info!("shutdown broadcast sent");

        let withdrawals: Vec<WithdrawalTotal> = withdrawals.join()?;

        let report = Report {
            deposits,
            transfers,
            withdrawals,
            balances: self.ledger.balances(),
            transfer_log: self.ledger.take_transfer_log(),
        };
        report.log_summary();
        Ok(report)
    }
}
