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

//! Run configuration consumed by the [`Coordinator`](crate::Coordinator).

use crate::LedgerError;
use std::time::Duration;

/// Sizes of the worker pools and the ledger, plus the simulated delay.
///
/// # Example
///
/// ```
/// use bank_sim::Config;
/// use std::time::Duration;
///
/// let config = Config::default()
///     .with_threads(2)
///     .with_accounts(4)
///     .with_delay(Duration::ZERO)
///     .with_seed(7);
/// assert!(config.validate().is_ok());
/// assert_eq!(config.transfer_workers, 2);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub deposit_workers: usize,
    pub transfer_workers: usize,
    pub withdrawal_workers: usize,
    pub accounts: usize,
    /// Operations per deposit and per transfer worker.
    pub iterations: usize,
    /// Pause taken inside each critical section; zero disables it.
    pub delay: Duration,
    /// Seeds every worker's RNG when set.
    pub seed: Option<u64>,
    /// Record every applied transfer in a [`TransferLog`](crate::TransferLog).
    pub audit_transfers: bool,
}

impl Config {
    pub const DEFAULT_THREADS: usize = 5;
    pub const DEFAULT_ACCOUNTS: usize = 10;
    pub const DEFAULT_ITERATIONS: usize = 100;
    pub const DEFAULT_DELAY: Duration = Duration::from_micros(10);

    /// Sets every pool to the same size.
    pub fn with_threads(mut self, threads: usize) -> Self {
        self.deposit_workers = threads;
        self.transfer_workers = threads;
        self.withdrawal_workers = threads;
        self
    }

    pub fn with_deposit_workers(mut self, workers: usize) -> Self {
        self.deposit_workers = workers;
        self
    }

    pub fn with_transfer_workers(mut self, workers: usize) -> Self {
        self.transfer_workers = workers;
        self
    }

    pub fn with_withdrawal_workers(mut self, workers: usize) -> Self {
        self.withdrawal_workers = workers;
        self
    }

    pub fn with_accounts(mut self, accounts: usize) -> Self {
        self.accounts = accounts;
        self
    }

    pub fn with_iterations(mut self, iterations: usize) -> Self {
        self.iterations = iterations;
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn with_audit_transfers(mut self, audit: bool) -> Self {
        self.audit_transfers = audit;
        self
    }

    /// Checks the configuration before any thread is started.
    ///
    /// # Errors
    ///
    /// - [`LedgerError::InvalidConfig`] - no accounts, or transfer workers with
    ///   fewer than two accounts to move funds between.
    pub fn validate(&self) -> Result<(), LedgerError> {
        if self.accounts == 0 {
            return Err(LedgerError::InvalidConfig(
                "number of accounts must be positive".into(),
            ));
        }
        if self.transfer_workers > 0 && self.accounts < 2 {
            return Err(LedgerError::InvalidConfig(format!(
                "transfers need at least 2 accounts, got {}",
                self.accounts
            )));
        }
        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            deposit_workers: Self::DEFAULT_THREADS,
            transfer_workers: Self::DEFAULT_THREADS,
            withdrawal_workers: Self::DEFAULT_THREADS,
            accounts: Self::DEFAULT_ACCOUNTS,
            iterations: Self::DEFAULT_ITERATIONS,
            delay: Self::DEFAULT_DELAY,
            seed: None,
            audit_transfers: false,
        }
    }
}
