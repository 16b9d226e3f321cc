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

//! # Bank Simulation
//!
//! This library models a shared bank ledger mutated concurrently by three
//! pools of threads: depositors, transferors and withdrawers.
//!
//! ## Core Components
//!
//! - [`Ledger`]: Accounts, each with its own lock and `withdraw_ready` condition
//! - [`Account`]: One independently lockable balance
//! - [`Coordinator`]: Starts the pools, sequences their lifetimes, gathers totals
//! - [`Report`]: Per-worker totals and final balances
//! - [`LedgerError`]: Error types for configuration and worker failures
//!
//! ## Example
//!
//! ```
//! use bank_sim::{Config, Coordinator};
//! use std::time::Duration;
//!
//! let config = Config::default()
//!     .with_threads(3)
//!     .with_accounts(5)
//!     .with_iterations(20)
//!     .with_delay(Duration::ZERO)
//!     .with_audit_transfers(true);
//!
//! let report = Coordinator::new(config).unwrap().run().unwrap();
//!
//! assert!(report.is_conserved());
//! assert!(report.balances.iter().all(|&balance| balance >= 0));
//! assert!(report.transfer_log.iter().all(|t| t.is_balanced()));
//! ```
//!
//! ## Thread Safety
//!
//! Every balance sits behind its own mutex. Transfers take two locks, always
//! lowest account index first, so concurrent transfers cannot deadlock.
//! Withdrawals block on a condition variable until funded or until the
//! coordinator broadcasts shutdown.

pub mod account;
mod base;
mod config;
mod coordinator;
pub mod error;
mod ledger;
mod report;
mod transfer_log;
pub mod worker;

pub use account::Account;
pub use base::{AccountId, Role, WorkerId};
pub use config::Config;
pub use coordinator::Coordinator;
pub use error::LedgerError;
pub use ledger::{Ledger, WithdrawalOutcome};
pub use report::{Report, write_csv};
pub use transfer_log::{TransferLog, TransferRecord};
pub use worker::{DepositTotal, MAX_AMOUNT, TransferTotal, WithdrawalTotal};
