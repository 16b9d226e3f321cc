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

//! The three worker kinds.
//!
//! Each worker draws its random choices from the [`Rng`] it is handed and
//! applies them through the [`Ledger`]. Accumulators are plain locals
//! returned by value, so the coordinator reads them only after join.

use crate::base::{AccountId, WorkerId};
use crate::ledger::{Ledger, WithdrawalOutcome};
use crate::LedgerError;
use rand::Rng;
use std::time::Duration;
use tracing::debug;

/// Exclusive upper bound of a deposit or withdrawal amount.
pub const MAX_AMOUNT: i64 = 20;

/// Net amount a deposit worker added.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DepositTotal {
    pub worker: WorkerId,
    pub deposited: i64,
}

/// Transfers performed by one transfer worker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransferTotal {
    pub worker: WorkerId,
    pub transfers: usize,
    pub moved: i64,
}

/// The single withdrawal a withdrawal worker attempted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WithdrawalTotal {
    pub worker: WorkerId,
    pub account: AccountId,
    pub requested: i64,
    pub outcome: WithdrawalOutcome,
}

impl WithdrawalTotal {
    pub fn withdrawn(&self) -> i64 {
        self.outcome.amount()
    }
}

fn random_account<R: Rng>(rng: &mut R, ledger: &Ledger) -> AccountId {
    AccountId(rng.gen_range(0..ledger.len()))
}

fn require_accounts(ledger: &Ledger, needed: usize, work: &str) -> Result<(), LedgerError> {
    if ledger.len() < needed {
        return Err(LedgerError::InvalidConfig(format!(
            "{work} need {needed} or more accounts, got {}",
            ledger.len()
        )));
    }
    Ok(())
}

/// Runs `iterations` random deposits.
///
/// # Errors
///
/// - [`LedgerError::InvalidConfig`] - the ledger has no accounts.
pub fn run_deposits<R: Rng>(
    ledger: &Ledger,
    worker: WorkerId,
    rng: &mut R,
    iterations: usize,
    delay: Duration,
) -> Result<DepositTotal, LedgerError> {
    require_accounts(ledger, 1, "deposits")?;
    let mut deposited = 0;

    for _ in 0..iterations {
        let amount = rng.gen_range(0..MAX_AMOUNT);
        let account = random_account(rng, ledger);

        debug!(%worker, amount, %account, "depositing");
        ledger.deposit(account, amount, delay)?;
        deposited += amount;
    }

    Ok(DepositTotal { worker, deposited })
}

/// Runs `iterations` transfers between random distinct accounts.
///
/// # Errors
///
/// - [`LedgerError::InvalidConfig`] - the ledger has fewer than two accounts.
pub fn run_transfers<R: Rng>(
    ledger: &Ledger,
    worker: WorkerId,
    rng: &mut R,
    iterations: usize,
    delay: Duration,
) -> Result<TransferTotal, LedgerError> {
    require_accounts(ledger, 2, "transfers")?;

    let mut total = TransferTotal {
        worker,
        transfers: 0,
        moved: 0,
    };

    for _ in 0..iterations {
        let from = random_account(rng, ledger);
        let mut to = random_account(rng, ledger);
        while to == from {
            to = random_account(rng, ledger);
        }

        let moved = ledger.transfer(from, to, delay, |balance| rng.gen_range(0..balance))?;
        debug!(%worker, amount = moved, %from, %to, "transferred");

        total.transfers += 1;
        total.moved += moved;
    }

    Ok(total)
}

/// Picks one account and amount, then waits for the funds or for shutdown.
///
/// # Errors
///
/// - [`LedgerError::InvalidConfig`] - the ledger has no accounts.
pub fn run_withdrawal<R: Rng>(
    ledger: &Ledger,
    worker: WorkerId,
    rng: &mut R,
    delay: Duration,
) -> Result<WithdrawalTotal, LedgerError> {
    require_accounts(ledger, 1, "withdrawals")?;
    let requested = rng.gen_range(0..MAX_AMOUNT);
    let account = random_account(rng, ledger);

    let outcome = ledger.withdraw_when_funded(account, requested, delay)?;
    if let WithdrawalOutcome::Withdrawn(amount) = outcome {
        debug!(%worker, amount, %account, "withdrew");
    }

    Ok(WithdrawalTotal {
        worker,
        account,
        requested,
        outcome,
    })
}
