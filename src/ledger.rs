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

//! The shared ledger.
//!
//! The [`Ledger`] owns every account balance. Each account is a separate
//! lockable cell, so workers touching different accounts never contend.
//!
//! # Locking discipline
//!
//! - A balance is read or written only while its own lock is held.
//! - The only operation that holds two locks is [`Ledger::transfer`]. It
//!   acquires them through [`Ledger::lock_pair`], which always locks the lower
//!   [`AccountId`] first. With a single total order no cycle can form.
//! - [`Ledger::withdraw_when_funded`] parks on the account's condition while
//!   holding nothing else, and re-checks funds and then shutdown after every
//!   wake.
//!
//! # Example
//!
//! ```
//! use bank_sim::{AccountId, Ledger, WithdrawalOutcome};
//! use std::time::Duration;
//!
//! let ledger = Ledger::new(2);
//! ledger.deposit(AccountId(0), 15, Duration::ZERO).unwrap();
//! ledger.transfer(AccountId(0), AccountId(1), Duration::ZERO, |_| 5).unwrap();
//!
//! let outcome = ledger
//!     .withdraw_when_funded(AccountId(1), 5, Duration::ZERO)
//!     .unwrap();
//! assert_eq!(outcome, WithdrawalOutcome::Withdrawn(5));
//! assert_eq!(ledger.balances(), vec![10, 0]);
//! ```

use crate::account::{Account, assert_invariants};
use crate::base::AccountId;
use crate::transfer_log::{TransferLog, TransferRecord};
use crate::LedgerError;
use crossbeam::utils::CachePadded;
use parking_lot::MutexGuard;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::Duration;
use tracing::debug;

/// How a wait-then-withdraw ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WithdrawalOutcome {
    /// Funds arrived and the amount was debited exactly once.
    Withdrawn(i64),
    /// Shutdown was broadcast before the balance covered the amount.
    Cancelled,
}

impl WithdrawalOutcome {
    /// Amount actually taken from the account.
    pub fn amount(&self) -> i64 {
        match self {
            WithdrawalOutcome::Withdrawn(amount) => *amount,
            WithdrawalOutcome::Cancelled => 0,
        }
    }
}

/// Shared array of accounts plus the shutdown flag.
///
/// # Invariants
///
/// - The sum of all balances equals deposits applied minus withdrawals applied.
/// - Transfers are zero-sum.
/// - No operation drives a balance below zero.
#[derive(Debug)]
pub struct Ledger {
    /// Padded so neighbouring account locks do not share a cache line.
    accounts: Vec<CachePadded<Account>>,
    shutting_down: AtomicBool,
    transfer_log: Option<TransferLog>,
}

impl Ledger {
    /// Creates a ledger of `accounts` accounts, all at zero.
    pub fn new(accounts: usize) -> Self {
        Self {
            accounts: (0..accounts)
                .map(|_| CachePadded::new(Account::new()))
                .collect(),
            shutting_down: AtomicBool::new(false),
            transfer_log: None,
        }
    }

    /// Creates a ledger that records every applied transfer.
    pub fn with_transfer_log(accounts: usize) -> Self {
        Self {
            transfer_log: Some(TransferLog::new()),
            ..Self::new(accounts)
        }
    }

    pub fn len(&self) -> usize {
        self.accounts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.accounts.is_empty()
    }

    fn account(&self, id: AccountId) -> Result<&Account, LedgerError> {
        self.accounts
            .get(id.0)
            .map(|account| &**account)
            .ok_or(LedgerError::AccountOutOfRange {
                account: id,
                accounts: self.accounts.len(),
            })
    }

    /// Reads one balance under its lock.
    pub fn balance(&self, id: AccountId) -> Result<i64, LedgerError> {
        Ok(self.account(id)?.balance())
    }

    /// Reads every balance, one lock at a time.
    ///
    /// This is not a consistent snapshot while workers are running; it is
    /// exact once they have all been joined.
    pub fn balances(&self) -> Vec<i64> {
        self.accounts.iter().map(|account| account.balance()).collect()
    }

    /// Sum of [`balances`](Self::balances).
    pub fn total(&self) -> i64 {
        self.balances().iter().sum()
    }

    /// Acquires a single account's lock.
    ///
    /// Callers that change the balance through the guard must call
    /// [`signal_change`](Self::signal_change) after releasing it.
    pub fn lock(&self, id: AccountId) -> Result<MutexGuard<'_, i64>, LedgerError> {
        Ok(self.account(id)?.lock())
    }

    /// Acquires the locks of two distinct accounts in ascending index order.
    ///
    /// The guards are returned in argument order, `(a, b)`, whatever order
    /// they were taken in.
    ///
    /// # Errors
    ///
    /// - [`LedgerError::SameAccount`] - `a == b`.
    /// - [`LedgerError::AccountOutOfRange`] - either index is unknown.
    pub fn lock_pair(
        &self,
        a: AccountId,
        b: AccountId,
    ) -> Result<(MutexGuard<'_, i64>, MutexGuard<'_, i64>), LedgerError> {
        if a == b {
            return Err(LedgerError::SameAccount(a));
        }
        let account_a = self.account(a)?;
        let account_b = self.account(b)?;

        if a < b {
            let guard_a = account_a.lock();
            let guard_b = account_b.lock();
            Ok((guard_a, guard_b))
        } else {
            let guard_b = account_b.lock();
            let guard_a = account_a.lock();
            Ok((guard_a, guard_b))
        }
    }

    /// Wakes every withdrawal parked on account `id`.
    pub fn signal_change(&self, id: AccountId) -> Result<(), LedgerError> {
        self.account(id)?.notify_all();
        Ok(())
    }

    /// Sets the shutdown flag and wakes every parked withdrawal. Idempotent.
    ///
    /// Each account lock is taken and released before its broadcast. A waiter
    /// checks the flag while holding that lock, so it is either already parked
    /// (and gets woken) or has not checked yet (and will see the flag).
    pub fn begin_shutdown(&self) {
        self.shutting_down.store(true, Ordering::SeqCst);
        for account in &self.accounts {
            drop(account.lock());
            account.notify_all();
        }
    }

    pub fn is_shutting_down(&self) -> bool {
        self.shutting_down.load(Ordering::SeqCst)
    }

    /// Adds `amount` to account `id` and wakes its waiters.
    ///
    /// The lock is held across read, modify and write, with `delay` paused
    /// between each step. Returns the new balance.
    ///
    /// # Errors
    ///
    /// - [`LedgerError::NegativeAmount`] - `amount < 0`.
    /// - [`LedgerError::AccountOutOfRange`] - unknown account.
    /// - [`LedgerError::BalanceOverflow`] - the credit does not fit in an `i64`;
    ///   the balance is left unchanged.
    pub fn deposit(
        &self,
        id: AccountId,
        amount: i64,
        delay: Duration,
    ) -> Result<i64, LedgerError> {
        if amount < 0 {
            return Err(LedgerError::NegativeAmount(amount));
        }
        let account = self.account(id)?;

        let updated = {
            let mut guard = account.lock();
            let balance = *guard;
            pause(delay);

            let balance = balance
                .checked_add(amount)
                .ok_or(LedgerError::BalanceOverflow(id))?;
            pause(delay);

            *guard = balance;
            assert_invariants(balance);
            pause(delay);
            balance
        };

        account.notify_all();
        Ok(updated)
    }

    /// Moves funds from `from` to `to` while holding both locks.
    ///
    /// `choose` receives the source balance, read after both locks are held,
    /// and returns the amount to move. It is only called when that balance is
    /// positive; the result is clamped to `[0, balance]`. An empty source
    /// moves nothing. Returns the amount moved.
    ///
    /// # Errors
    ///
    /// - [`LedgerError::SameAccount`] - `from == to`.
    /// - [`LedgerError::AccountOutOfRange`] - either index is unknown.
    /// - [`LedgerError::BalanceOverflow`] - the credit does not fit in `to`;
    ///   neither balance changes.
    pub fn transfer<F>(
        &self,
        from: AccountId,
        to: AccountId,
        delay: Duration,
        choose: F,
    ) -> Result<i64, LedgerError>
    where
        F: FnOnce(i64) -> i64,
    {
        let record = {
            let (mut source, mut target) = self.lock_pair(from, to)?;

            let from_before = *source;
            let to_before = *target;
            let amount = if from_before > 0 {
                choose(from_before).clamp(0, from_before)
            } else {
                0
            };
            pause(delay);

            let from_after = from_before - amount;
            let to_after = to_before
                .checked_add(amount)
                .ok_or(LedgerError::BalanceOverflow(to))?;
            pause(delay);

            *source = from_after;
            *target = to_after;
            assert_invariants(from_after);
            assert_invariants(to_after);
            pause(delay);

            TransferRecord {
                from,
                to,
                amount,
                from_before,
                from_after,
                to_before,
                to_after,
            }
        };

        if let Some(log) = &self.transfer_log {
            log.push(record);
        }
        self.signal_change(to)?;
        Ok(record.amount)
    }

    /// Blocks until account `id` covers `amount`, then debits it.
    ///
    /// Funds are checked before shutdown on every wake, so a withdrawal that
    /// is satisfiable completes even if shutdown is broadcast at the same
    /// moment. Spurious wakes simply loop.
    pub fn withdraw_when_funded(
        &self,
        id: AccountId,
        amount: i64,
        delay: Duration,
    ) -> Result<WithdrawalOutcome, LedgerError> {
        if amount < 0 {
            return Err(LedgerError::NegativeAmount(amount));
        }
        let account = self.account(id)?;
        let mut guard = account.lock();

        loop {
            if *guard >= amount {
                let balance = *guard - amount;
                pause(delay);

                *guard = balance;
                assert_invariants(balance);
                pause(delay);
                return Ok(WithdrawalOutcome::Withdrawn(amount));
            }
            if self.is_shutting_down() {
                debug!(account = %id, amount, balance = *guard, "withdrawal cancelled by shutdown");
                return Ok(WithdrawalOutcome::Cancelled);
            }
            account.wait(&mut guard);
        }
    }

    /// Takes every transfer recorded so far, if auditing is enabled.
    pub fn take_transfer_log(&self) -> Vec<TransferRecord> {
        self.transfer_log
            .as_ref()
            .map(TransferLog::drain)
            .unwrap_or_default()
    }
}

/// Simulated scheduling delay inside a critical section.
fn pause(delay: Duration) {
    if !delay.is_zero() {
        thread::sleep(delay);
    }
}
