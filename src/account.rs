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

//! A single independently lockable account.
//!
//! Each account owns its own balance lock and its own `withdraw_ready`
//! condition. Nothing here ever locks more than one account; ordering
//! across accounts is the [`Ledger`](crate::Ledger)'s job.
//!
//! # Example
//!
//! ```
//! use bank_sim::Account;
//!
//! let account = Account::new();
//! assert_eq!(account.balance(), 0);
//! ```

use parking_lot::{Condvar, Mutex, MutexGuard};

/// Ledger account.
#[derive(Debug, Default)]
pub struct Account {
    balance: Mutex<i64>,
    /// Woken whenever the balance may have risen, and at shutdown.
    withdraw_ready: Condvar,
}

impl Account {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current balance, read under the account's lock.
    pub fn balance(&self) -> i64 {
        *self.balance.lock()
    }

    /// Acquires this account's lock.
    pub fn lock(&self) -> MutexGuard<'_, i64> {
        self.balance.lock()
    }

    /// Blocks on `withdraw_ready`, releasing `guard` while parked.
    pub(crate) fn wait(&self, guard: &mut MutexGuard<'_, i64>) {
        self.withdraw_ready.wait(guard);
    }

    /// Wakes every worker parked on this account.
    pub(crate) fn notify_all(&self) {
        self.withdraw_ready.notify_all();
    }
}

/// Checks the balance invariant after a write.
pub(crate) fn assert_invariants(balance: i64) {
    debug_assert!(
        balance >= 0,
        "Invariant violated: balance went negative: {}",
        balance
    );
}
