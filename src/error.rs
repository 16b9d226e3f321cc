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

//! Error types for the ledger and its coordinator.

use crate::base::{AccountId, Role, WorkerId};
use thiserror::Error;

/// Ledger and coordination errors.
///
/// Zero amounts, empty transfers and withdrawals cancelled by shutdown are
/// outcomes, not errors, and never appear here.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LedgerError {
    /// Configuration was rejected before any worker started
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// Account index is not part of the ledger
    #[error("account {account} out of range (ledger has {accounts} accounts)")]
    AccountOutOfRange { account: AccountId, accounts: usize },

    /// Deposits and withdrawals move non-negative amounts only
    #[error("invalid amount {0} (must not be negative)")]
    NegativeAmount(i64),

    /// Crediting the account would overflow its balance
    #[error("balance of account {0} would overflow")]
    BalanceOverflow(AccountId),

    /// Transfer source and destination are the same account
    #[error("cannot transfer from account {0} to itself")]
    SameAccount(AccountId),

    /// The operating system refused to start a worker thread
    #[error("could not create {role} thread #{worker}: {reason}")]
    SpawnFailed {
        role: Role,
        worker: WorkerId,
        reason: String,
    },

    /// A worker thread panicked before returning its result
    #[error("{role} thread #{worker} panicked")]
    WorkerPanicked { role: Role, worker: WorkerId },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display_messages() {
        assert_eq!(
            LedgerError::InvalidConfig("accounts must be positive".into()).to_string(),
            "invalid configuration: accounts must be positive"
        );
        assert_eq!(
            LedgerError::AccountOutOfRange {
                account: AccountId(12),
                accounts: 10
            }
            .to_string(),
            "account 12 out of range (ledger has 10 accounts)"
        );
        assert_eq!(
            LedgerError::NegativeAmount(-3).to_string(),
            "invalid amount -3 (must not be negative)"
        );
        assert_eq!(
            LedgerError::BalanceOverflow(AccountId(2)).to_string(),
            "balance of account 2 would overflow"
        );
        assert_eq!(
            LedgerError::SameAccount(AccountId(4)).to_string(),
            "cannot transfer from account 4 to itself"
        );
        assert_eq!(
            LedgerError::SpawnFailed {
                role: Role::Deposit,
                worker: WorkerId(3),
                reason: "out of memory".into(),
            }
            .to_string(),
            "could not create deposit thread #3: out of memory"
        );
        assert_eq!(
            LedgerError::WorkerPanicked {
                role: Role::Withdrawal,
                worker: WorkerId(0),
            }
            .to_string(),
            "withdrawal thread #0 panicked"
        );
    }

    #[test]
    fn errors_are_cloneable() {
        let error = LedgerError::SameAccount(AccountId(1));
        let cloned = error.clone();
        assert_eq!(error, cloned);
    }
}
