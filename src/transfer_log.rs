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

//! Lock-free audit log of applied transfers.
//!
//! Each record captures both balances before and after the move, so a reader
//! can check afterwards that every debit was matched by an equal credit.

use crate::base::AccountId;
use crossbeam::queue::SegQueue;

/// One applied transfer, observed while both account locks were held.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransferRecord {
    pub from: AccountId,
    pub to: AccountId,
    pub amount: i64,
    pub from_before: i64,
    pub from_after: i64,
    pub to_before: i64,
    pub to_after: i64,
}

impl TransferRecord {
    /// Amount that left the source account.
    pub fn debit(&self) -> i64 {
        self.from_before - self.from_after
    }

    /// Amount that arrived in the destination account.
    pub fn credit(&self) -> i64 {
        self.to_after - self.to_before
    }

    /// True when the transfer neither created nor destroyed funds.
    pub fn is_balanced(&self) -> bool {
        self.debit() == self.amount && self.credit() == self.amount
    }
}

/// A thread-safe, append-only transfer log.
///
/// Backed by a [`SegQueue`] so transfer workers never contend on a lock
/// beyond the two account locks they already hold.
#[derive(Debug, Default)]
pub struct TransferLog {
    records: SegQueue<TransferRecord>,
}

impl TransferLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, record: TransferRecord) {
        self.records.push(record);
    }

    /// Removes and returns every record in insertion order.
    pub fn drain(&self) -> Vec<TransferRecord> {
        let mut records = Vec::with_capacity(self.records.len());
        while let Some(record) = self.records.pop() {
            records.push(record);
        }
        records
    }
}
