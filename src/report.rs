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

//! Final totals of a run and their CSV rendering.

use crate::ledger::WithdrawalOutcome;
use crate::transfer_log::TransferRecord;
use crate::worker::{DepositTotal, TransferTotal, WithdrawalTotal};
use csv::Writer;
use serde::Serialize;
use std::io::Write;
use tracing::{info, warn};

/// Per-worker accumulators and final balances, read after every pool joined.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Report {
    pub deposits: Vec<DepositTotal>,
    pub transfers: Vec<TransferTotal>,
    pub withdrawals: Vec<WithdrawalTotal>,
    pub balances: Vec<i64>,
    /// Empty unless transfer auditing was enabled.
    pub transfer_log: Vec<TransferRecord>,
}

impl Report {
    pub fn total_deposited(&self) -> i64 {
        self.deposits.iter().map(|d| d.deposited).sum()
    }

    pub fn total_moved(&self) -> i64 {
        self.transfers.iter().map(|t| t.moved).sum()
    }

    pub fn total_withdrawn(&self) -> i64 {
        self.withdrawals.iter().map(WithdrawalTotal::withdrawn).sum()
    }

    pub fn total_balance(&self) -> i64 {
        self.balances.iter().sum()
    }

    /// Withdrawal workers released by shutdown without funds.
    pub fn cancelled_withdrawals(&self) -> usize {
        self.withdrawals
            .iter()
            .filter(|w| w.outcome == WithdrawalOutcome::Cancelled)
            .count()
    }

    /// Balances sum to deposits minus withdrawals.
    pub fn is_conserved(&self) -> bool {
        self.total_balance() == self.total_deposited() - self.total_withdrawn()
    }

    pub(crate) fn log_summary(&self) {
        info!(
            deposited = self.total_deposited(),
            moved = self.total_moved(),
            withdrawn = self.total_withdrawn(),
            cancelled = self.cancelled_withdrawals(),
            balance = self.total_balance(),
            "run complete"
        );
        if !self.is_conserved() {
            warn!(
                balance = self.total_balance(),
                expected = self.total_deposited() - self.total_withdrawn(),
                "ledger total does not match deposits minus withdrawals"
            );
        }
    }
}

/// One CSV line: a worker or account amount, or a section total.
#[derive(Debug, Serialize)]
struct Row {
    section: &'static str,
    id: Option<usize>,
    amount: i64,
}

/// Write a report as CSV.
///
/// # CSV Format
///
/// Columns: `section, id, amount`. Per-item rows come first in each section,
/// followed by a total row with an empty `id`.
///
/// # Example
///
/// ```csv
/// section,id,amount
/// deposit,0,93
/// deposit,,93
/// transfer,0,41
/// transfer,,41
/// withdrawal,0,12
/// withdrawal,,12
/// balance,0,50
/// balance,1,31
/// balance,,81
/// ```
///
/// # Errors
///
/// Returns a CSV error if writing fails.
pub fn write_csv<W: Write>(report: &Report, writer: W) -> Result<(), csv::Error> {
    let mut wtr = Writer::from_writer(writer);

    let mut section = |name: &'static str, items: Vec<(usize, i64)>| -> Result<(), csv::Error> {
        let total: i64 = items.iter().map(|(_, amount)| amount).sum();
        for (id, amount) in items {
            wtr.serialize(Row {
                section: name,
                id: Some(id),
                amount,
            })?;
        }
        wtr.serialize(Row {
            section: name,
            id: None,
            amount: total,
        })
    };

    section(
        "deposit",
        report.deposits.iter().map(|d| (d.worker.0, d.deposited)).collect(),
    )?;
    section(
        "transfer",
        report.transfers.iter().map(|t| (t.worker.0, t.moved)).collect(),
    )?;
    section(
        "withdrawal",
        report.withdrawals.iter().map(|w| (w.worker.0, w.withdrawn())).collect(),
    )?;
    section(
        "balance",
        report.balances.iter().copied().enumerate().collect(),
    )?;

    wtr.flush()?;
    Ok(())
}
