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

//! Ledger public API integration tests.

use bank_sim::{AccountId, Ledger, LedgerError, WithdrawalOutcome};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

// === Helper Functions ===

fn spawn_withdrawal(
    ledger: &Arc<Ledger>,
    account: usize,
    amount: i64,
) -> thread::JoinHandle<Result<WithdrawalOutcome, LedgerError>> {
    let ledger = Arc::clone(ledger);
    thread::spawn(move || ledger.withdraw_when_funded(AccountId(account), amount, Duration::ZERO))
}

/// Gives a spawned waiter time to park on its condition.
fn settle() {
    thread::sleep(Duration::from_millis(50));
}

// === Serialization ===

#[test]
fn concurrent_deposits_are_not_lost() {
    const NUM_THREADS: usize = 8;
    const ITERATIONS: usize = 250;
    const AMOUNT: i64 = 3;

    let ledger = Arc::new(Ledger::new(1));

    let handles: Vec<_> = (0..NUM_THREADS)
        .map(|_| {
            let ledger = Arc::clone(&ledger);
            thread::spawn(move || {
                for _ in 0..ITERATIONS {
                    ledger.deposit(AccountId(0), AMOUNT, Duration::ZERO).unwrap();
                }
            })
        })
        .collect();

    for handle in handles {
        handle.join().unwrap();
    }

    assert_eq!(
        ledger.balance(AccountId(0)).unwrap(),
        NUM_THREADS as i64 * ITERATIONS as i64 * AMOUNT
    );
}

#[test]
fn concurrent_deposits_with_delay_are_not_lost() {
    let ledger = Arc::new(Ledger::new(1));

    let handles: Vec<_> = (0..4)
        .map(|_| {
            let ledger = Arc::clone(&ledger);
            thread::spawn(move || {
                for _ in 0..20 {
                    ledger
                        .deposit(AccountId(0), 1, Duration::from_micros(50))
                        .unwrap();
                }
            })
        })
        .collect();

    for handle in handles {
        handle.join().unwrap();
    }

    assert_eq!(ledger.total(), 80);
}

// === Transfers ===

#[test]
fn transfer_is_zero_sum() {
    let ledger = Ledger::new(3);
    ledger.deposit(AccountId(2), 40, Duration::ZERO).unwrap();

    let moved = ledger
        .transfer(AccountId(2), AccountId(0), Duration::ZERO, |balance| {
            assert_eq!(balance, 40);
            15
        })
        .unwrap();

    assert_eq!(moved, 15);
    assert_eq!(ledger.balances(), vec![15, 0, 25]);
    assert_eq!(ledger.total(), 40);
}

#[test]
fn transfer_to_same_account_rejected() {
    let ledger = Ledger::new(2);
    let result = ledger.transfer(AccountId(1), AccountId(1), Duration::ZERO, |_| 0);
    assert_eq!(result, Err(LedgerError::SameAccount(AccountId(1))));
}

#[test]
fn transfer_out_of_range_rejected() {
    let ledger = Ledger::new(2);
    let result = ledger.transfer(AccountId(0), AccountId(5), Duration::ZERO, |_| 0);
    assert_eq!(
        result,
        Err(LedgerError::AccountOutOfRange {
            account: AccountId(5),
            accounts: 2
        })
    );
}

// === Withdrawals ===

#[test]
fn withdrawal_completes_once_funded() {
    let ledger = Arc::new(Ledger::new(2));
    let waiter = spawn_withdrawal(&ledger, 1, 12);

    settle();
    ledger.deposit(AccountId(1), 5, Duration::ZERO).unwrap();
    settle();
    assert!(!waiter.is_finished(), "withdrawal must keep waiting while underfunded");

    ledger.deposit(AccountId(1), 10, Duration::ZERO).unwrap();

    assert_eq!(waiter.join().unwrap(), Ok(WithdrawalOutcome::Withdrawn(12)));
    assert_eq!(ledger.balance(AccountId(1)).unwrap(), 3);
}

#[test]
fn withdrawal_funded_by_transfer() {
    let ledger = Arc::new(Ledger::new(2));
    ledger.deposit(AccountId(0), 30, Duration::ZERO).unwrap();
    let waiter = spawn_withdrawal(&ledger, 1, 10);

    settle();
    ledger
        .transfer(AccountId(0), AccountId(1), Duration::ZERO, |_| 10)
        .unwrap();

    assert_eq!(waiter.join().unwrap(), Ok(WithdrawalOutcome::Withdrawn(10)));
    assert_eq!(ledger.balances(), vec![20, 0]);
}

#[test]
fn unrelated_account_does_not_satisfy_withdrawal() {
    let ledger = Arc::new(Ledger::new(2));
    let waiter = spawn_withdrawal(&ledger, 0, 5);

    settle();
    ledger.deposit(AccountId(1), 100, Duration::ZERO).unwrap();
    ledger.signal_change(AccountId(0)).unwrap();
    settle();
    assert!(!waiter.is_finished());

    ledger.begin_shutdown();
    assert_eq!(waiter.join().unwrap(), Ok(WithdrawalOutcome::Cancelled));
    assert_eq!(ledger.balances(), vec![0, 100]);
}

#[test]
fn many_waiters_released_by_shutdown() {
    let ledger = Arc::new(Ledger::new(3));
    let waiters: Vec<_> = (0..9).map(|i| spawn_withdrawal(&ledger, i % 3, 50)).collect();

    settle();
    ledger.begin_shutdown();

    for waiter in waiters {
        assert_eq!(waiter.join().unwrap(), Ok(WithdrawalOutcome::Cancelled));
    }
    assert!(ledger.is_shutting_down());
}

#[test]
fn competing_waiters_never_overdraw() {
    let ledger = Arc::new(Ledger::new(1));
    let waiters: Vec<_> = (0..4).map(|_| spawn_withdrawal(&ledger, 0, 10)).collect();

    settle();
    ledger.deposit(AccountId(0), 25, Duration::ZERO).unwrap();
    settle();
    ledger.begin_shutdown();

    let withdrawn: i64 = waiters
        .into_iter()
        .map(|w| w.join().unwrap().unwrap().amount())
        .sum();

    assert_eq!(withdrawn, 20);
    assert_eq!(ledger.balance(AccountId(0)).unwrap(), 5);
}

/// One account, deposits of 5, 7 and 2, then shutdown strands a request for 100.
#[test]
fn underfunded_withdrawal_scenario() {
    let ledger = Arc::new(Ledger::new(1));
    let waiter = spawn_withdrawal(&ledger, 0, 100);

    let depositor = {
        let ledger = Arc::clone(&ledger);
        thread::spawn(move || {
            let mut net = 0;
            for amount in [5, 7, 2] {
                ledger.deposit(AccountId(0), amount, Duration::ZERO).unwrap();
                net += amount;
            }
            net
        })
    };

    assert_eq!(depositor.join().unwrap(), 14);
    assert_eq!(ledger.balance(AccountId(0)).unwrap(), 14);

    ledger.begin_shutdown();

    let outcome = waiter.join().unwrap().unwrap();
    assert_eq!(outcome, WithdrawalOutcome::Cancelled);
    assert_eq!(outcome.amount(), 0);
    assert_eq!(ledger.balance(AccountId(0)).unwrap(), 14);
}

#[test]
fn withdrawal_started_after_shutdown_returns_immediately() {
    let ledger = Ledger::new(1);
    ledger.begin_shutdown();
    assert_eq!(
        ledger.withdraw_when_funded(AccountId(0), 1, Duration::ZERO),
        Ok(WithdrawalOutcome::Cancelled)
    );
}
