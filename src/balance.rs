use std::collections::{BTreeMap, HashMap};

use rust_decimal::Decimal;
use thiserror::Error;

use crate::schemas::{Expense, Friend};

/// Smallest currency unit, all shares are whole cents.
pub const CENT: Decimal = Decimal::from_parts(1, 0, 0, false, 2);

#[derive(Clone, Debug, PartialEq)]
pub struct MemberBalance {
    pub friend: Friend,
    pub balance: Decimal,
}

#[derive(Debug, Error, PartialEq)]
pub enum SettlementError {
    #[error("a group needs at least one member to compute balances")]
    EmptyGroup,
    #[error("expense {expense} has a payment from {friend}, who is not a member of the group")]
    PaymentOutsideGroup { expense: String, friend: String },
    #[error("expense {expense} is for {amount} but its payments add up to {paid}")]
    UnbalancedExpense {
        expense: String,
        amount: Decimal,
        paid: Decimal,
    },
}

/// Net balance of every member under the equal-split convention.
///
/// Each member owes an equal share of the sum of all expense totals and is
/// credited with everything they paid. Shares are whole cents: the total is
/// divided rounding down, and the leftover cents (always fewer than the
/// member count) go one each to the first members in group order. The
/// shares therefore add up to the total and the balances add up to zero.
///
/// Balances use the membership passed in, so a member added after some
/// expenses were recorded takes a share of those expenses too.
pub fn compute_balances(
    members: &[Friend],
    expenses: &[Expense],
) -> Result<Vec<MemberBalance>, SettlementError> {
    if members.is_empty() {
        return Err(SettlementError::EmptyGroup);
    }

    let mut paid: HashMap<&str, Decimal> = members
        .iter()
        .map(|member| (member.id.as_str(), Decimal::ZERO))
        .collect();
    let mut total = Decimal::ZERO;

    for expense in expenses {
        let expense_paid = expense.total_paid();
        if expense_paid != expense.amount {
            return Err(SettlementError::UnbalancedExpense {
                expense: expense.id.clone(),
                amount: expense.amount,
                paid: expense_paid,
            });
        }
        for payment in &expense.payments {
            match paid.get_mut(payment.friend.id.as_str()) {
                Some(balance) => *balance += payment.amount,
                None => {
                    return Err(SettlementError::PaymentOutsideGroup {
                        expense: expense.id.clone(),
                        friend: payment.friend.id.clone(),
                    })
                }
            }
        }
        total += expense.amount;
    }

    let shares = equal_shares(total, members.len());
    Ok(members
        .iter()
        .zip(shares)
        .map(|(member, share)| MemberBalance {
            friend: member.clone(),
            balance: paid.get(member.id.as_str()).copied().unwrap_or_default() - share,
        })
        .collect())
}

// Split `total` into `count` whole-cent shares that add up to `total` exactly.
fn equal_shares(total: Decimal, count: usize) -> Vec<Decimal> {
    let base = (total / Decimal::from(count))
        .round_dp_with_strategy(2, rust_decimal::RoundingStrategy::ToZero);
    let mut leftover = total - base * Decimal::from(count);
    (0..count)
        .map(|_| {
            if leftover >= CENT {
                leftover -= CENT;
                base + CENT
            } else {
                base
            }
        })
        .collect()
}

/// The `{ friendName: balance }` shape served to clients.
pub fn balances_by_name(balances: &[MemberBalance]) -> BTreeMap<String, Decimal> {
    balances
        .iter()
        .map(|entry| (entry.friend.name.clone(), entry.balance))
        .collect()
}
