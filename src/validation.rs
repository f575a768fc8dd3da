//! Input rules enforced before anything reaches the store.

use std::collections::HashSet;

use chrono::Utc;
use rust_decimal::Decimal;
use thiserror::Error;
use uuid::Uuid;

use crate::schemas::{Expense, Friend, Group, NewExpense, Payment};

/// Upper bound for a single expense; keeps sums far away from decimal overflow.
pub const MAX_AMOUNT: Decimal = Decimal::from_parts(3_567_587_328, 232, 0, false, 0);

#[derive(Debug, Error, PartialEq)]
pub enum ValidationError {
    #[error("{0} must not be empty")]
    Blank(&'static str),
    #[error("a group needs at least one member")]
    NoMembers,
    #[error("{0} is already a member of this group under the same name")]
    DuplicateMemberName(String),
    #[error("the expense amount must be positive")]
    NonPositiveAmount,
    #[error("amounts may not exceed {MAX_AMOUNT}")]
    AmountTooLarge,
    #[error("{0} has more than two fractional digits")]
    TooPrecise(Decimal),
    #[error("payment amounts may not be negative")]
    NegativePayment,
    #[error("an expense needs either payments or paidBy")]
    NoPayer,
    #[error("give either payments or paidBy, not both")]
    AmbiguousPayer,
    #[error("friend {0} is not a member of the group")]
    PayerNotMember(String),
    #[error("friend {0} appears more than once in the payments")]
    DuplicatePayer(String),
    #[error("payments add up to {paid} but the expense is for {amount}")]
    PaymentsMismatch { amount: Decimal, paid: Decimal },
}

pub fn non_blank(value: &str, field: &'static str) -> Result<String, ValidationError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::Blank(field));
    }
    Ok(trimmed.to_string())
}

fn currency(amount: Decimal) -> Result<Decimal, ValidationError> {
    if amount.normalize().scale() > 2 {
        return Err(ValidationError::TooPrecise(amount));
    }
    if amount > MAX_AMOUNT {
        return Err(ValidationError::AmountTooLarge);
    }
    Ok(amount)
}

/// Members for a new group, in request order with repeated ids collapsed.
pub fn group_members(friends: Vec<Friend>) -> Result<Vec<Friend>, ValidationError> {
    if friends.is_empty() {
        return Err(ValidationError::NoMembers);
    }
    let mut members: Vec<Friend> = Vec::with_capacity(friends.len());
    for friend in friends {
        if members.iter().any(|member| member.id == friend.id) {
            continue;
        }
        check_name_free(&members, &friend)?;
        members.push(friend);
    }
    Ok(members)
}

/// Balances are keyed by name, so names must be unique inside a group.
fn check_name_free(members: &[Friend], friend: &Friend) -> Result<(), ValidationError> {
    if members.iter().any(|member| member.name == friend.name) {
        return Err(ValidationError::DuplicateMemberName(friend.name.clone()));
    }
    Ok(())
}

/// Turn a request into an expense of `group`, checking every payment rule.
pub fn build_expense(request: NewExpense, group: &Group) -> Result<Expense, ValidationError> {
    let description = non_blank(&request.description, "description")?;
    if request.amount <= Decimal::ZERO {
        return Err(ValidationError::NonPositiveAmount);
    }
    let amount = currency(request.amount)?;

    let requested: Vec<(String, Decimal)> = match (request.paid_by, request.payments.is_empty()) {
        (Some(_), false) => return Err(ValidationError::AmbiguousPayer),
        (None, true) => return Err(ValidationError::NoPayer),
        (Some(payer), true) => vec![(payer.id, amount)],
        (None, false) => request
            .payments
            .into_iter()
            .map(|payment| (payment.friend.id, payment.amount))
            .collect(),
    };

    let mut seen = HashSet::new();
    let mut payments = Vec::with_capacity(requested.len());
    for (friend_id, paid) in requested {
        if paid < Decimal::ZERO {
            return Err(ValidationError::NegativePayment);
        }
        let paid = currency(paid)?;
        let friend = group
            .members
            .iter()
            .find(|member| member.id == friend_id)
            .ok_or_else(|| ValidationError::PayerNotMember(friend_id.clone()))?;
        if !seen.insert(friend_id.clone()) {
            return Err(ValidationError::DuplicatePayer(friend_id));
        }
        payments.push(Payment {
            friend: friend.clone(),
            amount: paid,
        });
    }

    let paid: Decimal = payments.iter().map(|payment| payment.amount).sum();
    if paid != amount {
        return Err(ValidationError::PaymentsMismatch { amount, paid });
    }

    Ok(Expense {
        id: Uuid::new_v4().to_string(),
        description,
        group_id: group.id.clone(),
        amount,
        payments,
        created_at: Utc::now(),
    })
}
