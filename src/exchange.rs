use crate::balance::MemberBalance;
use crate::schemas::Friend;
use rust_decimal::Decimal;
use serde::Serialize;

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Exchange {
    pub payer: Friend,
    pub receiver: Friend,
    pub amount: Decimal,
}

#[derive(Clone, Debug)]
struct Outstanding {
    friend: Friend,
    amount: Decimal,
}

// Largest first, names break ties so the result doesn't depend on member order
fn sort_outstanding(people: &mut [Outstanding]) {
    people.sort_by(|a, b| {
        b.amount
            .cmp(&a.amount)
            .then_with(|| a.friend.name.cmp(&b.friend.name))
    });
}

/// Transfers that clear every balance.
///
/// The biggest debtor repeatedly pays the biggest creditor as much as one of
/// them needs to reach zero, so every step settles at least one person and
/// the result has fewer transfers than there are people with a balance.
pub fn settle_up(balances: &[MemberBalance]) -> Vec<Exchange> {
    // Divide people into payers and receivers
    let mut payers = Vec::new();
    let mut receivers = Vec::new();

    for entry in balances {
        let person = Outstanding {
            friend: entry.friend.clone(),
            amount: entry.balance.abs(),
        };
        if entry.balance < Decimal::ZERO {
            payers.push(person);
        } else if entry.balance > Decimal::ZERO {
            receivers.push(person);
        }
    }

    sort_outstanding(&mut payers);
    sort_outstanding(&mut receivers);

    let mut exchanges = Vec::new();
    let (mut p, mut r) = (0, 0);

    while p < payers.len() && r < receivers.len() {
        let payer = &payers[p];
        let receiver = &receivers[r];
        let amount = payer.amount.min(receiver.amount);

        exchanges.push(Exchange {
            payer: payer.friend.clone(),
            receiver: receiver.friend.clone(),
            amount,
        });

        payers[p].amount -= amount;
        receivers[r].amount -= amount;
        if payers[p].amount.is_zero() {
            p += 1;
        }
        if receivers[r].amount.is_zero() {
            r += 1;
        }
    }

    exchanges
}
