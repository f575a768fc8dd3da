use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

pub type FriendId = String;
pub type GroupId = String;

#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct Friend {
    pub id: FriendId,
    pub name: String,
}

#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct Group {
    pub id: GroupId,
    pub name: String,
    pub members: Vec<Friend>,
}

impl Group {
    pub fn has_member(&self, friend_id: &str) -> bool {
        self.members.iter().any(|member| member.id == friend_id)
    }
}

#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct Payment {
    pub friend: Friend,
    pub amount: Decimal,
}

#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Expense {
    pub id: String,
    pub description: String,
    pub group_id: GroupId,
    pub amount: Decimal,
    pub payments: Vec<Payment>,
    pub created_at: DateTime<Utc>,
}

impl Expense {
    pub fn total_paid(&self) -> Decimal {
        self.payments.iter().map(|payment| payment.amount).sum()
    }

    /// The member who paid the most. Ties go to the first one listed.
    pub fn main_payer(&self) -> Option<&Friend> {
        let mut payer: Option<&Payment> = None;
        for payment in &self.payments {
            if payer.map_or(true, |best| payment.amount > best.amount) {
                payer = Some(payment);
            }
        }
        payer.map(|payment| &payment.friend)
    }
}

/// An expense as the API returns it. `paidBy` is derived from the payments
/// for clients that show a single payer.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExpenseView<'a> {
    #[serde(flatten)]
    pub expense: &'a Expense,
    pub paid_by: Option<&'a Friend>,
}

impl<'a> From<&'a Expense> for ExpenseView<'a> {
    fn from(expense: &'a Expense) -> Self {
        Self {
            expense,
            paid_by: expense.main_payer(),
        }
    }
}

/// A reference to an existing entity, `{ "id": ... }` on the wire.
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct IdRef {
    pub id: String,
}

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct NewFriend {
    pub name: String,
}

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct NewGroup {
    pub name: String,
    #[serde(default)]
    pub members: Vec<IdRef>,
}

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct NewPayment {
    pub friend: IdRef,
    pub amount: Decimal,
}

#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewExpense {
    pub description: String,
    pub amount: Decimal,
    pub group: IdRef,
    #[serde(default)]
    pub payments: Vec<NewPayment>,
    // Single payer shorthand: the whole amount paid by one friend.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub paid_by: Option<IdRef>,
}
