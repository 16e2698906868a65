use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::DomainError;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionKind {
    Credit,
    Debit,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    pub id: Uuid,
    pub user_id: String,
    pub username: String,
    pub kind: TransactionKind,
    pub amount: u64,
    pub timestamp: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attachment: Option<String>,
}

/// The shared donation ledger. `total` is the spendable balance; `donors`
/// tracks lifetime credited amounts per user and is never reduced by debits.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ledger {
    pub total: u64,
    pub donors: BTreeMap<String, u64>,
    pub transactions: Vec<Transaction>,
}

impl Ledger {
    pub fn credit(
        &mut self,
        user_id: impl Into<String>,
        username: impl Into<String>,
        amount: u64,
        attachment: Option<String>,
    ) -> Result<Transaction, DomainError> {
        if amount == 0 {
            return Err(DomainError::InvalidAmount);
        }

        let user_id = user_id.into();
        self.total = self.total.saturating_add(amount);
        let credited = self.donors.entry(user_id.clone()).or_default();
        *credited = credited.saturating_add(amount);

        let entry = Transaction {
            id: Uuid::new_v4(),
            user_id,
            username: username.into(),
            kind: TransactionKind::Credit,
            amount,
            timestamp: Utc::now(),
            attachment,
        };
        self.transactions.push(entry.clone());
        Ok(entry)
    }

    pub fn debit(
        &mut self,
        user_id: impl Into<String>,
        username: impl Into<String>,
        amount: u64,
        authorized: bool,
    ) -> Result<Transaction, DomainError> {
        if !authorized {
            return Err(DomainError::Unauthorized);
        }
        if amount == 0 {
            return Err(DomainError::InvalidAmount);
        }
        if amount > self.total {
            return Err(DomainError::InsufficientFunds { requested: amount, available: self.total });
        }

        self.total -= amount;
        let entry = Transaction {
            id: Uuid::new_v4(),
            user_id: user_id.into(),
            username: username.into(),
            kind: TransactionKind::Debit,
            amount,
            timestamp: Utc::now(),
            attachment: None,
        };
        self.transactions.push(entry.clone());
        Ok(entry)
    }

    /// Donor ranking, highest lifetime credit first. Recomputed from the
    /// current map on every call; ties keep the map's stable key order.
    pub fn top_donors(&self, n: usize) -> impl Iterator<Item = (&str, u64)> {
        let mut ranked: Vec<(&str, u64)> =
            self.donors.iter().map(|(user, amount)| (user.as_str(), *amount)).collect();
        ranked.sort_by(|left, right| right.1.cmp(&left.1));
        ranked.into_iter().take(n)
    }

    /// Last `n` transactions, newest first.
    pub fn recent_transactions(&self, n: usize) -> impl Iterator<Item = &Transaction> {
        self.transactions.iter().rev().take(n)
    }
}
