use crate::core::party::PartyId;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Available funds of a party after a reevaluation.
///
/// `available` is what gets reported. When the party still has unpaid
/// obligations and the policy reserves funds against debt, `available` is
/// zero and `reserved` is set even if transfers were left unconsumed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Balance {
    pub party: PartyId,
    pub available: Decimal,
    pub total_transferred: Decimal,
    pub total_consumed: Decimal,
    pub reserved: bool,
}

impl Balance {
    /// Zero balance for a party with no activity.
    pub fn empty(party: PartyId) -> Self {
        Self {
            party,
            available: Decimal::ZERO,
            total_transferred: Decimal::ZERO,
            total_consumed: Decimal::ZERO,
            reserved: false,
        }
    }

    /// Transfer funds not consumed by any obligation, regardless of how
    /// the balance is reported.
    pub fn unconsumed(&self) -> Decimal {
        self.total_transferred - self.total_consumed
    }
}

/// Balances keyed by party.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BalanceSheet {
    balances: BTreeMap<PartyId, Balance>,
}

impl BalanceSheet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or overwrite the balance of `balance.party`.
    pub fn record(&mut self, balance: Balance) {
        self.balances.insert(balance.party.clone(), balance);
    }

    pub fn get(&self, party: &PartyId) -> Option<&Balance> {
        self.balances.get(party)
    }

    /// Reported available funds for a party, zero if unknown.
    pub fn available(&self, party: &PartyId) -> Decimal {
        self.balances
            .get(party)
            .map(|b| b.available)
            .unwrap_or(Decimal::ZERO)
    }

    pub fn remove(&mut self, party: &PartyId) -> Option<Balance> {
        self.balances.remove(party)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Balance> {
        self.balances.values()
    }

    pub fn len(&self) -> usize {
        self.balances.len()
    }

    pub fn is_empty(&self) -> bool {
        self.balances.is_empty()
    }

    /// Sum of reported available funds across all parties.
    pub fn total_available(&self) -> Decimal {
        self.balances.values().map(|b| b.available).sum()
    }
}
