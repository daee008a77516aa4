use crate::core::currency::CurrencyCode;
use crate::core::party::PartyId;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A payment received from, or sent to, a party.
///
/// When the payment was converted from another currency, `exchange_rate`
/// holds the rate applied (units of `currency` per unit of the reporting
/// currency).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transfer {
    id: Uuid,
    party: PartyId,
    amount: Decimal,
    currency: CurrencyCode,
    date: NaiveDate,
    exchange_rate: Option<Decimal>,
    reference: Option<String>,
}

impl Transfer {
    pub fn new(party: PartyId, amount: Decimal, currency: CurrencyCode, date: NaiveDate) -> Self {
        Self::with_id(Uuid::new_v4(), party, amount, currency, date)
    }

    pub fn with_id(
        id: Uuid,
        party: PartyId,
        amount: Decimal,
        currency: CurrencyCode,
        date: NaiveDate,
    ) -> Self {
        Self {
            id,
            party,
            amount,
            currency,
            date,
            exchange_rate: None,
            reference: None,
        }
    }

    pub fn with_exchange_rate(mut self, rate: Decimal) -> Self {
        self.exchange_rate = Some(rate);
        self
    }

    pub fn with_reference(mut self, reference: impl Into<String>) -> Self {
        self.reference = Some(reference.into());
        self
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn party(&self) -> &PartyId {
        &self.party
    }

    pub fn amount(&self) -> Decimal {
        self.amount
    }

    pub fn currency(&self) -> &CurrencyCode {
        &self.currency
    }

    pub fn date(&self) -> NaiveDate {
        self.date
    }

    pub fn exchange_rate(&self) -> Option<Decimal> {
        self.exchange_rate
    }

    pub fn reference(&self) -> Option<&str> {
        self.reference.as_deref()
    }
}

/// The transfers of one party, in insertion order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TransferSet {
    transfers: Vec<Transfer>,
}

impl TransferSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, transfer: Transfer) {
        self.transfers.push(transfer);
    }

    pub fn replace(&mut self, transfer: Transfer) -> Option<Transfer> {
        let slot = self.transfers.iter_mut().find(|t| t.id == transfer.id)?;
        Some(std::mem::replace(slot, transfer))
    }

    pub fn remove(&mut self, id: Uuid) -> Option<Transfer> {
        let idx = self.transfers.iter().position(|t| t.id == id)?;
        Some(self.transfers.remove(idx))
    }

    pub fn contains(&self, id: Uuid) -> bool {
        self.get(id).is_some()
    }

    pub fn get(&self, id: Uuid) -> Option<&Transfer> {
        self.transfers.iter().find(|t| t.id == id)
    }

    pub fn transfers(&self) -> &[Transfer] {
        &self.transfers
    }

    pub fn len(&self) -> usize {
        self.transfers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.transfers.is_empty()
    }

    /// Sum of all transfer amounts, saturating at `Decimal::MAX`.
    pub fn total(&self) -> Decimal {
        self.transfers
            .iter()
            .fold(Decimal::ZERO, |acc, t| acc.saturating_add(t.amount))
    }

    /// Transfers sorted by date. Ties keep insertion order.
    pub fn chronological(&self) -> Vec<&Transfer> {
        let mut sorted: Vec<&Transfer> = self.transfers.iter().collect();
        sorted.sort_by_key(|t| t.date);
        sorted
    }
}

impl FromIterator<Transfer> for TransferSet {
    fn from_iter<T: IntoIterator<Item = Transfer>>(iter: T) -> Self {
        Self {
            transfers: iter.into_iter().collect(),
        }
    }
}
