use crate::core::currency::CurrencyCode;
use crate::core::party::PartyId;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// An amount a party owes, or is owed, on a given date.
///
/// Covers client sale invoices, exporter orders and agency expenses alike.
/// The amount that counts for allocation is the gross amount minus any
/// credit note issued against it.
///
/// # Examples
///
/// ```
/// use payment_allocator::core::obligation::Obligation;
/// use payment_allocator::core::party::PartyId;
/// use payment_allocator::core::currency::CurrencyCode;
/// use chrono::NaiveDate;
/// use rust_decimal_macros::dec;
///
/// let invoice = Obligation::new(
///     PartyId::new("CLI-NORTE"),
///     dec!(12_500),
///     CurrencyCode::new("EUR"),
///     NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
/// )
/// .with_credit_note(dec!(500));
///
/// assert_eq!(invoice.due(), dec!(12_000));
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Obligation {
    id: Uuid,
    party: PartyId,
    /// Invoiced amount before credit notes.
    gross: Decimal,
    /// Credit note amount deducted from `gross`.
    credit_note: Decimal,
    currency: CurrencyCode,
    /// Delivery or invoice date; allocation order follows it.
    due_date: NaiveDate,
    reference: Option<String>,
}

impl Obligation {
    pub fn new(party: PartyId, gross: Decimal, currency: CurrencyCode, due_date: NaiveDate) -> Self {
        Self::with_id(Uuid::new_v4(), party, gross, currency, due_date)
    }

    /// Create an obligation with a specific ID (useful for testing / determinism).
    pub fn with_id(
        id: Uuid,
        party: PartyId,
        gross: Decimal,
        currency: CurrencyCode,
        due_date: NaiveDate,
    ) -> Self {
        Self {
            id,
            party,
            gross,
            credit_note: Decimal::ZERO,
            currency,
            due_date,
            reference: None,
        }
    }

    pub fn with_credit_note(mut self, amount: Decimal) -> Self {
        self.credit_note = amount;
        self
    }

    pub fn with_reference(mut self, reference: impl Into<String>) -> Self {
        self.reference = Some(reference.into());
        self
    }

    /// Amount to allocate: gross minus credit note. May be zero or negative
    /// when the credit note covers the whole invoice.
    pub fn due(&self) -> Decimal {
        self.gross - self.credit_note
    }

    // --- Accessors ---

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn party(&self) -> &PartyId {
        &self.party
    }

    pub fn gross(&self) -> Decimal {
        self.gross
    }

    pub fn credit_note(&self) -> Decimal {
        self.credit_note
    }

    pub fn currency(&self) -> &CurrencyCode {
        &self.currency
    }

    pub fn due_date(&self) -> NaiveDate {
        self.due_date
    }

    pub fn reference(&self) -> Option<&str> {
        self.reference.as_deref()
    }
}

/// The obligations of one party, in insertion order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ObligationSet {
    obligations: Vec<Obligation>,
}

impl ObligationSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, obligation: Obligation) {
        self.obligations.push(obligation);
    }

    /// Replace an obligation with the same ID, keeping its position.
    /// Returns the previous value.
    pub fn replace(&mut self, obligation: Obligation) -> Option<Obligation> {
        let slot = self.obligations.iter_mut().find(|o| o.id == obligation.id)?;
        Some(std::mem::replace(slot, obligation))
    }

    pub fn remove(&mut self, id: Uuid) -> Option<Obligation> {
        let idx = self.obligations.iter().position(|o| o.id == id)?;
        Some(self.obligations.remove(idx))
    }

    pub fn contains(&self, id: Uuid) -> bool {
        self.get(id).is_some()
    }

    pub fn get(&self, id: Uuid) -> Option<&Obligation> {
        self.obligations.iter().find(|o| o.id == id)
    }

    pub fn obligations(&self) -> &[Obligation] {
        &self.obligations
    }

    pub fn len(&self) -> usize {
        self.obligations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.obligations.is_empty()
    }

    /// Total positive amount due across all obligations, saturating at
    /// `Decimal::MAX`.
    pub fn total_due(&self) -> Decimal {
        self.obligations
            .iter()
            .map(|o| o.due())
            .filter(|d| *d > Decimal::ZERO)
            .fold(Decimal::ZERO, |acc, d| acc.saturating_add(d))
    }

    /// Obligations sorted by due date. Ties keep insertion order.
    pub fn chronological(&self) -> Vec<&Obligation> {
        let mut sorted: Vec<&Obligation> = self.obligations.iter().collect();
        sorted.sort_by_key(|o| o.due_date);
        sorted
    }
}

impl FromIterator<Obligation> for ObligationSet {
    fn from_iter<T: IntoIterator<Item = Obligation>>(iter: T) -> Self {
        Self {
            obligations: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, d).unwrap()
    }

    fn invoice(amount: Decimal, d: u32) -> Obligation {
        Obligation::new(PartyId::new("A"), amount, CurrencyCode::new("EUR"), day(d))
    }

    #[test]
    fn test_obligation_creation() {
        let ob = invoice(dec!(1000), 5);
        assert_eq!(ob.party().as_str(), "A");
        assert_eq!(ob.gross(), dec!(1000));
        assert_eq!(ob.credit_note(), Decimal::ZERO);
        assert_eq!(ob.due(), dec!(1000));
        assert_eq!(ob.currency().as_str(), "EUR");
    }

    #[test]
    fn test_credit_note_can_cancel_invoice() {
        let ob = invoice(dec!(300), 5).with_credit_note(dec!(300));
        assert_eq!(ob.due(), Decimal::ZERO);
    }

    #[test]
    fn test_total_due_skips_non_positive() {
        let mut set = ObligationSet::new();
        set.add(invoice(dec!(100), 1));
        set.add(invoice(dec!(200), 2));
        set.add(invoice(dec!(50), 3).with_credit_note(dec!(80)));
        assert_eq!(set.total_due(), dec!(300));
        assert_eq!(set.len(), 3);
    }

    #[test]
    fn test_chronological_is_stable() {
        let first = invoice(dec!(1), 10);
        let second = invoice(dec!(2), 10);
        let earliest = invoice(dec!(3), 2);
        let set: ObligationSet = vec![first.clone(), second.clone(), earliest.clone()]
            .into_iter()
            .collect();

        let ids: Vec<Uuid> = set.chronological().iter().map(|o| o.id()).collect();
        assert_eq!(ids, vec![earliest.id(), first.id(), second.id()]);
    }

    #[test]
    fn test_replace_and_remove() {
        let ob = invoice(dec!(100), 1);
        let id = ob.id();
        let mut set = ObligationSet::new();
        set.add(ob);

        let amended = Obligation::with_id(id, PartyId::new("A"), dec!(150), CurrencyCode::new("EUR"), day(1));
        let previous = set.replace(amended).unwrap();
        assert_eq!(previous.gross(), dec!(100));
        assert_eq!(set.get(id).unwrap().gross(), dec!(150));

        assert!(set.remove(id).is_some());
        assert!(set.is_empty());
        assert!(set.remove(id).is_none());
    }
}
