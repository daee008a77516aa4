use crate::allocation::allocator::{PaymentAllocator, Reevaluation};
use crate::config::AllocatorConfig;
use crate::core::account::PartyAccount;
use crate::core::balance::{Balance, BalanceSheet};
use crate::core::obligation::Obligation;
use crate::core::party::{Party, PartyId};
use crate::core::transfer::Transfer;
use crate::error::AllocationError;
use log::{info, warn};
use std::collections::{BTreeMap, BTreeSet};
use uuid::Uuid;

/// Outcome of a reevaluation request on the book.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reevaluated {
    /// New records, settlements and balance were committed.
    Committed(Reevaluation),
    /// The party was already being reevaluated further up the call stack.
    Skipped,
}

impl Reevaluated {
    pub fn committed(&self) -> Option<&Reevaluation> {
        match self {
            Reevaluated::Committed(r) => Some(r),
            Reevaluated::Skipped => None,
        }
    }
}

/// Notified after every committed reevaluation.
///
/// Observers get mutable access to the book and may record further changes.
/// Changes recorded from inside an observer are committed but do not notify
/// observers again, and a plain reevaluation of the party being observed is
/// skipped.
pub trait BookObserver {
    fn on_commit(&mut self, book: &mut PaymentBook, result: &Reevaluation);
}

/// In-memory store of party accounts with reevaluate-on-write semantics.
///
/// Every mutation is applied to a copy of the party's account, reevaluated,
/// and only then swapped in together with the new settlements and balance.
/// A mutation that fails validation leaves the book untouched.
pub struct PaymentBook {
    config: AllocatorConfig,
    accounts: BTreeMap<PartyId, PartyAccount>,
    results: BTreeMap<PartyId, Reevaluation>,
    balances: BalanceSheet,
    /// Parties whose observers are currently being notified.
    in_progress: BTreeSet<PartyId>,
    observers: Vec<Box<dyn BookObserver>>,
}

impl Default for PaymentBook {
    fn default() -> Self {
        Self::new(AllocatorConfig::default())
    }
}

impl PaymentBook {
    pub fn new(config: AllocatorConfig) -> Self {
        Self {
            config,
            accounts: BTreeMap::new(),
            results: BTreeMap::new(),
            balances: BalanceSheet::new(),
            in_progress: BTreeSet::new(),
            observers: Vec::new(),
        }
    }

    pub fn config(&self) -> &AllocatorConfig {
        &self.config
    }

    pub fn add_observer(&mut self, observer: Box<dyn BookObserver>) {
        self.observers.push(observer);
    }

    /// Register a party with an empty account and a zero balance.
    pub fn register_party(&mut self, party: Party) -> Result<(), AllocationError> {
        if self.accounts.contains_key(&party.id) {
            return Err(AllocationError::DuplicateParty(party.id));
        }
        let id = party.id.clone();
        self.accounts.insert(id.clone(), PartyAccount::new(party));
        self.balances.record(Balance::empty(id));
        Ok(())
    }

    /// Load a complete account, replacing any existing one for that party.
    pub fn load_account(&mut self, account: PartyAccount) -> Result<Reevaluated, AllocationError> {
        let id = account.id().clone();
        self.commit(&id, account)
    }

    pub fn parties(&self) -> impl Iterator<Item = &Party> {
        self.accounts.values().map(|a| &a.party)
    }

    pub fn account(&self, party: &PartyId) -> Option<&PartyAccount> {
        self.accounts.get(party)
    }

    /// Last committed reevaluation, if the party has had any activity.
    pub fn result(&self, party: &PartyId) -> Option<&Reevaluation> {
        self.results.get(party)
    }

    pub fn balance(&self, party: &PartyId) -> Option<&Balance> {
        self.balances.get(party)
    }

    pub fn balances(&self) -> &BalanceSheet {
        &self.balances
    }

    pub fn is_in_progress(&self, party: &PartyId) -> bool {
        self.in_progress.contains(party)
    }

    pub fn record_obligation(&mut self, obligation: Obligation) -> Result<Reevaluated, AllocationError> {
        let party = obligation.party().clone();
        self.apply(&party, |acc| {
            if acc.obligations.contains(obligation.id()) {
                return Err(AllocationError::DuplicateObligation(obligation.id()));
            }
            acc.add_obligation(obligation);
            Ok(())
        })
    }

    /// Replace a stored obligation with a new version carrying the same ID.
    pub fn amend_obligation(&mut self, obligation: Obligation) -> Result<Reevaluated, AllocationError> {
        let party = obligation.party().clone();
        self.apply(&party, |acc| {
            let id = obligation.id();
            acc.obligations
                .replace(obligation)
                .map(|_| ())
                .ok_or(AllocationError::UnknownObligation(id))
        })
    }

    pub fn remove_obligation(&mut self, party: &PartyId, id: Uuid) -> Result<Reevaluated, AllocationError> {
        self.apply(party, |acc| {
            acc.obligations
                .remove(id)
                .map(|_| ())
                .ok_or(AllocationError::UnknownObligation(id))
        })
    }

    pub fn record_transfer(&mut self, transfer: Transfer) -> Result<Reevaluated, AllocationError> {
        let party = transfer.party().clone();
        self.apply(&party, |acc| {
            if acc.transfers.contains(transfer.id()) {
                return Err(AllocationError::DuplicateTransfer(transfer.id()));
            }
            acc.add_transfer(transfer);
            Ok(())
        })
    }

    pub fn amend_transfer(&mut self, transfer: Transfer) -> Result<Reevaluated, AllocationError> {
        let party = transfer.party().clone();
        self.apply(&party, |acc| {
            let id = transfer.id();
            acc.transfers
                .replace(transfer)
                .map(|_| ())
                .ok_or(AllocationError::UnknownTransfer(id))
        })
    }

    pub fn remove_transfer(&mut self, party: &PartyId, id: Uuid) -> Result<Reevaluated, AllocationError> {
        self.apply(party, |acc| {
            acc.transfers
                .remove(id)
                .map(|_| ())
                .ok_or(AllocationError::UnknownTransfer(id))
        })
    }

    /// Reevaluate a party without changing its records.
    ///
    /// Returns [`Reevaluated::Skipped`] when called for a party whose commit
    /// is currently being observed; that commit is already current.
    pub fn reevaluate(&mut self, party: &PartyId) -> Result<Reevaluated, AllocationError> {
        if self.in_progress.contains(party) {
            warn!("{}: reevaluation already in progress, skipping", party);
            return Ok(Reevaluated::Skipped);
        }
        let account = self
            .accounts
            .get(party)
            .cloned()
            .ok_or_else(|| AllocationError::UnknownParty(party.clone()))?;
        self.commit(party, account)
    }

    /// Reevaluate every registered party.
    pub fn reevaluate_all(&mut self) -> Result<Vec<Reevaluated>, AllocationError> {
        let parties: Vec<PartyId> = self.accounts.keys().cloned().collect();
        parties.iter().map(|p| self.reevaluate(p)).collect()
    }

    fn apply<F>(&mut self, party: &PartyId, mutate: F) -> Result<Reevaluated, AllocationError>
    where
        F: FnOnce(&mut PartyAccount) -> Result<(), AllocationError>,
    {
        let mut scratch = self
            .accounts
            .get(party)
            .cloned()
            .ok_or_else(|| AllocationError::UnknownParty(party.clone()))?;
        mutate(&mut scratch)?;
        self.commit(party, scratch)
    }

    fn commit(&mut self, party: &PartyId, account: PartyAccount) -> Result<Reevaluated, AllocationError> {
        let policy = self.config.policy_for(account.kind());
        let result = PaymentAllocator::new(policy).reevaluate(&account)?;

        self.accounts.insert(party.clone(), account);
        self.balances.record(result.balance().clone());
        self.results.insert(party.clone(), result.clone());
        info!("{}: committed reevaluation", party);

        if self.in_progress.insert(party.clone()) {
            self.notify(&result);
            self.in_progress.remove(party);
        }

        // A nested change made by an observer may have superseded `result`.
        let current = self.results.get(party).cloned().unwrap_or(result);
        Ok(Reevaluated::Committed(current))
    }

    fn notify(&mut self, result: &Reevaluation) {
        if self.observers.is_empty() {
            return;
        }
        let mut observers = std::mem::take(&mut self.observers);
        for observer in observers.iter_mut() {
            observer.on_commit(self, result);
        }
        // keep observers registered during notification
        observers.append(&mut self.observers);
        self.observers = observers;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::allocation::allocator::SettlementStatus;
    use crate::core::currency::CurrencyCode;
    use crate::core::party::PartyKind;
    use chrono::NaiveDate;
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 7, d).unwrap()
    }

    fn usd() -> CurrencyCode {
        CurrencyCode::new("USD")
    }

    fn book_with(id: &str, kind: PartyKind) -> (PaymentBook, PartyId) {
        let mut book = PaymentBook::default();
        let party = PartyId::new(id);
        book.register_party(Party::new(party.clone(), kind, id)).unwrap();
        (book, party)
    }

    #[test]
    fn test_register_twice_fails() {
        let (mut book, party) = book_with("EXP", PartyKind::Exporter);
        let err = book
            .register_party(Party::new(party.clone(), PartyKind::Exporter, "again"))
            .unwrap_err();
        assert_eq!(err, AllocationError::DuplicateParty(party.clone()));
        assert_eq!(book.balance(&party).unwrap().available, Decimal::ZERO);
    }

    #[test]
    fn test_transfer_triggers_reevaluation() {
        let (mut book, party) = book_with("EXP", PartyKind::Exporter);
        let order = Obligation::new(party.clone(), dec!(500), usd(), day(1));
        let order_id = order.id();

        book.record_obligation(order).unwrap();
        assert_eq!(
            book.result(&party).unwrap().settlement(order_id).unwrap().status,
            SettlementStatus::Unpaid
        );

        book.record_transfer(Transfer::new(party.clone(), dec!(200), usd(), day(2)))
            .unwrap();
        let s = book.result(&party).unwrap().settlement(order_id).unwrap().clone();
        assert_eq!(s.status, SettlementStatus::PartiallyPaid);
        assert_eq!(s.pending, dec!(300));

        book.record_transfer(Transfer::new(party.clone(), dec!(400), usd(), day(3)))
            .unwrap();
        assert!(book.result(&party).unwrap().is_settled());
        assert_eq!(book.balance(&party).unwrap().available, dec!(100));
    }

    #[test]
    fn test_remove_transfer_reopens_debt() {
        let (mut book, party) = book_with("CLI", PartyKind::Client);
        book.record_obligation(Obligation::new(party.clone(), dec!(100), usd(), day(1)))
            .unwrap();
        let payment = Transfer::new(party.clone(), dec!(100), usd(), day(1));
        let payment_id = payment.id();
        book.record_transfer(payment).unwrap();
        assert!(book.result(&party).unwrap().is_settled());

        book.remove_transfer(&party, payment_id).unwrap();
        assert!(!book.result(&party).unwrap().is_settled());
        assert_eq!(
            book.remove_transfer(&party, payment_id).unwrap_err(),
            AllocationError::UnknownTransfer(payment_id)
        );
    }

    #[test]
    fn test_amend_obligation() {
        let (mut book, party) = book_with("ADU", PartyKind::CustomsAgency);
        let expense = Obligation::new(party.clone(), dec!(100), usd(), day(1));
        let id = expense.id();
        book.record_obligation(expense.clone()).unwrap();
        book.record_transfer(Transfer::new(party.clone(), dec!(80), usd(), day(1)))
            .unwrap();
        assert!(!book.result(&party).unwrap().is_settled());

        book.amend_obligation(expense.with_credit_note(dec!(20))).unwrap();
        assert!(book.result(&party).unwrap().settlement(id).unwrap().is_paid());
    }

    #[test]
    fn test_failed_mutation_leaves_book_unchanged() {
        let (mut book, party) = book_with("EXP", PartyKind::Exporter);
        book.record_obligation(Obligation::new(party.clone(), dec!(100), usd(), day(1)))
            .unwrap();
        book.record_transfer(Transfer::new(party.clone(), dec!(60), usd(), day(1)))
            .unwrap();

        let account_before = book.account(&party).unwrap().clone();
        let result_before = book.result(&party).unwrap().clone();

        let bad = Transfer::new(party.clone(), dec!(50), usd(), day(2)).with_exchange_rate(dec!(-1));
        assert!(matches!(
            book.record_transfer(bad),
            Err(AllocationError::InvalidRate { .. })
        ));

        assert_eq!(book.account(&party).unwrap(), &account_before);
        assert_eq!(book.result(&party).unwrap(), &result_before);
        assert_eq!(book.balance(&party).unwrap(), result_before.balance());
    }

    #[test]
    fn test_duplicate_records_are_rejected() {
        let (mut book, party) = book_with("EXP", PartyKind::Exporter);
        let order = Obligation::new(party.clone(), dec!(100), usd(), day(1));
        let order_id = order.id();
        book.record_obligation(order.clone()).unwrap();
        assert_eq!(
            book.record_obligation(order).unwrap_err(),
            AllocationError::DuplicateObligation(order_id)
        );

        let wire = Transfer::new(party.clone(), dec!(40), usd(), day(2));
        let wire_id = wire.id();
        book.record_transfer(wire.clone()).unwrap();
        assert_eq!(
            book.record_transfer(wire).unwrap_err(),
            AllocationError::DuplicateTransfer(wire_id)
        );

        let result = book.result(&party).unwrap();
        assert_eq!(result.settlements().len(), 1);
        assert_eq!(result.total_due(), dec!(100));
        assert_eq!(result.balance().total_transferred, dec!(40));

        // removing the only copy clears the debt
        book.remove_obligation(&party, order_id).unwrap();
        assert!(book.result(&party).unwrap().settlements().is_empty());
    }

    #[test]
    fn test_load_account_rejects_duplicate_ids() {
        let mut book = PaymentBook::default();
        let party = PartyId::new("CLI");
        let sale = Obligation::new(party.clone(), dec!(100), usd(), day(1));
        let account = PartyAccount::new(Party::new(party.clone(), PartyKind::Client, "Cliente"))
            .with_obligation(sale.clone())
            .with_obligation(sale.clone());

        assert_eq!(
            book.load_account(account).unwrap_err(),
            AllocationError::DuplicateObligation(sale.id())
        );
        assert!(book.account(&party).is_none());
    }

    #[test]
    fn test_overflow_rolls_back_mutation() {
        let (mut book, party) = book_with("EXP", PartyKind::Exporter);
        book.record_transfer(Transfer::new(party.clone(), Decimal::MAX, usd(), day(1)))
            .unwrap();
        let before = book.result(&party).unwrap().clone();

        let err = book
            .record_transfer(Transfer::new(party.clone(), Decimal::MAX, usd(), day(2)))
            .unwrap_err();
        assert_eq!(err, AllocationError::Overflow { context: "transfer total" });
        assert_eq!(book.account(&party).unwrap().transfers.len(), 1);
        assert_eq!(book.result(&party).unwrap(), &before);
    }

    #[test]
    fn test_unknown_party() {
        let mut book = PaymentBook::default();
        let ghost = PartyId::new("GHOST");
        let err = book
            .record_transfer(Transfer::new(ghost.clone(), dec!(1), usd(), day(1)))
            .unwrap_err();
        assert_eq!(err, AllocationError::UnknownParty(ghost));
    }

    #[test]
    fn test_legacy_config_applies_per_kind() {
        let mut book = PaymentBook::new(AllocatorConfig::legacy());
        let party = PartyId::new("CLI");
        book.register_party(Party::new(party.clone(), PartyKind::Client, "Cliente"))
            .unwrap();
        book.record_obligation(Obligation::new(party.clone(), dec!(500), usd(), day(1)))
            .unwrap();
        book.record_transfer(Transfer::new(party.clone(), dec!(100), usd(), day(1)))
            .unwrap();

        // all-or-nothing with leftover shown
        assert_eq!(book.balance(&party).unwrap().available, dec!(100));
    }

    struct Recorder {
        seen: Rc<RefCell<Vec<PartyId>>>,
    }

    impl BookObserver for Recorder {
        fn on_commit(&mut self, _book: &mut PaymentBook, result: &Reevaluation) {
            self.seen.borrow_mut().push(result.party().clone());
        }
    }

    /// Re-enters the book for the party being observed.
    struct Reentrant {
        outcomes: Rc<RefCell<Vec<Reevaluated>>>,
    }

    impl BookObserver for Reentrant {
        fn on_commit(&mut self, book: &mut PaymentBook, result: &Reevaluation) {
            let outcome = book.reevaluate(result.party()).unwrap();
            self.outcomes.borrow_mut().push(outcome);
        }
    }

    #[test]
    fn test_observer_sees_each_commit() {
        let (mut book, party) = book_with("EXP", PartyKind::Exporter);
        let seen = Rc::new(RefCell::new(Vec::new()));
        book.add_observer(Box::new(Recorder { seen: seen.clone() }));

        book.record_transfer(Transfer::new(party.clone(), dec!(10), usd(), day(1)))
            .unwrap();
        book.record_transfer(Transfer::new(party.clone(), dec!(10), usd(), day(2)))
            .unwrap();
        assert_eq!(seen.borrow().len(), 2);
    }

    #[test]
    fn test_reentrant_reevaluation_is_skipped() {
        let (mut book, party) = book_with("EXP", PartyKind::Exporter);
        let outcomes = Rc::new(RefCell::new(Vec::new()));
        book.add_observer(Box::new(Reentrant {
            outcomes: outcomes.clone(),
        }));

        let outcome = book
            .record_transfer(Transfer::new(party.clone(), dec!(10), usd(), day(1)))
            .unwrap();
        assert!(outcome.committed().is_some());
        assert_eq!(outcomes.borrow().as_slice(), &[Reevaluated::Skipped]);
        assert!(!book.is_in_progress(&party));
    }

    /// Credits a fixed amount to a second party whenever the first commits.
    struct Mirror {
        target: PartyId,
    }

    impl BookObserver for Mirror {
        fn on_commit(&mut self, book: &mut PaymentBook, result: &Reevaluation) {
            if result.party() != &self.target {
                let t = Transfer::new(self.target.clone(), dec!(5), CurrencyCode::new("USD"), day(1));
                book.record_transfer(t).unwrap();
            }
        }
    }

    #[test]
    fn test_observer_may_touch_other_parties() {
        let (mut book, source) = book_with("SRC", PartyKind::Client);
        let target = PartyId::new("DST");
        book.register_party(Party::new(target.clone(), PartyKind::Exporter, "dst"))
            .unwrap();
        book.add_observer(Box::new(Mirror {
            target: target.clone(),
        }));

        book.record_transfer(Transfer::new(source, dec!(10), usd(), day(1)))
            .unwrap();
        assert_eq!(book.balance(&target).unwrap().available, dec!(5));
    }

    #[test]
    fn test_reevaluate_all() {
        let (mut book, _) = book_with("A", PartyKind::Client);
        book.register_party(Party::new(PartyId::new("B"), PartyKind::Exporter, "b"))
            .unwrap();
        let outcomes = book.reevaluate_all().unwrap();
        assert_eq!(outcomes.len(), 2);
        assert!(outcomes.iter().all(|o| o.committed().is_some()));
    }
}
