use crate::core::currency::CurrencyCode;
use crate::core::transfer::Transfer;
use crate::error::AllocationError;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One portion of a transfer consumed by an obligation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferDraw {
    pub transfer: Uuid,
    pub amount: Decimal,
    pub exchange_rate: Option<Decimal>,
}

#[derive(Debug, Clone)]
struct Slot {
    id: Uuid,
    currency: CurrencyCode,
    rate: Option<Decimal>,
    remaining: Decimal,
}

/// Transfer funds available for allocation, consumed oldest-first.
///
/// Slots are kept in chronological order. `cursor` points at the oldest
/// slot that still has a remaining balance, so a full pass over all
/// obligations is linear in the number of transfers.
#[derive(Debug, Clone)]
pub struct TransferPool {
    slots: Vec<Slot>,
    cursor: usize,
    total: Decimal,
    consumed: Decimal,
}

impl TransferPool {
    /// Build a pool from transfers already sorted by date.
    ///
    /// Fails when the transfers together exceed what a `Decimal` can hold.
    /// Every later amount is bounded by the total, so nothing else in the
    /// pool can overflow.
    pub fn new<'a>(
        transfers: impl IntoIterator<Item = &'a Transfer>,
    ) -> Result<Self, AllocationError> {
        let slots: Vec<Slot> = transfers
            .into_iter()
            .map(|t| Slot {
                id: t.id(),
                currency: t.currency().clone(),
                rate: t.exchange_rate(),
                remaining: t.amount(),
            })
            .collect();
        let total = slots
            .iter()
            .try_fold(Decimal::ZERO, |acc, s| acc.checked_add(s.remaining))
            .ok_or(AllocationError::Overflow {
                context: "transfer total",
            })?;
        Ok(Self {
            slots,
            cursor: 0,
            total,
            consumed: Decimal::ZERO,
        })
    }

    pub fn total(&self) -> Decimal {
        self.total
    }

    pub fn consumed(&self) -> Decimal {
        self.consumed
    }

    pub fn remaining(&self) -> Decimal {
        self.total - self.consumed
    }

    pub fn is_exhausted(&self) -> bool {
        self.remaining() <= Decimal::ZERO
    }

    /// Currencies of the transfers that a draw of `amount` would touch,
    /// without consuming anything.
    pub fn currencies_for(&self, amount: Decimal) -> Vec<(Uuid, &CurrencyCode)> {
        let mut out = Vec::new();
        let mut left = amount;
        for slot in &self.slots[self.cursor..] {
            if left <= Decimal::ZERO {
                break;
            }
            if slot.remaining <= Decimal::ZERO {
                continue;
            }
            out.push((slot.id, &slot.currency));
            left -= slot.remaining.min(left);
        }
        out
    }

    /// Consume up to `amount` from the oldest transfers. Returns the draws
    /// made; their sum is `min(amount, remaining())`.
    pub fn draw(&mut self, amount: Decimal) -> Vec<TransferDraw> {
        let mut draws = Vec::new();
        let mut left = amount;

        while left > Decimal::ZERO && self.cursor < self.slots.len() {
            let slot = &mut self.slots[self.cursor];
            if slot.remaining <= Decimal::ZERO {
                self.cursor += 1;
                continue;
            }

            let used = slot.remaining.min(left);
            slot.remaining -= used;
            left -= used;
            self.consumed += used;

            draws.push(TransferDraw {
                transfer: slot.id,
                amount: used,
                exchange_rate: slot.rate,
            });

            if slot.remaining <= Decimal::ZERO {
                self.cursor += 1;
            }
        }

        draws
    }

    /// Remaining balance of each transfer, in pool order.
    pub fn remaining_by_transfer(&self) -> Vec<(Uuid, Decimal)> {
        self.slots.iter().map(|s| (s.id, s.remaining)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::party::PartyId;
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;

    fn transfer(amount: Decimal, d: u32) -> Transfer {
        Transfer::new(
            PartyId::new("A"),
            amount,
            CurrencyCode::new("USD"),
            NaiveDate::from_ymd_opt(2024, 1, d).unwrap(),
        )
    }

    #[test]
    fn test_draw_spans_transfers() {
        let t1 = transfer(dec!(100), 1);
        let t2 = transfer(dec!(50), 2);
        let mut pool = TransferPool::new([&t1, &t2]).unwrap();

        let draws = pool.draw(dec!(120));
        assert_eq!(draws.len(), 2);
        assert_eq!(draws[0].transfer, t1.id());
        assert_eq!(draws[0].amount, dec!(100));
        assert_eq!(draws[1].transfer, t2.id());
        assert_eq!(draws[1].amount, dec!(20));
        assert_eq!(pool.remaining(), dec!(30));
    }

    #[test]
    fn test_draw_stops_when_exhausted() {
        let t1 = transfer(dec!(40), 1);
        let mut pool = TransferPool::new([&t1]).unwrap();

        let draws = pool.draw(dec!(100));
        assert_eq!(draws.iter().map(|d| d.amount).sum::<Decimal>(), dec!(40));
        assert!(pool.is_exhausted());
        assert!(pool.draw(dec!(1)).is_empty());
        assert!(pool.currencies_for(dec!(1)).is_empty());
    }

    #[test]
    fn test_partial_slot_is_reused() {
        let t1 = transfer(dec!(100), 1);
        let mut pool = TransferPool::new([&t1]).unwrap();

        pool.draw(dec!(30));
        let draws = pool.draw(dec!(30));
        assert_eq!(draws.len(), 1);
        assert_eq!(draws[0].transfer, t1.id());
        assert_eq!(pool.consumed(), dec!(60));
        assert_eq!(pool.remaining_by_transfer(), vec![(t1.id(), dec!(40))]);
    }

    #[test]
    fn test_currencies_for_does_not_consume() {
        let t1 = transfer(dec!(10), 1);
        let t2 = transfer(dec!(10), 2);
        let pool = TransferPool::new([&t1, &t2]).unwrap();

        assert_eq!(pool.currencies_for(dec!(5)).len(), 1);
        assert_eq!(pool.currencies_for(dec!(15)).len(), 2);
        assert_eq!(pool.remaining(), dec!(20));
    }

    #[test]
    fn test_transfer_total_overflow_is_an_error() {
        let t1 = transfer(Decimal::MAX, 1);
        let t2 = transfer(Decimal::MAX, 2);
        let err = TransferPool::new([&t1, &t2]).unwrap_err();
        assert_eq!(err, AllocationError::Overflow { context: "transfer total" });
    }
}
