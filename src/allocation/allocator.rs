use crate::allocation::policy::{AllocationPolicy, BalancePolicy, ConversionMethod, ShortfallPolicy};
use crate::allocation::pool::{TransferDraw, TransferPool};
use crate::core::account::PartyAccount;
use crate::core::balance::Balance;
use crate::core::currency::{convert, CurrencyCode, RateBlend};
use crate::core::obligation::Obligation;
use crate::core::party::PartyId;
use crate::error::AllocationError;
use chrono::NaiveDate;
use log::{debug, info};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use uuid::Uuid;

/// Payment state of one obligation after allocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SettlementStatus {
    /// Nothing allocated.
    Unpaid,
    /// Some funds allocated, a remainder is pending.
    PartiallyPaid,
    /// Fully covered, or nothing was due.
    Paid,
}

impl SettlementStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SettlementStatus::Unpaid => "unpaid",
            SettlementStatus::PartiallyPaid => "partially_paid",
            SettlementStatus::Paid => "paid",
        }
    }
}

impl fmt::Display for SettlementStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of allocation for a single obligation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settlement {
    pub obligation: Uuid,
    pub due_date: NaiveDate,
    pub currency: CurrencyCode,
    /// Gross minus credit note, floored at zero.
    pub due: Decimal,
    pub allocated: Decimal,
    pub pending: Decimal,
    pub status: SettlementStatus,
    /// Transfer portions consumed, oldest first.
    pub draws: Vec<TransferDraw>,
    /// Amount-weighted rate of the rated draws.
    pub weighted_rate: Option<Decimal>,
    /// Allocated amount in the reporting currency.
    pub converted: Option<Decimal>,
}

impl Settlement {
    pub fn is_paid(&self) -> bool {
        self.status == SettlementStatus::Paid
    }
}

/// Result of reevaluating one party.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reevaluation {
    party: PartyId,
    policy: AllocationPolicy,
    /// One entry per obligation, in allocation order.
    settlements: Vec<Settlement>,
    balance: Balance,
}

impl Reevaluation {
    pub fn party(&self) -> &PartyId {
        &self.party
    }

    pub fn policy(&self) -> &AllocationPolicy {
        &self.policy
    }

    pub fn settlements(&self) -> &[Settlement] {
        &self.settlements
    }

    pub fn settlement(&self, obligation: Uuid) -> Option<&Settlement> {
        self.settlements.iter().find(|s| s.obligation == obligation)
    }

    pub fn balance(&self) -> &Balance {
        &self.balance
    }

    pub fn total_due(&self) -> Decimal {
        self.settlements.iter().map(|s| s.due).sum()
    }

    pub fn total_allocated(&self) -> Decimal {
        self.settlements.iter().map(|s| s.allocated).sum()
    }

    pub fn total_pending(&self) -> Decimal {
        self.settlements.iter().map(|s| s.pending).sum()
    }

    /// Whether every obligation is paid.
    pub fn is_settled(&self) -> bool {
        self.settlements.iter().all(Settlement::is_paid)
    }

    /// Internal consistency: per-obligation allocation never exceeds the
    /// amount due, and total allocation equals what the pool gave out.
    pub fn is_consistent(&self) -> bool {
        let per_obligation = self.settlements.iter().all(|s| {
            s.allocated <= s.due
                && s.allocated + s.pending == s.due
                && s.draws.iter().map(|d| d.amount).sum::<Decimal>() == s.allocated
        });
        per_obligation
            && self.total_allocated() == self.balance.total_consumed
            && self.balance.total_consumed <= self.balance.total_transferred
    }
}

/// Greedy chronological allocator of transfer funds against obligations.
///
/// Stateless apart from its policy. The same account always yields the same
/// reevaluation, so it is safe to re-run after any change.
#[derive(Debug, Clone, Default)]
pub struct PaymentAllocator {
    policy: AllocationPolicy,
}

impl PaymentAllocator {
    pub fn new(policy: AllocationPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> &AllocationPolicy {
        &self.policy
    }

    /// Reevaluate every obligation of a party against its transfers.
    ///
    /// # Algorithm
    ///
    /// 1. Sort obligations by due date and transfers by date (stable).
    /// 2. For each obligation, `due = gross - credit_note`; if `due <= 0`
    ///    it is paid and consumes nothing.
    /// 3. Otherwise draw from the oldest transfers with funds left until the
    ///    obligation is covered or the pool runs dry.
    /// 4. Rated draws feed a weighted average rate and a converted amount.
    /// 5. The balance is transfers minus consumed, reported as zero while
    ///    debt remains under [`BalancePolicy::ReserveAgainstDebt`].
    ///
    /// Inputs are validated first; any error aborts with no result.
    pub fn reevaluate(&self, account: &PartyAccount) -> Result<Reevaluation, AllocationError> {
        validate(account)?;

        let party = account.id();
        let mut pool = TransferPool::new(account.transfers.chronological())?;
        let mut settlements = Vec::with_capacity(account.obligations.len());
        let mut halted = false;

        for obligation in account.obligations.chronological() {
            let due = obligation.due();
            if due <= Decimal::ZERO {
                settlements.push(self.settle(obligation, Decimal::ZERO, Vec::new())?);
                continue;
            }

            let fundable = match self.policy.shortfall {
                ShortfallPolicy::Partial => !pool.is_exhausted(),
                ShortfallPolicy::StopAtFirstShortfall => {
                    if !halted && pool.remaining() < due {
                        debug!(
                            "{}: stopping at obligation {} (due {}, {} left)",
                            party,
                            obligation.id(),
                            due,
                            pool.remaining()
                        );
                        halted = true;
                    }
                    !halted
                }
            };

            let draws = if fundable {
                check_currencies(&pool, obligation, due)?;
                pool.draw(due)
            } else {
                Vec::new()
            };

            let settlement = self.settle(obligation, due, draws)?;
            debug!(
                "{}: obligation {} due {} allocated {} -> {}",
                party, settlement.obligation, settlement.due, settlement.allocated, settlement.status
            );
            settlements.push(settlement);
        }

        let has_debt = settlements.iter().any(|s| !s.is_paid());
        let reserved = has_debt && self.policy.balance == BalancePolicy::ReserveAgainstDebt;
        let balance = Balance {
            party: party.clone(),
            available: if reserved {
                Decimal::ZERO
            } else {
                pool.remaining()
            },
            total_transferred: pool.total(),
            total_consumed: pool.consumed(),
            reserved,
        };

        info!(
            "{}: reevaluated {} obligations against {} transfers, consumed {} of {}, available {}",
            party,
            settlements.len(),
            account.transfers.len(),
            balance.total_consumed,
            balance.total_transferred,
            balance.available
        );

        Ok(Reevaluation {
            party: party.clone(),
            policy: self.policy,
            settlements,
            balance,
        })
    }

    fn settle(
        &self,
        obligation: &Obligation,
        due: Decimal,
        draws: Vec<TransferDraw>,
    ) -> Result<Settlement, AllocationError> {
        let allocated: Decimal = draws.iter().map(|d| d.amount).sum();
        let pending = due - allocated;

        let status = if pending <= Decimal::ZERO {
            SettlementStatus::Paid
        } else if allocated > Decimal::ZERO {
            SettlementStatus::PartiallyPaid
        } else {
            SettlementStatus::Unpaid
        };

        let mut blend = RateBlend::new();
        for draw in &draws {
            blend.add(draw.amount, draw.exchange_rate)?;
        }
        let weighted_rate = blend.weighted_rate();
        let converted = match self.policy.conversion {
            // rates are validated positive, so a missing quotient is an overflow
            ConversionMethod::WeightedRate => weighted_rate
                .map(|rate| {
                    convert(allocated, rate, self.policy.converted_scale).ok_or(AllocationError::Overflow {
                        context: "conversion",
                    })
                })
                .transpose()?,
            ConversionMethod::PerTransfer => blend
                .per_portion_converted()
                .map(|c| c.round_dp(self.policy.converted_scale)),
        };

        Ok(Settlement {
            obligation: obligation.id(),
            due_date: obligation.due_date(),
            currency: obligation.currency().clone(),
            due,
            allocated,
            pending,
            status,
            draws,
            weighted_rate,
            converted,
        })
    }
}

fn validate(account: &PartyAccount) -> Result<(), AllocationError> {
    let party = account.id();
    let mut seen = HashSet::new();
    let mut total_due = Decimal::ZERO;

    for ob in account.obligations.obligations() {
        if !seen.insert(ob.id()) {
            return Err(AllocationError::DuplicateObligation(ob.id()));
        }
        if ob.party() != party {
            return Err(AllocationError::ForeignObligation {
                id: ob.id(),
                expected: party.clone(),
                found: ob.party().clone(),
            });
        }
        if ob.gross() < Decimal::ZERO {
            return Err(AllocationError::NegativeAmount {
                id: ob.id(),
                field: "gross",
                amount: ob.gross(),
            });
        }
        if ob.credit_note() < Decimal::ZERO {
            return Err(AllocationError::NegativeAmount {
                id: ob.id(),
                field: "credit_note",
                amount: ob.credit_note(),
            });
        }
        // per-settlement totals are bounded by this sum
        total_due = total_due
            .checked_add(ob.due().max(Decimal::ZERO))
            .ok_or(AllocationError::Overflow {
                context: "obligation total",
            })?;
    }

    seen.clear();
    for t in account.transfers.transfers() {
        if !seen.insert(t.id()) {
            return Err(AllocationError::DuplicateTransfer(t.id()));
        }
        if t.party() != party {
            return Err(AllocationError::ForeignTransfer {
                id: t.id(),
                expected: party.clone(),
                found: t.party().clone(),
            });
        }
        if t.amount() <= Decimal::ZERO {
            return Err(AllocationError::NonPositiveTransfer {
                id: t.id(),
                amount: t.amount(),
            });
        }
        if let Some(rate) = t.exchange_rate() {
            if rate <= Decimal::ZERO {
                return Err(AllocationError::InvalidRate { id: t.id(), rate });
            }
        }
    }

    Ok(())
}

fn check_currencies(
    pool: &TransferPool,
    obligation: &Obligation,
    due: Decimal,
) -> Result<(), AllocationError> {
    for (transfer, currency) in pool.currencies_for(due) {
        if currency != obligation.currency() {
            return Err(AllocationError::CurrencyMismatch {
                transfer,
                transfer_currency: currency.clone(),
                obligation: obligation.id(),
                obligation_currency: obligation.currency().clone(),
            });
        }
    }
    Ok(())
}

impl fmt::Display for Reevaluation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "=== Reevaluation: {} ===", self.party)?;
        writeln!(f, "Transferred:    {}", self.balance.total_transferred)?;
        writeln!(f, "Consumed:       {}", self.balance.total_consumed)?;
        writeln!(f, "Available:      {}", self.balance.available)?;
        if self.balance.reserved {
            writeln!(f, "Reserved:       {} (held against debt)", self.balance.unconsumed())?;
        }
        writeln!(f, "Pending:        {}", self.total_pending())?;

        for s in &self.settlements {
            write!(
                f,
                "\n  {}  {:>14} {}  allocated {:>14}  pending {:>14}  [{}]",
                s.due_date, s.due, s.currency, s.allocated, s.pending, s.status
            )?;
            if let (Some(rate), Some(converted)) = (s.weighted_rate, s.converted) {
                write!(f, "  rate {} -> {}", rate.round_dp(6), converted)?;
            }
        }
        writeln!(f)
    }
}
