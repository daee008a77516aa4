use crate::allocation::allocator::{Reevaluation, SettlementStatus};
use crate::core::party::PartyId;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Aggregate view of a reevaluation for statements and dashboards.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AllocationSummary {
    pub party: PartyId,
    pub paid: usize,
    pub partially_paid: usize,
    pub unpaid: usize,
    pub total_due: Decimal,
    pub total_allocated: Decimal,
    pub total_pending: Decimal,
    pub available: Decimal,
    /// Due date of the oldest obligation that is not fully paid.
    pub oldest_pending: Option<NaiveDate>,
}

impl AllocationSummary {
    pub fn from_reevaluation(result: &Reevaluation) -> Self {
        let mut paid = 0;
        let mut partially_paid = 0;
        let mut unpaid = 0;
        let mut oldest_pending = None;

        for s in result.settlements() {
            match s.status {
                SettlementStatus::Paid => paid += 1,
                SettlementStatus::PartiallyPaid => partially_paid += 1,
                SettlementStatus::Unpaid => unpaid += 1,
            }
            if !s.is_paid() && oldest_pending.is_none() {
                // settlements are already in due-date order
                oldest_pending = Some(s.due_date);
            }
        }

        AllocationSummary {
            party: result.party().clone(),
            paid,
            partially_paid,
            unpaid,
            total_due: result.total_due(),
            total_allocated: result.total_allocated(),
            total_pending: result.total_pending(),
            available: result.balance().available,
            oldest_pending,
        }
    }

    pub fn obligation_count(&self) -> usize {
        self.paid + self.partially_paid + self.unpaid
    }

    /// Share of the amount due that has been covered, in [0, 1].
    pub fn coverage_ratio(&self) -> f64 {
        if self.total_due == Decimal::ZERO {
            return 1.0;
        }
        let ratio = self.total_allocated / self.total_due;
        ratio.to_string().parse::<f64>().unwrap_or(0.0)
    }
}

impl std::fmt::Display for AllocationSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "=== Summary: {} ===", self.party)?;
        writeln!(f, "Obligations:    {}", self.obligation_count())?;
        writeln!(f, "  Paid:         {}", self.paid)?;
        writeln!(f, "  Partial:      {}", self.partially_paid)?;
        writeln!(f, "  Unpaid:       {}", self.unpaid)?;
        writeln!(f, "Total Due:      {}", self.total_due)?;
        writeln!(f, "Allocated:      {}", self.total_allocated)?;
        writeln!(f, "Pending:        {}", self.total_pending)?;
        writeln!(f, "Coverage:       {:.1}%", self.coverage_ratio() * 100.0)?;
        if let Some(date) = self.oldest_pending {
            writeln!(f, "Oldest Pending: {}", date)?;
        }
        Ok(())
    }
}
