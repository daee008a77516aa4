use crate::core::party::PartyKind;
use serde::{Deserialize, Serialize};

/// What happens when the pool cannot fully cover an obligation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShortfallPolicy {
    /// Put whatever is left towards the obligation and move on.
    #[default]
    Partial,
    /// Leave the obligation untouched and stop allocating. Obligations are
    /// either fully paid or not paid at all.
    StopAtFirstShortfall,
}

/// How the party balance is reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BalancePolicy {
    /// Report zero while any obligation is unpaid.
    #[default]
    ReserveAgainstDebt,
    /// Always report unconsumed transfer funds.
    Leftover,
}

/// How settlement amounts are converted with the transfer rates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConversionMethod {
    /// Allocated amount divided by the weighted average rate.
    #[default]
    WeightedRate,
    /// Each draw divided by its own transfer's rate, summed.
    PerTransfer,
}

/// Knobs of a single reevaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AllocationPolicy {
    pub shortfall: ShortfallPolicy,
    pub balance: BalancePolicy,
    pub conversion: ConversionMethod,
    /// Decimal places of converted amounts.
    pub converted_scale: u32,
}

impl Default for AllocationPolicy {
    fn default() -> Self {
        Self {
            shortfall: ShortfallPolicy::Partial,
            balance: BalancePolicy::ReserveAgainstDebt,
            conversion: ConversionMethod::WeightedRate,
            converted_scale: 2,
        }
    }
}

impl AllocationPolicy {
    /// Policy reproducing the accounting rules historically applied to each
    /// kind of party.
    ///
    /// Client sales were paid all-or-nothing with the leftover always
    /// shown; exporter orders took partial payments and showed the leftover;
    /// agency expenses took partial payments and reserved funds against
    /// debt, freight converting each transfer portion at its own rate.
    pub fn legacy(kind: PartyKind) -> Self {
        let base = Self::default();
        match kind {
            PartyKind::Client => Self {
                shortfall: ShortfallPolicy::StopAtFirstShortfall,
                balance: BalancePolicy::Leftover,
                ..base
            },
            PartyKind::Exporter => Self {
                balance: BalancePolicy::Leftover,
                ..base
            },
            PartyKind::CustomsAgency => base,
            PartyKind::FreightAgency => Self {
                conversion: ConversionMethod::PerTransfer,
                ..base
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_policy() {
        let p = AllocationPolicy::default();
        assert_eq!(p.shortfall, ShortfallPolicy::Partial);
        assert_eq!(p.balance, BalancePolicy::ReserveAgainstDebt);
        assert_eq!(p.conversion, ConversionMethod::WeightedRate);
        assert_eq!(p.converted_scale, 2);
    }

    #[test]
    fn test_legacy_client_is_all_or_nothing() {
        let p = AllocationPolicy::legacy(PartyKind::Client);
        assert_eq!(p.shortfall, ShortfallPolicy::StopAtFirstShortfall);
        assert_eq!(p.balance, BalancePolicy::Leftover);
    }

    #[test]
    fn test_partial_json_fills_defaults() {
        let p: AllocationPolicy = serde_json::from_str(r#"{"balance":"leftover"}"#).unwrap();
        assert_eq!(p.balance, BalancePolicy::Leftover);
        assert_eq!(p.converted_scale, 2);
        assert_eq!(p.shortfall, ShortfallPolicy::Partial);
    }
}
