//! Random party accounts for stress testing and benchmarks.

use crate::core::account::PartyAccount;
use crate::core::currency::CurrencyCode;
use crate::core::obligation::Obligation;
use crate::core::party::{Party, PartyId, PartyKind};
use crate::core::transfer::Transfer;
use chrono::{Days, NaiveDate};
use rand::Rng;
use rust_decimal::Decimal;

/// Configuration for generating a random party account.
#[derive(Debug, Clone)]
pub struct ScenarioConfig {
    pub kind: PartyKind,
    pub currency: CurrencyCode,
    pub obligation_count: usize,
    pub transfer_count: usize,
    /// Obligation amounts are drawn from [min_amount, max_amount).
    pub min_amount: Decimal,
    pub max_amount: Decimal,
    /// Chance that an obligation carries a credit note.
    pub credit_note_probability: f64,
    /// Chance that a transfer carries an exchange rate.
    pub rated_probability: f64,
    /// Dates are spread over this many days from `start`.
    pub span_days: u64,
    pub start: NaiveDate,
}

impl Default for ScenarioConfig {
    fn default() -> Self {
        Self {
            kind: PartyKind::Exporter,
            currency: CurrencyCode::new("USD"),
            obligation_count: 20,
            transfer_count: 15,
            min_amount: Decimal::from(500),
            max_amount: Decimal::from(50_000),
            credit_note_probability: 0.1,
            rated_probability: 0.8,
            span_days: 180,
            start: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap_or(NaiveDate::MIN),
        }
    }
}

/// Generate a random account for one party.
pub fn generate_random_account(config: &ScenarioConfig) -> PartyAccount {
    let mut rng = rand::thread_rng();
    let party = PartyId::new(format!("{}-{:04}", config.kind.as_str().to_uppercase(), rng.gen_range(0..10_000)));
    let mut account = PartyAccount::new(Party::new(party.clone(), config.kind, "Generated party"));

    let min_f64: f64 = config.min_amount.to_string().parse().unwrap_or(500.0);
    let max_f64: f64 = config.max_amount.to_string().parse().unwrap_or(50_000.0);
    let random_amount = |rng: &mut rand::rngs::ThreadRng| {
        let value = rng.gen_range(min_f64..max_f64.max(min_f64 + 1.0));
        Decimal::from_f64_retain(value)
            .unwrap_or(Decimal::from(1000))
            .round_dp(2)
    };

    let random_date = |rng: &mut rand::rngs::ThreadRng| {
        let offset = rng.gen_range(0..config.span_days.max(1));
        config
            .start
            .checked_add_days(Days::new(offset))
            .unwrap_or(config.start)
    };

    for i in 0..config.obligation_count {
        let gross = random_amount(&mut rng);
        let mut ob = Obligation::new(party.clone(), gross, config.currency.clone(), random_date(&mut rng))
            .with_reference(format!("INV-{:05}", i));
        if rng.gen_bool(config.credit_note_probability.clamp(0.0, 1.0)) {
            let share = Decimal::from(rng.gen_range(1..=100u32)) / Decimal::from(100);
            ob = ob.with_credit_note((gross * share).round_dp(2));
        }
        account.add_obligation(ob);
    }

    for i in 0..config.transfer_count {
        let amount = random_amount(&mut rng);
        if amount <= Decimal::ZERO {
            continue;
        }
        let mut t = Transfer::new(party.clone(), amount, config.currency.clone(), random_date(&mut rng))
            .with_reference(format!("TRF-{:05}", i));
        if rng.gen_bool(config.rated_probability.clamp(0.0, 1.0)) {
            // 1.00 to 1.30 units per reporting unit
            let rate = Decimal::new(rng.gen_range(100..=130), 2);
            t = t.with_exchange_rate(rate);
        }
        account.add_transfer(t);
    }

    account
}
