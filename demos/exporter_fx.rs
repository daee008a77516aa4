//! Exporter FX example.
//!
//! Dollar wires at different exchange rates pay for exporter orders. Shows
//! the weighted rate of each order and the two conversion methods.

use chrono::NaiveDate;
use payment_allocator::allocation::allocator::PaymentAllocator;
use payment_allocator::allocation::policy::{AllocationPolicy, ConversionMethod};
use payment_allocator::core::account::PartyAccount;
use payment_allocator::core::currency::CurrencyCode;
use payment_allocator::core::obligation::Obligation;
use payment_allocator::core::party::{Party, PartyId, PartyKind};
use payment_allocator::core::transfer::Transfer;
use rust_decimal_macros::dec;

fn date(m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, m, d).unwrap()
}

fn main() {
    println!("╔═══════════════════════════════════════════╗");
    println!("║  payment-allocator: Exporter FX Example   ║");
    println!("╚═══════════════════════════════════════════╝\n");

    let exporter = PartyId::new("EXP-ANDES");
    let usd = CurrencyCode::new("USD");

    let account = PartyAccount::new(Party::new(exporter.clone(), PartyKind::Exporter, "Andes Export"))
        .with_obligation(Obligation::new(exporter.clone(), dec!(10_000), usd.clone(), date(3, 4)).with_reference("ORD-31"))
        .with_obligation(
            Obligation::new(exporter.clone(), dec!(12_000), usd.clone(), date(5, 6))
                .with_credit_note(dec!(2_000))
                .with_reference("ORD-32"),
        )
        .with_obligation(Obligation::new(exporter.clone(), dec!(9_000), usd.clone(), date(6, 3)).with_reference("ORD-33"))
        .with_transfer(Transfer::new(exporter.clone(), dec!(6_000), usd.clone(), date(2, 20)).with_exchange_rate(dec!(1.08)))
        .with_transfer(Transfer::new(exporter.clone(), dec!(9_000), usd.clone(), date(3, 15)).with_exchange_rate(dec!(1.10)))
        .with_transfer(Transfer::new(exporter.clone(), dec!(10_000), usd.clone(), date(5, 1)).with_exchange_rate(dec!(1.12)));

    println!("Orders:    31 (10,000)  32 (12,000 - 2,000 credit)  33 (9,000)");
    println!("Transfers: 6,000 @ 1.08  9,000 @ 1.10  10,000 @ 1.12\n");

    for (label, conversion) in [
        ("Weighted rate", ConversionMethod::WeightedRate),
        ("Per transfer", ConversionMethod::PerTransfer),
    ] {
        println!("━━━ {} conversion ━━━\n", label);
        let policy = AllocationPolicy {
            conversion,
            ..AllocationPolicy::default()
        };
        match PaymentAllocator::new(policy).reevaluate(&account) {
            Ok(result) => {
                for s in result.settlements() {
                    let reference = account
                        .obligations
                        .get(s.obligation)
                        .and_then(|o| o.reference())
                        .unwrap_or("-");
                    println!(
                        "  {:<8} allocated {:>10}  rate {:>10}  converted {:>10}  [{}]",
                        reference,
                        s.allocated,
                        s.weighted_rate.map(|r| r.round_dp(6).to_string()).unwrap_or_default(),
                        s.converted.map(|c| c.to_string()).unwrap_or_default(),
                        s.status
                    );
                }
                println!("\n  Available: {}\n", result.balance().available);
            }
            Err(e) => eprintln!("  allocation failed: {}", e),
        }
    }
}
