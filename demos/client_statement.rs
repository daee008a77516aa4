//! Client account statement example.
//!
//! Records sales and payments for a client through the payment book and
//! prints the statement after each change, first under the unified rules
//! and then under the historical client rules.

use chrono::NaiveDate;
use payment_allocator::allocation::summary::AllocationSummary;
use payment_allocator::book::payment_book::PaymentBook;
use payment_allocator::config::AllocatorConfig;
use payment_allocator::core::currency::CurrencyCode;
use payment_allocator::core::obligation::Obligation;
use payment_allocator::core::party::{Party, PartyId, PartyKind};
use payment_allocator::core::transfer::Transfer;
use rust_decimal_macros::dec;

fn date(m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, m, d).unwrap()
}

fn run(title: &str, config: AllocatorConfig) {
    println!("━━━ {} ━━━\n", title);

    let mut book = PaymentBook::new(config);
    let client = PartyId::new("CLI-NORTE");
    let eur = CurrencyCode::new("EUR");
    book.register_party(Party::new(client.clone(), PartyKind::Client, "Frutas del Norte"))
        .unwrap();

    let sales = [
        (dec!(1_200), date(1, 10), "FAC-0101"),
        (dec!(900), date(1, 17), "FAC-0102"),
        (dec!(300), date(1, 24), "FAC-0103"),
    ];
    for (amount, day, reference) in sales {
        book.record_obligation(
            Obligation::new(client.clone(), amount, eur.clone(), day).with_reference(reference),
        )
        .unwrap();
    }

    book.record_transfer(
        Transfer::new(client.clone(), dec!(2_000), eur.clone(), date(1, 30)).with_reference("WIRE-77"),
    )
    .unwrap();

    if let Some(result) = book.result(&client) {
        println!("{}", result);
        println!("{}", AllocationSummary::from_reevaluation(result));
    }

    // A late credit note on the second sale
    let second = book
        .account(&client)
        .and_then(|acc| acc.obligations.obligations().get(1).cloned());
    if let Some(second) = second {
        book.amend_obligation(second.with_credit_note(dec!(100))).unwrap();
        println!("After a 100 EUR credit note on FAC-0102:");
        if let Some(result) = book.result(&client) {
            println!("{}", result);
        }
    }
}

fn main() {
    println!("╔════════════════════════════════════════════════╗");
    println!("║  payment-allocator: Client Statement Example   ║");
    println!("╚════════════════════════════════════════════════╝\n");

    run("Unified rules", AllocatorConfig::default());
    run("Historical client rules", AllocatorConfig::legacy());
}
