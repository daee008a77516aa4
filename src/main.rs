//! payment-allocator CLI
//!
//! Reevaluate a party account from the command line.
//!
//! # Usage
//!
//! ```bash
//! # Allocate transfers against obligations from a JSON file
//! payment-allocator reevaluate --input account.json
//!
//! # Output as JSON, with a policy config
//! payment-allocator reevaluate --input account.json --format json --config allocator.json
//!
//! # Generate a random account for testing
//! payment-allocator generate --obligations 20 --transfers 15 --kind exporter
//! ```

use chrono::NaiveDate;
use log::debug;
use payment_allocator::allocation::allocator::{PaymentAllocator, Reevaluation};
use payment_allocator::allocation::summary::AllocationSummary;
use payment_allocator::config::AllocatorConfig;
use payment_allocator::core::account::PartyAccount;
use payment_allocator::core::currency::CurrencyCode;
use payment_allocator::core::obligation::Obligation;
use payment_allocator::core::party::{Party, PartyId, PartyKind};
use payment_allocator::core::transfer::Transfer;
use payment_allocator::simulation::generator::{generate_random_account, ScenarioConfig};
use rust_decimal::Decimal;
use std::fs;
use std::path::Path;
use std::process;

fn print_usage() {
    eprintln!(
        r#"payment-allocator: chronological payment allocation and balance reevaluation

USAGE:
    payment-allocator <COMMAND> [OPTIONS]

COMMANDS:
    reevaluate  Allocate transfers against obligations for one party
    generate    Generate a random party account (for testing)
    help        Show this message

OPTIONS (reevaluate):
    --input <FILE>      Path to JSON account file
    --format <FORMAT>   Output format: text (default) or json
    --config <FILE>     Policy config (default: $PAYMENT_ALLOCATOR_CONFIG)

OPTIONS (generate):
    --obligations <N>   Number of obligations (default: 20)
    --transfers <N>     Number of transfers (default: 15)
    --kind <KIND>       client, exporter, customs_agency, freight_agency
    --currency <CODE>   Currency code (default: USD)
    --output <FILE>     Write to file instead of stdout

ENVIRONMENT:
    RUST_LOG            Log level (error, warn, info, debug)

EXAMPLES:
    payment-allocator reevaluate --input account.json
    payment-allocator reevaluate --input account.json --format json
    payment-allocator generate --kind client --obligations 5 --output test.json"#
    );
}

/// JSON schema for an input account.
#[derive(serde::Deserialize, serde::Serialize)]
struct AccountFile {
    party: String,
    #[serde(default = "default_kind")]
    kind: PartyKind,
    #[serde(default)]
    name: String,
    #[serde(default)]
    obligations: Vec<ObligationInput>,
    #[serde(default)]
    transfers: Vec<TransferInput>,
}

fn default_kind() -> PartyKind {
    PartyKind::Client
}

fn default_currency() -> String {
    "USD".to_string()
}

#[derive(serde::Deserialize, serde::Serialize)]
struct ObligationInput {
    amount: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    credit_note: Option<String>,
    #[serde(default = "default_currency")]
    currency: String,
    date: NaiveDate,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    reference: Option<String>,
}

#[derive(serde::Deserialize, serde::Serialize)]
struct TransferInput {
    amount: String,
    #[serde(default = "default_currency")]
    currency: String,
    date: NaiveDate,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    rate: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    reference: Option<String>,
}

/// JSON output schema for a reevaluation.
#[derive(serde::Serialize)]
struct ReevaluationOutput {
    party: String,
    total_transferred: String,
    total_consumed: String,
    available: String,
    reserved: bool,
    total_pending: String,
    settlements: Vec<SettlementOutput>,
}

#[derive(serde::Serialize)]
struct SettlementOutput {
    reference: Option<String>,
    date: String,
    due: String,
    allocated: String,
    pending: String,
    status: String,
    weighted_rate: Option<String>,
    converted: Option<String>,
}

fn fail(message: impl std::fmt::Display) -> ! {
    eprintln!("Error: {}", message);
    process::exit(1);
}

fn parse_amount(raw: &str) -> Decimal {
    raw.parse().unwrap_or_else(|e| fail(format!("invalid amount '{}': {}", raw, e)))
}

fn load_account(path: &str) -> PartyAccount {
    let content = fs::read_to_string(path)
        .unwrap_or_else(|e| fail(format!("reading file '{}': {}", path, e)));

    let file: AccountFile = serde_json::from_str(&content).unwrap_or_else(|e| {
        eprintln!("Expected format:");
        eprintln!(
            r#"{{
  "party": "EXP-ANDES",
  "kind": "exporter",
  "obligations": [ {{ "amount": "12000", "credit_note": "500", "date": "2024-03-01" }} ],
  "transfers": [ {{ "amount": "8000", "date": "2024-02-20", "rate": "1.08" }} ]
}}"#
        );
        fail(format!("parsing JSON: {}", e))
    });

    let party = PartyId::new(&file.party);
    let name = if file.name.is_empty() { file.party.clone() } else { file.name };
    let mut account = PartyAccount::new(Party::new(party.clone(), file.kind, name));

    for ob in file.obligations {
        let mut obligation = Obligation::new(
            party.clone(),
            parse_amount(&ob.amount),
            CurrencyCode::new(&ob.currency),
            ob.date,
        );
        if let Some(nc) = &ob.credit_note {
            obligation = obligation.with_credit_note(parse_amount(nc));
        }
        if let Some(r) = ob.reference {
            obligation = obligation.with_reference(r);
        }
        account.add_obligation(obligation);
    }

    for t in file.transfers {
        let mut transfer = Transfer::new(
            party.clone(),
            parse_amount(&t.amount),
            CurrencyCode::new(&t.currency),
            t.date,
        );
        if let Some(rate) = &t.rate {
            transfer = transfer.with_exchange_rate(parse_amount(rate));
        }
        if let Some(r) = t.reference {
            transfer = transfer.with_reference(r);
        }
        account.add_transfer(transfer);
    }

    debug!(
        "loaded {}: {} obligations, {} transfers",
        party,
        account.obligations.len(),
        account.transfers.len()
    );
    account
}

fn load_config(path: Option<&str>) -> payment_allocator::Result<AllocatorConfig> {
    let config = match path {
        Some(p) => AllocatorConfig::from_file(Path::new(p))?,
        None => AllocatorConfig::from_env()?,
    };
    Ok(config)
}

fn reevaluate(config_path: Option<&str>, account: &PartyAccount) -> payment_allocator::Result<Reevaluation> {
    let config = load_config(config_path)?;
    let allocator = PaymentAllocator::new(config.policy_for(account.kind()));
    Ok(allocator.reevaluate(account)?)
}

fn next_value(args: &[String], i: &mut usize, flag: &str, what: &str) -> String {
    *i += 1;
    args.get(*i)
        .cloned()
        .unwrap_or_else(|| fail(format!("{} requires {}", flag, what)))
}

fn cmd_reevaluate(args: &[String]) {
    let mut input_path = None;
    let mut config_path = None;
    let mut format = "text".to_string();
    let mut i = 0;
    while i < args.len() {
        match args[i].as_str() {
            "--input" => input_path = Some(next_value(args, &mut i, "--input", "a file path")),
            "--config" => config_path = Some(next_value(args, &mut i, "--config", "a file path")),
            "--format" => format = next_value(args, &mut i, "--format", "'text' or 'json'"),
            other => fail(format!("unknown option: {}", other)),
        }
        i += 1;
    }

    let path = input_path.unwrap_or_else(|| fail("--input <FILE> is required"));
    let account = load_account(&path);
    let result = reevaluate(config_path.as_deref(), &account).unwrap_or_else(|e| fail(e));

    if format == "json" {
        let settlements = result
            .settlements()
            .iter()
            .map(|s| SettlementOutput {
                reference: account
                    .obligations
                    .get(s.obligation)
                    .and_then(|o| o.reference().map(str::to_string)),
                date: s.due_date.to_string(),
                due: s.due.to_string(),
                allocated: s.allocated.to_string(),
                pending: s.pending.to_string(),
                status: s.status.to_string(),
                weighted_rate: s.weighted_rate.map(|r| r.round_dp(6).to_string()),
                converted: s.converted.map(|c| c.to_string()),
            })
            .collect();

        let balance = result.balance();
        let output = ReevaluationOutput {
            party: result.party().to_string(),
            total_transferred: balance.total_transferred.to_string(),
            total_consumed: balance.total_consumed.to_string(),
            available: balance.available.to_string(),
            reserved: balance.reserved,
            total_pending: result.total_pending().to_string(),
            settlements,
        };

        let json = serde_json::to_string_pretty(&output).unwrap_or_else(|e| fail(e));
        println!("{}", json);
    } else {
        println!("{}", result);
        println!("{}", AllocationSummary::from_reevaluation(&result));
    }
}

fn cmd_generate(args: &[String]) {
    let mut config = ScenarioConfig::default();
    let mut output_path: Option<String> = None;
    let mut i = 0;
    while i < args.len() {
        match args[i].as_str() {
            "--obligations" => {
                config.obligation_count = next_value(args, &mut i, "--obligations", "a number")
                    .parse()
                    .unwrap_or_else(|_| fail("--obligations requires a number"));
            }
            "--transfers" => {
                config.transfer_count = next_value(args, &mut i, "--transfers", "a number")
                    .parse()
                    .unwrap_or_else(|_| fail("--transfers requires a number"));
            }
            "--kind" => {
                let raw = next_value(args, &mut i, "--kind", "a party kind");
                config.kind = PartyKind::parse(&raw)
                    .unwrap_or_else(|| fail(format!("unknown party kind: {}", raw)));
            }
            "--currency" => {
                config.currency = CurrencyCode::new(next_value(args, &mut i, "--currency", "a code"));
            }
            "--output" => output_path = Some(next_value(args, &mut i, "--output", "a file path")),
            other => fail(format!("unknown option: {}", other)),
        }
        i += 1;
    }

    let account = generate_random_account(&config);

    let output = AccountFile {
        party: account.id().to_string(),
        kind: account.kind(),
        name: account.party.name.clone(),
        obligations: account
            .obligations
            .obligations()
            .iter()
            .map(|o| ObligationInput {
                amount: o.gross().to_string(),
                credit_note: (o.credit_note() > Decimal::ZERO).then(|| o.credit_note().to_string()),
                currency: o.currency().to_string(),
                date: o.due_date(),
                reference: o.reference().map(str::to_string),
            })
            .collect(),
        transfers: account
            .transfers
            .transfers()
            .iter()
            .map(|t| TransferInput {
                amount: t.amount().to_string(),
                currency: t.currency().to_string(),
                date: t.date(),
                rate: t.exchange_rate().map(|r| r.to_string()),
                reference: t.reference().map(str::to_string),
            })
            .collect(),
    };

    let json = serde_json::to_string_pretty(&output).unwrap_or_else(|e| fail(e));

    if let Some(path) = output_path {
        fs::write(&path, &json).unwrap_or_else(|e| fail(format!("writing to '{}': {}", path, e)));
        eprintln!(
            "Generated {} obligations and {} transfers for {} → {}",
            account.obligations.len(),
            account.transfers.len(),
            account.id(),
            path
        );
    } else {
        println!("{}", json);
    }
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let args: Vec<String> = std::env::args().collect();

    if args.len() < 2 {
        print_usage();
        process::exit(1);
    }

    let command = args[1].as_str();
    let rest = &args[2..];

    match command {
        "reevaluate" => cmd_reevaluate(rest),
        "generate" => cmd_generate(rest),
        "help" | "--help" | "-h" => print_usage(),
        _ => {
            eprintln!("Unknown command: {}", command);
            print_usage();
            process::exit(1);
        }
    }
}
