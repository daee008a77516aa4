//! Error types for allocation, stock and configuration.

use crate::core::currency::CurrencyCode;
use crate::core::party::PartyId;
use rust_decimal::Decimal;
use thiserror::Error;
use uuid::Uuid;

/// Result type for crate operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Top-level crate error.
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Allocation(#[from] AllocationError),

    #[error(transparent)]
    Stock(#[from] StockError),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Errors that abort a reevaluation. No partial result is produced.
#[derive(Debug, Error, PartialEq)]
pub enum AllocationError {
    #[error("obligation {id} belongs to {found}, not {expected}")]
    ForeignObligation {
        id: Uuid,
        expected: PartyId,
        found: PartyId,
    },

    #[error("transfer {id} belongs to {found}, not {expected}")]
    ForeignTransfer {
        id: Uuid,
        expected: PartyId,
        found: PartyId,
    },

    #[error("obligation {id} has negative {field}: {amount}")]
    NegativeAmount {
        id: Uuid,
        field: &'static str,
        amount: Decimal,
    },

    #[error("transfer {id} amount must be positive, got {amount}")]
    NonPositiveTransfer { id: Uuid, amount: Decimal },

    #[error("transfer {id} exchange rate must be positive, got {rate}")]
    InvalidRate { id: Uuid, rate: Decimal },

    #[error("transfer {transfer} in {transfer_currency} cannot fund obligation {obligation} in {obligation_currency}")]
    CurrencyMismatch {
        transfer: Uuid,
        transfer_currency: CurrencyCode,
        obligation: Uuid,
        obligation_currency: CurrencyCode,
    },

    #[error("unknown party: {0}")]
    UnknownParty(PartyId),

    #[error("party already registered: {0}")]
    DuplicateParty(PartyId),

    #[error("unknown obligation: {0}")]
    UnknownObligation(Uuid),

    #[error("unknown transfer: {0}")]
    UnknownTransfer(Uuid),

    #[error("obligation already recorded: {0}")]
    DuplicateObligation(Uuid),

    #[error("transfer already recorded: {0}")]
    DuplicateTransfer(Uuid),

    #[error("amount overflow in {context}")]
    Overflow { context: &'static str },
}

/// Warehouse stock errors.
#[derive(Debug, Error, PartialEq)]
pub enum StockError {
    #[error("no stock record for presentation {0}")]
    UnknownPresentation(String),

    #[error("insufficient stock for {presentation}: requested {requested}, available {available}")]
    InsufficientStock {
        presentation: String,
        requested: u32,
        available: u32,
    },

    #[error("unknown sale line: {0}")]
    UnknownLine(Uuid),
}

/// Configuration loading errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_json::Error,
    },
}
