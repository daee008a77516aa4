//! # payment-allocator
//!
//! Chronological payment allocation and balance reevaluation.
//!
//! Given a party's obligations (invoices, orders, agency expenses) and the
//! transfers it has made or received, this crate allocates transfer funds to
//! obligations oldest-first and recomputes what is paid, what is pending and
//! what balance remains.
//!
//! ## Architecture
//!
//! - **core**: Parties, obligations, transfers, balances, currency rates
//! - **allocation**: Transfer pool, allocation policy, the allocator and summaries
//! - **book**: In-memory store that reevaluates a party on every change
//! - **inventory**: Warehouse stock drawn down by sale lines
//! - **simulation**: Random account generation for stress tests
//! - **config**: Per-party-kind allocation policy configuration

pub mod allocation;
pub mod book;
pub mod config;
pub mod core;
pub mod error;
pub mod inventory;
pub mod simulation;

pub use error::{Error, Result};

/// Convenience re-exports for common usage.
pub mod prelude {
    pub use crate::allocation::allocator::{PaymentAllocator, Reevaluation, Settlement, SettlementStatus};
    pub use crate::allocation::policy::{AllocationPolicy, BalancePolicy, ConversionMethod, ShortfallPolicy};
    pub use crate::book::payment_book::{PaymentBook, Reevaluated};
    pub use crate::config::AllocatorConfig;
    pub use crate::core::account::PartyAccount;
    pub use crate::core::balance::Balance;
    pub use crate::core::currency::CurrencyCode;
    pub use crate::core::obligation::Obligation;
    pub use crate::core::party::{Party, PartyId, PartyKind};
    pub use crate::core::transfer::Transfer;
    pub use crate::error::{AllocationError, Error, Result};
}
