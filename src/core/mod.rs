pub mod account;
pub mod balance;
pub mod currency;
pub mod obligation;
pub mod party;
pub mod transfer;
