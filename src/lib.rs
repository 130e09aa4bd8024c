//! Till
//!
//! Till is a point-of-sale engine for small retail: a typed cart over a CSV
//! inventory, atomic checkout onto an append-only sales ledger, reorder
//! analysis, and sales reporting.

pub mod cart;
pub mod checkout;
pub mod config;
pub mod discounts;
pub mod inventory;
pub mod ledger;
pub mod prelude;
pub mod products;
pub mod receipt;
pub mod reorder;
pub mod reporting;
pub mod storage;
