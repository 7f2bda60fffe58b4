//! Request-scoped value types.
//!
//! Nothing here is persisted; the parent service owns balances and transactions.

/// Caller identity and its normalizer
pub mod identity;
/// Balance and earnings payloads
pub mod balance;
/// Checkout request and product descriptor
pub mod checkout;
/// Check-and-debit request
pub mod debit;
/// Listed transaction records
pub mod transaction;
