//! Resource groups of the gateway APIs.
//!
//! Each group borrows a [`GatewayClient`](crate::GatewayClient) and maps its methods
//! one-to-one onto REST endpoints. Responses are returned as parsed JSON; field-level
//! validation is left to the gateway.

mod address;
mod contact;
mod einvoice;
mod payout;
mod subscription;
mod transaction;

pub use address::Address;
pub use contact::Contacts;
pub use einvoice::EInvoices;
pub use payout::Payouts;
pub use subscription::Subscriptions;
pub use transaction::Transactions;
