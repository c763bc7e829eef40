//! Fee policy shared by the commit-reveal and bundle flows.

pub mod policy;

pub use policy::{gwei, parse_gwei, quote, FeePolicy, FeeQuote};
