//! Visitor metadata captured on redirect
//!
//! Resolves the best-effort client origin recorded with every click.

pub mod ip_extractor;

pub use ip_extractor::{anonymize_ip, extract_client_ip};
