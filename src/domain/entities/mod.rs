//! Core domain entities.
//!
//! - [`UrlRecord`] - A short code bound to an original URL
//! - [`RateDecision`] - Outcome of counting a request against a rate window

pub mod rate_decision;
pub mod url_record;

pub use rate_decision::RateDecision;
pub use url_record::UrlRecord;
