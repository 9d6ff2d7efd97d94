//! Route modules, one per API area.

pub mod issuance;
pub mod verification;
