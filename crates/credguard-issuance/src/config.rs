//! Issuing identity configuration.

use credguard_core::issuer::{DEFAULT_ISSUER_ID, DEFAULT_ISSUER_NAME};
use credguard_core::{CredGuardError, Issuer};

/// Load the issuing identity from the environment.
///
/// Variables:
/// - `CREDGUARD_ISSUER_DID` (default: `did:web:credguard.com:issuer`)
/// - `CREDGUARD_ISSUER_NAME` (default: `CredGuard Identity Services`)
///
/// The service always trusts its own issuer.
///
/// # Errors
///
/// [`CredGuardError::ConfigurationInvalid`] when either variable is set but
/// blank.
pub fn issuer_from_env() -> Result<Issuer, CredGuardError> {
    let id = std::env::var("CREDGUARD_ISSUER_DID").unwrap_or_else(|_| DEFAULT_ISSUER_ID.into());
    let name =
        std::env::var("CREDGUARD_ISSUER_NAME").unwrap_or_else(|_| DEFAULT_ISSUER_NAME.into());
    Issuer::new(id, name, true).map_err(|e| CredGuardError::ConfigurationInvalid(e.to_string()))
}
