//! # Signature Verifier
//!
//! Checks the JWS compact token a credential may carry under its `jwt`
//! claim.
//!
//! ## Outcomes
//!
//! | Situation | Outcome | Valid |
//! |-----------|---------|-------|
//! | no `jwt` claim | [`SignatureCheck::NotApplicable`] | yes |
//! | token does not parse | [`SignatureCheck::Invalid`] | no |
//! | header has no `alg` | [`SignatureCheck::NoAlgorithm`] | yes, with warning |
//! | `alg` is `none` | [`SignatureCheck::Invalid`] | no |
//! | key URL given, `alg` not RSA | [`SignatureCheck::Invalid`] | no |
//! | key URL given, RSA key matches, signature holds | [`SignatureCheck::Verified`] | yes |
//! | key URL given, anything else | [`SignatureCheck::Invalid`] | no |
//! | no key URL, token well-formed with an `iss`, any `alg` | [`SignatureCheck::StructureOnly`] | yes, with warning |
//!
//! `StructureOnly` is not cryptographic proof. It only says the token has a
//! header, a non-empty signature segment, and a claimed issuer.
//!
//! Nothing here returns an error: fetch and parse failures become
//! `Invalid` with a reason.

use std::str::FromStr;
use std::sync::Arc;

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;
use jsonwebtoken::jwk::{AlgorithmParameters, Jwk, JwkSet};
use jsonwebtoken::{Algorithm, DecodingKey};
use serde_json::{Map, Value};

use credguard_client::KeySetFetcher;
use credguard_core::{Attributes, JWT_CLAIM};

/// Algorithms accepted for key-set verification.
const RSA_ALGORITHMS: [Algorithm; 6] = [
    Algorithm::RS256,
    Algorithm::RS384,
    Algorithm::RS512,
    Algorithm::PS256,
    Algorithm::PS384,
    Algorithm::PS512,
];

/// What the signature check concluded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SignatureCheck {
    /// The claims carry no token.
    NotApplicable,
    /// The header declares no algorithm; accepted as unsigned.
    NoAlgorithm,
    /// Well-formed, but no key set was available to check the signature.
    StructureOnly,
    /// Cryptographically verified against the issuer's key set.
    Verified,
    /// Rejected, with the reason.
    Invalid(String),
}

impl SignatureCheck {
    /// Whether the signature dimension passes.
    pub fn is_valid(&self) -> bool {
        !matches!(self, Self::Invalid(_))
    }

    /// Why the check failed, if it did.
    pub fn failure_reason(&self) -> Option<&str> {
        match self {
            Self::Invalid(reason) => Some(reason),
            _ => None,
        }
    }

    /// Caveat for passes that are not cryptographic proof.
    pub fn warning(&self) -> Option<&'static str> {
        match self {
            Self::NoAlgorithm => Some("Token declares no signing algorithm; signature not checked"),
            Self::StructureOnly => {
                Some("No issuer key set URL; token structure checked, signature not verified")
            }
            _ => None,
        }
    }
}

/// A JWS compact token split into its parts.
#[derive(Debug)]
struct CompactToken<'a> {
    header: Map<String, Value>,
    payload_segment: &'a str,
    signature: &'a str,
    signing_input: &'a str,
}

impl<'a> CompactToken<'a> {
    fn parse(token: &'a str) -> Result<Self, String> {
        let token = token.trim();
        let (signing_input, signature) = token
            .rsplit_once('.')
            .ok_or_else(|| "token is not a three-part JWS".to_string())?;
        let (header_segment, payload_segment) = signing_input
            .split_once('.')
            .ok_or_else(|| "token is not a three-part JWS".to_string())?;
        if payload_segment.contains('.') {
            return Err("token is not a three-part JWS".into());
        }
        let header = match decode_json(header_segment)? {
            Value::Object(map) => map,
            _ => return Err("token header is not a JSON object".into()),
        };
        Ok(Self {
            header,
            payload_segment,
            signature,
            signing_input,
        })
    }

    /// The declared `alg`; `Ok(None)` when the header has none.
    fn algorithm(&self) -> Result<Option<&str>, String> {
        match self.header.get("alg") {
            None | Some(Value::Null) => Ok(None),
            Some(Value::String(alg)) if alg.eq_ignore_ascii_case("none") => {
                Err("unsigned token (alg \"none\") rejected".into())
            }
            Some(Value::String(alg)) => Ok(Some(alg.as_str())),
            Some(_) => Err("token alg is not a string".into()),
        }
    }

    fn key_id(&self) -> Option<&str> {
        self.header.get("kid").and_then(Value::as_str)
    }

    /// Header present, signature segment present, payload names an issuer.
    fn check_structure(&self) -> Result<(), String> {
        if self.signature.is_empty() {
            return Err("token has an empty signature segment".into());
        }
        let payload = decode_json(self.payload_segment)?;
        match payload.get("iss").and_then(Value::as_str) {
            Some(iss) if !iss.trim().is_empty() => Ok(()),
            _ => Err("token payload has no issuer (iss)".into()),
        }
    }
}

/// The RSA algorithm named by `alg`, for key-set verification.
fn rsa_algorithm(alg: &str) -> Result<Algorithm, String> {
    let algorithm = Algorithm::from_str(alg).map_err(|_| format!("unknown algorithm {alg}"))?;
    if RSA_ALGORITHMS.contains(&algorithm) {
        Ok(algorithm)
    } else {
        Err(format!("unsupported algorithm {alg}; only RSA is supported"))
    }
}

fn decode_json(segment: &str) -> Result<Value, String> {
    let bytes = URL_SAFE_NO_PAD
        .decode(segment.trim_end_matches('='))
        .map_err(|e| format!("token segment is not base64url: {e}"))?;
    serde_json::from_slice(&bytes).map_err(|e| format!("token segment is not JSON: {e}"))
}

/// Pick the key for `kid`, or the sole key when the token names none.
fn select_key<'k>(keys: &'k JwkSet, kid: Option<&str>) -> Result<&'k Jwk, String> {
    match kid {
        Some(kid) => keys
            .find(kid)
            .ok_or_else(|| format!("no key with kid {kid} in issuer key set")),
        None if keys.keys.len() == 1 => Ok(&keys.keys[0]),
        None => Err(format!(
            "token has no kid and issuer key set has {} keys",
            keys.keys.len()
        )),
    }
}

fn verify_with_key(token: &CompactToken<'_>, jwk: &Jwk, algorithm: Algorithm) -> Result<(), String> {
    let AlgorithmParameters::RSA(rsa) = &jwk.algorithm else {
        return Err("issuer key is not an RSA key".into());
    };
    let key = DecodingKey::from_rsa_components(&rsa.n, &rsa.e)
        .map_err(|e| format!("issuer key is malformed: {e}"))?;
    match jsonwebtoken::crypto::verify(token.signature, token.signing_input.as_bytes(), &key, algorithm) {
        Ok(true) => Ok(()),
        Ok(false) => Err("signature does not match issuer key".into()),
        Err(e) => Err(format!("signature check failed: {e}")),
    }
}

/// Verifies embedded tokens, fetching issuer key sets on demand.
#[derive(Clone)]
pub struct SignatureVerifier {
    fetcher: Arc<dyn KeySetFetcher>,
}

impl std::fmt::Debug for SignatureVerifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SignatureVerifier").finish_non_exhaustive()
    }
}

impl SignatureVerifier {
    /// Verifier fetching key sets through `fetcher`.
    pub fn new(fetcher: Arc<dyn KeySetFetcher>) -> Self {
        Self { fetcher }
    }

    /// Whether the claims' token (if any) passes.
    pub async fn verify_credential_signature(
        &self,
        claims: &Attributes,
        issuer_public_key_url: Option<&str>,
    ) -> bool {
        self.check(claims, issuer_public_key_url).await.is_valid()
    }

    /// Full outcome of the signature check.
    pub async fn check(&self, claims: &Attributes, issuer_public_key_url: Option<&str>) -> SignatureCheck {
        let Some(raw) = claims
            .get(JWT_CLAIM)
            .and_then(Value::as_str)
            .filter(|s| !s.trim().is_empty())
        else {
            return SignatureCheck::NotApplicable;
        };

        let token = match CompactToken::parse(raw) {
            Ok(token) => token,
            Err(reason) => return SignatureCheck::Invalid(reason),
        };
        let alg = match token.algorithm() {
            Ok(Some(alg)) => alg,
            Ok(None) => {
                tracing::warn!("credential token declares no algorithm; accepting unsigned");
                return SignatureCheck::NoAlgorithm;
            }
            Err(reason) => return SignatureCheck::Invalid(reason),
        };

        let Some(url) = issuer_public_key_url.map(str::trim).filter(|u| !u.is_empty()) else {
            return match token.check_structure() {
                Ok(()) => SignatureCheck::StructureOnly,
                Err(reason) => SignatureCheck::Invalid(reason),
            };
        };

        let algorithm = match rsa_algorithm(alg) {
            Ok(algorithm) => algorithm,
            Err(reason) => return SignatureCheck::Invalid(reason),
        };
        let keys = match self.fetcher.fetch(url).await {
            Ok(keys) => keys,
            Err(err) => {
                tracing::warn!(url, error = %err, "issuer key set fetch failed");
                return SignatureCheck::Invalid(format!("could not fetch issuer key set: {err}"));
            }
        };
        let outcome = select_key(&keys, token.key_id())
            .and_then(|jwk| verify_with_key(&token, jwk, algorithm));
        match outcome {
            Ok(()) => SignatureCheck::Verified,
            Err(reason) => {
                tracing::debug!(url, reason = %reason, "token signature rejected");
                SignatureCheck::Invalid(reason)
            }
        }
    }
}
