//! Proof Key for Code Exchange (RFC 7636).

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use sha2::{Digest, Sha256};
use sims_domain::PkceMethod;

/// Verifier/challenge pair for one authorization request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pkce {
    /// Secret sent with the code exchange.
    pub verifier: String,
    /// Derived value sent with the authorization request.
    pub challenge: String,
    /// How the challenge was derived.
    pub method: PkceMethod,
}

impl Pkce {
    /// Generates a fresh random verifier (43 characters).
    #[must_use]
    pub fn generate(method: PkceMethod) -> Self {
        let bytes: [u8; 32] = rand::random();
        Self::from_verifier(URL_SAFE_NO_PAD.encode(bytes), method)
    }

    /// Derives the challenge for a known verifier.
    #[must_use]
    pub fn from_verifier(verifier: String, method: PkceMethod) -> Self {
        let challenge = match method {
            PkceMethod::S256 => URL_SAFE_NO_PAD.encode(Sha256::digest(verifier.as_bytes())),
            PkceMethod::Plain => verifier.clone(),
        };
        Self {
            verifier,
            challenge,
            method,
        }
    }
}

/// Random value for the `state` and `nonce` parameters.
#[must_use]
pub fn random_state() -> String {
    let bytes: [u8; 16] = rand::random();
    URL_SAFE_NO_PAD.encode(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_s256_matches_rfc_example() {
        let pkce = Pkce::from_verifier(
            "dBjftJeZ4CVP-mB92K27uhbUJU1p1r_wW1gFWFOEjXk".to_string(),
            PkceMethod::S256,
        );
        assert_eq!(pkce.challenge, "E9Melhoa2OwvFrEMTJguCHaoeK1t8URWbuGJSstw-cM");
    }

    #[test]
    fn test_plain_challenge_is_verifier() {
        let pkce = Pkce::from_verifier("abc".to_string(), PkceMethod::Plain);
        assert_eq!(pkce.challenge, "abc");
    }

    #[test]
    fn test_generated_values_are_fresh() {
        let a = Pkce::generate(PkceMethod::S256);
        let b = Pkce::generate(PkceMethod::S256);
        assert_eq!(a.verifier.len(), 43);
        assert_ne!(a.verifier, b.verifier);
        assert_ne!(random_state(), random_state());
    }
}
