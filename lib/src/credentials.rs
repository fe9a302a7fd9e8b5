use std::{env, fmt};

use crate::error::{Error, Init};

pub const API_KEY_VAR: &str = "BINANCE_API_KEY";
pub const API_SECRET_VAR: &str = "BINANCE_API_SECRET";

/// Exchange API credentials, read once at startup.
#[derive(Clone)]
pub struct Credentials {
    pub api_key: String,
    pub api_secret: String,
}

impl Credentials {
    pub fn new(api_key: impl Into<String>, api_secret: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            api_secret: api_secret.into(),
        }
    }

    /// Reads `BINANCE_API_KEY` and `BINANCE_API_SECRET`. Both must be set
    /// and non-empty.
    pub fn from_env() -> Result<Self, Error> {
        Ok(Self::from_lookup(|name| env::var(name).ok())?)
    }

    pub(crate) fn from_lookup(
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, Init> {
        let get = |name: &'static str| {
            lookup(name)
                .filter(|value| !value.trim().is_empty())
                .ok_or(Init::CredentialMissing(name))
        };
        Ok(Self::new(get(API_KEY_VAR)?, get(API_SECRET_VAR)?))
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("api_key", &"<redacted>")
            .field("api_secret", &"<redacted>")
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup(
        vars: &[(&str, &str)],
    ) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name: &str| vars.get(name).cloned()
    }

    #[test]
    fn reads_both_credentials() {
        let creds = Credentials::from_lookup(lookup(&[
            (API_KEY_VAR, "key"),
            (API_SECRET_VAR, "secret"),
        ]))
        .unwrap();
        assert_eq!(creds.api_key, "key");
        assert_eq!(creds.api_secret, "secret");
    }

    #[test]
    fn missing_secret_is_an_error() {
        let err =
            Credentials::from_lookup(lookup(&[(API_KEY_VAR, "key")])).unwrap_err();
        assert!(matches!(err, Init::CredentialMissing(API_SECRET_VAR)));
    }

    #[test]
    fn empty_key_is_an_error() {
        let err = Credentials::from_lookup(lookup(&[
            (API_KEY_VAR, "  "),
            (API_SECRET_VAR, "secret"),
        ]))
        .unwrap_err();
        assert!(matches!(err, Init::CredentialMissing(API_KEY_VAR)));
    }

    #[test]
    fn debug_hides_secrets() {
        let creds = Credentials::new("abc123", "hunter2");
        let debug = format!("{creds:?}");
        assert!(!debug.contains("abc123"));
        assert!(!debug.contains("hunter2"));
    }
}
