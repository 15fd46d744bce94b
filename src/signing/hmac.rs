use crate::error::{Result, StratexError};
use hmac::{Hmac, Mac};
use sha2::Sha256;
use std::fmt;
use url::form_urlencoded;

type HmacSha256 = Hmac<Sha256>;

/// API key pair for signed endpoints
#[derive(Clone)]
pub struct ApiCredentials {
    pub api_key: String,
    pub secret: String,
}

impl fmt::Debug for ApiCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiCredentials")
            .field("api_key", &mask(&self.api_key))
            .field("secret", &"***")
            .finish()
    }
}

fn mask(value: &str) -> String {
    let visible: String = value.chars().take(4).collect();
    format!("{visible}***")
}

impl ApiCredentials {
    pub fn new(api_key: impl Into<String>, secret: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            secret: secret.into(),
        }
    }

    /// Load from the named environment variables; empty values count as missing
    pub fn from_env(key_var: &str, secret_var: &str) -> Result<Self> {
        let read = |name: &str| {
            std::env::var(name)
                .ok()
                .filter(|v| !v.trim().is_empty())
                .ok_or_else(|| {
                    StratexError::Precondition(format!(
                        "{name} must be set (environment or .env file)"
                    ))
                })
        };

        Ok(Self::new(read(key_var)?, read(secret_var)?))
    }
}

/// Signs url-encoded query strings with HMAC-SHA256, hex encoded
#[derive(Clone, Debug)]
pub struct HmacAuth {
    credentials: ApiCredentials,
}

impl HmacAuth {
    pub fn new(credentials: ApiCredentials) -> Self {
        Self { credentials }
    }

    pub fn api_key(&self) -> &str {
        &self.credentials.api_key
    }

    /// Hex HMAC-SHA256 of `payload` under the API secret
    pub fn sign(&self, payload: &str) -> Result<String> {
        let mut mac = HmacSha256::new_from_slice(self.credentials.secret.as_bytes())
            .map_err(|e| StratexError::Signature(format!("HMAC init failed: {}", e)))?;
        mac.update(payload.as_bytes());
        Ok(hex::encode(mac.finalize().into_bytes()))
    }

    /// Url-encode `params` in order and append `&signature=<hex>`
    pub fn signed_query(&self, params: &[(&str, String)]) -> Result<String> {
        let query = encode_query(params);
        let signature = self.sign(&query)?;
        Ok(format!("{query}&signature={signature}"))
    }
}

pub fn encode_query(params: &[(&str, String)]) -> String {
    form_urlencoded::Serializer::new(String::new())
        .extend_pairs(params.iter().map(|(k, v)| (*k, v.as_str())))
        .finish()
}
