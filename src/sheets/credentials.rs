//! Google service account credentials and JWT assertion signing.

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use base64::prelude::BASE64_URL_SAFE_NO_PAD;
use base64::Engine;
use chrono::{DateTime, Duration, Utc};
use ring::signature::RsaKeyPair;
use serde::{Deserialize, Serialize};

/// Read-only access to spreadsheets.
pub const SHEETS_READONLY_SCOPE: &str = "https://www.googleapis.com/auth/spreadsheets.readonly";

/// Token endpoint used when the key file does not name one.
pub const DEFAULT_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";

/// Lifetime requested for each signed assertion.
const ASSERTION_LIFETIME_MINUTES: i64 = 60;

/// Errors loading or using service account credentials.
#[derive(Debug, thiserror::Error)]
pub enum CredentialError {
    #[error("Failed to read credential file '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Invalid service account JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Invalid private key: {0}")]
    InvalidKey(String),
    #[error("Failed to sign token request")]
    Signing,
}

/// Key file layout as downloaded from the cloud console.
#[derive(Deserialize)]
struct ServiceAccountKey {
    client_email: String,
    private_key: String,
    #[serde(default = "default_token_uri")]
    token_uri: String,
    #[serde(default)]
    project_id: Option<String>,
}

fn default_token_uri() -> String {
    DEFAULT_TOKEN_URI.to_string()
}

#[derive(Serialize)]
struct JwtHeader {
    alg: &'static str,
    typ: &'static str,
}

#[derive(Serialize)]
struct JwtClaims<'a> {
    iss: &'a str,
    scope: &'a str,
    aud: &'a str,
    exp: i64,
    iat: i64,
}

/// A parsed service account with its signing key ready to use.
#[derive(Clone)]
pub struct ServiceAccount {
    client_email: String,
    token_uri: String,
    project_id: Option<String>,
    key_pair: Arc<RsaKeyPair>,
}

impl fmt::Debug for ServiceAccount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServiceAccount")
            .field("client_email", &self.client_email)
            .field("token_uri", &self.token_uri)
            .field("project_id", &self.project_id)
            .finish_non_exhaustive()
    }
}

impl ServiceAccount {
    /// Parse a service account key from its JSON text.
    pub fn from_json(input: &str) -> Result<Self, CredentialError> {
        let key: ServiceAccountKey = serde_json::from_str(input)?;
        let key_pair = parse_private_key(&key.private_key)?;

        Ok(Self {
            client_email: key.client_email,
            token_uri: key.token_uri,
            project_id: key.project_id,
            key_pair: Arc::new(key_pair),
        })
    }

    /// Load a service account key file.
    pub fn from_file(path: &Path) -> Result<Self, CredentialError> {
        let contents = std::fs::read_to_string(path).map_err(|source| CredentialError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&contents)
    }

    pub fn client_email(&self) -> &str {
        &self.client_email
    }

    pub fn token_uri(&self) -> &str {
        &self.token_uri
    }

    pub fn project_id(&self) -> Option<&str> {
        self.project_id.as_deref()
    }

    /// Build a signed RS256 assertion for the JWT bearer grant.
    pub fn sign_assertion(&self, scope: &str, now: DateTime<Utc>) -> Result<String, CredentialError> {
        let claims = JwtClaims {
            iss: &self.client_email,
            scope,
            aud: &self.token_uri,
            iat: now.timestamp(),
            exp: (now + Duration::minutes(ASSERTION_LIFETIME_MINUTES)).timestamp(),
        };
        let header = JwtHeader {
            alg: "RS256",
            typ: "JWT",
        };

        let header_b64 = BASE64_URL_SAFE_NO_PAD.encode(serde_json::to_vec(&header)?);
        let claims_b64 = BASE64_URL_SAFE_NO_PAD.encode(serde_json::to_vec(&claims)?);
        let signing_input = format!("{}.{}", header_b64, claims_b64);

        let mut signature = vec![0; self.key_pair.public().modulus_len()];
        self.key_pair
            .sign(
                &ring::signature::RSA_PKCS1_SHA256,
                &ring::rand::SystemRandom::new(),
                signing_input.as_bytes(),
                &mut signature,
            )
            .map_err(|_| CredentialError::Signing)?;

        Ok(format!(
            "{}.{}",
            signing_input,
            BASE64_URL_SAFE_NO_PAD.encode(&signature)
        ))
    }
}

/// Accepts PKCS#8 (what Google issues) and PKCS#1 PEM keys.
fn parse_private_key(pem: &str) -> Result<RsaKeyPair, CredentialError> {
    let mut reader = std::io::Cursor::new(pem.as_bytes());
    let item = rustls_pemfile::read_one(&mut reader)
        .map_err(|e| CredentialError::InvalidKey(e.to_string()))?;

    match item {
        Some(rustls_pemfile::Item::Pkcs8Key(der)) => RsaKeyPair::from_pkcs8(der.secret_pkcs8_der())
            .map_err(|e| CredentialError::InvalidKey(e.to_string())),
        Some(rustls_pemfile::Item::Pkcs1Key(der)) => RsaKeyPair::from_der(der.secret_pkcs1_der())
            .map_err(|e| CredentialError::InvalidKey(e.to_string())),
        _ => Err(CredentialError::InvalidKey(
            "no RSA private key found in PEM data".to_string(),
        )),
    }
}
