use async_trait::async_trait;
use axum::http::{HeaderMap, header::AUTHORIZATION};
use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use hmac::{Hmac, Mac};
use libsql::Value;
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use thiserror::Error;
use uuid::Uuid;

use crate::AppState;
use crate::constants::*;
use crate::database::Db;
use crate::error::{ApiError, ApiResult};
use crate::models::User;
use crate::utils::now_ts;

type HmacSha256 = Hmac<Sha256>;

/// Claims carried by an externally issued identity token.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct TokenClaims {
    pub sub: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    /// Unix expiry timestamp; tokens without one never expire.
    #[serde(default)]
    pub exp: Option<i64>,
}

#[derive(Debug, Error)]
pub enum VerifyError {
    #[error("malformed token")]
    Malformed,
    #[error("bad signature")]
    BadSignature,
    #[error("token expired")]
    Expired,
}

/// Seam for the external identity provider. The server only ever sees
/// verified claims; issuing tokens is the provider's business.
#[async_trait]
pub trait IdentityVerifier: Send + Sync {
    async fn verify(&self, token: &str) -> Result<TokenClaims, VerifyError>;
}

/// Verifies tokens of the form `base64url(claims json).hex(hmac-sha256)`,
/// signed with a secret shared with the identity provider.
pub struct HmacVerifier {
    key: Vec<u8>,
}

impl HmacVerifier {
    pub fn new(secret: &str) -> Self {
        HmacVerifier {
            key: secret.as_bytes().to_vec(),
        }
    }

    /// Mint a token the way the provider would. Used by local tooling and
    /// tests; production tokens come from the real provider.
    pub fn sign(&self, claims: &TokenClaims) -> String {
        let payload =
            URL_SAFE_NO_PAD.encode(serde_json::to_vec(claims).expect("claims serialize to JSON"));
        let mut mac =
            HmacSha256::new_from_slice(&self.key).expect("hmac accepts any key length");
        mac.update(payload.as_bytes());
        format!("{}.{}", payload, hex::encode(mac.finalize().into_bytes()))
    }

    fn check(&self, token: &str) -> Result<TokenClaims, VerifyError> {
        let (payload_b64, sig_hex) = token.split_once('.').ok_or(VerifyError::Malformed)?;
        let sig = hex::decode(sig_hex).map_err(|_| VerifyError::Malformed)?;

        let mut mac =
            HmacSha256::new_from_slice(&self.key).map_err(|_| VerifyError::BadSignature)?;
        mac.update(payload_b64.as_bytes());
        mac.verify_slice(&sig).map_err(|_| VerifyError::BadSignature)?;

        let payload = URL_SAFE_NO_PAD
            .decode(payload_b64)
            .map_err(|_| VerifyError::Malformed)?;
        let claims: TokenClaims =
            serde_json::from_slice(&payload).map_err(|_| VerifyError::Malformed)?;

        if let Some(exp) = claims.exp {
            if exp <= now_ts() {
                return Err(VerifyError::Expired);
            }
        }

        Ok(claims)
    }
}

#[async_trait]
impl IdentityVerifier for HmacVerifier {
    async fn verify(&self, token: &str) -> Result<TokenClaims, VerifyError> {
        self.check(token)
    }
}

/// Find-or-create the local user for a verified external identity. The upsert
/// is keyed on the unique subject column, so two concurrent first-time
/// resolutions cannot create duplicate rows.
pub async fn resolve_user(db: &Db, claims: &TokenClaims) -> ApiResult<User> {
    let conn = db.write().await;

    let params: Vec<Value> = vec![
        Value::Text(Uuid::new_v4().to_string()),
        Value::Text(claims.sub.clone()),
        claims.email.clone().map(Value::Text).unwrap_or(Value::Null),
        claims.name.clone().map(Value::Text).unwrap_or(Value::Null),
    ];

    let mut rows = conn
        .query(
            "INSERT INTO users (id, subject, email, name) VALUES (?, ?, ?, ?) \
             ON CONFLICT (subject) DO UPDATE SET email = excluded.email, name = excluded.name \
             RETURNING id, subject, email, name",
            params,
        )
        .await?;

    let row = rows
        .next()
        .await?
        .ok_or_else(|| ApiError::Internal(anyhow::anyhow!("user upsert returned no row")))?;

    Ok(User {
        id: row.get(0)?,
        subject: row.get(1)?,
        email: optional_text(&row, 2)?,
        name: optional_text(&row, 3)?,
    })
}

fn optional_text(row: &libsql::Row, idx: i32) -> ApiResult<Option<String>> {
    match row.get_value(idx)? {
        Value::Text(s) => Ok(Some(s)),
        _ => Ok(None),
    }
}

fn bearer_token(headers: &HeaderMap) -> ApiResult<&str> {
    headers
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
        .ok_or_else(|| ApiError::Unauthorized(ERR_NO_TOKEN.to_string()))
}

/// Resolve the caller's identity for a request: extract the bearer token,
/// verify it, then map the external subject onto a local user record.
pub async fn authenticate(state: &AppState, headers: &HeaderMap) -> ApiResult<User> {
    let token = bearer_token(headers)?;

    let claims = state.verifier.verify(token).await.map_err(|e| match e {
        VerifyError::Expired => ApiError::Unauthorized(ERR_TOKEN_EXPIRED.to_string()),
        _ => ApiError::Unauthorized(ERR_TOKEN_FAILED.to_string()),
    })?;

    resolve_user(&state.db, &claims).await
}
