//! Firebase ID token verification against Google's published keys.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use jsonwebtoken::{
    decode, decode_header,
    jwk::{Jwk, JwkSet},
    Algorithm, DecodingKey, Validation,
};
use serde::Deserialize;
use tokio::sync::RwLock;

use crate::config::{
    Config, FIREBASE_ISSUER_PREFIX, FIREBASE_JWKS_URL, IDENTITY_KEYS_MIN_REFETCH_SECONDS,
    IDENTITY_KEYS_TTL_SECONDS,
};
use crate::domain::FederatedClaims;
use crate::errors::{AppError, AppResult};

#[cfg(test)]
use mockall::automock;

/// Verifies identity-provider tokens and returns their claims.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait IdentityVerifier: Send + Sync {
    async fn verify(&self, id_token: &str) -> AppResult<FederatedClaims>;
}

#[derive(Debug, Deserialize)]
struct FirebaseIdClaims {
    sub: String,
    email: Option<String>,
    name: Option<String>,
    picture: Option<String>,
    #[serde(default)]
    email_verified: bool,
}

struct CachedKeys {
    set: JwkSet,
    fetched_at: Instant,
}

enum KeyLookup {
    Found(Jwk),
    /// Fetched too recently to ask again
    Unknown,
    Refetch,
}

impl CachedKeys {
    fn lookup(&self, kid: &str, ttl: Duration, min_refetch: Duration) -> KeyLookup {
        let age = self.fetched_at.elapsed();
        if age < ttl {
            if let Some(jwk) = self.set.find(kid) {
                return KeyLookup::Found(jwk.clone());
            }
        }
        if age < min_refetch {
            KeyLookup::Unknown
        } else {
            KeyLookup::Refetch
        }
    }
}

/// RS256 verifier for Firebase ID tokens
pub struct FirebaseVerifier {
    project_id: Option<String>,
    jwks_url: String,
    client: reqwest::Client,
    keys: RwLock<Option<CachedKeys>>,
    ttl: Duration,
    min_refetch: Duration,
}

impl FirebaseVerifier {
    pub fn new(project_id: Option<String>) -> Self {
        if project_id.is_none() {
            tracing::warn!("FIREBASE_PROJECT_ID not set - federated sign-in disabled");
        }
        Self {
            project_id,
            jwks_url: FIREBASE_JWKS_URL.to_string(),
            client: reqwest::Client::new(),
            keys: RwLock::new(None),
            ttl: Duration::from_secs(IDENTITY_KEYS_TTL_SECONDS),
            min_refetch: Duration::from_secs(IDENTITY_KEYS_MIN_REFETCH_SECONDS),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.firebase_project_id.clone())
    }

    fn validation(project_id: &str) -> Validation {
        let mut validation = Validation::new(Algorithm::RS256);
        validation.set_audience(&[project_id]);
        validation.set_issuer(&[format!("{}{}", FIREBASE_ISSUER_PREFIX, project_id)]);
        validation
    }

    fn lookup(&self, cached: &Option<CachedKeys>, kid: &str) -> KeyLookup {
        match cached {
            Some(keys) => keys.lookup(kid, self.ttl, self.min_refetch),
            None => KeyLookup::Refetch,
        }
    }

    /// Signing key for `kid`. The key set is refetched when stale, or when
    /// `kid` is unknown and the last fetch is older than `min_refetch`.
    async fn key(&self, kid: &str) -> AppResult<Jwk> {
        match self.lookup(&*self.keys.read().await, kid) {
            KeyLookup::Found(jwk) => return Ok(jwk),
            KeyLookup::Unknown => return Err(AppError::unauthorized("Invalid token")),
            KeyLookup::Refetch => {}
        }

        // Writers queue here; only the first one fetches
        let mut cached = self.keys.write().await;
        match self.lookup(&cached, kid) {
            KeyLookup::Found(jwk) => return Ok(jwk),
            KeyLookup::Unknown => return Err(AppError::unauthorized("Invalid token")),
            KeyLookup::Refetch => {}
        }

        let set = self.fetch_keys().await?;
        let jwk = set.find(kid).cloned();
        *cached = Some(CachedKeys {
            set,
            fetched_at: Instant::now(),
        });

        jwk.ok_or_else(|| AppError::unauthorized("Invalid token"))
    }

    async fn fetch_keys(&self) -> AppResult<JwkSet> {
        tracing::debug!(url = %self.jwks_url, "Fetching identity provider signing keys");
        self.client
            .get(&self.jwks_url)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| AppError::internal(format!("Failed to fetch signing keys: {}", e)))?
            .json::<JwkSet>()
            .await
            .map_err(|e| AppError::internal(format!("Invalid signing key set: {}", e)))
    }
}

#[async_trait]
impl IdentityVerifier for FirebaseVerifier {
    async fn verify(&self, id_token: &str) -> AppResult<FederatedClaims> {
        let project_id = self
            .project_id
            .as_deref()
            .ok_or_else(|| AppError::unauthorized("Federated sign-in is not configured"))?;

        let header = decode_header(id_token)?;
        if header.alg != Algorithm::RS256 {
            return Err(AppError::unauthorized("Invalid token"));
        }
        let kid = header
            .kid
            .ok_or_else(|| AppError::unauthorized("Invalid token"))?;

        let jwk = self.key(&kid).await?;
        let key = DecodingKey::from_jwk(&jwk)?;
        let data = decode::<FirebaseIdClaims>(id_token, &key, &Self::validation(project_id))?;
        let claims = data.claims;

        if claims.sub.is_empty() {
            return Err(AppError::unauthorized("Invalid token"));
        }
        let email = claims
            .email
            .filter(|e| !e.is_empty())
            .ok_or_else(|| AppError::unauthorized("Federated account has no email address"))?;

        Ok(FederatedClaims {
            uid: claims.sub,
            email,
            name: claims.name,
            picture: claims.picture,
            email_verified: claims.email_verified,
        })
    }
}
