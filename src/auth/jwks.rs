//! JWKS cache for Supabase JWT verification

use anyhow::{Context, Result};
use jsonwebtoken::{decode, decode_header, Algorithm, DecodingKey, Validation};
use parking_lot::RwLock;
use serde::Deserialize;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use super::Claims;

/// Minimum spacing between two JWKS downloads
const REFETCH_COOLDOWN: Duration = Duration::from_secs(1);

#[derive(Debug, Deserialize)]
struct JwksResponse {
    keys: Vec<Jwk>,
}

#[derive(Debug, Clone, Deserialize)]
struct Jwk {
    kid: String,
    kty: String,
    #[serde(default)]
    n: Option<String>,
    #[serde(default)]
    e: Option<String>,
}

#[derive(Clone)]
struct CachedKey {
    key: DecodingKey,
    cached_at: Instant,
}

/// JWKS cache for validating Supabase JWTs
#[derive(Clone)]
pub struct JwksCache {
    inner: Arc<RwLock<JwksCacheInner>>,
    http: reqwest::Client,
    jwks_url: String,
    issuer: String,
    audience: String,
    ttl: Duration,
}

struct JwksCacheInner {
    keys: HashMap<String, CachedKey>,
    last_fetch: Option<Instant>,
}

impl JwksCache {
    pub fn new(jwks_url: String, issuer: String, audience: String, ttl_seconds: u64) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            inner: Arc::new(RwLock::new(JwksCacheInner {
                keys: HashMap::new(),
                last_fetch: None,
            })),
            http,
            jwks_url,
            issuer,
            audience,
            ttl: Duration::from_secs(ttl_seconds),
        })
    }

    /// Verify a JWT and return its claims
    pub async fn verify_token(&self, token: &str) -> Result<Claims> {
        let header = decode_header(token).context("Invalid JWT header")?;
        let kid = header.kid.context("JWT missing kid header")?;

        let decoding_key = self.get_or_fetch_key(&kid).await?;

        let mut validation = Validation::new(Algorithm::RS256);
        validation.set_issuer(&[&self.issuer]);
        validation.set_audience(&[&self.audience]);
        validation.validate_exp = true;
        validation.validate_nbf = true;

        let token_data =
            decode::<Claims>(token, &decoding_key, &validation).context("JWT validation failed")?;

        Ok(token_data.claims)
    }

    async fn get_or_fetch_key(&self, kid: &str) -> Result<DecodingKey> {
        if let Some(key) = self.cached_key(kid) {
            return Ok(key);
        }

        self.refresh_keys().await?;

        self.cached_key(kid).context("Key not found in JWKS")
    }

    fn cached_key(&self, kid: &str) -> Option<DecodingKey> {
        let cache = self.inner.read();
        cache
            .keys
            .get(kid)
            .filter(|cached| cached.cached_at.elapsed() < self.ttl)
            .map(|cached| cached.key.clone())
    }

    async fn refresh_keys(&self) -> Result<()> {
        {
            let cache = self.inner.read();
            if cache
                .last_fetch
                .is_some_and(|last| last.elapsed() < REFETCH_COOLDOWN)
            {
                return Ok(());
            }
        }

        tracing::debug!(url = %self.jwks_url, "Fetching JWKS");

        let response = self
            .http
            .get(&self.jwks_url)
            .send()
            .await
            .context("Failed to fetch JWKS")?;

        if !response.status().is_success() {
            anyhow::bail!("JWKS fetch failed with status: {}", response.status());
        }

        let jwks: JwksResponse = response.json().await.context("Failed to parse JWKS")?;

        let now = Instant::now();
        let mut cache = self.inner.write();
        cache.last_fetch = Some(now);

        for jwk in jwks.keys {
            let (Some(n), Some(e)) = (jwk.n.as_deref(), jwk.e.as_deref()) else {
                continue;
            };
            if jwk.kty != "RSA" {
                continue;
            }

            match DecodingKey::from_rsa_components(n, e) {
                Ok(key) => {
                    cache.keys.insert(jwk.kid.clone(), CachedKey { key, cached_at: now });
                    tracing::debug!(kid = %jwk.kid, "Cached JWKS key");
                }
                Err(err) => {
                    tracing::warn!(kid = %jwk.kid, error = %err, "Failed to parse JWK");
                }
            }
        }

        tracing::info!(keys = cache.keys.len(), "JWKS cache refreshed");
        Ok(())
    }

    /// Pre-warm the cache by fetching keys
    pub async fn warm_cache(&self) -> Result<()> {
        self.refresh_keys().await
    }

    /// Install a key directly, bypassing the JWKS endpoint
    #[cfg(test)]
    pub(crate) fn insert_key(&self, kid: &str, key: DecodingKey) {
        self.inner.write().keys.insert(
            kid.to_string(),
            CachedKey {
                key,
                cached_at: Instant::now(),
            },
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cache() -> JwksCache {
        JwksCache::new(
            "http://127.0.0.1:9/auth/v1/.well-known/jwks.json".to_string(),
            "https://example.supabase.co/auth/v1".to_string(),
            "authenticated".to_string(),
            60,
        )
        .unwrap()
    }

    #[tokio::test]
    async fn malformed_token_is_rejected_before_any_fetch() {
        let err = cache().verify_token("not-a-jwt").await.unwrap_err();
        assert!(err.to_string().contains("Invalid JWT header"));
    }

    #[test]
    fn jwks_ignores_non_rsa_keys() {
        let parsed: JwksResponse = serde_json::from_str(
            r#"{"keys":[{"kid":"a","kty":"EC","crv":"P-256","x":"x","y":"y"},
                        {"kid":"b","kty":"RSA","n":"n","e":"AQAB"}]}"#,
        )
        .unwrap();

        assert_eq!(parsed.keys.len(), 2);
        assert!(parsed.keys[0].n.is_none());
        assert_eq!(parsed.keys[1].e.as_deref(), Some("AQAB"));
    }
}
