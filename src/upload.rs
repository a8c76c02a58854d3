//! Presigned upload URLs for image assets.
//!
//! A client asks for a short-lived signed PUT URL, uploads straight to
//! storage, and stores the returned public URL as an image `src`.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use chrono::{DateTime, Duration, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use url::Url;

use crate::factory::generate_id;
use crate::{Error, Result};

const MAX_FILENAME_LEN: usize = 100;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UploadConfig {
    /// Storage endpoint that receives the PUT.
    pub endpoint: String,
    /// Base of the permanent URLs handed back to the editor.
    pub public_base: String,
    pub secret: String,
    pub ttl_secs: i64,
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            endpoint: "http://127.0.0.1:9000/assets/".to_string(),
            public_base: "http://127.0.0.1:9000/assets/".to_string(),
            secret: "change-me".to_string(),
            ttl_secs: 300,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PresignedUpload {
    pub upload_url: String,
    pub public_url: String,
    pub key: String,
    pub expires_at: DateTime<Utc>,
}

/// Keep the last path component and reduce it to `[A-Za-z0-9._-]`.
pub fn sanitize_filename(raw: &str) -> String {
    let base = raw.rsplit(['/', '\\']).next().unwrap_or(raw);
    let mut out = String::with_capacity(base.len());
    for ch in base.chars() {
        if ch.is_ascii_alphanumeric() || matches!(ch, '.' | '_' | '-') {
            out.push(ch);
        } else if !out.ends_with('-') {
            out.push('-');
        }
    }
    let trimmed = out.trim_start_matches(['.', '-']).trim_end_matches('-');
    let mut name: String = trimmed.chars().take(MAX_FILENAME_LEN).collect();
    if name.is_empty() {
        name.push_str("file");
    }
    name
}

fn base_url(raw: &str, field: &str) -> Result<Url> {
    let mut url = Url::parse(raw).map_err(|e| Error::Config(format!("{}: {}", field, e)))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(Error::Config(format!("{} must be an http(s) URL", field)));
    }
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    Ok(url)
}

#[derive(Debug, Clone)]
pub struct UploadSigner {
    endpoint: Url,
    public_base: Url,
    secret: String,
    ttl: Duration,
}

impl UploadSigner {
    pub fn new(config: &UploadConfig) -> Result<Self> {
        if config.secret.is_empty() {
            return Err(Error::Config("upload secret must not be empty".into()));
        }
        if config.ttl_secs <= 0 {
            return Err(Error::Config("upload ttl must be positive".into()));
        }
        Ok(Self {
            endpoint: base_url(&config.endpoint, "upload endpoint")?,
            public_base: base_url(&config.public_base, "upload public base")?,
            secret: config.secret.clone(),
            ttl: Duration::seconds(config.ttl_secs),
        })
    }

    pub fn sign(&self, method: &str, key: &str, expires: i64) -> String {
        let method = method.to_ascii_uppercase();
        let expires = expires.to_string();
        let mut hasher = Sha256::new();
        for part in [self.secret.as_str(), method.as_str(), key, expires.as_str()] {
            hasher.update(part.as_bytes());
            hasher.update(b"\n");
        }
        URL_SAFE_NO_PAD.encode(hasher.finalize())
    }

    /// Signed PUT URL for `filename`, valid until `now + ttl`.
    pub fn presign_put(&self, filename: &str, now: DateTime<Utc>) -> Result<PresignedUpload> {
        let key = format!("uploads/{}-{}", generate_id(), sanitize_filename(filename));
        let expires_at = now + self.ttl;
        let expires = expires_at.timestamp();

        let mut upload = self
            .endpoint
            .join(&key)
            .map_err(|e| Error::Config(format!("upload endpoint: {}", e)))?;
        upload
            .query_pairs_mut()
            .append_pair("expires", &expires.to_string())
            .append_pair("signature", &self.sign("PUT", &key, expires));
        let public = self
            .public_base
            .join(&key)
            .map_err(|e| Error::Config(format!("upload public base: {}", e)))?;

        log::debug!("presigned upload for {}", key);
        Ok(PresignedUpload {
            upload_url: upload.to_string(),
            public_url: public.to_string(),
            key,
            expires_at: Utc.timestamp_opt(expires, 0).single().unwrap_or(expires_at),
        })
    }

    /// Check a signature presented by storage-side middleware.
    pub fn verify(&self, method: &str, key: &str, expires: i64, signature: &str, now: DateTime<Utc>) -> Result<()> {
        let expected = self.sign(method, key, expires);
        let matches = expected.len() == signature.len()
            && expected
                .bytes()
                .zip(signature.bytes())
                .fold(0u8, |acc, (a, b)| acc | (a ^ b))
                == 0;
        if !matches {
            return Err(Error::invalid("signature", "does not match"));
        }
        if now.timestamp() > expires {
            return Err(Error::invalid("expires", "upload URL has expired"));
        }
        Ok(())
    }

    /// [`verify`](Self::verify) against a full presigned URL.
    pub fn verify_url(&self, method: &str, url: &str, now: DateTime<Utc>) -> Result<()> {
        let url = Url::parse(url).map_err(|e| Error::invalid("url", e.to_string()))?;
        let key = url
            .path()
            .strip_prefix(self.endpoint.path())
            .ok_or_else(|| Error::invalid("url", "not under the upload endpoint"))?
            .to_string();
        let mut expires = None;
        let mut signature = None;
        for (k, v) in url.query_pairs() {
            match k.as_ref() {
                "expires" => expires = v.parse::<i64>().ok(),
                "signature" => signature = Some(v.into_owned()),
                _ => {}
            }
        }
        let expires = expires.ok_or_else(|| Error::invalid("expires", "missing"))?;
        let signature = signature.ok_or_else(|| Error::invalid("signature", "missing"))?;
        self.verify(method, &key, expires, &signature, now)
    }
}
