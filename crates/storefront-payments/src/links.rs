//! Download Links
//!
//! Builds the URLs handed out after a verified payment. With a signing
//! secret configured, links expire and carry an HMAC-SHA256 signature over
//! the file name and expiry; without one they are plain paths.

use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use sha2::Sha256;
use url::Url;

use crate::error::{PaymentError, Result};

type HmacSha256 = Hmac<Sha256>;

/// Default link lifetime (7 days)
pub const DEFAULT_LINK_TTL_SECS: i64 = 7 * 24 * 60 * 60;

/// Signs and verifies download links
#[derive(Clone)]
pub struct LinkSigner {
    key: Vec<u8>,
}

impl std::fmt::Debug for LinkSigner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LinkSigner").finish_non_exhaustive()
    }
}

impl LinkSigner {
    pub fn new(secret: impl AsRef<[u8]>) -> Result<Self> {
        let key = secret.as_ref().to_vec();
        if key.is_empty() {
            return Err(PaymentError::Config("download signing secret is empty".into()));
        }
        Ok(Self { key })
    }

    fn mac(&self, file: &str, expires: i64) -> Result<HmacSha256> {
        let mut mac = HmacSha256::new_from_slice(&self.key)
            .map_err(|e| PaymentError::Config(format!("invalid signing key: {e}")))?;
        mac.update(file.as_bytes());
        mac.update(b":");
        mac.update(expires.to_string().as_bytes());
        Ok(mac)
    }

    /// Hex signature for a file and expiry (unix seconds)
    pub fn sign(&self, file: &str, expires: i64) -> Result<String> {
        Ok(hex::encode(self.mac(file, expires)?.finalize().into_bytes()))
    }

    /// Check a presented signature in constant time
    pub fn verify(&self, file: &str, expires: i64, signature: &str, now: DateTime<Utc>) -> Result<()> {
        if now.timestamp() > expires {
            return Err(PaymentError::LinkRejected("link expired".into()));
        }

        let presented = hex::decode(signature)
            .map_err(|_| PaymentError::LinkRejected("malformed signature".into()))?;

        self.mac(file, expires)?
            .verify_slice(&presented)
            .map_err(|_| PaymentError::LinkRejected("signature mismatch".into()))
    }
}

/// Builds download URLs under the public backend URL
#[derive(Clone, Debug)]
pub struct DownloadLinks {
    base_url: Url,
    signer: Option<LinkSigner>,
    ttl_secs: i64,
}

impl DownloadLinks {
    /// Plain, non-expiring links
    pub fn new(base_url: &str) -> Result<Self> {
        let base_url = Url::parse(base_url)
            .map_err(|e| PaymentError::Config(format!("invalid backend URL '{base_url}': {e}")))?;

        if base_url.cannot_be_a_base() {
            return Err(PaymentError::Config(format!("backend URL '{base_url}' cannot be a base")));
        }

        Ok(Self {
            base_url,
            signer: None,
            ttl_secs: DEFAULT_LINK_TTL_SECS,
        })
    }

    /// Sign links, valid for `ttl_secs` after issue
    #[must_use]
    pub fn signed(mut self, signer: LinkSigner, ttl_secs: i64) -> Self {
        self.signer = Some(signer);
        self.ttl_secs = ttl_secs;
        self
    }

    pub fn signer(&self) -> Option<&LinkSigner> {
        self.signer.as_ref()
    }

    /// URL for a deliverable file, issued at `now`
    pub fn url_for(&self, file: &str, now: DateTime<Utc>) -> Result<String> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| PaymentError::Config("backend URL cannot be a base".into()))?
            .pop_if_empty()
            .push("download")
            .push(file);

        if let Some(signer) = &self.signer {
            let expires = now.timestamp().saturating_add(self.ttl_secs);
            let signature = signer.sign(file, expires)?;
            url.query_pairs_mut()
                .append_pair("expires", &expires.to_string())
                .append_pair("signature", &signature);
        }

        Ok(url.into())
    }
}
