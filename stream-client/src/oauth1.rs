use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use exporter_core::CoreError;
use hmac::{Hmac, Mac};
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use sha1::Sha1;
use std::time::{SystemTime, UNIX_EPOCH};
use url::Url;

type HmacSha1 = Hmac<Sha1>;

/// Everything but the unreserved characters of RFC 3986.
const OAUTH_ENCODE: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~');

pub fn encode(value: &str) -> String {
    utf8_percent_encode(value, OAUTH_ENCODE).to_string()
}

/// Encodes request parameters as an `application/x-www-form-urlencoded`
/// body using the same escaping the signature covers.
pub fn form_body(params: &[(&str, &str)]) -> String {
    params
        .iter()
        .map(|(key, value)| format!("{}={}", encode(key), encode(value)))
        .collect::<Vec<_>>()
        .join("&")
}

/// HMAC-SHA1 signer for user-context requests.
#[derive(Clone)]
pub struct OAuth1Signer {
    consumer_key: String,
    consumer_secret: String,
    access_token: String,
    access_secret: String,
}

impl std::fmt::Debug for OAuth1Signer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OAuth1Signer")
            .field("consumer_key", &self.consumer_key)
            .field("access_token", &self.access_token)
            .finish_non_exhaustive()
    }
}

impl OAuth1Signer {
    pub fn new(
        consumer_key: String,
        consumer_secret: String,
        access_token: String,
        access_secret: String,
    ) -> Self {
        Self {
            consumer_key,
            consumer_secret,
            access_token,
            access_secret,
        }
    }

    /// Builds the `Authorization` header value for a request with a fresh
    /// nonce and the current timestamp.
    pub fn authorization(
        &self,
        method: &str,
        url: &Url,
        body_params: &[(&str, &str)],
    ) -> Result<String, CoreError> {
        let nonce: String = std::iter::repeat_with(fastrand::alphanumeric)
            .take(32)
            .collect();
        let timestamp = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|elapsed| elapsed.as_secs())
            .unwrap_or_default();

        self.authorization_with(method, url, body_params, &nonce, timestamp)
    }

    pub fn authorization_with(
        &self,
        method: &str,
        url: &Url,
        body_params: &[(&str, &str)],
        nonce: &str,
        timestamp: u64,
    ) -> Result<String, CoreError> {
        let timestamp = timestamp.to_string();
        let mut oauth_params = vec![
            ("oauth_consumer_key", self.consumer_key.as_str()),
            ("oauth_nonce", nonce),
            ("oauth_signature_method", "HMAC-SHA1"),
            ("oauth_timestamp", timestamp.as_str()),
            ("oauth_token", self.access_token.as_str()),
            ("oauth_version", "1.0"),
        ];

        let signature = self.signature(method, url, body_params, &oauth_params)?;
        oauth_params.push(("oauth_signature", signature.as_str()));
        oauth_params.sort_by(|a, b| a.0.cmp(b.0));

        let fields: Vec<String> = oauth_params
            .iter()
            .map(|(key, value)| format!("{}=\"{}\"", encode(key), encode(value)))
            .collect();
        Ok(format!("OAuth {}", fields.join(", ")))
    }

    fn signature(
        &self,
        method: &str,
        url: &Url,
        body_params: &[(&str, &str)],
        oauth_params: &[(&str, &str)],
    ) -> Result<String, CoreError> {
        let mut params: Vec<(String, String)> = url
            .query_pairs()
            .map(|(key, value)| (encode(&key), encode(&value)))
            .chain(
                body_params
                    .iter()
                    .chain(oauth_params.iter())
                    .map(|(key, value)| (encode(key), encode(value))),
            )
            .collect();
        params.sort();

        let normalized = params
            .iter()
            .map(|(key, value)| format!("{}={}", key, value))
            .collect::<Vec<_>>()
            .join("&");

        let mut base_url = url.clone();
        base_url.set_query(None);
        base_url.set_fragment(None);

        let base_string = format!(
            "{}&{}&{}",
            method.to_ascii_uppercase(),
            encode(base_url.as_str()),
            encode(&normalized)
        );
        let signing_key = format!(
            "{}&{}",
            encode(&self.consumer_secret),
            encode(&self.access_secret)
        );

        let mut mac =
            HmacSha1::new_from_slice(signing_key.as_bytes()).map_err(|e| CoreError::Internal {
                message: format!("request signing key rejected: {}", e),
            })?;
        mac.update(base_string.as_bytes());
        Ok(STANDARD.encode(mac.finalize().into_bytes()))
    }
}
