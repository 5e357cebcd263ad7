//! # AccessYou SMS Provider
//!
//! AccessYou ("anyip" OTP gateway) implementation for the SMS gateway.
//!
//! AccessYou sends the free-form message body as-is; it has no template
//! support. Phone numbers must not contain `+` or `-`, so they are stripped
//! before sending.
//!
//! ## Example
//!
//! ```rust,ignore
//! use sms_accessyou::{AccessYouClient, AccessYouCredentials};
//!
//! let client = AccessYouClient::builder(AccessYouCredentials {
//!     account_no: "11012345".into(),
//!     user: "user".into(),
//!     password: "secret".into(),
//!     sender: "Authgear".into(),
//! })
//! .build()?;
//! let result = client.send(&options).await?;
//! ```

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use sms_core::{
    mask_phone_number, strip_plus_and_hyphens, ConfigurationError, SendOptions, SendResult,
    SmsClient, SmsError,
};
use tracing::{error, info};
use url::Url;

const PROVIDER: &str = "accessyou";

pub const DEFAULT_BASE_URL: &str = "http://sms.accessyou-anyip.com";

const SEND_PATH: &str = "/sendsms-otp.php";

/// `msg_status` value AccessYou returns when a message was accepted.
const STATUS_SUCCESS: &str = "100";

/// Account credentials issued by AccessYou.
#[derive(Clone)]
pub struct AccessYouCredentials {
    pub account_no: String,
    pub user: String,
    pub password: String,
    /// Sender id shown to the recipient.
    pub sender: String,
}

impl std::fmt::Debug for AccessYouCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AccessYouCredentials")
            .field("account_no", &self.account_no)
            .field("user", &self.user)
            .field("password", &"<redacted>")
            .field("sender", &self.sender)
            .finish()
    }
}

#[derive(Debug, Clone)]
pub struct AccessYouClientBuilder {
    credentials: AccessYouCredentials,
    base_url: Option<String>,
    timeout: Option<Duration>,
}

impl AccessYouClientBuilder {
    /// Override the API base URL; an empty string keeps the default.
    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into();
        self.base_url = (!base_url.is_empty()).then_some(base_url);
        self
    }

    /// Set an HTTP client timeout applied to the entire request.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn build(self) -> Result<AccessYouClient, ConfigurationError> {
        let base_url = self.base_url.as_deref().unwrap_or(DEFAULT_BASE_URL);
        let send_url = Url::parse(&format!("{}{}", base_url.trim_end_matches('/'), SEND_PATH))
            .map_err(|e| {
                ConfigurationError::Invalid(format!("invalid AccessYou base_url {base_url:?}: {e}"))
            })?;

        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = self.timeout {
            builder = builder.timeout(timeout);
        }
        let http = builder
            .build()
            .map_err(|e| ConfigurationError::Invalid(format!("http client: {e}")))?;

        Ok(AccessYouClient {
            credentials: self.credentials,
            send_url,
            http,
        })
    }
}

/// AccessYou HTTP client.
#[derive(Debug, Clone)]
pub struct AccessYouClient {
    credentials: AccessYouCredentials,
    send_url: Url,
    http: reqwest::Client,
}

impl AccessYouClient {
    pub fn builder(credentials: AccessYouCredentials) -> AccessYouClientBuilder {
        AccessYouClientBuilder {
            credentials,
            base_url: None,
            timeout: None,
        }
    }

    /// Full URL of the send endpoint.
    pub fn send_url(&self) -> &Url {
        &self.send_url
    }
}

/// AccessYou answers with either quoted or bare numbers depending on the field.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum LooseString {
    String(String),
    Number(serde_json::Number),
}

impl LooseString {
    fn into_string(self) -> String {
        match self {
            Self::String(value) => value,
            Self::Number(value) => value.to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
struct AccessYouSendResponse {
    msg_status: LooseString,
    #[serde(default)]
    msg_status_desc: Option<String>,
    #[serde(default)]
    msg_id: Option<LooseString>,
}

#[async_trait]
impl SmsClient for AccessYouClient {
    fn provider(&self) -> &'static str {
        PROVIDER
    }

    async fn send(&self, options: &SendOptions) -> Result<SendResult, SmsError> {
        let to = strip_plus_and_hyphens(&options.to);
        info!("Sending SMS via AccessYou to {}", mask_phone_number(&to));

        let creds = &self.credentials;
        let res = self
            .http
            .post(self.send_url.clone())
            .query(&[
                ("accountno", creds.account_no.as_str()),
                ("user", creds.user.as_str()),
                ("pwd", creds.password.as_str()),
                ("from", creds.sender.as_str()),
                ("phone", to.as_str()),
                ("msg", options.body.as_str()),
            ])
            .header(reqwest::header::COOKIE, "dynamic=sms")
            .send()
            .await
            .map_err(|e| {
                error!("AccessYou request failed: {}", e);
                SmsError::Http(e.to_string())
            })?;

        let status = res.status();
        let raw = res.text().await.map_err(|e| {
            error!("Failed to read AccessYou response: {}", e);
            SmsError::Http(e.to_string())
        })?;

        if !status.is_success() {
            error!("AccessYou returned HTTP {}: {}", status, raw);
            return Err(SmsError::Provider(format!("HTTP {}: {}", status, raw)));
        }

        let parsed: AccessYouSendResponse = serde_json::from_str(&raw).map_err(|e| {
            error!("Unparseable AccessYou response {:?}: {}", raw, e);
            SmsError::Provider(format!("invalid AccessYou response: {}", e))
        })?;

        let msg_status = parsed.msg_status.into_string();
        info!(
            "AccessYou responded msg_status={} msg_status_desc={:?} msg_id={:?}: {}",
            msg_status,
            parsed.msg_status_desc,
            parsed.msg_id.map(LooseString::into_string),
            raw
        );

        Ok(SendResult {
            success: msg_status == STATUS_SUCCESS,
            client_response: raw,
            segment_count: None,
        })
    }
}
