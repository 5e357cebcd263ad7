//! # SMS Core
//!
//! Core traits and types for the multi-tenant SMS gateway.
//!
//! This crate provides the building blocks shared by every vendor crate:
//! - [`SmsClient`] trait implemented once per SMS vendor
//! - [`ClientRegistry`] mapping tenant application ids to clients
//! - [`SmsService`] dispatching a send request to the right client
//! - Common types for requests, results and errors
//!
//! ## Example
//!
//! ```rust,ignore
//! use sms_core::{ClientRegistry, SendOptions, SmsService};
//!
//! let registry = ClientRegistry::new().with("app1", Arc::new(client));
//! let service = SmsService::new(registry);
//! let result = service.send("app1", &options).await?;
//! println!("accepted: {}", result.success);
//! ```

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

mod phone;
mod registry;

pub use phone::{mask_phone_number, strip_plus_and_hyphens};
pub use registry::{ClientRegistry, SmsService};

/// Errors that can occur while sending an SMS.
#[derive(Debug, thiserror::Error)]
pub enum SmsError {
    /// No client is configured for the tenant application id.
    #[error("no SMS client configured for application {0:?}")]
    UnknownApplication(String),
    /// The vendor has no template assignment for the template name.
    #[error("unknown template name: {0}")]
    UnknownTemplate(String),
    /// HTTP communication error (DNS, TLS, timeout, connection reset).
    #[error("http error: {0}")]
    Http(String),
    /// SMS provider answered with a non-success HTTP status or an unreadable body.
    #[error("provider error: {0}")]
    Provider(String),
    /// Unexpected error occurred
    #[error("unexpected: {0}")]
    Unexpected(String),
}

impl SmsError {
    /// Whether the error stems from the request not matching the configuration
    /// (unknown application or template) rather than from the vendor.
    pub fn is_dispatch_error(&self) -> bool {
        matches!(
            self,
            SmsError::UnknownApplication(_) | SmsError::UnknownTemplate(_)
        )
    }
}

/// Errors detected while building clients from configuration.
///
/// These are fatal: the gateway refuses to start rather than serve with a
/// partially initialized registry.
#[derive(Debug, thiserror::Error)]
pub enum ConfigurationError {
    #[error("cannot find template with id {template_id}")]
    TemplateNotFound { template_id: String },
    #[error("application {app_id} uses unknown provider {provider}")]
    UnknownProvider { app_id: String, provider: String },
    #[error("provider {0} is configured more than once")]
    DuplicateProvider(String),
    #[error("application {0} is configured more than once")]
    DuplicateApplication(String),
    #[error("invalid configuration: {0}")]
    Invalid(String),
    #[error("failed to load configuration: {0}")]
    Load(String),
}

/// Variables substituted into vendor templates.
///
/// The set of keys is closed; unknown keys are rejected when deserializing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TemplateVariables {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub app_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub has_password: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub host: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ui_locales: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub x_state: Option<String>,
}

/// Normalized send request handed to every [`SmsClient`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SendOptions {
    /// Recipient phone number as supplied by the tenant.
    pub to: String,
    /// Free-form message text, used by vendors without templates.
    pub body: String,
    pub template_name: String,
    /// IETF language tag, e.g. "en" or "zh-HK".
    pub language_tag: String,
    pub template_variables: TemplateVariables,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SendResult {
    /// Raw vendor payload for debugging / audit.
    pub client_response: String,
    /// Whether the vendor reported the message as accepted.
    ///
    /// A vendor may answer a well-formed HTTP call with a failure code; that
    /// is reported here as `false` rather than as an [`SmsError`].
    pub success: bool,
    /// Number of SMS segments the vendor split the message into, if reported.
    pub segment_count: Option<u32>,
}

#[async_trait]
pub trait SmsClient: Send + Sync {
    /// Stable provider key, e.g. "accessyou", "sendcloud".
    fn provider(&self) -> &'static str;

    /// Send a single SMS. Exactly one outbound request is made; no retries.
    async fn send(&self, options: &SendOptions) -> Result<SendResult, SmsError>;
}
