//! # SendCloud SMS Provider
//!
//! SendCloud only sends pre-approved templates. A send request names an
//! abstract template ("otp", "forgot_password", ...) and a language tag; the
//! [`SendCloudTemplateResolver`] maps that pair to a SendCloud template id,
//! preferring an exact per-language override and falling back to the
//! assignment's default template.
//!
//! ## Example
//!
//! ```rust,ignore
//! use sms_sendcloud::{SendCloudClient, SendCloudCredentials, SendCloudTemplateResolver};
//!
//! let resolver = SendCloudTemplateResolver::new(&templates, &assignments)?;
//! let client = SendCloudClient::builder(
//!     SendCloudCredentials { sms_user: "user".into(), sms_key: "key".into() },
//!     resolver,
//! )
//! .build()?;
//! ```

mod client;
pub mod template;

pub use client::{
    sign, SendCloudClient, SendCloudClientBuilder, SendCloudCredentials, DEFAULT_BASE_URL,
};
pub use template::{
    ByLanguageConfig, SendCloudTemplate, SendCloudTemplateAssignment, SendCloudTemplateResolver,
    TemplateAssignmentConfig, TemplateConfig, TemplateId, TemplateMessageType,
};
