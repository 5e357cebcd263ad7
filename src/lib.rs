//! # SMS Gateway
//!
//! A multi-tenant SMS gateway. Each tenant application is bound to one
//! configured SMS vendor; a send request names the application and is
//! forwarded, unchanged in meaning, to that vendor.
//!
//! ## Features
//!
//! - **Multi-vendor dispatch**: AccessYou (free text) and SendCloud (templates)
//! - **Template resolution**: per-language template overrides with a mandatory default
//! - **Fail-fast configuration**: dangling template ids or unknown providers abort startup
//! - **Observability**: Structured logging via `tracing`, JSON or pretty output
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use sms_gateway::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
//!     let providers = SmsProviderConfig::from_yaml_file("config/sms_providers.yaml")?;
//!     let service = SmsService::new(build_registry(&providers)?);
//!
//!     let result = service.send("app1", &SendOptions {
//!         to: "+852-1234-5678".into(),
//!         body: "Your code is 123456".into(),
//!         ..Default::default()
//!     }).await?;
//!
//!     println!("accepted: {}", result.success);
//!     Ok(())
//! }
//! ```
//!
//! ## Configuration
//!
//! Server and logging settings are layered from `config/*` files and
//! `SMS_GATEWAY__*` environment variables:
//!
//! ```rust,ignore
//! use sms_gateway::config::AppConfig;
//!
//! let config = AppConfig::load()?;
//! println!("listening on {}", config.listen_addr());
//! ```

pub mod config;
pub mod logging;
pub mod registry;

pub use crate::config::*;
pub use registry::{ProviderClient, build_registry};

/// Common imports for SMS Gateway usage
pub mod prelude {
    pub use crate::config::{
        AppConfig, ApplicationConfig, LoggingConfig, ProviderConfig, ServerConfig,
        SmsProviderConfig,
    };
    pub use crate::registry::{ProviderClient, build_registry};
    pub use sms_core::*;
}
