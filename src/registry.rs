//! Wiring of configured providers into a [`ClientRegistry`].

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use sms_accessyou::{AccessYouClient, AccessYouCredentials};
use sms_core::{ClientRegistry, ConfigurationError, SendOptions, SendResult, SmsClient, SmsError};
use sms_sendcloud::{SendCloudClient, SendCloudCredentials, SendCloudTemplateResolver};
use tracing::info;

use crate::config::{
    AccessYouConfig, DEFAULT_PROVIDER_TIMEOUT_SECONDS, ProviderConfig, SendCloudConfig,
    SmsProviderConfig,
};

/// Every vendor the gateway can talk to.
#[derive(Debug, Clone)]
pub enum ProviderClient {
    AccessYou(AccessYouClient),
    SendCloud(SendCloudClient),
}

impl ProviderClient {
    pub fn from_config(config: &ProviderConfig) -> Result<Self, ConfigurationError> {
        match config {
            ProviderConfig::AccessYou(c) => Self::access_you(c),
            ProviderConfig::SendCloud(c) => Self::send_cloud(c),
        }
    }

    fn access_you(c: &AccessYouConfig) -> Result<Self, ConfigurationError> {
        let client = AccessYouClient::builder(AccessYouCredentials {
            account_no: c.account_no.clone(),
            user: c.user.clone(),
            password: c.password.clone(),
            sender: c.sender.clone(),
        })
        .base_url(c.base_url.clone())
        .timeout(timeout(c.timeout_seconds)?)
        .build()?;
        Ok(Self::AccessYou(client))
    }

    fn send_cloud(c: &SendCloudConfig) -> Result<Self, ConfigurationError> {
        let resolver = SendCloudTemplateResolver::new(&c.templates, &c.template_assignments)?;
        let client = SendCloudClient::builder(
            SendCloudCredentials {
                sms_user: c.sms_user.clone(),
                sms_key: c.sms_key.clone(),
            },
            resolver,
        )
        .base_url(c.base_url.clone())
        .timeout(timeout(c.timeout_seconds)?)
        .build()?;
        Ok(Self::SendCloud(client))
    }
}

fn timeout(seconds: Option<u64>) -> Result<Duration, ConfigurationError> {
    match seconds.unwrap_or(DEFAULT_PROVIDER_TIMEOUT_SECONDS) {
        0 => Err(ConfigurationError::Invalid(
            "timeout_seconds must be greater than zero".to_string(),
        )),
        seconds => Ok(Duration::from_secs(seconds)),
    }
}

#[async_trait]
impl SmsClient for ProviderClient {
    fn provider(&self) -> &'static str {
        match self {
            ProviderClient::AccessYou(c) => c.provider(),
            ProviderClient::SendCloud(c) => c.provider(),
        }
    }

    async fn send(&self, options: &SendOptions) -> Result<SendResult, SmsError> {
        match self {
            ProviderClient::AccessYou(c) => c.send(options).await,
            ProviderClient::SendCloud(c) => c.send(options).await,
        }
    }
}

/// Build one client per configured provider and bind every application to
/// its provider's client.
///
/// Fails on the first integrity problem: a dangling template id, a duplicate
/// provider or application, or an application naming an unknown provider.
pub fn build_registry(config: &SmsProviderConfig) -> Result<ClientRegistry, ConfigurationError> {
    let mut clients: HashMap<&str, Arc<dyn SmsClient>> = HashMap::new();
    for provider in &config.providers {
        let name = provider.name();
        if clients.contains_key(name) {
            return Err(ConfigurationError::DuplicateProvider(name.to_string()));
        }
        let client = ProviderClient::from_config(provider)?;
        info!("Configured SMS provider {:?} ({})", name, client.provider());
        clients.insert(name, Arc::new(client));
    }

    let mut registry = ClientRegistry::new();
    for app in &config.applications {
        if registry.contains(&app.app_id) {
            return Err(ConfigurationError::DuplicateApplication(app.app_id.clone()));
        }
        let client = clients.get(app.use_provider.as_str()).ok_or_else(|| {
            ConfigurationError::UnknownProvider {
                app_id: app.app_id.clone(),
                provider: app.use_provider.clone(),
            }
        })?;
        info!("Application {:?} uses provider {:?}", app.app_id, app.use_provider);
        registry = registry.with(app.app_id.clone(), Arc::clone(client));
    }

    Ok(registry)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(yaml: &str) -> SmsProviderConfig {
        SmsProviderConfig::from_yaml_str(yaml).unwrap()
    }

    const PROVIDERS: &str = r#"
providers:
  - name: hk
    type: accessyou
    account_no: "1"
    user: u
    password: p
    sender: s
  - name: cn
    type: sendcloud
    sms_user: u
    sms_key: k
    templates:
      - template_id: "T1"
        template_msg_type: "2"
    template_assignments:
      - authgear_template_name: otp
        default_template_id: "T1"
"#;

    #[test]
    fn binds_applications_to_providers() {
        let yaml = format!(
            "{PROVIDERS}applications:\n  - app_id: app1\n    use_provider: hk\n  - app_id: app2\n    use_provider: cn\n  - app_id: app3\n    use_provider: hk\n"
        );
        let registry = build_registry(&config(&yaml)).unwrap();
        assert_eq!(registry.len(), 3);
        assert_eq!(registry.get("app1").unwrap().provider(), "accessyou");
        assert_eq!(registry.get("app2").unwrap().provider(), "sendcloud");
        assert_eq!(registry.get("app3").unwrap().provider(), "accessyou");
        assert!(registry.get("app4").is_none());
    }

    #[test]
    fn unknown_provider_aborts() {
        let yaml = format!("{PROVIDERS}applications:\n  - app_id: app1\n    use_provider: us\n");
        let err = build_registry(&config(&yaml)).unwrap_err();
        assert!(matches!(
            err,
            ConfigurationError::UnknownProvider { ref app_id, ref provider } if app_id == "app1" && provider == "us"
        ));
    }

    #[test]
    fn duplicate_application_aborts() {
        let yaml = format!(
            "{PROVIDERS}applications:\n  - app_id: app1\n    use_provider: hk\n  - app_id: app1\n    use_provider: cn\n"
        );
        let err = build_registry(&config(&yaml)).unwrap_err();
        assert!(matches!(err, ConfigurationError::DuplicateApplication(ref id) if id == "app1"));
    }

    #[test]
    fn duplicate_provider_aborts() {
        let yaml = r#"
providers:
  - name: hk
    type: accessyou
    account_no: "1"
    user: u
    password: p
    sender: s
  - name: hk
    type: accessyou
    account_no: "2"
    user: u
    password: p
    sender: s
"#;
        let err = build_registry(&config(yaml)).unwrap_err();
        assert!(matches!(err, ConfigurationError::DuplicateProvider(ref name) if name == "hk"));
    }

    #[test]
    fn dangling_template_reference_aborts() {
        let yaml = r#"
providers:
  - name: cn
    type: sendcloud
    sms_user: u
    sms_key: k
    templates:
      - template_id: "T1"
        template_msg_type: "2"
    template_assignments:
      - authgear_template_name: otp
        default_template_id: "T1"
        by_languages:
          - authgear_language: en
            template_id: "T2"
applications:
  - app_id: app1
    use_provider: cn
"#;
        let err = build_registry(&config(yaml)).unwrap_err();
        assert!(
            matches!(err, ConfigurationError::TemplateNotFound { ref template_id } if template_id == "T2")
        );
    }

    #[test]
    fn zero_timeout_aborts() {
        let yaml = r#"
providers:
  - name: hk
    type: accessyou
    timeout_seconds: 0
    account_no: "1"
    user: u
    password: p
    sender: s
"#;
        let err = build_registry(&config(yaml)).unwrap_err();
        assert!(matches!(err, ConfigurationError::Invalid(ref msg) if msg.contains("timeout_seconds")));
    }

    #[test]
    fn invalid_base_url_aborts() {
        let yaml = r#"
providers:
  - name: hk
    type: accessyou
    base_url: "::not a url::"
    account_no: "1"
    user: u
    password: p
    sender: s
"#;
        assert!(matches!(
            build_registry(&config(yaml)),
            Err(ConfigurationError::Invalid(_))
        ));
    }
}
