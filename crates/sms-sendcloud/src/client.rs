use std::collections::BTreeMap;
use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use sha2::{Digest, Sha256};
use sms_core::{
    mask_phone_number, ConfigurationError, SendOptions, SendResult, SmsClient, SmsError,
};
use tracing::{debug, error, info, warn};
use url::Url;

use crate::template::SendCloudTemplateResolver;

const PROVIDER: &str = "sendcloud";

pub const DEFAULT_BASE_URL: &str = "https://api.sendcloud.net";

const SEND_PATH: &str = "/smsapi/send";

const SIGN_TYPE: &str = "sha256";

/// SendCloud SMS API credentials.
#[derive(Clone)]
pub struct SendCloudCredentials {
    pub sms_user: String,
    /// Secret used to sign requests; never sent over the wire.
    pub sms_key: String,
}

impl std::fmt::Debug for SendCloudCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SendCloudCredentials")
            .field("sms_user", &self.sms_user)
            .field("sms_key", &"<redacted>")
            .finish()
    }
}

#[derive(Debug, Clone)]
pub struct SendCloudClientBuilder {
    credentials: SendCloudCredentials,
    resolver: SendCloudTemplateResolver,
    base_url: Option<String>,
    timeout: Option<Duration>,
}

impl SendCloudClientBuilder {
    /// Override the API base URL; an empty string keeps the default.
    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into();
        self.base_url = (!base_url.is_empty()).then_some(base_url);
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn build(self) -> Result<SendCloudClient, ConfigurationError> {
        let base_url = self.base_url.as_deref().unwrap_or(DEFAULT_BASE_URL);
        let send_url = Url::parse(&format!("{}{}", base_url.trim_end_matches('/'), SEND_PATH))
            .map_err(|e| {
                ConfigurationError::Invalid(format!("invalid SendCloud base_url {base_url:?}: {e}"))
            })?;

        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = self.timeout {
            builder = builder.timeout(timeout);
        }
        let http = builder
            .build()
            .map_err(|e| ConfigurationError::Invalid(format!("http client: {e}")))?;

        Ok(SendCloudClient {
            credentials: self.credentials,
            resolver: self.resolver,
            send_url,
            http,
        })
    }
}

/// SendCloud template SMS client.
#[derive(Debug, Clone)]
pub struct SendCloudClient {
    credentials: SendCloudCredentials,
    resolver: SendCloudTemplateResolver,
    send_url: Url,
    http: reqwest::Client,
}

impl SendCloudClient {
    pub fn builder(
        credentials: SendCloudCredentials,
        resolver: SendCloudTemplateResolver,
    ) -> SendCloudClientBuilder {
        SendCloudClientBuilder {
            credentials,
            resolver,
            base_url: None,
            timeout: None,
        }
    }

    pub fn resolver(&self) -> &SendCloudTemplateResolver {
        &self.resolver
    }

    pub fn send_url(&self) -> &Url {
        &self.send_url
    }
}

/// Signature over every request field: `key&k1=v1&...&kn=vn&key`, fields in
/// key order, hashed with SHA-256 and hex encoded.
pub fn sign(sms_key: &str, params: &BTreeMap<&str, String>) -> String {
    let joined = params
        .iter()
        .map(|(k, v)| format!("{}={}", k, v))
        .collect::<Vec<_>>()
        .join("&");
    let digest = Sha256::digest(format!("{sms_key}&{joined}&{sms_key}").as_bytes());
    hex::encode(digest)
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SendCloudSendResponse {
    result: bool,
    status_code: i64,
    #[serde(default)]
    message: Option<String>,
}

#[async_trait]
impl SmsClient for SendCloudClient {
    fn provider(&self) -> &'static str {
        PROVIDER
    }

    async fn send(&self, options: &SendOptions) -> Result<SendResult, SmsError> {
        let template = self
            .resolver
            .resolve(&options.template_name, &options.language_tag)
            .inspect_err(|e| warn!("SendCloud template resolution failed: {}", e))?;
        debug!(
            "Resolved template {:?}/{:?} to {} (msgType {})",
            options.template_name,
            options.language_tag,
            template.template_id,
            template.template_msg_type.as_str()
        );

        let vars = serde_json::to_string(&options.template_variables)
            .map_err(|e| SmsError::Unexpected(format!("template variables: {}", e)))?;

        let mut params = BTreeMap::new();
        params.insert("smsUser", self.credentials.sms_user.clone());
        params.insert("templateId", template.template_id.0.clone());
        params.insert("msgType", template.template_msg_type.0.clone());
        params.insert("phone", options.to.clone());
        params.insert("vars", vars);
        params.insert("signType", SIGN_TYPE.to_string());
        let signature = sign(&self.credentials.sms_key, &params);
        params.insert("signature", signature);

        info!(
            "Sending SMS via SendCloud to {} with template {}",
            mask_phone_number(&options.to),
            template.template_id
        );

        let res = self
            .http
            .post(self.send_url.clone())
            .form(&params)
            .send()
            .await
            .map_err(|e| {
                error!("SendCloud request failed: {}", e);
                SmsError::Http(e.to_string())
            })?;

        let status = res.status();
        let raw = res.text().await.map_err(|e| {
            error!("Failed to read SendCloud response: {}", e);
            SmsError::Http(e.to_string())
        })?;

        if !status.is_success() {
            error!("SendCloud returned HTTP {}: {}", status, raw);
            return Err(SmsError::Provider(format!("HTTP {}: {}", status, raw)));
        }

        let parsed: SendCloudSendResponse = serde_json::from_str(&raw).map_err(|e| {
            error!("Unparseable SendCloud response {:?}: {}", raw, e);
            SmsError::Provider(format!("invalid SendCloud response: {}", e))
        })?;

        info!(
            "SendCloud responded result={} statusCode={} message={:?}: {}",
            parsed.result, parsed.status_code, parsed.message, raw
        );

        Ok(SendResult {
            success: parsed.result && parsed.status_code == 200,
            client_response: raw,
            segment_count: None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::template::{ByLanguageConfig, TemplateAssignmentConfig, TemplateConfig};
    use sms_core::TemplateVariables;
    use wiremock::matchers::{body_string_contains, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn resolver() -> SendCloudTemplateResolver {
        SendCloudTemplateResolver::new(
            &[
                TemplateConfig {
                    template_id: "T1".into(),
                    template_msg_type: "2".into(),
                },
                TemplateConfig {
                    template_id: "T2".into(),
                    template_msg_type: "0".into(),
                },
            ],
            &[TemplateAssignmentConfig {
                authgear_template_name: "otp".into(),
                default_template_id: "T1".into(),
                by_languages: vec![ByLanguageConfig {
                    authgear_language: "en".into(),
                    template_id: "T2".into(),
                }],
            }],
        )
        .unwrap()
    }

    fn client_for(server: &MockServer) -> SendCloudClient {
        SendCloudClient::builder(
            SendCloudCredentials {
                sms_user: "gateway".into(),
                sms_key: "key".into(),
            },
            resolver(),
        )
        .base_url(server.uri())
        .build()
        .unwrap()
    }

    fn otp(language_tag: &str) -> SendOptions {
        SendOptions {
            to: "85212345678".into(),
            body: "ignored".into(),
            template_name: "otp".into(),
            language_tag: language_tag.into(),
            template_variables: TemplateVariables {
                code: Some("123456".into()),
                ..Default::default()
            },
        }
    }

    const OK_BODY: &str =
        r#"{"result":true,"statusCode":200,"message":"ok","info":{"successCount":1,"smsIds":["1"]}}"#;

    #[test]
    fn signature_covers_sorted_fields() {
        let mut params = BTreeMap::new();
        params.insert("b", "2".to_string());
        params.insert("a", "1".to_string());
        let expected = hex::encode(Sha256::digest(b"k&a=1&b=2&k"));
        assert_eq!(sign("k", &params), expected);
        assert_eq!(expected.len(), 64);
    }

    #[test]
    fn default_base_url() {
        let client = SendCloudClient::builder(
            SendCloudCredentials {
                sms_user: "u".into(),
                sms_key: "k".into(),
            },
            resolver(),
        )
        .build()
        .unwrap();
        assert_eq!(client.send_url().as_str(), "https://api.sendcloud.net/smsapi/send");
        let creds = SendCloudCredentials {
            sms_user: "u".into(),
            sms_key: "hunter2".into(),
        };
        assert!(!format!("{:?}", creds).contains("hunter2"));
    }

    #[test]
    fn base_url_path_prefix_is_kept() {
        let client = SendCloudClient::builder(
            SendCloudCredentials {
                sms_user: "u".into(),
                sms_key: "k".into(),
            },
            resolver(),
        )
        .base_url("https://proxy.example.com/sendcloud/")
        .build()
        .unwrap();
        assert_eq!(
            client.send_url().as_str(),
            "https://proxy.example.com/sendcloud/smsapi/send"
        );
    }

    #[tokio::test]
    async fn sends_to_prefixed_endpoint() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/sendcloud/smsapi/send"))
            .respond_with(ResponseTemplate::new(200).set_body_string(OK_BODY))
            .expect(1)
            .mount(&server)
            .await;

        let client = SendCloudClient::builder(
            SendCloudCredentials {
                sms_user: "gateway".into(),
                sms_key: "key".into(),
            },
            resolver(),
        )
        .base_url(format!("{}/sendcloud", server.uri()))
        .build()
        .unwrap();
        assert!(client.send(&otp("en")).await.unwrap().success);
    }

    #[tokio::test]
    async fn form_carries_vars_and_matching_signature() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/smsapi/send"))
            .respond_with(ResponseTemplate::new(200).set_body_string(OK_BODY))
            .expect(1)
            .mount(&server)
            .await;

        client_for(&server).send(&otp("en")).await.unwrap();

        let requests = server.received_requests().await.unwrap();
        let mut form: BTreeMap<String, String> = url::form_urlencoded::parse(&requests[0].body)
            .into_owned()
            .collect();

        let vars: serde_json::Value = serde_json::from_str(&form["vars"]).unwrap();
        assert_eq!(vars, serde_json::json!({ "code": "123456" }));

        let signature = form.remove("signature").unwrap();
        let signed: BTreeMap<&str, String> =
            form.iter().map(|(k, v)| (k.as_str(), v.clone())).collect();
        assert_eq!(
            signed.keys().copied().collect::<Vec<_>>(),
            ["msgType", "phone", "signType", "smsUser", "templateId", "vars"]
        );
        assert_eq!(signature, sign("key", &signed));
    }

    #[tokio::test]
    async fn english_uses_language_override() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/smsapi/send"))
            .and(body_string_contains("templateId=T2"))
            .and(body_string_contains("msgType=0"))
            .and(body_string_contains("smsUser=gateway"))
            .and(body_string_contains("phone=85212345678"))
            .and(body_string_contains("signType=sha256"))
            .and(body_string_contains("signature="))
            .respond_with(ResponseTemplate::new(200).set_body_string(OK_BODY))
            .expect(1)
            .mount(&server)
            .await;

        let result = client_for(&server).send(&otp("en")).await.unwrap();
        assert!(result.success);
        assert_eq!(result.client_response, OK_BODY);
    }

    #[tokio::test]
    async fn other_language_uses_default_template() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/smsapi/send"))
            .and(body_string_contains("templateId=T1"))
            .and(body_string_contains("msgType=2"))
            .respond_with(ResponseTemplate::new(200).set_body_string(OK_BODY))
            .expect(1)
            .mount(&server)
            .await;

        let result = client_for(&server).send(&otp("fr")).await.unwrap();
        assert!(result.success);
    }

    #[tokio::test]
    async fn unknown_template_makes_no_request() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_string(OK_BODY))
            .expect(0)
            .mount(&server)
            .await;

        let mut options = otp("en");
        options.template_name = "welcome".into();
        let err = client_for(&server).send(&options).await.unwrap_err();
        assert!(matches!(err, SmsError::UnknownTemplate(_)));
    }

    #[tokio::test]
    async fn vendor_rejection_is_not_an_error() {
        let server = MockServer::start().await;
        let body = r#"{"result":false,"statusCode":412,"message":"invalid phone","info":{}}"#;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_string(body))
            .mount(&server)
            .await;

        let result = client_for(&server).send(&otp("en")).await.unwrap();
        assert!(!result.success);
        assert_eq!(result.client_response, body);
    }

    #[tokio::test]
    async fn server_error_is_a_provider_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
            .mount(&server)
            .await;

        let err = client_for(&server).send(&otp("en")).await.unwrap_err();
        assert!(matches!(err, SmsError::Provider(_)));
    }
}
