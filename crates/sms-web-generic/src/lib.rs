use serde::{Deserialize, Serialize};
use sms_core::{mask_phone_number, SendOptions, SendResult, SmsError, SmsService, TemplateVariables};
use tracing::{error, info, warn};

/// HTTP status code for web responses
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpStatus {
    Ok = 200,
    BadRequest = 400,
    InternalServerError = 500,
    BadGateway = 502,
}

impl HttpStatus {
    pub fn as_u16(self) -> u16 {
        self as u16
    }
}

/// Body accepted by the send endpoint. Unknown fields are rejected.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SendRequestBody {
    #[serde(default)]
    pub app_id: String,
    pub to: String,
    pub body: String,
    pub template_name: String,
    pub language_tag: String,
    pub template_variables: TemplateVariables,
    /// Accepted for compatibility with existing callers; not forwarded.
    #[serde(default)]
    pub message_type: Option<String>,
}

impl SendRequestBody {
    fn into_parts(self) -> (String, SendOptions) {
        (
            self.app_id,
            SendOptions {
                to: self.to,
                body: self.body,
                template_name: self.template_name,
                language_tag: self.language_tag,
                template_variables: self.template_variables,
            },
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ResponseCode {
    Ok,
    DeliveryFailed,
    InvalidRequest,
    UnknownApplication,
    UnknownTemplate,
    UnknownError,
}

impl ResponseCode {
    pub fn http_status(self) -> HttpStatus {
        match self {
            ResponseCode::Ok => HttpStatus::Ok,
            ResponseCode::DeliveryFailed => HttpStatus::BadGateway,
            ResponseCode::InvalidRequest
            | ResponseCode::UnknownApplication
            | ResponseCode::UnknownTemplate => HttpStatus::BadRequest,
            ResponseCode::UnknownError => HttpStatus::InternalServerError,
        }
    }
}

/// Envelope returned by the send endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResponseBody {
    pub code: ResponseCode,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub underlying_http_response_body: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub segment_count: Option<u32>,
}

impl ResponseBody {
    fn error(code: ResponseCode, description: impl Into<String>) -> Self {
        Self {
            code,
            error_description: Some(description.into()),
            underlying_http_response_body: None,
            segment_count: None,
        }
    }

    fn from_result(result: SendResult) -> Self {
        let code = if result.success {
            ResponseCode::Ok
        } else {
            ResponseCode::DeliveryFailed
        };
        Self {
            code,
            error_description: None,
            underlying_http_response_body: Some(result.client_response),
            segment_count: result.segment_count,
        }
    }
}

/// Generic response that can be converted to any framework's response type
#[derive(Debug, Clone)]
pub struct GatewayResponse {
    pub status: HttpStatus,
    pub body: String,
    pub content_type: String,
}

impl GatewayResponse {
    pub fn json(body: &ResponseBody) -> Self {
        Self {
            status: body.code.http_status(),
            body: serde_json::to_string(body).unwrap_or_else(|_| "{}".to_string()),
            content_type: "application/json".to_string(),
        }
    }
}

#[derive(Debug, thiserror::Error)]
enum SendHandlerError {
    #[error("{0}")]
    InvalidRequest(String),
    #[error(transparent)]
    Sms(#[from] SmsError),
}

/// Framework-agnostic processor for the send endpoint
#[derive(Debug, Clone)]
pub struct SendProcessor {
    service: SmsService,
}

impl SendProcessor {
    pub fn new(service: SmsService) -> Self {
        Self { service }
    }

    /// Validate a raw JSON request body, dispatch it and build the response envelope.
    pub async fn process_send(&self, body: &[u8]) -> GatewayResponse {
        let response = match self.process_send_internal(body).await {
            Ok(result) => ResponseBody::from_result(result),
            Err(e) => Self::error_to_response(e),
        };
        GatewayResponse::json(&response)
    }

    async fn process_send_internal(&self, body: &[u8]) -> Result<SendResult, SendHandlerError> {
        let request: SendRequestBody = serde_json::from_slice(body)
            .map_err(|e| SendHandlerError::InvalidRequest(e.to_string()))?;
        let (app_id, options) = request.into_parts();

        info!(
            "Attempt to send sms to {}. AppID: {:?}",
            mask_phone_number(&options.to),
            app_id
        );

        Ok(self.service.send(&app_id, &options).await?)
    }

    fn error_to_response(error: SendHandlerError) -> ResponseBody {
        match error {
            SendHandlerError::InvalidRequest(msg) => {
                warn!("Rejected send request: {}", msg);
                ResponseBody::error(ResponseCode::InvalidRequest, msg)
            }
            SendHandlerError::Sms(e) => {
                let code = match &e {
                    SmsError::UnknownApplication(_) => ResponseCode::UnknownApplication,
                    SmsError::UnknownTemplate(_) => ResponseCode::UnknownTemplate,
                    SmsError::Http(_) | SmsError::Provider(_) | SmsError::Unexpected(_) => {
                        ResponseCode::UnknownError
                    }
                };
                if e.is_dispatch_error() {
                    warn!("Send request not dispatched: {}", e);
                } else {
                    error!("Send request failed: {}", e);
                }
                ResponseBody::error(code, e.to_string())
            }
        }
    }
}

/// Helper trait for framework adapters to convert responses
pub trait ResponseConverter {
    type ResponseType;

    fn from_gateway_response(response: GatewayResponse) -> Self::ResponseType;
}
