use axum::{
    extract::State,
    http::{header, StatusCode},
    response::IntoResponse,
    routing::{get, post},
    Router,
};
use bytes::Bytes;
use sms_core::SmsService;
use sms_web_generic::{GatewayResponse, ResponseConverter, SendProcessor};

#[derive(Clone)]
pub struct AppState {
    pub processor: SendProcessor,
}

/// Axum-specific response converter
pub struct AxumResponseConverter;

impl ResponseConverter for AxumResponseConverter {
    type ResponseType = axum::response::Response;

    fn from_gateway_response(response: GatewayResponse) -> Self::ResponseType {
        let status = StatusCode::from_u16(response.status.as_u16())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (
            status,
            [(header::CONTENT_TYPE, response.content_type)],
            response.body,
        )
            .into_response()
    }
}

/// POST /send
pub async fn send(State(state): State<AppState>, body: Bytes) -> impl IntoResponse {
    let response = state.processor.process_send(&body).await;
    AxumResponseConverter::from_gateway_response(response)
}

/// GET /healthz
pub async fn healthz() -> impl IntoResponse {
    StatusCode::OK
}

/// Router with the gateway endpoints, ready to be served.
pub fn router(service: SmsService) -> Router {
    Router::new()
        .route("/healthz", get(healthz))
        .route("/send", post(send))
        .with_state(AppState {
            processor: SendProcessor::new(service),
        })
}
