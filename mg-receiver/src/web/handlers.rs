//! Webhook endpoint handlers.
//!
//! These handlers stay thin: they extract the form, run the pipeline and map
//! its outcome to a response. The Mailgun calls happen later in the workers.

use axum::{
    extract::{
        multipart::MultipartError, Form, FromRequest, Multipart, Request, State,
    },
    http::{header::CONTENT_TYPE, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::pipeline::{handle_webhook, AppContext, WebhookOutcome, WebhookRequest};

// =============================================================================
// Health Check
// =============================================================================

/// Health check response.
#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
}

/// Health check endpoint.
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse { status: "ok" })
}

// =============================================================================
// Mailgun Webhook
// =============================================================================

/// Mailgun form payload.
///
/// Mailgun sends form-encoded data, not JSON, and switches to
/// `multipart/form-data` when the message carries attachments.
/// Field names use hyphens, which are aliased here.
#[derive(Debug, Default, Deserialize)]
pub struct MailgunForm {
    #[serde(default)]
    pub token: String,
    #[serde(default)]
    pub timestamp: String,
    #[serde(default)]
    pub signature: String,
    #[serde(default, rename = "message-headers")]
    pub message_headers: String,
}

impl From<MailgunForm> for WebhookRequest {
    fn from(form: MailgunForm) -> Self {
        WebhookRequest {
            token: form.token,
            timestamp: form.timestamp,
            signature: form.signature,
            message_headers: form.message_headers,
        }
    }
}

/// Mailgun reply webhook endpoint.
pub async fn mailgun_webhook(State(ctx): State<AppContext>, request: Request) -> Response {
    let form = match read_form(&ctx, request).await {
        Ok(form) => form,
        Err(rejection) => return rejection,
    };

    info!(
        has_signature = !form.signature.is_empty(),
        headers_length = form.message_headers.len(),
        "webhook_received"
    );

    let outcome = handle_webhook(&ctx, form.into()).await;
    into_response(outcome).into_response()
}

/// Decode the body as urlencoded or multipart, depending on `Content-Type`.
async fn read_form(ctx: &AppContext, request: Request) -> Result<MailgunForm, Response> {
    let is_multipart = request
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|ct| {
            ct.trim_start()
                .to_ascii_lowercase()
                .starts_with("multipart/form-data")
        });

    if is_multipart {
        let multipart = Multipart::from_request(request, ctx)
            .await
            .map_err(IntoResponse::into_response)?;
        read_multipart(multipart).await.map_err(|e| {
            warn!(error = %e, "webhook_multipart_invalid");
            e.into_response()
        })
    } else {
        let Form(form) = Form::<MailgunForm>::from_request(request, ctx)
            .await
            .map_err(IntoResponse::into_response)?;
        Ok(form)
    }
}

/// Collect the signature and header fields; attachments are skipped.
async fn read_multipart(mut multipart: Multipart) -> Result<MailgunForm, MultipartError> {
    let mut form = MailgunForm::default();

    while let Some(field) = multipart.next_field().await? {
        let slot = match field.name() {
            Some("token") => &mut form.token,
            Some("timestamp") => &mut form.timestamp,
            Some("signature") => &mut form.signature,
            Some("message-headers") => &mut form.message_headers,
            _ => continue,
        };
        *slot = field.text().await?;
    }

    Ok(form)
}

fn into_response(outcome: WebhookOutcome) -> (StatusCode, &'static str) {
    let status =
        StatusCode::from_u16(outcome.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

    let body = match outcome {
        WebhookOutcome::Unauthorized => "Unauthorized",
        WebhookOutcome::Skipped(_) => "",
        WebhookOutcome::Duplicate => "User already processed",
        WebhookOutcome::Accepted => "Thank you",
        WebhookOutcome::StoreError => "Internal Server Error",
    };

    (status, body)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::SkipReason;

    #[test]
    fn test_into_response() {
        assert_eq!(
            into_response(WebhookOutcome::Accepted),
            (StatusCode::OK, "Thank you")
        );
        assert_eq!(
            into_response(WebhookOutcome::Skipped(SkipReason::MalformedHeaders)),
            (StatusCode::OK, "")
        );
        assert_eq!(
            into_response(WebhookOutcome::Duplicate),
            (StatusCode::NOT_ACCEPTABLE, "User already processed")
        );
        assert_eq!(
            into_response(WebhookOutcome::Unauthorized).0,
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            into_response(WebhookOutcome::StoreError).0,
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
