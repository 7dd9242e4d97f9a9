use actix_web::body::BoxBody;
use actix_web::http::StatusCode;
use actix_web::{web, HttpMessage, HttpRequest, HttpResponse, ResponseError};
use anyhow::Context;
use std::fmt::Formatter;

use crate::contact_mailer::{ContactMailer, MailError};
use crate::domain::{ContactData, Submission, SubmissionError};
use crate::rate_limit::{client_ip, RateLimiter};

#[derive(thiserror::Error)]
pub enum SendError {
    #[error(transparent)]
    ValidationError(#[from] SubmissionError),
    #[error("Invalid submission.")]
    MalformedBody(#[source] anyhow::Error),
    #[error("Too many requests. Please try again later.")]
    RateLimited,
    #[error("Server configuration error.")]
    ConfigurationError,
    #[error("Error sending email.")]
    DeliveryError(#[source] anyhow::Error),
}

impl std::fmt::Debug for SendError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        error_chain_fmt(self, f)
    }
}

impl From<MailError> for SendError {
    fn from(e: MailError) -> Self {
        match e {
            MailError::MissingCredentials => SendError::ConfigurationError,
            e => SendError::DeliveryError(e.into()),
        }
    }
}

impl ResponseError for SendError {
    fn status_code(&self) -> StatusCode {
        match self {
            SendError::ValidationError(_) | SendError::MalformedBody(_) => StatusCode::BAD_REQUEST,
            SendError::RateLimited => StatusCode::TOO_MANY_REQUESTS,
            SendError::ConfigurationError | SendError::DeliveryError(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    fn error_response(&self) -> HttpResponse<BoxBody> {
        HttpResponse::build(self.status_code()).json(serde_json::json!({
            "error": self.to_string()
        }))
    }
}

#[tracing::instrument(
    name = "Handling a contact request",
    skip(request, body, rate_limiter, mailer),
    fields(client_ip = tracing::field::Empty)
)]
pub async fn send(
    request: HttpRequest,
    body: web::Bytes,
    rate_limiter: web::Data<RateLimiter>,
    mailer: web::Data<ContactMailer>,
) -> Result<HttpResponse, SendError> {
    let client_ip = client_ip(&request);
    tracing::Span::current().record("client_ip", &tracing::field::display(&client_ip));

    if !rate_limiter.check(&client_ip) {
        tracing::warn!("Rejecting contact request over the rate limit");
        return Err(SendError::RateLimited);
    }

    let data = parse_contact_data(&request, &body).map_err(SendError::MalformedBody)?;
    let submission = Submission::try_from(data).map_err(|e| {
        tracing::info!(reason = %e, "Rejecting invalid contact submission");
        e
    })?;

    mailer.relay(&submission).await.map_err(|e| {
        tracing::error!(
            error.cause_chain = ?e,
            error.message = %e,
            "Failed to relay contact submission"
        );
        e
    })?;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "message": "Message sent successfully!"
    })))
}

/// JSON from the scripted form, url-encoded from a plain HTML form post.
/// An empty body is an empty submission.
fn parse_contact_data(request: &HttpRequest, body: &[u8]) -> Result<ContactData, anyhow::Error> {
    if body.is_empty() {
        return Ok(ContactData::default());
    }
    if request.content_type() == "application/x-www-form-urlencoded" {
        serde_urlencoded::from_bytes(body).context("Failed to decode a url-encoded contact form")
    } else {
        serde_json::from_slice(body).context("Failed to decode a JSON contact form")
    }
}

pub fn error_chain_fmt(
    e: &impl std::error::Error,
    f: &mut std::fmt::Formatter<'_>,
) -> std::fmt::Result {
    writeln!(f, "{}\n", e)?;
    let mut current = e.source();
    while let Some(cause) = current {
        writeln!(f, "Caused by:\n\t{}", cause)?;
        current = cause.source();
    }
    Ok(())
}
