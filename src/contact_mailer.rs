use std::time::Duration;

use anyhow::Context;

use crate::domain::{ContactEmail, Submission};
use crate::email_client::EmailClient;
use crate::smtp_client::SmtpClient;

/// A fully composed message, ready for any transport.
#[derive(Debug, Clone)]
pub struct OutboundEmail {
    pub from_name: String,
    pub from: ContactEmail,
    pub reply_to: ContactEmail,
    pub to: ContactEmail,
    pub subject: String,
    pub html_body: String,
    pub text_body: String,
}

pub enum MailTransport {
    Smtp(SmtpClient),
    Api(EmailClient),
}

impl MailTransport {
    pub async fn send_email(&self, email: &OutboundEmail) -> Result<(), anyhow::Error> {
        match self {
            MailTransport::Smtp(client) => client.send_email(email).await,
            MailTransport::Api(client) => client
                .send_email(email)
                .await
                .context("The email API rejected the message"),
        }
    }
}

#[derive(thiserror::Error, Debug)]
pub enum MailError {
    #[error("No mail transport credentials are configured")]
    MissingCredentials,
    #[error("Mail delivery did not complete within {0:?}")]
    Timeout(Duration),
    #[error(transparent)]
    Transport(#[from] anyhow::Error),
}

/// Relays contact submissions to the site operator.
///
/// `transport` is `None` when no credentials were configured; every relay
/// attempt then fails with [`MailError::MissingCredentials`].
pub struct ContactMailer {
    sender_name: String,
    sender: ContactEmail,
    operator: ContactEmail,
    transport: Option<MailTransport>,
    timeout: Duration,
}

impl ContactMailer {
    pub fn new(
        sender_name: String,
        sender: ContactEmail,
        operator: ContactEmail,
        transport: Option<MailTransport>,
        timeout: Duration,
    ) -> Self {
        Self {
            sender_name,
            sender,
            operator,
            transport,
            timeout,
        }
    }

    pub fn is_configured(&self) -> bool {
        self.transport.is_some()
    }

    #[tracing::instrument(
        name = "Relaying contact submission",
        skip(self, submission),
        fields(reply_to = %submission.email)
    )]
    pub async fn relay(&self, submission: &Submission) -> Result<(), MailError> {
        let transport = self.transport.as_ref().ok_or(MailError::MissingCredentials)?;
        let email = compose(submission, &self.sender_name, &self.sender, &self.operator);
        tokio::time::timeout(self.timeout, transport.send_email(&email))
            .await
            .map_err(|_| MailError::Timeout(self.timeout))??;
        Ok(())
    }
}

pub fn compose(
    submission: &Submission,
    sender_name: &str,
    sender: &ContactEmail,
    recipient: &ContactEmail,
) -> OutboundEmail {
    let website = submission.website.as_ref().map(|w| w.as_ref());

    let safe_business = htmlescape::encode_minimal(&submission.business);
    let safe_email = htmlescape::encode_minimal(submission.email.as_ref());
    let safe_website = website
        .map(htmlescape::encode_minimal)
        .unwrap_or_else(|| "N/A".to_string());
    let safe_message = htmlescape::encode_minimal(&submission.message.replace("\r\n", "\n"))
        .replace('\n', "<br>");

    let html_body = format!(
        "<p><strong>Business:</strong> {business}</p>\n\
         <p><strong>Email:</strong> {email}</p>\n\
         <p><strong>Website:</strong> {website}</p>\n\
         <p><strong>Message:</strong><br>{message}</p>",
        business = safe_business,
        email = safe_email,
        website = safe_website,
        message = safe_message,
    );
    let text_body = format!(
        "Business: {business}\nEmail: {email}\nWebsite: {website}\nMessage: {message}",
        business = submission.business,
        email = submission.email,
        website = website.unwrap_or("N/A"),
        message = submission.message,
    );

    // Header values must stay on one line.
    let business: String = submission
        .business
        .chars()
        .filter(|c| !c.is_control())
        .collect();

    OutboundEmail {
        from_name: sender_name.to_string(),
        from: sender.clone(),
        reply_to: submission.email.clone(),
        to: recipient.clone(),
        subject: format!("New Contact Request from {}", business),
        html_body,
        text_body,
    }
}
