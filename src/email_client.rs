use reqwest::Client;
use secrecy::{ExposeSecret, Secret};

use crate::contact_mailer::OutboundEmail;

/// HTTP email API client (Postmark-compatible `POST /email`).
pub struct EmailClient {
    http_client: Client,
    base_url: String,
    authorization_token: Secret<String>,
}

impl EmailClient {
    pub fn new(
        base_url: String,
        authorization_token: Secret<String>,
        timeout: std::time::Duration,
    ) -> Result<Self, reqwest::Error> {
        let http_client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http_client,
            base_url,
            authorization_token,
        })
    }

    pub async fn send_email(&self, email: &OutboundEmail) -> Result<(), reqwest::Error> {
        let url = format!("{}/email", self.base_url);
        let from = format!("{} <{}>", email.from_name, email.from);
        let request_body = SendEmailRequest {
            from: &from,
            to: email.to.as_ref(),
            reply_to: email.reply_to.as_ref(),
            subject: &email.subject,
            html_body: &email.html_body,
            text_body: &email.text_body,
        };
        self.http_client
            .post(&url)
            .header(
                "X-Postmark-Server-Token",
                self.authorization_token.expose_secret(),
            )
            .json(&request_body)
            .send()
            .await?
            .error_for_status()?;
        Ok(())
    }
}

#[derive(serde::Serialize)]
#[serde(rename_all = "PascalCase")]
struct SendEmailRequest<'a> {
    from: &'a str,
    to: &'a str,
    reply_to: &'a str,
    subject: &'a str,
    html_body: &'a str,
    text_body: &'a str,
}
