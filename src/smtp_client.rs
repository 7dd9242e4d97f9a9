use anyhow::Context;
use lettre::message::{Mailbox, MultiPart};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{Address, AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use secrecy::{ExposeSecret, Secret};

use crate::contact_mailer::OutboundEmail;
use crate::domain::ContactEmail;

/// Authenticated SMTP relay over implicit TLS or STARTTLS, depending on the
/// provider's port.
pub struct SmtpClient {
    transport: AsyncSmtpTransport<Tokio1Executor>,
}

impl SmtpClient {
    pub fn new(
        host: &str,
        port: u16,
        username: &ContactEmail,
        password: Secret<String>,
        timeout: std::time::Duration,
    ) -> Result<Self, anyhow::Error> {
        let builder = if port == 465 {
            AsyncSmtpTransport::<Tokio1Executor>::relay(host)
        } else {
            AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(host)
        }
        .with_context(|| format!("Failed to configure an SMTP relay for {}", host))?;

        let transport = builder
            .port(port)
            .credentials(Credentials::new(
                username.as_ref().to_owned(),
                password.expose_secret().to_owned(),
            ))
            .timeout(Some(timeout))
            .build();
        Ok(Self { transport })
    }

    pub async fn send_email(&self, email: &OutboundEmail) -> Result<(), anyhow::Error> {
        let message = build_message(email)?;
        self.transport
            .send(message)
            .await
            .context("The SMTP server rejected the message")?;
        Ok(())
    }
}

fn mailbox(name: Option<String>, email: &ContactEmail) -> Result<Mailbox, anyhow::Error> {
    let address: Address = email
        .as_ref()
        .parse()
        .with_context(|| format!("{} is not a deliverable address", email))?;
    Ok(Mailbox::new(name, address))
}

fn build_message(email: &OutboundEmail) -> Result<Message, anyhow::Error> {
    let mut builder = Message::builder()
        .from(mailbox(Some(email.from_name.clone()), &email.from)?)
        .to(mailbox(None, &email.to)?);
    // Visitor addresses only pass a shallow check; an address SMTP cannot
    // carry loses its Reply-To header rather than the whole message.
    match mailbox(None, &email.reply_to) {
        Ok(reply_to) => builder = builder.reply_to(reply_to),
        Err(e) => tracing::warn!(
            error.cause_chain = ?e,
            "Sending contact request without a Reply-To header"
        ),
    }
    builder
        .subject(email.subject.as_str())
        .multipart(MultiPart::alternative_plain_html(
            email.text_body.clone(),
            email.html_body.clone(),
        ))
        .context("Failed to build the outgoing message")
}
