use std::net::TcpListener;

use actix_web::dev::Server;
use actix_web::http::header;
use actix_web::middleware::DefaultHeaders;
use actix_web::web::Data;
use actix_web::{web, App, HttpServer};
use anyhow::Context;
use tracing_actix_web::TracingLogger;

use crate::configuration::{EmailClientSettings, MailTransportKind, Settings};
use crate::contact_mailer::{ContactMailer, MailTransport};
use crate::email_client::EmailClient;
use crate::rate_limit::{prune_rate_limits, RateLimiter};
use crate::routes;
use crate::smtp_client::SmtpClient;

const CONTENT_SECURITY_POLICY: &str = "default-src 'self'; \
    img-src 'self' data: https://image.thum.io; \
    style-src 'self' https://fonts.googleapis.com; \
    font-src 'self' https://fonts.gstatic.com; \
    script-src 'self'; \
    connect-src 'self'; \
    frame-ancestors 'none'; \
    base-uri 'self'; \
    form-action 'self'";

pub struct Application {
    port: u16,
    server: Server,
}

impl Application {
    pub async fn build(configuration: Settings) -> Result<Self, anyhow::Error> {
        let mailer = build_mailer(&configuration.email_client)?;
        if !mailer.is_configured() {
            tracing::warn!(
                "No mail credentials configured; contact requests will fail until they are set"
            );
        }

        let rate_limiter = Data::new(RateLimiter::new(
            configuration.rate_limit.window(),
            configuration.rate_limit.max_requests,
        ));
        tokio::spawn(prune_rate_limits(
            rate_limiter.clone().into_inner(),
            configuration.rate_limit.prune_interval(),
        ));

        let address = format!(
            "{}:{}",
            configuration.application.host, configuration.application.port
        );
        let listener = TcpListener::bind(&address)
            .with_context(|| format!("Failed to bind {}", address))?;
        let port = listener.local_addr()?.port();
        let server = run(
            listener,
            rate_limiter,
            mailer,
            configuration.application.max_payload_bytes,
        )?;

        Ok(Self { port, server })
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub async fn run_until_stopped(self) -> Result<(), std::io::Error> {
        self.server.await
    }
}

pub fn build_mailer(settings: &EmailClientSettings) -> Result<ContactMailer, anyhow::Error> {
    let sender = settings
        .sender()
        .map_err(anyhow::Error::msg)
        .context("Invalid sender email address")?;
    let operator = settings
        .operator()
        .map_err(anyhow::Error::msg)
        .context("Invalid operator email address")?;

    let transport = match settings.credentials() {
        None => None,
        Some(secret) => Some(match settings.transport {
            MailTransportKind::Smtp => MailTransport::Smtp(SmtpClient::new(
                &settings.smtp_host,
                settings.smtp_port,
                &sender,
                secret,
                settings.timeout(),
            )?),
            MailTransportKind::Api => MailTransport::Api(
                EmailClient::new(settings.base_url.clone(), secret, settings.timeout())
                    .context("Failed to build the email API client")?,
            ),
        }),
    };

    Ok(ContactMailer::new(
        settings.sender_name.clone(),
        sender,
        operator,
        transport,
        settings.timeout(),
    ))
}

pub fn run(
    listener: TcpListener,
    rate_limiter: Data<RateLimiter>,
    mailer: ContactMailer,
    max_payload_bytes: usize,
) -> Result<Server, std::io::Error> {
    let mailer = Data::new(mailer);
    let server = HttpServer::new(move || {
        App::new()
            .wrap(
                DefaultHeaders::new()
                    .add((header::X_CONTENT_TYPE_OPTIONS, "nosniff"))
                    .add((header::X_FRAME_OPTIONS, "DENY"))
                    .add((header::REFERRER_POLICY, "strict-origin-when-cross-origin"))
                    .add((header::CONTENT_SECURITY_POLICY, CONTENT_SECURITY_POLICY)),
            )
            .wrap(TracingLogger::default())
            .app_data(web::PayloadConfig::new(max_payload_bytes))
            .route("/health", web::get().to(routes::health_check::health_check))
            .route("/send", web::post().to(routes::send::send))
            .app_data(rate_limiter.clone())
            .app_data(mailer.clone())
    })
    .listen(listener)?
    .run();
    Ok(server)
}
