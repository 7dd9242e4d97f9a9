pub mod configuration;
pub mod contact_mailer;
pub mod domain;
pub mod email_client;
pub mod rate_limit;
pub mod routes;
pub mod smtp_client;
pub mod startup;
pub mod telemetry;
