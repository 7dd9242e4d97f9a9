use contact_relay::configuration::{get_configuration, MailTransportKind, Settings};
use contact_relay::startup::Application;
use contact_relay::telemetry::{get_subscriber, init_subscriber};
use once_cell::sync::Lazy;
use secrecy::Secret;
use wiremock::MockServer;

// Ensure that the `tracing` stack is only initialised once using `once_cell`
static TRACING: Lazy<()> = Lazy::new(|| {
    let default_filter_level = "info".to_string();
    let subscriber_name = "test".to_string();

    if std::env::var("TEST_LOG").is_ok() {
        let subscriber = get_subscriber(subscriber_name, default_filter_level, std::io::stdout);
        init_subscriber(subscriber);
    } else {
        let subscriber = get_subscriber(subscriber_name, default_filter_level, std::io::sink);
        init_subscriber(subscriber);
    }
});

pub struct TestApp {
    pub address: String,
    pub email_server: MockServer,
    pub api_client: reqwest::Client,
}

impl TestApp {
    pub async fn post_send(&self, body: &serde_json::Value) -> reqwest::Response {
        self.api_client
            .post(&format!("{}/send", &self.address))
            .json(body)
            .send()
            .await
            .expect("Failed to execute request.")
    }

    /// Posts as if relayed by a proxy on behalf of `client_ip`.
    pub async fn post_send_from(&self, client_ip: &str, body: &serde_json::Value) -> reqwest::Response {
        self.api_client
            .post(&format!("{}/send", &self.address))
            .header("X-Forwarded-For", client_ip)
            .json(body)
            .send()
            .await
            .expect("Failed to execute request.")
    }

    pub async fn post_form_send(&self, body: &'static str) -> reqwest::Response {
        self.api_client
            .post(&format!("{}/send", &self.address))
            .header("Content-Type", "application/x-www-form-urlencoded")
            .body(body)
            .send()
            .await
            .expect("Failed to execute request.")
    }

    pub async fn post_raw_send(&self, body: &'static str) -> reqwest::Response {
        self.api_client
            .post(&format!("{}/send", &self.address))
            .header("Content-Type", "application/json")
            .body(body)
            .send()
            .await
            .expect("Failed to execute request.")
    }
}

pub fn valid_submission() -> serde_json::Value {
    serde_json::json!({
        "business": "Acme",
        "email": "a@acme.com",
        "website": "https://acme.com",
        "message": "Hi\nthere"
    })
}

pub async fn spawn_app() -> TestApp {
    spawn_app_with(|_| {}).await
}

pub async fn spawn_app_with(customise: impl FnOnce(&mut Settings)) -> TestApp {
    Lazy::force(&TRACING);

    // Launch a mock server to stand in for the email API
    let email_server = MockServer::start().await;

    let configuration = {
        let mut c = get_configuration().expect("Failed to read configuration.");
        // Use a random OS port
        c.application.port = 0;
        c.email_client.transport = MailTransportKind::Api;
        c.email_client.base_url = email_server.uri();
        c.email_client.authorization_token = Some(Secret::new("test-token".to_string()));
        c.email_client.operator_email = Some("owner@localwebstudio.example".to_string());
        c.email_client.timeout_milliseconds = 500;
        customise(&mut c);
        c
    };

    let application = Application::build(configuration)
        .await
        .expect("Failed to build application.");
    let address = format!("http://127.0.0.1:{}", application.port());
    let _ = tokio::spawn(application.run_until_stopped());

    TestApp {
        address,
        email_server,
        api_client: reqwest::Client::new(),
    }
}
