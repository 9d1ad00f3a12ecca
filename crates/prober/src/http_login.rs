// crates/prober/src/http_login.rs
//! Form login prober - drives the login page over plain HTTP

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::cookie::{CookieStore, Jar};
use reqwest::{Client, Url};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::timeout;
use tracing::{debug, instrument};

use loginswarm_common::{ProbeContext, ProbeOutcome, Prober};
use crate::page::{extract_flash, find_cookie, form_action, has_element_id, FlashKind};

pub const DEFAULT_LOGIN_URL: &str = "https://the-internet.herokuapp.com/login";
pub const DEFAULT_USERNAME: &str = "tomsmith";
pub const DEFAULT_PASSWORD: &str = "SuperSecretPassword!";
pub const SESSION_COOKIE: &str = "rack.session";

/// Logs into a form-based login page and reports the session cookie.
///
/// Every attempt builds its own client and cookie jar, so concurrent attempts
/// never see each other's session.
pub struct HttpLoginProber {
    login_url: Url,
    username: String,
    password: String,
    success_marker: String,
}

impl HttpLoginProber {
    /// Prober for the default demo login page.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_login_url(mut self, url: &str) -> Result<Self> {
        self.login_url = Url::parse(url).with_context(|| format!("Invalid login URL: {url}"))?;
        Ok(self)
    }

    pub fn with_credentials(mut self, username: &str, password: &str) -> Self {
        self.username = username.to_string();
        self.password = password.to_string();
        self
    }

    /// Path fragment the final URL must contain for the login to count.
    pub fn with_success_marker(mut self, marker: &str) -> Self {
        self.success_marker = marker.to_string();
        self
    }

    pub fn login_url(&self) -> &Url {
        &self.login_url
    }

    fn build_client(&self, ctx: &ProbeContext, jar: Arc<Jar>) -> Result<Client> {
        Client::builder()
            .cookie_provider(jar)
            .connect_timeout(ctx.timeouts.implicit_wait)
            .timeout(ctx.timeouts.page_load)
            .user_agent(concat!("loginswarm/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("Failed to build HTTP client")
    }

    /// Load the login page and make sure the form is there.
    #[instrument(skip(self, client))]
    async fn load_login_page(&self, client: &Client, page_load: Duration) -> Result<Url> {
        let response = timeout(page_load, client.get(self.login_url.clone()).send())
            .await
            .map_err(|_| anyhow::anyhow!("page load timed out after {}s", page_load.as_secs()))?
            .context("Failed to load login page")?
            .error_for_status()?;

        let html = response.text().await.context("Failed to read login page")?;
        if !has_element_id(&html, "username") {
            anyhow::bail!("element #username not found on login page");
        }
        if !has_element_id(&html, "password") {
            anyhow::bail!("element #password not found on login page");
        }

        let action = form_action(&html).unwrap_or("/authenticate");
        self.login_url
            .join(action)
            .with_context(|| format!("Invalid form action: {action}"))
    }
}

impl Default for HttpLoginProber {
    fn default() -> Self {
        Self {
            login_url: Url::parse(DEFAULT_LOGIN_URL).expect("default login URL is valid"),
            username: DEFAULT_USERNAME.to_string(),
            password: DEFAULT_PASSWORD.to_string(),
            success_marker: "/secure".to_string(),
        }
    }
}

#[async_trait]
impl Prober for HttpLoginProber {
    async fn probe(&self, ctx: &ProbeContext) -> Result<ProbeOutcome> {
        let jar = Arc::new(Jar::default());
        let client = self.build_client(ctx, jar.clone())?;

        let submit_url = self.load_login_page(&client, ctx.timeouts.page_load).await?;
        debug!("Probe {} submitting credentials to {}", ctx.id, submit_url);

        let wait = ctx.timeouts.explicit_wait;
        let response = timeout(
            wait,
            client
                .post(submit_url)
                .form(&[("username", &self.username), ("password", &self.password)])
                .send(),
        )
        .await
        .map_err(|_| anyhow::anyhow!("timed out after {}s waiting for login response", wait.as_secs()))?
        .context("Failed to submit login form")?;

        let final_url = response.url().clone();
        let html = timeout(wait, response.text())
            .await
            .map_err(|_| anyhow::anyhow!("timed out after {}s reading login response", wait.as_secs()))?
            .context("Failed to read login response")?;

        if !final_url.path().contains(&self.success_marker) {
            let reason = extract_flash(&html, FlashKind::Error)
                .unwrap_or_else(|| format!("login did not reach {}", self.success_marker));
            return Ok(ProbeOutcome::rejected(reason));
        }

        let message = extract_flash(&html, FlashKind::Success)
            .context("element .flash.success not found after login")?;

        let token = jar
            .cookies(&final_url)
            .and_then(|header| {
                header
                    .to_str()
                    .ok()
                    .and_then(|h| find_cookie(h, SESSION_COOKIE))
                    .map(str::to_string)
            })
            .unwrap_or_else(|| "N/A".to_string());

        Ok(ProbeOutcome {
            success: true,
            token: Some(token),
            message,
        })
    }

    fn name(&self) -> &str {
        "HTTP Form Login"
    }
}
