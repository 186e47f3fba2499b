// notify.rs
// Notification collaborators (email/SMS) behind a trait object so the
// state machine never depends on network-capable code. All dispatch is
// post-commit and best-effort: call sites log failures and move on.

use anyhow::Result;
use futures::future::BoxFuture;
use serde::Serialize;

use crate::models::PaymentMode;

/// Summary of a transaction included in OTP and completion messages.
#[derive(Debug, Clone, Serialize)]
pub struct TxSummary {
    pub amount: f64,
    pub payment_mode: PaymentMode,
    pub month_year: String,
}

pub trait Notifier: Send + Sync {
    /// OTP delivery to the doctor, sent on every transition into
    /// `in_progress`.
    fn send_otp_email(
        &self,
        to: String,
        otp: String,
        summary: TxSummary,
    ) -> BoxFuture<'static, Result<()>>;

    /// Completion notice after a verified delivery; either recipient may
    /// be unresolved.
    fn send_completion_email(
        &self,
        doctor: Option<String>,
        executive: Option<String>,
        summary: TxSummary,
    ) -> BoxFuture<'static, Result<()>>;

    /// Generated credentials for a freshly created executive.
    fn send_login_sms(
        &self,
        phone: String,
        username: String,
        password: String,
    ) -> BoxFuture<'static, Result<()>>;
}

/// Production notifier: posts JSON payloads to configured webhook
/// endpoints (the actual templating/delivery lives in an external
/// service). With no endpoint configured it logs and succeeds, which
/// keeps local development working.
pub struct WebhookNotifier {
    client: reqwest::Client,
    email_url: Option<String>,
    sms_url: Option<String>,
}

impl WebhookNotifier {
    pub fn from_env() -> Self {
        Self {
            client: reqwest::Client::new(),
            email_url: std::env::var("EMAIL_WEBHOOK_URL").ok(),
            sms_url: std::env::var("SMS_WEBHOOK_URL").ok(),
        }
    }

    fn post(
        &self,
        url: Option<String>,
        kind: &'static str,
        payload: serde_json::Value,
    ) -> BoxFuture<'static, Result<()>> {
        let client = self.client.clone();
        Box::pin(async move {
            let Some(url) = url else {
                tracing::debug!(kind, "no webhook configured, dropping notification");
                return Ok(());
            };
            let response = client.post(&url).json(&payload).send().await?;
            response.error_for_status()?;
            Ok(())
        })
    }
}

impl Notifier for WebhookNotifier {
    fn send_otp_email(
        &self,
        to: String,
        otp: String,
        summary: TxSummary,
    ) -> BoxFuture<'static, Result<()>> {
        self.post(
            self.email_url.clone(),
            "otp_email",
            serde_json::json!({
                "template": "delivery_otp",
                "to": to,
                "otp": otp,
                "summary": summary,
            }),
        )
    }

    fn send_completion_email(
        &self,
        doctor: Option<String>,
        executive: Option<String>,
        summary: TxSummary,
    ) -> BoxFuture<'static, Result<()>> {
        self.post(
            self.email_url.clone(),
            "completion_email",
            serde_json::json!({
                "template": "delivery_completed",
                "doctor": doctor,
                "executive": executive,
                "summary": summary,
            }),
        )
    }

    fn send_login_sms(
        &self,
        phone: String,
        username: String,
        password: String,
    ) -> BoxFuture<'static, Result<()>> {
        self.post(
            self.sms_url.clone(),
            "login_sms",
            serde_json::json!({
                "template": "executive_credentials",
                "phone": phone,
                "username": username,
                "password": password,
            }),
        )
    }
}

/// A sent message captured by [`RecordingNotifier`].
#[derive(Debug, Clone, PartialEq)]
pub enum SentMessage {
    Otp { to: String, otp: String },
    Completion {
        doctor: Option<String>,
        executive: Option<String>,
    },
    LoginSms { phone: String, username: String },
}

/// Test double that records every dispatch in memory. Lives here rather
/// than in a test module because integration tests inject it too.
#[derive(Default)]
pub struct RecordingNotifier {
    pub sent: std::sync::Mutex<Vec<SentMessage>>,
}

impl RecordingNotifier {
    pub fn messages(&self) -> Vec<SentMessage> {
        self.sent.lock().expect("notifier mutex poisoned").clone()
    }
}

impl Notifier for RecordingNotifier {
    fn send_otp_email(
        &self,
        to: String,
        otp: String,
        _summary: TxSummary,
    ) -> BoxFuture<'static, Result<()>> {
        self.sent
            .lock()
            .expect("notifier mutex poisoned")
            .push(SentMessage::Otp { to, otp });
        Box::pin(async { Ok(()) })
    }

    fn send_completion_email(
        &self,
        doctor: Option<String>,
        executive: Option<String>,
        _summary: TxSummary,
    ) -> BoxFuture<'static, Result<()>> {
        self.sent
            .lock()
            .expect("notifier mutex poisoned")
            .push(SentMessage::Completion { doctor, executive });
        Box::pin(async { Ok(()) })
    }

    fn send_login_sms(
        &self,
        phone: String,
        username: String,
        _password: String,
    ) -> BoxFuture<'static, Result<()>> {
        self.sent
            .lock()
            .expect("notifier mutex poisoned")
            .push(SentMessage::LoginSms { phone, username });
        Box::pin(async { Ok(()) })
    }
}

/// Test double whose every send fails; state transitions must still
/// commit when this one is injected.
pub struct FailingNotifier;

impl Notifier for FailingNotifier {
    fn send_otp_email(
        &self,
        _to: String,
        _otp: String,
        _summary: TxSummary,
    ) -> BoxFuture<'static, Result<()>> {
        Box::pin(async { Err(anyhow::anyhow!("smtp relay down")) })
    }

    fn send_completion_email(
        &self,
        _doctor: Option<String>,
        _executive: Option<String>,
        _summary: TxSummary,
    ) -> BoxFuture<'static, Result<()>> {
        Box::pin(async { Err(anyhow::anyhow!("smtp relay down")) })
    }

    fn send_login_sms(
        &self,
        _phone: String,
        _username: String,
        _password: String,
    ) -> BoxFuture<'static, Result<()>> {
        Box::pin(async { Err(anyhow::anyhow!("sms gateway down")) })
    }
}
