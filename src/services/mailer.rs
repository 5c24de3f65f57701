// SPDX-License-Identifier: MIT

//! Outbound email via the mail provider's HTTP API.
//!
//! A `Mailer` without an API URL is disabled: sends are logged and
//! dropped. The mock mailer used in tests records every message in an
//! in-memory outbox instead of performing network calls.

use std::sync::{Arc, Mutex};

use crate::config::Config;
use crate::error::AppError;
use crate::models::AwardTier;

/// One message handed to the provider (or the test outbox).
#[derive(Debug, Clone, serde::Serialize)]
pub struct OutboundEmail {
    pub to: String,
    pub subject: String,
    pub body: String,
}

/// Mail client.
#[derive(Clone)]
pub struct Mailer {
    client: Option<reqwest::Client>,
    api_url: String,
    api_key: String,
    from: String,
    outbox: Option<Arc<Mutex<Vec<OutboundEmail>>>>,
}

impl Mailer {
    /// Create a mailer from config. Without MAIL_API_URL, outbound mail
    /// is disabled and sends become no-ops.
    pub fn new(config: &Config) -> Self {
        match &config.mail_api_url {
            Some(url) => Self {
                client: Some(reqwest::Client::new()),
                api_url: url.clone(),
                api_key: config.mail_api_key.clone(),
                from: config.mail_from.clone(),
                outbox: None,
            },
            None => {
                tracing::warn!("MAIL_API_URL not set; outbound mail disabled");
                Self {
                    client: None,
                    api_url: String::new(),
                    api_key: String::new(),
                    from: config.mail_from.clone(),
                    outbox: None,
                }
            }
        }
    }

    /// Create a mock mailer that records messages in an in-memory outbox.
    pub fn new_mock() -> Self {
        Self {
            client: None,
            api_url: String::new(),
            api_key: String::new(),
            from: "test@example.org".to_string(),
            outbox: Some(Arc::new(Mutex::new(Vec::new()))),
        }
    }

    /// Messages recorded by the mock mailer. Empty for real mailers.
    pub fn sent_mail(&self) -> Vec<OutboundEmail> {
        match &self.outbox {
            Some(outbox) => outbox.lock().unwrap_or_else(|e| e.into_inner()).clone(),
            None => Vec::new(),
        }
    }

    /// Send one message.
    pub async fn send(&self, to: &str, subject: &str, body: &str) -> Result<(), AppError> {
        let email = OutboundEmail {
            to: to.to_string(),
            subject: subject.to_string(),
            body: body.to_string(),
        };

        if let Some(outbox) = &self.outbox {
            outbox.lock().unwrap_or_else(|e| e.into_inner()).push(email);
            return Ok(());
        }

        let Some(client) = &self.client else {
            tracing::debug!(to, subject, "Mail disabled; dropping message");
            return Ok(());
        };

        let payload = serde_json::json!({
            "from": self.from,
            "to": email.to,
            "subject": email.subject,
            "text": email.body,
        });

        let response = client
            .post(&self.api_url)
            .bearer_auth(&self.api_key)
            .json(&payload)
            .send()
            .await
            .map_err(|e| AppError::Mail(e.to_string()))?;

        if !response.status().is_success() {
            return Err(AppError::Mail(format!(
                "Provider returned {}",
                response.status()
            )));
        }

        tracing::info!(to, subject, "Email sent");
        Ok(())
    }

    /// Send the address-verification email.
    pub async fn send_verification(
        &self,
        to: &str,
        name: &str,
        verify_link: &str,
    ) -> Result<(), AppError> {
        let body = format!(
            "Hi {},\n\nPlease verify your email address to finish setting up \
             your flash logbook account:\n\n{}\n\nThe link expires in 48 hours.",
            name, verify_link
        );
        self.send(to, "Verify your email address", &body).await
    }

    /// Send the "your award is in the mail" notification.
    pub async fn send_award_sent(
        &self,
        to: &str,
        name: &str,
        tier: AwardTier,
        year: i32,
    ) -> Result<(), AppError> {
        let subject = format!("Your {}-day award is on its way", tier);
        let body = format!(
            "Hi {},\n\nCongratulations! Your {}-day flash award for {} has \
             been sent. Keep an eye on your mailbox.",
            name, tier, year
        );
        self.send(to, &subject, &body).await
    }
}
