/// Outbound email dispatch.
///
/// `Mailer` is the seam the auth flows depend on; `EmailClient` posts to the
/// email service's JSON API. Callers decide whether a send failure matters —
/// verification and reset dispatches log and swallow it.
use async_trait::async_trait;
use serde::Serialize;

use crate::error::{AppError, EmailError};
use crate::validators::is_valid_email;

#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send_email(
        &self,
        recipient: &str,
        subject: &str,
        html_content: &str,
    ) -> Result<(), AppError>;
}

#[derive(Clone)]
pub struct EmailClient {
    http_client: reqwest::Client,
    base_url: String,
    sender: SenderEmail,
}

/// A validated sender address.
#[derive(Clone)]
pub struct SenderEmail(String);

impl SenderEmail {
    pub fn parse(s: String) -> Result<Self, String> {
        let email = is_valid_email(&s).map_err(|e| e.to_string())?;
        Ok(Self(email))
    }

    pub fn inner(&self) -> &str {
        &self.0
    }
}

#[derive(Serialize)]
struct SendEmailRequest {
    from: String,
    to: String,
    #[serde(rename = "Subject")]
    subject: String,
    #[serde(rename = "Html")]
    html: String,
}

impl EmailClient {
    pub fn new(base_url: String, sender: SenderEmail, http_client: reqwest::Client) -> Self {
        Self {
            http_client,
            base_url,
            sender,
        }
    }
}

#[async_trait]
impl Mailer for EmailClient {
    async fn send_email(
        &self,
        recipient: &str,
        subject: &str,
        html_content: &str,
    ) -> Result<(), AppError> {
        let url = format!("{}/email", self.base_url);
        let request = SendEmailRequest {
            from: self.sender.inner().to_string(),
            to: recipient.to_string(),
            subject: subject.to_string(),
            html: html_content.to_string(),
        };

        self.http_client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                AppError::Email(EmailError::ServiceUnavailable(format!(
                    "Failed to reach email service: {}",
                    e
                )))
            })?
            .error_for_status()
            .map_err(|e| {
                AppError::Email(EmailError::SendFailed(format!(
                    "Email service returned error: {}",
                    e
                )))
            })?;

        Ok(())
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sender_email_parse_valid() {
        assert!(SenderEmail::parse("noreply@hospital.example".to_string()).is_ok());
    }

    #[test]
    fn sender_email_parse_invalid() {
        assert!(SenderEmail::parse("not-an-email".to_string()).is_err());
    }
}
