//! Email service for sending verification codes.
//!
//! Uses SMTP via lettre for delivery with Askama templates. Without SMTP
//! settings codes are written to the log instead, which is how local
//! development signs in.

use askama::Template;
use lettre::{
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
    message::{MultiPart, SinglePart, header::ContentType},
    transport::smtp::{Error as SmtpError, authentication::Credentials},
};
use secrecy::ExposeSecret;
use thiserror::Error;

use teashop_core::Email;

use crate::config::EmailConfig;
use crate::models::verification_code::CODE_TTL;

/// HTML template for verification code email.
#[derive(Template)]
#[template(path = "email/verification_code.html")]
struct VerificationCodeEmailHtml<'a> {
    code: &'a str,
    ttl_minutes: i64,
}

/// Plain text template for verification code email.
#[derive(Template)]
#[template(path = "email/verification_code.txt")]
struct VerificationCodeEmailText<'a> {
    code: &'a str,
    ttl_minutes: i64,
}

/// Errors that can occur when sending email.
#[derive(Debug, Error)]
pub enum EmailError {
    /// SMTP transport error.
    #[error("SMTP error: {0}")]
    Smtp(#[from] SmtpError),

    /// Failed to build email message.
    #[error("Failed to build message: {0}")]
    MessageBuild(#[from] lettre::error::Error),

    /// Invalid email address.
    #[error("Invalid email address: {0}")]
    InvalidAddress(String),

    /// Template rendering error.
    #[error("Template error: {0}")]
    Template(#[from] askama::Error),
}

/// Email service for sending transactional emails.
#[derive(Clone)]
pub struct EmailService {
    mailer: AsyncSmtpTransport<Tokio1Executor>,
    from_address: String,
}

impl EmailService {
    /// Create a new email service from configuration.
    ///
    /// # Errors
    ///
    /// Returns error if the SMTP relay settings are invalid.
    pub fn new(config: &EmailConfig) -> Result<Self, SmtpError> {
        let credentials = Credentials::new(
            config.smtp_username.clone(),
            config.smtp_password.expose_secret().to_string(),
        );

        let mailer = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.smtp_host)?
            .port(config.smtp_port)
            .credentials(credentials)
            .build();

        Ok(Self {
            mailer,
            from_address: config.from_address.clone(),
        })
    }

    /// Send a sign-in code.
    ///
    /// # Errors
    ///
    /// Returns error if email fails to send or template fails to render.
    pub async fn send_verification_code(&self, to: &Email, code: &str) -> Result<(), EmailError> {
        let (html, text) = render_verification_code(code)?;

        self.send_multipart_email(to.as_str(), "您的登录验证码", &text, &html)
            .await
    }

    /// Send a multipart email with both plain text and HTML versions.
    async fn send_multipart_email(
        &self,
        to: &str,
        subject: &str,
        text_body: &str,
        html_body: &str,
    ) -> Result<(), EmailError> {
        let email = Message::builder()
            .from(
                self.from_address
                    .parse()
                    .map_err(|_| EmailError::InvalidAddress(self.from_address.clone()))?,
            )
            .to(to
                .parse()
                .map_err(|_| EmailError::InvalidAddress(to.to_string()))?)
            .subject(subject)
            .multipart(
                MultiPart::alternative()
                    .singlepart(
                        SinglePart::builder()
                            .header(ContentType::TEXT_PLAIN)
                            .body(text_body.to_string()),
                    )
                    .singlepart(
                        SinglePart::builder()
                            .header(ContentType::TEXT_HTML)
                            .body(html_body.to_string()),
                    ),
            )?;

        self.mailer.send(email).await?;

        tracing::info!(to = %to, subject = %subject, "Email sent successfully");
        Ok(())
    }
}

/// Deliver a code by mail, or log it when no mailer is configured.
///
/// # Errors
///
/// Returns error if a configured mailer fails.
pub async fn deliver_verification_code(
    mailer: Option<&EmailService>,
    to: &Email,
    code: &str,
) -> Result<(), EmailError> {
    match mailer {
        Some(mailer) => mailer.send_verification_code(to, code).await,
        None => {
            tracing::warn!(to = %to, code = %code, "SMTP not configured, logging verification code");
            Ok(())
        }
    }
}

fn render_verification_code(code: &str) -> Result<(String, String), EmailError> {
    let ttl_minutes = CODE_TTL.num_minutes();
    let html = VerificationCodeEmailHtml { code, ttl_minutes }.render()?;
    let text = VerificationCodeEmailText { code, ttl_minutes }.render()?;
    Ok((html, text))
}

/// Generate a 6-digit verification code.
#[must_use]
pub fn generate_verification_code() -> String {
    use rand::Rng;
    let code: u32 = rand::rng().random_range(100_000..1_000_000);
    code.to_string()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_verification_code_format() {
        let code = generate_verification_code();
        assert_eq!(code.len(), 6);
        assert!(code.chars().all(|c| c.is_ascii_digit()));
    }

    #[test]
    fn test_generate_verification_code_range() {
        for _ in 0..100 {
            let code: u32 = generate_verification_code().parse().unwrap();
            assert!((100_000..1_000_000).contains(&code));
        }
    }

    #[test]
    fn test_templates_include_code_and_ttl() {
        let (html, text) = render_verification_code("482913").unwrap();
        assert!(html.contains("482913"));
        assert!(text.contains("482913"));
        assert!(text.contains("5分钟"));
    }

    #[tokio::test]
    async fn test_deliver_without_mailer_is_ok() {
        let to = Email::parse("tea@example.com").unwrap();
        assert!(deliver_verification_code(None, &to, "123456").await.is_ok());
    }
}
