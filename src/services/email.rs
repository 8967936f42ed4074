//! Email service for lifecycle notifications

use chrono::{DateTime, Utc};
use lettre::{
    message::{header::ContentType, Mailbox, MultiPart, SinglePart},
    transport::smtp::authentication::Credentials,
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
};
use std::str::FromStr;

use crate::{
    config::EmailConfig,
    error::{AppError, AppResult},
};

#[derive(Clone)]
pub struct EmailService {
    config: EmailConfig,
}

impl EmailService {
    pub fn new(config: EmailConfig) -> Self {
        Self { config }
    }

    /// Whether outbound mail is configured at all
    pub fn is_enabled(&self) -> bool {
        self.config.enabled && !self.config.smtp_host.is_empty()
    }

    /// Tell a requester their borrow request was approved
    pub async fn send_request_approved(
        &self,
        to: &str,
        book_title: &str,
        due_at: DateTime<Utc>,
    ) -> AppResult<()> {
        let subject = format!("Borrow request approved: {}", book_title);
        let body = format!(
            r#"
Hello,

Your request to borrow "{title}" has been approved.

Please return it by {due}.

Best regards,
Jubilee Knowledge Library
"#,
            title = book_title,
            due = due_at.format("%Y-%m-%d"),
        );

        self.send_email(to, &subject, &body).await
    }

    /// Tell a requester their borrow request was rejected
    pub async fn send_request_rejected(
        &self,
        to: &str,
        book_title: &str,
        reason: Option<&str>,
    ) -> AppResult<()> {
        let subject = format!("Borrow request declined: {}", book_title);
        let reason_line = match reason {
            Some(reason) => format!("Reason: {}\n\n", reason),
            None => String::new(),
        };
        let body = format!(
            r#"
Hello,

Your request to borrow "{title}" was declined.

{reason}Best regards,
Jubilee Knowledge Library
"#,
            title = book_title,
            reason = reason_line,
        );

        self.send_email(to, &subject, &body).await
    }

    /// Remind a borrower about an overdue book
    pub async fn send_overdue_reminder(
        &self,
        to: &str,
        book_title: &str,
        due_at: DateTime<Utc>,
    ) -> AppResult<()> {
        let subject = format!("Overdue book reminder: {}", book_title);
        let body = format!(
            r#"
Hello,

You have an overdue book:

    {title}

This was due on {due}. Please return it at your earliest convenience.

Best regards,
Jubilee Knowledge Library
"#,
            title = book_title,
            due = due_at.format("%Y-%m-%d"),
        );

        self.send_email(to, &subject, &body).await
    }

    /// Tell a user the decision on their admin access request
    pub async fn send_admin_decision(&self, to: &str, approved: bool) -> AppResult<()> {
        let (subject, outcome) = if approved {
            (
                "Admin access granted",
                "Your request for administrator access has been approved. The new role is active the next time you sign in.",
            )
        } else {
            (
                "Admin access declined",
                "Your request for administrator access was declined.",
            )
        };
        let body = format!(
            r#"
Hello,

{outcome}

Best regards,
Jubilee Knowledge Library
"#,
            outcome = outcome,
        );

        self.send_email(to, subject, &body).await
    }

    /// Generic email sending function
    async fn send_email(&self, to: &str, subject: &str, body: &str) -> AppResult<()> {
        if !self.is_enabled() {
            tracing::debug!(to = %to, subject = %subject, "Email disabled, skipping send");
            return Ok(());
        }

        let from_name = self
            .config
            .smtp_from_name
            .as_deref()
            .unwrap_or("Jubilee Knowledge Library");
        let from_mailbox = Mailbox::from_str(&format!("{} <{}>", from_name, self.config.smtp_from))
            .map_err(|e| AppError::Internal(format!("Invalid from address: {}", e)))?;

        let to_mailbox = Mailbox::from_str(to)
            .map_err(|e| AppError::Internal(format!("Invalid to address: {}", e)))?;

        let email = Message::builder()
            .from(from_mailbox)
            .to(to_mailbox)
            .subject(subject)
            .multipart(
                MultiPart::alternative()
                    .singlepart(
                        SinglePart::builder()
                            .header(ContentType::TEXT_PLAIN)
                            .body(body.to_string()),
                    )
                    .singlepart(
                        SinglePart::builder()
                            .header(ContentType::TEXT_HTML)
                            .body(format!(
                                r#"<html><body><pre>{}</pre></body></html>"#,
                                body.replace('\n', "<br>")
                            )),
                    ),
            )
            .map_err(|e| AppError::Internal(format!("Failed to build email: {}", e)))?;

        let mailer_builder = if self.config.smtp_use_tls {
            // STARTTLS for secure connection
            AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&self.config.smtp_host)
                .map_err(|e| AppError::Internal(format!("Failed to create SMTP transport: {}", e)))?
        } else {
            AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(&self.config.smtp_host)
        }
        .port(self.config.smtp_port);

        let mailer_builder = if let (Some(username), Some(password)) =
            (&self.config.smtp_username, &self.config.smtp_password)
        {
            mailer_builder.credentials(Credentials::new(username.clone(), password.clone()))
        } else {
            mailer_builder
        };

        let mailer = mailer_builder.build();

        mailer
            .send(email)
            .await
            .map_err(|e| AppError::Internal(format!("Failed to send email: {}", e)))?;

        Ok(())
    }
}
