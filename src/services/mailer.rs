use async_trait::async_trait;
use chrono::NaiveDate;
use lettre::{
    message::{header::ContentType, Mailbox},
    transport::smtp::authentication::Credentials,
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
};

use crate::config::environment::MailConfig;

#[derive(Debug, thiserror::Error)]
pub enum MailError {
    #[error("invalid sender address: {0}")]
    InvalidSender(String),

    #[error("invalid recipient address: {0}")]
    InvalidRecipient(String),

    #[error("failed to build message: {0}")]
    Message(String),

    #[error("smtp transport error: {0}")]
    Transport(String),

    #[error("smtp send timed out after {0}s")]
    Timeout(u64),
}

impl MailError {
    /// Permanent failures cannot succeed on retry (malformed address,
    /// unbuildable message); transport failures and timeouts are transient.
    pub fn is_permanent(&self) -> bool {
        !matches!(self, MailError::Transport(_) | MailError::Timeout(_))
    }
}

#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, to: &str, subject: &str, html: String) -> Result<(), MailError>;
}

pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
    timeout_secs: u64,
}

impl SmtpMailer {
    pub fn new(config: &MailConfig) -> Result<Self, MailError> {
        let from = config
            .smtp_from
            .parse::<Mailbox>()
            .map_err(|e| MailError::InvalidSender(e.to_string()))?;

        // STARTTLS on the submission port, as the upstream mail provider expects
        let transport = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.smtp_host)
            .map_err(|e| MailError::Transport(e.to_string()))?
            .port(config.smtp_port)
            .credentials(Credentials::new(
                config.smtp_user.clone(),
                config.smtp_pass.clone(),
            ))
            .build();

        Ok(Self {
            transport,
            from,
            timeout_secs: config.timeout_secs,
        })
    }
}

#[async_trait]
impl Mailer for SmtpMailer {
    async fn send(&self, to: &str, subject: &str, html: String) -> Result<(), MailError> {
        let recipient = to
            .parse::<Mailbox>()
            .map_err(|e| MailError::InvalidRecipient(format!("{}: {}", to, e)))?;

        let message = Message::builder()
            .from(self.from.clone())
            .to(recipient)
            .subject(subject)
            .header(ContentType::TEXT_HTML)
            .body(html)
            .map_err(|e| MailError::Message(e.to_string()))?;

        tokio::time::timeout(
            std::time::Duration::from_secs(self.timeout_secs),
            self.transport.send(message),
        )
        .await
        .map_err(|_| MailError::Timeout(self.timeout_secs))?
        .map_err(|e| MailError::Transport(e.to_string()))?;

        tracing::info!("Email sent to {}", to);
        Ok(())
    }
}

// =============================================================================
// TEMPLATES
// =============================================================================

/// Release-day reminder. Returns (subject, html).
pub fn release_reminder_email(movie_title: &str, release_date: NaiveDate) -> (String, String) {
    let subject = format!("🎬 Reminder: {} premieres today!", movie_title);
    let date = release_date.format("%B %d, %Y");

    let html = format!(
        r#"<!DOCTYPE html>
<html>
  <head>
    <style>
      body {{ font-family: Arial, sans-serif; line-height: 1.6; color: #333; }}
      .container {{ max-width: 600px; margin: 0 auto; padding: 20px; }}
      .header {{ background: linear-gradient(135deg, #667eea 0%, #764ba2 100%); color: white; padding: 30px; text-align: center; border-radius: 10px 10px 0 0; }}
      .content {{ background: #f9f9f9; padding: 30px; border-radius: 0 0 10px 10px; }}
      .movie-title {{ font-size: 24px; font-weight: bold; color: #667eea; margin: 20px 0; }}
      .date {{ font-size: 18px; color: #764ba2; margin: 10px 0; }}
      .footer {{ text-align: center; margin-top: 30px; color: #666; font-size: 14px; }}
    </style>
  </head>
  <body>
    <div class="container">
      <div class="header">
        <h1>🎬 Premiere Reminder</h1>
      </div>
      <div class="content">
        <p>Hello!</p>
        <p>A movie you added is being released today!</p>
        <div class="movie-title">{title}</div>
        <div class="date">Release date: {date}</div>
        <p>Don't miss the chance to watch it!</p>
      </div>
      <div class="footer">
        <p>This is an automated email. Please do not reply.</p>
      </div>
    </div>
  </body>
</html>"#,
        title = movie_title,
        date = date,
    );

    (subject, html)
}

/// Password-reset instructions. Returns (subject, html).
pub fn password_reset_email(reset_token: &str, frontend_url: Option<&str>) -> (String, String) {
    let subject = "Reset your password".to_string();

    let action = match frontend_url {
        Some(base) => format!(
            r#"<p><a href="{base}/reset-password?token={token}">Click here to choose a new password</a>.</p>"#,
            base = base.trim_end_matches('/'),
            token = reset_token,
        ),
        None => format!(
            "<p>Use this token to choose a new password: <code>{}</code></p>",
            reset_token
        ),
    };

    let html = format!(
        r#"<!DOCTYPE html>
<html>
  <body>
    <div style="max-width: 600px; margin: 0 auto; font-family: Arial, sans-serif;">
      <h2>Password reset requested</h2>
      <p>We received a request to reset the password for your account.</p>
      {action}
      <p>The link expires in 1 hour. If you did not request this, you can ignore this email.</p>
    </div>
  </body>
</html>"#,
        action = action,
    );

    (subject, html)
}
