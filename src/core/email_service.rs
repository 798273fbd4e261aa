use crate::core::config::SmtpConfig;
use crate::core::AppError;
use lettre::message::{header::ContentType, Mailbox};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{Message, SmtpTransport, Transport};
use secrecy::ExposeSecret;
use std::str::FromStr;

pub struct EmailService {
    smtp_config: SmtpConfig,
}

impl EmailService {
    pub fn new(smtp_config: SmtpConfig) -> Self {
        Self { smtp_config }
    }

    fn create_smtp_transport(&self) -> Result<SmtpTransport, AppError> {
        let credentials = Credentials::new(
            self.smtp_config.username.clone(),
            self.smtp_config.password.expose_secret().clone(),
        );

        // 587 and Mailtrap's 2525 speak STARTTLS, everything else implicit TLS.
        let relay = if matches!(self.smtp_config.port, 587 | 2525) {
            SmtpTransport::starttls_relay(&self.smtp_config.host)
        } else {
            SmtpTransport::relay(&self.smtp_config.host)
        };
        let builder = relay
            .map_err(|e| AppError::internal_error(format!("Failed to create SMTP transport: {}", e)))?;

        Ok(builder
            .port(self.smtp_config.port)
            .credentials(credentials)
            .build())
    }

    pub async fn send_reset_password_email(
        &self,
        to_email: &str,
        reset_url: &str,
    ) -> Result<(), AppError> {
        let from_mailbox = Mailbox::from_str(&format!(
            "{} <{}>",
            self.smtp_config.from_name, self.smtp_config.from_email
        ))
        .map_err(|e| AppError::internal_error(format!("Invalid from email: {}", e)))?;

        let to_mailbox = Mailbox::from_str(to_email)
            .map_err(|e| AppError::internal_error(format!("Invalid to email: {}", e)))?;

        let email = Message::builder()
            .from(from_mailbox)
            .to(to_mailbox)
            .subject("Password Reset Request - Study Hub")
            .header(ContentType::TEXT_HTML)
            .body(reset_email_body(reset_url))
            .map_err(|e| AppError::internal_error(format!("Failed to build email: {}", e)))?;

        let mailer = self.create_smtp_transport()?;
        let recipient = to_email.to_string();

        // lettre's SmtpTransport is blocking.
        let outcome = tokio::task::spawn_blocking(move || mailer.send(&email))
            .await
            .map_err(|e| AppError::internal_error(format!("Email task failed: {}", e)))?;

        match outcome {
            Ok(_) => {
                tracing::info!("Reset password email sent successfully to: {}", recipient);
                Ok(())
            }
            Err(e) => {
                tracing::error!("Failed to send reset password email to {}: {}", recipient, e);
                Err(AppError::internal_error("Failed to send reset password email"))
            }
        }
    }
}

pub fn reset_password_url(public_base_url: &str, token: &str) -> String {
    format!(
        "{}/reset-password?token={}",
        public_base_url.trim_end_matches('/'),
        token
    )
}

fn reset_email_body(reset_url: &str) -> String {
    format!(
        r#"
<!DOCTYPE html>
<html>
  <head>
    <style>
      body {{ font-family: Arial, sans-serif; line-height: 1.6; color: #000000; }}
      .container {{ max-width: 600px; margin: 0 auto; padding: 20px; }}
      .header {{ background: linear-gradient(135deg, #667eea 0%, #764ba2 100%); color: white; padding: 30px; text-align: center; border-radius: 10px 10px 0 0; }}
      .content {{ background: #f8f9fa; padding: 30px; border-radius: 0 0 10px 10px; }}
      .link {{ word-break: break-all; background: #e9ecef; padding: 10px; border-radius: 5px; }}
      .footer {{ text-align: center; margin-top: 20px; color: #666; font-size: 14px; }}
    </style>
  </head>
  <body>
    <div class="container">
      <div class="header">
        <h1>Study Hub</h1>
        <p>Password Reset Request</p>
      </div>
      <div class="content">
        <h2>Reset Your Password</h2>
        <p>We received a request to reset your password. If you didn't make this request, you can safely ignore this email.</p>
        <p style="text-align: center;">
          <a href="{url}" style="display: inline-block; padding: 12px 24px; background-color: #3b82f6; color: #ffffff; text-decoration: none; border-radius: 6px;">Reset Password</a>
        </p>
        <p>Or copy and paste this link in your browser:</p>
        <p class="link">{url}</p>
        <p><strong>This link will expire in 1 hour for security reasons.</strong></p>
      </div>
      <div class="footer">
        <p>This is an automated email. Please do not reply to this message.</p>
      </div>
    </div>
  </body>
</html>
"#,
        url = reset_url
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reset_url_points_at_the_reset_page() {
        assert_eq!(
            reset_password_url("https://hub.example.com/", "abc123"),
            "https://hub.example.com/reset-password?token=abc123"
        );
    }

    #[test]
    fn reset_email_contains_link_and_expiry_notice() {
        let body = reset_email_body("https://hub.example.com/reset-password?token=t");
        assert_eq!(body.matches("reset-password?token=t").count(), 2);
        assert!(body.contains("expire in 1 hour"));
    }
}
