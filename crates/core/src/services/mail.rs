//! Outbound mail over SMTP.

use lettre::{
    message::{header::ContentType, Mailbox},
    transport::smtp::authentication::Credentials,
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
};

use playtube_common::{config::MailConfig, AppError, AppResult};

/// Mail service backed by an async SMTP transport.
#[derive(Clone)]
pub struct MailService {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
}

impl MailService {
    /// Build a mail service from configuration.
    pub fn new(config: &MailConfig) -> AppResult<Self> {
        let transport = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.smtp_host)
            .map_err(|e| AppError::Config(format!("Invalid SMTP relay: {e}")))?
            .port(config.smtp_port)
            .credentials(Credentials::new(
                config.smtp_user.clone(),
                config.smtp_password.clone(),
            ))
            .build();

        let from = config
            .from_address
            .parse()
            .map_err(|e| AppError::Config(format!("Invalid from address: {e}")))?;

        Ok(Self { transport, from })
    }

    /// Send the account verification mail.
    ///
    /// The mail carries a link back to the verification endpoint with the
    /// user's ID as a query parameter.
    pub async fn send_verification(
        &self,
        to_email: &str,
        to_name: &str,
        user_id: &str,
        server_url: &str,
    ) -> AppResult<()> {
        let address = to_email
            .parse()
            .map_err(|e| AppError::BadRequest(format!("Invalid recipient address: {e}")))?;
        let to = Mailbox::new(Some(to_name.to_string()), address);

        let verify_url = format!("{server_url}/api/v1/auth/verify-mail?id={user_id}");
        let body = format!(
            "<p>Hi {to_name},</p>\
            <p>Welcome to PlayTube! Please verify your email address by clicking the link below.</p>\
            <p><a href=\"{verify_url}\">Verify your account</a></p>\
            <p>If you did not create this account, you can ignore this mail.</p>"
        );

        let message = Message::builder()
            .from(self.from.clone())
            .to(to)
            .subject("Verify your PlayTube account")
            .header(ContentType::TEXT_HTML)
            .body(body)
            .map_err(|e| AppError::Internal(format!("Failed to build mail: {e}")))?;

        self.transport
            .send(message)
            .await
            .map_err(|e| AppError::ExternalService(format!("SMTP send failed: {e}")))?;

        tracing::debug!(user_id = %user_id, "Sent verification mail");
        Ok(())
    }
}
