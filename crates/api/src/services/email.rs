//! Email service for order confirmations.
//!
//! Uses SMTP via lettre for delivery with Askama templates. When no SMTP
//! relay is configured the service runs disabled and logs each message
//! instead of sending it.

use askama::Template;
use lettre::{
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
    message::{MultiPart, SinglePart, header::ContentType},
    transport::smtp::{Error as SmtpError, authentication::Credentials},
};
use secrecy::ExposeSecret;
use thiserror::Error;

use marketstall_core::{Email, Money, OrderId};

use crate::config::EmailConfig;
use crate::models::OrderWithItems;

/// Subject line of the order confirmation email.
pub const ORDER_CONFIRMATION_SUBJECT: &str = "Order Confirmation";

/// One line of an order as shown in the confirmation.
struct ConfirmationLine<'a> {
    product_name: &'a str,
    quantity: u32,
    price: Money,
}

/// HTML template for the order confirmation email.
#[derive(Template)]
#[template(path = "email/order_confirmation.html")]
struct OrderConfirmationHtml<'a> {
    order_id: OrderId,
    lines: &'a [ConfirmationLine<'a>],
    total: Money,
}

/// Plain text template for the order confirmation email.
#[derive(Template)]
#[template(path = "email/order_confirmation.txt")]
struct OrderConfirmationText<'a> {
    order_id: OrderId,
    lines: &'a [ConfirmationLine<'a>],
    total: Money,
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

#[derive(Clone)]
enum Mailer {
    Smtp(AsyncSmtpTransport<Tokio1Executor>),
    Disabled,
}

/// Email service for sending transactional emails.
#[derive(Clone)]
pub struct EmailService {
    mailer: Mailer,
    from_address: String,
}

impl std::fmt::Debug for EmailService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EmailService")
            .field("enabled", &self.is_enabled())
            .field("from_address", &self.from_address)
            .finish()
    }
}

impl EmailService {
    /// Create a new email service from configuration.
    ///
    /// # Errors
    ///
    /// Returns error if the SMTP relay cannot be set up.
    pub fn new(config: &EmailConfig) -> Result<Self, SmtpError> {
        let Some(smtp) = &config.smtp else {
            return Ok(Self::disabled(&config.from_address));
        };

        let mut builder =
            AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&smtp.host)?.port(smtp.port);

        if let Some((username, password)) = &smtp.credentials {
            builder = builder.credentials(Credentials::new(
                username.clone(),
                password.expose_secret().to_string(),
            ));
        }

        Ok(Self {
            mailer: Mailer::Smtp(builder.build()),
            from_address: config.from_address.clone(),
        })
    }

    /// Create a service that logs messages instead of sending them.
    #[must_use]
    pub fn disabled(from_address: &str) -> Self {
        Self {
            mailer: Mailer::Disabled,
            from_address: from_address.to_string(),
        }
    }

    /// Whether messages are actually delivered.
    #[must_use]
    pub const fn is_enabled(&self) -> bool {
        matches!(self.mailer, Mailer::Smtp(_))
    }

    /// Send the confirmation for a freshly placed order.
    ///
    /// # Errors
    ///
    /// Returns error if email fails to send or template fails to render.
    pub async fn send_order_confirmation(
        &self,
        to: &Email,
        order: &OrderWithItems,
    ) -> Result<(), EmailError> {
        let (text, html) = render_order_confirmation(order)?;

        self.send_multipart_email(to.as_str(), ORDER_CONFIRMATION_SUBJECT, &text, &html)
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

        match &self.mailer {
            Mailer::Smtp(transport) => {
                transport.send(email).await?;
                tracing::info!(to = %to, subject = %subject, "Email sent successfully");
            }
            Mailer::Disabled => {
                tracing::info!(
                    to = %to,
                    subject = %subject,
                    body = %text_body,
                    "SMTP not configured, email not sent"
                );
            }
        }

        Ok(())
    }
}

/// Render the plain text and HTML bodies of an order confirmation.
fn render_order_confirmation(order: &OrderWithItems) -> Result<(String, String), EmailError> {
    let lines: Vec<ConfirmationLine<'_>> = order
        .items
        .iter()
        .map(|item| ConfirmationLine {
            product_name: &item.product_name,
            quantity: item.quantity,
            price: item.price,
        })
        .collect();

    let text = OrderConfirmationText {
        order_id: order.order.id,
        lines: &lines,
        total: order.order.total_amount,
    }
    .render()?;
    let html = OrderConfirmationHtml {
        order_id: order.order.id,
        lines: &lines,
        total: order.order.total_amount,
    }
    .render()?;

    Ok((text, html))
}
