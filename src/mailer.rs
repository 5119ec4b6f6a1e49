use lettre::message::Mailbox;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use tracing::info;

use crate::config::{EmailConfig, TierConfig};
use crate::error::Result;
use crate::types::{AlertRequest, Tier};

/// Delivers alert requests. The cycle orchestrator is generic over this;
/// each delivery is independent, so one failure never blocks the rest.
pub trait Mailer {
    async fn deliver(&self, alert: &AlertRequest) -> Result<()>;
}

/// Plain-text alert body.
pub fn render_body(alert: &AlertRequest, tiers: &TierConfig) -> String {
    let tier_label = match alert.tier {
        Tier::S1 => format!("Best Deal (< ${:.0})", tiers.s1_ceiling),
        Tier::S2 => format!(
            "Great Deal (${:.0}-${:.0})",
            tiers.s1_ceiling, tiers.s2_ceiling
        ),
        Tier::None => "No Deal".to_string(),
    };

    format!(
        "Product Name: {name}\n\
         Price: ${price:.2}\n\
         Tier: {tier_label}\n\
         Status: In Stock\n\
         URL: {url}\n\
         \n\
         Checked at: {checked_at} (unix)\n",
        name = alert.name,
        price = alert.price,
        url = alert.product_id,
        checked_at = alert.checked_at,
    )
}

// ---------------------------------------------------------------------------
// SmtpMailer
// ---------------------------------------------------------------------------

/// STARTTLS SMTP delivery via lettre. Defaults to the Gmail relay when the
/// config gives no host.
pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
    to: Mailbox,
    tiers: TierConfig,
}

impl SmtpMailer {
    pub fn new(cfg: &EmailConfig, tiers: TierConfig) -> Result<Self> {
        let mut builder =
            AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&cfg.smtp_host)?
                .port(cfg.smtp_port);

        // Gmail authenticates with the from address; a custom relay may use
        // a separate username.
        let username = cfg.username.clone().unwrap_or_else(|| cfg.from.clone());
        if let Some(password) = &cfg.password {
            builder = builder.credentials(Credentials::new(username, password.clone()));
        }

        Ok(Self {
            transport: builder.build(),
            from: cfg.from.parse()?,
            to: cfg.to.parse()?,
            tiers,
        })
    }
}

impl Mailer for SmtpMailer {
    async fn deliver(&self, alert: &AlertRequest) -> Result<()> {
        let message = Message::builder()
            .from(self.from.clone())
            .to(self.to.clone())
            .subject(alert.subject)
            .body(render_body(alert, &self.tiers))?;

        self.transport.send(message).await?;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// LogMailer — used when no email config is present
// ---------------------------------------------------------------------------

pub struct LogMailer;

impl Mailer for LogMailer {
    async fn deliver(&self, alert: &AlertRequest) -> Result<()> {
        info!(
            product = %alert.product_id,
            tier = %alert.tier,
            price = alert.price,
            "[ALERT] (no email config) {} | {} | ${:.2}",
            alert.subject, alert.name, alert.price,
        );
        Ok(())
    }
}
