use anyhow::Context;
use serde::Serialize;
use tracing::info;

#[derive(Debug, Clone, Serialize)]
pub struct OutgoingMail {
    pub to: String,
    pub subject: String,
    pub text: String,
}

/// Outbound mail collaborator.
pub enum Mailer {
    /// Writes the mail to the log instead of delivering it.
    Log,
    /// Posts the mail as JSON to an HTTP relay.
    Relay {
        client: reqwest::Client,
        url: String,
        from: String,
    },
}

#[derive(Serialize)]
struct RelayPayload<'a> {
    from: &'a str,
    #[serde(flatten)]
    mail: &'a OutgoingMail,
}

impl Mailer {
    pub fn relay(url: impl Into<String>, from: impl Into<String>) -> Self {
        Self::Relay {
            client: reqwest::Client::new(),
            url: url.into(),
            from: from.into(),
        }
    }

    pub async fn send(&self, mail: &OutgoingMail) -> anyhow::Result<()> {
        match self {
            Self::Log => {
                info!(to = %mail.to, subject = %mail.subject, "Mail not delivered (log mailer): {}", mail.text);
                Ok(())
            }
            Self::Relay { client, url, from } => {
                client
                    .post(url)
                    .json(&RelayPayload { from, mail })
                    .send()
                    .await
                    .context("mail relay unreachable")?
                    .error_for_status()
                    .context("mail relay refused message")?;
                info!(to = %mail.to, subject = %mail.subject, "Mail handed to relay");
                Ok(())
            }
        }
    }
}
