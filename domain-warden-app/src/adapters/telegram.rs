//! Telegram Bot API notifier.
//!
//! Messages go out as Markdown on a spawned task so lifecycle processing never
//! waits on the Bot API.

use std::fmt::Write as _;
use std::sync::Arc;
use std::time::Duration;

use reqwest::Client;
use serde::{Deserialize, Serialize};

use domain_warden_core::error::{CoreError, CoreResult};
use domain_warden_core::traits::Notifier;
use domain_warden_core::types::{Notification, NotificationKind};

const DEFAULT_API_BASE: &str = "https://api.telegram.org";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Bot credentials and target chat. Empty values disable the notifier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TelegramConfig {
    pub bot_token: String,
    pub chat_id: String,
    /// Overridable for tests and self-hosted Bot API servers.
    pub api_base: String,
}

impl Default for TelegramConfig {
    fn default() -> Self {
        Self {
            bot_token: String::new(),
            chat_id: String::new(),
            api_base: DEFAULT_API_BASE.to_string(),
        }
    }
}

impl TelegramConfig {
    pub fn is_configured(&self) -> bool {
        !self.bot_token.trim().is_empty() && !self.chat_id.trim().is_empty()
    }
}

#[derive(Serialize)]
struct SendMessage<'a> {
    chat_id: &'a str,
    text: &'a str,
    parse_mode: &'static str,
}

struct Inner {
    config: TelegramConfig,
    client: Client,
}

/// [`Notifier`] that posts to a Telegram chat.
#[derive(Clone)]
pub struct TelegramNotifier {
    inner: Arc<Inner>,
}

impl TelegramNotifier {
    pub fn new(config: TelegramConfig) -> Self {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .unwrap_or_else(|e| {
                log::warn!("[telegram] Failed to build HTTP client, using defaults: {e}");
                Client::new()
            });
        Self {
            inner: Arc::new(Inner { config, client }),
        }
    }

    pub fn is_configured(&self) -> bool {
        self.inner.config.is_configured()
    }

    /// Send one notification and wait for the Bot API's answer.
    pub async fn send(&self, notification: &Notification) -> CoreResult<()> {
        if !self.is_configured() {
            return Ok(());
        }
        let config = &self.inner.config;
        let url = format!(
            "{}/bot{}/sendMessage",
            config.api_base.trim_end_matches('/'),
            config.bot_token
        );
        let text = render(notification);
        let body = SendMessage {
            chat_id: &config.chat_id,
            text: &text,
            parse_mode: "Markdown",
        };

        let response = self
            .inner
            .client
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                // The URL embeds the bot token.
                CoreError::NetworkError(format!(
                    "Failed to send telegram message: {}",
                    e.without_url()
                ))
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(CoreError::NetworkError(format!(
                "Telegram API returned status {}",
                status.as_u16()
            )));
        }
        Ok(())
    }
}

impl Notifier for TelegramNotifier {
    fn notify(&self, notification: Notification) {
        if !self.is_configured() {
            log::debug!(
                "[telegram] Not configured, dropping {:?} for {}",
                notification.kind,
                notification.domain
            );
            return;
        }
        let Ok(handle) = tokio::runtime::Handle::try_current() else {
            log::warn!("[telegram] No async runtime, dropping notification for {}", notification.domain);
            return;
        };

        let notifier = self.clone();
        handle.spawn(async move {
            if let Err(e) = notifier.send(&notification).await {
                log::warn!("[telegram] {e}");
            }
        });
    }
}

/// Markdown body for a notification.
fn render(notification: &Notification) -> String {
    let time = notification.occurred_at.format("%Y-%m-%d %H:%M:%S UTC");
    let domain = &notification.domain;
    let mut message = String::new();

    match notification.kind {
        NotificationKind::HealthAlert => {
            let _ = write!(
                message,
                "🚨 *Domain Health Alert*\n\n📍 Domain: `{domain}`\n⏰ Time: {time}\n\n"
            );
            if !notification.issues.is_empty() {
                message.push_str("*Issues Detected:*\n");
                for issue in &notification.issues {
                    let _ = writeln!(message, "• {}", escape_markdown(issue));
                }
                message.push('\n');
            }
            if !notification.action.is_empty() {
                let _ = writeln!(message, "⚠️ *Action: {}*", inside_bold(&notification.action));
            }
        }
        NotificationKind::AutoSuspend => {
            let _ = write!(
                message,
                "🔒 *Domain Auto-Suspended*\n\n📍 Domain: `{domain}`\n📝 Reason: {}\n⏰ Time: {time}\n",
                escape_markdown(&notification.issues.join("; "))
            );
        }
        NotificationKind::DeletionWarning => {
            let _ = write!(
                message,
                "⚠️ *Domain Deletion Warning*\n\n📍 Domain: `{domain}`\n"
            );
            for issue in &notification.issues {
                let _ = writeln!(message, "📉 {}", escape_markdown(issue));
            }
            let _ = write!(message, "⏳ *{}*\n⏰ Time: {time}\n", inside_bold(&notification.action));
        }
        NotificationKind::Recovery => {
            let _ = write!(
                message,
                "✅ *Domain Recovered*\n\n📍 Domain: `{domain}`\n📝 {}\n⏰ Time: {time}\n",
                escape_markdown(&notification.action)
            );
        }
    }
    message
}

/// Backslash-escape what legacy Markdown reads as entity markers: `_`, `*`, backtick and `[`.
fn escape_markdown(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        if matches!(c, '_' | '*' | '`' | '[') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

/// Text placed between `*`: entities don't nest, so only a stray `*` can break it.
fn inside_bold(text: &str) -> String {
    text.replace('*', "")
}
