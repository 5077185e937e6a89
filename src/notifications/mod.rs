//! Daily reminders
//!
//! Once a day at the configured local time every user with reminders
//! enabled gets a Telegram message. Delivery failures are logged per
//! recipient and never stop the batch.

pub mod telegram;

pub use telegram::TelegramClient;

use std::sync::Arc;

use tracing::{error, info, warn};

use crate::clock::Clock;
use crate::config::{NotificationConfig, TelegramConfig};
use crate::db::{notifications, Database};
use crate::error::AppError;

/// Outcome of one reminder run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReminderReport {
    pub sent: usize,
    pub failed: usize,
}

/// Send the reminder to every opted-in user
pub async fn send_reminders(
    db: &Database,
    client: &TelegramClient,
    message: &str,
) -> Result<ReminderReport, AppError> {
    let recipients = db.with_conn(notifications::reminder_recipients)?;
    let mut report = ReminderReport::default();

    for chat_id in recipients {
        match client.send_message(chat_id, message).await {
            Ok(()) => report.sent += 1,
            Err(e) => {
                report.failed += 1;
                warn!(chat_id, error = %e, "Failed to send reminder");
            }
        }
    }

    info!(sent = report.sent, failed = report.failed, "Reminders sent");
    Ok(report)
}

/// Run the daily reminder loop until the task is dropped
pub async fn run_scheduler(
    db: Arc<Database>,
    clock: Clock,
    telegram: TelegramConfig,
    config: NotificationConfig,
) {
    let Some(token) = telegram.bot_token.filter(|t| !t.is_empty()) else {
        warn!("TELEGRAM_BOT_TOKEN is not configured, reminders disabled");
        return;
    };
    let client = match TelegramClient::new(&telegram.api_base, &token) {
        Ok(client) => client,
        Err(e) => {
            error!(error = %e, "Failed to build Telegram client, reminders disabled");
            return;
        }
    };

    info!(hour = config.hour, minute = config.minute, "Reminder scheduler started");
    loop {
        let wait = clock.until_next(clock.now(), config.hour, config.minute);
        tokio::time::sleep(wait).await;

        if let Err(e) = send_reminders(&db, &client, &config.message).await {
            error!(error = %e, "Reminder run failed");
        }
    }
}
