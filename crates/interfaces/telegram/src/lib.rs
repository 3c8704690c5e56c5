//! Telegram front end: long-polls the Bot API and drives a [`Bot`] from a
//! single task, interleaving updates with the daily congratulation pass.

mod client;
mod wire;

use std::time::Duration;

use anyhow::Result;
use chrono::Utc;
use tracing::{error, info, warn};

use nestbot_config::AppConfig;
use nestbot_runtime::{Bot, DailySchedule};
use nestbot_store::Roster;

pub use client::TelegramClient;
pub use wire::TelegramUpdate;

pub async fn start_bot(config: AppConfig) -> Result<()> {
    let client = TelegramClient::new(config.require_token()?);
    let roster = Roster::open(config.storage.children_path(), config.storage.events_path());
    info!(
        children = roster.children().len(),
        events = roster.events().len(),
        "roster loaded"
    );

    let schedule = DailySchedule::from_config(&config.schedule);
    if let Err(err) = client.drop_pending_updates().await {
        warn!(?err, "could not drop pending updates; continuing");
    }

    let mut bot = Bot::new(client.clone(), roster, config);
    match client.own_username().await {
        Ok(Some(username)) => {
            info!(%username, "authorized");
            bot = bot.with_username(username);
        }
        Ok(None) => warn!("getMe returned no username; accepting commands for any bot"),
        Err(err) => warn!(?err, "getMe failed; accepting commands for any bot"),
    }
    let mut offset: i64 = 0;
    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);

    info!(
        tz = %schedule.tz(),
        next_run = %schedule.next_run_after(Utc::now()),
        "telegram mode initialized; listening for updates"
    );

    loop {
        let wait = schedule.until_next_run(Utc::now());
        tokio::select! {
            result = &mut shutdown => {
                if let Err(err) = result {
                    error!(?err, "failed to listen for shutdown signal");
                }
                info!("shutting down");
                break;
            }
            _ = tokio::time::sleep(wait) => {
                let today = schedule.today(Utc::now());
                bot.run_daily_pass(today).await;
            }
            result = client.fetch_updates(offset) => match result {
                Ok(updates) => {
                    for update in updates {
                        offset = offset.max(update.update_id + 1);
                        if let Some(update) = update.into_update() {
                            let today = schedule.today(Utc::now());
                            bot.handle_update(update, today).await;
                        }
                    }
                }
                Err(err) => {
                    let err = format!("{err:#}");
                    if err.contains("409") {
                        // Another instance is polling; back off and let it win.
                        warn!("409 Conflict: another bot instance is running; waiting 15s before retrying");
                        tokio::time::sleep(Duration::from_secs(15)).await;
                    } else {
                        warn!(%err, "getUpdates error; retrying in 5s");
                        tokio::time::sleep(Duration::from_secs(5)).await;
                    }
                }
            }
        }
    }

    Ok(())
}
