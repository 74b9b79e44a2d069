//! Bot layer - Discord-specific interface and command handlers
//!
//! This module provides the Discord interface for the stock service: slash commands
//! for employees and admins, autocomplete, reply formatting, and framework setup.

/// Discord command implementations (general, product, request, admin)
pub mod commands;
/// Reply formatting for requests, products and statistics
pub mod format;
/// Discord interaction handlers (autocomplete, etc.)
pub mod handlers;
/// Change-feed consumers: statistics cache and low-stock alerts
pub mod watchers;

use crate::{
    config::settings::Settings,
    core::{request::Actor, store::Store},
    errors::{Error, Result},
};
use poise::serenity_prelude as serenity;
use std::{collections::HashSet, sync::Arc};
use tokio::sync::mpsc;
use tracing::{error, info, warn};

/// Shared data available to all bot commands.
/// This structure holds the store, the loaded settings, the admin roster and the
/// statistics cache.
pub struct BotData {
    /// Database handle with change feed
    pub store: Store,
    /// Settings loaded at startup
    pub settings: Settings,
    /// Discord user IDs allowed to run admin commands
    pub admins: HashSet<String>,
    /// Statistics kept current by [`watchers::spawn_stats_watcher`]
    pub stats: watchers::StatsCache,
}

impl BotData {
    /// Creates a new `BotData` instance.
    #[must_use]
    pub fn new(store: Store, settings: Settings, admins: HashSet<String>) -> Self {
        Self {
            store,
            settings,
            admins,
            stats: watchers::StatsCache::default(),
        }
    }

    /// Whether `user_id` may run admin commands.
    #[must_use]
    pub fn is_admin(&self, user_id: &str) -> bool {
        self.admins.contains(user_id)
    }
}

/// Poise context with this bot's data and error types.
pub type Context<'a> = poise::Context<'a, BotData, Error>;

/// The invoking user as an [`Actor`], preferring their global display name.
#[must_use]
pub fn actor(ctx: Context<'_>) -> Actor {
    let author = ctx.author();
    let display_name = author
        .global_name
        .clone()
        .unwrap_or_else(|| author.name.clone());
    Actor::new(author.id.to_string(), display_name)
}

/// Command check that only lets configured admins through.
pub async fn admin_only(ctx: Context<'_>) -> Result<bool> {
    let user_id = ctx.author().id.to_string();
    if ctx.data().is_admin(&user_id) {
        return Ok(true);
    }
    warn!(%user_id, command = %ctx.command().name, "Non-admin attempted admin command");
    ctx.say("⛔ This command is for admins only.").await?;
    Ok(false)
}

/// Turns a command error into the message shown to the user.
#[must_use]
pub fn user_message(error: &Error) -> String {
    match error {
        Error::Validation { message } => format!("❌ {message}"),
        Error::InvalidState { request_id, status } => {
            format!("⚠️ Request #{request_id} is already {status}.")
        }
        Error::InsufficientStock {
            current, requested, ..
        } => format!("⚠️ Not enough stock: {current} on hand, {requested} requested."),
        Error::ProductNotFound { id } => format!("❌ Product #{id} does not exist."),
        Error::RequestNotFound { id } => format!("❌ Request #{id} does not exist."),
        _ => "❌ Something went wrong. Please try again later.".to_string(),
    }
}

async fn on_error(error: poise::FrameworkError<'_, BotData, Error>) {
    match error {
        poise::FrameworkError::Setup { error, .. } => {
            error!(error = %error, "Failed to start bot");
        }
        poise::FrameworkError::Command { error, ctx, .. } => {
            match &error {
                Error::Database(_) | Error::Discord(_) | Error::Io(_) => {
                    error!(command = %ctx.command().name, error = %error, "Command failed");
                }
                _ => info!(command = %ctx.command().name, error = %error, "Command rejected"),
            }
            if let Err(e) = ctx.say(user_message(&error)).await {
                error!(error = %e, "Failed to send error message");
            }
        }
        error => {
            if let Err(e) = poise::builtins::on_error(error).await {
                error!(error = %e, "Error while handling error");
            }
        }
    }
}

const LOW_STOCK_ALERT_QUEUE: usize = 64;

/// Connects to Discord, registers the slash commands globally and runs until the
/// gateway connection ends.
///
/// # Errors
/// Returns an error if the client cannot be built or the gateway connection fails.
pub async fn run_bot(token: String, data: BotData) -> Result<()> {
    let framework = poise::Framework::builder()
        .options(poise::FrameworkOptions {
            commands: commands::all(),
            on_error: |error| Box::pin(on_error(error)),
            ..Default::default()
        })
        .setup(|ctx, ready, framework| {
            Box::pin(async move {
                info!("Logged in as {}", ready.user.name);
                poise::builtins::register_globally(ctx, &framework.options().commands).await?;
                info!(
                    count = framework.options().commands.len(),
                    "Registered commands globally"
                );

                let _stats = watchers::spawn_stats_watcher(&data.store, data.stats.clone());

                let threshold = data.settings.low_stock_threshold;
                let (alerts_tx, alerts_rx) = mpsc::channel(LOW_STOCK_ALERT_QUEUE);
                let _low_stock =
                    watchers::spawn_low_stock_watcher(&data.store, threshold, alerts_tx).await?;
                let channel = data
                    .settings
                    .low_stock_channel_id
                    .map(serenity::ChannelId::new);
                tokio::spawn(watchers::forward_low_stock_alerts(
                    alerts_rx,
                    Arc::clone(&ctx.http),
                    channel,
                    threshold,
                ));
                Ok(data)
            })
        })
        .build();

    let intents = serenity::GatewayIntents::non_privileged();

    info!("Setting up Serenity client for Poise framework...");
    let mut client = serenity::ClientBuilder::new(token, intents)
        .framework(framework)
        .await?;
    client.start().await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::RequestStatus;

    #[test]
    fn test_user_message_for_domain_errors() {
        assert_eq!(
            user_message(&Error::InvalidState {
                request_id: 4,
                status: RequestStatus::Approved
            }),
            "⚠️ Request #4 is already approved."
        );
        assert_eq!(
            user_message(&Error::InsufficientStock {
                product_id: 1,
                current: 2,
                requested: 5
            }),
            "⚠️ Not enough stock: 2 on hand, 5 requested."
        );
        assert_eq!(user_message(&Error::validation("nope")), "❌ nope");
    }

    #[test]
    fn test_user_message_hides_internal_errors() {
        let message = user_message(&Error::Database(sea_orm::DbErr::Custom(
            "disk on fire".to_string(),
        )));
        assert!(!message.contains("disk"));
    }

    #[test]
    fn test_is_admin() {
        let store = Store::new(
            sea_orm::MockDatabase::new(sea_orm::DatabaseBackend::Sqlite).into_connection(),
        );
        let admins = HashSet::from(["42".to_string()]);
        let data = BotData::new(store, Settings::default(), admins);
        assert!(data.is_admin("42"));
        assert!(!data.is_admin("43"));
    }
}
