pub mod commands;
pub mod database;
pub mod events;
pub mod extensions;
pub mod leaderboard;
pub mod models;
pub mod scenarios;
pub mod submission;

#[macro_use]
extern crate tracing;
#[macro_use]
extern crate serde_derive;

use std::env;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use clokwerk::AsyncScheduler;
use serenity::async_trait;
use serenity::model::application::interaction::Interaction;
use serenity::model::gateway::{GatewayIntents, Ready};
use serenity::model::id::GuildId;
use serenity::prelude::{Client, Context, EventHandler};

use crate::commands::connect::CONNECT_MODAL_ID;
use crate::database::Database;
use crate::extensions::ClientContextExt;

#[derive(Default)]
struct Handler {
    schedulers_started: AtomicBool,
}

#[async_trait]
impl EventHandler for Handler {
    async fn ready(&self, ctx: Context, ready: Ready) {
        info!("Connected as {}", ready.user.name);

        let guild_id = GuildId(
            env::var("GUILD_ID")
                .expect("Expected GUILD_ID in the environment")
                .parse()
                .expect("Invalid GUILD_ID"),
        );
        match commands::register_commands(&ctx, guild_id).await {
            Ok(()) => info!("Registered engagement commands on guild {}", guild_id.0),
            Err(e) => error!("Failed to register commands: {}", e),
        }

        // `ready` can fire again on reconnect; only start the poller once.
        if !self.schedulers_started.swap(true, Ordering::SeqCst) {
            let db = ctx.get_db().await;
            let mut scheduler = AsyncScheduler::new();
            events::setup_schedulers(&mut scheduler, ctx.clone(), db);
            tokio::spawn(async move {
                loop {
                    scheduler.run_pending().await;
                    tokio::time::sleep(std::time::Duration::from_millis(500)).await;
                }
            });
            info!("Channel-info bridge polling started");
        }
    }

    async fn interaction_create(&self, ctx: Context, interaction: Interaction) {
        match interaction {
            Interaction::ApplicationCommand(command) => {
                let name = command.data.name.clone();
                let result = match name.as_str() {
                    "connect" => commands::connect::open_modal(&ctx, command).await,
                    "submit" => commands::submit::handle(&ctx, command).await,
                    "stats" => commands::stats::handle_stats(&ctx, command).await,
                    "leaderboard" => commands::stats::handle_leaderboard(&ctx, command).await,
                    "recent" => commands::stats::handle_recent(&ctx, command).await,
                    "tier" => commands::admin::handle_tier(&ctx, command).await,
                    "scenarios" => commands::admin::handle_scenarios(&ctx, command).await,
                    _ => {
                        debug!("Unknown command: {}", name);
                        Ok(())
                    }
                };
                if let Err(e) = result {
                    error!("/{} handler failed: {}", name, e);
                }
            }
            Interaction::ModalSubmit(modal) if modal.data.custom_id == CONNECT_MODAL_ID => {
                if let Err(e) = commands::connect::handle_modal(&ctx, modal).await {
                    error!("Connect modal handler failed: {}", e);
                }
            }
            _ => {}
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    dotenv::dotenv().ok();
    tracing_subscriber::fmt::init();

    info!("Starting engagement-bot ({})", env!("GIT_HASH"));

    let token = env::var("DISCORD_TOKEN").expect("Expected DISCORD_TOKEN in the environment");
    env::var("GUILD_ID").expect("Expected GUILD_ID in the environment");
    env::var("ENGAGEMENT_CHANNEL_ID").expect("Expected ENGAGEMENT_CHANNEL_ID in the environment");
    if env::var("GEMINI_API_KEY").is_err() {
        warn!("GEMINI_API_KEY not set, sentiment analysis is disabled");
    }

    let db = Arc::new(Database::new().await);

    let intents = GatewayIntents::GUILDS;
    let mut client = Client::builder(&token, intents)
        .event_handler(Handler::default())
        .await?;
    client.data.write().await.insert::<Database>(db);

    let shard_manager = client.shard_manager.clone();
    tokio::spawn(async move {
        tokio::signal::ctrl_c()
            .await
            .expect("Could not register ctrl+c handler");
        info!("Shutting down");
        shard_manager.lock().await.shutdown_all().await;
    });

    client.start().await?;
    Ok(())
}
