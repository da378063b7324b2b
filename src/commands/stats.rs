use serenity::model::application::interaction::application_command::ApplicationCommandInteraction;
use serenity::prelude::Context;

use crate::commands::{defer_ephemeral, respond};
use crate::database::Database;
use crate::extensions::ClientContextExt;
use crate::leaderboard;
use crate::submission::{
    potential_points, LIKE_POINTS, REPLY_POINTS, REPOST_POINTS,
};

pub async fn handle_stats(
    ctx: &Context,
    interaction: ApplicationCommandInteraction,
) -> Result<(), anyhow::Error> {
    defer_ephemeral(ctx, &interaction).await?;
    let db = ctx.get_db().await;
    let result = stats_reply(&db, &interaction.user.id.0.to_string()).await;
    respond(ctx, &interaction, result).await
}

async fn stats_reply(db: &Database, discord_id: &str) -> Result<String, anyhow::Error> {
    let connection = match db.get_connection(discord_id).await? {
        Some(connection) => connection,
        None => {
            return Ok(
                "❌ You haven't connected a Twitter account yet. Use `/connect` first.".to_string(),
            )
        }
    };
    let stats = leaderboard::user_stats(db, connection).await?;
    Ok(format!(
        "📊 **Stats for @{}**\n\
         Tier: **{}**\n\
         Today: **{}/{}** submissions\n\
         Multiplier: **x{}** (❤️ {} | 🔁 {} | 💬 {} points)\n\
         Categories: {}\n\
         Total points: **{}**",
        stats.connection.twitter_handle,
        stats.connection.tier.as_str(),
        stats.today,
        stats.scenario.daily_tweet_limit,
        stats.scenario.bonus_multiplier,
        potential_points(LIKE_POINTS, stats.scenario.bonus_multiplier),
        potential_points(REPOST_POINTS, stats.scenario.bonus_multiplier),
        potential_points(REPLY_POINTS, stats.scenario.bonus_multiplier),
        stats.scenario.categories.join(", "),
        stats.connection.total_points,
    ))
}

pub async fn handle_leaderboard(
    ctx: &Context,
    interaction: ApplicationCommandInteraction,
) -> Result<(), anyhow::Error> {
    defer_ephemeral(ctx, &interaction).await?;
    let db = ctx.get_db().await;
    let result = leaderboard_reply(&db).await;
    respond(ctx, &interaction, result).await
}

async fn leaderboard_reply(db: &Database) -> Result<String, anyhow::Error> {
    let top = leaderboard::top_connections(db).await?;
    if top.is_empty() {
        return Ok("Nobody has connected an account yet.".to_string());
    }
    let mut lines = vec!["🏆 **Engagement leaderboard**".to_string()];
    for (rank, connection) in top.iter().enumerate() {
        let medal = match rank {
            0 => "🥇",
            1 => "🥈",
            2 => "🥉",
            _ => "▫️",
        };
        lines.push(format!(
            "{} {}. **@{}** — {} points",
            medal,
            rank + 1,
            connection.twitter_handle,
            connection.total_points
        ));
    }
    Ok(lines.join("\n"))
}

pub async fn handle_recent(
    ctx: &Context,
    interaction: ApplicationCommandInteraction,
) -> Result<(), anyhow::Error> {
    defer_ephemeral(ctx, &interaction).await?;
    let db = ctx.get_db().await;
    let result = recent_reply(&db).await;
    respond(ctx, &interaction, result).await
}

async fn recent_reply(db: &Database) -> Result<String, anyhow::Error> {
    let submissions = db.recent_submissions(10).await?;
    if submissions.is_empty() {
        return Ok("No tweets have been submitted yet.".to_string());
    }
    let mut lines = vec!["🕑 **Recent submissions**".to_string()];
    for submission in submissions {
        lines.push(format!(
            "• [{}] **@{}** — <{}>",
            submission.category, submission.author_handle, submission.url
        ));
    }
    Ok(lines.join("\n"))
}
