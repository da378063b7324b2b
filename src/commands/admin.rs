use serenity::model::application::interaction::application_command::ApplicationCommandInteraction;
use serenity::prelude::Context;

use crate::commands::{defer_ephemeral, edit_reply, member_is_admin, respond};
use crate::database::Database;
use crate::extensions::*;
use crate::models::Tier;
use crate::scenarios::{self, ScenarioPatch};

const NOT_ADMIN: &str = "❌ This command requires the admin role.";

/// `/tier` — overwrite a member's connection tier.
pub async fn handle_tier(
    ctx: &Context,
    interaction: ApplicationCommandInteraction,
) -> Result<(), anyhow::Error> {
    defer_ephemeral(ctx, &interaction).await?;
    if !member_is_admin(ctx, &interaction).await {
        return edit_reply(ctx, &interaction, NOT_ADMIN.to_string()).await;
    }

    let target = interaction
        .data
        .options
        .by_name("user")
        .and_then(|o| o.to_user());
    let tier = interaction
        .data
        .options
        .by_name("tier")
        .and_then(|o| o.to_string());

    let db = ctx.get_db().await;
    let result = match (target, tier) {
        (Some((user, _)), Some(tier)) => {
            set_tier(&db, &user.id.0.to_string(), Tier::parse_or_micro(Some(&tier))).await
        }
        _ => Ok("❌ Missing user or tier option.".to_string()),
    };
    respond(ctx, &interaction, result).await
}

async fn set_tier(
    db: &Database,
    discord_id: &str,
    tier: Tier,
) -> Result<String, anyhow::Error> {
    let mut connection = match db.get_connection(discord_id).await? {
        Some(connection) => connection,
        None => return Ok("❌ That member hasn't connected a Twitter account.".to_string()),
    };
    connection.tier = tier;
    db.put_connection(&connection).await?;
    info!(
        "Tier of @{} ({}) set to {}",
        connection.twitter_handle,
        discord_id,
        tier.as_str()
    );
    Ok(format!(
        "✅ **@{}** is now tier **{}**.",
        connection.twitter_handle,
        tier.as_str()
    ))
}

/// `/scenarios` — partial-patch a tier's quota/reward rules.
pub async fn handle_scenarios(
    ctx: &Context,
    interaction: ApplicationCommandInteraction,
) -> Result<(), anyhow::Error> {
    defer_ephemeral(ctx, &interaction).await?;
    if !member_is_admin(ctx, &interaction).await {
        return edit_reply(ctx, &interaction, NOT_ADMIN.to_string()).await;
    }

    let options = &interaction.data.options;
    let tier = Tier::parse_or_micro(
        options
            .by_name("tier")
            .and_then(|o| o.to_string())
            .as_deref(),
    );
    let patch = ScenarioPatch {
        daily_tweet_limit: options
            .by_name("daily_limit")
            .and_then(|o| o.to_i64())
            .map(|v| v.max(0) as u32),
        min_followers: options
            .by_name("min_followers")
            .and_then(|o| o.to_i64())
            .map(|v| v.max(0) as u32),
        bonus_multiplier: options.by_name("bonus_multiplier").and_then(|o| o.to_f64()),
    };

    let db = ctx.get_db().await;
    let result = if patch.is_empty() {
        Ok("❌ Provide at least one field to update.".to_string())
    } else {
        scenarios::update_scenarios(&db, tier, &patch)
            .await
            .map(|merged| {
                format!(
                    "✅ Scenario for **{}** updated: {} tweets/day, {} min followers, x{} multiplier.",
                    tier.as_str(),
                    merged.daily_tweet_limit,
                    merged.min_followers,
                    merged.bonus_multiplier
                )
            })
    };
    respond(ctx, &interaction, result).await
}
