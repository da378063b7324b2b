use serenity::model::application::interaction::application_command::ApplicationCommandInteraction;
use serenity::prelude::Context;

use crate::commands::{defer_ephemeral, member_is_admin, respond};
use crate::extensions::*;
use crate::submission::{self, SubmitOutcome};

pub async fn handle(
    ctx: &Context,
    interaction: ApplicationCommandInteraction,
) -> Result<(), anyhow::Error> {
    defer_ephemeral(ctx, &interaction).await?;

    let url = interaction
        .data
        .options
        .by_name("url")
        .and_then(|o| o.to_string())
        .unwrap_or_default();
    let category = interaction
        .data
        .options
        .by_name("category")
        .and_then(|o| o.to_string());

    let db = ctx.get_db().await;
    let discord_id = interaction.user.id.0.to_string();
    let is_admin = member_is_admin(ctx, &interaction).await;

    let reply = match submission::submit_tweet(&db, &discord_id, is_admin, &url, category.as_deref())
        .await
    {
        Ok(SubmitOutcome::Accepted {
            submission,
            scenario,
        }) => {
            // Already persisted; the announcement degrades on its own.
            submission::announce_submission(ctx, &submission).await;
            Ok(format!(
                "✅ Tweet submitted under **{}**! Potential reward multiplier: x{}.",
                submission.category, scenario.bonus_multiplier
            ))
        }
        Ok(SubmitOutcome::Rejected(rejection)) => Ok(rejection.user_message()),
        Err(e) => Err(e),
    };
    respond(ctx, &interaction, reply).await
}
