pub mod admin;
pub mod connect;
pub mod stats;
pub mod submit;

use serenity::model::application::command::CommandOptionType;
use serenity::model::application::interaction::application_command::ApplicationCommandInteraction;
use serenity::model::application::interaction::{InteractionResponseType, MessageFlags};
use serenity::model::id::GuildId;
use serenity::prelude::Context;

use crate::models::Tier;

const TIERS: [Tier; 5] = [Tier::Micro, Tier::Rising, Tier::Star, Tier::Legend, Tier::Hero];

/// Register the engagement command set on the configured guild.
pub async fn register_commands(ctx: &Context, guild: GuildId) -> Result<(), anyhow::Error> {
    guild
        .set_application_commands(&ctx.http, |commands| {
            commands.create_application_command(|c| {
                c.name("connect")
                    .description("Connect your Twitter account for engagement tracking")
            });
            commands.create_application_command(|c| {
                c.name("submit")
                    .description("Submit one of your tweets for engagement tracking");
                c.create_option(|o| {
                    o.name("url")
                        .description("Link to the tweet")
                        .kind(CommandOptionType::String)
                        .required(true)
                });
                c.create_option(|o| {
                    o.name("category")
                        .description("Content category (defaults to General)")
                        .kind(CommandOptionType::String)
                        .required(false)
                })
            });
            commands.create_application_command(|c| {
                c.name("stats").description("Your engagement stats")
            });
            commands.create_application_command(|c| {
                c.name("leaderboard")
                    .description("Top members by engagement points")
            });
            commands.create_application_command(|c| {
                c.name("recent").description("Recently submitted tweets")
            });
            commands.create_application_command(|c| {
                c.name("tier")
                    .description("Set a member's engagement tier (admin)");
                c.create_option(|o| {
                    o.name("user")
                        .description("The member to update")
                        .kind(CommandOptionType::User)
                        .required(true)
                });
                c.create_option(|o| {
                    let o = o
                        .name("tier")
                        .description("The new tier")
                        .kind(CommandOptionType::String)
                        .required(true);
                    for tier in TIERS {
                        o.add_string_choice(tier.as_str(), tier.as_str());
                    }
                    o
                })
            });
            commands.create_application_command(|c| {
                c.name("scenarios")
                    .description("Update a tier's quota and reward rules (admin)");
                c.create_option(|o| {
                    let o = o
                        .name("tier")
                        .description("The tier to update")
                        .kind(CommandOptionType::String)
                        .required(true);
                    for tier in TIERS {
                        o.add_string_choice(tier.as_str(), tier.as_str());
                    }
                    o
                });
                c.create_option(|o| {
                    o.name("daily_limit")
                        .description("Submissions allowed per day")
                        .kind(CommandOptionType::Integer)
                        .required(false)
                });
                c.create_option(|o| {
                    o.name("min_followers")
                        .description("Minimum follower count")
                        .kind(CommandOptionType::Integer)
                        .required(false)
                });
                c.create_option(|o| {
                    o.name("bonus_multiplier")
                        .description("Point bonus multiplier")
                        .kind(CommandOptionType::Number)
                        .required(false)
                })
            })
        })
        .await?;
    Ok(())
}

/// Acknowledge immediately; the actual reply is edited in once the work is done.
pub async fn defer_ephemeral(
    ctx: &Context,
    interaction: &ApplicationCommandInteraction,
) -> Result<(), anyhow::Error> {
    interaction
        .create_interaction_response(&ctx.http, |r| {
            r.kind(InteractionResponseType::DeferredChannelMessageWithSource);
            r.interaction_response_data(|d| d.flags(MessageFlags::EPHEMERAL))
        })
        .await?;
    Ok(())
}

pub async fn edit_reply(
    ctx: &Context,
    interaction: &ApplicationCommandInteraction,
    content: String,
) -> Result<(), anyhow::Error> {
    interaction
        .edit_original_interaction_response(&ctx.http, |m| m.content(content))
        .await?;
    Ok(())
}

/// Admin gating goes through the Discord role name, not the stored
/// privilege role. The two are independent; see DESIGN.md.
pub async fn member_is_admin(ctx: &Context, interaction: &ApplicationCommandInteraction) -> bool {
    let admin_role = std::env::var("ADMIN_ROLE_NAME").unwrap_or_else(|_| "Admin".to_string());
    let (member, guild_id) = match (&interaction.member, interaction.guild_id) {
        (Some(member), Some(guild_id)) => (member, guild_id),
        _ => return false,
    };
    let roles = match ctx.http.get_guild_roles(guild_id.0).await {
        Ok(roles) => roles,
        Err(e) => {
            warn!("Failed to fetch guild roles for admin check: {}", e);
            return false;
        }
    };
    roles
        .iter()
        .any(|r| r.name == admin_role && member.roles.contains(&r.id))
}

/// Run a command body and fold any internal error into a user-visible
/// failure message, so every deferred reply gets resolved.
pub async fn respond(
    ctx: &Context,
    interaction: &ApplicationCommandInteraction,
    result: Result<String, anyhow::Error>,
) -> Result<(), anyhow::Error> {
    let content = match result {
        Ok(content) => content,
        Err(e) => {
            error!("/{} failed: {}", interaction.data.name, e);
            "❌ Something went wrong, please try again later.".to_string()
        }
    };
    edit_reply(ctx, interaction, content).await
}
