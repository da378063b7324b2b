use chrono::Utc;
use serenity::model::application::component::{ActionRowComponent, InputTextStyle};
use serenity::model::application::interaction::application_command::ApplicationCommandInteraction;
use serenity::model::application::interaction::modal::ModalSubmitInteraction;
use serenity::model::application::interaction::{InteractionResponseType, MessageFlags};
use serenity::model::id::RoleId;
use serenity::prelude::Context;

use crate::database::users::normalize_handle;
use crate::database::Database;
use crate::extensions::ClientContextExt;
use crate::models::{Connection, Role};

pub const CONNECT_MODAL_ID: &str = "connect_twitter_modal";
const HANDLE_INPUT_ID: &str = "twitter_handle";

/// `/connect` itself only opens the modal; the real work happens on submit.
pub async fn open_modal(
    ctx: &Context,
    interaction: ApplicationCommandInteraction,
) -> Result<(), anyhow::Error> {
    interaction
        .create_interaction_response(&ctx.http, |r| {
            r.kind(InteractionResponseType::Modal);
            r.interaction_response_data(|d| {
                d.custom_id(CONNECT_MODAL_ID);
                d.title("Connect your Twitter account");
                d.components(|c| {
                    c.create_action_row(|row| {
                        row.create_input_text(|t| {
                            t.custom_id(HANDLE_INPUT_ID);
                            t.label("Your Twitter Handle");
                            t.style(InputTextStyle::Short);
                            t.placeholder("@yourhandle");
                            t.required(true)
                        })
                    })
                })
            })
        })
        .await?;
    Ok(())
}

fn modal_input(modal: &ModalSubmitInteraction, custom_id: &str) -> Option<String> {
    for row in &modal.data.components {
        for component in &row.components {
            if let ActionRowComponent::InputText(input) = component {
                if input.custom_id == custom_id {
                    return Some(input.value.clone());
                }
            }
        }
    }
    None
}

pub async fn handle_modal(
    ctx: &Context,
    modal: ModalSubmitInteraction,
) -> Result<(), anyhow::Error> {
    modal
        .create_interaction_response(&ctx.http, |r| {
            r.kind(InteractionResponseType::DeferredChannelMessageWithSource);
            r.interaction_response_data(|d| d.flags(MessageFlags::EPHEMERAL))
        })
        .await?;

    let db = ctx.get_db().await;
    let content = match connect_account(ctx, &db, &modal).await {
        Ok(content) => content,
        Err(e) => {
            error!("Connect flow failed: {}", e);
            "❌ Something went wrong, please try again later.".to_string()
        }
    };
    modal
        .edit_original_interaction_response(&ctx.http, |m| m.content(content))
        .await?;
    Ok(())
}

async fn connect_account(
    ctx: &Context,
    db: &Database,
    modal: &ModalSubmitInteraction,
) -> Result<String, anyhow::Error> {
    let handle = match modal_input(modal, HANDLE_INPUT_ID) {
        Some(handle) => normalize_handle(&handle),
        None => return Ok("❌ No handle provided.".to_string()),
    };
    let discord_id = modal.user.id.0.to_string();

    let (approved, user) = db.is_approved(&handle).await;
    let user = match (approved, user) {
        (true, Some(user)) => user,
        _ => {
            return Ok(format!(
                "❌ @{} is not an approved account. Apply through the dashboard first.",
                handle
            ))
        }
    };

    if let Some(owner) = db.connection_owner(&handle).await? {
        if owner != discord_id {
            return Ok(format!(
                "❌ @{} is already connected to a different Discord account.",
                handle
            ));
        }
    }

    // A reconnect keeps the points already earned.
    let total_points = db
        .get_connection(&discord_id)
        .await?
        .map(|c| c.total_points)
        .unwrap_or(0);

    // Promotions only ever go upward; an existing team/core/admin keeps their role.
    let mut role = user.role;
    if role < Role::Kol {
        match db.promote_role(&handle, Role::Kol).await {
            Ok(()) => role = Role::Kol,
            Err(e) => warn!("Role promotion failed for {}: {}", handle, e),
        }
        mirror_kol_role(ctx, modal).await;
    }

    let connection = Connection {
        discord_id: discord_id.clone(),
        twitter_handle: handle.clone(),
        tier: user.tier,
        connected_at: Utc::now(),
        total_points,
        role,
    };
    db.put_connection(&connection).await?;
    info!("Connected {} as @{} ({})", discord_id, handle, user.tier.as_str());

    Ok(format!(
        "✅ Connected as **@{}**! Tier: **{}**. Use `/submit` to register your tweets.",
        handle,
        user.tier.as_str()
    ))
}

/// Best-effort mirror of the KOL promotion onto the Discord role object.
/// Missing configuration or permissions are logged, never surfaced.
async fn mirror_kol_role(ctx: &Context, modal: &ModalSubmitInteraction) {
    let role_id = match std::env::var("KOL_ROLE_ID")
        .ok()
        .and_then(|id| id.parse::<u64>().ok())
    {
        Some(id) => RoleId(id),
        None => {
            debug!("KOL_ROLE_ID not configured, skipping Discord role mirror");
            return;
        }
    };
    let mut member = match modal.member.clone() {
        Some(member) => member,
        None => return,
    };
    if let Err(e) = member.add_role(&ctx.http, role_id).await {
        warn!("Failed to mirror KOL role onto {}: {}", modal.user.id.0, e);
    }
}
