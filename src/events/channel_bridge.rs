use serenity::model::id::{ChannelId, GuildId};
use serenity::prelude::Context;

use crate::database::Database;
use crate::models::{ChannelInfoRequest, ChannelInfoResponse};

/// Answer pending channel-name lookups written by the web dashboard.
/// Every request key is consumed exactly once: deleted after handling
/// whether or not a channel was found, so the requester's own timeout is
/// the only retry mechanism.
pub async fn process_pending_requests(ctx: &Context, db: &Database) {
    let requests = match db.pending_channel_info_requests().await {
        Ok(requests) => requests,
        Err(e) => {
            warn!("Failed to list channel-info requests: {}", e);
            return;
        }
    };

    for (key, raw) in requests {
        if let Err(e) = db.delete(&key).await {
            warn!("Failed to delete channel-info request {}: {}", key, e);
        }

        let request: ChannelInfoRequest = match serde_json::from_str(&raw) {
            Ok(request) => request,
            Err(e) => {
                warn!("Malformed channel-info request {} ({}): {}", key, raw, e);
                continue;
            }
        };

        let response = match resolve_channel(ctx, &request) {
            Some(response) => response,
            // Not a member of that guild, or no such channel. No response;
            // the dashboard times out on its own.
            None => continue,
        };

        match db.put_channel_info_response(&response).await {
            Ok(()) => debug!("Resolved channel {} -> #{}", response.id, response.name),
            Err(e) => warn!("Failed to write channel-info response: {}", e),
        }
    }
}

/// Look the channel up in the live guild cache.
fn resolve_channel(ctx: &Context, request: &ChannelInfoRequest) -> Option<ChannelInfoResponse> {
    let guild_id: u64 = request.server_id.parse().ok()?;
    let channel_id: u64 = request.channel_id.parse().ok()?;

    let channel = ctx.cache.guild_channel(ChannelId(channel_id))?;
    if channel.guild_id != GuildId(guild_id) {
        return None;
    }
    Some(ChannelInfoResponse {
        id: channel.id.0.to_string(),
        name: channel.name.clone(),
        kind: channel.kind.name().to_string(),
    })
}
