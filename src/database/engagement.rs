use chrono::Utc;

use super::Database;
use crate::models::{
    ChannelInfoResponse, Connection, Tier, TierScenario, TweetSubmission,
};

const RECENT_TWEETS_KEY: &str = "engagement:tweets:recent";
const CONNECTION_PREFIX: &str = "engagement:connection:";
const CHANNEL_REQUEST_PREFIX: &str = "discord:channel-info-request:";

/// Daily counters roll over on the UTC calendar day and expire after 24h.
const DAILY_COUNTER_EXPIRY_SECS: i64 = 24 * 60 * 60;
const CHANNEL_RESPONSE_EXPIRY_SECS: u64 = 60;

fn connection_key(discord_id: &str) -> String {
    format!("{}{}", CONNECTION_PREFIX, discord_id)
}

fn twitter_index_key(handle: &str) -> String {
    format!("engagement:twitter:{}", handle)
}

fn tweet_key(submission_id: &str) -> String {
    format!("engagement:tweet:{}", submission_id)
}

fn tweet_id_index_key(tweet_id: &str) -> String {
    format!("engagement:tweetid:{}", tweet_id)
}

fn scenario_key(tier: Tier) -> String {
    format!("engagement:scenarios:{}", tier.as_str())
}

pub fn daily_counter_key(discord_id: &str) -> String {
    format!(
        "engagement:daily:{}:{}",
        discord_id,
        Utc::now().format("%Y-%m-%d")
    )
}

/// The reverse-index key released when a connection moves to a new handle.
fn superseded_handle_index(previous: Option<&Connection>, next: &Connection) -> Option<String> {
    let previous = previous?;
    if previous.twitter_handle != next.twitter_handle {
        Some(twitter_index_key(&previous.twitter_handle))
    } else {
        None
    }
}

impl Database {
    pub async fn get_connection(
        &self,
        discord_id: &str,
    ) -> Result<Option<Connection>, anyhow::Error> {
        self.get_json(&connection_key(discord_id)).await
    }

    /// Persist a connection and its `handle -> discord id` reverse index
    /// so each handle can only ever be bound to one Discord identity.
    /// Reconnecting under a new handle releases the old handle's index
    /// entry; otherwise the stale binding would block its rightful owner.
    pub async fn put_connection(&self, connection: &Connection) -> Result<(), anyhow::Error> {
        let previous = self.get_connection(&connection.discord_id).await?;
        if let Some(stale) = superseded_handle_index(previous.as_ref(), connection) {
            self.delete(&stale).await?;
        }
        self.set_json(&connection_key(&connection.discord_id), connection)
            .await?;
        self.set_string(
            &twitter_index_key(&connection.twitter_handle),
            &connection.discord_id,
        )
        .await?;
        Ok(())
    }

    /// The Discord id a handle is already bound to, if any.
    pub async fn connection_owner(&self, handle: &str) -> Result<Option<String>, anyhow::Error> {
        self.get_string(&twitter_index_key(handle)).await
    }

    /// First 50 connections, in store order. The cap keeps the `KEYS` scan
    /// bounded; ranking beyond 50 users needs a maintained index instead.
    pub async fn all_connections(&self, cap: usize) -> Result<Vec<Connection>, anyhow::Error> {
        let mut keys = self.keys(&format!("{}*", CONNECTION_PREFIX)).await?;
        keys.truncate(cap);
        let mut connections = Vec::with_capacity(keys.len());
        for key in keys {
            if let Some(connection) = self.get_json::<Connection>(&key).await? {
                connections.push(connection);
            }
        }
        Ok(connections)
    }

    pub async fn is_duplicate_tweet(&self, tweet_id: &str) -> Result<bool, anyhow::Error> {
        self.exists(&tweet_id_index_key(tweet_id)).await
    }

    /// Persist an accepted submission: the document itself, the global
    /// dedupe index and the recency-ordered listing.
    pub async fn record_submission(
        &self,
        submission: &TweetSubmission,
    ) -> Result<(), anyhow::Error> {
        self.set_json(&tweet_key(&submission.id), submission).await?;
        self.set_string(&tweet_id_index_key(&submission.tweet_id), &submission.id)
            .await?;
        self.sorted_set_add(
            RECENT_TWEETS_KEY,
            &submission.id,
            submission.submitted_at.timestamp(),
        )
        .await?;
        Ok(())
    }

    pub async fn recent_submissions(
        &self,
        count: usize,
    ) -> Result<Vec<TweetSubmission>, anyhow::Error> {
        let ids = self.sorted_set_newest(RECENT_TWEETS_KEY, count).await?;
        let mut submissions = Vec::with_capacity(ids.len());
        for id in ids {
            if let Some(submission) = self.get_json::<TweetSubmission>(&tweet_key(&id)).await? {
                submissions.push(submission);
            }
        }
        Ok(submissions)
    }

    pub async fn daily_submission_count(&self, discord_id: &str) -> Result<u32, anyhow::Error> {
        self.get_counter(&daily_counter_key(discord_id)).await
    }

    pub async fn bump_daily_submission_count(
        &self,
        discord_id: &str,
    ) -> Result<u32, anyhow::Error> {
        self.incr_with_expiry(&daily_counter_key(discord_id), DAILY_COUNTER_EXPIRY_SECS)
            .await
    }

    pub async fn get_scenario_override(
        &self,
        tier: Tier,
    ) -> Result<Option<TierScenario>, anyhow::Error> {
        self.get_json(&scenario_key(tier)).await
    }

    pub async fn put_scenario(
        &self,
        tier: Tier,
        scenario: &TierScenario,
    ) -> Result<(), anyhow::Error> {
        self.set_json(&scenario_key(tier), scenario).await
    }

    /// Pending channel-info requests as `(key, raw payload)` pairs. The raw
    /// payload is kept opaque here so the bridge can log malformed JSON.
    pub async fn pending_channel_info_requests(
        &self,
    ) -> Result<Vec<(String, String)>, anyhow::Error> {
        let keys = self.keys(&format!("{}*", CHANNEL_REQUEST_PREFIX)).await?;
        let mut requests = Vec::with_capacity(keys.len());
        for key in keys {
            if let Some(raw) = self.get_string(&key).await? {
                requests.push((key, raw));
            }
        }
        Ok(requests)
    }

    pub async fn put_channel_info_response(
        &self,
        response: &ChannelInfoResponse,
    ) -> Result<(), anyhow::Error> {
        self.set_json_ex(
            &format!("discord:channel-info-response:{}", response.id),
            response,
            CHANNEL_RESPONSE_EXPIRY_SECS,
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Role;

    fn connection(discord_id: &str, handle: &str) -> Connection {
        Connection {
            discord_id: discord_id.to_string(),
            twitter_handle: handle.to_string(),
            tier: Tier::Micro,
            connected_at: Utc::now(),
            total_points: 0,
            role: Role::Kol,
        }
    }

    #[test]
    fn handle_change_releases_the_old_index() {
        let previous = connection("1", "alice");
        let next = connection("1", "alice_backup");
        assert_eq!(
            superseded_handle_index(Some(&previous), &next),
            Some("engagement:twitter:alice".to_string())
        );
    }

    #[test]
    fn same_handle_reconnect_keeps_the_index() {
        let previous = connection("1", "alice");
        let next = connection("1", "alice");
        assert_eq!(superseded_handle_index(Some(&previous), &next), None);
        assert_eq!(superseded_handle_index(None, &next), None);
    }

    #[test]
    fn key_conventions_match_the_dashboard() {
        assert_eq!(connection_key("123"), "engagement:connection:123");
        assert_eq!(twitter_index_key("alice"), "engagement:twitter:alice");
        assert_eq!(tweet_key("s1"), "engagement:tweet:s1");
        assert_eq!(tweet_id_index_key("42"), "engagement:tweetid:42");
        assert_eq!(scenario_key(Tier::Star), "engagement:scenarios:star");
    }

    #[test]
    fn daily_counter_key_uses_utc_day() {
        let key = daily_counter_key("123");
        let today = Utc::now().format("%Y-%m-%d").to_string();
        assert_eq!(key, format!("engagement:daily:123:{}", today));
    }
}
