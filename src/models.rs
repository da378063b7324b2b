use chrono::{DateTime, Utc};

/// Privilege role stored on the dashboard's user record.
/// The derived `Ord` follows declaration order, so `user < kol < team < core < admin`.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Kol,
    Team,
    Core,
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Kol => "kol",
            Role::Team => "team",
            Role::Core => "core",
            Role::Admin => "admin",
        }
    }
}

impl Default for Role {
    fn default() -> Self {
        Role::User
    }
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Tier {
    Micro,
    Rising,
    Star,
    Legend,
    Hero,
}

impl Tier {
    pub fn as_str(&self) -> &'static str {
        match self {
            Tier::Micro => "micro",
            Tier::Rising => "rising",
            Tier::Star => "star",
            Tier::Legend => "legend",
            Tier::Hero => "hero",
        }
    }

    /// Unknown or absent tier names fall back to `micro`.
    pub fn parse_or_micro(name: Option<&str>) -> Tier {
        match name.map(|n| n.trim().to_lowercase()).as_deref() {
            Some("rising") => Tier::Rising,
            Some("star") => Tier::Star,
            Some("legend") => Tier::Legend,
            Some("hero") => Tier::Hero,
            _ => Tier::Micro,
        }
    }
}

impl Default for Tier {
    fn default() -> Self {
        Tier::Micro
    }
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ApprovalStatus {
    Pending,
    Approved,
    Rejected,
}

impl Default for ApprovalStatus {
    fn default() -> Self {
        ApprovalStatus::Pending
    }
}

/// Dashboard-owned user record under `user:<id>`. The bot only ever
/// writes the `role` field; everything else is read-only here.
/// Missing fields on old documents degrade to the safe defaults.
#[derive(Serialize, Deserialize, Clone, Debug)]
#[serde(rename_all = "camelCase")]
pub struct UserAccount {
    pub id: String,
    #[serde(default)]
    pub handle: String,
    #[serde(default)]
    pub approval_status: ApprovalStatus,
    #[serde(default)]
    pub role: Role,
    #[serde(default)]
    pub tier: Tier,
}

/// Binding between a Discord identity and a verified Twitter handle,
/// stored under `engagement:connection:<discordId>`.
#[derive(Serialize, Deserialize, Clone, Debug)]
#[serde(rename_all = "camelCase")]
pub struct Connection {
    pub discord_id: String,
    pub twitter_handle: String,
    pub tier: Tier,
    pub connected_at: DateTime<Utc>,
    #[serde(default)]
    pub total_points: u64,
    #[serde(default)]
    pub role: Role,
}

/// An accepted submission under `engagement:tweet:<id>`. Immutable once written.
#[derive(Serialize, Deserialize, Clone, Debug)]
#[serde(rename_all = "camelCase")]
pub struct TweetSubmission {
    pub id: String,
    pub tweet_id: String,
    pub submitter_discord_id: String,
    pub submitted_at: DateTime<Utc>,
    pub category: String,
    pub url: String,
    pub author_handle: String,
    pub content: Option<String>,
    pub tier: Tier,
    pub bonus_multiplier: f64,
}

/// Per-tier quota/reward ruleset under `engagement:scenarios:<tier>`,
/// falling back to the built-in table when no override is stored.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TierScenario {
    pub daily_tweet_limit: u32,
    pub categories: Vec<String>,
    pub min_followers: u32,
    pub bonus_multiplier: f64,
}

/// Written by the web dashboard under `discord:channel-info-request:<k>`,
/// consumed exactly once by the polling bridge.
#[derive(Serialize, Deserialize, Clone, Debug)]
#[serde(rename_all = "camelCase")]
pub struct ChannelInfoRequest {
    pub channel_id: String,
    pub server_id: String,
}

/// Bridge answer under `discord:channel-info-response:<channelId>`, 60s expiry.
#[derive(Serialize, Deserialize, Clone, Debug)]
#[serde(rename_all = "camelCase")]
pub struct ChannelInfoResponse {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_precedence_is_total_ordered() {
        assert!(Role::User < Role::Kol);
        assert!(Role::Kol < Role::Team);
        assert!(Role::Team < Role::Core);
        assert!(Role::Core < Role::Admin);
    }

    #[test]
    fn unknown_tier_falls_back_to_micro() {
        assert_eq!(Tier::parse_or_micro(None), Tier::Micro);
        assert_eq!(Tier::parse_or_micro(Some("")), Tier::Micro);
        assert_eq!(Tier::parse_or_micro(Some("galactic")), Tier::Micro);
        assert_eq!(Tier::parse_or_micro(Some("LEGEND")), Tier::Legend);
    }

    #[test]
    fn user_account_defaults_fail_closed() {
        let user: UserAccount = serde_json::from_str(r#"{"id":"u1"}"#).unwrap();
        assert_eq!(user.approval_status, ApprovalStatus::Pending);
        assert_eq!(user.role, Role::User);
        assert_eq!(user.tier, Tier::Micro);
    }

    #[test]
    fn connection_round_trips_camel_case() {
        let raw = r#"{"discordId":"1","twitterHandle":"alice","tier":"micro","connectedAt":"2024-05-01T00:00:00Z","totalPoints":50,"role":"kol"}"#;
        let conn: Connection = serde_json::from_str(raw).unwrap();
        assert_eq!(conn.twitter_handle, "alice");
        assert_eq!(conn.total_points, 50);
        let out = serde_json::to_value(&conn).unwrap();
        assert!(out.get("twitterHandle").is_some());
    }
}
