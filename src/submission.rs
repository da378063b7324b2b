use chrono::Utc;
use once_cell::sync::Lazy;
use regex::Regex;
use serenity::model::application::component::ButtonStyle;
use serenity::model::id::ChannelId;
use serenity::prelude::Context;
use uuid::Uuid;

use crate::database::Database;
use crate::database::users::normalize_handle;
use crate::models::{Connection, Tier, TierScenario, TweetSubmission};
use crate::scenarios;

/// Advisory point bases surfaced in the announcement. Actual crediting on
/// engagement events happens outside this bot.
pub const LIKE_POINTS: u32 = 10;
pub const REPOST_POINTS: u32 = 20;
pub const REPLY_POINTS: u32 = 30;

pub const DEFAULT_CATEGORY: &str = "General";

static TWEET_URL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^https?://(?:www\.)?(?:twitter\.com|x\.com)/([A-Za-z0-9_]+)/status/(\d+)")
        .expect("Invalid tweet URL pattern")
});

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedTweet {
    pub author_handle: String,
    pub tweet_id: String,
}

/// Extract the author handle and the platform-native post id from a
/// twitter.com/x.com status URL.
pub fn parse_tweet_url(url: &str) -> Option<ParsedTweet> {
    let captures = TWEET_URL.captures(url.trim())?;
    Some(ParsedTweet {
        author_handle: normalize_handle(&captures[1]),
        tweet_id: captures[2].to_string(),
    })
}

pub fn potential_points(base: u32, multiplier: f64) -> u32 {
    (base as f64 * multiplier).floor() as u32
}

/// Terminal rejection states of the pipeline, in evaluation order.
#[derive(Debug, Clone, PartialEq)]
pub enum Rejection {
    InvalidUrl,
    NotConnected,
    NotApproved,
    DailyLimitReached(u32),
    Duplicate,
    NotOwnTweet,
    InvalidCategory(Vec<String>),
}

impl Rejection {
    pub fn user_message(&self) -> String {
        match self {
            Rejection::InvalidUrl => {
                "❌ That doesn't look like a valid tweet URL. Expected https://x.com/<user>/status/<id>".to_string()
            }
            Rejection::NotConnected => {
                "❌ You haven't connected a Twitter account yet. Use `/connect` first.".to_string()
            }
            Rejection::NotApproved => {
                "❌ Your account is no longer approved. Contact the team.".to_string()
            }
            Rejection::DailyLimitReached(limit) => {
                format!("❌ You've reached your daily limit of {} submissions. Try again tomorrow!", limit)
            }
            Rejection::Duplicate => "❌ This tweet has already been submitted.".to_string(),
            Rejection::NotOwnTweet => {
                "❌ You can only submit your own tweets.".to_string()
            }
            Rejection::InvalidCategory(allowed) => {
                format!("❌ Invalid category for your tier. Allowed: {}", allowed.join(", "))
            }
        }
    }
}

#[derive(Debug)]
pub enum SubmitOutcome {
    Accepted {
        submission: TweetSubmission,
        scenario: TierScenario,
    },
    Rejected(Rejection),
}

/// Match a requested category against the tier's allowed set, defaulting to
/// "General" when none was supplied. Returns the canonical casing.
pub fn resolve_category(
    scenario: &TierScenario,
    requested: Option<&str>,
) -> Result<String, Rejection> {
    let requested = match requested {
        Some(c) if !c.trim().is_empty() => c.trim(),
        _ => return Ok(DEFAULT_CATEGORY.to_string()),
    };
    scenario
        .categories
        .iter()
        .find(|c| c.eq_ignore_ascii_case(requested))
        .cloned()
        .ok_or_else(|| Rejection::InvalidCategory(scenario.categories.clone()))
}

/// Snapshot of everything the ordered checks look at.
pub struct SubmissionFacts<'a> {
    pub parsed: Option<ParsedTweet>,
    pub connection: Option<&'a Connection>,
    pub approved: bool,
    pub today: u32,
    pub duplicate: bool,
    pub is_admin: bool,
    pub category: Option<&'a str>,
}

/// The fixed-order gate over a submission attempt: invalid URL, not
/// connected, not approved, daily limit, duplicate, foreign author,
/// invalid category. The first failing check wins.
pub fn evaluate_submission(
    facts: &SubmissionFacts,
    scenario: &TierScenario,
) -> Result<(ParsedTweet, String), Rejection> {
    let parsed = facts.parsed.clone().ok_or(Rejection::InvalidUrl)?;
    let connection = facts.connection.ok_or(Rejection::NotConnected)?;
    if !facts.approved {
        return Err(Rejection::NotApproved);
    }
    if facts.today >= scenario.daily_tweet_limit {
        return Err(Rejection::DailyLimitReached(scenario.daily_tweet_limit));
    }
    if facts.duplicate {
        return Err(Rejection::Duplicate);
    }
    if parsed.author_handle != connection.twitter_handle && !facts.is_admin {
        return Err(Rejection::NotOwnTweet);
    }
    let category = resolve_category(scenario, facts.category)?;
    Ok((parsed, category))
}

/// Run one submission attempt through the gate and, on success, persist
/// the submission and bump the daily counter. No store write happens
/// before a rejecting check.
pub async fn submit_tweet(
    db: &Database,
    discord_id: &str,
    is_admin: bool,
    url: &str,
    category: Option<&str>,
) -> Result<SubmitOutcome, anyhow::Error> {
    let parsed = parse_tweet_url(url);
    let connection = db.get_connection(discord_id).await?;

    let (approved, scenario, today, duplicate) = match (&parsed, &connection) {
        (Some(parsed), Some(connection)) => {
            let (approved, _) = db.is_approved(&connection.twitter_handle).await;
            let scenario = scenarios::get_scenarios(db, connection.tier).await;
            let today = db.daily_submission_count(discord_id).await?;
            let duplicate = db.is_duplicate_tweet(&parsed.tweet_id).await?;
            (approved, scenario, today, duplicate)
        }
        // An invalid URL or missing connection already decides the outcome.
        _ => (false, scenarios::default_scenario(Tier::Micro), 0, false),
    };

    let facts = SubmissionFacts {
        parsed,
        connection: connection.as_ref(),
        approved,
        today,
        duplicate,
        is_admin,
        category,
    };
    let (parsed, category) = match evaluate_submission(&facts, &scenario) {
        Ok(passed) => passed,
        Err(rejection) => return Ok(SubmitOutcome::Rejected(rejection)),
    };
    let connection = connection.expect("gate guarantees a connection");

    // Non-fatal: a failed fetch just leaves the content empty.
    let content = fetch_tweet_content(url).await;

    let submission = TweetSubmission {
        id: Uuid::new_v4().to_string(),
        tweet_id: parsed.tweet_id,
        submitter_discord_id: discord_id.to_string(),
        submitted_at: Utc::now(),
        category,
        url: url.trim().to_string(),
        author_handle: parsed.author_handle,
        content,
        tier: connection.tier,
        bonus_multiplier: scenario.bonus_multiplier,
    };

    db.record_submission(&submission).await?;
    let count = db.bump_daily_submission_count(discord_id).await?;
    info!(
        "Accepted tweet {} from {} ({}/{} today)",
        submission.tweet_id, discord_id, count, scenario.daily_tweet_limit
    );

    Ok(SubmitOutcome::Accepted {
        submission,
        scenario,
    })
}

/// The tweet URL travels as a query parameter, so it is percent-encoded
/// rather than interpolated into the request line.
fn oembed_url(url: &str) -> reqwest::Url {
    reqwest::Url::parse_with_params(
        "https://publish.twitter.com/oembed",
        &[("omit_script", "1"), ("url", url)],
    )
    .expect("Invalid oEmbed base URL")
}

/// Best-effort tweet text lookup through the public oEmbed endpoint.
async fn fetch_tweet_content(url: &str) -> Option<String> {
    static TAGS: Lazy<Regex> = Lazy::new(|| Regex::new(r"<[^>]+>").expect("Invalid tag pattern"));

    let response = reqwest::get(oembed_url(url)).await.ok()?;
    let body: serde_json::Value = response.json().await.ok()?;
    let html = body.get("html")?.as_str()?;
    let text = TAGS.replace_all(html, " ");
    let text = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if text.is_empty() {
        None
    } else {
        Some(text)
    }
}

fn announcement_lines(submission: &TweetSubmission) -> String {
    format!(
        "**@{}** submitted a new **{}** tweet!\n{}\n\nEngage to earn: ❤️ {} | 🔁 {} | 💬 {} points",
        submission.author_handle,
        submission.category,
        submission.url,
        potential_points(LIKE_POINTS, submission.bonus_multiplier),
        potential_points(REPOST_POINTS, submission.bonus_multiplier),
        potential_points(REPLY_POINTS, submission.bonus_multiplier),
    )
}

async fn announce_with_button(
    ctx: &Context,
    channel: ChannelId,
    submission: &TweetSubmission,
) -> Result<(), anyhow::Error> {
    channel
        .send_message(&ctx.http, |m| {
            m.embed(|e| {
                e.title("New engagement tweet");
                e.description(announcement_lines(submission));
                e.field("Tier", submission.tier.as_str(), true);
                e.field("Multiplier", format!("x{}", submission.bonus_multiplier), true);
                if let Some(content) = &submission.content {
                    e.field("Preview", content, false);
                }
                e.color(serenity::utils::Color::BLITZ_BLUE)
            });
            m.components(|c| {
                c.create_action_row(|r| {
                    r.create_button(|b| {
                        b.style(ButtonStyle::Link);
                        b.label("View Tweet");
                        b.url(&submission.url)
                    })
                })
            })
        })
        .await?;
    Ok(())
}

async fn announce_plain_embed(
    ctx: &Context,
    channel: ChannelId,
    submission: &TweetSubmission,
) -> Result<(), anyhow::Error> {
    channel
        .send_message(&ctx.http, |m| {
            m.embed(|e| {
                e.title("New engagement tweet");
                e.description(announcement_lines(submission));
                e.color(serenity::utils::Color::BLITZ_BLUE)
            })
        })
        .await?;
    Ok(())
}

async fn announce_text(
    ctx: &Context,
    channel: ChannelId,
    submission: &TweetSubmission,
) -> Result<(), anyhow::Error> {
    channel
        .send_message(&ctx.http, |m| m.content(announcement_lines(submission)))
        .await?;
    Ok(())
}

/// Post the announcement to the engagement channel, degrading through the
/// renderer chain: full embed with link button, then embed only, then plain
/// text. The submission is already persisted, so the final failure is only
/// logged.
pub async fn announce_submission(ctx: &Context, submission: &TweetSubmission) {
    let channel = match std::env::var("ENGAGEMENT_CHANNEL_ID")
        .ok()
        .and_then(|id| id.parse::<u64>().ok())
    {
        Some(id) => ChannelId(id),
        None => {
            error!("ENGAGEMENT_CHANNEL_ID missing or invalid, skipping announcement");
            return;
        }
    };

    if let Err(e) = announce_with_button(ctx, channel, submission).await {
        warn!("Announcement with button failed, retrying without: {}", e);
        if let Err(e) = announce_plain_embed(ctx, channel, submission).await {
            warn!("Announcement embed failed, retrying as text: {}", e);
            if let Err(e) = announce_text(ctx, channel, submission).await {
                error!("All announcement formats failed: {}", e);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Role;
    use crate::scenarios::default_scenario;

    fn connection(handle: &str) -> Connection {
        Connection {
            discord_id: "1".to_string(),
            twitter_handle: handle.to_string(),
            tier: Tier::Micro,
            connected_at: Utc::now(),
            total_points: 0,
            role: Role::Kol,
        }
    }

    fn facts<'a>(connection: Option<&'a Connection>) -> SubmissionFacts<'a> {
        SubmissionFacts {
            parsed: parse_tweet_url("https://x.com/alice/status/123"),
            connection,
            approved: true,
            today: 0,
            duplicate: false,
            is_admin: false,
            category: None,
        }
    }

    #[test]
    fn gate_accepts_a_clean_attempt() {
        let conn = connection("alice");
        let scenario = default_scenario(Tier::Micro);
        let (parsed, category) = evaluate_submission(&facts(Some(&conn)), &scenario).unwrap();
        assert_eq!(parsed.tweet_id, "123");
        assert_eq!(category, "General");
    }

    #[test]
    fn first_failing_check_wins() {
        let conn = connection("alice");
        let scenario = default_scenario(Tier::Micro);

        // Invalid URL outranks everything else that is also wrong.
        let mut f = facts(None);
        f.parsed = None;
        f.approved = false;
        f.duplicate = true;
        assert_eq!(evaluate_submission(&f, &scenario), Err(Rejection::InvalidUrl));

        // No connection before the approval check.
        let mut f = facts(None);
        f.approved = false;
        f.duplicate = true;
        assert_eq!(evaluate_submission(&f, &scenario), Err(Rejection::NotConnected));

        // Approval before the quota.
        let mut f = facts(Some(&conn));
        f.approved = false;
        f.today = scenario.daily_tweet_limit;
        assert_eq!(evaluate_submission(&f, &scenario), Err(Rejection::NotApproved));

        // Quota before the dedupe index.
        let mut f = facts(Some(&conn));
        f.today = scenario.daily_tweet_limit;
        f.duplicate = true;
        assert_eq!(
            evaluate_submission(&f, &scenario),
            Err(Rejection::DailyLimitReached(scenario.daily_tweet_limit))
        );

        // Dedupe before the author check.
        let stranger = connection("mallory");
        let mut f = facts(Some(&stranger));
        f.duplicate = true;
        assert_eq!(evaluate_submission(&f, &scenario), Err(Rejection::Duplicate));

        // Author check before the category check.
        let mut f = facts(Some(&stranger));
        f.category = Some("Spaces");
        assert_eq!(evaluate_submission(&f, &scenario), Err(Rejection::NotOwnTweet));
    }

    #[test]
    fn quota_boundary() {
        let conn = connection("alice");
        let scenario = default_scenario(Tier::Micro);

        // The limit-th submission of the day still passes...
        let mut f = facts(Some(&conn));
        f.today = scenario.daily_tweet_limit - 1;
        assert!(evaluate_submission(&f, &scenario).is_ok());

        // ...the one after it is turned away.
        f.today = scenario.daily_tweet_limit;
        assert_eq!(
            evaluate_submission(&f, &scenario),
            Err(Rejection::DailyLimitReached(scenario.daily_tweet_limit))
        );
    }

    #[test]
    fn admins_may_submit_foreign_tweets() {
        let stranger = connection("mallory");
        let scenario = default_scenario(Tier::Micro);
        let mut f = facts(Some(&stranger));
        f.is_admin = true;
        assert!(evaluate_submission(&f, &scenario).is_ok());
    }

    #[test]
    fn parses_twitter_and_x_status_urls() {
        let parsed = parse_tweet_url("https://x.com/alice/status/123").unwrap();
        assert_eq!(parsed.author_handle, "alice");
        assert_eq!(parsed.tweet_id, "123");

        let parsed = parse_tweet_url("https://twitter.com/Bob_99/status/456?s=20").unwrap();
        assert_eq!(parsed.author_handle, "bob_99");
        assert_eq!(parsed.tweet_id, "456");

        let parsed = parse_tweet_url("http://www.x.com/c/status/7").unwrap();
        assert_eq!(parsed.tweet_id, "7");
    }

    #[test]
    fn rejects_non_status_urls() {
        assert!(parse_tweet_url("https://example.com/alice/status/123").is_none());
        assert!(parse_tweet_url("https://x.com/alice").is_none());
        assert!(parse_tweet_url("https://x.com/alice/status/abc").is_none());
        assert!(parse_tweet_url("not a url").is_none());
    }

    #[test]
    fn potential_points_floor() {
        assert_eq!(potential_points(LIKE_POINTS, 1.0), 10);
        assert_eq!(potential_points(LIKE_POINTS, 1.2), 12);
        assert_eq!(potential_points(REPLY_POINTS, 1.5), 45);
        // 20 * 1.15 = 22.999... floors to 22
        assert_eq!(potential_points(REPOST_POINTS, 1.15), 22);
    }

    #[test]
    fn missing_category_defaults_to_general() {
        let scenario = default_scenario(Tier::Micro);
        assert_eq!(resolve_category(&scenario, None).unwrap(), "General");
        assert_eq!(resolve_category(&scenario, Some("  ")).unwrap(), "General");
    }

    #[test]
    fn category_matching_is_case_insensitive_and_canonical() {
        let scenario = default_scenario(Tier::Star);
        assert_eq!(resolve_category(&scenario, Some("meme")).unwrap(), "Meme");
        assert_eq!(resolve_category(&scenario, Some("THREAD")).unwrap(), "Thread");
    }

    #[test]
    fn disallowed_category_is_rejected_with_allowed_set() {
        let scenario = default_scenario(Tier::Micro);
        match resolve_category(&scenario, Some("Spaces")) {
            Err(Rejection::InvalidCategory(allowed)) => {
                assert_eq!(allowed, scenario.categories)
            }
            other => panic!("Expected InvalidCategory, got {:?}", other),
        }
    }

    #[test]
    fn oembed_query_is_percent_encoded() {
        let url = oembed_url("https://x.com/alice/status/123?s=20&t=x y");
        assert_eq!(url.host_str(), Some("publish.twitter.com"));
        let query = url.query().unwrap();
        assert!(query.contains("omit_script=1"));
        assert!(query.contains("url=https%3A%2F%2Fx.com%2Falice%2Fstatus%2F123%3Fs%3D20%26t%3Dx+y"));
    }

    #[test]
    fn rejection_messages_are_user_facing() {
        for rejection in [
            Rejection::InvalidUrl,
            Rejection::NotConnected,
            Rejection::NotApproved,
            Rejection::DailyLimitReached(5),
            Rejection::Duplicate,
            Rejection::NotOwnTweet,
            Rejection::InvalidCategory(vec!["General".to_string()]),
        ] {
            assert!(rejection.user_message().starts_with('❌'));
        }
        assert!(Rejection::DailyLimitReached(5).user_message().contains('5'));
    }
}
