use crate::database::Database;
use crate::models::{Connection, TierScenario};
use crate::scenarios;

/// Cap on the connection scan backing the leaderboard. Anything past this
/// needs a maintained points index rather than a KEYS walk.
pub const SCAN_CAP: usize = 50;
pub const TOP_COUNT: usize = 10;

pub fn rank_connections(mut connections: Vec<Connection>) -> Vec<Connection> {
    connections.sort_by(|a, b| b.total_points.cmp(&a.total_points));
    connections.truncate(TOP_COUNT);
    connections
}

/// Top connections by accumulated points, highest first.
pub async fn top_connections(db: &Database) -> Result<Vec<Connection>, anyhow::Error> {
    let connections = db.all_connections(SCAN_CAP).await?;
    Ok(rank_connections(connections))
}

/// One user's stats view for `/stats`.
pub struct UserStats {
    pub connection: Connection,
    pub scenario: TierScenario,
    pub today: u32,
}

pub async fn user_stats(
    db: &Database,
    connection: Connection,
) -> Result<UserStats, anyhow::Error> {
    let scenario = scenarios::get_scenarios(db, connection.tier).await;
    let today = db.daily_submission_count(&connection.discord_id).await?;
    Ok(UserStats {
        connection,
        scenario,
        today,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Role, Tier};
    use chrono::Utc;

    fn connection(handle: &str, points: u64) -> Connection {
        Connection {
            discord_id: handle.to_string(),
            twitter_handle: handle.to_string(),
            tier: Tier::Micro,
            connected_at: Utc::now(),
            total_points: points,
            role: Role::Kol,
        }
    }

    #[test]
    fn ranks_by_points_descending() {
        let ranked = rank_connections(vec![
            connection("a", 50),
            connection("b", 200),
            connection("c", 10),
        ]);
        let handles: Vec<_> = ranked.iter().map(|c| c.twitter_handle.as_str()).collect();
        assert_eq!(handles, vec!["b", "a", "c"]);
        assert_eq!(ranked[0].total_points, 200);
    }

    #[test]
    fn truncates_to_top_ten() {
        let connections = (0..25)
            .map(|i| connection(&format!("u{}", i), i as u64))
            .collect();
        let ranked = rank_connections(connections);
        assert_eq!(ranked.len(), TOP_COUNT);
        assert_eq!(ranked[0].total_points, 24);
        assert_eq!(ranked[9].total_points, 15);
    }
}
