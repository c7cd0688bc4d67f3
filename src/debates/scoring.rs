//! Vote tallies, winner resolution and scoreboards.

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};
use time::{Duration, OffsetDateTime};

use crate::store::types::{ArgumentWithVotes, Side, UserActivity};

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
pub enum Outcome {
    Support,
    Oppose,
    Draw,
}

/// Sums votes per side over every argument given, placeholders included.
/// Equal totals, 0-0 included, are a draw.
pub fn winner_side<I>(tallies: I) -> Outcome
where
    I: IntoIterator<Item = (Side, i64)>,
{
    let (support, oppose) = tallies
        .into_iter()
        .fold((0i64, 0i64), |(s, o), (side, votes)| match side {
            Side::Support => (s + votes, o),
            Side::Oppose => (s, o + votes),
        });
    match support.cmp(&oppose) {
        std::cmp::Ordering::Greater => Outcome::Support,
        std::cmp::Ordering::Less => Outcome::Oppose,
        std::cmp::Ordering::Equal => Outcome::Draw,
    }
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct DebateScore {
    pub name: String,
    pub email: String,
    pub image: Option<String>,
    pub total_votes: i64,
    pub side: Side,
}

/// Per-debate ranking of authors by votes received on non-empty arguments.
/// Authors keep the order of their first argument in `arguments` when tied.
pub fn debate_scoreboard(arguments: &[ArgumentWithVotes]) -> Vec<DebateScore> {
    let mut index: HashMap<&str, usize> = HashMap::new();
    let mut board: Vec<DebateScore> = Vec::new();
    for row in arguments.iter().filter(|r| !r.argument.is_placeholder()) {
        let email = row.author.email.as_str();
        match index.get(email) {
            Some(&i) => board[i].total_votes += row.vote_count,
            None => {
                index.insert(email, board.len());
                board.push(DebateScore {
                    name: row.author.name.clone(),
                    email: row.author.email.clone(),
                    image: row.author.image.clone(),
                    total_votes: row.vote_count,
                    side: row.argument.side,
                });
            }
        }
    }
    // sort_by is stable, ties keep input order
    board.sort_by(|a, b| b.total_votes.cmp(&a.total_votes));
    board
}

/// Trailing window a global scoreboard counts arguments in.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ScoreWindow {
    Weekly,
    Monthly,
    #[default]
    AllTime,
}

impl ScoreWindow {
    pub fn since(self, now: OffsetDateTime) -> Option<OffsetDateTime> {
        match self {
            ScoreWindow::Weekly => Some(now - Duration::days(7)),
            ScoreWindow::Monthly => Some(now - Duration::days(30)),
            ScoreWindow::AllTime => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct RankedUser {
    pub position: usize,
    pub name: String,
    pub email: String,
    pub image: Option<String>,
    pub total_votes: i64,
    pub debates_participated: usize,
}

/// Ranks users by votes received. Users without any argument in the window
/// are left out; positions run 1..=n with no gaps.
pub fn rank_users(activity: Vec<UserActivity>) -> Vec<RankedUser> {
    let mut ranked: Vec<RankedUser> = activity
        .into_iter()
        .map(|a| {
            let total_votes = a.arguments.iter().map(|s| s.vote_count).sum();
            let debates: HashSet<_> = a.arguments.iter().map(|s| s.debate_id).collect();
            RankedUser {
                position: 0,
                name: a.user.name,
                email: a.user.email,
                image: a.user.image,
                total_votes,
                debates_participated: debates.len(),
            }
        })
        .filter(|u| u.debates_participated > 0)
        .collect();
    ranked.sort_by(|a, b| b.total_votes.cmp(&a.total_votes));
    for (i, user) in ranked.iter_mut().enumerate() {
        user.position = i + 1;
    }
    ranked
}

/// Slice for 1-based `page` of size `limit`, plus the total before slicing.
pub fn paginate<T>(items: Vec<T>, page: usize, limit: usize) -> (Vec<T>, usize) {
    let total = items.len();
    let start = page.saturating_sub(1).saturating_mul(limit);
    let slice = items.into_iter().skip(start).take(limit).collect();
    (slice, total)
}
