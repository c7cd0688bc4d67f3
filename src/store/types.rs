use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

/// Side of a debate an argument argues for.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum Side {
    Support,
    Oppose,
}

impl Side {
    pub fn as_str(self) -> &'static str {
        match self {
            Side::Support => "Support",
            Side::Oppose => "Oppose",
        }
    }

    pub fn opposite(self) -> Side {
        match self {
            Side::Support => Side::Oppose,
            Side::Oppose => Side::Support,
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Side {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Support" => Ok(Side::Support),
            "Oppose" => Ok(Side::Oppose),
            other => Err(format!("unknown side {other:?}")),
        }
    }
}

/// User record.
#[derive(Debug, Clone, Serialize)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub name: String,
    pub image: Option<String>,
    #[serde(skip_serializing)]
    pub password_hash: Option<String>, // Argon2 hash, absent for federated accounts
    pub provider: Option<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

impl User {
    pub fn profile(&self) -> UserProfile {
        UserProfile {
            name: self.name.clone(),
            email: self.email.clone(),
            image: self.image.clone(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct NewUser {
    pub email: String,
    pub name: String,
    pub image: Option<String>,
    pub password_hash: Option<String>,
    pub provider: Option<String>,
    pub created_at: OffsetDateTime,
}

/// Public part of a user shown next to arguments and on scoreboards.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct UserProfile {
    pub name: String,
    pub email: String,
    pub image: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Debate {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub category: String,
    pub tags: Vec<String>,
    pub duration: i32, // hours
    pub author_email: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub ends_at: OffsetDateTime,
}

#[derive(Debug, Clone)]
pub struct NewDebate {
    pub title: String,
    pub description: String,
    pub category: String,
    pub tags: Vec<String>,
    pub duration: i32,
    pub author_email: String,
    pub created_at: OffsetDateTime,
    pub ends_at: OffsetDateTime,
}

/// Debate row joined with its author and the total votes its arguments received.
#[derive(Debug, Clone)]
pub struct DebateListing {
    pub debate: Debate,
    pub author: UserProfile,
    pub vote_count: i64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Argument {
    pub id: Uuid,
    pub debate_id: Uuid,
    pub user_email: String,
    pub side: Side,
    pub content: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

impl Argument {
    /// Empty content marks a join-only row.
    pub fn is_placeholder(&self) -> bool {
        self.content.trim().is_empty()
    }
}

#[derive(Debug, Clone)]
pub struct NewArgument {
    pub debate_id: Uuid,
    pub user_email: String,
    pub side: Side,
    pub content: String,
    pub created_at: OffsetDateTime,
}

/// Argument joined with its author and vote count.
#[derive(Debug, Clone)]
pub struct ArgumentWithVotes {
    pub argument: Argument,
    pub author: UserProfile,
    pub vote_count: i64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Vote {
    pub id: Uuid,
    pub argument_id: Uuid,
    pub user_email: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

#[derive(Debug, Clone)]
pub struct NewVote {
    pub argument_id: Uuid,
    pub user_email: String,
    pub created_at: OffsetDateTime,
}

/// One user with the arguments they authored inside a scoreboard window.
#[derive(Debug, Clone)]
pub struct UserActivity {
    pub user: UserProfile,
    pub arguments: Vec<ArgumentScore>,
}

#[derive(Debug, Clone, Copy)]
pub struct ArgumentScore {
    pub debate_id: Uuid,
    pub vote_count: i64,
}

#[derive(Debug, Clone, Default)]
pub struct DebateFilter {
    pub search_term: Option<String>,
    /// Only debates still open at this instant.
    pub running_at: Option<OffsetDateTime>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
pub enum DebateSort {
    #[default]
    #[serde(rename = "newest")]
    Newest,
    #[serde(rename = "mostVoted")]
    MostVoted,
    #[serde(rename = "endingSoon")]
    EndingSoon,
}
