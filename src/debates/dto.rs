use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use super::{
    lifecycle::DebateStatus,
    scoring::{DebateScore, Outcome, ScoreWindow},
};
use crate::{
    extract::Validate,
    store::types::{ArgumentWithVotes, DebateSort, Side, UserProfile},
};

const MAX_PAGE_LIMIT: usize = 100;

fn require(field: &str, value: &str) -> Result<(), String> {
    if value.trim().is_empty() {
        return Err(format!("{field} is required"));
    }
    Ok(())
}

// ---- requests ----

#[derive(Debug, Deserialize)]
pub struct CreateDebateRequest {
    pub title: String,
    pub description: String,
    pub category: String,
    #[serde(default)]
    pub tags: Vec<String>,
    pub duration: i32, // hours
}

impl Validate for CreateDebateRequest {
    fn validate(&self) -> Result<(), String> {
        require("title", &self.title)?;
        require("description", &self.description)?;
        require("category", &self.category)?;
        if self.duration < 1 {
            return Err("duration must be at least 1 hour".into());
        }
        Ok(())
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JoinDebateRequest {
    pub debate_id: Uuid,
    pub side: Side,
}

impl Validate for JoinDebateRequest {
    fn validate(&self) -> Result<(), String> {
        Ok(())
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostArgumentRequest {
    pub debate_id: Uuid,
    pub content: String,
    pub side: Side,
}

impl Validate for PostArgumentRequest {
    fn validate(&self) -> Result<(), String> {
        require("content", &self.content)
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EditArgumentRequest {
    pub argument_id: Uuid,
    pub content: String,
}

impl Validate for EditArgumentRequest {
    fn validate(&self) -> Result<(), String> {
        require("content", &self.content)
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VoteRequest {
    pub argument_id: Uuid,
}

impl Validate for VoteRequest {
    fn validate(&self) -> Result<(), String> {
        Ok(())
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListDebatesQuery {
    pub search_term: Option<String>,
    #[serde(default)]
    pub sort_by: DebateSort,
}

impl Validate for ListDebatesQuery {
    fn validate(&self) -> Result<(), String> {
        Ok(())
    }
}

#[derive(Debug, Deserialize)]
pub struct ScoreboardQuery {
    #[serde(default)]
    pub filter: ScoreWindow,
    #[serde(default = "default_page")]
    pub page: usize,
    #[serde(default = "default_limit")]
    pub limit: usize,
}
fn default_page() -> usize { 1 }
fn default_limit() -> usize { 10 }

impl Validate for ScoreboardQuery {
    fn validate(&self) -> Result<(), String> {
        if self.page < 1 {
            return Err("page must be at least 1".into());
        }
        if !(1..=MAX_PAGE_LIMIT).contains(&self.limit) {
            return Err(format!("limit must be between 1 and {MAX_PAGE_LIMIT}"));
        }
        Ok(())
    }
}

// ---- responses ----

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DebateListItem {
    pub id: Uuid,
    pub title: String,
    pub author_name: String,
    pub author_email: String,
    pub author_image: Option<String>,
    pub category: String,
    pub duration: i32,
    pub tags: Vec<String>,
    pub vote_count: i64,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub ends_at: OffsetDateTime,
    pub status: DebateStatus,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ArgumentView {
    pub id: Uuid,
    pub content: String,
    pub side: Side,
    pub vote_count: i64,
    pub user: UserProfile,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

impl From<&ArgumentWithVotes> for ArgumentView {
    fn from(row: &ArgumentWithVotes) -> Self {
        Self {
            id: row.argument.id,
            content: row.argument.content.clone(),
            side: row.argument.side,
            vote_count: row.vote_count,
            user: row.author.clone(),
            created_at: row.argument.created_at,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DebateDetails {
    pub debate_id: Uuid,
    pub title: String,
    #[serde(with = "time::serde::rfc3339")]
    pub ends_at: OffsetDateTime,
    pub i_participated: bool,
    pub my_side: Option<Side>,
    pub debate_status: &'static str,
    pub arguments: Vec<ArgumentView>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub winner_side: Option<Outcome>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub score_board: Option<Vec<DebateScore>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_request_requires_fields_and_positive_duration() {
        let mut req = CreateDebateRequest {
            title: "Tabs or spaces".into(),
            description: "Settle it.".into(),
            category: "Tech".into(),
            tags: vec![],
            duration: 1,
        };
        assert!(req.validate().is_ok());
        req.duration = 0;
        assert!(req.validate().is_err());
        req.duration = 2;
        req.title = "   ".into();
        assert_eq!(req.validate().unwrap_err(), "title is required");
    }

    #[test]
    fn side_must_be_a_known_value() {
        let ok: Result<JoinDebateRequest, _> = serde_json::from_str(
            r#"{"debateId":"00000000-0000-0000-0000-000000000001","side":"Oppose"}"#,
        );
        assert_eq!(ok.unwrap().side, Side::Oppose);
        let bad: Result<JoinDebateRequest, _> = serde_json::from_str(
            r#"{"debateId":"00000000-0000-0000-0000-000000000001","side":"Neutral"}"#,
        );
        assert!(bad.is_err());
    }

    #[test]
    fn blank_argument_content_is_rejected() {
        let req = PostArgumentRequest {
            debate_id: Uuid::nil(),
            content: " \n ".into(),
            side: Side::Support,
        };
        assert!(req.validate().is_err());
    }

    #[test]
    fn scoreboard_query_defaults_and_bounds() {
        let q: ScoreboardQuery = serde_json::from_str("{}").unwrap();
        assert_eq!(q.filter, ScoreWindow::AllTime);
        assert_eq!((q.page, q.limit), (1, 10));
        assert!(q.validate().is_ok());

        let q = ScoreboardQuery { filter: ScoreWindow::Weekly, page: 0, limit: 10 };
        assert!(q.validate().is_err());
        let q = ScoreboardQuery { filter: ScoreWindow::Weekly, page: 1, limit: 101 };
        assert!(q.validate().is_err());
    }

    #[test]
    fn details_omit_closing_fields_while_running() {
        let details = DebateDetails {
            debate_id: Uuid::nil(),
            title: "t".into(),
            ends_at: OffsetDateTime::UNIX_EPOCH,
            i_participated: false,
            my_side: None,
            debate_status: "running",
            arguments: vec![],
            winner_side: None,
            score_board: None,
        };
        let json = serde_json::to_value(&details).unwrap();
        assert_eq!(json["debateStatus"], "running");
        assert_eq!(json["iParticipated"], false);
        assert!(json.get("winnerSide").is_none());
        assert!(json.get("scoreBoard").is_none());
    }
}
