//! Persistence gateway consumed by the debate service.
//!
//! Every call is assumed to be atomic on its own. Uniqueness of users by
//! email, of arguments per (user, debate) and of votes per (user, argument)
//! is enforced by the backing store and surfaced as [`StoreError::Conflict`].

use async_trait::async_trait;
use time::OffsetDateTime;
use uuid::Uuid;

#[cfg(test)]
pub mod memory;
pub mod postgres;
pub mod types;

use types::{
    Argument, ArgumentWithVotes, Debate, DebateFilter, DebateListing, DebateSort, NewArgument,
    NewDebate, NewUser, NewVote, User, UserActivity, Vote,
};

/// Unique key a write collided with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UniqueKey {
    UserEmail,
    ArgumentPerDebate,
    VotePerArgument,
}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("unique constraint violated: {0:?}")]
    Conflict(UniqueKey),
    #[error(transparent)]
    Backend(#[from] anyhow::Error),
}

pub type StoreResult<T> = Result<T, StoreError>;

#[async_trait]
pub trait DebateStore: Send + Sync {
    // --- users ---
    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>>;
    async fn find_user_by_id(&self, id: Uuid) -> StoreResult<Option<User>>;
    async fn create_user(&self, user: NewUser) -> StoreResult<User>;

    // --- debates ---
    async fn create_debate(&self, debate: NewDebate) -> StoreResult<Debate>;
    async fn find_debate_by_id(&self, id: Uuid) -> StoreResult<Option<Debate>>;
    async fn list_debates(
        &self,
        filter: &DebateFilter,
        sort: DebateSort,
    ) -> StoreResult<Vec<DebateListing>>;

    // --- arguments ---
    async fn create_argument(&self, argument: NewArgument) -> StoreResult<Argument>;
    async fn find_argument_by_id(&self, id: Uuid) -> StoreResult<Option<Argument>>;
    async fn find_argument_by_user_and_debate(
        &self,
        user_email: &str,
        debate_id: Uuid,
    ) -> StoreResult<Option<Argument>>;
    /// All arguments of a debate, placeholders included, newest first.
    async fn list_arguments_by_debate(&self, debate_id: Uuid)
        -> StoreResult<Vec<ArgumentWithVotes>>;
    async fn update_argument_content(&self, id: Uuid, content: &str)
        -> StoreResult<Option<Argument>>;
    /// Writes content into a join-only row and stamps its posting time.
    /// Returns `None` when the row no longer is a placeholder.
    async fn fill_placeholder(
        &self,
        id: Uuid,
        content: &str,
        posted_at: OffsetDateTime,
    ) -> StoreResult<Option<Argument>>;

    // --- votes ---
    async fn create_vote(&self, vote: NewVote) -> StoreResult<Vote>;
    async fn find_vote_by_user_and_argument(
        &self,
        user_email: &str,
        argument_id: Uuid,
    ) -> StoreResult<Option<Vote>>;

    // --- scoreboard ---
    /// Every user in registration order with the arguments they created at or
    /// after `since` (all of them when `None`).
    async fn list_user_activity(
        &self,
        since: Option<OffsetDateTime>,
    ) -> StoreResult<Vec<UserActivity>>;
}
