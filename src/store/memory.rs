//! In-process gateway for tests. Enforces the same unique keys as the schema.

use std::sync::Mutex;

use async_trait::async_trait;
use time::OffsetDateTime;
use uuid::Uuid;

use super::types::{
    Argument, ArgumentScore, ArgumentWithVotes, Debate, DebateFilter, DebateListing, DebateSort,
    NewArgument, NewDebate, NewUser, NewVote, User, UserActivity, UserProfile, Vote,
};
use super::{DebateStore, StoreResult, StoreError, UniqueKey};

#[derive(Default)]
struct Tables {
    users: Vec<User>,
    debates: Vec<Debate>,
    arguments: Vec<Argument>,
    votes: Vec<Vote>,
}

impl Tables {
    fn profile(&self, email: &str) -> UserProfile {
        self.users
            .iter()
            .find(|u| u.email == email)
            .map(User::profile)
            .unwrap_or_else(|| UserProfile {
                name: String::new(),
                email: email.to_string(),
                image: None,
            })
    }

    fn votes_for(&self, argument_id: Uuid) -> i64 {
        self.votes.iter().filter(|v| v.argument_id == argument_id).count() as i64
    }
}

#[derive(Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Tables> {
        self.tables.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Number of argument rows, placeholders included.
    pub fn argument_count(&self) -> usize {
        self.lock().arguments.len()
    }

    pub fn vote_count(&self) -> usize {
        self.lock().votes.len()
    }

    /// Rewrites an argument's timestamp; lets tests place rows in the past.
    pub fn backdate_argument(&self, id: Uuid, created_at: OffsetDateTime) {
        if let Some(arg) = self.lock().arguments.iter_mut().find(|a| a.id == id) {
            arg.created_at = created_at;
        }
    }
}

fn matches_search(debate: &Debate, term: &str) -> bool {
    let needle = term.to_lowercase();
    debate.title.to_lowercase().contains(&needle)
        || debate.category.to_lowercase().contains(&needle)
        || debate.tags.iter().any(|t| t == term)
}

#[async_trait]
impl DebateStore for MemoryStore {
    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        Ok(self.lock().users.iter().find(|u| u.email == email).cloned())
    }

    async fn find_user_by_id(&self, id: Uuid) -> StoreResult<Option<User>> {
        Ok(self.lock().users.iter().find(|u| u.id == id).cloned())
    }

    async fn create_user(&self, user: NewUser) -> StoreResult<User> {
        let mut t = self.lock();
        if t.users.iter().any(|u| u.email == user.email) {
            return Err(StoreError::Conflict(UniqueKey::UserEmail));
        }
        let row = User {
            id: Uuid::new_v4(),
            email: user.email,
            name: user.name,
            image: user.image,
            password_hash: user.password_hash,
            provider: user.provider,
            created_at: user.created_at,
        };
        t.users.push(row.clone());
        Ok(row)
    }

    async fn create_debate(&self, debate: NewDebate) -> StoreResult<Debate> {
        let row = Debate {
            id: Uuid::new_v4(),
            title: debate.title,
            description: debate.description,
            category: debate.category,
            tags: debate.tags,
            duration: debate.duration,
            author_email: debate.author_email,
            created_at: debate.created_at,
            ends_at: debate.ends_at,
        };
        self.lock().debates.push(row.clone());
        Ok(row)
    }

    async fn find_debate_by_id(&self, id: Uuid) -> StoreResult<Option<Debate>> {
        Ok(self.lock().debates.iter().find(|d| d.id == id).cloned())
    }

    async fn list_debates(
        &self,
        filter: &DebateFilter,
        sort: DebateSort,
    ) -> StoreResult<Vec<DebateListing>> {
        let t = self.lock();
        let mut rows: Vec<DebateListing> = t
            .debates
            .iter()
            .filter(|d| {
                filter
                    .search_term
                    .as_deref()
                    .map_or(true, |term| matches_search(d, term))
            })
            .filter(|d| filter.running_at.map_or(true, |at| d.ends_at > at))
            .map(|d| DebateListing {
                debate: d.clone(),
                author: t.profile(&d.author_email),
                vote_count: t
                    .arguments
                    .iter()
                    .filter(|a| a.debate_id == d.id)
                    .map(|a| t.votes_for(a.id))
                    .sum(),
            })
            .collect();
        match sort {
            DebateSort::Newest => rows.sort_by(|a, b| b.debate.created_at.cmp(&a.debate.created_at)),
            DebateSort::MostVoted => rows.sort_by(|a, b| {
                b.vote_count
                    .cmp(&a.vote_count)
                    .then(b.debate.created_at.cmp(&a.debate.created_at))
            }),
            DebateSort::EndingSoon => rows.sort_by(|a, b| a.debate.ends_at.cmp(&b.debate.ends_at)),
        }
        Ok(rows)
    }

    async fn create_argument(&self, argument: NewArgument) -> StoreResult<Argument> {
        let mut t = self.lock();
        let taken = t
            .arguments
            .iter()
            .any(|a| a.user_email == argument.user_email && a.debate_id == argument.debate_id);
        if taken {
            return Err(StoreError::Conflict(UniqueKey::ArgumentPerDebate));
        }
        let row = Argument {
            id: Uuid::new_v4(),
            debate_id: argument.debate_id,
            user_email: argument.user_email,
            side: argument.side,
            content: argument.content,
            created_at: argument.created_at,
        };
        t.arguments.push(row.clone());
        Ok(row)
    }

    async fn find_argument_by_id(&self, id: Uuid) -> StoreResult<Option<Argument>> {
        Ok(self.lock().arguments.iter().find(|a| a.id == id).cloned())
    }

    async fn find_argument_by_user_and_debate(
        &self,
        user_email: &str,
        debate_id: Uuid,
    ) -> StoreResult<Option<Argument>> {
        Ok(self
            .lock()
            .arguments
            .iter()
            .find(|a| a.user_email == user_email && a.debate_id == debate_id)
            .cloned())
    }

    async fn list_arguments_by_debate(
        &self,
        debate_id: Uuid,
    ) -> StoreResult<Vec<ArgumentWithVotes>> {
        let t = self.lock();
        let mut rows: Vec<ArgumentWithVotes> = t
            .arguments
            .iter()
            .filter(|a| a.debate_id == debate_id)
            .map(|a| ArgumentWithVotes {
                argument: a.clone(),
                author: t.profile(&a.user_email),
                vote_count: t.votes_for(a.id),
            })
            .collect();
        rows.sort_by(|a, b| b.argument.created_at.cmp(&a.argument.created_at));
        Ok(rows)
    }

    async fn update_argument_content(
        &self,
        id: Uuid,
        content: &str,
    ) -> StoreResult<Option<Argument>> {
        let mut t = self.lock();
        Ok(t.arguments.iter_mut().find(|a| a.id == id).map(|a| {
            a.content = content.to_string();
            a.clone()
        }))
    }

    async fn fill_placeholder(
        &self,
        id: Uuid,
        content: &str,
        posted_at: OffsetDateTime,
    ) -> StoreResult<Option<Argument>> {
        let mut t = self.lock();
        Ok(t
            .arguments
            .iter_mut()
            .find(|a| a.id == id && a.is_placeholder())
            .map(|a| {
                a.content = content.to_string();
                a.created_at = posted_at;
                a.clone()
            }))
    }

    async fn create_vote(&self, vote: NewVote) -> StoreResult<Vote> {
        let mut t = self.lock();
        let taken = t
            .votes
            .iter()
            .any(|v| v.user_email == vote.user_email && v.argument_id == vote.argument_id);
        if taken {
            return Err(StoreError::Conflict(UniqueKey::VotePerArgument));
        }
        let row = Vote {
            id: Uuid::new_v4(),
            argument_id: vote.argument_id,
            user_email: vote.user_email,
            created_at: vote.created_at,
        };
        t.votes.push(row.clone());
        Ok(row)
    }

    async fn find_vote_by_user_and_argument(
        &self,
        user_email: &str,
        argument_id: Uuid,
    ) -> StoreResult<Option<Vote>> {
        Ok(self
            .lock()
            .votes
            .iter()
            .find(|v| v.user_email == user_email && v.argument_id == argument_id)
            .cloned())
    }

    async fn list_user_activity(
        &self,
        since: Option<OffsetDateTime>,
    ) -> StoreResult<Vec<UserActivity>> {
        let t = self.lock();
        let mut users: Vec<&User> = t.users.iter().collect();
        users.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(users
            .into_iter()
            .map(|u| UserActivity {
                user: u.profile(),
                arguments: t
                    .arguments
                    .iter()
                    .filter(|a| a.user_email == u.email)
                    .filter(|a| since.map_or(true, |s| a.created_at >= s))
                    .map(|a| ArgumentScore {
                        debate_id: a.debate_id,
                        vote_count: t.votes_for(a.id),
                    })
                    .collect(),
            })
            .collect())
    }
}
