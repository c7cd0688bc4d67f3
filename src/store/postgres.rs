use anyhow::Context;
use async_trait::async_trait;
use sqlx::{FromRow, PgPool};
use time::OffsetDateTime;
use uuid::Uuid;

use super::types::{
    Argument, ArgumentScore, ArgumentWithVotes, Debate, DebateFilter, DebateListing, DebateSort,
    NewArgument, NewDebate, NewUser, NewVote, User, UserActivity, UserProfile, Vote,
};
use super::{DebateStore, StoreError, StoreResult, UniqueKey};

/// Postgres implementation of the gateway.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

// ---- rows ----

#[derive(FromRow)]
struct UserRecord {
    id: Uuid,
    email: String,
    name: String,
    image: Option<String>,
    password_hash: Option<String>,
    provider: Option<String>,
    created_at: OffsetDateTime,
}

impl From<UserRecord> for User {
    fn from(r: UserRecord) -> Self {
        Self {
            id: r.id,
            email: r.email,
            name: r.name,
            image: r.image,
            password_hash: r.password_hash,
            provider: r.provider,
            created_at: r.created_at,
        }
    }
}

#[derive(FromRow)]
struct DebateRecord {
    id: Uuid,
    title: String,
    description: String,
    category: String,
    tags: Vec<String>,
    duration: i32,
    author_email: String,
    created_at: OffsetDateTime,
    ends_at: OffsetDateTime,
}

impl From<DebateRecord> for Debate {
    fn from(r: DebateRecord) -> Self {
        Self {
            id: r.id,
            title: r.title,
            description: r.description,
            category: r.category,
            tags: r.tags,
            duration: r.duration,
            author_email: r.author_email,
            created_at: r.created_at,
            ends_at: r.ends_at,
        }
    }
}

#[derive(FromRow)]
struct DebateListingRecord {
    #[sqlx(flatten)]
    debate: DebateRecord,
    author_name: String,
    author_image: Option<String>,
    vote_count: i64,
}

impl From<DebateListingRecord> for DebateListing {
    fn from(r: DebateListingRecord) -> Self {
        let debate = Debate::from(r.debate);
        let author = UserProfile {
            name: r.author_name,
            email: debate.author_email.clone(),
            image: r.author_image,
        };
        Self {
            debate,
            author,
            vote_count: r.vote_count,
        }
    }
}

#[derive(FromRow)]
struct ArgumentRecord {
    id: Uuid,
    debate_id: Uuid,
    user_email: String,
    side: String,
    content: String,
    created_at: OffsetDateTime,
}

impl TryFrom<ArgumentRecord> for Argument {
    type Error = StoreError;

    fn try_from(r: ArgumentRecord) -> Result<Self, Self::Error> {
        let side = r
            .side
            .parse()
            .map_err(|e: String| StoreError::Backend(anyhow::anyhow!(e)))?;
        Ok(Self {
            id: r.id,
            debate_id: r.debate_id,
            user_email: r.user_email,
            side,
            content: r.content,
            created_at: r.created_at,
        })
    }
}

#[derive(FromRow)]
struct ArgumentWithVotesRecord {
    #[sqlx(flatten)]
    argument: ArgumentRecord,
    author_name: String,
    author_image: Option<String>,
    vote_count: i64,
}

impl TryFrom<ArgumentWithVotesRecord> for ArgumentWithVotes {
    type Error = StoreError;

    fn try_from(r: ArgumentWithVotesRecord) -> Result<Self, Self::Error> {
        let argument = Argument::try_from(r.argument)?;
        let author = UserProfile {
            name: r.author_name,
            email: argument.user_email.clone(),
            image: r.author_image,
        };
        Ok(Self {
            argument,
            author,
            vote_count: r.vote_count,
        })
    }
}

#[derive(FromRow)]
struct VoteRecord {
    id: Uuid,
    argument_id: Uuid,
    user_email: String,
    created_at: OffsetDateTime,
}

impl From<VoteRecord> for Vote {
    fn from(r: VoteRecord) -> Self {
        Self {
            id: r.id,
            argument_id: r.argument_id,
            user_email: r.user_email,
            created_at: r.created_at,
        }
    }
}

#[derive(FromRow)]
struct ActivityRecord {
    email: String,
    name: String,
    image: Option<String>,
    debate_id: Option<Uuid>,
    vote_count: i64,
}

// ---- helpers ----

const USER_COLUMNS: &str = "id, email, name, image, password_hash, provider, created_at";
const DEBATE_COLUMNS: &str =
    "id, title, description, category, tags, duration, author_email, created_at, ends_at";
const ARGUMENT_COLUMNS: &str = "id, debate_id, user_email, side, content, created_at";

/// Maps a failed write, turning known unique violations into conflicts.
fn write_error(e: sqlx::Error, what: &'static str) -> StoreError {
    if let sqlx::Error::Database(db) = &e {
        if db.is_unique_violation() {
            let key = match db.constraint() {
                Some("users_email_key") => Some(UniqueKey::UserEmail),
                Some("arguments_user_debate_key") => Some(UniqueKey::ArgumentPerDebate),
                Some("votes_user_argument_key") => Some(UniqueKey::VotePerArgument),
                _ => None,
            };
            if let Some(key) = key {
                return StoreError::Conflict(key);
            }
        }
    }
    StoreError::Backend(anyhow::Error::new(e).context(what))
}

fn read_error(e: sqlx::Error, what: &'static str) -> StoreError {
    StoreError::Backend(anyhow::Error::new(e).context(what))
}

fn escape_like(term: &str) -> String {
    let mut out = String::with_capacity(term.len() + 2);
    out.push('%');
    for c in term.chars() {
        if matches!(c, '%' | '_' | '\\') {
            out.push('\\');
        }
        out.push(c);
    }
    out.push('%');
    out
}

fn order_clause(sort: DebateSort) -> &'static str {
    match sort {
        DebateSort::Newest => "d.created_at DESC, d.id",
        DebateSort::MostVoted => "vote_count DESC, d.created_at DESC, d.id",
        DebateSort::EndingSoon => "d.ends_at ASC, d.id",
    }
}

#[async_trait]
impl DebateStore for PgStore {
    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        let row = sqlx::query_as::<_, UserRecord>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE email = $1"
        ))
        .bind(email)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| read_error(e, "find user by email"))?;
        Ok(row.map(User::from))
    }

    async fn find_user_by_id(&self, id: Uuid) -> StoreResult<Option<User>> {
        let row = sqlx::query_as::<_, UserRecord>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| read_error(e, "find user by id"))?;
        Ok(row.map(User::from))
    }

    async fn create_user(&self, user: NewUser) -> StoreResult<User> {
        let row = sqlx::query_as::<_, UserRecord>(&format!(
            r#"
            INSERT INTO users (id, email, name, image, password_hash, provider, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(Uuid::new_v4())
        .bind(&user.email)
        .bind(&user.name)
        .bind(&user.image)
        .bind(&user.password_hash)
        .bind(&user.provider)
        .bind(user.created_at)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| write_error(e, "insert user"))?;
        Ok(row.into())
    }

    async fn create_debate(&self, debate: NewDebate) -> StoreResult<Debate> {
        let row = sqlx::query_as::<_, DebateRecord>(&format!(
            r#"
            INSERT INTO debates (id, title, description, category, tags, duration,
                                 author_email, created_at, ends_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING {DEBATE_COLUMNS}
            "#
        ))
        .bind(Uuid::new_v4())
        .bind(&debate.title)
        .bind(&debate.description)
        .bind(&debate.category)
        .bind(&debate.tags)
        .bind(debate.duration)
        .bind(&debate.author_email)
        .bind(debate.created_at)
        .bind(debate.ends_at)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| write_error(e, "insert debate"))?;
        Ok(row.into())
    }

    async fn find_debate_by_id(&self, id: Uuid) -> StoreResult<Option<Debate>> {
        let row = sqlx::query_as::<_, DebateRecord>(&format!(
            "SELECT {DEBATE_COLUMNS} FROM debates WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| read_error(e, "find debate by id"))?;
        Ok(row.map(Debate::from))
    }

    async fn list_debates(
        &self,
        filter: &DebateFilter,
        sort: DebateSort,
    ) -> StoreResult<Vec<DebateListing>> {
        let term = filter.search_term.as_deref();
        let pattern = term.map(escape_like);
        let sql = format!(
            r#"
            SELECT d.id, d.title, d.description, d.category, d.tags, d.duration,
                   d.author_email, d.created_at, d.ends_at,
                   u.name AS author_name, u.image AS author_image,
                   (SELECT COUNT(*)
                      FROM votes v
                      JOIN arguments a ON a.id = v.argument_id
                     WHERE a.debate_id = d.id) AS vote_count
              FROM debates d
              JOIN users u ON u.email = d.author_email
             WHERE ($1::text IS NULL
                    OR d.title ILIKE $2
                    OR d.category ILIKE $2
                    OR $1 = ANY(d.tags))
               AND ($3::timestamptz IS NULL OR d.ends_at > $3)
             ORDER BY {}
            "#,
            order_clause(sort)
        );
        let rows = sqlx::query_as::<_, DebateListingRecord>(&sql)
            .bind(term)
            .bind(pattern)
            .bind(filter.running_at)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| read_error(e, "list debates"))?;
        Ok(rows.into_iter().map(DebateListing::from).collect())
    }

    async fn create_argument(&self, argument: NewArgument) -> StoreResult<Argument> {
        let row = sqlx::query_as::<_, ArgumentRecord>(&format!(
            r#"
            INSERT INTO arguments (id, debate_id, user_email, side, content, created_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {ARGUMENT_COLUMNS}
            "#
        ))
        .bind(Uuid::new_v4())
        .bind(argument.debate_id)
        .bind(&argument.user_email)
        .bind(argument.side.as_str())
        .bind(&argument.content)
        .bind(argument.created_at)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| write_error(e, "insert argument"))?;
        row.try_into()
    }

    async fn find_argument_by_id(&self, id: Uuid) -> StoreResult<Option<Argument>> {
        sqlx::query_as::<_, ArgumentRecord>(&format!(
            "SELECT {ARGUMENT_COLUMNS} FROM arguments WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| read_error(e, "find argument by id"))?
        .map(Argument::try_from)
        .transpose()
    }

    async fn find_argument_by_user_and_debate(
        &self,
        user_email: &str,
        debate_id: Uuid,
    ) -> StoreResult<Option<Argument>> {
        sqlx::query_as::<_, ArgumentRecord>(&format!(
            "SELECT {ARGUMENT_COLUMNS} FROM arguments WHERE user_email = $1 AND debate_id = $2"
        ))
        .bind(user_email)
        .bind(debate_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| read_error(e, "find argument by user and debate"))?
        .map(Argument::try_from)
        .transpose()
    }

    async fn list_arguments_by_debate(
        &self,
        debate_id: Uuid,
    ) -> StoreResult<Vec<ArgumentWithVotes>> {
        let rows = sqlx::query_as::<_, ArgumentWithVotesRecord>(
            r#"
            SELECT a.id, a.debate_id, a.user_email, a.side, a.content, a.created_at,
                   u.name AS author_name, u.image AS author_image,
                   (SELECT COUNT(*) FROM votes v WHERE v.argument_id = a.id) AS vote_count
              FROM arguments a
              JOIN users u ON u.email = a.user_email
             WHERE a.debate_id = $1
             ORDER BY a.created_at DESC, a.id
            "#,
        )
        .bind(debate_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| read_error(e, "list arguments by debate"))?;
        rows.into_iter().map(ArgumentWithVotes::try_from).collect()
    }

    async fn update_argument_content(
        &self,
        id: Uuid,
        content: &str,
    ) -> StoreResult<Option<Argument>> {
        sqlx::query_as::<_, ArgumentRecord>(&format!(
            "UPDATE arguments SET content = $2 WHERE id = $1 RETURNING {ARGUMENT_COLUMNS}"
        ))
        .bind(id)
        .bind(content)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| write_error(e, "update argument content"))?
        .map(Argument::try_from)
        .transpose()
    }

    async fn fill_placeholder(
        &self,
        id: Uuid,
        content: &str,
        posted_at: OffsetDateTime,
    ) -> StoreResult<Option<Argument>> {
        sqlx::query_as::<_, ArgumentRecord>(&format!(
            r#"
            UPDATE arguments
               SET content = $2, created_at = $3
             WHERE id = $1 AND btrim(content) = ''
            RETURNING {ARGUMENT_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(content)
        .bind(posted_at)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| write_error(e, "fill placeholder argument"))?
        .map(Argument::try_from)
        .transpose()
    }

    async fn create_vote(&self, vote: NewVote) -> StoreResult<Vote> {
        let row = sqlx::query_as::<_, VoteRecord>(
            r#"
            INSERT INTO votes (id, argument_id, user_email, created_at)
            VALUES ($1, $2, $3, $4)
            RETURNING id, argument_id, user_email, created_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(vote.argument_id)
        .bind(&vote.user_email)
        .bind(vote.created_at)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| write_error(e, "insert vote"))?;
        Ok(row.into())
    }

    async fn find_vote_by_user_and_argument(
        &self,
        user_email: &str,
        argument_id: Uuid,
    ) -> StoreResult<Option<Vote>> {
        let row = sqlx::query_as::<_, VoteRecord>(
            r#"
            SELECT id, argument_id, user_email, created_at
              FROM votes
             WHERE user_email = $1 AND argument_id = $2
            "#,
        )
        .bind(user_email)
        .bind(argument_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| read_error(e, "find vote by user and argument"))?;
        Ok(row.map(Vote::from))
    }

    async fn list_user_activity(
        &self,
        since: Option<OffsetDateTime>,
    ) -> StoreResult<Vec<UserActivity>> {
        let rows = sqlx::query_as::<_, ActivityRecord>(
            r#"
            SELECT u.email, u.name, u.image, a.debate_id,
                   (SELECT COUNT(*) FROM votes v WHERE v.argument_id = a.id) AS vote_count
              FROM users u
              LEFT JOIN arguments a
                     ON a.user_email = u.email
                    AND ($1::timestamptz IS NULL OR a.created_at >= $1)
             ORDER BY u.created_at ASC, u.email ASC, a.created_at ASC
            "#,
        )
        .bind(since)
        .fetch_all(&self.pool)
        .await
        .context("list user activity")?;

        let mut out: Vec<UserActivity> = Vec::new();
        for row in rows {
            let same_user = out.last().is_some_and(|u| u.user.email == row.email);
            if !same_user {
                out.push(UserActivity {
                    user: UserProfile {
                        name: row.name,
                        email: row.email,
                        image: row.image,
                    },
                    arguments: Vec::new(),
                });
            }
            if let (Some(debate_id), Some(current)) = (row.debate_id, out.last_mut()) {
                current.arguments.push(ArgumentScore {
                    debate_id,
                    vote_count: row.vote_count,
                });
            }
        }
        Ok(out)
    }
}
