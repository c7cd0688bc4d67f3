use std::sync::Arc;

use tracing::{debug, info};
use uuid::Uuid;

use super::{
    dto::{ArgumentView, CreateDebateRequest, DebateDetails, DebateListItem},
    error::DebateError,
    filter::ContentFilter,
    lifecycle::{self, DebateStatus, PostAction},
    scoring::{self, Outcome, RankedUser, ScoreWindow},
};
use crate::{
    clock::Clock,
    response::Meta,
    store::{
        types::{
            Argument, Debate, DebateFilter, DebateSort, NewArgument, NewDebate, NewVote, Side,
            Vote,
        },
        DebateStore, StoreError, UniqueKey,
    },
};

/// Debate operations composed over the gateway, the filter and the clock.
/// The caller's identity is always passed in explicitly.
#[derive(Clone)]
pub struct DebateService {
    store: Arc<dyn DebateStore>,
    filter: ContentFilter,
    clock: Arc<dyn Clock>,
}

impl DebateService {
    pub fn new(store: Arc<dyn DebateStore>, filter: ContentFilter, clock: Arc<dyn Clock>) -> Self {
        Self {
            store,
            filter,
            clock,
        }
    }

    pub async fn create_debate(
        &self,
        author_email: &str,
        input: CreateDebateRequest,
    ) -> Result<Debate, DebateError> {
        self.store
            .find_user_by_email(author_email)
            .await?
            .ok_or(DebateError::NotFound("User not exists"))?;

        let now = self.clock.now();
        let debate = self
            .store
            .create_debate(NewDebate {
                title: input.title.trim().to_string(),
                description: input.description.trim().to_string(),
                category: input.category.trim().to_string(),
                tags: input
                    .tags
                    .into_iter()
                    .map(|t| t.trim().to_string())
                    .filter(|t| !t.is_empty())
                    .collect(),
                duration: input.duration,
                author_email: author_email.to_string(),
                created_at: now,
                ends_at: lifecycle::ends_at(now, input.duration),
            })
            .await?;
        info!(debate_id = %debate.id, author = %author_email, "debate created");
        Ok(debate)
    }

    pub async fn list_debates(
        &self,
        search_term: Option<String>,
        sort: DebateSort,
    ) -> Result<Vec<DebateListItem>, DebateError> {
        let now = self.clock.now();
        let filter = DebateFilter {
            search_term: search_term
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty()),
            running_at: (sort == DebateSort::EndingSoon).then_some(now),
        };
        let rows = self.store.list_debates(&filter, sort).await?;
        Ok(rows
            .into_iter()
            .map(|row| DebateListItem {
                status: lifecycle::status(&row.debate, now),
                id: row.debate.id,
                title: row.debate.title,
                author_name: row.author.name,
                author_email: row.author.email,
                author_image: row.author.image,
                category: row.debate.category,
                duration: row.debate.duration,
                tags: row.debate.tags,
                vote_count: row.vote_count,
                created_at: row.debate.created_at,
                ends_at: row.debate.ends_at,
            })
            .collect())
    }

    pub async fn join_debate(
        &self,
        user_email: &str,
        debate_id: Uuid,
        side: Side,
    ) -> Result<Argument, DebateError> {
        let existing = self
            .store
            .find_argument_by_user_and_debate(user_email, debate_id)
            .await?;
        let debate = self.store.find_debate_by_id(debate_id).await?;
        lifecycle::check_join(existing.as_ref(), debate.as_ref(), self.clock.now())?;

        let placeholder = NewArgument {
            debate_id,
            user_email: user_email.to_string(),
            side,
            content: String::new(),
            created_at: self.clock.now(),
        };
        match self.store.create_argument(placeholder).await {
            Ok(arg) => {
                info!(%debate_id, user = %user_email, %side, "joined debate");
                Ok(arg)
            }
            Err(StoreError::Conflict(UniqueKey::ArgumentPerDebate)) => {
                Err(self.already_joined(user_email, debate_id).await)
            }
            Err(e) => Err(e.into()),
        }
    }

    pub async fn post_argument(
        &self,
        user_email: &str,
        debate_id: Uuid,
        content: &str,
        side: Side,
    ) -> Result<ArgumentView, DebateError> {
        let content = content.trim();
        if content.is_empty() {
            return Err(DebateError::Validation("content is required".into()));
        }
        let now = self.clock.now();
        let debate = self.store.find_debate_by_id(debate_id).await?;
        lifecycle::check_post(debate.as_ref(), &self.filter, content, now)?;

        let author = self
            .store
            .find_user_by_email(user_email)
            .await?
            .ok_or(DebateError::NotFound("User not exists"))?;
        let existing = self
            .store
            .find_argument_by_user_and_debate(user_email, debate_id)
            .await?;

        let argument = match lifecycle::post_action(existing.as_ref(), side)? {
            PostAction::Create => {
                let new = NewArgument {
                    debate_id,
                    user_email: user_email.to_string(),
                    side,
                    content: content.to_string(),
                    created_at: now,
                };
                match self.store.create_argument(new).await {
                    Ok(arg) => arg,
                    Err(StoreError::Conflict(UniqueKey::ArgumentPerDebate)) => {
                        return Err(self.already_joined(user_email, debate_id).await)
                    }
                    Err(e) => return Err(e.into()),
                }
            }
            PostAction::FillPlaceholder(id) => {
                match self.store.fill_placeholder(id, content, now).await? {
                    Some(arg) => arg,
                    // filled by a concurrent request
                    None => return Err(self.already_joined(user_email, debate_id).await),
                }
            }
        };
        info!(argument_id = %argument.id, %debate_id, user = %user_email, "argument posted");
        Ok(ArgumentView {
            id: argument.id,
            content: argument.content,
            side: argument.side,
            vote_count: 0,
            user: author.profile(),
            created_at: argument.created_at,
        })
    }

    pub async fn edit_argument(
        &self,
        editor_email: &str,
        argument_id: Uuid,
        content: &str,
    ) -> Result<Argument, DebateError> {
        let content = content.trim();
        if content.is_empty() {
            return Err(DebateError::Validation("content is required".into()));
        }
        let argument = self.store.find_argument_by_id(argument_id).await?;
        lifecycle::check_edit(
            argument.as_ref(),
            editor_email,
            &self.filter,
            content,
            self.clock.now(),
        )?;
        let updated = self
            .store
            .update_argument_content(argument_id, content)
            .await?
            .ok_or(DebateError::NotFound("Argument not found."))?;
        info!(%argument_id, user = %editor_email, "argument edited");
        Ok(updated)
    }

    pub async fn vote_argument(
        &self,
        voter_email: &str,
        argument_id: Uuid,
    ) -> Result<Vote, DebateError> {
        let argument = self.store.find_argument_by_id(argument_id).await?;
        let debate = match &argument {
            Some(arg) => self.store.find_debate_by_id(arg.debate_id).await?,
            None => None,
        };
        let existing = self
            .store
            .find_vote_by_user_and_argument(voter_email, argument_id)
            .await?;
        lifecycle::check_vote(
            argument.as_ref(),
            debate.as_ref(),
            existing.as_ref(),
            self.clock.now(),
        )?;

        // a concurrent duplicate surfaces as a unique violation -> AlreadyVoted
        let vote = self
            .store
            .create_vote(NewVote {
                argument_id,
                user_email: voter_email.to_string(),
                created_at: self.clock.now(),
            })
            .await?;
        info!(%argument_id, voter = %voter_email, "vote recorded");
        Ok(vote)
    }

    pub async fn winner_side(&self, debate_id: Uuid) -> Result<Outcome, DebateError> {
        self.store
            .find_debate_by_id(debate_id)
            .await?
            .ok_or(DebateError::NotFound("Debate not found"))?;
        let rows = self.store.list_arguments_by_debate(debate_id).await?;
        Ok(scoring::winner_side(
            rows.iter().map(|r| (r.argument.side, r.vote_count)),
        ))
    }

    pub async fn debate_details(
        &self,
        debate_id: Uuid,
        requester_email: Option<&str>,
    ) -> Result<DebateDetails, DebateError> {
        let debate = self
            .store
            .find_debate_by_id(debate_id)
            .await?
            .ok_or(DebateError::NotFound("Debate not found"))?;
        let rows = self.store.list_arguments_by_debate(debate_id).await?;
        let status = lifecycle::status(&debate, self.clock.now());

        let mine = requester_email
            .and_then(|email| rows.iter().find(|r| r.argument.user_email == email));
        let arguments: Vec<ArgumentView> = rows
            .iter()
            .filter(|r| !r.argument.is_placeholder())
            .map(ArgumentView::from)
            .collect();

        let (winner_side, score_board) = match status {
            DebateStatus::Running => (None, None),
            DebateStatus::Ended => (
                Some(scoring::winner_side(
                    rows.iter().map(|r| (r.argument.side, r.vote_count)),
                )),
                Some(scoring::debate_scoreboard(&rows)),
            ),
        };
        debug!(%debate_id, ?status, arguments = arguments.len(), "debate details");

        Ok(DebateDetails {
            debate_id: debate.id,
            title: debate.title,
            ends_at: debate.ends_at,
            i_participated: mine.is_some(),
            my_side: mine.map(|r| r.argument.side),
            debate_status: status.label(),
            arguments,
            winner_side,
            score_board,
        })
    }

    pub async fn scoreboard(
        &self,
        window: ScoreWindow,
        page: usize,
        limit: usize,
    ) -> Result<(Vec<RankedUser>, Meta), DebateError> {
        if page < 1 || limit < 1 {
            return Err(DebateError::Validation(
                "page and limit must be at least 1".into(),
            ));
        }
        let since = window.since(self.clock.now());
        let activity = self.store.list_user_activity(since).await?;
        let ranked = scoring::rank_users(activity);
        let (data, total) = scoring::paginate(ranked, page, limit);
        Ok((data, Meta { page, limit, total }))
    }

    /// Builds the `AlreadyJoined` error for a lost insert race, naming the
    /// side that won.
    async fn already_joined(&self, user_email: &str, debate_id: Uuid) -> DebateError {
        match self
            .store
            .find_argument_by_user_and_debate(user_email, debate_id)
            .await
        {
            Ok(Some(existing)) => DebateError::AlreadyJoined(existing.side),
            Ok(None) => DebateError::Internal(anyhow::anyhow!(
                "argument conflict without a stored row"
            )),
            Err(e) => e.into(),
        }
    }
}
