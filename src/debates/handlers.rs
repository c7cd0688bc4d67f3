use axum::{
    extract::{Path, State},
    routing::{get, patch, post},
    Router,
};
use serde::Serialize;
use tracing::{instrument, warn};
use uuid::Uuid;

use super::{
    dto::{
        ArgumentView, CreateDebateRequest, DebateDetails, DebateListItem, EditArgumentRequest,
        JoinDebateRequest, ListDebatesQuery, PostArgumentRequest, ScoreboardQuery, VoteRequest,
    },
    scoring::{Outcome, RankedUser},
};
use crate::{
    auth::services::AuthUser,
    error::ApiError,
    extract::{ValidJson, ValidQuery},
    response::ApiResponse,
    state::AppState,
    store::types::{Argument, Debate, Vote},
};

pub fn debate_routes() -> Router<AppState> {
    Router::new()
        .route("/debates", get(list_debates))
        .route("/debates/create", post(create_debate))
        .route("/debates/join", post(join_debate))
        .route("/debates/post-argument", post(post_argument))
        .route("/debates/edit-argument", patch(edit_argument))
        .route("/debates/vote", post(vote_argument))
        .route("/debates/details/:id/:email", get(debate_details))
        .route("/debates/winner/:id", get(winner_side))
        .route("/debates/score-board", get(scoreboard))
}

fn parse_id(raw: &str) -> Result<Uuid, ApiError> {
    Uuid::parse_str(raw).map_err(|_| {
        warn!(id = %raw, "malformed id in path");
        ApiError::Validation(format!("Invalid id: {raw}"))
    })
}

#[instrument(skip(state, payload), fields(user = %caller.email))]
pub async fn create_debate(
    State(state): State<AppState>,
    caller: AuthUser,
    ValidJson(payload): ValidJson<CreateDebateRequest>,
) -> Result<ApiResponse<Debate>, ApiError> {
    let debate = state.debates.create_debate(&caller.email, payload).await?;
    Ok(ApiResponse::created("Debate created successfully", debate))
}

#[instrument(skip(state))]
pub async fn list_debates(
    State(state): State<AppState>,
    ValidQuery(query): ValidQuery<ListDebatesQuery>,
) -> Result<ApiResponse<Vec<DebateListItem>>, ApiError> {
    let items = state
        .debates
        .list_debates(query.search_term, query.sort_by)
        .await?;
    Ok(ApiResponse::ok("Debates fetched successfully", items))
}

#[instrument(skip(state, payload), fields(user = %caller.email))]
pub async fn join_debate(
    State(state): State<AppState>,
    caller: AuthUser,
    ValidJson(payload): ValidJson<JoinDebateRequest>,
) -> Result<ApiResponse<Argument>, ApiError> {
    let argument = state
        .debates
        .join_debate(&caller.email, payload.debate_id, payload.side)
        .await?;
    Ok(ApiResponse::ok("Joined debate successfully", argument))
}

#[instrument(skip(state, payload), fields(user = %caller.email))]
pub async fn post_argument(
    State(state): State<AppState>,
    caller: AuthUser,
    ValidJson(payload): ValidJson<PostArgumentRequest>,
) -> Result<ApiResponse<ArgumentView>, ApiError> {
    let view = state
        .debates
        .post_argument(&caller.email, payload.debate_id, &payload.content, payload.side)
        .await?;
    Ok(ApiResponse::created("Argument posted successfully", view))
}

#[instrument(skip(state, payload), fields(user = %caller.email))]
pub async fn edit_argument(
    State(state): State<AppState>,
    caller: AuthUser,
    ValidJson(payload): ValidJson<EditArgumentRequest>,
) -> Result<ApiResponse<Argument>, ApiError> {
    let argument = state
        .debates
        .edit_argument(&caller.email, payload.argument_id, &payload.content)
        .await?;
    Ok(ApiResponse::ok("Argument updated successfully", argument))
}

#[instrument(skip(state, payload), fields(user = %caller.email))]
pub async fn vote_argument(
    State(state): State<AppState>,
    caller: AuthUser,
    ValidJson(payload): ValidJson<VoteRequest>,
) -> Result<ApiResponse<Vote>, ApiError> {
    let vote = state
        .debates
        .vote_argument(&caller.email, payload.argument_id)
        .await?;
    Ok(ApiResponse::created("Vote added successfully", vote))
}

#[instrument(skip(state))]
pub async fn debate_details(
    State(state): State<AppState>,
    Path((id, email)): Path<(String, String)>,
) -> Result<ApiResponse<DebateDetails>, ApiError> {
    let debate_id = parse_id(&id)?;
    let email = email.trim().to_lowercase();
    let requester = (!email.is_empty()).then_some(email.as_str());
    let details = state.debates.debate_details(debate_id, requester).await?;
    Ok(ApiResponse::ok("Debate details retrieved", details))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WinnerView {
    pub debate_id: Uuid,
    pub winner_side: Outcome,
}

#[instrument(skip(state))]
pub async fn winner_side(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<ApiResponse<WinnerView>, ApiError> {
    let debate_id = parse_id(&id)?;
    let winner_side = state.debates.winner_side(debate_id).await?;
    Ok(ApiResponse::ok(
        "Winner side calculated",
        WinnerView {
            debate_id,
            winner_side,
        },
    ))
}

#[instrument(skip(state))]
pub async fn scoreboard(
    State(state): State<AppState>,
    ValidQuery(query): ValidQuery<ScoreboardQuery>,
) -> Result<ApiResponse<Vec<RankedUser>>, ApiError> {
    let (entries, meta) = state
        .debates
        .scoreboard(query.filter, query.page, query.limit)
        .await?;
    Ok(ApiResponse::ok("Scoreboard fetched successfully", entries).with_meta(meta))
}
