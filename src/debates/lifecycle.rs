//! Time-derived debate state and the eligibility gates built on it.
//!
//! A debate is `Running` strictly before `ends_at` and `Ended` from then on.
//! Nothing is stored; every check recomputes the state from the `now` it is
//! handed, so the transition is one-way and cannot be reverted.

use serde::Serialize;
use time::{Duration, OffsetDateTime};

use super::{error::DebateError, filter::ContentFilter};
use crate::store::types::{Argument, Debate, Side, Vote};

/// Fixed window after posting during which the author may edit.
pub const EDIT_WINDOW: Duration = Duration::minutes(5);

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
pub enum DebateStatus {
    Running,
    Ended,
}

impl DebateStatus {
    /// Lower-case form used by the details view.
    pub fn label(self) -> &'static str {
        match self {
            DebateStatus::Running => "running",
            DebateStatus::Ended => "closed",
        }
    }
}

pub fn ends_at(created_at: OffsetDateTime, duration_hours: i32) -> OffsetDateTime {
    created_at + Duration::hours(i64::from(duration_hours))
}

pub fn status_at(ends_at: OffsetDateTime, now: OffsetDateTime) -> DebateStatus {
    if now < ends_at {
        DebateStatus::Running
    } else {
        DebateStatus::Ended
    }
}

pub fn status(debate: &Debate, now: OffsetDateTime) -> DebateStatus {
    status_at(debate.ends_at, now)
}

fn ensure_running(debate: &Debate, now: OffsetDateTime) -> Result<(), DebateError> {
    match status(debate, now) {
        DebateStatus::Running => Ok(()),
        DebateStatus::Ended => Err(DebateError::DebateClosed),
    }
}

fn ensure_clean(filter: &ContentFilter, content: &str) -> Result<(), DebateError> {
    match filter.find_banned(content) {
        Some(word) => Err(DebateError::ContentRejected(word.to_string())),
        None => Ok(()),
    }
}

/// Gate for staking a side without arguing yet.
pub fn check_join<'d>(
    existing: Option<&Argument>,
    debate: Option<&'d Debate>,
    now: OffsetDateTime,
) -> Result<&'d Debate, DebateError> {
    if let Some(existing) = existing {
        return Err(DebateError::AlreadyJoined(existing.side));
    }
    let debate = debate.ok_or(DebateError::NotFound("Debate not found"))?;
    ensure_running(debate, now)?;
    Ok(debate)
}

/// Gate for posting content. A missing debate reads as closed.
pub fn check_post<'d>(
    debate: Option<&'d Debate>,
    filter: &ContentFilter,
    content: &str,
    now: OffsetDateTime,
) -> Result<&'d Debate, DebateError> {
    let debate = debate.ok_or(DebateError::DebateClosed)?;
    ensure_running(debate, now)?;
    ensure_clean(filter, content)?;
    Ok(debate)
}

/// What posting does given the caller's existing row in the debate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PostAction {
    Create,
    FillPlaceholder(uuid::Uuid),
}

pub fn post_action(existing: Option<&Argument>, side: Side) -> Result<PostAction, DebateError> {
    match existing {
        None => Ok(PostAction::Create),
        Some(arg) if arg.is_placeholder() && arg.side == side => {
            Ok(PostAction::FillPlaceholder(arg.id))
        }
        Some(arg) => Err(DebateError::AlreadyJoined(arg.side)),
    }
}

/// Gate for editing. The window is inclusive: exactly five minutes still passes.
pub fn check_edit<'a>(
    argument: Option<&'a Argument>,
    editor_email: &str,
    filter: &ContentFilter,
    content: &str,
    now: OffsetDateTime,
) -> Result<&'a Argument, DebateError> {
    // join-only rows are filled by posting, not edited
    let argument = argument
        .filter(|a| !a.is_placeholder())
        .ok_or(DebateError::NotFound("Argument not found."))?;
    if now - argument.created_at > EDIT_WINDOW {
        return Err(DebateError::EditWindowExpired);
    }
    if argument.user_email != editor_email {
        return Err(DebateError::Forbidden);
    }
    ensure_clean(filter, content)?;
    Ok(argument)
}

/// Gate for voting. Closure is judged on the argument's parent debate.
pub fn check_vote(
    argument: Option<&Argument>,
    debate: Option<&Debate>,
    existing: Option<&Vote>,
    now: OffsetDateTime,
) -> Result<(), DebateError> {
    let argument = argument
        .filter(|a| !a.is_placeholder())
        .ok_or(DebateError::NotFound("Argument not found."))?;
    let debate = debate
        .filter(|d| d.id == argument.debate_id)
        .ok_or(DebateError::NotFound("Debate not found"))?;
    ensure_running(debate, now)?;
    if existing.is_some() {
        return Err(DebateError::AlreadyVoted);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;
    use uuid::Uuid;

    const T0: OffsetDateTime = datetime!(2025-03-01 12:00 UTC);

    fn debate(duration: i32) -> Debate {
        Debate {
            id: Uuid::new_v4(),
            title: "Remote work beats the office".into(),
            description: "Discuss.".into(),
            category: "Work".into(),
            tags: vec!["work".into()],
            duration,
            author_email: "host@example.com".into(),
            created_at: T0,
            ends_at: ends_at(T0, duration),
        }
    }

    fn argument(debate: &Debate, email: &str, side: Side, content: &str) -> Argument {
        Argument {
            id: Uuid::new_v4(),
            debate_id: debate.id,
            user_email: email.into(),
            side,
            content: content.into(),
            created_at: T0,
        }
    }

    fn filter() -> ContentFilter {
        ContentFilter::new(["stupid", "idiot", "dumb"])
    }

    #[test]
    fn status_flips_once_at_ends_at() {
        let d = debate(1);
        assert_eq!(status(&d, T0), DebateStatus::Running);
        assert_eq!(status(&d, T0 + Duration::minutes(59)), DebateStatus::Running);
        assert_eq!(status(&d, d.ends_at), DebateStatus::Ended);
        assert_eq!(status(&d, d.ends_at + Duration::days(30)), DebateStatus::Ended);
    }

    #[test]
    fn status_is_monotonic_over_time() {
        let d = debate(2);
        let mut seen_ended = false;
        for minute in 0..240 {
            let s = status(&d, T0 + Duration::minutes(minute));
            if seen_ended {
                assert_eq!(s, DebateStatus::Ended);
            }
            seen_ended |= s == DebateStatus::Ended;
        }
        assert!(seen_ended);
    }

    #[test]
    fn ends_at_adds_whole_hours() {
        assert_eq!(ends_at(T0, 3), datetime!(2025-03-01 15:00 UTC));
    }

    #[test]
    fn join_reports_existing_side_before_anything_else() {
        let d = debate(1);
        let mine = argument(&d, "a@x.io", Side::Oppose, "");
        let err = check_join(Some(&mine), None, T0).unwrap_err();
        assert!(matches!(err, DebateError::AlreadyJoined(Side::Oppose)));
    }

    #[test]
    fn join_missing_or_closed_debate() {
        assert!(matches!(
            check_join(None, None, T0).unwrap_err(),
            DebateError::NotFound(_)
        ));
        let d = debate(1);
        assert!(matches!(
            check_join(None, Some(&d), T0 + Duration::hours(2)).unwrap_err(),
            DebateError::DebateClosed
        ));
        assert!(check_join(None, Some(&d), T0).is_ok());
    }

    #[test]
    fn post_rejects_missing_closed_and_banned() {
        let f = filter();
        assert!(matches!(
            check_post(None, &f, "fine", T0).unwrap_err(),
            DebateError::DebateClosed
        ));
        let d = debate(1);
        assert!(matches!(
            check_post(Some(&d), &f, "fine", T0 + Duration::hours(1)).unwrap_err(),
            DebateError::DebateClosed
        ));
        match check_post(Some(&d), &f, "that is Stupid", T0).unwrap_err() {
            DebateError::ContentRejected(word) => assert_eq!(word, "stupid"),
            other => panic!("unexpected {other:?}"),
        }
        assert!(check_post(Some(&d), &f, "a fair point", T0).is_ok());
    }

    #[test]
    fn post_fills_own_placeholder_on_the_same_side_only() {
        let d = debate(1);
        let placeholder = argument(&d, "a@x.io", Side::Support, "");
        assert_eq!(post_action(None, Side::Support).unwrap(), PostAction::Create);
        assert_eq!(
            post_action(Some(&placeholder), Side::Support).unwrap(),
            PostAction::FillPlaceholder(placeholder.id)
        );
        assert!(matches!(
            post_action(Some(&placeholder), Side::Oppose).unwrap_err(),
            DebateError::AlreadyJoined(Side::Support)
        ));
        let real = argument(&d, "a@x.io", Side::Support, "already argued");
        assert!(matches!(
            post_action(Some(&real), Side::Support).unwrap_err(),
            DebateError::AlreadyJoined(Side::Support)
        ));
    }

    #[test]
    fn edit_window_boundary() {
        let d = debate(1);
        let arg = argument(&d, "a@x.io", Side::Support, "v1");
        let f = filter();
        let just_inside = T0 + Duration::minutes(4) + Duration::seconds(59);
        assert!(check_edit(Some(&arg), "a@x.io", &f, "v2", just_inside).is_ok());
        assert!(check_edit(Some(&arg), "a@x.io", &f, "v2", T0 + EDIT_WINDOW).is_ok());
        let just_outside = T0 + Duration::minutes(5) + Duration::seconds(1);
        assert!(matches!(
            check_edit(Some(&arg), "a@x.io", &f, "v2", just_outside).unwrap_err(),
            DebateError::EditWindowExpired
        ));
    }

    #[test]
    fn edit_checks_run_in_order() {
        let d = debate(1);
        let arg = argument(&d, "a@x.io", Side::Support, "v1");
        let f = filter();
        assert!(matches!(
            check_edit(None, "a@x.io", &f, "v2", T0).unwrap_err(),
            DebateError::NotFound(_)
        ));
        // expiry is reported before authorship
        assert!(matches!(
            check_edit(Some(&arg), "b@x.io", &f, "v2", T0 + Duration::hours(1)).unwrap_err(),
            DebateError::EditWindowExpired
        ));
        assert!(matches!(
            check_edit(Some(&arg), "b@x.io", &f, "v2", T0).unwrap_err(),
            DebateError::Forbidden
        ));
        assert!(matches!(
            check_edit(Some(&arg), "a@x.io", &f, "dumb idea", T0).unwrap_err(),
            DebateError::ContentRejected(_)
        ));
    }

    #[test]
    fn placeholders_cannot_be_edited() {
        let d = debate(1);
        let joined = argument(&d, "a@x.io", Side::Oppose, "  ");
        assert!(matches!(
            check_edit(Some(&joined), "a@x.io", &filter(), "Now with content", T0).unwrap_err(),
            DebateError::NotFound(_)
        ));
    }

    #[test]
    fn vote_gates() {
        let d = debate(1);
        let arg = argument(&d, "a@x.io", Side::Support, "point");
        assert!(check_vote(Some(&arg), Some(&d), None, T0).is_ok());
        assert!(matches!(
            check_vote(None, Some(&d), None, T0).unwrap_err(),
            DebateError::NotFound(_)
        ));
        assert!(matches!(
            check_vote(Some(&arg), Some(&d), None, d.ends_at).unwrap_err(),
            DebateError::DebateClosed
        ));
        let vote = Vote {
            id: Uuid::new_v4(),
            argument_id: arg.id,
            user_email: "v@x.io".into(),
            created_at: T0,
        };
        assert!(matches!(
            check_vote(Some(&arg), Some(&d), Some(&vote), T0).unwrap_err(),
            DebateError::AlreadyVoted
        ));
    }

    #[test]
    fn placeholders_cannot_be_voted_on() {
        let d = debate(1);
        let placeholder = argument(&d, "a@x.io", Side::Support, "");
        assert!(matches!(
            check_vote(Some(&placeholder), Some(&d), None, T0).unwrap_err(),
            DebateError::NotFound(_)
        ));
    }
}
