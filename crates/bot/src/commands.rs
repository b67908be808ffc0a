use std::sync::Arc;

use panels::{
    review::{review_panel, tierboard_panel, TierboardSource},
    PanelError, PanelOptions,
};
use shared::{
    domain::{ReviewId, Semester, Tier},
    error::{ApiError, ErrorCode},
    protocol::CommandInvocation,
    text::{pack_messages, DEFAULT_MESSAGE_LEN},
};
use storage::TierboardFilter;
use tracing::{info, warn};

use crate::app_state::AppState;

const SUBJECT_KINDS: [&str; 4] = ["P", "PVT", "PVA", "V"];

pub(crate) async fn run_command(
    state: &AppState,
    command: &CommandInvocation,
) -> Result<(), ApiError> {
    info!(
        command = %command.name,
        subcommand = ?command.subcommand,
        actor = %command.actor,
        "command received"
    );
    match (command.name.as_str(), command.subcommand.as_deref()) {
        ("review", Some("get")) => review_get(state, command).await,
        ("review", Some("add")) => review_add(state, command).await,
        ("review", Some("remove")) => review_remove(state, command).await,
        ("review", Some("list")) => review_list(state, command).await,
        ("tierboard", _) => tierboard(state, command).await,
        (name, Some(sub)) => Err(ApiError::new(
            ErrorCode::NotFound,
            format!("unknown command '{name} {sub}'"),
        )),
        (name, None) => Err(ApiError::new(
            ErrorCode::NotFound,
            format!("unknown command '{name}'"),
        )),
    }
}

fn required<'a>(command: &'a CommandInvocation, key: &str) -> Result<&'a str, ApiError> {
    command
        .option(key)
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .ok_or_else(|| ApiError::new(ErrorCode::Validation, format!("missing option '{key}'")))
}

fn subject_option(command: &CommandInvocation) -> Result<String, ApiError> {
    required(command, "subject").map(str::to_lowercase)
}

pub(crate) fn panel_error(err: PanelError) -> ApiError {
    let code = match &err {
        PanelError::NotAuthor | PanelError::LockFixed | PanelError::VoteOwn => ErrorCode::Forbidden,
        PanelError::AlreadyVoted
        | PanelError::NoVote
        | PanelError::NoPages
        | PanelError::RowFull { .. }
        | PanelError::RowOutOfRange { .. } => ErrorCode::Validation,
        PanelError::NotSent => ErrorCode::Gone,
        PanelError::Transport(_) | PanelError::Source(_) => ErrorCode::Internal,
    };
    ApiError::new(code, err.to_string())
}

async fn reply(state: &AppState, command: &CommandInvocation, text: &str) -> Result<(), ApiError> {
    state
        .transport
        .send_text(command.channel_id, text)
        .await
        .map_err(ApiError::internal)
}

async fn review_get(state: &AppState, command: &CommandInvocation) -> Result<(), ApiError> {
    let subject = subject_option(command)?;
    let known = state.storage.subject(&subject).await.map_err(ApiError::internal)?;
    if known.is_none() {
        return Err(ApiError::new(
            ErrorCode::NotFound,
            format!("unknown subject '{subject}'"),
        ));
    }

    let panel = review_panel(
        state.transport.clone(),
        Arc::new(state.storage.clone()),
        command.actor,
        &subject,
        state.panel_timeout,
    )
    .await
    .map_err(panel_error)?;
    state
        .panels
        .open(panel, command.channel_id)
        .await
        .map_err(panel_error)?;
    Ok(())
}

async fn review_add(state: &AppState, command: &CommandInvocation) -> Result<(), ApiError> {
    let subject = subject_option(command)?;
    let grade = required(command, "grade")?;
    let tier = Tier::parse(grade).ok_or_else(|| {
        ApiError::new(ErrorCode::Validation, format!("grade '{grade}' is not one of A-F"))
    })?;
    let text = required(command, "text")?;
    let anonymous = matches!(command.option("anonymous"), Some("true" | "yes" | "1"));
    let author_name = command
        .actor_name
        .clone()
        .unwrap_or_else(|| command.actor.to_string());

    let stored = state
        .storage
        .add_review(command.actor, &author_name, &subject, tier, anonymous, text)
        .await
        .map_err(ApiError::internal)?;
    let Some(review_id) = stored else {
        return Err(ApiError::new(
            ErrorCode::NotFound,
            format!("unknown subject '{subject}'"),
        ));
    };
    info!(%review_id, %subject, actor = %command.actor, "review stored");
    reply(
        state,
        command,
        &format!("Review of {} saved.", subject.to_uppercase()),
    )
    .await
}

async fn review_remove(state: &AppState, command: &CommandInvocation) -> Result<(), ApiError> {
    if let Some(raw_id) = command.option("id") {
        return review_remove_by_id(state, command, raw_id).await;
    }
    let subject = subject_option(command)?;
    let removed = state
        .storage
        .remove_review(command.actor, &subject)
        .await
        .map_err(ApiError::internal)?;
    let text = if removed {
        format!("Review of {} removed.", subject.to_uppercase())
    } else {
        format!("You have no review of {}.", subject.to_uppercase())
    };
    reply(state, command, &text).await
}

/// Bot admins may remove any review by its id.
async fn review_remove_by_id(
    state: &AppState,
    command: &CommandInvocation,
    raw_id: &str,
) -> Result<(), ApiError> {
    if !state.admins.contains(&command.actor) {
        warn!(actor = %command.actor, "review removal by id refused");
        return Err(ApiError::new(
            ErrorCode::Forbidden,
            "only bot admins can remove reviews by id",
        ));
    }
    let review_id = raw_id.trim().parse().map(ReviewId).map_err(|_| {
        ApiError::new(
            ErrorCode::Validation,
            format!("review id '{raw_id}' is not a number"),
        )
    })?;
    let removed = state
        .storage
        .remove_review_by_id(review_id)
        .await
        .map_err(ApiError::internal)?;
    let text = if removed {
        info!(%review_id, admin = %command.actor, "review removed by admin");
        format!("Review {review_id} removed.")
    } else {
        format!("Review {review_id} not found.")
    };
    reply(state, command, &text).await
}

async fn review_list(state: &AppState, command: &CommandInvocation) -> Result<(), ApiError> {
    let reviews = state
        .storage
        .reviews_by_member(command.actor)
        .await
        .map_err(ApiError::internal)?;
    if reviews.is_empty() {
        return reply(state, command, "You have not reviewed any subject yet.").await;
    }
    let lines = reviews.iter().map(|review| {
        format!(
            "**{}** {} (👍 {} / 👎 {})",
            review.subject.to_uppercase(),
            review.tier.name(),
            review.likes,
            review.dislikes
        )
    });
    for message in pack_messages(lines, DEFAULT_MESSAGE_LEN) {
        reply(state, command, &message).await?;
    }
    Ok(())
}

pub(crate) fn tierboard_filter(command: &CommandInvocation) -> Result<TierboardFilter, ApiError> {
    let kind = required(command, "kind")?.to_uppercase();
    if !SUBJECT_KINDS.contains(&kind.as_str()) {
        return Err(ApiError::new(
            ErrorCode::Validation,
            format!("subject kind must be one of {}", SUBJECT_KINDS.join(", ")),
        ));
    }
    let semester_code = required(command, "semester")?;
    let semester = Semester::from_code(semester_code).ok_or_else(|| {
        ApiError::new(ErrorCode::Validation, "semester must be Z or L")
    })?;
    let year = command
        .option("year")
        .map(|year| year.trim().to_uppercase())
        .filter(|year| !year.is_empty());
    let degree = year.as_deref().and_then(|year| {
        ["BIT", "MIT"]
            .into_iter()
            .find(|degree| year.contains(degree))
            .map(str::to_string)
    });
    if degree.is_none() {
        return Err(ApiError::new(
            ErrorCode::Validation,
            "tierboard needs a year such as 1BIT or 2MIT",
        ));
    }
    // optional subjects are ranked per degree, compulsory ones per year
    let year = if kind == "P" { year } else { None };
    Ok(TierboardFilter {
        kind,
        semester,
        degree,
        year,
    })
}

async fn tierboard(state: &AppState, command: &CommandInvocation) -> Result<(), ApiError> {
    let filter = tierboard_filter(command)?;
    let source = TierboardSource::new(state.storage.clone(), filter)
        .await
        .map_err(ApiError::internal)?;
    let options = PanelOptions {
        timeout: state.panel_timeout,
        ..PanelOptions::default()
    };
    let panel = tierboard_panel(state.transport.clone(), source, command.actor, options)
        .await
        .map_err(panel_error)?;
    state
        .panels
        .open(panel, command.channel_id)
        .await
        .map_err(panel_error)?;
    Ok(())
}

#[cfg(test)]
#[path = "tests/commands_tests.rs"]
mod tests;
