use thiserror::Error;

use crate::grid::ROW_COUNT;

#[derive(Debug, Error)]
pub enum PanelError {
    #[error("control row {row} already holds the maximum number of controls")]
    RowFull { row: u8 },
    #[error("control row {row} is outside 0..{}", ROW_COUNT)]
    RowOutOfRange { row: u8 },
    #[error("panel needs at least one page")]
    NoPages,
    #[error("only the author of the command can do that")]
    NotAuthor,
    #[error("this panel is permanently locked")]
    LockFixed,
    #[error("you cannot vote on your own review")]
    VoteOwn,
    #[error("you have already voted this way")]
    AlreadyVoted,
    #[error("you have no vote to remove")]
    NoVote,
    #[error("panel message has not been sent yet")]
    NotSent,
    #[error("panel transport failed: {0}")]
    Transport(#[source] anyhow::Error),
    #[error("panel data source failed: {0}")]
    Source(#[source] anyhow::Error),
}

impl PanelError {
    /// Errors reported privately to the acting user. Session state is left untouched.
    pub fn is_user_facing(&self) -> bool {
        matches!(
            self,
            PanelError::NotAuthor
                | PanelError::LockFixed
                | PanelError::VoteOwn
                | PanelError::AlreadyVoted
                | PanelError::NoVote
        )
    }

    /// Errors after which the bound message can no longer be driven.
    pub fn is_fatal(&self) -> bool {
        matches!(self, PanelError::Transport(_) | PanelError::Source(_))
    }
}

pub type PanelResult<T> = std::result::Result<T, PanelError>;
