use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;

/// Lifecycle status of a room. Only ever moves forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum RoomStatus {
    /// Lobby: players can join and the host can start the game.
    Waiting,
    /// Questions are being answered; submissions are collected.
    InProgress,
    /// Every player submitted and scores are final.
    Finished,
}

/// Events that can be applied to the room state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoomTransition {
    /// Host starts the game from the lobby.
    StartGame,
    /// The last outstanding submission arrived (or the last non-submitter left).
    AllSubmitted,
}

/// Error returned when attempting to apply an invalid transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("invalid transition: {event:?} cannot be applied while in {from:?}")]
pub struct InvalidTransition {
    /// The status the room was in when the invalid event was received.
    pub from: RoomStatus,
    /// The event that cannot be applied from this status.
    pub event: RoomTransition,
}

impl RoomStatus {
    /// Compute the status reached by applying `event`, if the transition is valid.
    pub fn next(self, event: RoomTransition) -> Result<RoomStatus, InvalidTransition> {
        let next = match (self, event) {
            (RoomStatus::Waiting, RoomTransition::StartGame) => RoomStatus::InProgress,
            (RoomStatus::InProgress, RoomTransition::AllSubmitted) => RoomStatus::Finished,
            (from, event) => return Err(InvalidTransition { from, event }),
        };

        Ok(next)
    }

    /// Wire name of the status, as serialized in snapshots.
    pub fn as_str(self) -> &'static str {
        match self {
            RoomStatus::Waiting => "waiting",
            RoomStatus::InProgress => "in_progress",
            RoomStatus::Finished => "finished",
        }
    }

    /// Position of the status in the forward-only lifecycle.
    pub fn rank(self) -> u8 {
        match self {
            RoomStatus::Waiting => 0,
            RoomStatus::InProgress => 1,
            RoomStatus::Finished => 2,
        }
    }
}
