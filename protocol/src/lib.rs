//! Wire format spoken with the game server: `{name, params}` action
//! encoding, `(kind, actor)` phase tuples, and backend board snapshots.
//!
//! Action params carry 1-based positions and directions; backend snapshot
//! cells are 0-based. The [`convert`] module is the only place those offsets
//! are applied.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use pathfinder_core::PlayerId;

pub use convert::*;

mod convert;

/// Position as it appears in action params: 1-based `(row, col)`.
pub type WirePos = (u8, u8);

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    #[error("position out of range: ({0}, {1})")]
    PositionOutOfRange(u8, u8),
    #[error("row out of range: {0}")]
    RowOutOfRange(u8),
    #[error("direction out of range: {0}")]
    DirectionOutOfRange(u8),
    #[error("phase event without an actor")]
    MissingActor,
    #[error("unknown phase kind: {0}")]
    UnknownPhase(String),
}

/// The two param shapes of `set_wall`: a shared-edge wall between two cells,
/// or a row boundary wall.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SetWallParams {
    Edge(WirePos, WirePos, bool),
    Row(u8, bool),
}

/// `move_player` params: the server echoes the bare direction, while
/// submissions also carry the computed target cell.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MovePlayerParams {
    WithTarget(u8, WirePos),
    Bare((u8,)),
}

impl MovePlayerParams {
    pub const fn direction(self) -> u8 {
        match self {
            Self::WithTarget(direction, _) => direction,
            Self::Bare((direction,)) => direction,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "name", content = "params", rename_all = "snake_case")]
pub enum WireAction {
    SetWall(SetWallParams),
    PlaceGoal((WirePos,)),
    PlacePlayer((u8,)),
    MovePlayer(MovePlayerParams),
    RemovePlayer(Vec<u8>),
    HighlightPosition((WirePos,)),
}

/// One entry of an inbound change batch: an action plus the actor the server
/// attributed it to.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct WireChange {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<PlayerId>,
    #[serde(flatten)]
    pub action: WireAction,
}

type PhaseRepr = (String, Option<PlayerId>);

/// Authoritative phase descriptor, encoded on the wire as a
/// `[kind, actor]` tuple: `["build", id|null]`, `["turn", id]`,
/// `["win", id]`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "PhaseRepr", into = "PhaseRepr")]
pub enum PhaseEvent {
    Build { builder: Option<PlayerId> },
    Turn { actor: PlayerId },
    Win { winner: PlayerId },
}

impl TryFrom<PhaseRepr> for PhaseEvent {
    type Error = DecodeError;

    fn try_from((kind, actor): PhaseRepr) -> Result<Self, Self::Error> {
        match kind.as_str() {
            "build" => Ok(Self::Build { builder: actor }),
            "turn" => Ok(Self::Turn {
                actor: actor.ok_or(DecodeError::MissingActor)?,
            }),
            "win" => Ok(Self::Win {
                winner: actor.ok_or(DecodeError::MissingActor)?,
            }),
            _ => Err(DecodeError::UnknownPhase(kind)),
        }
    }
}

impl From<PhaseEvent> for PhaseRepr {
    fn from(event: PhaseEvent) -> Self {
        match event {
            PhaseEvent::Build { builder } => ("build".into(), builder),
            PhaseEvent::Turn { actor } => ("turn".into(), Some(actor)),
            PhaseEvent::Win { winner } => ("win".into(), Some(winner)),
        }
    }
}

/// Inbound `next` event: accepted changes together with the phase that
/// follows them.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NextMessage {
    pub changes: Vec<WireChange>,
    pub state: PhaseEvent,
}

/// One cell of a backend board snapshot. Coordinates are 0-based here.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackendCell {
    #[serde(default)]
    pub data: Option<String>,
    pub top: bool,
    pub right: bool,
    pub bottom: bool,
    pub left: bool,
    pub row: u8,
    pub col: u8,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackendBoard {
    pub cells: Vec<BackendCell>,
    pub player: Option<WirePos>,
    pub goal: Option<WirePos>,
}

/// Join response for a player already part of a game.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackendPlayer {
    pub board: BackendBoard,
    pub enemy_board: BackendBoard,
    pub state: PhaseEvent,
}

/// Outbound build submission: the whole maze as one batch.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildPayload {
    pub changes: Vec<WireAction>,
}

/// Outbound turn submission: exactly one action, answered with an
/// accept/reject response.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TurnPayload {
    pub action: WireAction,
}
