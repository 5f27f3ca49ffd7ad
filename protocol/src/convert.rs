//! Conversions between the wire shapes and the typed core model.

use pathfinder_core::{
    Action, BoardSnapshot, Coord, Direction, GRID_SIZE, LoggedAction, Pos, SnapshotCell, in_bounds,
};

use crate::*;

/// Decodes a 1-based action-param position.
pub fn decode_pos(wire: WirePos) -> Result<Pos, DecodeError> {
    let (row, col) = wire;
    let valid = (1..=GRID_SIZE as u8).contains(&row) && (1..=GRID_SIZE as u8).contains(&col);
    if !valid {
        return Err(DecodeError::PositionOutOfRange(row, col));
    }
    Ok(((row - 1) as Coord, (col - 1) as Coord))
}

pub fn encode_pos(pos: Pos) -> WirePos {
    ((pos.0 + 1) as u8, (pos.1 + 1) as u8)
}

/// Decodes a 1-based row number.
pub fn decode_row(wire: u8) -> Result<Coord, DecodeError> {
    if !(1..=GRID_SIZE as u8).contains(&wire) {
        return Err(DecodeError::RowOutOfRange(wire));
    }
    Ok((wire - 1) as Coord)
}

pub fn encode_row(row: Coord) -> u8 {
    (row + 1) as u8
}

/// Decodes a 1-based direction number.
pub fn decode_direction(wire: u8) -> Result<Direction, DecodeError> {
    wire.checked_sub(1)
        .and_then(|index| Direction::from_index(index as usize))
        .ok_or(DecodeError::DirectionOutOfRange(wire))
}

pub fn encode_direction(direction: Direction) -> u8 {
    direction.index() as u8 + 1
}

/// Decodes a 0-based backend snapshot position.
pub fn decode_snapshot_pos(wire: WirePos) -> Result<Pos, DecodeError> {
    let out_of_range = DecodeError::PositionOutOfRange(wire.0, wire.1);
    let row = Coord::try_from(wire.0).map_err(|_| out_of_range.clone())?;
    let col = Coord::try_from(wire.1).map_err(|_| out_of_range.clone())?;
    if !in_bounds((row, col)) {
        return Err(out_of_range);
    }
    Ok((row, col))
}

impl TryFrom<&WireAction> for Action {
    type Error = DecodeError;

    fn try_from(wire: &WireAction) -> Result<Self, Self::Error> {
        Ok(match wire {
            WireAction::SetWall(SetWallParams::Edge(a, b, enabled)) => Action::SetEdgeWall {
                a: decode_pos(*a)?,
                b: decode_pos(*b)?,
                enabled: *enabled,
            },
            WireAction::SetWall(SetWallParams::Row(row, enabled)) => Action::SetRowWall {
                row: decode_row(*row)?,
                enabled: *enabled,
            },
            WireAction::PlaceGoal((pos,)) => Action::PlaceGoal { pos: decode_pos(*pos)? },
            WireAction::PlacePlayer((row,)) => Action::place_player(decode_row(*row)?),
            WireAction::MovePlayer(params) => {
                Action::move_player(decode_direction(params.direction())?)
            }
            // The commanded row is redundant: application reads the player's
            // actual position.
            WireAction::RemovePlayer(_) => Action::remove_player(),
            WireAction::HighlightPosition((pos,)) => Action::HighlightPosition {
                pos: decode_pos(*pos)?,
            },
        })
    }
}

impl From<&Action> for WireAction {
    fn from(action: &Action) -> Self {
        match action {
            Action::SetEdgeWall { a, b, enabled } => WireAction::SetWall(SetWallParams::Edge(
                encode_pos(*a),
                encode_pos(*b),
                *enabled,
            )),
            Action::SetRowWall { row, enabled } => {
                WireAction::SetWall(SetWallParams::Row(encode_row(*row), *enabled))
            }
            Action::PlaceGoal { pos } => WireAction::PlaceGoal((encode_pos(*pos),)),
            Action::PlacePlayer { row, .. } => WireAction::PlacePlayer((encode_row(*row),)),
            Action::MovePlayer { direction, .. } => {
                WireAction::MovePlayer(MovePlayerParams::Bare((encode_direction(*direction),)))
            }
            Action::RemovePlayer { recovered_row } => {
                WireAction::RemovePlayer(recovered_row.map(encode_row).into_iter().collect())
            }
            Action::HighlightPosition { pos } => {
                WireAction::HighlightPosition((encode_pos(*pos),))
            }
        }
    }
}

impl TryFrom<&WireChange> for LoggedAction {
    type Error = DecodeError;

    fn try_from(change: &WireChange) -> Result<Self, Self::Error> {
        Ok(LoggedAction {
            actor: change.user_id.clone(),
            action: Action::try_from(&change.action)?,
        })
    }
}

impl TryFrom<&BackendBoard> for BoardSnapshot {
    type Error = DecodeError;

    fn try_from(board: &BackendBoard) -> Result<Self, Self::Error> {
        let mut cells = Vec::with_capacity(board.cells.len());
        for cell in &board.cells {
            cells.push(SnapshotCell {
                pos: decode_snapshot_pos((cell.row, cell.col))?,
                walls: [cell.top, cell.right, cell.bottom, cell.left],
                marker: cell.data.as_deref() == Some("marker"),
            });
        }

        Ok(BoardSnapshot {
            cells,
            player: board.player.map(decode_snapshot_pos).transpose()?,
            goal: board.goal.map(decode_snapshot_pos).transpose()?,
        })
    }
}
