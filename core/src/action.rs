use alloc::vec::Vec;
use serde::{Deserialize, Serialize};

use crate::*;

/// A state-changing game intent, as delivered by the transport or recorded
/// in a game history.
///
/// `PlacePlayer` and `MovePlayer` record their apply-time outcome in
/// `succeeded`; `RemovePlayer` records the vacated row, which is not
/// recoverable from board state after removal. Both fields are consulted by
/// [`Board::undo_action`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum Action {
    SetEdgeWall { a: Pos, b: Pos, enabled: bool },
    SetRowWall { row: Coord, enabled: bool },
    PlaceGoal { pos: Pos },
    PlacePlayer { row: Coord, succeeded: bool },
    MovePlayer { direction: Direction, succeeded: bool },
    RemovePlayer { recovered_row: Option<Coord> },
    HighlightPosition { pos: Pos },
}

impl Action {
    pub const fn place_player(row: Coord) -> Self {
        Self::PlacePlayer { row, succeeded: false }
    }

    pub const fn move_player(direction: Direction) -> Self {
        Self::MovePlayer { direction, succeeded: false }
    }

    pub const fn remove_player() -> Self {
        Self::RemovePlayer { recovered_row: None }
    }

    /// Build-phase actions form the irreversible prefix of a game history.
    pub const fn is_build(&self) -> bool {
        matches!(
            self,
            Self::SetEdgeWall { .. } | Self::SetRowWall { .. } | Self::PlaceGoal { .. }
        )
    }
}

/// History entry: an action tagged with the actor the transport attributed
/// it to.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LoggedAction {
    pub actor: Option<PlayerId>,
    pub action: Action,
}

impl Board {
    /// Applies `action`, recording its outcome back into the variant where
    /// one exists. Total over the variant set: invalid or inapplicable
    /// actions are absorbed without mutating the grid.
    pub fn apply_action(&mut self, action: &mut Action) {
        match action {
            Action::SetEdgeWall { a, b, enabled } => {
                let Some(direction) = direction_between(*a, *b) else {
                    log::warn!("edge wall between non-adjacent cells {a:?} and {b:?}");
                    return;
                };
                if self.set_wall(*a, direction, *enabled).is_err() {
                    log::warn!("edge wall out of grid at {a:?}");
                }
            }
            Action::SetRowWall { row, enabled } => {
                if self.set_row_wall(*row, *enabled).is_err() {
                    log::warn!("row wall out of grid at row {row}");
                }
            }
            Action::PlaceGoal { pos } => {
                if !self.place_goal(*pos).is_applied() {
                    log::warn!("goal out of grid at {pos:?}");
                }
            }
            Action::PlacePlayer { row, succeeded } => {
                self.temporary_highlight((*row, 0), Highlight::Hint);
                *succeeded = self.place_player(*row).is_applied();
            }
            Action::MovePlayer { direction, succeeded } => {
                if let Some(pos) = self.player() {
                    self.temporary_highlight(next(pos, *direction), Highlight::Hint);
                }
                *succeeded = self.move_player(*direction, true).is_applied();
            }
            Action::RemovePlayer { recovered_row } => {
                if let Some(pos) = self.player() {
                    self.temporary_highlight(pos, Highlight::Hint);
                }
                *recovered_row = self.player().map(|pos| pos.0);
                self.remove_player(true);
            }
            Action::HighlightPosition { pos } => {
                self.temporary_highlight(*pos, Highlight::Hint);
            }
        }
    }

    /// Exact inverse of [`Board::apply_action`] for turn actions. Build
    /// actions (`SetEdgeWall`, `SetRowWall`, `PlaceGoal`) and
    /// `HighlightPosition` are not undoable at this layer and leave the
    /// board untouched.
    pub fn undo_action(&mut self, action: &Action) {
        match action {
            Action::PlacePlayer { .. } => {
                if let Some(vacated) = self.player() {
                    self.remove_player(false);
                    if self.goal() == Some(vacated) {
                        // The player overwrote the goal's occupant marker.
                        self.place_goal(vacated);
                    }
                }
            }
            Action::MovePlayer { direction, succeeded } => {
                if !succeeded {
                    // The original apply never mutated the board; re-issue
                    // the highlight hint at the cell the move aimed for.
                    if let Some(pos) = self.player() {
                        self.temporary_highlight(next(pos, *direction), Highlight::Hint);
                    }
                    return;
                }
                if let Some(vacated) = self.player() {
                    self.move_player(direction.reverse(), false);
                    if self.goal() == Some(vacated) {
                        self.place_goal(vacated);
                    }
                }
            }
            Action::RemovePlayer { recovered_row } => {
                if let Some(row) = recovered_row {
                    self.place_player(*row);
                }
            }
            Action::SetEdgeWall { .. }
            | Action::SetRowWall { .. }
            | Action::PlaceGoal { .. }
            | Action::HighlightPosition { .. } => {}
        }
    }

    /// Serializes the wall layout as a batch of `SetEdgeWall`/`SetRowWall`
    /// actions. Scanning only Right and Bottom from every cell reports each
    /// shared wall exactly once; each row whose boundary wall is set
    /// contributes one `SetRowWall` after that row's cells.
    pub fn set_wall_actions(&self) -> Vec<Action> {
        let mut actions = Vec::new();
        for row in 0..GRID_SIZE {
            for col in 0..GRID_SIZE {
                for direction in [Direction::Right, Direction::Bottom] {
                    let neighbor = next((row, col), direction);
                    if in_bounds(neighbor) && self.cell((row, col)).wall(direction) {
                        actions.push(Action::SetEdgeWall {
                            a: (row, col),
                            b: neighbor,
                            enabled: true,
                        });
                    }
                }
            }

            if self.cell((row, 0)).wall(Direction::Left) {
                actions.push(Action::SetRowWall { row, enabled: true });
            }
        }
        actions
    }
}
