use alloc::string::String;
use alloc::vec::Vec;
use core::time::Duration;
use ndarray::Array2;
use serde::{Deserialize, Serialize};

use crate::*;

/// How long a timed highlight stays on the board before its handle expires.
pub const HIGHLIGHT_TIMEOUT: Duration = Duration::from_millis(1000);

/// Board phase. `BuildWalls` carries the transient first cell of the
/// two-click wall gesture; the payload does not exist in any other phase.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Phase {
    Idle,
    BuildWalls { first_cell: Option<Pos> },
    BuildGoal,
    MovePlayer,
    PlacePlayer,
    Won,
}

impl Phase {
    pub const fn kind(self) -> PhaseKind {
        match self {
            Self::Idle => PhaseKind::Idle,
            Self::BuildWalls { .. } => PhaseKind::BuildWalls,
            Self::BuildGoal => PhaseKind::BuildGoal,
            Self::MovePlayer => PhaseKind::MovePlayer,
            Self::PlacePlayer => PhaseKind::PlacePlayer,
            Self::Won => PhaseKind::Won,
        }
    }
}

impl Default for Phase {
    fn default() -> Self {
        Self::Idle
    }
}

/// Payload-free phase selector accepted by [`Board::transition`].
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum PhaseKind {
    Idle,
    BuildWalls,
    BuildGoal,
    MovePlayer,
    PlacePlayer,
    Won,
}

impl PhaseKind {
    const fn into_phase(self) -> Phase {
        match self {
            Self::Idle => Phase::Idle,
            Self::BuildWalls => Phase::BuildWalls { first_cell: None },
            Self::BuildGoal => Phase::BuildGoal,
            Self::MovePlayer => Phase::MovePlayer,
            Self::PlacePlayer => Phase::PlacePlayer,
            Self::Won => Phase::Won,
        }
    }
}

/// Token for a pending timed highlight clear.
///
/// The embedding schedules the clear after [`HighlightHandle::delay`] and
/// hands the token back to [`Board::expire_highlight`]; any later highlight
/// write to the cell invalidates it, so a stale clear is a harmless no-op.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct HighlightHandle {
    pos: Pos,
    generation: u32,
    delay: Duration,
}

impl HighlightHandle {
    pub const fn pos(&self) -> Pos {
        self.pos
    }

    pub const fn delay(&self) -> Duration {
        self.delay
    }
}

/// One cell of an authoritative backend snapshot.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SnapshotCell {
    pub pos: Pos,
    pub walls: [bool; 4],
    pub marker: bool,
}

/// Backend board snapshot, consumed once via [`Board::load_from_backend`].
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct BoardSnapshot {
    pub cells: Vec<SnapshotCell>,
    pub player: Option<Pos>,
    pub goal: Option<Pos>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Board {
    cells: Array2<Cell>,
    player: Option<Pos>,
    goal: Option<Pos>,
    phase: Phase,
    #[serde(skip)]
    pending_highlights: Vec<HighlightHandle>,
}

impl Board {
    /// Fresh grid: boundary walls set, no player, no goal, `Idle` phase.
    pub fn new() -> Self {
        let mut board = Self {
            cells: Array2::default([GRID_SIZE as usize, GRID_SIZE as usize]),
            player: None,
            goal: None,
            phase: Default::default(),
            pending_highlights: Vec::new(),
        };

        for i in 0..GRID_SIZE {
            board.cell_mut((0, i)).set_wall(Direction::Top, true);
            board.cell_mut((GRID_SIZE - 1, i)).set_wall(Direction::Bottom, true);
            board.cell_mut((i, GRID_SIZE - 1)).set_wall(Direction::Right, true);
        }
        board
    }

    pub fn cell(&self, pos: Pos) -> &Cell {
        &self.cells[pos.to_nd_index()]
    }

    pub(crate) fn cell_mut(&mut self, pos: Pos) -> &mut Cell {
        &mut self.cells[pos.to_nd_index()]
    }

    pub fn player(&self) -> Option<Pos> {
        self.player
    }

    pub fn goal(&self) -> Option<Pos> {
        self.goal
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Restores a previously read phase value verbatim, without the highlight
    /// seeding [`Board::transition`] performs.
    pub fn set_phase(&mut self, phase: Phase) {
        self.phase = phase;
    }

    /// Flips the wall between `pos` and its neighbor in `direction`, on both
    /// sides of the shared edge.
    pub fn toggle_wall(&mut self, pos: Pos, direction: Direction) -> Result<()> {
        let neighbor = next(pos, direction);
        if !in_bounds(pos) || !in_bounds(neighbor) {
            return Err(GameError::InvalidCoords);
        }

        self.cell_mut(pos).toggle_wall(direction);
        self.cell_mut(neighbor).toggle_wall(direction.reverse());
        Ok(())
    }

    /// Sets the wall between `pos` and its neighbor in `direction` to a known
    /// value, on both sides of the shared edge.
    pub fn set_wall(&mut self, pos: Pos, direction: Direction, enabled: bool) -> Result<()> {
        let neighbor = next(pos, direction);
        if !in_bounds(pos) || !in_bounds(neighbor) {
            return Err(GameError::InvalidCoords);
        }

        self.cell_mut(pos).set_wall(direction, enabled);
        self.cell_mut(neighbor).set_wall(direction.reverse(), enabled);
        Ok(())
    }

    /// Flips the Left boundary wall of `(row, 0)`. Single-sided: this edge is
    /// the grid boundary and has no mirrored neighbor.
    pub fn toggle_row_wall(&mut self, row: Coord) -> Result<()> {
        if !in_bounds((row, 0)) {
            return Err(GameError::InvalidCoords);
        }

        self.cell_mut((row, 0)).toggle_wall(Direction::Left);
        Ok(())
    }

    pub fn set_row_wall(&mut self, row: Coord, enabled: bool) -> Result<()> {
        if !in_bounds((row, 0)) {
            return Err(GameError::InvalidCoords);
        }

        self.cell_mut((row, 0)).set_wall(Direction::Left, enabled);
        Ok(())
    }

    /// Clears every highlight on the grid.
    pub fn clear_grid(&mut self) {
        for cell in self.cells.iter_mut() {
            if cell.highlight().is_some() {
                cell.set_highlight(None);
            }
        }
    }

    /// Flips the cell's highlight between `Selected` and cleared, and every
    /// in-bounds 4-neighbor between `Hint` and cleared. With
    /// `go_through_walls` false, neighbors behind a wall are skipped entirely
    /// (movement hints); wall-selection hints ignore walls.
    pub fn toggle_highlight(&mut self, pos: Pos, go_through_walls: bool) {
        if !in_bounds(pos) {
            return;
        }

        let cell = self.cell_mut(pos);
        let toggled = match cell.highlight() {
            Some(_) => None,
            None => Some(Highlight::Selected),
        };
        cell.set_highlight(toggled);

        for direction in Direction::ALL {
            if !go_through_walls && self.cell(pos).wall(direction) {
                continue;
            }

            let neighbor = next(pos, direction);
            if !in_bounds(neighbor) {
                continue;
            }

            let cell = self.cell_mut(neighbor);
            let toggled = match cell.highlight() {
                Some(_) => None,
                None => Some(Highlight::Hint),
            };
            cell.set_highlight(toggled);
        }
    }

    /// Sets a highlight and queues a handle for its deferred clear. The
    /// embedding drains the queue with [`Board::take_pending_highlights`] and
    /// must not block on the clear.
    pub fn temporary_highlight(&mut self, pos: Pos, highlight: Highlight) {
        if !in_bounds(pos) {
            return;
        }

        let generation = self.cell_mut(pos).set_highlight(Some(highlight));
        self.pending_highlights.push(HighlightHandle {
            pos,
            generation,
            delay: HIGHLIGHT_TIMEOUT,
        });
    }

    /// Handles queued by [`Board::temporary_highlight`] since the last call.
    pub fn take_pending_highlights(&mut self) -> Vec<HighlightHandle> {
        core::mem::take(&mut self.pending_highlights)
    }

    /// Clears the highlight the handle refers to, unless a later write
    /// superseded it. Returns whether anything was cleared.
    pub fn expire_highlight(&mut self, handle: &HighlightHandle) -> bool {
        if !in_bounds(handle.pos) {
            return false;
        }

        let cell = self.cell_mut(handle.pos);
        if cell.generation() != handle.generation {
            return false;
        }

        cell.set_highlight(None);
        true
    }

    /// Two-click wall gesture, active only in the `BuildWalls` phase.
    ///
    /// The first click selects a cell and hints its neighbors. A second click
    /// on the same leftmost-column cell toggles that row's boundary wall; on
    /// an adjacent cell it toggles the shared wall; anywhere else it only
    /// clears the selection.
    pub fn place_wall(&mut self, pos: Pos) {
        if !in_bounds(pos) {
            return;
        }
        let Phase::BuildWalls { first_cell } = self.phase else {
            return;
        };

        let Some(first) = first_cell else {
            self.toggle_highlight(pos, true);
            self.phase = Phase::BuildWalls { first_cell: Some(pos) };
            return;
        };

        if first == pos && pos.1 == 0 {
            self.toggle_row_wall(pos.0).ok();
            self.reset_place_wall();
            return;
        }

        if let Some(direction) = direction_between(first, pos) {
            self.toggle_wall(first, direction).ok();
        }
        self.reset_place_wall();
    }

    /// Clears the pending gesture cell and its highlights.
    pub fn reset_place_wall(&mut self) {
        let Phase::BuildWalls { first_cell: Some(first) } = self.phase else {
            return;
        };

        self.toggle_highlight(first, true);
        self.phase = Phase::BuildWalls { first_cell: None };
    }

    /// Enters `target`, clearing all highlights first and seeding the ones
    /// the new phase starts with.
    pub fn transition(&mut self, target: PhaseKind) {
        self.clear_grid();

        match target {
            PhaseKind::MovePlayer => {
                if let Some(pos) = self.player {
                    self.toggle_highlight(pos, false);
                }
            }
            PhaseKind::PlacePlayer => {
                // Candidate placement spots; row-wall gating is checked at
                // apply time, not hidden from the hint set.
                for row in 0..GRID_SIZE {
                    self.cell_mut((row, 0)).set_highlight(Some(Highlight::Hint));
                }
            }
            PhaseKind::Won => {
                if let Some(pos) = self.player {
                    self.cell_mut(pos).set_highlight(Some(Highlight::Success));
                }
            }
            PhaseKind::Idle | PhaseKind::BuildGoal | PhaseKind::BuildWalls => {}
        }

        self.phase = target.into_phase();
    }

    /// Places the player on the leftmost column of `row`. Rejected when that
    /// row's boundary wall is set.
    pub fn place_player(&mut self, row: Coord) -> ActionOutcome {
        if !in_bounds((row, 0)) || self.cell((row, 0)).wall(Direction::Left) {
            return ActionOutcome::Rejected;
        }

        if let Some(previous) = self.player {
            self.cell_mut(previous).set_occupant(None);
        }
        self.cell_mut((row, 0)).set_occupant(Some(Occupant::Player));
        self.player = Some((row, 0));
        ActionOutcome::Applied
    }

    /// Moves the player one cell in `direction`. Rejected when a wall blocks
    /// the edge or the destination leaves the grid.
    pub fn move_player(&mut self, direction: Direction, leave_marker: bool) -> ActionOutcome {
        let Some(pos) = self.player else {
            return ActionOutcome::Rejected;
        };
        if self.cell(pos).wall(direction) {
            return ActionOutcome::Rejected;
        }

        let target = next(pos, direction);
        if !in_bounds(target) {
            return ActionOutcome::Rejected;
        }

        let vacated = if leave_marker { Some(Occupant::Marker) } else { None };
        self.cell_mut(pos).set_occupant(vacated);
        self.cell_mut(target).set_occupant(Some(Occupant::Player));
        self.player = Some(target);
        ActionOutcome::Applied
    }

    /// Removes the player from the board. Rejected when the current cell's
    /// Left wall is set, mirroring the row gating used for placement.
    pub fn remove_player(&mut self, leave_marker: bool) -> ActionOutcome {
        let Some(pos) = self.player else {
            return ActionOutcome::Rejected;
        };
        if self.cell(pos).wall(Direction::Left) {
            return ActionOutcome::Rejected;
        }

        let vacated = if leave_marker { Some(Occupant::Marker) } else { None };
        self.cell_mut(pos).set_occupant(vacated);
        self.player = None;
        ActionOutcome::Applied
    }

    /// Relocates the goal, clearing the previous goal cell first.
    pub fn place_goal(&mut self, pos: Pos) -> ActionOutcome {
        if !in_bounds(pos) {
            return ActionOutcome::Rejected;
        }

        if let Some(previous) = self.goal {
            self.cell_mut(previous).set_occupant(None);
        }
        self.cell_mut(pos).set_occupant(Some(Occupant::Goal));
        self.goal = Some(pos);
        ActionOutcome::Applied
    }

    pub fn remove_goal(&mut self) {
        if let Some(pos) = self.goal {
            self.cell_mut(pos).set_occupant(None);
            self.goal = None;
        }
    }

    /// Replaces grid contents with an authoritative backend snapshot. The
    /// phase is left untouched. Nothing is mutated on invalid coordinates.
    pub fn load_from_backend(&mut self, snapshot: &BoardSnapshot) -> Result<()> {
        let coords_valid = snapshot.cells.iter().all(|cell| in_bounds(cell.pos))
            && snapshot.player.is_none_or(in_bounds)
            && snapshot.goal.is_none_or(in_bounds);
        if !coords_valid {
            return Err(GameError::InvalidCoords);
        }

        for snap in &snapshot.cells {
            let cell = self.cell_mut(snap.pos);
            *cell = Cell::default();
            for direction in Direction::ALL {
                cell.set_wall(direction, snap.walls[direction.index()]);
            }
            if snap.marker {
                cell.set_occupant(Some(Occupant::Marker));
            }
        }

        self.player = snapshot.player;
        self.goal = snapshot.goal;
        if let Some(pos) = self.player {
            self.cell_mut(pos).set_occupant(Some(Occupant::Player));
        }
        if let Some(pos) = self.goal {
            self.cell_mut(pos).set_occupant(Some(Occupant::Goal));
        }
        Ok(())
    }

    /// Full serialized form, reconstructible with [`Board::from_json`]. Used
    /// to resume an in-progress build after a reload.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }

    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }
}

impl Default for Board {
    fn default() -> Self {
        Self::new()
    }
}

/// Pending highlight handles are transient, not board state.
impl PartialEq for Board {
    fn eq(&self, other: &Self) -> bool {
        self.cells == other.cells
            && self.player == other.player
            && self.goal == other.goal
            && self.phase == other.phase
    }
}
