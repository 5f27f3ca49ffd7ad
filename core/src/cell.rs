use serde::{Deserialize, Serialize};

use crate::Direction;

/// Token occupying a cell. `Marker` is left behind on cells the player has
/// vacated, forming a visible trail.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Occupant {
    Player,
    Goal,
    Marker,
}

/// Transient visual state. Not game-semantic, but board algorithms mutate it
/// and phase transitions must clear it deterministically.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Highlight {
    Selected,
    Hint,
    Success,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Cell {
    occupant: Option<Occupant>,
    walls: [bool; 4],
    highlight: Option<Highlight>,
    /// Bumped on every highlight write; pending timed clears compare against
    /// it so a superseded clear can never remove a newer highlight.
    #[serde(skip)]
    generation: u32,
}

impl Cell {
    pub fn occupant(&self) -> Option<Occupant> {
        self.occupant
    }

    pub fn highlight(&self) -> Option<Highlight> {
        self.highlight
    }

    pub fn wall(&self, direction: Direction) -> bool {
        self.walls[direction.index()]
    }

    pub fn walls(&self) -> [bool; 4] {
        self.walls
    }

    pub(crate) fn set_occupant(&mut self, occupant: Option<Occupant>) {
        self.occupant = occupant;
    }

    pub(crate) fn set_wall(&mut self, direction: Direction, enabled: bool) {
        self.walls[direction.index()] = enabled;
    }

    pub(crate) fn toggle_wall(&mut self, direction: Direction) {
        let index = direction.index();
        self.walls[index] = !self.walls[index];
    }

    /// Writes the highlight and returns the new generation token.
    pub(crate) fn set_highlight(&mut self, highlight: Option<Highlight>) -> u32 {
        self.generation = self.generation.wrapping_add(1);
        self.highlight = highlight;
        self.generation
    }

    pub(crate) fn generation(&self) -> u32 {
        self.generation
    }
}

/// The generation counter is transient identity, not board state.
impl PartialEq for Cell {
    fn eq(&self, other: &Self) -> bool {
        self.occupant == other.occupant
            && self.walls == other.walls
            && self.highlight == other.highlight
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn highlight_writes_bump_the_generation() {
        let mut cell = Cell::default();
        let first = cell.set_highlight(Some(Highlight::Hint));
        let second = cell.set_highlight(None);
        assert_ne!(first, second);
        assert_eq!(cell.generation(), second);
    }

    #[test]
    fn equality_ignores_the_generation() {
        let mut a = Cell::default();
        let mut b = Cell::default();
        a.set_highlight(Some(Highlight::Hint));
        a.set_highlight(None);
        b.set_highlight(None);
        assert_eq!(a, b);
    }

    #[test]
    fn toggle_wall_flips_one_flag() {
        let mut cell = Cell::default();
        cell.toggle_wall(Direction::Right);
        assert!(cell.wall(Direction::Right));
        assert!(!cell.wall(Direction::Left));
        cell.toggle_wall(Direction::Right);
        assert!(!cell.wall(Direction::Right));
    }
}
