use alloc::vec::Vec;

use crate::*;

/// Steppable reconstruction of a game from its full action history.
///
/// The maximal leading run of build actions is applied to the two boards
/// once, at construction, and is never replayed interactively; the remaining
/// turn actions are walked with [`Replay::step_forward`] and
/// [`Replay::step_backward`].
#[derive(Clone, Debug)]
pub struct Replay {
    player_board: Board,
    enemy_board: Board,
    player_id: PlayerId,
    changes: Vec<LoggedAction>,
    /// Number of turn actions currently applied; the cursor sits between
    /// `applied - 1` and `applied`.
    applied: usize,
}

impl Replay {
    pub fn new(player_id: PlayerId, mut changes: Vec<LoggedAction>) -> Self {
        let mut player_board = Board::new();
        let mut enemy_board = Board::new();

        let split = changes
            .iter()
            .position(|change| !change.action.is_build())
            .unwrap_or(changes.len());
        let turn_changes = changes.split_off(split);

        // Build actions land on their author's own board.
        for change in &mut changes {
            let board = if change.actor.as_deref() == Some(player_id.as_str()) {
                &mut player_board
            } else {
                &mut enemy_board
            };
            board.apply_action(&mut change.action);
        }

        Self {
            player_board,
            enemy_board,
            player_id,
            changes: turn_changes,
            applied: 0,
        }
    }

    pub fn player_board(&self) -> &Board {
        &self.player_board
    }

    pub fn enemy_board(&self) -> &Board {
        &self.enemy_board
    }

    /// Number of steppable turn actions.
    pub fn len(&self) -> usize {
        self.changes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }

    /// Number of turn actions currently applied.
    pub fn position(&self) -> usize {
        self.applied
    }

    /// Applies the next turn action, if any. No-op at the end of history.
    ///
    /// Turn actions land on the board *opposite* their author: from the
    /// viewer's perspective an own-authored action plays out on the enemy
    /// board, exactly as in the live game.
    pub fn step_forward(&mut self) -> bool {
        if self.applied >= self.changes.len() {
            return false;
        }

        let index = self.applied;
        let board = if self.changes[index].actor.as_deref() == Some(self.player_id.as_str()) {
            &mut self.enemy_board
        } else {
            &mut self.player_board
        };
        board.apply_action(&mut self.changes[index].action);
        self.applied += 1;
        true
    }

    /// Undoes the most recently applied turn action, if any. No-op before
    /// the first action.
    pub fn step_backward(&mut self) -> bool {
        if self.applied == 0 {
            return false;
        }

        self.applied -= 1;
        let index = self.applied;
        let board = if self.changes[index].actor.as_deref() == Some(self.player_id.as_str()) {
            &mut self.enemy_board
        } else {
            &mut self.player_board
        };
        board.undo_action(&self.changes[index].action);
        true
    }
}
