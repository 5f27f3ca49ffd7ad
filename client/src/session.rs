use thiserror::Error;

use pathfinder_core::{
    Action, Board, BoardSnapshot, Coord, Direction, GameError, HighlightHandle, LoggedAction,
    Phase, PhaseKind, PlayerId, Pos, Replay, direction_between, in_bounds, next,
};
use pathfinder_protocol::{
    BackendPlayer, BuildPayload, DecodeError, MovePlayerParams, NextMessage, PhaseEvent,
    TurnPayload, WireAction, WireChange, encode_direction, encode_pos, encode_row,
};

use crate::storage::{BoardStore, storage_id};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
    #[error("Goal must be set before validation")]
    GoalMissing,
    #[error(
        "The maze is not valid; a valid maze has to have an unblocked path \
         from the left side of the board to the goal."
    )]
    InvalidMaze,
    #[error("No player token on the opponent board")]
    NoPlayer,
    #[error(transparent)]
    Game(#[from] GameError),
    #[error(transparent)]
    Decode(#[from] DecodeError),
}

/// Which of the session's two boards a value refers to.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum BoardSide {
    Mine,
    Theirs,
}

/// A turn action the player wants to submit, derived from a click on the
/// opponent board.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum TurnIntent {
    PlacePlayer { row: Coord },
    MovePlayer { direction: Direction },
    RemovePlayer { row: Coord },
}

/// One player's view of a running game: the own board being built, the
/// opponent board being played on, and the authoritative phase feed.
#[derive(Clone, Debug)]
pub struct Session {
    game_id: String,
    player_id: PlayerId,
    player_board: Board,
    enemy_board: Board,
    won: Option<bool>,
    error: Option<SessionError>,
}

impl Session {
    pub fn new(game_id: String, player_id: PlayerId) -> Self {
        Self {
            game_id,
            player_id,
            player_board: Board::new(),
            enemy_board: Board::new(),
            won: None,
            error: None,
        }
    }

    pub fn player_board(&self) -> &Board {
        &self.player_board
    }

    pub fn enemy_board(&self) -> &Board {
        &self.enemy_board
    }

    pub fn won(&self) -> Option<bool> {
        self.won
    }

    pub fn last_error(&self) -> Option<&SessionError> {
        self.error.as_ref()
    }

    /// Handles the join response. A returning player gets both boards from
    /// the backend, except that an in-progress build is resumed from the
    /// stored snapshot when one exists; a fresh game starts building locally.
    pub fn handle_join(
        &mut self,
        player: Option<&BackendPlayer>,
        store: &impl BoardStore,
    ) -> Result<(), SessionError> {
        let Some(player) = player else {
            self.player_board.transition(PhaseKind::BuildWalls);
            return Ok(());
        };

        let stored = store.load(&storage_id(&self.game_id));
        let resumed = match (&player.state, stored) {
            (PhaseEvent::Build { .. }, Some(json)) => match Board::from_json(&json) {
                Ok(board) => {
                    self.player_board = board;
                    true
                }
                Err(error) => {
                    log::warn!("stored build snapshot unreadable, using backend: {error}");
                    false
                }
            },
            _ => false,
        };
        if !resumed {
            self.player_board
                .load_from_backend(&BoardSnapshot::try_from(&player.board)?)?;
        }
        self.enemy_board
            .load_from_backend(&BoardSnapshot::try_from(&player.enemy_board)?)?;

        self.apply_phase(&player.state);
        Ok(())
    }

    /// Handles an inbound `next` event: applies each accepted change to the
    /// board it belongs to, then enters the announced phase. Undecodable
    /// changes are dropped at this boundary and never reach a board.
    pub fn handle_next(&mut self, message: &NextMessage) {
        for change in &message.changes {
            let mut logged = match LoggedAction::try_from(change) {
                Ok(logged) => logged,
                Err(error) => {
                    log::warn!("dropping malformed change: {error}");
                    continue;
                }
            };

            let board = match &message.state {
                PhaseEvent::Turn { actor } if *actor == self.player_id => &mut self.player_board,
                PhaseEvent::Turn { .. } => &mut self.enemy_board,
                PhaseEvent::Win { winner } if *winner == self.player_id => &mut self.enemy_board,
                PhaseEvent::Win { .. } => &mut self.player_board,
                // Build changes are only ever replayed from history, never
                // streamed live.
                PhaseEvent::Build { .. } => continue,
            };
            board.apply_action(&mut logged.action);
        }

        self.apply_phase(&message.state);
    }

    fn apply_phase(&mut self, state: &PhaseEvent) {
        match state {
            PhaseEvent::Build { builder } => {
                if builder.as_ref() == Some(&self.player_id) {
                    // The own build was accepted; wait for the opponent.
                    self.player_board.transition(PhaseKind::Idle);
                } else {
                    self.player_board.transition(PhaseKind::BuildWalls);
                }
            }
            PhaseEvent::Win { winner } => {
                if *winner == self.player_id {
                    self.won = Some(true);
                    self.enemy_board.transition(PhaseKind::Won);
                    self.player_board.transition(PhaseKind::Idle);
                } else {
                    self.won = Some(false);
                    self.enemy_board.transition(PhaseKind::Idle);
                    self.player_board.transition(PhaseKind::Won);
                }
            }
            PhaseEvent::Turn { actor } if *actor == self.player_id => {
                if self.enemy_board.player().is_none() {
                    self.enemy_board.transition(PhaseKind::PlacePlayer);
                } else {
                    self.enemy_board.transition(PhaseKind::MovePlayer);
                }
            }
            PhaseEvent::Turn { .. } => {
                self.player_board.transition(PhaseKind::Idle);
                self.enemy_board.transition(PhaseKind::Idle);
            }
        }
    }

    /// Build-phase click on the own board. The board is persisted after
    /// every click so a reload can resume the build.
    pub fn own_cell_clicked(&mut self, pos: Pos, store: &mut impl BoardStore) {
        match self.player_board.phase() {
            Phase::BuildWalls { .. } => self.player_board.place_wall(pos),
            Phase::BuildGoal => {
                self.player_board.place_goal(pos);
            }
            _ => return,
        }
        self.save_build(store);
    }

    /// Switches between the two build sub-phases.
    pub fn switch_build_phase(&mut self) {
        match self.player_board.phase() {
            Phase::BuildWalls { .. } => self.player_board.transition(PhaseKind::BuildGoal),
            Phase::BuildGoal => self.player_board.transition(PhaseKind::BuildWalls),
            _ => {}
        }
    }

    fn save_build(&self, store: &mut impl BoardStore) {
        match self.player_board.to_json() {
            Ok(json) => store.save(&storage_id(&self.game_id), &json),
            Err(error) => log::warn!("build snapshot serialization failed: {error}"),
        }
    }

    /// Drops the stored snapshot and starts the build over on a fresh board,
    /// carrying the current phase value over unchanged.
    pub fn clear_build(&mut self, store: &mut impl BoardStore) {
        store.remove(&storage_id(&self.game_id));
        let phase = self.player_board.phase();
        self.player_board = Board::new();
        self.player_board.set_phase(phase);
    }

    /// The finished maze as one submission batch: every wall, then the goal.
    /// Refused locally while no goal is placed.
    pub fn build_payload(&mut self) -> Result<BuildPayload, SessionError> {
        let Some(goal) = self.player_board.goal() else {
            self.error = Some(SessionError::GoalMissing);
            return Err(SessionError::GoalMissing);
        };

        let mut changes: Vec<WireAction> = self
            .player_board
            .set_wall_actions()
            .iter()
            .map(WireAction::from)
            .collect();
        changes.push(WireAction::from(&Action::PlaceGoal { pos: goal }));
        Ok(BuildPayload { changes })
    }

    pub fn build_accepted(&mut self) {
        self.error = None;
        self.player_board.transition(PhaseKind::Idle);
    }

    /// The authority found no open path from the left edge to the goal.
    pub fn build_rejected(&mut self) {
        self.error = Some(SessionError::InvalidMaze);
    }

    /// Maps a turn-phase click on the opponent board to a submittable
    /// intent. Clicks that cannot become a legal submission yield `None`.
    pub fn enemy_cell_clicked(&self, pos: Pos) -> Option<TurnIntent> {
        if !in_bounds(pos) {
            return None;
        }

        match self.enemy_board.phase() {
            Phase::MovePlayer => {
                let player = self.enemy_board.player()?;
                if player == pos && pos.1 == 0 {
                    return Some(TurnIntent::RemovePlayer { row: pos.0 });
                }

                let direction = direction_between(player, pos)?;
                if self.enemy_board.cell(player).wall(direction) {
                    return None;
                }
                Some(TurnIntent::MovePlayer { direction })
            }
            Phase::PlacePlayer if pos.1 == 0 => Some(TurnIntent::PlacePlayer { row: pos.0 }),
            _ => None,
        }
    }

    /// Wire payload for a turn intent. Move submissions also carry the
    /// computed target cell.
    pub fn turn_payload(&self, intent: TurnIntent) -> Result<TurnPayload, SessionError> {
        let action = match intent {
            TurnIntent::PlacePlayer { row } => WireAction::PlacePlayer((encode_row(row),)),
            TurnIntent::MovePlayer { direction } => {
                let player = self.enemy_board.player().ok_or(SessionError::NoPlayer)?;
                let target = next(player, direction);
                WireAction::MovePlayer(MovePlayerParams::WithTarget(
                    encode_direction(direction),
                    encode_pos(target),
                ))
            }
            TurnIntent::RemovePlayer { row } => WireAction::RemovePlayer(vec![encode_row(row)]),
        };
        Ok(TurnPayload { action })
    }

    pub fn turn_accepted(&mut self) {
        self.error = None;
    }

    /// The authority declined the action. The local mirror of the opponent
    /// board is patched with the wall that must have caused the reject, so
    /// the same submission is not immediately repeated.
    pub fn turn_rejected(&mut self, intent: TurnIntent) {
        match intent {
            TurnIntent::MovePlayer { direction } => {
                if let Some(player) = self.enemy_board.player() {
                    self.enemy_board.set_wall(player, direction, true).ok();
                }
            }
            TurnIntent::PlacePlayer { row } | TurnIntent::RemovePlayer { row } => {
                self.enemy_board.set_row_wall(row, true).ok();
            }
        }
    }

    /// Pending timed highlight clears from both boards. The embedding
    /// schedules each one after `handle.delay()` and feeds it back to
    /// [`Session::expire_highlight`]; stale handles expire harmlessly.
    pub fn take_highlight_timers(&mut self) -> Vec<(BoardSide, HighlightHandle)> {
        let mut timers: Vec<_> = self
            .player_board
            .take_pending_highlights()
            .into_iter()
            .map(|handle| (BoardSide::Mine, handle))
            .collect();
        timers.extend(
            self.enemy_board
                .take_pending_highlights()
                .into_iter()
                .map(|handle| (BoardSide::Theirs, handle)),
        );
        timers
    }

    pub fn expire_highlight(&mut self, side: BoardSide, handle: &HighlightHandle) -> bool {
        match side {
            BoardSide::Mine => self.player_board.expire_highlight(handle),
            BoardSide::Theirs => self.enemy_board.expire_highlight(handle),
        }
    }
}

/// Decodes a full serialized game history into a steppable [`Replay`],
/// viewed from `player_id`'s side.
pub fn replay_from_wire(
    player_id: PlayerId,
    changes: &[WireChange],
) -> Result<Replay, DecodeError> {
    let changes = changes
        .iter()
        .map(LoggedAction::try_from)
        .collect::<Result<Vec<_>, _>>()?;
    Ok(Replay::new(player_id, changes))
}

#[cfg(test)]
mod tests {
    use pathfinder_core::{ActionOutcome, Occupant};
    use pathfinder_protocol::{BackendBoard, SetWallParams};

    use crate::storage::MemoryStore;

    use super::*;

    const ME: &str = "p1";
    const ENEMY: &str = "p2";

    fn session() -> Session {
        Session::new("game-1".into(), ME.into())
    }

    fn backend_board(player: Option<(u8, u8)>, goal: Option<(u8, u8)>) -> BackendBoard {
        BackendBoard { cells: vec![], player, goal }
    }

    fn change(actor: &str, action: WireAction) -> WireChange {
        WireChange { user_id: Some(actor.into()), action }
    }

    #[test]
    fn joining_a_fresh_game_starts_building() {
        let mut session = session();
        session.handle_join(None, &MemoryStore::default()).unwrap();
        assert_eq!(
            session.player_board().phase(),
            Phase::BuildWalls { first_cell: None }
        );
    }

    #[test]
    fn joining_during_build_resumes_the_stored_snapshot() {
        let mut stored_board = Board::new();
        stored_board.toggle_wall((1, 1), Direction::Right).unwrap();
        stored_board.transition(PhaseKind::BuildWalls);

        let mut store = MemoryStore::default();
        store.save(&storage_id("game-1"), &stored_board.to_json().unwrap());

        let player = BackendPlayer {
            board: backend_board(None, None),
            enemy_board: backend_board(None, None),
            state: PhaseEvent::Build { builder: None },
        };

        let mut session = session();
        session.handle_join(Some(&player), &store).unwrap();
        assert!(session.player_board().cell((1, 1)).wall(Direction::Right));
        assert_eq!(
            session.player_board().phase(),
            Phase::BuildWalls { first_cell: None }
        );
    }

    #[test]
    fn joining_outside_build_uses_the_backend_snapshot() {
        let mut stale_board = Board::new();
        stale_board.toggle_wall((1, 1), Direction::Right).unwrap();

        let mut store = MemoryStore::default();
        store.save(&storage_id("game-1"), &stale_board.to_json().unwrap());

        let player = BackendPlayer {
            board: backend_board(None, Some((2, 2))),
            enemy_board: backend_board(Some((3, 0)), None),
            state: PhaseEvent::Turn { actor: ME.into() },
        };

        let mut session = session();
        session.handle_join(Some(&player), &store).unwrap();
        assert!(!session.player_board().cell((1, 1)).wall(Direction::Right));
        assert_eq!(session.player_board().goal(), Some((2, 2)));
        assert_eq!(session.enemy_board().player(), Some((3, 0)));
        // Our turn and a token is already placed.
        assert_eq!(session.enemy_board().phase(), Phase::MovePlayer);
    }

    #[test]
    fn opponent_turn_actions_land_on_the_own_board() {
        let mut session = session();
        let message = NextMessage {
            changes: vec![change(ENEMY, WireAction::PlacePlayer((2,)))],
            // The enemy placed; now it is our turn.
            state: PhaseEvent::Turn { actor: ME.into() },
        };
        session.handle_next(&message);

        assert_eq!(session.player_board().player(), Some((1, 0)));
        assert_eq!(session.enemy_board().player(), None);
        assert_eq!(session.enemy_board().phase(), Phase::PlacePlayer);
    }

    #[test]
    fn own_turn_actions_echoed_back_land_on_the_enemy_board() {
        let mut session = session();
        let message = NextMessage {
            changes: vec![change(ME, WireAction::PlacePlayer((4,)))],
            state: PhaseEvent::Turn { actor: ENEMY.into() },
        };
        session.handle_next(&message);

        assert_eq!(session.enemy_board().player(), Some((3, 0)));
        assert_eq!(session.player_board().phase(), Phase::Idle);
        assert_eq!(session.enemy_board().phase(), Phase::Idle);
    }

    #[test]
    fn malformed_changes_are_dropped_without_touching_the_board() {
        let mut session = session();
        let message = NextMessage {
            changes: vec![change(ENEMY, WireAction::PlacePlayer((9,)))],
            state: PhaseEvent::Turn { actor: ME.into() },
        };
        session.handle_next(&message);
        assert_eq!(session.player_board().player(), None);
    }

    #[test]
    fn winning_highlights_the_enemy_board() {
        let mut session = session();
        let message = NextMessage {
            changes: vec![],
            state: PhaseEvent::Win { winner: ME.into() },
        };
        session.handle_next(&message);

        assert_eq!(session.won(), Some(true));
        assert_eq!(session.enemy_board().phase(), Phase::Won);
        assert_eq!(session.player_board().phase(), Phase::Idle);
    }

    #[test]
    fn build_payload_requires_a_goal() {
        let mut session = session();
        assert_eq!(session.build_payload(), Err(SessionError::GoalMissing));
        assert_eq!(session.last_error(), Some(&SessionError::GoalMissing));
    }

    #[test]
    fn build_payload_lists_every_wall_then_the_goal() {
        let mut session = session();
        session.player_board.toggle_wall((0, 0), Direction::Right).unwrap();
        session.player_board.toggle_row_wall(2).unwrap();
        session.player_board.place_goal((5, 5));

        let payload = session.build_payload().unwrap();
        assert_eq!(
            serde_json::to_string(&payload.changes).unwrap(),
            r#"[{"name":"set_wall","params":[[1,1],[1,2],true]},{"name":"set_wall","params":[3,true]},{"name":"place_goal","params":[[6,6]]}]"#
        );
    }

    #[test]
    fn build_acceptance_leaves_the_build_phase() {
        let mut session = session();
        session.player_board.transition(PhaseKind::BuildWalls);
        session.build_rejected();
        assert_eq!(session.last_error(), Some(&SessionError::InvalidMaze));

        session.build_accepted();
        assert_eq!(session.last_error(), None);
        assert_eq!(session.player_board().phase(), Phase::Idle);
    }

    #[test]
    fn clicks_during_build_persist_the_board() {
        let mut session = session();
        let mut store = MemoryStore::default();
        session.player_board.transition(PhaseKind::BuildWalls);

        session.own_cell_clicked((2, 2), &mut store);
        session.own_cell_clicked((2, 3), &mut store);

        let stored = store.load(&storage_id("game-1")).unwrap();
        let restored = Board::from_json(&stored).unwrap();
        assert!(restored.cell((2, 2)).wall(Direction::Right));

        session.switch_build_phase();
        session.own_cell_clicked((4, 4), &mut store);
        let restored = Board::from_json(&store.load(&storage_id("game-1")).unwrap()).unwrap();
        assert_eq!(restored.goal(), Some((4, 4)));
    }

    #[test]
    fn clear_build_resets_the_board_but_keeps_the_phase() {
        let mut session = session();
        let mut store = MemoryStore::default();
        session.player_board.transition(PhaseKind::BuildGoal);
        session.own_cell_clicked((4, 4), &mut store);

        session.clear_build(&mut store);
        assert_eq!(session.player_board().goal(), None);
        assert_eq!(session.player_board().phase(), Phase::BuildGoal);
        assert_eq!(store.load(&storage_id("game-1")), None);
    }

    #[test]
    fn clicks_on_the_enemy_board_map_to_turn_intents() {
        let mut session = session();
        session.enemy_board.place_player(2);
        session.enemy_board.set_wall((2, 0), Direction::Top, true).unwrap();
        session.enemy_board.transition(PhaseKind::MovePlayer);

        assert_eq!(
            session.enemy_cell_clicked((2, 1)),
            Some(TurnIntent::MovePlayer { direction: Direction::Right })
        );
        assert_eq!(
            session.enemy_cell_clicked((2, 0)),
            Some(TurnIntent::RemovePlayer { row: 2 })
        );
        assert_eq!(session.enemy_cell_clicked((1, 0)), None, "wall blocks the move");
        assert_eq!(session.enemy_cell_clicked((4, 4)), None, "not adjacent");

        session.enemy_board.remove_player(false);
        session.enemy_board.transition(PhaseKind::PlacePlayer);
        assert_eq!(
            session.enemy_cell_clicked((5, 0)),
            Some(TurnIntent::PlacePlayer { row: 5 })
        );
        assert_eq!(session.enemy_cell_clicked((5, 1)), None);
    }

    #[test]
    fn move_submissions_carry_the_target_cell() {
        let mut session = session();
        session.enemy_board.place_player(1);

        let payload = session
            .turn_payload(TurnIntent::MovePlayer { direction: Direction::Right })
            .unwrap();
        assert_eq!(
            serde_json::to_string(&payload).unwrap(),
            r#"{"action":{"name":"move_player","params":[2,[2,2]]}}"#
        );

        let payload = session.turn_payload(TurnIntent::RemovePlayer { row: 1 }).unwrap();
        assert_eq!(
            serde_json::to_string(&payload).unwrap(),
            r#"{"action":{"name":"remove_player","params":[2]}}"#
        );
    }

    #[test]
    fn rejected_moves_patch_the_mirrored_wall() {
        let mut session = session();
        session.enemy_board.place_player(2);

        session.turn_rejected(TurnIntent::MovePlayer { direction: Direction::Right });
        assert!(session.enemy_board().cell((2, 0)).wall(Direction::Right));
        assert!(session.enemy_board().cell((2, 1)).wall(Direction::Left));

        // Retrying the same click is now filtered locally.
        session.enemy_board.transition(PhaseKind::MovePlayer);
        assert_eq!(session.enemy_cell_clicked((2, 1)), None);
    }

    #[test]
    fn rejected_placements_patch_the_row_wall() {
        let mut session = session();
        session.turn_rejected(TurnIntent::PlacePlayer { row: 3 });
        assert!(session.enemy_board().cell((3, 0)).wall(Direction::Left));
        assert_eq!(session.enemy_board.place_player(3), ActionOutcome::Rejected);
    }

    #[test]
    fn serialized_histories_decode_into_steppable_replays() {
        let changes = vec![
            change(ME, WireAction::SetWall(SetWallParams::Row(1, true))),
            change(ENEMY, WireAction::PlaceGoal(((3, 3),))),
            change(ENEMY, WireAction::PlacePlayer((4,))),
        ];

        let mut replay = replay_from_wire(ME.into(), &changes).unwrap();
        assert!(replay.player_board().cell((0, 0)).wall(Direction::Left));
        assert_eq!(replay.enemy_board().goal(), Some((2, 2)));
        assert_eq!(replay.len(), 1);

        // The enemy's placement plays out on the viewer's board.
        assert!(replay.step_forward());
        assert_eq!(replay.player_board().player(), Some((3, 0)));

        let malformed = vec![change(ME, WireAction::PlacePlayer((7,)))];
        assert!(replay_from_wire(ME.into(), &malformed).is_err());
    }

    #[test]
    fn highlight_timers_drain_from_both_boards() {
        let mut session = session();
        let message = NextMessage {
            changes: vec![change(ENEMY, WireAction::PlacePlayer((2,)))],
            state: PhaseEvent::Turn { actor: ME.into() },
        };
        session.handle_next(&message);

        let timers = session.take_highlight_timers();
        assert_eq!(timers.len(), 1);
        let (side, handle) = timers[0];
        assert_eq!(side, BoardSide::Mine);
        assert_eq!(handle.pos(), (1, 0));

        assert!(session.expire_highlight(side, &handle));
        assert_eq!(session.player_board().cell((1, 0)).highlight(), None);
        assert_eq!(session.player_board().cell((1, 0)).occupant(), Some(Occupant::Player));
        assert!(!session.expire_highlight(side, &handle), "second fire is inert");
    }
}
