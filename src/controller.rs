//! Game controller: top-level state machine, countdown, fall timer and score.
//! Turns discrete actions and elapsed time into grid operations.

use crate::grid::{Cascade, GameOver, Grid};
use crate::snapshot::Snapshot;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

pub const TARGET_SCORE: u32 = 2000;
pub const TIME_LIMIT_SECS: f64 = 180.0;
/// Seconds between automatic drops.
pub const FALL_SPEED_SECS: f64 = 0.5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameState {
    Menu,
    Running,
    Paused,
    Lose,
    Win,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoseReason {
    SpawnBlocked,
    Overflow,
    TimeUp,
}

impl From<GameOver> for LoseReason {
    fn from(over: GameOver) -> Self {
        match over {
            GameOver::SpawnBlocked { .. } => Self::SpawnBlocked,
            GameOver::Overflow { .. } => Self::Overflow,
        }
    }
}

/// Discrete player action, one per key press.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Left,
    Right,
    Down,
    Rotate,
    PauseResume,
    Reset,
    ReturnToMenu,
}

#[derive(Debug)]
pub struct GameController<R = StdRng> {
    grid: Grid,
    score: u32,
    time_left: f64,
    target_score: u32,
    fall_timer: f64,
    fall_speed: f64,
    state: GameState,
    lose_reason: Option<LoseReason>,
    /// Last cascade that cleared something, until the renderer takes it.
    last_cascade: Option<Cascade>,
    rng: R,
}

impl GameController<StdRng> {
    /// Seeded for reproducible games, otherwise from OS entropy.
    pub fn from_seed(seed: Option<u64>) -> Self {
        let rng = seed.map_or_else(StdRng::from_os_rng, StdRng::seed_from_u64);
        Self::new(rng)
    }
}

impl<R: Rng> GameController<R> {
    pub fn new(rng: R) -> Self {
        Self {
            grid: Grid::default(),
            score: 0,
            time_left: TIME_LIMIT_SECS,
            target_score: TARGET_SCORE,
            fall_timer: 0.0,
            fall_speed: FALL_SPEED_SECS,
            state: GameState::Menu,
            lose_reason: None,
            last_cascade: None,
            rng,
        }
    }

    #[inline]
    pub fn state(&self) -> GameState {
        self.state
    }

    #[inline]
    pub fn score(&self) -> u32 {
        self.score
    }

    pub fn snapshot(&self) -> Snapshot<'_> {
        Snapshot::new(
            &self.grid,
            self.score,
            self.time_left,
            self.target_score,
            self.state,
            self.lose_reason,
        )
    }

    /// Hand the most recent clearing cascade to the caller (once).
    pub fn take_cascade(&mut self) -> Option<Cascade> {
        self.last_cascade.take()
    }

    fn set_state(&mut self, next: GameState) {
        if self.state != next {
            log::info!("game state {:?} -> {:?} (score {})", self.state, next, self.score);
            self.state = next;
        }
    }

    fn lose(&mut self, reason: LoseReason) {
        self.lose_reason = Some(reason);
        self.set_state(GameState::Lose);
    }

    /// Fresh board, full clock, first cluster; state becomes Running.
    pub fn reset(&mut self) {
        self.grid.reset();
        self.score = 0;
        self.time_left = TIME_LIMIT_SECS;
        self.fall_timer = 0.0;
        self.fall_speed = FALL_SPEED_SECS;
        self.lose_reason = None;
        self.last_cascade = None;
        self.set_state(GameState::Running);
        if let Err(over) = self.grid.spawn_new_shape(&mut self.rng) {
            log::warn!("first spawn failed: {over}");
            self.lose(over.into());
        }
    }

    pub fn return_to_menu(&mut self) {
        self.grid.reset();
        self.last_cascade = None;
        self.set_state(GameState::Menu);
    }

    pub fn toggle_pause(&mut self) {
        match self.state {
            GameState::Running => self.set_state(GameState::Paused),
            GameState::Paused => self.set_state(GameState::Running),
            _ => {}
        }
    }

    pub fn handle_input(&mut self, action: Action) {
        match action {
            Action::PauseResume => self.toggle_pause(),
            Action::Reset => {
                if self.state != GameState::Running {
                    self.reset();
                }
            }
            Action::ReturnToMenu => {
                if matches!(
                    self.state,
                    GameState::Paused | GameState::Lose | GameState::Win
                ) {
                    self.return_to_menu();
                }
            }
            _ if self.state != GameState::Running => {}
            // Rejected moves are simply ignored; only the timed drop locks.
            Action::Left => {
                let _ = self.grid.move_active_shape(-1, 0);
            }
            Action::Right => {
                let _ = self.grid.move_active_shape(1, 0);
            }
            Action::Down => {
                let _ = self.grid.move_active_shape(0, 1);
            }
            Action::Rotate => {
                let _ = self.grid.rotate_active_shape();
            }
        }
    }

    /// Advance the clock by `delta_time` seconds.
    pub fn update(&mut self, delta_time: f64) {
        if self.state != GameState::Running {
            return;
        }
        self.time_left -= delta_time;
        self.fall_timer += delta_time;
        if self.fall_timer >= self.fall_speed {
            self.fall_timer = 0.0;
            if self.grid.drop_active_shape().is_err() {
                match self.grid.lock_shape() {
                    Err(over) => {
                        log::debug!("lock failed: {over}");
                        self.lose(over.into());
                        return;
                    }
                    Ok(cascade) => {
                        self.score += cascade.score;
                        if cascade.steps > 0 {
                            log::debug!(
                                "cascade of {} steps scored {} (total {})",
                                cascade.steps,
                                cascade.score,
                                self.score
                            );
                            self.last_cascade = Some(cascade);
                        }
                        if let Err(over) = self.grid.spawn_new_shape(&mut self.rng) {
                            log::debug!("spawn failed: {over}");
                            // The lock that reached the goal still wins.
                            if self.score < self.target_score {
                                self.lose(over.into());
                            }
                        }
                    }
                }
            }
        }
        self.check_win_or_lose();
    }

    fn check_win_or_lose(&mut self) {
        if self.state != GameState::Running {
            return;
        }
        if self.score >= self.target_score {
            self.set_state(GameState::Win);
        } else if self.time_left <= 0.0 {
            self.time_left = 0.0;
            self.lose(LoseReason::TimeUp);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::block::{Block, ShapeKind};
    use crate::grid::{Cell, GRID_HEIGHT};

    fn running() -> GameController {
        let mut c = GameController::from_seed(Some(42));
        c.reset();
        c
    }

    fn board(c: &GameController) -> (Vec<Block>, Vec<Block>) {
        (
            c.grid.locked_blocks().copied().collect(),
            c.grid.active().to_vec(),
        )
    }

    #[test]
    fn test_starts_in_menu_and_ignores_moves() {
        let mut c = GameController::from_seed(Some(1));
        assert_eq!(c.state(), GameState::Menu);
        c.handle_input(Action::Left);
        c.update(10.0);
        assert_eq!(c.state(), GameState::Menu);
        assert!(c.grid.active().is_empty());
        assert_eq!(c.time_left, TIME_LIMIT_SECS);
    }

    #[test]
    fn test_reset_starts_running() {
        let c = running();
        assert_eq!(c.state(), GameState::Running);
        assert_eq!(c.score(), 0);
        assert_eq!(c.time_left, TIME_LIMIT_SECS);
        assert!(!c.grid.active().is_empty());
    }

    #[test]
    fn test_pause_withholds_updates() {
        let mut c = running();
        c.handle_input(Action::PauseResume);
        assert_eq!(c.state(), GameState::Paused);
        let before = board(&c);
        c.update(5.0);
        c.handle_input(Action::Left);
        c.handle_input(Action::Rotate);
        assert_eq!(c.time_left, TIME_LIMIT_SECS);
        assert_eq!(board(&c), before);
        c.handle_input(Action::PauseResume);
        assert_eq!(c.state(), GameState::Running);
    }

    #[test]
    fn test_reset_ignored_while_running() {
        let mut c = running();
        c.update(0.2);
        c.handle_input(Action::Reset);
        assert!(c.time_left < TIME_LIMIT_SECS);
    }

    #[test]
    fn test_inputs_move_cluster() {
        let mut c = running();
        c.grid.spawn_cluster(ShapeKind::Square, 1).unwrap();
        c.handle_input(Action::Left);
        c.handle_input(Action::Left);
        c.handle_input(Action::Right);
        c.handle_input(Action::Down);
        let b = c.grid.active()[0];
        assert_eq!((b.x, b.y), (5, 1));
    }

    #[test]
    fn test_single_block_lands_and_next_spawns() {
        let mut c = running();
        c.grid.spawn_cluster(ShapeKind::Triangle, 1).unwrap();
        for _ in 0..21 {
            c.update(FALL_SPEED_SECS);
        }
        assert_eq!(c.grid.active()[0].y, 21);
        c.update(FALL_SPEED_SECS);
        assert!(matches!(
            c.grid.get(6, 21),
            Some(Cell::Locked(b)) if b.kind() == ShapeKind::Triangle && b.y == 21
        ));
        assert_eq!(c.score(), 0);
        assert_eq!(c.state(), GameState::Running);
        assert_eq!(c.grid.active()[0].y, 0);
        assert!(c.take_cascade().is_none());
    }

    #[test]
    fn test_fall_timer_accumulates() {
        let mut c = running();
        c.grid.spawn_cluster(ShapeKind::Triangle, 1).unwrap();
        c.update(0.2);
        c.update(0.2);
        assert_eq!(c.grid.active()[0].y, 0);
        c.update(0.2);
        assert_eq!(c.grid.active()[0].y, 1);
    }

    #[test]
    fn test_lock_above_buffer_loses_and_freezes() {
        let mut c = running();
        let kinds = [ShapeKind::Triangle, ShapeKind::Square, ShapeKind::Circle];
        for y in 2..GRID_HEIGHT {
            c.grid.place(6, y, kinds[y % 3]);
        }
        c.grid.spawn_cluster(ShapeKind::Star, 1).unwrap();
        c.update(FALL_SPEED_SECS);
        assert_eq!(c.state(), GameState::Running);
        c.update(FALL_SPEED_SECS);
        assert_eq!(c.state(), GameState::Lose);
        assert_eq!(c.snapshot().lose_reason, Some(LoseReason::Overflow));

        let before = board(&c);
        let time = c.time_left;
        for _ in 0..10 {
            c.update(FALL_SPEED_SECS);
            c.handle_input(Action::Left);
            c.handle_input(Action::Down);
        }
        assert_eq!(board(&c), before);
        assert_eq!(c.time_left, time);
        assert_eq!(c.state(), GameState::Lose);
    }

    #[test]
    fn test_blocked_spawn_loses() {
        let mut c = running();
        c.grid.spawn_cluster(ShapeKind::Star, 1).unwrap();
        c.handle_input(Action::Left);
        c.grid.place(6, 0, ShapeKind::Square);
        for _ in 0..22 {
            c.update(FALL_SPEED_SECS);
        }
        assert!(matches!(c.grid.get(5, 21), Some(Cell::Locked(_))));
        assert_eq!(c.state(), GameState::Lose);
        assert_eq!(c.snapshot().lose_reason, Some(LoseReason::SpawnBlocked));
    }

    #[test]
    fn test_goal_on_last_lock_wins_despite_blocked_spawn() {
        let mut c = running();
        c.grid.spawn_cluster(ShapeKind::Star, 1).unwrap();
        c.handle_input(Action::Left);
        let kinds = [ShapeKind::Triangle, ShapeKind::Square, ShapeKind::Circle];
        for y in 0..GRID_HEIGHT {
            c.grid.place(6, y, kinds[y % 3]);
        }
        for x in 2..5 {
            c.grid.place(x, 21, ShapeKind::Star);
        }
        c.score = TARGET_SCORE - 50;
        for _ in 0..22 {
            c.update(FALL_SPEED_SECS);
        }
        assert_eq!(c.score(), TARGET_SCORE + 50);
        assert_eq!(c.state(), GameState::Win);
        assert_eq!(c.snapshot().lose_reason, None);
    }

    #[test]
    fn test_timeout_loses() {
        let mut c = running();
        c.update(TIME_LIMIT_SECS);
        assert_eq!(c.state(), GameState::Lose);
        assert_eq!(c.time_left, 0.0);
        assert_eq!(c.snapshot().lose_reason, Some(LoseReason::TimeUp));
    }

    #[test]
    fn test_reaching_target_wins() {
        let mut c = running();
        c.score = TARGET_SCORE;
        c.update(0.01);
        assert_eq!(c.state(), GameState::Win);
    }

    #[test]
    fn test_cascade_scores_and_is_reported_once() {
        let mut c = running();
        for x in 3..6 {
            c.grid.place(x, 21, ShapeKind::Star);
        }
        c.grid.spawn_cluster(ShapeKind::Star, 1).unwrap();
        for _ in 0..22 {
            c.update(FALL_SPEED_SECS);
        }
        assert_eq!(c.score(), 100);
        let cascade = c.take_cascade().unwrap();
        assert_eq!(cascade.cleared.len(), 4);
        assert!(c.take_cascade().is_none());
    }

    #[test]
    fn test_play_again_and_return_to_menu() {
        let mut c = running();
        c.update(TIME_LIMIT_SECS);
        assert_eq!(c.state(), GameState::Lose);
        c.handle_input(Action::Reset);
        assert_eq!(c.state(), GameState::Running);
        assert_eq!(c.time_left, TIME_LIMIT_SECS);
        assert_eq!(c.snapshot().lose_reason, None);

        c.handle_input(Action::PauseResume);
        c.handle_input(Action::ReturnToMenu);
        assert_eq!(c.state(), GameState::Menu);
        assert!(c.grid.active().is_empty());
        assert_eq!(c.grid.locked_blocks().count(), 0);
    }

    #[test]
    fn test_snapshot_clamps_time() {
        let mut c = running();
        c.time_left = -0.3;
        assert_eq!(c.snapshot().time_left, 0.0);
        assert_eq!(c.snapshot().target_score, TARGET_SCORE);
        assert_eq!(c.snapshot().active().count(), c.grid.active().len());
    }
}
