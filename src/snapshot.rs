//! Read-only view of the game handed to the renderer each frame.

use crate::block::{Block, BlockColor, ShapeKind};
use crate::controller::{GameState, LoseReason};
use crate::grid::{Grid, SPAWN_BUFFER_ROWS};

/// One occupied cell as the renderer sees it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CellView {
    pub x: usize,
    pub y: usize,
    pub kind: ShapeKind,
    pub color: BlockColor,
    pub is_trigger: bool,
}

impl From<&Block> for CellView {
    fn from(b: &Block) -> Self {
        Self {
            x: b.x as usize,
            y: b.y as usize,
            kind: b.kind(),
            color: b.color(),
            is_trigger: b.is_trigger(),
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Snapshot<'a> {
    grid: &'a Grid,
    pub score: u32,
    /// Seconds, never negative.
    pub time_left: f64,
    pub target_score: u32,
    pub state: GameState,
    pub lose_reason: Option<LoseReason>,
}

impl<'a> Snapshot<'a> {
    pub(crate) fn new(
        grid: &'a Grid,
        score: u32,
        time_left: f64,
        target_score: u32,
        state: GameState,
        lose_reason: Option<LoseReason>,
    ) -> Self {
        Self {
            grid,
            score,
            time_left: time_left.max(0.0),
            target_score,
            state,
            lose_reason,
        }
    }

    #[inline]
    pub fn width(&self) -> usize {
        self.grid.width()
    }

    #[inline]
    pub fn height(&self) -> usize {
        self.grid.height()
    }

    /// First row below the hidden spawn buffer.
    #[inline]
    pub fn visible_top(&self) -> usize {
        SPAWN_BUFFER_ROWS
    }

    pub fn cells(&self) -> impl Iterator<Item = CellView> + 'a {
        self.grid.locked_blocks().map(CellView::from)
    }

    pub fn active(&self) -> impl Iterator<Item = CellView> + 'a {
        self.grid.active().iter().map(CellView::from)
    }

    /// Score progress toward the goal, 0.0..=1.0.
    pub fn progress(&self) -> f64 {
        if self.target_score == 0 {
            return 1.0;
        }
        (f64::from(self.score) / f64::from(self.target_score)).min(1.0)
    }
}
