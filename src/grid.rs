//! Grid: cell matrix, falling cluster, match detection, gravity and combo scoring.

use crate::block::{Block, MatchKey, ShapeKind};
use rand::Rng;
use std::collections::HashSet;
use thiserror::Error;

pub const GRID_WIDTH: usize = 12;
/// Includes the invisible spawn buffer.
pub const GRID_HEIGHT: usize = 22;
/// Top rows where clusters spawn; locking a block here ends the game.
pub const SPAWN_BUFFER_ROWS: usize = 2;
/// Smallest connected group that clears.
pub const MIN_MATCH: usize = 4;

const MAX_CLUSTER_SIZE: usize = 3;

const NEIGHBOURS_8: [(i32, i32); 8] = [
    (-1, -1), (-1, 0), (-1, 1),
    (0, -1),           (0, 1),
    (1, -1),  (1, 0),  (1, 1),
];

/// Terminal signal from spawn or lock. The controller turns it into a loss.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum GameOver {
    #[error("spawn cell ({x}, {y}) is occupied")]
    SpawnBlocked { x: i32, y: i32 },
    #[error("block locked inside the spawn buffer at ({x}, {y})")]
    Overflow { x: i32, y: i32 },
}

/// A move or rotation that would leave the board or hit a locked block.
/// Nothing was mutated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("move rejected")]
pub struct MoveRejected;

/// Single cell of the matrix: empty or owning one locked block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cell {
    Empty,
    Locked(Block),
}

/// Who owns a cell address right now.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ownership {
    Free,
    Locked,
    Active,
}

/// Weighted shape selection as a cumulative table: one uniform draw in `0..total`.
#[derive(Debug, Clone)]
pub struct SpawnTable {
    cumulative: Vec<(u32, ShapeKind)>,
    total: u32,
}

impl SpawnTable {
    pub const NORMAL_WEIGHT: u32 = 10;
    pub const TRIGGER_WEIGHT: u32 = 3;

    pub fn new(weights: &[(ShapeKind, u32)]) -> Self {
        let mut total = 0;
        let cumulative = weights
            .iter()
            .filter(|(_, w)| *w > 0)
            .map(|&(kind, w)| {
                total += w;
                (total, kind)
            })
            .collect();
        Self { cumulative, total }
    }

    /// Every non-trigger kind weighs 10, the trigger kind 3.
    pub fn standard() -> Self {
        let weights: Vec<_> = ShapeKind::ALL
            .iter()
            .map(|&kind| {
                let w = if kind.is_trigger() {
                    Self::TRIGGER_WEIGHT
                } else {
                    Self::NORMAL_WEIGHT
                };
                (kind, w)
            })
            .collect();
        Self::new(&weights)
    }

    pub fn total(&self) -> u32 {
        self.total
    }

    /// Kind for a roll in `0..total`. Rolls past the end map to the last entry.
    pub fn pick(&self, roll: u32) -> ShapeKind {
        self.cumulative
            .iter()
            .find(|(upper, _)| roll < *upper)
            .or_else(|| self.cumulative.last())
            .map(|&(_, kind)| kind)
            .unwrap_or(ShapeKind::Triangle)
    }

    pub fn sample<R: Rng>(&self, rng: &mut R) -> ShapeKind {
        if self.total == 0 {
            return ShapeKind::Triangle;
        }
        self.pick(rng.random_range(0..self.total))
    }
}

impl Default for SpawnTable {
    fn default() -> Self {
        Self::standard()
    }
}

/// Result of resolving one lock: points earned, combo steps taken and every
/// cell address cleared along the way.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Cascade {
    pub score: u32,
    pub steps: u32,
    pub cleared: Vec<(usize, usize)>,
}

/// Points for one combo step: base by cleared count, scaled by step (x1, x1.5, x2), floored.
pub fn combo_score(cleared_count: usize, combo_step: u32) -> u32 {
    let base = if cleared_count >= 8 {
        500
    } else if cleared_count >= 6 {
        250
    } else {
        100
    };
    match combo_step {
        0 => base,
        1 => base * 3 / 2,
        _ => base * 2,
    }
}

/// Playfield. `columns[x][y]`; y=0 is the top, y grows downward.
#[derive(Debug, Clone)]
pub struct Grid {
    width: usize,
    height: usize,
    columns: Vec<Vec<Cell>>,
    active: Vec<Block>,
    spawn_table: SpawnTable,
}

impl Default for Grid {
    fn default() -> Self {
        Self::new(GRID_WIDTH, GRID_HEIGHT)
    }
}

impl Grid {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            columns: vec![vec![Cell::Empty; height]; width],
            active: Vec::with_capacity(MAX_CLUSTER_SIZE),
            spawn_table: SpawnTable::standard(),
        }
    }

    #[inline]
    pub fn width(&self) -> usize {
        self.width
    }

    #[inline]
    pub fn height(&self) -> usize {
        self.height
    }

    #[inline]
    pub fn get(&self, x: usize, y: usize) -> Option<Cell> {
        self.columns.get(x).and_then(|col| col.get(y)).copied()
    }

    #[inline]
    fn set(&mut self, x: usize, y: usize, cell: Cell) {
        if let Some(slot) = self.columns.get_mut(x).and_then(|col| col.get_mut(y)) {
            *slot = cell;
        }
    }

    #[inline]
    fn in_bounds(&self, x: i32, y: i32) -> bool {
        x >= 0 && y >= 0 && (x as usize) < self.width && (y as usize) < self.height
    }

    fn key_at(&self, x: usize, y: usize) -> Option<MatchKey> {
        match self.get(x, y) {
            Some(Cell::Locked(b)) => Some(b.match_key()),
            _ => None,
        }
    }

    /// Falling cluster blocks, pivot first.
    pub fn active(&self) -> &[Block] {
        &self.active
    }

    /// Locked blocks in column-major order.
    pub fn locked_blocks(&self) -> impl Iterator<Item = &Block> + '_ {
        self.columns.iter().flatten().filter_map(|cell| match cell {
            Cell::Locked(b) => Some(b),
            Cell::Empty => None,
        })
    }

    pub fn owner_at(&self, x: usize, y: usize) -> Ownership {
        if matches!(self.get(x, y), Some(Cell::Locked(_))) {
            Ownership::Locked
        } else if self
            .active
            .iter()
            .any(|b| b.x as usize == x && b.y as usize == y)
        {
            Ownership::Active
        } else {
            Ownership::Free
        }
    }

    /// In bounds and no locked block there. For spawn checks.
    pub fn is_valid_position(&self, x: i32, y: i32) -> bool {
        self.in_bounds(x, y) && self.get(x as usize, y as usize) == Some(Cell::Empty)
    }

    /// A cluster block may move onto free cells or cells its own cluster holds.
    fn fits_cluster(&self, x: i32, y: i32) -> bool {
        self.in_bounds(x, y) && self.owner_at(x as usize, y as usize) != Ownership::Locked
    }

    /// Random size 1..=3 and weighted kind, then [`Self::spawn_cluster`].
    pub fn spawn_new_shape<R: Rng>(&mut self, rng: &mut R) -> Result<(), GameOver> {
        let size = rng.random_range(1..=MAX_CLUSTER_SIZE);
        let kind = self.spawn_table.sample(rng);
        self.spawn_cluster(kind, size)
    }

    /// Stack `size` blocks of `kind` at the centre column from the top row down.
    /// The cluster replaces any previous one, even when the spawn is blocked.
    pub fn spawn_cluster(&mut self, kind: ShapeKind, size: usize) -> Result<(), GameOver> {
        let x = (self.width / 2) as i32;
        let size = size.clamp(1, MAX_CLUSTER_SIZE);
        self.active = (0..size).map(|y| Block::new(x, y as i32, kind)).collect();
        match self
            .active
            .iter()
            .find(|b| !self.is_valid_position(b.x, b.y))
        {
            Some(b) => Err(GameOver::SpawnBlocked { x: b.x, y: b.y }),
            None => Ok(()),
        }
    }

    /// Translate the whole cluster, or nothing at all.
    pub fn move_active_shape(&mut self, dx: i32, dy: i32) -> Result<(), MoveRejected> {
        if self.active.is_empty() {
            return Err(MoveRejected);
        }
        if !self
            .active
            .iter()
            .all(|b| self.fits_cluster(b.x + dx, b.y + dy))
        {
            return Err(MoveRejected);
        }
        for b in &mut self.active {
            b.x += dx;
            b.y += dy;
        }
        Ok(())
    }

    /// Quarter turn about the first block: (rx, ry) -> (-ry, rx). No wall kicks.
    pub fn rotate_active_shape(&mut self) -> Result<(), MoveRejected> {
        let Some(&pivot) = self.active.first() else {
            return Ok(());
        };
        if self.active.len() == 1 {
            return Ok(());
        }
        let mut targets = [(0i32, 0i32); MAX_CLUSTER_SIZE];
        for (target, b) in targets.iter_mut().zip(&self.active) {
            let (rx, ry) = (b.x - pivot.x, b.y - pivot.y);
            let (nx, ny) = (pivot.x - ry, pivot.y + rx);
            if !self.fits_cluster(nx, ny) {
                return Err(MoveRejected);
            }
            *target = (nx, ny);
        }
        for (b, &(nx, ny)) in self.active.iter_mut().zip(&targets) {
            b.x = nx;
            b.y = ny;
        }
        Ok(())
    }

    pub fn drop_active_shape(&mut self) -> Result<(), MoveRejected> {
        self.move_active_shape(0, 1)
    }

    /// Move the cluster into the matrix and resolve matches.
    /// The first block written inside the spawn buffer is an overflow: the
    /// remaining blocks are dropped and no matches resolve.
    pub fn lock_shape(&mut self) -> Result<Cascade, GameOver> {
        let blocks = std::mem::take(&mut self.active);
        for b in blocks {
            self.set(b.x as usize, b.y as usize, Cell::Locked(b));
            if (b.y as usize) < SPAWN_BUFFER_ROWS {
                let err = GameOver::Overflow { x: b.x, y: b.y };
                log::debug!("lock overflowed: {err}");
                return Err(err);
            }
        }
        Ok(self.check_and_clear_matches())
    }

    /// Clear, score, settle; repeat until the board is stable. Each pass is one combo step.
    pub fn check_and_clear_matches(&mut self) -> Cascade {
        let mut cascade = Cascade::default();
        loop {
            let matched = self.find_all_matches();
            if matched.is_empty() {
                break;
            }
            let mut cells: Vec<_> = matched.into_iter().collect();
            cells.sort_unstable();
            let count = self.clear_cells(&cells);
            let points = combo_score(count, cascade.steps);
            log::debug!(
                "combo step {}: cleared {} blocks for {} points",
                cascade.steps,
                count,
                points
            );
            cascade.score += points;
            cascade.cleared.extend(cells);
            self.apply_gravity();
            cascade.steps += 1;
        }
        cascade
    }

    /// Every cell that clears this pass: groups of MIN_MATCH or more, plus the
    /// full row of each trigger block inside such a group.
    pub fn find_all_matches(&self) -> HashSet<(usize, usize)> {
        let mut cleared = HashSet::new();
        let mut seen = vec![vec![false; self.height]; self.width];
        for x in 0..self.width {
            for y in 0..self.height {
                if seen[x][y] || cleared.contains(&(x, y)) || self.key_at(x, y).is_none() {
                    continue;
                }
                let group = self.component(x, y);
                for &(gx, gy) in &group {
                    seen[gx][gy] = true;
                }
                if group.len() < MIN_MATCH {
                    continue;
                }
                for &(gx, gy) in &group {
                    if matches!(self.get(gx, gy), Some(Cell::Locked(b)) if b.is_trigger()) {
                        self.add_row(gy, &mut cleared);
                    }
                }
                cleared.extend(group);
            }
        }
        cleared
    }

    /// 8-connected cells sharing the match key of (x, y).
    fn component(&self, x: usize, y: usize) -> Vec<(usize, usize)> {
        let Some(key) = self.key_at(x, y) else {
            return Vec::new();
        };
        let mut visited = HashSet::from([(x, y)]);
        let mut stack = vec![(x, y)];
        let mut group = Vec::new();
        while let Some((cx, cy)) = stack.pop() {
            group.push((cx, cy));
            for (dx, dy) in NEIGHBOURS_8 {
                let (nx, ny) = (cx as i32 + dx, cy as i32 + dy);
                if !self.in_bounds(nx, ny) {
                    continue;
                }
                let (nx, ny) = (nx as usize, ny as usize);
                if self.key_at(nx, ny) == Some(key) && visited.insert((nx, ny)) {
                    stack.push((nx, ny));
                }
            }
        }
        group
    }

    fn add_row(&self, y: usize, cleared: &mut HashSet<(usize, usize)>) {
        for x in 0..self.width {
            if self.key_at(x, y).is_some() {
                cleared.insert((x, y));
            }
        }
    }

    fn clear_cells(&mut self, cells: &[(usize, usize)]) -> usize {
        let mut count = 0;
        for &(x, y) in cells {
            if matches!(self.get(x, y), Some(Cell::Locked(_))) {
                self.set(x, y, Cell::Empty);
                count += 1;
            }
        }
        count
    }

    /// Compact every column toward the bottom, keeping vertical order.
    pub fn apply_gravity(&mut self) {
        let height = self.height;
        for col in &mut self.columns {
            let blocks: Vec<Block> = col
                .iter()
                .filter_map(|cell| match cell {
                    Cell::Locked(b) => Some(*b),
                    Cell::Empty => None,
                })
                .collect();
            col.fill(Cell::Empty);
            let top = height - blocks.len();
            for (i, mut b) in blocks.into_iter().enumerate() {
                b.y = (top + i) as i32;
                col[top + i] = Cell::Locked(b);
            }
        }
    }

    /// Empty board, no cluster.
    pub fn reset(&mut self) {
        for col in &mut self.columns {
            col.fill(Cell::Empty);
        }
        self.active.clear();
    }

    #[cfg(test)]
    pub fn place(&mut self, x: usize, y: usize, kind: ShapeKind) {
        self.set(x, y, Cell::Locked(Block::new(x as i32, y as i32, kind)));
    }
}
