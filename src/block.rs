//! Blocks: shape kinds, colours and the match key.

/// The six shape kinds. `Diamond` is the trigger kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ShapeKind {
    Triangle,
    Square,
    Circle,
    Pentagon,
    Star,
    Diamond,
}

impl ShapeKind {
    pub const ALL: [Self; 6] = [
        Self::Triangle,
        Self::Square,
        Self::Circle,
        Self::Pentagon,
        Self::Star,
        Self::Diamond,
    ];

    /// Fixed shape → colour table.
    pub fn color(self) -> BlockColor {
        match self {
            Self::Triangle => BlockColor::Red,
            Self::Square => BlockColor::Blue,
            Self::Circle => BlockColor::Pink,
            Self::Pentagon => BlockColor::Yellow,
            Self::Star => BlockColor::Purple,
            Self::Diamond => BlockColor::White,
        }
    }

    /// Clearing a trigger block clears its whole row.
    #[inline]
    pub fn is_trigger(self) -> bool {
        self == Self::Diamond
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum BlockColor {
    Red,
    Blue,
    Pink,
    Yellow,
    Purple,
    White,
}

impl BlockColor {
    /// Index 0..6 into the theme's block palette.
    pub fn index(self) -> usize {
        match self {
            Self::Red => 0,
            Self::Blue => 1,
            Self::Pink => 2,
            Self::Yellow => 3,
            Self::Purple => 4,
            Self::White => 5,
        }
    }
}

/// Two blocks match when both kind and colour are equal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MatchKey {
    pub kind: ShapeKind,
    pub color: BlockColor,
}

/// One 1x1 unit on the board. Shape and colour never change after spawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Block {
    pub x: i32,
    pub y: i32,
    kind: ShapeKind,
    color: BlockColor,
}

impl Block {
    pub fn new(x: i32, y: i32, kind: ShapeKind) -> Self {
        Self {
            x,
            y,
            kind,
            color: kind.color(),
        }
    }

    #[inline]
    pub fn kind(&self) -> ShapeKind {
        self.kind
    }

    #[inline]
    pub fn color(&self) -> BlockColor {
        self.color
    }

    #[inline]
    pub fn is_trigger(&self) -> bool {
        self.kind.is_trigger()
    }

    #[inline]
    pub fn match_key(&self) -> MatchKey {
        MatchKey {
            kind: self.kind,
            color: self.color,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_diamond_is_trigger() {
        for kind in ShapeKind::ALL {
            assert_eq!(Block::new(0, 0, kind).is_trigger(), kind == ShapeKind::Diamond);
        }
    }

    #[test]
    fn test_colour_indices_are_distinct() {
        let mut seen = [false; 6];
        for kind in ShapeKind::ALL {
            let i = kind.color().index();
            assert!(!seen[i]);
            seen[i] = true;
        }
    }

    #[test]
    fn test_match_key_ignores_position() {
        let a = Block::new(0, 0, ShapeKind::Star);
        let b = Block::new(5, 9, ShapeKind::Star);
        let c = Block::new(0, 0, ShapeKind::Circle);
        assert_eq!(a.match_key(), b.match_key());
        assert_ne!(a.match_key(), c.match_key());
    }
}
