//! Signal switching edges

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Index, IndexMut};

/// Switching direction of a signal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RiseFall {
    Rise,
    Fall,
}

impl RiseFall {
    /// Both edges in stable order (rise, then fall)
    pub const ALL: [RiseFall; 2] = [RiseFall::Rise, RiseFall::Fall];

    /// Stable slot index
    pub fn index(self) -> usize {
        match self {
            RiseFall::Rise => 0,
            RiseFall::Fall => 1,
        }
    }

    pub fn from_index(index: usize) -> Option<Self> {
        match index {
            0 => Some(RiseFall::Rise),
            1 => Some(RiseFall::Fall),
            _ => None,
        }
    }

    /// Iterate over both edges
    pub fn range() -> impl Iterator<Item = RiseFall> {
        Self::ALL.into_iter()
    }

    pub fn opposite(self) -> Self {
        match self {
            RiseFall::Rise => RiseFall::Fall,
            RiseFall::Fall => RiseFall::Rise,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            RiseFall::Rise => "rise",
            RiseFall::Fall => "fall",
        }
    }
}

impl fmt::Display for RiseFall {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Exactly one value per edge
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RiseFallPair<T> {
    values: [T; 2],
}

impl<T> RiseFallPair<T> {
    pub fn new(rise: T, fall: T) -> Self {
        Self {
            values: [rise, fall],
        }
    }

    pub fn get(&self, rf: RiseFall) -> &T {
        &self.values[rf.index()]
    }

    pub fn get_mut(&mut self, rf: RiseFall) -> &mut T {
        &mut self.values[rf.index()]
    }

    /// Iterate `(edge, value)` in rise, fall order
    pub fn iter(&self) -> impl Iterator<Item = (RiseFall, &T)> {
        RiseFall::range().zip(self.values.iter())
    }
}

impl<T> Index<RiseFall> for RiseFallPair<T> {
    type Output = T;

    fn index(&self, rf: RiseFall) -> &T {
        self.get(rf)
    }
}

impl<T> IndexMut<RiseFall> for RiseFallPair<T> {
    fn index_mut(&mut self, rf: RiseFall) -> &mut T {
        self.get_mut(rf)
    }
}
