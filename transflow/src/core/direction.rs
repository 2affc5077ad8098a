//! Direction and output kind enums.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Which side of a transform is applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    /// The transform's primary effect.
    #[default]
    Forward,
    /// The best-effort undo of the primary effect.
    Reverse,
}

impl Direction {
    /// Maps the `reverse` flag of [`invoke`](crate::transforms::TransformExt::invoke) to a direction.
    #[must_use]
    pub const fn from_reverse_flag(reverse: bool) -> Self {
        if reverse {
            Self::Reverse
        } else {
            Self::Forward
        }
    }

    /// Returns true for [`Direction::Reverse`].
    #[must_use]
    pub const fn is_reverse(self) -> bool {
        matches!(self, Self::Reverse)
    }

    /// Returns the other direction.
    #[must_use]
    pub const fn opposite(self) -> Self {
        match self {
            Self::Forward => Self::Reverse,
            Self::Reverse => Self::Forward,
        }
    }
}

impl From<bool> for Direction {
    fn from(reverse: bool) -> Self {
        Self::from_reverse_flag(reverse)
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Forward => write!(f, "forward"),
            Self::Reverse => write!(f, "reverse"),
        }
    }
}

/// The shape of a transform's result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutputKind {
    /// A record that can continue through the pipeline.
    Record,
    /// Two aligned sequences.
    Pair,
    /// The record was dropped.
    Dropped,
}

impl fmt::Display for OutputKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Record => write!(f, "record"),
            Self::Pair => write!(f, "pair"),
            Self::Dropped => write!(f, "dropped"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_reverse_flag() {
        assert_eq!(Direction::from_reverse_flag(false), Direction::Forward);
        assert_eq!(Direction::from_reverse_flag(true), Direction::Reverse);
        assert_eq!(Direction::from(true), Direction::Reverse);
        assert_eq!(Direction::default(), Direction::Forward);
    }

    #[test]
    fn test_opposite() {
        assert_eq!(Direction::Forward.opposite(), Direction::Reverse);
        assert!(Direction::Forward.opposite().is_reverse());
        assert!(!Direction::Reverse.opposite().is_reverse());
    }

    #[test]
    fn test_display() {
        assert_eq!(Direction::Reverse.to_string(), "reverse");
        assert_eq!(OutputKind::Dropped.to_string(), "dropped");
    }

    #[test]
    fn test_serde() {
        let json = serde_json::to_string(&Direction::Reverse).unwrap();
        assert_eq!(json, "\"reverse\"");

        let kind: OutputKind = serde_json::from_str("\"pair\"").unwrap();
        assert_eq!(kind, OutputKind::Pair);
    }
}
