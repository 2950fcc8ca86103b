//! Move requests and executed move records.
//!
//! A [`MoveRequest`] is what a player asks for. A [`MoveRecord`] is what the
//! oracle hands back once the request has been applied; it is never edited
//! afterwards.

use crate::{Color, MoveFlag, PieceKind, RulesError, Square};
use derive_new::new;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::str::FromStr;
use tracing::instrument;

/// A requested move: origin, destination and optional promotion piece.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, new)]
pub struct MoveRequest {
    /// Origin square.
    pub from: Square,
    /// Destination square. For castling this is the king's destination.
    pub to: Square,
    /// Promotion piece for pawns reaching the last rank.
    #[new(default)]
    pub promotion: Option<PieceKind>,
}

impl MoveRequest {
    /// Creates a request that promotes to `piece`.
    pub fn promoting(from: Square, to: Square, piece: PieceKind) -> Self {
        Self {
            from,
            to,
            promotion: Some(piece),
        }
    }

    /// Compact notation such as `e2e4` or `e7e8q`.
    pub fn compact(&self) -> String {
        self.to_string()
    }
}

impl std::fmt::Display for MoveRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}{}", self.from, self.to)?;
        if let Some(piece) = self.promotion {
            write!(f, "{}", piece.letter())?;
        }
        Ok(())
    }
}

impl FromStr for MoveRequest {
    type Err = RulesError;

    #[instrument]
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let invalid = || RulesError::InvalidNotation(s.to_string());
        if !(s.len() == 4 || s.len() == 5) || !s.is_ascii() {
            return Err(invalid());
        }
        let from: Square = s[0..2].parse().map_err(|_| invalid())?;
        let to: Square = s[2..4].parse().map_err(|_| invalid())?;
        let promotion = match s[4..].chars().next() {
            None => None,
            Some(c) => match PieceKind::from_letter(c) {
                Some(piece) if piece.is_promotion_target() => Some(piece),
                _ => return Err(invalid()),
            },
        };
        Ok(Self {
            from,
            to,
            promotion,
        })
    }
}

/// Immutable record of one executed ply.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoveRecord {
    /// Origin square.
    pub from: Square,
    /// Destination square (king destination when castling).
    pub to: Square,
    /// Side that moved.
    pub color: Color,
    /// Kind of the moved piece.
    pub piece: PieceKind,
    /// Kind of the captured piece, if any.
    pub captured: Option<PieceKind>,
    /// Promotion piece, if any.
    pub promotion: Option<PieceKind>,
    /// Move qualifiers.
    pub flags: BTreeSet<MoveFlag>,
    /// Short algebraic notation, with check and mate suffixes.
    pub san: String,
    /// Long algebraic notation, e.g. `e2-e4` or `Ng1xf3`.
    pub lan: String,
    /// Position encoding before the move.
    pub before: String,
    /// Position encoding after the move.
    pub after: String,
}

impl MoveRecord {
    /// The request that reproduces this move.
    pub fn request(&self) -> MoveRequest {
        MoveRequest {
            from: self.from,
            to: self.to,
            promotion: self.promotion,
        }
    }

    /// Whether the move carries `flag`.
    pub fn has_flag(&self, flag: MoveFlag) -> bool {
        self.flags.contains(&flag)
    }

    /// Whether the move captured a piece.
    pub fn is_capture(&self) -> bool {
        self.captured.is_some()
    }
}
