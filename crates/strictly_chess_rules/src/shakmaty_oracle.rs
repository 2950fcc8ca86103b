//! [`RulesOracle`] backed by the `shakmaty` move generator.

use crate::{
    Color, MoveFlag, MoveRecord, MoveRequest, PieceKind, PositionStatus, RulesError, RulesOracle,
    Square,
};
use shakmaty::fen::Fen;
use shakmaty::san::San;
use shakmaty::{CastlingMode, Chess, EnPassantMode, File, Move, Position, Rank, Role};
use std::collections::{BTreeSet, HashMap};
use tracing::{debug, instrument, warn};

/// Standard chess rules over a `shakmaty::Chess` position.
///
/// Tracks how often each position has occurred since the start position so
/// threefold repetition can be reported.
#[derive(Debug, Clone)]
pub struct ShakmatyOracle {
    start: Chess,
    position: Chess,
    seen: HashMap<String, u32>,
}

impl Default for ShakmatyOracle {
    fn default() -> Self {
        Self::from_chess(Chess::default())
    }
}

impl ShakmatyOracle {
    /// Oracle at the standard start position.
    #[instrument]
    pub fn new() -> Self {
        Self::default()
    }

    /// Oracle whose start position is `fen`.
    #[instrument]
    pub fn from_fen(fen: &str) -> Result<Self, RulesError> {
        Ok(Self::from_chess(parse_fen(fen)?))
    }

    fn from_chess(start: Chess) -> Self {
        let mut oracle = Self {
            position: start.clone(),
            start,
            seen: HashMap::new(),
        };
        oracle.remember_position();
        oracle
    }

    fn remember_position(&mut self) {
        let key = repetition_key(&encode(&self.position));
        *self.seen.entry(key).or_insert(0) += 1;
    }

    fn occurrences(&self) -> u32 {
        self.seen
            .get(&repetition_key(&encode(&self.position)))
            .copied()
            .unwrap_or(0)
    }

    fn find_move(&self, request: &MoveRequest) -> Result<Move, RulesError> {
        let from = to_shakmaty_square(request.from);
        let to = to_shakmaty_square(request.to);
        let legal = self.position.legal_moves();
        let candidates: Vec<&Move> = legal
            .iter()
            .filter(|m| endpoints(m) == Some((from, to)))
            .collect();

        let wanted = request.promotion.map(to_role);
        if let Some(m) = candidates.iter().find(|m| m.promotion() == wanted) {
            return Ok((*m).clone());
        }
        if wanted.is_none() && candidates.iter().any(|m| m.promotion().is_some()) {
            return Err(RulesError::PromotionRequired(request.from, request.to));
        }
        Err(RulesError::IllegalMove {
            from: request.from,
            to: request.to,
            promotion: request.promotion,
        })
    }

    fn build_record(&self, m: &Move, request: &MoveRequest, next: &Chess) -> MoveRecord {
        let mover = from_color(self.position.turn());
        let mut flags = BTreeSet::new();
        let (from, to) = (request.from, request.to);

        let captured = match m {
            Move::EnPassant { .. } => {
                flags.insert(MoveFlag::EnPassant);
                Some(PieceKind::Pawn)
            }
            Move::Castle { .. } => {
                flags.insert(MoveFlag::Castle);
                None
            }
            _ => m.capture().map(from_role),
        };
        if captured.is_some() {
            flags.insert(MoveFlag::Capture);
        }
        let promotion = m.promotion().map(from_role);
        if promotion.is_some() {
            flags.insert(MoveFlag::Promotion);
        }
        let piece = from_role(m.role());
        if piece == PieceKind::Pawn && from.rank().abs_diff(to.rank()) == 2 {
            flags.insert(MoveFlag::DoublePush);
        }

        let suffix = if next.is_checkmate() {
            "#"
        } else if next.is_check() {
            "+"
        } else {
            ""
        };
        let san = format!("{}{}", San::from_move(&self.position, m), suffix);
        let lan = format!(
            "{}{}",
            long_algebraic(m, piece, from, to, captured.is_some(), promotion),
            suffix
        );

        MoveRecord {
            from,
            to,
            color: mover,
            piece,
            captured,
            promotion,
            flags,
            san,
            lan,
            before: encode(&self.position),
            after: encode(next),
        }
    }
}

impl RulesOracle for ShakmatyOracle {
    #[instrument(skip(self))]
    fn reset(&mut self) -> String {
        self.position = self.start.clone();
        self.seen.clear();
        self.remember_position();
        encode(&self.position)
    }

    #[instrument(skip(self))]
    fn load_position(&mut self, fen: &str) -> Result<(), RulesError> {
        let start = parse_fen(fen)?;
        *self = Self::from_chess(start);
        debug!(fen, "Loaded start position");
        Ok(())
    }

    fn start_position(&self) -> String {
        encode(&self.start)
    }

    fn position(&self) -> String {
        encode(&self.position)
    }

    fn side_to_move(&self) -> Color {
        from_color(self.position.turn())
    }

    #[instrument(skip(self), fields(request = %request))]
    fn apply_move(&mut self, request: &MoveRequest) -> Result<MoveRecord, RulesError> {
        let m = self.find_move(request).inspect_err(|e| {
            debug!(error = %e, "Move rejected");
        })?;
        let mut next = self.position.clone();
        next.play_unchecked(&m);
        let record = self.build_record(&m, request, &next);
        self.position = next;
        self.remember_position();
        debug!(san = %record.san, "Move applied");
        Ok(record)
    }

    #[instrument(skip(self))]
    fn apply_san(&mut self, san: &str) -> Result<MoveRecord, RulesError> {
        let text = san.trim();
        // Some score sheets write castling with zeros.
        let normalized = text.replace('0', "O");
        let parsed: San = normalized
            .trim_end_matches(['+', '#'])
            .parse()
            .map_err(|_| RulesError::InvalidNotation(text.to_string()))?;
        let m = parsed
            .to_move(&self.position)
            .map_err(|_| RulesError::UnplayableSan(text.to_string()))?;
        let (from, to) =
            endpoints(&m).ok_or_else(|| RulesError::UnplayableSan(text.to_string()))?;
        let request = MoveRequest {
            from: from_shakmaty_square(from),
            to: from_shakmaty_square(to),
            promotion: m.promotion().map(from_role),
        };
        self.apply_move(&request)
    }

    fn status(&self) -> PositionStatus {
        let checkmate = self.position.is_checkmate();
        let stalemate = self.position.is_stalemate();
        let insufficient_material = self.position.is_insufficient_material();
        let threefold_repetition = self.occurrences() >= 3;
        let fifty_move_rule = self.position.halfmoves() >= 100;
        PositionStatus {
            in_check: self.position.is_check(),
            checkmate,
            stalemate,
            draw: !checkmate
                && !stalemate
                && (insufficient_material || threefold_repetition || fifty_move_rule),
            insufficient_material,
            threefold_repetition,
            fifty_move_rule,
        }
    }

    fn legal_destinations(&self, square: Square) -> Vec<Square> {
        let origin = to_shakmaty_square(square);
        let destinations: BTreeSet<Square> = self
            .position
            .legal_moves()
            .iter()
            .filter_map(endpoints)
            .filter(|(from, _)| *from == origin)
            .map(|(_, to)| from_shakmaty_square(to))
            .collect();
        destinations.into_iter().collect()
    }

    fn legal_moves(&self) -> Vec<MoveRequest> {
        self.position
            .legal_moves()
            .iter()
            .filter_map(|m| {
                endpoints(m).map(|(from, to)| MoveRequest {
                    from: from_shakmaty_square(from),
                    to: from_shakmaty_square(to),
                    promotion: m.promotion().map(from_role),
                })
            })
            .collect()
    }
}

fn parse_fen(fen: &str) -> Result<Chess, RulesError> {
    let invalid = |reason: String| {
        warn!(fen, %reason, "Rejected position");
        RulesError::InvalidPosition {
            fen: fen.to_string(),
            reason,
        }
    };
    let parsed: Fen = fen.trim().parse().map_err(|e| invalid(format!("{}", e)))?;
    parsed
        .into_position(CastlingMode::Standard)
        .map_err(|e| invalid(format!("{}", e)))
}

fn encode(position: &Chess) -> String {
    Fen::from_position(position.clone(), EnPassantMode::Legal).to_string()
}

/// Placement, side to move, castling rights and en-passant square.
fn repetition_key(fen: &str) -> String {
    fen.split_whitespace().take(4).collect::<Vec<_>>().join(" ")
}

/// Origin and destination as a player names them; castling uses the king's
/// landing square rather than the rook's.
fn endpoints(m: &Move) -> Option<(shakmaty::Square, shakmaty::Square)> {
    match m {
        Move::Normal { from, to, .. } => Some((*from, *to)),
        Move::EnPassant { from, to } => Some((*from, *to)),
        Move::Castle { king, rook } => {
            let file = if rook.file() > king.file() {
                File::G
            } else {
                File::C
            };
            Some((*king, shakmaty::Square::from_coords(file, king.rank())))
        }
        Move::Put { .. } => None,
    }
}

fn long_algebraic(
    m: &Move,
    piece: PieceKind,
    from: Square,
    to: Square,
    capture: bool,
    promotion: Option<PieceKind>,
) -> String {
    if let Move::Castle { .. } = m {
        return if to.file() == 6 { "O-O" } else { "O-O-O" }.to_string();
    }
    let mut lan = String::new();
    if piece != PieceKind::Pawn {
        lan.push(piece.letter().to_ascii_uppercase());
    }
    lan.push_str(&from.to_string());
    lan.push(if capture { 'x' } else { '-' });
    lan.push_str(&to.to_string());
    if let Some(p) = promotion {
        lan.push('=');
        lan.push(p.letter().to_ascii_uppercase());
    }
    lan
}

fn to_shakmaty_square(square: Square) -> shakmaty::Square {
    shakmaty::Square::from_coords(
        File::new(u32::from(square.file())),
        Rank::new(u32::from(square.rank())),
    )
}

fn from_shakmaty_square(square: shakmaty::Square) -> Square {
    let file = (square.file().char() as u8).wrapping_sub(b'a');
    let rank = (square.rank().char() as u8).wrapping_sub(b'1');
    Square::from_board_index(file, rank)
}

fn from_color(color: shakmaty::Color) -> Color {
    match color {
        shakmaty::Color::White => Color::White,
        shakmaty::Color::Black => Color::Black,
    }
}

fn to_role(piece: PieceKind) -> Role {
    match piece {
        PieceKind::Pawn => Role::Pawn,
        PieceKind::Knight => Role::Knight,
        PieceKind::Bishop => Role::Bishop,
        PieceKind::Rook => Role::Rook,
        PieceKind::Queen => Role::Queen,
        PieceKind::King => Role::King,
    }
}

fn from_role(role: Role) -> PieceKind {
    match role {
        Role::Pawn => PieceKind::Pawn,
        Role::Knight => PieceKind::Knight,
        Role::Bishop => PieceKind::Bishop,
        Role::Rook => PieceKind::Rook,
        Role::Queen => PieceKind::Queen,
        Role::King => PieceKind::King,
    }
}
