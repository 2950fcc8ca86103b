//! Reading games written in Portable Game Notation.
//!
//! Only the mainline is kept: comments, variations and annotation glyphs are
//! dropped, and move numbers are ignored.

use strictly_chess_rules::RulesError;
use tracing::{debug, instrument};

/// Result tokens that may close a movetext.
const RESULTS: [&str; 4] = ["1-0", "0-1", "1/2-1/2", "*"];

/// Why a game record could not be loaded.
#[derive(Debug, Clone, PartialEq, Eq, derive_more::Display)]
pub enum PgnError {
    /// A tag pair line that is not `[Name "Value"]`.
    #[display("Malformed header '{}'", _0)]
    MalformedHeader(String),

    /// A comment or variation that is never closed.
    #[display("Unterminated {}", _0)]
    Unterminated(&'static str),

    /// The `FEN` header cannot be loaded.
    #[display("Invalid start position: {}", _0)]
    InvalidPosition(RulesError),

    /// A movetext move is not playable.
    #[display("Move {} ({}) rejected: {}", ply, san, source)]
    Move {
        /// One-based ply number.
        ply: usize,
        /// The move as written.
        san: String,
        /// The oracle's reason.
        source: RulesError,
    },
}

impl std::error::Error for PgnError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            PgnError::InvalidPosition(e) | PgnError::Move { source: e, .. } => Some(e),
            _ => None,
        }
    }
}

/// Headers and mainline moves of one game.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PgnGame {
    /// Tag pairs in file order.
    pub headers: Vec<(String, String)>,
    /// Mainline moves in short algebraic notation.
    pub moves: Vec<String>,
    /// Result token, if the movetext carried one.
    pub result: Option<String>,
}

impl PgnGame {
    /// Value of the header `name`.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    /// Parses the first game in `text`.
    #[instrument(skip(text), fields(len = text.len()))]
    pub fn parse(text: &str) -> Result<Self, PgnError> {
        let mut game = PgnGame::default();
        let mut movetext = String::new();

        for line in text.lines() {
            let line = line.trim();
            if line.starts_with('[') {
                game.headers.push(parse_header(line)?);
            } else if !line.starts_with('%') {
                // Rest-of-line comments end at the newline.
                let line = line.split(';').next().unwrap_or_default();
                movetext.push_str(line);
                movetext.push('\n');
            }
        }

        for token in strip_commentary(&movetext)?.split_whitespace() {
            if RESULTS.contains(&token) {
                game.result = Some(token.to_string());
                break;
            }
            if let Some(san) = move_token(token) {
                game.moves.push(san);
            }
        }
        debug!(
            headers = game.headers.len(),
            moves = game.moves.len(),
            "Parsed game record"
        );
        Ok(game)
    }
}

fn parse_header(line: &str) -> Result<(String, String), PgnError> {
    let malformed = || PgnError::MalformedHeader(line.to_string());
    let inner = line
        .strip_prefix('[')
        .and_then(|l| l.strip_suffix(']'))
        .ok_or_else(malformed)?;
    let (name, value) = inner.trim().split_once(char::is_whitespace).ok_or_else(malformed)?;
    let value = value
        .trim()
        .strip_prefix('"')
        .and_then(|v| v.strip_suffix('"'))
        .ok_or_else(malformed)?;
    Ok((name.to_string(), value.replace("\\\"", "\"")))
}

/// Removes `{...}` comments and `(...)` variations, which may nest.
fn strip_commentary(movetext: &str) -> Result<String, PgnError> {
    let mut out = String::with_capacity(movetext.len());
    let mut in_comment = false;
    let mut depth = 0usize;
    for c in movetext.chars() {
        match c {
            '}' if in_comment => {
                in_comment = false;
                out.push(' ');
            }
            _ if in_comment => {}
            '{' => in_comment = true,
            '(' => depth += 1,
            ')' if depth > 0 => {
                depth -= 1;
                out.push(' ');
            }
            _ if depth > 0 => {}
            c => out.push(c),
        }
    }
    if in_comment {
        return Err(PgnError::Unterminated("comment"));
    }
    if depth > 0 {
        return Err(PgnError::Unterminated("variation"));
    }
    Ok(out)
}

/// The move in a movetext token, without its number prefix or annotations.
fn move_token(token: &str) -> Option<String> {
    if token.starts_with('$') {
        return None;
    }
    let body = match token.find('.') {
        Some(dot) if token[..dot].chars().all(|c| c.is_ascii_digit()) => {
            token[dot..].trim_start_matches('.')
        }
        _ => token,
    };
    let san = body.trim_end_matches(['!', '?']);
    (!san.is_empty()).then(|| san.to_string())
}
