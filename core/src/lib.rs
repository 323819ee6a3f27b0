#![no_std]

extern crate alloc;

use ndarray::Array2;
use serde::{Deserialize, Serialize};

pub use engine::*;
pub use error::*;
pub use generator::*;
pub use geometry::*;
pub use token::*;
pub use types::*;

mod engine;
mod error;
mod generator;
mod geometry;
mod token;
mod types;

#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GameConfig {
    pub size: Coord2,
    pub round_secs: u32,
}

impl GameConfig {
    pub const fn new_unchecked(size: Coord2, round_secs: u32) -> Self {
        Self { size, round_secs }
    }

    pub fn new((size_x, size_y): Coord2, round_secs: u32) -> Self {
        let size_x = size_x.clamp(1, Coord::MAX);
        let size_y = size_y.clamp(1, Coord::MAX);
        let round_secs = round_secs.max(1);
        Self::new_unchecked((size_x, size_y), round_secs)
    }

    pub const fn total_cells(&self) -> CellCount {
        mult(self.size.0, self.size.1)
    }
}

impl Default for GameConfig {
    fn default() -> Self {
        Self::new_unchecked((17, 10), 120)
    }
}

/// One token per cell, laid out `(x, y)` like the rest of the crate.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Board {
    tokens: Array2<Token>,
}

impl Board {
    pub(crate) fn from_tokens(tokens: Array2<Token>) -> Self {
        Self { tokens }
    }

    /// Builds a board from row-major value rows. Rows must be rectangular and
    /// every value must be in the spawn range.
    pub fn from_rows(rows: &[&[u8]]) -> Result<Self> {
        let size_y = rows.len();
        let size_x = rows.first().map_or(0, |row| row.len());
        if size_x == 0 || size_y == 0 || size_x > Coord::MAX as usize || size_y > Coord::MAX as usize
        {
            return Err(GameError::InvalidBoardShape);
        }

        let mut tokens = Array2::from_elem([size_x, size_y], Token::new_unchecked(TOKEN_MIN));
        for (y, row) in rows.iter().enumerate() {
            if row.len() != size_x {
                return Err(GameError::InvalidBoardShape);
            }
            for (x, &value) in row.iter().enumerate() {
                tokens[[x, y]] = Token::new(value)?;
            }
        }

        Ok(Self::from_tokens(tokens))
    }

    pub fn size(&self) -> Coord2 {
        let dim = self.tokens.dim();
        (dim.0.try_into().unwrap(), dim.1.try_into().unwrap())
    }

    pub fn total_cells(&self) -> CellCount {
        self.tokens.len().try_into().unwrap()
    }

    pub fn token_at(&self, coords: Coord2) -> Token {
        self.tokens[coords.to_nd_index()]
    }

    pub fn live_count(&self) -> CellCount {
        self.tokens
            .iter()
            .filter(|token| token.is_live())
            .count()
            .try_into()
            .unwrap()
    }

    /// Iterates live tokens with their coordinates.
    pub fn iter_live(&self) -> impl Iterator<Item = (Coord2, Token)> + '_ {
        self.tokens
            .indexed_iter()
            .filter(|(_, token)| token.is_live())
            .map(|((x, y), &token)| ((x as Coord, y as Coord), token))
    }

    pub(crate) fn remove_at(&mut self, coords: Coord2) {
        self.tokens[coords.to_nd_index()].remove();
    }
}

#[derive(Copy, Clone, Debug, PartialEq)]
pub enum SelectOutcome {
    /// Degenerate gesture, nothing happened.
    Ignored,
    Missed { sum: u32 },
    Cleared { removed: CellCount },
}

impl SelectOutcome {
    pub const fn has_update(self) -> bool {
        matches!(self, Self::Cleared { .. })
    }
}

#[derive(Copy, Clone, Debug, PartialEq)]
pub enum TickOutcome {
    /// Tick arrived outside `Running` and was discarded.
    Ignored,
    Ticked,
    Ended,
}

impl TickOutcome {
    pub const fn has_update(self) -> bool {
        use TickOutcome::*;
        match self {
            Ignored => false,
            Ticked => true,
            Ended => true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_clamps_to_playable_bounds() {
        let config = GameConfig::new((0, 10), 0);

        assert_eq!(config.size, (1, 10));
        assert_eq!(config.round_secs, 1);
        assert_eq!(config.total_cells(), 10);
    }

    #[test]
    fn from_rows_rejects_ragged_and_empty_shapes() {
        assert_eq!(
            Board::from_rows(&[&[1, 2], &[3]]),
            Err(GameError::InvalidBoardShape)
        );
        assert_eq!(Board::from_rows(&[]), Err(GameError::InvalidBoardShape));
        assert_eq!(Board::from_rows(&[&[]]), Err(GameError::InvalidBoardShape));
    }

    #[test]
    fn from_rows_rejects_out_of_range_values() {
        assert_eq!(
            Board::from_rows(&[&[1, 0]]),
            Err(GameError::InvalidTokenValue)
        );
    }

    #[test]
    fn from_rows_lays_out_row_major_input() {
        let board = Board::from_rows(&[&[1, 2, 3], &[4, 5, 6]]).unwrap();

        assert_eq!(board.size(), (3, 2));
        assert_eq!(board.token_at((0, 0)).value(), 1);
        assert_eq!(board.token_at((2, 0)).value(), 3);
        assert_eq!(board.token_at((0, 1)).value(), 4);
        assert_eq!(board.live_count(), 6);
    }
}
