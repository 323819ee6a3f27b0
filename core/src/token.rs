use serde::{Deserialize, Serialize};

use crate::{GameError, Result};

/// Smallest value a token can spawn with.
pub const TOKEN_MIN: u8 = 1;
/// Largest value a token can spawn with.
pub const TOKEN_MAX: u8 = 9;

/// Single numbered board occupant stored by the round engine.
///
/// A token is created once per cell at round start and flips to removed when
/// consumed by a match; it is never respawned within the same round.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Token {
    value: u8,
    removed: bool,
}

impl Token {
    pub fn new(value: u8) -> Result<Self> {
        if (TOKEN_MIN..=TOKEN_MAX).contains(&value) {
            Ok(Self::new_unchecked(value))
        } else {
            Err(GameError::InvalidTokenValue)
        }
    }

    pub(crate) const fn new_unchecked(value: u8) -> Self {
        Self {
            value,
            removed: false,
        }
    }

    pub const fn value(self) -> u8 {
        self.value
    }

    pub const fn is_live(self) -> bool {
        !self.removed
    }

    pub(crate) fn remove(&mut self) {
        self.removed = true;
    }
}
