use ndarray::Array2;

use super::*;

/// Fills every cell with an independent uniform draw from the spawn range.
/// Reused seeds reproduce the same board; reinitialization discards all prior
/// token state.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct RandomBoardGenerator {
    seed: u64,
}

impl RandomBoardGenerator {
    pub const fn new(seed: u64) -> Self {
        Self { seed }
    }
}

impl BoardGenerator for RandomBoardGenerator {
    fn generate(self, config: GameConfig) -> Board {
        use rand::prelude::*;

        if config.total_cells() == 0 {
            log::warn!("Generating an empty board, config size {:?}", config.size);
        }

        let mut rng = SmallRng::seed_from_u64(self.seed);
        let tokens = Array2::from_shape_simple_fn(config.size.to_nd_index(), || {
            Token::new_unchecked(rng.random_range(TOKEN_MIN..=TOKEN_MAX))
        });
        Board::from_tokens(tokens)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_cell_holds_one_live_in_range_token() {
        let config = GameConfig::new((17, 10), 120);
        let board = RandomBoardGenerator::new(7).generate(config);

        assert_eq!(board.size(), (17, 10));
        assert_eq!(board.live_count(), config.total_cells());
        for (_, token) in board.iter_live() {
            assert!((TOKEN_MIN..=TOKEN_MAX).contains(&token.value()));
        }
    }

    #[test]
    fn same_seed_reproduces_the_board() {
        let config = GameConfig::new((9, 6), 120);

        let first = RandomBoardGenerator::new(42).generate(config);
        let second = RandomBoardGenerator::new(42).generate(config);

        assert_eq!(first, second);
    }

    #[test]
    fn different_seeds_diverge() {
        let config = GameConfig::new((17, 10), 120);

        let first = RandomBoardGenerator::new(1).generate(config);
        let second = RandomBoardGenerator::new(2).generate(config);

        assert_ne!(first, second);
    }

    #[test]
    fn all_values_show_up_over_a_large_board() {
        let config = GameConfig::new((32, 32), 120);
        let board = RandomBoardGenerator::new(3).generate(config);

        for value in TOKEN_MIN..=TOKEN_MAX {
            assert!(
                board.iter_live().any(|(_, token)| token.value() == value),
                "value {} never generated",
                value
            );
        }
    }
}
