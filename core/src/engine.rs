use core::num::Saturating;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::*;

/// Sum a selection has to reach for its tokens to pop.
pub const TARGET_SUM: u32 = 10;

/// How long a feedback flash stays visible, in milliseconds.
pub const FEEDBACK_TTL_MS: f64 = 300.0;

#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum RoundPhase {
    NotStarted,
    Running,
    Ended,
}

impl RoundPhase {
    pub const fn is_running(self) -> bool {
        matches!(self, Self::Running)
    }

    pub const fn is_finished(self) -> bool {
        matches!(self, Self::Ended)
    }
}

impl Default for RoundPhase {
    fn default() -> Self {
        Self::NotStarted
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum FeedbackKind {
    Match,
    Miss,
}

/// Ephemeral flash over the last selection rectangle. Presentation only,
/// never consulted for scoring.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Feedback {
    pub rect: SelectRect,
    pub kind: FeedbackKind,
    pub at_ms: f64,
}

impl Feedback {
    pub fn is_expired(&self, now_ms: f64) -> bool {
        now_ms - self.at_ms > FEEDBACK_TTL_MS
    }
}

/// One playthrough from start to timeout or reset. Owns every piece of round
/// state and is only mutated through the transitions below.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RoundEngine {
    config: GameConfig,
    board: Option<Board>,
    score: Saturating<u32>,
    remaining_secs: u32,
    phase: RoundPhase,
    feedback: Option<Feedback>,
}

impl RoundEngine {
    pub fn new(config: GameConfig) -> Self {
        Self {
            config,
            board: None,
            score: Saturating(0),
            remaining_secs: config.round_secs,
            phase: RoundPhase::default(),
            feedback: None,
        }
    }

    pub fn config(&self) -> GameConfig {
        self.config
    }

    pub fn phase(&self) -> RoundPhase {
        self.phase
    }

    pub fn score(&self) -> u32 {
        self.score.0
    }

    pub fn remaining_secs(&self) -> u32 {
        self.remaining_secs
    }

    pub fn board(&self) -> Option<&Board> {
        self.board.as_ref()
    }

    pub fn feedback(&self) -> Option<Feedback> {
        self.feedback
    }

    /// Starts the round: fresh board, score 0, full clock. Only valid from
    /// `NotStarted`; an ended round has to be reset first.
    pub fn start(&mut self, generator: impl BoardGenerator) -> Result<()> {
        if !matches!(self.phase, RoundPhase::NotStarted) {
            return Err(GameError::AlreadyStarted);
        }

        self.board = Some(generator.generate(self.config));
        self.score = Saturating(0);
        self.remaining_secs = self.config.round_secs;
        self.feedback = None;
        self.phase = RoundPhase::Running;
        Ok(())
    }

    /// One-second countdown step. Ticks outside `Running` are discarded, so a
    /// stale timer callback after reset or timeout is harmless.
    pub fn tick(&mut self) -> TickOutcome {
        if !self.phase.is_running() {
            return TickOutcome::Ignored;
        }

        self.remaining_secs = self.remaining_secs.saturating_sub(1);
        if self.remaining_secs == 0 {
            self.phase = RoundPhase::Ended;
            TickOutcome::Ended
        } else {
            TickOutcome::Ticked
        }
    }

    /// Back to `NotStarted`, discarding board, score, clock, and feedback.
    /// Valid from any phase; the caller must also cancel its timer.
    pub fn reset(&mut self) {
        self.board = None;
        self.score = Saturating(0);
        self.remaining_secs = self.config.round_secs;
        self.feedback = None;
        self.phase = RoundPhase::NotStarted;
    }

    /// Evaluates a finished drag. Live tokens whose cells strictly overlap
    /// `rect` are summed; a sum of exactly [`TARGET_SUM`] removes them and
    /// credits the *count* of removed tokens, not their value sum, which is
    /// always ten.
    pub fn apply_selection(
        &mut self,
        rect: SelectRect,
        cell_size: f64,
        now_ms: f64,
    ) -> Result<SelectOutcome> {
        self.check_running()?;
        let Some(board) = self.board.as_mut() else {
            return Err(GameError::NotRunning);
        };

        if rect.is_degenerate() {
            return Ok(SelectOutcome::Ignored);
        }

        let selected: SmallVec<[Coord2; 8]> = board
            .iter_live()
            .filter(|&(coords, _)| rect.overlaps_cell(coords, cell_size))
            .map(|(coords, _)| coords)
            .collect();
        let sum: u32 = selected
            .iter()
            .map(|&coords| u32::from(board.token_at(coords).value()))
            .sum();

        if sum == TARGET_SUM {
            for &coords in &selected {
                board.remove_at(coords);
            }
            let removed: CellCount = selected.len().try_into().unwrap_or(CellCount::MAX);
            self.score += u32::from(removed);
            self.feedback = Some(Feedback {
                rect,
                kind: FeedbackKind::Match,
                at_ms: now_ms,
            });
            Ok(SelectOutcome::Cleared { removed })
        } else {
            self.feedback = Some(Feedback {
                rect,
                kind: FeedbackKind::Miss,
                at_ms: now_ms,
            });
            Ok(SelectOutcome::Missed { sum })
        }
    }

    /// Clears the feedback flash once its time is up. Returns whether
    /// anything changed so callers can skip redraws.
    pub fn expire_feedback(&mut self, now_ms: f64) -> bool {
        match self.feedback {
            Some(feedback) if feedback.is_expired(now_ms) => {
                self.feedback = None;
                true
            }
            _ => false,
        }
    }

    fn check_running(&self) -> Result<()> {
        if self.phase.is_running() {
            Ok(())
        } else {
            Err(GameError::NotRunning)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Generator handing out a fixed board, for deterministic selections.
    struct FixedBoard(Board);

    impl BoardGenerator for FixedBoard {
        fn generate(self, _config: GameConfig) -> Board {
            self.0
        }
    }

    const CELL: f64 = 30.0;

    fn engine(rows: &[&[u8]]) -> RoundEngine {
        let board = Board::from_rows(rows).unwrap();
        let size = board.size();
        let mut engine = RoundEngine::new(GameConfig::new(size, 120));
        engine.start(FixedBoard(board)).unwrap();
        engine
    }

    /// Rect covering the given cell range inclusively, away from the edges.
    fn rect_over(x0: Coord, y0: Coord, x1: Coord, y1: Coord) -> SelectRect {
        SelectRect::from_corners(
            (f64::from(x0) * CELL + 5.0, f64::from(y0) * CELL + 5.0),
            (f64::from(x1 + 1) * CELL - 5.0, f64::from(y1 + 1) * CELL - 5.0),
        )
    }

    #[test]
    fn matching_selection_removes_tokens_and_credits_count() {
        let mut engine = engine(&[&[4, 6, 1]]);

        let outcome = engine
            .apply_selection(rect_over(0, 0, 1, 0), CELL, 0.0)
            .unwrap();

        assert_eq!(outcome, SelectOutcome::Cleared { removed: 2 });
        assert_eq!(engine.score(), 2);
        let board = engine.board().unwrap();
        assert!(!board.token_at((0, 0)).is_live());
        assert!(!board.token_at((1, 0)).is_live());
        assert!(board.token_at((2, 0)).is_live());
        assert_eq!(
            engine.feedback().map(|feedback| feedback.kind),
            Some(FeedbackKind::Match)
        );
    }

    #[test]
    fn non_matching_selection_changes_nothing() {
        let mut engine = engine(&[&[3, 5, 1]]);

        let outcome = engine
            .apply_selection(rect_over(0, 0, 2, 0), CELL, 0.0)
            .unwrap();

        assert_eq!(outcome, SelectOutcome::Missed { sum: 9 });
        assert_eq!(engine.score(), 0);
        assert_eq!(engine.board().unwrap().live_count(), 3);
        assert_eq!(
            engine.feedback().map(|feedback| feedback.kind),
            Some(FeedbackKind::Miss)
        );
    }

    #[test]
    fn empty_selection_is_a_miss() {
        let mut engine = engine(&[&[4, 6]]);
        engine
            .apply_selection(rect_over(0, 0, 1, 0), CELL, 0.0)
            .unwrap();

        // both tokens are gone, the same drag now selects nothing
        let outcome = engine
            .apply_selection(rect_over(0, 0, 1, 0), CELL, 0.0)
            .unwrap();

        assert_eq!(outcome, SelectOutcome::Missed { sum: 0 });
    }

    #[test]
    fn degenerate_drag_is_a_no_op_without_feedback() {
        let mut engine = engine(&[&[4, 6]]);

        let rect = SelectRect::from_corners((10.0, 10.0), (11.0, 11.0));
        let outcome = engine.apply_selection(rect, CELL, 0.0).unwrap();

        assert_eq!(outcome, SelectOutcome::Ignored);
        assert_eq!(engine.feedback(), None);
        assert_eq!(engine.board().unwrap().live_count(), 2);
    }

    #[test]
    fn removed_tokens_never_match_again() {
        let mut engine = engine(&[&[4, 6, 4, 6]]);
        engine
            .apply_selection(rect_over(0, 0, 1, 0), CELL, 0.0)
            .unwrap();
        assert_eq!(engine.score(), 2);

        // covers the two dead cells plus a live 4; sum is 4, not 10
        let outcome = engine
            .apply_selection(rect_over(0, 0, 2, 0), CELL, 0.0)
            .unwrap();

        assert_eq!(outcome, SelectOutcome::Missed { sum: 4 });
        assert_eq!(engine.score(), 2);
    }

    #[test]
    fn countdown_ends_the_round_and_rejects_input() {
        let board = Board::from_rows(&[&[4, 6]]).unwrap();
        let mut engine = RoundEngine::new(GameConfig::new((2, 1), 2));
        engine.start(FixedBoard(board)).unwrap();

        assert_eq!(engine.tick(), TickOutcome::Ticked);
        assert_eq!(engine.remaining_secs(), 1);
        assert_eq!(engine.tick(), TickOutcome::Ended);
        assert_eq!(engine.remaining_secs(), 0);
        assert!(engine.phase().is_finished());

        assert_eq!(
            engine.apply_selection(rect_over(0, 0, 1, 0), CELL, 0.0),
            Err(GameError::NotRunning)
        );
        assert_eq!(engine.score(), 0);
    }

    #[test]
    fn stale_ticks_are_ignored() {
        let board = Board::from_rows(&[&[4, 6]]).unwrap();
        let mut engine = RoundEngine::new(GameConfig::new((2, 1), 1));
        engine.start(FixedBoard(board)).unwrap();

        assert_eq!(engine.tick(), TickOutcome::Ended);
        // a callback that fired after the transition must not go negative or
        // end the round twice
        assert_eq!(engine.tick(), TickOutcome::Ignored);
        assert_eq!(engine.remaining_secs(), 0);

        engine.reset();
        assert_eq!(engine.tick(), TickOutcome::Ignored);
        assert_eq!(engine.phase(), RoundPhase::NotStarted);
    }

    #[test]
    fn reset_then_start_rebuilds_a_fresh_round() {
        let mut engine = engine(&[&[4, 6]]);
        engine
            .apply_selection(rect_over(0, 0, 1, 0), CELL, 0.0)
            .unwrap();
        assert_eq!(engine.score(), 2);

        engine.reset();
        assert_eq!(engine.phase(), RoundPhase::NotStarted);
        assert_eq!(engine.board(), None);
        assert_eq!(engine.score(), 0);

        engine
            .start(FixedBoard(Board::from_rows(&[&[4, 6]]).unwrap()))
            .unwrap();
        assert_eq!(engine.phase(), RoundPhase::Running);
        assert_eq!(engine.board().unwrap().live_count(), 2);
        assert_eq!(engine.remaining_secs(), 120);
    }

    #[test]
    fn start_is_rejected_while_running_or_ended() {
        let mut engine = engine(&[&[4, 6]]);

        let board = Board::from_rows(&[&[1, 1]]).unwrap();
        assert_eq!(
            engine.start(FixedBoard(board.clone())),
            Err(GameError::AlreadyStarted)
        );

        while engine.tick() != TickOutcome::Ended {}
        assert_eq!(engine.start(FixedBoard(board)), Err(GameError::AlreadyStarted));
    }

    #[test]
    fn feedback_expires_after_its_ttl() {
        let mut engine = engine(&[&[3, 5]]);
        engine
            .apply_selection(rect_over(0, 0, 1, 0), CELL, 1000.0)
            .unwrap();

        assert!(!engine.expire_feedback(1000.0 + FEEDBACK_TTL_MS));
        assert!(engine.feedback().is_some());
        assert!(engine.expire_feedback(1301.0));
        assert_eq!(engine.feedback(), None);
        // already cleared, nothing left to do
        assert!(!engine.expire_feedback(2000.0));
    }

    #[test]
    fn engine_round_trips_through_serde() {
        let mut engine = engine(&[&[4, 6, 2]]);
        engine
            .apply_selection(rect_over(0, 0, 1, 0), CELL, 5.0)
            .unwrap();
        engine.tick();

        let json = serde_json::to_string(&engine).unwrap();
        let restored: RoundEngine = serde_json::from_str(&json).unwrap();

        assert_eq!(restored, engine);
    }
}
