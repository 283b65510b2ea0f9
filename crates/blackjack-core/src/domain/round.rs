//! Round outcome rules and per-session statistics.

use thiserror::Error;

/// A hand whose total exceeds this value has busted.
pub const BUST_LIMIT: u32 = 21;

/// The dealer draws while strictly below this total.
pub const DEALER_STAND_TOTAL: u32 = 17;

/// Error produced when a wire result byte is not a known outcome code.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown round result code: {0}")]
pub struct UnknownOutcome(pub u8);

/// The result of one round, from the player's perspective.
///
/// The discriminants are the wire codes carried in the result byte of a
/// game payload frame (0 on the wire means "mid-round, no result yet").
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum RoundOutcome {
    Tie = 0x1,
    Loss = 0x2,
    Win = 0x3,
}

impl RoundOutcome {
    /// Judges a finished round from the two final totals.
    ///
    /// Precedence order matters: a busted player loses even when the
    /// dealer also busts.
    pub fn judge(player_total: u32, dealer_total: u32) -> Self {
        if player_total > BUST_LIMIT {
            RoundOutcome::Loss
        } else if dealer_total > BUST_LIMIT || player_total > dealer_total {
            RoundOutcome::Win
        } else if dealer_total > player_total {
            RoundOutcome::Loss
        } else {
            RoundOutcome::Tie
        }
    }
}

impl TryFrom<u8> for RoundOutcome {
    type Error = UnknownOutcome;

    fn try_from(value: u8) -> Result<Self, UnknownOutcome> {
        match value {
            0x1 => Ok(RoundOutcome::Tie),
            0x2 => Ok(RoundOutcome::Loss),
            0x3 => Ok(RoundOutcome::Win),
            other => Err(UnknownOutcome(other)),
        }
    }
}

/// Win/loss/tie tally for one session, from the player's perspective.
///
/// Sessions return a value of this type to their caller; the caller folds
/// tallies together explicitly if it runs several sessions. There is no
/// ambient shared counter anywhere.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SessionStats {
    pub wins: u32,
    pub losses: u32,
    pub ties: u32,
}

impl SessionStats {
    /// Records one finished round.
    pub fn record(&mut self, outcome: RoundOutcome) {
        match outcome {
            RoundOutcome::Win => self.wins += 1,
            RoundOutcome::Loss => self.losses += 1,
            RoundOutcome::Tie => self.ties += 1,
        }
    }

    /// Total rounds recorded.
    pub fn rounds_played(&self) -> u32 {
        self.wins + self.losses + self.ties
    }

    /// Fraction of recorded rounds that were wins, in 0.0..=1.0.
    ///
    /// Returns 0.0 when no rounds have been recorded.
    pub fn win_rate(&self) -> f64 {
        let rounds = self.rounds_played();
        if rounds == 0 {
            0.0
        } else {
            f64::from(self.wins) / f64::from(rounds)
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_judge_player_bust_is_loss() {
        assert_eq!(RoundOutcome::judge(22, 18), RoundOutcome::Loss);
    }

    #[test]
    fn test_judge_player_bust_beats_dealer_bust() {
        // Both over 21: the player bust check runs first.
        assert_eq!(RoundOutcome::judge(25, 24), RoundOutcome::Loss);
    }

    #[test]
    fn test_judge_dealer_bust_is_win() {
        assert_eq!(RoundOutcome::judge(20, 22), RoundOutcome::Win);
        assert_eq!(RoundOutcome::judge(18, 26), RoundOutcome::Win);
    }

    #[test]
    fn test_judge_higher_player_total_is_win() {
        assert_eq!(RoundOutcome::judge(19, 17), RoundOutcome::Win);
    }

    #[test]
    fn test_judge_higher_dealer_total_is_loss() {
        assert_eq!(RoundOutcome::judge(18, 20), RoundOutcome::Loss);
    }

    #[test]
    fn test_judge_equal_totals_is_tie() {
        assert_eq!(RoundOutcome::judge(19, 19), RoundOutcome::Tie);
        assert_eq!(RoundOutcome::judge(21, 21), RoundOutcome::Tie);
    }

    #[test]
    fn test_outcome_wire_codes_round_trip() {
        for outcome in [RoundOutcome::Tie, RoundOutcome::Loss, RoundOutcome::Win] {
            assert_eq!(RoundOutcome::try_from(outcome as u8), Ok(outcome));
        }
    }

    #[test]
    fn test_outcome_rejects_zero_and_unknown_codes() {
        assert_eq!(RoundOutcome::try_from(0), Err(UnknownOutcome(0)));
        assert_eq!(RoundOutcome::try_from(4), Err(UnknownOutcome(4)));
        assert_eq!(RoundOutcome::try_from(0xFF), Err(UnknownOutcome(0xFF)));
    }

    #[test]
    fn test_stats_record_and_counts() {
        let mut stats = SessionStats::default();
        stats.record(RoundOutcome::Win);
        stats.record(RoundOutcome::Win);
        stats.record(RoundOutcome::Loss);
        stats.record(RoundOutcome::Tie);

        assert_eq!(stats.wins, 2);
        assert_eq!(stats.losses, 1);
        assert_eq!(stats.ties, 1);
        assert_eq!(stats.rounds_played(), 4);
    }

    #[test]
    fn test_stats_win_rate() {
        let mut stats = SessionStats::default();
        assert_eq!(stats.win_rate(), 0.0, "empty stats must not divide by zero");

        stats.record(RoundOutcome::Win);
        stats.record(RoundOutcome::Loss);
        assert!((stats.win_rate() - 0.5).abs() < f64::EPSILON);
    }
}
