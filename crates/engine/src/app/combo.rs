use tracing::debug;

pub const COMBO_DECAY_SECONDS: f32 = 3.0;
pub const COMBO_BONUS_MIN_STREAK: u32 = 5;
pub const COMBO_BONUS_PER_KILL: u64 = 10;

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ComboSnapshot {
    pub streak: u32,
    pub max_streak: u32,
    pub decay_remaining: f32,
    pub score: u64,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ComboScoringLedger {
    streak: u32,
    max_streak: u32,
    decay_remaining: f32,
    score: u64,
}

impl ComboScoringLedger {
    pub fn on_kill(&mut self) -> u64 {
        self.streak = self.streak.saturating_add(1);
        self.decay_remaining = COMBO_DECAY_SECONDS;
        self.max_streak = self.max_streak.max(self.streak);
        if self.streak < COMBO_BONUS_MIN_STREAK {
            return 0;
        }
        let bonus = u64::from(self.streak) * COMBO_BONUS_PER_KILL;
        self.score = self.score.saturating_add(bonus);
        debug!(streak = self.streak, bonus, "combo_bonus");
        bonus
    }

    pub fn on_non_kill_hit(&mut self) {
        if self.streak > 0 {
            debug!(streak = self.streak, "combo_broken");
            self.reset_streak();
        }
    }

    pub fn tick(&mut self, dt: f32) {
        if self.streak == 0 {
            return;
        }
        self.decay_remaining -= dt;
        if self.decay_remaining <= 0.0 {
            debug!(streak = self.streak, "combo_decayed");
            self.reset_streak();
        }
    }

    pub fn add_score(&mut self, points: u64) {
        self.score = self.score.saturating_add(points);
    }

    pub fn streak(&self) -> u32 {
        self.streak
    }

    pub fn max_streak(&self) -> u32 {
        self.max_streak
    }

    pub fn score(&self) -> u64 {
        self.score
    }

    pub fn snapshot(&self) -> ComboSnapshot {
        ComboSnapshot {
            streak: self.streak,
            max_streak: self.max_streak,
            decay_remaining: self.decay_remaining,
            score: self.score,
        }
    }

    fn reset_streak(&mut self) {
        self.streak = 0;
        self.decay_remaining = 0.0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fifth_and_sixth_kills_award_streak_bonus() {
        let mut ledger = ComboScoringLedger::default();
        for _ in 0..4 {
            assert_eq!(ledger.on_kill(), 0);
            ledger.tick(1.0);
        }
        assert_eq!(ledger.on_kill(), 50);
        ledger.tick(2.9);
        assert_eq!(ledger.on_kill(), 60);
        assert_eq!(ledger.score(), 110);
        assert_eq!(ledger.max_streak(), 6);
    }

    #[test]
    fn non_kill_hit_resets_streak() {
        let mut ledger = ComboScoringLedger::default();
        for _ in 0..3 {
            ledger.on_kill();
        }
        ledger.on_non_kill_hit();
        assert_eq!(ledger.streak(), 0);
        assert_eq!(ledger.on_kill(), 0);
        assert_eq!(ledger.streak(), 1);
        assert_eq!(ledger.max_streak(), 3);
    }

    #[test]
    fn non_kill_hit_without_streak_is_noop() {
        let mut ledger = ComboScoringLedger::default();
        ledger.on_non_kill_hit();
        assert_eq!(ledger, ComboScoringLedger::default());
    }

    #[test]
    fn streak_decays_after_window() {
        let mut ledger = ComboScoringLedger::default();
        ledger.on_kill();
        ledger.on_kill();
        ledger.tick(2.0);
        assert_eq!(ledger.streak(), 2);
        ledger.tick(1.0);
        assert_eq!(ledger.streak(), 0);
        assert_eq!(ledger.max_streak(), 2);
    }

    #[test]
    fn kill_refreshes_decay_window() {
        let mut ledger = ComboScoringLedger::default();
        ledger.on_kill();
        ledger.tick(2.5);
        ledger.on_kill();
        ledger.tick(2.5);
        assert_eq!(ledger.streak(), 2);
    }

    #[test]
    fn score_accumulates_kill_values() {
        let mut ledger = ComboScoringLedger::default();
        ledger.add_score(100);
        ledger.add_score(150);
        assert_eq!(ledger.snapshot().score, 250);
    }
}
