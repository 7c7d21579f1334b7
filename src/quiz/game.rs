use std::collections::BTreeSet;

use log::info;

use crate::quiz::same_subject;

/// State that outlives a single round: the running score, which subjects are
/// done, and the three once-per-game commands.
///
/// Each flag covers the whole game. Spending the save in the first round
/// leaves it spent for every later round until [`GameState::reset`].
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct GameState {
    global_score: usize,
    completed_subjects: BTreeSet<String>,
    ask_used: bool,
    copy_used: bool,
    save_used: bool,
}

impl GameState {
    pub fn new_game() -> Self {
        Self::default()
    }

    pub fn reset(&mut self) {
        *self = Self::new_game();
    }

    pub fn is_ask_used(&self) -> bool {
        self.ask_used
    }

    pub fn mark_ask_used(&mut self) {
        self.ask_used = true;
    }

    pub fn is_copy_used(&self) -> bool {
        self.copy_used
    }

    pub fn mark_copy_used(&mut self) {
        self.copy_used = true;
    }

    pub fn is_save_used(&self) -> bool {
        self.save_used
    }

    pub fn mark_save_used(&mut self) {
        self.save_used = true;
    }

    /// Claims the rescue. Returns `false` when it was already spent.
    pub fn try_use_save(&mut self) -> bool {
        if self.save_used {
            return false;
        }
        self.save_used = true;
        true
    }

    pub fn global_score(&self) -> usize {
        self.global_score
    }

    /// Score so far if the current round ended with `round_score`.
    pub fn total_with(&self, round_score: usize) -> usize {
        self.global_score + round_score
    }

    pub fn completed_subjects(&self) -> &BTreeSet<String> {
        &self.completed_subjects
    }

    pub fn is_completed(&self, subject: &str) -> bool {
        self.completed_subjects
            .iter()
            .any(|done| same_subject(done, subject))
    }

    pub fn finish_round(&mut self, subject: &str, score: usize) {
        self.global_score += score;
        self.completed_subjects.insert(subject.to_uppercase());
        info!(
            "Round {} finished with {} points, {} total",
            subject, score, self.global_score
        );
    }

    /// Subjects from `subjects` that haven't been played yet, in the given order.
    pub fn remaining_subjects<'a>(&self, subjects: &'a [String]) -> Vec<&'a str> {
        subjects
            .iter()
            .filter(|subject| !self.is_completed(subject))
            .map(|subject| subject.as_str())
            .collect()
    }
}

/// Whole percent of `score` out of `total`, rounded down.
pub fn percent(score: usize, total: usize) -> usize {
    if total == 0 {
        return 0;
    }
    score * 100 / total
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_are_independent() {
        let mut game = GameState::new_game();
        game.mark_ask_used();
        assert!(game.is_ask_used());
        assert!(!game.is_copy_used());
        assert!(!game.is_save_used());

        game.mark_copy_used();
        assert!(game.is_copy_used());
        assert!(!game.is_save_used());
    }

    #[test]
    fn save_can_be_claimed_once() {
        let mut game = GameState::new_game();
        assert!(game.try_use_save());
        assert!(game.is_save_used());
        assert!(!game.try_use_save());
    }

    #[test]
    fn finishing_rounds_accumulates() {
        let mut game = GameState::new_game();
        game.finish_round("intro", 2);
        game.finish_round("OOP", 1);
        assert_eq!(game.global_score(), 3);
        assert_eq!(game.total_with(2), 5);
        assert!(game.is_completed("INTRO"));
        assert!(game.is_completed("oop"));
        assert!(!game.is_completed("MAPPINGS"));
    }

    #[test]
    fn remaining_subjects_skip_completed_ones() {
        let subjects: Vec<String> = ["INTRO", "OOP", "MAPPINGS"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        let mut game = GameState::new_game();
        game.finish_round("Oop", 0);
        assert_eq!(game.remaining_subjects(&subjects), vec!["INTRO", "MAPPINGS"]);
    }

    #[test]
    fn reset_starts_a_fresh_game() {
        let mut game = GameState::new_game();
        game.mark_ask_used();
        game.mark_copy_used();
        game.mark_save_used();
        game.finish_round("INTRO", 2);

        game.reset();
        assert_eq!(game, GameState::new_game());
    }

    #[test]
    fn percent_rounds_down() {
        assert_eq!(percent(14, 14), 100);
        assert_eq!(percent(13, 14), 92);
        assert_eq!(percent(1, 14), 7);
        assert_eq!(percent(0, 14), 0);
        assert_eq!(percent(3, 0), 0);
    }
}
