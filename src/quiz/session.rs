use log::info;

use crate::quiz::chatbot::{Chatbot, SuccessRoll};
use crate::quiz::game::GameState;
use crate::quiz::Question;

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum GameResult {
    Correct,
    SavedByChatbot,
    WrongAndFailed,
    GameOver,
}

/// One round: a single subject's questions played in order.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct GameSession {
    chatbot: Chatbot,
    questions: Vec<Question>,
    current_question_index: usize,
    score: usize,
}

impl GameSession {
    pub fn new(chatbot: Chatbot, questions: Vec<Question>) -> Self {
        Self {
            chatbot,
            questions,
            current_question_index: 0,
            score: 0,
        }
    }

    /// `None` once every question has been passed.
    pub fn current_question(&self) -> Option<&Question> {
        self.questions.get(self.current_question_index)
    }

    pub fn chatbot(&self) -> &Chatbot {
        &self.chatbot
    }

    pub fn subject(&self) -> &str {
        self.questions
            .first()
            .map(|q| q.subject())
            .unwrap_or("Unknown")
    }

    pub fn score(&self) -> usize {
        self.score
    }

    pub fn current_index(&self) -> usize {
        self.current_question_index
    }

    pub fn len(&self) -> usize {
        self.questions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }

    pub fn is_won(&self) -> bool {
        self.current_question_index >= self.questions.len()
    }

    /// Resolves `choice` against the current question.
    ///
    /// A wrong answer spends the game-wide save in `game` and rolls the
    /// chatbot once. If the save is already gone the game is over and no roll
    /// happens. Choices that don't name an option are simply wrong.
    pub fn submit_answer<R: SuccessRoll + ?Sized>(
        &mut self,
        choice: usize,
        game: &mut GameState,
        roll: &mut R,
    ) -> GameResult {
        let Some(question) = self.questions.get(self.current_question_index) else {
            return GameResult::GameOver;
        };

        if question.is_correct(choice) {
            self.score += 1;
            self.current_question_index += 1;
            return GameResult::Correct;
        }

        if !game.try_use_save() {
            return GameResult::GameOver;
        }

        let saved = self.chatbot.calculate_success(question.subject(), roll);
        info!(
            "{} tried to save a wrong answer on {}: {}",
            self.chatbot.name(),
            question.subject(),
            if saved { "saved" } else { "failed" }
        );
        if saved {
            self.current_question_index += 1;
            return GameResult::SavedByChatbot;
        }
        GameResult::WrongAndFailed
    }
}
