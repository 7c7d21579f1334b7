use std::fmt;

use log::info;
use thiserror::Error;

use crate::quiz::chatbot::{Affinity, SuccessRoll};
use crate::quiz::game::GameState;
use crate::quiz::session::{GameResult, GameSession};
use crate::quiz::Question;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Ask,
    CopyPaste,
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Command::Ask => write!(f, "Ask"),
            Command::CopyPaste => write!(f, "Copy-paste"),
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CommandError {
    #[error("{0} has already been used this game")]
    AlreadyUsed(Command),

    #[error("There is no question left to answer")]
    NoQuestion,
}

/// What the chatbot said when asked for help.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Hint {
    /// 0-based option the chatbot points at.
    pub suggested_option: usize,
    pub honest: bool,
    pub line: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CopyPaste {
    pub choice: usize,
    pub result: GameResult,
}

/// Asks the chatbot for a hint on the current question. Usable once per game.
pub fn ask<R: SuccessRoll + ?Sized>(
    session: &GameSession,
    game: &mut GameState,
    roll: &mut R,
) -> Result<Hint, CommandError> {
    if game.is_ask_used() {
        return Err(CommandError::AlreadyUsed(Command::Ask));
    }
    let question = session.current_question().ok_or(CommandError::NoQuestion)?;
    game.mark_ask_used();

    let chatbot = session.chatbot();
    let subject = question.subject();
    let affinity = chatbot.affinity_for(subject);
    let honest = chatbot.calculate_success(subject, roll);

    let suggested_option = if honest {
        question.correct_answer_index()
    } else {
        pick_wrong_option(question, roll)
    };
    let option = suggested_option + 1;

    let line = match (honest, affinity) {
        (true, Affinity::Strength) => format!(
            "I'm an expert at {}! The answer is definitely Option {}.",
            subject, option
        ),
        (true, Affinity::Weakness) => format!(
            "Ugh, I hate {}... but I think it's Option {}?",
            subject, option
        ),
        (true, Affinity::Neutral) => format!("I am 90% sure it is Option {}.", option),
        (false, Affinity::Strength) => format!(
            "Trust me, I know {}. It has to be Option {}!",
            subject, option
        ),
        (false, _) => format!("I have no idea. I'm guessing Option {}...", option),
    };

    info!("{} hinted option {} (honest: {})", chatbot.name(), option, honest);
    Ok(Hint {
        suggested_option,
        honest,
        line,
    })
}

/// Lets the chatbot answer the current question outright. Usable once per game.
///
/// The pick goes through [`GameSession::submit_answer`], so a wrong pick can
/// still be rescued by the save.
pub fn copy_paste<R: SuccessRoll + ?Sized>(
    session: &mut GameSession,
    game: &mut GameState,
    roll: &mut R,
) -> Result<CopyPaste, CommandError> {
    if game.is_copy_used() {
        return Err(CommandError::AlreadyUsed(Command::CopyPaste));
    }
    let question = session.current_question().ok_or(CommandError::NoQuestion)?;
    game.mark_copy_used();

    let choice = if session.chatbot().calculate_success(question.subject(), roll) {
        question.correct_answer_index()
    } else {
        pick_wrong_option(question, roll)
    };
    info!("{} copy-pasted option {}", session.chatbot().name(), choice + 1);

    let result = session.submit_answer(choice, game, roll);
    Ok(CopyPaste { choice, result })
}

/// A uniformly chosen option other than the correct one.
fn pick_wrong_option<R: SuccessRoll + ?Sized>(question: &Question, roll: &mut R) -> usize {
    let correct = question.correct_answer_index();
    let wrong: Vec<usize> = (0..question.options().len())
        .filter(|index| *index != correct)
        .collect();
    if wrong.is_empty() {
        return correct;
    }
    wrong[roll.pick_index(wrong.len())]
}
