use std::sync::{Arc, Mutex, PoisonError};

use dotenv::dotenv;
use log::{error, info, warn};
use rand::rngs::StdRng;
use smarter_than_a_chatbot::quiz::{
    bank::QuestionBank,
    chatbot::{Chatbot, RngRoll},
    commands,
    config::GameConfig,
    game::{percent, GameState},
    session::{GameResult, GameSession},
    Question,
};
use teloxide::{
    dispatching::dialogue::InMemStorage,
    prelude::*,
    types::{ChatId, KeyboardButton, KeyboardMarkup, ParseMode},
};

type QuizDialogue = Dialogue<State, InMemStorage<State>>;
type HandlerResult = Result<(), Box<dyn std::error::Error + Send + Sync>>;
type SharedRoll = Arc<Mutex<RngRoll<StdRng>>>;

#[derive(Clone, Default, serde::Serialize, serde::Deserialize)]
pub enum State {
    #[default]
    Start,
    ReceiveChatbotChoice,
    ReceiveSubjectChoice {
        chatbot: Chatbot,
        game: GameState,
    },
    Round {
        chatbot: Chatbot,
        game: GameState,
        session: GameSession,
    },
}

#[tokio::main]
async fn main() {
    dotenv().ok();

    pretty_env_logger::init();
    info!("Starting quiz bot...");

    let config = match GameConfig::from_env() {
        Ok(config) => Arc::new(config),
        Err(err) => {
            error!("Invalid configuration: {}", err);
            return;
        }
    };

    let bank = match QuestionBank::load_dir(&config.questions_dir) {
        Ok(bank) => bank,
        Err(err) => {
            warn!("{}; every round will use placeholder questions", err);
            QuestionBank::new()
        }
    };
    info!(
        "Loaded {} questions across {} subjects",
        bank.len(),
        bank.subjects().len()
    );

    let roll: SharedRoll = Arc::new(Mutex::new(match config.seed {
        Some(seed) => RngRoll::seeded(seed),
        None => RngRoll::from_entropy(),
    }));

    let bot = Bot::from_env();

    Dispatcher::builder(
        bot,
        Update::filter_message()
            .enter_dialogue::<Message, InMemStorage<State>, State>()
            .branch(dptree::case![State::Start].endpoint(start))
            .branch(dptree::case![State::ReceiveChatbotChoice].endpoint(receive_chatbot_choice))
            .branch(
                dptree::case![State::ReceiveSubjectChoice { chatbot, game }]
                    .endpoint(receive_subject_choice),
            )
            .branch(dptree::case![State::Round { chatbot, game, session }].endpoint(round)),
    )
    .dependencies(dptree::deps![
        InMemStorage::<State>::new(),
        Arc::new(bank),
        config,
        roll
    ])
    .enable_ctrlc_handler()
    .build()
    .dispatch()
    .await;
}

const NEW_GAME: &str = "New game";
const ASK_BUTTON: &str = "Ask";
const COPY_BUTTON: &str = "Copy-paste";

const GREETING_TEXT: &str = "Are You Smarter Than a Chatbot?\n\nAnswer programming questions one subject at a time. Your chatbot can give you one hint, answer one question for you, and save you from one wrong answer. Each works once per game.";

/// Runs `f` with the shared random source. Never hold the lock across an await.
fn with_roll<T>(roll: &SharedRoll, f: impl FnOnce(&mut RngRoll<StdRng>) -> T) -> T {
    let mut guard = roll.lock().unwrap_or_else(PoisonError::into_inner);
    f(&mut guard)
}

async fn start(bot: Bot, dialogue: QuizDialogue, msg: Message) -> HandlerResult {
    if msg.text() != Some(NEW_GAME) {
        bot.send_message(msg.chat.id, GREETING_TEXT)
            .reply_markup(KeyboardMarkup::new(vec![vec![KeyboardButton::new(NEW_GAME)]]))
            .await?;
        return Ok(());
    }

    let keyboard = KeyboardMarkup::new(
        Chatbot::roster_names()
            .chunks(3)
            .map(|row| row.iter().map(|name| KeyboardButton::new(*name)).collect())
            .collect::<Vec<Vec<_>>>(),
    );
    bot.send_message(msg.chat.id, "CHOOSE YOUR ASSISTANT")
        .reply_markup(keyboard)
        .await?;

    dialogue.update(State::ReceiveChatbotChoice).await?;
    Ok(())
}

async fn receive_chatbot_choice(
    bot: Bot,
    dialogue: QuizDialogue,
    msg: Message,
    config: Arc<GameConfig>,
) -> HandlerResult {
    let Some(chatbot) = msg.text().and_then(Chatbot::from_roster) else {
        bot.send_message(msg.chat.id, "Please pick one of the chatbots")
            .await?;
        return Ok(());
    };

    info!("Chat {} started a new game with {}", msg.chat.id.0, chatbot.name());
    bot.send_message(msg.chat.id, format!("{} is ready to help.", chatbot.name()))
        .await?;

    let game = GameState::new_game();
    send_subject_choice(&bot, msg.chat.id, &game, &config).await?;
    dialogue
        .update(State::ReceiveSubjectChoice { chatbot, game })
        .await?;
    Ok(())
}

async fn send_subject_choice(
    bot: &Bot,
    chat_id: ChatId,
    game: &GameState,
    config: &GameConfig,
) -> HandlerResult {
    let keyboard = KeyboardMarkup::new(
        game.remaining_subjects(&config.subjects)
            .chunks(3)
            .map(|row| row.iter().map(|s| KeyboardButton::new(*s)).collect())
            .collect::<Vec<Vec<_>>>(),
    );
    bot.send_message(chat_id, "SELECT A SUBJECT")
        .reply_markup(keyboard)
        .await?;
    Ok(())
}

async fn receive_subject_choice(
    bot: Bot,
    dialogue: QuizDialogue,
    (mut chatbot, game): (Chatbot, GameState),
    msg: Message,
    bank: Arc<QuestionBank>,
    config: Arc<GameConfig>,
    roll: SharedRoll,
) -> HandlerResult {
    let remaining = game.remaining_subjects(&config.subjects);
    let subject = msg
        .text()
        .and_then(|text| remaining.iter().find(|s| s.eq_ignore_ascii_case(text.trim())))
        .map(|s| s.to_string());
    let Some(subject) = subject else {
        bot.send_message(msg.chat.id, "Please pick one of the remaining subjects")
            .await?;
        send_subject_choice(&bot, msg.chat.id, &game, &config).await?;
        return Ok(());
    };

    let questions = with_roll(&roll, |roll| {
        bank.round_questions(&subject, config.questions_per_round, roll.rng_mut())
    });
    chatbot.reveal_stats();
    let session = GameSession::new(chatbot.clone(), questions);
    info!(
        "Chat {} started {} with {} questions",
        msg.chat.id.0,
        subject,
        session.len()
    );

    send_question(&bot, msg.chat.id, &session, &game, &config).await?;
    dialogue
        .update(State::Round {
            chatbot,
            game,
            session,
        })
        .await?;
    Ok(())
}

async fn round(
    bot: Bot,
    dialogue: QuizDialogue,
    (chatbot, mut game, mut session): (Chatbot, GameState, GameSession),
    msg: Message,
    config: Arc<GameConfig>,
    roll: SharedRoll,
) -> HandlerResult {
    let text = msg.text().unwrap_or_default().trim();

    let outcome = match text {
        ASK_BUTTON => {
            let reply = match with_roll(&roll, |roll| commands::ask(&session, &mut game, roll)) {
                Ok(hint) => format!("{} says: {}", chatbot.name(), hint.line),
                Err(err) => err.to_string(),
            };
            bot.send_message(msg.chat.id, reply)
                .reply_markup(answer_keyboard(&session, &game))
                .await?;
            dialogue
                .update(State::Round {
                    chatbot,
                    game,
                    session,
                })
                .await?;
            return Ok(());
        }
        COPY_BUTTON => {
            match with_roll(&roll, |roll| {
                commands::copy_paste(&mut session, &mut game, roll)
            }) {
                Ok(copied) => {
                    bot.send_message(
                        msg.chat.id,
                        format!("COPY PASTE\nBot chose Option {}.\nSubmitting...", copied.choice + 1),
                    )
                    .await?;
                    copied.result
                }
                Err(err) => {
                    bot.send_message(msg.chat.id, err.to_string()).await?;
                    return Ok(());
                }
            }
        }
        _ => match parse_choice(text, session.current_question()) {
            Some(choice) => {
                with_roll(&roll, |roll| session.submit_answer(choice, &mut game, roll))
            }
            None => {
                bot.send_message(msg.chat.id, "Please choose one of the options")
                    .reply_markup(answer_keyboard(&session, &game))
                    .await?;
                return Ok(());
            }
        },
    };

    resolve_outcome(&bot, dialogue, msg.chat.id, chatbot, game, session, outcome, &config).await
}

#[allow(clippy::too_many_arguments)]
async fn resolve_outcome(
    bot: &Bot,
    dialogue: QuizDialogue,
    chat_id: ChatId,
    chatbot: Chatbot,
    mut game: GameState,
    session: GameSession,
    outcome: GameResult,
    config: &GameConfig,
) -> HandlerResult {
    info!("Chat {} answered on {}: {:?}", chat_id.0, session.subject(), outcome);

    match outcome {
        GameResult::Correct => {
            bot.send_message(chat_id, "CORRECT! Good job! Proceeding...")
                .await?;
        }
        GameResult::SavedByChatbot => {
            bot.send_message(
                chat_id,
                format!("SAVED! You were wrong, but {} saved you!", chatbot.name()),
            )
            .await?;
        }
        GameResult::WrongAndFailed | GameResult::GameOver => {
            let reason = if outcome == GameResult::WrongAndFailed {
                "You were wrong!\nBot attempted to Save you, but FAILED."
            } else {
                "You threw an exception!"
            };
            let total = game.total_with(session.score());
            info!("Chat {} lost with {} points", chat_id.0, total);
            bot.send_message(
                chat_id,
                format!("GAME OVER\n{}\n\n{}", reason, final_score(total, config)),
            )
            .reply_markup(KeyboardMarkup::new(vec![vec![KeyboardButton::new(NEW_GAME)]]))
            .await?;
            dialogue.update(State::Start).await?;
            return Ok(());
        }
    }

    if !session.is_won() {
        send_question(bot, chat_id, &session, &game, config).await?;
        dialogue
            .update(State::Round {
                chatbot,
                game,
                session,
            })
            .await?;
        return Ok(());
    }

    game.finish_round(session.subject(), session.score());
    if game.remaining_subjects(&config.subjects).is_empty() {
        let total = game.global_score();
        let verdict = if percent(total, config.total_questions()) == 100 {
            "PERFECT SCORE! You are Smarter than a Chatbot!"
        } else {
            "You survived, but are you smarter?"
        };
        info!("Chat {} won with {} points", chat_id.0, total);
        bot.send_message(
            chat_id,
            format!("VICTORY\n{}\n{}", final_score(total, config), verdict),
        )
        .reply_markup(KeyboardMarkup::new(vec![vec![KeyboardButton::new(NEW_GAME)]]))
        .await?;
        dialogue.update(State::Start).await?;
        return Ok(());
    }

    bot.send_message(chat_id, "ROUND COMPLETE\nReturning to Subject Board...")
        .await?;
    send_subject_choice(bot, chat_id, &game, config).await?;
    dialogue
        .update(State::ReceiveSubjectChoice { chatbot, game })
        .await?;
    Ok(())
}

async fn send_question(
    bot: &Bot,
    chat_id: ChatId,
    session: &GameSession,
    game: &GameState,
    config: &GameConfig,
) -> HandlerResult {
    let Some(question) = session.current_question() else {
        return Ok(());
    };
    let progress = percent(game.total_with(session.score()), config.total_questions());
    let text = render_question(question, session, progress);

    bot.send_message(chat_id, text)
        .parse_mode(ParseMode::Html)
        .reply_markup(answer_keyboard(session, game))
        .await?;
    Ok(())
}

fn render_question(question: &Question, session: &GameSession, progress: usize) -> String {
    let chatbot = session.chatbot();
    let mut text = format!(
        "Subject: <b>{}</b>\n{}\n<i>{} says:</i> {}\nTotal Progress: {}%\n\n<b>Question {}/{}</b>\n{}",
        escape_html(question.subject()),
        escape_html(&chatbot.stats_line()),
        escape_html(chatbot.name()),
        escape_html(&chatbot.intro_line()),
        progress,
        session.current_index() + 1,
        session.len(),
        escape_html(question.text())
    );
    if let Some(code) = question.code_snippet() {
        text.push_str(&format!("\n\n<pre>{}</pre>", escape_html(code)));
    }
    text.push('\n');
    for (i, option) in question.options().iter().enumerate() {
        text.push_str(&format!("\n{}) {}", i + 1, escape_html(option)));
    }
    text
}

fn answer_keyboard(session: &GameSession, game: &GameState) -> KeyboardMarkup {
    let option_count = session
        .current_question()
        .map_or(0, |q| q.options().len());
    let mut rows = vec![(1..=option_count)
        .map(|n| KeyboardButton::new(n.to_string()))
        .collect::<Vec<_>>()];

    let mut tools = Vec::new();
    if !game.is_ask_used() {
        tools.push(KeyboardButton::new(ASK_BUTTON));
    }
    if !game.is_copy_used() {
        tools.push(KeyboardButton::new(COPY_BUTTON));
    }
    if !tools.is_empty() {
        rows.push(tools);
    }
    KeyboardMarkup::new(rows)
}

/// Maps a reply to a 0-based option: either its 1-based number or its exact text.
fn parse_choice(text: &str, question: Option<&Question>) -> Option<usize> {
    let text = text.trim();
    if let Ok(number) = text.parse::<usize>() {
        return number.checked_sub(1);
    }
    question?
        .options()
        .iter()
        .position(|option| option.trim().eq_ignore_ascii_case(text))
}

fn final_score(total: usize, config: &GameConfig) -> String {
    let max = config.total_questions();
    format!("Final Score: {}/{} ({}%)", total, max, percent(total, max))
}

fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}
