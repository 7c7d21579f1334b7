use std::path::PathBuf;

use thiserror::Error;

pub const DEFAULT_QUESTIONS_DIR: &str = "MCQ";
pub const DEFAULT_QUESTIONS_PER_ROUND: usize = 2;
pub const DEFAULT_SUBJECTS: [&str; 7] = [
    "INTRO",
    "PROCEDURAL",
    "FUNCTIONAL",
    "OOP",
    "IMP_DEC",
    "EVENT_DRIVEN",
    "MAPPINGS",
];

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{key} must be a non-negative number, got {value:?}")]
    InvalidNumber { key: &'static str, value: String },

    #[error("QUIZ_QUESTIONS_PER_ROUND must be at least 1")]
    ZeroQuestionsPerRound,

    #[error("QUIZ_SUBJECTS must name at least one subject")]
    NoSubjects,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameConfig {
    pub questions_dir: PathBuf,
    pub questions_per_round: usize,
    pub subjects: Vec<String>,
    /// Fixes the random source so a whole game can be replayed.
    pub seed: Option<u64>,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            questions_dir: PathBuf::from(DEFAULT_QUESTIONS_DIR),
            questions_per_round: DEFAULT_QUESTIONS_PER_ROUND,
            subjects: DEFAULT_SUBJECTS.iter().map(|s| s.to_string()).collect(),
            seed: None,
        }
    }
}

impl GameConfig {
    /// Reads `QUIZ_*` variables from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(dir) = lookup("QUIZ_QUESTIONS_DIR").filter(|d| !d.trim().is_empty()) {
            config.questions_dir = PathBuf::from(dir.trim());
        }

        if let Some(value) = lookup("QUIZ_QUESTIONS_PER_ROUND") {
            config.questions_per_round = parse_number("QUIZ_QUESTIONS_PER_ROUND", &value)?;
            if config.questions_per_round == 0 {
                return Err(ConfigError::ZeroQuestionsPerRound);
            }
        }

        if let Some(value) = lookup("QUIZ_SUBJECTS") {
            config.subjects = value
                .split(',')
                .map(|s| s.trim().to_uppercase())
                .filter(|s| !s.is_empty())
                .collect();
            if config.subjects.is_empty() {
                return Err(ConfigError::NoSubjects);
            }
        }

        if let Some(value) = lookup("QUIZ_SEED") {
            config.seed = Some(parse_number("QUIZ_SEED", &value)?);
        }

        Ok(config)
    }

    /// Questions in a full game: every subject times the round size.
    pub fn total_questions(&self) -> usize {
        self.subjects.len() * self.questions_per_round
    }
}

fn parse_number<T: std::str::FromStr>(key: &'static str, value: &str) -> Result<T, ConfigError> {
    value.trim().parse().map_err(|_| ConfigError::InvalidNumber {
        key,
        value: value.to_string(),
    })
}
