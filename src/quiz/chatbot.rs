use log::debug;
use rand::rngs::StdRng;
use rand::Rng;
use rand::SeedableRng;

use crate::quiz::same_subject;

pub const STRENGTH_SUCCESS_RATE: f64 = 0.90;
pub const WEAKNESS_SUCCESS_RATE: f64 = 0.10;
pub const NEUTRAL_SUCCESS_RATE: f64 = 0.50;

/// The selectable chatbots and their (strength, weakness) subjects.
pub const ROSTER: [(&str, &str, &str); 7] = [
    ("CHATGPT", "INTRO", "MAPPINGS"),
    ("GEMINI", "OOP", "FUNCTIONAL"),
    ("GROK", "PROCEDURAL", "EVENT_DRIVEN"),
    ("COPILOT", "FUNCTIONAL", "OOP"),
    ("CLAUDE", "IMP_DEC", "INTRO"),
    ("DEEPSEEK", "EVENT_DRIVEN", "IMP_DEC"),
    ("PERPLEXITY", "MAPPINGS", "PROCEDURAL"),
];

/// Source of the uniform draws behind every chatbot decision.
pub trait SuccessRoll {
    /// A value in `[0, 1)`.
    fn next_roll(&mut self) -> f64;

    /// An index in `0..len`. `len` must not be zero.
    fn pick_index(&mut self, len: usize) -> usize {
        let index = (self.next_roll() * len as f64) as usize;
        index.min(len.saturating_sub(1))
    }
}

/// Adapts any `rand` generator into a [`SuccessRoll`].
#[derive(Debug, Clone)]
pub struct RngRoll<R>(R);

impl<R: Rng> RngRoll<R> {
    pub fn new(rng: R) -> Self {
        Self(rng)
    }

    /// The wrapped generator, for shuffling question pools with the same source.
    pub fn rng_mut(&mut self) -> &mut R {
        &mut self.0
    }
}

impl RngRoll<StdRng> {
    pub fn from_entropy() -> Self {
        Self(StdRng::from_entropy())
    }

    pub fn seeded(seed: u64) -> Self {
        Self(StdRng::seed_from_u64(seed))
    }
}

impl<R: Rng> SuccessRoll for RngRoll<R> {
    fn next_roll(&mut self) -> f64 {
        self.0.gen::<f64>()
    }

    fn pick_index(&mut self, len: usize) -> usize {
        if len == 0 {
            return 0;
        }
        self.0.gen_range(0..len)
    }
}

/// How a chatbot relates to a given subject.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Affinity {
    Strength,
    Weakness,
    Neutral,
}

impl Affinity {
    pub fn success_rate(self) -> f64 {
        match self {
            Affinity::Strength => STRENGTH_SUCCESS_RATE,
            Affinity::Weakness => WEAKNESS_SUCCESS_RATE,
            Affinity::Neutral => NEUTRAL_SUCCESS_RATE,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Chatbot {
    name: String,
    strength_subject: String,
    weakness_subject: String,
    revealed: bool,
}

impl Chatbot {
    pub fn new(name: String, strength_subject: String, weakness_subject: String) -> Self {
        Self {
            name,
            strength_subject,
            weakness_subject,
            revealed: false,
        }
    }

    /// Looks a chatbot up by name, ignoring case.
    pub fn from_roster(name: &str) -> Option<Self> {
        let name = name.trim();
        ROSTER
            .iter()
            .find(|(bot_name, _, _)| bot_name.eq_ignore_ascii_case(name))
            .map(|(bot_name, strength, weakness)| {
                Self::new(bot_name.to_string(), strength.to_string(), weakness.to_string())
            })
    }

    pub fn roster_names() -> Vec<&'static str> {
        ROSTER.iter().map(|(name, _, _)| *name).collect()
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn strength_subject(&self) -> &str {
        &self.strength_subject
    }

    pub fn weakness_subject(&self) -> &str {
        &self.weakness_subject
    }

    pub fn is_revealed(&self) -> bool {
        self.revealed
    }

    /// Only ever flips from hidden to revealed.
    pub fn reveal_stats(&mut self) {
        self.revealed = true;
    }

    pub fn affinity_for(&self, subject: &str) -> Affinity {
        if same_subject(subject, &self.strength_subject) {
            Affinity::Strength
        } else if same_subject(subject, &self.weakness_subject) {
            Affinity::Weakness
        } else {
            Affinity::Neutral
        }
    }

    /// Draws exactly one roll and compares it against the rate for `subject`.
    /// Whether the stats are revealed has no effect on the odds.
    pub fn calculate_success<R: SuccessRoll + ?Sized>(&self, subject: &str, roll: &mut R) -> bool {
        let value = roll.next_roll();
        let affinity = self.affinity_for(subject);
        let success = value < affinity.success_rate();
        debug!(
            "{} rolled {:.3} on {} ({:?}): {}",
            self.name,
            value,
            subject,
            affinity,
            if success { "success" } else { "failure" }
        );
        success
    }

    pub fn intro_line(&self) -> String {
        if !self.revealed {
            return "Waiting...".to_string();
        }
        format!(
            "Hey! I am good at {} but bad at {}.",
            self.strength_subject, self.weakness_subject
        )
    }

    pub fn stats_line(&self) -> String {
        if !self.revealed {
            return "Stats: [HIDDEN]".to_string();
        }
        format!(
            "Stats: STR {} / WK {}",
            self.strength_subject, self.weakness_subject
        )
    }
}
