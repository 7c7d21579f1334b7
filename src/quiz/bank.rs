use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use log::{debug, warn};
use rand::seq::SliceRandom;
use rand::Rng;
use thiserror::Error;

use crate::quiz::Question;

#[derive(Debug, Error)]
pub enum BankError {
    #[error("question directory not found: {0}")]
    MissingRoot(PathBuf),

    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {source_name}: {source}")]
    Parse {
        source_name: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Every loaded question, grouped by upper-cased subject.
#[derive(Debug, Clone, Default)]
pub struct QuestionBank {
    by_subject: HashMap<String, Vec<Question>>,
}

impl QuestionBank {
    pub fn new() -> Self {
        Self::default()
    }

    /// Walks `root` recursively and loads every `*.json` file in it.
    ///
    /// Each file holds an array of question records. Files that can't be read
    /// or parsed are logged and skipped so one bad file doesn't empty the bank.
    pub fn load_dir(root: impl AsRef<Path>) -> Result<Self, BankError> {
        let root = root.as_ref();
        if !root.is_dir() {
            return Err(BankError::MissingRoot(root.to_path_buf()));
        }

        let mut files = Vec::new();
        collect_json_files(root, &mut files)?;
        files.sort();

        let mut bank = Self::new();
        for path in files {
            let contents = match fs::read_to_string(&path) {
                Ok(contents) => contents,
                Err(source) => {
                    warn!("{}", BankError::Io { path, source });
                    continue;
                }
            };
            match bank.add_json(&path.display().to_string(), &contents) {
                Ok(added) => debug!("Loaded {} questions from {}", added, path.display()),
                Err(err) => warn!("{}", err),
            }
        }
        Ok(bank)
    }

    pub fn from_json_str(json: &str) -> Result<Self, BankError> {
        let mut bank = Self::new();
        bank.add_json("<inline>", json)?;
        Ok(bank)
    }

    /// Parses one array of records and returns how many were accepted.
    pub fn add_json(&mut self, source_name: &str, json: &str) -> Result<usize, BankError> {
        let records: Vec<Option<Question>> =
            serde_json::from_str(json).map_err(|source| BankError::Parse {
                source_name: source_name.to_string(),
                source,
            })?;

        let mut added = 0;
        for question in records.into_iter().flatten() {
            if self.insert(question) {
                added += 1;
            }
        }
        Ok(added)
    }

    /// Rejects records whose answer index doesn't point at an option.
    pub fn insert(&mut self, question: Question) -> bool {
        if !question.has_valid_answer() {
            warn!(
                "Skipping question {:?}: answer index {} with {} options",
                question.text(),
                question.correct_answer_index(),
                question.options().len()
            );
            return false;
        }
        self.by_subject
            .entry(question.subject().to_uppercase())
            .or_default()
            .push(question);
        true
    }

    pub fn len(&self) -> usize {
        self.by_subject.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn subjects(&self) -> Vec<&str> {
        let mut subjects: Vec<&str> = self.by_subject.keys().map(String::as_str).collect();
        subjects.sort_unstable();
        subjects
    }

    pub fn count_for(&self, subject: &str) -> usize {
        self.by_subject
            .get(&subject.to_uppercase())
            .map_or(0, Vec::len)
    }

    /// Up to `count` questions on `subject`, in a fresh random order each call.
    pub fn questions_for_subject<R: Rng + ?Sized>(
        &self,
        subject: &str,
        count: usize,
        rng: &mut R,
    ) -> Vec<Question> {
        let mut pool = self
            .by_subject
            .get(&subject.to_uppercase())
            .cloned()
            .unwrap_or_default();
        pool.shuffle(rng);
        pool.truncate(count);
        pool
    }

    /// Like [`Self::questions_for_subject`] but never empty: a subject with no
    /// questions gets `count` placeholders instead.
    pub fn round_questions<R: Rng + ?Sized>(
        &self,
        subject: &str,
        count: usize,
        rng: &mut R,
    ) -> Vec<Question> {
        let questions = self.questions_for_subject(subject, count, rng);
        if !questions.is_empty() {
            return questions;
        }
        warn!("No questions for {}, using placeholders", subject);
        (1..=count.max(1))
            .map(|number| Question::placeholder(subject, number))
            .collect()
    }

    /// Up to `per_subject` questions from every subject, shuffled together.
    pub fn game_set<R: Rng + ?Sized>(&self, per_subject: usize, rng: &mut R) -> Vec<Question> {
        let mut set = Vec::new();
        for subject in self.subjects() {
            set.extend(self.questions_for_subject(subject, per_subject, rng));
        }
        set.shuffle(rng);
        set
    }
}

fn collect_json_files(dir: &Path, files: &mut Vec<PathBuf>) -> Result<(), BankError> {
    let entries = fs::read_dir(dir).map_err(|source| BankError::Io {
        path: dir.to_path_buf(),
        source,
    })?;
    for entry in entries {
        let path = match entry {
            Ok(entry) => entry.path(),
            Err(err) => {
                warn!("Skipping unreadable entry in {}: {}", dir.display(), err);
                continue;
            }
        };
        if path.is_dir() {
            collect_json_files(&path, files)?;
        } else if path.extension().is_some_and(|ext| ext == "json") {
            files.push(path);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    const INTRO_AND_OOP: &str = r#"[
        {"text": "i1", "options": ["a", "b"], "correctAnswerIndex": 0, "subject": "INTRO", "type": "THEORETICAL"},
        {"text": "i2", "options": ["a", "b", "c"], "correctAnswerIndex": 2, "subject": "intro", "type": "THEORETICAL"},
        {"text": "i3", "options": ["a", "b", "c", "d"], "correctAnswerIndex": 3, "subject": "Intro", "type": "PROGRAMMING"},
        {"text": "o1", "codeSnippet": "class A {}", "options": ["a", "b"], "correctAnswerIndex": 1, "subject": "OOP", "type": "PROGRAMMING"}
    ]"#;

    fn rng() -> StdRng {
        StdRng::seed_from_u64(3)
    }

    #[test]
    fn groups_subjects_ignoring_case() {
        let bank = QuestionBank::from_json_str(INTRO_AND_OOP).unwrap();
        assert_eq!(bank.len(), 4);
        assert_eq!(bank.subjects(), vec!["INTRO", "OOP"]);
        assert_eq!(bank.count_for("intro"), 3);
        assert_eq!(bank.count_for("oop"), 1);
        assert_eq!(bank.count_for("MAPPINGS"), 0);
    }

    #[test]
    fn subject_questions_are_limited_and_matching() {
        let bank = QuestionBank::from_json_str(INTRO_AND_OOP).unwrap();
        let questions = bank.questions_for_subject("iNtRo", 2, &mut rng());
        assert_eq!(questions.len(), 2);
        assert!(questions.iter().all(|q| q.is_about("INTRO")));

        let all = bank.questions_for_subject("INTRO", 10, &mut rng());
        assert_eq!(all.len(), 3);
    }

    #[test]
    fn empty_subject_gets_placeholders() {
        let bank = QuestionBank::from_json_str(INTRO_AND_OOP).unwrap();
        assert!(bank.questions_for_subject("MAPPINGS", 2, &mut rng()).is_empty());

        let questions = bank.round_questions("MAPPINGS", 2, &mut rng());
        assert_eq!(
            questions,
            vec![
                Question::placeholder("MAPPINGS", 1),
                Question::placeholder("MAPPINGS", 2)
            ]
        );
    }

    #[test]
    fn invalid_records_are_skipped() {
        let json = r#"[
            {"text": "ok", "options": ["a", "b"], "correctAnswerIndex": 1, "subject": "OOP"},
            {"text": "bad", "options": ["a", "b"], "correctAnswerIndex": 5, "subject": "OOP"},
            null
        ]"#;
        let bank = QuestionBank::from_json_str(json).unwrap();
        assert_eq!(bank.len(), 1);
    }

    #[test]
    fn malformed_json_is_a_parse_error() {
        let err = QuestionBank::from_json_str("{not json").unwrap_err();
        assert!(matches!(err, BankError::Parse { .. }));
    }

    #[test]
    fn game_set_balances_subjects() {
        let bank = QuestionBank::from_json_str(INTRO_AND_OOP).unwrap();
        let set = bank.game_set(2, &mut rng());
        assert_eq!(set.len(), 3);
        assert_eq!(set.iter().filter(|q| q.is_about("INTRO")).count(), 2);
        assert_eq!(set.iter().filter(|q| q.is_about("OOP")).count(), 1);
    }

    #[test]
    fn loads_nested_directories_and_skips_bad_files() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("oop");
        fs::create_dir(&nested).unwrap();
        fs::write(dir.path().join("intro.json"), INTRO_AND_OOP).unwrap();
        fs::write(
            nested.join("more.json"),
            r#"[{"text": "o2", "options": ["a", "b"], "correctAnswerIndex": 0, "subject": "OOP"}]"#,
        )
        .unwrap();
        fs::write(nested.join("broken.json"), "[{").unwrap();
        fs::write(dir.path().join("notes.txt"), "not a question file").unwrap();

        let bank = QuestionBank::load_dir(dir.path()).unwrap();
        assert_eq!(bank.len(), 5);
        assert_eq!(bank.count_for("OOP"), 2);
    }

    #[test]
    fn bundled_questions_cover_every_default_subject() {
        let bank = QuestionBank::load_dir(concat!(env!("CARGO_MANIFEST_DIR"), "/MCQ")).unwrap();
        for subject in crate::quiz::config::DEFAULT_SUBJECTS {
            assert!(bank.count_for(subject) >= 2, "{} has too few questions", subject);
        }
    }

    #[test]
    fn missing_root_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = QuestionBank::load_dir(dir.path().join("nope")).unwrap_err();
        assert!(matches!(err, BankError::MissingRoot(_)));
    }
}
