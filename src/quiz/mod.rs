pub mod bank;
pub mod chatbot;
pub mod commands;
pub mod config;
pub mod game;
pub mod session;

/// Advisory tag carried by every question. Both kinds are answered the same way.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum QuestionType {
    #[default]
    Theoretical,
    Programming,
}

/// One multiple-choice item. Fields are private so a question can't change once built.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Question {
    text: String,
    #[serde(default)]
    code_snippet: Option<String>,
    options: Vec<String>,
    correct_answer_index: usize,
    subject: String,
    #[serde(rename = "type", default)]
    question_type: QuestionType,
}

impl Question {
    pub fn new(
        text: String,
        code_snippet: Option<String>,
        options: Vec<String>,
        correct_answer_index: usize,
        subject: String,
        question_type: QuestionType,
    ) -> Self {
        Self {
            text,
            code_snippet,
            options,
            correct_answer_index,
            subject,
            question_type,
        }
    }

    /// Stand-in used when a subject has no authored questions.
    /// `number` is 1-based and only shows up in the text.
    pub fn placeholder(subject: &str, number: usize) -> Self {
        Self::new(
            format!("Dummy Q{} ({})", number, subject),
            None,
            ["A", "B", "C", "D"].iter().map(|o| o.to_string()).collect(),
            0,
            subject.to_string(),
            QuestionType::Theoretical,
        )
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    /// Empty snippets in the source data are treated the same as missing ones.
    pub fn code_snippet(&self) -> Option<&str> {
        self.code_snippet.as_deref().filter(|s| !s.trim().is_empty())
    }

    pub fn options(&self) -> &[String] {
        &self.options
    }

    pub fn correct_answer_index(&self) -> usize {
        self.correct_answer_index
    }

    pub fn subject(&self) -> &str {
        &self.subject
    }

    pub fn question_type(&self) -> QuestionType {
        self.question_type
    }

    pub fn is_correct(&self, choice: usize) -> bool {
        choice == self.correct_answer_index
    }

    /// The correct index has to point at one of the options.
    pub fn has_valid_answer(&self) -> bool {
        self.correct_answer_index < self.options.len()
    }

    pub fn is_about(&self, subject: &str) -> bool {
        same_subject(&self.subject, subject)
    }
}

/// Subjects are compared without regard to case everywhere in the game.
pub fn same_subject(a: &str, b: &str) -> bool {
    a.to_lowercase() == b.to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn placeholder_is_four_options_with_first_correct() {
        let question = Question::placeholder("OOP", 2);
        assert_eq!(question.text(), "Dummy Q2 (OOP)");
        assert_eq!(question.options(), ["A", "B", "C", "D"]);
        assert_eq!(question.correct_answer_index(), 0);
        assert_eq!(question.subject(), "OOP");
        assert_eq!(question.question_type(), QuestionType::Theoretical);
        assert!(question.code_snippet().is_none());
        assert!(question.has_valid_answer());
    }

    #[test]
    fn deserializes_camel_case_record() {
        let json = r#"{
            "text": "What does this print?",
            "codeSnippet": "print(1 + 1)",
            "options": ["1", "2", "11"],
            "correctAnswerIndex": 1,
            "subject": "intro",
            "type": "PROGRAMMING"
        }"#;
        let question: Question = serde_json::from_str(json).unwrap();
        assert_eq!(question.code_snippet(), Some("print(1 + 1)"));
        assert_eq!(question.correct_answer_index(), 1);
        assert_eq!(question.question_type(), QuestionType::Programming);
        assert!(question.is_about("INTRO"));
    }

    #[test]
    fn missing_type_and_snippet_fall_back_to_defaults() {
        let json = r#"{"text": "t", "options": ["a", "b"], "correctAnswerIndex": 0, "subject": "OOP"}"#;
        let question: Question = serde_json::from_str(json).unwrap();
        assert_eq!(question.question_type(), QuestionType::Theoretical);
        assert!(question.code_snippet().is_none());
    }

    #[test]
    fn blank_snippet_counts_as_absent() {
        let question = Question::new(
            "t".to_string(),
            Some("   ".to_string()),
            vec!["a".to_string(), "b".to_string()],
            1,
            "OOP".to_string(),
            QuestionType::Programming,
        );
        assert!(question.code_snippet().is_none());
    }

    #[test]
    fn out_of_range_answer_is_invalid() {
        let question = Question::new(
            "t".to_string(),
            None,
            vec!["a".to_string(), "b".to_string()],
            2,
            "OOP".to_string(),
            QuestionType::Theoretical,
        );
        assert!(!question.has_valid_answer());
    }
}
