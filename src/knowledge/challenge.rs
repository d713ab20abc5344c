//! Challenges and Question Banks
//!
//! A challenge is an immutable, ordered set of prompts with expected answers,
//! issued to one student for one subject.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Subject used when the requested one is not in the bank.
pub const DEFAULT_SUBJECT: &str = "general";

/// One prompt and the answer it expects.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Question {
    /// Text shown to the student
    pub prompt: String,
    /// Text the answer must contain (case-insensitive)
    pub expected_answer: String,
}

impl Question {
    /// Create a question.
    pub fn new(prompt: impl Into<String>, expected_answer: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            expected_answer: expected_answer.into(),
        }
    }
}

/// Issued challenge. Never mutated after creation.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Challenge {
    /// Unique per issue, even for identical inputs
    pub id: Uuid,
    /// Student the challenge was issued to
    pub student_id: String,
    /// Subject as requested
    pub subject: String,
    /// Ordered questions
    pub questions: Vec<Question>,
    /// Issue time
    pub created_at: DateTime<Utc>,
    /// Engine-wide difficulty at issue time
    pub difficulty: u32,
}

/// Fixed question sets keyed by lowercase subject.
#[derive(Clone, Debug)]
pub struct QuestionBank {
    subjects: BTreeMap<String, Vec<Question>>,
}

impl QuestionBank {
    /// Empty bank with only the fallback subject.
    pub fn new(fallback: Vec<Question>) -> Self {
        let mut subjects = BTreeMap::new();
        subjects.insert(DEFAULT_SUBJECT.to_string(), fallback);
        Self { subjects }
    }

    /// Bank with the built-in curriculum.
    pub fn standard() -> Self {
        let mut bank = Self::new(vec![
            Question::new("What is the chemical symbol for water?", "H2O"),
            Question::new("How many sides does a hexagon have (in words)?", "six"),
            Question::new("Which planet is known as the Red Planet?", "Mars"),
            Question::new("What gas do plants absorb from the atmosphere?", "carbon dioxide"),
            Question::new("What is the largest ocean on Earth?", "Pacific"),
        ]);

        bank.insert(
            "javascript",
            vec![
                Question::new("Which keyword declares a block-scoped constant?", "const"),
                Question::new("What does `typeof null` evaluate to?", "object"),
                Question::new("Which built-in parses a JSON string into a value?", "JSON.parse"),
                Question::new(
                    "Which array method returns a new array of transformed elements?",
                    "map",
                ),
                Question::new("Which operator compares without type coercion?", "==="),
            ],
        );
        bank.insert(
            "python",
            vec![
                Question::new("Which keyword defines a function?", "def"),
                Question::new("Which built-in returns the length of a sequence?", "len"),
                Question::new("What is the immutable counterpart of a list?", "tuple"),
                Question::new("Which keyword creates a generator value?", "yield"),
                Question::new("Which statement handles exceptions?", "try"),
            ],
        );
        bank.insert(
            "rust",
            vec![
                Question::new("Which keyword makes a binding mutable?", "mut"),
                Question::new("Which enum represents an optional value?", "Option"),
                Question::new(
                    "What is the name of the symbol that propagates errors?",
                    "question mark",
                ),
                Question::new("Which trait enables `{}` formatting?", "Display"),
                Question::new(
                    "Which smart pointer provides shared ownership across threads?",
                    "Arc",
                ),
            ],
        );
        bank.insert(
            "mathematics",
            vec![
                Question::new("What is 7 multiplied by 8?", "56"),
                Question::new("What is the square root of 144?", "12"),
                Question::new("What is the derivative of x^2?", "2x"),
                Question::new("How many degrees are in a triangle's interior angles?", "180"),
                Question::new("What is the smallest prime number (in words)?", "two"),
            ],
        );
        bank.insert(
            "blockchain",
            vec![
                Question::new("What links each block to its predecessor?", "hash"),
                Question::new("What is the maximum supply of Bitcoin in millions?", "21"),
                Question::new("What event halves the block reward?", "halving"),
                Question::new("What do you call locking tokens to earn yield?", "staking"),
                Question::new(
                    "Which data structure commits to all transactions in a block?",
                    "merkle",
                ),
            ],
        );

        bank
    }

    /// Add or replace a subject.
    pub fn insert(&mut self, subject: &str, questions: Vec<Question>) {
        self.subjects.insert(subject.to_ascii_lowercase(), questions);
    }

    /// Questions for `subject`, falling back to the default set.
    pub fn questions_for(&self, subject: &str) -> &[Question] {
        self.subjects
            .get(&subject.to_ascii_lowercase())
            .or_else(|| self.subjects.get(DEFAULT_SUBJECT))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Known subjects in sorted order.
    pub fn subjects(&self) -> impl Iterator<Item = &str> {
        self.subjects.keys().map(String::as_str)
    }

    /// Issue a fresh challenge.
    pub fn issue(&self, student_id: &str, subject: &str, difficulty: u32) -> Challenge {
        Challenge {
            id: Uuid::new_v4(),
            student_id: student_id.to_string(),
            subject: subject.to_string(),
            questions: self.questions_for(subject).to_vec(),
            created_at: Utc::now(),
            difficulty,
        }
    }
}

impl Default for QuestionBank {
    fn default() -> Self {
        Self::standard()
    }
}
