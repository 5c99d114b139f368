// src/models/question.rs

use std::collections::BTreeMap;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Stable option label. Quizzes use at most four options per question,
/// keyed A through D.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum OptionKey {
    A,
    B,
    C,
    D,
}

impl OptionKey {
    pub const ALL: [OptionKey; 4] = [OptionKey::A, OptionKey::B, OptionKey::C, OptionKey::D];

    pub fn as_str(&self) -> &'static str {
        match self {
            OptionKey::A => "A",
            OptionKey::B => "B",
            OptionKey::C => "C",
            OptionKey::D => "D",
        }
    }
}

impl FromStr for OptionKey {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "A" => Ok(OptionKey::A),
            "B" => Ok(OptionKey::B),
            "C" => Ok(OptionKey::C),
            "D" => Ok(OptionKey::D),
            _ => Err(()),
        }
    }
}

impl std::fmt::Display for OptionKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An approved question as authored: option texts keyed by their original
/// labels, plus the original correct key.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuestionDefinition {
    pub id: i64,
    pub prompt: String,
    pub options: BTreeMap<OptionKey, String>,
    pub correct_key: OptionKey,
}

/// One (key, text) pair after relabeling.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShuffledOption {
    pub key: OptionKey,
    pub text: String,
}

/// A question as presented inside one attempt: options in shuffled order with
/// fresh A.. labels, and the correct key remapped to the new labeling.
/// This is the single normalized option shape used everywhere downstream.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuestionView {
    pub question_id: i64,
    pub prompt: String,
    pub options: Vec<ShuffledOption>,
    pub correct_key: OptionKey,
}

/// DTO for sending a question view to the client (hides the correct key).
#[derive(Debug, Serialize)]
pub struct PublicQuestionView {
    pub question_id: i64,
    pub prompt: String,
    pub options: Vec<ShuffledOption>,
}

impl From<&QuestionView> for PublicQuestionView {
    fn from(view: &QuestionView) -> Self {
        PublicQuestionView {
            question_id: view.question_id,
            prompt: view.prompt.clone(),
            options: view.options.clone(),
        }
    }
}
