//! Question model: keys, choices, and prompt text.

use serde::{Deserialize, Serialize};

use crate::error::DialogueError;

/// The fields a questionnaire can ask about, in canonical order.
///
/// The derived `Ord` follows declaration order, so a `BTreeMap` keyed by
/// `QuestionKey` iterates in the order the questions are asked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuestionKey {
    Drink,
    Mood,
    Taste,
    Occasion,
    Weather,
}

impl QuestionKey {
    pub const ALL: [QuestionKey; 5] = [
        Self::Drink,
        Self::Mood,
        Self::Taste,
        Self::Occasion,
        Self::Weather,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Drink => "drink",
            Self::Mood => "mood",
            Self::Taste => "taste",
            Self::Occasion => "occasion",
            Self::Weather => "weather",
        }
    }

    /// Label used for this field when building the recommendation prompt.
    pub fn prompt_label(&self) -> &'static str {
        match self {
            Self::Drink => "今天想喝的酒類",
            Self::Mood => "今天的心情",
            Self::Taste => "偏好的口味",
            Self::Occasion => "場合",
            Self::Weather => "天氣",
        }
    }
}

impl std::fmt::Display for QuestionKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for QuestionKey {
    type Err = DialogueError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|k| k.as_str() == s)
            .ok_or_else(|| DialogueError::UnknownQuestion(s.to_string()))
    }
}

/// One selectable answer: what the button shows and what gets stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Choice {
    pub label: String,
    pub value: String,
}

impl Choice {
    pub fn new(label: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            value: value.into(),
        }
    }

    /// A choice whose label is also its stored value.
    pub fn same(text: impl Into<String>) -> Self {
        let text = text.into();
        Self {
            label: text.clone(),
            value: text,
        }
    }
}

/// A static question: prompt text plus an ordered, fixed choice set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionDefinition {
    pub key: QuestionKey,
    pub title: String,
    pub body: String,
    /// Text shown by clients that cannot render buttons.
    pub alt_text: String,
    pub choices: Vec<Choice>,
}

impl QuestionDefinition {
    pub fn new(
        key: QuestionKey,
        title: impl Into<String>,
        body: impl Into<String>,
        alt_text: impl Into<String>,
    ) -> Self {
        Self {
            key,
            title: title.into(),
            body: body.into(),
            alt_text: alt_text.into(),
            choices: Vec::new(),
        }
    }

    pub fn with_choice(mut self, choice: Choice) -> Self {
        self.choices.push(choice);
        self
    }

    /// Whether `value` is one of this question's choices.
    pub fn accepts(&self, value: &str) -> bool {
        self.choices.iter().any(|c| c.value == value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_display_matches_serde() {
        for key in QuestionKey::ALL {
            let json = serde_json::to_string(&key).unwrap();
            assert_eq!(format!("\"{key}\""), json);
        }
    }

    #[test]
    fn key_parses_from_its_name() {
        for key in QuestionKey::ALL {
            assert_eq!(key.as_str().parse::<QuestionKey>().unwrap(), key);
        }
        assert!("colour".parse::<QuestionKey>().is_err());
        assert!("Drink".parse::<QuestionKey>().is_err());
    }

    #[test]
    fn key_order_is_canonical() {
        let mut keys = vec![QuestionKey::Weather, QuestionKey::Drink, QuestionKey::Taste];
        keys.sort();
        assert_eq!(
            keys,
            vec![QuestionKey::Drink, QuestionKey::Taste, QuestionKey::Weather]
        );
    }

    #[test]
    fn accepts_only_listed_values() {
        let q = QuestionDefinition::new(QuestionKey::Taste, "t", "b", "a")
            .with_choice(Choice::new("檸檬（酸）", "酸"))
            .with_choice(Choice::same("甜"));
        assert!(q.accepts("酸"));
        assert!(q.accepts("甜"));
        assert!(!q.accepts("檸檬（酸）"));
    }
}
