//! Session record for one user's questionnaire pass.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::questionnaire::QuestionKey;

/// In-progress answers for one user. A missing key means "unanswered".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub user_id: String,
    pub answers: BTreeMap<QuestionKey, String>,
    /// The field written most recently, cleared on reset.
    pub last_answered: Option<QuestionKey>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Session {
    /// A fresh session with every field unanswered.
    pub fn new(user_id: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            user_id: user_id.into(),
            answers: BTreeMap::new(),
            last_answered: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn answer(&self, key: QuestionKey) -> Option<&str> {
        self.answers.get(&key).map(String::as_str)
    }

    pub fn is_answered(&self, key: QuestionKey) -> bool {
        self.answers.contains_key(&key)
    }

    /// Record (or overwrite) an answer.
    pub fn set_answer(&mut self, key: QuestionKey, value: impl Into<String>) {
        self.answers.insert(key, value.into());
        self.last_answered = Some(key);
        self.touch();
    }

    /// Back to all-unanswered. The session itself is kept.
    pub fn reset(&mut self) {
        self.answers.clear();
        self.last_answered = None;
        self.touch();
    }

    /// True when nothing has been answered yet.
    pub fn is_blank(&self) -> bool {
        self.answers.is_empty()
    }

    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }

    /// Whether the session has been idle longer than `ttl` as of `now`.
    pub fn is_expired(&self, ttl: chrono::Duration, now: DateTime<Utc>) -> bool {
        now - self.updated_at > ttl
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_session_is_blank() {
        let s = Session::new("U123");
        assert_eq!(s.user_id, "U123");
        assert!(s.is_blank());
        assert!(s.last_answered.is_none());
        for key in QuestionKey::ALL {
            assert!(!s.is_answered(key));
        }
    }

    #[test]
    fn set_answer_overwrites_and_tracks_last() {
        let mut s = Session::new("U1");
        s.set_answer(QuestionKey::Drink, "威士忌");
        s.set_answer(QuestionKey::Drink, "伏特加");
        assert_eq!(s.answer(QuestionKey::Drink), Some("伏特加"));
        assert_eq!(s.last_answered, Some(QuestionKey::Drink));
        assert_eq!(s.answers.len(), 1);
    }

    #[test]
    fn reset_clears_answers() {
        let mut s = Session::new("U1");
        s.set_answer(QuestionKey::Drink, "龍舌蘭");
        s.set_answer(QuestionKey::Mood, "放鬆");
        s.reset();
        assert!(s.is_blank());
        assert!(s.last_answered.is_none());
        assert_eq!(s.user_id, "U1");
    }

    #[test]
    fn expiry_uses_last_update() {
        let mut s = Session::new("U1");
        s.updated_at = Utc::now() - chrono::Duration::minutes(45);
        let now = Utc::now();
        assert!(s.is_expired(chrono::Duration::minutes(30), now));
        assert!(!s.is_expired(chrono::Duration::minutes(60), now));
    }

    #[test]
    fn serde_roundtrip_keeps_key_names() {
        let mut s = Session::new("U1");
        s.set_answer(QuestionKey::Taste, "甜");
        let json = serde_json::to_value(&s).unwrap();
        assert_eq!(json["answers"]["taste"], "甜");
        assert_eq!(json["last_answered"], "taste");

        let parsed: Session = serde_json::from_value(json).unwrap();
        assert_eq!(parsed, s);
    }
}
