//! Question sequencer: static transition table over an ordered question list.
//!
//! "Next" is decided purely from which field was just answered:
//! drink → mood → taste → (occasion → weather) → Complete.

use std::collections::HashSet;

use super::catalog::{Variant, cocktail_questions};
use super::question::{QuestionDefinition, QuestionKey};
use crate::error::DialogueError;
use crate::session::Session;

/// What follows an answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Next<'a> {
    /// Ask this question next.
    Ask(&'a QuestionDefinition),
    /// Every question has been answered.
    Complete,
}

/// Ordered, immutable question list plus the transitions between them.
#[derive(Debug, Clone)]
pub struct QuestionSequencer {
    questions: Vec<QuestionDefinition>,
}

impl QuestionSequencer {
    /// Build a sequencer, rejecting empty lists, duplicate keys, and
    /// questions without choices.
    pub fn new(questions: Vec<QuestionDefinition>) -> Result<Self, DialogueError> {
        if questions.is_empty() {
            return Err(DialogueError::EmptyQuestionnaire);
        }

        let mut seen = HashSet::new();
        for q in &questions {
            if !seen.insert(q.key) {
                return Err(DialogueError::DuplicateQuestion {
                    key: q.key.to_string(),
                });
            }
            if q.choices.is_empty() {
                return Err(DialogueError::NoChoices {
                    key: q.key.to_string(),
                });
            }
        }

        Ok(Self { questions })
    }

    /// The built-in cocktail questionnaire.
    pub fn cocktail(variant: Variant) -> Self {
        Self {
            questions: cocktail_questions(variant),
        }
    }

    pub fn first(&self) -> &QuestionDefinition {
        &self.questions[0]
    }

    pub fn question(&self, key: QuestionKey) -> Option<&QuestionDefinition> {
        self.questions.iter().find(|q| q.key == key)
    }

    pub fn keys(&self) -> impl Iterator<Item = QuestionKey> + '_ {
        self.questions.iter().map(|q| q.key)
    }

    pub fn len(&self) -> usize {
        self.questions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }

    pub fn contains(&self, key: QuestionKey) -> bool {
        self.position(key).is_some()
    }

    pub fn position(&self, key: QuestionKey) -> Option<usize> {
        self.questions.iter().position(|q| q.key == key)
    }

    pub fn is_last(&self, key: QuestionKey) -> bool {
        self.questions.last().map(|q| q.key) == Some(key)
    }

    /// Transition after `just_answered`. `None` if the key is not part of
    /// this questionnaire.
    pub fn next_question(&self, just_answered: QuestionKey) -> Option<Next<'_>> {
        let pos = self.position(just_answered)?;
        Some(match self.questions.get(pos + 1) {
            Some(q) => Next::Ask(q),
            None => Next::Complete,
        })
    }

    /// The first unanswered question of a session, in asking order.
    pub fn expected(&self, session: &Session) -> Next<'_> {
        self.questions
            .iter()
            .find(|q| !session.is_answered(q.key))
            .map(Next::Ask)
            .unwrap_or(Next::Complete)
    }

    /// Answers belonging to this questionnaire, in asking order.
    pub fn ordered_answers(&self, session: &Session) -> Vec<(QuestionKey, String)> {
        self.questions
            .iter()
            .filter_map(|q| session.answer(q.key).map(|v| (q.key, v.to_string())))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::questionnaire::Choice;

    fn keys_of(next: Next<'_>) -> Option<QuestionKey> {
        match next {
            Next::Ask(q) => Some(q.key),
            Next::Complete => None,
        }
    }

    #[test]
    fn five_question_transitions() {
        let seq = QuestionSequencer::cocktail(Variant::Five);
        use QuestionKey::*;
        let expected = [
            (Drink, Some(Mood)),
            (Mood, Some(Taste)),
            (Taste, Some(Occasion)),
            (Occasion, Some(Weather)),
            (Weather, None),
        ];
        for (answered, next) in expected {
            let got = seq.next_question(answered).map(keys_of);
            assert_eq!(got, Some(next), "after {answered}");
        }
    }

    #[test]
    fn three_question_variant_completes_after_taste() {
        let seq = QuestionSequencer::cocktail(Variant::Three);
        assert_eq!(seq.next_question(QuestionKey::Taste), Some(Next::Complete));
        assert!(seq.is_last(QuestionKey::Taste));
        assert_eq!(seq.next_question(QuestionKey::Occasion), None);
        assert!(!seq.contains(QuestionKey::Weather));
    }

    #[test]
    fn expected_walks_unanswered_in_order() {
        let seq = QuestionSequencer::cocktail(Variant::Four);
        let mut session = Session::new("u1");
        assert_eq!(keys_of(seq.expected(&session)), Some(QuestionKey::Drink));

        session.set_answer(QuestionKey::Drink, "伏特加");
        session.set_answer(QuestionKey::Taste, "苦");
        assert_eq!(keys_of(seq.expected(&session)), Some(QuestionKey::Mood));

        session.set_answer(QuestionKey::Mood, "平靜");
        session.set_answer(QuestionKey::Occasion, "工作");
        assert_eq!(seq.expected(&session), Next::Complete);
    }

    #[test]
    fn ordered_answers_ignore_foreign_keys() {
        let seq = QuestionSequencer::cocktail(Variant::Three);
        let mut session = Session::new("u1");
        session.set_answer(QuestionKey::Weather, "雨天");
        session.set_answer(QuestionKey::Taste, "甜");
        session.set_answer(QuestionKey::Drink, "威士忌");

        assert_eq!(
            seq.ordered_answers(&session),
            vec![
                (QuestionKey::Drink, "威士忌".to_string()),
                (QuestionKey::Taste, "甜".to_string()),
            ]
        );
    }

    #[test]
    fn new_validates_question_list() {
        assert!(matches!(
            QuestionSequencer::new(vec![]),
            Err(DialogueError::EmptyQuestionnaire)
        ));

        let q = QuestionDefinition::new(QuestionKey::Mood, "t", "b", "a")
            .with_choice(Choice::same("開心"));
        assert!(matches!(
            QuestionSequencer::new(vec![q.clone(), q.clone()]),
            Err(DialogueError::DuplicateQuestion { .. })
        ));

        let bare = QuestionDefinition::new(QuestionKey::Drink, "t", "b", "a");
        assert!(matches!(
            QuestionSequencer::new(vec![bare]),
            Err(DialogueError::NoChoices { .. })
        ));

        let seq = QuestionSequencer::new(vec![q]).unwrap();
        assert_eq!(seq.first().key, QuestionKey::Mood);
        assert!(seq.is_last(QuestionKey::Mood));
    }
}
