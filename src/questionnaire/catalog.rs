//! Built-in cocktail questionnaire content.

use super::question::{Choice, QuestionDefinition, QuestionKey};
use crate::error::DialogueError;

/// Which built-in questionnaire to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Variant {
    /// drink, mood, taste
    Three,
    /// drink, mood, taste, occasion
    Four,
    /// drink, mood, taste, occasion, weather
    #[default]
    Five,
}

impl Variant {
    pub fn from_len(len: usize) -> Result<Self, DialogueError> {
        match len {
            3 => Ok(Self::Three),
            4 => Ok(Self::Four),
            5 => Ok(Self::Five),
            other => Err(DialogueError::UnsupportedVariant(other)),
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Self::Three => 3,
            Self::Four => 4,
            Self::Five => 5,
        }
    }

    pub fn keys(&self) -> &'static [QuestionKey] {
        &QuestionKey::ALL[..self.len()]
    }
}

/// The question definition for a key, with the bar's wording and choices.
pub fn cocktail_question(key: QuestionKey) -> QuestionDefinition {
    match key {
        QuestionKey::Drink => {
            QuestionDefinition::new(key, "今天想喝什麼酒？", "選擇一種酒類", "選擇酒類")
                .with_choice(Choice::same("威士忌"))
                .with_choice(Choice::same("伏特加"))
                .with_choice(Choice::same("龍舌蘭"))
                .with_choice(Choice::same("蘭姆酒"))
        }
        QuestionKey::Mood => {
            QuestionDefinition::new(key, "今天心情如何？", "選擇你的心情", "選擇心情")
                .with_choice(Choice::same("開心"))
                .with_choice(Choice::same("放鬆"))
                .with_choice(Choice::same("平靜"))
                .with_choice(Choice::same("需要鼓勵"))
        }
        QuestionKey::Taste => {
            QuestionDefinition::new(key, "現在比較想吃什麼？", "選擇對應的口味", "選擇口味")
                .with_choice(Choice::new("檸檬（酸）", "酸"))
                .with_choice(Choice::new("糖果（甜）", "甜"))
                .with_choice(Choice::new("咖啡（苦）", "苦"))
                .with_choice(Choice::new("辣椒（辣）", "辣"))
        }
        QuestionKey::Occasion => {
            QuestionDefinition::new(key, "今天是什麼場合？", "選擇場合", "選擇場合")
                .with_choice(Choice::same("聚會"))
                .with_choice(Choice::same("約會"))
                .with_choice(Choice::same("放鬆"))
                .with_choice(Choice::same("工作"))
        }
        QuestionKey::Weather => {
            QuestionDefinition::new(key, "今天的天氣如何？", "選擇天氣狀況", "選擇天氣")
                .with_choice(Choice::same("晴天"))
                .with_choice(Choice::same("陰天"))
                .with_choice(Choice::same("雨天"))
                .with_choice(Choice::same("寒冷"))
        }
    }
}

/// All questions of a variant, in asking order.
pub fn cocktail_questions(variant: Variant) -> Vec<QuestionDefinition> {
    variant.keys().iter().copied().map(cocktail_question).collect()
}
