//! Prompt text for the bartender recommendation.

use crate::questionnaire::QuestionKey;

/// System message sent with every recommendation and chat request.
pub const BARTENDER_SYSTEM_PROMPT: &str = "You are a professional bartender.";

/// User-facing text when generation fails for any reason.
pub const FALLBACK_TEXT: &str = "抱歉，目前無法為您推薦調酒，請稍後再試！";

/// Build the recommendation prompt: one numbered line per answer, in the
/// order given, followed by the request for a cocktail name and reason.
pub fn recommendation_prompt(answers: &[(QuestionKey, String)]) -> String {
    let lines: String = answers
        .iter()
        .enumerate()
        .map(|(i, (key, value))| format!("{}. {}：{}\n", i + 1, key.prompt_label(), value))
        .collect();

    format!(
        "你是一名專業的調酒師。根據以下使用者提供的信息，推薦一款適合的調酒，並簡要說明原因：\n\
         {lines}\n\
         請提供調酒名稱和解釋原因。"
    )
}
