//! Prior-turn summary for the prompt.

use helios_core::{ConversationHistory, Role};

/// Format earlier exchanges as question/answer pairs.
///
/// `history` must already end with the current user turn. The greeting and
/// that current turn are excluded; nothing is produced until at least one
/// full exchange precedes the current question.
pub fn format_history(history: &ConversationHistory) -> Option<String> {
    let turns = history.turns();
    if turns.len() <= 2 {
        return None;
    }

    let prior = &turns[1..turns.len() - 1];
    let mut text = String::from("Chat History:\n");
    let mut pairs = 0usize;

    for exchange in prior.chunks_exact(2) {
        let (question, answer) = (&exchange[0], &exchange[1]);
        if question.role != Role::User || answer.role != Role::Assistant {
            continue;
        }
        text.push_str(&format!("Previous Question: {}\n", question.content));
        text.push_str(&format!("Respective Answer: {}\n\n", answer.content));
        pairs += 1;
    }

    (pairs > 0).then_some(text)
}
