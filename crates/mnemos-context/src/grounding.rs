// SPDX-FileCopyrightText: 2026 Mnemos Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Renders retrieval results and store state into an assistant request.

use std::fmt::Write;

use mnemos_core::{ChatMessage, Turn};
use mnemos_memory::StoreStats;

use crate::window::DocRef;

/// What the assistant is told about the user's long-term memory this turn.
#[derive(Debug, Clone, PartialEq)]
pub struct GroundingContext {
    pub user_id: String,
    pub stats: Option<StoreStats>,
    pub memories: Vec<DocRef>,
}

/// Base instructions used when no system prompt is configured.
pub fn default_system_prompt(agent_name: &str) -> String {
    format!(
        "You are {agent_name}, an assistant with long-term memory. \
         Save durable facts the user shares with add_document, correct stale \
         ones with update_document, and remove what the user asks you to \
         forget with delete_document. Answer from the memories below when \
         they are relevant."
    )
}

/// Appends the store summary and the `## Relevant Memories` list to `base`.
pub fn render_system_prompt(base: &str, grounding: &GroundingContext) -> String {
    let mut prompt = base.trim_end().to_string();
    let user_id = &grounding.user_id;

    let _ = write!(
        prompt,
        "\n\nYou are talking with user `{user_id}`. Pass \"user_id\": \"{user_id}\" to every memory tool."
    );

    if let Some(stats) = &grounding.stats {
        let _ = write!(
            prompt,
            "\n\n## Memory Store\n- Documents: {}\n- Index: {} (dimension {})",
            stats.document_count, stats.variant, stats.dimension
        );
    }

    prompt.push_str("\n\n## Relevant Memories\n");
    if grounding.memories.is_empty() {
        prompt.push_str("- (none found)");
    } else {
        let lines: Vec<String> = grounding
            .memories
            .iter()
            .map(|m| format!("- [{}] (score {:.3}) {}", m.doc_id, m.score, m.text))
            .collect();
        prompt.push_str(&lines.join("\n"));
    }
    prompt
}

/// System message, the held window, then the new user message if any.
pub fn build_messages(system: String, history: &[Turn], user_text: &str) -> Vec<ChatMessage> {
    let mut messages = Vec::with_capacity(history.len() + 2);
    messages.push(ChatMessage::system(system));
    messages.extend(history.iter().map(ChatMessage::from));
    if !user_text.trim().is_empty() {
        messages.push(ChatMessage::user(user_text));
    }
    messages
}

#[cfg(test)]
mod tests {
    use super::*;
    use mnemos_core::{IndexVariant, Role};

    fn grounding(memories: Vec<DocRef>) -> GroundingContext {
        GroundingContext {
            user_id: "mia".into(),
            stats: Some(StoreStats {
                document_count: 2,
                variant: IndexVariant::Graph,
                dimension: 384,
                trained: true,
                document_ids: vec!["doc_0".into(), "doc_3".into()],
            }),
            memories,
        }
    }

    #[test]
    fn renders_memories_with_ids_and_scores() {
        let prompt = render_system_prompt(
            "Base.",
            &grounding(vec![DocRef {
                doc_id: "doc_3".into(),
                text: "allergic to peanuts".into(),
                score: 0.91234,
            }]),
        );
        assert!(prompt.starts_with("Base.\n\n"));
        assert!(prompt.contains("\"user_id\": \"mia\""));
        assert!(prompt.contains("- Documents: 2\n- Index: graph (dimension 384)"));
        assert!(prompt.ends_with("## Relevant Memories\n- [doc_3] (score 0.912) allergic to peanuts"));
    }

    #[test]
    fn empty_retrieval_still_has_the_section() {
        let mut ctx = grounding(Vec::new());
        ctx.stats = None;
        let prompt = render_system_prompt("Base.", &ctx);
        assert!(!prompt.contains("## Memory Store"));
        assert!(prompt.ends_with("## Relevant Memories\n- (none found)"));
    }

    #[test]
    fn messages_wrap_history() {
        let history = vec![Turn::user("hi"), Turn::assistant("hello")];
        let messages = build_messages("sys".into(), &history, "how are you");
        let roles: Vec<Role> = messages.iter().map(|m| m.role).collect();
        assert_eq!(roles, vec![Role::System, Role::User, Role::Assistant, Role::User]);
        assert_eq!(messages[3].content, "how are you");

        assert_eq!(build_messages("sys".into(), &[], "  ").len(), 1);
    }

    #[test]
    fn default_prompt_names_the_agent() {
        assert!(default_system_prompt("mnemos").starts_with("You are mnemos,"));
    }
}
