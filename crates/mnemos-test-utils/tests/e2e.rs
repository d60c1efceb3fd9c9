// SPDX-FileCopyrightText: 2026 Mnemos Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! End-to-end conversations over a real store and a scripted assistant.

use std::sync::Arc;

use async_trait::async_trait;
use mnemos_context::Consolidator;
use mnemos_core::{MnemosError, Role};
use mnemos_agent::Conversation;
use mnemos_test_utils::TestHarness;
use serde_json::json;
use tokio::sync::Mutex;

#[tokio::test]
async fn window_of_three_after_seven_turns() {
    let harness = TestHarness::builder().with_retain_pairs(3).build().unwrap();
    let mut convo = harness.conversation("alice").unwrap();

    for i in 0..7 {
        convo.chat(&format!("message {i}")).await.unwrap();
    }

    assert_eq!(convo.info().exchange_count, 3);
    let held: Vec<&str> = convo.mappings().iter().map(|m| m.user_text.as_str()).collect();
    assert_eq!(held, vec!["message 4", "message 5", "message 6"]);

    // Seven chat calls, then one consolidation call per evicted turn.
    let prompts = harness.assistant.user_prompts().await;
    assert_eq!(prompts.len(), 11);
    assert_eq!(
        &prompts[7..],
        &["message 0", "message 1", "message 2", "message 3"]
    );
}

#[tokio::test]
async fn consolidation_requests_carry_no_window_history() {
    let harness = TestHarness::builder().with_retain_pairs(1).build().unwrap();
    let mut convo = harness.conversation("bo").unwrap();
    for i in 0..3 {
        convo.chat(&format!("m{i}")).await.unwrap();
    }

    let requests = harness.assistant.requests().await;
    // Chat 3 pushes the window past 2 pairs: m0 and m1 are consolidated.
    assert_eq!(requests.len(), 5);
    for consolidation in &requests[3..] {
        let roles: Vec<Role> = consolidation.messages.iter().map(|m| m.role).collect();
        assert_eq!(roles, vec![Role::System, Role::User]);
    }
    // The third chat call saw both earlier exchanges.
    assert_eq!(requests[2].messages.len(), 6);
}

#[tokio::test]
async fn consolidation_failure_neither_raises_nor_blocks_trimming() {
    let harness = TestHarness::builder().with_retain_pairs(3).build().unwrap();
    for i in 0..7 {
        harness.assistant.push_reply(format!("reply {i}")).await;
    }
    harness.assistant.push_reply("stored").await;
    harness.assistant.push_failure("provider down").await;

    let mut convo = harness.conversation("carl").unwrap();
    let mut last = String::new();
    for i in 0..7 {
        last = convo.chat(&format!("message {i}")).await.unwrap();
    }

    assert_eq!(last, "reply 6");
    assert_eq!(convo.info().exchange_count, 3);
    // The failed second item did not stop the third and fourth.
    assert_eq!(harness.assistant.request_count().await, 11);
}

/// Fails every call and records what it was asked to consolidate.
#[derive(Default)]
struct BrokenStore {
    seen: Mutex<Vec<String>>,
}

#[async_trait]
impl Consolidator for BrokenStore {
    async fn consolidate(&self, _user_id: &str, user_text: &str) -> Result<(), MnemosError> {
        self.seen.lock().await.push(user_text.to_string());
        Err(MnemosError::storage(std::io::Error::other("read-only filesystem")))
    }
}

#[tokio::test]
async fn every_evicted_turn_is_attempted_even_when_all_fail() {
    let harness = TestHarness::new().unwrap();
    let broken = Arc::new(BrokenStore::default());
    let mut convo = Conversation::with_consolidator(
        Arc::clone(&harness.agent),
        broken.clone(),
        "dina",
        &harness.config.window,
    )
    .unwrap();

    for i in 0..7 {
        convo.chat(&format!("t{i}")).await.unwrap();
    }
    assert_eq!(*broken.seen.lock().await, vec!["t0", "t1", "t2", "t3"]);
    assert_eq!(convo.history().len(), 6);
}

#[tokio::test]
async fn disabled_consolidation_drops_evicted_turns() {
    let harness = TestHarness::builder()
        .with_retain_pairs(2)
        .with_consolidation(false)
        .build()
        .unwrap();
    let mut convo = harness.conversation("eli").unwrap();
    assert!(!convo.consolidation_enabled());

    for i in 0..5 {
        convo.chat(&format!("x{i}")).await.unwrap();
    }
    assert_eq!(convo.info().exchange_count, 2);
    assert_eq!(harness.assistant.request_count().await, 5);

    convo.set_consolidation(true);
    assert!(convo.info().consolidation_enabled);
}

#[tokio::test]
async fn shrinking_history_consolidates_immediately() {
    let harness = TestHarness::new().unwrap();
    let mut convo = harness.conversation("fay").unwrap();
    for i in 0..5 {
        convo.chat(&format!("h{i}")).await.unwrap();
    }
    assert_eq!(harness.assistant.request_count().await, 5);

    convo.set_history_length(2).await.unwrap();
    assert_eq!(convo.info().exchange_count, 2);
    assert_eq!(convo.info().threshold, 4);
    let prompts = harness.assistant.user_prompts().await;
    assert_eq!(&prompts[5..], &["h0", "h1", "h2"]);

    assert!(convo.set_history_length(0).await.is_err());
}

#[tokio::test]
async fn failed_reply_leaves_window_untouched() {
    let harness = TestHarness::new().unwrap();
    harness.assistant.push_failure("rate limited").await;

    let mut convo = harness.conversation("gil").unwrap();
    let err = convo.chat("hello").await.unwrap_err();
    assert!(matches!(err, MnemosError::Provider { .. }));
    assert!(convo.history().is_empty());
}

#[tokio::test]
async fn retrieved_memories_ground_the_system_prompt() {
    let harness = TestHarness::new().unwrap();
    harness
        .seed("hal", &["my dog is named rex", "the car is blue"])
        .await
        .unwrap();

    let mut convo = harness.conversation("hal").unwrap();
    convo.chat("what is my dog named").await.unwrap();

    let request = &harness.assistant.requests().await[0];
    let system = &request.messages[0];
    assert_eq!(system.role, Role::System);
    assert!(system.content.contains("## Relevant Memories"));
    assert!(system.content.contains("[doc_0]"));
    assert!(system.content.contains("- Documents: 2"));
    assert_eq!(request.tools.len(), 11);

    let mapping = &convo.mappings()[0];
    assert_eq!(mapping.retrieved[0].doc_id, "doc_0");
}

#[tokio::test]
async fn assistant_tool_calls_mutate_the_store() {
    let harness = TestHarness::new().unwrap();
    harness
        .assistant
        .push_tool_call(
            "add_document",
            json!({ "user_id": "ivy", "document": "ivy prefers window seats" }),
        )
        .await;
    harness.assistant.push_reply("Noted.").await;

    let reply = harness
        .agent
        .respond("ivy", "I always pick window seats", &[])
        .await
        .unwrap();
    assert_eq!(reply.content, "Noted.");
    assert_eq!(reply.tool_calls, 1);
    assert_eq!(harness.document_ids("ivy").await.unwrap(), vec!["doc_0"]);

    let followup = &harness.assistant.requests().await[1];
    let tool_msg = followup.messages.last().unwrap();
    assert_eq!(tool_msg.role, Role::Tool);
    assert_eq!(tool_msg.tool_call_id.as_deref(), Some("call_0"));
    let envelope: serde_json::Value = serde_json::from_str(&tool_msg.content).unwrap();
    assert_eq!(envelope["success"], true);
    assert_eq!(envelope["data"]["doc_id"], "doc_0");
}

#[tokio::test]
async fn bad_tool_calls_come_back_as_failure_envelopes() {
    let harness = TestHarness::new().unwrap();
    harness
        .assistant
        .push_tool_call("drop_table", json!({}))
        .await;
    harness.assistant.push_reply("Sorry.").await;

    let reply = harness.agent.respond("jo", "do it", &[]).await.unwrap();
    assert_eq!(reply.content, "Sorry.");

    let followup = &harness.assistant.requests().await[1];
    let envelope: serde_json::Value =
        serde_json::from_str(&followup.messages.last().unwrap().content).unwrap();
    assert_eq!(envelope["success"], false);
    assert_eq!(envelope["error"], "unknown tool: drop_table");
}

#[tokio::test]
async fn tool_rounds_are_bounded() {
    let harness = TestHarness::builder().with_max_tool_rounds(2).build().unwrap();
    for _ in 0..2 {
        harness
            .assistant
            .push_tool_call("list_users", json!({}))
            .await;
    }
    harness
        .assistant
        .push_response(mnemos_core::AssistantResponse {
            content: "done".into(),
            tool_calls: vec![mnemos_core::ToolCall {
                id: "late".into(),
                name: "list_users".into(),
                arguments: "{}".into(),
            }],
        })
        .await;

    let reply = harness.agent.respond("kai", "loop forever", &[]).await.unwrap();
    assert_eq!(reply.content, "done");
    assert_eq!(reply.tool_calls, 2);

    let requests = harness.assistant.requests().await;
    assert_eq!(requests.len(), 3);
    assert_eq!(requests[1].tools.len(), 11);
    assert!(requests[2].tools.is_empty());
}

#[tokio::test]
async fn consolidation_can_store_evicted_facts() {
    let harness = TestHarness::builder().with_retain_pairs(1).build().unwrap();
    let mut convo = harness.conversation("lee").unwrap();

    convo.chat("my birthday is in june").await.unwrap();
    convo.chat("i live in oslo").await.unwrap();

    // Third chat evicts two turns; the first consolidation stores a fact.
    harness.assistant.push_reply("ok").await;
    harness
        .assistant
        .push_tool_call(
            "add_document",
            json!({ "user_id": "lee", "document": "birthday in june" }),
        )
        .await;
    harness.assistant.push_reply("saved").await;
    convo.chat("what's the weather").await.unwrap();

    let stats = convo.memory_stats().await.unwrap();
    assert_eq!(stats.document_count, 1);

    let handle = harness.factory.open("lee").await.unwrap();
    let hits = handle.lock().await.search("birthday", 1).await.unwrap();
    assert_eq!(hits[0].text, "birthday in june");
}

#[tokio::test]
async fn conversations_for_different_users_stay_apart() {
    let harness = TestHarness::new().unwrap();
    harness.seed("max", &["max likes chess"]).await.unwrap();
    harness.seed("nia", &["nia likes tennis"]).await.unwrap();

    let mut max = harness.conversation("max").unwrap();
    let mut nia = harness.conversation("nia").unwrap();
    max.chat("what do i like").await.unwrap();
    nia.chat("what do i like").await.unwrap();

    assert_eq!(max.mappings()[0].retrieved[0].text, "max likes chess");
    assert_eq!(nia.mappings()[0].retrieved[0].text, "nia likes tennis");
    assert_ne!(max.session_id(), nia.session_id());
}

#[tokio::test]
async fn clear_memory_empties_the_store_but_not_the_window() {
    let harness = TestHarness::new().unwrap();
    harness.seed("ola", &["a", "b", "c"]).await.unwrap();

    let mut convo = harness.conversation("ola").unwrap();
    convo.chat("hi").await.unwrap();
    assert_eq!(convo.clear_memory().await.unwrap(), 3);
    assert!(harness.document_ids("ola").await.unwrap().is_empty());
    assert_eq!(convo.history().len(), 2);

    convo.clear();
    assert!(convo.history().is_empty());
}

#[tokio::test]
async fn invalid_user_cannot_start_a_conversation() {
    let harness = TestHarness::new().unwrap();
    assert!(matches!(
        harness.conversation("../../etc").err().unwrap(),
        MnemosError::Validation(_)
    ));
}
