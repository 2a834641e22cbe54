// SPDX-FileCopyrightText: 2026 Bizchat Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Outbound sender persistence rules.

use bizchat_agent::Reply;
use bizchat_core::types::{ChannelType, SenderRole};
use bizchat_test_utils::TestHarness;
use tracing_test::traced_test;

const CUSTOMER: &str = "+919812345678";

#[tokio::test]
#[traced_test]
async fn send_without_conversation_is_delivered_but_not_persisted() {
    let harness = TestHarness::builder().build().await.unwrap();
    let result = harness
        .dispatcher
        .sender()
        .send(CUSTOMER, ChannelType::WhatsApp, &Reply::text("hello there"))
        .await;

    assert!(result.is_success());
    assert_eq!(harness.whatsapp.sent_texts().await, vec!["hello there"]);
    assert!(logs_contain("sent message has no active conversation, not persisted"));
}

#[tokio::test]
async fn send_into_active_conversation_is_persisted() {
    let harness = TestHarness::builder().build().await.unwrap();
    harness
        .send_text(ChannelType::Sms, CUSTOMER, "hi")
        .await
        .unwrap();
    let conversation = harness
        .storage
        .find_latest_active_conversation(CUSTOMER, ChannelType::Sms)
        .await
        .unwrap()
        .unwrap();
    let before = harness
        .storage
        .get_messages(&conversation.id, None)
        .await
        .unwrap()
        .len();

    harness
        .dispatcher
        .sender()
        .send(CUSTOMER, ChannelType::Sms, &Reply::text("follow-up"))
        .await;

    let messages = harness
        .storage
        .get_messages(&conversation.id, None)
        .await
        .unwrap();
    assert_eq!(messages.len(), before + 1);
    let last = messages.last().unwrap();
    assert_eq!(last.sender, SenderRole::Business);
    assert_eq!(last.content, "follow-up");
}
