mod common;

use std::sync::Arc;

use common::{ agent_with, MockChatClient, Reply };
use doc_chat::agent::{ AgentOptions, ChatAgent };
use doc_chat::config::prompt::{ PromptOptions, FILE_READER_FALLBACK, TRUNCATION_MARKER };
use doc_chat::config::task::TaskType;
use doc_chat::error::ChatError;
use doc_chat::models::chat::{ ChatMessage, ChatRole };
use doc_chat::session::SessionState;

#[tokio::test]
async fn empty_input_is_rejected_without_a_request() {
    let client = MockChatClient::new(vec![]);
    let agent = agent_with(&client);
    let mut state = SessionState::new();

    for input in ["", "   ", "\n"] {
        let err = agent.submit(&mut state, input, |_| {}).await.unwrap_err();
        assert!(matches!(err, ChatError::Validation(_)));
    }

    assert!(state.history().is_empty());
    assert!(client.requests().is_empty());
}

#[tokio::test]
async fn missing_api_key_is_a_configuration_error() {
    let client = MockChatClient::new(vec![]).without_key();
    let agent = agent_with(&client);
    let mut state = SessionState::new();

    let err = agent.submit(&mut state, "Hi", |_| {}).await.unwrap_err();

    assert!(matches!(err, ChatError::Configuration(_)));
    assert!(state.history().is_empty());
    assert!(client.requests().is_empty());
}

#[tokio::test]
async fn successful_submit_appends_user_then_assistant() {
    let client = MockChatClient::new(vec![Reply::Fragments(vec!["Hel", "lo", " there"])]);
    let agent = agent_with(&client);
    let mut state = SessionState::new();

    let mut partials = Vec::new();
    let reply = agent
        .submit(&mut state, "Hi", |partial| partials.push(partial.to_string())).await
        .unwrap();

    assert_eq!(reply, "Hello there");
    assert_eq!(partials, vec!["Hel", "Hello", "Hello there"]);
    assert_eq!(state.history(), &[ChatMessage::user("Hi"), ChatMessage::assistant("Hello there")]);
}

#[tokio::test]
async fn truncated_file_and_default_prompt_shape_the_first_request() {
    let client = MockChatClient::new(vec![Reply::Fragments(vec!["Short summary"])]);
    let agent = agent_with(&client);
    let mut state = SessionState::new();

    let file: String = (0..6000).map(|i| char::from(b'a' + ((i % 26) as u8))).collect();
    state.set_file_context(file.clone());
    state.set_default_prompt("Be terse");

    agent.submit(&mut state, "Summarize", |_| {}).await.unwrap();

    let requests = client.requests();
    assert_eq!(requests.len(), 1);
    let messages = &requests[0].messages;
    assert_eq!(messages.len(), 2);
    assert_eq!(messages[0].role, ChatRole::System);
    assert!(messages[0].content.contains("Be terse"));
    let expected_context = format!("{}{}", &file[..5000], TRUNCATION_MARKER);
    assert!(messages[0].content.ends_with(&expected_context));
    assert!(!messages[0].content.contains(&file[..5001]));
    assert_eq!(messages[1], ChatMessage::user("Summarize"));
    assert!(requests[0].stream);
}

#[tokio::test]
async fn second_request_replays_history_in_order() {
    let client = MockChatClient::new(
        vec![Reply::Fragments(vec!["Hello!"]), Reply::Fragments(vec!["More."])]
    );
    let agent = agent_with(&client);
    let mut state = SessionState::new();

    agent.submit(&mut state, "Hi", |_| {}).await.unwrap();
    agent.submit(&mut state, "Continue", |_| {}).await.unwrap();

    let requests = client.requests();
    let second = &requests[1].messages;
    let roles: Vec<ChatRole> = second
        .iter()
        .map(|m| m.role)
        .collect();
    assert_eq!(
        roles,
        vec![ChatRole::System, ChatRole::User, ChatRole::Assistant, ChatRole::User]
    );
    assert_eq!(second[1].content, "Hi");
    assert_eq!(second[2].content, "Hello!");
    assert_eq!(second[3].content, "Continue");
    assert_eq!(requests[0].messages[0], second[0]);
    assert_eq!(state.history().len(), 4);
}

#[tokio::test]
async fn system_message_is_never_stored_in_history() {
    let client = MockChatClient::new(vec![Reply::Fragments(vec!["ok"])]);
    let agent = agent_with(&client);
    let mut state = SessionState::new();

    agent.submit(&mut state, "Hi", |_| {}).await.unwrap();

    assert!(state.history().iter().all(|m| m.role != ChatRole::System));
}

#[tokio::test]
async fn dispatch_failure_leaves_history_untouched() {
    let client = MockChatClient::new(vec![Reply::Reject("401 Unauthorized")]);
    let agent = agent_with(&client);
    let mut state = SessionState::new();

    let err = agent.submit(&mut state, "Hi", |_| {}).await.unwrap_err();

    assert_eq!(err, ChatError::Remote("401 Unauthorized".to_string()));
    assert!(state.history().is_empty());
}

#[tokio::test]
async fn mid_stream_failure_leaves_history_untouched() {
    let client = MockChatClient::new(
        vec![Reply::FailAfter(vec!["partial "], "connection reset"), Reply::Fragments(vec!["ok"])]
    );
    let agent = agent_with(&client);
    let mut state = SessionState::new();

    let mut partials = Vec::new();
    let err = agent
        .submit(&mut state, "Hi", |p| partials.push(p.to_string())).await
        .unwrap_err();

    assert!(matches!(err, ChatError::Remote(ref m) if m.contains("connection reset")));
    assert_eq!(partials, vec!["partial "]);
    assert!(state.history().is_empty());

    // the session keeps working after a failure
    let reply = agent.submit(&mut state, "Again", |_| {}).await.unwrap();
    assert_eq!(reply, "ok");
    assert_eq!(state.history().len(), 2);
}

#[tokio::test]
async fn pending_reply_can_be_finished_without_reading_partials() {
    let client = MockChatClient::new(vec![Reply::Fragments(vec!["a", "b", "c"])]);
    let agent = agent_with(&client);
    let mut state = SessionState::new();

    let mut pending = agent.begin(&state, "Hi").await.unwrap();
    assert_eq!(pending.next_partial().await.unwrap().unwrap(), "a");
    let reply = pending.finish(&mut state).await.unwrap();

    assert_eq!(reply, "abc");
    assert_eq!(state.history()[1].content, "abc");
}

#[tokio::test]
async fn dropped_pending_reply_records_nothing() {
    let client = MockChatClient::new(vec![Reply::Fragments(vec!["a", "b"])]);
    let agent = agent_with(&client);
    let state = SessionState::new();

    let mut pending = agent.begin(&state, "Hi").await.unwrap();
    pending.next_partial().await;
    assert_eq!(pending.reply_so_far(), "a");
    drop(pending);

    assert!(state.history().is_empty());
}

#[tokio::test]
async fn temperature_follows_selected_task() {
    let client = MockChatClient::new(
        vec![Reply::Fragments(vec!["x"]), Reply::Fragments(vec!["y"]), Reply::Fragments(vec!["z"])]
    );
    let agent = agent_with(&client);
    let mut state = SessionState::new();

    agent.submit(&mut state, "one", |_| {}).await.unwrap();
    state.select_task(TaskType::CodingMath);
    agent.submit(&mut state, "two", |_| {}).await.unwrap();
    state.select_task(TaskType::Creative);
    agent.submit(&mut state, "three", |_| {}).await.unwrap();

    let temps: Vec<Option<f32>> = client
        .requests()
        .iter()
        .map(|r| r.temperature)
        .collect();
    assert_eq!(temps, vec![None, Some(0.0), Some(1.5)]);
}

#[tokio::test]
async fn skip_toggle_drops_default_prompt_from_request() {
    let client = MockChatClient::new(vec![Reply::Fragments(vec!["x"])]);
    let agent = agent_with(&client);
    let mut state = SessionState::new();
    state.set_default_prompt("Always answer in French");
    state.set_skip_default_prompt(true);

    agent.submit(&mut state, "Hi", |_| {}).await.unwrap();

    let requests = client.requests();
    let system = &requests[0].messages[0].content;
    assert!(!system.contains("Always answer in French"));
    assert!(!system.contains("Default Prompt:"));
}

#[tokio::test]
async fn non_streaming_agent_uses_single_completion() {
    let client = MockChatClient::new(vec![Reply::Fragments(vec!["whole ", "answer"])]);
    let options = AgentOptions { stream: false, ..AgentOptions::default() };
    let agent = ChatAgent::new(Arc::new(client.clone()), options);
    let mut state = SessionState::new();

    let mut partials = Vec::new();
    let reply = agent
        .submit(&mut state, "Hi", |p| partials.push(p.to_string())).await
        .unwrap();

    assert_eq!(reply, "whole answer");
    assert_eq!(partials, vec!["whole answer"]);
    assert!(!client.requests()[0].stream);
}

#[tokio::test]
async fn file_reader_mode_reaches_the_system_message() {
    let client = MockChatClient::new(vec![Reply::Fragments(vec!["x"])]);
    let options = AgentOptions {
        prompt: PromptOptions { file_reader_mode: true, ..PromptOptions::default() },
        ..AgentOptions::default()
    };
    let agent = ChatAgent::new(Arc::new(client.clone()), options);
    let mut state = SessionState::new();
    state.set_file_context("The sky is green.");

    agent.submit(&mut state, "What colour is the sky?", |_| {}).await.unwrap();

    let requests = client.requests();
    let system = &requests[0].messages[0].content;
    assert!(system.contains(FILE_READER_FALLBACK));
    assert!(system.contains("File Context:\nThe sky is green."));
}
