//! Shared test utilities for learnstyle-server integration tests

use std::sync::Arc;

use axum_test::TestServer;
use learnstyle_core::{
    AssessmentEngine, DevTokenVerifier, DocumentSessionStore, DocumentStore, EngineConfig,
    MemoryDocumentStore, TokenVerifier,
};
use learnstyle_models::providers::{AssessmentProvider, StubProvider};
use learnstyle_server::{AppState, create_router};
use serde_json::{Value, json};

/// A router over in-memory storage with one student `s1` owned by `p1`
pub struct TestApp {
    pub server: TestServer,
    pub documents: Arc<MemoryDocumentStore>,
}

#[allow(dead_code)]
pub async fn spawn_app() -> TestApp {
    spawn_app_with(Arc::new(StubProvider::new()), Arc::new(DevTokenVerifier)).await
}

pub async fn spawn_app_with(
    provider: Arc<dyn AssessmentProvider>,
    verifier: Arc<dyn TokenVerifier>,
) -> TestApp {
    let documents = Arc::new(MemoryDocumentStore::new());
    documents
        .set_merge(
            "students",
            "s1",
            json!({"parentId": "p1", "name": "Ada"})
                .as_object()
                .cloned()
                .unwrap(),
        )
        .await
        .unwrap();

    let sessions = Arc::new(DocumentSessionStore::new(documents.clone()));
    let engine = AssessmentEngine::new(
        EngineConfig::default(),
        provider,
        documents.clone(),
        sessions,
    );
    let state = Arc::new(AppState::new(Arc::new(engine), verifier));
    let server = TestServer::new(create_router(state)).unwrap();

    TestApp { server, documents }
}

/// Four substantive, visual-leaning user turns
#[allow(dead_code)]
pub fn sensory_messages() -> Value {
    json!([
        {"role": "assistant", "content": "How do you like to learn?"},
        {"role": "user", "content": "I learn best from pictures"},
        {"role": "user", "content": "I love drawing"},
        {"role": "user", "content": "I watch videos when I study"},
        {"role": "user", "content": "diagrams help me the most"}
    ])
}

#[allow(dead_code)]
pub fn thin_messages() -> Value {
    json!([
        {"role": "user", "content": "maybe"},
        {"role": "assistant", "content": "Tell me more."},
        {"role": "user", "content": "I like diagrams and charts."}
    ])
}

#[allow(dead_code)]
pub fn body(messages: Value) -> Value {
    json!({"parentId": "p1", "studentId": "s1", "messages": messages})
}
