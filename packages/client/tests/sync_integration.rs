//! End-to-end tests: `ChatSync` over HTTP against the in-memory server.

use std::{sync::Arc, time::Duration};

use streamchat_client::{
    ChatSync, HttpStreamApi, StreamId, SyncConfig, Viewer, cache::CacheEntry, view::MessageInput,
};
use streamchat_server::{
    infrastructure::repository::InMemoryStreamRepository,
    ui::Server,
    usecase::{GetStreamUseCase, SendMessageUseCase},
};
use streamchat_shared::dto::Stream;
use tokio::{net::TcpListener, sync::watch};

const WAIT_LIMIT: Duration = Duration::from_secs(5);

/// Start a server hosting stream 1 and return its base URL
async fn start_server() -> String {
    let repository = Arc::new(InMemoryStreamRepository::new(vec![Stream {
        id: 1,
        name: "A".to_string(),
        price: 100,
        description: "d".to_string(),
    }]));
    let server = Server::new(
        Arc::new(GetStreamUseCase::new(repository.clone())),
        Arc::new(SendMessageUseCase::new(repository)),
    );

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(server.serve(listener, std::future::pending()));

    format!("http://{addr}")
}

fn create_sync(base_url: &str, viewer: Option<Viewer>) -> ChatSync {
    let api = Arc::new(HttpStreamApi::new(base_url, viewer.as_ref()));
    let config = SyncConfig {
        poll_interval: Duration::from_millis(50),
    };
    ChatSync::new(api, viewer, Some(StreamId::new(1)), config)
}

/// Wait until the cache entry satisfies `predicate`
async fn wait_for_entry(
    rx: &mut watch::Receiver<CacheEntry>,
    predicate: impl FnMut(&CacheEntry) -> bool,
) -> CacheEntry {
    tokio::time::timeout(WAIT_LIMIT, rx.wait_for(predicate))
        .await
        .expect("cache did not reach the expected state")
        .expect("cache closed")
        .clone()
}

#[tokio::test]
async fn test_sent_message_is_shown_then_confirmed_by_poll() {
    // テスト項目: 送信したメッセージが即座に表示され、ポーリング後にサーバー採番の ID で確定する
    // given (前提条件):
    let base_url = start_server().await;
    let sync = create_sync(&base_url, Some(Viewer::new(5, Some("cat.png".to_string()))));
    let mut rx = sync.subscribe();
    wait_for_entry(&mut rx, |entry| entry.value.is_some()).await;

    // when (操作):
    let mut input = MessageInput::new();
    input.set("yo");
    let provisional = sync.submit(&mut input).unwrap();

    // then (期待する結果):
    assert!(input.is_empty());
    let row = sync.view().message_rows().last().cloned().unwrap();
    assert_eq!(row.text, "yo");
    assert!(row.reversed);

    sync.wait_for_writes().await;
    let state = sync.dispatch_state();
    assert_eq!(state.sent, 1);
    assert_eq!(state.last_error, None);

    let token = provisional.client_token.clone();
    let entry = wait_for_entry(&mut rx, |entry| {
        entry.value.as_ref().is_some_and(|snapshot| {
            snapshot
                .messages
                .iter()
                .any(|m| m.client_token == token && m.id != provisional.id)
        })
    })
    .await;
    let messages = entry.value.unwrap().messages;
    assert_eq!(messages.len(), 1);
    assert_eq!(messages[0].id, 1);
    assert_eq!(messages[0].message, "yo");
    assert_eq!(messages[0].user, provisional.user);
    assert!(sync.take_failed_writes().is_empty());
}

#[tokio::test]
async fn test_anonymous_message_disappears_after_poll() {
    // テスト項目: 未ログインで送信したメッセージは書き込みに失敗し、次のポーリングで消える
    // given (前提条件):
    let base_url = start_server().await;
    let sync = create_sync(&base_url, None);
    let mut rx = sync.subscribe();
    wait_for_entry(&mut rx, |entry| entry.value.is_some()).await;

    // when (操作):
    let mut input = MessageInput::new();
    input.set("hello");
    let provisional = sync.submit(&mut input).unwrap();

    // then (期待する結果):
    assert_eq!(provisional.user.id, 0);
    assert!(!sync.view().message_rows().last().unwrap().reversed);

    sync.wait_for_writes().await;
    let state = sync.dispatch_state();
    assert_eq!(state.failed, 1);
    assert!(state.last_error.is_some());
    assert_eq!(
        sync.take_failed_writes(),
        vec![provisional.client_token.clone().unwrap()]
    );

    let entry = wait_for_entry(&mut rx, |entry| {
        entry
            .value
            .as_ref()
            .is_some_and(|snapshot| snapshot.messages.is_empty())
    })
    .await;
    assert_eq!(entry.value.unwrap().stream.name, "A");
}

#[tokio::test]
async fn test_two_viewers_see_each_others_messages() {
    // テスト項目: 別の視聴者が送ったメッセージがポーリングで反映され、自分のものとは区別される
    // given (前提条件):
    let base_url = start_server().await;
    let alice = create_sync(&base_url, Some(Viewer::new(5, None)));
    let bob = create_sync(&base_url, Some(Viewer::new(6, None)));
    let mut bob_rx = bob.subscribe();

    // when (操作):
    let mut alice_rx = alice.subscribe();
    wait_for_entry(&mut alice_rx, |entry| entry.value.is_some()).await;
    let mut input = MessageInput::new();
    input.set("from alice");
    alice.submit(&mut input).unwrap();
    alice.wait_for_writes().await;

    // then (期待する結果):
    wait_for_entry(&mut bob_rx, |entry| {
        entry
            .value
            .as_ref()
            .is_some_and(|snapshot| snapshot.messages.len() == 1)
    })
    .await;
    let row = bob.view().message_rows().last().cloned().unwrap();
    assert_eq!(row.text, "from alice");
    assert!(!row.reversed);
}
