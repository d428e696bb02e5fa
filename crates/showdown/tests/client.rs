//! Integration tests for the client: receive routing, login, output, and
//! connection teardown.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use futures_util::future::BoxFuture;
use futures_util::{FutureExt, SinkExt, StreamExt};
use serde_json::{json, Value};
use showdown::prelude::*;
use showdown::session::{CredentialExchange, LoginRequest, ReplayStore, SessionError};
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::Message;

// =========================================================================
// Mock collaborators and hooks
// =========================================================================

/// Accepts (or rejects) every login and remembers the challenges it saw.
struct MockExchange {
    accept: bool,
    seen: Arc<Mutex<Vec<String>>>,
}

impl MockExchange {
    fn new(accept: bool) -> (Self, Arc<Mutex<Vec<String>>>) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        (
            Self {
                accept,
                seen: Arc::clone(&seen),
            },
            seen,
        )
    }
}

impl CredentialExchange for MockExchange {
    fn login<'a>(
        &'a self,
        request: &'a LoginRequest,
    ) -> BoxFuture<'a, Result<LoginResponse, SessionError>> {
        self.seen.lock().unwrap().push(request.challenge.combined());
        let raw = if self.accept {
            json!({"actionsuccess": true, "assertion": "signed-proof"})
        } else {
            json!({"actionsuccess": false, "assertion": ";;Invalid password"})
        };
        async move { Ok(LoginResponse::from_value(raw)) }.boxed()
    }
}

struct ChannelReplayStore(mpsc::UnboundedSender<Value>);

impl ReplayStore for ChannelReplayStore {
    fn save(&self, replay: Value) -> BoxFuture<'_, Result<(), SessionError>> {
        let _ = self.0.send(replay);
        async { Ok(()) }.boxed()
    }
}

/// Records every hook call as a short string.
#[derive(Default)]
struct Recorder {
    calls: Vec<String>,
    chats: Vec<ChatMessage>,
    pms: Vec<PrivateMessage>,
    queries: Vec<QueryResponse>,
    init_rooms: Vec<Room>,
    deinit_rooms: Vec<Room>,
    logged_in_during_hook: bool,
    fail_on_chat: bool,
}

impl Hooks for Recorder {
    async fn on_connect(&mut self, _client: &Client) -> Result<(), ShowdownError> {
        self.calls.push("connect".into());
        Ok(())
    }

    async fn on_login(
        &mut self,
        client: &Client,
        response: &LoginResponse,
    ) -> Result<(), ShowdownError> {
        self.calls.push("login".into());
        assert!(response.success);
        self.logged_in_during_hook = client.is_logged_in().await;
        Ok(())
    }

    async fn on_room_init(&mut self, _client: &Client, room: &Room) -> Result<(), ShowdownError> {
        self.calls.push(format!("init:{}", room.id()));
        self.init_rooms.push(room.clone());
        Ok(())
    }

    async fn on_room_deinit(&mut self, _client: &Client, room: &Room) -> Result<(), ShowdownError> {
        self.calls.push(format!("deinit:{}", room.id()));
        self.deinit_rooms.push(room.clone());
        Ok(())
    }

    async fn on_query_response(
        &mut self,
        _client: &Client,
        response: &QueryResponse,
    ) -> Result<(), ShowdownError> {
        self.calls.push(format!("query:{}", response.kind));
        self.queries.push(response.clone());
        Ok(())
    }

    async fn on_chat_message(
        &mut self,
        client: &Client,
        message: &ChatMessage,
    ) -> Result<(), ShowdownError> {
        self.calls.push(format!("chat:{}", message.room_id));
        self.chats.push(message.clone());
        if self.fail_on_chat {
            return Err(ShowdownError::hook("chat hook failed"));
        }
        if message.content == "!ping" {
            client.say(&message.room_id, "pong", false)?;
        }
        Ok(())
    }

    async fn on_private_message(
        &mut self,
        _client: &Client,
        message: &PrivateMessage,
    ) -> Result<(), ShowdownError> {
        self.calls.push("pm".into());
        self.pms.push(message.clone());
        Ok(())
    }

    async fn on_receive(
        &mut self,
        _client: &Client,
        room_id: &str,
        event: &Event,
    ) -> Result<(), ShowdownError> {
        self.calls.push(format!("recv:{room_id}:{}", event.kind));
        Ok(())
    }
}

// =========================================================================
// Helpers
// =========================================================================

fn builder() -> ClientBuilder {
    Client::builder()
        .autologin(false)
        .per_command_delay(Duration::ZERO)
        .address(ServerAddress::new("localhost", 8000, "/showdown/websocket"))
        .no_replay_store()
}

async fn anonymous_client() -> Client {
    builder().build().await.unwrap()
}

/// Frame with one block per `(room, lines)` pair.
fn frame(blocks: &[(&str, &[&str])]) -> String {
    let blocks: Vec<String> = blocks
        .iter()
        .map(|(room, lines)| format!(">{room}\n{}", lines.join("\n")))
        .collect();
    format!("a{}", serde_json::to_string(&blocks).unwrap())
}

async fn expect_output(server: &MemoryConnection) -> Vec<String> {
    let raw = tokio::time::timeout(Duration::from_secs(5), server.recv())
        .await
        .expect("timed out waiting for output")
        .unwrap()
        .expect("client closed the connection");
    serde_json::from_str(&raw).unwrap()
}

// =========================================================================
// Room routing
// =========================================================================

#[tokio::test]
async fn test_room_lifecycle_and_hook_order() {
    let client = anonymous_client().await;
    let (conn, server) = MemoryConnection::pair();

    let script = tokio::spawn(async move {
        server.send("o").await.unwrap();
        server
            .send(&frame(&[(
                "techcode",
                &["|init|chat", "|title|Tech & Code", "|users|3,*Ash,+Misty,Brock"],
            )]))
            .await
            .unwrap();
        server
            .send(&frame(&[("techcode", &["|j|Gary", "|l|Brock", "|c|+Misty|hi all"])]))
            .await
            .unwrap();
        server.close().await.unwrap();
        server
    });

    let mut hooks = Recorder::default();
    client.run_on(conn, &mut hooks).await.unwrap();
    let _server = script.await.unwrap();

    assert_eq!(
        hooks.calls,
        vec![
            "connect",
            "init:techcode",
            "recv:techcode:init",
            "recv:techcode:title",
            "recv:techcode:users",
            "recv:techcode:j",
            "recv:techcode:l",
            "chat:techcode",
            "recv:techcode:c",
        ]
    );

    let room = client.room("techcode").await.unwrap();
    assert_eq!(room.title(), Some("Tech & Code"));
    let mut ids: Vec<&str> = room.users().keys().map(String::as_str).collect();
    ids.sort();
    assert_eq!(ids, vec!["ash", "gary", "misty"]);
    assert_eq!(room.logs().count(), 6);

    assert_eq!(hooks.chats[0].author.id(), "misty");
    assert_eq!(hooks.chats[0].content, "hi all");
}

#[tokio::test]
async fn test_deinit_hands_over_final_room_state() {
    let client = anonymous_client().await;
    let (conn, server) = MemoryConnection::pair();

    let script = tokio::spawn(async move {
        server
            .send(&frame(&[(
                "battle-gen9ou-7",
                &[
                    "|init|battle",
                    "|player|p1|Ash|1",
                    "|player|p2|Gary|2",
                    "|tier|[Gen 9] OU",
                    "|rated",
                    "|win|Gary",
                ],
            )]))
            .await
            .unwrap();
        server
            .send(&frame(&[("battle-gen9ou-7", &["|deinit"])]))
            .await
            .unwrap();
        server.close().await.unwrap();
        server
    });

    let mut hooks = Recorder::default();
    client.run_on(conn, &mut hooks).await.unwrap();
    let _server = script.await.unwrap();

    assert!(client.room("battle-gen9ou-7").await.is_none());
    assert!(client.room_ids().await.is_empty());

    let room = &hooks.deinit_rooms[0];
    let battle = room.battle_state().unwrap();
    assert!(battle.rated());
    assert_eq!(battle.tier(), Some("gen9ou"));
    assert!(battle.ended());
    assert_eq!(battle.winner().unwrap().id(), "gary");
    assert_eq!(battle.loser().unwrap().id(), "ash");

    // The init snapshot predates the rest of the block.
    assert!(hooks.init_rooms[0].battle_state().unwrap().player(PlayerSlot::First).is_none());
}

#[tokio::test]
async fn test_rooms_survive_disconnect_until_next_connection() {
    let client = anonymous_client().await;

    let (conn, server) = MemoryConnection::pair();
    let script = tokio::spawn(async move {
        server.send(&frame(&[("techcode", &["|init|chat"])])).await.unwrap();
        server.close().await.unwrap();
        server
    });
    client.run_on(conn, &mut ()).await.unwrap();
    let _server = script.await.unwrap();
    assert_eq!(client.room_ids().await, vec!["techcode"]);

    let (conn, server) = MemoryConnection::pair();
    server.close().await.unwrap();
    client.run_on(conn, &mut ()).await.unwrap();
    assert!(client.room_ids().await.is_empty());
}

#[tokio::test]
async fn test_events_for_unknown_rooms_reach_hooks_only() {
    let client = anonymous_client().await;
    let (conn, server) = MemoryConnection::pair();

    let script = tokio::spawn(async move {
        server.send(r#"a["|pm| Misty|~Ash|got a minute?"]"#).await.unwrap();
        server.send(&frame(&[("nowhere", &["|j|Brock"])])).await.unwrap();
        server.close().await.unwrap();
        server
    });

    let mut hooks = Recorder::default();
    client.run_on(conn, &mut hooks).await.unwrap();
    let _server = script.await.unwrap();

    assert_eq!(hooks.calls, vec!["pm", "recv:lobby:pm", "recv:nowhere:j"]);
    assert_eq!(hooks.pms[0].author.id(), "misty");
    assert_eq!(hooks.pms[0].content, "got a minute?");
    assert!(client.room_ids().await.is_empty());
}

// =========================================================================
// Queries and replays
// =========================================================================

#[tokio::test]
async fn test_savereplay_response_goes_to_replay_store() {
    let (tx, mut rx) = mpsc::unbounded_channel();
    let client = builder()
        .replay_store(ChannelReplayStore(tx))
        .build()
        .await
        .unwrap();
    let (conn, server) = MemoryConnection::pair();

    let script = tokio::spawn(async move {
        server
            .send(r#"a["|queryresponse|savereplay|{\"id\":\"gen9ou-7\",\"log\":\"|win|Gary\"}"]"#)
            .await
            .unwrap();
        server
            .send(r#"a["|queryresponse|rooms|{\"official\":[]}"]"#)
            .await
            .unwrap();
        server.close().await.unwrap();
        server
    });

    let mut hooks = Recorder::default();
    client.run_on(conn, &mut hooks).await.unwrap();
    let _server = script.await.unwrap();

    let replay = tokio::time::timeout(Duration::from_secs(5), rx.recv())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(replay["id"], json!("gen9ou-7"));
    assert_eq!(replay["log"], json!("|win|Gary"));
    assert!(rx.try_recv().is_err());

    assert_eq!(hooks.queries.len(), 2);
    assert_eq!(hooks.queries[1].kind, "rooms");
}

#[tokio::test]
async fn test_undecodable_query_response_ends_connection() {
    let client = anonymous_client().await;
    let (conn, server) = MemoryConnection::pair();

    let script = tokio::spawn(async move {
        server.send(r#"a["|queryresponse|rooms|{oops"]"#).await.unwrap();
        server
    });

    let mut hooks = Recorder::default();
    let err = client.run_on(conn, &mut hooks).await.unwrap_err();
    let _server = script.await.unwrap();
    assert!(matches!(err, ShowdownError::Protocol(_)));
}

// =========================================================================
// Login
// =========================================================================

#[tokio::test]
async fn test_autologin_sends_identity_command() {
    let (exchange, seen) = MockExchange::new(true);
    let client = builder()
        .name("Ash")
        .password("pikachu")
        .autologin(true)
        .credential_exchange(exchange)
        .build()
        .await
        .unwrap();
    let (conn, server) = MemoryConnection::pair();

    let script = tokio::spawn(async move {
        server.send("o").await.unwrap();
        server.send(r#"a["|challstr|4|abcdef"]"#).await.unwrap();
        let identity = expect_output(&server).await;
        server.close().await.unwrap();
        (server, identity)
    });

    let mut hooks = Recorder::default();
    client.run_on(conn, &mut hooks).await.unwrap();
    let (_server, identity) = script.await.unwrap();

    assert_eq!(identity, vec!["|/trn Ash,0,signed-proof"]);
    assert_eq!(seen.lock().unwrap().as_slice(), ["4|abcdef"]);
    assert_eq!(hooks.calls[..3], ["connect", "login", "recv:lobby:challstr"]);
    assert!(hooks.logged_in_during_hook);
    assert_eq!(client.auth_state().await, AuthState::Disconnected);
}

#[tokio::test]
async fn test_rejected_login_ends_connection_with_raw_response() {
    let (exchange, _seen) = MockExchange::new(false);
    let client = builder()
        .name("Ash")
        .password("wrong")
        .autologin(true)
        .credential_exchange(exchange)
        .build()
        .await
        .unwrap();
    let (conn, server) = MemoryConnection::pair();

    let script = tokio::spawn(async move {
        server.send(r#"a["|challstr|4|abcdef"]"#).await.unwrap();
        server
    });

    let mut hooks = Recorder::default();
    let err = client.run_on(conn, &mut hooks).await.unwrap_err();
    let _server = script.await.unwrap();

    match err {
        ShowdownError::Session(SessionError::LoginRejected { name, raw }) => {
            assert_eq!(name, "Ash");
            assert!(raw.contains("Invalid password"));
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert!(!hooks.calls.contains(&"login".to_string()));
}

#[tokio::test]
async fn test_challenge_without_autologin_waits_for_manual_login() {
    let (exchange, _seen) = MockExchange::new(true);
    let client = builder()
        .name("Ash")
        .password("pikachu")
        .credential_exchange(exchange)
        .build()
        .await
        .unwrap();
    let (conn, server) = MemoryConnection::pair();

    let observer = client.clone();
    let script = tokio::spawn(async move {
        server.send(r#"a["|challstr|4|abcdef"]"#).await.unwrap();
        // Give the receive loop a chance to record the challenge.
        while observer.challenge().await.is_none() {
            tokio::task::yield_now().await;
        }
        assert_eq!(observer.auth_state().await, AuthState::Challenged);
        observer.login().await.unwrap();
        let identity = expect_output(&server).await;
        server.close().await.unwrap();
        (server, identity)
    });

    let mut hooks = Recorder::default();
    client.run_on(conn, &mut hooks).await.unwrap();
    let (_server, identity) = script.await.unwrap();

    assert_eq!(identity, vec!["|/trn Ash,0,signed-proof"]);
    assert!(!hooks.calls.contains(&"login".to_string()));
}

// =========================================================================
// Output and teardown
// =========================================================================

#[tokio::test]
async fn test_queued_commands_go_out_in_order() {
    let client = anonymous_client().await;
    client.join("techcode");
    client.search_battles(None, "gen9randombattle");
    client.private_message("Misty", "gg", false).unwrap();

    let (conn, server) = MemoryConnection::pair();
    let script = tokio::spawn(async move {
        let mut frames = Vec::new();
        for _ in 0..3 {
            frames.push(expect_output(&server).await);
        }
        server.close().await.unwrap();
        (server, frames)
    });

    client.run_on(conn, &mut ()).await.unwrap();
    let (_server, frames) = script.await.unwrap();

    assert_eq!(
        frames,
        vec![
            vec!["|/join techcode".to_string()],
            vec!["|/utm null".to_string(), "|/search gen9randombattle".to_string()],
            vec!["|/msg misty, gg".to_string()],
        ]
    );
}

#[tokio::test]
async fn test_hook_can_reply_through_client() {
    let client = anonymous_client().await;
    let (conn, server) = MemoryConnection::pair();

    let script = tokio::spawn(async move {
        server.send(&frame(&[("techcode", &["|c:|1700000000|Misty|!ping"])])).await.unwrap();
        let reply = expect_output(&server).await;
        server.close().await.unwrap();
        (server, reply)
    });

    let mut hooks = Recorder::default();
    client.run_on(conn, &mut hooks).await.unwrap();
    let (_server, reply) = script.await.unwrap();

    assert_eq!(reply, vec!["techcode|pong"]);
    assert_eq!(hooks.chats[0].timestamp, Some(1_700_000_000));
}

#[tokio::test]
async fn test_malformed_frame_tears_connection_down() {
    let client = anonymous_client().await;
    let (conn, server) = MemoryConnection::pair();

    let script = tokio::spawn(async move {
        server.send("h").await.unwrap();
        // The client closes its end once the group is torn down.
        let after = server.recv().await.unwrap();
        (server, after)
    });

    let err = client.run_on(conn, &mut ()).await.unwrap_err();
    let (_server, after) = script.await.unwrap();

    assert!(matches!(err, ShowdownError::Protocol(_)));
    assert!(after.is_none());
}

#[tokio::test]
async fn test_hook_error_ends_connection() {
    let client = anonymous_client().await;
    let (conn, server) = MemoryConnection::pair();

    let script = tokio::spawn(async move {
        server.send(&frame(&[("lobby", &["|c|Misty|hello"])])).await.unwrap();
        server
    });

    let mut hooks = Recorder {
        fail_on_chat: true,
        ..Recorder::default()
    };
    let err = client.run_on(conn, &mut hooks).await.unwrap_err();
    let _server = script.await.unwrap();

    assert!(matches!(err, ShowdownError::Hook(_)));
    // The catch-all hook never saw the failing event.
    assert_eq!(hooks.calls, vec!["chat:lobby"]);
}

#[tokio::test(start_paused = true)]
async fn test_periodic_task_runs_while_connected() {
    let client = builder()
        .every("ladder", Duration::from_secs(3), |client| async move {
            client.query_battles("gen9ou", Some(1500));
            Ok(())
        })
        .build()
        .await
        .unwrap();
    let (conn, server) = MemoryConnection::pair();

    let script = tokio::spawn(async move {
        let start = tokio::time::Instant::now();
        let first = expect_output(&server).await;
        let second = expect_output(&server).await;
        let elapsed = start.elapsed();
        server.close().await.unwrap();
        (server, first, second, elapsed)
    });

    client.run_on(conn, &mut ()).await.unwrap();
    let (_server, first, second, elapsed) = script.await.unwrap();

    assert_eq!(first, vec!["|/cmd roomlist gen9ou, 1500"]);
    assert_eq!(second, first);
    assert!(elapsed >= Duration::from_secs(3));
}

#[tokio::test]
async fn test_failing_periodic_task_ends_connection() {
    let client = builder()
        .every("broken", Duration::from_millis(10), |_client| async move {
            Err(ShowdownError::hook("ladder unavailable"))
        })
        .build()
        .await
        .unwrap();
    let (conn, _server) = MemoryConnection::pair();

    let err = client.run_on(conn, &mut ()).await.unwrap_err();
    assert!(err.to_string().contains("ladder unavailable"));
}

// =========================================================================
// WebSocket end to end
// =========================================================================

#[tokio::test]
async fn test_websocket_session() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();

    let server = tokio::spawn(async move {
        let (stream, _) = listener.accept().await.unwrap();
        let mut ws = tokio_tungstenite::accept_async(stream).await.unwrap();
        ws.send(Message::text("o")).await.unwrap();
        ws.send(Message::text(r#"a[">lobby\n|init|chat\n|users|1,Ash"]"#))
            .await
            .unwrap();

        let reply = loop {
            match ws.next().await {
                Some(Ok(Message::Text(text))) => break text.as_str().to_owned(),
                Some(Ok(_)) => continue,
                other => panic!("unexpected websocket event: {other:?}"),
            }
        };
        ws.close(None).await.unwrap();
        reply
    });

    struct Greeter;

    impl Hooks for Greeter {
        async fn on_room_init(
            &mut self,
            client: &Client,
            room: &Room,
        ) -> Result<(), ShowdownError> {
            client.say(room.id(), "hello lobby", false)
        }
    }

    let client = Client::builder()
        .autologin(false)
        .per_command_delay(Duration::ZERO)
        .address(ServerAddress::new("127.0.0.1", port, "/showdown/websocket"))
        .no_replay_store()
        .build()
        .await
        .unwrap();

    client.run(&mut Greeter).await.unwrap();
    let reply = server.await.unwrap();
    assert_eq!(reply, r#"["|hello lobby"]"#);
}
