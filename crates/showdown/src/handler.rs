//! Receive loop: decodes frames and routes every event.
//!
//! Per event the order is fixed:
//!   1. Parse the line
//!   2. Update room state (create on `init`, drop on `deinit`, otherwise
//!      log and fold into the room if the client is in it)
//!   3. Run the specific reaction (login on challenge, replay upload,
//!      the matching hook)
//!   4. Run the catch-all receive hook

use std::ops::ControlFlow;

use showdown_interval::Work;
use showdown_protocol::{decode_frame, parse_event, Event, Frame};
use showdown_room::Room;
use showdown_transport::Connection;

use crate::{ChatMessage, Client, Hooks, PrivateMessage, QueryResponse, ShowdownError};

/// Query response kind that carries a replay to upload.
const SAVE_REPLAY: &str = "savereplay";

/// Reads one frame per run and dispatches its events.
pub(crate) struct Receiver<'a, C, H> {
    conn: &'a C,
    client: &'a Client,
    hooks: &'a mut H,
}

impl<'a, C: Connection, H: Hooks> Receiver<'a, C, H> {
    pub(crate) fn new(conn: &'a C, client: &'a Client, hooks: &'a mut H) -> Self {
        Self { conn, client, hooks }
    }

    async fn dispatch(&mut self, room_id: &str, line: &str) -> Result<(), ShowdownError> {
        let event = parse_event(line);
        tracing::debug!(room_id, kind = %event.kind, "<<< event");

        let snapshot = self.update_rooms(room_id, line, &event).await;
        let client = self.client;

        match event.kind.as_str() {
            "init" => {
                if let Some(room) = &snapshot {
                    self.hooks.on_room_init(client, room).await?;
                }
            }
            "deinit" => match &snapshot {
                Some(room) => self.hooks.on_room_deinit(client, room).await?,
                None => tracing::debug!(room_id, "deinit for a room the client is not in"),
            },
            "challstr" => self.on_challenge(&event).await?,
            "queryresponse" => {
                let response = QueryResponse::from_event(&event)?;
                if response.kind == SAVE_REPLAY {
                    client.store_replay(response.data.clone());
                }
                self.hooks.on_query_response(client, &response).await?;
            }
            "c" | "c:" => {
                let message = ChatMessage::from_event(room_id, &event)?;
                self.hooks.on_chat_message(client, &message).await?;
            }
            "pm" => {
                let message = PrivateMessage::from_event(&event)?;
                self.hooks.on_private_message(client, &message).await?;
            }
            _ => {}
        }

        self.hooks.on_receive(client, room_id, &event).await
    }

    /// Applies `event` to the room registry. Returns a copy of the room
    /// for `init` and `deinit` so hooks can see it without the lock.
    async fn update_rooms(&self, room_id: &str, line: &str, event: &Event) -> Option<Room> {
        let mut state = self.client.shared.state.lock().await;
        match event.kind.as_str() {
            "init" => {
                let kind = event.params.first().map_or("chat", String::as_str);
                let room = state.rooms.init(room_id, kind);
                room.add_content(line);
                Some(room.clone())
            }
            "deinit" => state.rooms.deinit(room_id),
            _ => {
                state.rooms.route(room_id, line);
                None
            }
        }
    }

    async fn on_challenge(&mut self, event: &Event) -> Result<(), ShowdownError> {
        let key_id = event.param(0)?;
        let token = event.rest(1);
        let autologin = self
            .client
            .shared
            .state
            .lock()
            .await
            .auth
            .on_challenge(key_id, token)?;
        tracing::debug!(autologin, "challenge received");

        if autologin {
            let response = self.client.login().await?;
            self.hooks.on_login(self.client, &response).await?;
        }
        Ok(())
    }
}

impl<C: Connection, H: Hooks> Work for Receiver<'_, C, H> {
    type Error = ShowdownError;

    async fn run_once(&mut self) -> Result<ControlFlow<()>, ShowdownError> {
        let Some(raw) = self.conn.recv().await? else {
            tracing::info!(conn = %self.conn.id(), "server closed the connection");
            return Ok(ControlFlow::Break(()));
        };
        tracing::trace!(conn = %self.conn.id(), len = raw.len(), "<<< frame");

        match decode_frame(&raw)? {
            Frame::Connected => {
                tracing::debug!(conn = %self.conn.id(), "connect frame received");
                self.hooks.on_connect(self.client).await?;
            }
            Frame::Events(events) => {
                for (room_id, line) in &events {
                    self.dispatch(room_id, line).await?;
                }
            }
        }
        Ok(ControlFlow::Continue(()))
    }
}
