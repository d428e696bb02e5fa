//! # Showdown
//!
//! Persistent-connection client for the Pokémon Showdown real-time
//! protocol.
//!
//! A [`Client`] resolves a server, opens one WebSocket connection, logs in
//! when the server sends its challenge, and keeps a live model of every
//! room and battle it is in. Embedders react to traffic by implementing
//! [`Hooks`] and talk back through the client's command methods, which
//! queue output that is written in order and paced to stay under the
//! server's rate limits.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use showdown::prelude::*;
//!
//! struct Echo;
//!
//! impl Hooks for Echo {
//!     async fn on_private_message(
//!         &mut self,
//!         client: &Client,
//!         message: &PrivateMessage,
//!     ) -> Result<(), ShowdownError> {
//!         if message.is_from(client.name()) {
//!             return Ok(());
//!         }
//!         client.private_message(message.author.id(), &message.content, false)
//!     }
//! }
//!
//! # async fn run() -> Result<(), ShowdownError> {
//! let client = Client::builder()
//!     .name("Ash")
//!     .password("pikachu")
//!     .build()
//!     .await?;
//! client.run(&mut Echo).await
//! # }
//! ```

#![allow(async_fn_in_trait)]

mod client;
mod config;
mod error;
mod handler;
mod hooks;
mod message;
mod output;

pub use client::{Client, ClientBuilder};
pub use config::{ClientConfig, DEFAULT_SERVER_ID};
pub use error::ShowdownError;
pub use hooks::Hooks;
pub use message::{ChatMessage, PrivateMessage, QueryResponse};
pub use output::OutputItem;

/// Re-exports of the layer crates.
pub use showdown_interval as interval;
pub use showdown_protocol as protocol;
pub use showdown_room as room;
pub use showdown_session as session;
pub use showdown_transport as transport;

pub mod prelude {
    //! Everything an embedder typically needs.

    pub use crate::{
        ChatMessage, Client, ClientBuilder, ClientConfig, Hooks, OutputItem, PrivateMessage,
        QueryResponse, ShowdownError,
    };
    pub use showdown_protocol::{normalize_id, Event};
    pub use showdown_room::{Battle, Outcome, PlayerSlot, Room, RoomKind, User};
    pub use showdown_session::{AuthState, LoginResponse, ServerAddress};
    pub use showdown_transport::{Connection, Connector, MemoryConnection};
    pub use std::time::Duration;
}
