//! A bot that echoes private messages and keeps an eye on the ladder.
//!
//! ```text
//! SHOWDOWN_NAME=mybot SHOWDOWN_PASSWORD=secret RUST_LOG=info cargo run -p echo-bot
//! ```
//!
//! Without credentials the bot connects anonymously and only lurks.

use showdown::prelude::*;
use tracing_subscriber::EnvFilter;

const HOME_ROOM: &str = "techcode";
const LADDER_FORMAT: &str = "gen9ou";

// ---------------------------------------------------------------------------
// Hooks
// ---------------------------------------------------------------------------

#[derive(Default)]
struct EchoBot {
    echoed: usize,
}

impl Hooks for EchoBot {
    async fn on_login(&mut self, client: &Client, _: &LoginResponse) -> Result<(), ShowdownError> {
        tracing::info!(name = client.name(), "logged in, joining {HOME_ROOM}");
        client.join(HOME_ROOM);
        Ok(())
    }

    async fn on_room_init(&mut self, _: &Client, room: &Room) -> Result<(), ShowdownError> {
        tracing::info!(room = room.id(), battle = room.is_battle(), "joined room");
        Ok(())
    }

    async fn on_private_message(
        &mut self,
        client: &Client,
        message: &PrivateMessage,
    ) -> Result<(), ShowdownError> {
        if message.is_from(client.name()) {
            return Ok(());
        }
        self.echoed += 1;
        client.private_message(message.author.id(), &message.content, false)
    }

    async fn on_query_response(
        &mut self,
        _: &Client,
        response: &QueryResponse,
    ) -> Result<(), ShowdownError> {
        if response.kind == "roomlist" {
            let battles = response.data["rooms"].as_object().map_or(0, |rooms| rooms.len());
            tracing::info!(format = LADDER_FORMAT, battles, "ladder snapshot");
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let name = std::env::var("SHOWDOWN_NAME").unwrap_or_default();
    let password = std::env::var("SHOWDOWN_PASSWORD").unwrap_or_default();
    let autologin = !name.is_empty() && !password.is_empty();

    let client = Client::builder()
        .name(name)
        .password(password)
        .autologin(autologin)
        .every("ladder", Duration::from_secs(30), |client| async move {
            client.query_battles(LADDER_FORMAT, None);
            Ok(())
        })
        .build()
        .await?;

    if !autologin {
        client.join(HOME_ROOM);
    }

    let mut bot = EchoBot::default();
    let result = client.run(&mut bot).await;
    tracing::info!(echoed = bot.echoed, "bot stopped");
    result?;
    Ok(())
}
