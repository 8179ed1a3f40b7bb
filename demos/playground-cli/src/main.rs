//! Terminal front end for the code playground.
//!
//! Run with: cargo run -p playground-cli -- http://localhost:8080/ocaml
//!
//! Commands on stdin: `run`, `load <file>`, `go <address>`, `quit`.

use std::io::Write;

use playground_core::{
    ConnectionState, Effect, Frontend, Key, Location, PlaygroundConfig, SessionClient,
};
use playground_session::{SessionHandle, SessionRunner};
use playground_transport::WsConnector;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

const DEFAULT_PAGE: &str = "http://localhost:8080/";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let page = std::env::args().nth(1).unwrap_or_else(|| DEFAULT_PAGE.to_string());
    let config = PlaygroundConfig::load()?;
    let client = SessionClient::new(Location::parse(&page)?, &config);
    tracing::info!(sandbox = %client.sandbox(), sub_path = client.sub_path(), "Opening playground");

    let (mut runner, handle) =
        SessionRunner::new(client, WsConnector::new(), ConsoleFrontend, &config);

    let input_task = tokio::spawn(async move {
        if let Err(e) = read_commands(handle).await {
            tracing::error!("Input error: {e}");
        }
    });

    let result = runner.run().await;
    input_task.abort();
    result?;

    Ok(())
}

async fn read_commands(handle: SessionHandle) -> anyhow::Result<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        let (command, arg) = line
            .split_once(' ')
            .map_or((line, ""), |(command, arg)| (command, arg.trim()));

        match command {
            "" => {}
            "run" => handle.run()?,
            "load" => match tokio::fs::read_to_string(arg).await {
                Ok(source) => {
                    handle.edit(source)?;
                    handle.run()?;
                }
                Err(e) => tracing::warn!("Cannot read {arg}: {e}"),
            },
            "go" => handle.address_key(Key::Enter, arg)?,
            "quit" | "exit" => break,
            other => tracing::warn!("Unknown command {other:?} (try run, load <file>, go <address>, quit)"),
        }
    }

    let _ = handle.quit();
    Ok(())
}

/// Prints the transcript as plain text and announces started programs.
struct ConsoleFrontend;

impl Frontend for ConsoleFrontend {
    fn apply(&mut self, effect: &Effect, client: &SessionClient) {
        match effect {
            Effect::BufferReplaced => {
                tracing::info!(lines = client.buffer().lines().count(), "Source loaded from backend");
            }
            Effect::TranscriptAppended(markup) => {
                let mut stdout = std::io::stdout().lock();
                let _ = stdout.write_all(markup_to_text(markup).as_bytes());
                let _ = stdout.flush();
            }
            Effect::LoadFrame(address) => println!("==> {address}"),
            other => tracing::debug!(?other, "Effect"),
        }
    }

    fn connection_changed(&mut self, state: ConnectionState) {
        if state == ConnectionState::Closed {
            tracing::warn!("Disconnected from backend");
        }
    }
}

/// Drop span markup and undo HTML escaping.
fn markup_to_text(markup: &str) -> String {
    let mut text = String::with_capacity(markup.len());
    let mut in_tag = false;
    for c in markup.chars() {
        match c {
            '<' => in_tag = true,
            '>' if in_tag => in_tag = false,
            _ if !in_tag => text.push(c),
            _ => {}
        }
    }

    text.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#039;", "'")
        .replace("&amp;", "&")
}
