//! Streaming ask in a multi-turn conversation.
//!
//! Run with:
//!   PERPLEXITY_SESSION_TOKEN=... cargo run --example streaming

use std::io::Write;

use futures::StreamExt;
use perplexity_webui::{PerplexityClient, Result};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let token = std::env::var("PERPLEXITY_SESSION_TOKEN")
        .expect("set PERPLEXITY_SESSION_TOKEN to your session cookie value");
    let client = PerplexityClient::new(token)?;
    let conversation = client.create_conversation();

    for question in [
        "Explain how a pressurized water reactor works.",
        "How does that differ from a boiling water reactor?",
    ] {
        println!("\n> {question}\n");

        let mut stream = client
            .ask(question)
            .conversation(&conversation)
            .send_stream()
            .await?;

        // Each chunk carries the whole answer so far; printing only the
        // delta gives the usual typewriter effect.
        while let Some(chunk) = stream.next().await {
            let chunk = chunk?;
            if let Some(delta) = &chunk.last_delta {
                print!("{delta}");
                std::io::stdout().flush().ok();
            }
            if chunk.is_final {
                println!();
            }
        }
    }

    if let Some(uuid) = conversation.backend_uuid() {
        println!("\nconversation thread: {uuid}");
    }
    Ok(())
}
