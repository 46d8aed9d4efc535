//! Blocking ask with model selection and markdown citations.
//!
//! Run with:
//!   PERPLEXITY_SESSION_TOKEN=... cargo run --example basic_usage

use perplexity_webui::{CitationMode, Model, PerplexityClient, Result, SourceFocus};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let token = std::env::var("PERPLEXITY_SESSION_TOKEN")
        .expect("set PERPLEXITY_SESSION_TOKEN to your session cookie value");
    let client = PerplexityClient::new(token)?;

    let response = client
        .ask("What were the most cited machine learning papers of 2024?")
        .model(Model::Sonar)
        .sources(vec![SourceFocus::Web, SourceFocus::Academic])
        .citation_mode(CitationMode::Markdown)
        .send()
        .await?;

    println!("{}\n", response.answer);
    for (i, citation) in response.citations.iter().enumerate() {
        println!(
            "[{}] {} — {}",
            i + 1,
            citation.title.as_deref().unwrap_or("untitled"),
            citation.url.as_deref().unwrap_or("no url")
        );
    }

    Ok(())
}
