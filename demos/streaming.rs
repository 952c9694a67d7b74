//! Streaming example that prints deltas as they arrive.
//!
//! To run this example, you need to set the KHULNASOFT_KEY environment
//! variable:
//!
//! ```bash
//! export KHULNASOFT_KEY=your_api_key_here
//! cargo run --example streaming
//! ```

use futures_util::StreamExt;
use khulnasoft::Client;
use std::io::Write;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();
    let client = Client::from_env()?;

    let mut deltas = client
        .generate("Tell me a short story about a robot learning to paint.")
        .system_prompt("You are a storyteller who keeps it under one minute.")
        .model("llama-2-70b-chat")
        .stream()
        .await?;

    while let Some(delta) = deltas.next().await {
        print!("{}", delta?);
        std::io::stdout().flush()?;
    }
    println!();

    Ok(())
}
