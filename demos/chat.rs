//! Minimal example showing the simplest usage of the library.

use khulnasoft::{Client, Message};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load API key from environment
    dotenvy::dotenv().ok();
    let client = Client::from_env()?;

    let answer = client
        .generate("What is the capital of France?")
        .system_prompt("Answer concisely.")
        .send()
        .await?;
    println!("AI: {answer}");

    // Multi-turn: pass the running conversation instead of a string
    let history = vec![
        Message::user("What is the capital of France?"),
        Message::assistant(answer.as_str()),
        Message::user("What is its population?"),
    ];
    let followup = client.generate(history).send().await?;
    println!("AI: {followup}");

    Ok(())
}
