//! Synchronous usage for programs without an async runtime.

use khulnasoft::blocking::Client;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();
    let client = Client::from_env()?;

    let answer = client
        .generate("What is the capital of France?")
        .system_prompt("Answer concisely.")
        .send()?;
    println!("AI: {answer}");

    Ok(())
}
