use anyhow::{Context, Result};
use colored::*;
use indicatif::{ProgressBar, ProgressStyle};
use std::future::Future;
use std::io::{self, Write};
use std::time::Duration;
use tracing::{debug, error, info};

use crate::bridge_client::BridgeClient;
use crate::output::{print_chat_result, print_event, print_status};

/// Runs `task` behind a spinner, clearing it whatever the outcome
async fn with_spinner<T>(message: &'static str, task: impl Future<Output = T>) -> T {
    let spinner = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::default_spinner()
        .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏")
        .template("{spinner} {msg}")
    {
        spinner.set_style(style);
    }
    spinner.set_message(message);
    spinner.enable_steady_tick(Duration::from_millis(120));

    let output = task.await;
    spinner.finish_and_clear();
    output
}

/// Bails out early with a readable message when the daemon is down
pub async fn ensure_daemon(client: &BridgeClient) -> Result<()> {
    if client.test_connection().await {
        info!("Connected to bridge daemon");
        return Ok(());
    }
    anyhow::bail!(
        "Could not connect to the bridge daemon at {}. Please ensure it is running.",
        client.base_url()
    )
}

pub async fn run_status(client: &BridgeClient) -> Result<()> {
    let status = with_spinner("Checking sidecar...", client.status()).await?;
    print_status(&status);
    Ok(())
}

/// Sends one message and prints the reply
pub async fn run_single_message(message: String, client: &BridgeClient) -> Result<()> {
    info!("Sending single message");
    let result = with_spinner("Waiting for ChatGPT...", client.send_message(&message))
        .await
        .context("Failed to send message to the bridge daemon")?;
    if !result.is_success() {
        error!(error = ?result.error, "Message failed");
    }
    print_chat_result(&result);
    Ok(())
}

pub async fn run_new_conversation(client: &BridgeClient) -> Result<()> {
    let result = with_spinner("Starting new conversation...", client.new_conversation())
        .await
        .context("Failed to start a new conversation")?;
    if result.is_success() {
        println!("{}", "Started a new conversation.".green());
    } else {
        print_chat_result(&result);
    }
    Ok(())
}

/// Interactive chat. `/new` starts a new conversation; `exit` or `quit` leave.
pub async fn run_interactive_chat(client: &BridgeClient) -> Result<()> {
    println!("Starting interactive chat session with ChatGPT.");
    println!("Type '/new' to start a new conversation, 'exit' or 'quit' to end the session.");
    println!();

    loop {
        print!("{}: ", "You".green().bold());
        io::stdout().flush().context("Failed to flush stdout")?;

        let mut input = String::new();
        let read = io::stdin()
            .read_line(&mut input)
            .context("Failed to read input")?;
        if read == 0 {
            println!();
            break;
        }

        let input = input.trim();
        if input.is_empty() {
            continue;
        }
        if input.eq_ignore_ascii_case("exit") || input.eq_ignore_ascii_case("quit") {
            println!("Exiting chat session.");
            break;
        }

        let outcome = if input == "/new" {
            run_new_conversation(client).await
        } else {
            debug!("Sending message: {}", input);
            run_single_message(input.to_string(), client).await
        };
        if let Err(e) = outcome {
            error!("Chat turn failed: {:#}", e);
            eprintln!("{} {:#}", "Error:".red().bold(), e);
        }

        println!();
    }

    Ok(())
}

/// Prints events until the daemon closes the stream or Ctrl-C
pub async fn run_events(client: &BridgeClient) -> Result<()> {
    let mut events = client.events().await?;
    println!("Listening for events, press Ctrl-C to stop.");

    loop {
        tokio::select! {
            next = events.next_event() => match next? {
                Some(event) => print_event(&event),
                None => {
                    println!("Event stream closed by the daemon.");
                    break;
                }
            },
            _ = tokio::signal::ctrl_c() => break,
        }
    }
    Ok(())
}
