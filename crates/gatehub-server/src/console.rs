//! Administrative console.
//!
//! A line-mode REPL over stdin for operators standing next to the reader:
//! list, add, and remove cards without a dashboard. Runs as its own task
//! alongside the server; its stdout output is its UI, so it prints rather
//! than logs.

use gatehub_registry::{CardRegistry, SqliteCardRegistry};
use std::io::Write;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::warn;

const HELP: &str = "\
Available commands:
  list                 - show all registered cards
  add <type> <uid>     - register a card (e.g.: add key 09250C05)
  del <type> <uid>     - remove a card
  help                 - show this help
  exit                 - stop the server";

/// Run the console until stdin closes or `exit` is entered.
pub async fn run(registry: SqliteCardRegistry) {
    println!("\n=== Card registry console ===");
    println!("{HELP}");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        prompt();
        match lines.next_line().await {
            Ok(Some(line)) => {
                let line = line.trim().to_string();
                if line.is_empty() {
                    continue;
                }
                handle_command(&registry, &line).await;
            }
            Ok(None) => break,
            Err(e) => {
                warn!(error = %e, "Console input error");
                break;
            }
        }
    }
}

fn prompt() {
    print!("\n> ");
    let _ = std::io::stdout().flush();
}

async fn handle_command(registry: &SqliteCardRegistry, line: &str) {
    let parts: Vec<&str> = line.split_whitespace().collect();
    let Some((&command, args)) = parts.split_first() else {
        return;
    };

    match command.to_lowercase().as_str() {
        "exit" => {
            println!("Shutting down...");
            std::process::exit(0);
        }

        "help" => println!("{HELP}"),

        "list" => match registry.list().await {
            Ok(cards) if cards.is_empty() => println!("Registry is empty"),
            Ok(cards) => {
                println!("Registered cards ({}):", cards.len());
                for (i, card) in cards.iter().enumerate() {
                    println!(
                        "{}. type: {}, UID: {}, image: {}, added: {}",
                        i + 1,
                        card.card_type,
                        card.uid,
                        if card.has_image { "yes" } else { "no" },
                        card.date_added.format("%Y-%m-%d %H:%M:%S"),
                    );
                }
            }
            Err(e) => println!("Failed to list cards: {e}"),
        },

        "add" if args.len() >= 2 => {
            // The scan path checks uppercase type names; fold here so a card
            // added as `key` actually grants access.
            let card_type = args[0].to_uppercase();
            let uid = args[1..].join(" ");

            match registry.add(&card_type, &uid.as_str().into()).await {
                Ok(true) => println!("Card {card_type} with UID {uid} added"),
                Ok(false) => println!("Card {card_type} with UID {uid} already exists"),
                Err(e) => println!("Failed to add card: {e}"),
            }
        }

        "del" if args.len() >= 2 => {
            let card_type = args[0].to_uppercase();
            let uid = args[1..].join(" ");

            match registry.remove(&card_type, &uid.as_str().into()).await {
                Ok(true) => println!("Card {card_type} with UID {uid} removed"),
                Ok(false) => println!("Card {card_type} with UID {uid} not found"),
                Err(e) => println!("Failed to remove card: {e}"),
            }
        }

        _ => {
            println!("Unknown command: {line}");
            println!("Type 'help' for the command list");
        }
    }
}
