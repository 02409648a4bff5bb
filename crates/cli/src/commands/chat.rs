//! `hassist chat`: Interactive or single-message conversation.

use std::io::Write;
use std::path::Path;

use tokio::io::{AsyncBufReadExt, BufReader};

/// Conversation id used for the whole interactive session.
const CLI_CONVERSATION: &str = "cli";

pub async fn run(
    config_path: Option<&Path>,
    message: Option<String>,
) -> Result<(), Box<dyn std::error::Error>> {
    let config = super::load_config(config_path)?;

    if !config.has_api_key() && config.model.base_url.is_none() {
        eprintln!();
        eprintln!("  ERROR: No API key configured!");
        eprintln!();
        eprintln!("  Set HASSIST_API_KEY, or add api_key under [model] in:");
        eprintln!(
            "    {}",
            config_path
                .map(Path::to_path_buf)
                .unwrap_or_else(|| hassist_config::AppConfig::config_dir().join("config.toml"))
                .display()
        );
        eprintln!();
        return Err("No API key found. See above for setup instructions.".into());
    }

    let sessions = hassist_gateway::runtime::session_manager(&config).await?;
    let language = "en";

    if let Some(msg) = message {
        eprint!("  Thinking...");
        let response = sessions.process(Some(CLI_CONVERSATION), &msg, language).await;
        eprint!("\r              \r");
        println!("{}", response.speech);
        if response.is_error() {
            return Err("The turn failed; run with --verbose for details.".into());
        }
        return Ok(());
    }

    println!();
    println!("  hassist - interactive mode");
    println!();
    println!("  Model:     {} ({})", config.model.model_name(), config.model.family());
    println!("  Tools:     {}", sessions.executor().tools().names().join(", "));
    println!();
    println!("  Type your message and press Enter.");
    println!("  Type 'exit' or Ctrl+C to quit.");
    println!();

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        print!("  You > ");
        std::io::stdout().flush()?;

        let Some(line) = lines.next_line().await? else {
            break;
        };
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        if matches!(line, "exit" | "quit") {
            break;
        }

        eprint!("  ...");
        let response = sessions.process(Some(CLI_CONVERSATION), line, language).await;
        eprint!("\r     \r");
        println!("  Assistant > {}\n", response.speech);
    }

    println!("  Goodbye!");
    Ok(())
}
