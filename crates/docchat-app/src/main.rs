//! docchat application binary - composition root.
//!
//! Ties the docchat crates together into a terminal chat:
//! 1. Parse CLI arguments and load configuration from TOML
//! 2. Build the HTTP backend client and the local PDF inspector
//! 3. Create the chat session and an event logger task
//! 4. Run the read-eval loop: upload screen, then question screen

mod cli;

use std::io::Write;
use std::path::Path;
use std::sync::Arc;

use clap::Parser;
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};

use docchat_backend::{DocumentPayload, HttpBackend, PdfInspector};
use docchat_core::config::DocchatConfig;
use docchat_session::{ChatSession, SessionConfig, SessionError};

use cli::CliArgs;

type InputLines = Lines<BufReader<Stdin>>;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = CliArgs::parse();

    // Config first: the log level may come from it.
    let config_file = args.resolve_config_path();
    let mut config = DocchatConfig::load_or_default(&config_file);
    config.backend.base_url = args.resolve_backend_url(&config.backend.base_url);
    let log_level = args.resolve_log_level(&config.general.log_level);

    // Tracing.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level)),
        )
        .init();

    tracing::info!("Starting docchat v{}", env!("CARGO_PKG_VERSION"));
    tracing::info!(path = %config_file.display(), "Configuration loaded");

    let session = Arc::new(ChatSession::new(
        Arc::new(HttpBackend::new(&config.backend)?),
        Arc::new(PdfInspector::new()),
        SessionConfig::from_config(&config),
    ));

    // Event logger: drain the broadcast subscription into the log.
    let mut events = session.subscribe();
    tokio::spawn(async move {
        loop {
            match events.recv().await {
                Ok(event) => {
                    let detail = serde_json::to_string(&event).unwrap_or_default();
                    tracing::debug!(event = event.event_name(), %detail, "Event logged");
                }
                Err(tokio::sync::broadcast::error::RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "Event logger fell behind");
                }
                Err(tokio::sync::broadcast::error::RecvError::Closed) => break,
            }
        }
    });

    println!("docchat: chat with a PDF");
    println!("backend: {}", config.backend.base_url);
    println!("Upload a document to begin. /quit exits.");
    println!();

    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    if let Some(ref path) = args.document {
        upload_from_path(&session, path).await;
    }

    loop {
        let keep_going = if session.is_ready() {
            question_screen(&session, &mut lines).await?
        } else {
            upload_screen(&session, &mut lines).await?
        };
        if !keep_going {
            break;
        }
    }
    println!("bye");
    Ok(())
}

/// Prompt for a document path and upload it. Returns `false` to quit.
async fn upload_screen(session: &ChatSession, lines: &mut InputLines) -> std::io::Result<bool> {
    print!("document path> ");
    std::io::stdout().flush()?;
    let line = match lines.next_line().await? {
        Some(line) => line,
        None => return Ok(false),
    };
    let input = line.trim();
    if input.is_empty() {
        return Ok(true);
    }
    if input == "/quit" {
        return Ok(false);
    }
    upload_from_path(session, Path::new(input)).await;
    Ok(true)
}

async fn upload_from_path(session: &ChatSession, path: &Path) {
    let bytes = match tokio::fs::read(path).await {
        Ok(bytes) => bytes,
        Err(e) => {
            println!("could not read {}: {}", path.display(), e);
            return;
        }
    };
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| "document".to_string());
    let payload = DocumentPayload::new(file_name, content_type_for(path), bytes);

    println!("uploading...");
    match session.upload_document(payload).await {
        Ok(receipt) => {
            println!("{}", receipt.message);
            if let (Some(pages), Some(characters)) = (receipt.pages, receipt.characters) {
                println!("Extracted {} characters from {} pages", characters, pages);
            }
            println!("Ask away. /reset starts over, /quit exits.");
        }
        Err(SessionError::Interrupted) => {}
        Err(e) => println!("upload failed: {}", e),
    }
}

/// Derive the MIME type the backend sees from the file extension.
fn content_type_for(path: &Path) -> &'static str {
    match path.extension().and_then(|e| e.to_str()) {
        Some(ext) if ext.eq_ignore_ascii_case("pdf") => "application/pdf",
        _ => "application/octet-stream",
    }
}

/// Prompt for a question or command. Returns `false` to quit.
async fn question_screen(session: &ChatSession, lines: &mut InputLines) -> std::io::Result<bool> {
    print!("you> ");
    std::io::stdout().flush()?;
    let line = match lines.next_line().await? {
        Some(line) => line,
        None => return Ok(false),
    };
    let input = line.trim().to_string();
    if input.is_empty() {
        return Ok(true);
    }
    match input.as_str() {
        "/quit" => return Ok(false),
        "/reset" => {
            if confirm_reset(session, lines).await? {
                session.reset();
                println!("Session cleared. Upload a document to continue.");
            }
            return Ok(true);
        }
        _ => {}
    }
    ask(session, &input).await;
    Ok(true)
}

/// Ask before discarding a non-empty conversation.
async fn confirm_reset(session: &ChatSession, lines: &mut InputLines) -> std::io::Result<bool> {
    if session.timeline_is_empty() {
        return Ok(true);
    }
    print!("Discard the conversation and document? [y/N] ");
    std::io::stdout().flush()?;
    match lines.next_line().await? {
        Some(line) => Ok(line.trim().eq_ignore_ascii_case("y")),
        None => Ok(false),
    }
}

/// Dispatch a question, typing the answer out as it reveals.
async fn ask(session: &ChatSession, question: &str) {
    let mut feed = session.reveal_feed();
    let send = session.send_message(question);
    tokio::pin!(send);

    let mut printed = 0usize;
    let mut prompted = false;
    let result = loop {
        tokio::select! {
            result = &mut send => break result,
            changed = feed.changed() => {
                if changed.is_ok() {
                    let visible = feed.borrow().clone();
                    printed = print_tail(&visible, printed, &mut prompted);
                }
            }
        }
    };
    // flush whatever the last tick published
    let visible = feed.borrow().clone();
    print_tail(&visible, printed, &mut prompted);
    if prompted {
        println!();
    }

    match result {
        Ok(turn) => {
            if !turn.references.is_empty() {
                println!("references:");
                for (i, excerpt) in turn.references.iter().enumerate() {
                    println!("  [{}] {}", i + 1, preview(excerpt));
                }
            }
        }
        Err(SessionError::Interrupted) => {}
        Err(e) => println!("{}", e),
    }
}

/// Print the not-yet-printed suffix of the visible buffer.
fn print_tail(visible: &str, printed: usize, prompted: &mut bool) -> usize {
    let total = visible.chars().count();
    if total <= printed {
        return printed;
    }
    if !*prompted {
        print!("docchat> ");
        *prompted = true;
    }
    let tail: String = visible.chars().skip(printed).collect();
    print!("{}", tail);
    let _ = std::io::stdout().flush();
    total
}

/// First line of an excerpt, truncated for the terminal.
fn preview(excerpt: &str) -> String {
    let line = excerpt.lines().next().unwrap_or("");
    let mut out: String = line.chars().take(120).collect();
    if line.chars().count() > 120 {
        out.push_str("...");
    }
    out
}
