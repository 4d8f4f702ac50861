//! Helios CLI - Command-line chat with the retrieval-augmented assistant.

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;
use tracing::{debug, warn, Level};
use tracing_subscriber::FmtSubscriber;

use helios_chat::{connect, connect_retriever, ChatSession, Role};
use helios_core::HeliosConfig;
use helios_query::FusedQueryBuilder;

/// Helios - retrieval-augmented question answering over your search indices
#[derive(Parser)]
#[command(name = "helios")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Config file (default: ~/.config/helios/config.toml, then ./helios.toml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start an interactive chat session
    Chat,

    /// Ask a single question and print the answer
    Ask {
        /// The question
        question: String,
    },

    /// Print the search request for a question without sending it
    Query {
        /// The question
        question: String,
    },

    /// Run retrieval for a question and print the flattened context
    Context {
        /// The question
        question: String,
    },

    /// Validate the configuration
    Check,
}

fn setup_logging(verbose: bool) {
    let level = if verbose { Level::DEBUG } else { Level::WARN };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber).ok();
}

/// Load `.env` into the process environment. Variables already set win.
fn load_dotenv() {
    match dotenvy::dotenv() {
        Ok(path) => debug!("Loaded environment from {}", path.display()),
        Err(e) if e.not_found() => {}
        Err(e) => warn!("Ignoring .env file: {}", e),
    }
}

fn load_config(path: Option<PathBuf>) -> Result<HeliosConfig, Box<dyn std::error::Error>> {
    load_dotenv();

    let mut config = match path {
        Some(path) => HeliosConfig::load(&path)?,
        None => HeliosConfig::load_default()?,
    };
    config.apply_env()?;
    Ok(config)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    setup_logging(cli.verbose);

    let config = load_config(cli.config)?;

    match cli.command {
        Commands::Chat => {
            chat(&config).await?;
        }
        Commands::Ask { question } => {
            ask(&config, &question).await?;
        }
        Commands::Query { question } => {
            query(&config, &question)?;
        }
        Commands::Context { question } => {
            context(&config, &question).await?;
        }
        Commands::Check => {
            check(&config)?;
        }
    }

    Ok(())
}

async fn chat(config: &HeliosConfig) -> Result<(), Box<dyn std::error::Error>> {
    let assistant = Arc::new(connect(config)?);
    let mut session = ChatSession::new(assistant, config.chat.greeting.clone());
    let mut editor = DefaultEditor::new()?;

    if let Some(greeting) = session.history().greeting() {
        println!("assistant> {}", greeting.content);
    }
    println!("(type /history to show the transcript, /exit to quit)\n");

    loop {
        let line = match editor.readline("you> ") {
            Ok(line) => line,
            Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => break,
            Err(e) => return Err(e.into()),
        };

        let input = line.trim();
        if input.is_empty() {
            continue;
        }
        editor.add_history_entry(input)?;

        match input {
            "/exit" | "/quit" => break,
            "/history" => {
                for turn in session.history().turns() {
                    let who = match turn.role {
                        Role::User => "you",
                        Role::Assistant => "assistant",
                    };
                    println!("{}> {}\n", who, turn.content);
                }
                continue;
            }
            _ => {}
        }

        match session.send(input).await {
            Ok(answer) => println!("\nassistant> {}\n", answer),
            Err(e) => eprintln!("\nError [{}]: {}\n", e.error_code(), e),
        }
    }

    Ok(())
}

async fn ask(config: &HeliosConfig, question: &str) -> Result<(), Box<dyn std::error::Error>> {
    let assistant = Arc::new(connect(config)?);
    let mut session = ChatSession::new(assistant, config.chat.greeting.clone());

    match session.send(question).await {
        Ok(answer) => {
            println!("{}", answer);
            Ok(())
        }
        Err(e) => {
            eprintln!("Error [{}]: {}", e.error_code(), e);
            std::process::exit(1);
        }
    }
}

fn query(config: &HeliosConfig, question: &str) -> Result<(), Box<dyn std::error::Error>> {
    config.validate_query_settings()?;
    let registry = config.search.registry()?;

    let request = FusedQueryBuilder::new(config.search.inference_id.clone())
        .with_inner_hits_size(config.search.inner_hits_size)
        .with_rank_constant(config.search.rank_constant)
        .build(
            question,
            registry.descriptors(),
            config.search.rank_window_size,
            config.search.size,
        )?;

    println!("POST /{}/_search", registry.names().join(","));
    println!("{}", serde_json::to_string_pretty(&request)?);
    Ok(())
}

async fn context(config: &HeliosConfig, question: &str) -> Result<(), Box<dyn std::error::Error>> {
    config.validate_query_settings()?;
    let retriever = connect_retriever(config)?;

    let response = retriever.retrieve(question).await?;
    let text = retriever.flatten(&response)?;

    eprintln!("{} hits", response.len());
    print!("{}", text);
    Ok(())
}

fn check(config: &HeliosConfig) -> Result<(), Box<dyn std::error::Error>> {
    config.validate()?;
    let registry = config.search.registry()?;

    println!("Configuration OK");
    println!("  search endpoint: {}", config.search.endpoint.as_deref().unwrap_or(""));
    println!("  inference id:    {}", config.search.inference_id);
    for descriptor in registry.descriptors() {
        println!(
            "  index:           {} (field {})",
            descriptor.name,
            descriptor.primary_field()
        );
    }
    println!("  model:           {} @ {}", config.llm.model_id, config.llm.endpoint());
    println!("  instructions:    {}", config.chat.instructions_path.display());
    Ok(())
}
