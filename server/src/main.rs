use clap::Parser;
use log::info;
use server::network::{Server, ServerConfig};
use server::words::{FixedWords, WordList, WordSource};
use shared::{validate_word, Framing, DEFAULT_PORT};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

/// Hangman game server
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Server IP address to bind to
    #[arg(short = 'H', long, default_value = "0.0.0.0")]
    host: String,

    /// Server port to listen on
    #[arg(short, long, default_value_t = DEFAULT_PORT)]
    port: u16,

    /// Word list file, one word per line
    #[arg(short, long, required_unless_present = "word")]
    words: Option<PathBuf>,

    /// Use this secret word for every game instead of a word list
    #[arg(long, conflicts_with = "words")]
    word: Option<String>,

    /// Number of scores kept on the leaderboard (bounded so the report fits one message)
    #[arg(short = 'k', long, default_value_t = 3)]
    leaderboard_size: usize,

    /// Save the leaderboard to this file and reload it on startup
    #[arg(long)]
    leaderboard_file: Option<PathBuf>,

    /// Maximum concurrent games (0 = unlimited)
    #[arg(short, long, default_value_t = 0)]
    max_connections: usize,

    /// Seconds a player may stay silent before being dropped (0 = never)
    #[arg(short, long, default_value_t = 300)]
    idle_timeout: u64,

    /// Message framing: delimited or length-prefixed
    #[arg(short, long, default_value_t = Framing::Delimited)]
    framing: Framing,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();

    let config = ServerConfig {
        bind_addr: format!("{}:{}", args.host, args.port),
        framing: args.framing,
        leaderboard_size: args.leaderboard_size,
        leaderboard_file: args.leaderboard_file,
        max_connections: (args.max_connections > 0).then_some(args.max_connections),
        idle_timeout: (args.idle_timeout > 0).then(|| Duration::from_secs(args.idle_timeout)),
    };

    let max_word_len = config.framing.max_word_len();
    let words: Arc<dyn WordSource> = match (args.word, args.words) {
        (Some(word), _) => {
            let word = word.to_ascii_uppercase();
            validate_word(&word, max_word_len)?;
            info!("Every game uses the word {}", word);
            Arc::new(FixedWords::new([word]))
        }
        (None, Some(path)) => Arc::new(WordList::from_file(path, max_word_len)?),
        (None, None) => return Err("either --words or --word is required".into()),
    };

    let server = Server::bind(config, words).await?;

    tokio::select! {
        _ = server.run() => {}
        _ = tokio::signal::ctrl_c() => {
            info!("Received Ctrl+C, shutting down");
        }
    }

    Ok(())
}
