use clap::Parser;
use client::input::InputReader;
use client::network::Client;
use client::rendering::ConsoleRenderer;
use log::info;
use shared::{Framing, DEFAULT_PORT};
use tokio::io::BufReader;

/// Hangman console client
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Server address to connect to
    #[arg(short = 'H', long, default_value = "127.0.0.1")]
    host: String,

    /// Server port
    #[arg(short, long, default_value_t = DEFAULT_PORT)]
    port: u16,

    /// Player name; prompted for when omitted
    #[arg(short, long)]
    name: Option<String>,

    /// Message framing, must match the server
    #[arg(short, long, default_value_t = Framing::Delimited)]
    framing: Framing,
}

#[tokio::main]
async fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let args = Args::parse();

    if let Err(e) = play(args).await {
        eprintln!("ERROR, {}", e);
        std::process::exit(1);
    }
}

async fn play(args: Args) -> Result<(), Box<dyn std::error::Error>> {
    let mut input = InputReader::new(BufReader::new(tokio::io::stdin()));
    let mut screen = ConsoleRenderer::new(std::io::stdout());

    let name = match args.name {
        Some(name) => name,
        None => {
            screen.prompt_name()?;
            input.read_name().await?.ok_or("no player name given")?
        }
    };

    let addr = format!("{}:{}", args.host, args.port);
    let mut client = Client::connect(&addr, args.framing)
        .await
        .map_err(|e| format!("could not connect to {}: {}", addr, e))?;
    client.join(&name).await?;
    info!("Joined {} as {}", addr, name);

    loop {
        let game = client.game().ok_or("server did not start a game")?;
        screen.draw_turn(game)?;

        let letter = input
            .read_guess(|line| {
                let _ = screen.invalid_guess(line);
            })
            .await?
            .ok_or("input closed before the word was solved")?;

        let turn = client.guess(letter).await?;
        screen.draw_verdict(turn.correct)?;
        if turn.won {
            break;
        }
    }

    if let Some(game) = client.game() {
        screen.draw_victory(game)?;
    }
    let report = client.receive_leaderboard().await?;
    screen.draw_leaderboard(&report)?;

    Ok(())
}
