//! Integration tests for the hangman client and server
//!
//! Every test runs a real server on a loopback port and plays against it
//! with the client library.

use assert_approx_eq::assert_approx_eq;
use client::network::{Client, ClientPhase, TurnReport};
use server::leaderboard::Leaderboard;
use server::network::{Server, ServerConfig};
use server::words::FixedWords;
use shared::{FramedStream, Framing, ProtocolError};
use std::sync::Arc;
use tokio::net::TcpStream;

async fn start_server(config: ServerConfig, words: &[&str]) -> (String, Arc<Leaderboard>) {
    let words = Arc::new(FixedWords::new(words.iter().copied()));
    let server = Server::bind(config, words).await.unwrap();
    let addr = server.local_addr().unwrap().to_string();
    let leaderboard = server.leaderboard();
    tokio::spawn(async move { server.run().await });
    (addr, leaderboard)
}

fn loopback_config() -> ServerConfig {
    ServerConfig {
        bind_addr: "127.0.0.1:0".to_string(),
        ..ServerConfig::default()
    }
}

/// Plays `letters` in order and returns the leaderboard report
async fn play(addr: &str, framing: Framing, name: &str, letters: &[u8]) -> String {
    let mut client = Client::connect(addr, framing).await.unwrap();
    client.join(name).await.unwrap();
    for (i, &letter) in letters.iter().enumerate() {
        let turn = client.guess(letter).await.unwrap();
        assert_eq!(turn.won, i == letters.len() - 1, "{} won early or late", name);
    }
    client.receive_leaderboard().await.unwrap()
}

/// SCRIPTED GAMES
mod gameplay_tests {
    use super::*;

    /// CAT guessed in order: one position per guess, won on the third
    #[tokio::test]
    async fn cat_in_three_guesses() {
        let (addr, leaderboard) = start_server(loopback_config(), &["CAT"]).await;
        let mut client = Client::connect(&addr, Framing::Delimited).await.unwrap();

        let game = client.join("alice").await.unwrap();
        assert_eq!(game.word(), "CAT");

        for (letter, won) in [(b'C', false), (b'A', false), (b'T', true)] {
            let turn = client.guess(letter).await.unwrap();
            assert_eq!(
                turn,
                TurnReport {
                    correct: true,
                    won,
                    newly_revealed: 1
                }
            );
        }

        let game = client.game().unwrap();
        assert_eq!(game.masked(), "CAT");
        assert_eq!(game.guesses(), 3);
        assert_approx_eq!(game.score(), 1.0);

        let report = client.receive_leaderboard().await.unwrap();
        assert!(report.contains("1:\nalice\n1.00"));
        assert_eq!(client.phase(), ClientPhase::Done);

        let board = leaderboard.snapshot().await;
        assert_eq!(board.len(), 1);
        assert_approx_eq!(board[0].score, 1.0);
    }

    /// Repeating an already revealed letter counts as a guess but reveals nothing
    #[tokio::test]
    async fn dog_with_repeated_letter() {
        let (addr, leaderboard) = start_server(loopback_config(), &["DOG"]).await;
        let mut client = Client::connect(&addr, Framing::Delimited).await.unwrap();
        client.join("bob").await.unwrap();

        assert!(client.guess(b'D').await.unwrap().correct);
        assert!(client.guess(b'O').await.unwrap().correct);

        let repeat = client.guess(b'O').await.unwrap();
        assert!(!repeat.correct);
        assert!(!repeat.won);
        assert_eq!(client.game().unwrap().masked(), "DO-");

        assert!(client.guess(b'G').await.unwrap().won);
        assert_eq!(client.game().unwrap().guesses(), 4);
        client.receive_leaderboard().await.unwrap();

        let board = leaderboard.snapshot().await;
        assert_approx_eq!(board[0].score, 4.0 / 3.0);
    }

    /// Lower case guesses are accepted and judged as upper case
    #[tokio::test]
    async fn lower_case_guesses() {
        let (addr, _) = start_server(loopback_config(), &["OK"]).await;
        let report = play(&addr, Framing::Delimited, "carol", b"ok").await;
        assert!(report.contains("carol"));
    }

    /// Long words need length-prefixed framing
    #[tokio::test]
    async fn length_prefixed_long_word() {
        let word = "ABCDEFGHIJKLMNOPQRSTUVWXYZABCDEFGHIJKLMNOPQRSTUVWXYZ";
        let config = ServerConfig {
            framing: Framing::LengthPrefixed,
            ..loopback_config()
        };
        let (addr, _) = start_server(config, &[word]).await;

        let mut client = Client::connect(&addr, Framing::LengthPrefixed).await.unwrap();
        assert_eq!(client.join("dana").await.unwrap().word_len(), 52);

        let mut letters: Vec<u8> = (b'A'..=b'Z').collect();
        let last = letters.pop().unwrap();
        for letter in letters {
            let turn = client.guess(letter).await.unwrap();
            assert_eq!(turn.newly_revealed, 2);
            assert!(!turn.won);
        }
        assert!(client.guess(last).await.unwrap().won);
        assert_eq!(client.game().unwrap().masked(), word);
        client.receive_leaderboard().await.unwrap();
    }
}

/// LEADERBOARD ACROSS SESSIONS
mod leaderboard_tests {
    use super::*;

    /// Scores 2.0, 1.0 and 1.5 on a four letter word end up ranked ascending
    #[tokio::test]
    async fn scores_are_ranked() {
        let (addr, leaderboard) = start_server(loopback_config(), &["DOGS"]).await;

        play(&addr, Framing::Delimited, "slow", b"DXYZOGQS").await;
        play(&addr, Framing::Delimited, "fast", b"DOGS").await;
        let report = play(&addr, Framing::Delimited, "middle", b"DXOYGS").await;

        let board = leaderboard.snapshot().await;
        let names: Vec<&str> = board.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["fast", "middle", "slow"]);
        assert_approx_eq!(board[0].score, 1.0);
        assert_approx_eq!(board[1].score, 1.5);
        assert_approx_eq!(board[2].score, 2.0);

        assert!(report.contains("1:\nfast\n1.00"));
        assert!(report.contains("2:\nmiddle\n1.50"));
        assert!(report.contains("3:\nslow\n2.00"));
    }

    /// Many players finishing at once never overflow or unsort the board
    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_players() {
        let (addr, leaderboard) = start_server(loopback_config(), &["CAT"]).await;

        let mut handles = Vec::new();
        for i in 0..12 {
            let addr = addr.clone();
            handles.push(tokio::spawn(async move {
                // Player i wastes i % 4 guesses before solving
                let mut letters: Vec<u8> = std::iter::repeat(b'Q').take(i % 4).collect();
                letters.extend_from_slice(b"CAT");
                play(&addr, Framing::Delimited, &format!("player{}", i), &letters).await
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        let board = leaderboard.snapshot().await;
        assert_eq!(board.len(), 3);
        assert!(board.windows(2).all(|w| w[0].score <= w[1].score));
        for entry in &board {
            assert_approx_eq!(entry.score, 1.0);
        }
    }

    /// A board saved to disk is reloaded by the next server
    #[tokio::test]
    async fn persisted_board_survives_restart() {
        let path = std::env::temp_dir().join(format!(
            "hangman-integration-{}.bin",
            std::process::id()
        ));
        let _ = std::fs::remove_file(&path);

        let config = ServerConfig {
            leaderboard_file: Some(path.clone()),
            ..loopback_config()
        };
        let (addr, _) = start_server(config.clone(), &["HI"]).await;
        play(&addr, Framing::Delimited, "erin", b"HI").await;

        let (_, reloaded) = start_server(config, &["HI"]).await;
        let board = reloaded.snapshot().await;
        assert_eq!(board.len(), 1);
        assert_eq!(board[0].name, "erin");

        let _ = std::fs::remove_file(&path);
    }

    /// A board shared by servers with different framings stays sendable
    #[tokio::test]
    async fn board_file_shared_across_framings() {
        let path = std::env::temp_dir().join(format!(
            "hangman-integration-framings-{}.bin",
            std::process::id()
        ));
        let _ = std::fs::remove_file(&path);

        let length_prefixed = ServerConfig {
            framing: Framing::LengthPrefixed,
            leaderboard_file: Some(path.clone()),
            ..loopback_config()
        };
        let (addr, board) = start_server(length_prefixed, &["HI"]).await;

        let mut starry = Client::connect(&addr, Framing::LengthPrefixed).await.unwrap();
        assert!(starry.join("a*b").await.is_err());
        play(&addr, Framing::LengthPrefixed, "plain", b"HI").await;
        assert_eq!(board.snapshot().await.len(), 1);

        let delimited = ServerConfig {
            leaderboard_file: Some(path.clone()),
            ..loopback_config()
        };
        let (addr, _) = start_server(delimited, &["HI"]).await;
        let report = play(&addr, Framing::Delimited, "honest", b"HI").await;
        assert!(report.contains("plain"));
        assert!(report.contains("honest"));

        let _ = std::fs::remove_file(&path);
    }
}

/// FAILURE HANDLING
mod failure_tests {
    use super::*;

    /// A client that sends garbage loses its own connection only
    #[tokio::test]
    async fn bad_client_does_not_affect_others() {
        let (addr, leaderboard) = start_server(loopback_config(), &["HI"]).await;

        let stream = TcpStream::connect(&addr).await.unwrap();
        let mut rogue = FramedStream::new(stream, Framing::Delimited);
        rogue.write_frame(b"rogue").await.unwrap();
        rogue.read_text().await.unwrap();
        rogue.write_frame(b"7").await.unwrap();
        let err = rogue.read_frame().await.unwrap_err();
        assert!(err.is_disconnect(), "unexpected error: {}", err);

        play(&addr, Framing::Delimited, "honest", b"HI").await;
        let board = leaderboard.snapshot().await;
        assert_eq!(board.len(), 1);
        assert_eq!(board[0].name, "honest");
    }

    #[tokio::test]
    async fn connect_to_closed_port() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap().to_string();
        drop(listener);

        let result = Client::connect(&addr, Framing::Delimited).await;
        assert!(matches!(result, Err(ProtocolError::Transport(_))));
    }
}
