//! Server network layer: TCP listener and per-connection session tasks

use crate::leaderboard::{self, Leaderboard, DEFAULT_LEADERBOARD_SIZE};
use crate::session::{SessionContext, SessionError, SessionHandler};
use crate::words::WordSource;
use log::{error, info, warn};
use shared::Framing;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{OwnedSemaphorePermit, Semaphore};

/// Delay before accepting again after `accept` itself failed
const ACCEPT_BACKOFF: Duration = Duration::from_millis(100);

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub bind_addr: String,
    pub framing: Framing,
    pub leaderboard_size: usize,
    pub leaderboard_file: Option<PathBuf>,
    /// Concurrent session cap; `None` is unbounded
    pub max_connections: Option<usize>,
    pub idle_timeout: Option<Duration>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: format!("127.0.0.1:{}", shared::DEFAULT_PORT),
            framing: Framing::Delimited,
            leaderboard_size: DEFAULT_LEADERBOARD_SIZE,
            leaderboard_file: None,
            max_connections: None,
            idle_timeout: Some(Duration::from_secs(300)),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error("failed to bind: {0}")]
    Bind(#[from] std::io::Error),

    #[error(transparent)]
    Leaderboard(#[from] crate::leaderboard::LeaderboardError),

    #[error("leaderboard size {requested} is too large, reports allow at most {max}")]
    LeaderboardTooLarge { requested: usize, max: usize },
}

/// Accepts players and runs each game on its own task
pub struct Server {
    listener: TcpListener,
    context: Arc<SessionContext>,
    connection_limit: Option<Arc<Semaphore>>,
}

impl Server {
    pub async fn bind(
        config: ServerConfig,
        words: Arc<dyn WordSource>,
    ) -> Result<Self, ServerError> {
        let max = leaderboard::max_capacity();
        if config.leaderboard_size > max {
            return Err(ServerError::LeaderboardTooLarge {
                requested: config.leaderboard_size,
                max,
            });
        }

        let leaderboard = match &config.leaderboard_file {
            Some(path) => Leaderboard::open(config.leaderboard_size, path).await?,
            None => Leaderboard::new(config.leaderboard_size),
        };

        let listener = TcpListener::bind(&config.bind_addr).await?;
        info!(
            "Server listening on {} ({} framing)",
            listener.local_addr()?,
            config.framing
        );

        Ok(Server {
            listener,
            context: Arc::new(SessionContext {
                leaderboard: Arc::new(leaderboard),
                words,
                framing: config.framing,
                idle_timeout: config.idle_timeout,
            }),
            connection_limit: config
                .max_connections
                .map(|limit| limit.min(Semaphore::MAX_PERMITS))
                .map(|limit| Arc::new(Semaphore::new(limit))),
        })
    }

    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    pub fn leaderboard(&self) -> Arc<Leaderboard> {
        Arc::clone(&self.context.leaderboard)
    }

    /// Accept loop; runs until the future is dropped
    pub async fn run(&self) {
        info!("Server started successfully");

        loop {
            match self.listener.accept().await {
                Ok((stream, addr)) => {
                    let permit = match self.try_reserve_slot() {
                        Ok(permit) => permit,
                        Err(()) => {
                            warn!("Connection limit reached, rejecting {}", addr);
                            continue;
                        }
                    };
                    info!("Handling client: {}", addr);
                    self.spawn_session(stream, addr, permit);
                }
                Err(e) => {
                    error!("Accept error: {}", e);
                    tokio::time::sleep(ACCEPT_BACKOFF).await;
                }
            }
        }
    }

    fn try_reserve_slot(&self) -> Result<Option<OwnedSemaphorePermit>, ()> {
        match &self.connection_limit {
            Some(limit) => Arc::clone(limit)
                .try_acquire_owned()
                .map(Some)
                .map_err(|_| ()),
            None => Ok(None),
        }
    }

    /// Runs one session detached from the accept loop
    fn spawn_session(
        &self,
        stream: TcpStream,
        addr: SocketAddr,
        permit: Option<OwnedSemaphorePermit>,
    ) {
        if let Err(e) = stream.set_nodelay(true) {
            warn!("[{}] Could not disable Nagle: {}", addr, e);
        }
        let context = Arc::clone(&self.context);

        tokio::spawn(async move {
            let _permit = permit;
            match SessionHandler::new(stream, addr, context).run().await {
                Ok(summary) => info!(
                    "[{}] {} solved {} in {} guesses, score {:.2}, rank {}",
                    addr,
                    summary.player,
                    summary.word,
                    summary.guesses,
                    summary.score,
                    summary
                        .rank
                        .map(|r| r.to_string())
                        .unwrap_or_else(|| "-".to_string())
                ),
                Err(e) => log_session_error(addr, &e),
            }
        });
    }
}

fn log_session_error(addr: SocketAddr, e: &SessionError) {
    if e.is_disconnect() {
        info!("[{}] Client disconnected: {}", addr, e);
    } else {
        warn!("[{}] Session ended: {}", addr, e);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::words::FixedWords;
    use shared::{FramedStream, GuessOutcome, ProtocolError};

    fn test_config() -> ServerConfig {
        ServerConfig {
            bind_addr: "127.0.0.1:0".to_string(),
            ..ServerConfig::default()
        }
    }

    async fn start_server(config: ServerConfig, words: &[&str]) -> (SocketAddr, Arc<Leaderboard>) {
        let words = Arc::new(FixedWords::new(words.iter().copied()));
        let server = Server::bind(config, words).await.unwrap();
        let addr = server.local_addr().unwrap();
        let leaderboard = server.leaderboard();
        tokio::spawn(async move { server.run().await });
        (addr, leaderboard)
    }

    #[test]
    fn test_default_config() {
        let config = ServerConfig::default();
        assert_eq!(config.bind_addr, "127.0.0.1:8080");
        assert_eq!(config.framing, Framing::Delimited);
        assert_eq!(config.leaderboard_size, 3);
        assert_eq!(config.max_connections, None);
        assert_eq!(config.idle_timeout, Some(Duration::from_secs(300)));
    }

    #[tokio::test]
    async fn test_bind_invalid_address() {
        let config = ServerConfig {
            bind_addr: "not an address".to_string(),
            ..ServerConfig::default()
        };
        let words = Arc::new(FixedWords::new(["CAT"]));
        assert!(matches!(
            Server::bind(config, words).await,
            Err(ServerError::Bind(_))
        ));
    }

    #[tokio::test]
    async fn test_leaderboard_size_limit() {
        let max = leaderboard::max_capacity();

        let at_limit = ServerConfig {
            leaderboard_size: max,
            ..test_config()
        };
        assert!(Server::bind(at_limit, Arc::new(FixedWords::new(["CAT"])))
            .await
            .is_ok());

        let over = ServerConfig {
            leaderboard_size: max + 1,
            ..test_config()
        };
        assert!(matches!(
            Server::bind(over, Arc::new(FixedWords::new(["CAT"]))).await,
            Err(ServerError::LeaderboardTooLarge { requested, .. }) if requested == max + 1
        ));
    }

    #[tokio::test]
    async fn test_huge_connection_limit_is_clamped() {
        let config = ServerConfig {
            max_connections: Some(usize::MAX),
            ..test_config()
        };
        let (addr, _) = start_server(config, &["HI"]).await;

        let stream = TcpStream::connect(addr).await.unwrap();
        let mut player = FramedStream::new(stream, Framing::Delimited);
        player.write_frame(b"many").await.unwrap();
        assert_eq!(player.read_text().await.unwrap(), "HI");
    }

    #[tokio::test]
    async fn test_plays_game_over_tcp() {
        let (addr, leaderboard) = start_server(test_config(), &["HI"]).await;

        let stream = TcpStream::connect(addr).await.unwrap();
        let mut player = FramedStream::new(stream, Framing::Delimited);
        player.write_frame(b"tcp-player").await.unwrap();
        assert_eq!(player.read_text().await.unwrap(), "HI");

        player.write_frame(b"H").await.unwrap();
        let h = GuessOutcome::decode(&player.read_frame().await.unwrap()).unwrap();
        assert!(!h.won);
        player.write_frame(b"I").await.unwrap();
        let i = GuessOutcome::decode(&player.read_frame().await.unwrap()).unwrap();
        assert!(i.won);

        let report = player.read_text().await.unwrap();
        assert!(report.contains("tcp-player"));
        assert_eq!(leaderboard.snapshot().await.len(), 1);
    }

    #[tokio::test]
    async fn test_failed_session_does_not_stop_server() {
        let (addr, _) = start_server(test_config(), &["HI"]).await;

        // Drop a connection mid-handshake
        let stream = TcpStream::connect(addr).await.unwrap();
        drop(stream);

        let stream = TcpStream::connect(addr).await.unwrap();
        let mut player = FramedStream::new(stream, Framing::Delimited);
        player.write_frame(b"survivor").await.unwrap();
        assert_eq!(player.read_text().await.unwrap(), "HI");
    }

    #[tokio::test]
    async fn test_connection_limit() {
        let config = ServerConfig {
            max_connections: Some(1),
            ..test_config()
        };
        let (addr, _) = start_server(config, &["HI"]).await;

        let first = TcpStream::connect(addr).await.unwrap();
        let mut first = FramedStream::new(first, Framing::Delimited);
        first.write_frame(b"first").await.unwrap();
        assert_eq!(first.read_text().await.unwrap(), "HI");

        // Second player is turned away while the first is still playing
        let second = TcpStream::connect(addr).await.unwrap();
        let mut second = FramedStream::new(second, Framing::Delimited);
        let _ = second.write_frame(b"second").await;
        let err = second.read_frame().await.unwrap_err();
        assert!(err.is_disconnect(), "unexpected error: {}", err);
        assert!(!matches!(err, ProtocolError::ProtocolViolation(_)));
    }
}
