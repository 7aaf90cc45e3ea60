use log::{info, warn};
use shared::{Command, PlayerId, ServerMessage};
use std::io;
use std::net::SocketAddr;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::net::TcpStream;

/// How the game ended for this client.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Won,
    /// `by` is the player who stepped on us, `None` for leaving the board.
    Lost { by: Option<PlayerId> },
}

pub struct Client {
    stream: TcpStream,
    server_addr: SocketAddr,
}

impl Client {
    pub async fn connect(server_addr: &str) -> Result<Self, Box<dyn std::error::Error>> {
        let server_addr: SocketAddr = server_addr.parse()?;
        let stream = TcpStream::connect(server_addr).await?;
        info!("Connected to {}", server_addr);

        Ok(Client {
            stream,
            server_addr,
        })
    }

    /// Plays from the terminal until the server closes the connection.
    pub async fn run(self) -> io::Result<Option<Verdict>> {
        self.run_with(BufReader::new(tokio::io::stdin()), tokio::io::stdout())
            .await
    }

    /// Copies server lines to `output` and `input` lines to the server.
    pub async fn run_with<I, O>(self, input: I, mut output: O) -> io::Result<Option<Verdict>>
    where
        I: AsyncBufRead + Unpin,
        O: AsyncWrite + Unpin,
    {
        let (reader, mut writer) = self.stream.into_split();
        let mut server_lines = BufReader::new(reader).lines();
        let mut input_lines = input.lines();
        let mut input_open = true;
        let mut verdict = None;

        loop {
            tokio::select! {
                line = server_lines.next_line() => {
                    let Some(line) = line? else {
                        info!("Server at {} closed the connection", self.server_addr);
                        break;
                    };

                    output.write_all(line.as_bytes()).await?;
                    output.write_all(b"\n").await?;
                    output.flush().await?;

                    let Some(message) = ServerMessage::parse(&line) else {
                        continue;
                    };
                    if message.is_final() {
                        // The server reads nothing more from us.
                        input_open = false;
                    }
                    match message {
                        ServerMessage::Joined { player } => {
                            info!("Seated as player {}", player);
                        }
                        ServerMessage::Won => verdict = Some(Verdict::Won),
                        ServerMessage::SteppedOut => {
                            verdict = Some(Verdict::Lost { by: None });
                        }
                        ServerMessage::SteppedOn { by } => {
                            verdict = Some(Verdict::Lost { by: Some(by) });
                        }
                        _ => {}
                    }
                }

                line = input_lines.next_line(), if input_open => {
                    let Some(line) = line? else {
                        input_open = false;
                        continue;
                    };

                    let step = line.trim();
                    if Command::parse(step) == Command::Ignored {
                        warn!("'{}' is not a step between -2 and 2, the server will ignore it", step);
                    }
                    if let Err(e) = writer.write_all(format!("{}\n", step).as_bytes()).await {
                        warn!("Failed to send command: {}", e);
                        input_open = false;
                    }
                }
            }
        }

        Ok(verdict)
    }
}
