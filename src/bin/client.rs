//! Interactive console client
//!
//! Connects to the chat server, performs the JOIN handshake and relays
//! console input. Server address comes from the first argument or
//! `CHAT_ADDR`.

use std::env;

use futures_util::{SinkExt, StreamExt};
use tokio::io::{self, AsyncBufReadExt, BufReader};
use tokio::net::TcpStream;
use tokio_util::codec::{Framed, LinesCodec};
use tracing::{debug, error};
use tracing_subscriber::EnvFilter;

use line_chat::cipher::ShiftCipher;
use line_chat::client::{join_line, prepare_outgoing, render_incoming, Outgoing, USAGE};
use line_chat::config::DEFAULT_ADDR;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .init();

    let addr = env::args()
        .nth(1)
        .or_else(|| env::var("CHAT_ADDR").ok())
        .unwrap_or_else(|| DEFAULT_ADDR.to_string());
    let cipher = ShiftCipher::default();

    let stream = TcpStream::connect(&addr).await?;
    let (mut sink, mut lines) = Framed::new(stream, LinesCodec::new()).split();
    let mut stdin = BufReader::new(io::stdin()).lines();

    println!("Enter JOIN:<username> to enter the chat:");
    loop {
        let Some(input) = stdin.next_line().await? else {
            return Ok(());
        };
        match join_line(&input) {
            Some(line) => {
                sink.send(line).await?;
                break;
            }
            None => println!("Enter JOIN:<username> first"),
        }
    }

    let receiver = tokio::spawn(async move {
        while let Some(line) = lines.next().await {
            match line {
                Ok(line) => println!("{}", render_incoming(line.trim(), &cipher)),
                Err(e) => {
                    error!("Read error from server: {}", e);
                    break;
                }
            }
        }
        println!("Connection to server closed.");
        std::process::exit(0);
    });

    println!("{}", USAGE);

    while let Some(input) = stdin.next_line().await? {
        match prepare_outgoing(&input, &cipher) {
            Outgoing::Send(line) => sink.send(line).await?,
            Outgoing::Quit => {
                sink.send("QUIT".to_string()).await?;
                break;
            }
            Outgoing::Usage => println!("{}", USAGE),
            Outgoing::Ignore => {}
        }
    }

    // Let the server close its side so pending lines get printed
    sink.close().await?;
    let _ = receiver.await;
    debug!("Client finished");

    Ok(())
}
