//! chatter - terminal client for chatterd.
//!
//! Prompts for credentials, performs the salted challenge-response
//! handshake, then mirrors stdin to the server and server lines to stdout
//! until either side closes.

use chatterd::auth::salted_response;
use futures_util::{SinkExt, StreamExt};
use std::io::{BufRead, Write};
use tokio::io::AsyncBufReadExt;
use tokio::net::TcpStream;
use tokio_util::codec::{Framed, LinesCodec};

fn prompt(label: &str) -> anyhow::Result<String> {
    println!("{label}");
    std::io::stdout().flush()?;
    let mut line = String::new();
    std::io::stdin().lock().read_line(&mut line)?;
    Ok(line.trim_end_matches(['\r', '\n']).to_string())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let addr = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "127.0.0.1:36963".to_string());

    let username = prompt("Username:")?;
    let password = prompt("Password:")?;

    let stream = match TcpStream::connect(&addr).await {
        Ok(stream) => stream,
        Err(e) => {
            println!("A network error occurred ({e}). Goodbye.");
            return Ok(());
        }
    };
    let mut framed = Framed::new(stream, LinesCodec::new());

    // Challenge-response handshake.
    framed.send(username).await?;
    let authkey = match framed.next().await {
        Some(Ok(line)) => line,
        _ => anyhow::bail!("server closed during handshake"),
    };
    framed.send(salted_response(&authkey, &password)).await?;

    let verdict = match framed.next().await {
        Some(Ok(line)) => line,
        _ => anyhow::bail!("server closed during handshake"),
    };
    println!("{verdict}");
    if verdict != "AUTHORIZED" {
        return Ok(());
    }

    let mut stdin = tokio::io::BufReader::new(tokio::io::stdin()).lines();
    loop {
        tokio::select! {
            from_server = framed.next() => match from_server {
                Some(Ok(line)) => println!("{line}"),
                Some(Err(e)) => {
                    println!("A network error occurred ({e}). Goodbye.");
                    break;
                }
                None => {
                    println!("Server closed the connection. Goodbye.");
                    break;
                }
            },
            typed = stdin.next_line() => match typed {
                Ok(Some(line)) => framed.send(line).await?,
                Ok(None) => break,
                Err(e) => {
                    println!("An error occurred: {e}");
                    break;
                }
            },
        }
    }

    Ok(())
}
