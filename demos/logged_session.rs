//! Session transcript example
//!
//! Mirrors everything an `expect` consumes to an indented transcript on
//! stdout. Run with `RUST_LOG=ptyexpect=debug` to also see the session
//! lifecycle events.

use ptyexpect::{Pattern, Session, WriterSink};
use std::time::Duration;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    println!("ptyexpect - Logged Session Example");
    println!("{}", "=".repeat(50));

    println!("\nTranscript (indented) follows:");
    let mut session = Session::builder()
        .timeout(Duration::from_secs(10))
        .eol("\r")
        .logger(WriterSink::new(std::io::stdout()), "    ")
        .spawn(["bash", "--noediting"])?;

    let prompt = Pattern::regex(r"[#\$] ")?;
    session.expect(&prompt).await?;

    session.send("echo transcripts are cheap").await?;
    session.expect(&prompt).await?;

    session.send("date").await?;
    session.expect(&prompt).await?;

    // Closing flushes the transcript and ends it on a fresh line.
    session.close(true)?;

    println!("\n✓ Logged session example complete!");

    Ok(())
}
