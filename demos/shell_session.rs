//! Scripted shell session example

use ptyexpect::{Pattern, Session};
use std::time::Duration;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("ptyexpect - Shell Session Example");
    println!("{}", "=".repeat(50));

    // Start an interactive bash without line editing, so the terminal
    // stays free of readline control sequences.
    println!("\nStarting bash...");
    let mut session = Session::builder()
        .timeout(Duration::from_secs(10))
        .eol("\r")
        .pty_size(24, 80)
        .spawn(["bash", "--noediting"])?;

    // Wait for the first prompt before sending anything.
    let prompt = Pattern::regex(r"[#\$] ")?;
    session.expect(&prompt).await?;
    println!("✓ Got shell prompt");

    // Run a command and collect everything up to the next prompt.
    println!("\nSending: echo Hello from ptyexpect");
    session.send("echo Hello from ptyexpect").await?;
    let result = session.expect(&prompt).await?;
    println!("✓ Command output:");
    for line in result.before.lines() {
        if !line.trim().is_empty() {
            println!("  {}", line);
        }
    }

    println!("\nSending: pwd");
    session.send("pwd").await?;
    let result = session.expect(&prompt).await?;
    println!("✓ Working directory:");
    for line in result.before.lines() {
        if !line.trim().is_empty() && !line.contains("pwd") {
            println!("  {}", line);
        }
    }

    // Probe for output that may or may not show up, without disturbing
    // the session when it does not.
    let warning = Pattern::literal("warning")?;
    match session
        .try_expect(&warning, Some(Duration::from_millis(100)))
        .await?
    {
        Some(m) => println!("\n✗ Shell printed a warning: {}", m.after),
        None => println!("\n✓ No warnings from the shell"),
    }

    println!("\nClosing session...");
    session.close(true)?;

    println!("\n✓ Shell session example complete!");

    Ok(())
}
