use std::io::IsTerminal;
use std::io::Write;
use std::path::Path;

use anyhow::Context;
use anyhow::Result;
use nexia_console::domain::models::RuntimeStatus;
use nexia_console::Console;
use tokio::fs;
use tokio::io::AsyncBufReadExt;
use tokio::io::BufReader;

/// Writes log fragments appended since `printed` to stdout.
fn flush_log(console: &Console, printed: &mut usize) -> Result<()> {
    let text = console.log().since(*printed);
    *printed = console.log().len();
    if text.is_empty() {
        return Ok(());
    }

    let mut stdout = std::io::stdout().lock();
    stdout.write_all(text.as_bytes())?;
    stdout.flush()?;

    return Ok(());
}

/// Runs the file once without the terminal UI.
///
/// The log is streamed to stdout as it grows and input requests are answered
/// with lines from stdin. End of input abandons the pending request.
pub async fn run(console: &mut Console, source_path: &Path) -> Result<()> {
    let source = fs::read_to_string(source_path)
        .await
        .with_context(|| format!("could not read {}", source_path.display()))?;

    let mut stdin = BufReader::new(tokio::io::stdin()).lines();
    let mut printed = 0;
    let mut started = false;

    while let Some(event) = console.recv().await {
        let outcome = console.handle_event(event);

        if !started && console.is_ready() {
            started = true;
            if console.run(&source).is_err() {
                flush_log(console, &mut printed)?;
                return Ok(());
            }
        }
        flush_log(console, &mut printed)?;

        if outcome.is_some() {
            return Ok(());
        }

        if let RuntimeStatus::Failed(reason) = console.runtime_status() {
            tracing::error!(reason = %reason, "headless run aborted");
            return Ok(());
        }

        if console.is_awaiting_input() {
            match stdin.next_line().await? {
                Some(line) => {
                    console.submit_input_line(&line)?;
                    if std::io::stdin().is_terminal() {
                        // The terminal already shows the typed line.
                        printed = console.log().len();
                    }
                }
                None => {
                    tracing::warn!("stdin closed while the program was waiting for input");
                    console.clear();
                    eprintln!("❌ Input request was abandoned: end of input");
                    return Ok(());
                }
            }
        }
    }

    return Ok(());
}
