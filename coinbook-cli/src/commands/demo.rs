//! Demo command - write the demo wallet

use std::path::PathBuf;

use anyhow::Result;

use coinbook_core::services::LogEvent;

use super::{get_context, get_logger, log_event};
use crate::output;

pub fn run(path: PathBuf) -> Result<()> {
    let logger = get_logger();
    log_event(&logger, LogEvent::command("demo"));

    let ctx = get_context()?;
    let wallet = ctx.write_demo_wallet(&path)?;

    output::success(&format!(
        "Demo wallet with {} transactions written to {}",
        wallet.len(),
        path.display()
    ));
    println!(
        "Try 'cb show {}' or 'cb export {} export.csv --rate 10'.",
        path.display(),
        path.display()
    );
    Ok(())
}
