//! Rate command - manage the stored exchange rate

use anyhow::Result;
use clap::Subcommand;
use rust_decimal::Decimal;

use coinbook_core::services::LogEvent;

use super::{get_context, get_logger, log_event};
use crate::output;

#[derive(Subcommand)]
pub enum RateCommands {
    /// Store the rate for the configured currency (fiat units per native unit)
    Set {
        rate: Decimal,
    },
    /// Forget the stored rate
    Clear,
    /// Show the stored rate
    Show {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

pub fn run(command: RateCommands) -> Result<()> {
    let logger = get_logger();
    let mut ctx = get_context()?;

    match command {
        RateCommands::Set { rate } => {
            log_event(&logger, LogEvent::command("rate set"));
            ctx.converter.set_rate(rate)?;
            ctx.config.exchange_rate = Some(rate);
            ctx.save_config()?;

            let currency = ctx.converter.currency();
            log_event(&logger, LogEvent::rate_set(currency.code));
            output::success(&format!("Exchange rate set: 1 native unit = {} {}", rate, currency.code));
        }
        RateCommands::Clear => {
            log_event(&logger, LogEvent::command("rate clear"));
            ctx.converter.clear_rate();
            ctx.config.exchange_rate = None;
            ctx.save_config()?;
            output::success("Exchange rate cleared");
        }
        RateCommands::Show { json } => {
            let rate = ctx.converter.rate();
            if json {
                println!("{}", serde_json::to_string_pretty(&rate)?);
            } else {
                match rate {
                    Some(r) => println!("1 native unit = {} {}", r.rate, r.currency.code),
                    None => output::warning("No exchange rate set"),
                }
            }
        }
    }

    Ok(())
}
