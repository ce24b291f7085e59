//! Demonstrates wrapping a fixed bearer ticket and attaching it to outbound calls.

// crates.io
use color_eyre::Result;
// self
use iam_ticket_broker::strategy::{AuthStrategy, StaticTicketStrategy};

#[tokio::main]
async fn main() -> Result<()> {
	color_eyre::install()?;

	let strategy = StaticTicketStrategy::new("fixed-ticket-demo")?;
	let metadata = strategy.auth_metadata().await?;

	for (key, value) in metadata.iter() {
		println!("{key}: {value}.");
	}

	Ok(())
}
