//! Demonstrates the refreshing IAM strategy against a mock token-exchange endpoint, reusing the
//! cached ticket across calls inside the staleness threshold.
//!
//! Run with `--features test` so the crate's test prelude (mock identity + insecure transport)
//! is available.

// crates.io
use color_eyre::Result;
use httpmock::prelude::*;
// self
use iam_ticket_broker::{
	_preludet::{build_test_strategy, test_identity},
	exchange::ExchangeDescriptor,
	policy::RefreshPolicy,
	strategy::AuthStrategy,
	url::Url,
};

#[tokio::main]
async fn main() -> Result<()> {
	color_eyre::install()?;

	let server = MockServer::start_async().await;
	let token_mock = server
		.mock_async(|when, then| {
			when.method(POST).path("/v1/tokens");
			then.status(200)
				.header("content-type", "application/json")
				.body("{\"token\":\"demo-ticket\"}");
		})
		.await;
	let descriptor = ExchangeDescriptor::builder(Url::parse(&server.url("/v1/tokens"))?)
		.audience("https://iam.demo/v1/tokens")
		.build()?;
	let strategy = build_test_strategy(descriptor, RefreshPolicy::default());

	println!("Signing as: {}.", test_identity().account);

	// Both calls resolve from a single exchange round-trip.
	for round in 1..=2 {
		let metadata = strategy.auth_metadata().await?;

		println!("Call {round} metadata: {metadata:?}.");
	}

	token_mock.assert_async().await;

	println!("Exchange round-trips: {}.", strategy.refresh_metrics.attempts());

	Ok(())
}
