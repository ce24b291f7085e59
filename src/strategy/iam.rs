//! Refreshing IAM-ticket strategy with singleflight refresh and generation-guarded installs.
//!
//! The strategy caches a single `(ticket, issued_at)` pair and retires it once the configured
//! staleness threshold elapses. Refreshes are serialized behind an async gate: the first caller
//! to observe staleness performs the exchange while concurrent observers wait on the gate,
//! re-check the cache on admission, and reuse the winner's ticket instead of issuing their own
//! round-trip. Installs are additionally checked against the generation observed at admission so
//! a superseded exchange result can never clobber a newer ticket.

mod metrics;

pub use metrics::RefreshMetrics;

// self
use crate::{
	_prelude::*,
	assertion::AssertionSigner,
	auth::{CachedTicket, ServiceAccountIdentity, TicketSecret},
	exchange::{ExchangeDescriptor, ExchangeRequest, TokenExchangeClient},
	metadata::AuthMetadata,
	obs::{self, AuthKind, AuthOutcome, AuthSpan},
	policy::RefreshPolicy,
	strategy::{AuthFuture, AuthStrategy},
};
#[cfg(feature = "reqwest")] use crate::exchange::ReqwestExchangeClient;

#[derive(Debug, Default)]
struct TicketCache {
	ticket: Option<CachedTicket>,
	generation: u64,
}

#[cfg(feature = "reqwest")]
/// Strategy specialized for the crate's default reqwest transport.
pub type ReqwestIamTicketStrategy = IamTicketStrategy<ReqwestExchangeClient>;

/// Supplies per-call metadata carrying a currently-valid bearer ticket, transparently refreshing
/// it from the token-exchange endpoint when stale.
///
/// The strategy owns the signer, exchange descriptor, refresh policy, and cached ticket state so
/// callers only ever see [`auth_metadata`](AuthStrategy::auth_metadata). Cloning shares all
/// state, including the cache and the refresh gate.
#[derive(Clone)]
pub struct IamTicketStrategy<C>
where
	C: ?Sized + TokenExchangeClient,
{
	/// Shared counters for refresh outcomes.
	pub refresh_metrics: Arc<RefreshMetrics>,
	exchange_client: Arc<C>,
	descriptor: ExchangeDescriptor,
	signer: Arc<AssertionSigner>,
	policy: RefreshPolicy,
	cache: Arc<RwLock<TicketCache>>,
	refresh_gate: Arc<AsyncMutex<()>>,
}
impl<C> IamTicketStrategy<C>
where
	C: ?Sized + TokenExchangeClient,
{
	/// Creates a strategy that reuses the caller-provided exchange transport.
	///
	/// The identity's private key PEM is parsed eagerly; malformed material fails here rather
	/// than on the first refresh.
	pub fn with_exchange_client(
		identity: ServiceAccountIdentity,
		descriptor: ExchangeDescriptor,
		exchange_client: impl Into<Arc<C>>,
	) -> Result<Self> {
		let signer = AssertionSigner::new(&identity)?;

		Ok(Self {
			refresh_metrics: Default::default(),
			exchange_client: exchange_client.into(),
			descriptor,
			signer: Arc::new(signer),
			policy: RefreshPolicy::default(),
			cache: Default::default(),
			refresh_gate: Default::default(),
		})
	}

	/// Replaces the refresh policy after validating it.
	pub fn with_policy(mut self, policy: RefreshPolicy) -> Result<Self> {
		policy.validate()?;

		self.policy = policy;

		Ok(self)
	}

	/// Returns the active refresh policy.
	pub fn policy(&self) -> &RefreshPolicy {
		&self.policy
	}

	/// Returns the exchange descriptor the strategy was built with.
	pub fn descriptor(&self) -> &ExchangeDescriptor {
		&self.descriptor
	}

	/// Returns a snapshot of the cached ticket, if one has been issued.
	pub fn cached_ticket(&self) -> Option<CachedTicket> {
		self.cache.read().ticket.clone()
	}

	/// Returns the cached ticket when it is still fresh at the provided instant.
	fn fresh_ticket_at(&self, instant: OffsetDateTime) -> Option<TicketSecret> {
		self.cache
			.read()
			.ticket
			.as_ref()
			.filter(|ticket| !ticket.is_stale_at(instant, self.policy.staleness_threshold))
			.map(|ticket| ticket.secret.clone())
	}

	/// Returns the current ticket, performing a refresh when the cache is unissued or stale.
	pub async fn ticket(&self) -> Result<TicketSecret> {
		if let Some(ticket) = self.fresh_ticket_at(OffsetDateTime::now_utc()) {
			return Ok(ticket);
		}

		self.refresh().await
	}

	async fn refresh(&self) -> Result<TicketSecret> {
		let _admission = self.refresh_gate.lock().await;

		// A concurrent caller may have refreshed while this one waited on the gate.
		if let Some(ticket) = self.fresh_ticket_at(OffsetDateTime::now_utc()) {
			return Ok(ticket);
		}

		let admitted_generation = self.cache.read().generation;

		self.refresh_metrics.record_attempt();

		let now = OffsetDateTime::now_utc();
		let assertion = self
			.signer
			.sign(&self.descriptor.audience, now, self.policy.assertion_validity)
			.inspect_err(|_| self.refresh_metrics.record_failure())?;
		let response = self
			.exchange_client
			.exchange(
				&self.descriptor.endpoint,
				ExchangeRequest::new(assertion),
				self.policy.exchange_timeout,
			)
			.await
			.inspect_err(|_| self.refresh_metrics.record_failure())?;
		let secret = response
			.into_ticket()
			.inspect_err(|_| self.refresh_metrics.record_failure())?;
		let issued_at = OffsetDateTime::now_utc();
		let installed = {
			let mut cache = self.cache.write();

			if cache.generation == admitted_generation {
				cache.ticket = Some(CachedTicket::new(secret.clone(), issued_at));
				cache.generation += 1;

				secret
			} else {
				// Superseded while in flight; the newer install wins and this result is
				// discarded.
				cache.ticket.as_ref().map(|ticket| ticket.secret.clone()).unwrap_or(secret)
			}
		};

		self.refresh_metrics.record_success();

		Ok(installed)
	}
}
#[cfg(feature = "reqwest")]
impl IamTicketStrategy<ReqwestExchangeClient> {
	/// Creates a strategy with a reqwest transport honoring the descriptor's root CA.
	pub fn new(identity: ServiceAccountIdentity, descriptor: ExchangeDescriptor) -> Result<Self> {
		let exchange_client = ReqwestExchangeClient::from_descriptor(&descriptor)?;

		Self::with_exchange_client(identity, descriptor, exchange_client)
	}
}
impl<C> AuthStrategy for IamTicketStrategy<C>
where
	C: ?Sized + TokenExchangeClient,
{
	fn auth_metadata(&self) -> AuthFuture<'_> {
		const KIND: AuthKind = AuthKind::IamRefresh;

		let span = AuthSpan::new(KIND, "auth_metadata");

		Box::pin(async move {
			obs::record_auth_outcome(KIND, AuthOutcome::Attempt);

			let result = span
				.instrument(async move {
					let ticket = self.ticket().await?;

					Ok(AuthMetadata::for_ticket(&ticket))
				})
				.await;

			match &result {
				Ok(_) => obs::record_auth_outcome(KIND, AuthOutcome::Success),
				Err(_) => obs::record_auth_outcome(KIND, AuthOutcome::Failure),
			}

			result
		})
	}
}
impl<C> Debug for IamTicketStrategy<C>
where
	C: ?Sized + TokenExchangeClient,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("IamTicketStrategy")
			.field("descriptor", &self.descriptor)
			.field("policy", &self.policy)
			.field("ticket_cached", &self.cache.read().ticket.is_some())
			.finish()
	}
}

#[cfg(test)]
mod tests {
	// std
	use std::sync::atomic::{AtomicU64, Ordering};
	// self
	use super::*;
	use crate::{
		_preludet::test_identity,
		exchange::{ExchangeFuture, ExchangeResponse},
	};

	/// Scripted exchange transport: every call returns the configured token and counts hits.
	struct ScriptedExchange {
		token: Option<String>,
		hits: AtomicU64,
		delay: Option<std::time::Duration>,
	}
	impl ScriptedExchange {
		fn returning(token: &str) -> Self {
			Self { token: Some(token.into()), hits: AtomicU64::new(0), delay: None }
		}

		fn empty() -> Self {
			Self { token: None, hits: AtomicU64::new(0), delay: None }
		}

		fn hits(&self) -> u64 {
			self.hits.load(Ordering::SeqCst)
		}
	}
	impl TokenExchangeClient for ScriptedExchange {
		fn exchange<'a>(
			&'a self,
			_endpoint: &'a Url,
			_request: ExchangeRequest,
			_deadline: Duration,
		) -> ExchangeFuture<'a> {
			self.hits.fetch_add(1, Ordering::SeqCst);

			let token = self.token.clone();
			let delay = self.delay;

			Box::pin(async move {
				if let Some(delay) = delay {
					tokio::time::sleep(delay).await;
				}

				Ok(ExchangeResponse { token })
			})
		}
	}

	fn descriptor() -> ExchangeDescriptor {
		ExchangeDescriptor::builder(
			Url::parse("https://iam.example.com/v1/tokens")
				.expect("Endpoint fixture should parse."),
		)
		.build()
		.expect("Descriptor fixture should build.")
	}

	fn strategy(exchange: ScriptedExchange) -> IamTicketStrategy<ScriptedExchange> {
		IamTicketStrategy::with_exchange_client(test_identity(), descriptor(), exchange)
			.expect("Strategy fixture should build.")
	}

	#[tokio::test]
	async fn calls_within_threshold_reuse_the_cached_ticket() {
		let strategy = strategy(ScriptedExchange::returning("ticket-1"));

		for _ in 0..5 {
			let metadata = strategy
				.auth_metadata()
				.await
				.expect("Strategy call should succeed with a scripted transport.");

			assert_eq!(metadata.ticket(), Some("ticket-1"));
		}

		assert_eq!(strategy.exchange_client.hits(), 1);
		assert_eq!(strategy.refresh_metrics.attempts(), 1);
		assert_eq!(strategy.refresh_metrics.successes(), 1);
	}

	#[tokio::test]
	async fn zero_threshold_refreshes_every_call() {
		let strategy = strategy(ScriptedExchange::returning("ticket-2"))
			.with_policy(RefreshPolicy::default().with_staleness_threshold(Duration::ZERO))
			.expect("Zero-threshold policy should validate.");

		for _ in 0..3 {
			strategy.ticket().await.expect("Refresh should succeed.");
		}

		assert_eq!(strategy.exchange_client.hits(), 3);
	}

	#[tokio::test]
	async fn empty_token_surfaces_and_leaves_the_cache_untouched() {
		let strategy = strategy(ScriptedExchange::empty());
		let error =
			strategy.ticket().await.expect_err("Empty exchange response should fail the call.");

		assert!(matches!(error, Error::EmptyToken));
		assert!(strategy.cached_ticket().is_none());
		assert_eq!(strategy.refresh_metrics.failures(), 1);
	}

	#[tokio::test]
	async fn concurrent_stale_callers_share_one_refresh() {
		let exchange = ScriptedExchange {
			token: Some("ticket-shared".into()),
			hits: AtomicU64::new(0),
			delay: Some(std::time::Duration::from_millis(50)),
		};
		let strategy = strategy(exchange);
		let (a, b, c) =
			tokio::join!(strategy.ticket(), strategy.ticket(), strategy.ticket());

		assert_eq!(a.expect("First caller should succeed.").expose(), "ticket-shared");
		assert_eq!(b.expect("Second caller should succeed.").expose(), "ticket-shared");
		assert_eq!(c.expect("Third caller should succeed.").expose(), "ticket-shared");
		assert_eq!(strategy.exchange_client.hits(), 1);
	}

	#[tokio::test]
	async fn failed_refresh_keeps_the_stale_ticket_for_the_next_attempt() {
		let strategy = strategy(ScriptedExchange::returning("ticket-old"))
			.with_policy(RefreshPolicy::default().with_staleness_threshold(Duration::ZERO))
			.expect("Zero-threshold policy should validate.");

		strategy.ticket().await.expect("Seeding refresh should succeed.");

		let seeded =
			strategy.cached_ticket().expect("Cache should hold the seeded ticket.");

		// Swap in a failing transport sharing the same cache state.
		let failing = IamTicketStrategy {
			refresh_metrics: strategy.refresh_metrics.clone(),
			exchange_client: Arc::new(ScriptedExchange::empty()),
			descriptor: strategy.descriptor.clone(),
			signer: strategy.signer.clone(),
			policy: strategy.policy,
			cache: strategy.cache.clone(),
			refresh_gate: strategy.refresh_gate.clone(),
		};
		let error =
			failing.ticket().await.expect_err("Empty exchange response should fail the call.");

		assert!(matches!(error, Error::EmptyToken));

		let kept = failing.cached_ticket().expect("Failed refresh must not evict the cache.");

		assert_eq!(kept.secret.expose(), seeded.secret.expose());
		assert_eq!(kept.issued_at, seeded.issued_at);
	}
}
