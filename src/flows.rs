//! Session-scoped token acquisition powered by the JWT grant facade.

pub mod common;
pub mod jwt_grant;

mod metrics;

pub use common::*;
pub use metrics::AcquisitionMetrics;

// self
use crate::{
	_prelude::*,
	auth::SessionId,
	http::{ReqwestHttpClient, TokenHttpClient},
	oauth::{ReqwestTransportErrorMapper, ServiceAccount, TransportErrorMapper},
	provider::{ProviderDescriptor, ProviderStrategy},
	store::SessionStore,
};

/// Broker specialized for the crate's default reqwest transport stack.
pub type ReqwestBroker = Broker<ReqwestHttpClient, ReqwestTransportErrorMapper>;

/// Hands out per-session bearer tokens for a single provider descriptor.
///
/// The broker owns the HTTP client, session store, descriptor, and service account so
/// request handlers only ever ask for "a usable token for this session". A per-session
/// guard serializes acquisitions so concurrent requests from one browser never mint two
/// tokens, while different sessions proceed independently.
#[derive(Clone)]
pub struct Broker<C, M>
where
	C: ?Sized + TokenHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	/// HTTP client wrapper used for every token request.
	pub http_client: Arc<C>,
	/// Mapper applied to transport-layer errors before surfacing them to callers.
	pub transport_mapper: Arc<M>,
	/// Session store holding one token record per browser session.
	pub store: Arc<dyn SessionStore>,
	/// Provider descriptor that defines endpoints and quirks.
	pub descriptor: ProviderDescriptor,
	/// Strategy responsible for provider-specific request adjustments and error mapping.
	pub strategy: Arc<dyn ProviderStrategy>,
	/// Credentials signed into every assertion.
	pub service_account: Arc<ServiceAccount>,
	/// Lifetime requested in each assertion.
	pub token_lifetime: Duration,
	/// Shared counters for acquisition outcomes.
	pub metrics: Arc<AcquisitionMetrics>,
	flow_guards: Arc<Mutex<HashMap<SessionId, Arc<AsyncMutex<()>>>>>,
}
impl<C, M> Broker<C, M>
where
	C: ?Sized + TokenHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	/// Lifetime requested when callers do not override it.
	pub const DEFAULT_TOKEN_LIFETIME: Duration = Duration::hours(2);

	/// Creates a broker that reuses the caller-provided transport + mapper pair.
	pub fn with_http_client(
		store: Arc<dyn SessionStore>,
		descriptor: ProviderDescriptor,
		strategy: Arc<dyn ProviderStrategy>,
		service_account: ServiceAccount,
		http_client: impl Into<Arc<C>>,
		mapper: impl Into<Arc<M>>,
	) -> Self {
		Self {
			http_client: http_client.into(),
			transport_mapper: mapper.into(),
			store,
			descriptor,
			strategy,
			service_account: Arc::new(service_account),
			token_lifetime: Self::DEFAULT_TOKEN_LIFETIME,
			metrics: Default::default(),
			flow_guards: Default::default(),
		}
	}

	/// Overrides the lifetime requested in each assertion.
	pub fn with_token_lifetime(mut self, lifetime: Duration) -> Self {
		self.token_lifetime = lifetime;

		self
	}

	/// Number of sessions currently holding a single-flight guard.
	pub fn guard_count(&self) -> usize {
		self.flow_guards.lock().len()
	}
}
impl Broker<ReqwestHttpClient, ReqwestTransportErrorMapper> {
	/// Creates a new broker that provisions its own reqwest-backed transport.
	pub fn new(
		store: Arc<dyn SessionStore>,
		descriptor: ProviderDescriptor,
		strategy: Arc<dyn ProviderStrategy>,
		service_account: ServiceAccount,
	) -> Self {
		Self::with_http_client(
			store,
			descriptor,
			strategy,
			service_account,
			ReqwestHttpClient::default(),
			Arc::new(ReqwestTransportErrorMapper),
		)
	}
}
impl<C, M> Debug for Broker<C, M>
where
	C: ?Sized + TokenHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("Broker")
			.field("descriptor", &self.descriptor)
			.field("service_account", &self.service_account)
			.field("token_lifetime", &self.token_lifetime)
			.finish()
	}
}
