//! Session token records, lifecycle helpers, and builders.

// self
use crate::{
	_prelude::*,
	auth::{ScopeSet, token::secret::TokenSecret},
};

/// Lifecycle status of a session's credential.
///
/// `Active -> Expired` happens purely with time; there is no transition code, the status is
/// re-derived from the clock on every check.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum TokenStatus {
	/// The session has never acquired a token.
	Missing,
	/// Token is usable.
	Active,
	/// Token reached its (margin-adjusted) expiry instant.
	Expired,
}
impl TokenStatus {
	/// Derives the status of an optional record at `instant`.
	pub fn of(record: Option<&TokenRecord>, instant: OffsetDateTime) -> Self {
		match record {
			None => Self::Missing,
			Some(record) => record.status_at(instant),
		}
	}

	/// Returns `true` when the credential may be used without acquisition.
	pub fn is_usable(self) -> bool {
		matches!(self, Self::Active)
	}
}

/// Errors produced by [`TokenRecordBuilder`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ThisError)]
pub enum TokenRecordBuilderError {
	/// Issued when no access token value was provided.
	#[error("Access token is required.")]
	MissingAccessToken,
	/// Issued when no expiry (absolute or relative) was configured.
	#[error("Expiry must be supplied via expires_at or expires_in.")]
	MissingExpiry,
	/// The declared lifetime does not outlast the safety margin.
	#[error("Lifetime of {lifetime_secs}s does not exceed the {margin_secs}s safety margin.")]
	LifetimeWithinMargin {
		/// Declared lifetime in seconds.
		lifetime_secs: i64,
		/// Safety margin in seconds.
		margin_secs: i64,
	},
}

/// Bearer credential held for one session.
#[derive(Serialize, Deserialize, Clone)]
pub struct TokenRecord {
	/// Scopes requested when the token was minted.
	pub scope: ScopeSet,
	/// Access token secret; callers must avoid logging it.
	pub access_token: TokenSecret,
	/// Instant the token was acquired.
	pub issued_at: OffsetDateTime,
	/// Instant after which the token must be treated as invalid.
	pub expires_at: OffsetDateTime,
}
impl TokenRecord {
	/// Margin subtracted from provider-declared lifetimes so a token never expires mid-request.
	pub const SAFETY_MARGIN: Duration = Duration::seconds(60);

	/// Returns a builder for constructing records.
	pub fn builder(scope: ScopeSet) -> TokenRecordBuilder {
		TokenRecordBuilder::new(scope)
	}

	/// Computes the lifecycle status at a given instant.
	pub fn status_at(&self, instant: OffsetDateTime) -> TokenStatus {
		if instant >= self.expires_at {
			return TokenStatus::Expired;
		}

		TokenStatus::Active
	}

	/// Time left before expiry at `instant`, clamped to zero.
	pub fn remaining_at(&self, instant: OffsetDateTime) -> Duration {
		let remaining = self.expires_at - instant;

		if remaining.is_negative() { Duration::ZERO } else { remaining }
	}
}
impl Debug for TokenRecord {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("TokenRecord")
			.field("scope", &self.scope)
			.field("access_token", &"<redacted>")
			.field("issued_at", &self.issued_at)
			.field("expires_at", &self.expires_at)
			.finish()
	}
}

/// Builder for [`TokenRecord`].
#[derive(Clone, Debug)]
pub struct TokenRecordBuilder {
	scope: ScopeSet,
	access_token: Option<TokenSecret>,
	issued_at: Option<OffsetDateTime>,
	expires_at: Option<OffsetDateTime>,
	expires_in: Option<Duration>,
	safety_margin: Duration,
}
impl TokenRecordBuilder {
	fn new(scope: ScopeSet) -> Self {
		Self {
			scope,
			access_token: None,
			issued_at: None,
			expires_at: None,
			expires_in: None,
			safety_margin: Duration::ZERO,
		}
	}

	/// Sets the issued-at instant.
	pub fn issued_at(mut self, instant: OffsetDateTime) -> Self {
		self.issued_at = Some(instant);

		self
	}

	/// Convenience helper that stamps `issued_at` with the current clock.
	pub fn issued_now(self) -> Self {
		self.issued_at(OffsetDateTime::now_utc())
	}

	/// Sets an absolute expiry instant. Takes precedence over [`expires_in`](Self::expires_in).
	pub fn expires_at(mut self, instant: OffsetDateTime) -> Self {
		self.expires_at = Some(instant);

		self
	}

	/// Sets the provider-declared lifetime, counted from the issued instant.
	pub fn expires_in(mut self, duration: Duration) -> Self {
		self.expires_in = Some(duration);

		self
	}

	/// Shortens a relative lifetime by `margin`; the lifetime must strictly exceed it.
	pub fn safety_margin(mut self, margin: Duration) -> Self {
		self.safety_margin = if margin.is_negative() { Duration::ZERO } else { margin };

		self
	}

	/// Provides the access token value.
	pub fn access_token(mut self, token: impl Into<String>) -> Self {
		self.access_token = Some(TokenSecret::new(token));

		self
	}

	/// Consumes the builder and produces a [`TokenRecord`].
	pub fn build(self) -> Result<TokenRecord, TokenRecordBuilderError> {
		let access_token = self.access_token.ok_or(TokenRecordBuilderError::MissingAccessToken)?;
		let issued_at = self.issued_at.unwrap_or_else(OffsetDateTime::now_utc);
		let expires_at = match (self.expires_at, self.expires_in) {
			(Some(instant), _) => instant,
			(None, Some(lifetime)) => {
				if lifetime <= self.safety_margin {
					return Err(TokenRecordBuilderError::LifetimeWithinMargin {
						lifetime_secs: lifetime.whole_seconds(),
						margin_secs: self.safety_margin.whole_seconds(),
					});
				}

				issued_at + (lifetime - self.safety_margin)
			},
			(None, None) => return Err(TokenRecordBuilderError::MissingExpiry),
		};

		Ok(TokenRecord { scope: self.scope, access_token, issued_at, expires_at })
	}
}
