//! Service-account credentials and JWT assertion signing.

// std
use std::path::Path;
// crates.io
use jsonwebtoken::{Algorithm, EncodingKey, Header};
// self
use crate::{
	_prelude::*,
	auth::{IntegrationKey, UserId},
	error::ConfigError,
};

/// RSA private key used to sign assertions; never printed.
#[derive(Clone)]
pub struct SigningKey(EncodingKey);
impl SigningKey {
	/// Parses a PKCS#1 or PKCS#8 RSA private key in PEM form.
	pub fn from_pem(pem: &[u8]) -> Result<Self, ConfigError> {
		EncodingKey::from_rsa_pem(pem).map(Self).map_err(ConfigError::InvalidPrivateKey)
	}

	/// Reads and parses a PEM key file.
	pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
		let path = path.as_ref();
		let pem = std::fs::read(path).map_err(|source| ConfigError::PrivateKeyRead {
			path: path.display().to_string(),
			source,
		})?;

		Self::from_pem(&pem)
	}
}
impl Debug for SigningKey {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str("SigningKey(<redacted>)")
	}
}

/// Claims carried by a JWT user-grant assertion.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssertionClaims {
	/// Integration key of the service account.
	pub iss: String,
	/// Impersonated user.
	pub sub: String,
	/// Authorization server host.
	pub aud: String,
	/// Issued-at, seconds since the Unix epoch.
	pub iat: i64,
	/// Expiry, seconds since the Unix epoch.
	pub exp: i64,
	/// Delimited scope list.
	pub scope: String,
}

/// Long-lived credentials exchanged for short-lived bearer tokens.
#[derive(Clone, Debug)]
pub struct ServiceAccount {
	/// OAuth client identifier.
	pub integration_key: IntegrationKey,
	/// User impersonated by every token.
	pub user_id: UserId,
	signing_key: SigningKey,
}
impl ServiceAccount {
	/// Bundles the three credentials of a JWT user grant.
	pub fn new(integration_key: IntegrationKey, user_id: UserId, signing_key: SigningKey) -> Self {
		Self { integration_key, user_id, signing_key }
	}

	/// Builds the unsigned claim set for an assertion issued at `issued_at`.
	pub fn claims(
		&self,
		audience: &str,
		scope: &str,
		issued_at: OffsetDateTime,
		lifetime: Duration,
	) -> AssertionClaims {
		AssertionClaims {
			iss: self.integration_key.to_string(),
			sub: self.user_id.to_string(),
			aud: audience.to_owned(),
			iat: issued_at.unix_timestamp(),
			exp: (issued_at + lifetime).unix_timestamp(),
			scope: scope.to_owned(),
		}
	}

	/// Signs an RS256 assertion.
	pub fn assertion(
		&self,
		audience: &str,
		scope: &str,
		issued_at: OffsetDateTime,
		lifetime: Duration,
	) -> Result<String, ConfigError> {
		let claims = self.claims(audience, scope, issued_at, lifetime);

		jsonwebtoken::encode(&Header::new(Algorithm::RS256), &claims, &self.signing_key.0)
			.map_err(ConfigError::AssertionSigning)
	}
}

#[cfg(test)]
mod tests {
	// crates.io
	use jsonwebtoken::{DecodingKey, Validation};
	use time::macros;
	// self
	use super::*;

	const PRIVATE_PEM: &str = include_str!("../../tests/fixtures/service_rsa.pem");
	const PUBLIC_PEM: &str = include_str!("../../tests/fixtures/service_rsa.pub.pem");

	fn account() -> ServiceAccount {
		ServiceAccount::new(
			IntegrationKey::new("ik-123").expect("Integration key fixture should be valid."),
			UserId::new("user-456").expect("User fixture should be valid."),
			SigningKey::from_pem(PRIVATE_PEM.as_bytes()).expect("Private key fixture should parse."),
		)
	}

	#[test]
	fn assertion_verifies_with_public_key() {
		let issued_at = OffsetDateTime::now_utc();
		let token = account()
			.assertion("account-d.example.com", "impersonation signature", issued_at, Duration::hours(2))
			.expect("Assertion should be signed.");
		let mut validation = Validation::new(Algorithm::RS256);

		validation.set_audience(&["account-d.example.com"]);

		let decoded = jsonwebtoken::decode::<AssertionClaims>(
			&token,
			&DecodingKey::from_rsa_pem(PUBLIC_PEM.as_bytes()).expect("Public key should parse."),
			&validation,
		)
		.expect("Assertion should verify against the fixture public key.");

		assert_eq!(decoded.claims.iss, "ik-123");
		assert_eq!(decoded.claims.sub, "user-456");
		assert_eq!(decoded.claims.scope, "impersonation signature");
		assert_eq!(decoded.claims.exp - decoded.claims.iat, 7_200);
	}

	#[test]
	fn claims_use_unix_seconds() {
		let claims = account().claims(
			"aud",
			"signature",
			macros::datetime!(1970-01-01 00:16:40 UTC),
			Duration::hours(1),
		);

		assert_eq!(claims.iat, 1_000);
		assert_eq!(claims.exp, 4_600);
	}

	#[test]
	fn invalid_keys_are_rejected_and_redacted() {
		assert!(matches!(
			SigningKey::from_pem(b"not a key"),
			Err(ConfigError::InvalidPrivateKey(_))
		));
		assert!(matches!(
			SigningKey::from_file("/definitely/missing/private.key"),
			Err(ConfigError::PrivateKeyRead { .. })
		));
		assert_eq!(format!("{:?}", account().signing_key), "SigningKey(<redacted>)");
	}
}
