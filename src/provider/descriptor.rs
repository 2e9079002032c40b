//! Provider descriptor data structures shared by the grant and the REST client.

/// Builder API for assembling provider descriptors.
pub mod builder;
/// Provider-specific quirk toggles.
pub mod quirks;

pub use builder::*;
pub use quirks::*;

// self
use crate::{_prelude::*, auth::ProviderId};

/// OAuth grant type presented to the token endpoint for service-account assertions.
pub const JWT_BEARER_GRANT: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";

/// Endpoint set declared by a provider descriptor.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderEndpoints {
	/// Token endpoint accepting JWT bearer assertions.
	pub token: Url,
	/// Base path of the REST API (e.g. `https://demo.docusign.net/restapi`).
	pub api: Url,
}

/// Immutable provider descriptor consumed by the broker and the REST client.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderDescriptor {
	/// Descriptor identifier.
	pub id: ProviderId,
	/// Endpoint definitions exposed by the provider.
	pub endpoints: ProviderEndpoints,
	/// `aud` claim expected in assertions (the authorization server host).
	pub audience: String,
	/// Provider-specific quirks.
	pub quirks: ProviderQuirks,
}
impl ProviderDescriptor {
	/// Creates a new builder for the provided identifier.
	pub fn builder(id: ProviderId) -> ProviderDescriptorBuilder {
		ProviderDescriptorBuilder::new(id)
	}

	/// Resolves a path below the REST API base, keeping the base path prefix intact.
	pub fn api_url(&self, segments: &[&str]) -> Result<Url, url::ParseError> {
		let mut url = self.endpoints.api.clone();

		{
			let mut path = url
				.path_segments_mut()
				.map_err(|_| url::ParseError::RelativeUrlWithCannotBeABaseBase)?;

			path.pop_if_empty();
			path.extend(segments);
		}

		Ok(url)
	}
}
