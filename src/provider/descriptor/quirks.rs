// self
use crate::_prelude::*;

/// Provider-specific quirks that influence how the grant behaves.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderQuirks {
	/// Adds the `impersonation` scope to every assertion, which JWT user grants require.
	pub implicit_impersonation: bool,
	/// Character used to join scopes inside the assertion's `scope` claim.
	pub scope_delimiter: char,
}
impl Default for ProviderQuirks {
	fn default() -> Self {
		Self { implicit_impersonation: true, scope_delimiter: ' ' }
	}
}
