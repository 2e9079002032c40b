//! Provider-facing descriptors (data) and strategies (behavior).
//!
//! `descriptor` exposes validated metadata (`ProviderDescriptor`) covering HTTPS-only
//! authorization and REST endpoints, the assertion audience, and provider quirks (scope
//! delimiter, implicit impersonation scope). `strategy` defines [`ProviderStrategy`], an
//! HTTP-client-agnostic hook used by the JWT grant to augment outgoing token requests and map
//! error responses into the broker error taxonomy.

pub mod descriptor;
pub mod strategy;

pub use descriptor::*;
pub use strategy::*;
