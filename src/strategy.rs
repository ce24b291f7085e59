//! Auth strategies producing per-call credential attachments.

pub mod iam;
pub mod static_token;

pub use iam::*;
pub use static_token::*;

// self
use crate::{_prelude::*, metadata::AuthMetadata};

/// Boxed future returned by [`AuthStrategy::auth_metadata`].
pub type AuthFuture<'a> = Pin<Box<dyn Future<Output = Result<AuthMetadata>> + 'a + Send>>;

/// Capability of producing a protocol-level credential attachment for one outbound call.
///
/// The surrounding driver invokes [`auth_metadata`](Self::auth_metadata) before issuing a
/// request and applies the returned attachment at the transport layer. Implementations must be
/// safe to share across concurrent driver tasks.
pub trait AuthStrategy
where
	Self: Send + Sync,
{
	/// Produces the credential attachment for one outbound call.
	fn auth_metadata(&self) -> AuthFuture<'_>;
}
