//! Auth-domain identifiers, service-account identity material, and ticket models.

pub mod id;
pub mod identity;
pub mod token;

pub use id::*;
pub use identity::*;
pub use token::*;
