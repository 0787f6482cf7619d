pub mod authorization;
pub mod grant;
pub mod introspection;
pub mod revocation;

pub use authorization::{AuthorizationService, AuthorizeOutcome, ConsentChallenge};
pub use grant::GrantService;
pub use introspection::IntrospectionService;
pub use revocation::RevocationService;
