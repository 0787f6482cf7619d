pub mod authorization_code;
pub mod binding;
pub mod client;
pub mod consent;
pub mod owner;
pub mod token;

pub use authorization_code::{AuthorizationCodeStore, CodeConsumeError};
pub use binding::TokenBindingStore;
pub use client::ClientRegistry;
pub use consent::ConsentStore;
pub use owner::OwnerRegistry;
pub use token::TokenStore;
