pub mod authorization_code;
pub mod client;
pub mod consent;
pub mod grant;
pub mod owner;
pub mod token;

pub use authorization_code::*;
pub use client::*;
pub use consent::*;
pub use grant::*;
pub use owner::*;
pub use token::*;
