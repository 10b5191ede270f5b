//! Admin credentials: redacted secrets, expiring admin tokens, and the sources that mint them.

pub mod secret;
pub mod source;
pub mod token;

pub use secret::*;
pub use source::*;
pub use token::*;
