//! Authentication state of the client.

mod session;

pub use session::{Session, SessionStore};
