pub mod session;

pub use session::{Session, SessionUser, require_session};
