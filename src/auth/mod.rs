pub mod extract;
pub mod password;
pub mod session;

pub use extract::{session_cookie, CurrentUser, MaybeUser};
pub use session::{SessionStore, SESSION_COOKIE};
