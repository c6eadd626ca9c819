pub mod permission;

pub use permission::{get_current_user, revoke_session, CurrentUser};
