pub mod prelude;

pub mod countries;
pub mod roles;
pub mod user_password_history;
pub mod user_roles;
pub mod user_sessions;
pub mod user_tokens;
pub mod users;
