pub use super::countries::Entity as Countries;
pub use super::roles::Entity as Roles;
pub use super::user_password_history::Entity as UserPasswordHistory;
pub use super::user_roles::Entity as UserRoles;
pub use super::user_sessions::Entity as UserSessions;
pub use super::user_tokens::Entity as UserTokens;
pub use super::users::Entity as Users;
