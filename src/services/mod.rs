pub mod auth_service;
pub mod auth_service_impl;
pub use auth_service::{AuthError, AuthService, LoginResult};
pub use auth_service_impl::SeaOrmAuthService;

pub mod user_service;
pub mod user_service_impl;
pub use user_service::{RegisterUser, UserError, UserService};
pub use user_service_impl::SeaOrmUserService;

pub mod storage;
pub use storage::{LocalStorageService, StorageService, UploadResult, UploadedFile};
