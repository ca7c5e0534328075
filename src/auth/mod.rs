pub mod jwt;
pub mod password;

pub use jwt::{Claims, RoleClaim, TokenIssuer};
