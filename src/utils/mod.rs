pub mod cookies;
pub mod jwt;
pub mod multipart;
pub mod password;
pub mod response;
pub mod validation;

pub use jwt::*;
pub use password::*;
pub use response::*;
