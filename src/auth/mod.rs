pub mod extractor;
pub mod jwt;

pub use extractor::{AuthenticatedUser, RefreshIdentity};
pub use jwt::{Claims, JwtKeys, TokenType};
