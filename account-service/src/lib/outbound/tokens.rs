pub mod jwt;

pub use jwt::JwtTokenManager;
