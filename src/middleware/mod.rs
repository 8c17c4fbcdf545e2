pub mod auth;
pub mod rate_limit;

pub use auth::{HouseholdKey, JwtAuth};
pub use rate_limit::RateLimit;
