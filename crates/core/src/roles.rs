//! Well-known role name constants carried in the `role` token claim.

pub const ROLE_ADMIN: &str = "admin";
