pub mod authorize;
pub mod middleware;
pub mod oauth;
pub mod principal;
pub mod token;
