pub mod auth;
pub mod config;
pub mod pr;
pub mod utils;
pub mod version;
pub mod workitem;
