pub mod auth;
pub mod files;
pub mod labels;
pub mod shared;
pub mod users;
