pub mod auth;
pub mod contributors;
pub mod files;
pub mod labels;
pub mod users;
