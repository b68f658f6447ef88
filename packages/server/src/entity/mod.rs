pub mod file;
pub mod label;
pub mod label_file;
pub mod user;
