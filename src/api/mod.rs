pub mod admin;
pub mod health;
pub mod logs;
pub mod presence;
pub mod student;
