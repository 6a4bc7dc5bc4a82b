pub mod admin;
pub mod assets;
pub mod auth;
pub mod home;
pub mod posts;
pub mod profile;
