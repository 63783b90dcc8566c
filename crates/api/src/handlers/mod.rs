//! REST-Handler Module

pub mod admin;
pub mod auth;
pub mod shouts;
pub mod system;
pub mod users;
