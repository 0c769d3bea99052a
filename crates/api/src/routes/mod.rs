//! Route handlers

pub mod auth;
pub mod oauth;
pub mod orders;
pub mod robots;
