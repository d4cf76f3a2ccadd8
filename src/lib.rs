//! Postboard Backend Library
//!
//! Token authentication and role-based authorization in front of a small
//! users/posts/comments API. Exposes every module for the binary and tests.

pub mod api;
pub mod auth;
pub mod config;
pub mod middleware;
pub mod store;
