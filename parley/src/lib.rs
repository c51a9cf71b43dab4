//! Parley — terminal chat client library.

pub mod app;
pub mod bootstrap;
pub mod config;
pub mod credentials;
pub mod login;
pub mod reactor;
pub mod ui;
pub mod window;
