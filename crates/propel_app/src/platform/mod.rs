//! Terminal front-end: stands in for the extension popup and the web client.
mod app;
mod cli;
mod effects;
mod logging;
mod render;
mod settings;
mod web;

pub use app::run;
