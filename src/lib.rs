pub mod config;
pub mod core;
pub mod conversation;
pub mod persona;
pub mod store;

// Gateways to the language model
pub mod llm;

// Chat state, lifecycle and streaming turns
pub mod session;

// Navigation shell and the terminal front-end
pub mod cli;
pub mod shell;

pub mod logging;
