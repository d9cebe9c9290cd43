//! Terminal chat client for the ChaturAI question-answering service.

pub mod app;
pub mod client;
pub mod config;
pub mod handler;
pub mod markdown;
pub mod session;
pub mod state;
pub mod theme;
pub mod tui;
pub mod ui;

pub use client::{AnswerClient, AnswerService, AskError, AskResponse};
pub use config::Config;
pub use session::{ChatSession, Resolution};
pub use state::{Message, Role, Theme};
