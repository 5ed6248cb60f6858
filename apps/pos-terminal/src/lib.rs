//! # pos-terminal: Farma POS Operator Terminal
//!
//! Line-oriented front end for the pharmacy counter. Holds the session,
//! the current route and, inside the sales view, the cart and the payment
//! step; everything persistent lives behind the backend.
//!
//! ## Module Layout
//! ```text
//! src/
//! ├── main.rs       ◄─── clap args, tracing, startup
//! ├── lib.rs        ◄─── You are here
//! ├── config.rs     ◄─── TerminalConfig (defaults, TOML, env, CLI)
//! ├── error.rs      ◄─── AppError + ErrorCode
//! ├── router.rs     ◄─── Hash routes and role gating
//! ├── state/        ◄─── AppState, SalesState, search tickets
//! ├── commands/     ◄─── Command parsing and handlers
//! ├── view.rs       ◄─── Text rendering
//! ├── receipts.rs   ◄─── Receipt files and browser printing
//! ├── app.rs        ◄─── Command dispatch
//! └── repl.rs       ◄─── stdin loop
//! ```

pub mod app;
pub mod commands;
pub mod config;
pub mod error;
pub mod receipts;
pub mod repl;
pub mod router;
pub mod state;
pub mod view;

#[cfg(test)]
mod testing;

pub use app::App;
pub use config::TerminalConfig;
pub use error::{AppError, AppResult, ErrorCode};
