// Folio engine library
// Display-mode negotiation core

pub mod cli;
pub mod config;
pub mod game;
pub mod graphics;
pub mod platform;

pub use cli::Cli;
pub use config::Options;
pub use game::GameDescriptor;
pub use graphics::session::GraphicsSession;
