mod app;
mod ws_handler;

pub use app::*;
pub use ws_handler::*;
