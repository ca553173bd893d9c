//! Bridge protocol handlers.

mod handlers;
mod register;

pub use register::register_handlers;
