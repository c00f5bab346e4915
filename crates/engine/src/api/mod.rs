//! Host-facing entry points: the chat command surface.

pub mod commands;

pub use commands::{handle, CommandContext, DistressCommand, DISABLED_MESSAGE};
