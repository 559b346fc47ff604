//! IRC Relay Modules
//!
//! Optional command modules loaded by the relay at startup.

pub mod bot;

pub use bot::BotModule;

use relayircd_core::{Error, Module, Result};

/// Build a module by its configured name
pub fn create_module(name: &str) -> Result<Box<dyn Module>> {
    match name {
        "bot" => Ok(Box::new(BotModule::new())),
        other => Err(Error::Module(format!("Unknown module: {}", other))),
    }
}
