//! Module system for optional commands
//!
//! A module claims a set of command keywords. The server routes matching
//! lines to it and writes the lines it returns back to the invoking client.

use crate::{Client, Error, Message, Result};
use std::collections::HashMap;

/// Read-only server facts handed to a module call
#[derive(Debug, Clone, Copy)]
pub struct ModuleContext<'a> {
    /// Server name for reply prefixes
    pub server_name: &'a str,
}

/// Module trait that all modules must implement
pub trait Module {
    /// Module name
    fn name(&self) -> &str;

    /// Module version
    fn version(&self) -> &str;

    /// Command keywords this module handles
    fn commands(&self) -> &[&'static str];

    /// Handle one command line from a client.
    ///
    /// Returns framed lines to send back to that client.
    fn handle_command(
        &mut self,
        client: &Client,
        message: &Message,
        ctx: &ModuleContext<'_>,
    ) -> Result<Vec<String>>;
}

/// Owns loaded modules and maps keywords to them
#[derive(Default)]
pub struct ModuleManager {
    modules: Vec<Box<dyn Module>>,
    commands: HashMap<&'static str, usize>,
}

impl ModuleManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a module, claiming its keywords. Fails if any keyword is already
    /// owned by another module or appears in `reserved`.
    pub fn load(&mut self, module: Box<dyn Module>, reserved: &[&str]) -> Result<()> {
        for command in module.commands() {
            if reserved.contains(command) || self.commands.contains_key(command) {
                return Err(Error::Module(format!(
                    "Module {} cannot claim command {}: already registered",
                    module.name(),
                    command
                )));
            }
        }

        let index = self.modules.len();
        for command in module.commands() {
            self.commands.insert(*command, index);
        }
        tracing::info!("Loaded module {} v{}", module.name(), module.version());
        self.modules.push(module);
        Ok(())
    }

    pub fn handles(&self, command: &str) -> bool {
        self.commands.contains_key(command)
    }

    /// Route a command to its module; `None` if no module claims it
    pub fn dispatch(
        &mut self,
        client: &Client,
        message: &Message,
        ctx: &ModuleContext<'_>,
    ) -> Option<Result<Vec<String>>> {
        let index = *self.commands.get(message.command.as_str())?;
        let module = self.modules.get_mut(index)?;
        Some(module.handle_command(client, message, ctx))
    }

    pub fn module_names(&self) -> Vec<&str> {
        self.modules.iter().map(|m| m.name()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::ClientId;
    use crate::connection::MemoryTransport;

    struct EchoModule;

    impl Module for EchoModule {
        fn name(&self) -> &str {
            "echo"
        }

        fn version(&self) -> &str {
            "1.0"
        }

        fn commands(&self) -> &[&'static str] {
            &["ECHO"]
        }

        fn handle_command(
            &mut self,
            client: &Client,
            message: &Message,
            ctx: &ModuleContext<'_>,
        ) -> Result<Vec<String>> {
            Ok(vec![format!(
                ":{} NOTICE {} :{}\r\n",
                ctx.server_name,
                client.nick_or_star(),
                message.params.join(" ")
            )])
        }
    }

    #[test]
    fn test_load_and_dispatch() {
        let mut manager = ModuleManager::new();
        manager.load(Box::new(EchoModule), &["JOIN"]).unwrap();
        assert!(manager.handles("ECHO"));
        assert!(!manager.handles("echo"));
        assert_eq!(manager.module_names(), vec!["echo"]);

        let client = Client::new(ClientId(1), Box::new(MemoryTransport::new()), 512);
        let message = Message::parse("ECHO hi there").unwrap();
        let ctx = ModuleContext { server_name: "irc.test" };
        let lines = manager.dispatch(&client, &message, &ctx).unwrap().unwrap();
        assert_eq!(lines, vec![":irc.test NOTICE * :hi there\r\n"]);

        let other = Message::parse("NOPE").unwrap();
        assert!(manager.dispatch(&client, &other, &ctx).is_none());
    }

    #[test]
    fn test_duplicate_keyword_rejected() {
        let mut manager = ModuleManager::new();
        manager.load(Box::new(EchoModule), &[]).unwrap();
        assert!(manager.load(Box::new(EchoModule), &[]).is_err());

        let mut manager = ModuleManager::new();
        assert!(manager.load(Box::new(EchoModule), &["ECHO"]).is_err());
    }
}
