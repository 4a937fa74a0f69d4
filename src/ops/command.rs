//! Runs arbitrary CLI commands on each firewall over SSH.

use super::{cancellable, close_session};
use crate::dispatch::{CancellationController, Operation, Target};
use crate::error::HostError;
use crate::ssh::{strip_echo, Connect, Shell};
use async_trait::async_trait;

/// Runs each command in order over one session and collects their output.
#[derive(Clone, Debug)]
pub struct RunCommands<C> {
    connector: C,
    commands: Vec<String>,
}

impl<C: Connect> RunCommands<C> {
    pub fn new(connector: C, commands: Vec<String>) -> Self {
        RunCommands {
            connector,
            commands,
        }
    }
}

#[async_trait]
impl<C: Connect> Operation for RunCommands<C> {
    type Payload = String;

    async fn run(
        &self,
        target: &Target,
        cancel: &CancellationController,
    ) -> anyhow::Result<String> {
        let mut shell = self.connector.connect(target).await?;
        let output = cancellable(cancel, run_all(&mut shell, &self.commands)).await;
        close_session(target, shell).await;
        Ok(output?)
    }
}

/// Runs `commands` and returns their output, each part headed by `=== <command> ===`.
///
/// Stops at the first command that fails.
async fn run_all(shell: &mut impl Shell, commands: &[String]) -> Result<String, HostError> {
    let mut sections = Vec::with_capacity(commands.len());
    for command in commands {
        let output = shell.exec(command).await?;
        sections.push(format!("=== {command} ==="));
        sections.push(strip_echo(&output, command));
    }
    Ok(sections.join("\n"))
}
