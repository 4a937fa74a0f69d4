//! Runs CLI commands on firewalls over SSH.
//!
//! [Connect] and [Shell] stand between the operations and the real SSH client so that tests can
//! substitute scripted hosts. The production implementations drive the system `ssh` binary
//! through [openssh]'s multiplexed sessions, so agents and `~/.ssh/config` behave the way the
//! user expects.
//!
//! [openssh] starts its control master in batch mode, which rules out passwords. With a password
//! the connector starts the master itself, with `SSH_ASKPASS` pointing at a small helper script
//! that prints the password from the master's environment, and then attaches to it.

use crate::dispatch::Target;
use crate::error::HostError;
use async_trait::async_trait;
use openssh::{KnownHosts, Session, SessionBuilder, Stdio};
use std::fmt;
use std::fs;
use std::future::Future;
use std::io::{self, Write};
use std::os::unix::fs::OpenOptionsExt;
use std::path::{Path, PathBuf};
use std::process::{self, Output};
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tokio::time;
use tracing::debug;

/// The variable that carries the password from the connector to the askpass helper.
const PASSWORD_VAR: &str = "PANW_SSH_PASSWORD";

const ASKPASS_SCRIPT: &str = "#!/bin/sh\nprintf '%s\\n' \"$PANW_SSH_PASSWORD\"\n";

/// Opens sessions to hosts.
#[async_trait]
pub trait Connect: Send + Sync + 'static {
    type Shell: Shell;

    /// Connects to `host` and, on success, returns a session on the host.
    async fn connect(&self, host: &Target) -> Result<Self::Shell, HostError>;
}

/// An open session on one host.
#[async_trait]
pub trait Shell: Send + Sized {
    /// Runs a single command and returns its standard output.
    async fn exec(&mut self, command: &str) -> Result<String, HostError>;

    /// Feeds `commands` to one interactive shell, one per line, and returns everything the shell
    /// printed. Unlike [Shell::exec], later commands see the mode changes made by earlier ones
    /// (e.g. `configure`).
    async fn script(&mut self, commands: &[&str]) -> Result<String, HostError>;

    /// Closes the session.
    async fn close(self) -> Result<(), HostError>;
}

/// A password that is left out of debug output.
#[derive(Clone, PartialEq, Eq)]
pub struct Password(String);

impl Password {
    pub fn new(password: impl Into<String>) -> Self {
        Password(password.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Password {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Password(****)")
    }
}

/// Settings shared by every connection in a run.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SshOptions {
    /// The remote user. Falls back to the `ssh` client's own default when `None`.
    pub user: Option<String>,

    /// A private key to authenticate with. When `None`, `ssh` uses the agent and its usual keys.
    pub identity: Option<PathBuf>,

    /// A password to log in with, instead of keys.
    pub password: Option<Password>,

    /// The limit on connecting, and separately on each command.
    pub timeout: Duration,
}

/// Production implementation of [Connect].
#[derive(Clone, Debug)]
pub struct SshConnector {
    options: SshOptions,
    askpass: Option<Arc<Askpass>>,
}

impl SshConnector {
    /// # Errors
    ///
    /// Returns an error if `options` has a password and the askpass helper can't be written.
    pub fn new(options: SshOptions) -> io::Result<Self> {
        let askpass = match options.password {
            Some(_) => Some(Arc::new(Askpass::create()?)),
            None => None,
        };
        Ok(SshConnector { options, askpass })
    }

    pub fn options(&self) -> &SshOptions {
        &self.options
    }

    fn timeout_secs(&self) -> u64 {
        self.options.timeout.as_secs().max(1)
    }

    /// The `ssh` invocation that starts a control master for `host` at `control`, logging in
    /// with `password` and writing its diagnostics to `log`.
    ///
    /// The master backgrounds itself once logged in and exits after sitting idle for the
    /// timeout, so a session that is dropped without being closed doesn't linger.
    fn master_command(
        &self,
        host: &Target,
        askpass: &Path,
        password: &Password,
        control: &Path,
        log: &Path,
    ) -> Command {
        let secs = self.timeout_secs();
        let mut command = Command::new("ssh");
        command
            .stdin(process::Stdio::null())
            .stdout(process::Stdio::null())
            .stderr(process::Stdio::null())
            .kill_on_drop(true)
            .env("SSH_ASKPASS", askpass)
            .env("SSH_ASKPASS_REQUIRE", "force")
            .env(PASSWORD_VAR, password.expose())
            .arg("-E")
            .arg(log)
            .arg("-S")
            .arg(control)
            .args(["-M", "-f", "-N"])
            .arg("-o")
            .arg(format!("ControlPersist={secs}s"))
            .arg("-o")
            .arg("StrictHostKeyChecking=accept-new")
            .arg("-o")
            .arg(format!("ConnectTimeout={secs}"))
            .arg("-o")
            .arg("NumberOfPasswordPrompts=1");
        // Older clients only consult SSH_ASKPASS when DISPLAY is set.
        if std::env::var_os("DISPLAY").is_none() {
            command.env("DISPLAY", "none");
        }
        if let Some(user) = &self.options.user {
            command.arg("-l").arg(user);
        }
        command.arg(host.as_str());
        command
    }

    async fn connect_with_password(
        &self,
        host: &Target,
        askpass: &Askpass,
        password: &Password,
    ) -> Result<(Session, TempDir), HostError> {
        let dir = tempfile::Builder::new()
            .prefix("panw-ssh")
            .tempdir()
            .map_err(connect_error)?;
        let control = dir.path().join("master");
        let log = dir.path().join("log");

        let mut master = self.master_command(host, &askpass.path(), password, &control, &log);
        let status = match time::timeout(self.options.timeout, master.status()).await {
            Ok(status) => status.map_err(connect_error)?,
            Err(_elapsed) => {
                let secs = self.timeout_secs();
                return Err(HostError::Connect(format!("timed out after {secs}s")));
            }
        };
        if !status.success() {
            let log = fs::read_to_string(&log).unwrap_or_default();
            let reason = match (log.trim(), status.code()) {
                ("", Some(i)) => format!("ssh exited with exit code {i}"),
                ("", None) => "ssh terminated by signal".to_string(),
                (log, _) => log.to_string(),
            };
            return Err(HostError::Connect(reason));
        }

        let session = Session::resume_mux(control.into_boxed_path(), Some(log.into_boxed_path()));
        Ok((session, dir))
    }
}

/// A helper program that prints the password it finds in its environment, for `ssh` to run as
/// `SSH_ASKPASS`. It lives in a private temporary directory removed on drop.
#[derive(Debug)]
struct Askpass {
    dir: TempDir,
}

impl Askpass {
    fn create() -> io::Result<Self> {
        let dir = tempfile::Builder::new().prefix("panw-askpass").tempdir()?;
        let mut script = fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .mode(0o700)
            .open(dir.path().join("askpass"))?;
        script.write_all(ASKPASS_SCRIPT.as_bytes())?;
        Ok(Askpass { dir })
    }

    fn path(&self) -> PathBuf {
        self.dir.path().join("askpass")
    }
}

#[async_trait]
impl Connect for SshConnector {
    type Shell = SshSession;

    async fn connect(&self, host: &Target) -> Result<SshSession, HostError> {
        if let (Some(askpass), Some(password)) = (&self.askpass, &self.options.password) {
            debug!(%host, user = ?self.options.user, "opening SSH session with a password");
            let (session, control_dir) = self.connect_with_password(host, askpass, password).await?;
            return Ok(SshSession {
                session,
                timeout: self.options.timeout,
                control_dir: Some(control_dir),
            });
        }

        let mut builder = SessionBuilder::default();
        builder
            .known_hosts_check(KnownHosts::Add)
            .connect_timeout(self.options.timeout);
        if let Some(user) = &self.options.user {
            builder.user(user.clone());
        }
        if let Some(identity) = &self.options.identity {
            builder.keyfile(identity);
        }

        debug!(%host, user = ?self.options.user, "opening SSH session");
        let session = builder
            .connect_mux(host.as_str())
            .await
            .map_err(|err| HostError::Connect(err.to_string()))?;

        Ok(SshSession {
            session,
            timeout: self.options.timeout,
            control_dir: None,
        })
    }
}

/// Production implementation of [Shell].
pub struct SshSession {
    session: Session,
    timeout: Duration,
    // Holds the control socket of a master started with a password; removed after close.
    control_dir: Option<TempDir>,
}

impl SshSession {
    async fn within_timeout<T>(
        &self,
        work: impl Future<Output = Result<T, HostError>>,
    ) -> Result<T, HostError> {
        match time::timeout(self.timeout, work).await {
            Ok(result) => result,
            Err(_elapsed) => Err(HostError::Ssh(format!(
                "timed out after {}s",
                self.timeout.as_secs()
            ))),
        }
    }
}

#[async_trait]
impl Shell for SshSession {
    async fn exec(&mut self, command: &str) -> Result<String, HostError> {
        debug!(command, "running command");
        let mut remote = self.session.raw_command(command);
        let output = self
            .within_timeout(async { Ok(remote.output().await?) })
            .await?;
        into_stdout(output)
    }

    async fn script(&mut self, commands: &[&str]) -> Result<String, HostError> {
        debug!(?commands, "running script");

        // An empty remote command asks the server for a login shell.
        let mut remote = self.session.raw_command("");
        remote
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        let output = self
            .within_timeout(async {
                let mut child = remote.spawn().await?;
                if let Some(mut stdin) = child.stdin().take() {
                    for command in commands {
                        stdin.write_all(command.as_bytes()).await.map_err(io_error)?;
                        stdin.write_all(b"\n").await.map_err(io_error)?;
                    }
                    stdin.shutdown().await.map_err(io_error)?;
                }
                Ok(child.wait_with_output().await?)
            })
            .await?;
        into_stdout(output)
    }

    async fn close(self) -> Result<(), HostError> {
        self.session.close().await?;
        drop(self.control_dir);
        Ok(())
    }
}

fn io_error(err: io::Error) -> HostError {
    HostError::Ssh(err.to_string())
}

fn connect_error(err: io::Error) -> HostError {
    HostError::Connect(err.to_string())
}

/// Returns the command's stdout, or an error if the command failed.
///
/// A command fails if it exits with a nonzero code, or if it printed only to stderr.
pub fn into_stdout(output: Output) -> Result<String, HostError> {
    let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
    let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();

    if !output.status.success() {
        let reason = match output.status.code() {
            Some(i) => format!("exit code {i}"),
            None => "terminated by signal".to_string(),
        };
        return match stderr.is_empty() {
            true => Err(HostError::Ssh(reason)),
            false => Err(HostError::Ssh(format!("{reason}: {stderr}"))),
        };
    }

    if stdout.trim().is_empty() && !stderr.is_empty() {
        return Err(HostError::Ssh(stderr));
    }
    Ok(stdout)
}

/// Drops `head` lines from the start of `text` and `tail` lines from the end.
///
/// ```
/// assert_eq!("c", panw::ssh::trim_lines("a\nb\nc\nd\ne", 2, 2));
/// assert_eq!("", panw::ssh::trim_lines("a\nb", 2, 2));
/// ```
pub fn trim_lines(text: &str, head: usize, tail: usize) -> String {
    let lines: Vec<_> = text.lines().collect();
    if lines.len() <= head + tail {
        return String::new();
    }
    lines[head..lines.len() - tail].join("\n")
}

/// Removes the first line of `output` if it's the CLI echoing `command` back.
pub fn strip_echo(output: &str, command: &str) -> String {
    let mut lines = output.lines().peekable();
    if lines
        .peek()
        .is_some_and(|first| first.trim_end().ends_with(command.trim()))
    {
        lines.next();
    }
    lines.collect::<Vec<_>>().join("\n")
}

#[cfg(test)]
pub mod fixtures {
    use super::*;
    use std::collections::{HashMap, HashSet};
    use std::sync::{Arc, Mutex};

    /// What a [FakeShell] was asked to do, in order.
    #[derive(Clone, Debug, PartialEq, Eq)]
    pub enum Call {
        Exec(String),
        Script(Vec<String>),
        Close,
    }

    #[derive(Debug, Default)]
    struct Hosts {
        unreachable: HashSet<String>,
        failing: HashSet<String>,
        outputs: HashMap<String, String>,
        calls: HashMap<String, Vec<Call>>,
    }

    // Hands out FakeShells but keeps hold of their shared state, so tests can script hosts
    // before a run and inspect the calls afterwards.
    #[derive(Clone, Debug, Default)]
    pub struct FakeConnector(Arc<Mutex<Hosts>>);

    impl FakeConnector {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn set_unreachable(&self, host: &str) {
            self.0.lock().unwrap().unreachable.insert(host.to_string());
        }

        pub fn fail_commands(&self, host: &str) {
            self.0.lock().unwrap().failing.insert(host.to_string());
        }

        /// Sets the text the host prints for `command`. Unknown commands print nothing.
        pub fn output(&self, host: &str, command: &str, output: &str) {
            self.0
                .lock()
                .unwrap()
                .outputs
                .insert(format!("{host}\0{command}"), output.to_string());
        }

        pub fn calls(&self, host: &str) -> Vec<Call> {
            let hosts = self.0.lock().unwrap();
            hosts.calls.get(host).cloned().unwrap_or_default()
        }
    }

    #[async_trait]
    impl Connect for FakeConnector {
        type Shell = FakeShell;

        async fn connect(&self, host: &Target) -> Result<FakeShell, HostError> {
            let mut hosts = self.0.lock().unwrap();
            if hosts.unreachable.contains(host.as_str()) {
                return Err(HostError::Connect("connection refused".to_string()));
            }
            hosts.calls.entry(host.to_string()).or_default();
            Ok(FakeShell {
                host: host.to_string(),
                hosts: self.0.clone(),
            })
        }
    }

    pub struct FakeShell {
        host: String,
        hosts: Arc<Mutex<Hosts>>,
    }

    impl FakeShell {
        fn record(&self, call: Call) -> Result<(), HostError> {
            let mut hosts = self.hosts.lock().unwrap();
            let failing = hosts.failing.contains(&self.host);
            hosts.calls.entry(self.host.clone()).or_default().push(call);
            match failing {
                true => Err(HostError::Ssh("exit code 1".to_string())),
                false => Ok(()),
            }
        }

        fn output_for(&self, command: &str) -> String {
            let hosts = self.hosts.lock().unwrap();
            let key = format!("{}\0{command}", self.host);
            hosts.outputs.get(&key).cloned().unwrap_or_default()
        }
    }

    #[async_trait]
    impl Shell for FakeShell {
        async fn exec(&mut self, command: &str) -> Result<String, HostError> {
            self.record(Call::Exec(command.to_string()))?;
            Ok(self.output_for(command))
        }

        async fn script(&mut self, commands: &[&str]) -> Result<String, HostError> {
            self.record(Call::Script(commands.iter().map(|c| c.to_string()).collect()))?;
            Ok(self.output_for(&commands.join("\n")))
        }

        async fn close(self) -> Result<(), HostError> {
            let mut hosts = self.hosts.lock().unwrap();
            hosts.calls.entry(self.host.clone()).or_default().push(Call::Close);
            Ok(())
        }
    }
}
