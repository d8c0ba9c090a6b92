//! OpenSSH-backed transport
//!
//! One master connection per host (`ControlMaster`) is opened lazily and kept
//! for the life of the connector:
//! - commands run as `ssh` clients multiplexed over the master's control socket
//! - downloads run as `scp` over the same socket
//! - the master is only established once; concurrent callers wait on the lock

use crate::config::RemoteConfig;
use crate::error::{ConnectorError, ConnectorResult};
use crate::transport::{Download, RemoteTransport, RunResult};
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::process::Command;
use tokio::sync::Mutex;

/// Exit status the ssh client uses for its own failures
const SSH_CLIENT_FAILURE: i32 = 255;

/// Idle lifetime of an orphaned master, in seconds
const CONTROL_PERSIST_SECS: u32 = 600;

#[derive(Debug, Clone)]
struct Session {
    control_path: PathBuf,
}

/// Remote transport over the system OpenSSH client
#[derive(Debug)]
pub struct SshConnector {
    config: RemoteConfig,
    ssh_program: PathBuf,
    scp_program: PathBuf,
    session: Mutex<Option<Session>>,
}

impl SshConnector {
    /// Create a connector; no connection is made until first use
    ///
    /// # Errors
    /// [`ConnectorError::InvalidConfig`] when the configuration is unusable.
    pub fn new(config: RemoteConfig) -> ConnectorResult<Self> {
        config.validate()?;
        Ok(Self {
            config,
            ssh_program: PathBuf::from("ssh"),
            scp_program: PathBuf::from("scp"),
            session: Mutex::new(None),
        })
    }

    /// Use different client binaries
    #[inline]
    #[must_use]
    pub fn with_programs(mut self, ssh: impl Into<PathBuf>, scp: impl Into<PathBuf>) -> Self {
        self.ssh_program = ssh.into();
        self.scp_program = scp.into();
        self
    }

    /// Remote configuration
    #[inline]
    #[must_use]
    pub fn config(&self) -> &RemoteConfig {
        &self.config
    }

    fn control_path(&self) -> PathBuf {
        let host: String = self
            .config
            .host
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() || c == '.' || c == '-' { c } else { '_' })
            .collect();
        self.config
            .control_dir
            .join(format!("yematch-{host}-{}.sock", std::process::id()))
    }

    fn common_options(&self, control_path: &Path) -> Vec<OsString> {
        let mut control = OsString::from("ControlPath=");
        control.push(control_path);
        vec!["-o".into(), control, "-o".into(), "BatchMode=yes".into()]
    }

    fn master_args(&self, control_path: &Path) -> Vec<OsString> {
        let mut args = self.common_options(control_path);
        let mut log = control_path.as_os_str().to_owned();
        log.push(".log");
        args.extend([
            "-M".into(),
            "-N".into(),
            "-f".into(),
            "-E".into(),
            log,
            "-o".into(),
            "ControlMaster=yes".into(),
            "-o".into(),
            format!("ControlPersist={CONTROL_PERSIST_SECS}").into(),
            "-o".into(),
            format!("ConnectTimeout={}", self.config.connect_timeout_secs).into(),
        ]);
        if let Some(port) = self.config.port {
            args.extend(["-p".into(), port.to_string().into()]);
        }
        args.push(self.config.destination().into());
        args
    }

    fn exec_args(&self, control_path: &Path, remote_command: &str) -> Vec<OsString> {
        let mut args = self.common_options(control_path);
        if let Some(port) = self.config.port {
            args.extend(["-p".into(), port.to_string().into()]);
        }
        args.push(self.config.destination().into());
        args.push(remote_command.into());
        args
    }

    fn control_args(&self, control_path: &Path, operation: &str) -> Vec<OsString> {
        let mut args = self.common_options(control_path);
        args.extend(["-O".into(), operation.into(), self.config.destination().into()]);
        args
    }

    fn scp_args(&self, control_path: &Path, remote: &str, local: &Path) -> Vec<OsString> {
        let mut args = self.common_options(control_path);
        if let Some(port) = self.config.port {
            args.extend(["-P".into(), port.to_string().into()]);
        }
        args.push(format!("{}:{remote}", self.config.destination()).into());
        args.push(local.into());
        args
    }

    /// Where the production copy of `script` lives
    #[must_use]
    pub fn production_path(&self, script: &str) -> String {
        join_remote(&self.config.script_dir, script)
    }

    /// Path actually executed: the sandbox copy when a sandbox is configured
    #[must_use]
    pub fn run_path(&self, script: &str) -> String {
        match &self.config.sandbox_dir {
            Some(sandbox) => join_remote(sandbox, file_name(script)),
            None => self.production_path(script),
        }
    }

    /// Shell command copying the production script into the sandbox
    #[must_use]
    pub fn sandbox_copy_command(&self, script: &str) -> Option<String> {
        let sandbox = self.config.sandbox_dir.as_deref()?;
        Some(format!(
            "mkdir -p {} && cp {} {}",
            shell_quote(sandbox),
            shell_quote(&self.production_path(script)),
            shell_quote(&self.run_path(script)),
        ))
    }

    /// Full remote command line: path parameters, script, then `args` verbatim
    #[must_use]
    pub fn remote_invocation(&self, script: &str, args: &str) -> String {
        let mut line: Vec<String> = self
            .config
            .path_map
            .env_params()
            .into_iter()
            .map(|(k, v)| format!("{k}={}", shell_quote(&v)))
            .collect();
        line.push(shell_quote(&self.run_path(script)));
        let args = args.trim();
        if !args.is_empty() {
            line.push(args.to_string());
        }
        line.join(" ")
    }

    /// Control socket of the live session, establishing it on first use
    async fn session(&self) -> ConnectorResult<PathBuf> {
        let mut guard = self.session.lock().await;
        if let Some(session) = guard.as_ref() {
            return Ok(session.control_path.clone());
        }

        let control_path = self.control_path();
        let host = self.config.host.clone();
        tracing::info!(host = %host, control = %control_path.display(), "opening master connection");

        let mut command = Command::new(&self.ssh_program);
        command
            .args(self.master_args(&control_path))
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(true);

        let timeout = self.config.connect_timeout();
        let status = tokio::time::timeout(timeout, command.status())
            .await
            .map_err(|_| ConnectorError::ConnectTimeout {
                host: host.clone(),
                timeout,
            })?
            .map_err(|e| ConnectorError::spawn("ssh", e))?;

        if !status.success() {
            let mut log = control_path.as_os_str().to_owned();
            log.push(".log");
            let detail = tokio::fs::read_to_string(PathBuf::from(log)).await.unwrap_or_default();
            let message = match detail.trim() {
                "" => format!("ssh exited with {status}"),
                text => text.to_string(),
            };
            return Err(ConnectorError::connect(host, message));
        }

        *guard = Some(Session {
            control_path: control_path.clone(),
        });
        Ok(control_path)
    }

    async fn exec(&self, control_path: &Path, remote_command: &str) -> ConnectorResult<RunResult> {
        let output = Command::new(&self.ssh_program)
            .args(self.exec_args(control_path, remote_command))
            .stdin(Stdio::null())
            .output()
            .await
            .map_err(|e| ConnectorError::spawn("ssh", e))?;

        let result = RunResult {
            exit_status: output.status.code().unwrap_or(-1),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        };

        if result.exit_status == SSH_CLIENT_FAILURE && !self.master_alive(control_path).await {
            *self.session.lock().await = None;
            return Err(ConnectorError::session_lost(&self.config.host, result.stderr.trim()));
        }
        Ok(result)
    }

    async fn master_alive(&self, control_path: &Path) -> bool {
        Command::new(&self.ssh_program)
            .args(self.control_args(control_path, "check"))
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .await
            .is_ok_and(|s| s.success())
    }
}

#[async_trait::async_trait]
impl RemoteTransport for SshConnector {
    #[tracing::instrument(skip(self, args), fields(host = %self.config.host))]
    async fn run_command(&self, script: &str, args: &str) -> ConnectorResult<RunResult> {
        let control_path = self.session().await?;

        if let Some(copy) = self.sandbox_copy_command(script) {
            let copied = self.exec(&control_path, &copy).await?;
            if !copied.success() {
                tracing::warn!(exit = copied.exit_status, "sandbox copy failed");
                return Ok(RunResult {
                    stderr: format!("sandbox copy of {script} failed\n{}", copied.stderr),
                    ..copied
                });
            }
        }

        let result = self.exec(&control_path, &self.remote_invocation(script, args)).await?;
        tracing::debug!(exit = result.exit_status, stdout_bytes = result.stdout.len(), "remote command finished");
        Ok(result)
    }

    #[tracing::instrument(skip(self), fields(host = %self.config.host))]
    async fn download_file(&self, remote: &str, local: &Path) -> ConnectorResult<Download> {
        let control_path = self.session().await?;
        if let Some(parent) = local.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }

        let output = Command::new(&self.scp_program)
            .args(self.scp_args(&control_path, remote, local))
            .stdin(Stdio::null())
            .output()
            .await
            .map_err(|e| ConnectorError::spawn("scp", e))?;

        if output.status.success() {
            let size = tokio::fs::metadata(local).await?.len();
            tracing::debug!(bytes = size, "downloaded");
            return Ok(Download::Fetched(size));
        }

        let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
        if stderr.contains("No such file or directory") {
            tracing::warn!(remote, "remote file missing");
            Ok(Download::Missing { note: stderr })
        } else {
            Err(ConnectorError::transfer(remote, local, stderr))
        }
    }

    async fn close(&self) {
        let Some(session) = self.session.lock().await.take() else { return };
        let status = Command::new(&self.ssh_program)
            .args(self.control_args(&session.control_path, "exit"))
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .await;
        match status {
            Ok(s) if s.success() => tracing::info!(host = %self.config.host, "master connection closed"),
            Ok(s) => tracing::warn!(host = %self.config.host, status = %s, "master connection did not close cleanly"),
            Err(e) => tracing::warn!(host = %self.config.host, error = %e, "cannot stop master connection"),
        }
    }
}

fn join_remote(dir: &str, name: &str) -> String {
    let dir = dir.trim_end_matches('/');
    if dir.is_empty() || name.starts_with('/') {
        name.to_string()
    } else {
        format!("{dir}/{name}")
    }
}

fn file_name(script: &str) -> &str {
    script.rsplit('/').next().unwrap_or(script)
}

/// Quote for a POSIX shell unless the text is plainly safe
#[must_use]
pub fn shell_quote(text: &str) -> String {
    let safe = !text.is_empty()
        && text
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.' | '/' | ':' | ',' | '=' | '+' | '@'));
    if safe {
        text.to_string()
    } else {
        format!("'{}'", text.replace('\'', r"'\''"))
    }
}
