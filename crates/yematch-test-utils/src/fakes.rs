//! In-memory stand-ins for the remote host

use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::path::Path;
use yematch_connector::{ConnectorError, ConnectorResult, Download, RemoteTransport, RunResult};

/// One recorded `run_command` call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub script: String,
    pub args: String,
}

#[derive(Debug, Clone)]
enum Scripted {
    Result(RunResult),
    SessionLost(String),
}

/// Scripted transport: canned results per script, canned files per remote path
#[derive(Debug, Default)]
pub struct FakeTransport {
    results: Mutex<HashMap<String, Scripted>>,
    files: Mutex<HashMap<String, String>>,
    invocations: Mutex<Vec<Invocation>>,
    downloads: Mutex<Vec<String>>,
}

impl FakeTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// `script` exits 0 printing `stdout`
    pub fn succeed(self, script: &str, stdout: &str) -> Self {
        self.respond(
            script,
            RunResult {
                exit_status: 0,
                stdout: stdout.to_string(),
                stderr: String::new(),
            },
        )
    }

    /// `script` exits with `status`
    pub fn fail(self, script: &str, status: i32, stdout: &str, stderr: &str) -> Self {
        self.respond(
            script,
            RunResult {
                exit_status: status,
                stdout: stdout.to_string(),
                stderr: stderr.to_string(),
            },
        )
    }

    /// `script` loses the session
    pub fn lose_session(self, script: &str, message: &str) -> Self {
        self.results
            .lock()
            .insert(script.to_string(), Scripted::SessionLost(message.to_string()));
        self
    }

    pub fn respond(self, script: &str, result: RunResult) -> Self {
        self.results.lock().insert(script.to_string(), Scripted::Result(result));
        self
    }

    /// Make `remote` downloadable with `contents`
    pub fn file(self, remote: &str, contents: &str) -> Self {
        self.files.lock().insert(remote.to_string(), contents.to_string());
        self
    }

    pub fn invocations(&self) -> Vec<Invocation> {
        self.invocations.lock().clone()
    }

    pub fn downloads(&self) -> Vec<String> {
        self.downloads.lock().clone()
    }
}

#[async_trait]
impl RemoteTransport for FakeTransport {
    async fn run_command(&self, script: &str, args: &str) -> ConnectorResult<RunResult> {
        self.invocations.lock().push(Invocation {
            script: script.to_string(),
            args: args.to_string(),
        });
        let scripted = self.results.lock().get(script).cloned();
        match scripted {
            Some(Scripted::Result(result)) => Ok(result),
            Some(Scripted::SessionLost(message)) => Err(ConnectorError::session_lost("fake-host", message)),
            None => Ok(RunResult {
                exit_status: 127,
                stdout: String::new(),
                stderr: format!("{script}: not found"),
            }),
        }
    }

    async fn download_file(&self, remote: &str, local: &Path) -> ConnectorResult<Download> {
        self.downloads.lock().push(remote.to_string());
        let contents = self.files.lock().get(remote).cloned();
        match contents {
            Some(text) => {
                if let Some(parent) = local.parent() {
                    tokio::fs::create_dir_all(parent).await?;
                }
                tokio::fs::write(local, &text).await?;
                Ok(Download::Fetched(text.len() as u64))
            }
            None => Ok(Download::Missing {
                note: format!("scp: {remote}: No such file or directory"),
            }),
        }
    }
}
