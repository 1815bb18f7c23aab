//! Whole-file reads from Perforce for servers older than 3.0
//!
//! Those servers only return the changed chunks of a file, so the rest of
//! the file has to come from source control. The connection is established
//! once per process on first use and then reused.

use async_trait::async_trait;
use log::{debug, info};
use rb_client::{ClientError, Result};
use rb_config::AppConfig;
use std::process::Output;
use tokio::process::Command;
use tokio::sync::OnceCell;

/// Reads complete files from a source-control system
#[async_trait]
pub trait SourceControl: Send + Sync {
    /// Lines of the file at `path`, without line terminators
    async fn fetch_file(&self, path: &str) -> Result<Vec<String>>;
}

/// Connection settings for the `p4` command line client
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct P4Settings {
    pub command: String,
    pub port: Option<String>,
    pub user: Option<String>,
    pub client: Option<String>,
}

impl Default for P4Settings {
    fn default() -> Self {
        Self {
            command: "p4".to_string(),
            port: None,
            user: None,
            client: None,
        }
    }
}

impl From<&AppConfig> for P4Settings {
    fn from(config: &AppConfig) -> Self {
        Self {
            command: config.p4_command.clone(),
            port: config.p4_port.clone(),
            user: config.p4_user.clone(),
            client: config.p4_client.clone(),
        }
    }
}

impl P4Settings {
    /// Global options that precede every p4 subcommand
    fn global_args(&self) -> Vec<String> {
        let mut args = Vec::new();
        for (flag, value) in [("-p", &self.port), ("-u", &self.user), ("-c", &self.client)] {
            if let Some(value) = value {
                args.push(flag.to_string());
                args.push(value.clone());
            }
        }
        args
    }
}

/// Perforce file fetcher shelling out to `p4`
///
/// `p4 -ztag info` runs once to verify the server is reachable. A failed
/// connect is reported for that call only; the next call tries again.
#[derive(Debug, Default)]
pub struct P4Fetcher {
    settings: P4Settings,
    connected: OnceCell<()>,
}

impl P4Fetcher {
    pub fn new(settings: P4Settings) -> Self {
        Self {
            settings,
            connected: OnceCell::new(),
        }
    }

    pub fn is_connected(&self) -> bool {
        self.connected.initialized()
    }

    async fn connect(&self) -> Result<()> {
        self.connected
            .get_or_try_init(|| async {
                self.run(&["-ztag", "info"]).await?;
                info!("Connected to Perforce via {}", self.settings.command);
                Ok::<(), ClientError>(())
            })
            .await?;
        Ok(())
    }

    async fn run(&self, args: &[&str]) -> Result<Output> {
        let output = Command::new(&self.settings.command)
            .args(self.settings.global_args())
            .args(args)
            .output()
            .await
            .map_err(|e| {
                ClientError::SourceControl(format!(
                    "failed to run {}: {}",
                    self.settings.command, e
                ))
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(ClientError::SourceControl(format!(
                "{} {} failed ({}): {}",
                self.settings.command,
                args.join(" "),
                output.status,
                stderr.trim()
            )));
        }
        Ok(output)
    }
}

#[async_trait]
impl SourceControl for P4Fetcher {
    async fn fetch_file(&self, path: &str) -> Result<Vec<String>> {
        self.connect().await?;

        debug!("p4 print {}", path);
        let output = self.run(&["print", "-q", path]).await?;
        Ok(String::from_utf8_lossy(&output.stdout)
            .lines()
            .map(str::to_string)
            .collect())
    }
}
