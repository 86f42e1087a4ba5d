//! `oc`-backed machine repository and deleter

use std::path::PathBuf;
use std::process::Output;
use std::time::Duration;
use tokio::process::Command;
use tracing::{debug, error, info};

use super::{async_trait, decode_machine_list, MachineDeleter, MachineRepository};
use crate::config::LabelSelector;
use crate::error::{CommandFailure, PrunerError, PrunerResult};
use crate::models::MachineRecord;

/// Namespace the machine-api operator keeps Machine objects in
pub const DEFAULT_MACHINE_NAMESPACE: &str = "openshift-machine-api";

/// Default timeout for a single cluster command
pub const DEFAULT_COMMAND_TIMEOUT: Duration = Duration::from_secs(60);

/// Settings for invoking the cluster CLI
#[derive(Debug, Clone)]
pub struct OcClientConfig {
    /// Binary to execute, looked up on `$PATH` when not absolute
    pub binary: PathBuf,
    /// Namespace holding the Machine objects
    pub namespace: String,
    /// Upper bound for each invocation
    pub timeout: Duration,
}

impl Default for OcClientConfig {
    fn default() -> Self {
        Self {
            binary: PathBuf::from("oc"),
            namespace: DEFAULT_MACHINE_NAMESPACE.to_string(),
            timeout: DEFAULT_COMMAND_TIMEOUT,
        }
    }
}

/// Lists and deletes machines through the `oc` CLI
pub struct OcClient {
    config: OcClientConfig,
}

impl OcClient {
    pub fn new(config: OcClientConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &OcClientConfig {
        &self.config
    }

    fn list_args(&self, selector: &LabelSelector) -> Vec<String> {
        vec![
            "get".to_string(),
            "machines".to_string(),
            "-n".to_string(),
            self.config.namespace.clone(),
            "-l".to_string(),
            selector.to_string(),
            "-o".to_string(),
            "json".to_string(),
        ]
    }

    fn delete_args(&self, name: &str, simulate: bool) -> Vec<String> {
        let mut args = vec![
            "delete".to_string(),
            "machine".to_string(),
            name.to_string(),
            "-n".to_string(),
            self.config.namespace.clone(),
            "--wait=false".to_string(),
        ];
        if simulate {
            args.push("--dry-run=client".to_string());
        }
        args
    }

    fn command_line(&self, args: &[String]) -> String {
        let mut parts = vec![self.config.binary.display().to_string()];
        parts.extend(args.iter().map(|a| quote_arg(a)));
        parts.join(" ")
    }

    /// Run the CLI to completion, mapping every non-success into a `CommandFailure`
    async fn run(&self, args: &[String]) -> Result<Output, CommandFailure> {
        let command_line = self.command_line(args);
        debug!(command = %command_line, "Running cluster command");

        let child = Command::new(&self.config.binary)
            .args(args)
            .kill_on_drop(true)
            .output();

        let output = match tokio::time::timeout(self.config.timeout, child).await {
            Ok(Ok(output)) => output,
            Ok(Err(e)) => {
                return Err(CommandFailure::aborted(
                    command_line,
                    format!("failed to start: {}", e),
                ))
            }
            Err(_) => {
                return Err(CommandFailure::aborted(
                    command_line,
                    format!("timed out after {:?}", self.config.timeout),
                ))
            }
        };

        if output.status.success() {
            Ok(output)
        } else {
            Err(CommandFailure {
                command: command_line,
                stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
                stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
                code: output.status.code(),
            })
        }
    }
}

#[async_trait]
impl MachineRepository for OcClient {
    async fn list_machines(&self, selector: &LabelSelector) -> PrunerResult<Vec<MachineRecord>> {
        info!(namespace = %self.config.namespace, selector = %selector, "Listing machines");

        let output = self
            .run(&self.list_args(selector))
            .await
            .map_err(|failure| {
                log_command_failure(&failure);
                PrunerError::Query(failure)
            })?;

        let machines = decode_machine_list(&output.stdout)?;
        info!(count = machines.len(), "Worker machines found");
        Ok(machines)
    }
}

#[async_trait]
impl MachineDeleter for OcClient {
    async fn delete_machine(&self, name: &str, simulate: bool) -> PrunerResult<()> {
        info!(machine = %name, dry_run = simulate, "Requesting machine deletion");

        self.run(&self.delete_args(name, simulate))
            .await
            .map(|_| ())
            .map_err(|failure| {
                log_command_failure(&failure);
                PrunerError::Deletion {
                    name: name.to_string(),
                    failure,
                }
            })
    }
}

fn log_command_failure(failure: &CommandFailure) {
    error!(
        command = %failure.command,
        stdout = %failure.stdout,
        stderr = %failure.stderr,
        code = ?failure.code,
        "Cluster command finished with non zero return code"
    );
}

fn quote_arg(arg: &str) -> String {
    if arg.is_empty() || arg.chars().any(|c| c.is_whitespace() || c == '\'' || c == '"') {
        format!("'{}'", arg.replace('\'', r"'\''"))
    } else {
        arg.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client(binary: &str) -> OcClient {
        OcClient::new(OcClientConfig {
            binary: PathBuf::from(binary),
            namespace: DEFAULT_MACHINE_NAMESPACE.to_string(),
            timeout: Duration::from_secs(10),
        })
    }

    #[test]
    fn test_list_args() {
        let args = client("oc").list_args(&LabelSelector::with_additional("pool=spot"));
        assert_eq!(
            args,
            vec![
                "get",
                "machines",
                "-n",
                "openshift-machine-api",
                "-l",
                "machine.openshift.io/cluster-api-machine-type=worker,\
                 machine.openshift.io/cluster-api-machine-role=worker,pool=spot",
                "-o",
                "json",
            ]
        );
    }

    #[test]
    fn test_delete_args_dry_run() {
        let client = client("oc");
        let real = client.delete_args("worker-a", false);
        assert_eq!(
            real,
            vec!["delete", "machine", "worker-a", "-n", "openshift-machine-api", "--wait=false"]
        );

        let simulated = client.delete_args("worker-a", true);
        assert_eq!(simulated.last().map(String::as_str), Some("--dry-run=client"));
        assert_eq!(simulated.len(), real.len() + 1);
    }

    #[test]
    fn test_command_line_quotes_whitespace() {
        let line = client("oc").command_line(&["get".to_string(), "a b".to_string()]);
        assert_eq!(line, "oc get 'a b'");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_list_failure_captures_exit_code() {
        let err = client("false")
            .list_machines(&LabelSelector::default())
            .await
            .unwrap_err();

        match err {
            PrunerError::Query(failure) => {
                assert_eq!(failure.code, Some(1));
                assert!(failure.command.starts_with("false get machines"));
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_missing_binary_is_query_error() {
        let err = client("definitely-not-an-oc-binary")
            .list_machines(&LabelSelector::default())
            .await
            .unwrap_err();

        match err {
            PrunerError::Query(failure) => {
                assert_eq!(failure.code, None);
                assert!(failure.stderr.contains("failed to start"));
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_unparseable_output_is_invalid_record() {
        // `echo` succeeds but prints its arguments instead of JSON
        let err = client("echo")
            .list_machines(&LabelSelector::default())
            .await
            .unwrap_err();
        assert!(matches!(err, PrunerError::InvalidRecord(_)));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_delete_success_and_failure() {
        assert!(client("true").delete_machine("worker-a", true).await.is_ok());

        let err = client("false")
            .delete_machine("worker-a", false)
            .await
            .unwrap_err();
        match err {
            PrunerError::Deletion { name, failure } => {
                assert_eq!(name, "worker-a");
                assert_eq!(failure.code, Some(1));
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_timeout_is_reported() {
        let client = OcClient::new(OcClientConfig {
            binary: PathBuf::from("sleep"),
            namespace: DEFAULT_MACHINE_NAMESPACE.to_string(),
            timeout: Duration::from_millis(50),
        });

        let failure = client.run(&["5".to_string()]).await.unwrap_err();
        assert_eq!(failure.code, None);
        assert!(failure.stderr.contains("timed out"));
    }
}
