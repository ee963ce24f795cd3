//! Wrapper around the `otobo.Console.pl` admin commands.
//!
//! Provisioning agents, groups, queues, and webservices has no REST
//! surface; it goes through the console script on the server. This module
//! shells out to that script, either inside a docker compose container or
//! against a local installation, and returns the captured output.
//!
//! A command that runs and exits non-zero is a *successful* call here:
//! [`ConsoleOutput::ok`] tells the two apart. Only failing to spawn the
//! process at all is an `Err`.

use std::fmt;
use std::path::Path;
use std::str::FromStr;

use tokio::process::Command;

use crate::error::OtoboError;

/// Container name used by the stock OTOBO docker compose setup.
pub const DEFAULT_CONTAINER: &str = "otobo-web-1";

/// Console script path inside the docker container, relative to its
/// working directory.
const DOCKER_CONSOLE_PATH: &str = "./bin/otobo.Console.pl";

/// Console script path of a conventional local installation.
const LOCAL_CONSOLE_PATH: &str = "/opt/otobo/bin/otobo.Console.pl";

const CMD_USER_ADD: &str = "Admin::User::Add";
const CMD_GROUP_ADD: &str = "Admin::Group::Add";
const CMD_GROUP_USER_LINK: &str = "Admin::Group::UserLink";
const CMD_QUEUE_ADD: &str = "Admin::Queue::Add";
const CMD_QUEUE_LIST: &str = "Admin::Queue::List";
const CMD_WEBSERVICE_ADD: &str = "Admin::WebService::Add";

/// Where and how to execute the console script.
#[derive(Debug, Clone)]
pub struct CommandRunner {
    /// Argv prepended before the console script, e.g. `docker exec <name>`.
    prefix: Vec<String>,
    /// Path of the console script itself.
    executable: String,
}

impl CommandRunner {
    /// Runs the console script inside a docker container via `docker exec`.
    pub fn docker(container: impl Into<String>) -> Self {
        CommandRunner {
            prefix: vec!["docker".to_string(), "exec".to_string(), container.into()],
            executable: DOCKER_CONSOLE_PATH.to_string(),
        }
    }

    /// Runs the console script of a local installation directly.
    pub fn local() -> Self {
        CommandRunner {
            prefix: Vec::new(),
            executable: LOCAL_CONSOLE_PATH.to_string(),
        }
    }

    /// Overrides the console script path, for non-standard installations.
    #[must_use]
    pub fn with_executable(mut self, path: impl Into<String>) -> Self {
        self.executable = path.into();
        self
    }

    /// The full argv this runner would execute for the given console args.
    pub fn command_line(&self, args: &[String]) -> Vec<String> {
        let mut argv = self.prefix.clone();
        argv.push(self.executable.clone());
        argv.extend(args.iter().cloned());
        argv
    }

    /// Executes the console script and captures its output.
    ///
    /// # Errors
    ///
    /// Returns `OtoboError::Io` when the process cannot be spawned (binary
    /// missing, permissions). A spawned command that exits non-zero is
    /// returned as `Ok` with its exit code in [`ConsoleOutput`].
    pub async fn run(&self, args: &[String]) -> Result<ConsoleOutput, OtoboError> {
        let argv = self.command_line(args);
        let Some((program, rest)) = argv.split_first() else {
            return Err(OtoboError::invalid_config("console command line is empty"));
        };

        tracing::debug!(command = %argv.join(" "), "running console command");
        let output = Command::new(program).args(rest).output().await?;

        let result = ConsoleOutput {
            code: output.status.code().unwrap_or(-1),
            stdout: String::from_utf8_lossy(&output.stdout).trim().to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        };
        tracing::debug!(code = result.code, "console command finished");
        Ok(result)
    }
}

/// Captured result of a console invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConsoleOutput {
    /// Process exit code; `-1` when terminated by a signal.
    pub code: i32,
    /// Trimmed stdout.
    pub stdout: String,
    /// Trimmed stderr.
    pub stderr: String,
}

impl ConsoleOutput {
    /// True when the command exited with code 0.
    #[must_use]
    pub fn ok(&self) -> bool {
        self.code == 0
    }
}

/// Queue permission levels accepted by `Admin::Group::UserLink`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Permission {
    /// Read-only access.
    Ro,
    /// May move tickets into the queue.
    MoveInto,
    /// May create tickets in the queue.
    Create,
    /// May change ticket owners.
    Owner,
    /// May change ticket priorities.
    Priority,
    /// Full read-write access.
    Rw,
}

impl Permission {
    /// All permission levels, weakest first.
    pub const ALL: [Permission; 6] = [
        Permission::Ro,
        Permission::MoveInto,
        Permission::Create,
        Permission::Owner,
        Permission::Priority,
        Permission::Rw,
    ];

    /// The spelling the console command expects.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Permission::Ro => "ro",
            Permission::MoveInto => "move_into",
            Permission::Create => "create",
            Permission::Owner => "owner",
            Permission::Priority => "priority",
            Permission::Rw => "rw",
        }
    }
}

impl fmt::Display for Permission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Permission {
    type Err = OtoboError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "ro" => Ok(Permission::Ro),
            "move_into" => Ok(Permission::MoveInto),
            "create" => Ok(Permission::Create),
            "owner" => Ok(Permission::Owner),
            "priority" => Ok(Permission::Priority),
            "rw" => Ok(Permission::Rw),
            other => Err(OtoboError::validation(format!(
                "unknown permission '{}' (expected one of: ro, move_into, create, owner, priority, rw)",
                other
            ))),
        }
    }
}

/// Parameters for `Admin::User::Add`.
#[derive(Debug, Clone, Default)]
pub struct NewUser {
    /// Login name of the agent.
    pub user_name: String,
    /// First name.
    pub first_name: String,
    /// Last name.
    pub last_name: String,
    /// Email address.
    pub email_address: String,
    /// Initial password; the console generates one when absent.
    pub password: Option<String>,
    /// Groups to add the agent to with `rw` permission.
    pub groups: Vec<String>,
}

/// Parameters for `Admin::Group::Add`.
#[derive(Debug, Clone, Default)]
pub struct NewGroup {
    /// Group name.
    pub name: String,
    /// Optional comment.
    pub comment: Option<String>,
}

/// Parameters for `Admin::Queue::Add`.
#[derive(Debug, Clone, Default)]
pub struct NewQueue {
    /// Queue name.
    pub name: String,
    /// Group that owns the queue.
    pub group: String,
    /// Id of an existing sender address for outgoing mail.
    pub system_address_id: Option<u32>,
    /// Sender address for outgoing mail from the queue.
    pub system_address_name: Option<String>,
    /// Optional comment.
    pub comment: Option<String>,
    /// Minutes until a locked ticket unlocks automatically.
    pub unlock_timeout: Option<u32>,
    /// Minutes until the first response escalates.
    pub first_response_time: Option<u32>,
    /// Minutes until a pending update escalates.
    pub update_time: Option<u32>,
    /// Minutes until the solution escalates.
    pub solution_time: Option<u32>,
    /// Number of the working-hours calendar used for escalations.
    pub calendar: Option<u32>,
}

/// High-level interface over the admin console commands.
#[derive(Debug, Clone)]
pub struct OtoboConsole {
    runner: CommandRunner,
    no_ansi: bool,
    quiet: bool,
}

impl OtoboConsole {
    /// Creates a console wrapper with plain, non-quiet output.
    pub fn new(runner: CommandRunner) -> Self {
        OtoboConsole {
            runner,
            no_ansi: true,
            quiet: false,
        }
    }

    /// Controls the `--no-ansi` flag (on by default; the output is meant
    /// to be parsed, not viewed).
    #[must_use]
    pub fn no_ansi(mut self, no_ansi: bool) -> Self {
        self.no_ansi = no_ansi;
        self
    }

    /// Controls the `--quiet` flag (off by default).
    #[must_use]
    pub fn quiet(mut self, quiet: bool) -> Self {
        self.quiet = quiet;
        self
    }

    /// Creates an agent account.
    pub async fn add_user(&self, user: &NewUser) -> Result<ConsoleOutput, OtoboError> {
        let args = self
            .base(CMD_USER_ADD)
            .opt("--user-name", &user.user_name)
            .opt("--first-name", &user.first_name)
            .opt("--last-name", &user.last_name)
            .opt("--email-address", &user.email_address)
            .opt_if("--password", user.password.as_deref())
            .repeat("--group", &user.groups)
            .finish();
        self.runner.run(&args).await
    }

    /// Creates a group.
    pub async fn add_group(&self, group: &NewGroup) -> Result<ConsoleOutput, OtoboError> {
        let args = self
            .base(CMD_GROUP_ADD)
            .opt("--name", &group.name)
            .opt_if("--comment", group.comment.as_deref())
            .finish();
        self.runner.run(&args).await
    }

    /// Connects an agent to a group with the given permission level.
    pub async fn link_user_to_group(
        &self,
        user_name: &str,
        group_name: &str,
        permission: Permission,
    ) -> Result<ConsoleOutput, OtoboError> {
        let args = self
            .base(CMD_GROUP_USER_LINK)
            .opt("--user-name", user_name)
            .opt("--group-name", group_name)
            .opt("--permission", permission.as_str())
            .finish();
        self.runner.run(&args).await
    }

    /// Creates a queue owned by a group.
    pub async fn add_queue(&self, queue: &NewQueue) -> Result<ConsoleOutput, OtoboError> {
        let args = self
            .base(CMD_QUEUE_ADD)
            .opt("--name", &queue.name)
            .opt("--group", &queue.group)
            .opt_if_num("--system-address-id", queue.system_address_id)
            .opt_if("--system-address-name", queue.system_address_name.as_deref())
            .opt_if("--comment", queue.comment.as_deref())
            .opt_if_num("--unlock-timeout", queue.unlock_timeout)
            .opt_if_num("--first-response-time", queue.first_response_time)
            .opt_if_num("--update-time", queue.update_time)
            .opt_if_num("--solution-time", queue.solution_time)
            .opt_if_num("--calendar", queue.calendar)
            .finish();
        self.runner.run(&args).await
    }

    /// Lists all queues.
    pub async fn list_queues(&self) -> Result<ConsoleOutput, OtoboError> {
        let args = self.base(CMD_QUEUE_LIST).finish();
        self.runner.run(&args).await
    }

    /// Registers a webservice from a descriptor file on the server.
    ///
    /// The path must be valid where the console runs; for docker that
    /// means inside the container, so copy the descriptor there first.
    pub async fn add_webservice(
        &self,
        name: &str,
        source_path: &Path,
    ) -> Result<ConsoleOutput, OtoboError> {
        let args = self
            .base(CMD_WEBSERVICE_ADD)
            .opt("--name", name)
            .opt("--source-path", source_path.to_string_lossy())
            .finish();
        self.runner.run(&args).await
    }

    fn base(&self, command: &str) -> ConsoleArgs {
        ConsoleArgs::command(command)
            .flag_if(self.no_ansi, "--no-ansi")
            .flag_if(self.quiet, "--quiet")
    }
}

/// Small argv assembler so the command methods stay declarative.
struct ConsoleArgs {
    args: Vec<String>,
}

impl ConsoleArgs {
    fn command(name: &str) -> Self {
        ConsoleArgs {
            args: vec![name.to_string()],
        }
    }

    fn flag_if(mut self, enabled: bool, flag: &str) -> Self {
        if enabled {
            self.args.push(flag.to_string());
        }
        self
    }

    fn opt(mut self, flag: &str, value: impl AsRef<str>) -> Self {
        self.args.push(flag.to_string());
        self.args.push(value.as_ref().to_string());
        self
    }

    fn opt_if(self, flag: &str, value: Option<&str>) -> Self {
        match value {
            Some(value) => self.opt(flag, value),
            None => self,
        }
    }

    fn opt_if_num(self, flag: &str, value: Option<u32>) -> Self {
        match value {
            Some(value) => self.opt(flag, value.to_string()),
            None => self,
        }
    }

    fn repeat(mut self, flag: &str, values: &[String]) -> Self {
        for value in values {
            self = self.opt(flag, value);
        }
        self
    }

    fn finish(self) -> Vec<String> {
        self.args
    }
}
