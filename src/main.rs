//! otobo-admin - provisioning tool for OTOBO/Znuny instances
//!
//! Wraps the `otobo.Console.pl` admin commands and the webservice
//! descriptor tooling in one CLI, so a fresh instance can be prepared for
//! API access without touching the web UI.
//!
//! # Usage
//!
//! ```bash
//! # Provision a group, an agent, and a queue (docker mode, the default)
//! otobo-admin add-group --name itsm
//! otobo-admin add-user --user-name jdoe --first-name Jane --last-name Doe \
//!     --email-address jdoe@example.com --group itsm
//! otobo-admin add-queue --name Support --group itsm
//!
//! # Generate a descriptor, or write and register it in one go
//! otobo-admin generate-webservice --name Support --restrict-user api_agent
//! otobo-admin install-webservice --name Support --file /opt/otobo/var/support.yml
//!
//! # Against a local installation instead of docker
//! otobo-admin --local list-queues
//! ```
//!
//! Commands run inside the `otobo-web-1` container by default; use
//! `--container` to pick another one, or `--local` (optionally with
//! `--console-path`) for a non-docker installation.

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use tracing_subscriber::{fmt, EnvFilter};

use otobo_client::console::{
    CommandRunner, ConsoleOutput, NewGroup, NewQueue, NewUser, OtoboConsole, Permission,
    DEFAULT_CONTAINER,
};
use otobo_client::operation::TicketOperation;
use otobo_client::webservice::{is_valid_webservice_name, Webservice, WebserviceBuilder};

#[derive(Parser)]
#[command(name = "otobo-admin", version, about = "Provision OTOBO/Znuny agents, queues, and webservices")]
struct Cli {
    #[command(flatten)]
    console: ConsoleOpts,

    #[command(subcommand)]
    command: Command,
}

/// Where the admin console runs.
#[derive(Args)]
struct ConsoleOpts {
    /// Docker container running OTOBO.
    #[arg(long, global = true, env = "OTOBO_CONTAINER", default_value = DEFAULT_CONTAINER)]
    container: String,

    /// Run a local otobo.Console.pl instead of docker exec.
    #[arg(long, global = true)]
    local: bool,

    /// Console script path (implies --local).
    #[arg(long, global = true, env = "OTOBO_CONSOLE_PATH", value_name = "PATH")]
    console_path: Option<String>,
}

#[derive(Subcommand)]
enum Command {
    /// Create an agent account.
    AddUser {
        /// Login name of the agent.
        #[arg(long)]
        user_name: String,
        /// First name.
        #[arg(long)]
        first_name: String,
        /// Last name.
        #[arg(long)]
        last_name: String,
        /// Email address.
        #[arg(long)]
        email_address: String,
        /// Initial password; the console generates one when omitted.
        #[arg(long)]
        password: Option<String>,
        /// Group to add the agent to; repeatable.
        #[arg(long = "group", value_name = "GROUP")]
        groups: Vec<String>,
    },

    /// Create a group.
    AddGroup {
        /// Group name.
        #[arg(long)]
        name: String,
        /// Optional comment.
        #[arg(long)]
        comment: Option<String>,
    },

    /// Connect an agent to a group.
    LinkUserGroup {
        /// Login name of the agent.
        #[arg(long)]
        user_name: String,
        /// Group to link to.
        #[arg(long)]
        group_name: String,
        /// Permission level: ro, move_into, create, owner, priority, rw.
        #[arg(long, default_value = "rw")]
        permission: Permission,
    },

    /// Create a queue owned by a group.
    AddQueue {
        /// Queue name.
        #[arg(long)]
        name: String,
        /// Group that owns the queue.
        #[arg(long)]
        group: String,
        /// Id of an existing sender address for outgoing mail.
        #[arg(long)]
        system_address_id: Option<u32>,
        /// Sender address for outgoing mail from the queue.
        #[arg(long)]
        system_address_name: Option<String>,
        /// Optional comment.
        #[arg(long)]
        comment: Option<String>,
        /// Minutes until a locked ticket unlocks automatically.
        #[arg(long)]
        unlock_timeout: Option<u32>,
        /// Minutes until the first response escalates.
        #[arg(long)]
        first_response_time: Option<u32>,
        /// Minutes until a pending update escalates.
        #[arg(long)]
        update_time: Option<u32>,
        /// Minutes until the solution escalates.
        #[arg(long)]
        solution_time: Option<u32>,
        /// Number of the working-hours calendar used for escalations.
        #[arg(long)]
        calendar: Option<u32>,
    },

    /// List all queues.
    ListQueues,

    /// Generate a webservice descriptor.
    GenerateWebservice {
        /// Webservice name.
        #[arg(long)]
        name: String,
        /// Operation to expose (create, get, search, update); repeatable.
        /// Defaults to all four.
        #[arg(long = "op", value_name = "OPERATION")]
        operations: Vec<TicketOperation>,
        /// Restrict the webservice to this agent login.
        #[arg(long = "restrict-user", value_name = "LOGIN")]
        restrict_to_user: Option<String>,
        /// Framework version to stamp into the descriptor.
        #[arg(long, value_name = "VERSION")]
        framework_version: Option<String>,
        /// Write to this file instead of stdout.
        #[arg(long = "file", value_name = "PATH")]
        output: Option<PathBuf>,
    },

    /// Generate a descriptor, write it, and register it with the instance.
    InstallWebservice {
        /// Webservice name.
        #[arg(long)]
        name: String,
        /// Operation to expose (create, get, search, update); repeatable.
        /// Defaults to all four.
        #[arg(long = "op", value_name = "OPERATION")]
        operations: Vec<TicketOperation>,
        /// Restrict the webservice to this agent login.
        #[arg(long = "restrict-user", value_name = "LOGIN")]
        restrict_to_user: Option<String>,
        /// Framework version to stamp into the descriptor.
        #[arg(long, value_name = "VERSION")]
        framework_version: Option<String>,
        /// Where to write the descriptor before registering it. Must be
        /// reachable by the console; with docker, use a bind-mounted path
        /// or copy the file into the container first. Defaults to
        /// `<name>.yml` in the current directory.
        #[arg(long = "file", value_name = "PATH")]
        descriptor_path: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() {
    // Load .env file if present (ignore errors if not found)
    dotenvy::dotenv().ok();

    fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("otobo_client=info")),
        )
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .init();

    let cli = Cli::parse();
    if let Err(e) = run(cli).await {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    let Cli { console, command } = cli;

    match command {
        Command::AddUser {
            user_name,
            first_name,
            last_name,
            email_address,
            password,
            groups,
        } => {
            let user = NewUser {
                user_name,
                first_name,
                last_name,
                email_address,
                password,
                groups,
            };
            let output = admin_console(&console).add_user(&user).await?;
            report("add-user", output)
        }

        Command::AddGroup { name, comment } => {
            let group = NewGroup { name, comment };
            let output = admin_console(&console).add_group(&group).await?;
            report("add-group", output)
        }

        Command::LinkUserGroup {
            user_name,
            group_name,
            permission,
        } => {
            let output = admin_console(&console)
                .link_user_to_group(&user_name, &group_name, permission)
                .await?;
            report("link-user-group", output)
        }

        Command::AddQueue {
            name,
            group,
            system_address_id,
            system_address_name,
            comment,
            unlock_timeout,
            first_response_time,
            update_time,
            solution_time,
            calendar,
        } => {
            let queue = NewQueue {
                name,
                group,
                system_address_id,
                system_address_name,
                comment,
                unlock_timeout,
                first_response_time,
                update_time,
                solution_time,
                calendar,
            };
            let output = admin_console(&console).add_queue(&queue).await?;
            report("add-queue", output)
        }

        Command::ListQueues => {
            let output = admin_console(&console).list_queues().await?;
            report("list-queues", output)
        }

        Command::GenerateWebservice {
            name,
            operations,
            restrict_to_user,
            framework_version,
            output,
        } => {
            let descriptor = build_descriptor(
                &name,
                &operations,
                restrict_to_user.as_deref(),
                framework_version.as_deref(),
            )?;
            match output {
                Some(path) => {
                    descriptor
                        .save(&path)
                        .with_context(|| format!("failed to write {}", path.display()))?;
                    println!("Wrote webservice descriptor to {}", path.display());
                }
                None => {
                    print!("{}", descriptor.to_yaml()?);
                }
            }
            Ok(())
        }

        Command::InstallWebservice {
            name,
            operations,
            restrict_to_user,
            framework_version,
            descriptor_path,
        } => {
            let descriptor = build_descriptor(
                &name,
                &operations,
                restrict_to_user.as_deref(),
                framework_version.as_deref(),
            )?;
            let path =
                descriptor_path.unwrap_or_else(|| PathBuf::from(format!("{}.yml", name)));
            descriptor
                .save(&path)
                .with_context(|| format!("failed to write {}", path.display()))?;
            println!("Wrote webservice descriptor to {}", path.display());

            let output = admin_console(&console).add_webservice(&name, &path).await?;
            report("install-webservice", output)
        }
    }
}

fn admin_console(opts: &ConsoleOpts) -> OtoboConsole {
    let runner = if opts.local || opts.console_path.is_some() {
        let runner = CommandRunner::local();
        match &opts.console_path {
            Some(path) => runner.with_executable(path.as_str()),
            None => runner,
        }
    } else {
        CommandRunner::docker(opts.container.as_str())
    };
    OtoboConsole::new(runner)
}

fn build_descriptor(
    name: &str,
    operations: &[TicketOperation],
    restrict_to_user: Option<&str>,
    framework_version: Option<&str>,
) -> Result<Webservice> {
    if !is_valid_webservice_name(name) {
        bail!(
            "invalid webservice name '{}': use a letter followed by letters, digits, '-' or '_'",
            name
        );
    }

    let mut builder = WebserviceBuilder::new(name);
    let requested = if operations.is_empty() {
        TicketOperation::ALL.to_vec()
    } else {
        operations.to_vec()
    };
    for operation in requested {
        builder = builder.enable(operation);
    }
    if let Some(user) = restrict_to_user {
        builder = builder.restrict_to_user(user);
    }
    if let Some(version) = framework_version {
        builder = builder.framework_version(version);
    }

    builder
        .build()
        .context("failed to build webservice descriptor")
}

/// Prints captured console output and turns non-zero exits into errors.
fn report(command: &str, output: ConsoleOutput) -> Result<()> {
    if !output.stdout.is_empty() {
        println!("{}", output.stdout);
    }
    if output.ok() {
        return Ok(());
    }
    if !output.stderr.is_empty() {
        eprintln!("{}", output.stderr);
    }
    bail!("{} exited with code {}", command, output.code)
}
