use chrono::DateTime;
use chrono::Utc;
use clap::Parser;
use taskboard_tasks_client::SortKey;
use taskboard_tasks_client::TaskPriority;
use taskboard_tasks_client::TaskStatus;
use taskboard_tasks_client::parse_datetime;

/// Manage tasks on a taskboard backend.
///
/// Credentials and `config.toml` live in `$TASKBOARD_HOME` (default
/// `~/.taskboard`).
#[derive(Debug, Parser)]
#[command(name = "taskboard", version)]
pub struct Cli {
    /// Backend origin, e.g. `https://tasks.example.com/api/v1`. Overrides
    /// `TASKBOARD_BASE_URL` and `base_url` in config.toml.
    #[arg(long, global = true, value_name = "URL")]
    pub base_url: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, clap::Subcommand)]
pub enum Command {
    /// Log in and store credentials.
    Login(LoginArgs),

    /// Forget stored credentials.
    Logout,

    /// Show the logged-in user.
    Whoami,

    /// List tasks.
    List(ListArgs),

    /// Create a task.
    Create(CreateArgs),

    /// Change fields of an existing task.
    Update(UpdateArgs),

    /// Set the status of a task.
    Status(StatusArgs),

    /// Mark a task as completed.
    Complete(TaskIdArg),

    /// Delete a task.
    Delete(TaskIdArg),

    /// Print the effective configuration.
    Config,
}

#[derive(Debug, clap::Parser)]
pub struct LoginArgs {
    #[arg(long, short = 'u')]
    pub username: String,

    /// Password on the command line. Prefer `--password-stdin`.
    #[arg(long, conflicts_with = "password_stdin")]
    pub password: Option<String>,

    /// Read the password from stdin.
    #[arg(long)]
    pub password_stdin: bool,
}

#[derive(Debug, clap::Parser)]
pub struct ListArgs {
    /// Only tasks whose title or description contains this text.
    #[arg(long, short = 's')]
    pub search: Option<String>,

    #[arg(long)]
    pub status: Option<TaskStatus>,

    #[arg(long, default_value_t = SortKey::Deadline)]
    pub sort: SortKey,

    /// Output the tasks as JSON.
    #[arg(long)]
    pub json: bool,
}

#[derive(Debug, clap::Parser)]
pub struct CreateArgs {
    #[arg(long)]
    pub title: String,

    #[arg(long, default_value = "")]
    pub description: String,

    #[arg(long, default_value_t = TaskPriority::Medium)]
    pub priority: TaskPriority,

    #[arg(long)]
    pub assignee: Option<String>,

    /// RFC 3339 timestamp or `YYYY-MM-DD`.
    #[arg(long, value_parser = parse_deadline)]
    pub deadline: Option<DateTime<Utc>>,
}

#[derive(Debug, clap::Parser)]
pub struct UpdateArgs {
    pub id: String,

    #[arg(long)]
    pub title: Option<String>,

    #[arg(long)]
    pub description: Option<String>,

    #[arg(long)]
    pub status: Option<TaskStatus>,

    #[arg(long)]
    pub priority: Option<TaskPriority>,

    #[arg(long)]
    pub assignee: Option<String>,

    #[arg(long, value_parser = parse_deadline)]
    pub deadline: Option<DateTime<Utc>>,
}

#[derive(Debug, clap::Parser)]
pub struct StatusArgs {
    pub id: String,

    /// pending, in-progress or completed.
    pub status: TaskStatus,
}

#[derive(Debug, clap::Parser)]
pub struct TaskIdArg {
    pub id: String,
}

fn parse_deadline(raw: &str) -> Result<DateTime<Utc>, String> {
    parse_datetime(raw.trim())
        .ok_or_else(|| format!("invalid deadline `{raw}` (expected RFC 3339 or YYYY-MM-DD)"))
}

#[cfg(test)]
#[expect(clippy::unwrap_used)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn parses_list_flags() {
        let cli = Cli::try_parse_from([
            "taskboard",
            "list",
            "--status",
            "in-progress",
            "--sort",
            "priority",
            "--json",
        ])
        .unwrap();
        let Command::List(args) = cli.command else {
            panic!("expected list");
        };
        assert_eq!(args.status, Some(TaskStatus::InProgress));
        assert_eq!(args.sort, SortKey::Priority);
        assert!(args.json);
    }

    #[test]
    fn rejects_password_with_password_stdin() {
        let res = Cli::try_parse_from([
            "taskboard",
            "login",
            "-u",
            "alice",
            "--password",
            "x",
            "--password-stdin",
        ]);
        assert!(res.is_err());
    }

    #[test]
    fn base_url_flag_is_global() {
        let cli =
            Cli::try_parse_from(["taskboard", "whoami", "--base-url", "http://h:1"]).unwrap();
        assert_eq!(cli.base_url.as_deref(), Some("http://h:1"));
    }

    #[test]
    fn deadline_accepts_plain_dates() {
        assert_eq!(parse_deadline("2025-03-01"), Ok(parse_datetime("2025-03-01").unwrap()));
        assert!(parse_deadline("tomorrow").is_err());
    }
}
