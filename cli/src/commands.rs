use std::io::IsTerminal;
use std::io::Read;

use anyhow::Context;
use anyhow::Result;
use anyhow::bail;
use taskboard_backend_client::Client;
use taskboard_tasks_client::NewTask;
use taskboard_tasks_client::TaskBackend;
use taskboard_tasks_client::TaskId;
use taskboard_tasks_client::TaskQuery;
use taskboard_tasks_client::TaskUpdate;

use crate::cli::CreateArgs;
use crate::cli::ListArgs;
use crate::cli::LoginArgs;
use crate::cli::StatusArgs;
use crate::cli::UpdateArgs;
use crate::output::render_table;
use crate::output::render_task;

pub(crate) async fn run_login(client: &Client, args: LoginArgs) -> Result<()> {
    let password = match (args.password, args.password_stdin) {
        (Some(password), _) => password,
        (None, true) => read_password_from_stdin()?,
        (None, false) => bail!("provide a password with --password or --password-stdin"),
    };
    client.login(&args.username, &password).await?;
    println!("Logged in as {}.", args.username);
    Ok(())
}

fn read_password_from_stdin() -> Result<String> {
    let mut stdin = std::io::stdin();
    if stdin.is_terminal() {
        bail!(
            "--password-stdin expects the password on stdin. Try piping it, e.g. `printenv TASKBOARD_PASSWORD | taskboard login -u <name> --password-stdin`."
        );
    }
    let mut buffer = String::new();
    stdin
        .read_to_string(&mut buffer)
        .context("failed to read password from stdin")?;
    let password = buffer.trim_end_matches(['\r', '\n']).to_string();
    if password.is_empty() {
        bail!("No password provided via stdin.");
    }
    Ok(password)
}

pub(crate) async fn run_logout(client: &Client) -> Result<()> {
    let user = client.current_user();
    client.logout().await?;
    match user {
        Some(user) => println!("Logged out {user}."),
        None => println!("Logged out."),
    }
    Ok(())
}

pub(crate) fn run_whoami(client: &Client) {
    match (client.current_user(), client.is_logged_in()) {
        (Some(user), true) => println!("{user}"),
        (None, true) => println!("Logged in (username unknown)."),
        (_, false) => println!("Not logged in."),
    }
}

pub(crate) async fn run_list(backend: &dyn TaskBackend, args: ListArgs) -> Result<()> {
    let query = TaskQuery {
        search: args.search,
        status: args.status,
        sort: args.sort,
    };
    let tasks = query.apply(backend.list_tasks().await?);

    if args.json {
        println!("{}", serde_json::to_string_pretty(&tasks)?);
        return Ok(());
    }
    if tasks.is_empty() {
        println!("No tasks found.");
        return Ok(());
    }
    println!("{}", render_table(&tasks));
    Ok(())
}

pub(crate) async fn run_create(backend: &dyn TaskBackend, args: CreateArgs) -> Result<()> {
    let title = args.title.trim();
    if title.is_empty() {
        bail!("task title cannot be empty");
    }
    let task = backend
        .create_task(NewTask {
            title: title.to_string(),
            description: args.description,
            priority: args.priority,
            assignee: args.assignee,
            deadline: args.deadline,
            ..NewTask::default()
        })
        .await?;
    println!("Created task {}.", task.id);
    println!("{}", render_task(&task));
    Ok(())
}

pub(crate) async fn run_update(backend: &dyn TaskBackend, args: UpdateArgs) -> Result<()> {
    let update = TaskUpdate {
        title: args.title,
        description: args.description,
        status: args.status,
        priority: args.priority,
        assignee: args.assignee,
        deadline: args.deadline,
    };
    if update.is_empty() {
        bail!("nothing to update; pass at least one field flag");
    }
    let task = backend.update_task(&TaskId(args.id), update).await?;
    println!("{}", render_task(&task));
    Ok(())
}

pub(crate) async fn run_status(backend: &dyn TaskBackend, args: StatusArgs) -> Result<()> {
    let task = backend.set_status(&TaskId(args.id), args.status).await?;
    println!("Task {} is now {}.", task.id, task.status);
    Ok(())
}

pub(crate) async fn run_complete(backend: &dyn TaskBackend, id: String) -> Result<()> {
    let id = TaskId(id);
    backend.mark_completed(&id).await?;
    println!("Task {id} marked as completed.");
    Ok(())
}

pub(crate) async fn run_delete(backend: &dyn TaskBackend, id: String) -> Result<()> {
    let id = TaskId(id);
    backend.delete_task(&id).await?;
    println!("Deleted task {id}.");
    Ok(())
}
