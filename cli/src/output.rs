use taskboard_tasks_client::Task;

const HEADERS: [&str; 6] = ["ID", "Status", "Priority", "Deadline", "Assignee", "Title"];

fn row(task: &Task) -> [String; 6] {
    [
        task.id.to_string(),
        task.status.to_string(),
        task.priority.to_string(),
        task.deadline
            .map(|d| d.format("%Y-%m-%d").to_string())
            .unwrap_or_else(|| "-".to_string()),
        task.assignee.clone().unwrap_or_else(|| "-".to_string()),
        task.title.clone(),
    ]
}

/// Column-aligned table, one task per line. The last column is not padded.
pub(crate) fn render_table(tasks: &[Task]) -> String {
    let rows: Vec<[String; 6]> = tasks.iter().map(row).collect();
    let mut widths = HEADERS.map(str::len);
    for row in &rows {
        for (i, cell) in row.iter().enumerate() {
            widths[i] = widths[i].max(cell.chars().count());
        }
    }

    let format_line = |cells: [&str; 6]| {
        let mut line = String::new();
        for (i, cell) in cells.iter().enumerate() {
            if i + 1 == cells.len() {
                line.push_str(cell);
            } else {
                line.push_str(&format!("{cell:<width$}  ", width = widths[i]));
            }
        }
        line
    };

    let mut out = format_line(HEADERS);
    for row in &rows {
        out.push('\n');
        out.push_str(&format_line([
            &row[0], &row[1], &row[2], &row[3], &row[4], &row[5],
        ]));
    }
    out
}

pub(crate) fn render_task(task: &Task) -> String {
    let mut lines = vec![format!("{} {}", task.id, task.title)];
    lines.push(format!("  status: {}", task.status));
    lines.push(format!("  priority: {}", task.priority));
    if !task.description.is_empty() {
        lines.push(format!("  description: {}", task.description));
    }
    if let Some(assignee) = &task.assignee {
        lines.push(format!("  assignee: {assignee}"));
    }
    if let Some(deadline) = task.deadline {
        lines.push(format!("  deadline: {}", deadline.to_rfc3339()));
    }
    lines.join("\n")
}
