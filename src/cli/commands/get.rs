//! `lockbox get`: show one entry, optionally revealing or copying its password.

use console::style;

use crate::cli::output;
use crate::cli::{copy_to_clipboard, open_unlocked, Cli};
use crate::errors::Result;

/// Execute the `get` command.
pub fn execute(cli: &Cli, id: i64, show: bool, copy: bool) -> Result<()> {
    let session = open_unlocked(cli)?;
    let repo = session.repo();

    let secrets = repo.load_entry(id)?;
    let groups = repo.group_tree()?;
    let entry = &secrets.entry;

    let password = if show {
        secrets.password.clone()
    } else {
        output::mask(&secrets.password)
    };

    let rows = [
        ("Title", entry.title.clone()),
        ("Username", entry.username.clone()),
        ("Password", password),
        ("URL", entry.url.clone()),
        ("Group", groups.path_of(entry.group_id)),
        ("Type", entry.entry_type.label().to_string()),
        ("Category", entry.category.clone()),
        ("Tags", entry.tags.join(", ")),
        ("Created", entry.created_at.format("%Y-%m-%d %H:%M:%S").to_string()),
        ("Updated", entry.updated_at.format("%Y-%m-%d %H:%M:%S").to_string()),
    ];
    for (label, value) in rows {
        println!("{:>9}  {value}", style(label).bold());
    }
    if !secrets.notes.is_empty() {
        println!("{:>9}", style("Notes").bold());
        for line in secrets.notes.lines() {
            println!("           {line}");
        }
    }

    if copy {
        copy_to_clipboard(&secrets.password)?;
        output::success("Password copied to clipboard");
    }

    Ok(())
}
