//! Colored terminal output helpers.
//!
//! All user-facing output goes through these functions so we get
//! consistent styling across every command.

use comfy_table::{ContentArrangement, Table};
use console::style;

use crate::backup::RestoreSummary;
use crate::import::ImportSummary;
use crate::repository::{CommonPassword, GroupTree, PasswordEntry};

const TIME_FORMAT: &str = "%Y-%m-%d %H:%M";

/// Print a green success message: "check_mark {msg}"
pub fn success(msg: &str) {
    println!("{} {}", style("\u{2713}").green().bold(), msg);
}

/// Print a red error message: "x_mark {msg}"
pub fn error(msg: &str) {
    eprintln!("{} {}", style("\u{2717}").red().bold(), msg);
}

/// Print a yellow warning: "warning_sign {msg}"
pub fn warning(msg: &str) {
    eprintln!("{} {}", style("\u{26a0}").yellow().bold(), msg);
}

/// Print a blue info message: "info_sign {msg}"
pub fn info(msg: &str) {
    println!("{} {}", style("\u{2139}").blue().bold(), msg);
}

/// Print a dim tip/hint: "arrow {msg}"
pub fn tip(msg: &str) {
    println!("{} {}", style("\u{2192}").dim(), style(msg).dim());
}

/// Print a table of entry metadata (Id, Title, Username, Group, Type, Tags, Updated).
pub fn print_entries_table(entries: &[PasswordEntry], groups: &GroupTree) {
    if entries.is_empty() {
        info("No matching entries.");
        tip("Run `lockbox add <TITLE>` to add an entry.");
        return;
    }

    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec![
        "Id", "Title", "Username", "Group", "Type", "Tags", "Updated",
    ]);

    for e in entries {
        table.add_row(vec![
            e.id.to_string(),
            e.title.clone(),
            e.username.clone(),
            groups.path_of(e.group_id),
            e.entry_type.label().to_string(),
            e.tags.join(", "),
            e.updated_at.format(TIME_FORMAT).to_string(),
        ]);
    }

    println!("{table}");
}

/// Print the group tree, one indented line per group with its entry count.
pub fn print_group_tree(groups: &GroupTree, count_of: impl Fn(i64) -> usize) {
    for (depth, group) in groups.walk() {
        let indent = "  ".repeat(depth);
        let count = count_of(group.id);
        println!(
            "{indent}{} {}",
            style(&group.name).bold(),
            style(format!("({count})")).dim()
        );
    }
}

/// Print a table of common passwords (Name, Created, Updated).
pub fn print_common_table(items: &[CommonPassword]) {
    if items.is_empty() {
        info("No common passwords yet.");
        tip("Run `lockbox common add <NAME>` to add one.");
        return;
    }

    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec!["Name", "Created", "Updated"]);

    for c in items {
        table.add_row(vec![
            c.name.clone(),
            c.created_at.format(TIME_FORMAT).to_string(),
            c.updated_at.format(TIME_FORMAT).to_string(),
        ]);
    }

    println!("{table}");
}

/// Print the outcome of a CSV import.
pub fn print_import_summary(summary: &ImportSummary) {
    success(&format!(
        "Imported {} new, updated {}, skipped {} duplicate(s) and {} invalid row(s)",
        summary.inserted, summary.updated, summary.skipped_duplicates, summary.skipped_invalid
    ));
    for w in &summary.warnings {
        warning(w);
    }
}

/// Print the outcome of a backup restore.
pub fn print_restore_summary(summary: &RestoreSummary) {
    success(&format!(
        "Restored {} entries into {} new group(s) ({} reused)",
        summary.entries_imported, summary.groups_created, summary.groups_reused
    ));
    if summary.entries_skipped > 0 {
        warning(&format!(
            "{} entries were skipped (missing title or password)",
            summary.entries_skipped
        ));
    }
    if summary.common_passwords_imported + summary.common_passwords_skipped > 0 {
        info(&format!(
            "Common passwords: {} restored, {} skipped",
            summary.common_passwords_imported, summary.common_passwords_skipped
        ));
    }
}

/// Mask a secret for display.
pub fn mask(secret: &str) -> String {
    "\u{2022}".repeat(secret.chars().count().clamp(4, 12))
}
