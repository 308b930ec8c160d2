use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use lockbox::cli::commands;
use lockbox::cli::commands::import_cmd::ImportFlags;
use lockbox::cli::commands::list::Filter;
use lockbox::cli::{output, Cli, CommonAction, Commands, GroupAction};

fn main() {
    let cli = Cli::parse();

    let filter = EnvFilter::try_from_env("LOCKBOX_LOG").unwrap_or_else(|_| {
        if cli.verbose {
            EnvFilter::new("lockbox=debug")
        } else {
            EnvFilter::new("lockbox=warn")
        }
    });

    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_target(false)
                .without_time()
                .with_writer(std::io::stderr),
        )
        .init();

    let result = match cli.command {
        Commands::Init => commands::init::execute(&cli),
        Commands::Add {
            ref title,
            ref group,
            ref fields,
        } => commands::add::execute(&cli, title, group.as_deref(), fields),
        Commands::Get { id, show, copy } => commands::get::execute(&cli, id, show, copy),
        Commands::List {
            ref group,
            ref category,
            ref tag,
            entry_type,
        } => commands::list::execute(
            &cli,
            &Filter {
                group: group.as_deref(),
                category: category.as_deref(),
                tag: tag.as_deref(),
                entry_type,
            },
        ),
        Commands::Update {
            id,
            ref title,
            password,
            ref fields,
        } => commands::update::execute(&cli, id, title.as_deref(), password, fields),
        Commands::Move { id, ref group } => commands::move_cmd::execute(&cli, id, group),
        Commands::Delete { id, force } => commands::delete::execute(&cli, id, force),
        Commands::Group { ref action } => match action {
            GroupAction::List => commands::group::execute_list(&cli),
            GroupAction::Create { ref path } => commands::group::execute_create(&cli, path),
            GroupAction::Rename {
                ref path,
                ref new_name,
            } => commands::group::execute_rename(&cli, path, new_name),
            GroupAction::Delete { ref path } => commands::group::execute_delete(&cli, path),
        },
        Commands::Tags => commands::tags::execute(&cli),
        Commands::Categories => commands::categories::execute(&cli),
        Commands::Common { ref action } => match action {
            CommonAction::List => commands::common::execute_list(&cli),
            CommonAction::Add {
                ref name,
                ref notes,
            } => commands::common::execute_add(&cli, name, notes.as_deref()),
            CommonAction::Get {
                ref name,
                show,
                copy,
            } => commands::common::execute_get(&cli, name, *show, *copy),
            CommonAction::Delete { ref name, force } => {
                commands::common::execute_delete(&cli, name, *force)
            }
        },
        Commands::Import {
            ref file,
            ref group,
            update,
            create_groups,
            entry_type,
        } => commands::import_cmd::execute(
            &cli,
            file,
            &ImportFlags {
                group: group.as_deref(),
                update,
                create_groups,
                entry_type,
            },
        ),
        Commands::Export { ref output, force } => {
            commands::export::execute(&cli, output.as_deref(), force)
        }
        Commands::Backup { ref output } => commands::backup::execute(&cli, output),
        Commands::Restore { ref file } => commands::restore::execute(&cli, file),
        Commands::RotateKey => commands::rotate::execute(&cli),
        Commands::Completions { ref shell } => commands::completions::execute(shell),
    };

    if let Err(e) = result {
        output::error(&e.to_string());
        std::process::exit(1);
    }
}
