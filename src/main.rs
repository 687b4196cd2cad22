use std::future::Future;
use std::time::Duration;

use anyhow::{anyhow, Result};
use clap::{Arg, ArgMatches, Command};
use serde_json::json;
use tracing::info;

use drivetree::config::Config;
use drivetree::models::{ArchivePath, DocumentKind, DEFAULT_TREE_DEPTH, ROOT_FOLDER_ID};
use drivetree::ArchiveService;

fn cli() -> Command {
    Command::new("drivetree")
        .about("Resolve archive folders and render folder trees from Google Drive")
        .subcommand_required(true)
        .subcommand(
            Command::new("resolve")
                .about("Find or create a chain of folders and print the last id")
                .arg(
                    Arg::new("segments")
                        .help("Folder names, outermost first")
                        .required(true)
                        .num_args(1..),
                )
                .arg(
                    Arg::new("parent")
                        .help("Folder to start from")
                        .long("parent")
                        .short('p')
                        .value_name("ID")
                        .default_value(ROOT_FOLDER_ID),
                ),
        )
        .subcommand(
            Command::new("files")
                .about("List the files of a folder, newest first")
                .arg(
                    Arg::new("folder")
                        .help("Folder id")
                        .long("folder")
                        .short('f')
                        .value_name("ID")
                        .conflicts_with_all(["year", "month", "type"]),
                )
                .arg(Arg::new("year").long("year").value_name("YEAR"))
                .arg(Arg::new("month").long("month").value_name("MONTH"))
                .arg(
                    Arg::new("type")
                        .long("type")
                        .value_name("TYPE")
                        .value_parser(["facturas_emitidas", "facturas_recibidas"]),
                ),
        )
        .subcommand(
            Command::new("tree")
                .about("Print the folder tree as JSON")
                .arg(
                    Arg::new("folder")
                        .help("Folder to start from (defaults to the archive root)")
                        .long("folder")
                        .short('f')
                        .value_name("ID"),
                )
                .arg(
                    Arg::new("depth")
                        .help("Maximum depth to expand")
                        .long("depth")
                        .short('d')
                        .value_name("N")
                        .value_parser(clap::value_parser!(usize))
                        .default_value("4"),
                ),
        )
}

/// Applies the optional whole-request deadline from the config
async fn with_deadline<T, F>(config: &Config, operation: F) -> Result<T>
where
    F: Future<Output = drivetree::Result<T>>,
{
    match config.request_deadline_seconds {
        Some(seconds) => tokio::time::timeout(Duration::from_secs(seconds), operation)
            .await
            .map_err(|_| anyhow!("Operation did not finish within {} seconds", seconds))?
            .map_err(Into::into),
        None => operation.await.map_err(Into::into),
    }
}

async fn run_files(service: &ArchiveService, config: &Config, matches: &ArgMatches) -> Result<serde_json::Value> {
    let folder_id = match matches.get_one::<String>("folder") {
        Some(folder_id) => folder_id.clone(),
        None => {
            let (Some(year), Some(month), Some(kind)) = (
                matches.get_one::<String>("year"),
                matches.get_one::<String>("month"),
                matches.get_one::<String>("type"),
            ) else {
                return Err(anyhow!("Missing required parameters: --folder or (--year, --month, --type)"));
            };
            let kind: DocumentKind = kind.parse()?;
            let path = ArchivePath::new(year.as_str(), month.as_str(), kind);
            with_deadline(config, service.resolve_archive_folder(&path)).await?
        }
    };

    let files = with_deadline(config, service.list_folder_files(&folder_id)).await?;
    Ok(json!({
        "folderId": folder_id,
        "files": files,
    }))
}

#[tokio::main]
async fn main() -> Result<()> {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("drivetree=info,warn"));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();

    let matches = cli().get_matches();

    let config = Config::from_env()?;
    let service = ArchiveService::from_drive_config(config.drive_config(), config.concurrency_config())?;

    let output = match matches.subcommand() {
        Some(("resolve", sub)) => {
            let segments: Vec<String> = sub
                .get_many::<String>("segments")
                .map(|values| values.cloned().collect())
                .unwrap_or_default();
            let parent = sub
                .get_one::<String>("parent")
                .map(String::as_str)
                .unwrap_or(ROOT_FOLDER_ID);

            let folder_id = with_deadline(&config, service.resolve_or_create_path(parent, segments.as_slice())).await?;
            json!({ "folderId": folder_id })
        }
        Some(("files", sub)) => run_files(&service, &config, sub).await?,
        Some(("tree", sub)) => {
            let depth = sub
                .get_one::<usize>("depth")
                .copied()
                .unwrap_or(DEFAULT_TREE_DEPTH);

            let tree = match sub.get_one::<String>("folder") {
                Some(folder_id) => with_deadline(&config, service.build_tree(folder_id, depth)).await?,
                None => with_deadline(&config, service.archive_tree(depth)).await?,
            };
            info!("Tree has {} nodes", tree.node_count());
            serde_json::to_value(&tree)?
        }
        _ => return Err(anyhow!("Unknown command")),
    };

    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}
