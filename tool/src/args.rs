//! Command line arguments.
//!
//! Parsed with clap. Every command works on one project directory; the
//! project file defaults to `<project>/project.toml`.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use relic_core::ResourceType;

/// Relic resource project tool.
#[derive(Parser, Debug)]
#[command(
    name = "relic-tool",
    about = "Inspect and maintain a relic resource project",
    long_about = "Inspect and maintain a relic resource project.\n\n\
        EXAMPLES:\n\
          # Summarize the project\n\
          relic-tool --project ./prime info\n\
        \n\
          # List every texture\n\
          relic-tool --project ./prime list --type Texture\n\
        \n\
          # Name unnamed assets from a pak listing\n\
          relic-tool --project ./prime import-names Metroid1.contents.txt --unnamed-only",
    version
)]
pub struct Args {
    /// Project root directory.
    #[arg(long, short)]
    pub project: PathBuf,

    /// Project file to use instead of `<project>/project.toml`.
    #[arg(long)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Print the game, entry counts and dirty state.
    Info,
    /// List entries as id, type and path.
    List {
        /// Only list entries of this type (e.g. `Model`, `Texture`).
        #[arg(long = "type", value_parser = parse_resource_type)]
        resource_type: Option<ResourceType>,
    },
    /// Report entries whose cooked file is missing.
    Check,
    /// Rename entries from a pak `.contents.txt` listing and save.
    ImportNames {
        /// Listing file.
        file: PathBuf,
        /// Leave entries that already have a real name alone.
        #[arg(long)]
        unnamed_only: bool,
    },
}

fn parse_resource_type(name: &str) -> Result<ResourceType, String> {
    ResourceType::from_name(name)
        .or_else(|| ResourceType::from_cooked_extension(name))
        .filter(|ty| *ty != ResourceType::Invalid)
        .ok_or_else(|| format!("unknown resource type: {name}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resource_type_by_name_or_extension() {
        assert_eq!(parse_resource_type("Texture"), Ok(ResourceType::Texture));
        assert_eq!(parse_resource_type("cmdl"), Ok(ResourceType::Model));
        assert!(parse_resource_type("Invalid").is_err());
        assert!(parse_resource_type("Nope").is_err());
    }

    #[test]
    fn parse_list_with_filter() {
        let args = Args::try_parse_from(["relic-tool", "--project", "prime", "list", "--type", "Scan"])
            .unwrap();
        assert_eq!(args.project, PathBuf::from("prime"));
        assert_eq!(
            args.command,
            Command::List {
                resource_type: Some(ResourceType::Scan)
            }
        );
    }

    #[test]
    fn parse_import_names() {
        let args = Args::try_parse_from([
            "relic-tool",
            "-p",
            "prime",
            "--config",
            "alt.toml",
            "import-names",
            "Metroid1.contents.txt",
            "--unnamed-only",
        ])
        .unwrap();
        assert_eq!(args.config, Some(PathBuf::from("alt.toml")));
        assert_eq!(
            args.command,
            Command::ImportNames {
                file: PathBuf::from("Metroid1.contents.txt"),
                unnamed_only: true,
            }
        );
    }

    #[test]
    fn project_is_required() {
        assert!(Args::try_parse_from(["relic-tool", "info"]).is_err());
    }
}
