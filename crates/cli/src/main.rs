use anyhow::{bail, Result};
use clap::{Parser, Subcommand, ValueEnum};
use fieldref::commands::{
    add_binary_command, export_xrefs_command, index_command, init_project_command,
    list_binaries_command, project_info_command, xrefs_command, FieldSelector, IndexScope,
};
use fieldref::parse_address;

/// Structure field cross-reference indexer CLI.
///
/// This CLI is a thin wrapper around `fieldref-core` (exposed in code as `fieldref_core`).
/// All substantive logic lives in the library so it can be tested thoroughly
/// and reused from other frontends.
#[derive(Parser, Debug)]
#[command(
    name = "fieldref",
    version,
    about = "Index and query structure field usages in decompiled pseudocode",
    long_about = None
)]
struct Cli {
    /// Log verbosity (written to stderr).
    #[arg(long, value_enum, global = true, default_value_t = LogLevel::Warn)]
    log_level: LogLevel,

    #[command(subcommand)]
    command: Command,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl From<LogLevel> for log::LevelFilter {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Trace => log::LevelFilter::Trace,
            LogLevel::Debug => log::LevelFilter::Debug,
            LogLevel::Info => log::LevelFilter::Info,
            LogLevel::Warn => log::LevelFilter::Warn,
            LogLevel::Error => log::LevelFilter::Error,
        }
    }
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Initialize a new fieldref project at the given root.
    ///
    /// This will:
    /// - Create a `.fieldref` metadata directory and a `reports` directory.
    /// - Write a `.fieldref/project.json` config file.
    /// - Create the project database.
    InitProject {
        /// Project root directory. Defaults to the current working directory.
        #[arg(long, default_value = ".")]
        root: String,

        /// Optional project name. If omitted, the name is derived from the root directory.
        #[arg(long)]
        name: Option<String>,

        /// Keep the xref index in memory only; never read or write it from the database.
        #[arg(long, default_value_t = false)]
        no_persist_xrefs: bool,
    },

    /// Show basic information about an existing fieldref project.
    ///
    /// This reads `.fieldref/project.json` and reports key paths, config values,
    /// and the index state of every registered binary.
    ProjectInfo {
        /// Project root directory. Defaults to the current working directory.
        #[arg(long, default_value = ".")]
        root: String,

        /// Emit JSON instead of human-readable text.
        #[arg(long, default_value_t = false)]
        json: bool,
    },

    /// Register a program dump (JSON or YAML) in the project database.
    ///
    /// This does not index anything; it records where the dump lives
    /// relative to the project root.
    AddBinary {
        /// Project root directory. Defaults to the current working directory.
        #[arg(long, default_value = ".")]
        root: String,

        /// Path to the program dump to register.
        #[arg(long)]
        path: String,

        /// Optional human-friendly name. Defaults to the file name.
        #[arg(long)]
        name: Option<String>,

        /// Optional architecture hint (e.g., armv7, x86_64).
        #[arg(long)]
        arch: Option<String>,

        /// Optional precomputed hash. If omitted, the CLI computes SHA-256 unless `--skip-hash` is set.
        #[arg(long)]
        hash: Option<String>,

        /// Skip hash computation (stores no hash).
        #[arg(long, default_value_t = false)]
        skip_hash: bool,
    },

    /// List all binaries registered in the project database.
    ///
    /// Shows name, path, arch, and hash if available.
    ListBinaries {
        /// Project root directory. Defaults to the current working directory.
        #[arg(long, default_value = ".")]
        root: String,

        /// Emit JSON instead of human-readable text.
        #[arg(long, default_value_t = false)]
        json: bool,
    },

    /// Index structure field usages of a registered binary.
    ///
    /// Without `--function` every function in the dump is indexed.
    Index {
        /// Project root directory. Defaults to the current working directory.
        #[arg(long, default_value = ".")]
        root: String,

        /// Registered binary name.
        #[arg(long)]
        binary: String,

        /// Index only this function (decimal or 0x-prefixed hex address).
        #[arg(long, value_parser = parse_address_arg)]
        function: Option<u64>,

        /// Also index everything transitively called from `--function`.
        #[arg(long, default_value_t = false, requires = "function")]
        closure: bool,

        /// Emit JSON instead of human-readable text.
        #[arg(long, default_value_t = false)]
        json: bool,
    },

    /// Show recorded usages of one structure field.
    ///
    /// Results are sorted by function address, then by offset inside the function.
    Xrefs {
        /// Project root directory. Defaults to the current working directory.
        #[arg(long, default_value = ".")]
        root: String,

        /// Registered binary name.
        #[arg(long)]
        binary: String,

        /// Composite type name or numeric ordinal.
        #[arg(long = "type")]
        type_name: String,

        /// Field name (requires a known layout for the type).
        #[arg(long, conflicts_with = "offset", required_unless_present = "offset")]
        field: Option<String>,

        /// Field offset in bytes (decimal or 0x-prefixed hex).
        #[arg(long, value_parser = parse_address_arg)]
        offset: Option<u64>,

        /// Emit JSON instead of human-readable text.
        #[arg(long, default_value_t = false)]
        json: bool,
    },

    /// Export every recorded usage of a binary as a JSON report.
    ///
    /// Defaults to `reports/<binary>.xrefs.json` under the project root.
    ExportXrefs {
        /// Project root directory. Defaults to the current working directory.
        #[arg(long, default_value = ".")]
        root: String,

        /// Registered binary name.
        #[arg(long)]
        binary: String,

        /// Output path for the report.
        #[arg(long)]
        output: Option<String>,
    },
}

fn parse_address_arg(text: &str) -> Result<u64, String> {
    parse_address(text).map_err(|e| e.to_string())
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    env_logger::Builder::new()
        .filter_level(cli.log_level.into())
        .format_timestamp(None)
        .init();

    match cli.command {
        Command::InitProject { root, name, no_persist_xrefs } => {
            init_project_command(&root, name, !no_persist_xrefs)?
        }
        Command::ProjectInfo { root, json } => project_info_command(&root, json)?,
        Command::AddBinary { root, path, name, arch, hash, skip_hash } => {
            add_binary_command(&root, &path, name, arch, hash, skip_hash)?
        }
        Command::ListBinaries { root, json } => list_binaries_command(&root, json)?,
        Command::Index { root, binary, function, closure, json } => {
            let scope = match (function, closure) {
                (Some(address), true) => IndexScope::Closure(address),
                (Some(address), false) => IndexScope::Function(address),
                (None, _) => IndexScope::All,
            };
            index_command(&root, &binary, scope, json)?
        }
        Command::Xrefs { root, binary, type_name, field, offset, json } => {
            let selector = match (field, offset) {
                (Some(name), _) => FieldSelector::Name(name),
                (None, Some(offset)) => FieldSelector::Offset(offset),
                (None, None) => bail!("Either --field or --offset is required"),
            };
            xrefs_command(&root, &binary, &type_name, selector, json)?
        }
        Command::ExportXrefs { root, binary, output } => {
            export_xrefs_command(&root, &binary, output)?
        }
    }

    Ok(())
}
