//! odoosync - export and import Odoo data structures over the MuK REST API.
//!
//! A data structure is a tree: the root record owns ordered collections of
//! generator and parser nodes, generators additionally own per-language
//! keyword mappings. `export` flattens such a tree into a portable JSON
//! document in which every cross-system reference carries its natural key;
//! `create` rebuilds the tree on a (possibly different) system by resolving
//! those keys back to local ids and issuing a single nested create call.

pub mod cli;
pub mod commands;
pub mod domain;
pub mod services;

pub use cli::{
    Cli, Commands, DEFAULT_CREDENTIALS_FILE, DEFAULT_DATA_FILE, SCAFFOLD_CREDENTIALS_FILE,
};
pub use domain::error::SyncError;
pub use domain::orm::{ManyToOne, OrmCommand};
pub use domain::records::{
    ExportDocument, GeneratorRecord, LangMappingRecord, ParserRecord, StructureRecord,
};
pub use services::client::{Method, RemoteApi, RemoteInfo, RestClient, ERROR_ARTIFACT};
pub use services::credentials::{
    load_connection, write_scaffold, AuthKind, Connection, ResolvedConnection,
};
pub use services::exporter::{ExportOptions, Exporter};
pub use services::importer::Importer;
pub use services::resolver::Resolver;

pub fn run(cli: &Cli) -> anyhow::Result<()> {
    match &cli.command {
        Commands::Export {
            connection,
            structure,
            datafile,
            export_ilike,
            export_meta,
            export_no_import,
        } => commands::handle_export(
            cli,
            connection,
            structure,
            datafile,
            ExportOptions {
                export_meta: *export_meta,
                export_no_import: *export_no_import,
                partial_match: *export_ilike,
            },
        ),
        Commands::Create {
            connection,
            datafile,
            structure,
        } => commands::handle_create(cli, connection, datafile, structure),
        Commands::Update { structure, .. } => commands::handle_update(structure),
        Commands::List { connection } => commands::handle_list(cli, connection),
        Commands::Scaffold => commands::handle_scaffold(cli),
    }
}
