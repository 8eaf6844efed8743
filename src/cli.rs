use clap::{ArgAction, Parser, Subcommand};

pub const DEFAULT_CREDENTIALS_FILE: &str = "default_credentials.json";
pub const DEFAULT_DATA_FILE: &str = "default_data_structure.json";
pub const SCAFFOLD_CREDENTIALS_FILE: &str = "example_credentials.json";

#[derive(Parser, Debug)]
#[command(
    name = "odoosync",
    version,
    about = "Export / import tool to read a data structure from Odoo recursively and save it as a \
             json file - or to read a json file and create a data structure in Odoo recursively"
)]
pub struct Cli {
    #[arg(
        short = 'r',
        long,
        global = true,
        help = "do not send / update data to Odoo, just simulate; data can still be read"
    )]
    pub read_only: bool,
    #[arg(
        short = 'c',
        long,
        global = true,
        default_value = DEFAULT_CREDENTIALS_FILE,
        help = "the json file to read credentials from"
    )]
    pub credentials_file: String,
    #[arg(
        short = 'v',
        long = "verbose",
        global = true,
        action = ArgAction::Count,
        help = "by default only warnings and errors are printed; repeat to also show progress \
                (-v), received data (-vv), sent payloads and routes (-vvv), everything (-vvvv)"
    )]
    pub verbosity: u8,
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Search data structures by name and export each one recursively to a
    /// json file
    Export {
        /// Connection name; its parameters come from the credentials file
        connection: String,
        /// Names of the data structures to export; omit to export all of
        /// them, in which case `{}` in the data file name stands in for the
        /// sanitized structure name
        structure: Vec<String>,
        #[arg(
            short = 'd',
            long,
            default_value = DEFAULT_DATA_FILE,
            help = "the json file to write the data structure to; '{}' is replaced with a \
                    sanitized structure name"
        )]
        datafile: String,
        #[arg(
            short = 'i',
            long,
            help = "yield all structures partially matching the given name instead of a full match"
        )]
        export_ilike: bool,
        #[arg(short = 'm', long, help = "also export meta data")]
        export_meta: bool,
        #[arg(short = 'n', long, help = "also export non-importable fields")]
        export_no_import: bool,
    },
    /// Read a json data file and create a new data structure in Odoo
    /// recursively
    Create {
        /// Connection name; its parameters come from the credentials file
        connection: String,
        /// The json file to read the data structure from
        datafile: String,
        /// Name of the data structure to create; a structure with the same
        /// name must not already exist
        structure: String,
    },
    /// Update an existing data structure in Odoo (not implemented yet)
    Update {
        /// Connection name; its parameters come from the credentials file
        connection: String,
        /// The json file to read the data structure from
        datafile: String,
        /// Name of the data structure to update
        structure: String,
    },
    /// List the names of the data structures present on the remote system
    List {
        /// Connection name; its parameters come from the credentials file
        connection: String,
    },
    /// Write an example credentials file to example_credentials.json
    Scaffold,
}
