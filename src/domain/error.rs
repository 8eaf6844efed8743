/// Typed failures surfaced to the user; everything else travels as
/// `anyhow::Error` with context.
#[derive(thiserror::Error, Debug)]
pub enum SyncError {
    #[error("could not find connection {0} in credentials file {1}")]
    UnknownConnection(String, String),
    #[error("no data structure named {0} on the remote system")]
    StructureNotFound(String),
    #[error("no model with technical name {0} on the remote system")]
    ModelNotFound(String),
    #[error("no field named {0} on model {1} on the remote system")]
    FieldNotFound(String, String),
    #[error("a data structure named {0} already exists on the remote system")]
    StructureExists(String),
    #[error("could not find the data_structure entry in data file {0}")]
    MalformedDocument(String),
    #[error("{0} reference {1} carries no exported natural key, cannot resolve it on the target system")]
    MissingNaturalKey(&'static str, i64),
}
