use crate::*;

/// Load the connection, build the client and authenticate. The client only
/// echoes requests at high verbosity; everything below that stays quiet.
fn connect(cli: &Cli, connection: &str) -> anyhow::Result<RestClient> {
    let conn = load_connection(&cli.credentials_file, connection, cli.verbosity)?;
    if cli.verbosity > 0 {
        println!("INFO: initializing the API and authenticating");
    }
    let client_verbosity = if cli.verbosity > 2 { cli.verbosity } else { 0 };
    let client = RestClient::new(&conn, cli.read_only, client_verbosity)?;
    client.authenticate()?;
    client.probe();
    if cli.verbosity > 1 {
        let info = client.info();
        println!(
            "INFO: connected to {} (api {}, user {})",
            info.host,
            info.api.as_deref().unwrap_or("unknown"),
            info.user.as_deref().unwrap_or("unknown")
        );
    }
    Ok(client)
}

pub fn handle_export(
    cli: &Cli,
    connection: &str,
    structures: &[String],
    datafile: &str,
    opts: ExportOptions,
) -> anyhow::Result<()> {
    let client = connect(cli, connection)?;
    let mut exporter = Exporter::new(&client, opts, cli.verbosity);
    let written = exporter.export_structures(structures, datafile)?;
    if cli.verbosity > 0 {
        println!("INFO: exported {} data structure(s)", written.len());
    }
    Ok(())
}

pub fn handle_create(
    cli: &Cli,
    connection: &str,
    datafile: &str,
    structure: &str,
) -> anyhow::Result<()> {
    let client = connect(cli, connection)?;
    let mut importer = Importer::new(&client, cli.verbosity);
    importer.create_from_file(datafile, structure)?;
    Ok(())
}

pub fn handle_update(structure: &str) -> anyhow::Result<()> {
    println!("WARNING: updating the existing data structure {structure} isn't implemented yet");
    Ok(())
}

pub fn handle_list(cli: &Cli, connection: &str) -> anyhow::Result<()> {
    let client = connect(cli, connection)?;
    let rows = client.search_read(StructureRecord::MODEL, &serde_json::json!([]), &["name"], None)?;
    for row in &rows {
        if let Some(name) = row.get("name").and_then(serde_json::Value::as_str) {
            println!("{name}");
        }
    }
    if cli.verbosity > 0 {
        println!(
            "INFO: {} data structure(s) on {}",
            rows.len(),
            client.info().host
        );
    }
    Ok(())
}
