use crate::*;
use std::path::Path;

pub fn handle_scaffold(_cli: &Cli) -> anyhow::Result<()> {
    write_scaffold(Path::new(SCAFFOLD_CREDENTIALS_FILE))?;
    println!("INFO: a scaffold credentials file has been written to {SCAFFOLD_CREDENTIALS_FILE}");
    Ok(())
}
