use clap::Parser;

fn main() -> anyhow::Result<()> {
    let cli = odoosync::Cli::parse();
    odoosync::run(&cli)
}
