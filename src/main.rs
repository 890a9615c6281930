use clap::{Parser, Subcommand};
use sigbank::lookup::{LookupTable, export::export_flat, parse::check_workbook};
use sigbank::workbook::Workbook;
use tracing::Level;

#[derive(Parser)]
#[command(name = "sigbank")]
#[command(about = "Signal-group lookup table checker and exporter", long_about = None)]
struct Cli {
    #[command(subcommand)]
    cmd: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate a lookup-table sheet directory, listing every violation.
    Check {
        #[arg(long)]
        lookup: String,
    },

    /// Render a lookup table to its flat, diffable text form.
    Export {
        #[arg(long)]
        lookup: String,

        #[arg(short = 'o', long)]
        out: String,
    },
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_max_level(Level::INFO)
        .init();

    let cli = Cli::parse();

    match cli.cmd {
        Commands::Check { lookup } => {
            let workbook = Workbook::load_dir(&lookup)?;
            let (ok, errors) = check_workbook(&workbook);
            if ok {
                println!("OK: {} sheet(s), no violations", workbook.sheets.len());
            } else {
                for error in &errors {
                    println!("{error}");
                }
                anyhow::bail!("{} violation(s) in {}", errors.len(), lookup);
            }
        }
        Commands::Export { lookup, out } => {
            let table = LookupTable::load_dir(&lookup)?;
            std::fs::write(&out, export_flat(&table))?;
            println!("Wrote {out}");
        }
    }

    Ok(())
}
