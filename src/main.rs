use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::Context;
use log::{debug, info, log_enabled, warn, Level};

mod config;
mod error;
mod exporters;
mod layout;
mod node;
mod table;

use config::ReportConfig;
use node::DataNode;
use table::Table;

#[derive(clap::Parser, Debug)]
#[command(
    version,
    about = "Render a CSV of symbol sizes as a treemap. Investigate binary bloat.",
    long_about = "Render a CSV of symbol sizes as a treemap. Investigate binary bloat. \
                  The CSV needs the columns 1, 2, 3, 4 (outermost category first) and size. \
                  The treemap is written to output.svg in the current directory."
)]
#[command(flatten_help = true)]
pub struct Args {
    /// Path to the CSV file.
    #[arg()]
    path: PathBuf,
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().filter_or("CSV2TREEMAP_LOG", "warn"))
        .init();

    let args = <Args as clap::Parser>::parse();
    let config = ReportConfig::default();

    generate_report(&args.path, &config, &mut std::io::stdout().lock())
        .with_context(|| format!("Failed to create a treemap of {}", args.path.display()))
}

/// Load `path`, print it to `out`, and write the treemap to
/// `config.output_path`. Nothing is written unless every row made it into the
/// hierarchy.
fn generate_report(path: &Path, config: &ReportConfig, out: &mut impl Write) -> anyhow::Result<()> {
    let mut table = Table::load(path)?;
    info!("loaded {} rows from {}", table.len(), path.display());

    if let Some(filter) = config.row_filter {
        table.retain(filter);
        info!("{} rows left after filtering", table.len());
    }
    if table.is_empty() {
        warn!("{} has no data rows", path.display());
    }

    writeln!(out, "{table}")?;

    let root = DataNode::from_table(&table, config)?;
    info!("{} has a total size of {}", config.root_label, root.size);
    if log_enabled!(Level::Debug) {
        let tree = exporters::json::export(&root, &config.root_label);
        debug!("{}", serde_json::to_string(&tree)?);
    }

    let rects = layout::compute_layout(&root, config);
    info!("laid out {} boxes", rects.len());
    writeln!(out, "finished")?;

    let svg = exporters::svg::render(&rects, config)?;
    exporters::svg::write(&svg, &config.output_path)?;
    writeln!(out, "written")?;

    Ok(())
}
