use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use phylotraits::dates::DecimalDate;
use phylotraits::newick;
use phylotraits::nexus;
use phylotraits::render::{ColourStyle, DrawOptions, quick_draw_tree};
use phylotraits::traits::{TraitTable, assign_leaf_trait};
use phylotraits::treesub::{DuplicateBlocks, LeafBlocks, TreePrefix, TreesubNormalizer};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "phylotraits")]
#[command(about = "Normalize treesub trees, assign traits and draw them.", long_about = None)]
struct Cli {
    /// Only log warnings and errors.
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Replace treesub annotations by node numbers and write a minimal NEXUS file.
    Normalize {
        /// Annotated NEXUS file written by treesub.
        input: PathBuf,

        /// Destination of the cleaned NEXUS file.
        output: PathBuf,

        /// Write the node substitutions to this CSV file.
        #[arg(long, value_name = "CSV")]
        side_table: Option<PathBuf>,

        /// Literal prefix in front of the tree string.
        #[arg(long, value_name = "S", conflicts_with = "any_tree_statement")]
        tree_prefix: Option<String>,

        /// Accept any `tree NAME = [&R]` statement in front of the tree string.
        #[arg(long)]
        any_tree_statement: bool,

        /// Record one row per annotation occurrence instead of per distinct text.
        #[arg(long)]
        keep_duplicates: bool,

        /// Replace annotations after leaf names by their number instead of
        /// removing them.
        #[arg(long)]
        number_leaf_blocks: bool,
    },

    /// Draw a tree to SVG or PNG, optionally colouring tips by a trait.
    Draw {
        /// Newick file, or NEXUS file with --nexus.
        tree: PathBuf,

        /// Output image, format chosen by extension (.svg or .png).
        output: PathBuf,

        /// Read the tree from a NEXUS file.
        #[arg(long = "nexus")]
        from_nexus: bool,

        /// CSV table with leaf traits.
        #[arg(long, value_name = "CSV", requires_all = ["query_col", "target_col"], help_heading = "Traits")]
        traits: Option<PathBuf>,

        /// Table column matched against leaf names.
        #[arg(long, value_name = "C", requires = "traits", help_heading = "Traits")]
        query_col: Option<String>,

        /// Table column holding the trait value.
        #[arg(long, value_name = "C", requires = "traits", help_heading = "Traits")]
        target_col: Option<String>,

        /// Trait name to store values under (default: target column).
        #[arg(long, value_name = "N", help_heading = "Traits")]
        trait_name: Option<String>,

        /// Colour tips by this trait.
        #[arg(long, value_name = "N", help_heading = "Appearance")]
        colour_by: Option<String>,

        /// Only colour these trait values.
        #[arg(long, value_name = "V", value_delimiter = ',', help_heading = "Appearance")]
        values: Vec<String>,

        /// Colour palette, paired or set1.
        #[arg(long, default_value_t = ColourStyle::Paired, help_heading = "Appearance")]
        style: ColourStyle,

        /// Figure width in inches.
        #[arg(long, value_name = "W", default_value_t = 9.0, help_heading = "Appearance")]
        width: f64,

        /// Figure height in inches.
        #[arg(long, value_name = "H", default_value_t = 12.0, help_heading = "Appearance")]
        height: f64,

        /// Draw a frame around the plot.
        #[arg(long, help_heading = "Appearance")]
        show_borders: bool,
    },

    /// Convert a calendar date to a decimal year.
    DecimalDate {
        date: String,

        /// chrono format of the date.
        #[arg(long, default_value = "%Y-%m-%d")]
        format: String,

        /// Accept dates missing the day or month.
        #[arg(long)]
        variable: bool,
    },
}

fn main() {
    let cli = Cli::parse();

    let default_level = if cli.quiet { "warn" } else { "info" };
    let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .format_timestamp(None)
        .try_init();

    if let Err(err) = run(cli.command) {
        eprintln!("error: {err:#}");
        std::process::exit(1);
    }
}

fn run(command: Command) -> Result<()> {
    match command {
        Command::Normalize {
            input,
            output,
            side_table,
            tree_prefix,
            any_tree_statement,
            keep_duplicates,
            number_leaf_blocks,
        } => {
            let normalizer = build_normalizer(tree_prefix, any_tree_statement, keep_duplicates, number_leaf_blocks);
            let normalized = normalizer
                .normalize_file(&input, &output)
                .with_context(|| format!("Failed to normalize {}", input.display()))?;
            if !normalized.warnings.is_empty() {
                log::warn!("{} annotation blocks were degraded", normalized.warnings.len());
            }

            if let Some(path) = side_table {
                normalized
                    .side_table
                    .write_csv(&path)
                    .with_context(|| format!("Failed to write side table {}", path.display()))?;
                log::info!("Wrote {} side table rows to {}", normalized.side_table.len(), path.display());
            }
        }
        Command::Draw {
            tree,
            output,
            from_nexus,
            traits,
            query_col,
            target_col,
            trait_name,
            colour_by,
            values,
            style,
            width,
            height,
            show_borders,
        } => {
            let mut phylo_tree = if from_nexus {
                nexus::load_nexus(&tree)
                    .with_context(|| format!("Failed to load {}", tree.display()))?
                    .tree
            } else {
                newick::read_tree(&tree).with_context(|| format!("Failed to read {}", tree.display()))?
            };

            let mut colour_by = colour_by;
            if let Some(table_path) = traits {
                let (Some(query_col), Some(target_col)) = (query_col, target_col) else {
                    bail!("--traits needs --query-col and --target-col");
                };
                let table = TraitTable::from_path(&table_path)
                    .with_context(|| format!("Failed to read {}", table_path.display()))?;
                let report = assign_leaf_trait(&mut phylo_tree, &table, &query_col, &target_col, trait_name.as_deref())?;
                log::info!(
                    "Assigned {} leaves, {} unmatched, {} ambiguous",
                    report.assigned,
                    report.unmatched.len(),
                    report.ambiguous.len()
                );
                colour_by = colour_by.or(Some(trait_name.unwrap_or(target_col)));
            }

            let options = DrawOptions {
                style,
                show_borders,
                colour_by,
                values_of_interest: values,
                ..DrawOptions::default()
            }
            .with_size(width, height);

            quick_draw_tree(&phylo_tree, &options)?
                .save(&output)
                .with_context(|| format!("Failed to save {}", output.display()))?;
        }
        Command::DecimalDate { date, format, variable } => {
            let decimal = DecimalDate::default()
                .with_format(format)
                .with_variable(variable)
                .convert(&date)?;
            println!("{decimal}");
        }
    }

    Ok(())
}

fn build_normalizer(
    tree_prefix: Option<String>,
    any_tree_statement: bool,
    keep_duplicates: bool,
    number_leaf_blocks: bool,
) -> TreesubNormalizer {
    let mut normalizer = TreesubNormalizer::new();
    if any_tree_statement {
        normalizer = normalizer.with_tree_prefix(TreePrefix::Statement);
    } else if let Some(prefix) = tree_prefix {
        normalizer = normalizer.with_tree_prefix(TreePrefix::Literal(prefix));
    }
    if keep_duplicates {
        normalizer = normalizer.with_duplicate_policy(DuplicateBlocks::PerOccurrence);
    }
    if number_leaf_blocks {
        normalizer = normalizer.with_leaf_blocks(LeafBlocks::Identifier);
    }
    normalizer
}
