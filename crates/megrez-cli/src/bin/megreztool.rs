use clap::{Parser, Subcommand, ValueEnum};

use megrez_cli::commands::compose_ops::{self, ComposeOptions};
use megrez_cli::commands::config_ops;
use megrez_core::CandidateFilter;

#[derive(Parser)]
#[command(name = "megreztool", about = "Megrez compositor diagnostics")]
struct Cli {
    /// Settings TOML to use instead of the embedded defaults
    #[arg(long, global = true)]
    settings: Option<String>,
    #[command(subcommand)]
    command: Command,
}

#[derive(clap::Args)]
struct ModelArgs {
    /// Path to a text model (`key value score` per line)
    model_file: String,
    /// Reading tokens, in order
    #[arg(required = true)]
    readings: Vec<String>,
    /// Separator between tokens of multi-token keys in the model file
    #[arg(long, default_value = "")]
    model_separator: String,
    /// Separator used when printing node keys
    #[arg(long)]
    separator: Option<String>,
    /// Model columns are `value key score`
    #[arg(long)]
    swapped: bool,
}

impl ModelArgs {
    fn options(&self) -> ComposeOptions<'_> {
        ComposeOptions {
            model_file: &self.model_file,
            model_separator: &self.model_separator,
            separator: self.separator.as_deref(),
            swapped: self.swapped,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum FilterArg {
    BeginsAt,
    EndsAt,
    Overlapping,
}

impl From<FilterArg> for CandidateFilter {
    fn from(arg: FilterArg) -> Self {
        match arg {
            FilterArg::BeginsAt => CandidateFilter::BeginsAt,
            FilterArg::EndsAt => CandidateFilter::EndsAt,
            FilterArg::Overlapping => CandidateFilter::Overlapping,
        }
    }
}

#[derive(Subcommand)]
enum Command {
    /// Walk the grid and print the best segmentation
    Walk {
        #[command(flatten)]
        model: ModelArgs,
        /// Pin a candidate before walking, as VALUE@POSITION (repeatable)
        #[arg(long = "override")]
        overrides: Vec<String>,
        /// Output as JSON instead of text
        #[arg(long)]
        json: bool,
    },
    /// List candidates at a reading position
    Candidates {
        #[command(flatten)]
        model: ModelArgs,
        /// Reading position (defaults to the end of the readings)
        #[arg(long)]
        at: Option<usize>,
        /// Which nodes to collect relative to the position
        #[arg(long, value_enum, default_value = "overlapping")]
        filter: FilterArg,
        /// Output as JSON instead of text
        #[arg(long)]
        json: bool,
    },
    /// Dump the grid as a Graphviz digraph
    Dot {
        #[command(flatten)]
        model: ModelArgs,
    },
    /// Show the cursor stops of span-wise jumps
    Jump {
        #[command(flatten)]
        model: ModelArgs,
        /// Output as JSON instead of text
        #[arg(long)]
        json: bool,
    },
    /// Print the embedded default settings TOML
    SettingsExport,
    /// Check a settings TOML file
    SettingsValidate {
        /// Settings file
        file: String,
    },
}

fn main() {
    megrez_cli::trace_init::init_tracing();
    let cli = Cli::parse();

    if let Some(ref file) = cli.settings {
        config_ops::settings_load(file);
    }

    match cli.command {
        Command::Walk {
            model,
            overrides,
            json,
        } => compose_ops::walk_cmd(&model.options(), &model.readings, &overrides, json),
        Command::Candidates {
            model,
            at,
            filter,
            json,
        } => compose_ops::candidates_cmd(
            &model.options(),
            &model.readings,
            at,
            filter.into(),
            json,
        ),
        Command::Dot { model } => compose_ops::dot_cmd(&model.options(), &model.readings),
        Command::Jump { model, json } => {
            compose_ops::jump_cmd(&model.options(), &model.readings, json)
        }
        Command::SettingsExport => config_ops::settings_export(),
        Command::SettingsValidate { file } => config_ops::settings_validate(&file),
    }
}
