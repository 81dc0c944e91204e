use std::path::Path;
use std::sync::Arc;

use serde::Serialize;
use tracing::debug;

use megrez_core::lm::ModelError;
use megrez_core::settings::settings;
use megrez_core::{
    Candidate, CandidateFilter, Compositor, LanguageModel, TextModel, WalkResult,
};

use crate::die;

#[derive(Debug, thiserror::Error)]
pub enum ComposeError {
    #[error("model: {0}")]
    Model(#[from] ModelError),

    #[error("reading {reading:?} at position {position} is not in the model")]
    UnknownReading { reading: String, position: usize },

    #[error("invalid override {0:?}: expected VALUE@POSITION")]
    MalformedOverride(String),

    #[error("no node at position {position} offers {value:?}")]
    OverrideNotApplied { value: String, position: usize },
}

/// Where and how to load the model and lay out the readings.
pub struct ComposeOptions<'a> {
    pub model_file: &'a str,
    /// Separator of multi-token keys in the model file.
    pub model_separator: &'a str,
    /// Separator of node keys in the output; settings default when `None`.
    pub separator: Option<&'a str>,
    pub swapped: bool,
}

pub fn load_model(options: &ComposeOptions) -> Result<Arc<dyn LanguageModel>, ComposeError> {
    let path = Path::new(options.model_file);
    let model = if options.swapped {
        let content = std::fs::read_to_string(path).map_err(ModelError::from)?;
        TextModel::parse_swapped(&content)?
    } else {
        TextModel::open(path)?
    };
    debug!(keys = model.len(), file = options.model_file, "model loaded");
    Ok(Arc::new(model.with_separator(options.model_separator)))
}

/// Type `readings` into a fresh compositor, failing on the first rejected one.
pub fn compose(
    lm: Arc<dyn LanguageModel>,
    readings: &[String],
    separator: Option<&str>,
) -> Result<Compositor, ComposeError> {
    let mut compositor = Compositor::new(lm);
    if let Some(separator) = separator {
        compositor.set_separator(separator);
    }
    for (position, reading) in readings.iter().enumerate() {
        if !compositor.insert_reading(reading) {
            return Err(ComposeError::UnknownReading {
                reading: reading.clone(),
                position,
            });
        }
    }
    Ok(compositor)
}

/// Parse `VALUE@POSITION`. The value may itself contain `@`.
pub fn parse_override(arg: &str) -> Result<(String, usize), ComposeError> {
    let malformed = || ComposeError::MalformedOverride(arg.to_string());
    let (value, position) = arg.rsplit_once('@').ok_or_else(malformed)?;
    if value.is_empty() {
        return Err(malformed());
    }
    let position = position.parse().map_err(|_| malformed())?;
    Ok((value.to_string(), position))
}

/// Apply overrides in order, as if the user picked each candidate in turn.
pub fn apply_overrides(
    compositor: &mut Compositor,
    overrides: &[(String, usize)],
) -> Result<(), ComposeError> {
    for (value, position) in overrides {
        debug!(value, position, "applying override");
        if !compositor.override_candidate_by_value(value, *position) {
            return Err(ComposeError::OverrideNotApplied {
                value: value.clone(),
                position: *position,
            });
        }
    }
    Ok(())
}

#[derive(Debug, Serialize)]
pub struct SegmentReport {
    pub key: String,
    pub value: String,
    pub start: usize,
    pub span_length: usize,
    pub score: f64,
    pub overridden: bool,
}

#[derive(Debug, Serialize)]
pub struct WalkReport {
    pub readings: Vec<String>,
    pub segments: Vec<SegmentReport>,
    pub total_score: f64,
}

pub fn walk_report(compositor: &Compositor, result: &WalkResult) -> WalkReport {
    let mut start = 0;
    let segments = result
        .nodes
        .iter()
        .map(|node| {
            let segment = SegmentReport {
                key: node.key().to_string(),
                value: node.value().to_string(),
                start,
                span_length: node.span_length(),
                score: node.effective_score(),
                overridden: node.is_overridden(),
            };
            start += node.span_length();
            segment
        })
        .collect();
    WalkReport {
        readings: compositor.readings().to_vec(),
        segments,
        total_score: result.total_score,
    }
}

fn format_walk(report: &WalkReport) -> String {
    let segs: Vec<String> = report
        .segments
        .iter()
        .map(|s| {
            let mark = if s.overridden { "*" } else { "" };
            format!("{}{}({})", s.value, mark, s.key)
        })
        .collect();
    format!("{}\ntotal: {:.4}\n", segs.join(" | "), report.total_score)
}

fn print_json<T: Serialize>(value: &T) {
    println!(
        "{}",
        serde_json::to_string_pretty(value).expect("JSON serialization failed")
    );
}

pub fn walk_cmd(options: &ComposeOptions, readings: &[String], overrides: &[String], json: bool) {
    let lm = die!(load_model(options), "Error opening model: {}");
    let mut compositor = die!(compose(lm, readings, options.separator), "Error: {}");
    let parsed: Vec<(String, usize)> = overrides
        .iter()
        .map(|o| die!(parse_override(o), "Error: {}"))
        .collect();
    die!(apply_overrides(&mut compositor, &parsed), "Error: {}");

    let report = walk_report(&compositor, &compositor.walk());
    if json {
        print_json(&report);
    } else {
        print!("{}", format_walk(&report));
    }
}

/// Candidates at `position`, capped at `candidates.max_results`.
pub fn list_candidates(
    compositor: &Compositor,
    position: usize,
    filter: CandidateFilter,
) -> Vec<Candidate> {
    let mut candidates = compositor.fetch_candidates(position, filter);
    candidates.truncate(settings().candidates.max_results);
    candidates
}

pub fn candidates_cmd(
    options: &ComposeOptions,
    readings: &[String],
    position: Option<usize>,
    filter: CandidateFilter,
    json: bool,
) {
    let lm = die!(load_model(options), "Error opening model: {}");
    let compositor = die!(compose(lm, readings, options.separator), "Error: {}");
    let position = position.unwrap_or(compositor.cursor());
    let candidates = list_candidates(&compositor, position, filter);

    if json {
        print_json(&candidates);
        return;
    }
    for (i, c) in candidates.iter().enumerate() {
        println!(
            "{:>2}. {}\t{}",
            i + 1,
            c.value,
            c.key_tokens.join(compositor.separator())
        );
    }
}

pub fn dot_cmd(options: &ComposeOptions, readings: &[String]) {
    let lm = die!(load_model(options), "Error opening model: {}");
    let compositor = die!(compose(lm, readings, options.separator), "Error: {}");
    print!("{}", compositor.dump_dot());
}

#[derive(Debug, Serialize)]
pub struct JumpReport {
    pub boundaries: Vec<usize>,
    pub segments: Vec<String>,
}

pub fn jump_cmd(options: &ComposeOptions, readings: &[String], json: bool) {
    let lm = die!(load_model(options), "Error opening model: {}");
    let compositor = die!(compose(lm, readings, options.separator), "Error: {}");
    let result = compositor.walk();
    let report = JumpReport {
        boundaries: result.segment_boundaries(),
        segments: result.values(),
    };

    if json {
        print_json(&report);
        return;
    }
    let mut line = String::from("|");
    for segment in &report.segments {
        line.push_str(segment);
        line.push('|');
    }
    println!("{line}");
    let stops: Vec<String> = report.boundaries.iter().map(|b| b.to_string()).collect();
    println!("cursor stops: {}", stops.join(" "));
}
