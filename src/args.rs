use crate::config::Settings;
use crate::util::{amplitude_parser, frequency_parser, seconds_parser};
use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = env!("CARGO_PKG_NAME"))]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Counts snapping-shrimp clicks per second in underwater recordings.")]
pub struct Cli {
    /// Folder of recordings, or a single recording.
    pub input: PathBuf,

    /// KDL configuration file (defaults to config.kdl in the user config dir).
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Directory for the text and JSON reports (defaults to the input folder).
    #[arg(short, long)]
    pub out: Option<PathBuf>,

    /// Rate recordings are resampled to before analysis.
    #[arg(long, value_parser = frequency_parser)]
    pub sample_rate: Option<f64>,

    #[arg(long, value_parser = frequency_parser)]
    pub low_cut: Option<f64>,

    #[arg(long, value_parser = frequency_parser)]
    pub high_cut: Option<f64>,

    /// Butterworth order of the band-pass.
    #[arg(long)]
    pub order: Option<usize>,

    /// Minimum absolute amplitude of a click.
    #[arg(long, value_parser = amplitude_parser)]
    pub threshold: Option<f64>,

    /// Minimum separation between clicks, in samples.
    #[arg(long)]
    pub min_distance: Option<usize>,

    /// Frame length, e.g. `1`, `0.5s` or `500ms`.
    #[arg(long, value_parser = seconds_parser)]
    pub frame: Option<f64>,

    /// Moving-average window, in frames.
    #[arg(long)]
    pub window: Option<usize>,

    /// Files analyzed at once (0 = one per CPU).
    #[arg(short, long)]
    pub jobs: Option<usize>,

    /// Chart ceiling in CPS for the display series.
    #[arg(long)]
    pub ceiling: Option<f64>,

    /// Extension of the recordings to pick up from a folder.
    #[arg(long)]
    pub extension: Option<String>,
}

impl Cli {
    /// Applies command-line overrides on top of `settings`.
    pub fn apply_overrides(&self, settings: &mut Settings) {
        let analysis = &mut settings.analysis;
        if let Some(v) = self.sample_rate {
            settings.sample_rate = v.round() as u32;
        }
        if let Some(v) = self.low_cut {
            analysis.low_cut = v;
        }
        if let Some(v) = self.high_cut {
            analysis.high_cut = v;
        }
        if let Some(v) = self.order {
            analysis.order = v;
        }
        if let Some(v) = self.threshold {
            analysis.height = v;
        }
        if let Some(v) = self.min_distance {
            analysis.min_distance = Some(v);
        }
        if let Some(v) = self.frame {
            analysis.frame_duration = v;
        }
        if let Some(v) = self.window {
            analysis.smoothing_window = v;
        }
        if let Some(v) = self.jobs {
            settings.jobs = v;
        }
        if let Some(v) = self.ceiling {
            settings.ceiling = v;
        }
        if let Some(v) = &self.extension {
            settings.extension = v.trim_start_matches('.').to_string();
        }
    }
}
