use knuffel::Decode;
use serde::Serialize;
use std::path::{Path, PathBuf};

use crate::audio::DEFAULT_SAMPLE_RATE;
use crate::pipeline::AnalysisConfig;
use crate::report::{DEFAULT_CEILING, DEFAULT_REPORT_NAME};

pub const CONFIG_FILE_NAME: &str = "config.kdl";

/// On-disk configuration (`config.kdl`). Every node and property is optional.
#[derive(Decode, Debug, Clone, Default, PartialEq)]
pub struct ConfigFile {
    #[knuffel(child)]
    pub analysis: Option<AnalysisNode>,
    #[knuffel(child)]
    pub batch: Option<BatchNode>,
    #[knuffel(child)]
    pub report: Option<ReportNode>,
}

#[derive(Decode, Debug, Clone, Default, PartialEq)]
pub struct AnalysisNode {
    #[knuffel(property(name = "sample-rate"))]
    pub sample_rate: Option<u32>,
    #[knuffel(property(name = "low-cut"))]
    pub low_cut: Option<f64>,
    #[knuffel(property(name = "high-cut"))]
    pub high_cut: Option<f64>,
    #[knuffel(property)]
    pub order: Option<u32>,
    #[knuffel(property)]
    pub threshold: Option<f64>,
    #[knuffel(property(name = "min-distance"))]
    pub min_distance: Option<u32>,
    #[knuffel(property)]
    pub frame: Option<f64>,
    #[knuffel(property)]
    pub window: Option<u32>,
}

#[derive(Decode, Debug, Clone, Default, PartialEq)]
pub struct BatchNode {
    #[knuffel(property)]
    pub jobs: Option<u32>,
    #[knuffel(property)]
    pub extension: Option<String>,
}

#[derive(Decode, Debug, Clone, Default, PartialEq)]
pub struct ReportNode {
    #[knuffel(property)]
    pub name: Option<String>,
    #[knuffel(property)]
    pub ceiling: Option<f64>,
}

impl ConfigFile {
    pub fn load<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;
        Self::parse(&path.display().to_string(), &content)
    }

    pub fn parse(file_name: &str, content: &str) -> anyhow::Result<Self> {
        let config = knuffel::parse(file_name, content)?;
        Ok(config)
    }
}

/// Effective settings after defaults, the config file and command-line overrides.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Settings {
    pub sample_rate: u32,
    pub analysis: AnalysisConfig,
    /// Concurrent files; 0 picks the number of CPUs.
    pub jobs: usize,
    pub extension: String,
    pub report_name: String,
    /// Chart ceiling in CPS, applied to the display copy of the series only.
    pub ceiling: f64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            sample_rate: DEFAULT_SAMPLE_RATE,
            analysis: AnalysisConfig::default(),
            jobs: 0,
            extension: "wav".to_string(),
            report_name: DEFAULT_REPORT_NAME.to_string(),
            ceiling: DEFAULT_CEILING,
        }
    }
}

impl Settings {
    pub fn from_file(file: &ConfigFile) -> Self {
        let mut settings = Self::default();
        settings.merge(file);
        settings
    }

    pub fn merge(&mut self, file: &ConfigFile) {
        if let Some(a) = &file.analysis {
            let cfg = &mut self.analysis;
            if let Some(v) = a.sample_rate {
                self.sample_rate = v;
            }
            if let Some(v) = a.low_cut {
                cfg.low_cut = v;
            }
            if let Some(v) = a.high_cut {
                cfg.high_cut = v;
            }
            if let Some(v) = a.order {
                cfg.order = v as usize;
            }
            if let Some(v) = a.threshold {
                cfg.height = v;
            }
            if let Some(v) = a.min_distance {
                cfg.min_distance = Some(v as usize);
            }
            if let Some(v) = a.frame {
                cfg.frame_duration = v;
            }
            if let Some(v) = a.window {
                cfg.smoothing_window = v as usize;
            }
        }
        if let Some(b) = &file.batch {
            if let Some(v) = b.jobs {
                self.jobs = v as usize;
            }
            if let Some(v) = &b.extension {
                self.extension = v.trim_start_matches('.').to_string();
            }
        }
        if let Some(r) = &file.report {
            if let Some(v) = &r.name {
                self.report_name = v.clone();
            }
            if let Some(v) = r.ceiling {
                self.ceiling = v;
            }
        }
    }
}

/// `config.kdl` in the platform configuration directory.
pub fn default_config_path() -> Option<PathBuf> {
    directories::ProjectDirs::from("org", "snapcount", "snapcount").map(|dirs| dirs.config_dir().join(CONFIG_FILE_NAME))
}
