pub mod args;
pub mod audio;
pub mod batch;
pub mod config;
pub mod detector;
pub mod error;
pub mod filter;
pub mod framer;
pub mod pipeline;
pub mod report;
pub mod smoother;
pub mod types;
pub mod util;

pub use error::{CpsError, CpsResult};
pub use pipeline::{analyze, Analysis, AnalysisConfig, SummaryStats};
pub use types::{CpsPoint, CpsSeries, Waveform};
