use log::{info, warn};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

use crate::audio;
use crate::config::Settings;
use crate::error::{CpsError, CpsResult};
use crate::pipeline;
use crate::report::{FileFailure, FileReport};

/// Outcome of a batch: successful reports and skipped files, both in input order.
#[derive(Debug, Default)]
pub struct BatchOutcome {
    pub reports: Vec<FileReport>,
    pub failures: Vec<FileFailure>,
}

/// Recordings to analyze under `input`: the file itself, or the folder's
/// files with a matching extension, sorted by name.
pub fn collect_inputs(input: &Path, extension: &str) -> CpsResult<Vec<PathBuf>> {
    if !input.exists() {
        return Err(CpsError::MissingInput(input.to_path_buf()));
    }
    if input.is_file() {
        return Ok(vec![input.to_path_buf()]);
    }

    let mut files = Vec::new();
    for entry in std::fs::read_dir(input)? {
        let path = entry?.path();
        let matches = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case(extension));
        if matches && path.is_file() {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

/// Loads and analyzes one recording.
pub fn analyze_file(path: &Path, settings: &Settings) -> CpsResult<FileReport> {
    let waveform = audio::load_audio(path, settings.sample_rate)?;
    let analysis = pipeline::analyze(&waveform, &settings.analysis)?;
    Ok(FileReport {
        name: display_name(path),
        duration: waveform.duration(),
        sample_rate: waveform.sample_rate(),
        analysis,
    })
}

/// Analyzes every path on the blocking pool, at most `settings.jobs` at a time.
///
/// A file that fails is logged and reported as skipped; the rest of the
/// batch carries on.
pub async fn run(paths: Vec<PathBuf>, settings: Arc<Settings>) -> BatchOutcome {
    let jobs = effective_jobs(settings.jobs);
    let permits = Arc::new(Semaphore::new(jobs));
    info!("Analyzing {} files with {} workers", paths.len(), jobs);

    let mut set = JoinSet::new();
    for (index, path) in paths.iter().cloned().enumerate() {
        let permits = Arc::clone(&permits);
        let settings = Arc::clone(&settings);
        set.spawn(async move {
            let _permit = permits.acquire_owned().await;
            let task_path = path.clone();
            let result = tokio::task::spawn_blocking(move || analyze_file(&task_path, &settings)).await;
            (index, path, result)
        });
    }

    let mut results = Vec::with_capacity(paths.len());
    while let Some(joined) = set.join_next().await {
        match joined {
            Ok(entry) => results.push(entry),
            Err(e) => warn!("Analysis task failed to complete: {}", e),
        }
    }
    results.sort_by_key(|(index, _, _)| *index);

    let mut outcome = BatchOutcome::default();
    for (_, path, result) in results {
        let name = display_name(&path);
        match result {
            Ok(Ok(report)) => {
                info!("Processed: {}", name);
                outcome.reports.push(report);
            }
            Ok(Err(e)) => {
                warn!("Skipping {}: {}", path.display(), e);
                outcome.failures.push(FileFailure { file: name, error: e.to_string() });
            }
            Err(e) => {
                warn!("Skipping {}: worker panicked: {}", path.display(), e);
                outcome.failures.push(FileFailure { file: name, error: format!("worker panicked: {}", e) });
            }
        }
    }
    outcome
}

fn effective_jobs(jobs: usize) -> usize {
    if jobs > 0 {
        return jobs;
    }
    std::thread::available_parallelism().map(|n| n.get()).unwrap_or(1)
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::write_test_wav;

    fn clicks(seconds: usize, per_second: usize, rate: u32) -> Vec<f64> {
        let frame = rate as usize;
        let mut x = vec![0.0; seconds * frame];
        let spacing = frame / (per_second + 1);
        for s in 0..seconds {
            for i in 1..=per_second {
                x[s * frame + i * spacing] = 0.9;
            }
        }
        x
    }

    #[test]
    fn test_collect_inputs_filters_and_sorts() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["b.wav", "a.WAV", "notes.txt", "c.wav.bak"] {
            std::fs::write(dir.path().join(name), b"").unwrap();
        }
        std::fs::create_dir(dir.path().join("sub.wav")).unwrap();

        let files = collect_inputs(dir.path(), "wav").unwrap();
        let names: Vec<String> = files.iter().map(|p| display_name(p)).collect();
        assert_eq!(names, vec!["a.WAV", "b.wav"]);

        let single = dir.path().join("notes.txt");
        assert_eq!(collect_inputs(&single, "wav").unwrap(), vec![single.clone()]);

        assert!(matches!(
            collect_inputs(&dir.path().join("nope"), "wav"),
            Err(CpsError::MissingInput(_))
        ));
    }

    #[test]
    fn test_empty_folder() {
        let dir = tempfile::tempdir().unwrap();
        assert!(collect_inputs(dir.path(), "wav").unwrap().is_empty());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_batch_skips_failures_and_keeps_order() {
        let dir = tempfile::tempdir().unwrap();
        write_test_wav(&dir.path().join("a_busy.wav"), &clicks(2, 6, 44100), 44100, 1).unwrap();
        std::fs::write(dir.path().join("b_broken.wav"), b"garbage").unwrap();
        write_test_wav(&dir.path().join("c_short.wav"), &vec![0.0; 1000], 44100, 1).unwrap();

        let mut paths = collect_inputs(dir.path(), "wav").unwrap();
        paths.push(dir.path().join("d_missing.wav"));

        let settings = Arc::new(Settings { jobs: 2, ..Settings::default() });
        let outcome = run(paths, settings).await;

        let names: Vec<&str> = outcome.reports.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["a_busy.wav", "c_short.wav"]);
        assert_eq!(outcome.reports[0].analysis.raw.rates(), vec![6.0, 6.0]);
        assert!(outcome.reports[1].analysis.stats.is_none());

        let failed: Vec<&str> = outcome.failures.iter().map(|f| f.file.as_str()).collect();
        assert_eq!(failed, vec!["b_broken.wav", "d_missing.wav"]);
        assert!(outcome.failures[1].error.contains("not found"));
    }

    #[tokio::test]
    async fn test_invalid_filter_spec_skips_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("low_rate.wav");
        write_test_wav(&path, &clicks(1, 3, 8000), 8000, 1).unwrap();

        // Keep the recording at 8 kHz so 6 kHz sits above Nyquist.
        let settings = Arc::new(Settings { sample_rate: 8000, ..Settings::default() });
        let outcome = run(vec![path], settings).await;
        assert!(outcome.reports.is_empty());
        assert!(outcome.failures[0].error.contains("invalid filter spec"));
    }
}
