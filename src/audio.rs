use log::{debug, info};
use rustfft::num_complex::Complex64;
use rustfft::FftPlanner;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use symphonia::core::audio::SampleBuffer;
use symphonia::core::codecs::{DecoderOptions, CODEC_TYPE_NULL};
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::{MediaSourceStream, ReadOnlySource};
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;
use symphonia::default::{get_codecs, get_probe};

use crate::error::{CpsError, CpsResult};
use crate::types::Waveform;

pub const DEFAULT_SAMPLE_RATE: u32 = 44100;

/// Decodes `path` to mono and resamples it to `target_rate`.
pub fn load_audio<P: AsRef<Path>>(path: P, target_rate: u32) -> CpsResult<Waveform> {
    let path = path.as_ref();
    let (samples, sample_rate) = decode_mono(path)?;

    if sample_rate == target_rate || samples.is_empty() {
        return Ok(Waveform::new(samples, target_rate));
    }

    debug!("Resampling {} from {}Hz to {}Hz", path.display(), sample_rate, target_rate);
    Ok(Waveform::new(resample(&samples, sample_rate, target_rate), target_rate))
}

/// Decodes every packet of the first audio track, averaging channels.
pub fn decode_mono(path: &Path) -> CpsResult<(Vec<f64>, u32)> {
    info!("Loading audio from {}", path.display());

    let file = File::open(path).map_err(|e| {
        debug!("Open failed for {}: {}", path.display(), e);
        CpsError::MissingInput(path.to_path_buf())
    })?;

    let decode_err = |source: SymphoniaError| CpsError::Decode { path: path.to_path_buf(), source };

    let mss = MediaSourceStream::new(Box::new(ReadOnlySource::new(BufReader::new(file))), Default::default());

    let mut hint = Hint::new();
    if let Some(ext) = path.extension().and_then(|e| e.to_str()) {
        hint.with_extension(ext);
    }

    let meta_opts: MetadataOptions = Default::default();
    let fmt_opts: FormatOptions = Default::default();

    let probed = get_probe().format(&hint, mss, &fmt_opts, &meta_opts).map_err(decode_err)?;

    let mut format = probed.format;
    let track = format
        .tracks()
        .iter()
        .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
        .ok_or_else(|| CpsError::NoAudioTrack(path.to_path_buf()))?;

    let track_id = track.id;
    let codec_params = track.codec_params.clone();
    let sample_rate = codec_params.sample_rate.unwrap_or(DEFAULT_SAMPLE_RATE);
    info!("Audio sample rate: {}Hz", sample_rate);

    let dec_opts: DecoderOptions = Default::default();
    let mut decoder = get_codecs().make(&codec_params, &dec_opts).map_err(decode_err)?;

    let mut samples = Vec::new();

    loop {
        let packet = match format.next_packet() {
            Ok(packet) => packet,
            Err(SymphoniaError::ResetRequired) => {
                debug!("Decoder reset required");
                continue;
            }
            Err(SymphoniaError::IoError(e)) => {
                debug!("End of stream: {}", e);
                break;
            }
            Err(e) => return Err(decode_err(e)),
        };

        if packet.track_id() != track_id {
            continue;
        }

        match decoder.decode(&packet) {
            Ok(decoded) => {
                let spec = *decoded.spec();
                let duration = decoded.capacity() as u64;

                if duration == 0 {
                    continue;
                }

                let channels = spec.channels.count();

                let mut sample_buf = SampleBuffer::<f64>::new(duration, spec);
                sample_buf.copy_interleaved_ref(decoded);

                if channels > 1 {
                    samples.extend(
                        sample_buf
                            .samples()
                            .chunks(channels)
                            .map(|chunk| chunk.iter().sum::<f64>() / channels as f64),
                    );
                } else {
                    samples.extend_from_slice(sample_buf.samples());
                }
            }
            Err(SymphoniaError::DecodeError(_)) => {
                debug!("Decode error encountered, skipping packet");
                continue;
            }
            Err(SymphoniaError::ResetRequired) => {
                debug!("Decoder reset required during decode");
                continue;
            }
            Err(e) => return Err(decode_err(e)),
        }
    }

    info!("Loaded {} samples", samples.len());
    Ok((samples, sample_rate))
}

/// Band-limited resampling through the spectrum.
///
/// Output length is `ceil(len * to / from)`. The spectrum is truncated or
/// zero-extended; an even-length Nyquist bin is split between both halves.
pub fn resample(samples: &[f64], from: u32, to: u32) -> Vec<f64> {
    let n = samples.len();
    if n == 0 || from == to || from == 0 || to == 0 {
        return samples.to_vec();
    }
    let m = ((n as u128 * to as u128).div_ceil(from as u128)) as usize;

    let mut planner = FftPlanner::<f64>::new();
    let mut spectrum: Vec<Complex64> = samples.iter().map(|&x| Complex64::new(x, 0.0)).collect();
    planner.plan_fft_forward(n).process(&mut spectrum);

    let shared = n.min(m);
    let positive = shared.div_ceil(2);
    let mut out = vec![Complex64::new(0.0, 0.0); m];
    out[..positive].copy_from_slice(&spectrum[..positive]);
    for k in 1..positive {
        out[m - k] = spectrum[n - k];
    }

    if shared % 2 == 0 {
        let nyq = shared / 2;
        if n <= m {
            let half = spectrum[nyq] * 0.5;
            out[nyq] = half;
            out[m - nyq] += half;
        } else {
            out[nyq] = spectrum[nyq] + spectrum[n - nyq];
        }
    }

    planner.plan_fft_inverse(m).process(&mut out);
    let scale = 1.0 / n as f64;
    out.iter().map(|c| c.re * scale).collect()
}

/// 16-bit PCM WAV writer for fixtures.
#[cfg(test)]
pub(crate) fn write_test_wav(path: &Path, samples: &[f64], sample_rate: u32, channels: u16) -> std::io::Result<()> {
    use std::io::Write;

    let mut file = File::create(path)?;
    let bits_per_sample = 16u16;
    let block_align = channels * (bits_per_sample / 8);
    let byte_rate = sample_rate * block_align as u32;
    let data_size = (samples.len() * channels as usize * 2) as u32;

    file.write_all(b"RIFF")?;
    file.write_all(&(36 + data_size).to_le_bytes())?;
    file.write_all(b"WAVE")?;

    file.write_all(b"fmt ")?;
    file.write_all(&16u32.to_le_bytes())?;
    file.write_all(&1u16.to_le_bytes())?;
    file.write_all(&channels.to_le_bytes())?;
    file.write_all(&sample_rate.to_le_bytes())?;
    file.write_all(&byte_rate.to_le_bytes())?;
    file.write_all(&block_align.to_le_bytes())?;
    file.write_all(&bits_per_sample.to_le_bytes())?;

    file.write_all(b"data")?;
    file.write_all(&data_size.to_le_bytes())?;
    for &sample in samples {
        let int_sample = (sample.clamp(-1.0, 1.0) * 32767.0) as i16;
        for _ in 0..channels {
            file.write_all(&int_sample.to_le_bytes())?;
        }
    }
    Ok(())
}
