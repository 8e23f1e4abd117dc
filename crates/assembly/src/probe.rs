//! Filesystem and media metadata probing.

use std::path::Path;
use std::process::Command;

use chrono::{DateTime, Utc};

use storyreel_common::clock::secs_to_us;
use storyreel_common::error::{StoryreelError, StoryreelResult};
use storyreel_project_model::material::Dimensions;

/// Metadata lookups the material registry needs.
pub trait MediaProbe {
    /// Birth time of the file, or its modification time where the filesystem
    /// does not record birth.
    fn created_at(&self, path: &Path) -> StoryreelResult<DateTime<Utc>>;

    /// Playback length of an audio file in microseconds.
    fn audio_duration_us(&self, path: &Path) -> StoryreelResult<u64>;

    /// Pixel size of an image file.
    fn image_dimensions(&self, path: &Path) -> StoryreelResult<Dimensions>;
}

/// Probe backed by the local filesystem.
///
/// WAV durations are read from the header; other audio formats go through
/// `ffprobe`, which must be on `PATH`.
#[derive(Debug, Clone, Copy, Default)]
pub struct FsProbe;

impl MediaProbe for FsProbe {
    fn created_at(&self, path: &Path) -> StoryreelResult<DateTime<Utc>> {
        let metadata =
            std::fs::metadata(path).map_err(|e| StoryreelError::probe(path, e.to_string()))?;
        let time = metadata
            .created()
            .or_else(|_| metadata.modified())
            .map_err(|e| StoryreelError::probe(path, e.to_string()))?;
        Ok(DateTime::<Utc>::from(time))
    }

    fn audio_duration_us(&self, path: &Path) -> StoryreelResult<u64> {
        let is_wav = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case("wav"));
        if is_wav {
            wav_duration_us(path)
        } else {
            ffprobe_duration_us(path)
        }
    }

    fn image_dimensions(&self, path: &Path) -> StoryreelResult<Dimensions> {
        let (width, height) =
            image::image_dimensions(path).map_err(|e| StoryreelError::probe(path, e.to_string()))?;
        Ok(Dimensions { width, height })
    }
}

fn wav_duration_us(path: &Path) -> StoryreelResult<u64> {
    let reader =
        hound::WavReader::open(path).map_err(|e| StoryreelError::probe(path, e.to_string()))?;
    let spec = reader.spec();
    if spec.sample_rate == 0 {
        return Err(StoryreelError::probe(path, "sample rate is zero"));
    }
    let frames = reader.duration() as f64;
    Ok(secs_to_us(frames / spec.sample_rate as f64))
}

fn ffprobe_duration_us(path: &Path) -> StoryreelResult<u64> {
    let output = Command::new("ffprobe")
        .args([
            "-v",
            "error",
            "-show_entries",
            "format=duration",
            "-of",
            "default=noprint_wrappers=1:nokey=1",
        ])
        .arg(path)
        .output()
        .map_err(|e| StoryreelError::probe(path, format!("ffprobe unavailable: {e}")))?;

    if !output.status.success() {
        return Err(StoryreelError::probe(
            path,
            String::from_utf8_lossy(&output.stderr).trim().to_string(),
        ));
    }

    let raw = String::from_utf8_lossy(&output.stdout);
    let secs = raw
        .lines()
        .next()
        .and_then(|line| line.trim().parse::<f64>().ok())
        .ok_or_else(|| StoryreelError::probe(path, format!("unexpected ffprobe output: {raw}")))?;
    Ok(secs_to_us(secs))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_wav(path: &Path, sample_rate: u32, frames: u32) {
        let spec = hound::WavSpec {
            channels: 1,
            sample_rate,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let mut writer = hound::WavWriter::create(path, spec).unwrap();
        for _ in 0..frames {
            writer.write_sample(0i16).unwrap();
        }
        writer.finalize().unwrap();
    }

    #[test]
    fn test_wav_duration_from_header() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("scene1.wav");
        write_wav(&path, 8_000, 12_000);
        assert_eq!(FsProbe.audio_duration_us(&path).unwrap(), 1_500_000);
    }

    #[test]
    fn test_image_dimensions() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("scene1_1.png");
        image::RgbImage::new(4, 3).save(&path).unwrap();
        assert_eq!(
            FsProbe.image_dimensions(&path).unwrap(),
            Dimensions {
                width: 4,
                height: 3
            }
        );
    }

    #[test]
    fn test_missing_file_is_probe_failure() {
        let err = FsProbe
            .created_at(Path::new("/definitely/not/here.mp3"))
            .unwrap_err();
        assert!(matches!(err, StoryreelError::ProbeFailure { .. }));
    }

    #[test]
    fn test_created_at_for_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a.srt");
        std::fs::write(&path, "").unwrap();
        let created = FsProbe.created_at(&path).unwrap();
        assert!(created <= Utc::now());
    }
}
