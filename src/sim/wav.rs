//! WAV file export of rendered samples

use std::io;
use std::path::Path;

use crate::Result;

/// Write mono `f32` samples as a 16-bit PCM WAV file
pub fn write_wav<P: AsRef<Path>>(path: P, samples: &[f32], sample_rate: u32) -> Result<()> {
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };

    let mut writer = hound::WavWriter::create(path.as_ref(), spec).map_err(wav_error)?;
    for &sample in samples {
        let sample_i16 = (sample.clamp(-1.0, 1.0) * i16::MAX as f32) as i16;
        writer.write_sample(sample_i16).map_err(wav_error)?;
    }
    writer.finalize().map_err(wav_error)?;
    Ok(())
}

fn wav_error(err: hound::Error) -> crate::AudioError {
    match err {
        hound::Error::IoError(io_err) => io_err.into(),
        other => io::Error::new(io::ErrorKind::Other, other).into(),
    }
}
