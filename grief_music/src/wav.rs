// WAV output for rendered audio buffers.
//
// Mono, 16-bit signed PCM at the buffer's sample rate. The float-to-integer
// conversion is `AudioBuffer::to_pcm_i16` (scale by 32767, truncate toward
// zero); this module only frames the samples.
//
// Uses the `hound` crate for WAV writing.

use crate::error::{Result, SynthError};
use crate::waveform::AudioBuffer;
use hound::{SampleFormat, WavSpec, WavWriter};
use std::fs::File;
use std::io::{BufWriter, Seek, Write};
use std::path::Path;

fn spec(sample_rate: u32) -> WavSpec {
    WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 16,
        sample_format: SampleFormat::Int,
    }
}

/// Write a buffer to a WAV file.
pub fn write_wav(buffer: &AudioBuffer, path: &Path) -> Result<()> {
    let file = File::create(path).map_err(|source| SynthError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    write_wav_to(buffer, BufWriter::new(file))?;
    tracing::info!(
        path = %path.display(),
        samples = buffer.len(),
        sample_rate = buffer.sample_rate(),
        "wrote WAV"
    );
    Ok(())
}

/// Write a buffer as WAV into any seekable writer.
pub fn write_wav_to<W: Write + Seek>(buffer: &AudioBuffer, writer: W) -> Result<()> {
    let mut wav = WavWriter::new(writer, spec(buffer.sample_rate()))?;
    for sample in buffer.to_pcm_i16() {
        wav.write_sample(sample)?;
    }
    wav.finalize()?;
    Ok(())
}
