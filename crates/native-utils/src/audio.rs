use anyhow::Context;
use rubato::{FastFixedIn, PolynomialDegree, Resampler};
use std::path::Path;

/// Sample rate of the PCM16 audio the live API sends and expects.
pub const LIVE_API_PCM16_SAMPLE_RATE: u32 = 24000;

/// Number of input frames handed to the resampler per call.
const RESAMPLE_CHUNK_SIZE: usize = 1024;

/// Creates a resampler to convert between audio sample rates.
pub fn create_resampler(
    in_sampling_rate: f64,
    out_sampling_rate: f64,
    chunk_size: usize,
) -> anyhow::Result<FastFixedIn<f32>> {
    let resampler = FastFixedIn::<f32>::new(
        out_sampling_rate / in_sampling_rate,
        1.0,
        PolynomialDegree::Cubic,
        chunk_size,
        1,
    )?;
    Ok(resampler)
}

/// Splits a slice of audio samples into a vector of vectors, where each inner vector has a fixed chunk size.
/// If a chunk is smaller than the `chunk_size`, it is padded with zeros.
pub fn split_for_chunks(samples: &[f32], chunk_size: usize) -> Vec<Vec<f32>> {
    samples
        .chunks(chunk_size)
        .map(|chunk| {
            let mut chunk = chunk.to_vec();
            chunk.resize(chunk_size, 0.0);
            chunk
        })
        .collect()
}

/// Resamples mono audio. The zero padding of the last chunk is trimmed off the output.
pub fn resample(samples: &[f32], from_rate: u32, to_rate: u32) -> anyhow::Result<Vec<f32>> {
    if from_rate == to_rate || samples.is_empty() {
        return Ok(samples.to_vec());
    }
    let mut resampler = create_resampler(from_rate as f64, to_rate as f64, RESAMPLE_CHUNK_SIZE)?;
    let mut resampled = Vec::new();
    for chunk in split_for_chunks(samples, RESAMPLE_CHUNK_SIZE) {
        let output = resampler.process(&[chunk], None)?;
        resampled.extend_from_slice(&output[0]);
    }
    let expected = (samples.len() as f64 * to_rate as f64 / from_rate as f64).round() as usize;
    resampled.truncate(expected);
    Ok(resampled)
}

/// Reads a WAV file and mixes it down to mono f32 samples. Returns the samples and their sample rate.
pub fn read_wav_mono(path: &Path) -> anyhow::Result<(Vec<f32>, u32)> {
    let mut reader = hound::WavReader::open(path)
        .with_context(|| format!("Failed to open WAV file: {}", path.display()))?;
    let spec = reader.spec();

    let samples: Vec<f32> = match spec.sample_format {
        hound::SampleFormat::Float => reader.samples::<f32>().collect::<Result<_, _>>()?,
        hound::SampleFormat::Int => {
            let scale = (1i64 << (spec.bits_per_sample - 1)) as f32;
            reader
                .samples::<i32>()
                .map(|sample| sample.map(|v| v as f32 / scale))
                .collect::<Result<_, _>>()?
        }
    };

    let channels = spec.channels as usize;
    let mono = if channels > 1 {
        samples
            .chunks(channels)
            .map(|c| c.iter().sum::<f32>() / channels as f32)
            .collect()
    } else {
        samples
    };
    tracing::debug!(
        "read {} mono samples at {} Hz from {}",
        mono.len(),
        spec.sample_rate,
        path.display()
    );
    Ok((mono, spec.sample_rate))
}

/// Loads a WAV file as little-endian 16-bit mono PCM at `sample_rate`.
pub fn wav_to_pcm16(path: &Path, sample_rate: u32) -> anyhow::Result<Vec<u8>> {
    let (samples, source_rate) = read_wav_mono(path)?;
    let samples = resample(&samples, source_rate, sample_rate)?;
    Ok(pcm16_bytes_from_f32(&samples))
}

/// Converts f32 samples in [-1.0, 1.0] to little-endian 16-bit PCM bytes, clamping the rest.
pub fn pcm16_bytes_from_f32(samples: &[f32]) -> Vec<u8> {
    samples.to_binary()
}

/// Writes little-endian 16-bit mono PCM bytes as a WAV file.
pub fn write_pcm16_wav(path: &Path, pcm16: &[u8], sample_rate: u32) -> anyhow::Result<()> {
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let mut writer = hound::WavWriter::create(path, spec)
        .with_context(|| format!("Failed to create WAV file: {}", path.display()))?;
    if pcm16.len() % 2 != 0 {
        tracing::warn!("dropping trailing odd byte of PCM16 data");
    }
    for chunk in pcm16.chunks_exact(2) {
        writer.write_sample(i16::from_le_bytes([chunk[0], chunk[1]]))?;
    }
    writer.finalize()?;
    Ok(())
}

/// A trait for converting audio sample types to a binary representation (Vec<u8>).
pub trait ToBinary {
    fn to_binary(&self) -> Vec<u8>;
}

impl ToBinary for [i16] {
    fn to_binary(&self) -> Vec<u8> {
        self.iter()
            .flat_map(|&sample| sample.to_le_bytes().to_vec())
            .collect()
    }
}

impl ToBinary for [f32] {
    fn to_binary(&self) -> Vec<u8> {
        self.iter()
            .flat_map(|&sample| {
                let v = (sample * 32768.0).clamp(i16::MIN as f32, i16::MAX as f32) as i16;
                v.to_le_bytes().to_vec()
            })
            .collect()
    }
}
