//! Compressed audio → [`AudioSource`], via symphonia.

use std::io::Cursor;

use symphonia::core::audio::SampleBuffer;
use symphonia::core::codecs::{DecoderOptions, CODEC_TYPE_NULL};
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;
use symphonia::default::{get_codecs, get_probe};
use tracing::debug;

use crate::error::DecodeError;
use crate::io::source::AudioSource;

/// Decode a complete audio file held in memory.
pub fn decode(bytes: &[u8]) -> Result<AudioSource, DecodeError> {
    decode_with_hint(bytes, None)
}

/// Decode with a file extension (e.g. `"mp3"`) to guide the container probe.
pub fn decode_with_hint(
    bytes: &[u8],
    extension: Option<&str>,
) -> Result<AudioSource, DecodeError> {
    if bytes.is_empty() {
        return Err(DecodeError::Empty);
    }

    let mut hint = Hint::new();
    if let Some(ext) = extension {
        hint.with_extension(ext);
    }

    let mss = MediaSourceStream::new(Box::new(Cursor::new(bytes.to_vec())), Default::default());
    let probed = get_probe()
        .format(&hint, mss, &FormatOptions::default(), &MetadataOptions::default())
        .map_err(|e| DecodeError::Unsupported(e.to_string()))?;
    let mut format = probed.format;

    let track = format
        .tracks()
        .iter()
        .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
        .ok_or(DecodeError::NoTrack)?;
    let track_id = track.id;
    let params = track.codec_params.clone();

    let mut decoder = get_codecs()
        .make(&params, &DecoderOptions::default())
        .map_err(|e| DecodeError::Unsupported(e.to_string()))?;

    let mut sample_rate = params.sample_rate;
    let mut channels: Vec<Vec<f32>> = Vec::new();
    let mut sample_buf: Option<SampleBuffer<f32>> = None;
    let mut skipped = 0usize;

    loop {
        let packet = match format.next_packet() {
            Ok(packet) => packet,
            Err(SymphoniaError::IoError(_)) => break,
            Err(SymphoniaError::ResetRequired) => {
                decoder.reset();
                continue;
            }
            Err(e) => return Err(DecodeError::Corrupt(e.to_string())),
        };
        if packet.track_id() != track_id {
            continue;
        }

        let decoded = match decoder.decode(&packet) {
            Ok(decoded) => decoded,
            // A damaged packet is dropped, the rest of the stream still plays
            Err(SymphoniaError::DecodeError(_)) => {
                skipped += 1;
                continue;
            }
            Err(SymphoniaError::IoError(_)) => break,
            Err(e) => return Err(DecodeError::Corrupt(e.to_string())),
        };

        let spec = *decoded.spec();
        let channel_count = spec.channels.count().max(1);
        sample_rate.get_or_insert(spec.rate);
        if channels.is_empty() {
            channels = vec![Vec::new(); channel_count];
        }

        let needs_buffer = sample_buf
            .as_ref()
            .map_or(true, |buf| buf.capacity() < decoded.capacity() * channel_count);
        if needs_buffer {
            sample_buf = Some(SampleBuffer::<f32>::new(decoded.capacity() as u64, spec));
        }
        let Some(sbuf) = sample_buf.as_mut() else {
            continue;
        };
        sbuf.copy_interleaved_ref(decoded);

        for frame in sbuf.samples().chunks(channel_count) {
            for (channel, &sample) in channels.iter_mut().zip(frame) {
                channel.push(sample);
            }
        }
    }

    if skipped > 0 {
        debug!(skipped, "dropped undecodable packets");
    }

    let sample_rate = sample_rate.ok_or(DecodeError::UnknownSampleRate)?;
    AudioSource::new(channels, sample_rate)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::TAU;

    fn wav_bytes(channels: u16, sample_rate: u32, frames: usize) -> Vec<u8> {
        let spec = hound::WavSpec {
            channels,
            sample_rate,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let mut cursor = Cursor::new(Vec::new());
        {
            let mut writer = hound::WavWriter::new(&mut cursor, spec).unwrap();
            for n in 0..frames {
                let s = (TAU * 440.0 * n as f32 / sample_rate as f32).sin();
                for _ in 0..channels {
                    writer.write_sample((s * 0.5 * i16::MAX as f32) as i16).unwrap();
                }
            }
            writer.finalize().unwrap();
        }
        cursor.into_inner()
    }

    #[test]
    fn decodes_wav_with_rate_and_duration() {
        let source = decode(&wav_bytes(1, 22_050, 11_025)).unwrap();
        assert_eq!(source.sample_rate(), 22_050);
        assert_eq!(source.frames(), 11_025);
        let secs = source.duration().as_secs_f64();
        assert!(secs.is_finite() && (secs - 0.5).abs() < 1e-9);
    }

    #[test]
    fn keeps_channels_separate() {
        let source = decode_with_hint(&wav_bytes(2, 44_100, 4_410), Some("wav")).unwrap();
        assert_eq!(source.channel_count(), 2);
        assert_eq!(source.channel(0), source.channel(1));

        let peak = source
            .channel(0)
            .unwrap()
            .iter()
            .fold(0.0f32, |acc, &x| acc.max(x.abs()));
        assert!((peak - 0.5).abs() < 0.01, "peak {peak}");
    }

    #[test]
    fn empty_input_is_a_decode_error() {
        assert!(matches!(decode(&[]), Err(DecodeError::Empty)));
    }

    #[test]
    fn garbage_is_a_decode_error_not_a_panic() {
        let garbage: Vec<u8> = (0..4096u32).map(|i| (i * 31 % 251) as u8).collect();
        assert!(decode(&garbage).is_err());
    }

    #[test]
    fn header_without_samples_is_rejected() {
        let header_only = wav_bytes(1, 44_100, 0);
        assert!(decode(&header_only).is_err());
    }
}
