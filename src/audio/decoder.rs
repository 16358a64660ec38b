// Audio decoder using Symphonia
// Decodes a whole encoded stream to interleaved f32 PCM

use std::io::{Cursor, Read};

use symphonia::core::audio::{AudioBufferRef, AudioPlanes, Signal};
use symphonia::core::codecs::{Decoder, DecoderOptions, CODEC_TYPE_NULL};
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::{FormatOptions, FormatReader};
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;
use symphonia::core::sample::Sample;
use tracing::{debug, warn};

use crate::error::{ClipError, Result};

/// A fully decoded clip, ready to hand to an output line
#[derive(Debug, Clone)]
pub struct DecodedClip {
    /// Interleaved samples
    pub samples: Vec<f32>,
    pub sample_rate: u32,
    pub channels: u16,
}

impl DecodedClip {
    pub fn frames(&self) -> u64 {
        if self.channels == 0 {
            return 0;
        }
        (self.samples.len() / self.channels as usize) as u64
    }

    pub fn duration_us(&self) -> u64 {
        frames_to_us(self.frames(), self.sample_rate)
    }
}

pub fn frames_to_us(frames: u64, sample_rate: u32) -> u64 {
    if sample_rate == 0 {
        return 0;
    }
    (frames as u128 * 1_000_000 / sample_rate as u128) as u64
}

pub fn us_to_frames(us: u64, sample_rate: u32) -> u64 {
    (us as u128 * sample_rate as u128 / 1_000_000) as u64
}

pub struct AudioDecoder {
    format: Box<dyn FormatReader>,
    decoder: Box<dyn Decoder>,
    track_id: u32,
    sample_rate: u32,
    channels: usize,
    n_frames: Option<u64>,
}

impl AudioDecoder {
    /// Read an encoded stream fully and prepare for decoding.
    /// The format is sniffed; `extension` only biases the probe.
    pub fn open_stream<R: Read>(mut stream: R, extension: Option<&str>) -> Result<Self> {
        let mut bytes = Vec::new();
        stream.read_to_end(&mut bytes)?;
        if bytes.is_empty() {
            return Err(ClipError::Decode("Empty audio stream".to_string()));
        }

        let mss = MediaSourceStream::new(Box::new(Cursor::new(bytes)), Default::default());

        let mut hint = Hint::new();
        if let Some(ext) = extension {
            hint.with_extension(ext);
        }

        let probed = symphonia::default::get_probe()
            .format(&hint, mss, &FormatOptions::default(), &MetadataOptions::default())
            .map_err(|e| ClipError::Decode(format!("Failed to probe stream format: {}", e)))?;

        let format = probed.format;

        // First decodable track wins
        let track = format
            .tracks()
            .iter()
            .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
            .ok_or(ClipError::NoAudioTrack)?;

        let track_id = track.id;
        let sample_rate = track.codec_params.sample_rate.unwrap_or(44100);
        let channels = track.codec_params.channels.map(|c| c.count()).unwrap_or(2);
        let n_frames = track.codec_params.n_frames;

        let decoder = symphonia::default::get_codecs()
            .make(&track.codec_params, &DecoderOptions::default())
            .map_err(|e| ClipError::Decode(format!("Failed to create decoder: {}", e)))?;

        Ok(Self {
            format,
            decoder,
            track_id,
            sample_rate,
            channels,
            n_frames,
        })
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn channels(&self) -> usize {
        self.channels
    }

    /// Decode next packet, returns interleaved f32 samples
    /// Returns None when end of stream is reached
    pub fn decode_next(&mut self) -> Result<Option<Vec<f32>>> {
        loop {
            let packet = match self.format.next_packet() {
                Ok(p) => p,
                Err(SymphoniaError::IoError(ref e))
                    if e.kind() == std::io::ErrorKind::UnexpectedEof =>
                {
                    return Ok(None);
                }
                Err(SymphoniaError::ResetRequired) => {
                    self.decoder.reset();
                    continue;
                }
                Err(e) => return Err(ClipError::Decode(format!("Failed to read packet: {}", e))),
            };

            if packet.track_id() != self.track_id {
                continue;
            }

            match self.decoder.decode(&packet) {
                Ok(decoded) => {
                    // Trust the decoded layout over the container header
                    self.channels = decoded.spec().channels.count();
                    self.sample_rate = decoded.spec().rate;
                    return Ok(Some(Self::audio_buf_to_f32(&decoded)));
                }
                Err(SymphoniaError::DecodeError(e)) => {
                    warn!("Decode error (skipping packet): {}", e);
                    continue;
                }
                Err(e) => return Err(ClipError::Decode(format!("Decode failed: {}", e))),
            }
        }
    }

    /// Decode every remaining packet into one clip
    pub fn decode_all(mut self) -> Result<DecodedClip> {
        let capacity = self
            .n_frames
            .map(|frames| frames as usize * self.channels)
            .unwrap_or(0);
        let mut samples = Vec::with_capacity(capacity);

        while let Some(chunk) = self.decode_next()? {
            samples.extend_from_slice(&chunk);
        }

        let clip = DecodedClip {
            samples,
            sample_rate: self.sample_rate,
            channels: self.channels as u16,
        };
        debug!(
            "Decoded {} frames ({} ch @ {} Hz, {} us)",
            clip.frames(),
            clip.channels,
            clip.sample_rate,
            clip.duration_us()
        );
        Ok(clip)
    }

    /// Convert any AudioBufferRef to interleaved f32 samples
    fn audio_buf_to_f32(buf: &AudioBufferRef) -> Vec<f32> {
        match buf {
            AudioBufferRef::F32(b) => Self::interleave(b.planes(), b.frames(), |s: f32| s),
            AudioBufferRef::F64(b) => Self::interleave(b.planes(), b.frames(), |s: f64| s as f32),
            AudioBufferRef::S8(b) => {
                Self::interleave(b.planes(), b.frames(), |s: i8| s as f32 / 128.0)
            }
            AudioBufferRef::S16(b) => {
                Self::interleave(b.planes(), b.frames(), |s: i16| s as f32 / 32768.0)
            }
            AudioBufferRef::S24(b) => {
                Self::interleave(b.planes(), b.frames(), |s| s.inner() as f32 / 8388608.0)
            }
            AudioBufferRef::S32(b) => {
                Self::interleave(b.planes(), b.frames(), |s: i32| s as f32 / 2147483648.0)
            }
            AudioBufferRef::U8(b) => {
                Self::interleave(b.planes(), b.frames(), |s: u8| (s as f32 - 128.0) / 128.0)
            }
            AudioBufferRef::U16(b) => {
                Self::interleave(b.planes(), b.frames(), |s: u16| (s as f32 - 32768.0) / 32768.0)
            }
            AudioBufferRef::U24(b) => Self::interleave(b.planes(), b.frames(), |s| {
                (s.inner() as f32 - 8388608.0) / 8388608.0
            }),
            AudioBufferRef::U32(b) => Self::interleave(b.planes(), b.frames(), |s: u32| {
                (s as f64 - 2147483648.0) as f32 / 2147483648.0
            }),
        }
    }

    fn interleave<T: Sample + Copy, F: Fn(T) -> f32>(
        planes: AudioPlanes<T>,
        frames: usize,
        convert: F,
    ) -> Vec<f32> {
        let planes = planes.planes();
        if planes.is_empty() || frames == 0 {
            return vec![];
        }

        let mut interleaved = Vec::with_capacity(frames * planes.len());
        for frame in 0..frames {
            for plane in planes.iter() {
                interleaved.push(convert(plane[frame]));
            }
        }
        interleaved
    }
}

/// Decode a whole stream in one go
pub fn decode_stream<R: Read>(stream: R, extension: Option<&str>) -> Result<DecodedClip> {
    AudioDecoder::open_stream(stream, extension)?.decode_all()
}
