//! Shared helpers: in-memory WAV clips and headless players

#![allow(dead_code)]

use std::io::Cursor;

use hound::{WavSpec, WavWriter};
use musica_lib::{ClipPlayer, HeadlessBackend, PlayerSettings};

/// Sample rate used by test clips; 1 frame == 100 us
pub const TEST_SAMPLE_RATE: u32 = 10_000;

/// Stereo 16-bit WAV with a ramp signal, `duration_us` long
pub fn wav_clip(duration_us: u64) -> Vec<u8> {
    let spec = WavSpec {
        channels: 2,
        sample_rate: TEST_SAMPLE_RATE,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let frames = TEST_SAMPLE_RATE as u64 * duration_us / 1_000_000;

    let mut cursor = Cursor::new(Vec::new());
    {
        let mut writer = WavWriter::new(&mut cursor, spec).expect("wav writer");
        for frame in 0..frames {
            let sample = ((frame % 200) as i16 - 100) * 100;
            writer.write_sample(sample).expect("left sample");
            writer.write_sample(sample).expect("right sample");
        }
        writer.finalize().expect("finalize wav");
    }
    cursor.into_inner()
}

pub fn open_player(duration_us: u64, looping: bool) -> ClipPlayer {
    open_player_with(duration_us, looping, &PlayerSettings::default())
}

pub fn open_player_with(duration_us: u64, looping: bool, settings: &PlayerSettings) -> ClipPlayer {
    ClipPlayer::open(
        Cursor::new(wav_clip(duration_us)),
        looping,
        &HeadlessBackend::manual(),
        settings,
    )
    .expect("open clip")
}

/// Let the headless line consume `us` microseconds of audio
pub fn advance(player: &ClipPlayer, us: u64) {
    let frames = (TEST_SAMPLE_RATE as u64 * us / 1_000_000) as usize;
    player.clip_line().expect("loaded player").advance(frames);
}
