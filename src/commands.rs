// Text command handlers
// One line of input maps to one transport call on the player
use std::str::FromStr;

use serde::Serialize;

use crate::audio::player::ClipPlayer;
use crate::error::Result;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Command {
    Play,
    Pause,
    Resume,
    Close,
    Loop,
    /// Scrub: set the position and keep playing (milliseconds)
    Seek(u64),
    /// Set the position without touching the transport (milliseconds)
    Position(u64),
    Volume(f32),
    Status,
    Quit,
}

impl FromStr for Command {
    type Err = String;

    fn from_str(input: &str) -> std::result::Result<Self, Self::Err> {
        let mut parts = input.split_whitespace();
        let verb = parts.next().ok_or_else(|| "empty command".to_string())?;
        let arg = parts.next();
        if parts.next().is_some() {
            return Err(format!("too many arguments for '{}'", verb));
        }

        let command = match (verb.to_ascii_lowercase().as_str(), arg) {
            ("play", None) => Command::Play,
            ("pause", None) => Command::Pause,
            ("resume", None) => Command::Resume,
            ("stop" | "close", None) => Command::Close,
            ("loop", None) => Command::Loop,
            ("seek", Some(ms)) => Command::Seek(parse_ms(ms)?),
            ("pos", Some(ms)) => Command::Position(parse_ms(ms)?),
            ("volume" | "vol", Some(v)) => {
                Command::Volume(v.parse().map_err(|_| format!("invalid volume: {}", v))?)
            }
            ("status", None) => Command::Status,
            ("quit" | "exit", None) => Command::Quit,
            (verb, _) => return Err(format!("unknown command: {}", verb)),
        };
        Ok(command)
    }
}

fn parse_ms(value: &str) -> std::result::Result<u64, String> {
    value
        .parse()
        .map_err(|_| format!("invalid milliseconds: {}", value))
}

/// Snapshot of the player for `status`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatusResponse {
    pub playing: bool,
    pub paused: bool,
    pub finished: bool,
    pub position_us: u64,
    pub length_us: u64,
}

impl StatusResponse {
    pub fn from_player(player: &ClipPlayer) -> Self {
        Self {
            playing: player.is_playing(),
            paused: player.is_paused(),
            finished: player.has_finished(),
            position_us: player.position(),
            length_us: player.length(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Reply {
    Ok,
    Status(StatusResponse),
    Quit,
}

/// Run one command. `Loop` fires the deferred loop start and does not wait for it.
pub fn apply(player: &mut ClipPlayer, command: Command) -> Result<Reply> {
    match command {
        Command::Play => player.start_playback()?,
        Command::Pause => player.pause_playback()?,
        Command::Resume => player.resume_playback()?,
        Command::Close => player.close()?,
        Command::Loop => {
            player.start_loop_task()?;
        }
        Command::Seek(ms) => player.seek_and_ensure_playing(ms.saturating_mul(1000))?,
        Command::Position(ms) => player.set_position(ms.saturating_mul(1000))?,
        Command::Volume(volume) => player.set_volume(volume)?,
        Command::Status => return Ok(Reply::Status(StatusResponse::from_player(player))),
        Command::Quit => return Ok(Reply::Quit),
    }
    Ok(Reply::Ok)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    use crate::audio::backend::HeadlessBackend;
    use crate::error::ClipError;
    use crate::settings::PlayerSettings;

    /// One second of stereo silence at 10 kHz
    fn loaded_player() -> ClipPlayer {
        let spec = hound::WavSpec {
            channels: 2,
            sample_rate: 10_000,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let mut cursor = Cursor::new(Vec::new());
        {
            let mut writer = hound::WavWriter::new(&mut cursor, spec).unwrap();
            for _ in 0..20_000 {
                writer.write_sample(0i16).unwrap();
            }
            writer.finalize().unwrap();
        }
        cursor.set_position(0);
        ClipPlayer::open(
            cursor,
            false,
            &HeadlessBackend::manual(),
            &PlayerSettings::default(),
        )
        .unwrap()
    }

    fn status(player: &mut ClipPlayer) -> StatusResponse {
        match apply(player, Command::Status).unwrap() {
            Reply::Status(status) => status,
            other => panic!("unexpected reply: {:?}", other),
        }
    }

    #[test]
    fn test_parse_simple_verbs() {
        assert_eq!("play".parse::<Command>(), Ok(Command::Play));
        assert_eq!("  PAUSE ".parse::<Command>(), Ok(Command::Pause));
        assert_eq!("stop".parse::<Command>(), Ok(Command::Close));
        assert_eq!("exit".parse::<Command>(), Ok(Command::Quit));
    }

    #[test]
    fn test_parse_arguments() {
        assert_eq!("seek 1500".parse::<Command>(), Ok(Command::Seek(1500)));
        assert_eq!("pos 0".parse::<Command>(), Ok(Command::Position(0)));
        assert_eq!("vol 0.5".parse::<Command>(), Ok(Command::Volume(0.5)));
    }

    #[test]
    fn test_parse_errors() {
        assert!("".parse::<Command>().is_err());
        assert!("seek".parse::<Command>().is_err());
        assert!("seek -4".parse::<Command>().is_err());
        assert!("play now".parse::<Command>().is_err());
        assert!("rewind".parse::<Command>().is_err());
    }

    #[test]
    fn test_inert_player_replies() {
        let mut player = ClipPlayer::inert(false, &PlayerSettings::default());
        assert!(matches!(
            apply(&mut player, Command::Play),
            Err(ClipError::NotLoaded)
        ));
        assert_eq!(apply(&mut player, Command::Close).unwrap(), Reply::Ok);
        assert_eq!(apply(&mut player, Command::Quit).unwrap(), Reply::Quit);

        match apply(&mut player, Command::Status).unwrap() {
            Reply::Status(status) => {
                assert!(!status.playing);
                assert!(!status.paused);
                assert_eq!(status.length_us, 0);
                assert!(!status.finished);
            }
            other => panic!("unexpected reply: {:?}", other),
        }
    }

    #[test]
    fn test_loaded_player_commands() {
        let mut player = loaded_player();
        assert_eq!(status(&mut player).length_us, 1_000_000);

        // pos takes milliseconds and leaves the transport alone
        assert_eq!(apply(&mut player, Command::Position(250)).unwrap(), Reply::Ok);
        let after_pos = status(&mut player);
        assert_eq!(after_pos.position_us, 250_000);
        assert!(!after_pos.playing);

        // seek takes milliseconds and starts playback
        apply(&mut player, Command::Seek(600)).unwrap();
        let after_seek = status(&mut player);
        assert_eq!(after_seek.position_us, 600_000);
        assert!(after_seek.playing);

        apply(&mut player, Command::Pause).unwrap();
        let paused = status(&mut player);
        assert!(paused.paused);
        assert!(!paused.playing);
        assert!(!paused.finished);

        assert!(matches!(
            apply(&mut player, Command::Volume(2.0)),
            Err(ClipError::InvalidVolume(_))
        ));
    }
}
