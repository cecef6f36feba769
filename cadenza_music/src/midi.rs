// MIDI output from arrangements.
//
// Converts an `Arrangement` (arrange.rs) into a Standard MIDI File. Track 0
// carries the song header as meta events (tempo, time signature, key
// signature); every arranged track follows as its own MIDI track with a
// track name, a program change and note on/off pairs. Event times are the
// arranger's ticks, so the file resolution is `TICKS_PER_BEAT` per quarter
// note.
//
// Uses the `midly` crate for MIDI writing. Output is SMF Format 1 (multi-track).

use crate::arrange::{Arrangement, NoteEvent, TICKS_PER_BEAT, Track};
use crate::error::ComposeError;
use crate::scale::{Key, TimeSignature};
use midly::{
    Format, Header, MetaMessage, MidiMessage, Smf, Timing, TrackEvent, TrackEventKind,
    num::{u4, u7, u15, u24, u28},
};
use std::path::Path;

/// Fifths (positive sharps, negative flats) of each major tonic pitch class.
const MAJOR_FIFTHS: [i8; 12] = [0, -5, 2, -3, 4, -1, 6, 1, -4, 3, -2, 5];

/// Key signature as (sharps or -flats, minor). Modal keys take the
/// signature of the major or minor key on the same tonic.
pub fn key_signature(key: &Key) -> (i8, bool) {
    if key.is_minor() {
        let relative_major = (key.tonic as usize + 3) % 12;
        (MAJOR_FIFTHS[relative_major], true)
    } else {
        (MAJOR_FIFTHS[key.tonic as usize], false)
    }
}

/// Largest value a tempo meta event holds (24 bits).
const MAX_TEMPO_MICROS: u32 = 0xFF_FFFF;
/// Largest delta time an event can carry (28-bit variable-length quantity).
pub const MAX_TICK: u32 = 0x0FFF_FFFF;

/// Microseconds per quarter note at `bpm`, capped at the 24-bit maximum
/// (about 3.6 BPM).
fn tempo_micros(bpm: u32) -> u32 {
    (60_000_000 / bpm.max(1)).min(MAX_TEMPO_MICROS)
}

fn time_signature_meta(ts: TimeSignature) -> MetaMessage<'static> {
    let (num, den) = ts.parts();
    // Denominator as a power of two; 24 clocks per click, 8 32nds per quarter.
    MetaMessage::TimeSignature(num, den.trailing_zeros() as u8, 24, 8)
}

fn meta(delta: u32, message: MetaMessage<'_>) -> TrackEvent<'_> {
    TrackEvent {
        delta: u28::new(delta),
        kind: TrackEventKind::Meta(message),
    }
}

/// Note on/off pairs for one track, in time order with offs before ons on
/// the same tick.
fn note_messages(events: &[NoteEvent]) -> Vec<(u32, MidiMessage)> {
    let mut timed: Vec<(u32, bool, MidiMessage)> = Vec::with_capacity(events.len() * 2);
    for e in events {
        timed.push((
            e.start,
            true,
            MidiMessage::NoteOn {
                key: u7::new(e.pitch),
                vel: u7::new(e.velocity),
            },
        ));
        timed.push((
            e.end(),
            false,
            MidiMessage::NoteOff {
                key: u7::new(e.pitch),
                vel: u7::new(0),
            },
        ));
    }
    // Stable: ties keep insertion order.
    timed.sort_by_key(|&(tick, is_on, _)| (tick, is_on));
    timed.into_iter().map(|(tick, _, m)| (tick, m)).collect()
}

fn track_events(track: &Track) -> Vec<TrackEvent<'_>> {
    let channel = u4::new(track.channel);
    let mut out = vec![
        meta(0, MetaMessage::TrackName(track.name.as_bytes())),
        TrackEvent {
            delta: u28::new(0),
            kind: TrackEventKind::Midi {
                channel,
                message: MidiMessage::ProgramChange {
                    program: u7::new(track.program),
                },
            },
        },
    ];

    let mut last_tick = 0;
    for (tick, message) in note_messages(&track.events) {
        out.push(TrackEvent {
            delta: u28::new(tick - last_tick),
            kind: TrackEventKind::Midi { channel, message },
        });
        last_tick = tick;
    }
    out.push(meta(0, MetaMessage::EndOfTrack));
    out
}

/// Convert an arrangement to an in-memory SMF borrowing its track names.
pub fn arrangement_to_smf(arrangement: &Arrangement) -> Smf<'_> {
    let mut smf = Smf::new(Header::new(
        Format::Parallel,
        Timing::Metrical(u15::new(TICKS_PER_BEAT as u16)),
    ));

    let header = &arrangement.header;
    let (fifths, minor) = key_signature(&header.key);
    smf.tracks.push(vec![
        meta(0, MetaMessage::Tempo(u24::new(tempo_micros(header.tempo)))),
        meta(0, time_signature_meta(header.time_signature)),
        meta(0, MetaMessage::KeySignature(fifths, minor)),
        meta(0, MetaMessage::EndOfTrack),
    ]);

    for track in &arrangement.tracks {
        smf.tracks.push(track_events(track));
    }
    smf
}

/// Encode an arrangement as SMF bytes.
///
/// Fails with `ComposeError::Midi` when an event lies past `MAX_TICK`, since
/// its delta time could not be encoded.
pub fn arrangement_to_bytes(arrangement: &Arrangement) -> Result<Vec<u8>, ComposeError> {
    let end = arrangement.end_tick();
    if end > MAX_TICK {
        return Err(ComposeError::Midi(format!(
            "arrangement ends at tick {end}, past the MIDI limit of {MAX_TICK}"
        )));
    }
    let smf = arrangement_to_smf(arrangement);
    let mut buf = Vec::new();
    smf.write_std(&mut buf).map_err(|e| ComposeError::Midi(e.to_string()))?;
    Ok(buf)
}

/// Convert an arrangement to MIDI and write it to a file.
pub fn write_midi(arrangement: &Arrangement, path: &Path) -> Result<(), ComposeError> {
    let buf = arrangement_to_bytes(arrangement)?;
    std::fs::write(path, &buf)?;
    log::info!(
        "wrote {} ({} tracks, {} bytes)",
        path.display(),
        arrangement.tracks.len() + 1,
        buf.len()
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::arrange::SongHeader;

    fn song() -> Arrangement {
        let mut song = Arrangement::new(SongHeader {
            tempo: 100,
            time_signature: TimeSignature::SixEight,
            key: Key::minor(9),
        });
        song.tracks.push(Track {
            name: "Lead".into(),
            channel: 0,
            program: 73,
            events: vec![
                NoteEvent { pitch: 60, velocity: 90, start: 0, duration: 480 },
                NoteEvent { pitch: 62, velocity: 80, start: 480, duration: 240 },
            ],
        });
        song.tracks.push(Track {
            name: "Drums".into(),
            channel: 9,
            program: 0,
            events: vec![NoteEvent { pitch: 36, velocity: 100, start: 0, duration: 120 }],
        });
        song
    }

    #[test]
    fn test_key_signatures() {
        assert_eq!(key_signature(&Key::major(0)), (0, false));
        assert_eq!(key_signature(&Key::major(7)), (1, false));
        assert_eq!(key_signature(&Key::major(5)), (-1, false));
        assert_eq!(key_signature(&Key::minor(9)), (0, true));
        assert_eq!(key_signature(&Key::minor(4)), (1, true));
        assert_eq!(key_signature(&Key::minor(2)), (-1, true));
    }

    #[test]
    fn test_header_track() {
        let song = song();
        let smf = arrangement_to_smf(&song);
        assert_eq!(smf.tracks.len(), 3);
        let kinds: Vec<TrackEventKind> = smf.tracks[0].iter().map(|e| e.kind).collect();
        assert_eq!(
            kinds,
            vec![
                TrackEventKind::Meta(MetaMessage::Tempo(u24::new(600_000))),
                TrackEventKind::Meta(MetaMessage::TimeSignature(6, 3, 24, 8)),
                TrackEventKind::Meta(MetaMessage::KeySignature(0, true)),
                TrackEventKind::Meta(MetaMessage::EndOfTrack),
            ]
        );
    }

    #[test]
    fn test_note_track_deltas() {
        let song = song();
        let smf = arrangement_to_smf(&song);
        let lead = &smf.tracks[1];
        assert_eq!(lead[0].kind, TrackEventKind::Meta(MetaMessage::TrackName(b"Lead")));
        let deltas: Vec<u32> = lead.iter().map(|e| e.delta.as_int()).collect();
        // name, program, on 60, off 60 + on 62 at 480, off 62 at 720, end.
        assert_eq!(deltas, vec![0, 0, 0, 480, 0, 240, 0]);
        assert!(matches!(
            lead[3].kind,
            TrackEventKind::Midi { message: MidiMessage::NoteOff { .. }, .. }
        ));
        assert!(matches!(
            lead[4].kind,
            TrackEventKind::Midi { message: MidiMessage::NoteOn { .. }, .. }
        ));
        assert!(matches!(
            smf.tracks[2][1].kind,
            TrackEventKind::Midi { channel, .. } if channel == u4::new(9)
        ));
    }

    #[test]
    fn test_bytes_parse_back() {
        let song = song();
        let bytes = arrangement_to_bytes(&song).unwrap();
        assert_eq!(&bytes[..4], b"MThd");
        let parsed = Smf::parse(&bytes).unwrap();
        assert_eq!(parsed.tracks.len(), 3);
        assert_eq!(parsed.header.timing, Timing::Metrical(u15::new(480)));
    }

    #[test]
    fn test_tempo_fits_24_bits() {
        assert_eq!(tempo_micros(120), 500_000);
        assert_eq!(tempo_micros(4), 15_000_000);
        assert_eq!(tempo_micros(1), 0xFF_FFFF);
        assert_eq!(tempo_micros(0), 0xFF_FFFF);

        let mut slow = song();
        slow.header.tempo = 1;
        let bytes = arrangement_to_bytes(&slow).unwrap();
        let parsed = Smf::parse(&bytes).unwrap();
        assert_eq!(
            parsed.tracks[0][0].kind,
            TrackEventKind::Meta(MetaMessage::Tempo(u24::new(0xFF_FFFF)))
        );
    }

    #[test]
    fn test_ticks_past_the_limit_fail() {
        let mut long = song();
        long.tracks[1].events[0].start = MAX_TICK;
        let err = arrangement_to_bytes(&long).unwrap_err();
        assert!(matches!(err, ComposeError::Midi(_)));

        let path = std::env::temp_dir().join(format!("cadenza_long_{}.mid", std::process::id()));
        assert!(matches!(write_midi(&long, &path), Err(ComposeError::Midi(_))));
        assert!(!path.exists());

        long.tracks[1].events[0] =
            NoteEvent { pitch: 36, velocity: 100, start: MAX_TICK - 120, duration: 120 };
        assert!(arrangement_to_bytes(&long).is_ok());
    }

    #[test]
    fn test_write_midi_file() {
        let path = std::env::temp_dir().join(format!("cadenza_midi_{}.mid", std::process::id()));
        write_midi(&song(), &path).unwrap();
        let bytes = std::fs::read(&path).unwrap();
        std::fs::remove_file(&path).ok();
        assert!(Smf::parse(&bytes).is_ok());
    }
}
