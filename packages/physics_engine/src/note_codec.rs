//! Byte encoding of notes for transport between processes.

use crate::note::Note;
use anyhow::*;


/// Encode a note into bytes.
pub fn slim(note: &Note) -> Result<Vec<u8>> {
    bincode::serialize(note).context("unable to encode note")
}

/// Decode a note from bytes produced by `slim`.
///
/// Tags are not validated here; a decoded note may name an unknown kind or sender.
pub fn fatten(bytes: &[u8]) -> Result<Note> {
    bincode::deserialize(bytes).context("unable to decode note")
}


#[test]
fn unknown_tags_survive_decoding() {
    use crate::note::*;

    let mut note = Note::kill(Subsystem::GameEngine, 12);
    note.kind = 77;
    let decoded = fatten(&slim(&note).unwrap()).unwrap();
    assert_eq!(decoded, note);
    assert_eq!(decoded.kind(), None);
}

#[test]
fn spawn_note_decodes() {
    use crate::{note::*, physics::shape::Shape};
    use vek::*;

    let spec = SpawnSpec::at_rest(
        4,
        Shape::rectangle([-1.0, -1.0], [1.0, 3.0]).unwrap(),
        2.5,
        Vec2::new(10.0, -10.0),
    );
    let note = Note::spawn(Subsystem::GameEngine, spec);
    assert_eq!(fatten(&slim(&note).unwrap()).unwrap(), note);
}

#[test]
fn garbage_is_an_error() {
    assert!(fatten(&[0xff, 0x01]).is_err());
}
