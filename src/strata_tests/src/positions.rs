use strata_syntax::source::{Position, SourceId, SourceRegistry};

fn registry_with(text: &[u8]) -> (SourceRegistry, SourceId) {
    let registry = SourceRegistry::new();
    let id = SourceId::synthetic("string://positions");
    registry.register(id.clone(), text).unwrap();
    (registry, id)
}

#[test]
fn utf8_positions_through_a_mixed_line() {
    // "café" is 5 bytes, then LF, then three 3-byte runes
    let (registry, id) = registry_with("café\n日本語".as_bytes());
    assert_eq!(registry.position_at(&id, 0), Position::new(1, 1, 0));
    assert_eq!(registry.position_at(&id, 3), Position::new(1, 4, 3));
    assert_eq!(registry.position_at(&id, 5), Position::new(1, 5, 5));
    assert_eq!(registry.position_at(&id, 6), Position::new(2, 1, 6));
    assert_eq!(registry.position_at(&id, 15), Position::new(2, 4, 15));
}

#[test]
fn crlf_counts_as_one_break() {
    let (registry, id) = registry_with(b"ab\r\ncd\r\ne");
    assert_eq!(registry.position_at(&id, 4), Position::new(2, 1, 4));
    assert_eq!(registry.position_at(&id, 8), Position::new(3, 1, 8));
}

#[test]
fn position_byte_round_trips_for_every_offset() {
    let text = "héllo\r\nwörld\nzeile".as_bytes();
    let (registry, id) = registry_with(text);
    for offset in 0..=text.len() {
        let position = registry.position_at(&id, offset);
        assert!(!position.is_unknown(), "offset {offset}");
        assert_eq!(position.byte, offset);
    }
    assert!(registry.position_at(&id, text.len() + 1).is_unknown());
}

#[test]
fn eof_after_trailing_newline_starts_a_new_line() {
    let (registry, id) = registry_with(b"one\n");
    assert_eq!(registry.position_at(&id, 4), Position::new(2, 1, 4));
}

#[test]
fn unknown_sources_yield_the_zero_position() {
    let registry = SourceRegistry::new();
    let id = SourceId::synthetic("string://missing");
    assert!(registry.position_at(&id, 0).is_unknown());
}

#[test]
fn rune_and_byte_offsets_are_inverse() {
    let text = "aé日x";
    let (registry, id) = registry_with(text.as_bytes());
    // code point boundaries: 0, 1, 3, 6; EOF byte 7
    let boundaries: Vec<usize> = text
        .char_indices()
        .map(|(byte, _)| byte)
        .chain([text.len()])
        .collect();
    for (rune, byte) in boundaries.iter().enumerate() {
        assert_eq!(registry.rune_to_byte_offset(&id, rune).unwrap(), *byte);
    }
    assert!(registry.rune_to_byte_offset(&id, boundaries.len()).is_err());
}

#[test]
fn line_start_byte_is_one_based_and_range_checked() {
    let (registry, id) = registry_with(b"a\nbc\n");
    assert_eq!(registry.line_start_byte(&id, 1).unwrap(), 0);
    assert_eq!(registry.line_start_byte(&id, 2).unwrap(), 2);
    assert_eq!(registry.line_start_byte(&id, 3).unwrap(), 5);
    assert!(registry.line_start_byte(&id, 0).is_err());
    assert!(registry.line_start_byte(&id, 4).is_err());
}

#[test]
fn keys_are_sorted_and_clear_drops_everything() {
    let registry = SourceRegistry::new();
    let b = SourceId::synthetic("string://b");
    let a = SourceId::synthetic("string://a");
    registry.register(b.clone(), b"b").unwrap();
    registry.register(a.clone(), b"a").unwrap();
    assert_eq!(registry.keys(), vec![a, b]);
    registry.clear();
    assert!(registry.is_empty());
}

#[test]
fn content_is_a_defensive_copy() {
    use strata_syntax::source::Span;

    let (registry, id) = registry_with(b"abc");
    let mut copy = registry.content_of(&id).unwrap();
    copy[0] = b'z';
    assert_eq!(registry.content_of(&id).unwrap(), b"abc");

    // span-based access goes through the same source
    let span = Span::new(id, Position::new(1, 1, 0), Position::new(1, 2, 1));
    assert_eq!(registry.content(&span).unwrap(), b"abc");
}
