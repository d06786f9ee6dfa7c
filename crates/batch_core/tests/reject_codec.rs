use batch_core::{Canonicalizer, RecordFields, RejectRecord, UrlCanonicalizer};
use pretty_assertions::assert_eq;

fn canon() -> Option<&'static dyn Canonicalizer> {
    Some(&UrlCanonicalizer)
}

#[test]
fn decodes_full_byline_with_note() {
    let record = RejectRecord::decode(
        "https://www.example.com/s/1234/1/,A Story by Some Author - too short",
        canon(),
    );
    assert_eq!(record.url, "https://www.example.com/s/1234/1");
    assert_eq!(record.title.as_deref(), Some("A Story"));
    assert_eq!(record.author.as_deref(), Some("Some Author"));
    assert_eq!(record.note, "too short");
    assert!(record.valid);
    assert_eq!(record.origin_id, None);
}

#[test]
fn decodes_byline_without_note() {
    let record = RejectRecord::decode("https://example.com/s/1,Story by Author", canon());
    assert_eq!(record.title.as_deref(), Some("Story"));
    assert_eq!(record.author.as_deref(), Some("Author"));
    assert_eq!(record.note, "");
}

#[test]
fn unmatched_remainder_is_the_note() {
    let record = RejectRecord::decode("https://example.com/s/1,just not interested", canon());
    assert_eq!(record.title, None);
    assert_eq!(record.author, None);
    assert_eq!(record.note, "just not interested");
}

#[test]
fn bare_url_and_trailing_comma_have_empty_note() {
    for line in ["https://example.com/s/1", "https://example.com/s/1,"] {
        let record = RejectRecord::decode(line, canon());
        assert!(record.valid, "{line}");
        assert_eq!(record.url, "https://example.com/s/1");
        assert_eq!(record.note, "");
        assert_eq!(record.title, None);
    }
}

#[test]
fn empty_url_field_is_invalid() {
    for line in ["", ",Story by Author", "   ,note"] {
        assert!(!RejectRecord::decode(line, canon()).valid, "{line:?}");
    }
}

#[test]
fn commas_after_the_url_belong_to_the_note() {
    let record = RejectRecord::decode("https://example.com/s/1,Hello, World by Me - a, b", None);
    assert_eq!(record.title.as_deref(), Some("Hello, World"));
    assert_eq!(record.author.as_deref(), Some("Me"));
    assert_eq!(record.note, "a, b");
}

#[test]
fn note_separator_inside_note_is_kept() {
    let record = RejectRecord::decode("u,T by A - one - two", None);
    assert_eq!(record.author.as_deref(), Some("A"));
    assert_eq!(record.note, "one - two");
}

#[test]
fn encode_always_emits_comma() {
    let record = RejectRecord::from_trusted("https://example.com/s/1", None, None, "");
    assert_eq!(record.encode(), "https://example.com/s/1,");
}

#[test]
fn encode_drops_byline_when_author_missing() {
    let record = RejectRecord::new(
        RecordFields {
            url: "https://example.com/s/1".to_string(),
            title: Some("Only Title".to_string()),
            note: Some("meh".to_string()),
            ..RecordFields::default()
        },
        canon(),
    );
    assert_eq!(record.full_note(), "meh");
    assert_eq!(record.encode(), "https://example.com/s/1,meh");
}

#[test]
fn decode_encode_is_stable_for_plain_records() {
    let line = "https://example.com/s/9,Title by Author - note";
    let record = RejectRecord::decode(line, canon());
    assert_eq!(record.encode(), line);
    assert_eq!(RejectRecord::decode(&record.encode(), canon()), record);
}

#[test]
fn reason_is_applied_once_on_decode() {
    let record = RejectRecord::decode_with_reason(
        "https://example.com/s/1,T by A - dull",
        Some("duplicate"),
        canon(),
    );
    assert_eq!(record.note, "dull - duplicate");

    // Re-encoding and decoding again does not add the reason a second time.
    let again = RejectRecord::decode(&record.encode(), canon());
    assert_eq!(again.note, "dull - duplicate");
}

#[test]
fn separator_in_title_is_a_known_ambiguity() {
    let record = RejectRecord::new(
        RecordFields {
            url: "https://example.com/s/1".to_string(),
            title: Some("Stand by Me".to_string()),
            author: Some("King".to_string()),
            ..RecordFields::default()
        },
        canon(),
    );
    let decoded = RejectRecord::decode(&record.encode(), canon());
    assert_eq!(decoded.title.as_deref(), Some("Stand"));
    assert_eq!(decoded.author.as_deref(), Some("Me by King"));
}

#[test]
fn canonicalizer_refusal_invalidates() {
    let refuse = |_: &str| -> Option<String> { None };
    let record = RejectRecord::decode("https://example.com/s/1,note", Some(&refuse));
    assert!(!record.valid);
}
