//! Line codec for reject records.
//!
//! A line is `url[,rest]`. `rest` is either `"<title> by <author>[ - <note>]"`
//! or, when that shape does not match, the whole note. Parsing never fails;
//! only an empty URL field makes a record invalid.
//!
//! Titles containing `" by "` and authors containing `" - "` do not survive
//! a round trip: there is no escaping, so the first separator wins.

use crate::canonical::Canonicalizer;
use crate::record::{RecordFields, RejectRecord};

const BYLINE_SEPARATOR: &str = " by ";
const NOTE_SEPARATOR: &str = " - ";

impl RejectRecord {
    /// Decodes one persisted line.
    pub fn decode(line: &str, canonicalizer: Option<&dyn Canonicalizer>) -> Self {
        Self::new(parse_line(line), canonicalizer)
    }

    /// Decodes one line and folds `reason` into its note.
    pub fn decode_with_reason(
        line: &str,
        reason: Option<&str>,
        canonicalizer: Option<&dyn Canonicalizer>,
    ) -> Self {
        let mut fields = parse_line(line);
        fields.reason = reason.map(str::to_string);
        Self::new(fields, canonicalizer)
    }

    /// Encodes as `"<url>,<full note>"`. The comma is always present.
    pub fn encode(&self) -> String {
        format!("{},{}", self.url, self.full_note())
    }

    /// `"<title> by <author>[ - <note>]"` when both title and author are
    /// set, otherwise just the note.
    pub fn full_note(&self) -> String {
        match self.byline() {
            Some((title, author)) if self.note.is_empty() => format!("{title} by {author}"),
            Some((title, author)) => format!("{title} by {author} - {}", self.note),
            None => self.note.clone(),
        }
    }
}

/// Splits a line into record fields, without canonicalizing.
pub fn parse_line(line: &str) -> RecordFields {
    let (url, rest) = match line.split_once(',') {
        Some((url, rest)) => (url, Some(rest)),
        None => (line, None),
    };

    let mut fields = RecordFields {
        url: url.trim().to_string(),
        ..RecordFields::default()
    };
    let Some(rest) = rest else {
        return fields;
    };

    match split_byline(rest) {
        Some((title, author, note)) => {
            fields.title = Some(title.to_string());
            fields.author = Some(author.to_string());
            fields.note = note.map(str::to_string);
        }
        None => fields.note = Some(rest.to_string()),
    }
    fields
}

/// Earliest `" by "` with a non-empty title before it and a non-empty
/// author after it.
fn split_byline(rest: &str) -> Option<(&str, &str, Option<&str>)> {
    separator_positions(rest, BYLINE_SEPARATOR).find_map(|at| {
        let title = &rest[..at];
        let tail = &rest[at + BYLINE_SEPARATOR.len()..];
        if tail.is_empty() {
            return None;
        }
        let (author, note) = split_note(tail);
        Some((title, author, note))
    })
}

/// Earliest `" - "` with a non-empty author before it and a non-empty note
/// after it; otherwise the whole tail is the author.
fn split_note(tail: &str) -> (&str, Option<&str>) {
    separator_positions(tail, NOTE_SEPARATOR)
        .find_map(|at| {
            let note = &tail[at + NOTE_SEPARATOR.len()..];
            (!note.is_empty()).then(|| (&tail[..at], Some(note)))
        })
        .unwrap_or((tail, None))
}

/// Byte offsets (at least 1) where `separator` starts, overlapping matches
/// included.
fn separator_positions<'a>(
    text: &'a str,
    separator: &'a str,
) -> impl Iterator<Item = usize> + 'a {
    (1..text.len()).filter(move |&at| text.is_char_boundary(at) && text[at..].starts_with(separator))
}
