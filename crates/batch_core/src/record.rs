use crate::canonical::Canonicalizer;
use crate::reason::annotate_note;

/// Opaque identifier of the library entry a record was created from.
pub type OriginId = u64;

/// A URL the user declined, with optional title/author and a free note.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RejectRecord {
    pub url: String,
    pub title: Option<String>,
    pub author: Option<String>,
    pub note: String,
    pub valid: bool,
    pub origin_id: Option<OriginId>,
}

/// Raw inputs for building a [`RejectRecord`].
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RecordFields {
    pub url: String,
    pub title: Option<String>,
    pub author: Option<String>,
    pub note: Option<String>,
    /// Extra reason folded into the note once, at construction.
    pub reason: Option<String>,
    pub origin_id: Option<OriginId>,
}

impl RejectRecord {
    /// Builds a record from user or parsed input.
    ///
    /// The reason is folded into the note, and the URL is canonicalized when
    /// a canonicalizer is given. An empty URL, or one the canonicalizer
    /// refuses, makes the record invalid.
    pub fn new(fields: RecordFields, canonicalizer: Option<&dyn Canonicalizer>) -> Self {
        let note = annotate_note(fields.note.as_deref(), fields.reason.as_deref());
        let raw_url = fields.url.trim().to_string();

        let (url, valid) = if raw_url.is_empty() {
            (raw_url, false)
        } else {
            match canonicalizer {
                Some(canonicalizer) => match canonicalizer.normalize(&raw_url) {
                    Some(url) => (url, true),
                    None => (raw_url, false),
                },
                None => (raw_url, true),
            }
        };

        Self {
            url,
            title: non_empty(fields.title),
            author: non_empty(fields.author),
            note,
            valid,
            origin_id: fields.origin_id,
        }
    }

    /// Restores a record from already trusted stored data. No
    /// canonicalization, always valid.
    pub fn from_trusted(
        url: impl Into<String>,
        title: Option<String>,
        author: Option<String>,
        note: impl Into<String>,
    ) -> Self {
        Self {
            url: url.into(),
            title: non_empty(title),
            author: non_empty(author),
            note: note.into(),
            valid: true,
            origin_id: None,
        }
    }

    /// True when the record carries both a title and an author, so the note
    /// is rendered after a `"<title> by <author>"` prefix.
    pub fn has_byline(&self) -> bool {
        self.byline().is_some()
    }

    pub(crate) fn byline(&self) -> Option<(&str, &str)> {
        match (self.title.as_deref(), self.author.as_deref()) {
            (Some(title), Some(author)) if !title.is_empty() && !author.is_empty() => {
                Some((title, author))
            }
            _ => None,
        }
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|text| !text.is_empty())
}
