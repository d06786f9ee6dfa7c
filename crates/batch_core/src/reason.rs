/// Appends an extra reason to a note.
///
/// With no existing note the reason becomes the note; with both, the result
/// is `"<existing> - <reason>"`. Empty strings count as absent.
pub fn annotate_note(existing: Option<&str>, reason: Option<&str>) -> String {
    let existing = existing.filter(|note| !note.is_empty());
    let reason = reason.filter(|reason| !reason.is_empty());
    match (existing, reason) {
        (Some(note), Some(reason)) => format!("{note} - {reason}"),
        (Some(note), None) => note.to_string(),
        (None, Some(reason)) => reason.to_string(),
        (None, None) => String::new(),
    }
}
