use batch_core::{normalize_url, Canonicalizer, RecordFields, RejectRecord, UrlCanonicalizer};
use proptest::prelude::*;

fn words() -> impl Strategy<Value = String> {
    "[A-Za-z0-9']{1,8}( [A-Za-z0-9']{1,8}){0,3}"
}

proptest! {
    #[test]
    fn decode_inverts_encode_for_clean_bylines(
        story in 1u32..1_000_000,
        title in words(),
        author in words(),
        note in "[ -~]{0,30}",
    ) {
        // Separators inside the byline are an accepted ambiguity.
        prop_assume!(!title.contains(" by"));
        prop_assume!(!author.contains(" -"));

        let canon: &dyn Canonicalizer = &UrlCanonicalizer;
        let record = RejectRecord::new(
            RecordFields {
                url: format!("https://www.example.com/s/{story}/1/"),
                title: Some(title),
                author: Some(author),
                note: Some(note),
                ..RecordFields::default()
            },
            Some(canon),
        );

        let decoded = RejectRecord::decode(&record.encode(), Some(canon));
        prop_assert_eq!(decoded, record);
    }

    #[test]
    fn normalization_is_idempotent(
        raw in "(https?://)?[a-zA-Z0-9.-]{1,20}(:[0-9]{1,5})?(/[a-zA-Z0-9._~-]{0,10}){0,3}/?(\\?[a-z0-9=&]{0,10})?(#[a-z]{0,5})?",
    ) {
        if let Some(once) = normalize_url(&raw) {
            prop_assert_eq!(normalize_url(&once), Some(once.clone()));
        }
    }
}
