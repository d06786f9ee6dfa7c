use std::fs;
use std::path::Path;

use anyhow::{bail, Context, Result};
use batch_core::{normalize_url, RecordFields, RejectList, RejectRecord, UrlCanonicalizer};
use batch_engine::{export_json, import_json, RejectListStore};
use batch_logging::{batch_info, batch_warn};

use crate::cli::RejectsCommand;

pub fn run(action: RejectsCommand, store: &RejectListStore, reasons: &[String]) -> Result<()> {
    match action {
        RejectsCommand::List => {
            for line in list_lines(&load(store)?) {
                println!("{line}");
            }
        }
        RejectsCommand::Add {
            url,
            title,
            author,
            note,
            reason,
        } => {
            if let Some(reason) = reason.as_deref() {
                if !reasons.is_empty() && !reasons.iter().any(|preset| preset == reason) {
                    batch_warn!("Reason {:?} is not one of the preset reasons", reason);
                }
            }
            let record = add(
                store,
                RecordFields {
                    url,
                    title,
                    author,
                    note,
                    reason,
                    origin_id: None,
                },
            )?;
            println!("Rejected {}", record.encode());
        }
        RejectsCommand::Remove { url } => match remove(store, &url)? {
            Some(record) => println!("Removed {}", record.url),
            None => println!("{url} is not on the reject list"),
        },
        RejectsCommand::Normalize => {
            let (before, after) = normalize(store)?;
            println!("Kept {after} of {before} record(s)");
        }
        RejectsCommand::Export { path } => {
            let list = load(store)?;
            export_json(&list, &path).with_context(|| format!("exporting to {}", path.display()))?;
            println!("Exported {} record(s) to {}", list.len(), path.display());
        }
        RejectsCommand::Import { path } => {
            let added = import(store, &path)?;
            println!("Imported {added} record(s) from {}", path.display());
        }
        RejectsCommand::Reasons => {
            for reason in reasons {
                println!("{reason}");
            }
        }
    }
    Ok(())
}

pub fn load(store: &RejectListStore) -> Result<RejectList> {
    store
        .load(Some(&UrlCanonicalizer))
        .with_context(|| format!("loading reject list {}", store.path().display()))
}

fn save(store: &RejectListStore, list: &RejectList) -> Result<()> {
    store
        .save(list)
        .with_context(|| format!("saving reject list {}", store.path().display()))
}

fn list_lines(list: &RejectList) -> Vec<String> {
    list.iter().map(RejectRecord::encode).collect()
}

fn add(store: &RejectListStore, fields: RecordFields) -> Result<RejectRecord> {
    let record = RejectRecord::new(fields, Some(&UrlCanonicalizer));
    if !record.valid {
        bail!("{:?} is not a valid story URL", record.url);
    }
    let mut list = load(store)?;
    list.upsert(record.clone());
    save(store, &list)?;
    batch_info!("Added {} to the reject list", record.url);
    Ok(record)
}

fn remove(store: &RejectListStore, url: &str) -> Result<Option<RejectRecord>> {
    let key = normalize_url(url).unwrap_or_else(|| url.trim().to_string());
    let mut list = load(store)?;
    let removed = list.remove(&key);
    if removed.is_some() {
        save(store, &list)?;
    }
    Ok(removed)
}

/// Rewrites the store in canonical form. Returns the non-blank line count
/// before and the record count after.
fn normalize(store: &RejectListStore) -> Result<(usize, usize)> {
    let before = match fs::read_to_string(store.path()) {
        Ok(text) => text.lines().filter(|line| !line.trim().is_empty()).count(),
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => 0,
        Err(err) => return Err(err.into()),
    };
    let list = load(store)?;
    save(store, &list)?;
    Ok((before, list.len()))
}

/// Merges records from a JSON export. Returns how many were merged.
fn import(store: &RejectListStore, path: &Path) -> Result<usize> {
    let imported =
        import_json(path).with_context(|| format!("importing from {}", path.display()))?;
    let mut list = load(store)?;
    let mut merged = 0;
    for record in imported {
        if list.upsert(record) {
            merged += 1;
        }
    }
    save(store, &list)?;
    Ok(merged)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn fields(url: &str) -> RecordFields {
        RecordFields {
            url: url.to_string(),
            ..RecordFields::default()
        }
    }

    #[test]
    fn add_canonicalizes_and_persists() {
        let dir = tempfile::tempdir().unwrap();
        let store = RejectListStore::new(dir.path().join("rejects.txt"));

        let record = add(
            &store,
            RecordFields {
                title: Some("A Story".to_string()),
                author: Some("Ann".to_string()),
                note: Some("slow".to_string()),
                reason: Some("Dupe".to_string()),
                ..fields("Example.com/s/1/")
            },
        )
        .unwrap();

        assert_eq!(record.url, "https://example.com/s/1");
        assert_eq!(
            list_lines(&load(&store).unwrap()),
            vec!["https://example.com/s/1,A Story by Ann - slow - Dupe"]
        );
    }

    #[test]
    fn add_refuses_invalid_urls() {
        let dir = tempfile::tempdir().unwrap();
        let store = RejectListStore::new(dir.path().join("rejects.txt"));
        assert!(add(&store, fields("ftp://example.com/x")).is_err());
        assert!(!store.path().exists());
    }

    #[test]
    fn remove_matches_the_canonical_url() {
        let dir = tempfile::tempdir().unwrap();
        let store = RejectListStore::new(dir.path().join("rejects.txt"));
        add(&store, fields("https://example.com/s/1")).unwrap();
        add(&store, fields("https://example.com/s/2")).unwrap();

        let removed = remove(&store, "HTTPS://EXAMPLE.com/s/1/").unwrap();
        assert_eq!(removed.map(|record| record.url).as_deref(), Some("https://example.com/s/1"));
        assert_eq!(remove(&store, "https://example.com/s/9").unwrap(), None);
        assert_eq!(
            list_lines(&load(&store).unwrap()),
            vec!["https://example.com/s/2,"]
        );
    }

    #[test]
    fn normalize_drops_bad_lines_and_duplicates() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("rejects.txt");
        fs::write(
            &path,
            "http://Example.com/s/1/,first\n\n,no url\nexample.com/s/2,second\nhttp://example.com/s/1,again\n",
        )
        .unwrap();
        let store = RejectListStore::new(&path);

        assert_eq!(normalize(&store).unwrap(), (4, 2));
        assert_eq!(
            fs::read_to_string(&path).unwrap(),
            "http://example.com/s/1,again\nhttps://example.com/s/2,second\n"
        );
    }

    #[test]
    fn import_merges_into_the_store() {
        let dir = tempfile::tempdir().unwrap();
        let store = RejectListStore::new(dir.path().join("rejects.txt"));
        add(&store, fields("https://example.com/s/1")).unwrap();

        let json = dir.path().join("rejects.json");
        fs::write(
            &json,
            r#"[{"url": "https://example.com/s/1", "note": "updated"},
                {"url": "https://example.com/s/3", "title": "T", "auth": "A"}]"#,
        )
        .unwrap();

        assert_eq!(import(&store, &json).unwrap(), 2);
        assert_eq!(
            list_lines(&load(&store).unwrap()),
            vec![
                "https://example.com/s/1,updated",
                "https://example.com/s/3,T by A",
            ]
        );
    }
}
