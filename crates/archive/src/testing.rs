use bytes::Bytes;

use crate::archive::Archive;
use crate::error::ArchiveError;

/// Runs the Archive conformance suite against a fresh backend instance.
///
/// Call from a backend crate's own test module, e.g.
/// `archive_conformance_tests(&MemoryArchive::new()).await.unwrap()`.
///
/// # Errors
///
/// Returns the first conformance failure encountered.
pub async fn archive_conformance_tests(archive: &dyn Archive) -> Result<(), ArchiveError> {
    test_get_missing_key(archive).await?;
    test_put_then_get_round_trips(archive).await?;
    test_put_overwrites_existing_key(archive).await?;
    test_exists_reflects_presence(archive).await?;
    Ok(())
}

async fn test_get_missing_key(archive: &dyn Archive) -> Result<(), ArchiveError> {
    let got = archive.get("does/not/exist.json").await?;
    assert!(got.is_none(), "unknown key should read back as None");
    Ok(())
}

async fn test_put_then_get_round_trips(archive: &dyn Archive) -> Result<(), ArchiveError> {
    let key = "seed/services/demo/events.json";
    archive
        .put(key, Some("application/json"), Bytes::from_static(b"[]"))
        .await?;
    let got = archive.get(key).await?.expect("just written");
    assert_eq!(got.as_ref(), b"[]");
    Ok(())
}

async fn test_put_overwrites_existing_key(archive: &dyn Archive) -> Result<(), ArchiveError> {
    let key = "reports/templates/base.html";
    archive
        .put(key, Some("text/html"), Bytes::from_static(b"<html>v1</html>"))
        .await?;
    archive
        .put(key, Some("text/html"), Bytes::from_static(b"<html>v2</html>"))
        .await?;
    let got = archive.get(key).await?.expect("overwritten object exists");
    assert_eq!(got.as_ref(), b"<html>v2</html>");
    Ok(())
}

async fn test_exists_reflects_presence(archive: &dyn Archive) -> Result<(), ArchiveError> {
    let key = "events/testruns/it-1/2026/01/01/evt.json";
    assert!(!archive.exists(key).await?);
    archive.put(key, None, Bytes::from_static(b"{}")).await?;
    assert!(archive.exists(key).await?);
    Ok(())
}
