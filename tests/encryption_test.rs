//! Password handling on an RC4-encrypted document (user password "secret").

use untable::{open_document, Document, Error, LocateOptions};

const ENCRYPTED: &[u8] = include_bytes!("fixtures/encrypted-rc4.pdf");

#[test]
fn test_correct_password_decrypts() {
    let document = Document::from_bytes(ENCRYPTED, Some("secret")).unwrap();
    assert_eq!(document.page_count(), 1);

    let page = document.extract_page(1).unwrap().page().unwrap();
    assert_eq!(page.lines.len(), 1);
    assert_eq!(page.lines[0].text(), "Secret table");
}

#[test]
fn test_wrong_password() {
    assert!(matches!(
        Document::from_bytes(ENCRYPTED, Some("nope")),
        Err(Error::InvalidPassword)
    ));
}

#[test]
fn test_missing_password() {
    assert!(matches!(
        Document::from_bytes(ENCRYPTED, None),
        Err(Error::Encrypted)
    ));
}

#[test]
fn test_password_from_options() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("locked.pdf");
    std::fs::write(&path, ENCRYPTED).unwrap();

    let options = LocateOptions::new().with_password("secret");
    assert_eq!(open_document(&path, &options).unwrap().page_count(), 1);
}
