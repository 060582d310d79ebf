use std::fs::OpenOptions;
use std::path::Path;

use tempfile::{tempdir, TempDir};

use crate::config::ConvertRequestOptions;
use crate::converter::KanaKanjiConverter;
use crate::dictionary::{DicdataStore, Metadata, Notification};
use crate::input::ComposingText;
use crate::test_utils::{mock_builder, noun};

/// Writes the mock dictionary with one user entry into a temporary directory.
fn on_disk() -> (TempDir, ConvertRequestOptions) {
    let dir = tempdir().unwrap();
    let options = ConvertRequestOptions::default()
        .dictionary_resource_dir(dir.path().join("dictionary"))
        .memory_dir(dir.path().join("memory"))
        .shared_container_dir(dir.path().join("shared"));
    let mut builder = mock_builder();
    builder.add_user_entry(noun("志賀", "シガ", -7.0));
    builder.write_to_dir(&options).unwrap();
    (dir, options)
}

fn truncate(path: &Path, len: u64) {
    let file = OpenOptions::new().write(true).open(path).unwrap();
    file.set_len(len).unwrap();
}

fn words(store: &mut DicdataStore, text: &str) -> Vec<String> {
    store
        .lookup_range(&ComposingText::new(text), 0, None, true)
        .into_iter()
        .map(|n| n.data.word)
        .collect()
}

#[test]
fn test_load_from_disk() {
    let (_dir, options) = on_disk();
    assert!(options
        .dictionary_resource_dir
        .join("louds/charID.chid")
        .exists());
    assert!(options.dictionary_resource_dir.join("louds/シ.louds").exists());

    let mut converter = KanaKanjiConverter::new(options.clone());
    let result = converter.request_candidates(&ComposingText::new("しか"), &options);
    assert_eq!(result.main_results[0].text, "鹿");

    let result = converter.request_candidates(&ComposingText::new("しが"), &options);
    let shiga = result
        .main_results
        .iter()
        .find(|c| c.text == "志賀")
        .expect("user dictionary entry");
    assert!(shiga.data[0]
        .metadata
        .contains(Metadata::IS_FROM_USER_DICTIONARY));
}

#[test]
fn test_truncated_header() {
    let (_dir, options) = on_disk();
    truncate(
        &options.dictionary_resource_dir.join("louds/シ0.loudstxt3"),
        1,
    );
    let mut store = DicdataStore::new(options.clone());
    let found = words(&mut store, "しか");
    assert!(!found.iter().any(|w| w == "鹿" || w == "歯科"));
    // Synthetic entries are still produced.
    assert!(found.iter().any(|w| w == "シ"));

    let mut converter = KanaKanjiConverter::with_store(store);
    let result = converter.request_candidates(&ComposingText::new("しか"), &options);
    assert!(result.main_results.iter().any(|c| c.text == "シカ"));
}

#[test]
fn test_truncated_records() {
    let (_dir, options) = on_disk();
    let path = options.dictionary_resource_dir.join("louds/シ0.loudstxt3");
    let len = std::fs::metadata(&path).unwrap().len();
    for cut in [len - 1, len - 5, len / 2, 7] {
        truncate(&path, cut);
        let mut store = DicdataStore::new(options.clone());
        let found = words(&mut store, "しかい");
        assert!(found.iter().all(|w| !w.is_empty()));
        assert!(found.iter().any(|w| w == "シ"));
    }
}

#[test]
fn test_missing_dictionary() {
    let dir = tempdir().unwrap();
    let options = ConvertRequestOptions::default()
        .dictionary_resource_dir(dir.path())
        .memory_dir(dir.path())
        .shared_container_dir(dir.path());
    let mut converter = KanaKanjiConverter::new(options.clone());
    let result = converter.request_candidates(&ComposingText::new("しか"), &options);
    let texts: Vec<&str> = result.main_results.iter().map(|c| c.text.as_str()).collect();
    assert!(texts.contains(&"シカ"));
    assert!(texts.contains(&"しか"));
}

#[test]
fn test_switch_dictionary_dir() {
    let (_dir, options) = on_disk();
    let empty = tempdir().unwrap();
    let mut converter = KanaKanjiConverter::new(
        ConvertRequestOptions::default().dictionary_resource_dir(empty.path()),
    );
    let result = converter.request_candidates(&ComposingText::new("しか"), &options);
    assert_eq!(result.main_results[0].text, "鹿");

    converter.send_to_dicdata_store(Notification::CloseKeyboard);
    let result = converter.request_candidates(&ComposingText::new("しかい"), &options);
    assert_eq!(result.main_results[0].text, "歯科医");
}
