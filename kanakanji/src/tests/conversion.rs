use std::ops::Range;
use std::sync::Arc;

use hashbrown::HashSet;

use crate::common::{cid, mid, PValue};
use crate::config::ConvertRequestOptions;
use crate::converter::KanaKanjiConverter;
use crate::dictionary::{DicdataElement, DicdataStore, DictionaryBuilder};
use crate::input::{ComposingText, TypoRules};
use crate::kana2kanji::{Kana2Kanji, Lattice, PrefixConstraint, Strategy};
use crate::test_utils::{mock_kana2kanji, mock_store, noun};

fn totals(lattice: &Lattice) -> Vec<PValue> {
    let mut values: Vec<PValue> = lattice
        .eos()
        .prevs
        .iter()
        .map(|&id| lattice.registered(id).total_value)
        .collect();
    values.sort_by(|a, b| b.total_cmp(a));
    values
}

fn best_text(lattice: &Lattice) -> Option<String> {
    lattice.best().map(|id| lattice.path_text(id))
}

/// Converts `before` then `after` in one session and `after` in a fresh one.
fn incremental_and_full(before: &ComposingText, after: &ComposingText) -> (Lattice, Lattice) {
    let options = ConvertRequestOptions::default();
    let mut incremental = KanaKanjiConverter::with_store(mock_store());
    incremental.request_candidates(before, &options);
    incremental.request_candidates(after, &options);
    let mut full = KanaKanjiConverter::with_store(mock_store());
    full.request_candidates(after, &options);
    (
        incremental.lattice().cloned().unwrap(),
        full.lattice().cloned().unwrap(),
    )
}

fn typo_rules() -> Arc<TypoRules> {
    let mut rules = TypoRules::new();
    rules.insert('ガ', 'カ', 1.0);
    rules.insert('キ', 'カ', 1.5);
    rules.insert('イ', 'ウ', 2.0);
    Arc::new(rules)
}

fn assert_incremental_matches_full(pairs: &[(&str, &str)], rules: Option<Arc<TypoRules>>) {
    let text = |s: &str| match &rules {
        Some(rules) => ComposingText::new(s).with_typo_rules(Arc::clone(rules)),
        None => ComposingText::new(s),
    };
    for &(before, after) in pairs {
        let (incremental, full) = incremental_and_full(&text(before), &text(after));
        assert_eq!(incremental.len(), full.len(), "{before} -> {after}");
        assert_eq!(best_text(&incremental), best_text(&full), "{before} -> {after}");
        assert_eq!(totals(&incremental), totals(&full), "{before} -> {after}");
        assert!(incremental.arena_len() <= full.arena_len(), "{before} -> {after}");
    }
}

const EDITS: &[(&str, &str)] = &[
    ("しか", "しかい"),
    ("し", "しかい"),
    ("しかい", "しか"),
    ("しかい", "し"),
    ("しかい", "しかか"),
    ("しか", "しか"),
    ("かい", "しかい"),
    ("しかいか", "しかかい"),
    ("しかしか", "しかいしか"),
];

/// 鹿・歯科・死だけを持ち、「カ」単独の読みを持たない辞書
fn shika_store() -> DicdataStore {
    let mut builder = DictionaryBuilder::new();
    builder
        .add_entry(noun("鹿", "シカ", -6.0))
        .add_entry(noun("歯科", "シカ", -8.0))
        .add_entry(noun("死", "シ", -9.0))
        .set_connection(cid::BOS, cid::GENERAL_NOUN, -1.0)
        .set_connection(cid::GENERAL_NOUN, cid::GENERAL_NOUN, -3.0)
        .set_connection(cid::GENERAL_NOUN, cid::EOS, -1.0);
    let provider = builder.into_provider().unwrap();
    DicdataStore::with_provider(ConvertRequestOptions::default(), provider)
}

#[test]
fn test_shika_without_ka_entry() {
    let mut kana2kanji = Kana2Kanji::new(shika_store());
    let lattice = kana2kanji.all(&ComposingText::new("しか"), 10);

    let head: Vec<(&str, Range<usize>)> = lattice.nodes()[0]
        .iter()
        .map(|n| (n.data.word.as_str(), n.range.clone()))
        .collect();
    assert!(head.contains(&("鹿", 0..2)));
    assert!(head.contains(&("死", 0..1)));

    // Only the synthetic katakana entry covers the second character.
    let second: Vec<&str> = lattice.nodes()[1]
        .iter()
        .map(|n| n.data.word.as_str())
        .collect();
    assert_eq!(second, vec!["カ"]);
    assert_eq!(lattice.nodes()[1][0].data.lcid, cid::PROPER_NOUN);

    let paths: Vec<String> = lattice
        .eos()
        .prevs
        .iter()
        .map(|&id| lattice.path_text(id))
        .collect();
    assert!(paths.iter().any(|p| p == "鹿"));
    assert!(paths.iter().any(|p| p == "死カ"));
    assert_eq!(best_text(&lattice).as_deref(), Some("鹿"));
}

#[test]
fn test_incremental_matches_full() {
    assert_incremental_matches_full(EDITS, None);
}

#[test]
fn test_incremental_matches_full_with_typos() {
    assert_incremental_matches_full(EDITS, Some(typo_rules()));
    assert_incremental_matches_full(
        &[
            ("しが", "しがい"),
            ("しがい", "しが"),
            ("しがいし", "しがかい"),
            ("しかい", "しきい"),
            ("しき", "しきかい"),
        ],
        Some(typo_rules()),
    );
}

#[test]
fn test_multi_character_replacement() {
    for (before, after) in [("しかいか", "しかかい"), ("しかしか", "しかいしか")] {
        let strategy = Strategy::select(
            Some(&ComposingText::new(before)),
            &ComposingText::new(after),
            false,
        );
        match strategy {
            Strategy::Changed { deleted, added } => assert!(deleted > 1 && added > 1),
            other => panic!("{before} -> {after}: {other:?}"),
        }
    }
}

#[test]
fn test_n_best_bound() {
    let options = ConvertRequestOptions::default().n_best(2);
    let mut converter = KanaKanjiConverter::with_store(mock_store());
    converter.request_candidates(&ComposingText::new("しかしかい"), &options);
    let lattice = converter.lattice().unwrap();
    for nodes in lattice.nodes() {
        for node in nodes {
            assert!(node.prevs.len() <= 2);
            assert!(node
                .prevs
                .windows(2)
                .all(|w| lattice.registered(w[0]).total_value
                    >= lattice.registered(w[1]).total_value));
        }
    }
}

#[test]
fn test_node_ranges_follow_input() {
    let mut kana2kanji = mock_kana2kanji();
    let lattice = kana2kanji.all(&ComposingText::new("しかい"), 10);
    for (start, nodes) in lattice.nodes().iter().enumerate() {
        for node in nodes {
            assert_eq!(node.range.start, start);
            assert!(node.range.end <= 3);
            assert!(node.range.end > start);
        }
    }
}

#[test]
fn test_prefix_constraint() {
    let mut kana2kanji = mock_kana2kanji();
    let input = ComposingText::new("しかい");

    let open = PrefixConstraint::new("鹿", false);
    let lattice = kana2kanji.all_with_prefix_constraint(&input, 10, &open);
    assert!(!lattice.eos().prevs.is_empty());
    for &id in &lattice.eos().prevs {
        assert!(lattice.path_text(id).starts_with("鹿"));
    }

    let closed = PrefixConstraint::new("歯科医", true);
    let lattice = kana2kanji.all_with_prefix_constraint(&input, 10, &closed);
    assert_eq!(best_text(&lattice).as_deref(), Some("歯科医"));
    for &id in &lattice.eos().prevs {
        assert_eq!(lattice.path_text(id), "歯科医");
    }

    let impossible = PrefixConstraint::new("蚊", true);
    let lattice = kana2kanji.all_with_prefix_constraint(&input, 10, &impossible);
    assert!(lattice.eos().prevs.is_empty());
}

fn particle_store() -> DicdataStore {
    let mut builder = DictionaryBuilder::new();
    builder
        .add_entry(noun("鹿", "シカ", -6.0))
        .add_entry(noun("歯科", "シカ", -8.0))
        .add_entry(DicdataElement::new(
            "は",
            "ハ",
            cid::PARTICLE_WA,
            cid::PARTICLE_WA,
            mid::EOS,
            -2.0,
        ))
        .set_connection(cid::BOS, cid::GENERAL_NOUN, -1.0)
        .set_connection(cid::GENERAL_NOUN, cid::PARTICLE_WA, -1.0)
        .set_connection(cid::PARTICLE_WA, cid::GENERAL_NOUN, -1.0)
        .set_connection(cid::GENERAL_NOUN, cid::GENERAL_NOUN, -10.0);
    let provider = builder.into_provider().unwrap();
    DicdataStore::with_provider(ConvertRequestOptions::default(), provider)
}

#[test]
fn test_clause_split() {
    let options = ConvertRequestOptions::default();
    let mut converter = KanaKanjiConverter::with_store(particle_store());
    let result = converter.request_candidates(&ComposingText::new("しかはしか"), &options);
    assert_eq!(result.main_results[0].text, "鹿は鹿");

    let first = result
        .first_clause_results
        .iter()
        .find(|c| c.text == "鹿は")
        .expect("noun and particle form one clause");
    assert_eq!(first.corresponding_count, 3);
    assert_eq!(first.data.len(), 2);

    let lattice = converter.lattice().unwrap();
    let data = lattice.candidate_data(lattice.best().unwrap());
    let clauses: Vec<&str> = data.clauses.iter().map(|(c, _)| c.text.as_str()).collect();
    assert_eq!(clauses, vec!["鹿は", "鹿"]);
    assert_eq!(data.clauses[0].0.range, 0..3);
    assert_eq!(data.clauses[0].0.next_lcid, cid::GENERAL_NOUN);
}

#[test]
fn test_results_are_unique() {
    let options = ConvertRequestOptions::default()
        .full_width_roman_candidate(true)
        .half_width_kana_candidate(true);
    let mut converter = KanaKanjiConverter::with_store(mock_store());
    for text in ["し", "しか", "しかい", "かい"] {
        let result = converter.request_candidates(&ComposingText::new(text), &options);
        let texts: Vec<&str> = result.main_results.iter().map(|c| c.text.as_str()).collect();
        let unique: HashSet<&str> = texts.iter().copied().collect();
        assert_eq!(unique.len(), texts.len(), "{text}");

        // One of the first three candidates reads exactly as typed.
        let target = crate::utils::to_katakana(text);
        assert!(result.main_results.iter().take(3).any(|c| c.ruby() == target));
    }
}

#[test]
fn test_learning_changes_ranking() {
    let options = ConvertRequestOptions::default();
    let mut converter = KanaKanjiConverter::with_store(mock_store());
    let input = ComposingText::new("しか");
    let result = converter.request_candidates(&input, &options);
    assert_eq!(result.main_results[0].text, "鹿");

    let shika = result
        .main_results
        .iter()
        .find(|c| c.text == "歯科")
        .cloned()
        .unwrap();
    for _ in 0..5 {
        converter.update_learning_data(&shika);
    }
    converter.stop_composition();
    let result = converter.request_candidates(&input, &options);
    assert!(result
        .main_results
        .iter()
        .any(|c| c.text == "歯科" && c.data.iter().any(|d| d.metadata.contains(
            crate::dictionary::Metadata::IS_LEARNED
        ))));
}
