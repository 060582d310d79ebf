//! 変換速度のベンチマーク
//!
//! 合成した辞書を使い、入力全体からのラティス構築と、1文字ずつ入力したときの
//! 差分による構築の速度を比較します。

use std::time::Duration;

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use kanakanji::common::{cid, mid};
use kanakanji::dictionary::{DicdataElement, DicdataStore, DictionaryBuilder};
use kanakanji::{ComposingText, ConvertRequestOptions, KanaKanjiConverter};

const SYLLABLES: &[&str] = &[
    "か", "き", "く", "け", "こ", "さ", "し", "す", "せ", "そ", "た", "ち", "つ", "て", "と", "な",
    "に", "ぬ", "ね", "の", "は", "ひ", "ふ", "へ", "ほ", "ま", "み", "む", "め", "も",
];

const INPUT: &str = "かきくけこさしすせそたちつてとなにぬねのはひふへほ";

/// 2音節と3音節の語をすべて登録した辞書
fn synthetic_store(options: &ConvertRequestOptions) -> DicdataStore {
    let mut builder = DictionaryBuilder::new();
    for (i, a) in SYLLABLES.iter().enumerate() {
        for (j, b) in SYLLABLES.iter().enumerate() {
            let ruby = format!("{a}{b}");
            let value = -6.0 - ((i * 7 + j) % 9) as f32;
            builder.add_entry(DicdataElement::with_cid(
                format!("語{i}_{j}"),
                ruby.clone(),
                cid::GENERAL_NOUN,
                mid::GENERAL,
                value,
            ));
            let c = SYLLABLES[(i + j) % SYLLABLES.len()];
            builder.add_entry(DicdataElement::with_cid(
                format!("長語{i}_{j}"),
                format!("{ruby}{c}"),
                cid::GENERAL_NOUN,
                mid::GENERAL,
                value - 1.0,
            ));
        }
    }
    builder
        .set_connection(cid::BOS, cid::GENERAL_NOUN, -1.0)
        .set_connection(cid::GENERAL_NOUN, cid::GENERAL_NOUN, -3.0)
        .set_meaning(mid::GENERAL, mid::GENERAL, -1.0);
    let provider = builder
        .into_provider()
        .unwrap_or_else(|e| panic!("Failed to build the dictionary: {e}"));
    DicdataStore::with_provider(options.clone(), provider)
}

fn criterion_benchmark(c: &mut Criterion) {
    let options = ConvertRequestOptions::default().require_japanese_prediction(false);
    let chars: Vec<char> = INPUT.chars().collect();

    let mut group = c.benchmark_group("Conversion");
    group.throughput(Throughput::Elements(chars.len() as u64));
    group.warm_up_time(Duration::from_secs(3));
    group.measurement_time(Duration::from_secs(10));
    group.sample_size(20);

    group.bench_function(BenchmarkId::new("Full", chars.len()), |b| {
        b.iter_with_setup(
            || KanaKanjiConverter::with_store(synthetic_store(&options)),
            |mut converter| {
                let mut text = ComposingText::default();
                for c in &chars {
                    text.append(&c.to_string());
                    converter.stop_composition();
                    converter.request_candidates(&text, &options);
                }
            },
        );
    });

    group.bench_function(BenchmarkId::new("Incremental", chars.len()), |b| {
        b.iter_with_setup(
            || KanaKanjiConverter::with_store(synthetic_store(&options)),
            |mut converter| {
                let mut text = ComposingText::default();
                for c in &chars {
                    text.append(&c.to_string());
                    converter.request_candidates(&text, &options);
                }
            },
        );
    });

    group.finish();
}

criterion_group!(benches, criterion_benchmark);
criterion_main!(benches);
