//! テスト用ユーティリティ
//!
//! 小さな辞書をメモリ上に構築し、辞書ストアや変換器をテストから使えるようにします。

use crate::common::{cid, mid, PValue};
use crate::config::ConvertRequestOptions;
use crate::dictionary::resource::MemoryProvider;
use crate::dictionary::{DicdataElement, DicdataStore, DictionaryBuilder};
use crate::kana2kanji::Kana2Kanji;

pub(crate) fn noun(word: &str, ruby: &str, value: PValue) -> DicdataElement {
    DicdataElement::with_cid(word, ruby, cid::GENERAL_NOUN, mid::GENERAL, value)
}

/// 「しか」「しかい」周辺の語だけを持つ辞書
pub(crate) fn mock_builder() -> DictionaryBuilder {
    let mut builder = DictionaryBuilder::new();
    builder
        .add_entry(noun("鹿", "シカ", -6.0))
        .add_entry(noun("歯科", "シカ", -8.0))
        .add_entry(noun("死", "シ", -9.0))
        .add_entry(noun("歯科医", "シカイ", -9.0))
        .add_entry(noun("蚊", "カ", -9.0))
        .add_entry(noun("会", "カイ", -8.5))
        .set_connection(cid::BOS, cid::GENERAL_NOUN, -1.0)
        .set_connection(cid::BOS, cid::EOS, -1.0)
        .set_connection(cid::GENERAL_NOUN, cid::GENERAL_NOUN, -3.0)
        .set_connection(cid::GENERAL_NOUN, cid::EOS, -1.0)
        .set_meaning(mid::GENERAL, mid::GENERAL, -1.0)
        .add_zero_hint(
            cid::GENERAL_NOUN,
            &DicdataElement::new("は", "ハ", cid::PARTICLE_WA, cid::PARTICLE_WA, mid::EOS, -2.0),
        )
        .add_zero_hint_csv(cid::GENERAL_NOUN, "ガ,,,,,\n");
    builder
}

pub(crate) fn mock_provider() -> MemoryProvider {
    match mock_builder().into_provider() {
        Ok(provider) => provider,
        Err(e) => panic!("failed to build the mock dictionary: {e}"),
    }
}

pub(crate) fn mock_store() -> DicdataStore {
    DicdataStore::with_provider(ConvertRequestOptions::default(), mock_provider())
}

pub(crate) fn mock_kana2kanji() -> Kana2Kanji {
    Kana2Kanji::new(mock_store())
}
