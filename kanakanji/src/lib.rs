//! # kanakanji
//!
//! kanakanjiは、ひらがなの入力を漢字かな混じり文に変換するインプットメソッドの変換エンジンです。
//!
//! ## 概要
//!
//! 読みの先頭文字ごとに分割されたLOUDSトライと、固定長のブロックに詰められたエントリから
//! 辞書を引き、入力の各位置から始まる語をノードとするラティスを構築します。
//! 品詞連接コストと意味連接コストを加えたN-best探索によって、文全体・先頭の文節・単語の
//! 変換候補を求めます。
//!
//! ## 主な機能
//!
//! - **差分によるラティスの再利用**: 文字の追加・削除・置換、文節の確定に応じて以前の
//!   ラティスを再利用
//! - **誤り訂正**: 入力の打ち間違いをペナルティ付きで補正した検索
//! - **予測変換**: 入力中の末尾文節の補完と、確定後に続く語の予測
//! - **学習**: 確定された語を一時的な学習メモリに記録し、次の変換で優先
//! - **接頭辞制約付きの変換**: 指定した文字列で始まる候補だけを探索
//!
//! ## 使用例
//!
//! ```
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! use kanakanji::common::{cid, mid};
//! use kanakanji::dictionary::{DicdataElement, DicdataStore, DictionaryBuilder};
//! use kanakanji::{ComposingText, ConvertRequestOptions, KanaKanjiConverter};
//!
//! let noun = |word, ruby, value| {
//!     DicdataElement::with_cid(word, ruby, cid::GENERAL_NOUN, mid::GENERAL, value)
//! };
//! let mut builder = DictionaryBuilder::new();
//! builder
//!     .add_entry(noun("鹿", "シカ", -6.0))
//!     .add_entry(noun("歯科", "シカ", -8.0))
//!     .add_entry(noun("歯科医", "シカイ", -9.0))
//!     .set_connection(cid::BOS, cid::GENERAL_NOUN, -1.0)
//!     .set_connection(cid::GENERAL_NOUN, cid::GENERAL_NOUN, -3.0)
//!     .set_connection(cid::GENERAL_NOUN, cid::EOS, -1.0);
//!
//! let options = ConvertRequestOptions::default();
//! let store = DicdataStore::with_provider(options.clone(), builder.into_provider()?);
//! let mut converter = KanaKanjiConverter::with_store(store);
//!
//! let mut input = ComposingText::new("しか");
//! let result = converter.request_candidates(&input, &options);
//! assert_eq!(result.main_results[0].text, "鹿");
//!
//! input.append("い");
//! let result = converter.request_candidates(&input, &options);
//! assert_eq!(result.main_results[0].text, "歯科医");
//! # Ok(())
//! # }
//! ```
#![cfg_attr(docsrs, feature(doc_cfg))]

/// 変換候補の型
pub mod candidate;

/// 品詞ID・意味IDなどの共通の定義
pub mod common;

/// 変換リクエストの設定
pub mod config;

/// 変換セッション
pub mod converter;

/// 辞書データ構造とビルダー
pub mod dictionary;

/// エラー型の定義
pub mod errors;

/// 入力の表現
pub mod input;

/// ラティスの構築と探索
pub mod kana2kanji;

/// かなの変換などのユーティリティ関数
pub mod utils;

#[cfg(test)]
mod test_utils;
#[cfg(test)]
mod tests;

// Re-exports
pub use candidate::Candidate;
pub use config::{ConvertRequestOptions, KeyboardLanguage, LearningType};
pub use converter::{ConversionResult, KanaKanjiConverter};
pub use dictionary::DicdataStore;
pub use input::{ComposingInput, ComposingText};
pub use kana2kanji::{CancellationToken, Kana2Kanji};

/// このライブラリのバージョン番号
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
