//! 変換全体の動作を検証するシナリオテスト群
//!
//! 辞書の構築から変換セッションまでを通して、差分によるラティスの再利用、
//! 文節の区切り、ディスク上の辞書の読み込みを検証します。

mod conversion;
mod dictionary;
