//! 変換リクエストの設定

use std::path::{Path, PathBuf};

/// キーボードの言語
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum KeyboardLanguage {
    /// 日本語入力
    #[default]
    JaJp,
    /// 英語入力
    EnUs,
    /// 言語指定なし
    None,
}

/// 学習の種類
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum LearningType {
    /// 学習しない。学習結果も使わない。
    Nothing,
    /// 学習し、学習結果を使う。
    #[default]
    InputAndOutput,
    /// 学習結果を使うが、新たに学習しない。
    OnlyOutput,
}

impl LearningType {
    /// 学習結果を変換に使うかどうか。
    pub const fn needs_output(self) -> bool {
        !matches!(self, Self::Nothing)
    }

    /// 新たに学習するかどうか。
    pub const fn needs_input(self) -> bool {
        matches!(self, Self::InputAndOutput)
    }
}

/// 変換リクエストの設定
///
/// ビルダー形式で設定します。
///
/// # 例
///
/// ```
/// use kanakanji::{ConvertRequestOptions, LearningType};
///
/// let options = ConvertRequestOptions::default()
///     .n_best(5)
///     .learning_type(LearningType::Nothing)
///     .dictionary_resource_dir("./dict");
/// assert_eq!(options.n_best, 5);
/// ```
#[derive(Clone, Debug, PartialEq)]
pub struct ConvertRequestOptions {
    /// 各ノードが保持する前方パスの上限
    pub n_best: usize,
    pub keyboard_language: KeyboardLanguage,
    pub learning_type: LearningType,
    /// 学習メモリが保持するエントリ数の上限
    pub max_memory_count: usize,
    /// 次に設定を反映するとき学習メモリを消去する
    pub should_reset_memory: bool,
    /// 静的辞書のルート（`louds/`, `cb/`, `p/`, `mm.binary`）
    pub dictionary_resource_dir: PathBuf,
    /// 学習メモリのトライを置くディレクトリ
    pub memory_dir: PathBuf,
    /// ユーザ辞書のトライを置くディレクトリ
    pub shared_container_dir: PathBuf,
    /// 変換確定後の予測を行うかどうか
    pub require_japanese_prediction: bool,
    /// 全角英数字の候補を加える
    pub full_width_roman_candidate: bool,
    /// 半角カタカナの候補を加える
    pub half_width_kana_candidate: bool,
}

impl Default for ConvertRequestOptions {
    fn default() -> Self {
        Self {
            n_best: 10,
            keyboard_language: KeyboardLanguage::JaJp,
            learning_type: LearningType::InputAndOutput,
            max_memory_count: 65536,
            should_reset_memory: false,
            dictionary_resource_dir: PathBuf::from("./"),
            memory_dir: PathBuf::from("./"),
            shared_container_dir: PathBuf::from("./"),
            require_japanese_prediction: true,
            full_width_roman_candidate: false,
            half_width_kana_candidate: false,
        }
    }
}

impl ConvertRequestOptions {
    /// 前方パスの上限を設定します。0は1として扱います。
    pub fn n_best(mut self, n_best: usize) -> Self {
        self.n_best = n_best.max(1);
        self
    }

    pub fn keyboard_language(mut self, language: KeyboardLanguage) -> Self {
        self.keyboard_language = language;
        self
    }

    pub fn learning_type(mut self, learning_type: LearningType) -> Self {
        self.learning_type = learning_type;
        self
    }

    pub fn max_memory_count(mut self, count: usize) -> Self {
        self.max_memory_count = count;
        self
    }

    pub fn should_reset_memory(mut self, reset: bool) -> Self {
        self.should_reset_memory = reset;
        self
    }

    pub fn dictionary_resource_dir<P: AsRef<Path>>(mut self, dir: P) -> Self {
        self.dictionary_resource_dir = dir.as_ref().to_path_buf();
        self
    }

    pub fn memory_dir<P: AsRef<Path>>(mut self, dir: P) -> Self {
        self.memory_dir = dir.as_ref().to_path_buf();
        self
    }

    pub fn shared_container_dir<P: AsRef<Path>>(mut self, dir: P) -> Self {
        self.shared_container_dir = dir.as_ref().to_path_buf();
        self
    }

    pub fn require_japanese_prediction(mut self, yes: bool) -> Self {
        self.require_japanese_prediction = yes;
        self
    }

    pub fn full_width_roman_candidate(mut self, yes: bool) -> Self {
        self.full_width_roman_candidate = yes;
        self
    }

    pub fn half_width_kana_candidate(mut self, yes: bool) -> Self {
        self.half_width_kana_candidate = yes;
        self
    }

    /// 学習メモリの再読み込みが必要な変更かどうか。
    pub(crate) fn learning_changed(&self, other: &Self) -> bool {
        self.learning_type != other.learning_type
            || self.memory_dir != other.memory_dir
            || self.max_memory_count != other.max_memory_count
            || other.should_reset_memory
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder() {
        let options = ConvertRequestOptions::default()
            .n_best(0)
            .keyboard_language(KeyboardLanguage::EnUs)
            .memory_dir("/tmp/memory");
        assert_eq!(options.n_best, 1);
        assert_eq!(options.keyboard_language, KeyboardLanguage::EnUs);
        assert_eq!(options.memory_dir, PathBuf::from("/tmp/memory"));
        assert!(options.learning_changed(&options.clone().learning_type(LearningType::Nothing)));
        assert!(!options.learning_changed(&options.clone().n_best(3)));
    }

    #[test]
    fn test_learning_type() {
        assert!(!LearningType::Nothing.needs_output());
        assert!(LearningType::OnlyOutput.needs_output());
        assert!(!LearningType::OnlyOutput.needs_input());
        assert!(LearningType::InputAndOutput.needs_input());
    }
}
