//! 入力文字列と誤り訂正候補の列挙
//!
//! 辞書ストアは入力を[`ComposingInput`]越しに参照します。入力の各位置について、
//! その文字の誤入力としてありうる別の文字とペナルティを与えると、
//! 区間ごとの読みの候補を列挙できます。

use std::ops::Range;
use std::sync::Arc;

use hashbrown::HashMap;

use crate::common::{static_trie_may_exist, PValue};
use crate::utils::katakana_char;

/// 1つの読み候補に許す誤り訂正ペナルティの合計の上限
pub const MAX_TYPO_PENALTY: PValue = 3.5;

/// 辞書ストアが入力に要求するインタフェース
pub trait ComposingInput {
    /// 入力の文字列
    fn input(&self) -> &[char];

    /// `from`から始まり、終端（含む）が`last`に入る区間の読みを、誤り訂正込みで列挙します。
    ///
    /// # 戻り値
    ///
    /// カタカナの読みから（終端のインデックス, ペナルティ）への対応
    fn ranges_with_typos(
        &self,
        from: usize,
        last: Range<usize>,
    ) -> HashMap<Vec<char>, (usize, PValue)>;

    /// `from`から`last`まで（含む）の区間の読みを、誤り訂正込みで列挙します。
    fn range_with_typos(&self, from: usize, last: usize) -> HashMap<Vec<char>, PValue> {
        self.ranges_with_typos(from, last..last + 1)
            .into_iter()
            .map(|(ruby, (_, penalty))| (ruby, penalty))
            .collect()
    }

    /// 誤り訂正を行わずに[`ComposingInput::ranges_with_typos`]と同じ区間の読みを列挙します。
    fn ranges(&self, from: usize, last: Range<usize>) -> HashMap<Vec<char>, usize> {
        let input = self.input();
        let end = last.end.min(input.len());
        let mut result = HashMap::new();
        let mut ruby = vec![];
        for (i, &c) in input.iter().enumerate().take(end).skip(from) {
            ruby.push(katakana_char(c));
            if last.contains(&i) {
                result.insert(ruby.clone(), i);
            }
        }
        result
    }

    /// 変換対象の文字列
    fn convert_target(&self) -> String {
        self.input().iter().collect()
    }
}

/// 誤入力の候補表
///
/// 入力された文字（カタカナ）ごとに、本来意図されていた可能性のある文字と
/// そのペナルティを保持します。
#[derive(Clone, Debug, Default)]
pub struct TypoRules {
    rules: HashMap<char, Vec<(char, PValue)>>,
}

impl TypoRules {
    pub fn new() -> Self {
        Self::default()
    }

    /// `typed`が入力されたとき`intended`を候補に加えます。
    ///
    /// 正でないペナルティは無視します。
    pub fn insert(&mut self, typed: char, intended: char, penalty: PValue) {
        if penalty <= 0.0 {
            return;
        }
        self.rules
            .entry(katakana_char(typed))
            .or_default()
            .push((katakana_char(intended), penalty));
    }

    fn alternatives(&self, typed: char) -> &[(char, PValue)] {
        self.rules.get(&typed).map_or(&[], Vec::as_slice)
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

/// 入力中の文字列
///
/// # 例
///
/// ```
/// use kanakanji::ComposingText;
///
/// let mut text = ComposingText::new("しか");
/// text.append("い");
/// assert_eq!(text.len(), 3);
/// text.prefix_complete(2);
/// assert_eq!(text.to_string(), "い");
/// ```
#[derive(Clone, Debug, Default)]
pub struct ComposingText {
    input: Vec<char>,
    typo_rules: Option<Arc<TypoRules>>,
}

impl ComposingText {
    pub fn new(text: &str) -> Self {
        Self {
            input: text.chars().collect(),
            typo_rules: None,
        }
    }

    /// 誤り訂正の候補表を設定します。
    pub fn with_typo_rules(mut self, rules: Arc<TypoRules>) -> Self {
        self.typo_rules = Some(rules);
        self
    }

    pub fn len(&self) -> usize {
        self.input.len()
    }

    pub fn is_empty(&self) -> bool {
        self.input.is_empty()
    }

    /// 末尾に文字列を追加します。
    pub fn append(&mut self, text: &str) {
        self.input.extend(text.chars());
    }

    /// 末尾から`count`文字を削除します。
    pub fn delete_last(&mut self, count: usize) {
        let len = self.input.len().saturating_sub(count);
        self.input.truncate(len);
    }

    /// 先頭の`count`文字を確定済みとして取り除きます。
    pub fn prefix_complete(&mut self, count: usize) {
        let count = count.min(self.input.len());
        self.input.drain(..count);
    }

    /// `self`の入力が`other`の入力で終わるかどうか。
    pub fn has_suffix(&self, other: &Self) -> bool {
        self.input.ends_with(&other.input)
    }

    /// `previous`から`self`への変化を、末尾の（削除された文字数, 追加された文字数）で表します。
    pub fn difference_suffix(&self, previous: &Self) -> (usize, usize) {
        let common = self
            .input
            .iter()
            .zip(&previous.input)
            .take_while(|(a, b)| a == b)
            .count();
        (previous.input.len() - common, self.input.len() - common)
    }
}

impl PartialEq for ComposingText {
    fn eq(&self, other: &Self) -> bool {
        self.input == other.input
    }
}

impl std::fmt::Display for ComposingText {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for c in &self.input {
            write!(f, "{c}")?;
        }
        Ok(())
    }
}

impl ComposingInput for ComposingText {
    fn input(&self) -> &[char] {
        &self.input
    }

    fn ranges_with_typos(
        &self,
        from: usize,
        last: Range<usize>,
    ) -> HashMap<Vec<char>, (usize, PValue)> {
        let Some(rules) = self.typo_rules.as_deref().filter(|r| !r.is_empty()) else {
            return self
                .ranges(from, last)
                .into_iter()
                .map(|(ruby, end)| (ruby, (end, 0.0)))
                .collect();
        };
        let end = last.end.min(self.input.len());
        let mut result: HashMap<Vec<char>, (usize, PValue)> = HashMap::new();
        let mut frontier: Vec<(Vec<char>, PValue)> = vec![(vec![], 0.0)];
        for i in from..end {
            let typed = katakana_char(self.input[i]);
            let mut next = Vec::with_capacity(frontier.len());
            for (prefix, penalty) in &frontier {
                let candidates = std::iter::once((typed, 0.0))
                    .chain(rules.alternatives(typed).iter().copied());
                for (c, p) in candidates {
                    let penalty = penalty + p;
                    if penalty > MAX_TYPO_PENALTY {
                        continue;
                    }
                    // A corrected head character without a static trie finds nothing.
                    if i == from && p > 0.0 && !static_trie_may_exist(c) {
                        continue;
                    }
                    let mut ruby = prefix.clone();
                    ruby.push(c);
                    next.push((ruby, penalty));
                }
            }
            frontier = next;
            if last.contains(&i) {
                for (ruby, penalty) in &frontier {
                    result
                        .entry(ruby.clone())
                        .and_modify(|info| {
                            if *penalty < info.1 {
                                *info = (i, *penalty);
                            }
                        })
                        .or_insert((i, *penalty));
                }
            }
        }
        result
    }
}
