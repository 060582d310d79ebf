//! 学習メモリ
//!
//! 辞書ストアは学習メモリを[`LearningMemory`]トレイト越しに使います。
//! 永続化されたメモリはトライ`memory`として読み込まれ、まだ永続化されていない
//! 学習結果は一時メモリとしてこのトレイトから照会されます。

use std::ops::Range;

use hashbrown::HashMap;

use crate::common::{include_mm_value_calculation, mid, need_learning, PValue};
use crate::config::{ConvertRequestOptions, LearningType};
use crate::dictionary::element::{DicdataElement, Metadata};
use crate::errors::Result;

/// 学習メモリのインタフェース
pub trait LearningMemory {
    /// 学習結果を変換に使うかどうか。
    fn is_enabled(&self) -> bool;

    /// 設定を反映します。
    ///
    /// # 戻り値
    ///
    /// 永続化された学習メモリを読み込み直す必要がある場合は`true`
    fn reconfigure(&mut self, options: &ConvertRequestOptions) -> bool;

    /// 読みの接頭辞のうち長さが`depth`に含まれるものに一致するエントリを返します。
    fn through_match(&self, ruby: &[char], depth: Range<usize>) -> Vec<DicdataElement>;

    /// 読みが完全に一致するエントリを返します。
    fn perfect_match(&self, ruby: &[char]) -> Vec<DicdataElement>;

    /// 読みが`ruby`で始まるエントリを返します。
    fn prefix_match(&self, ruby: &[char]) -> Vec<DicdataElement>;

    /// 確定された語の列を学習します。
    fn update(&mut self, data: &[DicdataElement]);

    /// 確定された語の列のうち`part`だけを学習します。
    fn update_part(&mut self, _data: &[DicdataElement], part: &[DicdataElement]) {
        self.update(part);
    }

    /// 語の列に関する学習結果を削除します。
    fn forget(&mut self, data: &[DicdataElement]);

    /// 学習結果を永続化します。
    fn save(&mut self) -> Result<()>;
}

/// 学習済みエントリのスコアの下限
const LEARNED_VALUE_FLOOR: PValue = -10.0;

/// 使用回数に応じて加えるボーナスの係数
const LEARNED_VALUE_BONUS: PValue = 0.5;

#[derive(Clone, Debug)]
struct LearnedEntry {
    data: DicdataElement,
    count: u32,
    last_used: u64,
}

impl LearnedEntry {
    fn to_element(&self) -> DicdataElement {
        let value = (self.data.value().max(LEARNED_VALUE_FLOOR)
            + LEARNED_VALUE_BONUS * (self.count as PValue).ln())
        .min(0.0);
        DicdataElement {
            base_value: value,
            adjust: 0.0,
            metadata: self.data.metadata.union(Metadata::IS_LEARNED),
            ..self.data.clone()
        }
    }
}

/// プロセス内だけで保持される学習メモリ
///
/// 保存形式を持たないため、[`LearningMemory::save`]は何もしません。
#[derive(Debug)]
pub struct TemporaryMemory {
    learning_type: LearningType,
    max_count: usize,
    entries: HashMap<String, Vec<LearnedEntry>>,
    len: usize,
    clock: u64,
}

impl TemporaryMemory {
    pub fn new(options: &ConvertRequestOptions) -> Self {
        Self {
            learning_type: options.learning_type,
            max_count: options.max_memory_count,
            entries: HashMap::new(),
            len: 0,
            clock: 0,
        }
    }

    /// 保持しているエントリ数
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// すべての学習結果を消去します。
    pub fn clear(&mut self) {
        self.entries.clear();
        self.len = 0;
    }

    fn learn(&mut self, data: DicdataElement) {
        self.clock += 1;
        let clock = self.clock;
        let bucket = self.entries.entry(data.ruby.clone()).or_default();
        if let Some(entry) = bucket.iter_mut().find(|e| e.data == data) {
            entry.count = entry.count.saturating_add(1);
            entry.last_used = clock;
            return;
        }
        bucket.push(LearnedEntry {
            data,
            count: 1,
            last_used: clock,
        });
        self.len += 1;
        while self.len > self.max_count {
            if !self.evict_oldest() {
                break;
            }
        }
    }

    fn evict_oldest(&mut self) -> bool {
        let oldest = self
            .entries
            .iter()
            .flat_map(|(ruby, bucket)| bucket.iter().enumerate().map(move |(i, e)| (ruby, i, e)))
            .min_by_key(|(_, _, e)| e.last_used)
            .map(|(ruby, i, _)| (ruby.clone(), i));
        let Some((ruby, i)) = oldest else {
            return false;
        };
        if let Some(bucket) = self.entries.get_mut(&ruby) {
            bucket.remove(i);
            if bucket.is_empty() {
                self.entries.remove(&ruby);
            }
            self.len -= 1;
        }
        true
    }

    fn remove(&mut self, data: &DicdataElement) {
        let Some(bucket) = self.entries.get_mut(&data.ruby) else {
            return;
        };
        let before = bucket.len();
        bucket.retain(|e| e.data.word != data.word || e.data.lcid != data.lcid || e.data.rcid != data.rcid);
        self.len -= before - bucket.len();
        if bucket.is_empty() {
            self.entries.remove(&data.ruby);
        }
    }

    fn lookup(&self, ruby: &str) -> impl Iterator<Item = DicdataElement> + '_ {
        self.entries
            .get(ruby)
            .into_iter()
            .flat_map(|bucket| bucket.iter().map(LearnedEntry::to_element))
    }
}

/// 語の列を1語に連結します。
fn concatenate(data: &[DicdataElement]) -> Option<DicdataElement> {
    let first = data.first()?;
    let last = data.last()?;
    let mid = data
        .iter()
        .find(|e| include_mm_value_calculation(e.lcid, e.rcid))
        .map_or(mid::GENERAL, |e| e.mid);
    Some(DicdataElement::new(
        data.iter().map(|e| e.word.as_str()).collect::<String>(),
        data.iter().map(|e| e.ruby.as_str()).collect::<String>(),
        first.lcid,
        last.rcid,
        mid,
        data.iter().map(|e| e.value()).sum(),
    ))
}

impl LearningMemory for TemporaryMemory {
    fn is_enabled(&self) -> bool {
        self.learning_type.needs_output()
    }

    fn reconfigure(&mut self, options: &ConvertRequestOptions) -> bool {
        let changed =
            self.learning_type != options.learning_type || self.max_count != options.max_memory_count;
        self.learning_type = options.learning_type;
        self.max_count = options.max_memory_count;
        if options.should_reset_memory {
            self.clear();
        }
        while self.len > self.max_count {
            if !self.evict_oldest() {
                break;
            }
        }
        changed || options.should_reset_memory
    }

    fn through_match(&self, ruby: &[char], depth: Range<usize>) -> Vec<DicdataElement> {
        let end = depth.end.min(ruby.len() + 1);
        let mut result = vec![];
        for len in depth.start.max(1)..end {
            let key: String = ruby[..len].iter().collect();
            result.extend(self.lookup(&key));
        }
        result
    }

    fn perfect_match(&self, ruby: &[char]) -> Vec<DicdataElement> {
        let key: String = ruby.iter().collect();
        self.lookup(&key).collect()
    }

    fn prefix_match(&self, ruby: &[char]) -> Vec<DicdataElement> {
        let prefix: String = ruby.iter().collect();
        let mut keys: Vec<_> = self
            .entries
            .keys()
            .filter(|key| key.starts_with(&prefix))
            .collect();
        keys.sort();
        keys.into_iter().flat_map(|key| self.lookup(key)).collect()
    }

    fn update(&mut self, data: &[DicdataElement]) {
        if !self.learning_type.needs_input() {
            return;
        }
        for element in data.iter().filter(|e| need_learning(e.lcid)) {
            self.learn(element.clone());
        }
        if data.len() >= 2 {
            if let Some(joined) = concatenate(data) {
                self.learn(joined);
            }
        }
    }

    fn forget(&mut self, data: &[DicdataElement]) {
        for element in data {
            self.remove(element);
        }
        if data.len() >= 2 {
            if let Some(joined) = concatenate(data) {
                self.remove(&joined);
            }
        }
    }

    fn save(&mut self) -> Result<()> {
        log::debug!("temporary learning memory holds {} entries", self.len);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::common::cid;

    fn chars(s: &str) -> Vec<char> {
        s.chars().collect()
    }

    fn noun(word: &str, ruby: &str, value: PValue) -> DicdataElement {
        DicdataElement::with_cid(word, ruby, cid::GENERAL_NOUN, mid::GENERAL, value)
    }

    #[test]
    fn test_update_and_match() {
        let mut memory = TemporaryMemory::new(&ConvertRequestOptions::default());
        memory.update(&[noun("歯科", "シカ", -12.0)]);
        let found = memory.perfect_match(&chars("シカ"));
        assert_eq!(found.len(), 1);
        assert!(found[0].metadata.contains(Metadata::IS_LEARNED));
        assert_eq!(found[0].value(), LEARNED_VALUE_FLOOR);

        memory.update(&[noun("歯科", "シカ", -12.0)]);
        assert_eq!(memory.len(), 1);
        assert!(memory.perfect_match(&chars("シカ"))[0].value() > LEARNED_VALUE_FLOOR);

        assert_eq!(memory.through_match(&chars("シカイ"), 1..4).len(), 1);
        assert!(memory.through_match(&chars("シカイ"), 3..4).is_empty());
        assert_eq!(memory.prefix_match(&chars("シ")).len(), 1);
    }

    #[test]
    fn test_particles_are_not_learned() {
        let mut memory = TemporaryMemory::new(&ConvertRequestOptions::default());
        let wa = DicdataElement::with_cid("は", "ハ", cid::PARTICLE_WA, mid::GENERAL, -2.0);
        memory.update(&[noun("鹿", "シカ", -6.0), wa]);
        assert!(memory.perfect_match(&chars("ハ")).is_empty());
        assert_eq!(memory.perfect_match(&chars("シカハ"))[0].word, "鹿は");
        assert_eq!(memory.len(), 2);
    }

    #[test]
    fn test_forget_and_capacity() {
        let options = ConvertRequestOptions::default().max_memory_count(2);
        let mut memory = TemporaryMemory::new(&options);
        memory.update(&[noun("蚊", "カ", -5.0)]);
        memory.update(&[noun("木", "キ", -5.0)]);
        memory.update(&[noun("区", "ク", -5.0)]);
        assert_eq!(memory.len(), 2);
        assert!(memory.perfect_match(&chars("カ")).is_empty());

        memory.forget(&[noun("木", "キ", -5.0)]);
        assert_eq!(memory.len(), 1);
        assert!(memory.perfect_match(&chars("キ")).is_empty());
    }

    #[test]
    fn test_learning_type() {
        let options = ConvertRequestOptions::default().learning_type(LearningType::OnlyOutput);
        let mut memory = TemporaryMemory::new(&options);
        assert!(memory.is_enabled());
        memory.update(&[noun("蚊", "カ", -5.0)]);
        assert!(memory.is_empty());

        assert!(memory.reconfigure(&options.clone().learning_type(LearningType::Nothing)));
        assert!(!memory.is_enabled());
        assert!(!memory.reconfigure(&options.clone().learning_type(LearningType::Nothing)));
    }
}
