//! 辞書ストアモジュール。
//!
//! このモジュールは、変換に必要な辞書データの読み込みと照会を行います。
//! 主な機能として以下を提供します:
//!
//! - 先頭文字ごとに分割された静的辞書、ユーザ辞書、学習メモリのトライの遅延読み込み
//! - 誤り訂正ペナルティ付きの区間検索と、スコアによる枝刈り
//! - 数詞・数字・記号などの補足的なエントリの生成
//! - 品詞連接コストと意味連接コストの参照
//!
//! # 辞書の読み込み方法
//!
//! - [`DicdataStore::new`]: 設定されたディレクトリから辞書を読み込む
//! - [`DicdataStore::with_provider`]: 任意の[`ResourceProvider`]から辞書を読み込む
//!
//! # 辞書のビルド
//!
//! [`DictionaryBuilder`]を使用して、エントリの一覧から辞書リソースを構築できます。
pub mod builder;
pub mod char_id;
pub mod connector;
pub mod element;
pub mod learning;
pub mod louds;
pub mod loudstxt;
pub mod number;
pub mod resource;
pub mod wise;

use std::collections::{BTreeMap, BTreeSet};
use std::ops::Range;

use hashbrown::{HashMap, HashSet};

use crate::candidate::{Candidate, PostCompositionPredictionCandidate, PredictionKind};
use crate::common::{typo_penalty_ratio, PValue, MAX_ENTRY_LENGTH, PRUNING_THRESHOLD};
use crate::common::{cid, mid, prediction_usable};
use crate::config::ConvertRequestOptions;
use crate::errors::{KanaKanjiError, Result};
use crate::input::ComposingInput;
use crate::kana2kanji::LatticeNode;
use crate::utils::{katakana_char, parse_csv_row, to_katakana};

use crate::dictionary::char_id::CharIdMap;
use crate::dictionary::connector::{ClassConnector, ConnectorCost, MeaningConnector};
use crate::dictionary::learning::{LearningMemory, TemporaryMemory};
use crate::dictionary::louds::Louds;
use crate::dictionary::loudstxt::{decode_entries, split_index};
use crate::dictionary::resource::{
    FileSystemProvider, Resource, ResourceProvider, MEMORY_IDENTIFIER, USER_IDENTIFIER,
};
use crate::dictionary::wise::wise_entries;

pub use crate::dictionary::builder::DictionaryBuilder;
pub use crate::dictionary::element::{DicdataElement, Metadata};

/// 予測変換で1つのトライから取り出すノード数の上限
const PREDICTION_LIMIT: usize = 700;

/// 確定後候補表に値がないときのスコア
const ZERO_HINT_DEFAULT_VALUE: PValue = -30.0;

/// 辞書ストアへの通知
#[derive(Clone, Debug)]
pub enum Notification {
    /// 実行時に与えられるエントリを動的辞書として登録する。
    ///
    /// 動的辞書は線形探索で照会されるため、大量のエントリには向きません。
    ImportDynamicUserDict(Vec<DicdataElement>),
    /// リクエストの設定を差し替える。
    SetRequestOptions(ConvertRequestOptions),
    /// 候補に関する学習結果を削除する。
    ForgetMemory(Candidate),
    /// 学習結果を永続化し、学習メモリとユーザ辞書のキャッシュを破棄する。
    CloseKeyboard,
}

/// 語の文字数から決まるペナルティ単位。負の値。
#[inline]
fn penalty_unit(data: &DicdataElement) -> PValue {
    -2.0 / data.word.chars().count().max(1) as PValue
}

/// 誤り訂正ペナルティをエントリに反映します。枝刈りされる場合は`None`。
fn apply_typo_penalty(data: DicdataElement, penalty: PValue) -> Option<DicdataElement> {
    if penalty == 0.0 {
        return Some(data);
    }
    let adjust = penalty_unit(&data) / 2.0 * penalty * typo_penalty_ratio(data.lcid);
    if DicdataStore::should_be_removed_value(data.value() + adjust, data.ruby_len()) {
        return None;
    }
    Some(data.adjusted(adjust))
}

fn log_resource_error(resource: &str, e: &KanaKanjiError) {
    if e.is_not_found() {
        log::debug!("{resource} is not available: {e}");
    } else if e.is_corrupt() {
        log::warn!("{resource} is broken: {e}");
    } else {
        log::warn!("{resource} could not be read: {e}");
    }
}

/// 辞書ストア
///
/// 読み込んだトライや連接コストの行をキャッシュとして保持します。
/// 1つの変換セッションが所有し、複数スレッドから同時に使うことは想定していません。
pub struct DicdataStore {
    options: ConvertRequestOptions,
    provider: Box<dyn ResourceProvider + Send>,
    char_ids: CharIdMap,
    tries: HashMap<String, Louds>,
    /// 読み込みを試みたトライ。失敗したものも含む。
    attempted: HashSet<String>,
    class_connector: ClassConnector,
    meaning_connector: MeaningConnector,
    learning: Box<dyn LearningMemory + Send>,
    dynamic_user_dict: Vec<DicdataElement>,
}

impl DicdataStore {
    /// 設定されたディレクトリの辞書を読み込むストアを作成します。
    pub fn new(options: ConvertRequestOptions) -> Self {
        let provider = FileSystemProvider::new(&options);
        Self::with_provider(options, provider)
    }

    /// 任意のリソースプロバイダから辞書を読み込むストアを作成します。
    ///
    /// # 例
    ///
    /// ```
    /// use kanakanji::dictionary::resource::MemoryProvider;
    /// use kanakanji::dictionary::DicdataStore;
    /// use kanakanji::ConvertRequestOptions;
    ///
    /// let store = DicdataStore::with_provider(ConvertRequestOptions::default(), MemoryProvider::new());
    /// assert_eq!(store.options().n_best, 10);
    /// ```
    pub fn with_provider<P>(options: ConvertRequestOptions, provider: P) -> Self
    where
        P: ResourceProvider + Send + 'static,
    {
        let learning = TemporaryMemory::new(&options);
        let mut store = Self {
            options,
            provider: Box::new(provider),
            char_ids: CharIdMap::default(),
            tries: HashMap::new(),
            attempted: HashSet::new(),
            class_connector: ClassConnector::new(),
            meaning_connector: MeaningConnector::default(),
            learning: Box::new(learning),
            dynamic_user_dict: vec![],
        };
        store.setup();
        store
    }

    /// 学習メモリを差し替えます。
    pub fn with_learning_memory<L>(mut self, memory: L) -> Self
    where
        L: LearningMemory + Send + 'static,
    {
        self.learning = Box::new(memory);
        self.reload_trie(MEMORY_IDENTIFIER);
        self
    }

    pub fn options(&self) -> &ConvertRequestOptions {
        &self.options
    }

    fn setup(&mut self) {
        self.char_ids = match self.provider.read(&Resource::CharIdTable) {
            Ok(bytes) => CharIdMap::from_bytes(&bytes),
            Err(e) => {
                log_resource_error("louds/charID.chid", &e.into());
                CharIdMap::default()
            }
        };
        self.meaning_connector = MeaningConnector::load(self.provider.as_ref());
        self.class_connector.clear();
        self.tries.clear();
        self.attempted.clear();
    }

    /// 通知を処理します。
    pub fn send(&mut self, notification: Notification) {
        match notification {
            Notification::ImportDynamicUserDict(entries) => {
                self.dynamic_user_dict = entries
                    .into_iter()
                    .map(|e| e.with_metadata(Metadata::IS_FROM_USER_DICTIONARY))
                    .collect();
            }
            Notification::SetRequestOptions(options) => self.set_request_options(options),
            Notification::ForgetMemory(candidate) => {
                self.learning.forget(&candidate.data);
                self.reload_trie(MEMORY_IDENTIFIER);
            }
            Notification::CloseKeyboard => {
                if let Err(e) = self.learning.save() {
                    log::error!("failed to save the learning memory: {e}");
                }
                self.reload_trie(MEMORY_IDENTIFIER);
                self.reload_trie(USER_IDENTIFIER);
            }
        }
    }

    fn set_request_options(&mut self, options: ConvertRequestOptions) {
        let dictionary_changed = options.dictionary_resource_dir != self.options.dictionary_resource_dir;
        let user_changed = options.shared_container_dir != self.options.shared_container_dir;
        let memory_changed = self.options.learning_changed(&options);
        if dictionary_changed || user_changed || memory_changed {
            self.provider.reconfigure(&options);
        }
        self.options = options;
        if dictionary_changed {
            self.setup();
        }
        if user_changed {
            self.reload_trie(USER_IDENTIFIER);
        }
        if self.learning.reconfigure(&self.options) || memory_changed {
            self.reload_trie(MEMORY_IDENTIFIER);
        }
    }

    /// キャッシュしたトライを破棄し、次の参照で読み込み直すようにします。
    pub fn reload_trie(&mut self, identifier: &str) {
        self.tries.remove(identifier);
        self.attempted.remove(identifier);
    }

    /// 文字を文字IDに変換します。対応表にない文字は255になります。
    #[inline]
    pub fn char_id(&self, c: char) -> u8 {
        self.char_ids.id(c)
    }

    fn read_trie(&self, identifier: &str) -> Result<Louds> {
        let labels = self.provider.read(&Resource::TrieLabels(identifier))?;
        let bits = self.provider.read(&Resource::TrieBits(identifier))?;
        Louds::from_bytes(&bits, &labels)
    }

    /// トライを読み込みます。読み込みの成否にかかわらず、再読み込みまでは再試行しません。
    fn load_trie(&mut self, identifier: &str) -> Option<&Louds> {
        if !self.attempted.contains(identifier) {
            self.attempted.insert(identifier.to_string());
            match self.read_trie(identifier) {
                Ok(louds) => {
                    self.tries.insert(identifier.to_string(), louds);
                }
                Err(e) => log_resource_error(&format!("trie {identifier}"), &e),
            }
        }
        self.tries.get(identifier)
    }

    fn perfect_match(&mut self, identifier: &str, ids: &[u8]) -> Option<usize> {
        self.load_trie(identifier)?.exact(ids)
    }

    fn through_match(&mut self, identifier: &str, ids: &[u8], depth: Range<usize>) -> Vec<usize> {
        self.load_trie(identifier)
            .map(|louds| louds.through(ids, depth))
            .unwrap_or_default()
    }

    fn prefix_match(&mut self, identifier: &str, ids: &[u8], depth: Option<usize>) -> Vec<usize> {
        self.load_trie(identifier)
            .map(|louds| louds.predictive(ids, depth, PREDICTION_LIMIT))
            .unwrap_or_default()
    }

    /// エントリブロックからノードに対応するエントリを取り出します。
    ///
    /// 学習メモリ由来のエントリには[`Metadata::IS_LEARNED`]を、ユーザ辞書由来のエントリには
    /// [`Metadata::IS_FROM_USER_DICTIONARY`]を付与します。
    pub fn entries<I>(&self, identifier: &str, indices: I) -> Vec<DicdataElement>
    where
        I: IntoIterator<Item = usize>,
    {
        let mut blocks: BTreeMap<usize, Vec<usize>> = BTreeMap::new();
        for index in indices {
            let (block, local) = split_index(index);
            blocks.entry(block).or_default().push(local);
        }
        let metadata = match identifier {
            MEMORY_IDENTIFIER => Metadata::IS_LEARNED,
            USER_IDENTIFIER => Metadata::IS_FROM_USER_DICTIONARY,
            _ => Metadata::EMPTY,
        };
        let mut result = vec![];
        for (block, locals) in blocks {
            match self.provider.read(&Resource::EntryBlock(identifier, block)) {
                Ok(bytes) => result.extend(
                    decode_entries(&bytes, locals)
                        .into_iter()
                        .map(|e| e.with_metadata(metadata)),
                ),
                Err(e) => log_resource_error(&format!("block {identifier}{block}"), &e.into()),
            }
        }
        result
    }

    /// 区間検索で使う静的辞書・ユーザ辞書・学習メモリの識別子を、読みの候補とともに返します。
    fn grouped_queries<'a>(
        &self,
        rubies: impl Iterator<Item = &'a Vec<char>>,
    ) -> Vec<(String, Vec<Vec<u8>>)> {
        let mut heads: BTreeMap<char, Vec<Vec<u8>>> = BTreeMap::new();
        let mut all = vec![];
        for ruby in rubies {
            let Some(&head) = ruby.first() else {
                continue;
            };
            let ids = self.char_ids.ids(ruby.iter().copied());
            heads.entry(head).or_default().push(ids.clone());
            all.push(ids);
        }
        all.sort();
        let mut queries: Vec<(String, Vec<Vec<u8>>)> = heads
            .into_iter()
            .map(|(head, ids)| (head.to_string(), ids))
            .collect();
        if self.learning.is_enabled() {
            queries.push((MEMORY_IDENTIFIER.to_string(), all.clone()));
        }
        queries.push((USER_IDENTIFIER.to_string(), all));
        queries
    }

    /// `from`から始まる区間の辞書エントリを検索します。
    ///
    /// # 引数
    ///
    /// * `input` - 入力
    /// * `from` - 区間の始点
    /// * `last` - 区間の終端（含む）の範囲。`None`なら`from`から入力の末尾まで。
    ///   いずれの場合も区間の長さは最大長で打ち切られます。
    /// * `typo` - 誤り訂正を行うかどうか
    ///
    /// # 戻り値
    ///
    /// 区間に対応するノード。前方パスは空です。
    pub fn lookup_range<C>(
        &mut self,
        input: &C,
        from: usize,
        last: Option<Range<usize>>,
        typo: bool,
    ) -> Vec<LatticeNode>
    where
        C: ComposingInput + ?Sized,
    {
        let chars = input.input();
        let left = last.as_ref().map_or(from, |r| r.start);
        let right = last
            .as_ref()
            .map_or(chars.len(), |r| r.end)
            .min(chars.len())
            .min(from + MAX_ENTRY_LENGTH);
        if from > left || left >= right {
            log::debug!("lookup_range: invalid window from {from} last {left}..{right}");
            return vec![];
        }

        let mut rubies: HashMap<Vec<char>, (usize, PValue)> = if typo {
            input.ranges_with_typos(from, left..right)
        } else {
            input
                .ranges(from, left..right)
                .into_iter()
                .map(|(ruby, end)| (ruby, (end, 0.0)))
                .collect()
        };
        let (min_len, max_len) = rubies
            .keys()
            .fold((usize::MAX, 0), |(lo, hi), r| (lo.min(r.len()), hi.max(r.len())));
        let depth = min_len..max_len + 1;

        let mut keys: Vec<&Vec<char>> = rubies.keys().collect();
        keys.sort();
        let queries = self.grouped_queries(keys.into_iter());
        let mut data = vec![];
        for (identifier, paths) in queries {
            let mut indices = BTreeSet::new();
            for ids in &paths {
                indices.extend(self.through_match(&identifier, ids, depth.clone()));
            }
            for entry in self.entries(&identifier, indices) {
                let penalty = rubies
                    .get(&entry.ruby.chars().collect::<Vec<_>>())
                    .map_or(0.0, |info| info.1);
                data.extend(apply_typo_penalty(entry, penalty));
            }
        }
        if self.learning.is_enabled() {
            let mut keys: Vec<&Vec<char>> = rubies.keys().collect();
            keys.sort();
            for ruby in keys {
                for entry in self.learning.through_match(ruby, depth.clone()) {
                    let penalty = rubies
                        .get(&entry.ruby.chars().collect::<Vec<_>>())
                        .map_or(0.0, |info| info.1);
                    data.extend(apply_typo_penalty(entry, penalty));
                }
            }
        }

        let mut segment = String::new();
        for (i, &c) in chars.iter().enumerate().take(right).skip(from) {
            segment.push(katakana_char(c));
            if i < left {
                continue;
            }
            let wise = wise_entries(chars, from..i + 1, self.options.keyboard_language);
            let dynamic = self.dynamic_exact(&segment);
            for entry in wise.into_iter().chain(dynamic) {
                rubies.insert(entry.ruby.chars().collect(), (i, 0.0));
                data.push(entry);
            }
        }

        data.into_iter()
            .filter_map(|entry| {
                let (end, _) = *rubies.get(&entry.ruby.chars().collect::<Vec<_>>())?;
                Some(LatticeNode::new(entry, from..end + 1))
            })
            .collect()
    }

    /// 誤り訂正を行わない区間検索です。
    ///
    /// 辞書にエントリがなくても、始点の1文字をそのまま語とするノードを必ず1つ加えます。
    pub fn lookup_range_frozen<C>(
        &mut self,
        input: &C,
        from: usize,
        last: Option<Range<usize>>,
    ) -> Vec<LatticeNode>
    where
        C: ComposingInput + ?Sized,
    {
        let chars = input.input();
        let left = last.as_ref().map_or(from, |r| r.start);
        let right = last
            .as_ref()
            .map_or(chars.len(), |r| r.end)
            .min(chars.len())
            .min(from + MAX_ENTRY_LENGTH);
        if from > left || left >= right {
            log::debug!("lookup_range_frozen: invalid window from {from} last {left}..{right}");
            return vec![];
        }
        let head = katakana_char(chars[from]).to_string();
        let character_node = LatticeNode::new(
            DicdataElement::from_ruby(head.as_str(), cid::GENERAL_NOUN, mid::GENERAL, -10.0),
            from..from + 1,
        );

        let rubies = input.ranges(from, left..right);
        let Some(longest) = rubies.keys().max_by_key(|r| r.len()).cloned() else {
            return vec![character_node];
        };
        let shortest = rubies.keys().map(Vec::len).min().unwrap_or(longest.len());
        let depth = shortest..longest.len() + 1;
        let ids = self.char_ids.ids(longest.iter().copied());

        let mut identifiers = vec![head, USER_IDENTIFIER.to_string()];
        if self.learning.is_enabled() {
            identifiers.push(MEMORY_IDENTIFIER.to_string());
        }
        let mut data = vec![];
        for identifier in identifiers {
            let indices = self.through_match(&identifier, &ids, depth.clone());
            data.extend(self.entries(&identifier, indices));
        }
        if self.learning.is_enabled() {
            data.extend(self.learning.through_match(&longest, depth));
        }
        let mut segment = String::new();
        for (i, &c) in chars.iter().enumerate().take(right).skip(from) {
            segment.push(katakana_char(c));
            if i >= left {
                data.extend(wise_entries(chars, from..i + 1, self.options.keyboard_language));
                data.extend(self.dynamic_exact(&segment));
            }
        }

        let mut nodes: Vec<LatticeNode> = data
            .into_iter()
            .filter_map(|entry| {
                let end = *rubies.get(&entry.ruby.chars().collect::<Vec<_>>())?;
                Some(LatticeNode::new(entry, from..end + 1))
            })
            .collect();
        nodes.push(character_node);
        nodes
    }

    /// `from`から`last`まで（含む）の区間に完全一致するエントリを検索します。
    pub fn lookup_exact<C>(&mut self, input: &C, from: usize, last: usize) -> Vec<LatticeNode>
    where
        C: ComposingInput + ?Sized,
    {
        let chars = input.input();
        if from > last || last - from >= MAX_ENTRY_LENGTH || last >= chars.len() {
            return vec![];
        }
        let segment = to_katakana(&chars[from..=last].iter().collect::<String>());
        let rubies = input.range_with_typos(from, last);

        let mut keys: Vec<&Vec<char>> = rubies.keys().collect();
        keys.sort();
        let queries = self.grouped_queries(keys.into_iter());
        let mut data = vec![];
        for (identifier, paths) in queries {
            let indices: BTreeSet<usize> = paths
                .iter()
                .filter_map(|ids| self.perfect_match(&identifier, ids))
                .collect();
            for entry in self.entries(&identifier, indices) {
                let penalty = rubies
                    .get(&entry.ruby.chars().collect::<Vec<_>>())
                    .copied()
                    .unwrap_or(0.0);
                data.extend(apply_typo_penalty(entry, penalty));
            }
        }
        if self.learning.is_enabled() {
            let mut keys: Vec<(&Vec<char>, &PValue)> = rubies.iter().collect();
            keys.sort_by(|a, b| a.0.cmp(b.0));
            for (ruby, &penalty) in keys {
                for entry in self.learning.perfect_match(ruby) {
                    data.extend(apply_typo_penalty(entry, penalty));
                }
            }
        }
        data.extend(wise_entries(chars, from..last + 1, self.options.keyboard_language));
        data.extend(self.dynamic_exact(&segment));

        data.into_iter()
            .map(|entry| LatticeNode::new(entry, from..last + 1))
            .collect()
    }

    /// 右品詞`rcid`の語の後に続きやすい語の一覧を返します。
    pub fn zero_hint_entries(&self, rcid: u16) -> Vec<DicdataElement> {
        let bytes = match self.provider.read(&Resource::ZeroHint(rcid)) {
            Ok(bytes) => bytes,
            Err(e) => {
                log_resource_error(&format!("p/pc_{rcid}.csv"), &e.into());
                return vec![];
            }
        };
        let text = match std::str::from_utf8(&bytes) {
            Ok(text) => text,
            Err(e) => {
                log::warn!("p/pc_{rcid}.csv is not valid UTF-8: {e}");
                return vec![];
            }
        };
        text.lines()
            .filter(|line| !line.is_empty())
            .map(|line| {
                let fields = parse_csv_row(line);
                let field = |i: usize| fields.get(i).map_or("", String::as_str);
                let ruby = field(0);
                let word = if field(1).is_empty() { ruby } else { field(1) };
                let lcid = field(2).parse().unwrap_or(0);
                let rcid = field(3).parse().unwrap_or(lcid);
                let mid = field(4).parse().unwrap_or(0);
                let value = field(5).parse().unwrap_or(ZERO_HINT_DEFAULT_VALUE);
                DicdataElement::new(word, ruby, lcid, rcid, mid, value)
            })
            .collect()
    }

    /// 読みが`key`で始まるエントリを予測変換のために検索します。
    ///
    /// 1文字のキーでは3文字先まで、2文字のキーでは5文字先までに探索を制限します。
    pub fn prediction_entries(&mut self, key: &str) -> Vec<DicdataElement> {
        let key = to_katakana(key);
        let Some(head) = key.chars().next() else {
            return vec![];
        };
        let depth = match key.chars().count() {
            1 => Some(3),
            2 => Some(5),
            _ => None,
        };
        let ids = self.char_ids.ids(key.chars());
        let head = head.to_string();

        let indices: BTreeSet<usize> = self.prefix_match(&head, &ids, depth).into_iter().collect();
        let mut result: Vec<DicdataElement> = self
            .entries(&head, indices)
            .into_iter()
            .filter(|e| prediction_usable(e.rcid))
            .collect();
        let indices: BTreeSet<usize> = self
            .prefix_match(USER_IDENTIFIER, &ids, depth)
            .into_iter()
            .collect();
        result.extend(self.entries(USER_IDENTIFIER, indices));
        if self.learning.is_enabled() {
            let indices: BTreeSet<usize> = self
                .prefix_match(MEMORY_IDENTIFIER, &ids, None)
                .into_iter()
                .collect();
            result.extend(self.entries(MEMORY_IDENTIFIER, indices));
            let chars: Vec<char> = key.chars().collect();
            result.extend(self.learning.prefix_match(&chars));
        }
        result
    }

    /// 動的辞書から読みが`ruby`に等しいエントリを返します。
    pub fn dynamic_exact(&self, ruby: &str) -> Vec<DicdataElement> {
        self.dynamic_user_dict
            .iter()
            .filter(|e| e.ruby == ruby)
            .cloned()
            .collect()
    }

    /// 動的辞書から読みが`ruby`で始まるエントリを返します。
    pub fn dynamic_prefix(&self, ruby: &str) -> Vec<DicdataElement> {
        self.dynamic_user_dict
            .iter()
            .filter(|e| e.ruby.starts_with(ruby))
            .cloned()
            .collect()
    }

    /// 品詞連接コストを返します。左側の品詞の行は初回の参照で読み込まれます。
    pub fn cc_value(&mut self, former: u16, latter: u16) -> PValue {
        self.class_connector
            .ensure_row(former, self.provider.as_ref());
        self.class_connector.cost(former, latter)
    }

    /// 意味連接コストを返します。
    #[inline]
    pub fn mm_value(&self, former: u16, latter: u16) -> PValue {
        self.meaning_connector.cost(former, latter)
    }

    /// スコアが低く、変換で無視すべきエントリかどうか。
    ///
    /// 短い語ほど強く枝刈りされます。
    #[inline]
    pub fn should_be_removed(data: &DicdataElement) -> bool {
        let d = data.value() - PRUNING_THRESHOLD;
        if d < 0.0 {
            return true;
        }
        penalty_unit(data) < -d
    }

    /// [`DicdataStore::should_be_removed`]の、スコアと読みの文字数を直接与える版。
    #[inline]
    pub fn should_be_removed_value(value: PValue, ruby_count: usize) -> bool {
        let d = value - PRUNING_THRESHOLD;
        if d < 0.0 {
            return true;
        }
        -2.0 / (ruby_count.max(1) as PValue) < -d
    }

    /// 確定された候補を学習します。
    ///
    /// # 引数
    ///
    /// * `candidate` - 確定された候補
    /// * `previous` - 直前に確定された語
    pub fn update_learning(&mut self, candidate: &Candidate, previous: Option<&DicdataElement>) {
        match previous {
            Some(previous) => {
                let mut data = Vec::with_capacity(candidate.data.len() + 1);
                data.push(previous.clone());
                data.extend_from_slice(&candidate.data);
                self.learning.update(&data);
            }
            None => self.learning.update(&candidate.data),
        }
    }

    /// 確定後の予測候補が選ばれたとき、その部分を学習します。
    pub fn update_learning_with_prediction(
        &mut self,
        candidate: &Candidate,
        prediction: &PostCompositionPredictionCandidate,
    ) {
        match &prediction.kind {
            PredictionKind::Additional(data) => self.learning.update_part(&candidate.data, data),
            PredictionKind::Replacement {
                target,
                replacement,
            } => {
                let keep = candidate.data.len().saturating_sub(target.len());
                self.learning
                    .update_part(&candidate.data[..keep], replacement);
            }
        }
    }
}
