//! 辞書リソースのビルダー
//!
//! エントリの一覧と連接コストから、辞書ストアが読み込む形式のリソース一式を構築します。
//! 構築したリソースは[`MemoryProvider`]に載せるか、ディレクトリに書き出して使います。

use std::collections::{BTreeMap, BTreeSet, VecDeque};
use std::io::Read;
use std::path::Path;

use crate::common::PValue;
use crate::config::ConvertRequestOptions;
use crate::dictionary::char_id::{CharIdMap, UNKNOWN_CHAR_ID};
use crate::dictionary::connector::{ClassConnector, MeaningConnector};
use crate::dictionary::element::DicdataElement;
use crate::dictionary::louds::Louds;
use crate::dictionary::loudstxt::{encode_block, BLOCK_SIZE};
use crate::dictionary::resource::{
    MemoryProvider, Resource, ResourceRoot, MEMORY_IDENTIFIER, USER_IDENTIFIER,
};
use crate::errors::{KanaKanjiError, Result};
use crate::utils::{parse_csv_row, to_katakana};

/// 構築中のトライのノード
#[derive(Default)]
struct TrieNode {
    children: BTreeMap<u8, usize>,
    ruby: Option<String>,
}

/// LOUDSのビット列、ラベル列、ノードインデックス順の読みを作ります。
fn build_louds(paths: &[(Vec<u8>, String)]) -> (Vec<u64>, Vec<u8>, Vec<Option<String>>) {
    let mut arena = vec![TrieNode::default()];
    for (path, ruby) in paths {
        let mut node = 0;
        for &label in path {
            let next = arena.len();
            node = match arena[node].children.get(&label) {
                Some(&child) => child,
                None => {
                    arena[node].children.insert(label, next);
                    arena.push(TrieNode::default());
                    next
                }
            };
        }
        arena[node].ruby = Some(ruby.clone());
    }

    // Index 0 is a dummy and the root is 1.
    let mut labels = vec![0, 0];
    let mut rubies = vec![None, arena[0].ruby.take()];
    let mut bits = vec![true, false];
    let mut queue = VecDeque::from([0]);
    while let Some(node) = queue.pop_front() {
        let children: Vec<(u8, usize)> = arena[node]
            .children
            .iter()
            .map(|(&label, &child)| (label, child))
            .collect();
        for (label, child) in children {
            bits.push(true);
            labels.push(label);
            rubies.push(arena[child].ruby.take());
            queue.push_back(child);
        }
        bits.push(false);
    }

    let mut words = vec![0u64; bits.len().div_ceil(64)];
    for (i, &bit) in bits.iter().enumerate() {
        if bit {
            words[i / 64] |= 1 << (63 - i % 64);
        }
    }
    (words, labels, rubies)
}

/// 辞書リソースのビルダー
///
/// # 例
///
/// ```
/// use kanakanji::dictionary::{DicdataElement, DicdataStore, DictionaryBuilder};
/// use kanakanji::ConvertRequestOptions;
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let mut builder = DictionaryBuilder::new();
/// builder.add_lexicon_csv("シカ,鹿,1285,1285,501,-6\nシカ,歯科,1285,1285,501,-8".as_bytes())?;
/// builder.add_entry(DicdataElement::with_cid("死", "シ", 1285, 501, -9.0));
/// let provider = builder.into_provider()?;
///
/// let store = DicdataStore::with_provider(ConvertRequestOptions::default(), provider);
/// assert_ne!(store.char_id('シ'), 255);
/// # Ok(())
/// # }
/// ```
#[derive(Default)]
pub struct DictionaryBuilder {
    /// 識別子 -> 読み -> エントリ
    entries: BTreeMap<String, BTreeMap<String, Vec<DicdataElement>>>,
    class_rows: BTreeMap<u16, (Option<PValue>, Vec<(u16, PValue)>)>,
    meaning: Option<MeaningConnector>,
    zero_hints: BTreeMap<u16, String>,
}

impl DictionaryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    fn insert(&mut self, identifier: String, entry: DicdataElement) {
        self.entries
            .entry(identifier)
            .or_default()
            .entry(entry.ruby.clone())
            .or_default()
            .push(entry);
    }

    /// 静的辞書にエントリを追加します。読みはカタカナに揃えます。
    ///
    /// エントリは読みの先頭文字ごとのトライに振り分けられます。読みが空のエントリは無視します。
    pub fn add_entry(&mut self, mut entry: DicdataElement) -> &mut Self {
        entry.ruby = to_katakana(&entry.ruby);
        if let Some(head) = entry.ruby.chars().next() {
            self.insert(head.to_string(), entry);
        }
        self
    }

    /// ユーザ辞書にエントリを追加します。
    pub fn add_user_entry(&mut self, mut entry: DicdataElement) -> &mut Self {
        entry.ruby = to_katakana(&entry.ruby);
        if !entry.ruby.is_empty() {
            self.insert(USER_IDENTIFIER.to_string(), entry);
        }
        self
    }

    /// 学習メモリのトライにエントリを追加します。
    pub fn add_memory_entry(&mut self, mut entry: DicdataElement) -> &mut Self {
        entry.ruby = to_katakana(&entry.ruby);
        if !entry.ruby.is_empty() {
            self.insert(MEMORY_IDENTIFIER.to_string(), entry);
        }
        self
    }

    /// `読み,単語,左品詞,右品詞,意味,スコア`形式のCSVから静的辞書のエントリを追加します。
    ///
    /// 単語が空のときは読みを単語とします。空行は無視します。
    ///
    /// # エラー
    ///
    /// フィールドが足りない場合や数値として解釈できない場合、[`KanaKanjiError`]を返します。
    pub fn add_lexicon_csv<R>(&mut self, mut rdr: R) -> Result<&mut Self>
    where
        R: Read,
    {
        let mut buf = String::new();
        rdr.read_to_string(&mut buf)?;
        for (i, line) in buf.lines().enumerate() {
            if line.trim().is_empty() {
                continue;
            }
            let fields = parse_csv_row(line);
            if fields.len() < 6 {
                return Err(KanaKanjiError::invalid_argument(
                    "lexicon",
                    format!("line {}: expected 6 fields, found {}", i + 1, fields.len()),
                ));
            }
            let ruby = fields[0].as_str();
            let word = if fields[1].is_empty() { ruby } else { fields[1].as_str() };
            let entry = DicdataElement::new(
                word,
                ruby,
                fields[2].parse()?,
                fields[3].parse()?,
                fields[4].parse()?,
                fields[5].parse()?,
            );
            self.add_entry(entry);
        }
        Ok(self)
    }

    /// 品詞連接コストを設定します。
    pub fn set_connection(&mut self, former: u16, latter: u16, cost: PValue) -> &mut Self {
        let row = &mut self.class_rows.entry(former).or_default().1;
        row.retain(|&(l, _)| l != latter);
        row.push((latter, cost));
        self
    }

    /// 左側の品詞`former`の行で、記録のない右側に使う既定値を設定します。
    pub fn set_default_connection(&mut self, former: u16, cost: PValue) -> &mut Self {
        self.class_rows.entry(former).or_default().0 = Some(cost);
        self
    }

    /// 意味連接コストを設定します。
    pub fn set_meaning(&mut self, former: u16, latter: u16, cost: PValue) -> &mut Self {
        self.meaning
            .get_or_insert_with(MeaningConnector::default)
            .set(former, latter, cost);
        self
    }

    /// 右品詞`rcid`の確定後候補表にエントリを追加します。
    pub fn add_zero_hint(&mut self, rcid: u16, entry: &DicdataElement) -> &mut Self {
        let quote = |s: &str| {
            if s.contains([',', '"']) {
                format!("\"{}\"", s.replace('"', "\"\""))
            } else {
                s.to_string()
            }
        };
        let row = format!(
            "{},{},{},{},{},{}\n",
            quote(&entry.ruby),
            quote(&entry.word),
            entry.lcid,
            entry.rcid,
            entry.mid,
            entry.base_value
        );
        self.zero_hints.entry(rcid).or_default().push_str(&row);
        self
    }

    /// 右品詞`rcid`の確定後候補表に、CSVの行をそのまま追加します。
    pub fn add_zero_hint_csv(&mut self, rcid: u16, csv: &str) -> &mut Self {
        let table = self.zero_hints.entry(rcid).or_default();
        table.push_str(csv);
        if !csv.ends_with('\n') {
            table.push('\n');
        }
        self
    }

    /// 読みに現れる文字から文字IDの対応表を作ります。
    fn char_table(&self) -> Result<String> {
        let chars: BTreeSet<char> = self
            .entries
            .values()
            .flat_map(|rubies| rubies.keys())
            .flat_map(|ruby| ruby.chars())
            .collect();
        if chars.len() >= usize::from(UNKNOWN_CHAR_ID) {
            return Err(KanaKanjiError::invalid_state(
                "too many distinct characters in readings",
                format!("{} characters, at most {}", chars.len(), UNKNOWN_CHAR_ID - 1),
            ));
        }
        Ok(chars.into_iter().collect())
    }

    /// 構築したリソースを（ルート, 相対パス, バイト列）の一覧として返します。
    ///
    /// # エラー
    ///
    /// 読みに現れる文字の種類が文字IDで表せる数を超える場合、[`KanaKanjiError`]を返します。
    pub fn build(&self) -> Result<Vec<(ResourceRoot, String, Vec<u8>)>> {
        let mut files = vec![];
        let mut put = |resource: Resource<'_>, bytes: Vec<u8>| {
            let (root, path) = resource.location();
            files.push((root, path, bytes));
        };

        let table = self.char_table()?;
        let char_ids = CharIdMap::new(&table);
        put(Resource::CharIdTable, table.into_bytes());

        for (identifier, rubies) in &self.entries {
            let paths: Vec<(Vec<u8>, String)> = rubies
                .keys()
                .map(|ruby| (char_ids.ids(ruby.chars()), ruby.clone()))
                .collect();
            let (bits, labels, node_rubies) = build_louds(&paths);
            put(Resource::TrieBits(identifier), Louds::bits_to_bytes(&bits));
            put(Resource::TrieLabels(identifier), labels);

            let records: Vec<Vec<DicdataElement>> = node_rubies
                .iter()
                .map(|ruby| {
                    ruby.as_ref()
                        .and_then(|r| rubies.get(r))
                        .cloned()
                        .unwrap_or_default()
                })
                .collect();
            for (block, chunk) in records.chunks(BLOCK_SIZE).enumerate() {
                put(Resource::EntryBlock(identifier, block), encode_block(chunk)?);
            }
            log::debug!(
                "built trie {identifier} with {} nodes and {} readings",
                records.len() - 1,
                rubies.len()
            );
        }

        for (&former, (default, costs)) in &self.class_rows {
            put(
                Resource::ClassConnection(former),
                ClassConnector::encode_row(*default, costs),
            );
        }
        if let Some(meaning) = &self.meaning {
            put(Resource::MeaningMatrix, meaning.to_bytes());
        }
        for (&rcid, table) in &self.zero_hints {
            put(Resource::ZeroHint(rcid), table.clone().into_bytes());
        }
        Ok(files)
    }

    /// 構築したリソースを載せた[`MemoryProvider`]を返します。
    ///
    /// # エラー
    ///
    /// [`DictionaryBuilder::build`]と同じです。
    pub fn into_provider(self) -> Result<MemoryProvider> {
        let mut provider = MemoryProvider::new();
        for (root, path, bytes) in self.build()? {
            provider.insert(root, path, bytes);
        }
        Ok(provider)
    }

    /// 構築したリソースを、設定されたディレクトリに書き出します。
    ///
    /// # エラー
    ///
    /// 構築に失敗した場合や、書き込みに失敗した場合に[`KanaKanjiError`]を返します。
    pub fn write_to_dir(&self, options: &ConvertRequestOptions) -> Result<()> {
        for (root, path, bytes) in self.build()? {
            let dir: &Path = match root {
                ResourceRoot::Dictionary => &options.dictionary_resource_dir,
                ResourceRoot::Memory => &options.memory_dir,
                ResourceRoot::SharedContainer => &options.shared_container_dir,
            };
            let path = dir.join(path);
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            std::fs::write(&path, bytes)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::dictionary::loudstxt::decode_entries;
    use crate::dictionary::resource::ResourceProvider;

    fn entry(word: &str, ruby: &str) -> DicdataElement {
        DicdataElement::new(word, ruby, 1285, 1285, 501, -6.0)
    }

    #[test]
    fn test_build_louds() {
        let paths = vec![
            (vec![10], "a".to_string()),
            (vec![10, 30], "ab".to_string()),
            (vec![20], "c".to_string()),
        ];
        let (bits, labels, rubies) = build_louds(&paths);
        assert_eq!(labels, vec![0, 0, 10, 20, 30]);
        assert_eq!(rubies[4].as_deref(), Some("ab"));
        assert_eq!(rubies[1], None);
        let louds = Louds::new(bits, &labels);
        assert_eq!(louds.exact(&[10]), Some(2));
        assert_eq!(louds.exact(&[10, 30]), Some(4));
        assert_eq!(louds.exact(&[20]), Some(3));
        assert_eq!(louds.exact(&[20, 30]), None);
    }

    #[test]
    fn test_trie_roundtrip() {
        let mut builder = DictionaryBuilder::new();
        let readings = ["シ", "シカ", "シカイ", "シガ", "シカク", "シンカ"];
        for ruby in readings {
            builder.add_entry(entry(ruby, ruby));
        }
        let provider = builder.into_provider().unwrap();

        let table = provider.read(&Resource::CharIdTable).unwrap();
        let char_ids = CharIdMap::from_bytes(&table);
        let labels = provider.read(&Resource::TrieLabels("シ")).unwrap();
        let bits = provider.read(&Resource::TrieBits("シ")).unwrap();
        let louds = Louds::from_bytes(&bits, &labels).unwrap();
        let block = provider.read(&Resource::EntryBlock("シ", 0)).unwrap();

        for ruby in readings {
            let node = louds.exact(&char_ids.ids(ruby.chars())).unwrap();
            let entries = decode_entries(&block, [node]);
            assert_eq!(entries.len(), 1);
            assert_eq!(entries[0].ruby, ruby);
        }
        assert_eq!(louds.exact(&char_ids.ids("シン".chars())).map(|n| {
            decode_entries(&block, [n]).len()
        }), Some(0));
        assert_eq!(louds.exact(&char_ids.ids("カ".chars())), None);

        // One node per prefix, increasing along the path.
        for ruby in readings {
            let ids = char_ids.ids(ruby.chars());
            let nodes = louds.byfix(&ids);
            assert_eq!(nodes.len(), ids.len(), "{ruby}");
            assert!(nodes.windows(2).all(|w| w[0] < w[1]), "{ruby}");
            assert_eq!(nodes.last().copied(), louds.exact(&ids));
        }
        let ids = char_ids.ids("シカイカ".chars());
        assert_eq!(louds.byfix(&ids).len(), 3);
    }

    #[test]
    fn test_lexicon_csv() {
        let mut builder = DictionaryBuilder::new();
        builder
            .add_lexicon_csv("しか,鹿,1285,1285,501,-6\n\nシカ,,1285,1285,501,-9.5\n".as_bytes())
            .unwrap();
        let rubies = &builder.entries["シ"];
        assert_eq!(rubies["シカ"].len(), 2);
        assert_eq!(rubies["シカ"][1].word, "シカ");

        assert!(builder.add_lexicon_csv("シカ,鹿,1285".as_bytes()).is_err());
        assert!(builder
            .add_lexicon_csv("シカ,鹿,a,1285,501,-6".as_bytes())
            .is_err());
    }

    #[test]
    fn test_too_many_characters() {
        let mut builder = DictionaryBuilder::new();
        for c in ('\u{4E00}'..).take(300) {
            builder.add_entry(entry(&c.to_string(), &c.to_string()));
        }
        assert!(builder.build().is_err());
    }

    #[test]
    fn test_write_to_dir() {
        let dir = tempfile::tempdir().unwrap();
        let options = ConvertRequestOptions::default()
            .dictionary_resource_dir(dir.path().join("dict"))
            .shared_container_dir(dir.path().join("shared"));
        let mut builder = DictionaryBuilder::new();
        builder
            .add_entry(entry("鹿", "シカ"))
            .add_user_entry(entry("志賀", "シガ"))
            .set_connection(0, 1285, -1.0)
            .set_meaning(501, 501, -1.0)
            .add_zero_hint(1285, &DicdataElement::new("は", "ハ", 261, 261, 501, -2.0));
        builder.write_to_dir(&options).unwrap();

        let dict = dir.path().join("dict");
        assert!(dict.join("louds/charID.chid").exists());
        assert!(dict.join("louds/シ.louds").exists());
        assert!(dict.join("louds/シ0.loudstxt3").exists());
        assert!(dict.join("cb/0.binary").exists());
        assert!(dict.join("mm.binary").exists());
        assert_eq!(
            std::fs::read_to_string(dict.join("p/pc_1285.csv")).unwrap(),
            "ハ,は,261,261,501,-2\n"
        );
        assert!(dir.path().join("shared/user.louds").exists());
        assert!(dir.path().join("shared/user0.loudstxt3").exists());
    }
}
