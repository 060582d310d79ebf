//! 辞書リソースへのアクセス
//!
//! 辞書ストアはファイルを直接開かず、[`ResourceProvider`]を通してバイト列を取得します。
//! 既定の実装はファイルシステムをメモリマップする[`FileSystemProvider`]で、
//! テストや組み込み用途には[`MemoryProvider`]を使えます。

use std::fs::File;
use std::io;
use std::ops::Deref;
use std::path::PathBuf;

use hashbrown::HashMap;
use memmap2::Mmap;

use crate::config::ConvertRequestOptions;

/// リソースを置くルートディレクトリの種類
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ResourceRoot {
    /// 静的辞書
    Dictionary,
    /// 学習メモリ
    Memory,
    /// ユーザ辞書
    SharedContainer,
}

/// 学習メモリのトライの識別子
pub const MEMORY_IDENTIFIER: &str = "memory";
/// ユーザ辞書のトライの識別子
pub const USER_IDENTIFIER: &str = "user";

/// 辞書ストアが要求するリソース
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Resource<'a> {
    /// 文字IDの対応表
    CharIdTable,
    /// トライのラベル列
    TrieLabels(&'a str),
    /// トライのビット列
    TrieBits(&'a str),
    /// エントリブロック（識別子, ブロック番号）
    EntryBlock(&'a str, usize),
    /// 品詞連接コストの1行
    ClassConnection(u16),
    /// 意味連接行列
    MeaningMatrix,
    /// 右品詞ごとの確定後候補表
    ZeroHint(u16),
}

/// ファイル名に使えない文字をエスケープします。
pub fn escape_identifier(identifier: &str) -> String {
    let mut escaped = String::with_capacity(identifier.len());
    for c in identifier.chars() {
        match c {
            '\n' => escaped.push_str("[0A]"),
            ' ' => escaped.push_str("[20]"),
            '"' => escaped.push_str("[22]"),
            '\'' => escaped.push_str("[27]"),
            '*' => escaped.push_str("[2A]"),
            '+' => escaped.push_str("[2B]"),
            '.' => escaped.push_str("[2E]"),
            '/' => escaped.push_str("[2F]"),
            ':' => escaped.push_str("[3A]"),
            '<' => escaped.push_str("[3C]"),
            '>' => escaped.push_str("[3E]"),
            '\\' => escaped.push_str("[5C]"),
            '|' => escaped.push_str("[7C]"),
            c => escaped.push(c),
        }
    }
    escaped
}

fn trie_location(identifier: &str, extension: &str) -> (ResourceRoot, String) {
    match identifier {
        USER_IDENTIFIER => (ResourceRoot::SharedContainer, format!("user.{extension}")),
        MEMORY_IDENTIFIER => (ResourceRoot::Memory, format!("memory.{extension}")),
        id => (
            ResourceRoot::Dictionary,
            format!("louds/{}.{extension}", escape_identifier(id)),
        ),
    }
}

impl Resource<'_> {
    /// リソースのルートと相対パスを返します。
    pub fn location(&self) -> (ResourceRoot, String) {
        match *self {
            Self::CharIdTable => (ResourceRoot::Dictionary, "louds/charID.chid".to_string()),
            Self::TrieLabels(id) => trie_location(id, "loudschars2"),
            Self::TrieBits(id) => trie_location(id, "louds"),
            Self::EntryBlock(id, block) => match id {
                USER_IDENTIFIER => (
                    ResourceRoot::SharedContainer,
                    format!("user{block}.loudstxt3"),
                ),
                MEMORY_IDENTIFIER => (ResourceRoot::Memory, format!("memory{block}.loudstxt3")),
                id => (
                    ResourceRoot::Dictionary,
                    format!("louds/{}{block}.loudstxt3", escape_identifier(id)),
                ),
            },
            Self::ClassConnection(lcid) => (ResourceRoot::Dictionary, format!("cb/{lcid}.binary")),
            Self::MeaningMatrix => (ResourceRoot::Dictionary, "mm.binary".to_string()),
            Self::ZeroHint(rcid) => (ResourceRoot::Dictionary, format!("p/pc_{rcid}.csv")),
        }
    }
}

/// リソースのバイト列
///
/// メモリマップしたファイルか、ヒープ上のバッファのいずれかを所有します。
pub enum ResourceBuffer {
    Mmap(Mmap),
    Owned(Vec<u8>),
}

impl Deref for ResourceBuffer {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        match self {
            Self::Mmap(mmap) => &mmap[..],
            Self::Owned(bytes) => &bytes[..],
        }
    }
}

/// 辞書リソースを提供するトレイト
pub trait ResourceProvider {
    /// リソースを読み込みます。
    ///
    /// # エラー
    ///
    /// リソースが存在しない場合は[`io::ErrorKind::NotFound`]を返します。
    fn read(&self, resource: &Resource<'_>) -> io::Result<ResourceBuffer>;

    /// 設定の変更を反映します。
    fn reconfigure(&mut self, _options: &ConvertRequestOptions) {}
}

/// ファイルシステム上の辞書を読み込むプロバイダ
#[derive(Clone, Debug)]
pub struct FileSystemProvider {
    dictionary_dir: PathBuf,
    memory_dir: PathBuf,
    shared_container_dir: PathBuf,
}

impl FileSystemProvider {
    pub fn new(options: &ConvertRequestOptions) -> Self {
        Self {
            dictionary_dir: options.dictionary_resource_dir.clone(),
            memory_dir: options.memory_dir.clone(),
            shared_container_dir: options.shared_container_dir.clone(),
        }
    }

    fn path(&self, resource: &Resource<'_>) -> PathBuf {
        let (root, relative) = resource.location();
        let dir = match root {
            ResourceRoot::Dictionary => &self.dictionary_dir,
            ResourceRoot::Memory => &self.memory_dir,
            ResourceRoot::SharedContainer => &self.shared_container_dir,
        };
        dir.join(relative)
    }
}

impl ResourceProvider for FileSystemProvider {
    fn read(&self, resource: &Resource<'_>) -> io::Result<ResourceBuffer> {
        let path = self.path(resource);
        let file = File::open(&path)?;
        if file.metadata()?.len() == 0 {
            return Ok(ResourceBuffer::Owned(vec![]));
        }
        // The dictionary files are treated as read-only while mapped.
        let mmap = unsafe { Mmap::map(&file)? };
        Ok(ResourceBuffer::Mmap(mmap))
    }

    fn reconfigure(&mut self, options: &ConvertRequestOptions) {
        *self = Self::new(options);
    }
}

/// メモリ上のバイト列を提供するプロバイダ
#[derive(Clone, Debug, Default)]
pub struct MemoryProvider {
    files: HashMap<(ResourceRoot, String), Vec<u8>>,
}

impl MemoryProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// リソースを登録します。
    pub fn insert<S>(&mut self, root: ResourceRoot, path: S, bytes: Vec<u8>)
    where
        S: Into<String>,
    {
        self.files.insert((root, path.into()), bytes);
    }

    /// リソースを削除します。
    pub fn remove(&mut self, root: ResourceRoot, path: &str) -> Option<Vec<u8>> {
        self.files.remove(&(root, path.to_string()))
    }
}

impl ResourceProvider for MemoryProvider {
    fn read(&self, resource: &Resource<'_>) -> io::Result<ResourceBuffer> {
        let key = resource.location();
        self.files
            .get(&key)
            .map(|bytes| ResourceBuffer::Owned(bytes.clone()))
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, key.1))
    }
}
