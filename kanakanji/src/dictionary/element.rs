//! 辞書エントリの定義

use std::hash::{Hash, Hasher};

use crate::common::{cid, mid, PValue};

/// 辞書エントリに付与されるフラグ
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Metadata(u8);

impl Metadata {
    /// フラグなし
    pub const EMPTY: Self = Self(0);
    /// 学習によって得られたエントリ
    pub const IS_LEARNED: Self = Self(1);
    /// ユーザ辞書由来のエントリ
    pub const IS_FROM_USER_DICTIONARY: Self = Self(1 << 1);

    /// `other`のフラグをすべて含むかどうか。
    #[inline(always)]
    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    /// `other`のフラグのいずれかを含むかどうか。
    #[inline(always)]
    pub const fn intersects(self, other: Self) -> bool {
        self.0 & other.0 != 0
    }

    /// 2つのフラグの和を返します。
    #[inline(always)]
    pub const fn union(self, other: Self) -> Self {
        Self(self.0 | other.0)
    }

    pub fn insert(&mut self, other: Self) {
        self.0 |= other.0;
    }
}

/// 辞書エントリ
///
/// 単語・読み（カタカナ）・左右の品詞ID・意味ID・スコアを持ちます。
/// 同一性の判定にはスコアを含めません。
#[derive(Clone, Debug)]
pub struct DicdataElement {
    /// 表層形
    pub word: String,
    /// 読み（カタカナ）
    pub ruby: String,
    /// 左品詞ID
    pub lcid: u16,
    /// 右品詞ID
    pub rcid: u16,
    /// 意味ID
    pub mid: u16,
    /// 辞書に記録されたスコア
    pub base_value: PValue,
    /// 誤り訂正などによる補正値
    pub adjust: PValue,
    /// フラグ
    pub metadata: Metadata,
}

impl DicdataElement {
    /// 新しいエントリを作成します。
    pub fn new<W, R>(word: W, ruby: R, lcid: u16, rcid: u16, mid: u16, value: PValue) -> Self
    where
        W: Into<String>,
        R: Into<String>,
    {
        Self {
            word: word.into(),
            ruby: ruby.into(),
            lcid,
            rcid,
            mid,
            base_value: value,
            adjust: 0.0,
            metadata: Metadata::EMPTY,
        }
    }

    /// 左右の品詞IDが等しいエントリを作成します。
    pub fn with_cid<W, R>(word: W, ruby: R, cid: u16, mid: u16, value: PValue) -> Self
    where
        W: Into<String>,
        R: Into<String>,
    {
        Self::new(word, ruby, cid, cid, mid, value)
    }

    /// 表層形が読みと等しいエントリを作成します。
    pub fn from_ruby<R>(ruby: R, cid: u16, mid: u16, value: PValue) -> Self
    where
        R: Into<String>,
    {
        let ruby = ruby.into();
        Self::new(ruby.clone(), ruby, cid, cid, mid, value)
    }

    /// 文頭ノード
    pub fn bos() -> Self {
        Self::with_cid("", "", cid::BOS, mid::BOS, 0.0)
    }

    /// 文末ノード
    pub fn eos() -> Self {
        Self::with_cid("", "", cid::EOS, mid::EOS, 0.0)
    }

    /// 補正後のスコア。正にはならない。
    #[inline(always)]
    pub fn value(&self) -> PValue {
        (self.base_value + self.adjust).min(0.0)
    }

    /// 補正値を加えたエントリを返します。
    pub fn adjusted(mut self, adjust: PValue) -> Self {
        self.adjust += adjust;
        self
    }

    /// メタデータを加えたエントリを返します。
    pub fn with_metadata(mut self, metadata: Metadata) -> Self {
        self.metadata.insert(metadata);
        self
    }

    /// 読みの文字数
    pub fn ruby_len(&self) -> usize {
        self.ruby.chars().count()
    }
}

impl PartialEq for DicdataElement {
    fn eq(&self, other: &Self) -> bool {
        self.word == other.word
            && self.ruby == other.ruby
            && self.lcid == other.lcid
            && self.rcid == other.rcid
            && self.mid == other.mid
            && self.metadata == other.metadata
    }
}

impl Eq for DicdataElement {}

impl Hash for DicdataElement {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.word.hash(state);
        self.ruby.hash(state);
        self.lcid.hash(state);
        self.rcid.hash(state);
        self.mid.hash(state);
        self.metadata.hash(state);
    }
}
