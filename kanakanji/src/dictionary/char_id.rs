//! 文字IDの対応表
//!
//! トライのラベルは1バイトの文字IDです。`charID.chid`の`i`文字目がID`i`になります。

use hashbrown::HashMap;

/// 対応表にない文字のID
pub const UNKNOWN_CHAR_ID: u8 = u8::MAX;

/// 文字から文字IDへの対応表
#[derive(Default, Clone)]
pub struct CharIdMap {
    map: HashMap<char, u8>,
}

impl CharIdMap {
    /// 文字列の`i`文字目をID`i`として対応表を作成します。
    ///
    /// 255文字目以降は無視します。
    pub fn new(table: &str) -> Self {
        let mut map = HashMap::new();
        for (i, c) in table.chars().enumerate().take(usize::from(UNKNOWN_CHAR_ID)) {
            // i < 255 by the take above.
            map.entry(c).or_insert(i as u8);
        }
        Self { map }
    }

    /// バイト列（UTF-8）から対応表を作成します。不正なバイト列は空の対応表になります。
    pub fn from_bytes(bytes: &[u8]) -> Self {
        match std::str::from_utf8(bytes) {
            Ok(table) => Self::new(table.trim_end_matches('\n')),
            Err(e) => {
                log::warn!("charID.chid is not valid UTF-8: {e}");
                Self::default()
            }
        }
    }

    #[inline]
    pub fn id(&self, c: char) -> u8 {
        self.map.get(&c).copied().unwrap_or(UNKNOWN_CHAR_ID)
    }

    /// 文字列を文字ID列に変換します。
    pub fn ids<I>(&self, chars: I) -> Vec<u8>
    where
        I: IntoIterator<Item = char>,
    {
        chars.into_iter().map(|c| self.id(c)).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}
