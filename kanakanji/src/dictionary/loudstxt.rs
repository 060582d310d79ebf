//! エントリブロック（`.loudstxt3`）の読み書き
//!
//! ブロックは最大2048レコードからなり、トライのノードインデックス`n`のエントリは
//! ブロック`n >> 11`のレコード`n & 2047`に格納されています。
//!
//! ```text
//! u16 LE      レコード数 C
//! u32 LE * C  各レコードの開始オフセット（ファイル先頭から）
//! レコード:
//!   u16 LE            エントリ数 N
//!   (u16 lcid, u16 rcid, u16 mid, f32 value) LE * N
//!   UTF-8 "読み\t単語1\t単語2..."（単語が空なら読みと同じ）
//! ```

use crate::dictionary::element::DicdataElement;
use crate::errors::{KanaKanjiError, Result};

/// 1ブロックあたりのレコード数
pub const BLOCK_SIZE: usize = 2048;

const NUMERIC_ENTRY_SIZE: usize = 10;

/// ノードインデックスを（ブロック番号, ブロック内インデックス）に分解します。
#[inline(always)]
pub const fn split_index(index: usize) -> (usize, usize) {
    (index >> 11, index & (BLOCK_SIZE - 1))
}

fn read_u16(bytes: &[u8], offset: usize) -> Option<u16> {
    let b = bytes.get(offset..offset + 2)?;
    Some(u16::from_le_bytes([b[0], b[1]]))
}

fn read_u32(bytes: &[u8], offset: usize) -> Option<u32> {
    let b = bytes.get(offset..offset + 4)?;
    Some(u32::from_le_bytes([b[0], b[1], b[2], b[3]]))
}

/// 読み込み済みのエントリブロック
pub struct EntryBlock<'a> {
    bytes: &'a [u8],
    offsets: Vec<usize>,
}

impl<'a> EntryBlock<'a> {
    /// ヘッダを解析します。
    ///
    /// # エラー
    ///
    /// ヘッダが途中で切れている場合、[`KanaKanjiError`]を返します。
    pub fn parse(bytes: &'a [u8]) -> Result<Self> {
        let count = read_u16(bytes, 0)
            .ok_or_else(|| KanaKanjiError::truncated("loudstxt3", 2, bytes.len()))?;
        let header_len = 2 + 4 * usize::from(count);
        let offsets = (0..usize::from(count))
            .map(|i| read_u32(bytes, 2 + 4 * i).map(|o| o as usize))
            .collect::<Option<Vec<_>>>()
            .ok_or_else(|| KanaKanjiError::truncated("loudstxt3", header_len, bytes.len()))?;
        Ok(Self { bytes, offsets })
    }

    /// ブロック内のレコード数
    pub fn len(&self) -> usize {
        self.offsets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.offsets.is_empty()
    }

    /// `local`番目のレコードを復号します。
    ///
    /// 単語の数が数値部のエントリ数より少ない場合、余った数値部は捨てます。
    ///
    /// # エラー
    ///
    /// インデックスが範囲外の場合、レコードの長さが足りない場合、
    /// または読みがUTF-8として不正な場合に[`KanaKanjiError`]を返します。
    pub fn record(&self, local: usize) -> Result<Vec<DicdataElement>> {
        let start = *self
            .offsets
            .get(local)
            .ok_or(KanaKanjiError::RecordOutOfRange {
                resource: "loudstxt3",
                index: local,
                count: self.offsets.len(),
            })?;
        let end = self
            .offsets
            .get(local + 1)
            .copied()
            .unwrap_or(self.bytes.len());
        let record = self
            .bytes
            .get(start..end)
            .ok_or_else(|| {
                KanaKanjiError::truncated("loudstxt3", end.max(start), self.bytes.len())
            })?;
        decode_record(record)
    }
}

fn decode_record(record: &[u8]) -> Result<Vec<DicdataElement>> {
    let count = usize::from(
        read_u16(record, 0)
            .ok_or_else(|| KanaKanjiError::truncated("loudstxt3", 2, record.len()))?,
    );
    let text_start = 2 + count * NUMERIC_ENTRY_SIZE;
    if record.len() < text_start {
        return Err(KanaKanjiError::truncated("loudstxt3", text_start, record.len()));
    }
    let text = &record[text_start..];
    let mut fields = text.split(|&b| b == b'\t');
    let ruby = std::str::from_utf8(fields.next().unwrap_or_default())?;
    let mut entries = Vec::with_capacity(count);
    for (i, word) in fields.enumerate() {
        if i >= count {
            log::warn!("loudstxt3: record for {ruby} has more words than entries");
            break;
        }
        let word = match std::str::from_utf8(word) {
            Ok(word) if word.is_empty() => ruby,
            Ok(word) => word,
            Err(e) => {
                log::warn!("loudstxt3: skipped a word of {ruby}: {e}");
                continue;
            }
        };
        let base = 2 + i * NUMERIC_ENTRY_SIZE;
        let (Some(lcid), Some(rcid), Some(mid), Some(value)) = (
            read_u16(record, base),
            read_u16(record, base + 2),
            read_u16(record, base + 4),
            read_u32(record, base + 6).map(f32::from_bits),
        ) else {
            continue;
        };
        entries.push(DicdataElement::new(
            word,
            ruby,
            lcid,
            rcid,
            mid,
            value,
        ));
    }
    if entries.len() < count {
        log::debug!(
            "loudstxt3: record for {ruby} declares {count} entries, decoded {}",
            entries.len()
        );
    }
    Ok(entries)
}

/// ブロック内のレコードを指定されたインデックスの順に復号します。
///
/// 壊れたレコードは読み飛ばし、警告ログを出力します。
pub fn decode_entries<I>(bytes: &[u8], locals: I) -> Vec<DicdataElement>
where
    I: IntoIterator<Item = usize>,
{
    let block = match EntryBlock::parse(bytes) {
        Ok(block) => block,
        Err(e) => {
            log::warn!("loudstxt3: {e}");
            return vec![];
        }
    };
    let mut result = vec![];
    for local in locals {
        match block.record(local) {
            Ok(entries) => result.extend(entries),
            Err(e) => log::warn!("loudstxt3: skipped record {local}: {e}"),
        }
    }
    result
}

/// レコード列をブロックのバイト列に符号化します。
///
/// 各レコードのエントリは同じ読みを持つ必要があります。
///
/// # エラー
///
/// レコード数またはエントリ数が上限を超える場合、[`KanaKanjiError`]を返します。
pub fn encode_block(records: &[Vec<DicdataElement>]) -> Result<Vec<u8>> {
    if records.len() > BLOCK_SIZE {
        return Err(KanaKanjiError::invalid_argument(
            "records",
            format!("a block holds at most {BLOCK_SIZE} records"),
        ));
    }
    let mut bodies = Vec::with_capacity(records.len());
    for entries in records {
        let count = u16::try_from(entries.len())?;
        let mut body = count.to_le_bytes().to_vec();
        for e in entries {
            body.extend_from_slice(&e.lcid.to_le_bytes());
            body.extend_from_slice(&e.rcid.to_le_bytes());
            body.extend_from_slice(&e.mid.to_le_bytes());
            body.extend_from_slice(&e.base_value.to_le_bytes());
        }
        let ruby = entries.first().map_or("", |e| e.ruby.as_str());
        body.extend_from_slice(ruby.as_bytes());
        for e in entries {
            body.push(b'\t');
            if e.word != e.ruby {
                body.extend_from_slice(e.word.as_bytes());
            }
        }
        bodies.push(body);
    }
    let mut bytes = u16::try_from(records.len())?.to_le_bytes().to_vec();
    let mut offset = 2 + 4 * records.len();
    for body in &bodies {
        bytes.extend_from_slice(&u32::try_from(offset)?.to_le_bytes());
        offset += body.len();
    }
    for body in bodies {
        bytes.extend_from_slice(&body);
    }
    Ok(bytes)
}
