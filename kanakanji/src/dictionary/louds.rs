//! LOUDS（Level-Order Unary Degree Sequence）による簡潔トライ
//!
//! 各ノードは1始まりのインデックスで表され、ルートは1です。ビット列は64ビット語の
//! 最上位ビットから順に読みます。ノード`j`はビット列中の`j`番目の1に対応し、
//! その子は`j`番目と`j+1`番目の0の間に並ぶ1です。

use std::ops::Range;

use crate::errors::{KanaKanjiError, Result};

/// ルートノードのインデックス
pub const ROOT: usize = 1;

/// 簡潔トライ
///
/// ラベルは文字IDのバイト値で、ノード`i`への辺のラベルが`labels[i]`に格納されています。
pub struct Louds {
    bits: Vec<u64>,
    num_bits: usize,
    /// `rank0[i]` は `bits[..i]` に含まれる0の数
    rank0: Vec<usize>,
    /// ラベルごとの昇順ノードインデックス
    label_nodes: Vec<Vec<u32>>,
}

impl Louds {
    /// ビット列とラベル列からトライを作成します。
    pub fn new(bits: Vec<u64>, labels: &[u8]) -> Self {
        let mut rank0 = Vec::with_capacity(bits.len() + 1);
        rank0.push(0);
        let mut zeros = 0;
        for &word in &bits {
            zeros += (u64::BITS - word.count_ones()) as usize;
            rank0.push(zeros);
        }
        let mut label_nodes = vec![vec![]; 256];
        for (node, &label) in labels.iter().enumerate() {
            // Index 0 is a dummy and the root has no incoming edge.
            if node > ROOT {
                if let Ok(node) = u32::try_from(node) {
                    label_nodes[usize::from(label)].push(node);
                }
            }
        }
        Self {
            num_bits: bits.len() * 64,
            bits,
            rank0,
            label_nodes,
        }
    }

    /// `.louds`と`.loudschars2`のバイト列からトライを作成します。
    ///
    /// # エラー
    ///
    /// ビット列の長さが8の倍数でない場合、[`KanaKanjiError`]を返します。
    pub fn from_bytes(bits: &[u8], labels: &[u8]) -> Result<Self> {
        if bits.len() % 8 != 0 {
            return Err(KanaKanjiError::invalid_format(
                "louds",
                format!("bit array length {} is not a multiple of 8", bits.len()),
            ));
        }
        let words = bits
            .chunks_exact(8)
            .map(|chunk| {
                let mut word = [0; 8];
                word.copy_from_slice(chunk);
                u64::from_le_bytes(word)
            })
            .collect();
        Ok(Self::new(words, labels))
    }

    /// ビット列をリトルエンディアンのバイト列として返します。
    pub fn bits_to_bytes(bits: &[u64]) -> Vec<u8> {
        bits.iter().flat_map(|w| w.to_le_bytes()).collect()
    }

    /// `n`番目（1始まり）の0の位置（0始まり）を返します。
    fn select0(&self, n: usize) -> Option<usize> {
        if n == 0 || n > *self.rank0.last()? {
            return None;
        }
        let block = self.rank0.partition_point(|&r| r < n) - 1;
        let mut remaining = n - self.rank0[block];
        let mut word = !self.bits[block];
        loop {
            let pos = word.leading_zeros();
            remaining -= 1;
            if remaining == 0 {
                return Some(block * 64 + pos as usize);
            }
            word &= !(1u64 << (63 - pos));
        }
    }

    /// 親ノードの子ノードの範囲を返します。
    pub fn child_range(&self, parent: usize) -> Range<usize> {
        if parent == 0 {
            return 0..0;
        }
        let Some(left) = self.select0(parent) else {
            return 0..0;
        };
        let right = self.select0(parent + 1).unwrap_or(self.num_bits);
        let start = (left + 2).saturating_sub(parent);
        let end = (right + 1).saturating_sub(parent);
        // Children always come after their parent in level order.
        if start <= parent {
            return 0..0;
        }
        start..end.max(start)
    }

    /// 親ノードからラベル`label`の辺で到達する子ノードを返します。
    pub fn child(&self, parent: usize, label: u8) -> Option<usize> {
        let range = self.child_range(parent);
        if range.is_empty() {
            return None;
        }
        let nodes = &self.label_nodes[usize::from(label)];
        let pos = nodes.partition_point(|&n| (n as usize) < range.start);
        nodes
            .get(pos)
            .map(|&n| n as usize)
            .filter(|n| range.contains(n))
    }

    /// ラベル列に完全一致するノードを返します。
    pub fn exact(&self, path: &[u8]) -> Option<usize> {
        path.iter()
            .try_fold(ROOT, |node, &label| self.child(node, label))
    }

    /// ラベル列を先頭から辿り、到達したノードを順に返します。
    ///
    /// `k`番目（0始まり）の要素は長さ`k + 1`の接頭辞に対応し、ルートは含みません。
    /// 辿れなくなった時点で打ち切ります。
    pub fn byfix(&self, path: &[u8]) -> Vec<usize> {
        let mut result = Vec::with_capacity(path.len());
        let mut node = ROOT;
        for &label in path {
            match self.child(node, label) {
                Some(next) => {
                    result.push(next);
                    node = next;
                }
                None => break,
            }
        }
        result
    }

    /// ラベル列の接頭辞のうち、長さが`depth`の範囲にあるもののノードを返します。
    ///
    /// `depth`は接頭辞の文字数の範囲です。
    pub fn through(&self, path: &[u8], depth: Range<usize>) -> Vec<usize> {
        let nodes = self.byfix(path);
        let start = depth.start.max(1);
        let end = depth.end.min(nodes.len() + 1);
        if start >= end {
            return vec![];
        }
        nodes[start - 1..end - 1].to_vec()
    }

    /// ラベル列に一致するノードと、その子孫を幅優先で返します。
    ///
    /// # 引数
    ///
    /// * `path` - ラベル列
    /// * `max_depth` - 一致ノードから数えて何段下まで辿るか。`None`なら制限なし。
    /// * `limit` - 返すノード数の上限
    pub fn predictive(&self, path: &[u8], max_depth: Option<usize>, limit: usize) -> Vec<usize> {
        let Some(node) = self.exact(path) else {
            return vec![];
        };
        let mut result = vec![node];
        let mut frontier = vec![node];
        let mut depth = 0;
        while !frontier.is_empty() && result.len() < limit {
            if max_depth.is_some_and(|max| depth >= max) {
                break;
            }
            let mut next = vec![];
            for &parent in &frontier {
                next.extend(self.child_range(parent));
            }
            result.extend_from_slice(&next);
            frontier = next;
            depth += 1;
        }
        result.truncate(limit);
        result
    }
}
