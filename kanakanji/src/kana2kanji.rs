//! かな漢字変換の中核モジュール。
//!
//! このモジュールは、入力からラティスを構築し、N-best探索によって変換候補を求める
//! 機能を提供します。主な機能として以下を含みます:
//!
//! - 入力の変化に応じた6種類のラティス構築方法（[`Strategy`]）
//! - 接頭辞制約付きの変換（[`PrefixConstraint`]）
//! - 文節候補の連結と、変換中・確定後の予測変換
//! - 確定直後の変換の協調的なキャンセル（[`CancellationToken`]）
pub mod lattice;

mod constraint;
mod prediction;
mod strategy;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::candidate::{Candidate, CandidateData};
use crate::common::{include_mm_value_calculation, mid};
use crate::dictionary::DicdataStore;

pub use crate::kana2kanji::constraint::PrefixConstraint;
pub(crate) use crate::kana2kanji::prediction::best_predictions;
pub use crate::kana2kanji::lattice::{Lattice, LatticeNode, RegisteredId, RegisteredNode};
pub use crate::kana2kanji::strategy::Strategy;

/// 実行中の変換を取り消すためのトークン。
///
/// 複製したトークンは同じ状態を共有します。別のスレッドから
/// [`CancellationToken::cancel`]を呼ぶと、変換は次の入力位置の処理を始める前に中断されます。
#[derive(Clone, Debug, Default)]
pub struct CancellationToken(Arc<AtomicBool>);

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// 取り消しを要求します。
    pub fn cancel(&self) {
        self.0.store(true, Ordering::Release);
    }

    /// 取り消しが要求されたかどうか。
    #[inline]
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

/// ラティス構築の結果
#[derive(Clone, Debug)]
pub enum DecodeOutcome {
    /// 構築が完了した。
    Completed(Lattice),
    /// 取り消された。渡された以前のラティスを変更せずに返す。
    Cancelled(Lattice),
}

impl DecodeOutcome {
    /// 完了していればラティスを返します。
    pub fn completed(self) -> Option<Lattice> {
        match self {
            Self::Completed(lattice) => Some(lattice),
            Self::Cancelled(_) => None,
        }
    }
}

/// かな漢字変換器。
///
/// 辞書ストアを所有し、ラティスの構築と候補のスコア計算を行います。
pub struct Kana2Kanji {
    pub(crate) store: DicdataStore,
}

impl Kana2Kanji {
    pub fn new(store: DicdataStore) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &DicdataStore {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut DicdataStore {
        &mut self.store
    }

    /// 開始位置の小さいノードから順に、前方パスを後続ノードへ登録します。
    ///
    /// # 引数
    ///
    /// * `retained` - 開始位置ごとの、評価済みで登録し直す必要のないノード数
    /// * `constraint` - 接頭辞制約。指定するとノードの枝刈りを行いません。
    /// * `token` - 各開始位置の処理前に確認する取り消しトークン
    ///
    /// # 戻り値
    ///
    /// 取り消された場合は`false`
    pub(crate) fn run(
        &mut self,
        lattice: &mut Lattice,
        n_best: usize,
        retained: &[usize],
        constraint: Option<&PrefixConstraint>,
        token: Option<&CancellationToken>,
    ) -> bool {
        for start in 0..lattice.len() {
            if token.is_some_and(CancellationToken::is_cancelled) {
                log::debug!("conversion cancelled at {start}");
                return false;
            }
            let kept = retained.get(start).copied().unwrap_or(0);
            for index in 0..lattice.nodes[start].len() {
                if index < kept {
                    if lattice.nodes[start][index].values.is_empty() {
                        continue;
                    }
                } else if !lattice.evaluate(&mut self.store, start, index, constraint.is_none()) {
                    continue;
                }
                lattice.relax(&mut self.store, start, index, retained, n_best, constraint);
            }
        }
        true
    }

    /// 文節に区切られた前方パスを1つの候補にまとめます。
    ///
    /// 文節間の意味連接スコアを加えます。
    pub fn process_clause_candidate(&self, data: &CandidateData) -> Candidate {
        let (mm, _) = data
            .clauses
            .iter()
            .fold((0.0, mid::EOS), |(value, former), (clause, _)| {
                (value + self.store.mm_value(former, clause.mid), clause.mid)
            });
        let text: String = data.clauses.iter().map(|(c, _)| c.text.as_str()).collect();
        let (value, last_mid) = data
            .clauses
            .last()
            .map_or((0.0, mid::EOS), |(c, v)| (*v + mm, c.mid));
        let count = data.clauses.iter().map(|(c, _)| c.range.len()).sum();
        Candidate::new(text, value, count, last_mid, data.data.clone())
    }

    /// 連続する2つの候補を連結します。
    ///
    /// 継ぎ目の品詞連接コストと、右側の先頭が意味連接の対象なら意味連接コストを加えます。
    pub fn merge_candidates(&mut self, left: &Candidate, right: &Candidate) -> Candidate {
        let mut data = left.data.clone();
        data.extend_from_slice(&right.data);
        let mut value = left.value + right.value;
        if let (Some(left_last), Some(right_first)) = (left.data.last(), right.data.first()) {
            value += self.store.cc_value(left_last.rcid, right_first.lcid);
            if include_mm_value_calculation(right_first.lcid, right_first.rcid) {
                value += self.store.mm_value(left.last_mid, right_first.mid);
            }
        }
        Candidate::new(
            format!("{}{}", left.text, right.text),
            value,
            left.corresponding_count + right.corresponding_count,
            right.last_mid,
            data,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::candidate::ClauseDataUnit;
    use crate::test_utils::{mock_kana2kanji, noun};

    #[test]
    fn test_cancellation_token() {
        let token = CancellationToken::new();
        let shared = token.clone();
        assert!(!token.is_cancelled());
        shared.cancel();
        assert!(token.is_cancelled());
    }

    #[test]
    fn test_process_clause_candidate() {
        let kana2kanji = mock_kana2kanji();
        let data = CandidateData {
            clauses: vec![
                (
                    ClauseDataUnit {
                        mid: mid::GENERAL,
                        text: "鹿".to_string(),
                        range: 0..2,
                        ..ClauseDataUnit::default()
                    },
                    -6.0,
                ),
                (
                    ClauseDataUnit {
                        mid: mid::GENERAL,
                        text: "歯科".to_string(),
                        range: 2..4,
                        ..ClauseDataUnit::default()
                    },
                    -20.0,
                ),
            ],
            data: vec![noun("鹿", "シカ", -6.0), noun("歯科", "シカ", -8.0)],
        };
        let candidate = kana2kanji.process_clause_candidate(&data);
        assert_eq!(candidate.text, "鹿歯科");
        assert_eq!(candidate.corresponding_count, 4);
        // The mock meaning matrix connects GENERAL to GENERAL with -1.
        assert_eq!(candidate.value, -21.0);
        assert_eq!(candidate.last_mid, mid::GENERAL);
    }

    #[test]
    fn test_merge_candidates() {
        let mut kana2kanji = mock_kana2kanji();
        let left = Candidate::from_element(noun("鹿", "シカ", -6.0));
        let right = Candidate::from_element(noun("歯科", "シカ", -8.0));
        let merged = kana2kanji.merge_candidates(&left, &right);
        assert_eq!(merged.text, "鹿歯科");
        assert_eq!(merged.corresponding_count, 4);
        assert_eq!(merged.data.len(), 2);
        // noun -> noun costs -3 and GENERAL -> GENERAL costs -1 in the mock tables.
        assert_eq!(merged.value, -6.0 - 8.0 - 3.0 - 1.0);

        let empty = Candidate::new("", 0.0, 0, mid::EOS, vec![]);
        let merged = kana2kanji.merge_candidates(&empty, &right);
        assert_eq!(merged.value, -8.0);
    }
}
