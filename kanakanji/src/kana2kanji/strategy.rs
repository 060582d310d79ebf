//! ラティスの構築方法
//!
//! 前回の入力と今回の入力の差分から構築方法を選び、以前のラティスを再利用します。

use crate::candidate::Candidate;
use crate::common::cid;
use crate::dictionary::DicdataElement;
use crate::input::{ComposingInput, ComposingText};
use crate::kana2kanji::lattice::{Lattice, LatticeNode, RegisteredNode};
use crate::kana2kanji::{CancellationToken, DecodeOutcome, Kana2Kanji};

/// ラティスの構築方法
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Strategy {
    /// すべて構築し直す。
    All,
    /// 入力が変わっていない。ノードを再利用し、探索だけをやり直す。
    NoChange,
    /// 先頭の文節が確定された。残りのノードを左に詰めて探索をやり直す。
    AfterComplete,
    /// 末尾の文字が削除された。
    Deleted { deleted: usize },
    /// 末尾の文字が置き換えられた。
    Changed { deleted: usize, added: usize },
    /// 末尾に文字が追加された。
    Added { added: usize },
}

impl Strategy {
    /// 前回の入力`previous`と今回の入力`current`から構築方法を選びます。
    ///
    /// # 引数
    ///
    /// * `completed` - 前回の変換の後に文節が確定されたかどうか
    ///
    /// # 例
    ///
    /// ```
    /// use kanakanji::kana2kanji::Strategy;
    /// use kanakanji::ComposingText;
    ///
    /// let previous = ComposingText::new("しか");
    /// let current = ComposingText::new("しかい");
    /// assert_eq!(
    ///     Strategy::select(Some(&previous), &current, false),
    ///     Strategy::Added { added: 1 }
    /// );
    /// ```
    pub fn select(previous: Option<&ComposingText>, current: &ComposingText, completed: bool) -> Self {
        let Some(previous) = previous else {
            return Self::All;
        };
        if previous == current {
            return Self::NoChange;
        }
        if completed && previous.has_suffix(current) {
            return Self::AfterComplete;
        }
        match current.difference_suffix(previous) {
            (deleted, 0) if deleted > 0 => Self::Deleted { deleted },
            (deleted, added) if deleted > 0 => Self::Changed { deleted, added },
            (0, added) if added > 0 => Self::Added { added },
            _ => Self::All,
        }
    }
}

/// 確定された候補から、確定直後の変換の根ノードを作成します。
fn start_node(completed: &Candidate) -> RegisteredNode {
    let rcid = completed.data.last().map_or(cid::BOS, |d| d.rcid);
    RegisteredNode {
        data: DicdataElement::new("", "", cid::BOS, rcid, completed.last_mid, 0.0),
        prev: None,
        total_value: 0.0,
        range: 0..0,
    }
}

impl Kana2Kanji {
    /// 選ばれた構築方法でラティスを構築します。
    ///
    /// 以前のラティスがない場合や、以前のラティスが構築方法の前提と合わない場合は
    /// すべて構築し直します。
    ///
    /// # 引数
    ///
    /// * `input` - 今回の入力
    /// * `strategy` - 構築方法
    /// * `previous` - 前回のラティス
    /// * `completed` - 確定された候補。[`Strategy::AfterComplete`]で使います。
    /// * `n_best` - 各ノードが保持する前方パスの数
    /// * `token` - 取り消しトークン
    pub fn convert(
        &mut self,
        input: &ComposingText,
        strategy: Strategy,
        previous: Option<Lattice>,
        completed: Option<&Candidate>,
        n_best: usize,
        token: &CancellationToken,
    ) -> DecodeOutcome {
        log::debug!("{strategy:?} for {input}");
        let Some(previous) = previous else {
            return DecodeOutcome::Completed(self.all(input, n_best));
        };
        let lattice = match (strategy, completed) {
            (Strategy::NoChange, _) if previous.len() == input.len() => {
                self.no_change(previous, n_best)
            }
            (Strategy::AfterComplete, Some(completed)) if previous.len() >= input.len() => {
                return self.after_complete(input, previous, completed, n_best, token);
            }
            (Strategy::Deleted { .. }, _) if previous.len() > input.len() => {
                self.deleted(previous, input.len())
            }
            (Strategy::Changed { deleted, .. }, _) if previous.len() >= deleted => {
                self.changed(input, previous, deleted, n_best)
            }
            (Strategy::Added { .. }, _) if previous.len() < input.len() => {
                self.added(input, previous, n_best)
            }
            _ => self.all(input, n_best),
        };
        DecodeOutcome::Completed(lattice)
    }

    /// すべての開始位置について辞書を引き、ラティスを構築します。
    pub fn all<C>(&mut self, input: &C, n_best: usize) -> Lattice
    where
        C: ComposingInput + ?Sized,
    {
        let count = input.input().len();
        let mut lattice = Lattice::new(RegisteredNode::bos(), count);
        for start in 0..count {
            let nodes = self.store.lookup_range(input, start, None, true);
            lattice.extend_nodes(start, nodes);
        }
        self.run(&mut lattice, n_best, &[], None, None);
        lattice
    }

    /// ノードを再利用し、探索だけをやり直します。
    pub fn no_change(&mut self, mut previous: Lattice, n_best: usize) -> Lattice {
        let root = previous.root().clone();
        previous.reset(root);
        self.run(&mut previous, n_best, &[], None, None);
        previous
    }

    /// 末尾を削除した長さ`len`のラティスを作成します。
    ///
    /// 残るノードの前方パスは削除の影響を受けないため、探索はやり直しません。
    /// 取り除かれたノードと古い文末ノードの前方パスはアリーナから破棄されます。
    pub fn deleted(&mut self, mut previous: Lattice, len: usize) -> Lattice {
        truncate(&mut previous, len);
        previous.register_eos_from_values();
        previous.compact();
        previous
    }

    /// 末尾の`deleted`文字を置き換えたラティスを作成します。
    pub fn changed<C>(&mut self, input: &C, mut previous: Lattice, deleted: usize, n_best: usize) -> Lattice
    where
        C: ComposingInput + ?Sized,
    {
        let len = previous.len() - deleted;
        truncate(&mut previous, len);
        self.added(input, previous, n_best)
    }

    /// 末尾に文字が追加されたラティスを作成します。
    ///
    /// 既存のノードの区間は変わりません。追加された文字にかかる区間だけ辞書を引き、
    /// 既存のノードからは新しいノードへの前方パスだけを登録します。
    pub fn added<C>(&mut self, input: &C, mut previous: Lattice, n_best: usize) -> Lattice
    where
        C: ComposingInput + ?Sized,
    {
        let old = previous.len();
        let count = input.input().len();
        if old == 0 || old >= count {
            return self.all(input, n_best);
        }
        previous.resize(count);
        let retained: Vec<usize> = previous.nodes.iter().map(Vec::len).collect();
        for start in 0..count {
            let last = if start < old { Some(old..count) } else { None };
            let nodes = self.store.lookup_range(input, start, last, true);
            previous.extend_nodes(start, nodes);
        }
        self.run(&mut previous, n_best, &retained, None, None);
        previous.compact();
        previous
    }

    /// 先頭の文節が確定された後のラティスを作成します。
    ///
    /// 以前のラティスのうち確定されていない部分のノードを、区間を左に詰めて再利用します。
    /// 開始位置0のノードの前方パスは、確定された候補から作った根ノードになります。
    /// 取り消された場合、以前のラティスをそのまま返します。
    pub fn after_complete(
        &mut self,
        input: &ComposingText,
        previous: Lattice,
        completed: &Candidate,
        n_best: usize,
        token: &CancellationToken,
    ) -> DecodeOutcome {
        let count = input.len();
        let offset = previous.len().saturating_sub(count);
        let mut lattice = Lattice::new(start_node(completed), count);
        for (start, nodes) in previous.nodes().iter().skip(offset).enumerate() {
            let shifted = nodes.iter().map(|node| {
                LatticeNode::new(
                    node.data.clone(),
                    node.range.start - offset..node.range.end - offset,
                )
            });
            lattice.extend_nodes(start, shifted);
        }
        if self.run(&mut lattice, n_best, &[], None, Some(token)) {
            DecodeOutcome::Completed(lattice)
        } else {
            DecodeOutcome::Cancelled(previous)
        }
    }
}

/// 入力長を`len`に縮め、はみ出すノードを取り除きます。
fn truncate(lattice: &mut Lattice, len: usize) {
    lattice.nodes.truncate(len);
    for nodes in &mut lattice.nodes {
        nodes.retain(|node| node.range.end <= len);
    }
    lattice.resize(len);
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::sync::Arc;

    use crate::common::PValue;
    use crate::input::TypoRules;
    use crate::test_utils::{mock_kana2kanji, noun};

    fn best_text(lattice: &Lattice) -> Option<String> {
        lattice.best().map(|id| lattice.path_text(id))
    }

    fn totals(lattice: &Lattice) -> Vec<PValue> {
        let mut values: Vec<PValue> = lattice
            .eos()
            .prevs
            .iter()
            .map(|&id| lattice.registered(id).total_value)
            .collect();
        values.sort_by(|a, b| b.total_cmp(a));
        values
    }

    /// Builds the lattice of `input` from scratch, rooted at the committed candidate.
    fn all_after(
        kana2kanji: &mut Kana2Kanji,
        input: &ComposingText,
        completed: &Candidate,
    ) -> Lattice {
        let count = input.len();
        let mut lattice = Lattice::new(start_node(completed), count);
        for start in 0..count {
            let nodes = kana2kanji.store.lookup_range(input, start, None, true);
            lattice.extend_nodes(start, nodes);
        }
        kana2kanji.run(&mut lattice, 10, &[], None, None);
        lattice
    }

    #[test]
    fn test_select() {
        let text = |s: &str| ComposingText::new(s);
        assert_eq!(Strategy::select(None, &text("し"), false), Strategy::All);
        assert_eq!(
            Strategy::select(Some(&text("しか")), &text("しか"), true),
            Strategy::NoChange
        );
        assert_eq!(
            Strategy::select(Some(&text("しかい")), &text("い"), true),
            Strategy::AfterComplete
        );
        assert_eq!(
            Strategy::select(Some(&text("しかい")), &text("い"), false),
            Strategy::Changed {
                deleted: 3,
                added: 1
            }
        );
        assert_eq!(
            Strategy::select(Some(&text("しかい")), &text("しか"), false),
            Strategy::Deleted { deleted: 1 }
        );
        assert_eq!(
            Strategy::select(Some(&text("しかい")), &text("しかし"), false),
            Strategy::Changed {
                deleted: 1,
                added: 1
            }
        );
    }

    #[test]
    fn test_added_keeps_ranges() {
        let mut kana2kanji = mock_kana2kanji();
        let before = kana2kanji.all(&ComposingText::new("しか"), 10);
        let ranges: Vec<Vec<_>> = before
            .nodes()
            .iter()
            .map(|nodes| nodes.iter().map(|n| n.range.clone()).collect())
            .collect();
        let after = kana2kanji.added(&ComposingText::new("しかい"), before, 10);
        for (start, old) in ranges.iter().enumerate() {
            let new: Vec<_> = after.nodes()[start]
                .iter()
                .take(old.len())
                .map(|n| n.range.clone())
                .collect();
            assert_eq!(&new, old);
        }
    }

    #[test]
    fn test_deleted_matches_all() {
        let mut kana2kanji = mock_kana2kanji();
        let before = kana2kanji.all(&ComposingText::new("しかい"), 10);
        let deleted = kana2kanji.deleted(before, 2);
        let full = kana2kanji.all(&ComposingText::new("しか"), 10);
        assert_eq!(best_text(&deleted), best_text(&full));
        assert_eq!(deleted.eos().prevs.len(), full.eos().prevs.len());
    }

    #[test]
    fn test_arena_stays_bounded() {
        let mut kana2kanji = mock_kana2kanji();
        let short = ComposingText::new("しか");
        let long = ComposingText::new("しかい");
        let fresh_short = kana2kanji.all(&short, 10);
        let fresh_long = kana2kanji.all(&long, 10);

        let mut lattice = kana2kanji.all(&short, 10);
        let mut sizes = vec![];
        for _ in 0..5 {
            lattice = kana2kanji.added(&long, lattice, 10);
            assert!(lattice.arena_len() <= fresh_long.arena_len());
            assert_eq!(best_text(&lattice), best_text(&fresh_long));

            lattice = kana2kanji.deleted(lattice, 2);
            assert!(lattice.arena_len() <= fresh_short.arena_len());
            assert_eq!(best_text(&lattice), best_text(&fresh_short));
            sizes.push(lattice.arena_len());
        }
        assert!(sizes.windows(2).all(|w| w[0] == w[1]), "{sizes:?}");

        lattice = kana2kanji.changed(&ComposingText::new("しかし"), lattice, 1, 10);
        let fresh = kana2kanji.all(&ComposingText::new("しかし"), 10);
        assert!(lattice.arena_len() <= fresh.arena_len());
        assert_eq!(best_text(&lattice), best_text(&fresh));
    }

    #[test]
    fn test_after_complete_matches_full() {
        let mut rules = TypoRules::new();
        rules.insert('ガ', 'カ', 1.0);
        rules.insert('イ', 'ウ', 2.0);
        let rules = Arc::new(rules);

        let cases = [
            ("しかい", noun("鹿", "シカ", -6.0), 2),
            ("しかしかい", noun("鹿", "シカ", -6.0), 2),
            ("しかいか", noun("歯科医", "シカイ", -9.0), 3),
            ("ししか", noun("死", "シ", -9.0), 1),
            ("しがしかい", noun("鹿", "シカ", -6.0), 2),
        ];
        for typo in [false, true] {
            for (text, completed, count) in &cases {
                let make = |s: &str| {
                    let input = ComposingText::new(s);
                    if typo {
                        input.with_typo_rules(Arc::clone(&rules))
                    } else {
                        input
                    }
                };
                let mut kana2kanji = mock_kana2kanji();
                let before = make(*text);
                let previous = kana2kanji.all(&before, 10);
                let mut after = before.clone();
                after.prefix_complete(*count);
                let completed = Candidate::from_element(completed.clone());

                let shifted = kana2kanji
                    .after_complete(&after, previous, &completed, 10, &CancellationToken::new())
                    .completed()
                    .unwrap();
                let full = all_after(&mut kana2kanji, &after, &completed);
                assert_eq!(shifted.len(), full.len(), "{text} typo={typo}");
                assert_eq!(best_text(&shifted), best_text(&full), "{text} typo={typo}");
                assert_eq!(totals(&shifted), totals(&full), "{text} typo={typo}");
            }
        }
    }

    #[test]
    fn test_after_complete_cancelled() {
        let mut kana2kanji = mock_kana2kanji();
        let previous = kana2kanji.all(&ComposingText::new("しかい"), 10);
        let completed = Candidate::from_element(noun("鹿", "シカ", -6.0));
        let token = CancellationToken::new();
        token.cancel();
        let outcome = kana2kanji.after_complete(
            &ComposingText::new("い"),
            previous.clone(),
            &completed,
            10,
            &token,
        );
        match outcome {
            DecodeOutcome::Cancelled(lattice) => {
                assert_eq!(lattice.len(), 3);
                assert_eq!(best_text(&lattice), best_text(&previous));
            }
            DecodeOutcome::Completed(_) => panic!("expected cancellation"),
        }
    }

    #[test]
    fn test_after_complete() {
        let mut kana2kanji = mock_kana2kanji();
        let previous = kana2kanji.all(&ComposingText::new("しかい"), 10);
        let completed = Candidate::from_element(noun("鹿", "シカ", -6.0));
        let lattice = kana2kanji
            .after_complete(
                &ComposingText::new("い"),
                previous,
                &completed,
                10,
                &CancellationToken::new(),
            )
            .completed()
            .unwrap();
        assert_eq!(lattice.len(), 1);
        assert!(lattice.nodes()[0].iter().all(|n| n.range == (0..1)));
        assert!(!lattice.eos().prevs.is_empty());
        assert_eq!(lattice.root().data.rcid, cid::GENERAL_NOUN);
    }
}
