//! 接頭辞制約付きの変換
//!
//! 外部から与えられた文字列に沿うパスだけを探索します。

use crate::dictionary::{DicdataElement, Metadata};
use crate::input::ComposingInput;
use crate::kana2kanji::lattice::{Lattice, RegisteredNode};
use crate::kana2kanji::Kana2Kanji;

/// 変換結果の先頭に課す制約
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PrefixConstraint {
    /// 変換結果が従うべき文字列
    pub constraint: String,
    /// `true`なら変換結果全体が`constraint`に一致しなければならない。
    pub has_eos: bool,
}

impl PrefixConstraint {
    pub fn new<S: Into<String>>(constraint: S, has_eos: bool) -> Self {
        Self {
            constraint: constraint.into(),
            has_eos,
        }
    }

    /// 途中までの変換結果`text`が制約と矛盾しないかどうか。
    pub fn allows_partial(&self, text: &str) -> bool {
        if self.has_eos {
            text.len() < self.constraint.len() && self.constraint.starts_with(text)
        } else {
            text.starts_with(&self.constraint) || self.constraint.starts_with(text)
        }
    }

    /// 入力全体の変換結果`text`が制約を満たすかどうか。
    pub fn allows_complete(&self, text: &str) -> bool {
        if self.has_eos {
            text == self.constraint
        } else {
            text.starts_with(&self.constraint)
        }
    }
}

/// 学習結果とユーザ辞書のエントリは制約を受けない。
#[inline]
pub(crate) fn bypasses_constraint(data: &DicdataElement) -> bool {
    data.metadata
        .intersects(Metadata::IS_LEARNED.union(Metadata::IS_FROM_USER_DICTIONARY))
}

impl Kana2Kanji {
    /// 接頭辞制約を満たすパスだけでラティスを構築します。
    ///
    /// 誤り訂正は行いません。スコアによるノードの枝刈りも行いません。
    pub fn all_with_prefix_constraint<C>(
        &mut self,
        input: &C,
        n_best: usize,
        constraint: &PrefixConstraint,
    ) -> Lattice
    where
        C: ComposingInput + ?Sized,
    {
        let count = input.input().len();
        log::debug!(
            "constrained conversion of {count} characters with {:?}",
            constraint.constraint
        );
        let mut lattice = Lattice::new(RegisteredNode::bos(), count);
        for start in 0..count {
            let nodes = self.store.lookup_range(input, start, None, false);
            lattice.extend_nodes(start, nodes);
        }
        self.run(&mut lattice, n_best, &[], Some(constraint), None);
        lattice
    }
}
