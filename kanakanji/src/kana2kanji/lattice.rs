//! ラティス（格子）構造の実装モジュール。
//!
//! このモジュールは、かな漢字変換のN-best探索のためのラティス構造を提供します。
//! 各ノードは辞書エントリと入力区間を持ち、前方パスは[`RegisteredNode`]の
//! アリーナ上に索引で表されます。前方パスは複数のノードから共有されるため、
//! 後ろ向きの連結リストとして保持されます。
use std::ops::Range;

use crate::candidate::{CandidateData, ClauseDataUnit};
use crate::common::{include_mm_value_calculation, is_clause, PValue};
use crate::dictionary::{DicdataElement, DicdataStore};
use crate::kana2kanji::constraint::{bypasses_constraint, PrefixConstraint};

/// アリーナ上の[`RegisteredNode`]を指す索引。
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RegisteredId(u32);

impl RegisteredId {
    /// 根ノード。文頭、または確定直後の開始ノード。
    pub const ROOT: Self = Self(0);

    #[inline(always)]
    fn index(self) -> usize {
        self.0 as usize
    }
}

/// 前方パスの1要素。
///
/// あるノードに、特定の前方パスを経由して到達したことを表します。
#[derive(Clone, Debug)]
pub struct RegisteredNode {
    /// 到達したノードのエントリ。
    pub data: DicdataElement,
    /// 1つ前の要素。根ノードでは`None`。
    pub prev: Option<RegisteredId>,
    /// 文頭からの累積スコア。後続ノードとの品詞連接コストを含む。
    pub total_value: PValue,
    /// 到達したノードの入力区間。
    pub range: Range<usize>,
}

impl RegisteredNode {
    /// 文頭ノードを作成します。
    pub fn bos() -> Self {
        Self {
            data: DicdataElement::bos(),
            prev: None,
            total_value: 0.0,
            range: 0..0,
        }
    }
}

/// ラティス内のノード。
#[derive(Clone, Debug)]
pub struct LatticeNode {
    /// エントリ。
    pub data: DicdataElement,
    /// 入力区間（文字単位）。
    pub range: Range<usize>,
    /// 前方パス。スコアの降順に並び、長さはN-bestを超えない。
    pub prevs: Vec<RegisteredId>,
    /// 各前方パスを経由したときの、このノードまでの累積スコア。
    pub values: Vec<PValue>,
}

impl LatticeNode {
    pub fn new(data: DicdataElement, range: Range<usize>) -> Self {
        Self {
            data,
            range,
            prevs: vec![],
            values: vec![],
        }
    }

    /// 入力長`len`に対する文末ノードを作成します。
    pub fn eos(len: usize) -> Self {
        Self::new(DicdataElement::eos(), len..len)
    }

    fn registered(&self, index: usize, value: PValue) -> RegisteredNode {
        RegisteredNode {
            data: self.data.clone(),
            prev: self.prevs.get(index).copied(),
            total_value: value,
            range: self.range.clone(),
        }
    }

    fn reset(&mut self) {
        self.prevs.clear();
        self.values.clear();
    }
}

/// ラティス。
///
/// `nodes[i]`は入力の`i`文字目から始まるノードの一覧です。
#[derive(Clone, Debug)]
pub struct Lattice {
    pub(crate) nodes: Vec<Vec<LatticeNode>>,
    arena: Vec<RegisteredNode>,
    eos: LatticeNode,
}

impl Lattice {
    /// 根ノードを`root`として、入力長`len`の空のラティスを作成します。
    pub fn new(root: RegisteredNode, len: usize) -> Self {
        Self {
            nodes: vec![vec![]; len],
            arena: vec![root],
            eos: LatticeNode::eos(len),
        }
    }

    /// 入力長
    #[inline(always)]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    #[inline(always)]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// 開始位置ごとのノード。
    #[inline(always)]
    pub fn nodes(&self) -> &[Vec<LatticeNode>] {
        &self.nodes
    }

    /// 文末ノード。入力の末尾に達した前方パスを保持します。
    #[inline(always)]
    pub fn eos(&self) -> &LatticeNode {
        &self.eos
    }

    /// 前方パスの要素を返します。
    #[inline(always)]
    pub fn registered(&self, id: RegisteredId) -> &RegisteredNode {
        &self.arena[id.index()]
    }

    /// 根ノード
    #[inline(always)]
    pub fn root(&self) -> &RegisteredNode {
        self.registered(RegisteredId::ROOT)
    }

    /// 文末に達した前方パスのうち、スコアが最大のもの。
    pub fn best(&self) -> Option<RegisteredId> {
        self.eos.prevs.iter().copied().reduce(|best, id| {
            if self.registered(id).total_value > self.registered(best).total_value {
                id
            } else {
                best
            }
        })
    }

    /// 根ノードから作り直し、すべてのノードの前方パスを消去します。
    ///
    /// 開始位置0のノードの前方パスは根ノードだけになります。
    pub(crate) fn reset(&mut self, root: RegisteredNode) {
        self.arena.clear();
        self.arena.push(root);
        self.eos = LatticeNode::eos(self.nodes.len());
        for (i, nodes) in self.nodes.iter_mut().enumerate() {
            for node in nodes {
                node.reset();
                if i == 0 {
                    node.prevs.push(RegisteredId::ROOT);
                }
            }
        }
    }

    /// 入力長を`len`に変更します。文末ノードは空になります。
    pub(crate) fn resize(&mut self, len: usize) {
        self.nodes.resize_with(len, Vec::new);
        self.eos = LatticeNode::eos(len);
    }

    /// 開始位置`start`にノードを追加します。開始位置0なら根ノードを前方パスにします。
    pub(crate) fn extend_nodes<I>(&mut self, start: usize, nodes: I)
    where
        I: IntoIterator<Item = LatticeNode>,
    {
        self.nodes[start].extend(nodes.into_iter().map(|mut node| {
            node.reset();
            if start == 0 {
                node.prevs.push(RegisteredId::ROOT);
            }
            node
        }));
    }

    fn push(&mut self, node: RegisteredNode) -> RegisteredId {
        let id = RegisteredId(self.arena.len() as u32);
        self.arena.push(node);
        id
    }

    /// アリーナが保持する前方パスの要素数。
    #[inline(always)]
    pub fn arena_len(&self) -> usize {
        self.arena.len()
    }

    /// どのノードからも辿れない前方パスの要素をアリーナから取り除き、索引を振り直します。
    ///
    /// 根ノードは常に先頭に残ります。
    pub(crate) fn compact(&mut self) {
        let mut live = vec![false; self.arena.len()];
        live[RegisteredId::ROOT.index()] = true;
        let mut stack: Vec<RegisteredId> = self
            .nodes
            .iter()
            .flatten()
            .chain(std::iter::once(&self.eos))
            .flat_map(|node| node.prevs.iter().copied())
            .collect();
        while let Some(id) = stack.pop() {
            let live = &mut live[id.index()];
            if *live {
                continue;
            }
            *live = true;
            if let Some(prev) = self.arena[id.index()].prev {
                stack.push(prev);
            }
        }

        let mut remap = vec![RegisteredId::ROOT; self.arena.len()];
        let mut arena = Vec::with_capacity(live.iter().filter(|&&l| l).count());
        for (i, node) in std::mem::take(&mut self.arena).into_iter().enumerate() {
            if live[i] {
                remap[i] = RegisteredId(arena.len() as u32);
                arena.push(node);
            }
        }
        for node in &mut arena {
            if let Some(prev) = node.prev.as_mut() {
                *prev = remap[prev.index()];
            }
        }
        for node in self
            .nodes
            .iter_mut()
            .flatten()
            .chain(std::iter::once(&mut self.eos))
        {
            for id in &mut node.prevs {
                *id = remap[id.index()];
            }
        }
        self.arena = arena;
    }

    /// 前方パスの語を連結した文字列を返します。
    pub fn path_text(&self, id: RegisteredId) -> String {
        let mut words = vec![];
        let mut cur = Some(id);
        while let Some(c) = cur {
            let node = self.registered(c);
            words.push(node.data.word.as_str());
            cur = node.prev;
        }
        words.iter().rev().copied().collect()
    }

    /// `start`から始まる`index`番目のノードについて、前方パスごとの累積スコアを計算します。
    ///
    /// # 戻り値
    ///
    /// ノードが到達不能か、枝刈りの対象であれば`false`
    pub(crate) fn evaluate(
        &mut self,
        store: &mut DicdataStore,
        start: usize,
        index: usize,
        prune: bool,
    ) -> bool {
        let node = &self.nodes[start][index];
        if node.prevs.is_empty() || (prune && DicdataStore::should_be_removed(&node.data)) {
            self.nodes[start][index].values.clear();
            return false;
        }
        let w = node.data.value();
        let values = if start == 0 {
            node.prevs
                .iter()
                .map(|&id| {
                    let prev = &self.arena[id.index()];
                    prev.total_value + w + store.cc_value(prev.data.rcid, node.data.lcid)
                })
                .collect()
        } else {
            node.prevs
                .iter()
                .map(|&id| self.arena[id.index()].total_value + w)
                .collect()
        };
        self.nodes[start][index].values = values;
        true
    }

    /// 評価済みのノードを後続ノードへ登録します。
    ///
    /// 入力の末尾に達するノードは文末ノードへ、それ以外は終端位置から始まるノードへ登録します。
    /// `retained`が空でなければ、終端位置`e`のノードのうち先頭`retained[e]`個は登録済みとして
    /// 読み飛ばします。各ノードの前方パスはN-bestを超えません。
    pub(crate) fn relax(
        &mut self,
        store: &mut DicdataStore,
        start: usize,
        index: usize,
        retained: &[usize],
        n_best: usize,
        constraint: Option<&PrefixConstraint>,
    ) {
        let end = self.nodes[start][index].range.end;
        if end >= self.nodes.len() {
            self.register_eos(start, index, constraint);
            return;
        }
        let prefixes: Vec<String> = match constraint {
            Some(_) => {
                let node = &self.nodes[start][index];
                node.prevs
                    .iter()
                    .map(|&id| {
                        let mut text = self.path_text(id);
                        text.push_str(&node.data.word);
                        text
                    })
                    .collect()
            }
            None => vec![],
        };
        let first_target = retained.get(end).copied().unwrap_or(0);
        let target_count = self.nodes[end].len();
        for k in first_target..target_count {
            let (rcid, next_lcid) = {
                let next = &self.nodes[end][k];
                if constraint.is_none() && DicdataStore::should_be_removed(&next.data) {
                    continue;
                }
                (self.nodes[start][index].data.rcid, next.data.lcid)
            };
            let cc = store.cc_value(rcid, next_lcid);
            for p in 0..self.nodes[start][index].values.len() {
                if let Some(constraint) = constraint {
                    let next = &self.nodes[end][k];
                    let text = format!("{}{}", prefixes[p], next.data.word);
                    if !bypasses_constraint(&next.data) && !constraint.allows_partial(&text)
                    {
                        continue;
                    }
                }
                let new_value = cc + self.nodes[start][index].values[p];
                let prevs = &self.nodes[end][k].prevs;
                let position = prevs
                    .iter()
                    .rposition(|&id| self.arena[id.index()].total_value >= new_value)
                    .map_or(0, |i| i + 1);
                if position >= n_best {
                    continue;
                }
                let registered = self.nodes[start][index].registered(p, new_value);
                let id = self.push(registered);
                let prevs = &mut self.nodes[end][k].prevs;
                if prevs.len() >= n_best {
                    prevs.pop();
                }
                prevs.insert(position, id);
            }
        }
    }

    fn register_eos(&mut self, start: usize, index: usize, constraint: Option<&PrefixConstraint>) {
        for p in 0..self.nodes[start][index].values.len() {
            let node = &self.nodes[start][index];
            if let Some(constraint) = constraint {
                if !bypasses_constraint(&node.data) {
                    let mut text = self.path_text(node.prevs[p]);
                    text.push_str(&node.data.word);
                    if !constraint.allows_complete(&text) {
                        continue;
                    }
                }
            }
            let registered = node.registered(p, node.values[p]);
            let id = self.push(registered);
            self.eos.prevs.push(id);
        }
    }

    /// 評価済みの値をそのまま使い、入力の末尾に達するノードを文末ノードへ登録します。
    pub(crate) fn register_eos_from_values(&mut self) {
        let len = self.nodes.len();
        self.eos = LatticeNode::eos(len);
        for start in 0..len {
            for index in 0..self.nodes[start].len() {
                if self.nodes[start][index].range.end == len {
                    self.register_eos(start, index, None);
                }
            }
        }
    }

    /// 前方パスを文頭まで辿り、文節に区切った候補データを作成します。
    ///
    /// 語が空のエントリは読み飛ばします。隣接する語の間に文節境界がない限り、
    /// 同じ文節に語を追加します。
    pub fn candidate_data(&self, id: RegisteredId) -> CandidateData {
        let mut chain = vec![];
        let mut cur = Some(id);
        while let Some(c) = cur {
            let node = self.registered(c);
            chain.push(node);
            cur = node.prev;
        }
        let mut chain = chain.into_iter().rev();
        let Some(root) = chain.next() else {
            return CandidateData::default();
        };

        let mut result = CandidateData {
            clauses: vec![(
                ClauseDataUnit {
                    mid: root.data.mid,
                    range: root.range.clone(),
                    ..ClauseDataUnit::default()
                },
                0.0,
            )],
            data: vec![],
        };
        let mut prev_rcid = root.data.rcid;
        for node in chain {
            let former = std::mem::replace(&mut prev_rcid, node.data.rcid);
            if node.data.word.is_empty() {
                continue;
            }
            let Some((last, value)) = result.clauses.last_mut() else {
                break;
            };
            let include_mm = include_mm_value_calculation(node.data.lcid, node.data.rcid);
            if last.text.is_empty() || !is_clause(former, node.data.lcid) {
                last.text.push_str(&node.data.word);
                last.range = last.range.start..node.range.end;
                if (last.mid == crate::common::mid::EOS
                    && node.data.mid != crate::common::mid::EOS)
                    || include_mm
                {
                    last.mid = node.data.mid;
                }
                *value = node.total_value;
            } else {
                last.next_lcid = node.data.lcid;
                let mut unit = ClauseDataUnit {
                    text: node.data.word.clone(),
                    range: node.range.clone(),
                    ..ClauseDataUnit::default()
                };
                if include_mm {
                    unit.mid = node.data.mid;
                }
                result.clauses.push((unit, node.total_value));
            }
            result.data.push(node.data.clone());
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::common::{cid, mid};

    fn lattice_with_path() -> (Lattice, RegisteredId) {
        let mut lattice = Lattice::new(RegisteredNode::bos(), 3);
        let shika = lattice.push(RegisteredNode {
            data: DicdataElement::with_cid("歯科", "シカ", cid::GENERAL_NOUN, mid::GENERAL, -8.0),
            prev: Some(RegisteredId::ROOT),
            total_value: -10.0,
            range: 0..2,
        });
        let wa = lattice.push(RegisteredNode {
            data: DicdataElement::with_cid("は", "ハ", cid::PARTICLE_WA, mid::EOS, -2.0),
            prev: Some(shika),
            total_value: -13.0,
            range: 2..3,
        });
        (lattice, wa)
    }

    #[test]
    fn test_candidate_data() {
        let (lattice, id) = lattice_with_path();
        let data = lattice.candidate_data(id);
        assert_eq!(data.data.len(), 2);
        assert_eq!(data.clauses.len(), 1);
        let (clause, value) = &data.clauses[0];
        assert_eq!(clause.text, "歯科は");
        assert_eq!(clause.range, 0..3);
        assert_eq!(clause.mid, mid::GENERAL);
        assert_eq!(*value, -13.0);
        assert_eq!(lattice.path_text(id), "歯科は");
    }

    #[test]
    fn test_candidate_data_of_root() {
        let lattice = Lattice::new(RegisteredNode::bos(), 0);
        let data = lattice.candidate_data(RegisteredId::ROOT);
        assert!(data.data.is_empty());
        assert_eq!(data.clauses.len(), 1);
        assert_eq!(data.clauses[0].0.mid, mid::BOS);
        assert!(data.clauses[0].0.text.is_empty());
    }

    #[test]
    fn test_best() {
        let (mut lattice, id) = lattice_with_path();
        assert_eq!(lattice.best(), None);
        lattice.eos.prevs.push(RegisteredId(1));
        lattice.eos.prevs.push(id);
        assert_eq!(lattice.best(), Some(RegisteredId(1)));
    }
}
