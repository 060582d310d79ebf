//! 変換候補
//!
//! ラティスの前方パスから得られる文節列と、利用者に提示する候補を表す型を定義します。

use std::ops::Range;

use hashbrown::{HashMap, HashSet};

use crate::common::{cid, include_mm_value_calculation, is_clause, mid, PValue};
use crate::dictionary::DicdataElement;

/// 候補の確定時に行うべき操作
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CompleteAction {
    /// カーソルを指定した文字数だけ移動する。負なら左へ。
    MoveCursor(isize),
}

/// 1つの文節
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ClauseDataUnit {
    /// 文節の意味ID
    pub mid: u16,
    /// 次の文節の先頭の左品詞ID
    pub next_lcid: u16,
    /// 文節の表層形
    pub text: String,
    /// 文節に対応する入力区間
    pub range: Range<usize>,
}

impl Default for ClauseDataUnit {
    fn default() -> Self {
        Self {
            mid: mid::EOS,
            next_lcid: cid::EOS,
            text: String::new(),
            range: 0..0,
        }
    }
}

impl ClauseDataUnit {
    /// 後続の文節`unit`をこの文節に連結します。
    pub fn merge(&mut self, unit: &ClauseDataUnit) {
        self.text.push_str(&unit.text);
        self.range = self.range.start..unit.range.end;
        self.next_lcid = unit.next_lcid;
    }
}

/// 前方パスを文節に区切ったもの
#[derive(Clone, Debug, Default)]
pub struct CandidateData {
    /// 文節と、その文節の末尾までの累積スコア
    pub clauses: Vec<(ClauseDataUnit, PValue)>,
    /// パス上のエントリ
    pub data: Vec<DicdataElement>,
}

impl CandidateData {
    pub fn is_empty(&self) -> bool {
        self.clauses.is_empty()
    }

    /// 保持している文節の表層形に対応する先頭のエントリ。
    ///
    /// 文節を取り除いた後も`data`は元のままなので、残った文節の分だけを取り出します。
    pub fn clause_data(&self) -> &[DicdataElement] {
        let length: usize = self.clauses.iter().map(|(c, _)| c.text.len()).sum();
        let mut total = 0;
        let count = self
            .data
            .iter()
            .take_while(|d| {
                if total >= length {
                    return false;
                }
                total += d.word.len();
                true
            })
            .count();
        &self.data[..count]
    }

    /// 最初の文節だけを候補にします。
    pub fn first_clause_candidate(&self) -> Option<Candidate> {
        let (first, value) = self.clauses.first()?;
        let mut text = String::new();
        let mut count = 0;
        for d in &self.data {
            if text.len() >= first.text.len() {
                break;
            }
            text.push_str(&d.word);
            count += 1;
        }
        Some(Candidate::new(
            first.text.clone(),
            *value,
            first.range.len(),
            first.mid,
            self.data[..count].to_vec(),
        ))
    }
}

/// 変換候補
#[derive(Clone, Debug, PartialEq)]
pub struct Candidate {
    /// 表層形
    pub text: String,
    /// スコア
    pub value: PValue,
    /// 対応する入力の文字数
    pub corresponding_count: usize,
    /// 最後の意味ID
    pub last_mid: u16,
    /// 構成するエントリ
    pub data: Vec<DicdataElement>,
    /// 確定時に行うべき操作
    pub actions: Vec<CompleteAction>,
}

impl Candidate {
    pub fn new<S: Into<String>>(
        text: S,
        value: PValue,
        corresponding_count: usize,
        last_mid: u16,
        data: Vec<DicdataElement>,
    ) -> Self {
        Self {
            text: text.into(),
            value,
            corresponding_count,
            last_mid,
            data,
            actions: vec![],
        }
    }

    /// 1つのエントリからなる候補を作成します。
    pub fn from_element(data: DicdataElement) -> Self {
        Self::new(
            data.word.clone(),
            data.value(),
            data.ruby_len(),
            data.mid,
            vec![data],
        )
    }

    /// 構成するエントリの読みを連結したもの
    pub fn ruby(&self) -> String {
        self.data.iter().map(|d| d.ruby.as_str()).collect()
    }

    /// 表層形から決まる確定時の操作を設定します。
    pub fn with_appropriate_actions(mut self) -> Self {
        self.actions = appropriate_actions(&self.text);
        self
    }

    /// エントリ列の最初の文節だけからなる候補を作成します。スコアは-5で固定です。
    pub fn prefix_clause(data: &[DicdataElement]) -> Self {
        let mut text = String::new();
        let mut count = 0;
        let mut last_rcid = cid::BOS;
        let mut last_mid = mid::GENERAL;
        let mut taken = vec![];
        for d in data {
            if is_clause(last_rcid, d.lcid) {
                break;
            }
            text.push_str(&d.word);
            count += d.ruby_len();
            last_rcid = d.rcid;
            if d.mid != mid::EOS && include_mm_value_calculation(d.lcid, d.rcid) {
                last_mid = d.mid;
            }
            taken.push(d.clone());
        }
        Self::new(text, -5.0, count, last_mid, taken)
    }
}

/// 括弧の組などを確定したとき、カーソルを内側へ戻す操作を返します。
pub fn appropriate_actions(text: &str) -> Vec<CompleteAction> {
    const PAIRS: &[&str] = &[
        "[]", "()", "｛｝", "〈〉", "〔〕", "（）", "「」", "『』", "【】", "{}", "<>", "《》", "\"\"",
        "''", "””",
    ];
    if PAIRS.contains(&text) {
        return vec![CompleteAction::MoveCursor(-1)];
    }
    if text == "{{}}" {
        return vec![CompleteAction::MoveCursor(-2)];
    }
    vec![]
}

/// 表層形の重複を除きます。
///
/// 空の候補と`seen`に含まれる候補は除かれます。重複した候補はスコアが高いか、
/// 対応する入力が長い方で置き換えられ、位置は最初に現れた位置のままです。
pub fn unique_candidates<I>(candidates: I, seen: &HashSet<String>) -> Vec<Candidate>
where
    I: IntoIterator<Item = Candidate>,
{
    let mut result: Vec<Candidate> = vec![];
    let mut index: HashMap<String, usize> = HashMap::new();
    for candidate in candidates {
        if candidate.text.is_empty() || seen.contains(&candidate.text) {
            continue;
        }
        match index.get(&candidate.text) {
            Some(&i) => {
                let current = &result[i];
                if current.value < candidate.value
                    || current.corresponding_count < candidate.corresponding_count
                {
                    result[i] = candidate;
                }
            }
            None => {
                index.insert(candidate.text.clone(), result.len());
                result.push(candidate);
            }
        }
    }
    result
}

/// スコアの降順に並べ、上位`n`件を返します。
pub fn top_candidates(mut candidates: Vec<Candidate>, n: usize) -> Vec<Candidate> {
    candidates.sort_by(|a, b| b.value.total_cmp(&a.value));
    candidates.truncate(n);
    candidates
}

/// 確定後予測候補の種類
#[derive(Clone, Debug, PartialEq)]
pub enum PredictionKind {
    /// 確定した候補の後ろにエントリを追加する。
    Additional(Vec<DicdataElement>),
    /// 確定した候補の末尾のエントリ`target`を`replacement`で置き換える。
    Replacement {
        target: Vec<DicdataElement>,
        replacement: Vec<DicdataElement>,
    },
}

/// 確定後予測候補
#[derive(Clone, Debug, PartialEq)]
pub struct PostCompositionPredictionCandidate {
    /// 追加で入力される文字列
    pub text: String,
    pub value: PValue,
    pub kind: PredictionKind,
    /// 句点など、確定後予測を続けるべきでない候補かどうか。
    pub is_terminal: bool,
}

impl PostCompositionPredictionCandidate {
    pub fn new<S: Into<String>>(text: S, value: PValue, kind: PredictionKind) -> Self {
        let text = text.into();
        let is_terminal = matches!(text.as_str(), "。" | "." | "．");
        Self {
            text,
            value,
            kind,
            is_terminal,
        }
    }

    /// 確定した候補`candidate`にこの予測を適用した候補を返します。
    pub fn join(&self, candidate: &Candidate) -> Candidate {
        let mut candidate = candidate.clone();
        let last_content_mid = |data: &[DicdataElement]| {
            data.iter()
                .rev()
                .find(|d| include_mm_value_calculation(d.lcid, d.rcid))
                .map(|d| d.mid)
        };
        match &self.kind {
            PredictionKind::Additional(data) => {
                for d in data {
                    candidate.text.push_str(&d.word);
                    candidate.data.push(d.clone());
                }
                candidate.last_mid = last_content_mid(data).unwrap_or(candidate.last_mid);
            }
            PredictionKind::Replacement {
                target,
                replacement,
            } => {
                let keep = candidate.data.len().saturating_sub(target.len());
                candidate.data.truncate(keep);
                candidate.data.extend_from_slice(replacement);
                candidate.text = candidate.data.iter().map(|d| d.word.as_str()).collect();
                candidate.last_mid = last_content_mid(&candidate.data).unwrap_or(mid::BOS);
            }
        }
        candidate.value = self.value;
        candidate.corresponding_count = candidate.data.iter().map(DicdataElement::ruby_len).sum();
        candidate
    }

    /// 予測によって最後に置かれるエントリ
    pub fn last_data(&self) -> Option<&DicdataElement> {
        match &self.kind {
            PredictionKind::Additional(data) => data.last(),
            PredictionKind::Replacement { replacement, .. } => replacement.last(),
        }
    }
}

/// 確定後予測候補の表層形の重複を除き、スコアの高い方を残します。
pub fn unique_predictions<I>(
    candidates: I,
    seen: &HashSet<String>,
) -> Vec<PostCompositionPredictionCandidate>
where
    I: IntoIterator<Item = PostCompositionPredictionCandidate>,
{
    let mut result: Vec<PostCompositionPredictionCandidate> = vec![];
    for candidate in candidates {
        if candidate.text.is_empty() || seen.contains(&candidate.text) {
            continue;
        }
        match result.iter().position(|c| c.text == candidate.text) {
            Some(i) => {
                if result[i].value < candidate.value {
                    result[i] = candidate;
                }
            }
            None => result.push(candidate),
        }
    }
    result
}
