//! 予測変換
//!
//! 入力中の予測（最良パスの末尾の文節を読みの前方一致で補完する）と、
//! 確定後の予測（確定した候補に続く語、または末尾の語を置き換える語を提示する）を扱います。

use hashbrown::HashSet;

use crate::candidate::{
    top_candidates, unique_candidates, unique_predictions, Candidate, CandidateData, ClauseDataUnit,
    PostCompositionPredictionCandidate, PredictionKind,
};
use crate::common::{cid, include_mm_value_calculation, mid, prediction_usable, PValue};
use crate::dictionary::DicdataElement;
use crate::input::ComposingInput;
use crate::kana2kanji::Kana2Kanji;
use crate::utils::to_katakana;

/// 読みが1文字長くなるごとのペナルティ
const EXTRA_RUBY_PENALTY: PValue = -3.0;

/// 確定後予測の候補数
const POST_COMPOSITION_LIMIT: usize = 10;

/// 確定後予測で提示する助詞の数の上限
const PARTICLE_LIMIT: usize = 3;

/// スコアの降順を保ったまま`item`を挿入します。`n`件を超える分は捨てます。
fn insert_ranked<T>(result: &mut Vec<T>, item: T, value: PValue, n: usize, key: impl Fn(&T) -> PValue) {
    let position = result
        .iter()
        .rposition(|r| key(r) >= value)
        .map_or(0, |i| i + 1);
    if position >= n {
        return;
    }
    if result.len() >= n {
        result.pop();
    }
    result.insert(position, item);
}

impl Kana2Kanji {
    /// 最良パスの末尾の文節を補完する予測候補を返します。
    ///
    /// 末尾の文節を1つずつ取り除き、取り除いた部分の読みで前方一致検索を行います。
    /// 候補が得られた回数が2回になるか、文節がなくなるまで続けます。
    ///
    /// # 引数
    ///
    /// * `input` - 入力
    /// * `best` - 入力全体に対する最良パスの文節
    /// * `n_best` - 1回の検索で残す候補数
    pub fn prediction_candidates<C>(
        &mut self,
        input: &C,
        best: &CandidateData,
        n_best: usize,
    ) -> Vec<Candidate>
    where
        C: ComposingInput + ?Sized,
    {
        let mut result = vec![];
        let mut prepart = best.clone();
        let mut last: Option<ClauseDataUnit> = None;
        let mut found = 0;
        while found < 2 {
            let Some((mut unit, _)) = prepart.clauses.pop() else {
                break;
            };
            if let Some(old) = &last {
                unit.merge(old);
            }
            let predictions = self.clause_predictions(input, &prepart, &unit, n_best);
            last = Some(unit);
            if !predictions.is_empty() {
                result.extend(predictions);
                found += 1;
            }
        }
        result
    }

    /// 文節列`prepart`の後ろに、読みが`last_clause`の読みで始まる語を続けた候補を返します。
    fn clause_predictions<C>(
        &mut self,
        input: &C,
        prepart: &CandidateData,
        last_clause: &ClauseDataUnit,
        n_best: usize,
    ) -> Vec<Candidate>
    where
        C: ComposingInput + ?Sized,
    {
        let chars = input.input();
        let Some(window) = chars.get(last_clause.range.clone()) else {
            return vec![];
        };
        let last_ruby = to_katakana(&window.iter().collect::<String>());
        let last_ruby_len = last_ruby.chars().count();
        if last_ruby_len == 0 {
            return vec![];
        }

        let data = prepart.clause_data().to_vec();
        let prefix = if prepart.is_empty() {
            Candidate::new("", 0.0, 0, mid::EOS, vec![])
        } else {
            self.process_clause_candidate(prepart)
        };
        let last_rcid = data.last().map_or(cid::BOS, |d| d.rcid);
        let next_lcid = prepart
            .clauses
            .last()
            .map_or(cid::EOS, |(c, _)| c.next_lcid);
        let ignored_cc = self.store.cc_value(last_rcid, next_lcid);

        let mut entries = self.store.prediction_entries(&last_ruby);
        entries.extend(self.store.dynamic_prefix(&last_ruby));

        let mut result: Vec<Candidate> = vec![];
        for entry in entries {
            let include_mm = include_mm_value_calculation(entry.lcid, entry.rcid);
            let mm = if include_mm {
                self.store.mm_value(prefix.last_mid, entry.mid)
            } else {
                0.0
            };
            let cc = self.store.cc_value(last_rcid, entry.lcid);
            let extra = entry.ruby_len().saturating_sub(last_ruby_len) as PValue;
            let value = prefix.value + mm + cc + entry.value() + EXTRA_RUBY_PENALTY * extra
                - ignored_cc;
            let last_mid = if include_mm { entry.mid } else { prefix.last_mid };
            let mut path = data.clone();
            let text = format!("{}{}", prefix.text, entry.word);
            path.push(entry);
            let candidate = Candidate::new(text, value, chars.len(), last_mid, path);
            insert_ranked(&mut result, candidate, value, n_best, |c| c.value);
        }
        result
    }

    /// 確定した候補に続きやすい語を返します。
    pub fn zero_hint_predictions(
        &mut self,
        candidate: &Candidate,
        n_best: usize,
    ) -> Vec<PostCompositionPredictionCandidate> {
        let Some(last) = candidate.data.last() else {
            return vec![];
        };
        let mut result = vec![];
        for entry in self.store.zero_hint_entries(last.rcid) {
            let cc = self.store.cc_value(last.rcid, entry.lcid);
            let mm = if include_mm_value_calculation(entry.lcid, entry.rcid) {
                self.store.mm_value(candidate.last_mid, entry.mid)
            } else {
                0.0
            };
            let value = candidate.value + mm + cc + entry.value();
            let prediction = PostCompositionPredictionCandidate::new(
                entry.word.clone(),
                value,
                PredictionKind::Additional(vec![entry]),
            );
            insert_ranked(&mut result, prediction, value, n_best, |p| p.value);
        }
        result
    }

    /// 確定した候補の末尾の語（最大3語）を、より長い語で置き換える予測を返します。
    ///
    /// 候補の表層形は、置き換えられる語の表層形に続く部分です。
    pub fn replacement_predictions(
        &mut self,
        candidate: &Candidate,
        n_best: usize,
    ) -> Vec<PostCompositionPredictionCandidate> {
        let mut result = vec![];
        let mut prefix = candidate.clone();
        prefix.actions.clear();
        let mut remaining = candidate.data.clone();
        let mut total_word = String::new();
        let mut total_ruby = String::new();
        let mut target: Vec<DicdataElement> = vec![];
        for _ in 0..candidate.data.len().min(3) {
            let Some(element) = remaining.pop() else {
                break;
            };
            let previous_rcid = remaining.last().map_or(cid::BOS, |d| d.rcid);
            prefix.value -= element.value();
            prefix.value -= self.store.cc_value(previous_rcid, element.lcid);
            if include_mm_value_calculation(element.lcid, element.rcid) {
                let previous_mid = remaining
                    .iter()
                    .rev()
                    .find(|d| include_mm_value_calculation(d.lcid, d.rcid))
                    .map_or(mid::BOS, |d| d.mid);
                prefix.last_mid = previous_mid;
                prefix.value -= self.store.mm_value(previous_mid, element.mid);
            }

            total_word.insert_str(0, &element.word);
            total_ruby.insert_str(0, &element.ruby);
            target.insert(0, element);
            let entries: Vec<DicdataElement> = self
                .store
                .prediction_entries(&total_ruby)
                .into_iter()
                .filter(|d| prediction_usable(d.rcid))
                .filter(|d| d.word.starts_with(&total_word))
                .collect();
            for entry in entries {
                let cc = self.store.cc_value(previous_rcid, entry.lcid);
                let mm = if include_mm_value_calculation(entry.lcid, entry.rcid) {
                    self.store.mm_value(prefix.last_mid, entry.mid)
                } else {
                    0.0
                };
                let value = prefix.value + mm + cc + entry.value();
                let text = entry.word[total_word.len()..].to_string();
                let prediction = PostCompositionPredictionCandidate::new(
                    text,
                    value,
                    PredictionKind::Replacement {
                        target: target.clone(),
                        replacement: vec![entry],
                    },
                );
                insert_ranked(&mut result, prediction, value, n_best, |p| p.value);
            }
        }
        result
    }

    /// 確定した候補に対する確定後予測を最大10件返します。
    ///
    /// 続く語の予測のうち助詞は3件までとし、置き換えの予測を優先して並べます。
    pub fn post_composition_predictions(
        &mut self,
        candidate: &Candidate,
    ) -> Vec<PostCompositionPredictionCandidate> {
        let zero_hints = unique_predictions(
            self.zero_hint_predictions(candidate, 15),
            &HashSet::new(),
        );
        let mut particles = 0;
        let zero_hints: Vec<PostCompositionPredictionCandidate> = zero_hints
            .into_iter()
            .filter(|p| match &p.kind {
                PredictionKind::Additional(data) => {
                    let rcid = data.last().map_or(cid::EOS, |d| d.rcid);
                    if cid::is_particle(rcid) {
                        particles += 1;
                        particles <= PARTICLE_LIMIT
                    } else {
                        true
                    }
                }
                PredictionKind::Replacement { .. } => true,
            })
            .collect();
        let replacements = self.replacement_predictions(candidate, 15);

        let count = (POST_COMPOSITION_LIMIT / 2)
            .max(POST_COMPOSITION_LIMIT.saturating_sub(zero_hints.len()));
        let mut seen = HashSet::new();
        let mut result = top_predictions(unique_predictions(replacements, &seen), count);
        seen.extend(result.iter().map(|p| p.text.clone()));
        let rest = POST_COMPOSITION_LIMIT.saturating_sub(result.len());
        result.extend(top_predictions(unique_predictions(zero_hints, &seen), rest));
        result
    }
}

fn top_predictions(
    mut predictions: Vec<PostCompositionPredictionCandidate>,
    n: usize,
) -> Vec<PostCompositionPredictionCandidate> {
    predictions.sort_by(|a, b| b.value.total_cmp(&a.value));
    predictions.truncate(n);
    predictions
}

/// 入力中の予測候補のうち上位`n`件を、表層形の重複を除いて返します。
pub(crate) fn best_predictions(predictions: Vec<Candidate>, n: usize) -> Vec<Candidate> {
    let unique = unique_candidates(predictions, &HashSet::new());
    top_candidates(unique, n)
}
