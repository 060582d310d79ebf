//! 変換セッション
//!
//! 前回の入力とラティス、確定された候補を保持し、入力の変化に応じてラティスを
//! 再利用しながら変換候補を作成します。

use hashbrown::HashSet;

use crate::candidate::{
    top_candidates, unique_candidates, Candidate, CandidateData, PostCompositionPredictionCandidate,
};
use crate::common::{cid, mid, PValue};
use crate::config::ConvertRequestOptions;
use crate::dictionary::{DicdataElement, DicdataStore, Notification};
use crate::input::{ComposingInput, ComposingText};
use crate::kana2kanji::{
    best_predictions, CancellationToken, DecodeOutcome, Kana2Kanji, Lattice, Strategy,
};
use crate::utils::{to_full_width_roman, to_half_width_kana, to_hiragana, to_katakana};

/// 文全体の候補から上位に混ぜる件数
const SENTENCE_LIMIT: usize = 10;
/// 先頭に並べる候補数
const TOP_LIMIT: usize = 5;
/// 入力中の予測候補の件数
const PREDICTION_LIMIT: usize = 3;
/// 入力中の予測で1回の検索ごとに残す候補数
const PREDICTION_N_BEST: usize = 5;

/// 変換結果
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ConversionResult {
    /// 提示する候補。文全体、文節、単語の順に並ぶ。
    pub main_results: Vec<Candidate>,
    /// 先頭の文節だけを変換した候補
    pub first_clause_results: Vec<Candidate>,
}

/// カタカナ語らしさ。小さいほどカタカナ語らしい。
fn katakana_score(katakana: &str) -> PValue {
    katakana.chars().fold(1.0, |score, c| {
        if "プヴペィフ".contains(c) {
            score * 0.5
        } else if "ュピポ".contains(c) {
            score * 0.6
        } else if "パォグーム".contains(c) {
            score * 0.7
        } else {
            score
        }
    })
}

/// かな漢字変換のセッション。
///
/// 1つの入力欄に対して1つ作成し、キー入力のたびに[`KanaKanjiConverter::request_candidates`]を
/// 呼びます。
///
/// # 例
///
/// ```
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// use kanakanji::common::{cid, mid};
/// use kanakanji::dictionary::{DicdataElement, DicdataStore, DictionaryBuilder};
/// use kanakanji::{ComposingText, ConvertRequestOptions, KanaKanjiConverter};
///
/// let mut builder = DictionaryBuilder::new();
/// builder
///     .add_entry(DicdataElement::with_cid("鹿", "シカ", cid::GENERAL_NOUN, mid::GENERAL, -6.0))
///     .set_connection(cid::BOS, cid::GENERAL_NOUN, -1.0)
///     .set_connection(cid::GENERAL_NOUN, cid::EOS, -1.0);
/// let options = ConvertRequestOptions::default();
/// let store = DicdataStore::with_provider(options.clone(), builder.into_provider()?);
///
/// let mut converter = KanaKanjiConverter::with_store(store);
/// let result = converter.request_candidates(&ComposingText::new("しか"), &options);
/// assert_eq!(result.main_results[0].text, "鹿");
/// # Ok(())
/// # }
/// ```
pub struct KanaKanjiConverter {
    kana2kanji: Kana2Kanji,
    previous_input: Option<ComposingText>,
    lattice: Option<Lattice>,
    completed: Option<Candidate>,
    last_data: Option<DicdataElement>,
}

impl KanaKanjiConverter {
    /// 設定されたディレクトリの辞書を使うセッションを作成します。
    pub fn new(options: ConvertRequestOptions) -> Self {
        Self::with_store(DicdataStore::new(options))
    }

    pub fn with_store(store: DicdataStore) -> Self {
        Self {
            kana2kanji: Kana2Kanji::new(store),
            previous_input: None,
            lattice: None,
            completed: None,
            last_data: None,
        }
    }

    pub fn store(&self) -> &DicdataStore {
        self.kana2kanji.store()
    }

    /// 前回の変換で構築したラティス
    pub fn lattice(&self) -> Option<&Lattice> {
        self.lattice.as_ref()
    }

    /// 変換の状態を破棄します。
    pub fn stop_composition(&mut self) {
        self.previous_input = None;
        self.lattice = None;
        self.completed = None;
        self.last_data = None;
    }

    /// 辞書ストアへ通知を送ります。
    pub fn send_to_dicdata_store(&mut self, notification: Notification) {
        self.kana2kanji.store_mut().send(notification);
    }

    /// 先頭の文節が確定されたことを記録します。次の変換は確定後の構築方法を使います。
    pub fn set_completed_data(&mut self, candidate: Candidate) {
        self.completed = Some(candidate);
    }

    /// 確定された候補を学習します。
    pub fn update_learning_data(&mut self, candidate: &Candidate) {
        self.kana2kanji
            .store
            .update_learning(candidate, self.last_data.as_ref());
        self.last_data = candidate.data.last().cloned();
    }

    /// 確定後の予測候補が選ばれたとき、それを学習します。
    pub fn update_learning_data_with_prediction(
        &mut self,
        candidate: &Candidate,
        prediction: &PostCompositionPredictionCandidate,
    ) {
        self.kana2kanji
            .store
            .update_learning_with_prediction(candidate, prediction);
        self.last_data = prediction.last_data().cloned();
    }

    /// 連続する2つの候補を連結します。
    pub fn merge_candidates(&mut self, left: &Candidate, right: &Candidate) -> Candidate {
        self.kana2kanji.merge_candidates(left, right)
    }

    /// 確定された候補に続く予測候補を返します。
    pub fn request_post_composition_prediction_candidates(
        &mut self,
        candidate: &Candidate,
        options: &ConvertRequestOptions,
    ) -> Vec<PostCompositionPredictionCandidate> {
        if !options.require_japanese_prediction {
            return vec![];
        }
        self.kana2kanji.post_composition_predictions(candidate)
    }

    /// 入力に対する変換候補を返します。
    pub fn request_candidates(
        &mut self,
        input: &ComposingText,
        options: &ConvertRequestOptions,
    ) -> ConversionResult {
        self.request_candidates_cancellable(input, options, &CancellationToken::new())
            .unwrap_or_default()
    }

    /// 取り消し可能な変換を行います。
    ///
    /// 確定直後の変換が`token`によって取り消された場合は`None`を返し、セッションの状態は
    /// 前回の変換のまま変わりません。
    pub fn request_candidates_cancellable(
        &mut self,
        input: &ComposingText,
        options: &ConvertRequestOptions,
        token: &CancellationToken,
    ) -> Option<ConversionResult> {
        if input.is_empty() {
            return Some(ConversionResult::default());
        }
        self.send_to_dicdata_store(Notification::SetRequestOptions(options.clone()));

        let strategy = Strategy::select(
            self.previous_input.as_ref(),
            input,
            self.completed.is_some(),
        );
        let previous = self.lattice.take();
        let outcome = self.kana2kanji.convert(
            input,
            strategy,
            previous,
            self.completed.as_ref(),
            options.n_best,
            token,
        );
        let lattice = match outcome {
            DecodeOutcome::Completed(lattice) => lattice,
            DecodeOutcome::Cancelled(previous) => {
                self.lattice = Some(previous);
                return None;
            }
        };
        let result = self.process_result(input, &lattice, options);
        self.previous_input = Some(input.clone());
        self.lattice = Some(lattice);
        if strategy == Strategy::AfterComplete {
            self.completed = None;
        }
        Some(result)
    }

    /// 入力全体をひとまとまりにした候補
    fn additional_candidates(
        input: &ComposingText,
        options: &ConvertRequestOptions,
    ) -> Vec<Candidate> {
        let katakana = to_katakana(&input.convert_target());
        let count = input.len();
        let make = |word: String, data_value: PValue, value: PValue| {
            let data = DicdataElement::with_cid(
                word.clone(),
                katakana.clone(),
                cid::PROPER_NOUN,
                mid::GENERAL,
                data_value,
            );
            Candidate::new(word, value, count, mid::GENERAL, vec![data])
        };

        let value = -14.0 * katakana_score(&katakana);
        let mut candidates = vec![
            make(katakana.clone(), value, value),
            make(to_hiragana(&katakana), -14.5, -14.5),
            make(katakana.to_uppercase(), -15.0, -14.6),
        ];
        if options.full_width_roman_candidate {
            candidates.push(make(to_full_width_roman(&katakana), -15.0, -14.7));
        }
        if options.half_width_kana_candidate {
            candidates.push(make(to_half_width_kana(&katakana), -15.0, -15.0));
        }
        candidates
    }

    /// ラティスから候補を並べます。
    fn process_result(
        &mut self,
        input: &ComposingText,
        lattice: &Lattice,
        options: &ConvertRequestOptions,
    ) -> ConversionResult {
        let no_seen = HashSet::new();
        let clause_results: Vec<CandidateData> = lattice
            .eos()
            .prevs
            .iter()
            .map(|&id| lattice.candidate_data(id))
            .filter(|data| !data.is_empty())
            .collect();
        if clause_results.is_empty() {
            let candidates = unique_candidates(Self::additional_candidates(input, options), &no_seen);
            return ConversionResult {
                main_results: candidates.clone(),
                first_clause_results: candidates,
            };
        }

        let clause_candidates: Vec<Candidate> = clause_results
            .iter()
            .filter_map(CandidateData::first_clause_candidate)
            .collect();
        let sums: Vec<(&CandidateData, Candidate)> = clause_results
            .iter()
            .map(|data| (data, self.kana2kanji.process_clause_candidate(data)))
            .collect();
        let whole = unique_candidates(sums.iter().map(|(_, c)| c.clone()), &no_seen);
        let sentences = top_candidates(whole.clone(), SENTENCE_LIMIT);

        let predictions = match sums
            .iter()
            .max_by(|a, b| a.1.value.total_cmp(&b.1.value))
        {
            Some((best, _)) if options.require_japanese_prediction => best_predictions(
                self.kana2kanji
                    .prediction_candidates(input, best, PREDICTION_N_BEST),
                PREDICTION_LIMIT,
            ),
            _ => vec![],
        };

        let best = unique_candidates(
            sentences.iter().take(TOP_LIMIT).cloned().chain(predictions),
            &no_seen,
        );
        let mut result = top_candidates(best, TOP_LIMIT);
        let mut seen: HashSet<String> = result.iter().map(|c| c.text.clone()).collect();

        let clauses = top_candidates(unique_candidates(clause_candidates, &seen), TOP_LIMIT);
        seen.extend(clauses.iter().map(|c| c.text.clone()));

        let words = lattice.nodes().first().into_iter().flatten().map(|node| {
            Candidate::new(
                node.data.word.clone(),
                node.data.value(),
                node.range.len(),
                node.data.mid,
                vec![node.data.clone()],
            )
        });
        let mut words = unique_candidates(
            words.chain(Self::additional_candidates(input, options)),
            &seen,
        );
        words.sort_by(|a, b| {
            b.corresponding_count
                .cmp(&a.corresponding_count)
                .then_with(|| b.value.total_cmp(&a.value))
        });

        // At least one of the first three candidates reads exactly as typed.
        let target = to_katakana(&input.convert_target());
        let exact = |c: &Candidate| c.ruby() == target;
        if !result.iter().take(3).any(exact) {
            let position = result.len().min(2);
            if let Some(i) = result.iter().skip(3).position(exact) {
                let candidate = result.remove(i + 3);
                result.insert(position, candidate);
            } else if let Some(candidate) = sentences
                .iter()
                .find(|&c| exact(c))
                .or_else(|| whole.iter().find(|&c| exact(c)))
            {
                result.insert(position, candidate.clone());
            }
        }

        result.extend(clauses.iter().cloned());
        result.extend(words);
        ConversionResult {
            main_results: result
                .into_iter()
                .map(Candidate::with_appropriate_actions)
                .collect(),
            first_clause_results: clauses,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::test_utils::mock_store;

    fn texts(result: &ConversionResult) -> Vec<&str> {
        result.main_results.iter().map(|c| c.text.as_str()).collect()
    }

    #[test]
    fn test_katakana_score() {
        assert_eq!(katakana_score("シカ"), 1.0);
        assert_eq!(katakana_score("プ"), 0.5);
        assert!((katakana_score("パーム") - 0.343).abs() < 1e-4);
    }

    #[test]
    fn test_empty_input() {
        let mut converter = KanaKanjiConverter::with_store(mock_store());
        let result =
            converter.request_candidates(&ComposingText::new(""), &ConvertRequestOptions::default());
        assert!(result.main_results.is_empty());
        assert!(result.first_clause_results.is_empty());
        assert!(converter.lattice().is_none());
    }

    #[test]
    fn test_request_candidates() {
        let mut converter = KanaKanjiConverter::with_store(mock_store());
        let options = ConvertRequestOptions::default();
        let result = converter.request_candidates(&ComposingText::new("しか"), &options);
        let texts = texts(&result);
        assert_eq!(texts[0], "鹿");
        assert!(texts.contains(&"歯科"));
        assert!(texts.contains(&"シカ"));
        assert!(texts.contains(&"しか"));
        let unique: HashSet<&str> = texts.iter().copied().collect();
        assert_eq!(unique.len(), texts.len());
        assert_eq!(converter.lattice().map(Lattice::len), Some(2));
    }

    #[test]
    fn test_additional_candidates() {
        let options = ConvertRequestOptions::default()
            .full_width_roman_candidate(true)
            .half_width_kana_candidate(true);
        let candidates =
            KanaKanjiConverter::additional_candidates(&ComposingText::new("ぷりん"), &options);
        let katakana = &candidates[0];
        assert_eq!(katakana.text, "プリン");
        assert_eq!(katakana.value, -7.0);
        assert_eq!(candidates[1].text, "ぷりん");
        assert_eq!(candidates[1].value, -14.5);
        assert_eq!(candidates[4].text, "ﾌﾟﾘﾝ");
        assert!(candidates.iter().all(|c| c.corresponding_count == 3));
        assert!(candidates.iter().all(|c| c.ruby() == "プリン"));
    }

    #[test]
    fn test_without_prediction() {
        let mut converter = KanaKanjiConverter::with_store(mock_store());
        let options = ConvertRequestOptions::default().require_japanese_prediction(false);
        let result = converter.request_candidates(&ComposingText::new("しか"), &options);
        assert!(!texts(&result).contains(&"歯科医"));
        let candidate = Candidate::from_element(crate::test_utils::noun("歯科", "シカ", -8.0));
        assert!(converter
            .request_post_composition_prediction_candidates(&candidate, &options)
            .is_empty());
    }

    #[test]
    fn test_prediction_in_results() {
        let mut converter = KanaKanjiConverter::with_store(mock_store());
        let options = ConvertRequestOptions::default();
        let result = converter.request_candidates(&ComposingText::new("しか"), &options);
        assert!(texts(&result).contains(&"歯科医"));
    }

    #[test]
    fn test_commit_and_continue() {
        let mut converter = KanaKanjiConverter::with_store(mock_store());
        let options = ConvertRequestOptions::default();
        let mut input = ComposingText::new("しかい");
        let result = converter.request_candidates(&input, &options);
        let first = result
            .main_results
            .iter()
            .find(|c| c.text == "鹿")
            .cloned()
            .unwrap();
        converter.update_learning_data(&first);
        converter.set_completed_data(first);
        input.prefix_complete(2);

        let result = converter.request_candidates(&input, &options);
        assert!(texts(&result).contains(&"い"));
        assert!(result.main_results.iter().all(|c| c.corresponding_count <= 1));
        assert_eq!(converter.lattice().map(Lattice::len), Some(1));
        assert!(converter.completed.is_none());
    }

    #[test]
    fn test_cancelled_request_keeps_state() {
        let mut converter = KanaKanjiConverter::with_store(mock_store());
        let options = ConvertRequestOptions::default();
        let mut input = ComposingText::new("しかい");
        converter.request_candidates(&input, &options);
        let completed = Candidate::from_element(crate::test_utils::noun("鹿", "シカ", -6.0));
        converter.set_completed_data(completed);
        input.prefix_complete(2);

        let token = CancellationToken::new();
        token.cancel();
        assert!(converter
            .request_candidates_cancellable(&input, &options, &token)
            .is_none());
        assert_eq!(converter.lattice().map(Lattice::len), Some(3));
        assert_eq!(converter.previous_input, Some(ComposingText::new("しかい")));
        assert!(converter.completed.is_some());

        // A later request without cancellation picks the commit up again.
        let result = converter.request_candidates(&input, &options);
        assert!(!result.main_results.is_empty());
        assert_eq!(converter.lattice().map(Lattice::len), Some(1));
    }

    #[test]
    fn test_stop_composition() {
        let mut converter = KanaKanjiConverter::with_store(mock_store());
        let options = ConvertRequestOptions::default();
        converter.request_candidates(&ComposingText::new("しか"), &options);
        converter.stop_composition();
        assert!(converter.lattice().is_none());
        assert!(converter.previous_input.is_none());
    }
}
