//! 辞書にない補足的なエントリの生成
//!
//! 数詞の読み、数字、英単語、1文字のかな、記号の全角・半角や関連記号を扱います。

use std::ops::Range;
use std::sync::OnceLock;

use hashbrown::HashMap;

use crate::common::{cid, mid, PValue};
use crate::config::KeyboardLanguage;
use crate::dictionary::element::DicdataElement;
use crate::dictionary::number::japanese_number;
use crate::utils::{is_roman_alphabet_only, to_kansuji, to_katakana};

const FULL_WIDTH_SYMBOLS: &str = "＋ー＊＝・！＃％＆＇＂〜｜￡＄￥＠｀；：＜＞，．＼／＿￣－";
const HALF_WIDTH_SYMBOLS: &str = "+ｰ*=･!#%&'\"〜|£$¥@`;:<>,.\\/_¯-";

/// 絶対値がこれ以下の整数に漢数字表記を加える。
const KANSUJI_LIMIT: i64 = 1_000_000_000_000;

/// 弱い関連のある記号のグループ。1つを入力すると他が候補になる。
const WEAK_RELATING_SYMBOL_GROUPS: &[&[&str]] = &[
    // 異体字
    &["高", "髙"],
    &["斎", "斉", "齋", "齊"],
    &["澤", "沢"],
    &["気", "氣"],
    &["澁", "渋"],
    &["対", "對"],
    &["辻", "辻󠄀"],
    &["禰󠄀", "禰"],
    &["煉󠄁", "煉"],
    &["崎", "﨑"],
    &["栄", "榮"],
    &["吉", "𠮷"],
    &["橋", "𣘺", "槗", "𫞎"],
    &["浜", "濱", "濵"],
    &["鴎", "鷗"],
    &["学", "學"],
    &["角", "⻆"],
    &["亀", "龜"],
    &["桜", "櫻"],
    &["真", "眞"],
    // 記号
    &["☆", "★", "♡", "☾", "☽"],
    &["^", "＾"],
    &["¥", "$", "¢", "€", "£", "₿"],
    &["%", "‰"],
    &["°", "℃", "℉"],
    &["◯"],
    &["*", "※", "✳︎", "✴︎"],
    &["・", "…", "‥", "•"],
    &["+", "±", "⊕"],
    &["×", "❌", "✖️"],
    &["÷", "➗"],
    &["<", "≦", "≪", "〈", "《", "‹", "«"],
    &[">", "≧", "≫", "〉", "》", "›", "»"],
    &["=", "≒", "≠", "≡"],
    &[":", ";"],
    &["!", "❗️", "❣️", "‼︎", "⁉︎", "❕", "‼️", "⁉️", "¡"],
    &["?", "❓", "⁉︎", "⁇", "❔", "⁉️", "¿"],
    &["〒", "〠", "℡", "☎︎"],
    &["々", "ヾ", "ヽ", "ゝ", "ゞ", "〃", "仝", "〻"],
    &["〆", "〼", "ゟ", "ヿ"],
    &["♂", "♀", "⚢", "⚣", "⚤", "⚥", "⚦", "⚧", "⚨", "⚩", "⚪︎", "⚲"],
    &["→", "↑", "←", "↓", "↙︎", "↖︎", "↘︎", "↗︎", "↔︎", "↕︎", "↪︎", "↩︎", "⇆"],
    &["♯", "♭", "♪", "♮", "♫", "♬", "♩", "𝄞", "𝄞"],
    &["√", "∛", "∜"],
];

struct WidthTables {
    to_half: HashMap<char, char>,
    to_full: HashMap<char, char>,
}

fn width_tables() -> &'static WidthTables {
    static TABLES: OnceLock<WidthTables> = OnceLock::new();
    TABLES.get_or_init(|| {
        let mut to_half = HashMap::new();
        let mut to_full = HashMap::new();
        for (full, half) in FULL_WIDTH_SYMBOLS.chars().zip(HALF_WIDTH_SYMBOLS.chars()) {
            to_half.insert(full, half);
            to_full.insert(half, full);
        }
        WidthTables { to_half, to_full }
    })
}

fn symbol_entries(target: &str, first: char, result: &mut Vec<DicdataElement>) {
    let tables = width_tables();
    let mut value: PValue = -14.0;
    let mut push = |word: String, result: &mut Vec<DicdataElement>| {
        result.push(DicdataElement::with_cid(
            word,
            target,
            cid::SYMBOL,
            mid::GENERAL,
            value,
        ));
        value -= 5.0;
    };
    let half = tables.to_half.get(&first).copied().unwrap_or(first);
    if half != first {
        push(target.to_string(), result);
        push(half.to_string(), result);
    }
    if let Some(&full) = tables.to_full.get(&first) {
        if full != first {
            push(target.to_string(), result);
            push(full.to_string(), result);
        }
    }
    let mut buf = [0; 4];
    let half_str: &str = half.encode_utf8(&mut buf);
    for group in WEAK_RELATING_SYMBOL_GROUPS
        .iter()
        .filter(|group| group.contains(&half_str))
    {
        for &symbol in group.iter().filter(|&&s| s != half_str) {
            push(symbol.to_string(), result);
            let mut chars = symbol.chars();
            if let (Some(c), None) = (chars.next(), chars.next()) {
                if let Some(&full) = tables.to_full.get(&c) {
                    push(full.to_string(), result);
                }
            }
        }
    }
}

/// 入力の区間`range`に対する補足的なエントリを生成します。
///
/// # 引数
///
/// * `input` - 入力全体
/// * `range` - 区間（文字単位、終端を含まない）
/// * `language` - キーボードの言語
pub fn wise_entries(
    input: &[char],
    range: Range<usize>,
    language: KeyboardLanguage,
) -> Vec<DicdataElement> {
    let Some(window) = input.get(range.clone()) else {
        return vec![];
    };
    let target = to_katakana(&window.iter().collect::<String>());
    let mut result = vec![];

    if let Some((kanji, arabic)) = japanese_number(&target) {
        result.push(DicdataElement::with_cid(
            kanji,
            target.as_str(),
            cid::NUMBER,
            mid::NUMBER,
            -14.0,
        ));
        result.push(DicdataElement::with_cid(
            arabic,
            target.as_str(),
            cid::NUMBER,
            mid::NUMBER,
            -14.0,
        ));
    }

    let is_digit = |c: Option<&char>| c.is_some_and(|c| c.is_ascii_digit());
    let before = range.start.checked_sub(1).and_then(|i| input.get(i));
    let after = input.get(range.end);
    if !is_digit(before) && !is_digit(after) {
        if let Ok(number) = target.parse::<i64>() {
            result.push(DicdataElement::from_ruby(
                target.as_str(),
                cid::NUMBER,
                mid::SMALL_NUMBER,
                -14.0,
            ));
            if (-KANSUJI_LIMIT..=KANSUJI_LIMIT).contains(&number) {
                result.push(DicdataElement::with_cid(
                    to_kansuji(number),
                    target.as_str(),
                    cid::NUMBER,
                    mid::SMALL_NUMBER,
                    -16.0,
                ));
            }
        }
    }

    if language == KeyboardLanguage::EnUs && is_roman_alphabet_only(&target) {
        result.push(DicdataElement::from_ruby(
            target.as_str(),
            cid::PROPER_NOUN,
            mid::ENGLISH_WORD,
            -14.0,
        ));
    }

    let mut chars = target.chars();
    if let (Some(first), None) = (chars.next(), chars.next()) {
        result.push(DicdataElement::from_ruby(
            target.as_str(),
            cid::PROPER_NOUN,
            mid::GENERAL,
            -14.0,
        ));
        symbol_entries(&target, first, &mut result);
    }
    result
}
