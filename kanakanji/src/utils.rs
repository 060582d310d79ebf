//! ユーティリティ関数を提供するモジュール
//!
//! CSV行の解析、ひらがな・カタカナ・半角・全角の変換、漢数字表記などの補助関数が含まれます。

use csv_core::ReadFieldResult;

/// CSV形式の行を解析してフィールドのベクターに分割する
///
/// ダブルクォートで囲まれたフィールドや、フィールド内のカンマも正しく処理します。
///
/// # 例
///
/// ```
/// # use kanakanji::utils::parse_csv_row;
/// let fields = parse_csv_row("カ,蚊,1285");
/// assert_eq!(fields, vec!["カ", "蚊", "1285"]);
///
/// let fields_with_quote = parse_csv_row("テン,\",\",5");
/// assert_eq!(fields_with_quote, vec!["テン", ",", "5"]);
/// ```
pub fn parse_csv_row(row: &str) -> Vec<String> {
    let mut features = vec![];
    let mut rdr = csv_core::Reader::new();
    let mut bytes = row.as_bytes();
    let mut output = [0; 4096];
    loop {
        let (result, nin, nout) = rdr.read_field(bytes, &mut output);
        let end = !matches!(result, ReadFieldResult::Field { .. });
        features.push(String::from_utf8_lossy(&output[..nout]).into_owned());
        if end {
            break;
        }
        bytes = &bytes[nin..];
    }
    features
}

const HIRAGANA_KATAKANA_OFFSET: u32 = 0x60;

/// ひらがなをカタカナに変換します。それ以外の文字はそのまま残します。
pub fn to_katakana(text: &str) -> String {
    text.chars().map(katakana_char).collect()
}

/// 1文字をカタカナに変換します。
#[inline]
pub fn katakana_char(c: char) -> char {
    match c {
        '\u{3041}'..='\u{3096}' | '\u{309D}'..='\u{309E}' => {
            char::from_u32(c as u32 + HIRAGANA_KATAKANA_OFFSET).unwrap_or(c)
        }
        _ => c,
    }
}

/// カタカナをひらがなに変換します。それ以外の文字はそのまま残します。
pub fn to_hiragana(text: &str) -> String {
    text.chars()
        .map(|c| match c {
            '\u{30A1}'..='\u{30F6}' | '\u{30FD}'..='\u{30FE}' => {
                char::from_u32(c as u32 - HIRAGANA_KATAKANA_OFFSET).unwrap_or(c)
            }
            _ => c,
        })
        .collect()
}

/// ASCIIのローマ字だけからなる空でない文字列かどうか。
pub fn is_roman_alphabet_only(text: &str) -> bool {
    !text.is_empty() && text.chars().all(|c| c.is_ascii_alphabetic())
}

/// 半角英数記号を全角に変換します。
pub fn to_full_width_roman(text: &str) -> String {
    text.chars()
        .map(|c| match c {
            '!'..='~' => char::from_u32(c as u32 + 0xFEE0).unwrap_or(c),
            ' ' => '\u{3000}',
            _ => c,
        })
        .collect()
}

const FULL_WIDTH_KANA: &str = "ァアィイゥウェエォオカキクケコサシスセソタチッツテトナニヌネノハヒフヘホマミムメモャヤュユョヨラリルレロワヲンー、。「」・゛゜";
const HALF_WIDTH_KANA: &str = "ｧｱｨｲｩｳｪｴｫｵｶｷｸｹｺｻｼｽｾｿﾀﾁｯﾂﾃﾄﾅﾆﾇﾈﾉﾊﾋﾌﾍﾎﾏﾐﾑﾒﾓｬﾔｭﾕｮﾖﾗﾘﾙﾚﾛﾜｦﾝｰ､｡｢｣･ﾞﾟ";
const VOICED_KANA: &str = "ガギグゲゴザジズゼゾダヂヅデドバビブベボ";
const SEMI_VOICED_KANA: &str = "パピプペポ";

fn half_width_base(c: char) -> Option<char> {
    FULL_WIDTH_KANA
        .chars()
        .position(|f| f == c)
        .and_then(|i| HALF_WIDTH_KANA.chars().nth(i))
}

/// カタカナ（ひらがなも可）を半角カタカナに変換します。
pub fn to_half_width_kana(text: &str) -> String {
    let mut result = String::with_capacity(text.len());
    for c in text.chars().map(katakana_char) {
        if let Some(h) = half_width_base(c) {
            result.push(h);
        } else if c == 'ヴ' {
            result.push_str("ｳﾞ");
        } else if VOICED_KANA.contains(c) {
            match char::from_u32(c as u32 - 1).and_then(half_width_base) {
                Some(h) => {
                    result.push(h);
                    result.push('ﾞ');
                }
                None => result.push(c),
            }
        } else if SEMI_VOICED_KANA.contains(c) {
            match char::from_u32(c as u32 - 2).and_then(half_width_base) {
                Some(h) => {
                    result.push(h);
                    result.push('ﾟ');
                }
                None => result.push(c),
            }
        } else {
            result.push(c);
        }
    }
    result
}

const KANSUJI_DIGITS: [char; 10] = ['〇', '一', '二', '三', '四', '五', '六', '七', '八', '九'];

fn kansuji_section(mut n: u64, out: &mut String) {
    const UNITS: [(u64, char); 3] = [(1000, '千'), (100, '百'), (10, '十')];
    for (unit, c) in UNITS {
        let digit = n / unit;
        if digit > 0 {
            if digit > 1 {
                out.push(KANSUJI_DIGITS[digit as usize]);
            }
            out.push(c);
        }
        n %= unit;
    }
    if n > 0 {
        out.push(KANSUJI_DIGITS[n as usize]);
    }
}

/// 整数を漢数字で表記します（例: 10234 → 一万二百三十四）。
pub fn to_kansuji(number: i64) -> String {
    const LARGE_UNITS: [(u64, &str); 4] = [
        (1_0000_0000_0000_0000, "京"),
        (1_0000_0000_0000, "兆"),
        (1_0000_0000, "億"),
        (1_0000, "万"),
    ];
    if number == 0 {
        return KANSUJI_DIGITS[0].to_string();
    }
    let mut result = String::new();
    if number < 0 {
        result.push_str("マイナス");
    }
    let mut n = number.unsigned_abs();
    for (unit, c) in LARGE_UNITS {
        let section = n / unit;
        if section > 0 {
            if section == 1 {
                result.push('一');
            } else {
                kansuji_section(section, &mut result);
            }
            result.push_str(c);
        }
        n %= unit;
    }
    kansuji_section(n, &mut result);
    result
}

/// HashMapリテラルを簡潔に記述するためのマクロ
///
/// ```ignore
/// let map = hashmap! {
///     'カ' => vec![('ガ', 1.0)],
/// };
/// ```
#[cfg(test)]
macro_rules! hashmap {
    ( $($k:expr => $v:expr,)* ) => {
        {
            #[allow(unused_mut)]
            let mut h = hashbrown::HashMap::new();
            $(
                h.insert($k, $v);
            )*
            h
        }
    };
    ( $($k:expr => $v:expr),* ) => {
        hashmap![$( $k => $v, )*]
    };
}

#[cfg(test)]
pub(crate) use hashmap;
