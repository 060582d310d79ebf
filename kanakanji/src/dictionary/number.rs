//! カタカナで書かれた数詞の読みを漢数字とアラビア数字に変換します。

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Token {
    Digit(u8),
    /// 十・百・千
    Small(u64, char),
    /// 万・億・兆・京
    Large(u64, char),
}

/// 読みと語の対応。長い読みを先に試す。
const READINGS: &[(&str, Token)] = &[
    ("キュウ", Token::Digit(9)),
    ("ジュウ", Token::Small(10, '十')),
    ("ジュッ", Token::Small(10, '十')),
    ("ヒャク", Token::Small(100, '百')),
    ("ビャク", Token::Small(100, '百')),
    ("ピャク", Token::Small(100, '百')),
    ("チョウ", Token::Large(1_0000_0000_0000, '兆')),
    ("イチ", Token::Digit(1)),
    ("イッ", Token::Digit(1)),
    ("サン", Token::Digit(3)),
    ("ヨン", Token::Digit(4)),
    ("ロク", Token::Digit(6)),
    ("ロッ", Token::Digit(6)),
    ("ナナ", Token::Digit(7)),
    ("シチ", Token::Digit(7)),
    ("ハチ", Token::Digit(8)),
    ("ハッ", Token::Digit(8)),
    ("ゼロ", Token::Digit(0)),
    ("セン", Token::Small(1000, '千')),
    ("ゼン", Token::Small(1000, '千')),
    ("マン", Token::Large(1_0000, '万')),
    ("オク", Token::Large(1_0000_0000, '億')),
    ("ケイ", Token::Large(1_0000_0000_0000_0000, '京')),
    ("ニ", Token::Digit(2)),
    ("ゴ", Token::Digit(5)),
];

const KANJI_DIGITS: [char; 10] = ['〇', '一', '二', '三', '四', '五', '六', '七', '八', '九'];

fn tokenize(reading: &str) -> Option<Vec<Token>> {
    let mut rest = reading;
    let mut tokens = vec![];
    while !rest.is_empty() {
        let (len, token) = READINGS
            .iter()
            .find(|(r, _)| rest.starts_with(r))
            .map(|(r, t)| (r.len(), *t))?;
        tokens.push(token);
        rest = &rest[len..];
    }
    Some(tokens)
}

/// 数詞の読みを（漢数字表記, アラビア数字表記）に変換します。
///
/// 位を表す読みを1つ以上含む場合だけ変換します。
///
/// # 例
///
/// ```
/// # use kanakanji::dictionary::number::japanese_number;
/// assert_eq!(
///     japanese_number("イチマン"),
///     Some(("一万".to_string(), "10000".to_string()))
/// );
/// assert_eq!(japanese_number("アマン"), None);
/// ```
pub fn japanese_number(reading: &str) -> Option<(String, String)> {
    let tokens = tokenize(reading)?;
    if !tokens.iter().any(|t| !matches!(t, Token::Digit(_))) {
        return None;
    }
    let mut total: u64 = 0;
    let mut section: u64 = 0;
    let mut pending: Option<u64> = None;
    let mut last_small = u64::MAX;
    let mut last_large = u64::MAX;
    let mut kanji = String::new();
    for token in tokens {
        match token {
            Token::Digit(d) => {
                if pending.is_some() {
                    return None;
                }
                pending = Some(u64::from(d));
                kanji.push(KANJI_DIGITS[usize::from(d)]);
            }
            Token::Small(unit, c) => {
                if unit >= last_small {
                    return None;
                }
                last_small = unit;
                section += pending.take().unwrap_or(1) * unit;
                kanji.push(c);
            }
            Token::Large(unit, c) => {
                if unit >= last_large {
                    return None;
                }
                let value = section + pending.take().unwrap_or(0);
                if value == 0 {
                    return None;
                }
                last_large = unit;
                last_small = u64::MAX;
                total = total.checked_add(value.checked_mul(unit)?)?;
                section = 0;
                kanji.push(c);
            }
        }
    }
    total = total.checked_add(section + pending.unwrap_or(0))?;
    Some((kanji, total.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_japanese_number() {
        assert_eq!(
            japanese_number("イチマン"),
            Some(("一万".to_string(), "10000".to_string()))
        );
        assert_eq!(
            japanese_number("ニオクロクセンヨンヒャクマンキュウ"),
            Some(("二億六千四百万九".to_string(), "264000009".to_string()))
        );
        assert_eq!(
            japanese_number("サンビャクロクジュウゴ"),
            Some(("三百六十五".to_string(), "365".to_string()))
        );
        assert_eq!(
            japanese_number("ハッセン"),
            Some(("八千".to_string(), "8000".to_string()))
        );
    }

    #[test]
    fn test_not_a_number() {
        assert_eq!(japanese_number("マルマン"), None);
        assert_eq!(japanese_number("アマン"), None);
        assert_eq!(japanese_number("イチリン"), None);
        assert_eq!(japanese_number("ニムリョウタイスウサンガイ"), None);
        assert_eq!(japanese_number("イチ"), None);
        assert_eq!(japanese_number("マン"), None);
        assert_eq!(japanese_number("ヒャクセン"), None);
        assert_eq!(japanese_number("イチニ"), None);
        assert_eq!(japanese_number(""), None);
    }
}
