//! エラー型の定義
//!
//! このモジュールは、かな漢字変換コアで使用されるすべてのエラー型を定義します。

use std::error::Error;
use std::fmt::{self, Debug};

/// かな漢字変換専用のResult型
///
/// エラー型としてデフォルトで[`KanaKanjiError`]を使用します。
pub type Result<T, E = KanaKanjiError> = std::result::Result<T, E>;

/// かな漢字変換のエラー型
///
/// 辞書リソースの読み込みや構築で発生する可能性のあるエラーを表現します。
/// 変換処理そのものはエラーを返さず、辞書ストアがログを出力して空の結果に縮退します。
/// 存在しないリソースは[`KanaKanjiError::is_not_found`]、壊れたリソースは
/// [`KanaKanjiError::is_corrupt`]で区別できます。
#[derive(Debug, thiserror::Error)]
pub enum KanaKanjiError {
    /// 無効な引数エラー
    ///
    /// [`InvalidArgumentError`]のエラーバリアント。
    #[error(transparent)]
    InvalidArgument(InvalidArgumentError),

    /// 無効なフォーマットエラー
    ///
    /// [`InvalidFormatError`]のエラーバリアント。
    #[error(transparent)]
    InvalidFormat(InvalidFormatError),

    /// 無効な状態エラー
    ///
    /// [`InvalidStateError`]のエラーバリアント。
    #[error(transparent)]
    InvalidState(InvalidStateError),

    /// 辞書リソースが途中で切れている
    ///
    /// [`TruncatedError`]のエラーバリアント。
    #[error(transparent)]
    Truncated(TruncatedError),

    /// エントリブロックにないレコードを参照した
    #[error("record {index} is out of {count} records in {resource}")]
    RecordOutOfRange {
        /// リソースの種類
        resource: &'static str,
        /// 参照したレコード
        index: usize,
        /// ブロック内のレコード数
        count: usize,
    },

    /// 整数変換エラー
    #[error(transparent)]
    TryFromInt(std::num::TryFromIntError),

    /// 浮動小数点数パースエラー
    #[error(transparent)]
    ParseFloat(std::num::ParseFloatError),

    /// 整数パースエラー
    #[error(transparent)]
    ParseInt(std::num::ParseIntError),

    /// 標準I/Oエラー
    ///
    /// [`std::io::Error`]のエラーバリアント。
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// UTF-8エンコーディングエラー
    #[error(transparent)]
    Utf8(std::str::Utf8Error),
}

impl KanaKanjiError {
    /// 無効な引数エラーを生成します
    ///
    /// # 引数
    ///
    /// * `arg` - 引数の名前
    /// * `msg` - エラーメッセージ
    pub(crate) fn invalid_argument<S>(arg: &'static str, msg: S) -> Self
    where
        S: Into<String>,
    {
        Self::InvalidArgument(InvalidArgumentError {
            arg,
            msg: msg.into(),
        })
    }

    /// 無効なフォーマットエラーを生成します
    ///
    /// # 引数
    ///
    /// * `arg` - フォーマット名
    /// * `msg` - エラーメッセージ
    pub(crate) fn invalid_format<S>(arg: &'static str, msg: S) -> Self
    where
        S: Into<String>,
    {
        Self::InvalidFormat(InvalidFormatError {
            arg,
            msg: msg.into(),
        })
    }

    /// 無効な状態エラーを生成します
    ///
    /// # 引数
    ///
    /// * `msg` - エラーメッセージ
    /// * `cause` - エラーの原因
    pub(crate) fn invalid_state<S, M>(msg: S, cause: M) -> Self
    where
        S: Into<String>,
        M: Into<String>,
    {
        Self::InvalidState(InvalidStateError {
            msg: msg.into(),
            cause: cause.into(),
        })
    }

    /// 途中で切れたリソースのエラーを生成します
    ///
    /// # 引数
    ///
    /// * `resource` - リソースの種類
    /// * `expected` - 必要なバイト数
    /// * `found` - 実際のバイト数
    pub(crate) fn truncated(resource: &'static str, expected: usize, found: usize) -> Self {
        Self::Truncated(TruncatedError {
            resource,
            expected,
            found,
        })
    }

    /// 辞書リソースの内容が壊れていることによるエラーかどうかを判定します。
    pub fn is_corrupt(&self) -> bool {
        matches!(
            self,
            Self::InvalidFormat(_)
                | Self::Truncated(_)
                | Self::RecordOutOfRange { .. }
                | Self::Utf8(_)
        )
    }

    /// リソースが存在しないことによるエラーかどうかを判定します。
    ///
    /// 辞書ストアはこの場合をデバッグログのみで扱い、それ以外を破損として警告します。
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::Io(e) if e.kind() == std::io::ErrorKind::NotFound)
    }
}

/// 引数が無効な場合に使用されるエラー
#[derive(Debug)]
pub struct InvalidArgumentError {
    /// 引数の名前
    pub(crate) arg: &'static str,

    /// エラーメッセージ
    pub(crate) msg: String,
}

impl fmt::Display for InvalidArgumentError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "InvalidArgumentError: {}: {}", self.arg, self.msg)
    }
}

impl Error for InvalidArgumentError {}

/// 入力フォーマットが無効な場合に使用されるエラー
#[derive(Debug)]
pub struct InvalidFormatError {
    /// フォーマットの名前
    pub(crate) arg: &'static str,

    /// エラーメッセージ
    pub(crate) msg: String,
}

impl fmt::Display for InvalidFormatError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "InvalidFormatError: {}: {}", self.arg, self.msg)
    }
}

impl Error for InvalidFormatError {}

/// 状態が無効な場合に使用されるエラー
#[derive(Debug)]
pub struct InvalidStateError {
    /// エラーメッセージ
    pub(crate) msg: String,

    /// エラーの根本原因
    pub(crate) cause: String,
}

impl fmt::Display for InvalidStateError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "InvalidStateError: {}: {}", self.msg, self.cause)
    }
}

impl Error for InvalidStateError {}

/// 辞書リソースが途中で切れている場合に使用されるエラー
#[derive(Debug)]
pub struct TruncatedError {
    /// リソースの種類
    pub(crate) resource: &'static str,

    /// 必要なバイト数
    pub(crate) expected: usize,

    /// 実際のバイト数
    pub(crate) found: usize,
}

impl fmt::Display for TruncatedError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "TruncatedError: {}: expected at least {} bytes, found {}",
            self.resource, self.expected, self.found
        )
    }
}

impl Error for TruncatedError {}

impl From<std::num::TryFromIntError> for KanaKanjiError {
    fn from(error: std::num::TryFromIntError) -> Self {
        Self::TryFromInt(error)
    }
}

impl From<std::num::ParseFloatError> for KanaKanjiError {
    fn from(error: std::num::ParseFloatError) -> Self {
        Self::ParseFloat(error)
    }
}

impl From<std::num::ParseIntError> for KanaKanjiError {
    fn from(error: std::num::ParseIntError) -> Self {
        Self::ParseInt(error)
    }
}

impl From<std::str::Utf8Error> for KanaKanjiError {
    fn from(error: std::str::Utf8Error) -> Self {
        Self::Utf8(error)
    }
}
