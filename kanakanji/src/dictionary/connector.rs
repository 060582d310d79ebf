//! 連接コスト
//!
//! 品詞連接コストは左側の語の右品詞ごとに`cb/<id>.binary`として分割されており、
//! 必要になった行だけを読み込みます。意味連接コストは`mm.binary`の密な行列です。

use hashbrown::HashMap;

use crate::common::{mid, PValue, CID_COUNT, MID_COUNT};
use crate::dictionary::resource::{Resource, ResourceProvider};
use crate::errors::{KanaKanjiError, Result};

/// 行に記録がないときの品詞連接コスト
pub const DEFAULT_CLASS_COST: PValue = -25.0;

/// 行ごとの既定値を表すキー
const ROW_DEFAULT_KEY: i32 = -1;

/// 連接コスト計算機能を提供するトレイト
pub trait ConnectorCost {
    /// 連接コストを取得します。
    ///
    /// # 引数
    ///
    /// * `former` - 左側の語のID
    /// * `latter` - 右側の語のID
    ///
    /// # 戻り値
    ///
    /// 連接確率の対数
    fn cost(&self, former: u16, latter: u16) -> PValue;
}

/// 品詞連接コストの1行
#[derive(Default, Debug)]
struct ClassRow {
    default: PValue,
    costs: HashMap<i32, PValue>,
}

impl ClassRow {
    fn parse(bytes: &[u8]) -> Result<Self> {
        if bytes.len() % 8 != 0 {
            return Err(KanaKanjiError::invalid_format(
                "cb",
                format!("row length {} is not a multiple of 8", bytes.len()),
            ));
        }
        let mut costs = HashMap::with_capacity(bytes.len() / 8);
        for pair in bytes.chunks_exact(8) {
            let id = i32::from_le_bytes([pair[0], pair[1], pair[2], pair[3]]);
            let cost = f32::from_le_bytes([pair[4], pair[5], pair[6], pair[7]]);
            costs.insert(id, cost);
        }
        let default = costs
            .get(&ROW_DEFAULT_KEY)
            .copied()
            .unwrap_or(DEFAULT_CLASS_COST);
        Ok(Self { default, costs })
    }

    fn cost(&self, latter: u16) -> PValue {
        self.costs
            .get(&i32::from(latter))
            .copied()
            .unwrap_or(self.default)
    }

    /// 行をバイト列に符号化します。
    fn encode(default: Option<PValue>, costs: &[(u16, PValue)]) -> Vec<u8> {
        let mut bytes = Vec::with_capacity((costs.len() + 1) * 8);
        if let Some(default) = default {
            bytes.extend_from_slice(&ROW_DEFAULT_KEY.to_le_bytes());
            bytes.extend_from_slice(&default.to_le_bytes());
        }
        for &(latter, cost) in costs {
            bytes.extend_from_slice(&i32::from(latter).to_le_bytes());
            bytes.extend_from_slice(&cost.to_le_bytes());
        }
        bytes
    }
}

/// 遅延読み込みされる品詞連接コスト
#[derive(Default)]
pub struct ClassConnector {
    rows: HashMap<u16, ClassRow>,
}

impl ClassConnector {
    pub fn new() -> Self {
        Self::default()
    }

    /// 左側の品詞の行を読み込みます。読み込み済みなら何もしません。
    ///
    /// 行が存在しない場合や壊れている場合は、すべて既定値の行として扱います。
    pub fn ensure_row(&mut self, former: u16, provider: &dyn ResourceProvider) {
        if self.rows.contains_key(&former) {
            return;
        }
        let row = match provider.read(&Resource::ClassConnection(former)) {
            Ok(bytes) => ClassRow::parse(&bytes).unwrap_or_else(|e| {
                log::warn!("cb/{former}.binary: {e}");
                ClassRow::default_row()
            }),
            Err(e) => {
                if usize::from(former) < CID_COUNT {
                    log::debug!("cb/{former}.binary: {e}");
                }
                ClassRow::default_row()
            }
        };
        self.rows.insert(former, row);
    }

    /// 読み込んだ行をすべて破棄します。
    pub fn clear(&mut self) {
        self.rows.clear();
    }

    /// 行をバイト列に符号化します。`default`は記録のない右側に使われる値です。
    pub fn encode_row(default: Option<PValue>, costs: &[(u16, PValue)]) -> Vec<u8> {
        ClassRow::encode(default, costs)
    }
}

impl ClassRow {
    fn default_row() -> Self {
        Self {
            default: DEFAULT_CLASS_COST,
            costs: HashMap::new(),
        }
    }
}

impl ConnectorCost for ClassConnector {
    fn cost(&self, former: u16, latter: u16) -> PValue {
        self.rows
            .get(&former)
            .map_or(DEFAULT_CLASS_COST, |row| row.cost(latter))
    }
}

/// 意味連接コストの行列
pub struct MeaningConnector {
    matrix: Vec<PValue>,
}

impl Default for MeaningConnector {
    fn default() -> Self {
        Self {
            matrix: vec![0.0; MID_COUNT * MID_COUNT],
        }
    }
}

impl MeaningConnector {
    /// `mm.binary`のバイト列から行列を作成します。
    ///
    /// # エラー
    ///
    /// 長さが行列の大きさと一致しない場合、[`KanaKanjiError`]を返します。
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let expected = MID_COUNT * MID_COUNT * 4;
        if bytes.len() != expected {
            return Err(KanaKanjiError::invalid_format(
                "mm",
                format!("expected {expected} bytes, found {}", bytes.len()),
            ));
        }
        let matrix = bytes
            .chunks_exact(4)
            .map(|b| f32::from_le_bytes([b[0], b[1], b[2], b[3]]))
            .collect();
        Ok(Self { matrix })
    }

    /// プロバイダから行列を読み込みます。存在しない場合や壊れている場合は零行列になります。
    pub fn load(provider: &dyn ResourceProvider) -> Self {
        match provider.read(&Resource::MeaningMatrix) {
            Ok(bytes) => Self::from_bytes(&bytes).unwrap_or_else(|e| {
                log::warn!("mm.binary: {e}");
                Self::default()
            }),
            Err(e) => {
                log::debug!("mm.binary: {e}");
                Self::default()
            }
        }
    }

    /// 行列をバイト列に符号化します。
    pub fn to_bytes(&self) -> Vec<u8> {
        self.matrix.iter().flat_map(|v| v.to_le_bytes()).collect()
    }

    /// 値を設定します。範囲外は無視します。
    pub fn set(&mut self, former: u16, latter: u16, value: PValue) {
        let index = usize::from(former) * MID_COUNT + usize::from(latter);
        if usize::from(latter) < MID_COUNT {
            if let Some(v) = self.matrix.get_mut(index) {
                *v = value;
            }
        }
    }
}

impl ConnectorCost for MeaningConnector {
    fn cost(&self, former: u16, latter: u16) -> PValue {
        if former == mid::BOS || latter == mid::BOS {
            return 0.0;
        }
        if usize::from(latter) >= MID_COUNT {
            return 0.0;
        }
        self.matrix
            .get(usize::from(former) * MID_COUNT + usize::from(latter))
            .copied()
            .unwrap_or(0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::dictionary::resource::{MemoryProvider, ResourceRoot};

    #[test]
    fn test_class_connector() {
        let mut provider = MemoryProvider::new();
        provider.insert(
            ResourceRoot::Dictionary,
            "cb/3.binary",
            ClassConnector::encode_row(Some(-12.0), &[(5, -1.5)]),
        );
        provider.insert(
            ResourceRoot::Dictionary,
            "cb/4.binary",
            ClassConnector::encode_row(None, &[(5, -2.5)]),
        );
        provider.insert(ResourceRoot::Dictionary, "cb/6.binary", vec![0; 5]);
        let mut connector = ClassConnector::new();
        for former in [3, 4, 6, 7] {
            connector.ensure_row(former, &provider);
        }
        assert_eq!(connector.cost(3, 5), -1.5);
        assert_eq!(connector.cost(3, 6), -12.0);
        assert_eq!(connector.cost(4, 5), -2.5);
        assert_eq!(connector.cost(4, 6), DEFAULT_CLASS_COST);
        assert_eq!(connector.cost(6, 5), DEFAULT_CLASS_COST);
        assert_eq!(connector.cost(7, 5), DEFAULT_CLASS_COST);
    }

    #[test]
    fn test_meaning_connector() {
        let mut matrix = MeaningConnector::default();
        matrix.set(10, 20, -3.0);
        matrix.set(10, mid::BOS, -3.0);
        let restored = MeaningConnector::from_bytes(&matrix.to_bytes()).unwrap();
        assert_eq!(restored.cost(10, 20), -3.0);
        assert_eq!(restored.cost(20, 10), 0.0);
        assert_eq!(restored.cost(10, mid::BOS), 0.0);
        assert_eq!(restored.cost(mid::EOS, 20), 0.0);
        assert!(MeaningConnector::from_bytes(&[0; 4]).is_err());
        assert_eq!(MeaningConnector::load(&MemoryProvider::new()).cost(10, 20), 0.0);
    }
}
