//! 品詞ID・意味IDの定数と、品詞に基づく判定関数

use std::sync::OnceLock;

/// 対数尤度で表されるスコアの型。大きいほど尤もらしい。
pub type PValue = f32;

/// 1語あたりの最大文字数。
pub const MAX_ENTRY_LENGTH: usize = 20;

/// 品詞IDの総数。
pub const CID_COUNT: usize = 1319;

/// 意味IDの総数（意味連接行列の一辺）。
pub const MID_COUNT: usize = 502;

/// これより低いスコアの語は枝刈りの対象となる。
pub const PRUNING_THRESHOLD: PValue = -17.0;

/// 品詞ID
pub mod cid {
    pub const BOS: u16 = 0;
    pub const SYMBOL: u16 = 5;
    pub const PARTICLE_WA: u16 = 261;
    pub const AUXILIARY_DESU: u16 = 460;
    pub const GENERAL_NOUN: u16 = 1285;
    pub const PROPER_NOUN: u16 = 1288;
    pub const PERSON_NAME: u16 = 1289;
    pub const SURNAME: u16 = 1290;
    pub const GIVEN_NAME: u16 = 1291;
    pub const ORGANIZATION: u16 = 1292;
    pub const PLACE_NAME: u16 = 1293;
    pub const NUMBER: u16 = 1295;
    pub const EOS: u16 = 1316;

    /// 助詞かどうか。
    #[inline(always)]
    pub const fn is_particle(cid: u16) -> bool {
        147 <= cid && cid <= 368
    }
}

/// 意味ID
pub mod mid {
    pub const BOS: u16 = 500;
    pub const EOS: u16 = 500;
    pub const GENERAL: u16 = 501;
    pub const NUMBER: u16 = 452;
    pub const ENGLISH_WORD: u16 = 40;
    pub const SMALL_NUMBER: u16 = 361;
    pub const YEAR: u16 = 237;
    pub const SURNAME: u16 = 344;
    pub const GIVEN_NAME: u16 = 370;
    pub const ORGANIZATION: u16 = 378;
}

/// 文節境界の判定に使う語の種類。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WordType {
    /// 前置機能語（接頭辞など）
    Preposition,
    /// 内容語
    Content,
    /// 後置機能語（助詞・助動詞など）
    Postposition,
    /// BOS / EOS
    Terminal,
}

/// 品詞IDから語の種類を判定します。
pub fn word_type(cid: u16) -> WordType {
    match cid {
        cid::BOS | cid::EOS => WordType::Terminal,
        1315 | 6 | 557..=560 => WordType::Preposition,
        561..=867 | 1283..=1296 | 1306..=1309 | 11..=52 | 555..=556 | 1281..=1282 => {
            WordType::Content
        }
        1314 | 1..=5 | 9 => WordType::Content,
        _ => WordType::Postposition,
    }
}

/// 前の語の右品詞と後ろの語の左品詞の間が文節の境界であるかを判定します。
///
/// BOS / EOSとの間は境界にならない。前置機能語の後ろは、内容語が続くときだけ境界にならない。
/// それ以外の語の後ろでは、内容語と前置機能語の直前が境界になる。
pub fn is_clause(former: u16, latter: u16) -> bool {
    let latter = word_type(latter);
    if latter == WordType::Terminal {
        return false;
    }
    let former = word_type(former);
    if former == WordType::Terminal {
        return false;
    }
    if former == WordType::Preposition {
        return latter != WordType::Content;
    }
    matches!(latter, WordType::Preposition | WordType::Content)
}

/// 意味連接スコアの計算に含めるべき語かどうか。
pub fn include_mm_value_calculation(lcid: u16, rcid: u16) -> bool {
    // 非自立動詞・非自立名詞
    if (895..=1280).contains(&lcid) || (895..=1280).contains(&rcid) {
        return true;
    }
    if (1297..=1305).contains(&lcid) || (1297..=1305).contains(&rcid) {
        return true;
    }
    word_type(lcid) == WordType::Content || word_type(rcid) == WordType::Content
}

/// 誤り訂正ペナルティの品詞別倍率。助詞・助動詞は重くする。
#[inline]
pub fn typo_penalty_ratio(lcid: u16) -> PValue {
    if (147..=554).contains(&lcid) {
        2.5
    } else {
        1.0
    }
}

/// 学習の対象とする語かどうか。
pub fn need_learning(lcid: u16) -> bool {
    !matches!(lcid, 147..=554 | 557..=560 | 1297..=1305 | 6..=9 | cid::BOS | cid::EOS)
}

/// 予測変換の末尾として使えない右品詞（連用タ接続・仮定縮約・未然形・命令yo など）。
const NON_TERMINAL_RCIDS: &[&[u16]] = &[
    // 連用タ接続
    &[
        33, 34, 50, 86, 87, 88, 103, 127, 128, 144, 397, 398, 408, 426, 427, 450, 457, 480, 687,
        688, 703, 704, 727, 742, 750, 758, 766, 786, 787, 798, 810, 811, 829, 830, 831, 893, 973,
        974, 975, 976, 977, 1007, 1008, 1009, 1010, 1063, 1182, 1183, 1184, 1185, 1186, 1187, 1188,
        1189, 1190, 1191, 1192, 1193, 1194, 1240, 1241, 1242, 1243, 1268, 1269, 1270, 1271,
    ],
    // 仮定縮約
    &[
        15, 16, 17, 18, 41, 42, 59, 60, 61, 62, 63, 64, 94, 95, 109, 110, 111, 112, 135, 136, 379,
        380, 381, 382, 402, 412, 413, 442, 443, 471, 472, 562, 572, 582, 591, 598, 618, 627, 677,
        678, 693, 694, 709, 710, 722, 730, 737, 745, 753, 761, 770, 771, 791, 869, 878, 885, 896,
        906, 917, 918, 932, 948, 949, 950, 951, 952, 987, 988, 989, 990, 1017, 1018, 1033, 1034,
        1035, 1036, 1058, 1078, 1079, 1080, 1081, 1082, 1083, 1084, 1085, 1086, 1087, 1088, 1089,
        1090, 1212, 1213, 1214, 1215,
    ],
    // 未然形
    &[
        372, 406, 418, 419, 431, 437, 438, 455, 462, 463, 464, 495, 496, 504, 533, 534, 540, 551,
        567, 577, 587, 595, 606, 614, 622, 630, 641, 647, 653, 659, 665, 672, 683, 684, 699, 700,
        715, 716, 725, 733, 740, 748, 756, 764, 780, 781, 794, 806, 807, 823, 824, 825, 837, 842,
        847, 852, 859, 865, 873, 881, 890, 901, 911, 925, 935, 963, 964, 965, 966, 967, 999, 1000,
        1001, 1002, 1023, 1024, 1045, 1046, 1047, 1048, 1061, 1143, 1144, 1145, 1146, 1147, 1148,
        1149, 1150, 1151, 1152, 1153, 1154, 1155, 1224, 1225, 1226, 1227, 1260, 1261, 1262, 1263,
        1278,
    ],
    // 未然特殊
    &[
        420, 421, 631, 782, 783, 795, 891, 936, 1156, 1157, 1158, 1159, 1160, 1161, 1162, 1163,
        1164, 1165, 1166, 1167, 1168, 1228, 1229, 1230, 1231,
    ],
    // 未然ウ接続
    &[
        25, 26, 46, 74, 75, 76, 99, 119, 120, 140, 389, 390, 405, 416, 417, 447, 476, 493, 494,
        566, 576, 585, 594, 603, 621, 629, 671, 681, 682, 697, 698, 713, 714, 724, 732, 739, 747,
        755, 763, 778, 779, 793, 804, 805, 820, 821, 822, 872, 880, 889, 900, 910, 923, 924, 934,
        958, 959, 960, 961, 962, 995, 996, 997, 998, 1021, 1022, 1041, 1042, 1043, 1044, 1060,
        1130, 1131, 1132, 1133, 1134, 1135, 1136, 1137, 1138, 1139, 1140, 1141, 1142, 1220, 1221,
        1222, 1223, 1256, 1257, 1258, 1259,
    ],
    // 未然ヌ接続
    &[27, 28, 47, 77, 78, 79, 100, 121, 122, 141, 391, 392, 448, 477, 604],
    // 体言接続特殊
    &[
        404, 564, 565, 574, 575, 600, 601, 620, 774, 775, 776, 777, 871, 887, 888, 898, 899, 908,
        909, 921, 922, 1104, 1105, 1106, 1107, 1108, 1109, 1110, 1111, 1112, 1113, 1114, 1115,
        1116, 1117, 1118, 1119, 1120, 1121, 1122, 1123, 1124, 1125, 1126, 1127, 1128, 1129,
    ],
    // 仮定形
    &[
        13, 14, 40, 56, 57, 58, 93, 107, 108, 134, 369, 377, 378, 401, 410, 411, 433, 434, 441,
        452, 470, 483, 489, 490, 527, 528, 537, 542, 548, 561, 571, 581, 590, 597, 611, 617, 626,
        636, 638, 644, 650, 656, 662, 668, 675, 676, 691, 692, 707, 708, 721, 729, 736, 744, 752,
        760, 768, 769, 790, 800, 801, 814, 815, 816, 835, 840, 845, 850, 855, 862, 868, 877, 884,
        895, 905, 915, 916, 931, 941, 943, 944, 945, 946, 947, 983, 984, 985, 986, 1015, 1016,
        1029, 1030, 1031, 1032, 1057, 1065, 1066, 1067, 1068, 1069, 1070, 1071, 1072, 1073, 1074,
        1075, 1076, 1077, 1208, 1209, 1210, 1211, 1248, 1249, 1250, 1251, 1276,
    ],
    // 命令ｙｏ
    &[
        373, 553, 569, 579, 589, 596, 609, 624, 634, 642, 648, 654, 660, 666, 673, 860, 866, 875,
        903, 913, 928, 929, 939,
    ],
];

/// 右品詞が予測変換の末尾として使えるかどうか。
pub fn prediction_usable(rcid: u16) -> bool {
    static TABLE: OnceLock<Vec<bool>> = OnceLock::new();
    let table = TABLE.get_or_init(|| {
        let mut table = vec![true; CID_COUNT + 1];
        for &id in NON_TERMINAL_RCIDS.iter().flat_map(|ids| ids.iter()) {
            table[usize::from(id)] = false;
        }
        table
    });
    table.get(usize::from(rcid)).copied().unwrap_or(true)
}

/// 静的辞書にLOUDSが存在しうる先頭文字かどうか。
///
/// 誤り訂正候補の構築で、存在しない辞書への照会を打ち切るために使う。
pub fn static_trie_may_exist(c: char) -> bool {
    const CHARS: &str = "　￣‐―〜・、…‥。‘’“”〈〉《》「」『』【】〔〕‖*′〃※´¨゛゜←→↑↓─■□▲△▼▽◆◇○◎●★☆々ゝヽゞヾー〇\
        ァアィイゥウヴェエォオヵカガキギクグヶケゲコゴサザシジ〆スズセゼソゾタダチヂッツヅテデトド\
        ナニヌネノハバパヒビピフブプヘベペホボポマミムメモヤユョヨラリルレロヮワヰヱヲン仝\
        0123456789！？()#%&^_'\"";
    CHARS.contains(c)
}
