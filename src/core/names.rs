//! The 64 hexagrams, keyed by their binary sequence
//!
//! Sequences read bottom line first (yang = 1). The lower trigram is the
//! first three digits, the upper trigram the last three.

use lazy_static::lazy_static;
use std::collections::HashMap;
use tracing::warn;

use crate::UNKNOWN_HEXAGRAM;

/// One row of the King Wen table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HexagramEntry {
    /// Six binary digits, bottom line first
    pub sequence: &'static str,
    /// King Wen order, 1..=64
    pub number: u8,
    pub name: &'static str,
}

/// All 64 hexagrams in King Wen order
pub static HEXAGRAMS: [HexagramEntry; 64] = [
    HexagramEntry { sequence: "111111", number: 1, name: "乾为天" },
    HexagramEntry { sequence: "000000", number: 2, name: "坤为地" },
    HexagramEntry { sequence: "100010", number: 3, name: "水雷屯" },
    HexagramEntry { sequence: "010001", number: 4, name: "山水蒙" },
    HexagramEntry { sequence: "111010", number: 5, name: "水天需" },
    HexagramEntry { sequence: "010111", number: 6, name: "天水讼" },
    HexagramEntry { sequence: "010000", number: 7, name: "地水师" },
    HexagramEntry { sequence: "000010", number: 8, name: "水地比" },
    HexagramEntry { sequence: "111011", number: 9, name: "风天小畜" },
    HexagramEntry { sequence: "110111", number: 10, name: "天泽履" },
    HexagramEntry { sequence: "111000", number: 11, name: "地天泰" },
    HexagramEntry { sequence: "000111", number: 12, name: "天地否" },
    HexagramEntry { sequence: "101111", number: 13, name: "天火同人" },
    HexagramEntry { sequence: "111101", number: 14, name: "火天大有" },
    HexagramEntry { sequence: "001000", number: 15, name: "地山谦" },
    HexagramEntry { sequence: "000100", number: 16, name: "雷地豫" },
    HexagramEntry { sequence: "100110", number: 17, name: "泽雷随" },
    HexagramEntry { sequence: "011001", number: 18, name: "山风蛊" },
    HexagramEntry { sequence: "110000", number: 19, name: "地泽临" },
    HexagramEntry { sequence: "000011", number: 20, name: "风地观" },
    HexagramEntry { sequence: "100101", number: 21, name: "火雷噬嗑" },
    HexagramEntry { sequence: "101001", number: 22, name: "山火贲" },
    HexagramEntry { sequence: "000001", number: 23, name: "山地剥" },
    HexagramEntry { sequence: "100000", number: 24, name: "地雷复" },
    HexagramEntry { sequence: "100111", number: 25, name: "天雷无妄" },
    HexagramEntry { sequence: "111001", number: 26, name: "山天大畜" },
    HexagramEntry { sequence: "100001", number: 27, name: "山雷颐" },
    HexagramEntry { sequence: "011110", number: 28, name: "泽风大过" },
    HexagramEntry { sequence: "010010", number: 29, name: "坎为水" },
    HexagramEntry { sequence: "101101", number: 30, name: "离为火" },
    HexagramEntry { sequence: "001110", number: 31, name: "泽山咸" },
    HexagramEntry { sequence: "011100", number: 32, name: "雷风恒" },
    HexagramEntry { sequence: "001111", number: 33, name: "天山遁" },
    HexagramEntry { sequence: "111100", number: 34, name: "雷天大壮" },
    HexagramEntry { sequence: "000101", number: 35, name: "火地晋" },
    HexagramEntry { sequence: "101000", number: 36, name: "地火明夷" },
    HexagramEntry { sequence: "101011", number: 37, name: "风火家人" },
    HexagramEntry { sequence: "110101", number: 38, name: "火泽睽" },
    HexagramEntry { sequence: "001010", number: 39, name: "水山蹇" },
    HexagramEntry { sequence: "010100", number: 40, name: "雷水解" },
    HexagramEntry { sequence: "110001", number: 41, name: "山泽损" },
    HexagramEntry { sequence: "100011", number: 42, name: "风雷益" },
    HexagramEntry { sequence: "111110", number: 43, name: "泽天夬" },
    HexagramEntry { sequence: "011111", number: 44, name: "天风姤" },
    HexagramEntry { sequence: "000110", number: 45, name: "泽地萃" },
    HexagramEntry { sequence: "011000", number: 46, name: "地风升" },
    HexagramEntry { sequence: "010110", number: 47, name: "泽水困" },
    HexagramEntry { sequence: "011010", number: 48, name: "水风井" },
    HexagramEntry { sequence: "101110", number: 49, name: "泽火革" },
    HexagramEntry { sequence: "011101", number: 50, name: "火风鼎" },
    HexagramEntry { sequence: "100100", number: 51, name: "震为雷" },
    HexagramEntry { sequence: "001001", number: 52, name: "艮为山" },
    HexagramEntry { sequence: "001011", number: 53, name: "风山渐" },
    HexagramEntry { sequence: "110100", number: 54, name: "雷泽归妹" },
    HexagramEntry { sequence: "101100", number: 55, name: "雷火丰" },
    HexagramEntry { sequence: "001101", number: 56, name: "火山旅" },
    HexagramEntry { sequence: "011011", number: 57, name: "巽为风" },
    HexagramEntry { sequence: "110110", number: 58, name: "兑为泽" },
    HexagramEntry { sequence: "010011", number: 59, name: "风水涣" },
    HexagramEntry { sequence: "110010", number: 60, name: "水泽节" },
    HexagramEntry { sequence: "110011", number: 61, name: "风泽中孚" },
    HexagramEntry { sequence: "001100", number: 62, name: "雷山小过" },
    HexagramEntry { sequence: "101010", number: 63, name: "水火既济" },
    HexagramEntry { sequence: "010101", number: 64, name: "火水未济" },
];

lazy_static! {
    static ref BY_SEQUENCE: HashMap<&'static str, &'static HexagramEntry> =
        HEXAGRAMS.iter().map(|entry| (entry.sequence, entry)).collect();
}

/// Table row for a binary sequence
pub fn lookup(sequence: &str) -> Option<&'static HexagramEntry> {
    BY_SEQUENCE.get(sequence).copied()
}

/// Traditional name for a binary sequence.
///
/// Falls back to `未知卦象` on a miss; every six-digit sequence is in the
/// table, so a miss means the input was malformed or the table is broken.
pub fn lookup_name(sequence: &str) -> &'static str {
    match lookup(sequence) {
        Some(entry) => entry.name,
        None => {
            warn!(sequence, "hexagram sequence missing from name table");
            UNKNOWN_HEXAGRAM
        }
    }
}
