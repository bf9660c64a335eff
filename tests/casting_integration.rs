//! Integration tests for hexagram casting
//!
//! Tests the coin distribution, derived hexagrams and name lookup together

use divination::core::{lookup_name, CastReading, HexagramEngine, HEXAGRAMS};
use divination::types::{Hexagram, HexagramBuilder, Yao};
use divination::UNKNOWN_HEXAGRAM;

#[test]
fn test_toss_distribution_matches_three_coins() {
    let mut engine = HexagramEngine::seeded(2024);
    let mut counts = [0usize; 4];
    let tosses = 10_000;
    for _ in 0..tosses {
        let value = engine.toss_coins();
        assert!((6..=9).contains(&value));
        counts[(value - 6) as usize] += 1;
    }

    let expected = [1.0 / 8.0, 3.0 / 8.0, 3.0 / 8.0, 1.0 / 8.0];
    for (value, (&count, &p)) in counts.iter().zip(expected.iter()).enumerate() {
        let observed = count as f64 / tosses as f64;
        assert!(
            (observed - p).abs() < 0.02,
            "value {} observed {:.4}, expected {:.4}",
            value + 6,
            observed,
            p
        );
    }
}

#[test]
fn test_every_cast_is_well_formed() {
    let mut engine = HexagramEngine::seeded(99);
    for _ in 0..500 {
        let reading = engine.cast_reading();
        let sequence = &reading.original_sequence;
        assert_eq!(sequence.len(), 6);
        assert!(sequence.chars().all(|c| c == '0' || c == '1'));
        assert_ne!(reading.original_name, UNKNOWN_HEXAGRAM);

        match &reading.derived {
            None => assert!(reading.changing_lines.is_empty()),
            Some(derived) => {
                assert!(!derived.has_changing_lines());
                let original: Vec<char> = sequence.chars().collect();
                let flipped: Vec<char> = derived.to_binary_sequence().chars().collect();
                for position in 1..=6 {
                    let differs = original[position - 1] != flipped[position - 1];
                    assert_eq!(differs, reading.changing_lines.contains(&position));
                }
            }
        }
    }
}

#[test]
fn test_name_table_is_total_and_distinct() {
    let mut names: Vec<&str> = (0..64u8)
        .map(|bits| {
            let sequence: String = (0..6).map(|i| if bits >> i & 1 == 1 { '1' } else { '0' }).collect();
            lookup_name(&sequence)
        })
        .collect();
    assert!(names.iter().all(|name| *name != UNKNOWN_HEXAGRAM));
    names.sort_unstable();
    names.dedup();
    assert_eq!(names.len(), 64);
    assert_eq!(HEXAGRAMS.len(), 64);
}

#[test]
fn test_malformed_sequence_falls_back() {
    assert_eq!(lookup_name("1111"), UNKNOWN_HEXAGRAM);
    assert_eq!(lookup_name("11111x"), UNKNOWN_HEXAGRAM);
}

#[test]
fn test_builder_then_derive() {
    // 初九 and 上六 change: 水泽节 → 风水涣
    let mut builder = HexagramBuilder::new();
    for value in [9, 7, 8, 8, 7, 6] {
        builder.push(Yao::from_value(value).unwrap()).unwrap();
    }
    assert!(builder.push(Yao::from_value(7).unwrap()).is_err());
    let hexagram = builder.finish().unwrap();

    let reading = CastReading::from_hexagram(hexagram);
    assert_eq!(reading.original_sequence, "110010");
    assert_eq!(reading.changing_lines, vec![1, 6]);
    assert_eq!(reading.derived_sequence.as_deref(), Some("010011"));
    assert_eq!(reading.original_name, "水泽节");
    assert_eq!(reading.derived_name, Some("风水涣"));

    let payload = reading.to_payload();
    let derived = payload.derived.unwrap();
    assert_eq!(derived.changing_yaos, vec![1, 6]);
    assert_eq!(derived.sequence, "010011");
}

#[test]
fn test_derived_lines_are_young() {
    let hexagram = Hexagram::from_values(&[6, 9, 7, 8, 6, 9]).unwrap();
    let derived = hexagram.derive_changed().unwrap();
    let values: Vec<u8> = derived.lines().iter().map(Yao::value).collect();
    assert_eq!(values, vec![7, 8, 7, 8, 7, 8]);
}
