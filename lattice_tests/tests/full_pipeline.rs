// End-to-end tests across the tables, cache, and generator crates.
//
// Each test builds generators from the real presets (or from JSON, the way
// the `generate` binary does) and checks properties that only show up when
// the pieces run together: determinism across independent instances and
// threads, cache transparency, enrichment through an injected source, and
// JSON Lines persistence.

use std::sync::Arc;
use std::thread;

use codex_lattice_gen::export::{read_jsonl, write_jsonl};
use codex_lattice_gen::modes::{Mode, ModeSession, connections, records_in_mode};
use codex_lattice_gen::record::attr;
use codex_lattice_gen::score::quality_score;
use codex_lattice_gen::{GeneratorConfig, IndexedContentGenerator, LatticeError, Schema};
use lattice_tests::{StampedSource, depth_generator, node_generator};

#[test]
fn node_preset_cycles_elements_and_wraps_references() {
    let generator = node_generator();
    assert_eq!(generator.total_count(), 144);
    assert_eq!(generator.generate(0).unwrap().category(attr::ELEMENT), Some("Earth"));
    assert_eq!(generator.generate(5).unwrap().category(attr::ELEMENT), Some("Earth"));
    assert!(matches!(
        generator.generate(144),
        Err(LatticeError::IndexOutOfRange { index: 144, total: 144 })
    ));
    assert_eq!(generator.cross_reference(143, 5), 4);
}

#[test]
fn independent_generators_serialize_identically() {
    let mut first = Vec::new();
    let mut second = Vec::new();
    write_jsonl(&node_generator().generate_all(), &mut first).unwrap();
    write_jsonl(&node_generator().with_cache(7).generate_all(), &mut second).unwrap();
    assert_eq!(first, second);
}

#[test]
fn jsonl_round_trip_preserves_every_record() {
    let generator = node_generator();
    let records = generator.generate_all();
    let mut buffer = Vec::new();
    write_jsonl(&records, &mut buffer).unwrap();
    let restored = read_jsonl(buffer.as_slice()).unwrap();
    assert_eq!(restored.len(), 144);
    for (i, record) in restored.iter().enumerate() {
        assert_eq!(record.index as usize, i);
        assert_eq!(*record, *records[i]);
    }
}

#[test]
fn concurrent_lookups_agree_with_sequential_generation() {
    let expected = node_generator().generate_all();
    let shared = Arc::new(node_generator().with_cache(32));

    let handles: Vec<_> = (0..8i64)
        .map(|t| {
            let generator = Arc::clone(&shared);
            thread::spawn(move || {
                // Each thread walks the lattice with a different stride.
                let stride = 2 * t + 1;
                (0..144)
                    .map(|step| {
                        let index = (step * stride) % 144;
                        generator.generate(index).unwrap()
                    })
                    .collect::<Vec<_>>()
            })
        })
        .collect();

    for handle in handles {
        for record in handle.join().unwrap() {
            assert_eq!(*record, *expected[record.index as usize]);
        }
    }
    let stats = shared.cache_stats().unwrap();
    assert!(stats.len <= 32);
    assert!(stats.hits + stats.misses >= 8 * 144);
}

#[test]
fn injected_source_enriches_without_touching_attributes() {
    let plain = node_generator();
    let enriched = node_generator().with_facet_source(Arc::new(StampedSource));

    let before = plain.generate(0).unwrap();
    let after = enriched.generate(0).unwrap();
    assert_eq!(before.derived, after.derived);
    assert_eq!(before.categorical, after.categorical);
    assert_eq!(before.cross_references, after.cross_references);

    let art = after.facets.art.as_ref().unwrap();
    assert_eq!(art.geometry, "Earth mandala");
    let music = after.facets.music.as_ref().unwrap();
    assert_eq!(music.frequency, 174.0);
    assert_eq!(after.facets.game, before.facets.game);
}

#[test]
fn declining_source_falls_back_to_builtin_facets() {
    let plain = depth_generator();
    let enriched = depth_generator().with_facet_source(Arc::new(StampedSource));
    // Depth records have no element or solfeggio attribute.
    for index in [0, 50, 98] {
        assert_eq!(plain.generate(index).unwrap(), enriched.generate(index).unwrap());
    }
}

#[test]
fn depth_preset_stages_and_neighbours() {
    let generator = depth_generator();
    let first = generator.generate(0).unwrap();
    let last = generator.generate(98).unwrap();
    assert_eq!(first.category("alchemical_stage"), Some("Calcination"));
    assert_eq!(last.category("alchemical_stage"), Some("Fermentation"));
    assert_eq!(first.related("depths"), &[0, 1, 98, 21, 78]);
    assert_eq!(last.level(), Some(21));

    for record in generator.generate_all() {
        let dissolution = record.derived_i64("dissolution_level").unwrap();
        let coagulation = record.derived_i64("coagulation_level").unwrap();
        assert_eq!(dissolution + coagulation, 10);
        assert!(record.facets.art.is_none());
        assert!(record.facets.music.is_some());
    }
    assert!(generator.generate(99).is_err());
}

#[test]
fn scores_drop_monotonically_as_facets_are_removed() {
    let mut record = (*node_generator().generate(42).unwrap()).clone();
    let mut previous = quality_score(&record);
    assert_eq!(previous, 1.0);
    let strip: [fn(&mut codex_lattice_gen::ContentRecord); 6] = [
        |r| r.facets.art = None,
        |r| r.facets.music = None,
        |r| r.facets.game = None,
        |r| r.facets.design = None,
        |r| r.facets.science = None,
        |r| r.facets.mathematics = None,
    ];
    for remove in strip {
        remove(&mut record);
        let score = quality_score(&record);
        assert!(score < previous);
        assert!(score >= 0.0);
        previous = score;
    }
    assert!((previous - 3.0 / 9.0).abs() < 1e-12);
}

#[test]
fn json_config_and_schema_drive_generation() {
    let config = GeneratorConfig::from_json(
        r#"{
            "total_count": 12,
            "cyclic_tables": {"notes": ["C", "D", "E", "F", "G", "A", "B"]},
            "scaling_constants": {"semitone": 1.0594630943592953}
        }"#,
    )
    .unwrap();
    let schema = Schema::from_json(
        r#"{
            "categorical": [{"attribute": "note", "table": "notes"}],
            "derived": [
                {"attribute": "frequency", "transform":
                    {"kind": "exponential", "base": 440.0, "ratio": "semitone", "period": 12}},
                {"attribute": "octave", "transform":
                    {"kind": "linear", "key": {"bucket": 7}, "scale": 1.0, "offset": 4.0, "rounding": "floor"}}
            ],
            "relations": [{"name": "fifth", "offsets": [7]}],
            "facets": ["music"]
        }"#,
    )
    .unwrap();
    let generator = IndexedContentGenerator::new(config, schema).unwrap();

    let a = generator.generate(0).unwrap();
    assert_eq!(a.category("note"), Some("C"));
    assert_eq!(a.derived_f64("frequency"), Some(440.0));
    assert_eq!(a.derived_i64("octave"), Some(4));
    assert_eq!(a.related("fifth"), &[7]);

    let b = generator.generate(8).unwrap();
    assert_eq!(b.category("note"), Some("D"));
    assert_eq!(b.derived_i64("octave"), Some(5));
    assert_eq!(b.related("fifth"), &[3]);
    assert!(b.facets.music.is_some());
    assert!(b.facets.art.is_none());
}

#[test]
fn every_accepted_config_round_trips_through_jsonl() {
    let config = |total: i64| {
        GeneratorConfig::from_json(&format!(
            r#"{{
                "total_count": {total},
                "cyclic_tables": {{"notes": ["C", "D", "E"]}},
                "scaling_constants": {{"tenfold": 10.0}}
            }}"#
        ))
        .unwrap()
    };
    let schema = Schema::from_json(
        r#"{
            "derived": [
                {"attribute": "growth", "transform":
                    {"kind": "exponential", "base": 1.0, "ratio": "tenfold", "period": 400}},
                {"attribute": "step", "transform":
                    {"kind": "linear", "scale": 2.5e16, "rounding": "floor"}}
            ]
        }"#,
    )
    .unwrap();

    // At 400 records growth reaches 10^399 and step passes i64::MAX.
    assert!(matches!(
        IndexedContentGenerator::new(config(400), schema.clone()),
        Err(LatticeError::ConfigurationInvalid(_))
    ));
    assert!(matches!(
        IndexedContentGenerator::new(config(-3), schema.clone()),
        Err(LatticeError::ConfigurationInvalid(_))
    ));

    let generator = IndexedContentGenerator::new(config(300), schema).unwrap();
    let records = generator.generate_all();
    let mut buffer = Vec::new();
    write_jsonl(&records, &mut buffer).unwrap();
    let restored = read_jsonl(buffer.as_slice()).unwrap();
    assert_eq!(restored.len(), 300);
    for (record, original) in restored.iter().zip(&records) {
        assert_eq!(*record, **original);
    }
}

#[test]
fn mode_walk_over_node_lattice() {
    let generator = node_generator();
    let mut session = ModeSession::new(Mode::Art);
    let mut position = 0u32;
    for mode in [Mode::Music, Mode::Mathematics, Mode::Science] {
        session.transition(mode, "navigate");
        let record = generator.generate(i64::from(position)).unwrap();
        // Step to the forward neighbour in the new mode.
        position = connections(&record, mode)[1];
    }
    assert_eq!(position, 2 + 11 + 7);
    assert_eq!(session.transitions().len(), 3);
    assert_eq!(records_in_mode(&generator, Mode::Game).len(), 144);

    let summary: Vec<_> = session
        .transitions()
        .iter()
        .map(|t| serde_json::to_value(t).unwrap())
        .collect();
    assert_eq!(summary[0]["from"], "art");
    assert_eq!(summary[2]["to"], "science");
}
