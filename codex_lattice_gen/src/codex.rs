// Placement lookups over the node lattice.
//
// The node schema places every record on three gates, in a chapel (18
// folios each) and a room. These helpers are thin filters over
// `find_by_predicate`, so they return records in ascending index order and
// work with any schema that defines the same attribute names. A schema
// without them simply matches nothing.

use crate::generator::IndexedContentGenerator;
use crate::record::{ContentRecord, attr};
use std::sync::Arc;

pub const FOLIOS_PER_CHAPEL: u32 = 18;

fn matching(
    generator: &IndexedContentGenerator,
    predicate: impl Fn(&ContentRecord) -> bool,
) -> Vec<Arc<ContentRecord>> {
    generator.find_by_predicate(predicate).iter().collect()
}

/// Records at consciousness level `level`.
pub fn by_level(generator: &IndexedContentGenerator, level: u32) -> Vec<Arc<ContentRecord>> {
    matching(generator, |record| record.level() == Some(level))
}

/// Records mapped onto `gate` by their primary, harmonic, or spiral gate.
pub fn for_gate(generator: &IndexedContentGenerator, gate: u32) -> Vec<Arc<ContentRecord>> {
    let gate = i64::from(gate);
    matching(generator, |record| {
        [attr::PRIMARY_GATE, attr::HARMONIC_GATE, attr::SPIRAL_GATE]
            .iter()
            .any(|&name| record.derived_i64(name) == Some(gate))
    })
}

/// Records in chapel `chapel` (1-based).
pub fn for_chapel(generator: &IndexedContentGenerator, chapel: u32) -> Vec<Arc<ContentRecord>> {
    let chapel = i64::from(chapel);
    matching(generator, |record| record.derived_i64(attr::CHAPEL) == Some(chapel))
}

/// Records in room `room` (1-based).
pub fn for_room(generator: &IndexedContentGenerator, room: u32) -> Vec<Arc<ContentRecord>> {
    let room = i64::from(room);
    matching(generator, |record| record.derived_i64(attr::ROOM) == Some(room))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{GeneratorConfig, Schema};
    use codex_lattice_tables::default_tables;
    use codex_lattice_tables::ratios::{
        GATE_COUNT, LEVEL_COUNT, NODE_COUNT, gate_to_nodes, level_to_frequency, node_to_gates,
    };

    fn nodes() -> IndexedContentGenerator {
        IndexedContentGenerator::new(
            GeneratorConfig::codex_nodes(&default_tables()),
            Schema::codex_nodes(),
        )
        .unwrap()
        .with_cache(NODE_COUNT as usize)
    }

    fn indices(records: &[Arc<ContentRecord>]) -> Vec<u32> {
        records.iter().map(|r| r.index).collect()
    }

    #[test]
    fn gate_attributes_match_gate_mapping() {
        let generator = nodes();
        for record in generator.generate_all() {
            let gates = node_to_gates(record.index);
            assert_eq!(record.derived_i64(attr::PRIMARY_GATE), Some(i64::from(gates.primary)));
            assert_eq!(record.derived_i64(attr::HARMONIC_GATE), Some(i64::from(gates.harmonic)));
            assert_eq!(record.derived_i64(attr::SPIRAL_GATE), Some(i64::from(gates.spiral)));
        }
    }

    #[test]
    fn for_gate_agrees_with_gate_to_nodes() {
        let generator = nodes();
        for gate in [1, 2, 50, GATE_COUNT, GATE_COUNT + 1] {
            assert_eq!(
                indices(&for_gate(&generator, gate)),
                gate_to_nodes(gate, NODE_COUNT),
                "gate {gate}"
            );
        }
    }

    #[test]
    fn chapels_hold_eighteen_folios() {
        let generator = nodes();
        let first = for_chapel(&generator, 1);
        assert_eq!(indices(&first), (0..FOLIOS_PER_CHAPEL).collect::<Vec<_>>());
        assert_eq!(for_chapel(&generator, 8).len(), 18);
        assert!(for_chapel(&generator, 9).is_empty());
    }

    #[test]
    fn levels_partition_the_lattice() {
        let generator = nodes();
        let total: usize = (0..LEVEL_COUNT).map(|l| by_level(&generator, l).len()).sum();
        assert_eq!(total, NODE_COUNT as usize);
        assert_eq!(indices(&by_level(&generator, 0)), vec![0, 22, 44, 66, 88, 110, 132]);
    }

    #[test]
    fn level_frequency_follows_solfeggio_span() {
        let generator = nodes();
        for level in 0..LEVEL_COUNT {
            for record in by_level(&generator, level) {
                let hz = record.derived_f64("level_frequency").unwrap();
                assert!((hz - level_to_frequency(level)).abs() < 1e-9);
            }
        }
    }

    #[test]
    fn rooms_cover_every_node() {
        let generator = nodes();
        let total: usize = (1..=GATE_COUNT + 1).map(|room| for_room(&generator, room).len()).sum();
        assert_eq!(total, NODE_COUNT as usize);
        assert!(for_room(&generator, 0).is_empty());
    }
}
