// Test-only helpers for cross-crate lattice tests.
//
// Builds generators from the real presets and embedded tables, plus a small
// deterministic `FacetSource` so tests can exercise the enrichment seam the
// same way an embedding application would. Nothing here mocks derivation;
// every record comes from the same code paths as the `generate` binary.
//
// See also: `tests/full_pipeline.rs` for the integration scenarios.

use codex_lattice_gen::record::{ArtFacet, MusicFacet, attr};
use codex_lattice_gen::{ContentRecord, FacetSource, GeneratorConfig, IndexedContentGenerator, Schema};
use codex_lattice_tables::default_tables;

/// Generator over the 144-node preset.
pub fn node_generator() -> IndexedContentGenerator {
    IndexedContentGenerator::new(
        GeneratorConfig::codex_nodes(&default_tables()),
        Schema::codex_nodes(),
    )
    .expect("node preset is valid")
}

/// Generator over the 99-depth preset.
pub fn depth_generator() -> IndexedContentGenerator {
    IndexedContentGenerator::new(
        GeneratorConfig::codex_depths(&default_tables()),
        Schema::codex_depths(),
    )
    .expect("depth preset is valid")
}

/// Enrichment source that stamps art facets with the record's element and
/// tunes music to the record's solfeggio frequency. Declines records
/// without those attributes.
pub struct StampedSource;

impl FacetSource for StampedSource {
    fn art(&self, record: &ContentRecord) -> Option<ArtFacet> {
        let element = record.category(attr::ELEMENT)?;
        Some(ArtFacet {
            geometry: format!("{element} mandala"),
            palette: vec![format!("#{:06x}", record.index * 0x10101)],
            style: "stamped".to_string(),
            three_dimensional: false,
            proportion: 1.0,
        })
    }

    fn music(&self, record: &ContentRecord) -> Option<MusicFacet> {
        let hz = record.derived_f64("solfeggio")?;
        Some(MusicFacet {
            frequency: hz,
            harmonics: vec![hz, hz * 2.0],
            rhythm: None,
            scale: None,
            instrument: None,
        })
    }
}
