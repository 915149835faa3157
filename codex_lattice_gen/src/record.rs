// Generated content records and their typed facets.
//
// A `ContentRecord` is a pure function of (config, schema, facet source,
// index). It holds:
// - `derived`: numeric (or cyclic-table) attributes by name
// - `categorical`: table-drawn labels by name
// - `cross_references`: related indices by relation name
// - `facets`: optional typed sub-structures, one field per `FacetKind`
// - `quality_score`: completeness in [0, 1], see `score.rs`
//
// Every map is a `BTreeMap`, so serialized records have a stable key order
// and two records built from the same inputs are byte-identical as JSON.
//
// Facets are plain structs, not open-ended property bags: a record either
// has a `MusicFacet` or it doesn't, and when it does the fields are typed.

use crate::config::FacetKind;
use codex_lattice_tables::Scalar;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use std::collections::BTreeMap;

/// Attribute names shared by the presets, facet builders, and codex
/// lookups.
pub mod attr {
    pub const LEVEL: &str = "consciousness_level";
    pub const FREQUENCY: &str = "frequency";
    pub const ELEMENT: &str = "element";
    pub const ARCANA: &str = "arcana";
    pub const GEOMETRY: &str = "geometry";
    pub const RHYTHM: &str = "rhythm";
    pub const SCALE: &str = "scale";
    pub const INSTRUMENT: &str = "instrument";
    pub const PRIMARY_GATE: &str = "primary_gate";
    pub const HARMONIC_GATE: &str = "harmonic_gate";
    pub const SPIRAL_GATE: &str = "spiral_gate";
    pub const CHAPEL: &str = "chapel";
    pub const ROOM: &str = "room";
}

/// Related indices for one relation. Most relations have three or fewer
/// entries.
pub type Related = SmallVec<[u32; 4]>;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ContentRecord {
    pub index: u32,
    #[serde(default)]
    pub derived: BTreeMap<String, Scalar>,
    #[serde(default)]
    pub categorical: BTreeMap<String, String>,
    #[serde(default)]
    pub cross_references: BTreeMap<String, Related>,
    #[serde(default)]
    pub facets: Facets,
    pub quality_score: f64,
}

impl ContentRecord {
    /// An empty record for `index`; the generator fills it in.
    pub fn new(index: u32) -> Self {
        Self {
            index,
            derived: BTreeMap::new(),
            categorical: BTreeMap::new(),
            cross_references: BTreeMap::new(),
            facets: Facets::default(),
            quality_score: 0.0,
        }
    }

    pub fn derived_f64(&self, attribute: &str) -> Option<f64> {
        self.derived.get(attribute).and_then(Scalar::as_f64)
    }

    pub fn derived_i64(&self, attribute: &str) -> Option<i64> {
        self.derived.get(attribute).and_then(Scalar::as_i64)
    }

    pub fn category(&self, attribute: &str) -> Option<&str> {
        self.categorical.get(attribute).map(String::as_str)
    }

    /// Related indices for `relation`, empty if the relation is absent.
    pub fn related(&self, relation: &str) -> &[u32] {
        self.cross_references
            .get(relation)
            .map(|r| r.as_slice())
            .unwrap_or(&[])
    }

    /// The integer consciousness level, if this record has one in 0..=21.
    pub fn level(&self) -> Option<u32> {
        self.derived_i64(attr::LEVEL)
            .and_then(|level| u32::try_from(level).ok())
    }
}

impl AsRef<ContentRecord> for ContentRecord {
    fn as_ref(&self) -> &ContentRecord {
        self
    }
}

// ---------------------------------------------------------------------------
// Facets
// ---------------------------------------------------------------------------

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Facets {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub art: Option<ArtFacet>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub music: Option<MusicFacet>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub game: Option<GameFacet>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub design: Option<DesignFacet>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub science: Option<ScienceFacet>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mathematics: Option<MathematicsFacet>,
}

impl Facets {
    pub const COUNT: usize = FacetKind::ALL.len();

    pub fn has(&self, kind: FacetKind) -> bool {
        match kind {
            FacetKind::Art => self.art.is_some(),
            FacetKind::Music => self.music.is_some(),
            FacetKind::Game => self.game.is_some(),
            FacetKind::Design => self.design.is_some(),
            FacetKind::Science => self.science.is_some(),
            FacetKind::Mathematics => self.mathematics.is_some(),
        }
    }

    /// Number of facets present.
    pub fn populated(&self) -> usize {
        FacetKind::ALL.iter().filter(|&&kind| self.has(kind)).count()
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ArtFacet {
    pub geometry: String,
    pub palette: Vec<String>,
    pub style: String,
    pub three_dimensional: bool,
    pub proportion: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MusicFacet {
    pub frequency: f64,
    /// First five harmonics of `frequency`.
    pub harmonics: Vec<f64>,
    pub rhythm: Option<String>,
    pub scale: Option<String>,
    pub instrument: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GameFacet {
    pub mechanics: Vec<String>,
    pub challenge_level: u32,
    pub play_style: String,
    pub reward: String,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DesignFacet {
    pub principles: Vec<String>,
    pub modality: String,
    pub professional_grade: bool,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ScienceFacet {
    pub hypothesis: String,
    pub methodology: String,
    pub validation: String,
    pub reproducible: bool,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MathematicsFacet {
    pub structure: String,
    pub formula: String,
    pub fibonacci_position: u32,
    pub pattern: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> ContentRecord {
        let mut record = ContentRecord::new(7);
        record.derived.insert(attr::LEVEL.into(), Scalar::Int(7));
        record
            .derived
            .insert(attr::FREQUENCY.into(), Scalar::Float(440.5));
        record.categorical.insert(attr::ELEMENT.into(), "Fire".into());
        record
            .cross_references
            .insert("art".into(), Related::from_slice(&[7, 8, 6]));
        record
    }

    #[test]
    fn accessors() {
        let record = sample();
        assert_eq!(record.level(), Some(7));
        assert_eq!(record.derived_f64(attr::LEVEL), Some(7.0));
        assert_eq!(record.derived_i64(attr::FREQUENCY), None);
        assert_eq!(record.category(attr::ELEMENT), Some("Fire"));
        assert_eq!(record.related("art"), &[7, 8, 6]);
        assert!(record.related("music").is_empty());
    }

    #[test]
    fn negative_level_is_not_a_level() {
        let mut record = ContentRecord::new(0);
        record.derived.insert(attr::LEVEL.into(), Scalar::Int(-1));
        assert_eq!(record.level(), None);
    }

    #[test]
    fn absent_facets_are_omitted_from_json() {
        let mut record = sample();
        record.facets.design = Some(DesignFacet {
            principles: vec!["Balance".into()],
            modality: "visual".into(),
            professional_grade: true,
        });
        let json = serde_json::to_string(&record).unwrap();
        assert!(json.contains("\"design\""));
        assert!(!json.contains("\"music\":"));
        let restored: ContentRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(restored, record);
        assert_eq!(restored.facets.populated(), 1);
        assert!(restored.facets.has(FacetKind::Design));
        assert!(!restored.facets.has(FacetKind::Art));
    }
}
