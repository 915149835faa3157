// Typed facet construction and the optional enrichment seam.
//
// Every facet kind listed in the schema is built from the record's own
// attributes after derivation. A caller can inject a `FacetSource` to
// replace any of those facets: when the source returns `Some` for a kind,
// that value is used; `None` falls back to the built-in builder. The source
// is chosen once at construction, so there is no probing for optional
// collaborators at lookup time.
//
// Built-in builders have preconditions:
// - art needs the `geometry` category
// - music needs the `frequency` attribute
// - game and science need an integer consciousness level
// - design and mathematics always apply
// A facet whose precondition fails is simply absent, which lowers the
// record's quality score.
//
// Sources must be pure functions of the record they are handed; otherwise
// `generate` stops being deterministic. The record passed in has its
// attributes and cross-references filled, and facets for kinds that come
// earlier in `FacetKind::ALL` already attached.

use crate::config::{FacetKind, GeneratorConfig};
use crate::record::{
    ArtFacet, ContentRecord, DesignFacet, GameFacet, MathematicsFacet, MusicFacet, ScienceFacet,
    attr,
};
use codex_lattice_tables::ratios::{PHI, fibonacci_position};

/// Optional supplier of richer facets.
///
/// Every method defaults to `None`, so an implementation only overrides the
/// kinds it knows about.
pub trait FacetSource: Send + Sync {
    fn art(&self, _record: &ContentRecord) -> Option<ArtFacet> {
        None
    }
    fn music(&self, _record: &ContentRecord) -> Option<MusicFacet> {
        None
    }
    fn game(&self, _record: &ContentRecord) -> Option<GameFacet> {
        None
    }
    fn design(&self, _record: &ContentRecord) -> Option<DesignFacet> {
        None
    }
    fn science(&self, _record: &ContentRecord) -> Option<ScienceFacet> {
        None
    }
    fn mathematics(&self, _record: &ContentRecord) -> Option<MathematicsFacet> {
        None
    }
}

/// Attach the facets named in `kinds` to `record`, in `FacetKind::ALL`
/// order regardless of the order `kinds` lists them.
pub(crate) fn attach(
    kinds: &[FacetKind],
    record: &mut ContentRecord,
    config: &GeneratorConfig,
    source: Option<&dyn FacetSource>,
) {
    for kind in FacetKind::ALL {
        if !kinds.contains(&kind) {
            continue;
        }
        let record_view: &ContentRecord = record;
        match kind {
            FacetKind::Art => {
                let facet = source
                    .and_then(|s| s.art(record_view))
                    .or_else(|| build_art(record_view, config));
                record.facets.art = facet;
            }
            FacetKind::Music => {
                let facet = source
                    .and_then(|s| s.music(record_view))
                    .or_else(|| build_music(record_view));
                record.facets.music = facet;
            }
            FacetKind::Game => {
                let facet = source
                    .and_then(|s| s.game(record_view))
                    .or_else(|| build_game(record_view));
                record.facets.game = facet;
            }
            FacetKind::Design => {
                let facet = source
                    .and_then(|s| s.design(record_view))
                    .or_else(|| Some(build_design(record_view)));
                record.facets.design = facet;
            }
            FacetKind::Science => {
                let facet = source
                    .and_then(|s| s.science(record_view))
                    .or_else(|| build_science(record_view));
                record.facets.science = facet;
            }
            FacetKind::Mathematics => {
                let facet = source
                    .and_then(|s| s.mathematics(record_view))
                    .or_else(|| Some(build_mathematics(record_view, config)));
                record.facets.mathematics = facet;
            }
        }
    }
}

/// Three bands of seven levels each, plus the top level folded into the
/// last band.
fn tier(level: u32) -> usize {
    (level / 7).min(2) as usize
}

fn build_art(record: &ContentRecord, config: &GeneratorConfig) -> Option<ArtFacet> {
    const STYLES: [&str; 3] = ["foundational", "transitional", "transcendent"];
    let geometry = record.category(attr::GEOMETRY)?;
    let level = record.level().unwrap_or(0);
    let palette = config
        .table("palette")
        .map(|colors| {
            (0..2)
                .map(|step| colors[(level as usize + step) % colors.len()].to_string())
                .collect()
        })
        .unwrap_or_default();
    Some(ArtFacet {
        geometry: geometry.to_string(),
        palette,
        style: STYLES[tier(level)].to_string(),
        three_dimensional: level >= 11,
        proportion: config.constant("phi").unwrap_or(PHI),
    })
}

fn build_music(record: &ContentRecord) -> Option<MusicFacet> {
    let frequency = record.derived_f64(attr::FREQUENCY)?;
    Some(MusicFacet {
        frequency,
        harmonics: (1..=5).map(|n| frequency * f64::from(n)).collect(),
        rhythm: record.category(attr::RHYTHM).map(str::to_string),
        scale: record.category(attr::SCALE).map(str::to_string),
        instrument: record.category(attr::INSTRUMENT).map(str::to_string),
    })
}

fn build_game(record: &ContentRecord) -> Option<GameFacet> {
    const PLAY_STYLES: [&str; 3] = ["exploration", "mastery", "transcendence"];
    let level = record.level()?;
    let mut mechanics = vec!["pattern recognition".to_string(), "resonance matching".to_string()];
    if let Some(element) = record.category(attr::ELEMENT) {
        mechanics.push(format!("{} attunement", element.to_lowercase()));
    }
    if level >= 11 {
        mechanics.push("synthesis".to_string());
    }
    let reward = match record.category(attr::ARCANA) {
        Some(arcana) => format!("{arcana} insight"),
        None => "hidden insight".to_string(),
    };
    Some(GameFacet {
        mechanics,
        challenge_level: level / 2,
        play_style: PLAY_STYLES[tier(level)].to_string(),
        reward,
    })
}

fn build_design(record: &ContentRecord) -> DesignFacet {
    const MODALITIES: [&str; 3] = ["visual", "spatial", "interactive"];
    let mut principles = vec![
        "Balance".to_string(),
        "Proportion".to_string(),
        "Rhythm".to_string(),
    ];
    if let Some(geometry) = record.category(attr::GEOMETRY) {
        principles.push(format!("{geometry} composition"));
    }
    DesignFacet {
        principles,
        modality: MODALITIES[record.index as usize % MODALITIES.len()].to_string(),
        professional_grade: true,
    }
}

fn build_science(record: &ContentRecord) -> Option<ScienceFacet> {
    let level = record.level()?;
    let hypothesis = match record.derived_f64(attr::FREQUENCY) {
        Some(hz) => format!("Level {level} resonance at {hz:.2} Hz is observable"),
        None => format!("Level {level} resonance is observable"),
    };
    Some(ScienceFacet {
        hypothesis,
        methodology: "controlled observation".to_string(),
        validation: "independent replication".to_string(),
        reproducible: true,
    })
}

fn build_mathematics(record: &ContentRecord, config: &GeneratorConfig) -> MathematicsFacet {
    let phi = config.constant("phi").unwrap_or(PHI);
    MathematicsFacet {
        structure: record
            .category(attr::GEOMETRY)
            .unwrap_or("Lattice")
            .to_string(),
        formula: format!("φ = {phi:.6}"),
        fibonacci_position: fibonacci_position(record.index),
        pattern: record
            .category("fractal")
            .unwrap_or("Fibonacci spiral")
            .to_string(),
    }
}
