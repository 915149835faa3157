// Viewing modes over a generated lattice.
//
// A record can be viewed through six modes, one per facet kind. Each mode
// has a relation of the same name in the node schema (`art` neighbours at
// ±1, `music` at ±2, and so on), and a fixed coherence with every other
// mode. `ModeSession` tracks a caller's current mode and records every
// switch with a sequence number; there are no timestamps, so a replayed
// sequence of switches produces an identical history.

use crate::config::FacetKind;
use crate::generator::IndexedContentGenerator;
use crate::record::ContentRecord;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Minimum score for a record to be offered in a mode.
pub const MODE_THRESHOLD: f64 = 0.5;

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Mode {
    Art,
    Music,
    Game,
    Design,
    Science,
    Mathematics,
}

impl Mode {
    pub const ALL: [Mode; 6] = [
        Mode::Art,
        Mode::Music,
        Mode::Game,
        Mode::Design,
        Mode::Science,
        Mode::Mathematics,
    ];

    /// Name of the cross-reference relation for this mode.
    pub fn relation(self) -> &'static str {
        match self {
            Mode::Art => "art",
            Mode::Music => "music",
            Mode::Game => "game",
            Mode::Design => "design",
            Mode::Science => "science",
            Mode::Mathematics => "mathematics",
        }
    }

    pub fn facet(self) -> FacetKind {
        match self {
            Mode::Art => FacetKind::Art,
            Mode::Music => FacetKind::Music,
            Mode::Game => FacetKind::Game,
            Mode::Design => FacetKind::Design,
            Mode::Science => FacetKind::Science,
            Mode::Mathematics => FacetKind::Mathematics,
        }
    }

    fn position(self) -> usize {
        self as usize
    }
}

impl std::str::FromStr for Mode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Mode::ALL
            .into_iter()
            .find(|mode| mode.relation() == s)
            .ok_or_else(|| format!("unknown mode '{s}'"))
    }
}

// Rows and columns follow `Mode::ALL`. Symmetric, with 1.0 on the diagonal.
const COHERENCE: [[f64; 6]; 6] = [
    [1.0, 0.9, 0.8, 0.9, 0.6, 0.7],
    [0.9, 1.0, 0.8, 0.7, 0.7, 0.8],
    [0.8, 0.8, 1.0, 0.9, 0.6, 0.6],
    [0.9, 0.7, 0.9, 1.0, 0.7, 0.7],
    [0.6, 0.7, 0.6, 0.7, 1.0, 0.9],
    [0.7, 0.8, 0.6, 0.7, 0.9, 1.0],
];

/// How smoothly a viewer moves from one mode to another, in (0, 1].
pub fn mode_coherence(from: Mode, to: Mode) -> f64 {
    COHERENCE[from.position()][to.position()]
}

/// Indices related to `record` in `mode`.
pub fn connections(record: &ContentRecord, mode: Mode) -> &[u32] {
    record.related(mode.relation())
}

/// Records that carry `mode`'s facet and score above `MODE_THRESHOLD`,
/// best first.
pub fn records_in_mode(generator: &IndexedContentGenerator, mode: Mode) -> Vec<Arc<ContentRecord>> {
    generator
        .ranked(MODE_THRESHOLD)
        .into_iter()
        .filter(|record| record.facets.has(mode.facet()))
        .collect()
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ModeTransition {
    pub sequence: u64,
    pub from: Mode,
    pub to: Mode,
    pub trigger: String,
    pub coherence: f64,
}

#[derive(Clone, Debug)]
pub struct ModeSession {
    current: Mode,
    history: Vec<ModeTransition>,
}

impl Default for ModeSession {
    fn default() -> Self {
        Self::new(Mode::Design)
    }
}

impl ModeSession {
    pub fn new(start: Mode) -> Self {
        Self {
            current: start,
            history: Vec::new(),
        }
    }

    pub fn current(&self) -> Mode {
        self.current
    }

    /// Switch to `to`, recording the transition. Switching to the current
    /// mode is recorded too, with coherence 1.0.
    pub fn transition(&mut self, to: Mode, trigger: &str) -> &ModeTransition {
        let entry = ModeTransition {
            sequence: self.history.len() as u64,
            from: self.current,
            to,
            trigger: trigger.to_string(),
            coherence: mode_coherence(self.current, to),
        };
        self.current = to;
        self.history.push(entry);
        &self.history[self.history.len() - 1]
    }

    pub fn transitions(&self) -> &[ModeTransition] {
        &self.history
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{GeneratorConfig, Schema};
    use codex_lattice_tables::default_tables;

    #[test]
    fn coherence_is_symmetric_with_unit_diagonal() {
        for a in Mode::ALL {
            assert_eq!(mode_coherence(a, a), 1.0);
            for b in Mode::ALL {
                assert_eq!(mode_coherence(a, b), mode_coherence(b, a));
                assert!(mode_coherence(a, b) > 0.0);
            }
        }
        assert_eq!(mode_coherence(Mode::Science, Mode::Mathematics), 0.9);
        assert_eq!(mode_coherence(Mode::Art, Mode::Science), 0.6);
    }

    #[test]
    fn modes_parse_from_relation_names() {
        for mode in Mode::ALL {
            assert_eq!(mode.relation().parse::<Mode>(), Ok(mode));
        }
        assert!("poetry".parse::<Mode>().is_err());
    }

    #[test]
    fn session_records_numbered_transitions() {
        let mut session = ModeSession::default();
        assert_eq!(session.current(), Mode::Design);
        let first = session.transition(Mode::Art, "click").clone();
        assert_eq!(first.sequence, 0);
        assert_eq!(first.from, Mode::Design);
        assert_eq!(first.coherence, 0.9);
        session.transition(Mode::Science, "keyboard");
        assert_eq!(session.current(), Mode::Science);
        let history = session.transitions();
        assert_eq!(history.len(), 2);
        assert_eq!(history[1].sequence, 1);
        assert_eq!(history[1].from, Mode::Art);
        assert_eq!(history[1].coherence, 0.6);
    }

    #[test]
    fn node_connections_per_mode() {
        let generator = IndexedContentGenerator::new(
            GeneratorConfig::codex_nodes(&default_tables()),
            Schema::codex_nodes(),
        )
        .unwrap();
        let record = generator.generate(0).unwrap();
        assert_eq!(connections(&record, Mode::Art), &[0, 1, 143]);
        assert_eq!(connections(&record, Mode::Mathematics), &[0, 11, 133]);
        let in_music = records_in_mode(&generator, Mode::Music);
        assert_eq!(in_music.len(), 144);
    }

    #[test]
    fn depth_lattice_has_no_art_mode() {
        let generator = IndexedContentGenerator::new(
            GeneratorConfig::codex_depths(&default_tables()),
            Schema::codex_depths(),
        )
        .unwrap();
        assert!(records_in_mode(&generator, Mode::Art).is_empty());
        let record = generator.generate(0).unwrap();
        assert!(connections(&record, Mode::Art).is_empty());
    }
}
