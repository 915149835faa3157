// Codex Lattice Generator
//
// Turns an integer index in `0..N` into a structured content record by
// applying a fixed set of transforms and cyclic table lookups. The same
// (config, schema, index) always yields the same record; there is no
// randomness, no clock, and no global state. Records carry categorical
// labels, derived numbers, cross-references to related indices, optional
// typed facets, and a completeness score.
//
// Architecture:
// - error.rs: `LatticeError` (index out of range, invalid configuration)
// - config.rs: `GeneratorConfig` data, `Schema` rules, presets, validation
// - record.rs: `ContentRecord`, `Facets`, and the typed facet structs
// - facets.rs: built-in facet builders and the injectable `FacetSource`
// - score.rs: quality score (fraction of populated slots)
// - generator.rs: `IndexedContentGenerator`: generate, generate_all,
//   find_by_predicate, cross_reference, score, ranked; optional LRU cache
// - modes.rs: viewing modes, mode coherence, `ModeSession` history
// - codex.rs: lookups by level, gate, chapel, and room
// - export.rs: JSON Lines read/write
//
// Static tables and ratio arithmetic live in `codex_lattice_tables`; the
// bounded cache lives in `codex_lattice_cache`.

pub mod codex;
pub mod config;
pub mod error;
pub mod export;
pub mod facets;
pub mod generator;
pub mod modes;
pub mod record;
pub mod score;

pub use config::{GeneratorConfig, Schema};
pub use error::LatticeError;
pub use facets::FacetSource;
pub use generator::{IndexedContentGenerator, Matches, cross_reference};
pub use record::ContentRecord;
