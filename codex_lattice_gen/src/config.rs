// Data-driven generator configuration and derivation schema.
//
// `GeneratorConfig` is the data: how many records exist (`total_count`),
// the cyclic tables they draw from, and the named scaling constants. It is
// loaded from JSON or built from `codex_lattice_tables::Tables`.
//
// `Schema` is the recipe: which categorical attributes come from which
// table, which numeric attributes come from which transform, which
// cross-reference relations to build, and which typed facets to attach.
// Rules refer to tables and constants by name, so changing a config value
// changes every record that reads it, deterministically.
//
// Three transforms cover every numeric attribute:
// - `Linear`:      `round?((key * scale) rem wrap) + offset`
// - `Exponential`: `base * ratio ^ ((index mod period) / divisor)`
// - `Cyclic`:      `table[key mod len]`
// where `key` is an `IndexKey`: `((index * stride + shift) / bucket) mod modulus`.
//
// `GeneratorConfig::validate` rejects anything that would divide by zero or
// dangle at derivation time, and any transform whose output leaves the
// finite range (or the `i64` range, when rounded) for some index in
// `0..total_count`. A validated (config, schema) pair derives every index
// without failing, and every derived value survives a JSON round trip.
//
// The range check relies on monotonicity: a linear transform is monotone in
// its key, the key never decreases as the index grows (before the modulus),
// and `ratio ^ x` is monotone in `x` for a positive ratio. So the outputs at
// the two ends of the reachable input range bound every other output.
//
// Named presets (`codex_nodes`, `codex_depths`) mirror the 144-node and
// 99-depth lattices.
//
// See also: `generator.rs`, which validates on construction and applies the
// rules; `record.rs` for the attribute names the presets use.

use crate::error::{LatticeError, invalid};
use crate::record::attr;
use codex_lattice_tables::ratios::{DEPTH_COUNT, GATE_COUNT, LEVEL_COUNT, NODE_COUNT};
use codex_lattice_tables::{Scalar, Tables};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::num::NonZeroU32;

// ---------------------------------------------------------------------------
// Configuration data
// ---------------------------------------------------------------------------

/// Record count, cyclic tables, and scaling constants.
///
/// `total_count` is signed so that a zero or negative count in JSON parses
/// and is then rejected by `validate` as an invalid configuration.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GeneratorConfig {
    pub total_count: i64,
    #[serde(default)]
    pub cyclic_tables: BTreeMap<String, Vec<Scalar>>,
    #[serde(default)]
    pub scaling_constants: BTreeMap<String, f64>,
}

impl GeneratorConfig {
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// A config over `total_count` records reading every table and constant
    /// in `tables`.
    pub fn from_tables(total_count: u32, tables: &Tables) -> Self {
        Self {
            total_count: i64::from(total_count),
            cyclic_tables: tables.tables.clone(),
            scaling_constants: tables.constants.clone(),
        }
    }

    /// The 144-node lattice.
    pub fn codex_nodes(tables: &Tables) -> Self {
        Self::from_tables(NODE_COUNT, tables)
    }

    /// The 99-depth lattice.
    pub fn codex_depths(tables: &Tables) -> Self {
        Self::from_tables(DEPTH_COUNT, tables)
    }

    pub fn table(&self, name: &str) -> Option<&[Scalar]> {
        self.cyclic_tables.get(name).map(Vec::as_slice)
    }

    pub fn constant(&self, name: &str) -> Option<f64> {
        self.scaling_constants.get(name).copied()
    }

    /// `total_count` as a record count. Counts outside `1..=u32::MAX` are
    /// invalid.
    pub fn record_count(&self) -> Result<NonZeroU32, LatticeError> {
        u32::try_from(self.total_count)
            .ok()
            .and_then(NonZeroU32::new)
            .ok_or_else(|| {
                invalid(format!(
                    "total_count must be in 1..={}, got {}",
                    u32::MAX,
                    self.total_count
                ))
            })
    }

    /// Check that every rule in `schema` can be applied to every index.
    pub fn validate(&self, schema: &Schema) -> Result<(), LatticeError> {
        let total = self.record_count()?;
        for (name, values) in &self.cyclic_tables {
            if values.is_empty() {
                return Err(invalid(format!("cyclic table '{name}' is empty")));
            }
        }
        for (name, value) in &self.scaling_constants {
            if !value.is_finite() {
                return Err(invalid(format!("scaling constant '{name}' is not finite")));
            }
        }

        let mut attributes = BTreeSet::new();
        for rule in &schema.categorical {
            claim(&mut attributes, &rule.attribute)?;
            self.require_table(&rule.table, &rule.attribute)?;
            rule.key.validate(&rule.attribute)?;
        }
        for rule in &schema.derived {
            claim(&mut attributes, &rule.attribute)?;
            self.validate_transform(&rule.transform, &rule.attribute, total)?;
        }

        let mut relations = BTreeSet::new();
        for rule in &schema.relations {
            if !relations.insert(rule.name.as_str()) {
                return Err(invalid(format!("relation '{}' is defined twice", rule.name)));
            }
        }
        Ok(())
    }

    fn validate_transform(
        &self,
        transform: &Transform,
        attribute: &str,
        total: NonZeroU32,
    ) -> Result<(), LatticeError> {
        match transform {
            Transform::Linear(linear) => {
                linear.key.validate(attribute)?;
                let scale = self.require_constant(&linear.scale, attribute)?;
                let offset = self.require_constant(&linear.offset, attribute)?;
                let wrap = match &linear.wrap {
                    Some(wrap) => {
                        let wrap = self.require_constant(wrap, attribute)?;
                        if wrap <= 0.0 {
                            return Err(invalid(format!("'{attribute}': wrap must be positive")));
                        }
                        Some(wrap)
                    }
                    None => None,
                };
                let top = linear.key.max_over(total) as f64 * scale;
                if !top.is_finite() {
                    return Err(non_finite(attribute));
                }
                // Wrapped values lie in [0, wrap).
                let high = wrap.unwrap_or(top);
                check_output(
                    attribute,
                    [offset, high + offset],
                    linear.rounding != Rounding::Exact,
                )?;
            }
            Transform::Exponential(exp) => {
                let base = self.require_constant(&exp.base, attribute)?;
                let ratio = self.require_constant(&exp.ratio, attribute)?;
                if ratio <= 0.0 {
                    return Err(invalid(format!("'{attribute}': ratio must be positive")));
                }
                if exp.period == 0 {
                    return Err(invalid(format!("'{attribute}': period must be positive")));
                }
                if exp.divisor == 0.0 || !exp.divisor.is_finite() {
                    return Err(invalid(format!(
                        "'{attribute}': divisor must be finite and non-zero"
                    )));
                }
                let reach = exp.period.min(u64::from(total.get())) - 1;
                let exponent = reach as f64 / exp.divisor;
                check_output(attribute, [base, base * ratio.powf(exponent)], false)?;
            }
            Transform::Cyclic(cyclic) => {
                self.require_table(&cyclic.table, attribute)?;
                cyclic.key.validate(attribute)?;
            }
        }
        Ok(())
    }

    fn require_table(&self, table: &str, attribute: &str) -> Result<(), LatticeError> {
        match self.table(table) {
            Some(_) => Ok(()),
            None => Err(invalid(format!(
                "'{attribute}' reads missing cyclic table '{table}'"
            ))),
        }
    }

    fn require_constant(&self, value: &ConstRef, attribute: &str) -> Result<f64, LatticeError> {
        match value.resolve(self) {
            Some(v) if v.is_finite() => Ok(v),
            Some(_) => Err(invalid(format!("'{attribute}' uses a non-finite constant"))),
            None => Err(invalid(format!(
                "'{attribute}' reads missing scaling constant '{value}'"
            ))),
        }
    }
}

fn non_finite(attribute: &str) -> LatticeError {
    invalid(format!("'{attribute}' produces non-finite values"))
}

/// Reject a transform whose outputs at the ends of its reachable range are
/// not finite, or do not fit an `i64` when the result is rounded.
fn check_output(attribute: &str, ends: [f64; 2], integral: bool) -> Result<(), LatticeError> {
    // i64 holds [-2^63, 2^63).
    const INT_LIMIT: f64 = 9_223_372_036_854_775_808.0;
    for value in ends {
        if !value.is_finite() {
            return Err(non_finite(attribute));
        }
        if integral && !(-INT_LIMIT..INT_LIMIT).contains(&value) {
            return Err(invalid(format!("'{attribute}' overflows the integer range")));
        }
    }
    Ok(())
}

fn claim<'a>(seen: &mut BTreeSet<&'a str>, attribute: &'a str) -> Result<(), LatticeError> {
    if seen.insert(attribute) {
        Ok(())
    } else {
        Err(invalid(format!("attribute '{attribute}' is derived twice")))
    }
}

// ---------------------------------------------------------------------------
// Rule building blocks
// ---------------------------------------------------------------------------

/// A number used by a rule: either a literal or the name of a scaling
/// constant. In JSON, `2.0` is a literal and `"phi"` is a reference.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ConstRef {
    Value(f64),
    Named(String),
}

impl ConstRef {
    pub fn resolve(&self, config: &GeneratorConfig) -> Option<f64> {
        match self {
            ConstRef::Value(v) => Some(*v),
            ConstRef::Named(name) => config.constant(name),
        }
    }
}

impl std::fmt::Display for ConstRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConstRef::Value(v) => write!(f, "{v}"),
            ConstRef::Named(name) => f.write_str(name),
        }
    }
}

impl From<f64> for ConstRef {
    fn from(v: f64) -> Self {
        ConstRef::Value(v)
    }
}

impl From<&str> for ConstRef {
    fn from(name: &str) -> Self {
        ConstRef::Named(name.to_string())
    }
}

fn one() -> u64 {
    1
}

fn zero_const() -> ConstRef {
    ConstRef::Value(0.0)
}

fn one_f64() -> f64 {
    1.0
}

/// Integer key computed from a record index:
/// `((index * stride + shift) / bucket) mod modulus`.
///
/// Every field is optional in JSON; `{}` is the identity key.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexKey {
    #[serde(default = "one")]
    pub stride: u64,
    #[serde(default)]
    pub shift: u64,
    #[serde(default = "one")]
    pub bucket: u64,
    #[serde(default)]
    pub modulus: Option<u64>,
}

impl Default for IndexKey {
    fn default() -> Self {
        Self::identity()
    }
}

impl IndexKey {
    pub const fn identity() -> Self {
        Self {
            stride: 1,
            shift: 0,
            bucket: 1,
            modulus: None,
        }
    }

    /// `index mod m`.
    pub const fn modulo(m: u64) -> Self {
        Self {
            modulus: Some(m),
            ..Self::identity()
        }
    }

    /// `index / b`.
    pub const fn bucket(b: u64) -> Self {
        Self {
            bucket: b,
            ..Self::identity()
        }
    }

    /// `(index * stride) / bucket`, i.e. `floor(index / bucket * stride)` without
    /// going through floats.
    pub const fn scaled(stride: u64, bucket: u64) -> Self {
        Self {
            stride,
            bucket,
            ..Self::identity()
        }
    }

    pub fn apply(&self, index: u32) -> u64 {
        // u128 so that large strides cannot overflow before the division.
        let raw = (u128::from(index) * u128::from(self.stride) + u128::from(self.shift))
            / u128::from(self.bucket);
        let key = match self.modulus {
            Some(m) => raw % u128::from(m),
            None => raw,
        };
        u64::try_from(key).unwrap_or(u64::MAX)
    }

    /// Largest key any index in `0..total` reaches. Before the modulus the
    /// key never decreases as the index grows.
    pub fn max_over(&self, total: NonZeroU32) -> u64 {
        let unwrapped = Self {
            modulus: None,
            ..*self
        }
        .apply(total.get() - 1);
        match self.modulus {
            Some(m) => unwrapped.min(m.saturating_sub(1)),
            None => unwrapped,
        }
    }

    fn validate(&self, attribute: &str) -> Result<(), LatticeError> {
        if self.bucket == 0 {
            return Err(invalid(format!("'{attribute}': key bucket must be positive")));
        }
        if self.modulus == Some(0) {
            return Err(invalid(format!("'{attribute}': key modulus must be positive")));
        }
        Ok(())
    }
}

/// How a linear transform's result is rounded. Rounded results are stored
/// as integer scalars.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Rounding {
    #[default]
    Exact,
    Floor,
    Round,
}

impl Rounding {
    fn apply(self, value: f64) -> f64 {
        match self {
            Rounding::Exact => value,
            Rounding::Floor => value.floor(),
            Rounding::Round => value.round(),
        }
    }

    /// Round `value`, add `offset`, and emit the scalar.
    pub fn finish(self, value: f64, offset: f64) -> Scalar {
        let total = self.apply(value) + offset;
        match self {
            Rounding::Exact => Scalar::Float(total),
            // Validation keeps rounded outputs inside the i64 range.
            Rounding::Floor | Rounding::Round => Scalar::Int(self.apply(total) as i64),
        }
    }
}

/// `round?((key * scale) rem wrap) + offset`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Linear {
    #[serde(default)]
    pub key: IndexKey,
    pub scale: ConstRef,
    #[serde(default = "zero_const")]
    pub offset: ConstRef,
    #[serde(default)]
    pub wrap: Option<ConstRef>,
    #[serde(default)]
    pub rounding: Rounding,
}

impl Linear {
    pub fn new(key: IndexKey, scale: impl Into<ConstRef>) -> Self {
        Self {
            key,
            scale: scale.into(),
            offset: zero_const(),
            wrap: None,
            rounding: Rounding::Exact,
        }
    }

    pub fn offset(mut self, offset: impl Into<ConstRef>) -> Self {
        self.offset = offset.into();
        self
    }

    pub fn wrap(mut self, wrap: impl Into<ConstRef>) -> Self {
        self.wrap = Some(wrap.into());
        self
    }

    pub fn floor(mut self) -> Self {
        self.rounding = Rounding::Floor;
        self
    }

    pub fn round(mut self) -> Self {
        self.rounding = Rounding::Round;
        self
    }
}

/// `base * ratio ^ ((index mod period) / divisor)`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Exponential {
    pub base: ConstRef,
    pub ratio: ConstRef,
    pub period: u64,
    #[serde(default = "one_f64")]
    pub divisor: f64,
}

impl Exponential {
    pub fn new(base: impl Into<ConstRef>, ratio: impl Into<ConstRef>, period: u64) -> Self {
        Self {
            base: base.into(),
            ratio: ratio.into(),
            period,
            divisor: 1.0,
        }
    }

    pub fn divisor(mut self, divisor: f64) -> Self {
        self.divisor = divisor;
        self
    }
}

/// `table[key mod len]`, kept as whatever scalar the table holds.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Cyclic {
    pub table: String,
    #[serde(default)]
    pub key: IndexKey,
}

impl Cyclic {
    pub fn new(table: &str, key: IndexKey) -> Self {
        Self {
            table: table.to_string(),
            key,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Transform {
    Linear(Linear),
    Exponential(Exponential),
    Cyclic(Cyclic),
}

impl From<Linear> for Transform {
    fn from(t: Linear) -> Self {
        Transform::Linear(t)
    }
}

impl From<Exponential> for Transform {
    fn from(t: Exponential) -> Self {
        Transform::Exponential(t)
    }
}

impl From<Cyclic> for Transform {
    fn from(t: Cyclic) -> Self {
        Transform::Cyclic(t)
    }
}

// ---------------------------------------------------------------------------
// Schema
// ---------------------------------------------------------------------------

/// `categorical[attribute] = table[key mod len]`, rendered as text.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CategoricalRule {
    pub attribute: String,
    pub table: String,
    #[serde(default)]
    pub key: IndexKey,
}

impl CategoricalRule {
    pub fn new(attribute: &str, table: &str, key: IndexKey) -> Self {
        Self {
            attribute: attribute.to_string(),
            table: table.to_string(),
            key,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DerivedRule {
    pub attribute: String,
    pub transform: Transform,
}

impl DerivedRule {
    pub fn new(attribute: &str, transform: impl Into<Transform>) -> Self {
        Self {
            attribute: attribute.to_string(),
            transform: transform.into(),
        }
    }
}

/// `cross_references[name] = [index?, (index + offset) mod N, ...]`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RelationRule {
    pub name: String,
    pub offsets: Vec<i64>,
    #[serde(default)]
    pub include_self: bool,
}

impl RelationRule {
    pub fn new(name: &str, offsets: Vec<i64>) -> Self {
        Self {
            name: name.to_string(),
            offsets,
            include_self: false,
        }
    }

    /// The record itself plus its neighbours `distance` steps either side.
    pub fn symmetric(name: &str, distance: i64) -> Self {
        Self::new(name, vec![distance, -distance]).with_self()
    }

    pub fn with_self(mut self) -> Self {
        self.include_self = true;
        self
    }
}

/// The typed sub-structures a record can carry.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FacetKind {
    Art,
    Music,
    Game,
    Design,
    Science,
    Mathematics,
}

impl FacetKind {
    pub const ALL: [FacetKind; 6] = [
        FacetKind::Art,
        FacetKind::Music,
        FacetKind::Game,
        FacetKind::Design,
        FacetKind::Science,
        FacetKind::Mathematics,
    ];
}

/// Derivation rules applied to every index.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Schema {
    #[serde(default)]
    pub categorical: Vec<CategoricalRule>,
    #[serde(default)]
    pub derived: Vec<DerivedRule>,
    #[serde(default)]
    pub relations: Vec<RelationRule>,
    #[serde(default)]
    pub facets: Vec<FacetKind>,
}

impl Schema {
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Schema for the 144-node lattice: alchemical and astrological
    /// correspondences, level-keyed musical tables, three gate mappings,
    /// chapel/room placement, six mode relations, and every facet.
    pub fn codex_nodes() -> Self {
        let id = IndexKey::identity();
        let level = IndexKey::modulo(u64::from(LEVEL_COUNT));
        let gates = u64::from(GATE_COUNT);
        let gate_wrap = f64::from(GATE_COUNT);
        Self {
            categorical: vec![
                CategoricalRule::new(attr::ELEMENT, "elements", id),
                CategoricalRule::new("planet", "planets", id),
                CategoricalRule::new("metal", "metals", id),
                CategoricalRule::new("direction", "directions", id),
                CategoricalRule::new(attr::ARCANA, "arcana", level),
                CategoricalRule::new(attr::GEOMETRY, "geometry", id),
                CategoricalRule::new(attr::RHYTHM, "rhythms", id),
                CategoricalRule::new(attr::SCALE, "scales", level),
                CategoricalRule::new(attr::INSTRUMENT, "instruments", level),
                CategoricalRule::new("sign", "zodiac", id),
                CategoricalRule::new("sephira", "sephirot", level),
                CategoricalRule::new("trigram", "trigrams", id),
                CategoricalRule::new("fractal", "fractal_patterns", id),
                CategoricalRule::new("soyga_table", "soyga_tables", IndexKey::bucket(36)),
            ],
            derived: vec![
                DerivedRule::new(attr::LEVEL, Linear::new(level, 1.0).floor()),
                DerivedRule::new(
                    attr::FREQUENCY,
                    Exponential::new("base_frequency", "phi", 12).divisor(12.0),
                ),
                DerivedRule::new(
                    "level_frequency",
                    Linear::new(level, "level_frequency_step").offset("level_frequency_floor"),
                ),
                DerivedRule::new("solfeggio", Cyclic::new("solfeggio", level)),
                DerivedRule::new(
                    attr::PRIMARY_GATE,
                    Linear::new(IndexKey::modulo(gates), 1.0).offset(1.0).floor(),
                ),
                DerivedRule::new(
                    attr::HARMONIC_GATE,
                    Linear::new(id, "phi").wrap(gate_wrap).offset(1.0).round(),
                ),
                DerivedRule::new(
                    attr::SPIRAL_GATE,
                    Linear::new(id, "cathedral_ratio").wrap(gate_wrap).offset(1.0).round(),
                ),
                DerivedRule::new(
                    attr::CHAPEL,
                    Linear::new(IndexKey::bucket(18), 1.0).offset(1.0).floor(),
                ),
                DerivedRule::new(
                    attr::ROOM,
                    Linear::new(id, "cathedral_ratio").wrap(gate_wrap).offset(1.0).round(),
                ),
                DerivedRule::new("intensity", Linear::new(IndexKey::modulo(100), 0.01)),
                DerivedRule::new(
                    "fractal_depth",
                    Linear::new(IndexKey::bucket(28), 1.0).offset(3.0).floor(),
                ),
            ],
            relations: vec![
                RelationRule::symmetric("art", 1),
                RelationRule::symmetric("music", 2),
                RelationRule::symmetric("game", 3),
                RelationRule::symmetric("design", 5),
                RelationRule::symmetric("science", 7),
                RelationRule::symmetric("mathematics", 11),
            ],
            facets: FacetKind::ALL.to_vec(),
        }
    }

    /// Schema for the 99-depth lattice: evolution and dissolution levels,
    /// the alchemical stage, golden-spaced frequencies, and neighbouring
    /// depths. Only the music and mathematics facets apply.
    pub fn codex_depths() -> Self {
        let evolution = IndexKey::scaled(u64::from(LEVEL_COUNT), u64::from(DEPTH_COUNT));
        let dissolution = IndexKey::scaled(11, u64::from(DEPTH_COUNT));
        Self {
            categorical: vec![CategoricalRule::new(
                "alchemical_stage",
                "alchemical_stages",
                dissolution,
            )],
            derived: vec![
                DerivedRule::new(attr::LEVEL, Linear::new(evolution, 1.0).floor()),
                DerivedRule::new("dissolution_level", Linear::new(dissolution, 1.0).floor()),
                DerivedRule::new(
                    "coagulation_level",
                    Linear::new(dissolution, -1.0).offset(10.0).floor(),
                ),
                DerivedRule::new(
                    attr::FREQUENCY,
                    Linear::new(IndexKey::identity(), "phi").offset("base_frequency"),
                ),
                DerivedRule::new(
                    attr::PRIMARY_GATE,
                    Linear::new(IndexKey::modulo(u64::from(GATE_COUNT)), 1.0)
                        .offset(1.0)
                        .floor(),
                ),
            ],
            relations: vec![RelationRule::new("depths", vec![1, -1, 21, -21]).with_self()],
            facets: vec![FacetKind::Music, FacetKind::Mathematics],
        }
    }
}
