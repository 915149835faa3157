// The index-keyed content generator.
//
// `IndexedContentGenerator` owns a validated (config, schema) pair and turns
// any index in `0..total_count` into a `ContentRecord`. Construction compiles
// the schema into a `Plan`: table names become owned value lists and
// constant references become plain `f64`s, so derivation itself cannot fail
// and does no map lookups for rule inputs.
//
// Derivation order for one index:
// 1. categorical attributes (`table[key mod len]`, rendered as text)
// 2. derived attributes (linear / exponential / cyclic transforms)
// 3. cross-references (`(index + offset) mod N` per relation)
// 4. facets (built-in builders, overridden by the injected `FacetSource`)
// 5. quality score (completeness of the above)
//
// Each step reads only the index and the plan, so a record is a pure
// function of its inputs. The optional LRU cache stores finished records as
// `Arc`s; a miss recomputes the same value, so hit or miss never changes
// what a caller sees. The cache is the only shared mutable state, and it is
// internally locked, so `&IndexedContentGenerator` can be used from any
// number of threads.
//
// `generate_all` fans out over rayon; the indexed collect keeps ascending
// order. `find_by_predicate` is lazy: it returns a `Matches` value whose
// `iter()` walks indices from zero each time it is called.

use crate::config::{ConstRef, GeneratorConfig, IndexKey, Rounding, Schema, Transform};
use crate::error::{LatticeError, invalid};
use crate::facets::{self, FacetSource};
use crate::record::{ContentRecord, Related};
use crate::score::quality_score;
use codex_lattice_cache::{CacheStats, LruCache};
use codex_lattice_tables::Scalar;
use rayon::prelude::*;
use std::num::NonZeroU32;
use std::sync::Arc;
use tracing::{debug, info};

/// `(index + offset) mod total`, always in `0..total`.
///
/// Any integer index and offset are accepted; the result wraps in both
/// directions.
pub fn cross_reference(index: i64, offset: i64, total: NonZeroU32) -> u32 {
    let wrapped = (i128::from(index) + i128::from(offset)).rem_euclid(i128::from(total.get()));
    // rem_euclid by a positive u32 lands in 0..total.
    wrapped as u32
}

// ---------------------------------------------------------------------------
// Compiled plan
// ---------------------------------------------------------------------------

struct Plan {
    total: NonZeroU32,
    categorical: Vec<CategoricalStep>,
    derived: Vec<DerivedStep>,
    relations: Vec<RelationStep>,
}

struct CategoricalStep {
    attribute: String,
    labels: Vec<String>,
    key: IndexKey,
}

struct DerivedStep {
    attribute: String,
    op: Op,
}

enum Op {
    Linear {
        key: IndexKey,
        scale: f64,
        offset: f64,
        wrap: Option<f64>,
        rounding: Rounding,
    },
    Exponential {
        base: f64,
        ratio: f64,
        period: u64,
        divisor: f64,
    },
    Cyclic {
        values: Vec<Scalar>,
        key: IndexKey,
    },
}

struct RelationStep {
    name: String,
    offsets: Vec<i64>,
    include_self: bool,
}

fn pick<T>(values: &[T], key: u64) -> &T {
    // Tables are non-empty after validation.
    &values[(key % values.len() as u64) as usize]
}

impl Op {
    fn apply(&self, index: u32) -> Scalar {
        match self {
            Op::Linear {
                key,
                scale,
                offset,
                wrap,
                rounding,
            } => {
                let mut value = key.apply(index) as f64 * scale;
                if let Some(wrap) = wrap {
                    value = value.rem_euclid(*wrap);
                }
                rounding.finish(value, *offset)
            }
            Op::Exponential {
                base,
                ratio,
                period,
                divisor,
            } => {
                let exponent = (u64::from(index) % period) as f64 / divisor;
                Scalar::Float(base * ratio.powf(exponent))
            }
            Op::Cyclic { values, key } => pick(values, key.apply(index)).clone(),
        }
    }
}

impl Plan {
    fn compile(config: &GeneratorConfig, schema: &Schema) -> Result<Self, LatticeError> {
        config.validate(schema)?;
        let total = config.record_count()?;

        let table = |name: &str| {
            config
                .table(name)
                .ok_or_else(|| invalid(format!("missing cyclic table '{name}'")))
        };
        let constant = |value: &ConstRef| {
            value
                .resolve(config)
                .ok_or_else(|| invalid(format!("missing scaling constant '{value}'")))
        };

        let mut categorical = Vec::with_capacity(schema.categorical.len());
        for rule in &schema.categorical {
            categorical.push(CategoricalStep {
                attribute: rule.attribute.clone(),
                labels: table(&rule.table)?.iter().map(Scalar::to_string).collect(),
                key: rule.key,
            });
        }

        let mut derived = Vec::with_capacity(schema.derived.len());
        for rule in &schema.derived {
            let op = match &rule.transform {
                Transform::Linear(linear) => Op::Linear {
                    key: linear.key,
                    scale: constant(&linear.scale)?,
                    offset: constant(&linear.offset)?,
                    wrap: linear.wrap.as_ref().map(&constant).transpose()?,
                    rounding: linear.rounding,
                },
                Transform::Exponential(exp) => Op::Exponential {
                    base: constant(&exp.base)?,
                    ratio: constant(&exp.ratio)?,
                    period: exp.period,
                    divisor: exp.divisor,
                },
                Transform::Cyclic(cyclic) => Op::Cyclic {
                    values: table(&cyclic.table)?.to_vec(),
                    key: cyclic.key,
                },
            };
            derived.push(DerivedStep {
                attribute: rule.attribute.clone(),
                op,
            });
        }

        let relations = schema
            .relations
            .iter()
            .map(|rule| RelationStep {
                name: rule.name.clone(),
                offsets: rule.offsets.clone(),
                include_self: rule.include_self,
            })
            .collect();

        Ok(Self {
            total,
            categorical,
            derived,
            relations,
        })
    }
}

// ---------------------------------------------------------------------------
// Generator
// ---------------------------------------------------------------------------

pub struct IndexedContentGenerator {
    config: GeneratorConfig,
    schema: Schema,
    plan: Plan,
    facet_source: Option<Arc<dyn FacetSource>>,
    cache: Option<LruCache<u32, Arc<ContentRecord>>>,
}

impl IndexedContentGenerator {
    /// Validate `config` against `schema` and build an uncached generator
    /// with built-in facets only.
    pub fn new(config: GeneratorConfig, schema: Schema) -> Result<Self, LatticeError> {
        let plan = Plan::compile(&config, &schema)?;
        info!(
            total_count = config.total_count,
            categorical = plan.categorical.len(),
            derived = plan.derived.len(),
            relations = plan.relations.len(),
            facets = schema.facets.len(),
            "content generator ready"
        );
        Ok(Self {
            config,
            schema,
            plan,
            facet_source: None,
            cache: None,
        })
    }

    /// Use `source` to supply facets ahead of the built-in builders.
    /// Any cached records are dropped.
    pub fn with_facet_source(mut self, source: Arc<dyn FacetSource>) -> Self {
        self.facet_source = Some(source);
        if let Some(cache) = &self.cache {
            cache.clear();
        }
        self
    }

    /// Memoize up to `capacity` records. Zero disables caching.
    pub fn with_cache(mut self, capacity: usize) -> Self {
        self.cache = (capacity > 0).then(|| LruCache::new(capacity));
        debug!(capacity, "record cache configured");
        self
    }

    pub fn total_count(&self) -> u32 {
        self.plan.total.get()
    }

    pub fn config(&self) -> &GeneratorConfig {
        &self.config
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    /// Cache counters, or `None` when caching is off.
    pub fn cache_stats(&self) -> Option<CacheStats> {
        self.cache.as_ref().map(LruCache::stats)
    }

    /// Convert a caller-supplied index into an in-range one.
    pub fn check_index(&self, index: i64) -> Result<u32, LatticeError> {
        let total = self.total_count();
        u32::try_from(index)
            .ok()
            .filter(|&i| i < total)
            .ok_or(LatticeError::IndexOutOfRange { index, total })
    }

    /// The record at `index`. Fails only when `index` is outside
    /// `0..total_count`.
    pub fn generate(&self, index: i64) -> Result<Arc<ContentRecord>, LatticeError> {
        let index = self.check_index(index)?;
        Ok(self.record(index))
    }

    /// Every record, in ascending index order.
    pub fn generate_all(&self) -> Vec<Arc<ContentRecord>> {
        (0..self.total_count())
            .into_par_iter()
            .map(|index| self.record(index))
            .collect()
    }

    /// Lazily filter records by `predicate`.
    ///
    /// Nothing is generated until the result is iterated; each call to
    /// `iter()` starts again from index zero.
    pub fn find_by_predicate<P>(&self, predicate: P) -> Matches<'_, P>
    where
        P: Fn(&ContentRecord) -> bool,
    {
        Matches {
            generator: self,
            predicate,
        }
    }

    /// `(index + offset) mod total_count`.
    pub fn cross_reference(&self, index: i64, offset: i64) -> u32 {
        cross_reference(index, offset, self.plan.total)
    }

    /// Completeness of `record` in [0, 1].
    pub fn score(&self, record: &ContentRecord) -> f64 {
        quality_score(record)
    }

    /// Records scoring strictly above `threshold`, best first. Ties keep
    /// ascending index order.
    pub fn ranked(&self, threshold: f64) -> Vec<Arc<ContentRecord>> {
        let mut matches: Vec<_> = self
            .find_by_predicate(|record| record.quality_score > threshold)
            .iter()
            .collect();
        matches.sort_by(|a, b| b.quality_score.total_cmp(&a.quality_score));
        matches
    }

    fn record(&self, index: u32) -> Arc<ContentRecord> {
        match &self.cache {
            Some(cache) => cache.get_or_insert_with(index, || Arc::new(self.derive(index))),
            None => Arc::new(self.derive(index)),
        }
    }

    fn derive(&self, index: u32) -> ContentRecord {
        let mut record = ContentRecord::new(index);

        for step in &self.plan.categorical {
            let label = pick(&step.labels, step.key.apply(index));
            record.categorical.insert(step.attribute.clone(), label.clone());
        }

        for step in &self.plan.derived {
            record
                .derived
                .insert(step.attribute.clone(), step.op.apply(index));
        }

        let total = self.plan.total;
        for step in &self.plan.relations {
            let mut related = Related::new();
            if step.include_self {
                related.push(index);
            }
            for &offset in &step.offsets {
                related.push(cross_reference(i64::from(index), offset, total));
            }
            record.cross_references.insert(step.name.clone(), related);
        }

        facets::attach(
            &self.schema.facets,
            &mut record,
            &self.config,
            self.facet_source.as_deref(),
        );
        record.quality_score = quality_score(&record);
        debug!(index, score = record.quality_score, "derived record");
        record
    }
}

/// Lazy, restartable filter over a generator's records.
pub struct Matches<'a, P> {
    generator: &'a IndexedContentGenerator,
    predicate: P,
}

impl<'a, P> Matches<'a, P>
where
    P: Fn(&ContentRecord) -> bool,
{
    /// A fresh pass over every index, yielding matches in ascending order.
    pub fn iter(&self) -> MatchIter<'_, P> {
        MatchIter {
            generator: self.generator,
            predicate: &self.predicate,
            next: 0,
        }
    }
}

impl<'m, 'a, P> IntoIterator for &'m Matches<'a, P>
where
    P: Fn(&ContentRecord) -> bool,
{
    type Item = Arc<ContentRecord>;
    type IntoIter = MatchIter<'m, P>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

pub struct MatchIter<'m, P> {
    generator: &'m IndexedContentGenerator,
    predicate: &'m P,
    next: u32,
}

impl<P> Iterator for MatchIter<'_, P>
where
    P: Fn(&ContentRecord) -> bool,
{
    type Item = Arc<ContentRecord>;

    fn next(&mut self) -> Option<Self::Item> {
        while self.next < self.generator.total_count() {
            let record = self.generator.record(self.next);
            self.next += 1;
            if (self.predicate)(&record) {
                return Some(record);
            }
        }
        None
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.generator.total_count().saturating_sub(self.next);
        (0, Some(remaining as usize))
    }
}
