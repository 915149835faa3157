// Record quality scoring.
//
// The score is the fraction of populated slots out of a fixed set of nine:
// non-empty `derived`, non-empty `categorical`, non-empty
// `cross_references`, and one per facet kind. Adding a slot to a record
// never lowers its score, and the result is always in [0, 1].

use crate::record::{ContentRecord, Facets};

/// Three attribute groups plus one slot per facet kind.
pub const SCORE_SLOTS: usize = 3 + Facets::COUNT;

/// Completeness of `record` in [0, 1].
pub fn quality_score(record: &ContentRecord) -> f64 {
    let groups = [
        !record.derived.is_empty(),
        !record.categorical.is_empty(),
        !record.cross_references.is_empty(),
    ];
    let populated = groups.iter().filter(|&&present| present).count() + record.facets.populated();
    populated as f64 / SCORE_SLOTS as f64
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::{DesignFacet, Related};
    use codex_lattice_tables::Scalar;

    #[test]
    fn empty_record_scores_zero() {
        assert_eq!(quality_score(&ContentRecord::new(0)), 0.0);
    }

    #[test]
    fn each_slot_adds_one_ninth() {
        let mut record = ContentRecord::new(0);
        record.derived.insert("x".into(), Scalar::Int(1));
        let one = quality_score(&record);
        assert!((one - 1.0 / 9.0).abs() < 1e-12);

        record.categorical.insert("y".into(), "z".into());
        record
            .cross_references
            .insert("near".into(), Related::from_slice(&[1]));
        let three = quality_score(&record);
        assert!(three > one);

        record.facets.design = Some(DesignFacet {
            principles: Vec::new(),
            modality: "visual".into(),
            professional_grade: true,
        });
        let four = quality_score(&record);
        assert!(four > three);
        assert!((four - 4.0 / 9.0).abs() < 1e-12);
    }

    #[test]
    fn extra_entries_in_a_group_do_not_change_the_score() {
        let mut record = ContentRecord::new(0);
        record.derived.insert("a".into(), Scalar::Int(1));
        let before = quality_score(&record);
        record.derived.insert("b".into(), Scalar::Int(2));
        assert_eq!(quality_score(&record), before);
    }
}
