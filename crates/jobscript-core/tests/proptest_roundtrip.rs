//! Property-based tests for the range and directive codecs.

use jobscript_core::{JobOptions, Platform, RangeElement, RangeSet};
use proptest::prelude::*;

/// Generate one range token: a single index or a span with a positive step.
fn arb_element() -> impl Strategy<Value = RangeElement> {
    prop_oneof![
        (0_u32..10_000).prop_map(RangeElement::Index),
        (0_u32..1_000, 0_u32..1_000, 1_u32..10).prop_map(|(start, len, step)| {
            RangeElement::Span {
                start,
                end: start + len,
                step,
            }
        }),
    ]
}

fn arb_range() -> impl Strategy<Value = RangeSet> {
    prop::collection::vec(arb_element(), 1..=6).prop_map(RangeSet::new)
}

fn arb_word() -> impl Strategy<Value = String> {
    "[a-z][a-z0-9_]{0,11}"
}

proptest! {
    /// format → parse returns the same range set.
    #[test]
    fn test_range_roundtrip(range in arb_range()) {
        let text = range.to_string();
        let parsed: RangeSet = text.parse().expect("formatted range parses");
        prop_assert_eq!(parsed, range);
    }

    /// Enumeration visits every span endpoint reachable by the step and
    /// nothing outside the span.
    #[test]
    fn test_span_indices_bounded(start in 0_u32..500, len in 0_u32..500, step in 1_u32..20) {
        let range = RangeSet::new(vec![RangeElement::Span { start, end: start + len, step }]);
        let indices = range.indices();
        prop_assert_eq!(indices.first().copied(), Some(start));
        prop_assert!(indices.iter().all(|i| *i >= start && *i <= start + len));
        prop_assert_eq!(indices.len() as u32, len / step + 1);
    }

    /// Slurm directives decode back to the options they were encoded from.
    #[test]
    fn test_slurm_options_roundtrip(
        name in arb_word(),
        queue in arb_word(),
        array in arb_range(),
        hosts in prop::collection::vec(arb_word(), 0..4),
    ) {
        let mut options = JobOptions::new()
            .with_name(name)
            .with_queue(queue)
            .with_array(array)
            .with_logname("logs/{jobid}-{ind}");
        options.exclude = hosts;

        let slurm = Platform::Slurm.backend();
        let decoded = slurm
            .decode_options(&slurm.encode_options(&options))
            .expect("encoded directives decode");
        prop_assert_eq!(decoded, options);
    }
}
