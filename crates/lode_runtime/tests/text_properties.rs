mod common;

use common::{factory, string, units_of};
use lode_runtime::StringShape;
use proptest::prelude::*;

const COMPOSITE_MIN_LENGTH: usize = 13;

proptest! {
    #[test]
    fn concat_matches_unit_concatenation(a in ".*", b in ".*") {
        let mut f = factory();
        let left = string(&mut f, &a);
        let right = string(&mut f, &b);
        let joined = f.concat(left, right).unwrap();

        let expected: Vec<u16> = a.encode_utf16().chain(b.encode_utf16()).collect();
        prop_assert_eq!(f.string_len(joined), expected.len());
        prop_assert_eq!(units_of(&f, joined), expected.clone());

        let both_non_empty = !a.is_empty() && !b.is_empty();
        if expected.len() < COMPOSITE_MIN_LENGTH {
            prop_assert_eq!(f.string_shape(joined), StringShape::Flat);
        } else if both_non_empty {
            prop_assert_eq!(f.string_shape(joined), StringShape::Composite);
        }

        f.flatten(joined);
        prop_assert_eq!(units_of(&f, joined), expected);
    }
}

proptest! {
    #[test]
    fn slice_matches_unit_range(s in ".{0,40}", x in 0usize..128, y in 0usize..128) {
        let mut f = factory();
        let source = string(&mut f, &s);
        let units: Vec<u16> = s.encode_utf16().collect();
        let (begin, end) = {
            let a = x % (units.len() + 1);
            let b = y % (units.len() + 1);
            (a.min(b), a.max(b))
        };
        let cut = f.slice(source, begin, end);
        prop_assert_eq!(units_of(&f, cut), units[begin..end].to_vec());
    }
}

proptest! {
    #[test]
    fn slice_of_composite_matches_unit_range(
        a in "[a-z]{1,30}",
        b in "[0-9α-ω]{1,30}",
        x in 0usize..128,
        y in 0usize..128,
    ) {
        let mut f = factory();
        let left = string(&mut f, &a);
        let right = string(&mut f, &b);
        let joined = f.concat(left, right).unwrap();
        let units: Vec<u16> = a.encode_utf16().chain(b.encode_utf16()).collect();
        let (begin, end) = {
            let p = x % (units.len() + 1);
            let q = y % (units.len() + 1);
            (p.min(q), p.max(q))
        };
        let cut = f.slice(joined, begin, end);
        prop_assert_eq!(units_of(&f, cut), units[begin..end].to_vec());
        prop_assert_eq!(units_of(&f, joined), units);
    }
}

proptest! {
    #[test]
    fn internalize_is_idempotent(s in ".{0,24}") {
        let mut f = factory();
        let first = f.internalize_utf8(&s);
        let copy = string(&mut f, &s);
        prop_assert!(f.strings_equal(first, copy));
        prop_assert_eq!(f.internalize_string(copy), first);
        prop_assert_eq!(f.internalize_utf8(&s), first);
        prop_assert!(f.is_internalized(first));
    }
}

proptest! {
    #[test]
    fn number_strings_match_std_formatting(i in any::<i32>()) {
        let mut f = factory();
        let value = f.new_number_from_int(i);
        let spelled = f.number_to_string(value);
        prop_assert_eq!(f.string_to_std(spelled), i.to_string());
    }
}
