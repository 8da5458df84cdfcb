mod common;

use common::{factory, factory_with, object_count, string, units_of, wide_external};
use lode_runtime::{Encoding, FactoryConfig, FactoryError, RawHeap, Space, StringShape};

#[test]
fn concat_with_empty_operand_returns_the_other_operand() {
    let mut f = factory();
    let ab = string(&mut f, "ab");
    let empty = f.roots().empty_string;
    assert_eq!(f.concat(ab, empty).unwrap(), ab);
    assert_eq!(f.concat(empty, ab).unwrap(), ab);
}

#[test]
fn short_concat_is_a_flat_copy() {
    let mut f = factory();
    let a = string(&mut f, "hello ");
    let b = string(&mut f, "world");
    let joined = f.concat(a, b).unwrap();
    assert_eq!(f.string_shape(joined), StringShape::Flat);
    assert_eq!(f.string_to_std(joined), "hello world");
    assert_eq!(f.string_encoding(joined), Encoding::Narrow);
}

#[test]
fn long_concat_is_a_composite_node() {
    let mut f = factory();
    let a = string(&mut f, "composite ");
    let b = string(&mut f, "strings copy nothing");
    let joined = f.concat(a, b).unwrap();
    assert_eq!(f.string_shape(joined), StringShape::Composite);
    assert_eq!(f.string_len(joined), 30);
    assert_eq!(f.string_to_std(joined), "composite strings copy nothing");
}

#[test]
fn flatten_keeps_identity_and_content() {
    let mut f = factory();
    let a = string(&mut f, "left half, ");
    let b = string(&mut f, "right half");
    let joined = f.concat(a, b).unwrap();
    let before = units_of(&f, joined);

    assert_eq!(f.flatten(joined), joined);
    assert_eq!(f.string_shape(joined), StringShape::Flat);
    assert_eq!(units_of(&f, joined), before);
    // Operands are untouched.
    assert_eq!(f.string_to_std(a), "left half, ");
}

#[test]
fn flattening_a_promoted_composite_frees_its_old_bytes() {
    let mut f = factory();
    let a = string(&mut f, "promoted left, ");
    let b = string(&mut f, "promoted right");
    let joined = f.concat(a, b).unwrap();
    f.collect_garbage(Space::New);
    assert_eq!(f.heap().space_of(joined), Space::Old);
    let old_before = f.heap().stats().old_bytes;
    let new_before = f.heap().stats().new_bytes;

    f.flatten(joined);
    let stats = f.heap().stats();
    assert!(stats.old_bytes < old_before);
    assert!(stats.new_bytes > new_before);
    assert_eq!(f.heap().space_of(joined), Space::New);
    assert_eq!(f.string_to_std(joined), "promoted left, promoted right");

    f.collect_garbage(Space::New);
    assert_eq!(f.heap().space_of(joined), Space::Old);
    assert_eq!(f.string_to_std(joined), "promoted left, promoted right");
}

#[test]
fn wide_operand_makes_the_result_wide() {
    let mut f = factory();
    let pi = string(&mut f, "π");
    let x = string(&mut f, "x");
    let joined = f.concat(pi, x).unwrap();
    assert_eq!(f.string_encoding(joined), Encoding::Wide);
    assert_eq!(f.string_to_std(joined), "πx");

    let long_pi = string(&mut f, "ππππππππ");
    let tail = string(&mut f, "xxxxxxxx");
    let long = f.concat(long_pi, tail).unwrap();
    assert_eq!(f.string_encoding(long), Encoding::Wide);
    assert!(!f.has_only_narrow_chars(long));
}

#[test]
fn wide_storage_with_narrow_content_is_recorded() {
    let mut f = factory();
    let wide = wide_external(&mut f, "abcdefgh");
    let narrow = string(&mut f, "ijklmnop");
    assert_eq!(f.string_encoding(wide), Encoding::Wide);

    let joined = f.concat(wide, narrow).unwrap();
    assert_eq!(f.string_shape(joined), StringShape::Composite);
    assert_eq!(f.string_encoding(joined), Encoding::Wide);
    assert!(f.has_only_narrow_chars(joined));

    // The hint carries through nested composites.
    let more = string(&mut f, "qrstuvwx");
    let nested = f.concat(joined, more).unwrap();
    assert!(f.has_only_narrow_chars(nested));
}

#[test]
fn two_unit_concat_uses_the_interning_table() {
    let mut f = factory();
    let canonical = f.internalize_utf8("ab");
    let a = string(&mut f, "a");
    let b = string(&mut f, "b");
    assert_eq!(f.concat(a, b).unwrap(), canonical);
}

#[test]
fn digit_pairs_skip_the_interning_lookup() {
    let mut f = factory();
    let four = string(&mut f, "4");
    let two = string(&mut f, "2");
    let a = string(&mut f, "a");
    let b = string(&mut f, "b");

    let lookups = |f: &lode_runtime::Factory| f.string_table().hits() + f.string_table().misses();

    let before = lookups(&f);
    let digits = f.concat(four, two).unwrap();
    assert_eq!(lookups(&f), before);
    assert_eq!(f.string_to_std(digits), "42");
    assert!(!f.is_internalized(digits));

    let before = lookups(&f);
    let letters = f.concat(a, b).unwrap();
    assert_eq!(lookups(&f), before + 1);
    assert_eq!(f.string_to_std(letters), "ab");
}

#[test]
fn concat_past_the_maximum_length_fails_without_allocating() {
    let mut f = factory_with(FactoryConfig {
        max_string_length: 20,
        ..FactoryConfig::default()
    });
    let a = string(&mut f, "aaaaaaaaaa");
    let b = string(&mut f, "bbbbbbbbbbb");
    let objects = object_count(&f);

    let err = f.concat(a, b).unwrap_err();
    assert_eq!(err, FactoryError::InvalidStringLength { length: 21, max: 20 });
    assert_eq!(object_count(&f), objects);

    let c = string(&mut f, "cccccccccc");
    let at_limit = f.concat(a, c).unwrap();
    assert_eq!(f.string_len(at_limit), 20);
}

#[test]
fn deep_composite_chains_are_read_without_recursion() {
    let mut f = factory();
    let mut acc = string(&mut f, "0123456789abc");
    let piece = string(&mut f, "x");
    for _ in 0..20_000 {
        acc = f.concat(acc, piece).unwrap();
    }
    assert_eq!(f.string_len(acc), 20_013);
    assert_eq!(f.char_at(acc, 12), u16::from(b'c'));
    assert_eq!(f.char_at(acc, 20_012), u16::from(b'x'));

    let mut right_deep = string(&mut f, "0123456789abc");
    for _ in 0..20_000 {
        right_deep = f.concat(piece, right_deep).unwrap();
    }
    f.flatten(right_deep);
    let text = f.string_to_std(right_deep);
    assert!(text.starts_with("xxxx"));
    assert!(text.ends_with("789abc"));
}

#[test]
fn flat_concat_always_copies() {
    let mut f = factory();
    let a = string(&mut f, "a fairly long left operand ");
    let b = string(&mut f, "and a right one");
    let flat = f.new_flat_concat_string(a, b).unwrap();
    assert_eq!(f.string_shape(flat), StringShape::Flat);
    assert_eq!(
        f.string_to_std(flat),
        "a fairly long left operand and a right one"
    );
}
