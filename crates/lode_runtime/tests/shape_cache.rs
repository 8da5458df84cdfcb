mod common;

use common::{factory, string};
use lode_runtime::core::ContextKind;
use lode_runtime::{Space, Value};

#[test]
fn equal_name_sequences_share_a_shape() {
    let mut f = factory();
    let native = f.new_native_context();
    let x = f.internalize_utf8("x");
    let y = f.internalize_utf8("y");

    let first = f.get_or_create_shape(native, &[x, y]);
    assert_eq!(f.shape_cache_stats(), (0, 1));
    let second = f.get_or_create_shape(native, &[x, y]);
    assert_eq!(first, second);
    assert_eq!(f.shape_cache_stats(), (1, 1));

    let shape = f.shape(first);
    assert_eq!(shape.property_count(), 2);
    assert_eq!(shape.slot_of(y), Some(1));
}

#[test]
fn property_order_distinguishes_shapes() {
    let mut f = factory();
    let native = f.new_native_context();
    let x = f.internalize_utf8("x");
    let y = f.internalize_utf8("y");
    let xy = f.get_or_create_shape(native, &[x, y]);
    let yx = f.get_or_create_shape(native, &[y, x]);
    assert_ne!(xy, yx);
    assert_eq!(f.shape(yx).slot_of(y), Some(0));
}

#[test]
fn cache_is_created_on_first_use() {
    let mut f = factory();
    let native = f.new_native_context();
    assert!(f.context(native).shape_cache.is_none());
    let a = f.internalize_utf8("a");
    f.get_or_create_shape(native, &[a]);
    assert!(f.context(native).shape_cache.is_some());
}

#[test]
fn shapes_derive_from_the_native_template() {
    let mut f = factory();
    let native = f.new_native_context();
    let block = f.new_block_context(Value::UNDEFINED, native, 2);
    assert_eq!(f.context(block).kind, ContextKind::Block);
    assert_eq!(f.native_context_of(block), native);

    let a = f.internalize_utf8("a");
    let shape = f.get_or_create_shape(block, &[a]);
    let template = f.context(native).object_template;
    assert!(template.is_some());
    assert_eq!(f.shape(shape).base, template);
}

#[test]
#[should_panic(expected = "Property name is not an internalized string")]
fn names_must_be_internalized() {
    let mut f = factory();
    let native = f.new_native_context();
    let name = string(&mut f, "plain");
    f.get_or_create_shape(native, &[name]);
}

#[test]
fn object_literals_read_back_through_their_shape() {
    let mut f = factory();
    let native = f.new_native_context();
    let x = f.internalize_utf8("x");
    let y = f.internalize_utf8("y");
    let z = f.internalize_utf8("z");

    let point = f.new_object_literal(native, &[x, y], &[Value::from_smi(3), Value::from_smi(4)]);
    assert_eq!(f.object_property(point, x), Some(Value::from_smi(3)));
    assert_eq!(f.object_property(point, y), Some(Value::from_smi(4)));
    assert_eq!(f.object_property(point, z), None);
}

#[test]
fn repeated_names_keep_the_first_slot_and_last_value() {
    let mut f = factory();
    let native = f.new_native_context();
    let a = f.internalize_utf8("a");
    let b = f.internalize_utf8("b");

    let object = f.new_object_literal(
        native,
        &[a, b, a],
        &[Value::from_smi(1), Value::from_smi(2), Value::from_smi(3)],
    );
    assert_eq!(f.object_property(object, a), Some(Value::from_smi(3)));
    assert_eq!(f.object_property(object, b), Some(Value::from_smi(2)));

    let shape = f.get_or_create_shape(native, &[a, b, a]);
    assert_eq!(f.shape(shape).property_count(), 2);
    assert_eq!(f.shape(shape).slot_of(a), Some(0));
}

#[test]
fn shape_cache_growth_is_accounted() {
    let mut f = factory();
    let native = f.new_native_context();
    let names: Vec<_> = (0..200).map(|i| f.internalize_utf8(&format!("k{i}"))).collect();
    f.get_or_create_shape(native, &names[..1]);
    let before = f.heap().stats().old_bytes;

    let shape_bytes: usize = names[1..]
        .iter()
        .map(|&n| {
            let shape = f.get_or_create_shape(native, &[n]);
            f.get(shape).size()
        })
        .sum();
    let grown = f.heap().stats().old_bytes - before;
    assert!(grown > shape_bytes);
}

#[test]
#[should_panic(expected = "Property value count does not match the shape")]
fn literal_values_must_match_the_shape() {
    let mut f = factory();
    let native = f.new_native_context();
    let x = f.internalize_utf8("x");
    let shape = f.get_or_create_shape(native, &[x]);
    f.new_object_from_shape(shape, &[]);
}

#[test]
fn function_prototype_points_back_at_the_function() {
    let mut f = factory();
    let native = f.new_native_context();
    let name = f.internalize_utf8("Point");
    let function = f.new_function_with_prototype(name, native);

    let prototype = f.closure(function).prototype.as_object().unwrap();
    let constructor = f.roots().constructor_string;
    assert_eq!(
        f.object_property(prototype, constructor),
        Some(Value::object(function))
    );

    let plain = f.new_function(name, native);
    assert!(f.closure(plain).prototype.is_hole());
}

#[test]
fn cached_shapes_survive_collections() {
    let mut f = factory();
    let native = f.new_native_context();
    let shape = f.handle_scope(|f| {
        let k = f.internalize_utf8("transient_key");
        f.get_or_create_shape(native, &[k])
    });
    f.collect_garbage(Space::Old);
    f.collect_garbage(Space::New);

    let k = f.internalize_utf8("transient_key");
    assert_eq!(f.get_or_create_shape(native, &[k]), shape);
    assert_eq!(f.shape_cache_stats(), (1, 1));
}
