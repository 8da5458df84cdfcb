mod common;

use common::{factory, string};
use lode_runtime::core::{ContextKind, DictKey, StructKind};
use lode_runtime::{HeapObject, ObjectId, RawHeap, Space, Value};

fn script_id(f: &lode_runtime::Factory, id: ObjectId) -> i32 {
    match f.get(id) {
        HeapObject::Script(s) => s.id,
        _ => panic!("expected a script"),
    }
}

#[test]
fn integral_numbers_are_small_integers() {
    let mut f = factory();
    assert_eq!(f.new_number(5.0, Space::New), Value::from_smi(5));
    assert_eq!(f.new_number_from_int(-3), Value::from_smi(-3));

    let minus_zero = f.new_number(-0.0, Space::New);
    assert!(minus_zero.is_object());
    let value = f.number_value(minus_zero).unwrap();
    assert!(value == 0.0 && value.is_sign_negative());

    let big = f.new_number_from_uint(u32::MAX);
    assert!(big.is_object());
    assert_eq!(f.number_value(big), Some(4_294_967_295.0));
    assert_eq!(f.to_boolean(true), Value::TRUE);
}

#[test]
fn global_constants_resolve_by_content() {
    let mut f = factory();
    let undefined = string(&mut f, "undefined");
    let nan = string(&mut f, "NaN");
    let other = string(&mut f, "nothing");

    assert_eq!(f.global_constant_for(undefined), Some(Value::UNDEFINED));
    let nan_value = f.global_constant_for(nan).unwrap();
    assert!(f.number_value(nan_value).unwrap().is_nan());
    assert_eq!(f.global_constant_for(other), None);

    let infinity = f.roots().infinity_string;
    let inf_value = f.global_constant_for(infinity).unwrap();
    assert_eq!(f.number_value(inf_value), Some(f64::INFINITY));
}

#[test]
fn fixed_arrays() {
    let mut f = factory();
    assert_eq!(f.new_fixed_array(0, Space::New), f.roots().empty_fixed_array);

    let holes = f.new_fixed_array_with_holes(3, Space::New);
    assert!(f.fixed_array_get(holes, 2).is_hole());

    let items = f.new_fixed_array_from(&[Value::from_smi(1), Value::from_smi(2)], Space::New);
    f.fixed_array_set(items, 1, Value::from_smi(20));
    let grown = f.copy_size_fixed_array(items, 4);
    assert_eq!(f.fixed_array_len(grown), 4);
    assert_eq!(f.fixed_array_get(grown, 1), Value::from_smi(20));
    assert!(f.fixed_array_get(grown, 3).is_undefined());

    let copy = f.copy_fixed_array(items);
    assert_ne!(copy, items);
    assert_eq!(f.fixed_array_get(copy, 0), Value::from_smi(1));

    let doubles = f.new_fixed_double_array(2, Space::Old);
    assert!(matches!(f.get(doubles), HeapObject::FixedDoubleArray(d) if d.iter().all(|x| *x == 0.0)));
    let bytes = f.new_byte_array(8, Space::New);
    assert!(matches!(f.get(bytes), HeapObject::ByteArray(b) if b.len() == 8));
}

#[test]
#[should_panic(expected = "Index out of bounds")]
fn fixed_array_index_is_checked() {
    let mut f = factory();
    let items = f.new_fixed_array(2, Space::New);
    f.fixed_array_get(items, 2);
}

#[test]
fn dictionaries_keep_insertion_order() {
    let mut f = factory();
    let dict = f.new_name_dictionary(4);
    let b = f.internalize_utf8("b");
    let a = f.internalize_utf8("a");
    assert_eq!(f.dictionary_at_name_put(dict, b, Value::from_smi(1)), dict);
    f.dictionary_at_name_put(dict, a, Value::from_smi(2));
    f.dictionary_at_name_put(dict, b, Value::from_smi(3));

    assert_eq!(f.dictionary_get(dict, DictKey::Name(b)), Some(Value::from_smi(3)));
    let HeapObject::Dictionary(d) = f.get(dict) else {
        panic!("expected a dictionary");
    };
    let keys: Vec<DictKey> = d.entries.keys().copied().collect();
    assert_eq!(keys, vec![DictKey::Name(b), DictKey::Name(a)]);

    let numbers = f.new_number_dictionary(0);
    f.dictionary_at_number_put(numbers, 7, Value::TRUE);
    assert_eq!(f.dictionary_get(numbers, DictKey::Index(7)), Some(Value::TRUE));
    assert_eq!(f.dictionary_get(numbers, DictKey::Index(8)), None);
}

#[test]
fn dictionary_growth_is_accounted() {
    let mut f = factory();
    let names = f.new_name_dictionary(0);
    let numbers = f.new_number_dictionary(0);
    let keys: Vec<ObjectId> = (0..100).map(|i| f.internalize_utf8(&format!("key{i}"))).collect();
    let empty = f.get(names).size() + f.get(numbers).size();
    let before = f.heap().stats().new_bytes;

    for (i, &key) in keys.iter().enumerate() {
        f.dictionary_at_name_put(names, key, Value::from_smi(i as i32));
        f.dictionary_at_number_put(numbers, i as u32, Value::TRUE);
    }
    let full = f.get(names).size() + f.get(numbers).size();
    assert!(full > empty);
    assert_eq!(f.heap().stats().new_bytes - before, full - empty);
}

#[test]
#[should_panic(expected = "Property name is not an internalized string")]
fn dictionary_names_must_be_internalized() {
    let mut f = factory();
    let dict = f.new_name_dictionary(1);
    let name = string(&mut f, "plain");
    f.dictionary_at_name_put(dict, name, Value::NULL);
}

#[test]
#[should_panic(expected = "Dictionary key kind does not match")]
fn number_keys_need_a_number_dictionary() {
    let mut f = factory();
    let dict = f.new_name_dictionary(1);
    f.dictionary_at_number_put(dict, 0, Value::NULL);
}

#[test]
fn context_chain_links() {
    let mut f = factory();
    let native = f.new_native_context();
    assert_eq!(f.native_context_of(native), native);
    assert_eq!(f.context(native).kind, ContextKind::Native);

    let global = f.new_global_context(native, Value::UNDEFINED, Value::NULL, 3);
    assert_eq!(f.context(global).previous, Some(native));
    assert_eq!(f.context(global).len(), 7);

    let module = f.new_module_context(global, 2);
    assert_eq!(f.native_context_of(module), native);

    let name = f.internalize_utf8("run");
    let function = f.new_function(name, global);
    let call = f.new_function_context(6, function);
    assert_eq!(f.context(call).kind, ContextKind::Function);
    assert_eq!(f.context(call).previous, Some(global));
    assert_eq!(f.context(call).closure, Value::object(function));
    assert!(f.context_slot(call, 5).is_undefined());

    let e = f.internalize_utf8("e");
    let catch = f.new_catch_context(Value::object(function), call, e, Value::from_smi(13));
    assert_eq!(f.context_slot(catch, 4), Value::from_smi(13));
    assert_eq!(f.context(catch).extension, Value::object(e));

    let with = f.new_with_context(Value::object(function), catch, Value::NULL);
    assert_eq!(f.context(with).kind, ContextKind::With);
    assert_eq!(f.native_context_of(with), native);
}

#[test]
#[should_panic(expected = "Function context is smaller than the fixed header")]
fn function_context_needs_the_fixed_header() {
    let mut f = factory();
    let native = f.new_native_context();
    let name = f.internalize_utf8("f");
    let function = f.new_function(name, native);
    f.new_function_context(3, function);
}

#[test]
fn struct_records_start_with_their_defaults() {
    let mut f = factory();
    let pair = f.new_accessor_pair();
    assert!(f.struct_field(pair, 0).is_hole());
    assert!(f.struct_field(pair, 1).is_hole());

    let boxed = f.new_box(Value::from_smi(9));
    assert_eq!(f.struct_field(boxed, 0), Value::from_smi(9));

    let entry = f.new_aliased_arguments_entry(4);
    assert_eq!(f.struct_field(entry, 0), Value::from_smi(4));

    let info = f.new_type_feedback_info();
    assert_eq!(f.struct_field(info, 2), Value::from_smi(0));

    let generic = f.new_struct(StructKind::AccessorPair);
    assert!(f.struct_field(generic, 1).is_undefined());
}

#[test]
fn script_ids_increase_and_wrap() {
    let mut f = factory();
    let source = string(&mut f, "1 + 1");
    let first = f.new_script(source);
    let second = f.new_script(source);
    assert_eq!(script_id(&f, first), 1);
    assert_eq!(script_id(&f, second), 2);
    assert_eq!(f.heap().space_of(first), Space::Old);

    f.set_last_script_id(i32::MAX - 1);
    let last = f.new_script(source);
    assert_eq!(script_id(&f, last), i32::MAX);
    let wrapped = f.new_script(source);
    assert_eq!(script_id(&f, wrapped), 1);
    assert_eq!(f.last_script_id(), 1);
}

#[test]
fn numbers_are_spelled_and_cached() {
    let mut f = factory();
    let a = f.number_to_string(Value::from_smi(42));
    let b = f.number_to_string(Value::from_smi(42));
    assert_eq!(a, b);
    assert_eq!(f.string_to_std(a), "42");

    let minus_zero = f.new_number(-0.0, Space::New);
    let zero = f.number_to_string(minus_zero);
    assert_eq!(f.string_to_std(zero), "0");

    let half = f.new_number(1.5, Space::New);
    let spelled = f.number_to_string(half);
    assert_eq!(f.string_to_std(spelled), "1.5");

    let max = f.uint32_to_string(u32::MAX);
    assert_eq!(f.string_to_std(max), "4294967295");
}

#[test]
fn single_character_strings_are_canonical() {
    let mut f = factory();
    let a = f.lookup_single_character_string(u16::from(b'a'));
    assert_eq!(f.lookup_single_character_string(u16::from(b'a')), a);
    assert_eq!(f.internalize_utf8("a"), a);

    let pi = f.lookup_single_character_string(0x3c0);
    assert!(!f.is_internalized(pi));
    assert_eq!(f.string_to_std(pi), "π");
}
