//! Typed constructors: numbers, arrays, dictionaries, contexts, closures,
//! struct-like records and scripts.

use super::Factory;
use crate::core::{
    Closure, Context, ContextKind, DictKey, Dictionary, DictionaryKind, HeapObject,
    MIN_CONTEXT_SLOTS, NATIVE_CONTEXT_SLOTS, RawHeap, Script, ScriptKind, Shape, StructKind,
    StructRecord,
};
use crate::errors::messages::{
    CONTEXT_TOO_SMALL, INDEX_OUT_OF_BOUNDS, NOT_A_CLOSURE, NOT_A_DICTIONARY, NOT_A_FIXED_ARRAY,
    NOT_INTERNALIZED, WRONG_DICTIONARY_KIND,
};
use indexmap::IndexSet;
use lode_core::{ObjectId, Space, Value, fast_hasher};

impl<H: RawHeap> Factory<H> {
    // ========================================================================
    // Numbers
    // ========================================================================

    /// Small integer when `value` is one exactly (and not -0), otherwise a
    /// heap number.
    pub fn new_number(&mut self, value: f64, space: Space) -> Value {
        let int = value as i32;
        if int as f64 == value && !(value == 0.0 && value.is_sign_negative()) {
            return Value::from_smi(int);
        }
        Value::object(self.new_heap_number(value, space))
    }

    pub fn new_number_from_int(&mut self, value: i32) -> Value {
        Value::from_smi(value)
    }

    pub fn new_number_from_uint(&mut self, value: u32) -> Value {
        match i32::try_from(value) {
            Ok(int) => Value::from_smi(int),
            Err(_) => Value::object(self.new_heap_number(value as f64, Space::New)),
        }
    }

    pub fn new_heap_number(&mut self, value: f64, space: Space) -> ObjectId {
        self.allocate(HeapObject::HeapNumber(value), space)
    }

    /// Numeric value of a small integer or heap number.
    pub fn number_value(&self, value: Value) -> Option<f64> {
        if value.is_smi() {
            return Some(value.as_smi() as f64);
        }
        match self.heap.get(value.as_object()?) {
            HeapObject::HeapNumber(n) => Some(*n),
            _ => None,
        }
    }

    pub fn to_boolean(&self, value: bool) -> Value {
        Value::from_bool(value)
    }

    /// Value of the read-only globals `undefined`, `NaN` and `Infinity`.
    pub fn global_constant_for(&self, name: ObjectId) -> Option<Value> {
        if self.strings_equal(name, self.roots.undefined_string) {
            Some(Value::UNDEFINED)
        } else if self.strings_equal(name, self.roots.nan_string) {
            Some(Value::object(self.roots.nan_value))
        } else if self.strings_equal(name, self.roots.infinity_string) {
            Some(Value::object(self.roots.infinity_value))
        } else {
            None
        }
    }

    // ========================================================================
    // Arrays
    // ========================================================================

    /// Array of `len` undefined values. Length zero is the shared empty array.
    pub fn new_fixed_array(&mut self, len: usize, space: Space) -> ObjectId {
        if len == 0 {
            return self.track(self.roots.empty_fixed_array);
        }
        self.allocate(
            HeapObject::FixedArray(vec![Value::UNDEFINED; len].into_boxed_slice()),
            space,
        )
    }

    pub fn new_fixed_array_with_holes(&mut self, len: usize, space: Space) -> ObjectId {
        if len == 0 {
            return self.track(self.roots.empty_fixed_array);
        }
        self.allocate(
            HeapObject::FixedArray(vec![Value::HOLE; len].into_boxed_slice()),
            space,
        )
    }

    pub fn new_fixed_array_from(&mut self, values: &[Value], space: Space) -> ObjectId {
        if values.is_empty() {
            return self.track(self.roots.empty_fixed_array);
        }
        self.allocate(HeapObject::FixedArray(values.into()), space)
    }

    pub fn new_fixed_double_array(&mut self, len: usize, space: Space) -> ObjectId {
        self.allocate(
            HeapObject::FixedDoubleArray(vec![0.0; len].into_boxed_slice()),
            space,
        )
    }

    fn fixed_array(&self, id: ObjectId) -> &[Value] {
        match self.heap.get(id) {
            HeapObject::FixedArray(items) => items,
            _ => panic!("{NOT_A_FIXED_ARRAY}: {id:?}"),
        }
    }

    pub fn fixed_array_len(&self, id: ObjectId) -> usize {
        self.fixed_array(id).len()
    }

    pub fn fixed_array_get(&self, id: ObjectId, index: usize) -> Value {
        let items = self.fixed_array(id);
        assert!(index < items.len(), "{INDEX_OUT_OF_BOUNDS}: {index}");
        items[index]
    }

    pub fn fixed_array_set(&mut self, id: ObjectId, index: usize, value: Value) {
        match self.heap.get_mut(id) {
            HeapObject::FixedArray(items) => {
                assert!(index < items.len(), "{INDEX_OUT_OF_BOUNDS}: {index}");
                items[index] = value;
            }
            _ => panic!("{NOT_A_FIXED_ARRAY}: {id:?}"),
        }
    }

    pub fn copy_fixed_array(&mut self, id: ObjectId) -> ObjectId {
        let items: Box<[Value]> = self.fixed_array(id).into();
        if items.is_empty() {
            return self.track(self.roots.empty_fixed_array);
        }
        self.allocate(HeapObject::FixedArray(items), Space::New)
    }

    /// Copy of `id` truncated or padded with undefined to `new_len`.
    pub fn copy_size_fixed_array(&mut self, id: ObjectId, new_len: usize) -> ObjectId {
        let source = self.fixed_array(id);
        let mut items = Vec::with_capacity(new_len);
        items.extend(source.iter().take(new_len).copied());
        items.resize(new_len, Value::UNDEFINED);
        if items.is_empty() {
            return self.track(self.roots.empty_fixed_array);
        }
        self.allocate(HeapObject::FixedArray(items.into_boxed_slice()), Space::New)
    }

    pub fn new_byte_array(&mut self, len: usize, space: Space) -> ObjectId {
        self.allocate(HeapObject::ByteArray(vec![0; len].into_boxed_slice()), space)
    }

    // ========================================================================
    // Dictionaries
    // ========================================================================

    pub fn new_name_dictionary(&mut self, capacity: usize) -> ObjectId {
        let dict = Dictionary::new(DictionaryKind::Name, capacity);
        self.allocate(HeapObject::Dictionary(Box::new(dict)), Space::New)
    }

    pub fn new_number_dictionary(&mut self, capacity: usize) -> ObjectId {
        let dict = Dictionary::new(DictionaryKind::Number, capacity);
        self.allocate(HeapObject::Dictionary(Box::new(dict)), Space::New)
    }

    fn dictionary_mut(&mut self, id: ObjectId, kind: DictionaryKind) -> &mut Dictionary {
        match self.heap.get_mut(id) {
            HeapObject::Dictionary(dict) => {
                assert_eq!(dict.kind, kind, "{WRONG_DICTIONARY_KIND}");
                dict
            }
            _ => panic!("{NOT_A_DICTIONARY}: {id:?}"),
        }
    }

    /// Sets `name` to `value`, keeping insertion order. Returns the dictionary.
    pub fn dictionary_at_name_put(
        &mut self,
        dict: ObjectId,
        name: ObjectId,
        value: Value,
    ) -> ObjectId {
        assert!(self.is_internalized(name), "{NOT_INTERNALIZED}: {name:?}");
        self.dictionary_mut(dict, DictionaryKind::Name)
            .entries
            .insert(DictKey::Name(name), value);
        self.heap.reaccount(dict);
        dict
    }

    pub fn dictionary_at_number_put(&mut self, dict: ObjectId, index: u32, value: Value) -> ObjectId {
        self.dictionary_mut(dict, DictionaryKind::Number)
            .entries
            .insert(DictKey::Index(index), value);
        self.heap.reaccount(dict);
        dict
    }

    pub fn dictionary_get(&self, dict: ObjectId, key: DictKey) -> Option<Value> {
        match self.heap.get(dict) {
            HeapObject::Dictionary(d) => d.get(key),
            _ => panic!("{NOT_A_DICTIONARY}: {dict:?}"),
        }
    }

    // ========================================================================
    // Contexts
    // ========================================================================

    fn allocate_context(&mut self, context: Context) -> ObjectId {
        self.allocate(HeapObject::Context(Box::new(context)), Space::Old)
    }

    /// Root context. Carries the base template for object literal shapes.
    pub fn new_native_context(&mut self) -> ObjectId {
        let template = Shape {
            base: None,
            properties: IndexSet::with_hasher(fast_hasher()),
        };
        let template = self.allocate(HeapObject::Shape(Box::new(template)), Space::Old);
        let context = self.allocate_context(Context {
            kind: ContextKind::Native,
            closure: Value::UNDEFINED,
            previous: None,
            extension: Value::UNDEFINED,
            native: None,
            slots: vec![Value::UNDEFINED; NATIVE_CONTEXT_SLOTS - MIN_CONTEXT_SLOTS]
                .into_boxed_slice(),
            shape_cache: None,
            object_template: Some(template),
        });
        self.context_mut(context).native = Some(context);
        context
    }

    pub fn new_global_context(
        &mut self,
        native: ObjectId,
        closure: Value,
        global_object: Value,
        slot_count: usize,
    ) -> ObjectId {
        let native = self.native_context_of(native);
        self.allocate_context(Context {
            kind: ContextKind::Global,
            closure,
            previous: Some(native),
            extension: global_object,
            native: Some(native),
            slots: vec![Value::UNDEFINED; slot_count].into_boxed_slice(),
            shape_cache: None,
            object_template: None,
        })
    }

    pub fn new_module_context(&mut self, native: ObjectId, slot_count: usize) -> ObjectId {
        let native = self.native_context_of(native);
        self.allocate_context(Context {
            kind: ContextKind::Module,
            closure: Value::UNDEFINED,
            previous: None,
            extension: Value::UNDEFINED,
            native: Some(native),
            slots: vec![Value::UNDEFINED; slot_count].into_boxed_slice(),
            shape_cache: None,
            object_template: None,
        })
    }

    /// Context for a call of `function`. `length` counts the fixed header.
    pub fn new_function_context(&mut self, length: usize, function: ObjectId) -> ObjectId {
        assert!(length >= MIN_CONTEXT_SLOTS, "{CONTEXT_TOO_SMALL}: {length}");
        let previous = self.closure(function).context;
        let native = self.native_context_of(previous);
        let context = Context {
            kind: ContextKind::Function,
            closure: Value::object(function),
            previous: Some(previous),
            extension: Value::UNDEFINED,
            native: Some(native),
            slots: vec![Value::UNDEFINED; length - MIN_CONTEXT_SLOTS].into_boxed_slice(),
            shape_cache: None,
            object_template: None,
        };
        self.allocate(HeapObject::Context(Box::new(context)), Space::New)
    }

    /// Context binding the caught value under `name`.
    pub fn new_catch_context(
        &mut self,
        closure: Value,
        previous: ObjectId,
        name: ObjectId,
        thrown: Value,
    ) -> ObjectId {
        let native = self.native_context_of(previous);
        let context = Context {
            kind: ContextKind::Catch,
            closure,
            previous: Some(previous),
            extension: Value::object(name),
            native: Some(native),
            slots: vec![thrown].into_boxed_slice(),
            shape_cache: None,
            object_template: None,
        };
        self.allocate(HeapObject::Context(Box::new(context)), Space::New)
    }

    pub fn new_with_context(
        &mut self,
        closure: Value,
        previous: ObjectId,
        extension: Value,
    ) -> ObjectId {
        let native = self.native_context_of(previous);
        let context = Context {
            kind: ContextKind::With,
            closure,
            previous: Some(previous),
            extension,
            native: Some(native),
            slots: Box::default(),
            shape_cache: None,
            object_template: None,
        };
        self.allocate(HeapObject::Context(Box::new(context)), Space::New)
    }

    pub fn new_block_context(
        &mut self,
        closure: Value,
        previous: ObjectId,
        slot_count: usize,
    ) -> ObjectId {
        let native = self.native_context_of(previous);
        let context = Context {
            kind: ContextKind::Block,
            closure,
            previous: Some(previous),
            extension: Value::UNDEFINED,
            native: Some(native),
            slots: vec![Value::UNDEFINED; slot_count].into_boxed_slice(),
            shape_cache: None,
            object_template: None,
        };
        self.allocate(HeapObject::Context(Box::new(context)), Space::New)
    }

    pub fn context_slot(&self, context: ObjectId, index: usize) -> Value {
        let ctx = self.context(context);
        assert!(
            (MIN_CONTEXT_SLOTS..ctx.len()).contains(&index),
            "{INDEX_OUT_OF_BOUNDS}: {index}"
        );
        ctx.slots[index - MIN_CONTEXT_SLOTS]
    }

    // ========================================================================
    // Closures
    // ========================================================================

    pub fn closure(&self, id: ObjectId) -> &Closure {
        match self.heap.get(id) {
            HeapObject::Closure(c) => c,
            _ => panic!("{NOT_A_CLOSURE}: {id:?}"),
        }
    }

    pub fn new_function(&mut self, name: ObjectId, context: ObjectId) -> ObjectId {
        let closure = Closure {
            name,
            context,
            formal_parameter_count: 0,
            prototype: Value::HOLE,
        };
        self.allocate(HeapObject::Closure(Box::new(closure)), Space::Old)
    }

    /// Closure with a fresh prototype object whose `constructor` points back
    /// at the closure.
    pub fn new_function_with_prototype(&mut self, name: ObjectId, context: ObjectId) -> ObjectId {
        let function = self.new_function(name, context);
        let native = self.native_context_of(context);
        let constructor = self.roots.constructor_string;
        let prototype =
            self.new_object_literal(native, &[constructor], &[Value::object(function)]);
        match self.heap.get_mut(function) {
            HeapObject::Closure(c) => c.prototype = Value::object(prototype),
            _ => panic!("{NOT_A_CLOSURE}: {function:?}"),
        }
        function
    }

    // ========================================================================
    // Struct-like records
    // ========================================================================

    /// Record of `kind` with every field undefined.
    pub fn new_struct(&mut self, kind: StructKind) -> ObjectId {
        self.new_struct_with(kind, vec![Value::UNDEFINED; kind.field_count()])
    }

    fn new_struct_with(&mut self, kind: StructKind, fields: Vec<Value>) -> ObjectId {
        debug_assert_eq!(fields.len(), kind.field_count());
        let record = StructRecord {
            kind,
            fields: fields.into_boxed_slice(),
        };
        self.allocate(HeapObject::Struct(Box::new(record)), Space::New)
    }

    pub fn new_box(&mut self, value: Value) -> ObjectId {
        self.new_struct_with(StructKind::Box, vec![value])
    }

    /// Getter and setter both start out as the hole.
    pub fn new_accessor_pair(&mut self) -> ObjectId {
        self.new_struct_with(StructKind::AccessorPair, vec![Value::HOLE, Value::HOLE])
    }

    pub fn new_aliased_arguments_entry(&mut self, aliased_context_slot: i32) -> ObjectId {
        self.new_struct_with(
            StructKind::AliasedArgumentsEntry,
            vec![Value::from_smi(aliased_context_slot)],
        )
    }

    /// IC totals and the type feedback storage, all zero.
    pub fn new_type_feedback_info(&mut self) -> ObjectId {
        self.new_struct_with(
            StructKind::TypeFeedbackInfo,
            vec![Value::from_smi(0), Value::from_smi(0), Value::from_smi(0)],
        )
    }

    pub fn struct_field(&self, id: ObjectId, index: usize) -> Value {
        match self.heap.get(id) {
            HeapObject::Struct(s) => {
                assert!(index < s.fields.len(), "{INDEX_OUT_OF_BOUNDS}: {index}");
                s.fields[index]
            }
            other => panic!("not a struct: {:?} is {}", id, other.kind().name()),
        }
    }

    // ========================================================================
    // Scripts
    // ========================================================================

    /// Script record with the next id. Ids wrap to 1 after the largest
    /// positive value.
    pub fn new_script(&mut self, source: ObjectId) -> ObjectId {
        let id = self.last_script_id.checked_add(1).unwrap_or(1);
        self.last_script_id = id;
        let script = Script {
            id,
            source,
            name: Value::UNDEFINED,
            line_offset: 0,
            column_offset: 0,
            context_data: Value::UNDEFINED,
            kind: ScriptKind::Normal,
            line_ends: Value::UNDEFINED,
        };
        self.allocate(HeapObject::Script(Box::new(script)), Space::Old)
    }

    pub fn last_script_id(&self) -> i32 {
        self.last_script_id
    }

    pub fn set_last_script_id(&mut self, id: i32) {
        self.last_script_id = id;
    }
}
