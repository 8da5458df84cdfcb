//! Object literal shapes, cached per context by their ordered property names.

use super::Factory;
use crate::core::{
    HeapObject, JsObject, RawHeap, SHAPE_CACHE_CAPACITY, Shape, ShapeCacheTable, ShapeKey,
};
use crate::errors::messages::{NOT_A_SHAPE, NOT_A_SHAPE_CACHE, NOT_INTERNALIZED, PROPERTY_COUNT_MISMATCH};
use indexmap::IndexSet;
use lode_core::{ObjectId, Space, Value, fast_hasher, fast_map_with_capacity};

impl<H: RawHeap> Factory<H> {
    /// Shape for an object literal with `names`, in order.
    ///
    /// Names must be internalized strings. Equal name sequences share one
    /// shape for as long as the context lives.
    pub fn get_or_create_shape(&mut self, context: ObjectId, names: &[ObjectId]) -> ObjectId {
        for &name in names {
            assert!(self.is_internalized(name), "{NOT_INTERNALIZED}: {name:?}");
        }
        let cache = self.shape_cache_for(context);
        let key: ShapeKey = names.iter().copied().collect();
        if let Some(&shape) = self.shape_cache_table(cache).entries.get(&key) {
            self.shape_cache_hits += 1;
            tracing::trace!(target: "lode::shape_cache", cache_hit = true, ?shape, properties = names.len());
            return self.track(shape);
        }
        self.shape_cache_misses += 1;

        let native = self.native_context_of(context);
        let base = self.context(native).object_template;
        let mut properties = IndexSet::with_capacity_and_hasher(names.len(), fast_hasher());
        properties.extend(names.iter().copied());
        let shape = self.allocate(
            HeapObject::Shape(Box::new(Shape { base, properties })),
            Space::Old,
        );
        match self.heap.get_mut(cache) {
            HeapObject::ShapeCache(table) => {
                table.entries.insert(key, shape);
            }
            _ => panic!("{NOT_A_SHAPE_CACHE}: {cache:?}"),
        }
        self.heap.reaccount(cache);
        tracing::trace!(target: "lode::shape_cache", cache_hit = false, ?shape, properties = names.len());
        shape
    }

    /// The context's cache table, created on first use.
    fn shape_cache_for(&mut self, context: ObjectId) -> ObjectId {
        if let Some(cache) = self.context(context).shape_cache {
            return cache;
        }
        let table = ShapeCacheTable {
            entries: fast_map_with_capacity(SHAPE_CACHE_CAPACITY),
        };
        let cache = self.allocate(HeapObject::ShapeCache(Box::new(table)), Space::Old);
        self.context_mut(context).shape_cache = Some(cache);
        cache
    }

    fn shape_cache_table(&self, cache: ObjectId) -> &ShapeCacheTable {
        match self.heap.get(cache) {
            HeapObject::ShapeCache(table) => table,
            _ => panic!("{NOT_A_SHAPE_CACHE}: {cache:?}"),
        }
    }

    pub fn shape(&self, id: ObjectId) -> &Shape {
        match self.heap.get(id) {
            HeapObject::Shape(shape) => shape,
            _ => panic!("{NOT_A_SHAPE}: {id:?}"),
        }
    }

    /// Allocates an object with `shape` and one value per property.
    pub fn new_object_from_shape(&mut self, shape: ObjectId, values: &[Value]) -> ObjectId {
        let count = self.shape(shape).property_count();
        assert_eq!(count, values.len(), "{PROPERTY_COUNT_MISMATCH}");
        let object = JsObject {
            shape,
            properties: values.into(),
        };
        self.allocate(HeapObject::JsObject(Box::new(object)), Space::New)
    }

    /// Builds `{ names[0]: values[0], ... }` through the context's shape cache.
    ///
    /// A repeated name keeps its first position and its last value.
    pub fn new_object_literal(
        &mut self,
        context: ObjectId,
        names: &[ObjectId],
        values: &[Value],
    ) -> ObjectId {
        assert_eq!(names.len(), values.len(), "{PROPERTY_COUNT_MISMATCH}");
        let shape = self.get_or_create_shape(context, names);
        let layout = self.shape(shape);
        let mut slots = vec![Value::UNDEFINED; layout.property_count()];
        for (&name, &value) in names.iter().zip(values) {
            if let Some(slot) = layout.slot_of(name) {
                slots[slot] = value;
            }
        }
        self.new_object_from_shape(shape, &slots)
    }

    /// Reads a named property of an object built from a shape.
    pub fn object_property(&self, object: ObjectId, name: ObjectId) -> Option<Value> {
        let HeapObject::JsObject(o) = self.heap.get(object) else {
            return None;
        };
        let slot = self.shape(o.shape).slot_of(name)?;
        o.properties.get(slot).copied()
    }
}
