//! String representations and the walks that read them.
//!
//! A string is one of four layouts. Only `Flat` and `External` own code units;
//! `Composite` and `View` refer to other strings by `ObjectId`. Every walk here
//! is iterative over the layout tag, so deep composite trees cannot overflow
//! the native stack.

use super::heap::RawHeap;
use super::object::HeapObject;
use crate::errors::messages::NOT_A_STRING;
use lode_core::ObjectId;
use smallvec::SmallVec;
use std::cell::Cell;

/// Marker for a hash that has not been computed yet.
pub const HASH_UNKNOWN: u64 = 0;

/// Largest code unit representable in the narrow encoding.
pub const MAX_NARROW_UNIT: u16 = 0xff;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Encoding {
    /// One byte per unit (Latin-1).
    Narrow,
    /// Two bytes per unit (UTF-16 code units).
    Wide,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StringShape {
    Flat,
    Composite,
    View,
    External,
}

/// Owned code units of a flat string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FlatUnits {
    Narrow(Box<[u8]>),
    Wide(Box<[u16]>),
}

impl FlatUnits {
    pub fn as_units(&self) -> Units<'_> {
        match self {
            FlatUnits::Narrow(b) => Units::Narrow(b),
            FlatUnits::Wide(w) => Units::Wide(w),
        }
    }
}

/// Borrowed code units. Only valid while no allocation can happen.
#[derive(Debug, Clone, Copy)]
pub enum Units<'a> {
    Narrow(&'a [u8]),
    Wide(&'a [u16]),
}

impl<'a> Units<'a> {
    #[inline]
    pub fn len(&self) -> usize {
        match self {
            Units::Narrow(b) => b.len(),
            Units::Wide(w) => w.len(),
        }
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    #[inline]
    pub fn encoding(&self) -> Encoding {
        match self {
            Units::Narrow(_) => Encoding::Narrow,
            Units::Wide(_) => Encoding::Wide,
        }
    }

    #[inline]
    pub fn get(&self, index: usize) -> u16 {
        match self {
            Units::Narrow(b) => b[index] as u16,
            Units::Wide(w) => w[index],
        }
    }

    pub fn slice(&self, from: usize, to: usize) -> Units<'a> {
        match *self {
            Units::Narrow(b) => Units::Narrow(&b[from..to]),
            Units::Wide(w) => Units::Wide(&w[from..to]),
        }
    }

    /// True when every unit fits the narrow encoding.
    pub fn fits_narrow(&self) -> bool {
        match self {
            Units::Narrow(_) => true,
            Units::Wide(w) => w.iter().all(|&u| u <= MAX_NARROW_UNIT),
        }
    }

    /// Compares content unit by unit, independent of encoding.
    pub fn content_eq(&self, other: &Units<'_>) -> bool {
        if self.len() != other.len() {
            return false;
        }
        match (self, other) {
            (Units::Narrow(a), Units::Narrow(b)) => a == b,
            (Units::Wide(a), Units::Wide(b)) => a == b,
            (Units::Narrow(a), Units::Wide(b)) | (Units::Wide(b), Units::Narrow(a)) => {
                a.iter().zip(b.iter()).all(|(&x, &y)| x as u16 == y)
            }
        }
    }

    pub fn to_string_lossy(&self) -> String {
        match self {
            Units::Narrow(b) => b.iter().map(|&c| c as char).collect(),
            Units::Wide(w) => String::from_utf16_lossy(w),
        }
    }
}

/// Buffer owned by the embedding host.
///
/// The resource is dropped when the collector frees the string, which is the
/// host's signal that the buffer is no longer referenced.
pub trait ExternalStringResource {
    fn units(&self) -> Units<'_>;
}

pub struct FlatString {
    units: FlatUnits,
    pub(crate) internalized: bool,
    hash: Cell<u64>,
}

impl FlatString {
    pub fn new(units: FlatUnits) -> Self {
        Self {
            units,
            internalized: false,
            hash: Cell::new(HASH_UNKNOWN),
        }
    }

    pub fn units(&self) -> Units<'_> {
        self.units.as_units()
    }
}

#[derive(Debug, Clone, Copy)]
pub struct CompositeString {
    pub left: ObjectId,
    pub right: ObjectId,
    pub len: u32,
    pub encoding: Encoding,
    /// Wide node whose every unit still fits the narrow encoding.
    pub narrow_data: bool,
}

#[derive(Debug, Clone, Copy)]
pub struct ViewString {
    pub parent: ObjectId,
    pub offset: u32,
    pub len: u32,
    pub encoding: Encoding,
}

pub struct ExternalString {
    resource: Box<dyn ExternalStringResource>,
    pub(crate) internalized: bool,
    hash: Cell<u64>,
    /// Wide buffer whose units all fit the narrow encoding. Scanned once.
    narrow_data: bool,
}

impl ExternalString {
    pub fn new(resource: Box<dyn ExternalStringResource>) -> Self {
        let units = resource.units();
        let narrow_data = units.encoding() == Encoding::Wide && units.fits_narrow();
        Self {
            resource,
            internalized: false,
            hash: Cell::new(HASH_UNKNOWN),
            narrow_data,
        }
    }

    pub fn units(&self) -> Units<'_> {
        self.resource.units()
    }
}

pub enum StringObject {
    Flat(FlatString),
    Composite(CompositeString),
    View(ViewString),
    External(ExternalString),
}

impl StringObject {
    pub fn len(&self) -> usize {
        match self {
            StringObject::Flat(s) => s.units().len(),
            StringObject::Composite(c) => c.len as usize,
            StringObject::View(v) => v.len as usize,
            StringObject::External(e) => e.units().len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn encoding(&self) -> Encoding {
        match self {
            StringObject::Flat(s) => s.units().encoding(),
            StringObject::Composite(c) => c.encoding,
            StringObject::View(v) => v.encoding,
            StringObject::External(e) => e.units().encoding(),
        }
    }

    pub fn shape(&self) -> StringShape {
        match self {
            StringObject::Flat(_) => StringShape::Flat,
            StringObject::Composite(_) => StringShape::Composite,
            StringObject::View(_) => StringShape::View,
            StringObject::External(_) => StringShape::External,
        }
    }

    /// Units of a string that owns its buffer.
    pub fn direct_units(&self) -> Option<Units<'_>> {
        match self {
            StringObject::Flat(s) => Some(s.units()),
            StringObject::External(e) => Some(e.units()),
            StringObject::Composite(_) | StringObject::View(_) => None,
        }
    }

    pub fn is_internalized(&self) -> bool {
        match self {
            StringObject::Flat(s) => s.internalized,
            StringObject::External(e) => e.internalized,
            StringObject::Composite(_) | StringObject::View(_) => false,
        }
    }

    pub(crate) fn set_internalized(&mut self) {
        match self {
            StringObject::Flat(s) => s.internalized = true,
            StringObject::External(e) => e.internalized = true,
            StringObject::Composite(_) | StringObject::View(_) => {
                panic!("only flat and external strings can be internalized")
            }
        }
    }

    pub(crate) fn cached_hash(&self) -> u64 {
        match self {
            StringObject::Flat(s) => s.hash.get(),
            StringObject::External(e) => e.hash.get(),
            StringObject::Composite(_) | StringObject::View(_) => HASH_UNKNOWN,
        }
    }

    pub(crate) fn cache_hash(&self, hash: u64) {
        match self {
            StringObject::Flat(s) => s.hash.set(hash),
            StringObject::External(e) => e.hash.set(hash),
            StringObject::Composite(_) | StringObject::View(_) => {}
        }
    }

    pub(crate) fn byte_size(&self) -> usize {
        match self {
            StringObject::Flat(s) => match s.units() {
                Units::Narrow(b) => b.len(),
                Units::Wide(w) => w.len() * 2,
            },
            // The host owns external buffers; only the record is accounted.
            StringObject::External(_) => std::mem::size_of::<ExternalString>(),
            StringObject::Composite(_) | StringObject::View(_) => 0,
        }
    }
}

/// Growable buffer used to build the units of a new flat string.
pub enum FlatBuilder {
    Narrow(Vec<u8>),
    Wide(Vec<u16>),
}

impl FlatBuilder {
    pub fn with_capacity(encoding: Encoding, capacity: usize) -> Self {
        match encoding {
            Encoding::Narrow => FlatBuilder::Narrow(Vec::with_capacity(capacity)),
            Encoding::Wide => FlatBuilder::Wide(Vec::with_capacity(capacity)),
        }
    }

    pub fn len(&self) -> usize {
        match self {
            FlatBuilder::Narrow(b) => b.len(),
            FlatBuilder::Wide(w) => w.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn push(&mut self, units: Units<'_>) {
        match (self, units) {
            (FlatBuilder::Narrow(out), Units::Narrow(src)) => out.extend_from_slice(src),
            (FlatBuilder::Narrow(out), Units::Wide(src)) => {
                debug_assert!(src.iter().all(|&u| u <= MAX_NARROW_UNIT));
                out.extend(src.iter().map(|&u| u as u8));
            }
            (FlatBuilder::Wide(out), Units::Narrow(src)) => {
                out.extend(src.iter().map(|&u| u as u16))
            }
            (FlatBuilder::Wide(out), Units::Wide(src)) => out.extend_from_slice(src),
        }
    }

    pub fn push_unit(&mut self, unit: u16) {
        match self {
            FlatBuilder::Narrow(out) => {
                debug_assert!(unit <= MAX_NARROW_UNIT);
                out.push(unit as u8)
            }
            FlatBuilder::Wide(out) => out.push(unit),
        }
    }

    pub fn finish(self) -> FlatUnits {
        match self {
            FlatBuilder::Narrow(b) => FlatUnits::Narrow(b.into_boxed_slice()),
            FlatBuilder::Wide(w) => FlatUnits::Wide(w.into_boxed_slice()),
        }
    }
}

// ============================================================================
// Walks
// ============================================================================

#[inline]
pub fn string_object<H: RawHeap + ?Sized>(heap: &H, id: ObjectId) -> &StringObject {
    match heap.get(id) {
        HeapObject::String(s) => s,
        _ => panic!("{NOT_A_STRING}: {id:?}"),
    }
}

/// Copies units `[from, to)` of `id` into `sink`, descending composites and
/// views with an explicit stack.
pub fn write_to_flat<H: RawHeap + ?Sized>(
    heap: &H,
    id: ObjectId,
    from: usize,
    to: usize,
    sink: &mut FlatBuilder,
) {
    let mut pending: SmallVec<[(ObjectId, usize, usize); 16]> = SmallVec::new();
    pending.push((id, from, to));
    while let Some((id, from, to)) = pending.pop() {
        if from >= to {
            continue;
        }
        match string_object(heap, id) {
            StringObject::Flat(s) => sink.push(s.units().slice(from, to)),
            StringObject::External(e) => sink.push(e.units().slice(from, to)),
            StringObject::View(v) => {
                let offset = v.offset as usize;
                pending.push((v.parent, from + offset, to + offset));
            }
            StringObject::Composite(c) => {
                let split = string_object(heap, c.left).len();
                // Right half first so the left half is popped, and copied, first.
                if to > split {
                    pending.push((c.right, from.saturating_sub(split), to - split));
                }
                if from < split {
                    pending.push((c.left, from, to.min(split)));
                }
            }
        }
    }
}

/// Reads one code unit without flattening.
pub fn char_at<H: RawHeap + ?Sized>(heap: &H, mut id: ObjectId, mut index: usize) -> u16 {
    loop {
        match string_object(heap, id) {
            StringObject::Flat(s) => return s.units().get(index),
            StringObject::External(e) => return e.units().get(index),
            StringObject::View(v) => {
                index += v.offset as usize;
                id = v.parent;
            }
            StringObject::Composite(c) => {
                let split = string_object(heap, c.left).len();
                if index < split {
                    id = c.left;
                } else {
                    index -= split;
                    id = c.right;
                }
            }
        }
    }
}

/// Cheap check for narrow content: the representation or a recorded hint.
/// Wide flat buffers are not scanned.
pub fn has_only_narrow_chars<H: RawHeap + ?Sized>(heap: &H, id: ObjectId) -> bool {
    match string_object(heap, id) {
        StringObject::Composite(c) => c.encoding == Encoding::Narrow || c.narrow_data,
        StringObject::External(e) => e.narrow_data || e.units().encoding() == Encoding::Narrow,
        s => s.encoding() == Encoding::Narrow,
    }
}
