//! String construction: concatenation, slicing, flattening and raw strings.

use super::{Factory, NUMBER_STRING_CACHE_SIZE};
use crate::core::text::{self, MAX_NARROW_UNIT, has_only_narrow_chars, string_object, write_to_flat};
use crate::core::{
    CompositeString, Encoding, ExternalStringResource, ExternalString, FlatBuilder, FlatString,
    FlatUnits, HeapObject, RawHeap, StringObject, StringShape, Units, ViewString,
};
use crate::errors::FactoryError;
use crate::errors::messages::SLICE_OUT_OF_BOUNDS;
use lode_core::{ObjectId, Space, Value};

const MAX_SAFE_INTEGER: f64 = 9_007_199_254_740_992.0;

/// Writes `value` the way number-to-string conversion spells it: plain
/// decimals for magnitudes in `[1e-6, 1e21)`, exponent form with a signed
/// exponent otherwise.
pub(crate) fn write_number(out: &mut String, value: f64) {
    if value.is_nan() {
        out.push_str("NaN");
    } else if value.is_infinite() {
        out.push_str(if value > 0.0 { "Infinity" } else { "-Infinity" });
    } else if value == 0.0 {
        out.push('0');
    } else if value.fract() == 0.0 && value.abs() < MAX_SAFE_INTEGER {
        let mut buf = itoa::Buffer::new();
        out.push_str(buf.format(value as i64));
    } else {
        if value < 0.0 {
            out.push('-');
        }
        let mut buf = ryu::Buffer::new();
        let (digits, point) = shortest_digits(buf.format_finite(value.abs()));
        write_decimal(out, &digits, point);
    }
}

/// Splits ryu output into significant digits and the decimal point position
/// `n`, so that the value is `0.d1d2...dk * 10^n`.
fn shortest_digits(formatted: &str) -> (Vec<u8>, i32) {
    let (mantissa, exponent) = match formatted.split_once(['e', 'E']) {
        Some((m, e)) => (m, e.parse::<i32>().unwrap_or(0)),
        None => (formatted, 0),
    };
    let (int_part, frac_part) = mantissa.split_once('.').unwrap_or((mantissa, ""));
    let mut digits: Vec<u8> = int_part.bytes().chain(frac_part.bytes()).collect();
    let mut point = int_part.len() as i32 + exponent;

    let leading = digits.iter().take_while(|&&d| d == b'0').count();
    digits.drain(..leading);
    point -= leading as i32;
    while digits.last() == Some(&b'0') {
        digits.pop();
    }
    (digits, point)
}

fn write_decimal(out: &mut String, digits: &[u8], point: i32) {
    let k = digits.len() as i32;
    let push = |out: &mut String, bytes: &[u8]| out.extend(bytes.iter().map(|&b| b as char));
    if k <= point && point <= 21 {
        push(out, digits);
        out.extend(std::iter::repeat_n('0', (point - k) as usize));
    } else if 0 < point && point <= 21 {
        push(out, &digits[..point as usize]);
        out.push('.');
        push(out, &digits[point as usize..]);
    } else if -6 < point && point <= 0 {
        out.push_str("0.");
        out.extend(std::iter::repeat_n('0', (-point) as usize));
        push(out, digits);
    } else {
        push(out, &digits[..1]);
        if k > 1 {
            out.push('.');
            push(out, &digits[1..]);
        }
        let exponent = point - 1;
        out.push('e');
        out.push(if exponent < 0 { '-' } else { '+' });
        let mut buf = itoa::Buffer::new();
        out.push_str(buf.format(exponent.unsigned_abs()));
    }
}

/// Packs units into the narrow encoding when every unit fits.
pub(crate) fn narrow_if_possible(units: Units<'_>) -> FlatUnits {
    let encoding = if units.fits_narrow() {
        Encoding::Narrow
    } else {
        Encoding::Wide
    };
    let mut builder = FlatBuilder::with_capacity(encoding, units.len());
    builder.push(units);
    builder.finish()
}

fn is_digit(unit: u16) -> bool {
    (b'0' as u16..=b'9' as u16).contains(&unit)
}

impl<H: RawHeap> Factory<H> {
    fn check_length(&self, length: usize) -> Result<(), FactoryError> {
        let max = self.config.max_string_length;
        if length > max {
            return Err(FactoryError::InvalidStringLength { length, max });
        }
        Ok(())
    }

    pub(crate) fn allocate_flat(&mut self, units: FlatUnits, space: Space) -> ObjectId {
        self.allocate(HeapObject::String(StringObject::Flat(FlatString::new(units))), space)
    }

    /// Copies units `[from, to)` of `id` into an owned buffer.
    pub(crate) fn copy_units(
        &self,
        id: ObjectId,
        from: usize,
        to: usize,
        encoding: Encoding,
    ) -> FlatUnits {
        let _no_alloc = self.gate.disallow();
        let mut builder = FlatBuilder::with_capacity(encoding, to - from);
        write_to_flat(&self.heap, id, from, to, &mut builder);
        builder.finish()
    }

    // ========================================================================
    // Readers
    // ========================================================================

    pub fn string_len(&self, id: ObjectId) -> usize {
        string_object(&self.heap, id).len()
    }

    pub fn string_encoding(&self, id: ObjectId) -> Encoding {
        string_object(&self.heap, id).encoding()
    }

    pub fn string_shape(&self, id: ObjectId) -> StringShape {
        string_object(&self.heap, id).shape()
    }

    pub fn is_internalized(&self, id: ObjectId) -> bool {
        string_object(&self.heap, id).is_internalized()
    }

    pub fn has_only_narrow_chars(&self, id: ObjectId) -> bool {
        has_only_narrow_chars(&self.heap, id)
    }

    /// Code unit at `index`, read without flattening.
    pub fn char_at(&self, id: ObjectId, index: usize) -> u16 {
        assert!(index < self.string_len(id), "{SLICE_OUT_OF_BOUNDS}");
        text::char_at(&self.heap, id, index)
    }

    pub fn string_to_std(&self, id: ObjectId) -> String {
        let s = string_object(&self.heap, id);
        if let Some(units) = s.direct_units() {
            return units.to_string_lossy();
        }
        let len = s.len();
        let encoding = s.encoding();
        self.copy_units(id, 0, len, encoding).as_units().to_string_lossy()
    }

    /// Content equality, independent of representation.
    pub fn strings_equal(&self, a: ObjectId, b: ObjectId) -> bool {
        if a == b {
            return true;
        }
        let (sa, sb) = (string_object(&self.heap, a), string_object(&self.heap, b));
        if sa.len() != sb.len() {
            return false;
        }
        if sa.is_internalized() && sb.is_internalized() {
            return false;
        }
        if let (Some(ua), Some(ub)) = (sa.direct_units(), sb.direct_units()) {
            return ua.content_eq(&ub);
        }
        let len = sa.len();
        let ua = self.copy_units(a, 0, len, Encoding::Wide);
        let ub = self.copy_units(b, 0, len, Encoding::Wide);
        ua == ub
    }

    // ========================================================================
    // Concatenation
    // ========================================================================

    /// Concatenates two strings.
    ///
    /// An empty operand returns the other one. Results shorter than the
    /// composite threshold are flat copies; longer results are composite
    /// nodes that copy nothing.
    pub fn concat(&mut self, left: ObjectId, right: ObjectId) -> Result<ObjectId, FactoryError> {
        let left_len = self.string_len(left);
        if left_len == 0 {
            return Ok(right);
        }
        let right_len = self.string_len(right);
        if right_len == 0 {
            return Ok(left);
        }

        let length = left_len + right_len;
        if length == 2 {
            let c1 = text::char_at(&self.heap, left, 0);
            let c2 = text::char_at(&self.heap, right, 0);
            return Ok(self.make_or_find_two_character_string(c1, c2));
        }
        self.check_length(length)?;

        let narrow = self.string_encoding(left) == Encoding::Narrow
            && self.string_encoding(right) == Encoding::Narrow;
        let encoding = if narrow { Encoding::Narrow } else { Encoding::Wide };
        let narrow_data = !narrow
            && has_only_narrow_chars(&self.heap, left)
            && has_only_narrow_chars(&self.heap, right);

        if length < self.config.composite_min_length {
            let units = {
                let _no_alloc = self.gate.disallow();
                let mut builder = FlatBuilder::with_capacity(encoding, length);
                for id in [left, right] {
                    let units = string_object(&self.heap, id)
                        .direct_units()
                        .unwrap_or_else(|| panic!("short concat operand is not flat: {id:?}"));
                    builder.push(units);
                }
                builder.finish()
            };
            return Ok(self.allocate_flat(units, Space::New));
        }

        let node = CompositeString {
            left,
            right,
            len: length as u32,
            encoding,
            narrow_data,
        };
        Ok(self.allocate(HeapObject::String(StringObject::Composite(node)), Space::New))
    }

    /// Always produces a flat copy of `first` followed by `second`.
    pub fn new_flat_concat_string(
        &mut self,
        first: ObjectId,
        second: ObjectId,
    ) -> Result<ObjectId, FactoryError> {
        let first_len = self.string_len(first);
        let second_len = self.string_len(second);
        let length = first_len + second_len;
        self.check_length(length)?;
        let narrow = self.string_encoding(first) == Encoding::Narrow
            && self.string_encoding(second) == Encoding::Narrow;
        let encoding = if narrow { Encoding::Narrow } else { Encoding::Wide };
        let units = {
            let _no_alloc = self.gate.disallow();
            let mut builder = FlatBuilder::with_capacity(encoding, length);
            write_to_flat(&self.heap, first, 0, first_len, &mut builder);
            write_to_flat(&self.heap, second, 0, second_len, &mut builder);
            builder.finish()
        };
        Ok(self.allocate_flat(units, Space::New))
    }

    /// Canonical two-unit string if one is interned, otherwise a new flat one.
    /// Digit pairs skip the table lookup.
    pub(crate) fn make_or_find_two_character_string(&mut self, c1: u16, c2: u16) -> ObjectId {
        if !(is_digit(c1) && is_digit(c2)) {
            let pair = [c1, c2];
            if let Some(found) = self.lookup_units_if_exists(Units::Wide(&pair)) {
                return self.track(found);
            }
        }
        let units = if (c1 | c2) <= MAX_NARROW_UNIT {
            FlatUnits::Narrow(Box::new([c1 as u8, c2 as u8]))
        } else {
            FlatUnits::Wide(Box::new([c1, c2]))
        };
        self.allocate_flat(units, Space::New)
    }

    // ========================================================================
    // Slicing
    // ========================================================================

    /// Sub-string `[begin, end)` of `source`. The whole range returns `source`.
    pub fn slice(&mut self, source: ObjectId, begin: usize, end: usize) -> ObjectId {
        let len = self.string_len(source);
        assert!(begin <= end && end <= len, "{SLICE_OUT_OF_BOUNDS}: {begin}..{end} of {len}");
        if begin == 0 && end == len {
            return source;
        }
        self.new_proper_sub_string(source, begin, end)
    }

    fn new_proper_sub_string(&mut self, source: ObjectId, begin: usize, end: usize) -> ObjectId {
        let length = end - begin;
        match length {
            0 => return self.track(self.roots.empty_string),
            1 => {
                let code = text::char_at(&self.heap, source, begin);
                return self.lookup_single_character_string(code);
            }
            2 => {
                let c1 = text::char_at(&self.heap, source, begin);
                let c2 = text::char_at(&self.heap, source, begin + 1);
                return self.make_or_find_two_character_string(c1, c2);
            }
            _ => {}
        }

        if !self.config.string_slices || length < self.config.view_min_length {
            let encoding = self.string_encoding(source);
            let units = self.copy_units(source, begin, end, encoding);
            return self.allocate_flat(units, Space::New);
        }

        let mut node = source;
        let mut offset = begin;
        while let StringObject::Composite(c) = string_object(&self.heap, node) {
            let split = self.string_len(c.left);
            if split <= offset {
                node = c.right;
                offset -= split;
            } else if offset + length <= split {
                node = c.left;
            } else {
                break;
            }
        }

        let parent = match string_object(&self.heap, node) {
            StringObject::View(v) => {
                offset += v.offset as usize;
                v.parent
            }
            _ => self.flatten(node),
        };
        let view = ViewString {
            parent,
            offset: offset as u32,
            len: length as u32,
            encoding: self.string_encoding(parent),
        };
        self.allocate(HeapObject::String(StringObject::View(view)), Space::New)
    }

    // ========================================================================
    // Flattening
    // ========================================================================

    /// Replaces a composite's representation with a flat copy of its content.
    /// The id is unchanged; other layouts are returned as they are.
    pub fn flatten(&mut self, id: ObjectId) -> ObjectId {
        let (len, encoding) = match string_object(&self.heap, id) {
            StringObject::Composite(c) => (c.len as usize, c.encoding),
            _ => return id,
        };
        let units = self.copy_units(id, 0, len, encoding);
        let mark = self.open_scope();
        self.track(id);
        let flat = self.allocate_flat(units, Space::New);
        self.heap.transplant(flat, id);
        self.close_scope(mark);
        id
    }

    // ========================================================================
    // Raw construction
    // ========================================================================

    pub fn new_string_from_one_byte(
        &mut self,
        bytes: &[u8],
        space: Space,
    ) -> Result<ObjectId, FactoryError> {
        self.check_length(bytes.len())?;
        Ok(self.allocate_flat(FlatUnits::Narrow(bytes.into()), space))
    }

    /// Latin-1 content is stored narrow, anything else as UTF-16.
    pub fn new_string_from_utf8(&mut self, s: &str, space: Space) -> Result<ObjectId, FactoryError> {
        let units = if s.chars().all(|c| (c as u32) <= MAX_NARROW_UNIT as u32) {
            FlatUnits::Narrow(s.chars().map(|c| c as u8).collect())
        } else {
            FlatUnits::Wide(s.encode_utf16().collect())
        };
        self.check_length(units.as_units().len())?;
        Ok(self.allocate_flat(units, space))
    }

    pub fn new_string_from_two_byte(
        &mut self,
        units: &[u16],
        space: Space,
    ) -> Result<ObjectId, FactoryError> {
        self.check_length(units.len())?;
        Ok(self.allocate_flat(narrow_if_possible(Units::Wide(units)), space))
    }

    /// Wraps a host-owned buffer. The resource is dropped when the string dies.
    pub fn new_external_string(
        &mut self,
        resource: Box<dyn ExternalStringResource>,
    ) -> Result<ObjectId, FactoryError> {
        self.check_length(resource.units().len())?;
        let external = ExternalString::new(resource);
        Ok(self.allocate(HeapObject::String(StringObject::External(external)), Space::New))
    }

    /// Canonical one-unit string. Narrow codes are cached and internalized.
    pub fn lookup_single_character_string(&mut self, code: u16) -> ObjectId {
        if code > MAX_NARROW_UNIT {
            return self.allocate_flat(FlatUnits::Wide(Box::new([code])), Space::New);
        }
        if let Some(id) = self.single_chars[code as usize] {
            return self.track(id);
        }
        let id = self.internalize_one_byte(&[code as u8]);
        self.single_chars[code as usize] = Some(id);
        id
    }

    /// Decimal spelling of a number value, cached until the next collection.
    pub fn number_to_string(&mut self, value: Value) -> ObjectId {
        let number = self
            .number_value(value)
            .unwrap_or_else(|| panic!("not a number: {value:?}"));
        let key = number.to_bits();
        if let Some(&id) = self.number_strings.get(&key) {
            return self.track(id);
        }
        let mut out = String::new();
        write_number(&mut out, number);
        let units = FlatUnits::Narrow(out.into_bytes().into_boxed_slice());
        let id = self.allocate_flat(units, Space::New);
        if self.number_strings.len() >= NUMBER_STRING_CACHE_SIZE {
            self.number_strings.clear();
        }
        self.number_strings.insert(key, id);
        id
    }

    pub fn uint32_to_string(&mut self, value: u32) -> ObjectId {
        let number = self.new_number_from_uint(value);
        self.number_to_string(number)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spelled(value: f64) -> String {
        let mut out = String::new();
        write_number(&mut out, value);
        out
    }

    #[test]
    fn numbers_are_spelled_like_the_language() {
        assert_eq!(spelled(42.0), "42");
        assert_eq!(spelled(-0.0), "0");
        assert_eq!(spelled(1.5), "1.5");
        assert_eq!(spelled(f64::NAN), "NaN");
        assert_eq!(spelled(f64::NEG_INFINITY), "-Infinity");
    }

    #[test]
    fn exponent_form_starts_at_1e21_and_below_1e_minus_6() {
        assert_eq!(spelled(1e21), "1e+21");
        assert_eq!(spelled(1e20), "100000000000000000000");
        assert_eq!(spelled(9_007_199_254_740_994.0), "9007199254740994");
        assert_eq!(spelled(0.000001), "0.000001");
        assert_eq!(spelled(1e-7), "1e-7");
        assert_eq!(spelled(1.5e300), "1.5e+300");
        assert_eq!(spelled(-1.25e-10), "-1.25e-10");
        assert_eq!(spelled(123.456), "123.456");
        assert_eq!(spelled(-0.5), "-0.5");
        assert_eq!(spelled(f64::MAX), "1.7976931348623157e+308");
        assert_eq!(spelled(5e-324), "5e-324");
    }

    #[test]
    fn narrow_if_possible_keeps_wide_units() {
        assert!(matches!(
            narrow_if_possible(Units::Wide(&[0x61, 0x62])),
            FlatUnits::Narrow(_)
        ));
        assert!(matches!(
            narrow_if_possible(Units::Wide(&[0x3c0])),
            FlatUnits::Wide(_)
        ));
    }
}
