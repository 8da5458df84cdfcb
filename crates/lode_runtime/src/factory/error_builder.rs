//! Error objects.
//!
//! The builder looks the error maker up in the builtin namespace first and
//! only invokes it when it exists. Without it, an error record is built
//! directly with a degraded message.

use super::Factory;
use super::strings::write_number;
use crate::core::{ErrorKind, ErrorRecord, HeapObject, RawHeap};
use lode_core::{ObjectId, Space, Value};

/// Outcome of invoking an error maker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Completion {
    Normal(Value),
    Throw(Value),
}

impl Completion {
    pub fn value(self) -> Value {
        match self {
            Completion::Normal(v) | Completion::Throw(v) => v,
        }
    }

    pub fn is_throw(self) -> bool {
        matches!(self, Completion::Throw(_))
    }
}

/// Arguments handed to an error maker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ErrorInvocation {
    pub kind: ErrorKind,
    /// Message template key, or the message itself for plain constructors.
    pub message: ObjectId,
    /// Fixed array of template arguments.
    pub arguments: Option<ObjectId>,
}

impl<H: RawHeap> Factory<H> {
    /// Builds an error of `kind` from a message template and its arguments.
    pub fn new_error_with_args(
        &mut self,
        kind: ErrorKind,
        message: &str,
        args: &[Value],
    ) -> Completion {
        let Some(maker) = self.builtins.lookup(kind.maker_name()) else {
            tracing::debug!(
                target: "lode::error",
                maker = kind.maker_name(),
                "error maker unavailable, building degraded error"
            );
            let text = self.degraded_message(message, args);
            return Completion::Normal(self.new_degraded_error(kind, &text));
        };
        let message = self.internalize_utf8(message);
        let arguments = self.new_fixed_array_from(args, Space::New);
        maker(
            self,
            ErrorInvocation {
                kind,
                message,
                arguments: Some(arguments),
            },
        )
    }

    /// Builds an error of `kind` with a plain message string.
    pub fn new_error_from_string(&mut self, kind: ErrorKind, message: ObjectId) -> Completion {
        let Some(constructor) = self.builtins.lookup(kind.constructor_name()) else {
            tracing::debug!(
                target: "lode::error",
                constructor = kind.constructor_name(),
                "error constructor unavailable, building degraded error"
            );
            let text = self.degraded_message(&self.string_to_std(message), &[]);
            return Completion::Normal(self.new_degraded_error(kind, &text));
        };
        constructor(
            self,
            ErrorInvocation {
                kind,
                message,
                arguments: None,
            },
        )
    }

    pub fn new_type_error(&mut self, message: &str, args: &[Value]) -> Completion {
        self.new_error_with_args(ErrorKind::Type, message, args)
    }

    pub fn new_range_error(&mut self, message: &str, args: &[Value]) -> Completion {
        self.new_error_with_args(ErrorKind::Range, message, args)
    }

    pub fn new_syntax_error(&mut self, message: &str, args: &[Value]) -> Completion {
        self.new_error_with_args(ErrorKind::Syntax, message, args)
    }

    pub fn new_reference_error(&mut self, message: &str, args: &[Value]) -> Completion {
        self.new_error_with_args(ErrorKind::Reference, message, args)
    }

    pub fn new_eval_error(&mut self, message: &str, args: &[Value]) -> Completion {
        self.new_error_with_args(ErrorKind::Eval, message, args)
    }

    pub fn new_error(&mut self, message: &str, args: &[Value]) -> Completion {
        self.new_error_with_args(ErrorKind::Error, message, args)
    }

    /// Allocates an error record.
    pub fn new_error_object(
        &mut self,
        kind: ErrorKind,
        message: ObjectId,
        arguments: Option<ObjectId>,
    ) -> ObjectId {
        let record = ErrorRecord {
            kind,
            message,
            arguments,
            degraded: false,
        };
        self.allocate(HeapObject::Error(Box::new(record)), Space::New)
    }

    fn new_degraded_error(&mut self, kind: ErrorKind, text: &str) -> Value {
        // Degraded text is ASCII or Latin-1 at worst; it always fits the length limit.
        let message = match self.new_string_from_utf8(text, Space::Old) {
            Ok(id) => id,
            Err(_) => self.roots.empty_string,
        };
        let record = ErrorRecord {
            kind,
            message,
            arguments: None,
            degraded: true,
        };
        Value::object(self.allocate(HeapObject::Error(Box::new(record)), Space::Old))
    }

    /// Formats `message` and each argument, separated by spaces, into a
    /// buffer of `error_buffer_size` bytes with one byte kept for the
    /// terminator. Truncates at a char boundary once the buffer is full.
    fn degraded_message(&self, message: &str, args: &[Value]) -> String {
        let capacity = self.config.error_buffer_size - 1;
        let mut out = String::with_capacity(capacity);
        push_truncated(&mut out, message, capacity);
        for arg in args {
            if out.len() >= capacity {
                break;
            }
            out.push(' ');
            let text = self.display_value(*arg);
            push_truncated(&mut out, &text, capacity);
        }
        out
    }

    /// Short human-readable text of a value.
    pub fn display_value(&self, value: Value) -> String {
        if value.is_smi() {
            let mut buf = itoa::Buffer::new();
            return buf.format(value.as_smi()).to_string();
        }
        if value.is_bool() {
            return if value.as_bool() { "true" } else { "false" }.to_string();
        }
        let Some(id) = value.as_object() else {
            return value.type_name().to_string();
        };
        match self.heap.get(id) {
            HeapObject::String(_) => self.string_to_std(id),
            HeapObject::HeapNumber(n) => {
                let mut out = String::new();
                write_number(&mut out, *n);
                out
            }
            other => format!("[object {}]", other.kind().name()),
        }
    }

    /// Message text with `%0`..`%9` replaced by the arguments.
    pub(crate) fn format_template(&self, template: &str, arguments: Option<ObjectId>) -> String {
        let args: Vec<Value> = match arguments.map(|id| self.heap.get(id)) {
            Some(HeapObject::FixedArray(items)) => items.to_vec(),
            _ => Vec::new(),
        };
        let mut out = String::with_capacity(template.len());
        let mut chars = template.chars().peekable();
        while let Some(c) = chars.next() {
            if c == '%' {
                if let Some(index) = chars.peek().and_then(|d| d.to_digit(10)) {
                    chars.next();
                    match args.get(index as usize) {
                        Some(arg) => out.push_str(&self.display_value(*arg)),
                        None => out.push_str("undefined"),
                    }
                    continue;
                }
            }
            out.push(c);
        }
        out
    }
}

fn push_truncated(out: &mut String, text: &str, capacity: usize) {
    let room = capacity.saturating_sub(out.len());
    if text.len() <= room {
        out.push_str(text);
        return;
    }
    let mut end = room;
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    out.push_str(&text[..end]);
}

#[cfg(test)]
mod tests {
    use super::push_truncated;

    #[test]
    fn truncation_respects_char_boundaries() {
        let mut out = String::from("ab");
        push_truncated(&mut out, "π€", 5);
        assert_eq!(out, "abπ");
    }
}
