use crate::core::{ErrorKind, RawHeap};
use crate::factory::{Completion, ErrorInvocation, Factory};
use lode_core::{FastHashMap, Space, Value, fast_map_new};

/// Builtin that turns an invocation into an error value.
pub type ErrorMaker<H> = fn(&mut Factory<H>, ErrorInvocation) -> Completion;

/// Named builtins the error builder consults before building an error.
pub struct BuiltinNamespace<H: RawHeap> {
    entries: FastHashMap<String, ErrorMaker<H>>,
}

impl<H: RawHeap> BuiltinNamespace<H> {
    pub fn new() -> Self {
        Self {
            entries: fast_map_new(),
        }
    }

    pub fn register(&mut self, name: &str, maker: ErrorMaker<H>) {
        self.entries.insert(name.to_string(), maker);
    }

    pub fn remove(&mut self, name: &str) -> Option<ErrorMaker<H>> {
        self.entries.remove(name)
    }

    pub fn lookup(&self, name: &str) -> Option<ErrorMaker<H>> {
        self.entries.get(name).copied()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.entries.keys().cloned().collect();
        names.sort();
        names
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<H: RawHeap> Default for BuiltinNamespace<H> {
    fn default() -> Self {
        Self::new()
    }
}

pub trait BuiltinProvider<H: RawHeap> {
    fn install(&self, namespace: &mut BuiltinNamespace<H>);
}

/// Installs a maker and a plain constructor for every error kind.
pub struct StdBuiltinProvider;

impl<H: RawHeap> BuiltinProvider<H> for StdBuiltinProvider {
    fn install(&self, namespace: &mut BuiltinNamespace<H>) {
        for kind in ErrorKind::ALL {
            namespace.register(kind.maker_name(), make_error::<H>);
            namespace.register(kind.constructor_name(), construct_error::<H>);
        }
    }
}

/// Expands `%N` placeholders in the template with the arguments.
fn make_error<H: RawHeap>(factory: &mut Factory<H>, invocation: ErrorInvocation) -> Completion {
    let template = factory.string_to_std(invocation.message);
    let text = factory.format_template(&template, invocation.arguments);
    let message = match factory.new_string_from_utf8(&text, Space::New) {
        Ok(id) => id,
        Err(_) => invocation.message,
    };
    let error = factory.new_error_object(invocation.kind, message, invocation.arguments);
    Completion::Normal(Value::object(error))
}

fn construct_error<H: RawHeap>(
    factory: &mut Factory<H>,
    invocation: ErrorInvocation,
) -> Completion {
    let error = factory.new_error_object(invocation.kind, invocation.message, None);
    Completion::Normal(Value::object(error))
}
