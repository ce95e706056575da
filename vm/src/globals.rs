use indexmap::IndexMap;
use memory::Value;

/// The global namespace: name to value, in registration order.
#[derive(Debug, Clone, Default)]
pub struct Globals {
    entries: IndexMap<String, Value>,
}

impl Globals {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `name` unless it is already bound. Returns whether it was added.
    pub fn define(&mut self, name: &str, value: Value) -> bool {
        if self.entries.contains_key(name) {
            return false;
        }
        self.entries.insert(name.to_owned(), value);
        true
    }

    /// Binds `name`, replacing any previous value.
    pub fn set(&mut self, name: &str, value: Value) {
        self.entries.insert(name.to_owned(), value);
    }

    pub fn get(&self, name: &str) -> Option<Value> {
        self.entries.get(name).copied()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, Value)> + '_ {
        self.entries.iter().map(|(k, v)| (k.as_str(), *v))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
