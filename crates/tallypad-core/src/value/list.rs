use super::Value;

/// A flat sequence of values
///
/// Nested lists are spliced in when the list is built; `had_nested` keeps
/// track of that so aggregates can refuse ambiguous input.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct List {
    items: Vec<Value>,
    had_nested: bool,
}

impl List {
    pub fn new(values: Vec<Value>) -> Self {
        let mut items = Vec::with_capacity(values.len());
        let mut had_nested = false;
        for value in values {
            match value {
                Value::List(inner) => {
                    had_nested = true;
                    items.extend(inner.items);
                }
                other => items.push(other),
            }
        }
        Self { items, had_nested }
    }

    pub fn items(&self) -> &[Value] {
        &self.items
    }

    pub fn into_items(self) -> Vec<Value> {
        self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn had_nested(&self) -> bool {
        self.had_nested
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Value> {
        self.items.iter()
    }

    /// Apply `f` to every element
    pub fn map(&self, f: impl Fn(&Value) -> Value) -> List {
        List {
            items: self.items.iter().map(f).collect(),
            had_nested: self.had_nested,
        }
    }
}

impl FromIterator<Value> for List {
    fn from_iter<I: IntoIterator<Item = Value>>(iter: I) -> Self {
        List::new(iter.into_iter().collect())
    }
}

impl<'a> IntoIterator for &'a List {
    type Item = &'a Value;
    type IntoIter = std::slice::Iter<'a, Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flattens_and_records_nesting() {
        let inner = Value::List(List::new(vec![Value::Number(2.0), Value::Number(3.0)]));
        let list = List::new(vec![Value::Number(1.0), inner]);
        assert_eq!(list.len(), 3);
        assert!(list.had_nested());

        let flat: List = (1..=3).map(|n| Value::Number(n as f64)).collect();
        assert!(!flat.had_nested());
    }
}
