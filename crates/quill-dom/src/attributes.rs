//! Ordered attribute list.
//!
//! [§ 4.9 Interface Element](https://dom.spec.whatwg.org/#concept-element-attribute)
//!
//! "An element has an associated ordered attribute list." Names are unique
//! within the list; insertion order is kept so serialization reproduces the
//! source order.

/// A single name/value pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attr {
    /// Attribute local name.
    pub name: String,
    /// Attribute value (empty for boolean attributes).
    pub value: String,
    /// False when the source wrote the bare name. Serialization then
    /// writes the name alone instead of `name=""`.
    pub has_value: bool,
}

/// Ordered, name-unique attribute list of an element.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Attributes {
    entries: Vec<Attr>,
}

impl Attributes {
    /// Create an empty attribute list.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Number of attributes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True if the element has no attributes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Look up an attribute value by exact name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|attr| attr.name == name)
            .map(|attr| attr.value.as_str())
    }

    /// True if an attribute with this exact name exists.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.entries.iter().any(|attr| attr.name == name)
    }

    /// [§ 4.9.2 Set an attribute value](https://dom.spec.whatwg.org/#concept-element-attributes-set-value)
    ///
    /// "If attribute is null, create an attribute ... and then append this
    /// attribute to element. Otherwise change attribute's value to value."
    ///
    /// Returns the previous value, if any.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<String>) -> Option<String> {
        let name = name.into();
        let value = value.into();
        if let Some(existing) = self.entries.iter_mut().find(|attr| attr.name == name) {
            existing.has_value = true;
            return Some(std::mem::replace(&mut existing.value, value));
        }
        self.entries.push(Attr {
            name,
            value,
            has_value: true,
        });
        None
    }

    /// Insert only if the name is not present yet.
    ///
    /// Used by the tree builder for duplicate attributes and for merging
    /// attributes onto `html`/`body`, where the first occurrence wins.
    pub fn set_if_absent(&mut self, name: &str, value: &str) -> bool {
        if self.contains(name) {
            return false;
        }
        self.entries.push(Attr {
            name: name.to_string(),
            value: value.to_string(),
            has_value: true,
        });
        true
    }

    /// As [`Attributes::set_if_absent`], for an attribute written without a
    /// value (`<input disabled>`).
    pub fn set_valueless_if_absent(&mut self, name: &str) -> bool {
        if self.contains(name) {
            return false;
        }
        self.entries.push(Attr {
            name: name.to_string(),
            value: String::new(),
            has_value: false,
        });
        true
    }

    /// Remove an attribute, returning its value.
    pub fn remove(&mut self, name: &str) -> Option<String> {
        let index = self.entries.iter().position(|attr| attr.name == name)?;
        Some(self.entries.remove(index).value)
    }

    /// Iterate attributes in order.
    pub fn iter(&self) -> impl Iterator<Item = &Attr> {
        self.entries.iter()
    }

    /// Iterate attribute names in order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|attr| attr.name.as_str())
    }
}

impl<N: Into<String>, V: Into<String>> FromIterator<(N, V)> for Attributes {
    fn from_iter<I: IntoIterator<Item = (N, V)>>(iter: I) -> Self {
        let mut attributes = Self::new();
        for (name, value) in iter {
            let _ = attributes.set(name, value);
        }
        attributes
    }
}

impl<'a> IntoIterator for &'a Attributes {
    type Item = &'a Attr;
    type IntoIter = std::slice::Iter<'a, Attr>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_keeps_insertion_order_and_replaces_in_place() {
        let mut attrs = Attributes::new();
        assert_eq!(attrs.set("b", "1"), None);
        assert_eq!(attrs.set("a", "2"), None);
        assert_eq!(attrs.set("b", "3"), Some("1".to_string()));

        let names: Vec<&str> = attrs.names().collect();
        assert_eq!(names, vec!["b", "a"]);
        assert_eq!(attrs.get("b"), Some("3"));
    }

    #[test]
    fn test_set_if_absent_keeps_first() {
        let mut attrs: Attributes = [("id", "x")].into_iter().collect();
        assert!(!attrs.set_if_absent("id", "y"));
        assert!(attrs.set_if_absent("class", "c"));
        assert_eq!(attrs.get("id"), Some("x"));
        assert_eq!(attrs.len(), 2);
    }

    #[test]
    fn test_valueless_attribute_gains_value_on_set() {
        let mut attrs = Attributes::new();
        assert!(attrs.set_valueless_if_absent("hidden"));
        assert!(!attrs.set_valueless_if_absent("hidden"));
        assert_eq!(attrs.get("hidden"), Some(""));
        assert!(attrs.iter().all(|attr| !attr.has_value));

        assert_eq!(attrs.set("hidden", ""), Some(String::new()));
        assert!(attrs.iter().all(|attr| attr.has_value));
    }

    #[test]
    fn test_remove() {
        let mut attrs: Attributes = [("id", "x"), ("class", "c")].into_iter().collect();
        assert_eq!(attrs.remove("id"), Some("x".to_string()));
        assert_eq!(attrs.remove("id"), None);
        assert_eq!(attrs.len(), 1);
    }
}
