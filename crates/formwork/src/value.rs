//! Read/write access into the `serde_json::Value` form tree by [`FieldPath`].
//!
//! Writes create intermediate containers on demand: key segments materialize
//! objects, index segments materialize arrays padded with `Null` up to the
//! target slot.

use serde_json::Value;

use crate::path::{FieldPath, Segment};

pub(crate) fn get<'a>(root: &'a Value, path: &FieldPath) -> Option<&'a Value> {
    let mut current = root;
    for segment in path.segments() {
        current = match segment {
            Segment::Key(key) => current.as_object()?.get(key)?,
            Segment::Index(index) => current.as_array()?.get(*index)?,
        };
    }
    Some(current)
}

/// Mutable handle on the array a list path points at.
pub(crate) fn array_mut<'a>(root: &'a mut Value, path: &FieldPath) -> Option<&'a mut Vec<Value>> {
    let mut current = root;
    for segment in path.segments() {
        current = match segment {
            Segment::Key(key) => current.as_object_mut()?.get_mut(key)?,
            Segment::Index(index) => current.as_array_mut()?.get_mut(*index)?,
        };
    }
    current.as_array_mut()
}

pub(crate) fn set(root: &mut Value, path: &FieldPath, new: Value) {
    let mut current = root;
    let count = path.segments().len();
    for (i, segment) in path.segments().iter().enumerate() {
        let last = i + 1 == count;
        match segment {
            Segment::Key(key) => {
                if !current.is_object() {
                    *current = Value::Object(serde_json::Map::new());
                }
                let Value::Object(map) = current else {
                    unreachable!("object ensured above")
                };
                if last {
                    map.insert(key.clone(), new);
                    return;
                }
                current = map.entry(key.clone()).or_insert(Value::Null);
            }
            Segment::Index(index) => {
                if !current.is_array() {
                    *current = Value::Array(Vec::new());
                }
                let Value::Array(items) = current else {
                    unreachable!("array ensured above")
                };
                while items.len() <= *index {
                    items.push(Value::Null);
                }
                if last {
                    items[*index] = new;
                    return;
                }
                current = &mut items[*index];
            }
        }
    }
}

/// Emptiness as the required rule sees it: absent, `null`, or `""`.
pub(crate) fn is_empty(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(text) => text.is_empty(),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn path(raw: &str) -> FieldPath {
        FieldPath::parse(raw).expect("test path")
    }

    #[test]
    fn set_creates_intermediate_containers() {
        let mut root = Value::Null;
        set(&mut root, &path("social.twitter"), json!("@batman"));
        set(&mut root, &path("ph_numbers.1.number"), json!("555"));
        assert_eq!(
            root,
            json!({
                "social": { "twitter": "@batman" },
                "ph_numbers": [null, { "number": "555" }],
            })
        );
    }

    #[test]
    fn set_replaces_existing_leaf() {
        let mut root = json!({ "username": "Batman" });
        set(&mut root, &path("username"), json!("Robin"));
        assert_eq!(get(&root, &path("username")), Some(&json!("Robin")));
    }

    #[test]
    fn get_misses_are_none() {
        let root = json!({ "social": { "twitter": "" } });
        assert_eq!(get(&root, &path("social.facebook")), None);
        assert_eq!(get(&root, &path("ph_numbers.0")), None);
    }

    #[test]
    fn emptiness() {
        assert!(is_empty(&Value::Null));
        assert!(is_empty(&json!("")));
        assert!(!is_empty(&json!(0)));
        assert!(!is_empty(&json!("x")));
        assert!(!is_empty(&json!([])));
    }
}
