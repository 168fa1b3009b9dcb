//! Object-to-query-map encoding.
//!
//! [`QueryMapEncoder`] flattens a struct-like value into a map of field name
//! to rendered value, the shape the request templating step consumes. Field
//! enumeration goes through serde: an encodable type exposes its stable
//! field-name/value mapping via `Serialize`, and the encoder caches the field
//! list per concrete type so repeated calls skip the enumeration work.

use std::any::TypeId;
use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, RwLock};

use percent_encoding::{utf8_percent_encode, AsciiSet, CONTROLS};
use serde::Serialize;
use serde_json::Value;

use crate::error::{Error, Result};

/// Characters escaped in query-string components: controls, space, and the
/// delimiters that carry structure inside a URL query.
const QUERY_ESCAPE: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'&')
    .add(b'+')
    .add(b'<')
    .add(b'=')
    .add(b'>')
    .add(b'?')
    .add(b'`')
    .add(b'{')
    .add(b'}');

/// Percent-encodes one query name or value. This is the single place query
/// content is escaped; request builders call it exactly once per parameter.
pub fn encode_component(raw: &str) -> String {
    utf8_percent_encode(raw, QUERY_ESCAPE).to_string()
}

/// The encodable fields of one concrete type, in declaration order.
/// Immutable once computed; lives for the process lifetime in the encoder's
/// cache.
#[derive(Debug)]
pub struct TypeMetadata {
    fields: Vec<String>,
}

impl TypeMetadata {
    fn parse<T: Serialize>(object: &T) -> Result<Self> {
        let value = serde_json::to_value(object).map_err(|e| Error::Encoding(e.to_string()))?;
        match value {
            Value::Object(map) => Ok(Self {
                fields: map.keys().cloned().collect(),
            }),
            other => Err(Error::Encoding(format!(
                "expected a struct-like object, got {}",
                value_kind(&other)
            ))),
        }
    }

    pub fn fields(&self) -> &[String] {
        &self.fields
    }
}

/// Encodes objects into query parameter maps, caching per-type field lists.
///
/// The cache is keyed by `TypeId` and shared across concurrent callers.
/// Racing first uses of one type may both compute the field list; the first
/// insert wins and both computations agree, so the duplicate work is
/// harmless. Entries are never evicted: the set of parameter types in a
/// program is small and fixed.
#[derive(Debug, Default)]
pub struct QueryMapEncoder {
    metadata: RwLock<HashMap<TypeId, Arc<TypeMetadata>>>,
}

impl QueryMapEncoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Flattens `object` into field-name/value pairs.
    ///
    /// A field appears in the result iff its value is non-null. Scalars keep
    /// their string form, arrays join with commas, nested objects render as
    /// compact JSON. Pure once the type's metadata is cached: the same object
    /// state always produces the same map.
    pub fn encode<T>(&self, object: &T) -> Result<BTreeMap<String, String>>
    where
        T: Serialize + 'static,
    {
        let metadata = self.metadata_for(object)?;
        let value = serde_json::to_value(object).map_err(|e| Error::Encoding(e.to_string()))?;
        let map = match value {
            Value::Object(map) => map,
            other => {
                return Err(Error::Encoding(format!(
                    "expected a struct-like object, got {}",
                    value_kind(&other)
                )))
            }
        };

        let mut encoded = BTreeMap::new();
        for field in metadata.fields() {
            match map.get(field) {
                None | Some(Value::Null) => {}
                Some(value) => {
                    encoded.insert(field.clone(), render(value));
                }
            }
        }
        Ok(encoded)
    }

    /// Number of types with cached metadata.
    pub fn cached_types(&self) -> usize {
        self.metadata.read().unwrap().len()
    }

    fn metadata_for<T>(&self, object: &T) -> Result<Arc<TypeMetadata>>
    where
        T: Serialize + 'static,
    {
        let type_id = TypeId::of::<T>();
        if let Some(metadata) = self.metadata.read().unwrap().get(&type_id) {
            return Ok(metadata.clone());
        }

        let parsed = Arc::new(TypeMetadata::parse(object)?);
        let mut cache = self.metadata.write().unwrap();
        Ok(cache.entry(type_id).or_insert(parsed).clone())
    }
}

fn render(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::Array(items) => items
            .iter()
            .map(render)
            .collect::<Vec<_>>()
            .join(","),
        other => other.to_string(),
    }
}

fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::thread;

    #[derive(Serialize)]
    struct SearchParams {
        name: Option<String>,
        page: u32,
        tags: Vec<String>,
        archived: Option<bool>,
    }

    #[test]
    fn test_encode_includes_only_non_null_fields() {
        let encoder = QueryMapEncoder::new();
        let params = SearchParams {
            name: Some("denominator".to_string()),
            page: 3,
            tags: vec!["a".to_string(), "b".to_string()],
            archived: None,
        };

        let map = encoder.encode(&params).unwrap();
        assert_eq!(map.get("name").unwrap(), "denominator");
        assert_eq!(map.get("page").unwrap(), "3");
        assert_eq!(map.get("tags").unwrap(), "a,b");
        assert!(!map.contains_key("archived"));
    }

    #[test]
    fn test_encode_same_state_same_map() {
        let encoder = QueryMapEncoder::new();
        let params = SearchParams {
            name: None,
            page: 1,
            tags: vec![],
            archived: Some(false),
        };
        assert_eq!(
            encoder.encode(&params).unwrap(),
            encoder.encode(&params).unwrap()
        );
    }

    #[test]
    fn test_encode_rejects_non_struct_values() {
        let encoder = QueryMapEncoder::new();
        let result = encoder.encode(&42u32);
        assert!(matches!(result, Err(Error::Encoding(_))));
        // A failed parse must not poison the cache with an entry.
        assert_eq!(encoder.cached_types(), 0);
    }

    #[test]
    fn test_encode_rejects_absent_object() {
        let encoder = QueryMapEncoder::new();
        let result = encoder.encode(&Option::<SearchParams>::None);
        assert!(matches!(result, Err(Error::Encoding(_))));
    }

    /// Counts how many times serde walks the value, so the test can observe
    /// whether metadata was recomputed.
    struct CountingParams {
        serialized: Arc<AtomicUsize>,
    }

    impl Serialize for CountingParams {
        fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
        where
            S: serde::Serializer,
        {
            self.serialized.fetch_add(1, Ordering::SeqCst);
            use serde::ser::SerializeStruct;
            let mut s = serializer.serialize_struct("CountingParams", 1)?;
            s.serialize_field("fixed", "value")?;
            s.end()
        }
    }

    #[test]
    fn test_metadata_computed_once_per_type() {
        let serialized = Arc::new(AtomicUsize::new(0));
        let encoder = QueryMapEncoder::new();

        // First call serializes twice: once for metadata, once to encode.
        let first = CountingParams {
            serialized: serialized.clone(),
        };
        encoder.encode(&first).unwrap();
        assert_eq!(serialized.load(Ordering::SeqCst), 2);
        assert_eq!(encoder.cached_types(), 1);

        // Second call hits the cache: one serialization, no new entry.
        let second = CountingParams {
            serialized: serialized.clone(),
        };
        encoder.encode(&second).unwrap();
        assert_eq!(serialized.load(Ordering::SeqCst), 3);
        assert_eq!(encoder.cached_types(), 1);
    }

    #[test]
    fn test_distinct_types_get_distinct_entries() {
        #[derive(Serialize)]
        struct A {
            x: u32,
        }
        #[derive(Serialize)]
        struct B {
            y: u32,
        }

        let encoder = QueryMapEncoder::new();
        encoder.encode(&A { x: 1 }).unwrap();
        encoder.encode(&B { y: 2 }).unwrap();
        assert_eq!(encoder.cached_types(), 2);
    }

    #[test]
    fn test_concurrent_first_use_leaves_one_entry() {
        let encoder = Arc::new(QueryMapEncoder::new());
        let mut handles = vec![];

        for i in 0..8 {
            let encoder = encoder.clone();
            handles.push(thread::spawn(move || {
                let params = SearchParams {
                    name: Some(format!("caller-{}", i)),
                    page: i,
                    tags: vec![],
                    archived: None,
                };
                let map = encoder.encode(&params).unwrap();
                assert_eq!(map.get("name").unwrap(), &format!("caller-{}", i));
            }));
        }

        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(encoder.cached_types(), 1);
    }

    #[test]
    fn test_encode_component_escapes_space_and_delimiters() {
        assert_eq!(
            encode_component("some string with space"),
            "some%20string%20with%20space"
        );
        assert_eq!(encode_component("a&b=c"), "a%26b%3Dc");
        assert_eq!(encode_component("plain-value_1.2"), "plain-value_1.2");
    }
}
