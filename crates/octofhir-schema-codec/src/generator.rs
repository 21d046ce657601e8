//! Memoized codec generation

use crate::{Codec, CodecFn, CodecOptions, Direction, ValidationContext, object, scalar};
use octofhir_schema_diagnostics::{Result, SCH0400, SchemaError};
use octofhir_schema_types::{DataType, TypeDocument, TypeLink};
use parking_lot::RwLock;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::{Arc, Weak};

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct CodecKey {
    document: String,
    name: String,
    direction: Direction,
    signature: String,
}

struct GeneratorInner {
    document: Arc<TypeDocument>,
    cache: RwLock<HashMap<CodecKey, Codec>>,
}

/// Generates and caches codecs for the types of one document
///
/// Cloning is cheap and clones share the cache. Codecs only hold a weak
/// handle back to the generator, resolving field codecs on first use, so
/// self-referencing types terminate. A codec keeps working after its
/// generator is dropped; it then resolves field codecs without the cache.
#[derive(Clone)]
pub struct CodecGenerator {
    inner: Arc<GeneratorInner>,
}

impl CodecGenerator {
    pub fn new(document: Arc<TypeDocument>) -> Self {
        Self {
            inner: Arc::new(GeneratorInner {
                document,
                cache: RwLock::new(HashMap::new()),
            }),
        }
    }

    pub fn document(&self) -> &Arc<TypeDocument> {
        &self.inner.document
    }

    /// Codec for the named type
    pub fn generate(&self, type_name: &str, direction: Direction, options: &CodecOptions) -> Result<Codec> {
        options.validate()?;
        let ty = self
            .inner
            .document
            .get_type(type_name)
            .ok_or_else(|| SchemaError::unresolved(type_name, self.inner.document.id()))?;
        Ok(self.codec_for(ty, direction, options))
    }

    pub fn decode(&self, type_name: &str, input: &Value, options: &CodecOptions) -> Result<Value> {
        Ok(self.generate(type_name, Direction::Decode, options)?.apply(input)?)
    }

    pub fn encode(&self, type_name: &str, input: &Value, options: &CodecOptions) -> Result<Value> {
        Ok(self.generate(type_name, Direction::Encode, options)?.apply(input)?)
    }

    /// Number of memoized codecs
    pub fn cached(&self) -> usize {
        self.inner.cache.read().len()
    }

    /// Memoized codec for a built type
    pub fn codec_for(&self, ty: &Arc<DataType>, direction: Direction, options: &CodecOptions) -> Codec {
        // scalar codecs ignore options
        let signature = match ty.as_ref() {
            DataType::Simple(_) | DataType::Enum(_) => String::new(),
            _ => options.signature(),
        };
        let key = CodecKey {
            document: ty.info().document.to_lowercase(),
            name: ty.name().to_lowercase(),
            direction,
            signature,
        };
        if let Some(codec) = self.inner.cache.read().get(&key) {
            log::trace!("codec cache hit: {direction} {}", ty.name());
            return codec.clone();
        }
        log::trace!("codec cache miss: {direction} {}", ty.name());

        let codec = self.build(ty, direction, options);
        self.inner.cache.write().entry(key).or_insert(codec).clone()
    }

    pub(crate) fn link_codec(&self, link: &TypeLink, direction: Direction, options: &CodecOptions) -> Codec {
        match self.inner.document.field_type(link) {
            Some(ty) => self.codec_for(ty, direction, options),
            None => broken(&link.name, direction, format!("type {link} is not available")),
        }
    }

    pub(crate) fn downgrade(&self) -> WeakGenerator {
        WeakGenerator {
            inner: Arc::downgrade(&self.inner),
            document: Arc::clone(&self.inner.document),
        }
    }

    fn build(&self, ty: &Arc<DataType>, direction: Direction, options: &CodecOptions) -> Codec {
        match ty.as_ref() {
            DataType::Simple(simple) => scalar::simple_codec(simple, direction),
            DataType::Enum(enumeration) => scalar::enum_codec(enumeration, direction),
            DataType::Complex(_) | DataType::Mapped(_) => object::object_codec(self, ty, direction, options),
            DataType::Union(union) => object::union_codec(self, union, direction, options),
            DataType::Array(array) => object::array_codec(self, array, direction, options),
        }
    }
}

impl std::fmt::Debug for CodecGenerator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CodecGenerator")
            .field("document", &self.inner.document.id())
            .field("cached", &self.cached())
            .finish()
    }
}

/// Generator handle held by generated codecs
#[derive(Clone)]
pub(crate) struct WeakGenerator {
    inner: Weak<GeneratorInner>,
    document: Arc<TypeDocument>,
}

impl WeakGenerator {
    pub(crate) fn link_codec(&self, link: &TypeLink, direction: Direction, options: &CodecOptions) -> Codec {
        let generator = match self.inner.upgrade() {
            Some(inner) => CodecGenerator { inner },
            None => {
                log::trace!("generator dropped, resolving {link} uncached");
                CodecGenerator::new(Arc::clone(&self.document))
            }
        };
        generator.link_codec(link, direction, options)
    }
}

/// Codec that rejects everything with an internal error
fn broken(type_name: &str, direction: Direction, reason: String) -> Codec {
    let func: CodecFn = Arc::new(move |_: &Value, ctx: &mut ValidationContext| {
        ctx.report(SCH0400, reason.clone());
        None
    });
    Codec::new(type_name, direction, func)
}

#[cfg(test)]
mod tests {
    use super::*;
    use octofhir_schema_diagnostics::SCH0201;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn generator() -> CodecGenerator {
        let doc = TypeDocument::from_json(
            r#"{"User": {"fields": {"id": {"type": "integer", "required": true}, "name": "string"}}}"#,
        )
        .unwrap();
        CodecGenerator::new(Arc::new(doc))
    }

    #[test]
    fn test_codecs_are_memoized_per_options() {
        let generator = generator();
        let options = CodecOptions::new();
        let a = generator.generate("User", Direction::Decode, &options).unwrap();
        let b = generator.generate("user", Direction::Decode, &CodecOptions::new()).unwrap();
        assert!(a.ptr_eq(&b));

        let encode = generator.generate("User", Direction::Encode, &options).unwrap();
        let partial = generator.generate("User", Direction::Decode, &CodecOptions::new().partial()).unwrap();
        let omit = generator.generate("User", Direction::Decode, &CodecOptions::new().with_omit(["name"])).unwrap();
        assert!(!a.ptr_eq(&encode));
        assert!(!a.ptr_eq(&partial));
        assert!(!partial.ptr_eq(&omit));
        assert_eq!(generator.cached(), 4);
    }

    #[test]
    fn test_clones_share_cache() {
        let generator = generator();
        let clone = generator.clone();
        generator.generate("User", Direction::Decode, &CodecOptions::new()).unwrap();
        assert_eq!(clone.cached(), 1);
    }

    #[test]
    fn test_unknown_type_and_bad_options() {
        let generator = generator();
        assert!(matches!(
            generator.generate("Nope", Direction::Decode, &CodecOptions::new()),
            Err(SchemaError::UnresolvedReference { .. })
        ));
        assert!(matches!(
            generator.generate("User", Direction::Decode, &CodecOptions::new().with_omit(["a..b"])),
            Err(SchemaError::Syntax(_))
        ));
    }

    #[test]
    fn test_codec_outlives_generator() {
        let codec = generator().generate("User", Direction::Decode, &CodecOptions::new()).unwrap();
        assert_eq!(codec.apply(&json!({"id": "1", "name": "Ann"})).unwrap(), json!({"id": 1, "name": "Ann"}));
        let err = codec.apply(&json!({"name": "Ann"})).unwrap_err();
        assert_eq!(err.issues_at("id").next().map(|i| i.code), Some(SCH0201));
    }

    #[test]
    fn test_recursive_codec_outlives_generator() {
        let doc = TypeDocument::from_json(
            r#"{"Node": {"fields": {"value": "integer", "children": {"type": "Node", "isArray": true}}}}"#,
        )
        .unwrap();
        let codec = CodecGenerator::new(Arc::new(doc))
            .generate("Node", Direction::Decode, &CodecOptions::new())
            .unwrap();
        let input = json!({"value": 1, "children": [{"value": "2", "children": [{"value": 3}]}]});
        assert_eq!(
            codec.apply(&input).unwrap(),
            json!({"value": 1, "children": [{"value": 2, "children": [{"value": 3}]}]})
        );
    }

    fn assert_send_sync<T: Send + Sync + Clone>() {}

    #[test]
    fn test_generator_and_codecs_are_thread_safe() {
        assert_send_sync::<CodecGenerator>();
        assert_send_sync::<Codec>();
    }

    #[test]
    fn test_concurrent_generation_fills_one_cache() {
        let doc = Arc::new(
            TypeDocument::from_json(
                r#"{
                    "Address": {"fields": {"city": {"type": "string", "required": true}}},
                    "User": {"fields": {"id": {"type": "integer", "required": true}, "address": "Address"}}
                }"#,
            )
            .unwrap(),
        );
        let user = json!({"id": "7", "address": {"city": "Oslo"}});
        let address = json!({"city": "Oslo"});

        let sequential = CodecGenerator::new(Arc::clone(&doc));
        let expected_user = sequential.decode("User", &user, &CodecOptions::new()).unwrap();
        let expected_address = sequential.decode("Address", &address, &CodecOptions::new()).unwrap();

        let shared = CodecGenerator::new(doc);
        let results: Vec<(Value, Value)> = std::thread::scope(|scope| {
            let handles: Vec<_> = (0..8)
                .map(|i| {
                    let generator = shared.clone();
                    let (user, address) = (&user, &address);
                    scope.spawn(move || {
                        let options = CodecOptions::new();
                        // alternate order so threads race on both keys
                        if i % 2 == 0 {
                            let u = generator.decode("User", user, &options).unwrap();
                            (u, generator.decode("Address", address, &options).unwrap())
                        } else {
                            let a = generator.decode("Address", address, &options).unwrap();
                            (generator.decode("User", user, &options).unwrap(), a)
                        }
                    })
                })
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });

        for (u, a) in results {
            assert_eq!(u, expected_user);
            assert_eq!(a, expected_address);
        }
        assert_eq!(shared.cached(), sequential.cached());
        let first = shared.generate("User", Direction::Decode, &CodecOptions::new()).unwrap();
        let second = shared.generate("User", Direction::Decode, &CodecOptions::new()).unwrap();
        assert!(first.ptr_eq(&second));
    }
}
