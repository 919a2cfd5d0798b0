//! Typed wire values.
//!
//! Every value sent over the bus carries an explicit type signature, and
//! every received value must be unwrapped from its tag before application
//! logic touches it. Property maps (`a{sv}` structures) are wrapped and
//! unwrapped entry by entry.

use bson::{Bson, Document};
use serde::{Deserialize, Serialize};

/// A value tagged with its wire type signature.
/// Serializes into the two-field `{ "t": .., "v": .. }` document
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Variant {
    /// Wire type signature
    #[serde(rename = "t")]
    pub signature: String,
    /// Payload
    #[serde(rename = "v")]
    pub value: Bson,
}

impl Variant {
    pub fn new(signature: &str, value: impl Into<Bson>) -> Self {
        Self {
            signature: signature.to_owned(),
            value: value.into(),
        }
    }
}

/// Shorthand constructor for an explicitly typed value
pub fn variant(signature: &str, value: impl Into<Bson>) -> Variant {
    Variant::new(signature, value)
}

/// Tag a value with its inferred wire signature
pub fn encode(value: Bson) -> crate::Result<Variant> {
    let signature = infer_signature(&value)?;
    Ok(Variant::new(signature, value))
}

/// Unwrap a typed value for use by application logic
pub fn decode(variant: Variant) -> Bson {
    variant.value
}

/// Strip the type tag from every entry of a property map.
/// Every entry must be a variant document
pub fn decode_map(map: &Document) -> crate::Result<Document> {
    let mut result = Document::new();

    for (key, value) in map {
        let variant: Variant = bson::from_bson(value.clone())
            .map_err(|e| crate::Error::ResultType(format!("`{key}` is not a variant: {e}")))?;

        result.insert(key.clone(), variant.value);
    }

    Ok(result)
}

/// Wrap every entry of a map into a variant, inferring a wire signature
/// per value. Entries whose value is [Bson::Null] mark absence and are
/// omitted entirely
pub fn encode_map(map: Document) -> crate::Result<Document> {
    let mut result = Document::new();

    for (key, value) in map {
        if matches!(value, Bson::Null) {
            continue;
        }

        let variant = encode(value)?;
        result.insert(
            key,
            bson::to_bson(&variant).map_err(|e| crate::Error::ParamsType(e.to_string()))?,
        );
    }

    Ok(result)
}

/// Fixed, total match over the closed set of local value shapes.
/// An unmatched shape is a programming error
fn infer_signature(value: &Bson) -> crate::Result<&'static str> {
    match value {
        Bson::Boolean(_) => Ok("b"),
        Bson::String(_) => Ok("s"),
        Bson::Array(_) => Ok("as"),
        Bson::Document(doc) => {
            // A dictionary whose values are lists of lists gets its
            // specialized signature. Everything else is a variant dictionary
            let nested_lists = doc.iter().next().is_some_and(|(_, value)| {
                matches!(value, Bson::Array(items) if matches!(items.first(), Some(Bson::Array(_))))
            });

            if nested_lists {
                Ok("a{saas}")
            } else {
                Ok("a{sv}")
            }
        }
        other => Err(crate::Error::Signature(other.to_string())),
    }
}
