//! Core traits for records and their identifiers.
//!
//! A store holds records of one uniform type. The base store places no requirement on that
//! type beyond `Clone + Send + Sync`; the identity-addressed store additionally requires
//! [`Identifiable`]. Field-based construction and partial updates go through the JSON field
//! view provided by [`RecordExt`].

use serde::{Serialize, de::DeserializeOwned};
use serde_json::{Map, Value, from_value, to_value};
use std::{fmt::{Debug, Display}, hash::Hash};
use uuid::Uuid;

use crate::error::{PersistenceError, PersistenceResult};

/// A loosely-typed mapping from field names to values.
///
/// Used to construct records from field data and to describe sparse partial updates.
pub type FieldMap = Map<String, Value>;

/// The field name that carries a record's identifier in its field view.
pub const ID_FIELD: &str = "id";

/// Identifier types usable as the unique key of an [`Identifiable`] record.
///
/// # Example
///
/// ```ignore
/// use recordlayer_core::record::Identifier;
///
/// let id = String::generate();
/// assert_eq!(id.len(), 32);
/// assert!(!id.is_blank());
/// ```
pub trait Identifier: Clone + Eq + Hash + Debug + Display + Send + Sync + 'static {
    /// Generates a fresh identifier with negligible collision probability.
    fn generate() -> Self;

    /// Returns `true` if this value does not identify anything and must be replaced
    /// before the record is stored.
    fn is_blank(&self) -> bool {
        false
    }
}

impl Identifier for String {
    fn generate() -> Self {
        Uuid::new_v4().simple().to_string()
    }

    fn is_blank(&self) -> bool {
        self.trim().is_empty()
    }
}

impl Identifier for Uuid {
    fn generate() -> Self {
        Uuid::new_v4()
    }

    fn is_blank(&self) -> bool {
        self.is_nil()
    }
}

/// Records that carry a unique, comparable identifier.
///
/// The identifier is optional on the type so that records can be created without one;
/// the identity-addressed store assigns a generated id before insertion.
///
/// # Example
///
/// ```ignore
/// use recordlayer_core::record::Identifiable;
/// use serde::{Serialize, Deserialize};
///
/// #[derive(Debug, Clone, Serialize, Deserialize)]
/// pub struct Dummy {
///     pub id: Option<String>,
///     pub key: String,
///     pub content: String,
/// }
///
/// impl Identifiable for Dummy {
///     type Id = String;
///
///     fn id(&self) -> Option<&String> {
///         self.id.as_ref()
///     }
///
///     fn set_id(&mut self, id: String) {
///         self.id = Some(id);
///     }
/// }
/// ```
pub trait Identifiable {
    /// The identifier type.
    type Id: Identifier;

    /// Returns the record's identifier, if it has one.
    fn id(&self) -> Option<&Self::Id>;

    /// Assigns the record's identifier.
    fn set_id(&mut self, id: Self::Id);

    /// Returns `true` if the record carries the given identifier.
    fn has_id(&self, id: &Self::Id) -> bool {
        self.id() == Some(id)
    }
}

/// Field-view conversions available for every serializable record type.
///
/// This is the explicit constructor from loosely-typed field data: the store never guesses
/// structure, it deserializes the field map into the record type and reports a
/// [`PersistenceError::Serialization`] when the shape does not fit.
pub trait RecordExt: Sized {
    /// Converts this record into its field map.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails or the record does not serialize to an object.
    fn to_fields(&self) -> PersistenceResult<FieldMap>;

    /// Builds a record from a field map.
    ///
    /// # Errors
    ///
    /// Returns an error if the fields cannot be deserialized into the record type.
    fn from_fields(fields: FieldMap) -> PersistenceResult<Self>;

    /// Returns a copy of this record with the given fields overlaid.
    ///
    /// Fields absent from `fields` keep their current values. The [`ID_FIELD`] entry is
    /// never overwritten.
    ///
    /// # Errors
    ///
    /// Returns an error if the merged fields no longer form a valid record.
    fn merge_fields(&self, fields: &FieldMap) -> PersistenceResult<Self>;
}

impl<R> RecordExt for R
where
    R: Serialize + DeserializeOwned,
{
    fn to_fields(&self) -> PersistenceResult<FieldMap> {
        match to_value(self)? {
            Value::Object(map) => Ok(map),
            other => Err(PersistenceError::InvalidRecord(format!(
                "expected record to serialize to an object, got {other}"
            ))),
        }
    }

    fn from_fields(fields: FieldMap) -> PersistenceResult<Self> {
        Ok(from_value(Value::Object(fields))?)
    }

    fn merge_fields(&self, fields: &FieldMap) -> PersistenceResult<Self> {
        let mut merged = self.to_fields()?;

        for (name, value) in fields {
            if name == ID_FIELD {
                continue;
            }
            merged.insert(name.clone(), value.clone());
        }

        Self::from_fields(merged)
    }
}
