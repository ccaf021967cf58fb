use crate::error::StoreError;
use crate::value::{Record, Value};
use std::sync::Arc;

/// Name of the discriminator field every action record carries.
pub const TYPE_FIELD: &str = "type";

/// A validated action: a record with a string `type` field.
///
/// Actions are built directly with [`Action::new`], or checked out of an
/// arbitrary [`Value`] with `Action::try_from(&value)` at the dispatch
/// boundary.
///
/// ```
/// use tincan_dispatch::{Action, Value};
///
/// let action = Action::new("ADD").with("amount", 2);
/// assert_eq!(action.kind(), "ADD");
/// assert_eq!(action.get("amount"), Some(&Value::from(2)));
/// ```
#[derive(Clone, Debug, PartialEq)]
pub struct Action {
    kind: Arc<str>,
    fields: Arc<Record>,
}

impl Action {
    /// Create an action with the given discriminator and no other fields.
    pub fn new(kind: impl Into<String>) -> Self {
        let kind: String = kind.into();
        let mut fields = Record::new();
        fields.insert(TYPE_FIELD.to_string(), Value::from(kind.as_str()));
        Self {
            kind: Arc::from(kind),
            fields: Arc::new(fields),
        }
    }

    /// Add or replace a payload field. Setting `type` is ignored.
    pub fn with(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        let field = field.into();
        if field != TYPE_FIELD {
            Arc::make_mut(&mut self.fields).insert(field, value.into());
        }
        self
    }

    /// The discriminator reducers are keyed by.
    pub fn kind(&self) -> &str {
        &self.kind
    }

    /// Look up a field, including `type`.
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.fields.get(field)
    }

    pub fn fields(&self) -> &Record {
        &self.fields
    }
}

impl TryFrom<&Value> for Action {
    type Error = StoreError;

    fn try_from(value: &Value) -> Result<Self, Self::Error> {
        let Value::Record(fields) = value else {
            return Err(StoreError::InvalidActionShape {
                found: value.kind_name(),
            });
        };
        let kind = fields
            .get(TYPE_FIELD)
            .and_then(Value::as_str)
            .ok_or(StoreError::MissingDiscriminator)?;

        Ok(Self {
            kind: Arc::from(kind),
            fields: Arc::clone(fields),
        })
    }
}

impl From<Action> for Value {
    fn from(action: Action) -> Self {
        Value::Record(action.fields)
    }
}
