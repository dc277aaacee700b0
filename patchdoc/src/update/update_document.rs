use crate::common::{Value, INC_OPERATOR, SET_OPERATOR, UNSET_OPERATOR};
use crate::document::Document;
use crate::errors::{ErrorKind, PatchError, PatchResult};
use crate::update::{UpdatePayload, UpdateSink};
use std::fmt::{Display, Formatter};

/// An update document with `$set`, `$unset` and `$inc` sections.
///
/// A field lives in at most one section. Setting a field that is pending
/// `$unset` (or `$inc`) moves it to `$set`; unsetting moves it to `$unset`.
/// Incrementing a field that is already pending `$set` is rejected, since the
/// two writes would conflict.
///
/// # Examples
///
/// ```rust
/// use patchdoc::update::Update;
///
/// let mut update = Update::new();
/// update.set("name", "Ana").unwrap();
/// update.unset("nickname").unwrap();
/// update.inc("visits", 1).unwrap();
///
/// let doc = update.to_document();
/// assert!(doc.contains_key("$set"));
/// assert!(doc.contains_key("$unset"));
/// assert!(doc.contains_key("$inc"));
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Update {
    set: Document,
    unset: Document,
    inc: Document,
}

impl Update {
    pub fn new() -> Self {
        Update::default()
    }

    /// Builds an update whose `$set` section holds every payload entry, in order.
    pub fn from_payload(payload: &UpdatePayload) -> PatchResult<Self> {
        let mut update = Update::new();
        payload.apply_to(&mut update)?;
        Ok(update)
    }

    pub fn set<T: Into<Value>>(&mut self, field: &str, value: T) -> PatchResult<&mut Self> {
        self.set.put(field, value)?;
        self.unset.remove(field);
        self.inc.remove(field);
        Ok(self)
    }

    pub fn unset(&mut self, field: &str) -> PatchResult<&mut Self> {
        self.unset.put(field, Value::I32(1))?;
        self.set.remove(field);
        self.inc.remove(field);
        Ok(self)
    }

    /// Adds `amount` to `field`.
    ///
    /// # Errors
    ///
    /// [ErrorKind::InvalidOperation] if `amount` is not a number or `field` is
    /// already pending `$set`.
    pub fn inc<T: Into<Value>>(&mut self, field: &str, amount: T) -> PatchResult<&mut Self> {
        let amount = amount.into();
        if !amount.is_number() {
            log::error!("Cannot increment {} by non-numeric value {}", field, amount);
            return Err(PatchError::new(
                &format!("Increment amount for '{}' must be numeric", field),
                ErrorKind::InvalidOperation,
            ));
        }

        if self.set.contains_key(field) {
            log::error!("Field {} is already pending {}", field, SET_OPERATOR);
            return Err(PatchError::new(
                &format!("Field '{}' cannot be both set and incremented", field),
                ErrorKind::InvalidOperation,
            ));
        }

        self.inc.put(field, amount)?;
        self.unset.remove(field);
        Ok(self)
    }

    pub fn is_empty(&self) -> bool {
        self.set.is_empty() && self.unset.is_empty() && self.inc.is_empty()
    }

    /// Returns `true` if any section touches `field`.
    pub fn modifies(&self, field: &str) -> bool {
        self.set.contains_key(field) || self.unset.contains_key(field) || self.inc.contains_key(field)
    }

    pub fn set_fields(&self) -> &Document {
        &self.set
    }

    pub fn unset_fields(&self) -> &Document {
        &self.unset
    }

    pub fn inc_fields(&self) -> &Document {
        &self.inc
    }

    /// Renders the update as a store document. Empty sections are left out.
    pub fn to_document(&self) -> Document {
        let mut doc = Document::with_capacity(3);
        for (operator, section) in [
            (SET_OPERATOR, &self.set),
            (UNSET_OPERATOR, &self.unset),
            (INC_OPERATOR, &self.inc),
        ] {
            if !section.is_empty() {
                // operator names are non-empty constants
                let _ = doc.put(operator, section.clone());
            }
        }
        doc
    }
}

impl UpdateSink for Update {
    fn set(&mut self, name: &str, value: Value) -> PatchResult<()> {
        Update::set(self, name, value).map(|_| ())
    }
}

impl Display for Update {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_document())
    }
}
