//! Observable record fields.
//!
//! Reactive field abstraction using `tokio::sync::watch` for multi-subscriber
//! change notifications, in the style of EPICS process variables: each field
//! has a short record-style name ("VAL", "RVAL", ...), optional engineering
//! units, a current value, and any number of subscribers (operator screens,
//! scan engines, loggers).
//!
//! Fields are *views*: the authoritative state lives in the owning record,
//! and only the record publishes new values. Client writes go through the
//! record's write methods, which validate and propagate before publishing.
//!
//! # Example
//!
//! ```rust,ignore
//! let position = Field::new("VAL", 0.0).with_unit("mm");
//!
//! let mut rx = position.subscribe();
//! tokio::spawn(async move {
//!     while rx.changed().await.is_ok() {
//!         println!("position is now {}", *rx.borrow());
//!     }
//! });
//! ```

use std::fmt::Debug;

use serde::{Deserialize, Serialize};
use tokio::sync::watch;

/// Metadata describing a record field.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FieldMetadata {
    /// Record-style field name (e.g. "VAL", "MRES").
    pub name: String,
    /// Engineering units, if any (e.g. "steps", "steps/s").
    pub unit: Option<String>,
}

/// A typed, observable field value with change notification.
///
/// Wraps a `tokio::sync::watch` channel: `get()` reads the current value,
/// `subscribe()` returns a receiver that wakes on every change. Publishing is
/// crate-internal; the owning record is the only writer.
pub struct Field<T> {
    sender: watch::Sender<T>,
    metadata: FieldMetadata,
}

impl<T: Debug> Debug for Field<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Field")
            .field("metadata", &self.metadata)
            .field("value", &*self.sender.borrow())
            .finish()
    }
}

impl<T> Field<T>
where
    T: Clone + PartialEq + Send + Sync + 'static,
{
    /// Create a new field with an initial value.
    pub fn new(name: impl Into<String>, initial: T) -> Self {
        let (sender, _) = watch::channel(initial);
        Self {
            sender,
            metadata: FieldMetadata {
                name: name.into(),
                unit: None,
            },
        }
    }

    /// Attach engineering units to this field.
    pub fn with_unit(mut self, unit: impl Into<String>) -> Self {
        self.metadata.unit = Some(unit.into());
        self
    }

    /// Get the current value (clone).
    pub fn get(&self) -> T {
        self.sender.borrow().clone()
    }

    /// Get the field name.
    pub fn name(&self) -> &str {
        &self.metadata.name
    }

    /// Get the field metadata.
    pub fn metadata(&self) -> &FieldMetadata {
        &self.metadata
    }

    /// Subscribe to value changes.
    ///
    /// The receiver wakes once per published change; equal values are
    /// coalesced and do not wake subscribers.
    pub fn subscribe(&self) -> watch::Receiver<T> {
        self.sender.subscribe()
    }

    /// Number of active subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }

    /// Publish a new value, notifying subscribers if it changed.
    ///
    /// Only the owning record may publish; fields hold no authoritative
    /// state of their own.
    pub(crate) fn publish(&self, value: T) {
        self.sender.send_if_modified(|current| {
            if *current == value {
                false
            } else {
                *current = value;
                true
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_basic() {
        let field = Field::new("VAL", 1.5);
        assert_eq!(field.get(), 1.5);
        assert_eq!(field.name(), "VAL");

        field.publish(2.5);
        assert_eq!(field.get(), 2.5);
    }

    #[test]
    fn test_field_metadata() {
        let field = Field::new("VELO", 10.0).with_unit("steps/s");
        assert_eq!(field.metadata().unit.as_deref(), Some("steps/s"));
    }

    #[tokio::test]
    async fn test_field_subscription() {
        let field = Field::new("RVAL", 0.0);
        let mut rx = field.subscribe();

        assert_eq!(*rx.borrow(), 0.0);

        field.publish(42.0);
        rx.changed().await.unwrap();
        assert_eq!(*rx.borrow(), 42.0);
    }

    #[tokio::test]
    async fn test_field_equal_publish_does_not_notify() {
        let field = Field::new("DMOV", true);
        let mut rx = field.subscribe();

        field.publish(true);
        assert!(!rx.has_changed().unwrap());

        field.publish(false);
        assert!(rx.has_changed().unwrap());
    }
}
