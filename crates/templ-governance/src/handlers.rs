// crates/templ-governance/src/handlers.rs
//
// Registry of named handlers for `Action::Custom` payloads.
//
// Two handlers ship with the ledger:
//   - `action`: the payload is a serialized built-in `Action`, which runs as
//     if it had been proposed directly. Nested custom actions are rejected.
//   - `notice`: the payload is `{"message": "..."}` and executing it emits an
//     announcement record for notification layers.
// Additional handlers can be registered by embedders, but every handler
// resolves to one of these two shapes, so execution stays a closed set.

use std::collections::BTreeMap;

use serde::Deserialize;

use templ_core::error::ValidationError;

use crate::action::{check_len, Action};

/// Maximum notice message length, in characters.
pub const MAX_NOTICE_LEN: usize = 1_024;

/// What a custom payload resolves to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// Run this built-in action.
    Action(Action),
    /// Emit an announcement.
    Notice { message: String },
}

/// Trait for named custom-payload handlers.
pub trait CustomHandler: Send + Sync {
    /// Registry key.
    fn name(&self) -> &'static str;

    /// Decode and validate `payload`.
    fn resolve(&self, payload: &str) -> Result<Resolution, ValidationError>;
}

fn decode<'a, T: Deserialize<'a>>(payload: &'a str) -> Result<T, ValidationError> {
    serde_json::from_str(payload).map_err(|e| ValidationError::InvalidCallData(e.to_string()))
}

/// Wraps one serialized built-in action.
#[derive(Debug, Clone, Copy, Default)]
pub struct ActionHandler;

impl CustomHandler for ActionHandler {
    fn name(&self) -> &'static str {
        "action"
    }

    fn resolve(&self, payload: &str) -> Result<Resolution, ValidationError> {
        let action: Action = decode(payload)?;
        if matches!(action, Action::Custom { .. }) {
            return Err(ValidationError::InvalidCallData(
                "custom actions cannot be nested".into(),
            ));
        }
        action.validate()?;
        Ok(Resolution::Action(action))
    }
}

#[derive(Deserialize)]
struct NoticePayload {
    message: String,
}

/// Emits an announcement record.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoticeHandler;

impl CustomHandler for NoticeHandler {
    fn name(&self) -> &'static str {
        "notice"
    }

    fn resolve(&self, payload: &str) -> Result<Resolution, ValidationError> {
        let notice: NoticePayload = decode(payload)?;
        if notice.message.trim().is_empty() {
            return Err(ValidationError::InvalidCallData(
                "notice message is empty".into(),
            ));
        }
        check_len("message", &notice.message, MAX_NOTICE_LEN)?;
        Ok(Resolution::Notice {
            message: notice.message,
        })
    }
}

/// Named custom handlers.
pub struct HandlerRegistry {
    handlers: BTreeMap<&'static str, Box<dyn CustomHandler>>,
}

impl HandlerRegistry {
    /// A registry with no handlers at all.
    pub fn empty() -> Self {
        Self {
            handlers: BTreeMap::new(),
        }
    }

    /// A registry with the `action` and `notice` handlers.
    pub fn with_builtin() -> Self {
        let mut registry = Self::empty();
        registry.register(Box::new(ActionHandler));
        registry.register(Box::new(NoticeHandler));
        registry
    }

    /// Register a handler, replacing any handler with the same name.
    pub fn register(&mut self, handler: Box<dyn CustomHandler>) {
        self.handlers.insert(handler.name(), handler);
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.handlers.keys().copied().collect()
    }

    /// Resolve `payload` through the handler called `name`.
    ///
    /// # Errors
    /// `ValidationError::UnknownHandler` if no such handler is registered,
    /// otherwise whatever the handler rejects the payload with.
    pub fn resolve(&self, name: &str, payload: &str) -> Result<Resolution, ValidationError> {
        let handler = self
            .handlers
            .get(name)
            .ok_or_else(|| ValidationError::UnknownHandler(name.to_string()))?;
        handler.resolve(payload)
    }
}

impl Default for HandlerRegistry {
    fn default() -> Self {
        Self::with_builtin()
    }
}

impl std::fmt::Debug for HandlerRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HandlerRegistry")
            .field("handlers", &self.names())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use templ_core::address::Address;

    #[test]
    fn test_action_handler_wraps_builtin() {
        let registry = HandlerRegistry::with_builtin();
        let inner = serde_json::to_string(&Action::SetJoinPaused { paused: true }).unwrap();
        assert_eq!(
            registry.resolve("action", &inner).unwrap(),
            Resolution::Action(Action::SetJoinPaused { paused: true })
        );
    }

    #[test]
    fn test_action_handler_rejects_nesting() {
        let registry = HandlerRegistry::with_builtin();
        let nested = serde_json::to_string(&Action::Custom {
            handler: "notice".into(),
            payload: r#"{"message":"hi"}"#.into(),
        })
        .unwrap();
        assert!(matches!(
            registry.resolve("action", &nested),
            Err(ValidationError::InvalidCallData(_))
        ));
    }

    #[test]
    fn test_action_handler_validates_inner() {
        let registry = HandlerRegistry::with_builtin();
        let inner = serde_json::to_string(&Action::SetBurnAddress {
            address: Address::ZERO,
        })
        .unwrap();
        assert_eq!(
            registry.resolve("action", &inner),
            Err(ValidationError::InvalidRecipient)
        );
    }

    #[test]
    fn test_notice_handler() {
        let registry = HandlerRegistry::with_builtin();
        assert_eq!(
            registry
                .resolve("notice", r#"{"message":"town hall friday"}"#)
                .unwrap(),
            Resolution::Notice {
                message: "town hall friday".into()
            }
        );
        let long = format!(r#"{{"message":"{}"}}"#, "a".repeat(MAX_NOTICE_LEN + 1));
        assert!(matches!(
            registry.resolve("notice", &long),
            Err(ValidationError::TextTooLong { .. })
        ));
        assert!(registry.resolve("notice", "not json").is_err());
    }

    #[test]
    fn test_unknown_handler() {
        let registry = HandlerRegistry::with_builtin();
        assert_eq!(
            registry.resolve("mint", "{}"),
            Err(ValidationError::UnknownHandler("mint".into()))
        );
        assert_eq!(registry.names(), vec!["action", "notice"]);
    }
}
