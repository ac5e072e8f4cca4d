/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 19/10/26
******************************************************************************/

//! Explicit message kind to type code registry.
//!
//! The protocol schema supplies the mapping; the bridge looks codes up by
//! [`CoordinatorMessage::KIND`].

use coordlink_core::error::RequestError;
use coordlink_core::message::CoordinatorMessage;
use coordlink_core::types::TypeCode;
use std::collections::HashMap;

/// Maps message kinds to type codes.
#[derive(Debug, Clone, Default)]
pub struct KindRegistry {
    codes: HashMap<&'static str, TypeCode>,
}

impl KindRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `M` under `code`.
    #[must_use]
    pub fn with<M: CoordinatorMessage>(mut self, code: TypeCode) -> Self {
        self.register(M::KIND, code);
        self
    }

    /// Registers `kind` under `code`, replacing any earlier code.
    pub fn register(&mut self, kind: &'static str, code: TypeCode) {
        self.codes.insert(kind, code);
    }

    /// Looks up the code for `kind`.
    ///
    /// # Errors
    /// Returns `RequestError::UnknownKind` if `kind` is not registered.
    pub fn type_code(&self, kind: &'static str) -> Result<TypeCode, RequestError> {
        self.codes
            .get(kind)
            .copied()
            .ok_or(RequestError::UnknownKind(kind))
    }

    /// Looks up the code for `M`.
    ///
    /// # Errors
    /// Returns `RequestError::UnknownKind` if `M` is not registered.
    pub fn type_code_of<M: CoordinatorMessage>(&self) -> Result<TypeCode, RequestError> {
        self.type_code(M::KIND)
    }

    /// Returns the number of registered kinds.
    #[must_use]
    pub fn len(&self) -> usize {
        self.codes.len()
    }

    /// Returns true if nothing is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.codes.is_empty()
    }
}
