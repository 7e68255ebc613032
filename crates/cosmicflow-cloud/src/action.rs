//! Operation results handed back to the host runtime

use crate::error::CloudError;
use serde::{Deserialize, Serialize};

/// Lifecycle operation requested by the host
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionType {
    Create,
    Read,
    Update,
    Delete,
}

impl std::fmt::Display for ActionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ActionType::Create => write!(f, "create"),
            ActionType::Read => write!(f, "read"),
            ActionType::Update => write!(f, "update"),
            ActionType::Delete => write!(f, "delete"),
        }
    }
}

/// Result of applying one lifecycle operation
///
/// A failed operation may still carry state: whatever was created before the
/// failure has to be persisted by the host, or it leaks. `state == None`
/// means the resource does not exist (anymore).
#[derive(Debug)]
pub struct ApplyResult<S> {
    pub state: Option<S>,
    pub error: Option<CloudError>,
}

impl<S> ApplyResult<S> {
    pub fn ok(state: S) -> Self {
        Self {
            state: Some(state),
            error: None,
        }
    }

    /// The resource is gone, without error
    pub fn gone() -> Self {
        Self {
            state: None,
            error: None,
        }
    }

    /// Nothing to persist beyond what the host already has
    pub fn failed(error: impl Into<CloudError>) -> Self {
        Self {
            state: None,
            error: Some(error.into()),
        }
    }

    /// State to persist together with the error that interrupted the operation
    pub fn partial(state: S, error: impl Into<CloudError>) -> Self {
        Self {
            state: Some(state),
            error: Some(error.into()),
        }
    }

    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }

    /// Convert the state, keeping the error
    pub fn map<T>(self, f: impl FnOnce(S) -> T) -> ApplyResult<T> {
        ApplyResult {
            state: self.state.map(f),
            error: self.error,
        }
    }

    /// Collapse into a plain result, dropping partial state on error
    pub fn into_result(self) -> crate::error::Result<Option<S>> {
        match self.error {
            Some(e) => Err(e),
            None => Ok(self.state),
        }
    }
}

impl<S> From<crate::error::Result<S>> for ApplyResult<S> {
    fn from(result: crate::error::Result<S>) -> Self {
        match result {
            Ok(state) => Self::ok(state),
            Err(e) => Self::failed(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::BatchError;

    #[test]
    fn test_partial_keeps_state() {
        let mut errors = BatchError::new();
        errors.push("tcp 22", CloudError::Timeout("x".into()));

        let result = ApplyResult::partial(vec!["1", "3"], errors);
        assert!(!result.is_success());
        assert_eq!(result.state.as_deref(), Some(&["1", "3"][..]));

        let mapped = result.map(|ids| ids.len());
        assert_eq!(mapped.state, Some(2));
        assert!(mapped.into_result().is_err());
    }

    #[test]
    fn test_from_result() {
        let ok: ApplyResult<u8> = Ok(1).into();
        assert!(ok.is_success());
        assert_eq!(ok.into_result().unwrap(), Some(1));

        let gone: ApplyResult<u8> = ApplyResult::gone();
        assert!(gone.is_success());
        assert!(gone.state.is_none());

        let failed: ApplyResult<u8> = Err(CloudError::validation("bad")).into();
        assert!(failed.state.is_none());
        assert!(failed.error.unwrap().is_validation());
    }

    #[test]
    fn test_action_type_display() {
        assert_eq!(ActionType::Delete.to_string(), "delete");
        assert_eq!(
            serde_json::to_string(&ActionType::Create).unwrap(),
            "\"create\""
        );
    }
}
