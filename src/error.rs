/// Errors surfaced by store operations.
///
/// Every variant is local to the call that produced it: a failed dispatch or
/// write never leaves the store in a half-updated state.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// `dispatch` was called while reducers were running.
    #[error("Reducers can't dispatch actions")]
    ReentrantDispatch,

    /// A middleware invoked its `next` handle after that position was passed.
    #[error("next() called more than once")]
    DoubleNext,

    /// The dispatched value is not a record.
    #[error("Actions must be plain records, got {found}")]
    InvalidActionShape { found: &'static str },

    /// The dispatched record has no string `type` field.
    #[error("Actions must have a string `type` field")]
    MissingDiscriminator,

    /// Listeners were asked to fire for a key outside of the turn-end step.
    #[error("can't emit a change for `{key}` without a pending set")]
    DirectEmission { key: String },

    /// An edit function passed to `update` failed.
    #[error("edit for `{key}` failed: {source}")]
    EditFailure {
        key: String,
        #[source]
        source: anyhow::Error,
    },

    /// A reducer failed while handling an action.
    #[error("reducer for `{kind}` failed: {source}")]
    Reducer {
        kind: String,
        #[source]
        source: anyhow::Error,
    },

    /// A middleware refused the action.
    #[error("action rejected: {reason}")]
    Rejected { reason: String },

    /// The pending write was dropped by `initialize` before its turn ran.
    #[error("pending write discarded by store reset")]
    Discarded,

    /// `settle` hit the configured turn limit with work still queued.
    #[error("store did not settle after {turns} turns")]
    Unsettled { turns: usize },

    /// Configuration could not be parsed.
    #[error("invalid store config: {0}")]
    Config(#[from] toml::de::Error),
}

impl StoreError {
    /// Build a [`StoreError::Rejected`] from anything printable.
    pub fn rejected(reason: impl Into<String>) -> Self {
        Self::Rejected {
            reason: reason.into(),
        }
    }
}

/// Result alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;
