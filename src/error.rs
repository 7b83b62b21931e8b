use crate::value::Value;

use std::path::PathBuf;

use thiserror::Error;

/// Failures produced by the promise machinery itself.
///
/// These surface as rejection reasons (wrapped in [`Value::Error`]), never as
/// panics: every failure is captured at the boundary where it occurs and
/// turned into a rejection of the nearest promise in scope.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PromiseError {
    /// A promise was fulfilled with itself.
    #[error("a promise cannot be resolved with itself")]
    SelfResolution,

    /// Every input to [`Promise::any`](crate::Promise::any) rejected.
    ///
    /// Carries the individual rejection reasons in input order.
    #[error("all promises were rejected")]
    AllRejected(Vec<Value>),
}

/// Failures produced while building a module graph or emitting a bundle.
#[derive(Debug, Error)]
pub enum BundleError {
    /// A module file could not be read, or the bundle could not be written.
    #[error("failed to access module `{}`", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The transformer could not make sense of a module's source text.
    #[error("failed to parse module `{}`: {}", .path.display(), .message)]
    Parse { path: PathBuf, message: String },

    /// A module's mapping table could not be serialized into the loader.
    #[error("failed to render bundle")]
    Render(#[from] serde_json::Error),
}
