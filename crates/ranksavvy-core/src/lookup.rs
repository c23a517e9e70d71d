/// Outcome of fetching an optional piece of data.
///
/// Separates "there is nothing there" from "asking failed" so callers can
/// keep partial results without swallowing errors silently.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Lookup<T> {
    Found(T),
    Absent,
    Failed(String),
}

impl<T> Lookup<T> {
    /// Fold a fallible optional result into a `Lookup`.
    pub fn from_result<E: std::fmt::Display>(result: Result<Option<T>, E>) -> Self {
        match result {
            Ok(Some(value)) => Lookup::Found(value),
            Ok(None) => Lookup::Absent,
            Err(e) => Lookup::Failed(e.to_string()),
        }
    }

    pub fn found(self) -> Option<T> {
        match self {
            Lookup::Found(value) => Some(value),
            Lookup::Absent | Lookup::Failed(_) => None,
        }
    }

    #[must_use]
    pub fn failure(&self) -> Option<&str> {
        match self {
            Lookup::Failed(reason) => Some(reason),
            Lookup::Found(_) | Lookup::Absent => None,
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Lookup<U> {
        match self {
            Lookup::Found(value) => Lookup::Found(f(value)),
            Lookup::Absent => Lookup::Absent,
            Lookup::Failed(reason) => Lookup::Failed(reason),
        }
    }
}
