use serde_json::Value;

use crate::Result;

/// Supplies full `houses` documents, e.g. by polling the Nexia mobile API.
///
/// Transport, authentication and retries belong to the implementor; the home
/// only consumes the parsed document.
pub trait SnapshotSource {
    fn fetch_snapshot(&mut self) -> Result<Value>;
}

impl<F> SnapshotSource for F
where
    F: FnMut() -> Result<Value>,
{
    fn fetch_snapshot(&mut self) -> Result<Value> {
        self()
    }
}
