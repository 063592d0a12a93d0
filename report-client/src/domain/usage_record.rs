use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// One usage record as returned by the reporting API.
///
/// The schema belongs to the remote service, so the record is kept as an
/// ordered JSON object and passed through untouched. Key order is the order
/// the service sent.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UsageRecord(pub Map<String, Value>);

impl UsageRecord {
    pub fn fields(&self) -> &Map<String, Value> {
        &self.0
    }

    /// Look up a value by dotted path, e.g. `resource.id`.
    pub fn get_path(&self, path: &str) -> Option<&Value> {
        let mut parts = path.split('.');
        let first = parts.next()?;
        let mut current = self.0.get(first)?;
        for part in parts {
            current = current.as_object()?.get(part)?;
        }
        Some(current)
    }
}

impl From<Map<String, Value>> for UsageRecord {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

/// Ordered list of usage records for one report request.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReportResult {
    #[serde(default)]
    pub items: Vec<UsageRecord>,
}

impl ReportResult {
    pub fn new(items: Vec<UsageRecord>) -> Self {
        Self { items }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}
