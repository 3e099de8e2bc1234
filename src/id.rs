use compact_str::CompactString;
use serde::{Deserialize, Deserializer};

#[derive(Debug, Clone, Eq, PartialEq, Hash)]
pub struct JobId {
    value: CompactString,
}

impl JobId {
    pub fn new(id: impl Into<CompactString>) -> Self { Self { value: id.into() } }

    pub fn as_str(&self) -> &str {
        self.value.as_str()
    }
}

impl<'de> Deserialize<'de> for JobId {
    fn deserialize<D>(deserializer: D) -> Result<JobId, D::Error>
        where D: Deserializer<'de>,
    {
        let id = CompactString::deserialize(deserializer)?;
        Ok(JobId::new(id))
    }
}

impl std::fmt::Display for JobId {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{}", self.value)
    }
}
