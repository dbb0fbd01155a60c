//! Reading the task manifest supplied by the external build driver.

use crate::{error::Result, types::{SourceId, Task}};
use std::{collections::HashMap, io::Read};

/// Parses a `{ source_id: { source, args, includes? } }` JSON document.
///
/// Unknown keys are ignored (handled by `serde`'s default field-skipping
/// behavior); `includes` defaults to an empty list.
pub fn read_tasks(mut reader: impl Read) -> Result<HashMap<SourceId, Task>> {
    let mut buf = String::new();
    reader.read_to_string(&mut buf)?;
    let raw: HashMap<String, Task> = serde_json::from_str(&buf)?;
    Ok(raw.into_iter().map(|(k, v)| (SourceId::new(k), v)).collect())
}
