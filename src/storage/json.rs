use crate::extract::Record;
use crate::storage::traits::{RecordEncoder, StorageResult};
use std::fs::File;
use std::io::{BufReader, Write};
use std::path::Path;

/// Writes records as a pretty-printed JSON array
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonEncoder;

impl RecordEncoder for JsonEncoder {
    fn encode(&self, records: &[Record], out: &mut dyn Write) -> StorageResult<()> {
        serde_json::to_writer_pretty(&mut *out, records)?;
        out.write_all(b"\n")?;
        Ok(())
    }
}

/// Reads back a file written in the `json` format
///
/// Values round-trip exactly: a record saved and loaded compares equal to
/// the original.
pub fn load_json(path: &Path) -> StorageResult<Vec<Record>> {
    let reader = BufReader::new(File::open(path)?);
    Ok(serde_json::from_reader(reader)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::Fields;
    use chrono::Utc;
    use serde_json::json;

    #[test]
    fn test_encode_array_in_order() {
        let records: Vec<Record> = ["https://a.test/", "https://b.test/"]
            .iter()
            .map(|url| Record::new(*url, Utc::now(), Fields::new()))
            .collect();

        let mut out = Vec::new();
        JsonEncoder.encode(&records, &mut out).unwrap();

        let value: serde_json::Value = serde_json::from_slice(&out).unwrap();
        assert_eq!(value[0]["source_url"], "https://a.test/");
        assert_eq!(value[1]["source_url"], "https://b.test/");
    }

    #[test]
    fn test_load_round_trip() {
        let mut fields = Fields::new();
        fields.insert("nested".to_string(), json!({"list": [1, 2.5, "x"], "flag": true}));
        fields.insert("empty".to_string(), json!(null));
        let records = vec![Record::new("https://a.test/", Utc::now(), fields)];

        let file = tempfile::NamedTempFile::new().unwrap();
        let mut handle = file.reopen().unwrap();
        JsonEncoder.encode(&records, &mut handle).unwrap();

        assert_eq!(load_json(file.path()).unwrap(), records);
    }
}
