//! Batch input loading
//!
//! Reads the request CSV and writes the sample file. The loader is
//! deliberately lenient: unknown columns are ignored, missing optional
//! columns default to empty, and empty required cells pass through so the
//! validator can report them per row instead of the whole file failing.

use crate::domain::ports::{ResourceKind, ResourceRequest};
use crate::error::{Error, Result};
use indexmap::IndexSet;
use std::path::Path;
use tracing::info;

/// Recognized header names, lowercased
const COLUMNS: &[&str] = &[
    "name",
    "type",
    "size",
    "pool",
    "description",
    "hosts",
    "thin",
    "protocol",
    "quota",
    "access_policy",
];

/// Load requests from a headered CSV file.
pub fn load_requests(path: impl AsRef<Path>) -> Result<Vec<ResourceRequest>> {
    let path = path.as_ref();
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .flexible(true)
        .from_path(path)
        .map_err(|e| {
            Error::Configuration(format!("cannot read batch file {}: {}", path.display(), e))
        })?;

    let headers = reader.headers()?.clone();
    let index_of = |column: &str| -> Option<usize> {
        headers
            .iter()
            .position(|h| h.trim().eq_ignore_ascii_case(column))
    };
    let columns: Vec<Option<usize>> = COLUMNS.iter().map(|c| index_of(c)).collect();
    let field = |record: &csv::StringRecord, column: usize| -> String {
        columns[column]
            .and_then(|i| record.get(i))
            .unwrap_or("")
            .trim()
            .to_string()
    };

    let mut requests = Vec::new();
    for record in reader.records() {
        let record = record?;

        let mut consumers = IndexSet::new();
        for host in field(&record, 5).split(';') {
            let host = host.trim();
            if !host.is_empty() {
                consumers.insert(host.to_string());
            }
        }

        let optional = |column: usize| -> Option<String> {
            let value = field(&record, column);
            if value.is_empty() {
                None
            } else {
                Some(value)
            }
        };

        requests.push(ResourceRequest {
            name: field(&record, 0),
            kind: parse_kind(&field(&record, 1)),
            size: field(&record, 2),
            pool: field(&record, 3),
            description: optional(4),
            consumers,
            thin: parse_tristate(&field(&record, 6)),
            protocol: optional(7),
            quota: optional(8),
            access_policy: optional(9),
        });
    }

    info!("Loaded {} request(s) from {}", requests.len(), path.display());
    Ok(requests)
}

fn parse_kind(s: &str) -> ResourceKind {
    match s.to_lowercase().as_str() {
        "file" | "fs" | "filesystem" => ResourceKind::File,
        _ => ResourceKind::Block,
    }
}

/// Empty or unrecognized values leave the array default in place.
fn parse_tristate(s: &str) -> Option<bool> {
    match s.to_lowercase().as_str() {
        "true" | "yes" | "1" => Some(true),
        "false" | "no" | "0" => Some(false),
        _ => None,
    }
}

/// Write a sample batch file covering block and file rows.
pub fn write_sample(path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    let mut writer = csv::Writer::from_path(path).map_err(|e| {
        Error::Configuration(format!("cannot write sample file {}: {}", path.display(), e))
    })?;

    writer.write_record(COLUMNS)?;
    writer.write_record([
        "vol-app-01",
        "block",
        "100Gi",
        "perf-pool",
        "app data volume",
        "esx-01;esx-02",
        "true",
        "",
        "",
        "",
    ])?;
    writer.write_record([
        "vol-app-02",
        "block",
        "2Ti",
        "perf-pool",
        "",
        "",
        "",
        "",
        "",
        "",
    ])?;
    writer.write_record([
        "share-eng",
        "file",
        "500Gi",
        "nas-a",
        "engineering share",
        "",
        "",
        "nfs",
        "250Gi",
        "unix",
    ])?;
    writer.flush()?;

    info!("Wrote sample batch file to {}", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn load_from(content: &str) -> Vec<ResourceRequest> {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "{}", content).unwrap();
        load_requests(file.path()).unwrap()
    }

    #[test]
    fn test_load_basic_rows() {
        let requests = load_from(
            "name,type,size,pool,description,hosts,thin,protocol,quota,access_policy\n\
             vol-01,block,100Gi,perf-pool,app data,esx-01;esx-02,true,,,\n\
             share-01,file,500Gi,nas-a,,,,nfs,250Gi,unix\n",
        );

        assert_eq!(requests.len(), 2);

        let vol = &requests[0];
        assert_eq!(vol.name, "vol-01");
        assert_eq!(vol.kind, ResourceKind::Block);
        assert_eq!(vol.size, "100Gi");
        assert_eq!(vol.pool, "perf-pool");
        assert_eq!(vol.description.as_deref(), Some("app data"));
        assert_eq!(vol.consumers.len(), 2);
        assert_eq!(vol.thin, Some(true));

        let share = &requests[1];
        assert_eq!(share.kind, ResourceKind::File);
        assert_eq!(share.protocol.as_deref(), Some("nfs"));
        assert_eq!(share.quota.as_deref(), Some("250Gi"));
        assert!(share.consumers.is_empty());
        assert!(share.thin.is_none());
    }

    #[test]
    fn test_empty_required_cells_pass_through() {
        let requests = load_from("name,size,pool\n,,\nvol-01,,perf-pool\n");

        assert_eq!(requests.len(), 2);
        assert_eq!(requests[0].name, "");
        assert_eq!(requests[1].name, "vol-01");
        assert_eq!(requests[1].size, "");
    }

    #[test]
    fn test_unknown_columns_ignored_and_missing_default() {
        let requests = load_from(
            "ticket,name,size,pool\nCHG-100,vol-01,10Gi,perf-pool\n",
        );

        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].name, "vol-01");
        assert!(requests[0].description.is_none());
        assert!(requests[0].consumers.is_empty());
    }

    #[test]
    fn test_headers_match_case_insensitively() {
        let requests = load_from("Name,Size,Pool\nvol-01,10Gi,perf-pool\n");
        assert_eq!(requests[0].name, "vol-01");
    }

    #[test]
    fn test_tristate_parsing() {
        assert_eq!(parse_tristate("true"), Some(true));
        assert_eq!(parse_tristate("YES"), Some(true));
        assert_eq!(parse_tristate("0"), Some(false));
        assert_eq!(parse_tristate(""), None);
        assert_eq!(parse_tristate("maybe"), None);
    }

    #[test]
    fn test_sample_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sample.csv");

        write_sample(&path).unwrap();
        let requests = load_requests(&path).unwrap();

        assert_eq!(requests.len(), 3);
        assert_eq!(requests[0].name, "vol-app-01");
        assert_eq!(requests[0].consumers.len(), 2);
        assert_eq!(requests[2].kind, ResourceKind::File);
    }

    #[test]
    fn test_missing_file_is_configuration_error() {
        let err = load_requests("/no/such/batch.csv").unwrap_err();
        assert!(matches!(err, Error::Configuration(_)));
    }
}
