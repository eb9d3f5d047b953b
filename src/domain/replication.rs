//! Replication parser — typed link records from delimited probe output.
//!
//! The replication probe emits CSV with a header row. Column order is not
//! guaranteed stable across tool versions, and header spellings vary
//! (`Destination DSA` vs `Dest`, `Number of Failures` vs `NumberFailures`),
//! so columns are resolved by normalized name rather than by position.

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::ReplicationError;

/// One inbound replication link: the state of replication for one naming
/// context from one source node to one destination node. All fields are
/// passed through verbatim from the probe output; only the failure count
/// is coerced to an integer. When the failure count is zero the
/// last-failure fields may still carry stale values from the source tool
/// and are passed through unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReplicationLink {
    pub naming_context: String,
    pub source: String,
    pub source_site: String,
    pub destination: String,
    pub destination_site: String,
    pub transport: String,
    pub failure_count: u64,
    pub last_failure_time: Option<String>,
    pub last_failure_status: String,
    pub last_success_time: Option<String>,
}

/// Parse result: the links plus how many malformed rows were dropped.
#[derive(Debug, Default)]
pub struct ParsedReplication {
    pub links: Vec<ReplicationLink>,
    pub skipped_rows: usize,
}

/// Header-resolved column positions.
struct ColumnMap {
    naming_context: usize,
    destination: usize,
    source: Option<usize>,
    source_site: Option<usize>,
    destination_site: Option<usize>,
    transport: Option<usize>,
    failure_count: Option<usize>,
    last_failure_time: Option<usize>,
    last_failure_status: Option<usize>,
    last_success_time: Option<usize>,
}

/// Lowercase and strip everything non-alphanumeric, so that
/// `"Number of Failures"`, `"NumberFailures"` and `"number-failures"`
/// all resolve to the same column.
fn normalize(header: &str) -> String {
    header
        .chars()
        .filter(char::is_ascii_alphanumeric)
        .collect::<String>()
        .to_ascii_lowercase()
}

fn find(headers: &csv::StringRecord, aliases: &[&str]) -> Option<usize> {
    headers
        .iter()
        .position(|h| aliases.contains(&normalize(h).as_str()))
}

impl ColumnMap {
    fn from_headers(headers: &csv::StringRecord) -> Result<Self, ReplicationError> {
        let naming_context = find(headers, &["namingcontext"])
            .ok_or(ReplicationError::MissingColumn("naming context"))?;
        let destination = find(headers, &["destinationdsa", "destination", "dest"])
            .ok_or(ReplicationError::MissingColumn("destination"))?;

        Ok(Self {
            naming_context,
            destination,
            source: find(headers, &["sourcedsa", "source"]),
            source_site: find(headers, &["sourcedsasite", "sourcesite"]),
            destination_site: find(
                headers,
                &["destinationdsasite", "destinationsite", "destsite"],
            ),
            transport: find(headers, &["transporttype", "transport"]),
            failure_count: find(
                headers,
                &["numberoffailures", "numberfailures", "failures"],
            ),
            last_failure_time: find(headers, &["lastfailuretime"]),
            last_failure_status: find(headers, &["lastfailurestatus"]),
            last_success_time: find(headers, &["lastsuccesstime"]),
        })
    }
}

fn field(record: &csv::StringRecord, index: Option<usize>) -> String {
    index
        .and_then(|i| record.get(i))
        .unwrap_or_default()
        .to_string()
}

fn opt_field(record: &csv::StringRecord, index: Option<usize>) -> Option<String> {
    let value = field(record, index);
    if value.is_empty() { None } else { Some(value) }
}

/// Parse the replication probe's CSV output into [`ReplicationLink`]
/// records. A header missing a required column fails the whole section;
/// a malformed data row (too short, or an unparseable failure count) is
/// skipped with a warning — partial replication data beats none.
pub fn parse(raw: &str) -> Result<ParsedReplication, ReplicationError> {
    // Not flexible: a row whose column count differs from the header is a
    // malformed row and surfaces as a read error below.
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(raw.as_bytes());

    let headers = reader.headers()?.clone();
    if headers.is_empty() || raw.trim().is_empty() {
        return Err(ReplicationError::Empty);
    }
    let columns = ColumnMap::from_headers(&headers)?;

    let mut parsed = ParsedReplication::default();
    for (row, record) in reader.records().enumerate() {
        let record = match record {
            Ok(record) => record,
            Err(e) => {
                warn!(row, error = %e, "skipping unreadable replication row");
                parsed.skipped_rows += 1;
                continue;
            }
        };

        // Required columns must be present in this row, not just the header.
        let (Some(naming_context), Some(destination)) = (
            record.get(columns.naming_context),
            record.get(columns.destination),
        ) else {
            warn!(row, "skipping replication row with missing columns");
            parsed.skipped_rows += 1;
            continue;
        };

        let failures_raw = field(&record, columns.failure_count);
        let failure_count = if failures_raw.is_empty() {
            0
        } else {
            match failures_raw.parse::<u64>() {
                Ok(n) => n,
                Err(_) => {
                    warn!(row, value = %failures_raw, "skipping replication row with bad failure count");
                    parsed.skipped_rows += 1;
                    continue;
                }
            }
        };

        parsed.links.push(ReplicationLink {
            naming_context: naming_context.to_string(),
            source: field(&record, columns.source),
            source_site: field(&record, columns.source_site),
            destination: destination.to_string(),
            destination_site: field(&record, columns.destination_site),
            transport: field(&record, columns.transport),
            failure_count,
            last_failure_time: opt_field(&record, columns.last_failure_time),
            last_failure_status: field(&record, columns.last_failure_status),
            last_success_time: opt_field(&record, columns.last_success_time),
        });
    }

    Ok(parsed)
}
