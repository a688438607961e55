//! SQL Server metadata layer
//!
//! Reads object metadata and service tier registrations straight from the
//! application database over TDS. finsql.exe is never involved here; the
//! database is the only authority for what exists and how fresh it is.
//!
//! All queries read with `NOLOCK`: the classic development environment keeps
//! long-lived locks on `dbo.Object` while a designer session is open, and a
//! metadata scan must not block behind one.

use crate::config::NavEnvironment;
use crate::error::{Error, Result};
use crate::filter::{ObjectIdRange, VersionListFilter};
use crate::types::{ObjectMetadata, ObjectReference, ObjectType, ServiceTier, ServiceTierStatus};
use chrono::NaiveDateTime;
use std::collections::HashSet;
use tiberius::{Client, Query, Row};
use tokio::net::TcpStream;
use tokio_util::compat::{Compat, TokioAsyncWriteCompatExt};
use tokio_util::sync::CancellationToken;
use tracing::debug;

type SqlClient = Client<Compat<TcpStream>>;

/// Open a TDS connection to the environment's database.
///
/// The TCP connect is bounded by the environment's connect timeout; the
/// original connection strings carried a 6 second budget and operators rely
/// on `test()` failing fast against a dead host.
pub(crate) async fn connect(env: &NavEnvironment) -> Result<SqlClient> {
    let config = env.tds_config()?;
    let addr = config.get_addr();

    let tcp = tokio::time::timeout(env.connect_timeout(), TcpStream::connect(&addr))
        .await
        .map_err(|_| {
            Error::Io(std::io::Error::new(
                std::io::ErrorKind::TimedOut,
                format!("connecting to {addr} timed out"),
            ))
        })??;
    tcp.set_nodelay(true)?;

    let client = Client::connect(config, tcp.compat_write()).await?;
    debug!(server = %env.db_server, database = %env.db_name, "connected to application database");
    Ok(client)
}

/// Render a rowversion column as the conventional `AB-CD-…` hex string.
pub(crate) fn row_version_hex(bytes: &[u8]) -> String {
    bytes
        .iter()
        .map(|b| format!("{b:02X}"))
        .collect::<Vec<_>>()
        .join("-")
}

/// Build the metadata SELECT and its bound parameters.
///
/// The id predicate is inlined (integers from validated ranges); the version
/// exclusion patterns are user-supplied text and stay parameterized. tiberius
/// binds positionally as `@P1..@PN`, so each named filter variable is
/// declared up front and assigned from its positional slot.
pub(crate) fn metadata_query(
    ranges: &[ObjectIdRange],
    exclusions: &[VersionListFilter],
) -> (String, Vec<String>) {
    let type_codes = ObjectType::ALL
        .iter()
        .map(|t| t.to_i32().to_string())
        .collect::<Vec<_>>()
        .join(", ");
    let id_predicate = ObjectIdRange::sql_predicate(ranges);
    let (version_predicate, params) = VersionListFilter::sql_predicate(exclusions);

    let declarations = (0..params.len())
        .map(|i| format!("DECLARE @versionFilter{i} NVARCHAR(250) = @P{};\n", i + 1))
        .collect::<String>();

    let sql = format!(
        "{declarations}SELECT [Type], [ID], [Name], [BLOB Size], [Version List], \
         [Date], [Time], [timestamp] \
         FROM dbo.Object WITH (NOLOCK) \
         WHERE [Type] IN ({type_codes}) AND ({id_predicate}) AND ({version_predicate})"
    );
    (sql, params)
}

fn column_error(row_desc: &str, column: &str) -> Error {
    Error::Metadata(format!("{row_desc}: missing or mistyped column [{column}]"))
}

/// Decode one `dbo.Object` row. The Date and Time columns are separate
/// datetime values carrying only a date and only a time; they combine into
/// one modification timestamp.
fn metadata_from_row(row: &Row) -> Result<ObjectMetadata> {
    let type_code: i32 = row
        .try_get(0)?
        .ok_or_else(|| column_error("object row", "Type"))?;
    let object_type = ObjectType::from_i32(type_code)
        .ok_or_else(|| Error::Metadata(format!("object row: unknown object type {type_code}")))?;
    let id: i32 = row
        .try_get(1)?
        .ok_or_else(|| column_error("object row", "ID"))?;
    let name: &str = row
        .try_get(2)?
        .ok_or_else(|| column_error("object row", "Name"))?;
    let blob_size: i32 = row
        .try_get(3)?
        .ok_or_else(|| column_error("object row", "BLOB Size"))?;
    let version_list: Option<&str> = row.try_get(4)?;
    let date: NaiveDateTime = row
        .try_get(5)?
        .ok_or_else(|| column_error("object row", "Date"))?;
    let time: NaiveDateTime = row
        .try_get(6)?
        .ok_or_else(|| column_error("object row", "Time"))?;
    let row_version: &[u8] = row
        .try_get(7)?
        .ok_or_else(|| column_error("object row", "timestamp"))?;

    Ok(ObjectMetadata {
        reference: ObjectReference::new(object_type, id),
        name: name.to_string(),
        blob_size,
        version_list: version_list.unwrap_or_default().to_string(),
        modified: NaiveDateTime::new(date.date(), time.time()),
        row_version: row_version_hex(row_version),
    })
}

fn service_tier_from_row(row: &Row) -> Result<ServiceTier> {
    let server_name: &str = row
        .try_get(0)?
        .ok_or_else(|| column_error("server instance row", "Server Computer Name"))?;
    let instance: &str = row
        .try_get(1)?
        .ok_or_else(|| column_error("server instance row", "Server Instance Name"))?;
    let management_port: i32 = row
        .try_get(2)?
        .ok_or_else(|| column_error("server instance row", "Management Port"))?;
    let last_active: NaiveDateTime = row
        .try_get(3)?
        .ok_or_else(|| column_error("server instance row", "Last Active"))?;
    let status_code: i32 = row
        .try_get(4)?
        .ok_or_else(|| column_error("server instance row", "Status"))?;

    Ok(ServiceTier {
        server_name: server_name.to_string(),
        instance: instance.to_string(),
        management_port,
        last_active,
        status: ServiceTierStatus::from_i32(status_code),
    })
}

/// Run a query future, abandoning it as soon as the token is cancelled.
///
/// tiberius has no mid-query cancellation; dropping the connection is how a
/// cancelled scan stops occupying the server.
async fn run_cancellable<T>(
    cancel: &CancellationToken,
    query: impl std::future::Future<Output = Result<T>>,
) -> Result<T> {
    tokio::select! {
        () = cancel.cancelled() => Err(Error::Cancelled),
        result = query => result,
    }
}

/// Fetch metadata for every object matching the id ranges, minus those whose
/// version list matches an exclusion pattern.
pub(crate) async fn object_metadata(
    env: &NavEnvironment,
    ranges: &[ObjectIdRange],
    version_exclusions: &[VersionListFilter],
    cancel: &CancellationToken,
) -> Result<HashSet<ObjectMetadata>> {
    let mut client = connect(env).await?;
    let (sql, params) = metadata_query(ranges, version_exclusions);

    let rows = run_cancellable(cancel, async {
        let mut query = Query::new(sql);
        for param in &params {
            query.bind(param.as_str());
        }
        let stream = query.query(&mut client).await?;
        Ok(stream.into_first_result().await?)
    })
    .await?;

    let mut objects = HashSet::with_capacity(rows.len());
    for row in &rows {
        objects.insert(metadata_from_row(row)?);
    }
    debug!(count = objects.len(), "fetched object metadata");
    Ok(objects)
}

/// Fetch the service tier registrations for the environment's database.
pub(crate) async fn service_tiers(
    env: &NavEnvironment,
    cancel: &CancellationToken,
) -> Result<Vec<ServiceTier>> {
    let mut client = connect(env).await?;

    let rows = run_cancellable(cancel, async {
        let stream = client
            .simple_query(
                "SELECT [Server Computer Name], [Server Instance Name], \
                 [Management Port], [Last Active], [Status] \
                 FROM dbo.[Server Instance] WITH (NOLOCK)",
            )
            .await?;
        Ok(stream.into_first_result().await?)
    })
    .await?;

    rows.iter().map(service_tier_from_row).collect()
}

/// Connectivity probe: one trivial round trip over the metadata connection.
pub(crate) async fn probe(env: &NavEnvironment, cancel: &CancellationToken) -> Result<()> {
    let mut client = connect(env).await?;
    run_cancellable(cancel, async {
        let stream = client
            .simple_query("SELECT TOP 0 [ID] FROM dbo.Object WITH (NOLOCK)")
            .await?;
        stream.into_first_result().await?;
        Ok(())
    })
    .await
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn row_version_renders_as_dash_separated_hex() {
        assert_eq!(
            row_version_hex(&[0x00, 0x0A, 0xFF, 0x3B]),
            "00-0A-FF-3B"
        );
        assert_eq!(row_version_hex(&[]), "");
    }

    #[test]
    fn metadata_query_without_filters_degenerates_to_tautologies() {
        let (sql, params) = metadata_query(&[], &[]);
        assert!(params.is_empty());
        assert!(!sql.contains("DECLARE"));
        assert!(sql.contains("FROM dbo.Object WITH (NOLOCK)"));
        assert!(sql.contains("AND (1=1) AND (1=1)"));
    }

    #[test]
    fn metadata_query_inlines_id_ranges_and_parameterizes_versions() {
        let ranges = [
            ObjectIdRange::new(Some(1), Some(50_000)).unwrap(),
            ObjectIdRange::new(Some(100_000), None).unwrap(),
        ];
        let exclusions = [
            VersionListFilter::new("NAVW*").unwrap(),
            VersionListFilter::new("PROJ 1.0").unwrap(),
        ];
        let (sql, params) = metadata_query(&ranges, &exclusions);

        assert!(sql.contains("(1 <= ID AND ID <= 50000) OR 100000 <= ID"));
        assert!(sql.contains("[Version List] NOT LIKE @versionFilter0"));
        assert!(sql.contains("[Version List] NOT LIKE @versionFilter1"));
        // Patterns are bound, never inlined.
        assert!(!sql.contains("NAVW"));
        assert_eq!(params, vec!["NAVW%".to_string(), "PROJ 1.0".to_string()]);
        // Each named variable is assigned from its positional slot.
        assert!(sql.contains("DECLARE @versionFilter0 NVARCHAR(250) = @P1;"));
        assert!(sql.contains("DECLARE @versionFilter1 NVARCHAR(250) = @P2;"));
    }

    #[test]
    fn metadata_query_restricts_type_to_known_object_kinds() {
        let (sql, _) = metadata_query(&[], &[]);
        assert!(sql.contains("[Type] IN (1, 2, 3, 4, 5, 6, 7, 8, 9)"));
    }
}
