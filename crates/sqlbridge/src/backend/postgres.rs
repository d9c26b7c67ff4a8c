//! PostgreSQL backend built on `tokio-postgres`.
//!
//! The driver is async; this backend owns a private current-thread runtime and
//! blocks on it for every call, so the [`Backend`] surface stays synchronous.
//! The connection task is spawned onto the same runtime and makes progress
//! whenever a call is blocking on it.

use super::markers::number_markers;
use super::{Backend, ConnectOptions, RawResponse};
use crate::binding::Binding;
use crate::error::{DbError, DbResult};
use crate::render::Dialect;
use crate::row::ResultSet;
use crate::statement::QueryType;
use crate::value::Value;
use bytes::BytesMut;
use std::error::Error as StdError;
use tokio::runtime::Runtime;
use tokio_postgres::types::{IsNull, ToSql, Type, to_sql_checked};
use tokio_postgres::{Client, NoTls, Row as PgRow};

const DEFAULT_PORT: u16 = 5432;

type BoxError = Box<dyn StdError + Sync + Send>;

/// A PostgreSQL connection.
///
/// Markers (`:name`, `?`) are rewritten to `$n` before preparing. After every
/// successful INSERT the backend reads `lastval()`; tables without a sequence
/// leave the last insert id unchanged.
#[derive(Default)]
pub struct PostgresBackend {
    runtime: Option<Runtime>,
    client: Option<Client>,
    error: String,
    last_id: i64,
}

impl std::fmt::Debug for PostgresBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PostgresBackend")
            .field("connected", &self.client.is_some())
            .field("error", &self.error)
            .field("last_id", &self.last_id)
            .finish()
    }
}

/// The database's message when there is one, the driver's otherwise.
fn pg_message(err: &tokio_postgres::Error) -> String {
    match err.as_db_error() {
        Some(db) => db.message().to_string(),
        None => err.to_string(),
    }
}

impl PostgresBackend {
    pub fn new() -> Self {
        Self::default()
    }

    fn parts(&self) -> DbResult<(&Runtime, &Client)> {
        match (&self.runtime, &self.client) {
            (Some(rt), Some(client)) => Ok((rt, client)),
            _ => Err(DbError::query("not connected")),
        }
    }

    fn record<T>(&mut self, result: Result<T, tokio_postgres::Error>) -> DbResult<T> {
        result.map_err(|err| {
            self.error = pg_message(&err);
            DbError::query(self.error.clone())
        })
    }

    fn refresh_last_id(&mut self) {
        let Ok((rt, client)) = self.parts() else {
            return;
        };
        let id = rt
            .block_on(client.query_one("SELECT lastval()", &[]))
            .ok()
            .and_then(|row| row.try_get::<_, i64>(0).ok());
        if let Some(id) = id {
            self.last_id = id;
        }
    }

    fn finish(
        &mut self,
        result: Result<RawResponse, tokio_postgres::Error>,
        kind: Option<QueryType>,
    ) -> DbResult<RawResponse> {
        let response = self.record(result)?;
        if kind == Some(QueryType::Insert) {
            self.refresh_last_id();
        }
        Ok(response)
    }
}

async fn execute_prepared(
    client: &Client,
    sql: &str,
    params: &[&(dyn ToSql + Sync)],
) -> Result<RawResponse, tokio_postgres::Error> {
    let stmt = client.prepare(sql).await?;
    if stmt.columns().is_empty() {
        let n = client.execute(&stmt, params).await?;
        return Ok(RawResponse::Affected(n));
    }
    let columns: Vec<String> = stmt.columns().iter().map(|c| c.name().to_string()).collect();
    let rows = client.query(&stmt, params).await?;
    let mut out = Vec::with_capacity(rows.len());
    for row in &rows {
        out.push(decode_row(row)?);
    }
    Ok(RawResponse::ResultSet(ResultSet::new(columns, out)))
}

fn decode_row(row: &PgRow) -> Result<Vec<Value>, tokio_postgres::Error> {
    let mut values = Vec::with_capacity(row.len());
    for (i, column) in row.columns().iter().enumerate() {
        values.push(decode_column(row, i, column.type_())?);
    }
    Ok(values)
}

fn decode_column(row: &PgRow, i: usize, ty: &Type) -> Result<Value, tokio_postgres::Error> {
    let value = match *ty {
        Type::BOOL => row.try_get::<_, Option<bool>>(i)?.into(),
        Type::INT2 => row.try_get::<_, Option<i16>>(i)?.into(),
        Type::INT4 => row.try_get::<_, Option<i32>>(i)?.into(),
        Type::INT8 => row.try_get::<_, Option<i64>>(i)?.into(),
        Type::OID => row.try_get::<_, Option<u32>>(i)?.into(),
        Type::FLOAT4 => row.try_get::<_, Option<f32>>(i)?.into(),
        Type::FLOAT8 => row.try_get::<_, Option<f64>>(i)?.into(),
        Type::BYTEA => row.try_get::<_, Option<Vec<u8>>>(i)?.into(),
        Type::JSON | Type::JSONB => row
            .try_get::<_, Option<serde_json::Value>>(i)?
            .map(|v| v.to_string())
            .into(),
        Type::TIMESTAMP => row
            .try_get::<_, Option<chrono::NaiveDateTime>>(i)?
            .map(|v| v.to_string())
            .into(),
        Type::TIMESTAMPTZ => row
            .try_get::<_, Option<chrono::DateTime<chrono::Utc>>>(i)?
            .map(|v| v.to_rfc3339())
            .into(),
        Type::DATE => row
            .try_get::<_, Option<chrono::NaiveDate>>(i)?
            .map(|v| v.to_string())
            .into(),
        Type::TIME => row
            .try_get::<_, Option<chrono::NaiveTime>>(i)?
            .map(|v| v.to_string())
            .into(),
        _ => row.try_get::<_, Option<String>>(i)?.into(),
    };
    Ok(value)
}

fn as_i64(value: &Value) -> Result<i64, BoxError> {
    match value {
        Value::Int(n) => Ok(*n),
        Value::Bool(b) => Ok(i64::from(*b)),
        Value::Float(f) => Ok(f.trunc() as i64),
        Value::Text(s) => Ok(s.trim().parse()?),
        other => Err(format!("cannot bind {other:?} as integer").into()),
    }
}

fn as_f64(value: &Value) -> Result<f64, BoxError> {
    match value {
        Value::Float(f) => Ok(*f),
        Value::Int(n) => Ok(*n as f64),
        Value::Text(s) => Ok(s.trim().parse()?),
        other => Err(format!("cannot bind {other:?} as float").into()),
    }
}

fn as_bool(value: &Value) -> Result<bool, BoxError> {
    match value {
        Value::Bool(b) => Ok(*b),
        Value::Int(n) => Ok(*n != 0),
        Value::Text(s) => match s.as_str() {
            "t" | "true" | "1" => Ok(true),
            "f" | "false" | "0" | "" => Ok(false),
            _ => Err(format!("cannot bind {s:?} as boolean").into()),
        },
        other => Err(format!("cannot bind {other:?} as boolean").into()),
    }
}

/// Values adapt to whatever type the server inferred for the parameter.
impl ToSql for Value {
    fn to_sql(&self, ty: &Type, out: &mut BytesMut) -> Result<IsNull, BoxError> {
        if self.is_null() {
            return Ok(IsNull::Yes);
        }
        match *ty {
            Type::BOOL => as_bool(self)?.to_sql(ty, out),
            Type::INT2 => i16::try_from(as_i64(self)?)?.to_sql(ty, out),
            Type::INT4 => i32::try_from(as_i64(self)?)?.to_sql(ty, out),
            Type::INT8 => as_i64(self)?.to_sql(ty, out),
            Type::OID => u32::try_from(as_i64(self)?)?.to_sql(ty, out),
            Type::FLOAT4 => (as_f64(self)? as f32).to_sql(ty, out),
            Type::FLOAT8 => as_f64(self)?.to_sql(ty, out),
            Type::BYTEA => match self {
                Value::Blob(b) => b.to_sql(ty, out),
                other => other.to_string().into_bytes().to_sql(ty, out),
            },
            Type::JSON | Type::JSONB => {
                let json = match self {
                    Value::Text(s) => serde_json::from_str(s)
                        .unwrap_or_else(|_| serde_json::Value::String(s.clone())),
                    other => serde_json::to_value(other)?,
                };
                json.to_sql(ty, out)
            }
            _ => self.to_string().to_sql(ty, out),
        }
    }

    fn accepts(_ty: &Type) -> bool {
        true
    }

    to_sql_checked!();
}

impl Backend for PostgresBackend {
    fn kind(&self) -> &'static str {
        "postgres"
    }

    fn dialect(&self) -> Dialect {
        Dialect::Postgres
    }

    fn connect(&mut self, options: &ConnectOptions) -> DbResult<()> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|e| {
                self.error = e.to_string();
                DbError::connection(self.error.clone())
            })?;

        let mut config = tokio_postgres::Config::new();
        config
            .host(if options.host.is_empty() {
                "localhost"
            } else {
                options.host.as_str()
            })
            .port(options.port.unwrap_or(DEFAULT_PORT))
            .user(&options.user)
            .dbname(&options.db_name);
        if !options.password.is_empty() {
            config.password(&options.password);
        }
        if let Some(charset) = &options.charset {
            config.options(&format!("-c client_encoding={charset}"));
        }

        match runtime.block_on(config.connect(NoTls)) {
            Ok((client, connection)) => {
                runtime.spawn(async move {
                    if let Err(err) = connection.await {
                        tracing::warn!(error = %err, "postgres connection closed with error");
                    }
                });
                tracing::debug!(host = %options.host, db = %options.db_name, "connected to postgres");
                self.client = Some(client);
                self.runtime = Some(runtime);
                self.error.clear();
                Ok(())
            }
            Err(err) => {
                self.error = pg_message(&err);
                Err(DbError::connection(self.error.clone()))
            }
        }
    }

    fn is_connected(&self) -> bool {
        self.client.as_ref().is_some_and(|c| !c.is_closed())
    }

    fn raw_execute(&mut self, sql: &str, hint: QueryType) -> DbResult<RawResponse> {
        let (rt, client) = self.parts()?;
        let result = if hint.is_ddl() {
            rt.block_on(client.batch_execute(sql)).map(|()| RawResponse::Done)
        } else {
            rt.block_on(execute_prepared(client, sql, &[]))
        };
        self.finish(result, Some(hint))
    }

    fn bound_execute(&mut self, sql: &str, bindings: &[Binding]) -> DbResult<RawResponse> {
        let (numbered, slots) = number_markers(sql);
        let mut values = Vec::with_capacity(slots.len());
        for marker in &slots {
            let binding = bindings
                .iter()
                .find(|b| b.marker == *marker)
                .ok_or_else(|| {
                    self.error = format!("no binding for marker {marker}");
                    DbError::query(self.error.clone())
                })?;
            values.push(binding.bound_value());
        }
        let params: Vec<&(dyn ToSql + Sync)> =
            values.iter().map(|v| v as &(dyn ToSql + Sync)).collect();

        let (rt, client) = self.parts()?;
        let result = rt.block_on(execute_prepared(client, &numbered, &params));
        self.finish(result, QueryType::sniff(sql))
    }

    fn last_insert_id(&self) -> i64 {
        self.last_id
    }

    fn error_text(&self) -> &str {
        &self.error
    }

    fn release(&mut self) {
        self.client = None;
        if let Some(runtime) = self.runtime.take() {
            runtime.shutdown_background();
        }
    }
}
