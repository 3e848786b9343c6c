//! PostgreSQL table reader.
//!
//! Uses deadpool-postgres for connection pooling. Greenplum connections go
//! through the same reader.

use std::borrow::Cow;

use async_trait::async_trait;
use deadpool_postgres::{Manager, ManagerConfig, Object, Pool, RecyclingMethod};
use tokio_postgres::types::{FromSql, Type};
use tokio_postgres::{Config as PgConfig, Row};
use tracing::{debug, info, warn};

use super::PostgresDialect;
use crate::core::traits::{Dialect, SampleOptions, TableReader};
use crate::core::value::{SampleSet, SqlNullType, SqlValue};
use crate::core::TableHandle;
use crate::credentials::ConnectionParams;
use crate::drivers::{ReaderSettings, TlsBuilder};
use crate::error::{Result, ValidateError};

/// PostgreSQL table reader.
pub struct PostgresReader {
    pool: Pool,
    dialect: PostgresDialect,
}

impl PostgresReader {
    /// Open a pool and verify it with `SELECT 1`.
    pub async fn connect(params: &ConnectionParams, settings: &ReaderSettings) -> Result<Self> {
        let mut pg_config = PgConfig::new();
        pg_config.host(&params.servername);
        pg_config.port(params.port);
        pg_config.dbname(&params.database);
        pg_config.user(&params.username);
        pg_config.password(&params.password);
        pg_config.connect_timeout(settings.connect_timeout);
        pg_config.application_name("migration-validator");

        let mgr_config = ManagerConfig {
            recycling_method: RecyclingMethod::Fast,
        };

        let pool = match TlsBuilder::new(settings.ssl_mode).build()? {
            None => {
                warn!("PostgreSQL TLS is disabled. Credentials will be transmitted in plaintext.");
                let mgr = Manager::from_config(pg_config, tokio_postgres::NoTls, mgr_config);
                Pool::builder(mgr)
                    .max_size(settings.max_connections)
                    .build()
                    .map_err(|e| ValidateError::connection(e, "creating PostgreSQL pool"))?
            }
            Some(tls) => {
                let mgr = Manager::from_config(pg_config, tls, mgr_config);
                Pool::builder(mgr)
                    .max_size(settings.max_connections)
                    .build()
                    .map_err(|e| ValidateError::connection(e, "creating PostgreSQL pool"))?
            }
        };

        let reader = Self {
            pool,
            dialect: PostgresDialect::new(),
        };
        reader.test_connection().await?;

        info!(
            "Connected to PostgreSQL: {} (pool_size={}, ssl_mode={})",
            params.endpoint(),
            settings.max_connections,
            settings.ssl_mode
        );

        Ok(reader)
    }

    async fn get_client(&self) -> Result<Object> {
        self.pool
            .get()
            .await
            .map_err(|e| ValidateError::connection(e, "getting PostgreSQL connection from pool"))
    }
}

#[async_trait]
impl TableReader for PostgresReader {
    async fn count(&self, table: &TableHandle) -> Result<i64> {
        let client = self.get_client().await?;
        let query = self.dialect.count_query(table);
        debug!("count: {}", query);

        let row = client
            .query_one(&query, &[])
            .await
            .map_err(|e| ValidateError::query(table.qualified_name(), e))?;
        row.try_get::<_, i64>(0)
            .map_err(|e| ValidateError::query(table.qualified_name(), e))
    }

    async fn sample(&self, table: &TableHandle, opts: &SampleOptions) -> Result<SampleSet> {
        let client = self.get_client().await?;
        let query = self.dialect.sample_query(table, opts);
        debug!("sample: {}", query);

        let stmt = client
            .prepare(&query)
            .await
            .map_err(|e| ValidateError::query(table.qualified_name(), e))?;
        let rows = client
            .query(&stmt, &[])
            .await
            .map_err(|e| ValidateError::query(table.qualified_name(), e))?;

        let columns: Vec<String> = stmt.columns().iter().map(|c| c.name().to_string()).collect();
        let mut values = Vec::with_capacity(rows.len());
        for row in &rows {
            let mut cells = Vec::with_capacity(columns.len());
            for (idx, col) in stmt.columns().iter().enumerate() {
                let cell = convert_pg_row_value(row, idx, col.type_())
                    .map_err(|e| ValidateError::query(table.qualified_name(), e))?;
                cells.push(cell);
            }
            values.push(cells);
        }

        Ok(SampleSet::new(columns, values))
    }

    async fn test_connection(&self) -> Result<()> {
        let client = self.get_client().await?;
        client
            .simple_query("SELECT 1")
            .await
            .map_err(|e| ValidateError::connection(e, "testing PostgreSQL connection"))?;
        Ok(())
    }

    fn db_type(&self) -> &str {
        "postgres"
    }

    async fn close(&self) {
        self.pool.close();
    }
}

/// Wire bytes of a column whose type has no dedicated conversion.
struct RawCell(Vec<u8>);

impl<'a> FromSql<'a> for RawCell {
    fn from_sql(
        _ty: &Type,
        raw: &'a [u8],
    ) -> std::result::Result<Self, Box<dyn std::error::Error + Sync + Send>> {
        Ok(RawCell(raw.to_vec()))
    }

    fn accepts(_ty: &Type) -> bool {
        true
    }
}

fn cell<T>(
    value: Option<T>,
    wrap: impl FnOnce(T) -> SqlValue<'static>,
    null: SqlNullType,
) -> SqlValue<'static> {
    value.map(wrap).unwrap_or(SqlValue::Null(null))
}

/// Convert one cell to a [`SqlValue`] based on its column type.
fn convert_pg_row_value(
    row: &Row,
    idx: usize,
    ty: &Type,
) -> std::result::Result<SqlValue<'static>, tokio_postgres::Error> {
    let value = match ty.name() {
        "bool" => cell(row.try_get::<_, Option<bool>>(idx)?, SqlValue::Bool, SqlNullType::Bool),
        "int2" => cell(row.try_get::<_, Option<i16>>(idx)?, SqlValue::I16, SqlNullType::I16),
        "int4" => cell(row.try_get::<_, Option<i32>>(idx)?, SqlValue::I32, SqlNullType::I32),
        "int8" => cell(row.try_get::<_, Option<i64>>(idx)?, SqlValue::I64, SqlNullType::I64),
        "float4" => cell(row.try_get::<_, Option<f32>>(idx)?, SqlValue::F32, SqlNullType::F32),
        "float8" => cell(row.try_get::<_, Option<f64>>(idx)?, SqlValue::F64, SqlNullType::F64),
        "uuid" => cell(
            row.try_get::<_, Option<uuid::Uuid>>(idx)?,
            SqlValue::Uuid,
            SqlNullType::Uuid,
        ),
        "timestamp" => cell(
            row.try_get::<_, Option<chrono::NaiveDateTime>>(idx)?,
            SqlValue::DateTime,
            SqlNullType::DateTime,
        ),
        "timestamptz" => cell(
            row.try_get::<_, Option<chrono::DateTime<chrono::FixedOffset>>>(idx)?,
            SqlValue::DateTimeOffset,
            SqlNullType::DateTimeOffset,
        ),
        "date" => cell(
            row.try_get::<_, Option<chrono::NaiveDate>>(idx)?,
            SqlValue::Date,
            SqlNullType::Date,
        ),
        "time" => cell(
            row.try_get::<_, Option<chrono::NaiveTime>>(idx)?,
            SqlValue::Time,
            SqlNullType::Time,
        ),
        "numeric" => cell(
            row.try_get::<_, Option<rust_decimal::Decimal>>(idx)?,
            SqlValue::Decimal,
            SqlNullType::Decimal,
        ),
        "bytea" => cell(
            row.try_get::<_, Option<Vec<u8>>>(idx)?,
            |b| SqlValue::Bytes(Cow::Owned(b)),
            SqlNullType::Bytes,
        ),
        "json" | "jsonb" => cell(
            row.try_get::<_, Option<serde_json::Value>>(idx)?,
            |v| SqlValue::Text(Cow::Owned(v.to_string())),
            SqlNullType::String,
        ),
        _ if <String as FromSql>::accepts(ty) => cell(
            row.try_get::<_, Option<String>>(idx)?,
            |s| SqlValue::Text(Cow::Owned(s)),
            SqlNullType::String,
        ),
        _ => cell(
            row.try_get::<_, Option<RawCell>>(idx)?,
            |raw| SqlValue::Bytes(Cow::Owned(raw.0)),
            SqlNullType::Bytes,
        ),
    };
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_raw_cell_accepts_any_type() {
        assert!(<RawCell as FromSql>::accepts(&Type::INTERVAL));
        let raw = RawCell::from_sql(&Type::INTERVAL, &[1, 2, 3]).unwrap();
        assert_eq!(raw.0, vec![1, 2, 3]);
    }

    #[test]
    fn test_cell_maps_null_to_hint() {
        assert_eq!(cell(Some(5i32), SqlValue::I32, SqlNullType::I32), SqlValue::I32(5));
        assert_eq!(
            cell(None::<i32>, SqlValue::I32, SqlNullType::I32),
            SqlValue::Null(SqlNullType::I32)
        );
    }
}
