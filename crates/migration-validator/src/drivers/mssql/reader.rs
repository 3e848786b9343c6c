//! MSSQL table reader.
//!
//! Uses Tiberius with bb8 connection pooling.

use std::borrow::Cow;
use std::time::Duration;

use async_trait::async_trait;
use bb8::{Pool, PooledConnection};
use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime};
use rust_decimal::Decimal;
use tiberius::{AuthMethod, Client, ColumnData, Config, EncryptionLevel, FromSql, Row};
use tokio::net::TcpStream;
use tokio_util::compat::{Compat, TokioAsyncWriteCompatExt};
use tracing::{debug, info};

use super::MssqlDialect;
use crate::core::traits::{Dialect, SampleOptions, TableReader};
use crate::core::value::{SampleSet, SqlNullType, SqlValue};
use crate::core::TableHandle;
use crate::credentials::ConnectionParams;
use crate::drivers::ReaderSettings;
use crate::error::{Result, ValidateError};

/// Idle connection timeout (5 minutes).
const POOL_IDLE_TIMEOUT: Duration = Duration::from_secs(300);

/// Connection manager for bb8 pool with Tiberius.
#[derive(Clone)]
pub struct TiberiusConnectionManager {
    params: ConnectionParams,
    trust_server_cert: bool,
}

impl TiberiusConnectionManager {
    fn new(params: ConnectionParams, trust_server_cert: bool) -> Self {
        Self {
            params,
            trust_server_cert,
        }
    }

    fn build_config(&self) -> Config {
        let mut config = Config::new();
        config.host(&self.params.servername);
        config.port(self.params.port);
        config.database(&self.params.database);
        config.authentication(AuthMethod::sql_server(
            &self.params.username,
            &self.params.password,
        ));
        config.application_name("migration-validator");

        if self.trust_server_cert {
            config.trust_cert();
        }
        config.encryption(EncryptionLevel::Required);
        config
    }
}

#[async_trait]
impl bb8::ManageConnection for TiberiusConnectionManager {
    type Connection = Client<Compat<TcpStream>>;
    type Error = tiberius::error::Error;

    async fn connect(&self) -> std::result::Result<Self::Connection, Self::Error> {
        let config = self.build_config();
        let tcp = TcpStream::connect(config.get_addr()).await.map_err(|e| {
            tiberius::error::Error::Io {
                kind: e.kind(),
                message: e.to_string(),
            }
        })?;
        tcp.set_nodelay(true).ok();

        Client::connect(config, tcp.compat_write()).await
    }

    async fn is_valid(&self, conn: &mut Self::Connection) -> std::result::Result<(), Self::Error> {
        conn.simple_query("SELECT 1").await?.into_row().await?;
        Ok(())
    }

    fn has_broken(&self, _conn: &mut Self::Connection) -> bool {
        false
    }
}

/// MSSQL table reader.
pub struct MssqlReader {
    pool: Pool<TiberiusConnectionManager>,
    dialect: MssqlDialect,
}

impl MssqlReader {
    /// Open a pool and verify it with `SELECT 1`.
    pub async fn connect(params: &ConnectionParams, settings: &ReaderSettings) -> Result<Self> {
        let manager = TiberiusConnectionManager::new(params.clone(), settings.trust_server_cert);
        let pool = Pool::builder()
            .max_size(settings.max_connections as u32)
            .connection_timeout(settings.connect_timeout)
            .idle_timeout(Some(POOL_IDLE_TIMEOUT))
            // A query abandoned on timeout can leave a connection mid-stream
            .test_on_check_out(true)
            .build(manager)
            .await
            .map_err(|e| ValidateError::connection(e, "creating MSSQL connection pool"))?;

        let reader = Self {
            pool,
            dialect: MssqlDialect::new(),
        };
        reader.test_connection().await?;

        info!(
            "Connected to MSSQL: {} (pool_size={})",
            params.endpoint(),
            settings.max_connections
        );

        Ok(reader)
    }

    /// Get a pooled connection.
    async fn get_client(&self) -> Result<PooledConnection<'_, TiberiusConnectionManager>> {
        self.pool
            .get()
            .await
            .map_err(|e| ValidateError::connection(e, "getting MSSQL connection from pool"))
    }
}

#[async_trait]
impl TableReader for MssqlReader {
    async fn count(&self, table: &TableHandle) -> Result<i64> {
        let mut client = self.get_client().await?;
        let name = table.qualified_name();
        let query = self.dialect.count_query(table);
        debug!("count: {}", query);

        let row = client
            .simple_query(&query)
            .await
            .map_err(|e| ValidateError::query(&name, e))?
            .into_row()
            .await
            .map_err(|e| ValidateError::query(&name, e))?
            .ok_or_else(|| ValidateError::query(&name, "count returned no rows"))?;

        row.try_get::<i64, _>(0)
            .map_err(|e| ValidateError::query(&name, e))?
            .ok_or_else(|| ValidateError::query(&name, "count returned NULL"))
    }

    async fn sample(&self, table: &TableHandle, opts: &SampleOptions) -> Result<SampleSet> {
        let mut client = self.get_client().await?;
        let query = self.dialect.sample_query(table, opts);
        debug!("sample: {}", query);

        let rows = client
            .simple_query(&query)
            .await
            .map_err(|e| ValidateError::query(table.qualified_name(), e))?
            .into_first_result()
            .await
            .map_err(|e| ValidateError::query(table.qualified_name(), e))?;

        let columns = rows
            .first()
            .map(|r| r.columns().iter().map(|c| c.name().to_string()).collect())
            .unwrap_or_default();

        let values = rows
            .into_iter()
            .map(row_to_values)
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(|e| ValidateError::query(table.qualified_name(), e))?;

        Ok(SampleSet::new(columns, values))
    }

    async fn test_connection(&self) -> Result<()> {
        let mut client = self.get_client().await?;
        client
            .simple_query("SELECT 1")
            .await
            .map_err(|e| ValidateError::connection(e, "testing MSSQL connection"))?
            .into_row()
            .await
            .map_err(|e| ValidateError::connection(e, "testing MSSQL connection"))?;
        Ok(())
    }

    fn db_type(&self) -> &str {
        "mssql"
    }

    async fn close(&self) {
        // bb8 drops idle connections when the pool is dropped
    }
}

fn row_to_values(row: Row) -> tiberius::Result<Vec<SqlValue<'static>>> {
    row.into_iter().map(|data| convert_column_data(&data)).collect()
}

/// Convert a TDS cell to a [`SqlValue`].
fn convert_column_data(data: &ColumnData<'static>) -> tiberius::Result<SqlValue<'static>> {
    let value = match data {
        ColumnData::U8(v) => v
            .map(|v| SqlValue::I16(i16::from(v)))
            .unwrap_or(SqlValue::Null(SqlNullType::I16)),
        ColumnData::I16(v) => v.map(SqlValue::I16).unwrap_or(SqlValue::Null(SqlNullType::I16)),
        ColumnData::I32(v) => v.map(SqlValue::I32).unwrap_or(SqlValue::Null(SqlNullType::I32)),
        ColumnData::I64(v) => v.map(SqlValue::I64).unwrap_or(SqlValue::Null(SqlNullType::I64)),
        ColumnData::F32(v) => v.map(SqlValue::F32).unwrap_or(SqlValue::Null(SqlNullType::F32)),
        ColumnData::F64(v) => v.map(SqlValue::F64).unwrap_or(SqlValue::Null(SqlNullType::F64)),
        ColumnData::Bit(v) => v.map(SqlValue::Bool).unwrap_or(SqlValue::Null(SqlNullType::Bool)),
        ColumnData::String(v) => v
            .as_ref()
            .map(|s| SqlValue::Text(Cow::Owned(s.to_string())))
            .unwrap_or(SqlValue::Null(SqlNullType::String)),
        ColumnData::Guid(v) => v.map(SqlValue::Uuid).unwrap_or(SqlValue::Null(SqlNullType::Uuid)),
        ColumnData::Binary(v) => v
            .as_ref()
            .map(|b| SqlValue::Bytes(Cow::Owned(b.to_vec())))
            .unwrap_or(SqlValue::Null(SqlNullType::Bytes)),
        ColumnData::Numeric(_) => Decimal::from_sql(data)?
            .map(SqlValue::Decimal)
            .unwrap_or(SqlValue::Null(SqlNullType::Decimal)),
        ColumnData::DateTime(_) | ColumnData::SmallDateTime(_) | ColumnData::DateTime2(_) => {
            NaiveDateTime::from_sql(data)?
                .map(SqlValue::DateTime)
                .unwrap_or(SqlValue::Null(SqlNullType::DateTime))
        }
        ColumnData::Date(_) => NaiveDate::from_sql(data)?
            .map(SqlValue::Date)
            .unwrap_or(SqlValue::Null(SqlNullType::Date)),
        ColumnData::Time(_) => NaiveTime::from_sql(data)?
            .map(SqlValue::Time)
            .unwrap_or(SqlValue::Null(SqlNullType::Time)),
        ColumnData::DateTimeOffset(_) => DateTime::<FixedOffset>::from_sql(data)?
            .map(SqlValue::DateTimeOffset)
            .unwrap_or(SqlValue::Null(SqlNullType::DateTimeOffset)),
        ColumnData::Xml(v) => v
            .as_ref()
            .map(|x| SqlValue::Text(Cow::Owned((**x).clone().into_string())))
            .unwrap_or(SqlValue::Null(SqlNullType::String)),
    };
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_convert_integers_and_nulls() {
        assert_eq!(
            convert_column_data(&ColumnData::U8(Some(7))).unwrap(),
            SqlValue::I16(7)
        );
        assert_eq!(
            convert_column_data(&ColumnData::I64(Some(-1))).unwrap(),
            SqlValue::I64(-1)
        );
        assert_eq!(
            convert_column_data(&ColumnData::I32(None)).unwrap(),
            SqlValue::Null(SqlNullType::I32)
        );
    }

    #[test]
    fn test_convert_text_and_binary() {
        assert_eq!(
            convert_column_data(&ColumnData::String(Some(Cow::Borrowed("shipped")))).unwrap(),
            SqlValue::from("shipped".to_string())
        );
        assert_eq!(
            convert_column_data(&ColumnData::Binary(Some(Cow::Owned(vec![1, 2])))).unwrap(),
            SqlValue::from(vec![1u8, 2])
        );
    }
}
