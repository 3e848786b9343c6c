//! MySQL/MariaDB table reader.
//!
//! Uses SQLx for connection pooling and async query execution.

use std::borrow::Cow;

use async_trait::async_trait;
use rust_decimal::Decimal;
use sqlx::mysql::{MySqlConnectOptions, MySqlPool, MySqlPoolOptions, MySqlRow, MySqlSslMode};
use sqlx::{Column, Row, TypeInfo, ValueRef};
use tracing::{debug, info};

use super::MysqlDialect;
use crate::core::traits::{Dialect, SampleOptions, TableReader};
use crate::core::value::{SampleSet, SqlNullType, SqlValue};
use crate::core::TableHandle;
use crate::credentials::ConnectionParams;
use crate::drivers::ReaderSettings;
use crate::error::{Result, ValidateError};

/// MySQL/MariaDB table reader.
pub struct MysqlReader {
    pool: MySqlPool,
    dialect: MysqlDialect,
}

impl MysqlReader {
    /// Open a pool and verify it with `SELECT 1`.
    pub async fn connect(params: &ConnectionParams, settings: &ReaderSettings) -> Result<Self> {
        let options = MySqlConnectOptions::new()
            .host(&params.servername)
            .port(params.port)
            .database(&params.database)
            .username(&params.username)
            .password(&params.password)
            .ssl_mode(MySqlSslMode::Preferred);

        let pool = MySqlPoolOptions::new()
            .max_connections(settings.max_connections as u32)
            .acquire_timeout(settings.connect_timeout)
            .connect_with(options)
            .await
            .map_err(|e| ValidateError::connection(e, "creating MySQL pool"))?;

        let reader = Self {
            pool,
            dialect: MysqlDialect::new(),
        };
        reader.test_connection().await?;

        info!(
            "Connected to MySQL: {} (pool_size={})",
            params.endpoint(),
            settings.max_connections
        );

        Ok(reader)
    }

    /// Convert a MySQL row to SqlValue vector.
    fn row_to_values(row: &MySqlRow) -> std::result::Result<Vec<SqlValue<'static>>, sqlx::Error> {
        row.columns()
            .iter()
            .enumerate()
            .map(|(i, col)| {
                let data_type = col.type_info().name().to_lowercase();
                if row.try_get_raw(i)?.is_null() {
                    return Ok(SqlValue::Null(Self::null_type_for(&data_type)));
                }
                Self::convert_value(row, i, &data_type)
            })
            .collect()
    }

    fn convert_value(
        row: &MySqlRow,
        i: usize,
        data_type: &str,
    ) -> std::result::Result<SqlValue<'static>, sqlx::Error> {
        let value = match data_type {
            "boolean" | "bool" => SqlValue::Bool(row.try_get::<bool, _>(i)?),

            "tinyint" => SqlValue::I16(i16::from(row.try_get::<i8, _>(i)?)),
            "smallint" => SqlValue::I16(row.try_get::<i16, _>(i)?),
            "mediumint" | "int" | "integer" => SqlValue::I32(row.try_get::<i32, _>(i)?),
            "bigint" => SqlValue::I64(row.try_get::<i64, _>(i)?),

            "tinyint unsigned" => SqlValue::I16(i16::from(row.try_get::<u8, _>(i)?)),
            "smallint unsigned" | "year" => SqlValue::I32(i32::from(row.try_get::<u16, _>(i)?)),
            "mediumint unsigned" | "int unsigned" => {
                SqlValue::I64(i64::from(row.try_get::<u32, _>(i)?))
            }
            "bigint unsigned" | "bit" => {
                let v = row.try_get::<u64, _>(i)?;
                i64::try_from(v)
                    .map(SqlValue::I64)
                    .unwrap_or_else(|_| SqlValue::Decimal(Decimal::from(v)))
            }

            "float" => SqlValue::F32(row.try_get::<f32, _>(i)?),
            "double" | "real" => SqlValue::F64(row.try_get::<f64, _>(i)?),
            "decimal" | "numeric" => SqlValue::Decimal(row.try_get::<Decimal, _>(i)?),

            "date" => SqlValue::Date(row.try_get::<chrono::NaiveDate, _>(i)?),
            "time" => SqlValue::Time(row.try_get::<chrono::NaiveTime, _>(i)?),
            "datetime" | "timestamp" => {
                SqlValue::DateTime(row.try_get::<chrono::NaiveDateTime, _>(i)?)
            }

            "binary" | "varbinary" | "blob" | "tinyblob" | "mediumblob" | "longblob" => {
                SqlValue::Bytes(Cow::Owned(row.try_get::<Vec<u8>, _>(i)?))
            }

            // Text, enum, set, json and anything else: string first, raw bytes otherwise
            _ => match row.try_get::<String, _>(i) {
                Ok(s) => SqlValue::Text(Cow::Owned(s)),
                Err(_) => SqlValue::Bytes(Cow::Owned(row.try_get::<Vec<u8>, _>(i)?)),
            },
        };
        Ok(value)
    }

    /// Get the appropriate null type for a MySQL data type.
    fn null_type_for(data_type: &str) -> SqlNullType {
        match data_type {
            "boolean" | "bool" => SqlNullType::Bool,
            "tinyint" | "smallint" | "tinyint unsigned" => SqlNullType::I16,
            "mediumint" | "int" | "integer" | "smallint unsigned" | "year" => SqlNullType::I32,
            "bigint" | "mediumint unsigned" | "int unsigned" | "bigint unsigned" | "bit" => {
                SqlNullType::I64
            }
            "float" => SqlNullType::F32,
            "double" | "real" => SqlNullType::F64,
            "decimal" | "numeric" => SqlNullType::Decimal,
            "binary" | "varbinary" | "blob" | "tinyblob" | "mediumblob" | "longblob" => {
                SqlNullType::Bytes
            }
            "date" => SqlNullType::Date,
            "time" => SqlNullType::Time,
            "datetime" | "timestamp" => SqlNullType::DateTime,
            _ => SqlNullType::String,
        }
    }
}

#[async_trait]
impl TableReader for MysqlReader {
    async fn count(&self, table: &TableHandle) -> Result<i64> {
        let query = self.dialect.count_query(table);
        debug!("count: {}", query);

        let row: MySqlRow = sqlx::query(&query)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| ValidateError::query(table.qualified_name(), e))?;

        row.try_get::<i64, _>("cnt")
            .map_err(|e| ValidateError::query(table.qualified_name(), e))
    }

    async fn sample(&self, table: &TableHandle, opts: &SampleOptions) -> Result<SampleSet> {
        let query = self.dialect.sample_query(table, opts);
        debug!("sample: {}", query);

        let rows: Vec<MySqlRow> = sqlx::query(&query)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| ValidateError::query(table.qualified_name(), e))?;

        let columns = rows
            .first()
            .map(|r| r.columns().iter().map(|c| c.name().to_string()).collect())
            .unwrap_or_default();

        let values = rows
            .iter()
            .map(Self::row_to_values)
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(|e| ValidateError::query(table.qualified_name(), e))?;

        Ok(SampleSet::new(columns, values))
    }

    async fn test_connection(&self) -> Result<()> {
        sqlx::query("SELECT 1")
            .fetch_one(&self.pool)
            .await
            .map_err(|e| ValidateError::connection(e, "testing MySQL connection"))?;
        Ok(())
    }

    fn db_type(&self) -> &str {
        "mysql"
    }

    async fn close(&self) {
        self.pool.close().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_null_type_for() {
        assert_eq!(MysqlReader::null_type_for("int"), SqlNullType::I32);
        assert_eq!(MysqlReader::null_type_for("int unsigned"), SqlNullType::I64);
        assert_eq!(MysqlReader::null_type_for("varchar"), SqlNullType::String);
        assert_eq!(MysqlReader::null_type_for("datetime"), SqlNullType::DateTime);
        assert_eq!(MysqlReader::null_type_for("longblob"), SqlNullType::Bytes);
        assert_eq!(MysqlReader::null_type_for("boolean"), SqlNullType::Bool);
    }
}
