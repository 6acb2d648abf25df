//! Timestamp, date, time and duration codecs.

use chrono::{DateTime, Duration, NaiveDate, NaiveTime, Timelike, Utc};

use crate::error::{CqlError, Result};
use crate::protocol::ProtocolVersion;
use crate::serialization::codec::{fixed_width, value_mismatch, TypeCodec};
use crate::serialization::wire::{WireReader, WireWriter};
use crate::types::{ColumnInfo, ColumnTypeCode, CqlDuration, NativeType, Value};

/// Day number of 1970-01-01 in the `date` encoding.
const DATE_EPOCH_CENTER: i64 = 1 << 31;

/// Custom type name under which result metadata describes `duration`.
pub const DURATION_CLASS_NAME: &str = "org.apache.cassandra.db.marshal.DurationType";

const NANOS_PER_SECOND: i64 = 1_000_000_000;
const NANOS_PER_DAY: i64 = 86_400 * NANOS_PER_SECOND;

fn unix_epoch_date() -> Result<NaiveDate> {
    NaiveDate::from_ymd_opt(1970, 1, 1)
        .ok_or_else(|| CqlError::MalformedData("unix epoch out of range".to_string()))
}

/// `timestamp`: milliseconds since the Unix epoch.
#[derive(Debug, Clone, Copy, Default)]
pub struct TimestampCodec;

impl TypeCodec for TimestampCodec {
    fn cql_type(&self) -> ColumnTypeCode {
        ColumnTypeCode::Timestamp
    }

    fn native_type(&self) -> NativeType {
        NativeType::Timestamp
    }

    fn serialize(&self, _: ProtocolVersion, value: &Value, _: Option<&ColumnInfo>) -> Result<Vec<u8>> {
        match value {
            Value::Timestamp(ts) => Ok(ts.timestamp_millis().to_be_bytes().to_vec()),
            other => Err(value_mismatch(self.cql_type(), other)),
        }
    }

    fn deserialize(&self, _: ProtocolVersion, data: &[u8], _: Option<&ColumnInfo>) -> Result<Value> {
        let millis = i64::from_be_bytes(fixed_width::<8>(data, self.cql_type())?);
        DateTime::<Utc>::from_timestamp_millis(millis)
            .map(Value::Timestamp)
            .ok_or_else(|| {
                CqlError::MalformedData(format!("timestamp {} ms is out of range", millis))
            })
    }
}

/// `date`: unsigned days with the Unix epoch at 2^31.
#[derive(Debug, Clone, Copy, Default)]
pub struct DateCodec;

impl TypeCodec for DateCodec {
    fn cql_type(&self) -> ColumnTypeCode {
        ColumnTypeCode::Date
    }

    fn native_type(&self) -> NativeType {
        NativeType::Date
    }

    fn serialize(&self, _: ProtocolVersion, value: &Value, _: Option<&ColumnInfo>) -> Result<Vec<u8>> {
        let date = match value {
            Value::Date(d) => d,
            other => return Err(value_mismatch(self.cql_type(), other)),
        };
        let days = date.signed_duration_since(unix_epoch_date()?).num_days() + DATE_EPOCH_CENTER;
        let raw = u32::try_from(days)
            .map_err(|_| CqlError::InvalidType(format!("date {} is out of range", date)))?;
        Ok(raw.to_be_bytes().to_vec())
    }

    fn deserialize(&self, _: ProtocolVersion, data: &[u8], _: Option<&ColumnInfo>) -> Result<Value> {
        let raw = u32::from_be_bytes(fixed_width::<4>(data, self.cql_type())?);
        let days = i64::from(raw) - DATE_EPOCH_CENTER;
        unix_epoch_date()?
            .checked_add_signed(Duration::days(days))
            .map(Value::Date)
            .ok_or_else(|| CqlError::MalformedData(format!("date {} days is out of range", days)))
    }
}

/// `time`: nanoseconds since midnight.
#[derive(Debug, Clone, Copy, Default)]
pub struct TimeCodec;

impl TypeCodec for TimeCodec {
    fn cql_type(&self) -> ColumnTypeCode {
        ColumnTypeCode::Time
    }

    fn native_type(&self) -> NativeType {
        NativeType::Time
    }

    fn serialize(&self, _: ProtocolVersion, value: &Value, _: Option<&ColumnInfo>) -> Result<Vec<u8>> {
        let time = match value {
            Value::Time(t) => t,
            other => return Err(value_mismatch(self.cql_type(), other)),
        };
        let nanos = i64::from(time.num_seconds_from_midnight()) * NANOS_PER_SECOND
            + i64::from(time.nanosecond());
        if nanos >= NANOS_PER_DAY {
            return Err(CqlError::InvalidType(format!(
                "time {} falls in a leap second",
                time
            )));
        }
        Ok(nanos.to_be_bytes().to_vec())
    }

    fn deserialize(&self, _: ProtocolVersion, data: &[u8], _: Option<&ColumnInfo>) -> Result<Value> {
        let nanos = i64::from_be_bytes(fixed_width::<8>(data, self.cql_type())?);
        if !(0..NANOS_PER_DAY).contains(&nanos) {
            return Err(CqlError::MalformedData(format!(
                "time {} ns is outside one day",
                nanos
            )));
        }
        let secs = (nanos / NANOS_PER_SECOND) as u32;
        let frac = (nanos % NANOS_PER_SECOND) as u32;
        NaiveTime::from_num_seconds_from_midnight_opt(secs, frac)
            .map(Value::Time)
            .ok_or_else(|| CqlError::MalformedData(format!("time {} ns is invalid", nanos)))
    }
}

/// `duration`: months, days and nanoseconds as three zigzag vints.
///
/// Only available from protocol V4.
#[derive(Debug, Clone, Copy, Default)]
pub struct DurationCodec;

impl DurationCodec {
    fn check_version(version: ProtocolVersion) -> Result<()> {
        if version.supports_duration() {
            Ok(())
        } else {
            Err(CqlError::InvalidType(format!(
                "duration is not supported by protocol {}",
                version
            )))
        }
    }
}

impl TypeCodec for DurationCodec {
    fn cql_type(&self) -> ColumnTypeCode {
        ColumnTypeCode::Duration
    }

    fn native_type(&self) -> NativeType {
        NativeType::Duration
    }

    fn serialize(&self, version: ProtocolVersion, value: &Value, _: Option<&ColumnInfo>) -> Result<Vec<u8>> {
        Self::check_version(version)?;
        let duration = match value {
            Value::Duration(d) => d,
            other => return Err(value_mismatch(self.cql_type(), other)),
        };
        let mut output = WireWriter::with_capacity(12);
        output.write_vint(i64::from(duration.months));
        output.write_vint(i64::from(duration.days));
        output.write_vint(duration.nanoseconds);
        Ok(output.into_bytes())
    }

    fn deserialize(&self, version: ProtocolVersion, data: &[u8], _: Option<&ColumnInfo>) -> Result<Value> {
        Self::check_version(version)?;
        let mut input = WireReader::new(data);
        let months = narrow_i32(input.read_vint()?, "months")?;
        let days = narrow_i32(input.read_vint()?, "days")?;
        let nanoseconds = input.read_vint()?;
        Ok(Value::Duration(CqlDuration::new(months, days, nanoseconds)))
    }
}

fn narrow_i32(value: i64, field: &str) -> Result<i32> {
    i32::try_from(value).map_err(|_| {
        CqlError::MalformedData(format!("duration {} {} does not fit in 32 bits", field, value))
    })
}
