use chrono::{DateTime, TimeZone};
use serde::Deserialize;

pub const MAX_CONNECTIONS: usize = 3;
pub const NO_CONNECTIONS: &str = "No connections found.";
const TRAIN_EMOJI: char = '🚆';
const DEFAULT_VEHICLE: &str = "Train";

#[derive(thiserror::Error, Debug)]
pub enum DecodeError {
    #[error("{0}")]
    Json(#[from] serde_json::Error),

    #[error("The payload is not a JSON object")]
    NotAnObject,

    #[error("The \"connection\" field is not an array")]
    NotAnArray,

    #[error("Invalid epoch timestamp: {0}")]
    InvalidTimestamp(String),
}

#[derive(Deserialize)]
struct RawConnection {
    departure: RawDeparture,
    arrival: RawArrival,
}

#[derive(Deserialize)]
struct RawDeparture {
    time: String,
    vehicle: Option<String>,
}

#[derive(Deserialize)]
struct RawArrival {
    time: String,
}

/// A single journey option, as returned by the upstream API
#[derive(Debug, PartialEq, Eq)]
pub struct ConnectionRecord {
    pub departure: i64,
    pub arrival: i64,
    pub vehicle_label: String,
}

impl TryFrom<RawConnection> for ConnectionRecord {
    type Error = DecodeError;

    fn try_from(raw: RawConnection) -> Result<Self, Self::Error> {
        let vehicle = raw.departure.vehicle.as_deref().unwrap_or(DEFAULT_VEHICLE);

        Ok(Self {
            departure: parse_epoch(&raw.departure.time)?,
            arrival: parse_epoch(&raw.arrival.time)?,
            vehicle_label: vehicle_label(vehicle).to_owned(),
        })
    }
}

impl ConnectionRecord {
    pub fn render<Tz>(&self, tz: &Tz) -> Result<String, DecodeError>
    where
        Tz: TimeZone,
        Tz::Offset: std::fmt::Display,
    {
        Ok(format!(
            "{} {} dep {} arr {}",
            TRAIN_EMOJI,
            self.vehicle_label,
            wall_clock(self.departure, tz)?,
            wall_clock(self.arrival, tz)?,
        ))
    }
}

/// The reply body for the upstream payload, rendered in the local time zone
pub fn format_connections(payload: &[u8]) -> Result<String, DecodeError> {
    format_connections_in(payload, &chrono::Local)
}

pub fn format_connections_in<Tz>(payload: &[u8], tz: &Tz) -> Result<String, DecodeError>
where
    Tz: TimeZone,
    Tz::Offset: std::fmt::Display,
{
    let Some(records) = decode_connections(payload)? else {
        return Ok(NO_CONNECTIONS.to_owned());
    };

    let lines = records
        .iter()
        .map(|record| record.render(tz))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(lines.join("\n"))
}

/// Decodes the first [`MAX_CONNECTIONS`] records of the payload.
///
/// returns None if the payload has no "connection" field at all,
/// records past the first few are never inspected.
pub fn decode_connections(payload: &[u8]) -> Result<Option<Vec<ConnectionRecord>>, DecodeError> {
    let root: serde_json::Value = serde_json::from_slice(payload)?;
    let root = root.as_object().ok_or(DecodeError::NotAnObject)?;

    let Some(connections) = root.get("connection") else {
        return Ok(None);
    };

    let records = connections
        .as_array()
        .ok_or(DecodeError::NotAnArray)?
        .iter()
        .take(MAX_CONNECTIONS)
        .map(|connection| -> Result<ConnectionRecord, DecodeError> {
            let raw = RawConnection::deserialize(connection)?;
            ConnectionRecord::try_from(raw)
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(Some(records))
}

fn parse_epoch(time: &str) -> Result<i64, DecodeError> {
    time.parse::<u64>()
        .ok()
        .and_then(|epoch| i64::try_from(epoch).ok())
        .ok_or_else(|| DecodeError::InvalidTimestamp(time.to_owned()))
}

fn wall_clock<Tz>(epoch: i64, tz: &Tz) -> Result<String, DecodeError>
where
    Tz: TimeZone,
    Tz::Offset: std::fmt::Display,
{
    let utc = DateTime::from_timestamp(epoch, 0)
        .ok_or_else(|| DecodeError::InvalidTimestamp(epoch.to_string()))?;

    Ok(utc.with_timezone(tz).format("%H:%M").to_string())
}

fn vehicle_label(vehicle: &str) -> &str {
    vehicle.rsplit('.').next().unwrap_or(vehicle)
}
