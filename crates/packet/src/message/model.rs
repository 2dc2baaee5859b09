use chrono::{DateTime, Utc};
use thiserror::Error;

/// Longitude/latitude "not available" sentinels, in 1/10000 minute.
pub const LONGITUDE_NOT_AVAILABLE: i32 = 181 * 600_000;
pub const LATITUDE_NOT_AVAILABLE: i32 = 91 * 600_000;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    /// The payload could not be read as sixbit data
    #[error("Malformed payload: {0}")]
    MalformedPayload(String),

    /// The bits were readable but do not form a valid message
    #[error("Message decode error: {0}")]
    Semantic(String),
}

/// A geographic position in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Location {
    pub latitude: f64,
    pub longitude: f64,
}

impl Location {
    /// Build from raw AIS coordinates (1/10000 minute). `None` for the
    /// "not available" sentinels and anything out of range.
    pub fn from_raw(raw_longitude: i32, raw_latitude: i32) -> Option<Self> {
        if raw_longitude == LONGITUDE_NOT_AVAILABLE || raw_latitude == LATITUDE_NOT_AVAILABLE {
            return None;
        }
        let longitude = f64::from(raw_longitude) / 600_000.0;
        let latitude = f64::from(raw_latitude) / 600_000.0;
        if !(-180.0..=180.0).contains(&longitude) || !(-90.0..=90.0).contains(&latitude) {
            return None;
        }
        Some(Self { latitude, longitude })
    }
}

/// A location paired with the packet's best timestamp.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PositionTime {
    pub location: Location,
    /// Milliseconds since epoch, `-1` if the packet carries no time
    pub timestamp_ms: i64,
}

/// Facet of messages that report a position.
pub trait PositionCapable {
    fn location(&self) -> Option<Location>;
}

/// Fields common to every AIS message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MessageHeader {
    pub message_id: u8,
    pub repeat: u8,
    pub mmsi: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VesselClass {
    /// Messages 1, 2 and 3
    A,
    /// Message 18
    B,
}

/// Class A and Class B position reports.
#[derive(Debug, Clone, PartialEq)]
pub struct PositionReport {
    pub header: MessageHeader,
    pub class: VesselClass,
    /// Class A only
    pub navigational_status: Option<u8>,
    /// Knots
    pub speed_over_ground: Option<f64>,
    /// Degrees
    pub course_over_ground: Option<f64>,
    pub true_heading: Option<u16>,
    pub position_accuracy: bool,
    pub raw_longitude: i32,
    pub raw_latitude: i32,
    pub utc_second: u8,
}

impl PositionCapable for PositionReport {
    fn location(&self) -> Option<Location> {
        Location::from_raw(self.raw_longitude, self.raw_latitude)
    }
}

/// Base station report (message 4) and UTC/date response (message 11).
#[derive(Debug, Clone, PartialEq)]
pub struct BaseStationReport {
    pub header: MessageHeader,
    pub utc: Option<DateTime<Utc>>,
    pub position_accuracy: bool,
    pub raw_longitude: i32,
    pub raw_latitude: i32,
    pub fix_type: u8,
}

impl PositionCapable for BaseStationReport {
    fn location(&self) -> Option<Location> {
        Location::from_raw(self.raw_longitude, self.raw_latitude)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum DecodedMessage {
    Position(PositionReport),
    BaseStation(BaseStationReport),
    /// Any other message id; only the header is decoded
    Other(MessageHeader),
}

impl DecodedMessage {
    pub fn header(&self) -> &MessageHeader {
        match self {
            DecodedMessage::Position(m) => &m.header,
            DecodedMessage::BaseStation(m) => &m.header,
            DecodedMessage::Other(h) => h,
        }
    }

    pub fn message_id(&self) -> u8 {
        self.header().message_id
    }

    pub fn mmsi(&self) -> u32 {
        self.header().mmsi
    }

    /// The position capability, if this message has one.
    pub fn as_position(&self) -> Option<&dyn PositionCapable> {
        match self {
            DecodedMessage::Position(m) => Some(m),
            DecodedMessage::BaseStation(m) => Some(m),
            DecodedMessage::Other(_) => None,
        }
    }
}
