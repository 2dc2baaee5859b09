//! Decoder — the standard sixbit message decoder.

use chrono::{NaiveDate, TimeZone, Utc};

use super::model::{
    BaseStationReport, DecodeError, DecodedMessage, MessageHeader, PositionReport, VesselClass,
};
use super::sixbit::Sixbit;
use super::traits::MessageDecoder;
use super::MAX_MESSAGE_ID;
use crate::sentence::Sentence;

const HEADER_BITS: usize = 38;
const POSITION_REPORT_BITS: usize = 168;
const BASE_STATION_BITS: usize = 168;

/// Decodes position reports (1, 2, 3, 18) and base station reports (4, 11);
/// all other valid ids decode to their header.
#[derive(Debug, Default, Clone, Copy)]
pub struct StandardDecoder;

impl MessageDecoder for StandardDecoder {
    fn decode(&self, sentence: &Sentence) -> Result<DecodedMessage, DecodeError> {
        let bits = Sixbit::decode(&sentence.payload, sentence.fill_bits)?;
        let header = read_header(&bits)?;

        match header.message_id {
            1..=3 => {
                require_bits(&bits, &header, POSITION_REPORT_BITS)?;
                class_a_report(&bits, header).map(DecodedMessage::Position)
            }
            18 => {
                require_bits(&bits, &header, POSITION_REPORT_BITS)?;
                class_b_report(&bits, header).map(DecodedMessage::Position)
            }
            4 | 11 => {
                require_bits(&bits, &header, BASE_STATION_BITS)?;
                base_station_report(&bits, header).map(DecodedMessage::BaseStation)
            }
            id if (1..=MAX_MESSAGE_ID).contains(&id) => Ok(DecodedMessage::Other(header)),
            id => Err(DecodeError::Semantic(format!("unknown message id {}", id))),
        }
    }
}

fn read_header(bits: &Sixbit) -> Result<MessageHeader, DecodeError> {
    if bits.len() < HEADER_BITS {
        return Err(DecodeError::Semantic(format!(
            "payload too short for a message header: {} bits",
            bits.len()
        )));
    }
    Ok(MessageHeader {
        message_id: bits.unsigned(0, 6)? as u8,
        repeat: bits.unsigned(6, 2)? as u8,
        mmsi: bits.unsigned(8, 30)? as u32,
    })
}

fn require_bits(bits: &Sixbit, header: &MessageHeader, needed: usize) -> Result<(), DecodeError> {
    if bits.len() < needed {
        return Err(DecodeError::Semantic(format!(
            "message {} needs {} bits, got {}",
            header.message_id,
            needed,
            bits.len()
        )));
    }
    Ok(())
}

fn speed(raw: u64) -> Option<f64> {
    (raw != 1023).then(|| raw as f64 / 10.0)
}

fn course(raw: u64) -> Option<f64> {
    (raw < 3600).then(|| raw as f64 / 10.0)
}

fn heading(raw: u64) -> Option<u16> {
    (raw < 360).then_some(raw as u16)
}

fn class_a_report(bits: &Sixbit, header: MessageHeader) -> Result<PositionReport, DecodeError> {
    Ok(PositionReport {
        header,
        class: VesselClass::A,
        navigational_status: Some(bits.unsigned(38, 4)? as u8),
        speed_over_ground: speed(bits.unsigned(50, 10)?),
        position_accuracy: bits.unsigned(60, 1)? == 1,
        raw_longitude: bits.signed(61, 28)? as i32,
        raw_latitude: bits.signed(89, 27)? as i32,
        course_over_ground: course(bits.unsigned(116, 12)?),
        true_heading: heading(bits.unsigned(128, 9)?),
        utc_second: bits.unsigned(137, 6)? as u8,
    })
}

fn class_b_report(bits: &Sixbit, header: MessageHeader) -> Result<PositionReport, DecodeError> {
    Ok(PositionReport {
        header,
        class: VesselClass::B,
        navigational_status: None,
        speed_over_ground: speed(bits.unsigned(46, 10)?),
        position_accuracy: bits.unsigned(56, 1)? == 1,
        raw_longitude: bits.signed(57, 28)? as i32,
        raw_latitude: bits.signed(85, 27)? as i32,
        course_over_ground: course(bits.unsigned(112, 12)?),
        true_heading: heading(bits.unsigned(124, 9)?),
        utc_second: bits.unsigned(133, 6)? as u8,
    })
}

fn base_station_report(bits: &Sixbit, header: MessageHeader) -> Result<BaseStationReport, DecodeError> {
    let year = bits.unsigned(38, 14)? as i32;
    let month = bits.unsigned(52, 4)? as u32;
    let day = bits.unsigned(56, 5)? as u32;
    let hour = bits.unsigned(61, 5)? as u32;
    let minute = bits.unsigned(66, 6)? as u32;
    let second = bits.unsigned(72, 6)? as u32;

    // Zero year/month/day and out-of-range fields mean "not available"
    let utc = NaiveDate::from_ymd_opt(year, month, day)
        .filter(|_| year != 0)
        .and_then(|date| date.and_hms_opt(hour, minute, second))
        .map(|naive| Utc.from_utc_datetime(&naive));

    Ok(BaseStationReport {
        header,
        utc,
        position_accuracy: bits.unsigned(78, 1)? == 1,
        raw_longitude: bits.signed(79, 28)? as i32,
        raw_latitude: bits.signed(107, 27)? as i32,
        fix_type: bits.unsigned(134, 4)? as u8,
    })
}
