use chrono::{NaiveDate, NaiveTime};
use tracing::trace;

use crate::candidate::{Candidate, DecodeContext, Decoded, Satellite, SatellitePage};
use crate::channel::{Channel, EngineAttribute, EngineId, resolve_engine_instance};
use crate::priority::{
    AirTemperaturePriority, AltitudePriority, ApparentWindPriority, AtmospherePriority, DateTimePriority,
    DepthPriority, EnginePriority, HeadingMagneticPriority, HeadingTruePriority, LogPriority, MotionPriority,
    PositionPriority, Priority, RudderPriority, SatellitesInViewPriority, SatellitesUsedPriority,
    TrueWindAnglePriority, TrueWindDirectionPriority, TrueWindSpeedPriority, VariationPriority,
    WaterSpeedPriority, WaterTemperaturePriority,
};
use crate::units::{Unit, to_sided_angle};
use crate::utilities::normalize0_360;

use super::ais;
use super::sentence::{Sentence, SentenceBuffer};
use super::xdr::decode_xdr;

/// Turns NMEA0183 text into channel candidates.
#[derive(Debug, Default)]
pub struct SentenceDecoder {
    buffer: SentenceBuffer,
}

impl SentenceDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, text: &str) {
        self.buffer.push(text);
    }

    pub fn next_sentence(&mut self) -> Option<String> {
        self.buffer.next_sentence()
    }

    /// Candidates for one validated sentence; `None` for unsupported or unusable sentences.
    pub fn decode(&self, sentence: &Sentence, ctx: &DecodeContext) -> Option<Decoded> {
        let mut out = Decoded::default();
        if sentence.encapsulated {
            if sentence.kind == "VDO" {
                decode_vdo(sentence, &mut out);
            }
            return out.into_option();
        }
        match sentence.kind.as_str() {
            "DBT" => decode_dbt(sentence, ctx, &mut out),
            "DPT" => decode_dpt(sentence, ctx, &mut out),
            "GGA" => decode_gga(sentence, &mut out),
            "GLL" => decode_gll(sentence, &mut out),
            "GSV" => decode_gsv(sentence, &mut out),
            "HDG" => decode_hdg(sentence, &mut out),
            "HDM" => decode_hdm(sentence, &mut out),
            "HDT" => decode_hdt(sentence, &mut out),
            "MTA" => decode_temperature(sentence, Channel::AirTemperature, AirTemperaturePriority::Mta, &mut out),
            "MTW" => decode_temperature(sentence, Channel::WaterTemperature, WaterTemperaturePriority::Mtw, &mut out),
            "MDA" => decode_mda(sentence, &mut out),
            "VLW" => decode_vlw(sentence, &mut out),
            "MWD" => decode_mwd(sentence, ctx, &mut out),
            "MWV" => decode_mwv(sentence, &mut out),
            "RMC" => decode_rmc(sentence, &mut out),
            "RSA" => decode_rsa(sentence, &mut out),
            "VHW" => decode_vhw(sentence, &mut out),
            "VTG" => decode_vtg(sentence, ctx, &mut out),
            "VWR" => decode_relative_wind(sentence, Wind::Apparent, &mut out),
            "VWT" => decode_relative_wind(sentence, Wind::True, &mut out),
            "XDR" => out = decode_xdr(sentence, ctx),
            "ZDA" => decode_zda(sentence, &mut out),
            "RPM" => decode_rpm(sentence, ctx, &mut out),
            other => trace!("Ignoring {}{} sentence", sentence.talker, other),
        }
        out.into_option()
    }
}

/// First of several alternative readings that is present, converted to `target`.
fn first_reading(sentence: &Sentence, readings: &[(usize, Unit)], target: Unit) -> Option<f64> {
    readings
        .iter()
        .find_map(|(index, unit)| sentence.f64_at(*index).and_then(|value| unit.convert(value, target)))
}

/// Speed followed by its unit letter (K, M or N), in knots.
fn speed_at(sentence: &Sentence, index: usize) -> Option<f64> {
    let unit = match sentence.char_at(index + 1)? {
        'N' => Unit::Knots,
        'M' => Unit::MetersPerSecond,
        'K' => Unit::KilometersPerHour,
        _ => return None,
    };
    unit.convert(sentence.f64_at(index)?, Unit::Knots)
}

/// Magnitude with its E/W letter, east positive.
fn signed_east_at(sentence: &Sentence, index: usize) -> Option<f64> {
    let value = sentence.f64_at(index)?;
    match sentence.char_at(index + 1)? {
        'E' => Some(value),
        'W' => Some(-value),
        _ => None,
    }
}

fn status_ok(sentence: &Sentence, index: usize) -> bool {
    sentence.char_at(index) == Some('A')
}

fn push(out: &mut Decoded, channel: Channel, priority: impl Into<Priority>, value: Option<f64>) {
    if let Some(value) = value {
        out.push(Candidate::new(channel, priority, value));
    }
}

fn push_wind_angle(out: &mut Decoded, channel: Channel, priority: impl Into<Priority>, signed_deg: f64) {
    let (magnitude, side) = to_sided_angle(signed_deg);
    out.push(Candidate::with_unit(channel, priority, magnitude, side));
}

fn push_position(out: &mut Decoded, priority: PositionPriority, lat: Option<f64>, lon: Option<f64>) {
    if let (Some(lat), Some(lon)) = (lat, lon) {
        out.push(Candidate::new(Channel::Latitude, priority, lat));
        out.push(Candidate::new(Channel::Longitude, priority, lon));
    }
}

fn decode_dbt(sentence: &Sentence, ctx: &DecodeContext, out: &mut Decoded) {
    let depth = first_reading(sentence, &[(2, Unit::Meters), (0, Unit::Feet), (4, Unit::Fathoms)], Unit::Meters);
    push(out, Channel::Depth, DepthPriority::Dbt, depth.map(|depth| depth + ctx.config.depth_offset));
}

fn decode_dpt(sentence: &Sentence, ctx: &DecodeContext, out: &mut Decoded) {
    let depth = sentence
        .f64_at(0)
        .map(|depth| depth + sentence.f64_at(1).unwrap_or(0.0) + ctx.config.depth_offset);
    push(out, Channel::Depth, DepthPriority::Dpt, depth);
}

fn decode_gga(sentence: &Sentence, out: &mut Decoded) {
    let fix = sentence.u32_at(5).unwrap_or(0);
    if fix > 0 {
        push_position(out, PositionPriority::Gga, sentence.coordinate_at(1), sentence.coordinate_at(3));
        if sentence.char_at(9) == Some('M') {
            push(out, Channel::Altitude, AltitudePriority::Gga, sentence.f64_at(8));
        }
    }
    push(out, Channel::SatellitesUsed, SatellitesUsedPriority::Gga, sentence.u32_at(6).map(f64::from));
}

fn decode_gll(sentence: &Sentence, out: &mut Decoded) {
    if sentence.field(5).is_some() && !status_ok(sentence, 5) {
        return;
    }
    push_position(out, PositionPriority::Gll, sentence.coordinate_at(0), sentence.coordinate_at(2));
}

fn decode_gsv(sentence: &Sentence, out: &mut Decoded) {
    let (Some(page_count), Some(page), Some(in_view)) = (sentence.u32_at(0), sentence.u32_at(1), sentence.u32_at(2))
    else {
        return;
    };
    out.push(Candidate::new(Channel::SatellitesInView, SatellitesInViewPriority::Gsv, f64::from(in_view)));

    let satellites = (0..4)
        .map(|slot| 3 + slot * 4)
        .filter_map(|base| {
            Some(Satellite {
                prn: sentence.u32_at(base)?,
                elevation: sentence.f64_at(base + 1),
                azimuth: sentence.f64_at(base + 2),
                snr: sentence.f64_at(base + 3),
            })
        })
        .collect();
    out.satellites.push(SatellitePage {
        page,
        page_count,
        in_view,
        satellites,
        priority: SatellitesInViewPriority::Gsv.into(),
    });
}

fn decode_hdg(sentence: &Sentence, out: &mut Decoded) {
    let deviation = signed_east_at(sentence, 1).unwrap_or(0.0);
    let heading = sentence.f64_at(0).map(|heading| normalize0_360(heading + deviation));
    push(out, Channel::HeadingMagnetic, HeadingMagneticPriority::Hdg, heading);
    push(out, Channel::Variation, VariationPriority::Hdg, signed_east_at(sentence, 3));
}

fn decode_hdm(sentence: &Sentence, out: &mut Decoded) {
    push(out, Channel::HeadingMagnetic, HeadingMagneticPriority::Hdm, sentence.f64_at(0));
}

fn decode_hdt(sentence: &Sentence, out: &mut Decoded) {
    push(out, Channel::HeadingTrue, HeadingTruePriority::Hdt, sentence.f64_at(0));
}

fn temperature_at(sentence: &Sentence, index: usize) -> Option<f64> {
    let unit = match sentence.char_at(index + 1) {
        Some('F') => Unit::Fahrenheit,
        Some('K') => Unit::Kelvin,
        _ => Unit::Celsius,
    };
    unit.convert(sentence.f64_at(index)?, Unit::Celsius)
}

fn decode_temperature(sentence: &Sentence, channel: Channel, priority: impl Into<Priority>, out: &mut Decoded) {
    push(out, channel, priority, temperature_at(sentence, 0));
}

fn decode_mda(sentence: &Sentence, out: &mut Decoded) {
    let pressure = first_reading(sentence, &[(2, Unit::Bar), (0, Unit::InchesOfMercury)], Unit::Hectopascal);
    push(out, Channel::Pressure, AtmospherePriority::Mda, pressure);
    push(out, Channel::AirTemperature, AirTemperaturePriority::Mda, temperature_at(sentence, 4));
    push(out, Channel::WaterTemperature, WaterTemperaturePriority::Mda, temperature_at(sentence, 6));
    push(out, Channel::Humidity, AtmospherePriority::Mda, sentence.f64_at(8));
}

fn decode_vlw(sentence: &Sentence, out: &mut Decoded) {
    push(out, Channel::Log, LogPriority::Vlw, sentence.f64_at(0));
    push(out, Channel::TripLog, LogPriority::Vlw, sentence.f64_at(2));
}

fn decode_mwd(sentence: &Sentence, ctx: &DecodeContext, out: &mut Decoded) {
    if let Some(direction) = sentence.f64_at(0) {
        out.push(Candidate::new(
            Channel::TrueWindDirection,
            TrueWindDirectionPriority::MwdTrue,
            normalize0_360(direction),
        ));
    } else if let Some(direction) = sentence.f64_at(2).and_then(|magnetic| ctx.magnetic_to_true(magnetic)) {
        out.push(Candidate::new(Channel::TrueWindDirection, TrueWindDirectionPriority::MwdMagnetic, direction));
    }
    let speed = first_reading(sentence, &[(4, Unit::Knots), (6, Unit::MetersPerSecond)], Unit::Knots);
    push(out, Channel::TrueWindSpeed, TrueWindSpeedPriority::Mwd, speed);
}

fn decode_mwv(sentence: &Sentence, out: &mut Decoded) {
    if !status_ok(sentence, 4) {
        return;
    }
    let angle = sentence.f64_at(0);
    let speed = speed_at(sentence, 2);
    match sentence.char_at(1) {
        Some('R') => {
            if let Some(angle) = angle {
                push_wind_angle(out, Channel::ApparentWindAngle, ApparentWindPriority::Mwv, angle);
            }
            push(out, Channel::ApparentWindSpeed, ApparentWindPriority::Mwv, speed);
        }
        Some('T') => {
            if let Some(angle) = angle {
                push_wind_angle(out, Channel::TrueWindAngle, TrueWindAnglePriority::Mwv, angle);
            }
            push(out, Channel::TrueWindSpeed, TrueWindSpeedPriority::Mwv, speed);
        }
        _ => {}
    }
}

#[derive(Debug, Clone, Copy)]
enum Wind {
    Apparent,
    True,
}

fn decode_relative_wind(sentence: &Sentence, wind: Wind, out: &mut Decoded) {
    let (angle_channel, speed_channel, angle_priority, speed_priority): (Channel, Channel, Priority, Priority) =
        match wind {
            Wind::Apparent => (
                Channel::ApparentWindAngle,
                Channel::ApparentWindSpeed,
                ApparentWindPriority::Vwr.into(),
                ApparentWindPriority::Vwr.into(),
            ),
            Wind::True => (
                Channel::TrueWindAngle,
                Channel::TrueWindSpeed,
                TrueWindAnglePriority::Vwt.into(),
                TrueWindSpeedPriority::Vwt.into(),
            ),
        };
    let side = match sentence.char_at(1) {
        Some('L') => -1.0,
        Some('R') => 1.0,
        _ => return,
    };
    if let Some(angle) = sentence.f64_at(0) {
        push_wind_angle(out, angle_channel, angle_priority, side * angle);
    }
    let speed = first_reading(
        sentence,
        &[(2, Unit::Knots), (4, Unit::MetersPerSecond), (6, Unit::KilometersPerHour)],
        Unit::Knots,
    );
    push(out, speed_channel, speed_priority, speed);
}

fn decode_rmc(sentence: &Sentence, out: &mut Decoded) {
    if !status_ok(sentence, 1) {
        return;
    }
    push_position(out, PositionPriority::Rmc, sentence.coordinate_at(2), sentence.coordinate_at(4));
    push(out, Channel::SpeedOverGround, MotionPriority::Rmc, sentence.f64_at(6));
    push(out, Channel::CourseOverGround, MotionPriority::Rmc, sentence.f64_at(7).map(normalize0_360));
    push(out, Channel::Variation, VariationPriority::Rmc, signed_east_at(sentence, 9));
    let timestamp = sentence.field(8).zip(sentence.field(0)).and_then(|(date, time)| {
        let date = NaiveDate::parse_from_str(date, "%d%m%y").ok()?;
        Some(date.and_time(parse_time(time)?).and_utc().timestamp() as f64)
    });
    push(out, Channel::DateTime, DateTimePriority::Rmc, timestamp);
}

fn decode_rsa(sentence: &Sentence, out: &mut Decoded) {
    if status_ok(sentence, 1) {
        push(out, Channel::RudderAngle, RudderPriority::Rsa, sentence.f64_at(0));
    }
}

fn decode_vhw(sentence: &Sentence, out: &mut Decoded) {
    push(out, Channel::HeadingTrue, HeadingTruePriority::Vhw, sentence.f64_at(0));
    push(out, Channel::HeadingMagnetic, HeadingMagneticPriority::Vhw, sentence.f64_at(2));
    let speed = first_reading(sentence, &[(4, Unit::Knots), (6, Unit::KilometersPerHour)], Unit::Knots);
    push(out, Channel::SpeedThroughWater, WaterSpeedPriority::Vhw, speed);
}

fn decode_vtg(sentence: &Sentence, ctx: &DecodeContext, out: &mut Decoded) {
    if sentence.char_at(8) == Some('N') {
        return;
    }
    let course = sentence
        .f64_at(0)
        .map(normalize0_360)
        .or_else(|| sentence.f64_at(2).and_then(|magnetic| ctx.magnetic_to_true(magnetic)));
    push(out, Channel::CourseOverGround, MotionPriority::Vtg, course);
    let speed = first_reading(sentence, &[(4, Unit::Knots), (6, Unit::KilometersPerHour)], Unit::Knots);
    push(out, Channel::SpeedOverGround, MotionPriority::Vtg, speed);
}

/// `hhmmss` with optional fractional seconds.
fn parse_time(field: &str) -> Option<NaiveTime> {
    NaiveTime::parse_from_str(field, "%H%M%S%.f").ok()
}

fn decode_zda(sentence: &Sentence, out: &mut Decoded) {
    let timestamp = (|| {
        let time = parse_time(sentence.field(0)?)?;
        let date = NaiveDate::from_ymd_opt(sentence.u32_at(3)? as i32, sentence.u32_at(2)?, sentence.u32_at(1)?)?;
        Some(date.and_time(time).and_utc().timestamp() as f64)
    })();
    push(out, Channel::DateTime, DateTimePriority::Zda, timestamp);
}

fn decode_rpm(sentence: &Sentence, ctx: &DecodeContext, out: &mut Decoded) {
    if sentence.char_at(0) != Some('E') || !status_ok(sentence, 4) {
        return;
    }
    let engine = match sentence.u32_at(1) {
        Some(0) => resolve_engine_instance(0, ctx.config.dual_engine),
        Some(number) if number % 2 == 1 => Some(EngineId::Starboard),
        Some(_) => Some(EngineId::Port),
        None => None,
    };
    if let Some(engine) = engine {
        push(out, Channel::Engine(engine, EngineAttribute::Rpm), EnginePriority::Rpm, sentence.f64_at(2));
    }
}

fn decode_vdo(sentence: &Sentence, out: &mut Decoded) {
    // multi-fragment messages never carry a position report
    if sentence.u32_at(0) != Some(1) {
        return;
    }
    let Some(payload) = sentence.field(4) else {
        return;
    };
    let fill_bits = sentence.u32_at(5).unwrap_or(0) as usize;
    if let Some((lat, lon)) = ais::own_position(payload, fill_bits) {
        push_position(out, PositionPriority::Aivdo, Some(lat), Some(lon));
    }
}
