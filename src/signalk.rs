//! SignalK delta messages to channel candidates.
//!
//! Values arrive in SI units (radians, kelvin, m/s, pascal, ratios) and are
//! converted to the canonical channel units. Only deltas about our own vessel
//! are used: a missing context, `vessels.self`, or `vessels.<self id>` where the
//! id is configured or learnt from the server's hello message.

use chrono::DateTime;
use serde::Deserialize;
use serde_json::Value;
use tracing::trace;

use crate::candidate::{Candidate, DecodeContext, Decoded, Satellite, paginate_satellites};
use crate::channel::{
    BatteryAttribute, BatteryId, Channel, EngineAttribute, EngineId, FluidType, resolve_battery_instance,
    resolve_engine_instance, tank_channel,
};
use crate::priority::{Priority, SatellitesInViewPriority, TrueWindDirectionPriority, signalk_priority};
use crate::units::{METERS_PER_NM, Unit, to_sided_angle};
use crate::utilities::normalize0_360;

#[derive(Debug, Deserialize)]
pub struct Delta {
    #[serde(rename = "self")]
    pub self_id: Option<String>,
    pub context: Option<String>,
    #[serde(default)]
    pub updates: Vec<Update>,
}

#[derive(Debug, Deserialize)]
pub struct Update {
    #[serde(default)]
    pub values: Vec<PathValue>,
}

#[derive(Debug, Deserialize)]
pub struct PathValue {
    pub path: String,
    #[serde(default)]
    pub value: Value,
}

fn vessel_id(raw: &str) -> &str {
    raw.strip_prefix("vessels.").unwrap_or(raw)
}

#[derive(Debug, Default)]
pub struct SignalKDecoder {
    learnt_self: Option<String>,
}

impl SignalKDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Own vessel id: configured, else learnt from the hello message.
    pub fn self_id<'a>(&'a self, ctx: &'a DecodeContext) -> Option<&'a str> {
        ctx.config
            .signalk_self
            .as_deref()
            .or(self.learnt_self.as_deref())
            .map(vessel_id)
    }

    fn is_own_vessel(&self, context: Option<&str>, ctx: &DecodeContext) -> bool {
        let Some(context) = context else {
            return true;
        };
        let id = vessel_id(context);
        id == "self" || self.self_id(ctx) == Some(id)
    }

    /// Candidates from one JSON message. Unparseable input, hello messages and
    /// deltas about other vessels produce `None`.
    pub fn decode(&mut self, text: &str, ctx: &DecodeContext) -> Option<Decoded> {
        let delta: Delta = match serde_json::from_str(text) {
            Ok(delta) => delta,
            Err(e) => {
                trace!("Dropping malformed SignalK message: {}", e);
                return None;
            }
        };
        if let Some(id) = &delta.self_id {
            if self.learnt_self.as_deref() != Some(id.as_str()) {
                trace!("SignalK server reports self as {}", id);
                self.learnt_self = Some(id.clone());
            }
        }
        if !self.is_own_vessel(delta.context.as_deref(), ctx) {
            trace!("Ignoring SignalK delta for {:?}", delta.context);
            return None;
        }

        let mut out = Decoded::default();
        for update in &delta.updates {
            for path_value in &update.values {
                if !path_value.value.is_null() {
                    decode_path(&path_value.path, &path_value.value, ctx, &mut out);
                }
            }
        }
        out.into_option()
    }
}

fn candidate(channel: Channel, value: f64) -> Candidate {
    Candidate::new(channel, signalk_priority(channel), value)
}

fn push(out: &mut Decoded, channel: Channel, value: Option<f64>) {
    if let Some(value) = value.filter(|value| value.is_finite()) {
        out.push(candidate(channel, value));
    }
}

fn push_wind_angle(out: &mut Decoded, channel: Channel, radians: Option<f64>) {
    if let Some(radians) = radians {
        let (magnitude, side) = to_sided_angle(radians.to_degrees());
        out.push(Candidate::with_unit(channel, signalk_priority(channel), magnitude, side));
    }
}

fn degrees(value: &Value) -> Option<f64> {
    value.as_f64().map(f64::to_degrees)
}

fn bearing(value: &Value) -> Option<f64> {
    degrees(value).map(normalize0_360)
}

fn knots(value: &Value) -> Option<f64> {
    Unit::MetersPerSecond.convert(value.as_f64()?, Unit::Knots)
}

fn celsius(value: &Value) -> Option<f64> {
    Unit::Kelvin.convert(value.as_f64()?, Unit::Celsius)
}

fn percent(value: &Value) -> Option<f64> {
    value.as_f64().map(|ratio| ratio * 100.0)
}

fn decode_path(path: &str, value: &Value, ctx: &DecodeContext, out: &mut Decoded) {
    let over_ground = ctx.config.true_wind_over_ground;
    match path {
        "navigation.position" => {
            let lat = value.get("latitude").and_then(Value::as_f64);
            let lon = value.get("longitude").and_then(Value::as_f64);
            if let (Some(lat), Some(lon)) = (lat, lon) {
                out.push(candidate(Channel::Latitude, lat));
                out.push(candidate(Channel::Longitude, lon));
            }
        }
        "navigation.speedOverGround" => push(out, Channel::SpeedOverGround, knots(value)),
        "navigation.courseOverGroundTrue" => push(out, Channel::CourseOverGround, bearing(value)),
        "navigation.courseOverGroundMagnetic" => push(
            out,
            Channel::CourseOverGround,
            degrees(value).and_then(|magnetic| ctx.magnetic_to_true(magnetic)),
        ),
        "navigation.speedThroughWater" => push(out, Channel::SpeedThroughWater, knots(value)),
        "navigation.headingTrue" => push(out, Channel::HeadingTrue, bearing(value)),
        "navigation.headingMagnetic" => push(out, Channel::HeadingMagnetic, bearing(value)),
        "navigation.magneticVariation" => push(out, Channel::Variation, degrees(value)),
        "navigation.attitude" => {
            push(out, Channel::Pitch, value.get("pitch").and_then(degrees));
            push(out, Channel::Heel, value.get("roll").and_then(degrees));
        }
        "navigation.gnss.antennaAltitude" => push(out, Channel::Altitude, value.as_f64()),
        "navigation.gnss.satellites" => push(out, Channel::SatellitesUsed, value.as_f64()),
        "navigation.gnss.satellitesInView" => decode_satellites(value, out),
        "navigation.datetime" => push(
            out,
            Channel::DateTime,
            value
                .as_str()
                .and_then(|text| DateTime::parse_from_rfc3339(text).ok())
                .map(|when| when.timestamp_millis() as f64 / 1000.0),
        ),
        "navigation.log" => push(out, Channel::Log, value.as_f64().map(|meters| meters / METERS_PER_NM)),
        "navigation.trip.log" => push(out, Channel::TripLog, value.as_f64().map(|meters| meters / METERS_PER_NM)),
        "environment.depth.belowTransducer" => push(
            out,
            Channel::Depth,
            value.as_f64().map(|depth| depth + ctx.config.depth_offset),
        ),
        "environment.wind.angleApparent" => push_wind_angle(out, Channel::ApparentWindAngle, value.as_f64()),
        "environment.wind.speedApparent" => push(out, Channel::ApparentWindSpeed, knots(value)),
        "environment.wind.angleTrueGround" if over_ground => {
            push_wind_angle(out, Channel::TrueWindAngle, value.as_f64())
        }
        "environment.wind.angleTrueWater" if !over_ground => {
            push_wind_angle(out, Channel::TrueWindAngle, value.as_f64())
        }
        "environment.wind.speedOverGround" if over_ground => push(out, Channel::TrueWindSpeed, knots(value)),
        "environment.wind.speedTrue" if !over_ground => push(out, Channel::TrueWindSpeed, knots(value)),
        "environment.wind.directionTrue" => push(out, Channel::TrueWindDirection, bearing(value)),
        "environment.wind.directionMagnetic" => {
            if let Some(direction) = degrees(value).and_then(|magnetic| ctx.magnetic_to_true(magnetic)) {
                out.push(Candidate::new(
                    Channel::TrueWindDirection,
                    TrueWindDirectionPriority::SignalKMagnetic,
                    direction,
                ));
            }
        }
        "environment.outside.temperature" => push(out, Channel::AirTemperature, celsius(value)),
        "environment.water.temperature" => push(out, Channel::WaterTemperature, celsius(value)),
        "environment.outside.pressure" => push(
            out,
            Channel::Pressure,
            value.as_f64().and_then(|pa| Unit::Pascal.convert(pa, Unit::Hectopascal)),
        ),
        "environment.outside.relativeHumidity" | "environment.outside.humidity" => {
            push(out, Channel::Humidity, percent(value))
        }
        "steering.rudderAngle" => push(out, Channel::RudderAngle, degrees(value)),
        _ => decode_indexed_path(path, value, ctx, out),
    }
}

/// Paths carrying an engine, tank or battery identifier.
fn decode_indexed_path(path: &str, value: &Value, ctx: &DecodeContext, out: &mut Decoded) {
    let segments: Vec<&str> = path.split('.').collect();
    match segments.as_slice() {
        ["propulsion", id, attribute] => {
            let Some(engine) = engine_for(id, ctx.config.dual_engine) else {
                return;
            };
            let (attribute, reading) = match *attribute {
                "revolutions" => (EngineAttribute::Rpm, value.as_f64().map(|hz| hz * 60.0)),
                "oilPressure" => (
                    EngineAttribute::OilPressure,
                    value.as_f64().and_then(|pa| Unit::Pascal.convert(pa, Unit::Bar)),
                ),
                "temperature" | "coolantTemperature" => (EngineAttribute::WaterTemperature, celsius(value)),
                "exhaustTemperature" => (EngineAttribute::ExhaustTemperature, celsius(value)),
                "alternatorVoltage" => (EngineAttribute::AlternatorVolts, value.as_f64()),
                "runTime" => (EngineAttribute::Hours, value.as_f64().map(|seconds| seconds / 3600.0)),
                _ => return,
            };
            push(out, Channel::Engine(engine, attribute), reading);
        }
        ["tanks", fluid, instance, "currentLevel"] => {
            let channel = fluid_for(fluid)
                .zip(instance.parse::<u32>().ok())
                .and_then(|(fluid, instance)| tank_channel(fluid, instance));
            if let Some(channel) = channel {
                push(out, channel, percent(value));
            }
        }
        ["electrical", "batteries", id, attribute] => {
            let Some(battery) = battery_for(id) else {
                return;
            };
            let attribute = match *attribute {
                "voltage" => BatteryAttribute::Volts,
                "current" => BatteryAttribute::Amps,
                _ => return,
            };
            push(out, Channel::Battery(battery, attribute), value.as_f64());
        }
        _ => trace!("Unhandled SignalK path {}", path),
    }
}

fn engine_for(id: &str, dual_engine: bool) -> Option<EngineId> {
    match id.to_ascii_lowercase().as_str() {
        "main" => Some(EngineId::Main),
        "port" => Some(EngineId::Port),
        "starboard" | "stbd" => Some(EngineId::Starboard),
        other => resolve_engine_instance(other.parse().ok()?, dual_engine),
    }
}

fn fluid_for(name: &str) -> Option<FluidType> {
    match name {
        "fuel" => Some(FluidType::Fuel),
        "freshWater" => Some(FluidType::FreshWater),
        "wasteWater" => Some(FluidType::WasteWater),
        "liveWell" => Some(FluidType::LiveWell),
        "lubrication" => Some(FluidType::Oil),
        "blackWater" => Some(FluidType::BlackWater),
        _ => None,
    }
}

fn battery_for(id: &str) -> Option<BatteryId> {
    match id.to_ascii_lowercase().as_str() {
        "start" | "starter" => Some(BatteryId::Start),
        "house" | "service" => Some(BatteryId::House),
        other => resolve_battery_instance(other.parse().ok()?),
    }
}

fn decode_satellites(value: &Value, out: &mut Decoded) {
    let satellites: Vec<Satellite> = value
        .get("satellites")
        .and_then(Value::as_array)
        .map(|list| {
            list.iter()
                .filter_map(|entry| {
                    Some(Satellite {
                        prn: u32::try_from(entry.get("id")?.as_u64()?).ok()?,
                        elevation: entry.get("elevation").and_then(degrees),
                        azimuth: entry.get("azimuth").and_then(bearing),
                        snr: entry.get("SNR").and_then(Value::as_f64),
                    })
                })
                .collect()
        })
        .unwrap_or_default();
    let in_view = value
        .get("count")
        .and_then(Value::as_u64)
        .and_then(|count| u32::try_from(count).ok())
        .unwrap_or(satellites.len() as u32);
    push(out, Channel::SatellitesInView, Some(f64::from(in_view)));
    let priority: Priority = SatellitesInViewPriority::SignalK.into();
    out.satellites.extend(paginate_satellites(satellites, in_view, priority));
}
