use nmea2k::N2kMessage;
use nmea2k::pgns::{FluidKind, HeadingReference, WindReference};
use tracing::trace;

use crate::candidate::{Candidate, DecodeContext, Decoded, Satellite, SourceId, paginate_satellites};
use crate::channel::{
    BatteryAttribute, Channel, EngineAttribute, FluidType, resolve_battery_instance, resolve_engine_instance,
    tank_channel,
};
use crate::priority::{
    AirTemperaturePriority, AltitudePriority, ApparentWindPriority, AtmospherePriority, AttitudePriority,
    BatteryPriority, DateTimePriority, DepthPriority, EnginePriority, HeadingMagneticPriority,
    HeadingTruePriority, LogPriority, MotionPriority, PositionPriority, Priority, RudderPriority,
    SatellitesInViewPriority, SatellitesUsedPriority, TankPriority, TrueWindAnglePriority,
    TrueWindDirectionPriority, TrueWindSpeedPriority, VariationPriority, WaterSpeedPriority,
    WaterTemperaturePriority,
};
use crate::units::{Unit, to_sided_angle};
use crate::utilities::normalize0_360;

/// Candidates from one decoded PGN, each tagged with the sending device.
struct PgnCandidates<'a> {
    address: u8,
    instance: u8,
    out: &'a mut Decoded,
}

impl PgnCandidates<'_> {
    fn push(&mut self, channel: Channel, priority: impl Into<Priority>, value: Option<f64>) {
        if let Some(value) = value {
            self.push_with_unit(channel, priority, value, channel.canonical_unit());
        }
    }

    fn push_with_unit(&mut self, channel: Channel, priority: impl Into<Priority>, value: f64, unit: Unit) {
        let source = SourceId {
            address: self.address,
            instance: self.instance,
        };
        self.out
            .push(Candidate::with_unit(channel, priority, value, unit).from_source(source));
    }

    fn push_wind_angle(&mut self, channel: Channel, priority: impl Into<Priority>, degrees: Option<f64>) {
        if let Some(degrees) = degrees {
            let (magnitude, side) = to_sided_angle(degrees);
            self.push_with_unit(channel, priority, magnitude, side);
        }
    }
}

fn fluid_type(kind: FluidKind) -> Option<FluidType> {
    match kind {
        FluidKind::Fuel => Some(FluidType::Fuel),
        FluidKind::FreshWater => Some(FluidType::FreshWater),
        FluidKind::WasteWater => Some(FluidType::WasteWater),
        FluidKind::LiveWell => Some(FluidType::LiveWell),
        FluidKind::Oil => Some(FluidType::Oil),
        FluidKind::BlackWater => Some(FluidType::BlackWater),
        FluidKind::Other(_) => None,
    }
}

fn kelvin_to_celsius(kelvin: Option<f64>) -> Option<f64> {
    kelvin.and_then(|kelvin| Unit::Kelvin.convert(kelvin, Unit::Celsius))
}

/// Maps NMEA2000 messages onto channels. Every candidate carries rank 1 on
/// its ladder and the `(address, instance)` of the device that sent it.
#[derive(Debug, Default)]
pub struct PgnDecoder;

impl PgnDecoder {
    pub fn new() -> Self {
        Self
    }

    pub fn decode(&self, source: u8, message: &N2kMessage, ctx: &DecodeContext) -> Option<Decoded> {
        let mut out = Decoded::default();
        let mut n2k = PgnCandidates {
            address: source,
            instance: 0,
            out: &mut out,
        };
        let config = &ctx.config;

        match message {
            N2kMessage::Rudder(rudder) => {
                n2k.instance = rudder.instance;
                n2k.push(Channel::RudderAngle, RudderPriority::Nmea2000, rudder.position_degrees());
            }
            N2kMessage::VesselHeading(heading) => {
                let degrees = heading.corrected_heading_degrees().map(normalize0_360);
                match heading.reference {
                    HeadingReference::True => n2k.push(Channel::HeadingTrue, HeadingTruePriority::Nmea2000, degrees),
                    HeadingReference::Magnetic => {
                        n2k.push(Channel::HeadingMagnetic, HeadingMagneticPriority::Nmea2000, degrees)
                    }
                    HeadingReference::Error | HeadingReference::Null => {}
                }
                n2k.push(
                    Channel::Variation,
                    VariationPriority::Nmea2000,
                    heading.variation.map(f64::to_degrees),
                );
            }
            N2kMessage::Attitude(attitude) => {
                n2k.push(Channel::Pitch, AttitudePriority::Nmea2000, attitude.pitch_degrees());
                n2k.push(Channel::Heel, AttitudePriority::Nmea2000, attitude.roll_degrees());
            }
            N2kMessage::MagneticVariation(variation) => {
                n2k.push(Channel::Variation, VariationPriority::Nmea2000, variation.variation_degrees());
            }
            N2kMessage::EngineRapidUpdate(engine) => {
                n2k.instance = engine.engine_instance;
                if let Some(id) = resolve_engine_instance(u32::from(engine.engine_instance), config.dual_engine) {
                    n2k.push(Channel::Engine(id, EngineAttribute::Rpm), EnginePriority::Nmea2000, engine.engine_speed);
                }
            }
            N2kMessage::EngineDynamic(engine) => {
                n2k.instance = engine.engine_instance;
                if let Some(id) = resolve_engine_instance(u32::from(engine.engine_instance), config.dual_engine) {
                    let oil_pressure = engine
                        .oil_pressure
                        .and_then(|pa| Unit::Pascal.convert(pa, Unit::Bar));
                    n2k.push(Channel::Engine(id, EngineAttribute::OilPressure), EnginePriority::Nmea2000, oil_pressure);
                    n2k.push(
                        Channel::Engine(id, EngineAttribute::WaterTemperature),
                        EnginePriority::Nmea2000,
                        kelvin_to_celsius(engine.coolant_temperature),
                    );
                    n2k.push(
                        Channel::Engine(id, EngineAttribute::AlternatorVolts),
                        EnginePriority::Nmea2000,
                        engine.alternator_potential,
                    );
                    n2k.push(Channel::Engine(id, EngineAttribute::Hours), EnginePriority::Nmea2000, engine.engine_hours());
                }
            }
            N2kMessage::FluidLevel(tank) => {
                n2k.instance = tank.instance;
                let channel = fluid_type(tank.fluid).and_then(|fluid| tank_channel(fluid, u32::from(tank.instance)));
                if let Some(channel) = channel {
                    n2k.push(channel, TankPriority::Nmea2000, tank.level);
                }
            }
            N2kMessage::BatteryStatus(battery) => {
                n2k.instance = battery.instance;
                if let Some(id) = resolve_battery_instance(u32::from(battery.instance)) {
                    n2k.push(Channel::Battery(id, BatteryAttribute::Volts), BatteryPriority::Nmea2000, battery.voltage);
                    n2k.push(Channel::Battery(id, BatteryAttribute::Amps), BatteryPriority::Nmea2000, battery.current);
                }
            }
            N2kMessage::SpeedWaterReferenced(speed) => {
                n2k.push(Channel::SpeedThroughWater, WaterSpeedPriority::Nmea2000, speed.speed_knots());
            }
            N2kMessage::WaterDepth(depth) => {
                let value = depth
                    .depth
                    .map(|below| below + depth.offset.unwrap_or(0.0) + config.depth_offset);
                n2k.push(Channel::Depth, DepthPriority::Nmea2000, value);
            }
            N2kMessage::DistanceLog(log) => {
                n2k.push(Channel::Log, LogPriority::Nmea2000, log.log_nm());
                n2k.push(Channel::TripLog, LogPriority::Nmea2000, log.trip_nm());
            }
            N2kMessage::PositionRapidUpdate(position) => {
                if let (Some(lat), Some(lon)) = (position.latitude, position.longitude) {
                    n2k.push(Channel::Latitude, PositionPriority::Nmea2000, Some(lat));
                    n2k.push(Channel::Longitude, PositionPriority::Nmea2000, Some(lon));
                }
            }
            N2kMessage::CogSogRapidUpdate(motion) => {
                let course = if motion.cog_reference {
                    motion.cog_degrees().map(normalize0_360)
                } else {
                    motion.cog_degrees().and_then(|magnetic| ctx.magnetic_to_true(magnetic))
                };
                n2k.push(Channel::CourseOverGround, MotionPriority::Nmea2000, course);
                n2k.push(Channel::SpeedOverGround, MotionPriority::Nmea2000, motion.sog_knots());
            }
            N2kMessage::GnssPositionData(gnss) => {
                if gnss.has_fix() {
                    if let (Some(lat), Some(lon)) = (gnss.latitude, gnss.longitude) {
                        n2k.push(Channel::Latitude, PositionPriority::Nmea2000, Some(lat));
                        n2k.push(Channel::Longitude, PositionPriority::Nmea2000, Some(lon));
                    }
                    n2k.push(Channel::Altitude, AltitudePriority::Nmea2000, gnss.altitude);
                }
                n2k.push(
                    Channel::SatellitesUsed,
                    SatellitesUsedPriority::Nmea2000,
                    gnss.num_svs.map(f64::from),
                );
                n2k.push(
                    Channel::DateTime,
                    DateTimePriority::Nmea2000,
                    gnss.date_time.as_ref().map(|when| when.to_unix_seconds()),
                );
            }
            N2kMessage::GnssSatsInView(sats) => {
                let Some(in_view) = sats.sats_in_view.map(u32::from) else {
                    return None;
                };
                n2k.push(Channel::SatellitesInView, SatellitesInViewPriority::Nmea2000, Some(f64::from(in_view)));
                let satellites = sats
                    .satellites
                    .iter()
                    .map(|sat| Satellite {
                        prn: u32::from(sat.prn),
                        elevation: sat.elevation,
                        azimuth: sat.azimuth,
                        snr: sat.snr,
                    })
                    .collect();
                let priority: Priority = SatellitesInViewPriority::Nmea2000.into();
                n2k.out
                    .satellites
                    .extend(paginate_satellites(satellites, in_view, priority));
            }
            N2kMessage::WindData(wind) => {
                let speed = wind.speed.and_then(|mps| Unit::MetersPerSecond.convert(mps, Unit::Knots));
                let angle = wind.angle_degrees();
                let true_relative = if config.true_wind_over_ground {
                    WindReference::TrueBoat
                } else {
                    WindReference::TrueWater
                };
                match wind.reference {
                    WindReference::Apparent => {
                        n2k.push_wind_angle(Channel::ApparentWindAngle, ApparentWindPriority::Nmea2000, angle);
                        n2k.push(Channel::ApparentWindSpeed, ApparentWindPriority::Nmea2000, speed);
                    }
                    reference if reference == true_relative => {
                        n2k.push_wind_angle(Channel::TrueWindAngle, TrueWindAnglePriority::Nmea2000, angle);
                        n2k.push(Channel::TrueWindSpeed, TrueWindSpeedPriority::Nmea2000, speed);
                    }
                    WindReference::TrueGroundNorth => {
                        n2k.push(
                            Channel::TrueWindDirection,
                            TrueWindDirectionPriority::Nmea2000True,
                            angle.map(normalize0_360),
                        );
                        if config.true_wind_over_ground {
                            n2k.push(Channel::TrueWindSpeed, TrueWindSpeedPriority::Nmea2000, speed);
                        }
                    }
                    WindReference::Magnetic => {
                        n2k.push(
                            Channel::TrueWindDirection,
                            TrueWindDirectionPriority::Nmea2000Magnetic,
                            angle.and_then(|magnetic| ctx.magnetic_to_true(magnetic)),
                        );
                    }
                    other => trace!("Ignoring wind reference {:?} from {}", other, source),
                }
            }
            N2kMessage::EnvironmentalParameters(environment) => {
                n2k.push(
                    Channel::WaterTemperature,
                    WaterTemperaturePriority::Nmea2000,
                    environment.water_temperature_celsius(),
                );
                n2k.push(
                    Channel::AirTemperature,
                    AirTemperaturePriority::Nmea2000,
                    environment.air_temperature_celsius(),
                );
                n2k.push(Channel::Pressure, AtmospherePriority::Nmea2000, environment.pressure_hpa());
            }
            N2kMessage::Humidity(humidity) => {
                n2k.instance = humidity.instance;
                n2k.push(Channel::Humidity, AtmospherePriority::Nmea2000, humidity.actual_humidity);
            }
            N2kMessage::Unknown(pgn, _) => trace!("No channels for PGN {} from {}", pgn, source),
        }
        out.into_option()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::channel::{BatteryId, EngineId};
    use crate::config::FusionConfig;
    use approx::assert_abs_diff_eq;
    use std::sync::Arc;

    fn context_with(config: FusionConfig) -> DecodeContext {
        DecodeContext::new(Arc::new(config))
    }

    fn decode(pgn: u32, data: &[u8], ctx: &DecodeContext) -> Decoded {
        PgnDecoder::new()
            .decode(42, &N2kMessage::from_pgn(pgn, data), ctx)
            .unwrap_or_default()
    }

    fn wind(speed_cms: u16, angle_e4: u16, reference: u8) -> Vec<u8> {
        let mut data = vec![0x01];
        data.extend_from_slice(&speed_cms.to_le_bytes());
        data.extend_from_slice(&angle_e4.to_le_bytes());
        data.extend_from_slice(&[0xF8 | reference, 0xFF, 0xFF]);
        data
    }

    #[test]
    fn test_rudder_carries_source() {
        let data = [0x02, 0xFF, 0xFF, 0x7F, 0xD1, 0x06, 0xFF, 0xFF];
        let decoded = decode(127245, &data, &context_with(FusionConfig::default()));
        let rudder = &decoded.candidates[0];
        assert_eq!(rudder.channel, Channel::RudderAngle);
        assert_eq!(rudder.source, Some(SourceId { address: 42, instance: 2 }));
        assert_eq!(rudder.priority.rank(), 1);
        assert_abs_diff_eq!(rudder.value, 10.0, epsilon = 0.01);
    }

    #[test]
    fn test_apparent_wind_port_side() {
        // 5.14 m/s from 315°
        let decoded = decode(130306, &wind(514, 54978, 2), &context_with(FusionConfig::default()));
        assert_eq!(decoded.candidates.len(), 2);
        assert_eq!(decoded.candidates[0].channel, Channel::ApparentWindAngle);
        assert_eq!(decoded.candidates[0].unit, Unit::DegreesLeft);
        assert_abs_diff_eq!(decoded.candidates[0].value, 45.0, epsilon = 0.01);
        assert_abs_diff_eq!(decoded.candidates[1].value, 9.991, epsilon = 0.001);
    }

    #[test]
    fn test_true_wind_reference_follows_over_ground() {
        let ground = context_with(FusionConfig {
            true_wind_over_ground: true,
            ..FusionConfig::default()
        });
        let water = context_with(FusionConfig {
            true_wind_over_ground: false,
            ..FusionConfig::default()
        });
        assert_eq!(decode(130306, &wind(500, 5236, 3), &ground).candidates.len(), 2);
        assert!(decode(130306, &wind(500, 5236, 3), &water).is_empty());
        let decoded = decode(130306, &wind(500, 5236, 4), &water);
        assert_eq!(decoded.candidates[0].channel, Channel::TrueWindAngle);
        assert_abs_diff_eq!(decoded.candidates[0].value, 30.0, epsilon = 0.01);
    }

    #[test]
    fn test_ground_referenced_wind_direction() {
        let ground = context_with(FusionConfig {
            true_wind_over_ground: true,
            ..FusionConfig::default()
        });
        let decoded = decode(130306, &wind(500, 31416, 0), &ground);
        assert_eq!(decoded.candidates[0].channel, Channel::TrueWindDirection);
        assert_eq!(decoded.candidates[0].priority, Priority::from(TrueWindDirectionPriority::Nmea2000True));
        assert_abs_diff_eq!(decoded.candidates[0].value, 180.0, epsilon = 0.01);
        assert_eq!(decoded.candidates[1].channel, Channel::TrueWindSpeed);

        let mut magnetic = context_with(FusionConfig::default());
        assert!(decode(130306, &wind(500, 31416, 1), &magnetic).is_empty());
        magnetic.variation = Some(-10.0);
        let decoded = decode(130306, &wind(500, 31416, 1), &magnetic);
        assert_eq!(decoded.candidates[0].priority, Priority::from(TrueWindDirectionPriority::Nmea2000Magnetic));
        assert_abs_diff_eq!(decoded.candidates[0].value, 170.0, epsilon = 0.01);
    }

    #[test]
    fn test_magnetic_heading_with_variation() {
        // 90° magnetic, no deviation, variation 2° east
        let mut data = vec![0x01];
        data.extend_from_slice(&15708u16.to_le_bytes());
        data.extend_from_slice(&[0xFF, 0x7F]);
        data.extend_from_slice(&349i16.to_le_bytes());
        data.push(0xFD);
        let decoded = decode(127250, &data, &context_with(FusionConfig::default()));
        assert_eq!(decoded.candidates[0].channel, Channel::HeadingMagnetic);
        assert_abs_diff_eq!(decoded.candidates[0].value, 90.0, epsilon = 0.01);
        assert_eq!(decoded.candidates[1].channel, Channel::Variation);
        assert_abs_diff_eq!(decoded.candidates[1].value, 2.0, epsilon = 0.01);
    }

    #[test]
    fn test_engine_instance_mapping() {
        let mut data = vec![0x00];
        data.extend_from_slice(&(1800u16 * 4).to_le_bytes());
        data.extend_from_slice(&[0xFF, 0xFF, 0x7F, 0xFF, 0xFF]);
        let single = decode(127488, &data, &context_with(FusionConfig::default()));
        assert_eq!(single.candidates[0].channel, Channel::Engine(EngineId::Main, EngineAttribute::Rpm));
        assert_abs_diff_eq!(single.candidates[0].value, 1800.0);

        let dual = context_with(FusionConfig {
            dual_engine: true,
            ..FusionConfig::default()
        });
        assert_eq!(
            decode(127488, &data, &dual).candidates[0].channel,
            Channel::Engine(EngineId::Port, EngineAttribute::Rpm)
        );
        data[0] = 2;
        assert!(decode(127488, &data, &dual).is_empty());
    }

    #[test]
    fn test_fluid_and_battery() {
        // fresh water tank 1 at 50 %
        let mut tank = vec![0x11];
        tank.extend_from_slice(&12500i16.to_le_bytes());
        tank.extend_from_slice(&1000u32.to_le_bytes());
        tank.push(0xFF);
        let decoded = decode(127505, &tank, &context_with(FusionConfig::default()));
        assert_eq!(decoded.candidates[0].channel, Channel::Tank(FluidType::FreshWater, 1));
        assert_abs_diff_eq!(decoded.candidates[0].value, 50.0, epsilon = 1e-9);

        let mut battery = vec![0x01];
        battery.extend_from_slice(&1265i16.to_le_bytes());
        battery.extend_from_slice(&(-52i16).to_le_bytes());
        battery.extend_from_slice(&[0xFF, 0xFF, 0x00]);
        let decoded = decode(127508, &battery, &context_with(FusionConfig::default()));
        assert_eq!(decoded.candidates.len(), 2);
        assert_eq!(decoded.candidates[0].channel, Channel::Battery(BatteryId::House, BatteryAttribute::Volts));
        assert_abs_diff_eq!(decoded.candidates[0].value, 12.65, epsilon = 1e-9);
        assert_abs_diff_eq!(decoded.candidates[1].value, -5.2, epsilon = 1e-9);
    }

    #[test]
    fn test_depth_offsets() {
        let mut data = vec![0x07];
        data.extend_from_slice(&1000u32.to_le_bytes());
        data.extend_from_slice(&(-500i16).to_le_bytes());
        data.push(0xFF);
        let ctx = context_with(FusionConfig {
            depth_offset: 0.2,
            ..FusionConfig::default()
        });
        let decoded = decode(128267, &data, &ctx);
        assert_abs_diff_eq!(decoded.candidates[0].value, 9.7, epsilon = 1e-9);
    }

    #[test]
    fn test_unknown_pgn() {
        assert!(decode(65280, &[0u8; 8], &context_with(FusionConfig::default())).is_empty());
    }
}
