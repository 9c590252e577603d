use std::fmt;

use crate::units::Unit;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum EngineId {
    Main,
    Port,
    Starboard,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum EngineAttribute {
    Rpm,
    OilPressure,
    WaterTemperature,
    ExhaustTemperature,
    AlternatorVolts,
    Hours,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum FluidType {
    Fuel,
    FreshWater,
    WasteWater,
    LiveWell,
    Oil,
    BlackWater,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum BatteryId {
    Start,
    House,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum BatteryAttribute {
    Volts,
    Amps,
}

pub const ENGINES: [EngineId; 3] = [EngineId::Main, EngineId::Port, EngineId::Starboard];
pub const ENGINE_ATTRIBUTES: [EngineAttribute; 6] = [
    EngineAttribute::Rpm,
    EngineAttribute::OilPressure,
    EngineAttribute::WaterTemperature,
    EngineAttribute::ExhaustTemperature,
    EngineAttribute::AlternatorVolts,
    EngineAttribute::Hours,
];
pub const FLUID_TYPES: [FluidType; 6] = [
    FluidType::Fuel,
    FluidType::FreshWater,
    FluidType::WasteWater,
    FluidType::LiveWell,
    FluidType::Oil,
    FluidType::BlackWater,
];
pub const MAX_TANK_INSTANCE: u8 = 3;
pub const BATTERIES: [BatteryId; 2] = [BatteryId::Start, BatteryId::House];
pub const BATTERY_ATTRIBUTES: [BatteryAttribute; 2] = [BatteryAttribute::Volts, BatteryAttribute::Amps];

/// A logical navigation quantity with exactly one resolved value at a time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Channel {
    Latitude,
    Longitude,
    SpeedOverGround,
    CourseOverGround,
    SpeedThroughWater,
    HeadingTrue,
    HeadingMagnetic,
    Variation,
    Depth,
    ApparentWindAngle,
    ApparentWindSpeed,
    TrueWindAngle,
    TrueWindSpeed,
    TrueWindDirection,
    RudderAngle,
    Pitch,
    Heel,
    Altitude,
    SatellitesUsed,
    SatellitesInView,
    DateTime,
    Log,
    TripLog,
    AirTemperature,
    WaterTemperature,
    Pressure,
    Humidity,
    Engine(EngineId, EngineAttribute),
    /// Tank instance is 0..=3.
    Tank(FluidType, u8),
    Battery(BatteryId, BatteryAttribute),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WatchdogClass {
    Navigation,
    Ambient,
}

/// Channels in one group share a watchdog: accepting any member resets them all.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WatchdogGroup {
    Position,
    ApparentWind,
    Attitude,
    Engine(EngineId),
    Battery(BatteryId),
    Single(Channel),
}

impl WatchdogGroup {
    pub fn members(self) -> Vec<Channel> {
        match self {
            WatchdogGroup::Position => vec![Channel::Latitude, Channel::Longitude],
            WatchdogGroup::ApparentWind => vec![Channel::ApparentWindAngle, Channel::ApparentWindSpeed],
            WatchdogGroup::Attitude => vec![Channel::Pitch, Channel::Heel],
            WatchdogGroup::Engine(engine) => ENGINE_ATTRIBUTES
                .iter()
                .map(|attribute| Channel::Engine(engine, *attribute))
                .collect(),
            WatchdogGroup::Battery(battery) => BATTERY_ATTRIBUTES
                .iter()
                .map(|attribute| Channel::Battery(battery, *attribute))
                .collect(),
            WatchdogGroup::Single(channel) => vec![channel],
        }
    }
}

impl Channel {
    pub fn all() -> Vec<Channel> {
        let mut channels = vec![
            Channel::Latitude,
            Channel::Longitude,
            Channel::SpeedOverGround,
            Channel::CourseOverGround,
            Channel::SpeedThroughWater,
            Channel::HeadingTrue,
            Channel::HeadingMagnetic,
            Channel::Variation,
            Channel::Depth,
            Channel::ApparentWindAngle,
            Channel::ApparentWindSpeed,
            Channel::TrueWindAngle,
            Channel::TrueWindSpeed,
            Channel::TrueWindDirection,
            Channel::RudderAngle,
            Channel::Pitch,
            Channel::Heel,
            Channel::Altitude,
            Channel::SatellitesUsed,
            Channel::SatellitesInView,
            Channel::DateTime,
            Channel::Log,
            Channel::TripLog,
            Channel::AirTemperature,
            Channel::WaterTemperature,
            Channel::Pressure,
            Channel::Humidity,
        ];
        for engine in ENGINES {
            for attribute in ENGINE_ATTRIBUTES {
                channels.push(Channel::Engine(engine, attribute));
            }
        }
        for fluid in FLUID_TYPES {
            for instance in 0..=MAX_TANK_INSTANCE {
                channels.push(Channel::Tank(fluid, instance));
            }
        }
        for battery in BATTERIES {
            for attribute in BATTERY_ATTRIBUTES {
                channels.push(Channel::Battery(battery, attribute));
            }
        }
        channels
    }

    /// Unit values are stored in. Wind angles are stored as a 0–180 magnitude
    /// with the side carried by the update's unit (°L/°R); this returns °R for them.
    pub fn canonical_unit(self) -> Unit {
        match self {
            Channel::Latitude
            | Channel::Longitude
            | Channel::Variation
            | Channel::RudderAngle
            | Channel::Pitch
            | Channel::Heel => Unit::Degrees,
            Channel::CourseOverGround | Channel::HeadingTrue | Channel::TrueWindDirection => {
                Unit::DegreesTrue
            }
            Channel::HeadingMagnetic => Unit::DegreesMagnetic,
            Channel::ApparentWindAngle | Channel::TrueWindAngle => Unit::DegreesRight,
            Channel::SpeedOverGround
            | Channel::SpeedThroughWater
            | Channel::ApparentWindSpeed
            | Channel::TrueWindSpeed => Unit::Knots,
            Channel::Depth | Channel::Altitude => Unit::Meters,
            Channel::Log | Channel::TripLog => Unit::NauticalMiles,
            Channel::AirTemperature | Channel::WaterTemperature => Unit::Celsius,
            Channel::Pressure => Unit::Hectopascal,
            Channel::Humidity => Unit::Percent,
            Channel::SatellitesUsed | Channel::SatellitesInView => Unit::Count,
            Channel::DateTime => Unit::EpochSeconds,
            Channel::Engine(_, attribute) => match attribute {
                EngineAttribute::Rpm => Unit::Rpm,
                EngineAttribute::OilPressure => Unit::Bar,
                EngineAttribute::WaterTemperature | EngineAttribute::ExhaustTemperature => Unit::Celsius,
                EngineAttribute::AlternatorVolts => Unit::Volts,
                EngineAttribute::Hours => Unit::Hours,
            },
            Channel::Tank(..) => Unit::Percent,
            Channel::Battery(_, BatteryAttribute::Volts) => Unit::Volts,
            Channel::Battery(_, BatteryAttribute::Amps) => Unit::Amperes,
        }
    }

    pub fn is_wind_angle(self) -> bool {
        matches!(self, Channel::ApparentWindAngle | Channel::TrueWindAngle)
    }

    pub fn watchdog_class(self) -> WatchdogClass {
        match self {
            Channel::Latitude
            | Channel::Longitude
            | Channel::SpeedOverGround
            | Channel::CourseOverGround
            | Channel::SpeedThroughWater
            | Channel::HeadingTrue
            | Channel::HeadingMagnetic
            | Channel::Variation
            | Channel::Depth
            | Channel::ApparentWindAngle
            | Channel::ApparentWindSpeed
            | Channel::TrueWindAngle
            | Channel::TrueWindSpeed
            | Channel::TrueWindDirection
            | Channel::RudderAngle
            | Channel::Pitch
            | Channel::Heel => WatchdogClass::Navigation,
            _ => WatchdogClass::Ambient,
        }
    }

    pub fn watchdog_group(self) -> WatchdogGroup {
        match self {
            Channel::Latitude | Channel::Longitude => WatchdogGroup::Position,
            Channel::ApparentWindAngle | Channel::ApparentWindSpeed => WatchdogGroup::ApparentWind,
            Channel::Pitch | Channel::Heel => WatchdogGroup::Attitude,
            Channel::Engine(engine, _) => WatchdogGroup::Engine(engine),
            Channel::Battery(battery, _) => WatchdogGroup::Battery(battery),
            other => WatchdogGroup::Single(other),
        }
    }
}

fn engine_key(engine: EngineId) -> &'static str {
    match engine {
        EngineId::Main => "main",
        EngineId::Port => "port",
        EngineId::Starboard => "starboard",
    }
}

fn fluid_key(fluid: FluidType) -> &'static str {
    match fluid {
        FluidType::Fuel => "fuel",
        FluidType::FreshWater => "fresh_water",
        FluidType::WasteWater => "waste_water",
        FluidType::LiveWell => "live_well",
        FluidType::Oil => "oil",
        FluidType::BlackWater => "black_water",
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Channel::Engine(engine, attribute) => {
                let attribute = match attribute {
                    EngineAttribute::Rpm => "rpm",
                    EngineAttribute::OilPressure => "oil_pressure",
                    EngineAttribute::WaterTemperature => "water_temperature",
                    EngineAttribute::ExhaustTemperature => "exhaust_temperature",
                    EngineAttribute::AlternatorVolts => "alternator_volts",
                    EngineAttribute::Hours => "hours",
                };
                write!(f, "engine.{}.{}", engine_key(*engine), attribute)
            }
            Channel::Tank(fluid, instance) => write!(f, "tank.{}.{}", fluid_key(*fluid), instance),
            Channel::Battery(battery, attribute) => {
                let battery = match battery {
                    BatteryId::Start => "start",
                    BatteryId::House => "house",
                };
                let attribute = match attribute {
                    BatteryAttribute::Volts => "volts",
                    BatteryAttribute::Amps => "amps",
                };
                write!(f, "battery.{}.{}", battery, attribute)
            }
            scalar => {
                let key = match scalar {
                    Channel::Latitude => "latitude",
                    Channel::Longitude => "longitude",
                    Channel::SpeedOverGround => "sog",
                    Channel::CourseOverGround => "cog",
                    Channel::SpeedThroughWater => "stw",
                    Channel::HeadingTrue => "heading_true",
                    Channel::HeadingMagnetic => "heading_magnetic",
                    Channel::Variation => "variation",
                    Channel::Depth => "depth",
                    Channel::ApparentWindAngle => "awa",
                    Channel::ApparentWindSpeed => "aws",
                    Channel::TrueWindAngle => "twa",
                    Channel::TrueWindSpeed => "tws",
                    Channel::TrueWindDirection => "twd",
                    Channel::RudderAngle => "rudder",
                    Channel::Pitch => "pitch",
                    Channel::Heel => "heel",
                    Channel::Altitude => "altitude",
                    Channel::SatellitesUsed => "satellites_used",
                    Channel::SatellitesInView => "satellites_in_view",
                    Channel::DateTime => "date_time",
                    Channel::Log => "log",
                    Channel::TripLog => "trip_log",
                    Channel::AirTemperature => "air_temperature",
                    Channel::WaterTemperature => "water_temperature",
                    Channel::Pressure => "pressure",
                    Channel::Humidity => "humidity",
                    Channel::Engine(..) => "engine",
                    Channel::Tank(..) => "tank",
                    Channel::Battery(..) => "battery",
                };
                f.write_str(key)
            }
        }
    }
}

/// Maps a bus engine instance onto a named engine.
pub fn resolve_engine_instance(instance: u32, dual_engine: bool) -> Option<EngineId> {
    match instance {
        0 if dual_engine => Some(EngineId::Port),
        0 => Some(EngineId::Main),
        1 => Some(EngineId::Starboard),
        _ => None,
    }
}

/// Maps a battery instance onto a named bank.
pub fn resolve_battery_instance(instance: u32) -> Option<BatteryId> {
    match instance {
        0 => Some(BatteryId::Start),
        1 => Some(BatteryId::House),
        _ => None,
    }
}

pub fn tank_channel(fluid: FluidType, instance: u32) -> Option<Channel> {
    u8::try_from(instance)
        .ok()
        .filter(|instance| *instance <= MAX_TANK_INSTANCE)
        .map(|instance| Channel::Tank(fluid, instance))
}
