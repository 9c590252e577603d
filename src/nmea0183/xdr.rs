//! XDR transducer measurements.
//!
//! Each quadruple `type,value,unit,name` is matched against [`XDR_RULES`]: the
//! transducer type letter must agree and the name must fit the rule's pattern
//! (case-insensitive). Vendors disagree on names, so the table carries the
//! NMEA 0183 v4.11 scheme, TwoCan's fixed engine names and the ShipModul /
//! Maretron indexed names side by side.

use tracing::trace;

use crate::candidate::{Candidate, DecodeContext, Decoded};
use crate::channel::{
    BatteryAttribute, Channel, EngineAttribute, EngineId, FluidType, resolve_battery_instance,
    resolve_engine_instance, tank_channel,
};
use crate::priority::{
    AirTemperaturePriority, AtmospherePriority, AttitudePriority, BatteryPriority, EnginePriority, Priority,
    TankPriority, WaterTemperaturePriority,
};
use crate::units::Unit;

use super::sentence::Sentence;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NamePattern {
    /// Whole name, instance 0
    Exact(&'static str),
    /// Prefix followed by the instance number, e.g. `ENGINE#1`, `ENGRPM0`
    Indexed(&'static str),
    /// Name containing the text anywhere, instance 0
    Contains(&'static str),
}

impl NamePattern {
    /// Instance encoded in `name` when it fits the pattern.
    pub fn matches(self, name: &str) -> Option<u32> {
        let name = name.to_ascii_uppercase();
        match self {
            NamePattern::Exact(expected) => (name == expected).then_some(0),
            NamePattern::Indexed(prefix) => {
                let digits = name.strip_prefix(prefix)?;
                if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
                    return None;
                }
                digits.parse().ok()
            }
            NamePattern::Contains(fragment) => name.contains(fragment).then_some(0),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineSlot {
    /// Engine named outright (TwoCan)
    Named(EngineId),
    /// Engine resolved from the name's instance number
    Instance,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum XdrTarget {
    Engine(EngineSlot, EngineAttribute),
    Tank(FluidType),
    Battery(BatteryAttribute),
    AirTemperature,
    WaterTemperature,
    Pressure,
    Humidity,
    Pitch,
    Heel,
}

#[derive(Debug, Clone, Copy)]
pub struct XdrRule {
    pub transducer: char,
    pub name: NamePattern,
    pub target: XdrTarget,
}

const fn rule(transducer: char, name: NamePattern, target: XdrTarget) -> XdrRule {
    XdrRule { transducer, name, target }
}

use EngineAttribute as Ea;
use NamePattern::{Contains, Exact, Indexed};
use XdrTarget as T;

pub static XDR_RULES: &[XdrRule] = &[
    // NMEA 0183 v4.11
    rule('T', Indexed("ENGINE#"), T::Engine(EngineSlot::Instance, Ea::Rpm)),
    rule('P', Indexed("ENGINE#"), T::Engine(EngineSlot::Instance, Ea::OilPressure)),
    rule('C', Indexed("ENGINE#"), T::Engine(EngineSlot::Instance, Ea::WaterTemperature)),
    rule('U', Indexed("ENGINE#"), T::Engine(EngineSlot::Instance, Ea::AlternatorVolts)),
    rule('G', Indexed("ENGINE#"), T::Engine(EngineSlot::Instance, Ea::Hours)),
    rule('C', Indexed("ENGINEEXHAUST#"), T::Engine(EngineSlot::Instance, Ea::ExhaustTemperature)),
    rule('V', Indexed("FUEL#"), T::Tank(FluidType::Fuel)),
    rule('V', Indexed("FRESHWATER#"), T::Tank(FluidType::FreshWater)),
    rule('V', Indexed("WASTEWATER#"), T::Tank(FluidType::WasteWater)),
    rule('V', Indexed("LIVEWELL#"), T::Tank(FluidType::LiveWell)),
    rule('V', Indexed("OIL#"), T::Tank(FluidType::Oil)),
    rule('V', Indexed("BLACKWATER#"), T::Tank(FluidType::BlackWater)),
    rule('U', Indexed("BATTERY#"), T::Battery(BatteryAttribute::Volts)),
    rule('I', Indexed("BATTERY#"), T::Battery(BatteryAttribute::Amps)),
    // TwoCan
    rule('T', Exact("MAIN"), T::Engine(EngineSlot::Named(EngineId::Main), Ea::Rpm)),
    rule('T', Exact("PORT"), T::Engine(EngineSlot::Named(EngineId::Port), Ea::Rpm)),
    rule('T', Exact("STBD"), T::Engine(EngineSlot::Named(EngineId::Starboard), Ea::Rpm)),
    rule('P', Exact("MAIN"), T::Engine(EngineSlot::Named(EngineId::Main), Ea::OilPressure)),
    rule('P', Exact("PORT"), T::Engine(EngineSlot::Named(EngineId::Port), Ea::OilPressure)),
    rule('P', Exact("STBD"), T::Engine(EngineSlot::Named(EngineId::Starboard), Ea::OilPressure)),
    rule('C', Exact("MAIN"), T::Engine(EngineSlot::Named(EngineId::Main), Ea::WaterTemperature)),
    rule('C', Exact("PORT"), T::Engine(EngineSlot::Named(EngineId::Port), Ea::WaterTemperature)),
    rule('C', Exact("STBD"), T::Engine(EngineSlot::Named(EngineId::Starboard), Ea::WaterTemperature)),
    rule('U', Exact("MAIN"), T::Engine(EngineSlot::Named(EngineId::Main), Ea::AlternatorVolts)),
    rule('U', Exact("PORT"), T::Engine(EngineSlot::Named(EngineId::Port), Ea::AlternatorVolts)),
    rule('U', Exact("STBD"), T::Engine(EngineSlot::Named(EngineId::Starboard), Ea::AlternatorVolts)),
    // ShipModul / Maretron
    rule('C', Indexed("ENGTEMP"), T::Engine(EngineSlot::Instance, Ea::WaterTemperature)),
    rule('P', Indexed("ENGOILP"), T::Engine(EngineSlot::Instance, Ea::OilPressure)),
    rule('C', Indexed("EXHTEMP"), T::Engine(EngineSlot::Instance, Ea::ExhaustTemperature)),
    rule('U', Indexed("ALTVOLT"), T::Engine(EngineSlot::Instance, Ea::AlternatorVolts)),
    rule('T', Indexed("ENGRPM"), T::Engine(EngineSlot::Instance, Ea::Rpm)),
    rule('G', Indexed("ENGHRS"), T::Engine(EngineSlot::Instance, Ea::Hours)),
    // environment
    rule('C', Exact("ENV_OUTAIR_T"), T::AirTemperature),
    rule('C', Contains("AIRTEMP"), T::AirTemperature),
    rule('C', Exact("ENV_WATER_T"), T::WaterTemperature),
    rule('C', Contains("WATERTEMP"), T::WaterTemperature),
    rule('P', Exact("ENV_ATMOS_P"), T::Pressure),
    rule('P', Contains("BARO"), T::Pressure),
    rule('H', Contains("HUMIDITY"), T::Humidity),
    rule('H', Exact("ENV_OUTSIDE_H"), T::Humidity),
    rule('A', Exact("PTCH"), T::Pitch),
    rule('A', Exact("PITCH"), T::Pitch),
    rule('A', Exact("ROLL"), T::Heel),
];

/// Unit named by a transducer type and unit letter.
fn measurement_unit(transducer: char, unit: Option<char>) -> Option<Unit> {
    match (transducer, unit) {
        ('C', Some('C')) => Some(Unit::Celsius),
        ('C', Some('F')) => Some(Unit::Fahrenheit),
        ('C', Some('K')) => Some(Unit::Kelvin),
        ('P', Some('B')) => Some(Unit::Bar),
        ('P', Some('P')) => Some(Unit::Pascal),
        ('P', Some('I')) => Some(Unit::InchesOfMercury),
        ('P', Some('H')) => Some(Unit::Hectopascal),
        ('A', Some('D')) | ('A', None) => Some(Unit::Degrees),
        ('T', Some('R')) | ('T', None) => Some(Unit::Rpm),
        ('U', Some('V')) => Some(Unit::Volts),
        ('I', Some('A')) => Some(Unit::Amperes),
        ('H', Some('P')) => Some(Unit::Percent),
        ('V', Some('P')) => Some(Unit::Percent),
        ('G', Some('H')) | ('G', None) => Some(Unit::Hours),
        _ => None,
    }
}

fn resolve(target: XdrTarget, instance: u32, ctx: &DecodeContext) -> Option<(Channel, Priority)> {
    let resolved: (Channel, Priority) = match target {
        T::Engine(slot, attribute) => {
            let engine = match slot {
                EngineSlot::Named(engine) => engine,
                EngineSlot::Instance => resolve_engine_instance(instance, ctx.config.dual_engine)?,
            };
            (Channel::Engine(engine, attribute), EnginePriority::Xdr.into())
        }
        T::Tank(fluid) => (tank_channel(fluid, instance)?, TankPriority::Xdr.into()),
        T::Battery(attribute) => (
            Channel::Battery(resolve_battery_instance(instance)?, attribute),
            BatteryPriority::Xdr.into(),
        ),
        T::AirTemperature => (Channel::AirTemperature, AirTemperaturePriority::Xdr.into()),
        T::WaterTemperature => (Channel::WaterTemperature, WaterTemperaturePriority::Xdr.into()),
        T::Pressure => (Channel::Pressure, AtmospherePriority::Xdr.into()),
        T::Humidity => (Channel::Humidity, AtmospherePriority::Xdr.into()),
        T::Pitch => (Channel::Pitch, AttitudePriority::Xdr.into()),
        T::Heel => (Channel::Heel, AttitudePriority::Xdr.into()),
    };
    Some(resolved)
}

pub fn decode_xdr(sentence: &Sentence, ctx: &DecodeContext) -> Decoded {
    let mut decoded = Decoded::default();
    for base in (0..sentence.field_count()).step_by(4) {
        let (Some(transducer), Some(value), Some(name)) =
            (sentence.char_at(base), sentence.f64_at(base + 1), sentence.field(base + 3))
        else {
            continue;
        };
        let Some(unit) = measurement_unit(transducer, sentence.char_at(base + 2)) else {
            trace!("XDR {}: unsupported unit for type {}", name, transducer);
            continue;
        };
        let Some((rule, instance)) = XDR_RULES
            .iter()
            .filter(|rule| rule.transducer == transducer)
            .find_map(|rule| rule.name.matches(name).map(|instance| (rule, instance)))
        else {
            trace!("XDR {}: no rule for type {}", name, transducer);
            continue;
        };
        let Some((channel, priority)) = resolve(rule.target, instance, ctx) else {
            continue;
        };
        if let Some(value) = unit.convert(value, channel.canonical_unit()) {
            decoded.push(Candidate::new(channel, priority, value));
        }
    }
    decoded
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::FusionConfig;
    use crate::nmea0183::sentence::with_checksum;
    use approx::assert_abs_diff_eq;
    use std::sync::Arc;

    fn decode(body: &str, dual_engine: bool) -> Decoded {
        let config = FusionConfig {
            dual_engine,
            ..FusionConfig::default()
        };
        let ctx = DecodeContext::new(Arc::new(config));
        decode_xdr(&Sentence::parse(&with_checksum('$', body)).unwrap(), &ctx)
    }

    #[test]
    fn test_engine_instance_zero_follows_dual_engine() {
        let single = decode("IIXDR,T,1800,R,ENGINE#0", false);
        assert_eq!(single.candidates[0].channel, Channel::Engine(EngineId::Main, Ea::Rpm));
        let dual = decode("IIXDR,T,1800,R,ENGINE#0", true);
        assert_eq!(dual.candidates[0].channel, Channel::Engine(EngineId::Port, Ea::Rpm));
        assert_abs_diff_eq!(dual.candidates[0].value, 1800.0);
        let stbd = decode("IIXDR,T,1750,R,ENGINE#1", true);
        assert_eq!(stbd.candidates[0].channel, Channel::Engine(EngineId::Starboard, Ea::Rpm));
        assert!(decode("IIXDR,T,1750,R,ENGINE#2", true).is_empty());
    }

    #[test]
    fn test_multiple_measurements_and_units() {
        let decoded = decode(
            "IIXDR,P,2.5,B,ENGINE#0,C,185,F,ENGINE#0,C,420,C,ENGINEEXHAUST#0,U,14.1,V,engine#0",
            false,
        );
        assert_eq!(decoded.candidates.len(), 4);
        assert_eq!(decoded.candidates[0].channel, Channel::Engine(EngineId::Main, Ea::OilPressure));
        assert_abs_diff_eq!(decoded.candidates[0].value, 2.5);
        assert_abs_diff_eq!(decoded.candidates[1].value, 85.0, epsilon = 1e-9);
        assert_eq!(decoded.candidates[2].channel, Channel::Engine(EngineId::Main, Ea::ExhaustTemperature));
        assert_eq!(decoded.candidates[3].channel, Channel::Engine(EngineId::Main, Ea::AlternatorVolts));
        assert_eq!(decoded.candidates[3].priority, Priority::from(EnginePriority::Xdr));
    }

    #[test]
    fn test_twocan_and_shipmodul_names() {
        let decoded = decode("IIXDR,T,900,R,STBD,P,310000,P,ENGOILP0", true);
        assert_eq!(decoded.candidates[0].channel, Channel::Engine(EngineId::Starboard, Ea::Rpm));
        assert_eq!(decoded.candidates[1].channel, Channel::Engine(EngineId::Port, Ea::OilPressure));
        assert_abs_diff_eq!(decoded.candidates[1].value, 3.1, epsilon = 1e-9);
    }

    #[test]
    fn test_environment_and_attitude() {
        let decoded = decode(
            "IIXDR,P,1.0132,B,Barometer,C,21.5,C,ENV_OUTAIR_T,H,64,P,Humidity,A,-3.2,D,ROLL,A,1.1,D,PTCH",
            false,
        );
        let channels: Vec<_> = decoded.candidates.iter().map(|c| c.channel).collect();
        assert_eq!(
            channels,
            vec![Channel::Pressure, Channel::AirTemperature, Channel::Humidity, Channel::Heel, Channel::Pitch]
        );
        assert_abs_diff_eq!(decoded.candidates[0].value, 1013.2, epsilon = 1e-9);
        assert_abs_diff_eq!(decoded.candidates[3].value, -3.2);
    }

    #[test]
    fn test_tanks_and_batteries() {
        let decoded = decode("IIXDR,V,55,P,FUEL#1,V,80,P,FRESHWATER#4,U,12.6,V,BATTERY#1,I,-8.5,A,BATTERY#1", false);
        let channels: Vec<_> = decoded.candidates.iter().map(|c| c.channel).collect();
        assert_eq!(
            channels,
            vec![
                Channel::Tank(FluidType::Fuel, 1),
                Channel::Battery(crate::channel::BatteryId::House, BatteryAttribute::Volts),
                Channel::Battery(crate::channel::BatteryId::House, BatteryAttribute::Amps),
            ]
        );
    }

    #[test]
    fn test_unknown_names_ignored() {
        assert!(decode("IIXDR,C,20,C,CABIN,X,1,Z,WHATEVER", false).is_empty());
    }

    #[test]
    fn test_name_patterns() {
        assert_eq!(Indexed("ENGINE#").matches("engine#12"), Some(12));
        assert_eq!(Indexed("ENGINE#").matches("ENGINE#"), None);
        assert_eq!(Indexed("ENGINE#").matches("ENGINEEXHAUST#0"), None);
        assert_eq!(Contains("BARO").matches("XBAROMETER"), Some(0));
        assert_eq!(Exact("ROLL").matches("Roll"), Some(0));
    }
}
