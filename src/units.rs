//! Units of measure and conversions between them.
//!
//! Every channel value is stored in a canonical unit (see
//! [`Channel::canonical_unit`](crate::channel::Channel::canonical_unit)); decoders
//! convert on the way in, the publisher converts to the preferred display unit
//! on the way out.

use std::fmt;

use serde::{Deserialize, Serialize};

pub const METERS_PER_FOOT: f64 = 0.3048;
pub const METERS_PER_FATHOM: f64 = 1.8288;
pub const METERS_PER_NM: f64 = 1852.0;
pub const METERS_PER_STATUTE_MILE: f64 = 1609.344;
pub const KNOTS_PER_MPS: f64 = 3600.0 / METERS_PER_NM;
pub const KNOTS_PER_KMH: f64 = 1000.0 / METERS_PER_NM;
pub const KNOTS_PER_MPH: f64 = METERS_PER_STATUTE_MILE / METERS_PER_NM;
pub const HPA_PER_INHG: f64 = 33.8639;
pub const HPA_PER_PSI: f64 = 68.947_572_9;
pub const HPA_PER_BAR: f64 = 1000.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Unit {
    Degrees,
    DegreesTrue,
    DegreesMagnetic,
    DegreesLeft,
    DegreesRight,
    Knots,
    MetersPerSecond,
    KilometersPerHour,
    MilesPerHour,
    Meters,
    Feet,
    Fathoms,
    NauticalMiles,
    Kilometers,
    StatuteMiles,
    Celsius,
    Fahrenheit,
    Kelvin,
    Hectopascal,
    Bar,
    Pascal,
    Psi,
    InchesOfMercury,
    Percent,
    Rpm,
    Volts,
    Amperes,
    Hours,
    Count,
    EpochSeconds,
}

/// Physical dimension; conversions only happen within one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dimension {
    Angle,
    Speed,
    Length,
    Temperature,
    Pressure,
    Dimensionless,
}

impl Unit {
    pub fn dimension(self) -> Dimension {
        match self {
            Unit::Degrees
            | Unit::DegreesTrue
            | Unit::DegreesMagnetic
            | Unit::DegreesLeft
            | Unit::DegreesRight => Dimension::Angle,
            Unit::Knots | Unit::MetersPerSecond | Unit::KilometersPerHour | Unit::MilesPerHour => {
                Dimension::Speed
            }
            Unit::Meters
            | Unit::Feet
            | Unit::Fathoms
            | Unit::NauticalMiles
            | Unit::Kilometers
            | Unit::StatuteMiles => Dimension::Length,
            Unit::Celsius | Unit::Fahrenheit | Unit::Kelvin => Dimension::Temperature,
            Unit::Hectopascal | Unit::Bar | Unit::Pascal | Unit::Psi | Unit::InchesOfMercury => {
                Dimension::Pressure
            }
            Unit::Percent
            | Unit::Rpm
            | Unit::Volts
            | Unit::Amperes
            | Unit::Hours
            | Unit::Count
            | Unit::EpochSeconds => Dimension::Dimensionless,
        }
    }

    /// Converts into the base unit of the dimension
    /// (knots, metres, Celsius, hectopascal).
    fn to_base(self, value: f64) -> f64 {
        match self {
            Unit::MetersPerSecond => value * KNOTS_PER_MPS,
            Unit::KilometersPerHour => value * KNOTS_PER_KMH,
            Unit::MilesPerHour => value * KNOTS_PER_MPH,
            Unit::Feet => value * METERS_PER_FOOT,
            Unit::Fathoms => value * METERS_PER_FATHOM,
            Unit::NauticalMiles => value * METERS_PER_NM,
            Unit::Kilometers => value * 1000.0,
            Unit::StatuteMiles => value * METERS_PER_STATUTE_MILE,
            Unit::Fahrenheit => (value - 32.0) * 5.0 / 9.0,
            Unit::Kelvin => value - 273.15,
            Unit::Bar => value * HPA_PER_BAR,
            Unit::Pascal => value / 100.0,
            Unit::Psi => value * HPA_PER_PSI,
            Unit::InchesOfMercury => value * HPA_PER_INHG,
            _ => value,
        }
    }

    fn from_base(self, value: f64) -> f64 {
        match self {
            Unit::MetersPerSecond => value / KNOTS_PER_MPS,
            Unit::KilometersPerHour => value / KNOTS_PER_KMH,
            Unit::MilesPerHour => value / KNOTS_PER_MPH,
            Unit::Feet => value / METERS_PER_FOOT,
            Unit::Fathoms => value / METERS_PER_FATHOM,
            Unit::NauticalMiles => value / METERS_PER_NM,
            Unit::Kilometers => value / 1000.0,
            Unit::StatuteMiles => value / METERS_PER_STATUTE_MILE,
            Unit::Fahrenheit => value * 9.0 / 5.0 + 32.0,
            Unit::Kelvin => value + 273.15,
            Unit::Bar => value / HPA_PER_BAR,
            Unit::Pascal => value * 100.0,
            Unit::Psi => value / HPA_PER_PSI,
            Unit::InchesOfMercury => value / HPA_PER_INHG,
            _ => value,
        }
    }

    /// Converts `value` from `self` into `target`. `None` across dimensions.
    pub fn convert(self, value: f64, target: Unit) -> Option<f64> {
        if self == target {
            return Some(value);
        }
        let dimension = self.dimension();
        if dimension != target.dimension() || dimension == Dimension::Dimensionless {
            return None;
        }
        if dimension == Dimension::Angle {
            // angle flavours only differ by reference, never by scale
            return Some(value);
        }
        Some(target.from_base(self.to_base(value)))
    }

    pub fn symbol(self) -> &'static str {
        match self {
            Unit::Degrees => "°",
            Unit::DegreesTrue => "°T",
            Unit::DegreesMagnetic => "°M",
            Unit::DegreesLeft => "°L",
            Unit::DegreesRight => "°R",
            Unit::Knots => "kn",
            Unit::MetersPerSecond => "m/s",
            Unit::KilometersPerHour => "km/h",
            Unit::MilesPerHour => "mph",
            Unit::Meters => "m",
            Unit::Feet => "ft",
            Unit::Fathoms => "fa",
            Unit::NauticalMiles => "nm",
            Unit::Kilometers => "km",
            Unit::StatuteMiles => "mi",
            Unit::Celsius => "°C",
            Unit::Fahrenheit => "°F",
            Unit::Kelvin => "K",
            Unit::Hectopascal => "hPa",
            Unit::Bar => "bar",
            Unit::Pascal => "Pa",
            Unit::Psi => "psi",
            Unit::InchesOfMercury => "inHg",
            Unit::Percent => "%",
            Unit::Rpm => "rpm",
            Unit::Volts => "V",
            Unit::Amperes => "A",
            Unit::Hours => "h",
            Unit::Count => "",
            Unit::EpochSeconds => "s",
        }
    }
}

impl fmt::Display for Unit {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

/// Display unit choices, one per kind of quantity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UnitPreferences {
    pub boat_speed: Unit,
    pub wind_speed: Unit,
    pub depth: Unit,
    pub distance: Unit,
    pub altitude: Unit,
    pub temperature: Unit,
    pub air_pressure: Unit,
    pub oil_pressure: Unit,
}

impl Default for UnitPreferences {
    fn default() -> Self {
        Self {
            boat_speed: Unit::Knots,
            wind_speed: Unit::Knots,
            depth: Unit::Meters,
            distance: Unit::NauticalMiles,
            altitude: Unit::Meters,
            temperature: Unit::Celsius,
            air_pressure: Unit::Hectopascal,
            oil_pressure: Unit::Bar,
        }
    }
}

impl UnitPreferences {
    /// Each preference paired with the dimension it must belong to.
    pub fn entries(&self) -> [(&'static str, Unit, Dimension); 8] {
        [
            ("boat_speed", self.boat_speed, Dimension::Speed),
            ("wind_speed", self.wind_speed, Dimension::Speed),
            ("depth", self.depth, Dimension::Length),
            ("distance", self.distance, Dimension::Length),
            ("altitude", self.altitude, Dimension::Length),
            ("temperature", self.temperature, Dimension::Temperature),
            ("air_pressure", self.air_pressure, Dimension::Pressure),
            ("oil_pressure", self.oil_pressure, Dimension::Pressure),
        ]
    }
}

/// Splits a signed relative angle (positive to starboard) into magnitude and side.
pub fn to_sided_angle(signed_deg: f64) -> (f64, Unit) {
    let wrapped = crate::utilities::angle_diff(signed_deg, 0.0);
    if wrapped < 0.0 {
        (-wrapped, Unit::DegreesLeft)
    } else {
        (wrapped, Unit::DegreesRight)
    }
}

/// Inverse of [`to_sided_angle`]: port angles come back negative.
pub fn from_sided_angle(value: f64, unit: Unit) -> f64 {
    match unit {
        Unit::DegreesLeft => -value,
        _ => value,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_depth_feet_round_trip() {
        let meters = Unit::Feet.convert(33.0, Unit::Meters).unwrap();
        assert_abs_diff_eq!(meters, 10.0584, epsilon = 1e-9);
        let feet = Unit::Meters.convert(meters, Unit::Feet).unwrap();
        assert_abs_diff_eq!(feet, 33.0, epsilon = 1e-9);
    }

    #[test]
    fn test_fathoms_to_meters() {
        assert_abs_diff_eq!(Unit::Fathoms.convert(2.0, Unit::Meters).unwrap(), 3.6576, epsilon = 1e-9);
    }

    #[test]
    fn test_speed_conversions() {
        assert_abs_diff_eq!(Unit::MetersPerSecond.convert(1.0, Unit::Knots).unwrap(), 1.943844, epsilon = 1e-6);
        assert_abs_diff_eq!(Unit::KilometersPerHour.convert(1.852, Unit::Knots).unwrap(), 1.0, epsilon = 1e-9);
    }

    #[test]
    fn test_temperature_conversions() {
        assert_abs_diff_eq!(Unit::Fahrenheit.convert(212.0, Unit::Celsius).unwrap(), 100.0, epsilon = 1e-9);
        assert_abs_diff_eq!(Unit::Kelvin.convert(273.15, Unit::Celsius).unwrap(), 0.0, epsilon = 1e-9);
        assert_abs_diff_eq!(Unit::Celsius.convert(20.0, Unit::Fahrenheit).unwrap(), 68.0, epsilon = 1e-9);
    }

    #[test]
    fn test_pressure_conversions() {
        assert_abs_diff_eq!(Unit::Bar.convert(1.01325, Unit::Hectopascal).unwrap(), 1013.25, epsilon = 1e-9);
        assert_abs_diff_eq!(Unit::InchesOfMercury.convert(29.92, Unit::Hectopascal).unwrap(), 1013.21, epsilon = 0.01);
        assert_abs_diff_eq!(Unit::Pascal.convert(350_000.0, Unit::Bar).unwrap(), 3.5, epsilon = 1e-9);
    }

    #[test]
    fn test_incompatible_dimensions() {
        assert_eq!(Unit::Knots.convert(1.0, Unit::Meters), None);
        assert_eq!(Unit::Rpm.convert(1.0, Unit::Volts), None);
        assert_eq!(Unit::Rpm.convert(1200.0, Unit::Rpm), Some(1200.0));
    }

    #[test]
    fn test_sided_angles() {
        assert_eq!(to_sided_angle(-30.0), (30.0, Unit::DegreesLeft));
        assert_eq!(to_sided_angle(30.0), (30.0, Unit::DegreesRight));
        let (value, unit) = to_sided_angle(300.0);
        assert_abs_diff_eq!(value, 60.0, epsilon = 1e-9);
        assert_eq!(unit, Unit::DegreesLeft);
        assert_abs_diff_eq!(from_sided_angle(60.0, Unit::DegreesLeft), -60.0);
    }

    #[test]
    fn test_unit_preferences_deserialize_partial() {
        let prefs: UnitPreferences = serde_json::from_str(r#"{"depth": "feet"}"#).unwrap();
        assert_eq!(prefs.depth, Unit::Feet);
        assert_eq!(prefs.boat_speed, Unit::Knots);
    }
}
