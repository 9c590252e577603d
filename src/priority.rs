//! Per-channel priority ladders. Lower rank wins; ranks only compare within one channel.

use std::fmt;

use crate::channel::Channel;

/// Rank of a source for one channel. 1 is best, [`Priority::NONE`] means no source holds it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Priority(u8);

impl Priority {
    pub const NONE: Priority = Priority(99);

    pub const fn new(rank: u8) -> Self {
        Priority(rank)
    }

    pub fn rank(self) -> u8 {
        self.0
    }

    pub fn is_none(self) -> bool {
        self == Priority::NONE
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

macro_rules! ladder {
    ($(#[$meta:meta])* $name:ident { $($variant:ident = $rank:literal),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq)]
        pub enum $name {
            $($variant = $rank),+
        }

        impl From<$name> for Priority {
            fn from(ladder: $name) -> Self {
                Priority(ladder as u8)
            }
        }
    };
}

ladder!(
    /// Latitude and Longitude.
    PositionPriority { Nmea2000 = 1, SignalK = 2, Rmc = 3, Gga = 4, Gll = 5, Aivdo = 6 }
);
ladder!(
    /// SpeedOverGround and CourseOverGround.
    MotionPriority { Nmea2000 = 1, SignalK = 2, Rmc = 3, Vtg = 4 }
);
ladder!(HeadingTruePriority { Nmea2000 = 1, SignalK = 2, Hdt = 3, Vhw = 4, Calculated = 5 });
ladder!(HeadingMagneticPriority { Nmea2000 = 1, SignalK = 2, Hdm = 3, Hdg = 4, Vhw = 5, Calculated = 6 });
ladder!(VariationPriority { Nmea2000 = 1, SignalK = 2, Hdg = 3, Rmc = 4, WorldMagneticModel = 5 });
ladder!(DepthPriority { Nmea2000 = 1, SignalK = 3, Dpt = 4, Dbt = 5 });
ladder!(WaterSpeedPriority { Nmea2000 = 1, SignalK = 2, Vhw = 3 });
ladder!(
    /// ApparentWindAngle and ApparentWindSpeed.
    ApparentWindPriority { Nmea2000 = 1, SignalK = 2, Mwv = 3, Vwr = 4 }
);
ladder!(TrueWindAnglePriority { Nmea2000 = 1, SignalK = 2, Mwv = 3, Vwt = 4, Calculated = 5 });
ladder!(TrueWindSpeedPriority { Nmea2000 = 1, SignalK = 2, Mwv = 3, Vwt = 4, Mwd = 5, Calculated = 6 });
ladder!(
    /// Bus-sourced angle+heading derivations rank above NMEA0183 ones.
    TrueWindDirectionPriority {
        Nmea2000True = 1,
        SignalKTrue = 2,
        Nmea2000Magnetic = 3,
        SignalKMagnetic = 4,
        MwdTrue = 5,
        MwdMagnetic = 6,
        BusAngleHeading = 7,
        Nmea0183AngleHeading = 8,
        Calculated = 9,
    }
);
ladder!(RudderPriority { Nmea2000 = 1, SignalK = 2, Rsa = 3 });
ladder!(
    /// Pitch and Heel.
    AttitudePriority { Nmea2000 = 1, SignalK = 2, Xdr = 3 }
);
ladder!(AltitudePriority { Nmea2000 = 1, SignalK = 2, Gga = 3 });
ladder!(SatellitesUsedPriority { Nmea2000 = 1, SignalK = 2, Gga = 3 });
ladder!(SatellitesInViewPriority { Nmea2000 = 1, SignalK = 2, Gsv = 3 });
ladder!(
    /// Log and TripLog.
    LogPriority { Nmea2000 = 1, SignalK = 2, Vlw = 3 }
);
ladder!(AirTemperaturePriority { Nmea2000 = 1, SignalK = 2, Mta = 3, Mda = 4, Xdr = 5 });
ladder!(WaterTemperaturePriority { Nmea2000 = 1, SignalK = 2, Mtw = 3, Mda = 4, Xdr = 5 });
ladder!(
    /// Pressure and Humidity.
    AtmospherePriority { Nmea2000 = 1, SignalK = 2, Mda = 3, Xdr = 4 }
);
ladder!(DateTimePriority { Nmea2000 = 1, SignalK = 2, Zda = 3, Rmc = 4 });
ladder!(EnginePriority { Nmea2000 = 1, SignalK = 2, Rpm = 3, Xdr = 4 });
ladder!(TankPriority { Nmea2000 = 1, SignalK = 2, Xdr = 3 });
ladder!(BatteryPriority { Nmea2000 = 1, SignalK = 2, Xdr = 3 });

/// The rank a SignalK source holds for `channel`.
pub fn signalk_priority(channel: Channel) -> Priority {
    match channel {
        Channel::Latitude | Channel::Longitude => PositionPriority::SignalK.into(),
        Channel::SpeedOverGround | Channel::CourseOverGround => MotionPriority::SignalK.into(),
        Channel::SpeedThroughWater => WaterSpeedPriority::SignalK.into(),
        Channel::HeadingTrue => HeadingTruePriority::SignalK.into(),
        Channel::HeadingMagnetic => HeadingMagneticPriority::SignalK.into(),
        Channel::Variation => VariationPriority::SignalK.into(),
        Channel::Depth => DepthPriority::SignalK.into(),
        Channel::ApparentWindAngle | Channel::ApparentWindSpeed => ApparentWindPriority::SignalK.into(),
        Channel::TrueWindAngle => TrueWindAnglePriority::SignalK.into(),
        Channel::TrueWindSpeed => TrueWindSpeedPriority::SignalK.into(),
        Channel::TrueWindDirection => TrueWindDirectionPriority::SignalKTrue.into(),
        Channel::RudderAngle => RudderPriority::SignalK.into(),
        Channel::Pitch | Channel::Heel => AttitudePriority::SignalK.into(),
        Channel::Altitude => AltitudePriority::SignalK.into(),
        Channel::SatellitesUsed => SatellitesUsedPriority::SignalK.into(),
        Channel::SatellitesInView => SatellitesInViewPriority::SignalK.into(),
        Channel::DateTime => DateTimePriority::SignalK.into(),
        Channel::Log | Channel::TripLog => LogPriority::SignalK.into(),
        Channel::AirTemperature => AirTemperaturePriority::SignalK.into(),
        Channel::WaterTemperature => WaterTemperaturePriority::SignalK.into(),
        Channel::Pressure | Channel::Humidity => AtmospherePriority::SignalK.into(),
        Channel::Engine(..) => EnginePriority::SignalK.into(),
        Channel::Tank(..) => TankPriority::SignalK.into(),
        Channel::Battery(..) => BatteryPriority::SignalK.into(),
    }
}

/// True when `priority` marks a value produced by the derivation stage
/// rather than measured by an instrument.
pub fn is_calculated(channel: Channel, priority: Priority) -> bool {
    match channel {
        Channel::HeadingTrue => priority == Priority::from(HeadingTruePriority::Calculated),
        Channel::HeadingMagnetic => priority == Priority::from(HeadingMagneticPriority::Calculated),
        Channel::Variation => priority == Priority::from(VariationPriority::WorldMagneticModel),
        Channel::TrueWindAngle => priority == Priority::from(TrueWindAnglePriority::Calculated),
        Channel::TrueWindSpeed => priority == Priority::from(TrueWindSpeedPriority::Calculated),
        Channel::TrueWindDirection => priority >= Priority::from(TrueWindDirectionPriority::BusAngleHeading),
        _ => false,
    }
}
