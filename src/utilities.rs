/// Angle helpers and the magnetic model lookup

use chrono::{DateTime, Datelike, Utc};
use time::Date;
use world_magnetic_model::{GeomagneticField, uom::si::{angle::degree, f32::{Angle, Length}, length::meter}};

// given two angles in degrees, compute the smallest difference between a and b (i.e., a - b)
pub fn angle_diff(a: f64, b: f64) -> f64 {
    let xx = ((a - b) % 360.0 + 360.0) % 360.0;
    if xx > 180.0 { xx - 360.0 } else { xx }
}

pub fn normalize0_360(angle: f64) -> f64 {
    (angle % 360.0 + 360.0) % 360.0
}

#[derive(Debug)]
pub enum VariationError {
    InvalidDate,
    MagneticFieldError,
}

/// Magnetic declination in degrees (east positive) from the World Magnetic Model.
pub fn get_variation_deg(lat_deg: f64, lon_deg: f64, timestamp: DateTime<Utc>) -> Result<f64, VariationError> {
    let date = Date::from_ordinal_date(timestamp.year(), timestamp.ordinal() as u16)
        .map_err(|_| VariationError::InvalidDate)?;

    let declination = GeomagneticField::new(
        Length::new::<meter>(0.0),
        Angle::new::<degree>(lat_deg as f32),
        Angle::new::<degree>(lon_deg as f32),
        date,
    )
    .map_err(|_| VariationError::MagneticFieldError)?
    .declination()
    .get::<degree>() as f64;

    Ok(declination)
}
