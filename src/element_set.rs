//! [`ElementSet`]: a validated two-line element set (`spec.md` §3).

use hifitime::Epoch;
use serde::{Deserialize, Serialize};

use crate::errors::{
    EccentricityOutOfRangeSnafu, ElementSetError, InclinationOutOfRangeSnafu, NonPositiveMeanMotionSnafu,
};

const TLE_LINE_LEN: usize = 69;

/// A named TLE, parsed once and kept immutable for the lifetime of a
/// screening run (`spec.md` §3 `CatalogEntry` lifecycle).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ElementSet {
    pub catalog_id: u64,
    pub name: String,
    pub line1: String,
    pub line2: String,
    /// Mean-element epoch, parsed from `line1`.
    pub epoch: Epoch,
    pub eccentricity: f64,
    pub inclination_deg: f64,
    pub mean_motion_rev_per_day: f64,
}

impl ElementSet {
    /// Parses and validates a TLE per `spec.md` §3's invariants. Fails
    /// with [`ElementSetError`] rather than propagating a parser panic;
    /// callers treat this as a per-object skip (`spec.md` §7).
    pub fn parse(catalog_id: u64, name: impl Into<String>, line1: &str, line2: &str) -> Result<Self, ElementSetError> {
        if line1.len() != TLE_LINE_LEN {
            return Err(ElementSetError::BadLineLength {
                line: 1,
                len: line1.len(),
            });
        }
        if line2.len() != TLE_LINE_LEN {
            return Err(ElementSetError::BadLineLength {
                line: 2,
                len: line2.len(),
            });
        }

        let elements = sgp4::Elements::from_tle(Some(name.into()), line1.as_bytes(), line2.as_bytes())
            .map_err(|e| ElementSetError::Unparseable { reason: e.to_string() })?;

        let eccentricity = elements.eccentricity;
        if !(0.0..1.0).contains(&eccentricity) {
            return EccentricityOutOfRangeSnafu { eccentricity }.fail();
        }

        let inclination_deg = elements.inclination;
        if !(0.0..=180.0).contains(&inclination_deg) {
            return InclinationOutOfRangeSnafu { inclination_deg }.fail();
        }

        let mean_motion_rev_per_day = elements.mean_motion;
        if mean_motion_rev_per_day <= 0.0 {
            return NonPositiveMeanMotionSnafu {
                mean_motion_rev_per_day,
            }
            .fail();
        }

        let epoch = sgp4_epoch_to_hifitime(&elements);

        Ok(Self {
            catalog_id,
            name: elements.object_name.clone().unwrap_or_default(),
            line1: line1.to_string(),
            line2: line2.to_string(),
            epoch,
            eccentricity,
            inclination_deg,
            mean_motion_rev_per_day,
        })
    }
}

/// Converts the `sgp4` crate's fractional-Julian-years-since-2000 epoch
/// into a [`hifitime::Epoch`].
pub(crate) fn sgp4_epoch_to_hifitime(elements: &sgp4::Elements) -> Epoch {
    use chrono::{Datelike, Timelike};
    use hifitime::Unit;

    let datetime = elements.datetime;
    Epoch::from_gregorian_utc(
        datetime.year(),
        datetime.month() as u8,
        datetime.day() as u8,
        datetime.hour() as u8,
        datetime.minute() as u8,
        datetime.second() as u8,
        0,
    ) + (datetime.nanosecond() as f64) * Unit::Nanosecond
}

#[cfg(test)]
mod tests {
    use super::*;

    const ISS_LINE1: &str = "1 25544U 98067A   20001.50000000  .00001234  00000-0  12345-4 0  9999";
    const ISS_LINE2: &str = "2 25544  51.6333 123.4560 0007763  90.0000 270.0000 15.49289811  5678";

    #[test]
    fn parses_valid_tle() {
        let es = ElementSet::parse(25544, "ISS (ZARYA)", ISS_LINE1, ISS_LINE2).unwrap();
        assert_eq!(es.catalog_id, 25544);
        assert!((es.eccentricity - 0.0007763).abs() < 1e-7);
        assert!((es.mean_motion_rev_per_day - 15.49289811).abs() < 1e-6);
    }

    #[test]
    fn rejects_wrong_length_lines() {
        let err = ElementSet::parse(1, "BAD", "1 2345", ISS_LINE2).unwrap_err();
        assert!(matches!(err, ElementSetError::BadLineLength { line: 1, .. }));
    }
}
