//! Time conversions and low-precision Sun/Moon ephemerides (`spec.md` §4.1).
//!
//! The core's internal clock type is [`hifitime::Epoch`] (the teacher's own
//! time type, see its use throughout `od/ground_station/mod.rs` and
//! `tests/stat_od/multi_body.rs`). Sun and Moon positions are returned in
//! meters in the single fixed inertial frame the rest of the core uses —
//! there is no frame rotation performed anywhere in this crate; SGP4's TEME
//! output and the numerical propagator's frame are treated as identical.
//! See `DESIGN.md`, Open Question (a).

use hifitime::Epoch;

use crate::linalg::Vector3;

/// Astronomical unit, in meters.
pub const AU_M: f64 = 1.495_978_707e11;

/// Splits a UTC instant into an integer Julian day number and the
/// fractional day, matching the `jd, fr = jday(...)` convention the
/// original source (and SGP4 implementations generally) use.
pub fn jd_from_utc(epoch: Epoch) -> (f64, f64) {
    let jde = epoch.to_jde_utc_days();
    let jd = jde.trunc();
    let fr = jde - jd;
    (jd, fr)
}

/// Low-precision analytic Sun position in the core's inertial frame,
/// accurate to about 0.01 deg over 1950-2050 (`spec.md` §4.1).
///
/// Ported term-for-term from `original_source/src/ssa_engine/perturbations/srp.py::get_sun_position`.
pub fn sun_position_inertial(jd: f64, fr: f64) -> Vector3<f64> {
    let n = (jd + fr) - 2_451_545.0;

    let l = ((280.460 + 0.985_647_36 * n).rem_euclid(360.0)).to_radians();
    let g = ((357.528 + 0.985_600_28 * n).rem_euclid(360.0)).to_radians();

    let ecl_long = (l + (1.915 * g.sin() + 0.020 * (2.0 * g).sin()).to_radians())
        .rem_euclid(2.0 * std::f64::consts::PI);

    let obliquity = (23.439 - 0.000_000_36 * n).to_radians();

    let dist_au = 1.000_14 - 0.016_71 * g.cos() - 0.000_14 * (2.0 * g).cos();

    let x = dist_au * ecl_long.cos();
    let y = dist_au * obliquity.cos() * ecl_long.sin();
    let z = dist_au * obliquity.sin() * ecl_long.sin();

    Vector3::new(x, y, z) * AU_M
}

/// Low-precision analytic Moon position in the core's inertial frame,
/// accurate to 1-2 km over decades (`spec.md` §4.1).
///
/// Ported term-for-term from `original_source/src/ssa_engine/perturbations/third_body.py::get_moon_position`.
pub fn moon_position_inertial(jd: f64, fr: f64) -> Vector3<f64> {
    let t = ((jd + fr) - 2_451_545.0) / 36_525.0;

    let l0 = (218.316_17 + 481_267.881_3 * t).to_radians().rem_euclid(2.0 * std::f64::consts::PI);
    let l = (134.962_92 + 477_198.867_6 * t).to_radians().rem_euclid(2.0 * std::f64::consts::PI);
    let lp = (357.525_77 + 35_999.050_3 * t).to_radians().rem_euclid(2.0 * std::f64::consts::PI);
    let f = (93.272_09 + 483_202.017_5 * t).to_radians().rem_euclid(2.0 * std::f64::consts::PI);
    let d = (297.850_19 + 445_267.111_5 * t).to_radians().rem_euclid(2.0 * std::f64::consts::PI);

    let dist_m = 385_000e3 * (1.0 - 0.0167 * (l - lp).cos());

    let lon = l0 + (6.289 * l.sin() + 1.274 * (2.0 * d - l).sin()).to_radians();
    let lat = (5.128 * f.sin()).to_radians();

    let obliquity = 23.439_f64.to_radians();
    let x = dist_m * lat.cos() * lon.cos();
    let y = dist_m * lat.cos() * lon.sin() * obliquity.cos();
    let z = dist_m * (lat.sin() * obliquity.cos() + lat.cos() * lon.sin() * obliquity.sin());

    Vector3::new(x, y, z)
}

#[cfg(test)]
mod tests {
    use super::*;
    use hifitime::Epoch;

    fn jd_at(year: i32, month: u8, day: u8) -> (f64, f64) {
        let epoch = Epoch::from_gregorian_utc_at_midnight(year, month, day);
        jd_from_utc(epoch)
    }

    /// P3: sun/moon range stays within documented bounds for 1950-2050.
    #[test]
    fn sun_and_moon_range_p3() {
        for year in [1950, 1975, 2000, 2025, 2049] {
            let (jd, fr) = jd_at(year, 6, 15);
            let r_sun = sun_position_inertial(jd, fr).norm();
            let r_sun_au = r_sun / AU_M;
            assert!(
                (0.98..=1.02).contains(&r_sun_au),
                "sun range out of bounds for {year}: {r_sun_au} AU"
            );

            let r_moon = moon_position_inertial(jd, fr).norm();
            assert!(
                (3.5e8..=4.1e8).contains(&r_moon),
                "moon range out of bounds for {year}: {r_moon} m"
            );
        }
    }
}
