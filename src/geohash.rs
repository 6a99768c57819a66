//! Geohash decoding and bounding-box reconstruction.
//!
//! Bits alternate longitude/latitude starting with longitude; each base-32
//! character carries five of them.

use crate::error::{Error, Result};
use crate::models::{BoundingBox, Point};

const BASE32: &[u8; 32] = b"0123456789bcdefghjkmnpqrstuvwxyz";

/// Center of a geohash cell and its half-extents in degrees.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Decoded {
    pub latitude: f64,
    pub longitude: f64,
    pub latitude_error: f64,
    pub longitude_error: f64,
}

impl Decoded {
    pub fn center(&self) -> Point {
        Point::new(self.latitude, self.longitude)
    }
}

fn char_index(c: char) -> Option<u8> {
    let lower = c.to_ascii_lowercase();
    BASE32.iter().position(|&b| b as char == lower).map(|i| i as u8)
}

/// Decodes `geohash` into its cell center and error margins.
///
/// An empty string decodes to the whole world: center (0, 0), margins (90, 180).
pub fn decode(geohash: &str) -> Result<Decoded> {
    let mut lat = (-90.0_f64, 90.0_f64);
    let mut lon = (-180.0_f64, 180.0_f64);
    let mut lat_err = 90.0_f64;
    let mut lon_err = 180.0_f64;
    let mut even = true;

    for c in geohash.chars() {
        let bits = char_index(c).ok_or_else(|| Error::InvalidGeohash {
            geohash: geohash.to_string(),
            found: c,
        })?;
        for shift in (0..5).rev() {
            let bit = (bits >> shift) & 1 == 1;
            let (interval, err) = if even {
                (&mut lon, &mut lon_err)
            } else {
                (&mut lat, &mut lat_err)
            };
            *err /= 2.0;
            let mid = (interval.0 + interval.1) / 2.0;
            if bit {
                interval.0 = mid;
            } else {
                interval.1 = mid;
            }
            even = !even;
        }
    }

    Ok(Decoded {
        latitude: (lat.0 + lat.1) / 2.0,
        longitude: (lon.0 + lon.1) / 2.0,
        latitude_error: lat_err,
        longitude_error: lon_err,
    })
}

/// Encodes a coordinate at `precision` characters.
pub fn encode(latitude: f64, longitude: f64, precision: usize) -> String {
    let mut lat = (-90.0_f64, 90.0_f64);
    let mut lon = (-180.0_f64, 180.0_f64);
    let mut out = String::with_capacity(precision);
    let mut even = true;
    let mut bits = 0u8;
    let mut bit_count = 0;

    while out.len() < precision {
        let (interval, value) = if even {
            (&mut lon, longitude)
        } else {
            (&mut lat, latitude)
        };
        let mid = (interval.0 + interval.1) / 2.0;
        bits <<= 1;
        if value >= mid {
            bits |= 1;
            interval.0 = mid;
        } else {
            interval.1 = mid;
        }
        even = !even;
        bit_count += 1;
        if bit_count == 5 {
            out.push(BASE32[bits as usize] as char);
            bits = 0;
            bit_count = 0;
        }
    }
    out
}

/// Approximate cell rectangle for a geohash prefix: center ± error margins.
///
/// `None` yields a box with both corners at the zero point.
pub fn bounding_box_of(geohash: Option<&str>) -> Result<BoundingBox> {
    let Some(geohash) = geohash else {
        return Ok(BoundingBox::default());
    };
    let decoded = decode(geohash)?;
    Ok(BoundingBox::new(
        Point::new(
            decoded.latitude - decoded.latitude_error,
            decoded.longitude - decoded.longitude_error,
        ),
        Point::new(
            decoded.latitude + decoded.latitude_error,
            decoded.longitude + decoded.longitude_error,
        ),
    ))
}
