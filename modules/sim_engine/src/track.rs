// SPDX-FileCopyrightText: 2026 All contributors
//
// SPDX-License-Identifier: GPL-2.0-or-later

use common::position::Position;
use std::{fs::File, io::Read, path::Path, str::FromStr};
use thiserror::Error;
use tracing::debug;
use utm::{lat_lon_to_zone_number, lat_to_zone_letter, to_utm_wgs84, wsg84_utm_to_lat_lon};

#[derive(Debug, Error)]
pub enum TrackError {
    #[error("Failed to read track: {0}")]
    Csv(#[from] csv::Error),
    #[error("Record {record} has no valid {column}")]
    InvalidRecord { record: usize, column: &'static str },
    #[error("Track has no points")]
    Empty,
    #[error("Position lat: {latitude}, long: {longitude} can't be converted to UTM")]
    OutsideUtm { latitude: f64, longitude: f64 },
}

/// Reads track points from CSV with a header and `longitude,latitude` records.
pub fn read_track<R: Read>(reader: R) -> Result<Vec<Position>, TrackError> {
    let mut reader = csv::Reader::from_reader(reader);
    let mut positions = Vec::new();
    for (index, record) in reader.records().enumerate() {
        let record = record?;
        let longitude = coordinate(&record, 0, index + 1, "longitude")?;
        let latitude = coordinate(&record, 1, index + 1, "latitude")?;
        positions.push(Position::new(latitude, longitude));
    }
    debug!("Read {} track points", positions.len());
    Ok(positions)
}

pub fn read_track_file(path: impl AsRef<Path>) -> Result<Vec<Position>, TrackError> {
    let file = File::open(path).map_err(csv::Error::from)?;
    read_track(file)
}

fn coordinate(
    record: &csv::StringRecord,
    column: usize,
    record_number: usize,
    name: &'static str,
) -> Result<f64, TrackError> {
    record
        .get(column)
        .and_then(|value| f64::from_str(value.trim()).ok())
        .ok_or(TrackError::InvalidRecord {
            record: record_number,
            column: name,
        })
}

#[derive(Debug, Clone, Copy)]
struct UtmPoint {
    northing: f64,
    easting: f64,
}

impl UtmPoint {
    fn distance(&self, other: &UtmPoint) -> f64 {
        (other.northing - self.northing).hypot(other.easting - self.easting)
    }
}

/// A place on the track and the direction of travel there.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrackPoint {
    pub position: Position,
    /// Degrees clockwise from grid north.
    pub bearing: f32,
}

/// A closed track in the UTM zone of its first point.
///
/// Driving past the last point continues at the first one.
#[derive(Debug, Clone)]
pub struct Track {
    points: Vec<UtmPoint>,
    /// Distance from the first point to the start of each segment.
    offsets: Vec<f64>,
    length: f64,
    zone: u8,
    zone_letter: char,
}

impl Track {
    pub fn new(positions: &[Position]) -> Result<Track, TrackError> {
        let first = positions.first().ok_or(TrackError::Empty)?;
        let zone = lat_lon_to_zone_number(first.latitude, first.longitude);
        let zone_letter = lat_to_zone_letter(first.latitude).ok_or(TrackError::OutsideUtm {
            latitude: first.latitude,
            longitude: first.longitude,
        })?;

        let points: Vec<UtmPoint> = positions
            .iter()
            .map(|position| {
                let (northing, easting, _) =
                    to_utm_wgs84(position.latitude, position.longitude, zone);
                UtmPoint { northing, easting }
            })
            .collect();

        let mut offsets = Vec::with_capacity(points.len());
        let mut length = 0.0;
        for (index, point) in points.iter().enumerate() {
            offsets.push(length);
            length += point.distance(&points[(index + 1) % points.len()]);
        }

        Ok(Track {
            points,
            offsets,
            length,
            zone,
            zone_letter,
        })
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Length of one lap in meters.
    pub fn length_m(&self) -> f64 {
        self.length
    }

    /// The point `distance_m` meters after the first track point.
    pub fn point_at(&self, distance_m: f64) -> Option<TrackPoint> {
        if self.length <= 0.0 {
            return self.to_track_point(self.points[0], 0.0);
        }
        let distance = distance_m.rem_euclid(self.length);
        let segment = self
            .offsets
            .partition_point(|offset| *offset <= distance)
            .saturating_sub(1);
        let start = self.points[segment];
        let end = self.points[(segment + 1) % self.points.len()];

        let segment_length = start.distance(&end);
        let fraction = if segment_length > 0.0 {
            (distance - self.offsets[segment]) / segment_length
        } else {
            0.0
        };
        let point = UtmPoint {
            northing: start.northing + (end.northing - start.northing) * fraction,
            easting: start.easting + (end.easting - start.easting) * fraction,
        };
        let bearing = (end.easting - start.easting)
            .atan2(end.northing - start.northing)
            .to_degrees()
            .rem_euclid(360.0);
        self.to_track_point(point, bearing)
    }

    fn to_track_point(&self, point: UtmPoint, bearing: f64) -> Option<TrackPoint> {
        let (latitude, longitude) =
            wsg84_utm_to_lat_lon(point.easting, point.northing, self.zone, self.zone_letter)
                .ok()?;
        Some(TrackPoint {
            position: Position::new(latitude, longitude),
            bearing: bearing as f32,
        })
    }
}
