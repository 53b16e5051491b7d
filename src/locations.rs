// 🗺️ Location grouping for the map placeholder
// No geocoding: known cities come from a fixed table, others get no marker.

use crate::college::CollegeRecord;
use serde::Serialize;

struct CityCoordinates {
    city: &'static str,
    lat: f64,
    lng: f64,
    display_name: &'static str,
}

const CITY_TABLE: &[CityCoordinates] = &[
    CityCoordinates {
        city: "New Delhi",
        lat: 28.6139,
        lng: 77.2090,
        display_name: "New Delhi, Delhi",
    },
    CityCoordinates {
        city: "Mumbai",
        lat: 19.0760,
        lng: 72.8777,
        display_name: "Mumbai, Maharashtra",
    },
    CityCoordinates {
        city: "Vellore",
        lat: 12.9165,
        lng: 79.1325,
        display_name: "Vellore, Tamil Nadu",
    },
    CityCoordinates {
        city: "Manipal",
        lat: 13.3409,
        lng: 74.7421,
        display_name: "Manipal, Karnataka",
    },
    CityCoordinates {
        city: "Pilani",
        lat: 28.3670,
        lng: 75.6032,
        display_name: "Pilani, Rajasthan",
    },
    CityCoordinates {
        city: "Tiruchirappalli",
        lat: 10.7905,
        lng: 78.7047,
        display_name: "Tiruchirappalli, Tamil Nadu",
    },
    CityCoordinates {
        city: "Kolkata",
        lat: 22.5726,
        lng: 88.3639,
        display_name: "Kolkata, West Bengal",
    },
    CityCoordinates {
        city: "Pune",
        lat: 18.5204,
        lng: 73.8567,
        display_name: "Pune, Maharashtra",
    },
    CityCoordinates {
        city: "Lucknow",
        lat: 26.8467,
        lng: 80.9462,
        display_name: "Lucknow, Uttar Pradesh",
    },
];

/// Marker position as percentages of an equirectangular world map
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Marker {
    pub lat: f64,
    pub lng: f64,
    pub x_percent: f64,
    pub y_percent: f64,
}

impl Marker {
    fn new(lat: f64, lng: f64) -> Self {
        Marker {
            lat,
            lng,
            x_percent: (lng + 180.0) / 360.0 * 100.0,
            y_percent: (90.0 - lat) / 180.0 * 100.0,
        }
    }
}

/// Colleges sharing one `location` value
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LocationGroup {
    pub location: String,
    pub display_name: String,
    pub marker: Option<Marker>,
    pub colleges: Vec<CollegeRecord>,
}

impl LocationGroup {
    /// "1 college found" / "3 colleges found"
    pub fn summary(&self) -> String {
        let n = self.colleges.len();
        format!("{} college{} found", n, if n == 1 { "" } else { "s" })
    }
}

/// Group by exact location, groups in first-seen order.
pub fn group_by_location(colleges: &[CollegeRecord]) -> Vec<LocationGroup> {
    let mut groups: Vec<LocationGroup> = Vec::new();

    for college in colleges {
        match groups.iter_mut().find(|g| g.location == college.location) {
            Some(group) => group.colleges.push(college.clone()),
            None => {
                let known = CITY_TABLE.iter().find(|c| c.city == college.location);
                groups.push(LocationGroup {
                    location: college.location.clone(),
                    display_name: known
                        .map(|c| c.display_name.to_string())
                        .unwrap_or_else(|| college.location.clone()),
                    marker: known.map(|c| Marker::new(c.lat, c.lng)),
                    colleges: vec![college.clone()],
                });
            }
        }
    }

    groups
}
