use serde::{Deserialize, Serialize};

/// A named place with coordinates.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct City {
    pub name: String,
    pub lat: f64,
    pub lon: f64,
}

impl City {
    pub fn new(name: impl Into<String>, lat: f64, lon: f64) -> Self {
        Self {
            name: name.into(),
            lat,
            lon,
        }
    }
}

struct Entry {
    name: &'static str,
    lat: f64,
    lon: f64,
}

const CATALOG: [Entry; 5] = [
    Entry { name: "Москва", lat: 55.7558, lon: 37.6176 },
    Entry { name: "Санкт-Петербург", lat: 59.9343, lon: 30.3351 },
    Entry { name: "Новосибирск", lat: 55.0084, lon: 82.9357 },
    Entry { name: "Екатеринбург", lat: 56.8389, lon: 60.6057 },
    Entry { name: "Казань", lat: 55.7942, lon: 49.1115 },
];

impl Entry {
    fn to_city(&self) -> City {
        City::new(self.name, self.lat, self.lon)
    }
}

/// Case-insensitive exact match against the catalog.
pub fn find_by_name(name: &str) -> Option<City> {
    let needle = name.to_lowercase();
    CATALOG
        .iter()
        .find(|e| e.name.to_lowercase() == needle)
        .map(Entry::to_city)
}

/// Case-insensitive substring match, in catalog order. Empty text matches nothing.
pub fn search(text: &str) -> Vec<City> {
    let needle = text.to_lowercase();
    if needle.is_empty() {
        return vec![];
    }
    CATALOG
        .iter()
        .filter(|e| e.name.to_lowercase().contains(&needle))
        .map(Entry::to_city)
        .collect()
}
