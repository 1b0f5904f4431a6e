use crate::ids::FlightId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Service tier of a seat. Exclusive flights sell business class only.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CabinClass {
    Economy,
    Business,
}

impl CabinClass {
    pub fn for_flight(is_exclusive: bool) -> Self {
        if is_exclusive {
            CabinClass::Business
        } else {
            CabinClass::Economy
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            CabinClass::Economy => "ECONOMY",
            CabinClass::Business => "BUSINESS",
        }
    }
}

impl fmt::Display for CabinClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CabinClass {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ECONOMY" => Ok(CabinClass::Economy),
            "BUSINESS" => Ok(CabinClass::Business),
            other => Err(format!("Unknown cabin class: {}", other)),
        }
    }
}

/// A scheduled flight together with its seat counter.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Flight {
    pub id: FlightId,
    pub flight_number: String,
    pub origin: String,
    pub destination: String,
    pub departure_time: DateTime<Utc>,
    pub arrival_time: DateTime<Utc>,
    /// Minor currency units (cents)
    pub price_amount: i32,
    pub price_currency: String,
    pub is_exclusive: bool,
    pub capacity: i32,
    pub available_seats: i32,
}

impl Flight {
    pub fn cabin_class(&self) -> CabinClass {
        CabinClass::for_flight(self.is_exclusive)
    }

    pub fn has_available_seats(&self) -> bool {
        self.available_seats > 0
    }

    /// Seats currently held by tickets, according to the counter
    pub fn booked_seats(&self) -> i32 {
        self.capacity - self.available_seats
    }
}

/// Flight as supplied by schedule seeding. Starts with every seat available.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewFlight {
    pub flight_number: String,
    pub origin: String,
    pub destination: String,
    pub departure_time: DateTime<Utc>,
    pub arrival_time: DateTime<Utc>,
    pub price_amount: i32,
    pub price_currency: String,
    #[serde(default)]
    pub is_exclusive: bool,
    pub capacity: i32,
}

impl NewFlight {
    pub fn into_flight(self, id: FlightId) -> Flight {
        Flight {
            id,
            flight_number: self.flight_number,
            origin: self.origin,
            destination: self.destination,
            departure_time: self.departure_time,
            arrival_time: self.arrival_time,
            price_amount: self.price_amount,
            price_currency: self.price_currency,
            is_exclusive: self.is_exclusive,
            capacity: self.capacity,
            available_seats: self.capacity,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_flight_deserialization() {
        let json = r#"
            {
                "flight_number": "BA101",
                "origin": "Sofia",
                "destination": "London",
                "departure_time": "2024-12-25T08:30:00Z",
                "arrival_time": "2024-12-25T10:45:00Z",
                "price_amount": 18900,
                "price_currency": "EUR",
                "capacity": 120
            }
        "#;
        let new_flight: NewFlight = serde_json::from_str(json).expect("Failed to deserialize");
        assert!(!new_flight.is_exclusive);

        let flight = new_flight.into_flight(FlightId::new());
        assert_eq!(flight.available_seats, 120);
        assert_eq!(flight.booked_seats(), 0);
        assert_eq!(flight.cabin_class(), CabinClass::Economy);
    }

    #[test]
    fn test_cabin_class_round_trips_through_text() {
        for class in [CabinClass::Economy, CabinClass::Business] {
            assert_eq!(class.as_str().parse::<CabinClass>().unwrap(), class);
        }
        assert!("FIRST".parse::<CabinClass>().is_err());
        assert_eq!(CabinClass::for_flight(true), CabinClass::Business);
    }
}
