use chrono::NaiveDate;
use serde::Deserialize;
use skybook_shared::Flight;

/// Optional browse filters. Every supplied filter must match (logical AND);
/// absent or blank filters are no-ops.
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct FlightFilter {
    pub departure_city: Option<String>,
    pub arrival_city: Option<String>,
    /// UTC calendar date of departure
    pub date: Option<NaiveDate>,
    #[serde(default)]
    pub exclusive_only: bool,
}

/// One typed condition derived from a [`FlightFilter`]. Storage backends
/// render these with bound parameters, never by splicing values into SQL.
#[derive(Debug, Clone, PartialEq)]
pub enum FlightPredicate {
    DepartureCity(String),
    ArrivalCity(String),
    DepartureDate(NaiveDate),
    ExclusiveOnly,
}

impl FlightPredicate {
    pub fn matches(&self, flight: &Flight) -> bool {
        match self {
            FlightPredicate::DepartureCity(city) => flight.origin == *city,
            FlightPredicate::ArrivalCity(city) => flight.destination == *city,
            FlightPredicate::DepartureDate(date) => flight.departure_time.date_naive() == *date,
            FlightPredicate::ExclusiveOnly => flight.is_exclusive,
        }
    }
}

impl FlightFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn departing_from(mut self, city: impl Into<String>) -> Self {
        self.departure_city = Some(city.into());
        self
    }

    pub fn arriving_at(mut self, city: impl Into<String>) -> Self {
        self.arrival_city = Some(city.into());
        self
    }

    pub fn on_date(mut self, date: NaiveDate) -> Self {
        self.date = Some(date);
        self
    }

    pub fn exclusive(mut self) -> Self {
        self.exclusive_only = true;
        self
    }

    pub fn predicates(&self) -> Vec<FlightPredicate> {
        let mut predicates = Vec::new();

        if let Some(city) = non_blank(&self.departure_city) {
            predicates.push(FlightPredicate::DepartureCity(city));
        }
        if let Some(city) = non_blank(&self.arrival_city) {
            predicates.push(FlightPredicate::ArrivalCity(city));
        }
        if let Some(date) = self.date {
            predicates.push(FlightPredicate::DepartureDate(date));
        }
        if self.exclusive_only {
            predicates.push(FlightPredicate::ExclusiveOnly);
        }

        predicates
    }

    /// In-process evaluation, including the free-seat condition.
    pub fn matches(&self, flight: &Flight) -> bool {
        flight.has_available_seats() && self.predicates().iter().all(|p| p.matches(flight))
    }
}

fn non_blank(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use skybook_shared::{FlightId, NewFlight};

    fn flight(origin: &str, destination: &str, day: u32, exclusive: bool, seats: i32) -> Flight {
        let mut flight = NewFlight {
            flight_number: "BA1".to_string(),
            origin: origin.to_string(),
            destination: destination.to_string(),
            departure_time: Utc.with_ymd_and_hms(2024, 12, day, 23, 30, 0).unwrap(),
            arrival_time: Utc.with_ymd_and_hms(2024, 12, day + 1, 1, 0, 0).unwrap(),
            price_amount: 10000,
            price_currency: "EUR".to_string(),
            is_exclusive: exclusive,
            capacity: 10,
        }
        .into_flight(FlightId::new());
        flight.available_seats = seats;
        flight
    }

    #[test]
    fn test_filter_deserialization() {
        let json = r#"
            {
                "departure_city": "Sofia",
                "date": "2024-12-25"
            }
        "#;
        let filter: FlightFilter = serde_json::from_str(json).expect("Failed to deserialize");
        assert_eq!(filter.departure_city.as_deref(), Some("Sofia"));
        assert!(!filter.exclusive_only);
        assert_eq!(
            filter.predicates(),
            vec![
                FlightPredicate::DepartureCity("Sofia".to_string()),
                FlightPredicate::DepartureDate(NaiveDate::from_ymd_opt(2024, 12, 25).unwrap()),
            ]
        );
    }

    #[test]
    fn test_empty_filter_matches_any_flight_with_seats() {
        let filter = FlightFilter::new();
        assert!(filter.predicates().is_empty());
        assert!(filter.matches(&flight("Sofia", "Varna", 10, false, 3)));
        assert!(!filter.matches(&flight("Sofia", "Varna", 10, false, 0)));
    }

    #[test]
    fn test_blank_cities_are_ignored() {
        let filter = FlightFilter::new().departing_from("  ").arriving_at("");
        assert!(filter.predicates().is_empty());
    }

    #[test]
    fn test_filters_combine_with_and() {
        let filter = FlightFilter::new()
            .departing_from("Sofia")
            .arriving_at("London")
            .on_date(NaiveDate::from_ymd_opt(2024, 12, 24).unwrap())
            .exclusive();

        assert!(filter.matches(&flight("Sofia", "London", 24, true, 1)));
        assert!(!filter.matches(&flight("Sofia", "London", 24, false, 1)));
        assert!(!filter.matches(&flight("Sofia", "Paris", 24, true, 1)));
        assert!(!filter.matches(&flight("Varna", "London", 24, true, 1)));
        // Arrival falls on the 25th, departure date is what counts
        assert!(!filter.matches(&flight("Sofia", "London", 25, true, 1)));
    }
}
