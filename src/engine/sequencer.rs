use crate::geo::haversine_km;
use crate::models::route::Stop;
use crate::models::GeoPoint;

/// A stop paired with its geocoded coordinate for the duration of one
/// optimization pass.
#[derive(Debug, Clone)]
pub struct PlacedStop {
    pub stop: Stop,
    pub point: GeoPoint,
}

/// Nearest-neighbor ordering with traffic-adjusted distance. Greedy and
/// deterministic: ties go to the earliest stop in input order. Not a
/// globally minimal tour.
pub fn sequence_stops(
    start: &GeoPoint,
    stops: Vec<PlacedStop>,
    traffic_factor: f64,
) -> Vec<PlacedStop> {
    if stops.len() <= 1 {
        let mut stops = stops;
        if let Some(only) = stops.first_mut() {
            only.stop.sequence = 1;
        }
        return stops;
    }

    let mut remaining = stops;
    let mut ordered = Vec::with_capacity(remaining.len());
    let mut current = *start;

    while !remaining.is_empty() {
        let mut best_idx = 0;
        let mut best_adjusted = f64::INFINITY;

        for (idx, candidate) in remaining.iter().enumerate() {
            let adjusted = haversine_km(&current, &candidate.point) * traffic_factor;
            if adjusted < best_adjusted {
                best_adjusted = adjusted;
                best_idx = idx;
            }
        }

        let mut placed = remaining.remove(best_idx);
        current = placed.point;
        placed.stop.sequence = ordered.len() as u32 + 1;
        ordered.push(placed);
    }

    ordered
}

#[cfg(test)]
mod tests {
    use uuid::Uuid;

    use super::{sequence_stops, PlacedStop};
    use crate::models::route::Stop;
    use crate::models::GeoPoint;

    fn placed(address: &str, lat: f64, lng: f64) -> PlacedStop {
        PlacedStop {
            stop: Stop {
                order_id: Uuid::new_v4(),
                address: address.to_string(),
                sequence: 0,
                estimated_arrival: None,
            },
            point: GeoPoint { lat, lng },
        }
    }

    #[test]
    fn collinear_stops_are_visited_in_line_order() {
        let start = GeoPoint { lat: 0.0, lng: 0.0 };
        let stops = vec![
            placed("far", 0.0, 0.3),
            placed("near", 0.0, 0.1),
            placed("mid", 0.0, 0.2),
        ];

        let ordered = sequence_stops(&start, stops, 1.0);

        let addresses: Vec<&str> = ordered
            .iter()
            .map(|p| p.stop.address.as_str())
            .collect();
        assert_eq!(addresses, vec!["near", "mid", "far"]);

        let sequences: Vec<u32> = ordered.iter().map(|p| p.stop.sequence).collect();
        assert_eq!(sequences, vec![1, 2, 3]);
    }

    #[test]
    fn equidistant_candidates_break_ties_by_input_order() {
        let start = GeoPoint { lat: 0.0, lng: 0.0 };
        let stops = vec![
            placed("east", 0.0, 0.1),
            placed("west", 0.0, -0.1),
        ];

        let ordered = sequence_stops(&start, stops, 1.0);
        assert_eq!(ordered[0].stop.address, "east");
        assert_eq!(ordered[1].stop.address, "west");
    }

    #[test]
    fn single_stop_passes_through_with_sequence_one() {
        let start = GeoPoint { lat: 0.0, lng: 0.0 };
        let stops = vec![placed("only", 1.0, 1.0)];

        let ordered = sequence_stops(&start, stops, 1.8);
        assert_eq!(ordered.len(), 1);
        assert_eq!(ordered[0].stop.sequence, 1);
    }

    #[test]
    fn empty_input_yields_empty_output() {
        let start = GeoPoint { lat: 0.0, lng: 0.0 };
        assert!(sequence_stops(&start, Vec::new(), 1.0).is_empty());
    }

    #[test]
    fn uniform_traffic_factor_does_not_change_the_ordering() {
        let start = GeoPoint { lat: 0.0, lng: 0.0 };
        let stops = vec![
            placed("b", 0.0, 0.2),
            placed("a", 0.0, 0.1),
            placed("c", 0.0, 0.3),
        ];

        let calm = sequence_stops(&start, stops.clone(), 1.0);
        let rush = sequence_stops(&start, stops, 1.8);

        let calm_order: Vec<&str> = calm.iter().map(|p| p.stop.address.as_str()).collect();
        let rush_order: Vec<&str> = rush.iter().map(|p| p.stop.address.as_str()).collect();
        assert_eq!(calm_order, rush_order);
    }
}
