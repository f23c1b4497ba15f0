//! Carbon-equivalent arithmetic
//!
//! Pure functions over already-validated inputs. Validation of raw answers
//! (finite, non-negative) happens at the registry boundary before these run,
//! and display rounding happens in the report layer, so nothing here rounds
//! or rejects.

/// Convert a raw answer into its carbon equivalent (kg CO2)
pub fn carbon_equivalent(value: f64, coefficient: f64) -> f64 {
    value * coefficient
}

/// Sum the carbon equivalents of a sequence of (value, coefficient) pairs
///
/// An empty sequence yields 0. The result does not depend on the order of
/// the pairs beyond floating-point tolerance.
pub fn total_footprint<I>(pairs: I) -> f64
where
    I: IntoIterator<Item = (f64, f64)>,
{
    pairs
        .into_iter()
        .map(|(value, coefficient)| carbon_equivalent(value, coefficient))
        .sum()
}

// ==================== Tests ====================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_carbon_equivalent() {
        assert_eq!(carbon_equivalent(100.0, 0.45), 45.0);
        assert_eq!(carbon_equivalent(20.0, 1.2), 24.0);
        assert_eq!(carbon_equivalent(0.0, 5.0), 0.0);
        assert_eq!(carbon_equivalent(7.5, 0.0), 0.0);
    }

    #[test]
    fn test_total_footprint_scenario() {
        // 100 kWh at 0.45 plus 20 units at 1.2 -> 45 + 24 = 69
        let total = total_footprint(vec![(100.0, 0.45), (20.0, 1.2)]);
        assert!((total - 69.0).abs() < 1e-9);
    }

    #[test]
    fn test_total_footprint_empty() {
        assert_eq!(total_footprint(Vec::new()), 0.0);
    }

    #[test]
    fn test_total_footprint_matches_sum_of_equivalents() {
        let pairs = vec![(12.5, 0.3), (7.0, 2.1), (140.0, 0.05), (3.3, 1.7)];
        let expected: f64 = pairs
            .iter()
            .map(|&(v, c)| carbon_equivalent(v, c))
            .sum();
        assert_eq!(total_footprint(pairs), expected);
    }

    #[test]
    fn test_total_footprint_order_independent() {
        let pairs = vec![(100.0, 0.45), (20.0, 1.2), (3.0, 0.9), (55.5, 0.02)];
        let forward = total_footprint(pairs.clone());
        let mut reversed = pairs.clone();
        reversed.reverse();
        let backward = total_footprint(reversed);
        assert!((forward - backward).abs() < 1e-9);

        // A rotation as well, not just the mirror image
        let mut rotated = pairs;
        rotated.rotate_left(2);
        assert!((forward - total_footprint(rotated)).abs() < 1e-9);
    }
}
