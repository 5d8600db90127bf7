//! Reporting utilities: comparable listings, price histogram, terminal output.

use crate::domain::Listing;

pub mod format;
pub mod histogram;

pub use format::*;
pub use histogram::*;

/// Number of comparable listings shown per table.
pub const COMPARABLE_COUNT: usize = 5;

/// Most recent listings in `town`, newest month first.
///
/// The sort is stable, so listings from the same month keep their file order.
pub fn latest_listings(listings: &[Listing], town: &str, n: usize) -> Vec<Listing> {
    let mut rows: Vec<&Listing> = listings.iter().filter(|l| l.town == town).collect();
    rows.sort_by(|a, b| b.month.cmp(&a.month));
    rows.into_iter().take(n).cloned().collect()
}

/// Listings in `town` closest in floor area to `floor_area_sqm`.
///
/// Ties keep file order.
pub fn closest_listings(listings: &[Listing], town: &str, floor_area_sqm: f64, n: usize) -> Vec<Listing> {
    let mut rows: Vec<(f64, &Listing)> = listings
        .iter()
        .filter(|l| l.town == town)
        .map(|l| ((l.floor_area_sqm - floor_area_sqm).abs(), l))
        .collect();
    rows.sort_by(|a, b| a.0.total_cmp(&b.0));
    rows.into_iter().take(n).map(|(_, l)| l.clone()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn listing(month: u32, town: &str, area: f64, price: f64) -> Listing {
        Listing {
            month: NaiveDate::from_ymd_opt(2017, month, 1).unwrap(),
            town: town.to_string(),
            flat_type: "4 ROOM".to_string(),
            storey_range: "04 TO 06".to_string(),
            flat_model: None,
            floor_area_sqm: area,
            lease_commence_date: 1990,
            resale_price: price,
        }
    }

    fn sample() -> Vec<Listing> {
        vec![
            listing(1, "BEDOK", 90.0, 1.0),
            listing(3, "BEDOK", 100.0, 2.0),
            listing(2, "BISHAN", 95.0, 3.0),
            listing(3, "BEDOK", 70.0, 4.0),
            listing(5, "BEDOK", 120.0, 5.0),
            listing(4, "BEDOK", 110.0, 6.0),
            listing(2, "BEDOK", 91.0, 7.0),
        ]
    }

    #[test]
    fn latest_sorted_by_month_desc_with_stable_ties() {
        let rows = latest_listings(&sample(), "BEDOK", COMPARABLE_COUNT);
        let prices: Vec<f64> = rows.iter().map(|l| l.resale_price).collect();
        assert_eq!(prices, vec![5.0, 6.0, 2.0, 4.0, 7.0]);
    }

    #[test]
    fn latest_for_unknown_town_is_empty() {
        assert!(latest_listings(&sample(), "ATLANTIS", 5).is_empty());
    }

    #[test]
    fn closest_by_floor_area() {
        let rows = closest_listings(&sample(), "BEDOK", 95.0, 3);
        let prices: Vec<f64> = rows.iter().map(|l| l.resale_price).collect();
        // |90-95|=5 and |100-95|=5 tie -> file order; then 91 (4) comes first.
        assert_eq!(prices, vec![7.0, 1.0, 2.0]);
    }
}
