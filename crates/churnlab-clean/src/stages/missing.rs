use churnlab_core::PlanCatalog;

use crate::stages::Repaired;
use crate::stages::parse::ParsedCustomer;

/// Prices closer than this to the catalog price are treated as equal.
pub const PRICE_TOLERANCE: f64 = 0.005;

/// Fill a missing price from the catalog, or correct one that disagrees with
/// it. Prices of unknown plans are left for validation to reject.
pub fn fill_price(price: Option<f64>, plan_name: &str, catalog: &PlanCatalog) -> Repaired<Option<f64>> {
    let Some(canonical) = catalog.price_of(plan_name) else {
        return Repaired::unchanged(price);
    };
    match price {
        Some(value) if (value - canonical).abs() <= PRICE_TOLERANCE => {
            Repaired::unchanged(Some(value))
        }
        _ => Repaired::changed(Some(canonical)),
    }
}

/// Replace a missing region with the sentinel.
pub fn fill_region(region: Option<String>, sentinel: &str) -> Repaired<String> {
    match region {
        Some(value) => Repaired::unchanged(value),
        None => Repaired::changed(sentinel.to_string()),
    }
}

/// Map a region outside the enumeration to the sentinel.
pub fn restrict_region(region: String, known: &[&str], sentinel: &str) -> Repaired<String> {
    if region == sentinel || known.contains(&region.as_str()) {
        Repaired::unchanged(region)
    } else {
        Repaired::changed(sentinel.to_string())
    }
}

/// Which repairs touched a row.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MissingRepairs {
    pub price_filled: bool,
    pub price_corrected: bool,
    pub region_filled: bool,
    pub region_unrecognized: bool,
}

pub fn repair_row(
    customer: &mut ParsedCustomer,
    catalog: &PlanCatalog,
    known_regions: &[&str],
    sentinel: &str,
) -> MissingRepairs {
    let mut repairs = MissingRepairs::default();

    let was_missing = customer.plan_price.is_none();
    let price = fill_price(customer.plan_price, &customer.plan_name, catalog);
    if price.applied {
        repairs.price_filled = was_missing;
        repairs.price_corrected = !was_missing;
    }
    customer.plan_price = price.value;

    let filled = fill_region(customer.region.take(), sentinel);
    repairs.region_filled = filled.applied;
    let restricted = restrict_region(filled.value, known_regions, sentinel);
    repairs.region_unrecognized = restricted.applied;
    customer.region = Some(restricted.value);

    repairs
}

#[cfg(test)]
mod tests {
    use churnlab_core::UNKNOWN_REGION;

    use super::*;
    use crate::model::CleanOptions;
    use crate::stages::parse::parse_row;
    use crate::stages::test_rows::raw;
    use crate::stages::text::Vocabulary;

    #[test]
    fn missing_price_comes_from_catalog() {
        let catalog = PlanCatalog::standard();
        assert_eq!(
            fill_price(None, "Basic", &catalog),
            Repaired::changed(Some(9.99))
        );
        assert_eq!(
            fill_price(Some(15.99), "Standard", &catalog),
            Repaired::unchanged(Some(15.99))
        );
        assert_eq!(
            fill_price(Some(12.0), "Premium", &catalog),
            Repaired::changed(Some(22.99))
        );
        assert_eq!(fill_price(None, "Gold", &catalog), Repaired::unchanged(None));
    }

    #[test]
    fn regions_fall_back_to_sentinel() {
        let known = Vocabulary::standard().regions;
        assert_eq!(
            fill_region(None, UNKNOWN_REGION),
            Repaired::changed("Unknown".to_string())
        );
        assert_eq!(
            restrict_region("Atlantis".to_string(), &known, UNKNOWN_REGION),
            Repaired::changed("Unknown".to_string())
        );
        assert_eq!(
            restrict_region("Unknown".to_string(), &known, UNKNOWN_REGION),
            Repaired::unchanged("Unknown".to_string())
        );
    }

    #[test]
    fn repair_row_distinguishes_fill_from_correction() {
        let catalog = PlanCatalog::standard();
        let known = Vocabulary::standard().regions;
        let formats = CleanOptions::default().date_formats;

        let mut row = raw(1);
        row.plan_price = None;
        row.region = None;
        let mut parsed = parse_row(row, &formats).customer;
        let repairs = repair_row(&mut parsed, &catalog, &known, UNKNOWN_REGION);
        assert!(repairs.price_filled && !repairs.price_corrected);
        assert!(repairs.region_filled && !repairs.region_unrecognized);
        assert_eq!(parsed.plan_price, Some(15.99));
        assert_eq!(parsed.region.as_deref(), Some("Unknown"));

        let mut row = raw(3);
        row.plan_price = Some("19.99".to_string());
        let mut parsed = parse_row(row, &formats).customer;
        let repairs = repair_row(&mut parsed, &catalog, &known, UNKNOWN_REGION);
        assert!(repairs.price_corrected && !repairs.price_filled);
        assert_eq!(parsed.plan_price, Some(15.99));
    }
}
