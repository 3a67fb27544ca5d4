use std::path::Path;

use churnlab_core::{
    CUSTOMER_COLUMNS, PlanCatalog, RawCustomer, to_csv_bytes, write_bytes_atomic,
};

use crate::errors::GenerationError;

pub const PLAN_COLUMNS: [&str; 4] = ["plan_id", "plan_name", "price", "features"];

/// Encode raw customers with the shared column order.
pub fn raw_customers_csv(rows: &[RawCustomer]) -> Result<Vec<u8>, GenerationError> {
    Ok(to_csv_bytes(&CUSTOMER_COLUMNS, rows)?)
}

/// Write the plan lookup table. Returns the number of bytes written.
pub fn write_plans_csv(path: &Path, catalog: &PlanCatalog) -> Result<u64, GenerationError> {
    let data = to_csv_bytes(&PLAN_COLUMNS, &catalog.entries())?;
    write_bytes_atomic(path, &data)?;
    Ok(data.len() as u64)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_raw_set_still_has_header() {
        let bytes = raw_customers_csv(&[]).unwrap();
        let text = String::from_utf8(bytes).unwrap();
        assert_eq!(text.trim_end(), CUSTOMER_COLUMNS.join(","));
    }
}
