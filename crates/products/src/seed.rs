//! Demo records inserted into an empty store.

use chrono::NaiveDate;

use shelf_core::DomainResult;

use crate::product::{Price, Product, parse_start_date};

/// (name, price in cents, rating, start date; `None` means "today").
const SEED: [(&str, u32, i32, Option<&str>); 4] = [
    ("Katana", 8050, 2, Some("2013-02-28")),
    ("Sais", 4487, 5, None),
    ("Nunchakus", 3505, 4, Some("2015-04-01")),
    ("Bo", 5623, 3, None),
];

/// Build the demo products, in insertion order.
pub fn seed_products(today: NaiveDate) -> DomainResult<Vec<Product>> {
    SEED.iter()
        .map(|&(name, cents, rating, start)| {
            let start_date = match start {
                Some(s) => parse_start_date(s)?,
                None => today,
            };
            Product::new(name, Price::from_cents(cents), rating, start_date)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seed_has_four_uniquely_named_products_in_order() {
        let today = parse_start_date("2024-06-01").unwrap();
        let products = seed_products(today).unwrap();

        let names: Vec<&str> = products.iter().map(Product::name).collect();
        assert_eq!(names, ["Katana", "Sais", "Nunchakus", "Bo"]);
    }

    #[test]
    fn undated_seed_products_start_today() {
        let today = parse_start_date("2024-06-01").unwrap();
        let products = seed_products(today).unwrap();

        assert_eq!(products[0].detail_line(), "$80.50, 2 stars, sold since 2013-02-28");
        assert_eq!(products[1].start_date(), today);
        assert_eq!(products[3].start_date(), today);
        assert_eq!(products[2].price().to_string(), "$35.05");
    }
}
