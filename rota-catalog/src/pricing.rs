use indexmap::IndexMap;
use rota_shared::{Addon, AddonPricingType, Package};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::catalog::AddonCatalog;

/// Breakdown of what the customer will pay, in minor currency units
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceQuote {
    /// `base_price * party_size`, or the package price when one applies
    pub base_total: i64,
    pub package_price: Option<i64>,
    pub addon_total: i64,
    pub savings: i64,
    pub total: i64,
    pub currency: String,
}

/// Prices a booking from the attraction base price and its add-on catalog
#[derive(Debug, Clone)]
pub struct PricingEngine {
    base_price: i64,
    currency: String,
}

impl PricingEngine {
    pub fn new(base_price: i64, currency: impl Into<String>) -> Self {
        Self {
            base_price,
            currency: currency.into(),
        }
    }

    pub fn base_price(&self) -> i64 {
        self.base_price
    }

    pub fn currency(&self) -> &str {
        &self.currency
    }

    pub fn base_total(&self, party_size: u32) -> i64 {
        self.base_price * i64::from(party_size)
    }

    /// Sum over selected add-ons. Ids the catalog does not know contribute nothing.
    pub fn addon_total(
        &self,
        catalog: &AddonCatalog,
        selected: &IndexMap<Uuid, u32>,
        party_size: u32,
    ) -> i64 {
        selected
            .iter()
            .filter_map(|(id, quantity)| {
                catalog
                    .addon_by_id(id)
                    .map(|addon| addon_line_total(addon, *quantity, party_size))
            })
            .sum()
    }

    /// What the selected package saves against buying its parts separately.
    /// Zero when nothing is selected or the package is not in the catalog.
    pub fn package_savings(
        &self,
        catalog: &AddonCatalog,
        package_id: Option<Uuid>,
        party_size: u32,
    ) -> i64 {
        let Some(package) = package_id.and_then(|id| catalog.package_by_id(&id)) else {
            return 0;
        };
        let included = catalog.package_addons(&package.id);
        package_savings(package, &included, self.base_price, party_size)
    }

    /// Package price plus add-ons when a package resolves, otherwise base
    /// price times party size plus add-ons
    pub fn calculate_total(
        &self,
        catalog: &AddonCatalog,
        selected: &IndexMap<Uuid, u32>,
        package_id: Option<Uuid>,
        party_size: u32,
    ) -> i64 {
        self.quote(catalog, selected, package_id, party_size).total
    }

    pub fn quote(
        &self,
        catalog: &AddonCatalog,
        selected: &IndexMap<Uuid, u32>,
        package_id: Option<Uuid>,
        party_size: u32,
    ) -> PriceQuote {
        let package = package_id.and_then(|id| catalog.package_by_id(&id));
        let addon_total = self.addon_total(catalog, selected, party_size);
        let base_total = match package {
            Some(pkg) => pkg.price,
            None => self.base_total(party_size),
        };

        PriceQuote {
            base_total,
            package_price: package.map(|p| p.price),
            addon_total,
            savings: self.package_savings(catalog, package_id, party_size),
            total: base_total + addon_total,
            currency: self.currency.clone(),
        }
    }
}

/// Price of one add-on line
pub fn addon_line_total(addon: &Addon, quantity: u32, party_size: u32) -> i64 {
    let quantity = i64::from(quantity);
    match addon.pricing_type {
        AddonPricingType::PerPerson => addon.price * quantity * i64::from(party_size),
        AddonPricingType::PerBooking => addon.price * quantity,
    }
}

/// Savings of `package` given the add-ons it bundles.
///
/// A declared `original_price` wins; otherwise the package is compared with
/// the base price for the party plus one of each included add-on.
pub fn package_savings(
    package: &Package,
    included: &[&Addon],
    base_price: i64,
    party_size: u32,
) -> i64 {
    if let Some(original) = package.original_price {
        return original - package.price;
    }
    let addons: i64 = included.iter().map(|a| a.price).sum();
    let individual = base_price * i64::from(party_size) + addons;
    (individual - package.price).max(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn addon(price: i64, pricing_type: AddonPricingType) -> Addon {
        Addon {
            id: Uuid::new_v4(),
            attraction_id: Uuid::nil(),
            name: "Photo pack".to_string(),
            description: None,
            price,
            pricing_type,
            is_required: false,
            is_active: true,
            max_quantity: None,
            min_quantity: 0,
            category: None,
            display_order: 0,
            availability_rules: None,
        }
    }

    fn package(price: i64, original_price: Option<i64>, included: Vec<Uuid>) -> Package {
        Package {
            id: Uuid::new_v4(),
            attraction_id: Uuid::nil(),
            name: "Explorer".to_string(),
            description: None,
            price,
            original_price,
            discount_label: None,
            included_addon_ids: included,
            party_size_min: None,
            party_size_max: None,
            is_featured: false,
            is_active: true,
            display_order: 0,
            validity_rules: None,
        }
    }

    #[test]
    fn test_per_person_addon_total() {
        let snacks = addon(10, AddonPricingType::PerPerson);
        let selected = IndexMap::from([(snacks.id, 2)]);
        let catalog = AddonCatalog::new(vec![snacks], vec![]);
        let engine = PricingEngine::new(50, "NZD");

        assert_eq!(engine.addon_total(&catalog, &selected, 3), 60);
    }

    #[test]
    fn test_per_booking_addon_ignores_party_size() {
        let snacks = addon(10, AddonPricingType::PerBooking);
        let selected = IndexMap::from([(snacks.id, 2)]);
        let catalog = AddonCatalog::new(vec![snacks], vec![]);
        let engine = PricingEngine::new(50, "NZD");

        assert_eq!(engine.addon_total(&catalog, &selected, 3), 20);
        assert_eq!(engine.addon_total(&catalog, &selected, 9), 20);
    }

    #[test]
    fn test_unknown_addon_contributes_nothing() {
        let engine = PricingEngine::new(50, "NZD");
        let selected = IndexMap::from([(Uuid::new_v4(), 4)]);
        assert_eq!(engine.addon_total(&AddonCatalog::default(), &selected, 2), 0);
    }

    #[test]
    fn test_savings_with_original_price() {
        let pkg = package(120, Some(150), vec![]);
        assert_eq!(package_savings(&pkg, &[], 999, 7), 30);
    }

    #[test]
    fn test_savings_against_components() {
        let lunch = addon(25, AddonPricingType::PerBooking);
        let photos = addon(15, AddonPricingType::PerPerson);
        let pkg = package(100, None, vec![lunch.id, photos.id]);
        let pkg_id = pkg.id;
        let catalog = AddonCatalog::new(vec![lunch, photos], vec![pkg]);
        let engine = PricingEngine::new(40, "NZD");

        // 40 * 2 + 25 + 15 = 120 individually
        assert_eq!(engine.package_savings(&catalog, Some(pkg_id), 2), 20);
        // Package dearer than its parts never reports negative savings
        assert_eq!(engine.package_savings(&catalog, Some(pkg_id), 1), 0);
        assert_eq!(engine.package_savings(&catalog, None, 2), 0);
    }

    #[test]
    fn test_total_with_and_without_package() {
        let guide = addon(15, AddonPricingType::PerPerson);
        let pkg = package(90, None, vec![]);
        let pkg_id = pkg.id;
        let selected = IndexMap::from([(guide.id, 1)]);
        let catalog = AddonCatalog::new(vec![guide], vec![pkg]);
        let engine = PricingEngine::new(50, "NZD");

        assert_eq!(engine.calculate_total(&catalog, &selected, None, 2), 130);
        assert_eq!(engine.calculate_total(&catalog, &selected, Some(pkg_id), 2), 120);
        // Unresolvable package falls back to base price
        assert_eq!(
            engine.calculate_total(&catalog, &selected, Some(Uuid::new_v4()), 2),
            130
        );
    }

    #[test]
    fn test_quote_breakdown() {
        let pkg = package(120, Some(150), vec![]);
        let pkg_id = pkg.id;
        let catalog = AddonCatalog::new(vec![], vec![pkg]);
        let engine = PricingEngine::new(50, "NZD");

        let quote = engine.quote(&catalog, &IndexMap::new(), Some(pkg_id), 3);
        assert_eq!(quote.base_total, 120);
        assert_eq!(quote.package_price, Some(120));
        assert_eq!(quote.addon_total, 0);
        assert_eq!(quote.savings, 30);
        assert_eq!(quote.total, 120);
        assert_eq!(quote.currency, "NZD");
    }
}
