use chrono::{Datelike, NaiveDate};
use rota_shared::{Addon, Package};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Active add-ons and packages of one attraction, in display order
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AddonCatalog {
    addons: Vec<Addon>,
    packages: Vec<Package>,
}

impl AddonCatalog {
    /// Inactive rows are dropped; the rest is sorted by `display_order`.
    pub fn new(addons: Vec<Addon>, packages: Vec<Package>) -> Self {
        let mut addons: Vec<Addon> = addons.into_iter().filter(|a| a.is_active).collect();
        let mut packages: Vec<Package> = packages.into_iter().filter(|p| p.is_active).collect();
        addons.sort_by_key(|a| a.display_order);
        packages.sort_by_key(|p| p.display_order);
        Self { addons, packages }
    }

    pub fn addons(&self) -> &[Addon] {
        &self.addons
    }

    pub fn packages(&self) -> &[Package] {
        &self.packages
    }

    pub fn has_addons(&self) -> bool {
        !self.addons.is_empty()
    }

    pub fn has_packages(&self) -> bool {
        !self.packages.is_empty()
    }

    pub fn addon_by_id(&self, id: &Uuid) -> Option<&Addon> {
        self.addons.iter().find(|a| &a.id == id)
    }

    pub fn package_by_id(&self, id: &Uuid) -> Option<&Package> {
        self.packages.iter().find(|p| &p.id == id)
    }

    /// Add-ons bundled in a package. Ids missing from the catalog are skipped.
    pub fn package_addons(&self, package_id: &Uuid) -> Vec<&Addon> {
        self.package_by_id(package_id)
            .map(|pkg| {
                pkg.included_addon_ids
                    .iter()
                    .filter_map(|id| self.addon_by_id(id))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Add-ons offered for this party, date and resource
    pub fn available_addons(
        &self,
        party_size: u32,
        date: Option<NaiveDate>,
        resource_id: Option<Uuid>,
    ) -> Vec<&Addon> {
        self.addons
            .iter()
            .filter(|a| is_addon_available(a, party_size, date, resource_id))
            .collect()
    }

    /// Packages offered for this party and date
    pub fn available_packages(&self, party_size: u32, date: Option<NaiveDate>) -> Vec<&Package> {
        self.packages
            .iter()
            .filter(|p| is_package_available(p, party_size, date))
            .collect()
    }
}

fn weekday_index(date: NaiveDate) -> u8 {
    // 0 = Sunday
    date.weekday().num_days_from_sunday() as u8
}

pub fn is_addon_available(
    addon: &Addon,
    party_size: u32,
    date: Option<NaiveDate>,
    resource_id: Option<Uuid>,
) -> bool {
    if !addon.is_active {
        return false;
    }
    let Some(rules) = &addon.availability_rules else {
        return true;
    };

    if rules.min_party_size.is_some_and(|min| party_size < min) {
        return false;
    }
    if rules.max_party_size.is_some_and(|max| party_size > max) {
        return false;
    }

    if let Some(date) = date {
        if !rules.days_of_week.is_empty() && !rules.days_of_week.contains(&weekday_index(date)) {
            return false;
        }
    }

    if let Some(resource_id) = resource_id {
        if !rules.resource_ids.is_empty() && !rules.resource_ids.contains(&resource_id) {
            return false;
        }
    }

    true
}

pub fn is_package_available(package: &Package, party_size: u32, date: Option<NaiveDate>) -> bool {
    if !package.is_active {
        return false;
    }
    if package.party_size_min.is_some_and(|min| party_size < min) {
        return false;
    }
    if package.party_size_max.is_some_and(|max| party_size > max) {
        return false;
    }

    let (Some(rules), Some(date)) = (&package.validity_rules, date) else {
        return true;
    };
    if rules.valid_from.is_some_and(|from| date < from) {
        return false;
    }
    if rules.valid_until.is_some_and(|until| date > until) {
        return false;
    }
    if !rules.days_of_week.is_empty() && !rules.days_of_week.contains(&weekday_index(date)) {
        return false;
    }
    !rules.blackout_dates.contains(&date)
}
