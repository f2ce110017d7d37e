//! Read-side helpers evaluated over an in-memory plant slice.
//!
//! All functions preserve the input order unless they sort, and sorting is
//! stable so ties keep mirror order.

use crate::model::plant::{Plant, PlantStatus};
use jiff::civil::Date;

/// Planting-date ordering used by list views.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortOrder {
    Ascending,
    /// Newest plantings first.
    #[default]
    Descending,
}

/// Combined dashboard filter. Unset criteria match everything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PlantQuery {
    pub search: Option<String>,
    pub location: Option<String>,
    pub status: Option<PlantStatus>,
    pub order: SortOrder,
}

/// Plants bucketed by derived status.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StatusGroups {
    pub planted: Vec<Plant>,
    pub maturing: Vec<Plant>,
    pub ready_to_harvest: Vec<Plant>,
}

impl StatusGroups {
    pub fn get(&self, status: PlantStatus) -> &[Plant] {
        match status {
            PlantStatus::Planted => &self.planted,
            PlantStatus::Maturing => &self.maturing,
            PlantStatus::ReadyToHarvest => &self.ready_to_harvest,
        }
    }
}

/// Case-insensitive substring match on name or variety.
pub fn matches_search(plant: &Plant, query: &str) -> bool {
    let needle = query.to_lowercase();
    plant.name.to_lowercase().contains(&needle)
        || plant
            .variety
            .as_deref()
            .is_some_and(|variety| variety.to_lowercase().contains(&needle))
}

pub fn search(plants: &[Plant], query: &str) -> Vec<Plant> {
    plants
        .iter()
        .filter(|plant| matches_search(plant, query))
        .cloned()
        .collect()
}

pub fn filter_by_location(plants: &[Plant], location: &str) -> Vec<Plant> {
    plants
        .iter()
        .filter(|plant| plant.location.as_deref() == Some(location))
        .cloned()
        .collect()
}

pub fn filter_by_status(plants: &[Plant], status: PlantStatus, today: Date) -> Vec<Plant> {
    plants
        .iter()
        .filter(|plant| plant.status_on(today) == status)
        .cloned()
        .collect()
}

/// Distinct non-empty locations in order of first occurrence.
pub fn locations(plants: &[Plant]) -> Vec<String> {
    let mut seen: Vec<String> = Vec::new();
    for location in plants.iter().filter_map(|plant| plant.location.as_deref()) {
        if !location.is_empty() && !seen.iter().any(|known| known == location) {
            seen.push(location.to_string());
        }
    }
    seen
}

pub fn sort_by_planting_date(plants: &[Plant], order: SortOrder) -> Vec<Plant> {
    let mut sorted = plants.to_vec();
    match order {
        SortOrder::Ascending => sorted.sort_by_key(|plant| plant.planted_date),
        SortOrder::Descending => sorted.sort_by(|a, b| b.planted_date.cmp(&a.planted_date)),
    }
    sorted
}

pub fn group_by_status(plants: &[Plant], today: Date) -> StatusGroups {
    let mut groups = StatusGroups::default();
    for plant in plants {
        let bucket = match plant.status_on(today) {
            PlantStatus::Planted => &mut groups.planted,
            PlantStatus::Maturing => &mut groups.maturing,
            PlantStatus::ReadyToHarvest => &mut groups.ready_to_harvest,
        };
        bucket.push(plant.clone());
    }
    groups
}

/// Applies search, location and status filters, then sorts.
pub fn apply_query(plants: &[Plant], query: &PlantQuery, today: Date) -> Vec<Plant> {
    let search = query
        .search
        .as_deref()
        .map(str::trim)
        .filter(|text| !text.is_empty());
    let filtered: Vec<Plant> = plants
        .iter()
        .filter(|plant| search.map_or(true, |text| matches_search(plant, text)))
        .filter(|plant| {
            query
                .location
                .as_deref()
                .map_or(true, |location| plant.location.as_deref() == Some(location))
        })
        .filter(|plant| {
            query
                .status
                .map_or(true, |status| plant.status_on(today) == status)
        })
        .cloned()
        .collect();
    sort_by_planting_date(&filtered, query.order)
}
