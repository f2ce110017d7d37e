//! Harvest-window derivations evaluated against a calendar day.
//!
//! # Invariants
//! - Without a harvest window status is `Planted` and countdown is unknown.
//! - Countdown never goes negative: an ended window reports `0`, same as a
//!   window starting today.

use crate::model::plant::{Plant, PlantStatus};
use jiff::civil::Date;
use std::fmt::{Display, Formatter};

/// Days ahead within which an upcoming harvest is announced.
pub const HARVEST_NOTICE_DAYS: i64 = 7;

/// Derives `Planted`, `Maturing` or `ReadyToHarvest` for `today`.
pub fn plant_status(plant: &Plant, today: Date) -> PlantStatus {
    plant.status_on(today)
}

/// Whole days until the harvest window opens, clamped at zero.
///
/// Returns `None` when the plant has no harvest window.
pub fn days_until_harvest(plant: &Plant, today: Date) -> Option<i64> {
    let window = plant.harvest_window()?;
    Some(days_between(today, window.start).max(0))
}

/// Harvest reminder derived from the countdown.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HarvestNotice {
    /// Window opens within `HARVEST_NOTICE_DAYS`.
    Upcoming { days: i64 },
    /// Today is inside the window.
    ReadyNow,
}

/// Unlike a plain zero countdown, `ReadyNow` is only reported while today is
/// inside the window; an ended window yields `None`.
pub fn harvest_notice(plant: &Plant, today: Date) -> Option<HarvestNotice> {
    let days = days_until_harvest(plant, today)?;
    if (1..=HARVEST_NOTICE_DAYS).contains(&days) {
        return Some(HarvestNotice::Upcoming { days });
    }
    // Zero also covers windows that already closed.
    if days == 0 && plant_status(plant, today) == PlantStatus::ReadyToHarvest {
        return Some(HarvestNotice::ReadyNow);
    }
    None
}

/// Human-oriented distance between today and a target day.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelativeDue {
    Overdue { days: i64 },
    Today,
    Tomorrow,
    InDays(i64),
    InWeeks(i64),
    InMonths(i64),
}

pub fn relative_due(target: Date, today: Date) -> RelativeDue {
    match days_between(today, target) {
        days if days < 0 => RelativeDue::Overdue { days: -days },
        0 => RelativeDue::Today,
        1 => RelativeDue::Tomorrow,
        days if days <= 7 => RelativeDue::InDays(days),
        days if days <= 30 => RelativeDue::InWeeks(days / 7),
        days => RelativeDue::InMonths(days / 30),
    }
}

impl Display for RelativeDue {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Overdue { days } => write!(f, "overdue by {days} day(s)"),
            Self::Today => write!(f, "due today"),
            Self::Tomorrow => write!(f, "tomorrow"),
            Self::InDays(days) => write!(f, "in {days} days"),
            Self::InWeeks(weeks) => write!(f, "in {weeks} week(s)"),
            Self::InMonths(months) => write!(f, "in {months} month(s)"),
        }
    }
}

/// Next care step: the first phase scheduled at or after the current
/// planting week, as its first task or else its description.
///
/// Phases without an offset, or with offset `0`, are never picked.
pub fn next_care_task(plant: &Plant, today: Date) -> Option<&str> {
    let ai_data = plant.ai_data.as_ref()?;
    let weeks_since_planting = days_between(plant.planted_date, today).div_euclid(7);
    let phase = ai_data.care_plan.iter().find(|phase| {
        phase
            .weeks_from_planting
            .is_some_and(|weeks| weeks > 0 && i64::from(weeks) >= weeks_since_planting)
    })?;
    phase
        .tasks
        .first()
        .map(String::as_str)
        .filter(|task| !task.trim().is_empty())
        .or_else(|| Some(phase.description.as_str()).filter(|text| !text.trim().is_empty()))
}

/// Percent of the way from planting to the harvest window start, rounded
/// and clamped to `0..=100`.
///
/// Returns `None` when the plant has no harvest window. A window starting on
/// the planting day counts as a one-day stretch.
pub fn harvest_progress(plant: &Plant, today: Date) -> Option<u8> {
    let window = plant.harvest_window()?;
    let total = days_between(plant.planted_date, window.start).max(1);
    let elapsed = days_between(plant.planted_date, today).clamp(0, total);
    let percent = (elapsed * 100 + total / 2) / total;
    Some(u8::try_from(percent).unwrap_or(100))
}

fn days_between(from: Date, to: Date) -> i64 {
    // Any two civil dates are at most ~7.3M days apart, which `Span` days
    // can always hold, so `until` does not fail here.
    from.until(to)
        .map_or(0, |span| i64::from(span.get_days()))
}

#[cfg(test)]
mod tests {
    use super::{
        days_until_harvest, harvest_notice, harvest_progress, next_care_task, plant_status,
        relative_due, HarvestNotice, RelativeDue,
    };
    use crate::model::plant::{
        AiData, CarePlanPhase, HarvestWindow, Plant, PlantDraft, PlantStatus, SunCategory,
        SunNeeds, WaterNeeds,
    };
    use jiff::civil::{date, Date};
    use jiff::{Timestamp, ToSpan};

    const TODAY: Date = date(2024, 6, 10);

    fn plant_with_window(start: Date, end: Date) -> Plant {
        let mut plant = Plant::from_draft(
            PlantDraft::new("Paradicsom", date(2024, 4, 1)),
            Timestamp::UNIX_EPOCH,
        );
        plant.ai_data = Some(AiData {
            harvest_window: HarvestWindow {
                start,
                end,
                description: String::new(),
            },
            water_needs: WaterNeeds {
                frequency: "naponta".to_string(),
                details: String::new(),
            },
            sun_needs: SunNeeds {
                hours: 8.0,
                category: SunCategory::FullSun,
                details: String::new(),
            },
            care_plan: Vec::new(),
            recipes: Vec::new(),
            fetched_at: Timestamp::UNIX_EPOCH,
        });
        plant
    }

    #[test]
    fn status_follows_window_boundaries() {
        let ready = plant_with_window(TODAY, TODAY + 5.days());
        assert_eq!(plant_status(&ready, TODAY), PlantStatus::ReadyToHarvest);

        let last_day = plant_with_window(TODAY - 5.days(), TODAY);
        assert_eq!(plant_status(&last_day, TODAY), PlantStatus::ReadyToHarvest);

        let maturing = plant_with_window(TODAY + 3.days(), TODAY + 10.days());
        assert_eq!(plant_status(&maturing, TODAY), PlantStatus::Maturing);

        let ended = plant_with_window(TODAY - 10.days(), TODAY - 1.day());
        assert_eq!(plant_status(&ended, TODAY), PlantStatus::Planted);
    }

    #[test]
    fn status_without_ai_data_is_planted() {
        let plant = Plant::from_draft(PlantDraft::new("Retek", TODAY), Timestamp::UNIX_EPOCH);
        assert_eq!(plant_status(&plant, TODAY), PlantStatus::Planted);
        assert_eq!(days_until_harvest(&plant, TODAY), None);
        assert_eq!(harvest_notice(&plant, TODAY), None);
    }

    #[test]
    fn countdown_is_clamped_at_zero() {
        let ahead = plant_with_window(TODAY + 4.days(), TODAY + 20.days());
        assert_eq!(days_until_harvest(&ahead, TODAY), Some(4));

        let started = plant_with_window(TODAY - 1.day(), TODAY + 20.days());
        assert_eq!(days_until_harvest(&started, TODAY), Some(0));

        let ended = plant_with_window(TODAY - 30.days(), TODAY - 20.days());
        assert_eq!(days_until_harvest(&ended, TODAY), Some(0));
    }

    #[test]
    fn notice_distinguishes_open_and_closed_windows() {
        let soon = plant_with_window(TODAY + 2.days(), TODAY + 9.days());
        assert_eq!(
            harvest_notice(&soon, TODAY),
            Some(HarvestNotice::Upcoming { days: 2 })
        );

        let far = plant_with_window(TODAY + 8.days(), TODAY + 9.days());
        assert_eq!(harvest_notice(&far, TODAY), None);

        let open = plant_with_window(TODAY - 1.day(), TODAY + 9.days());
        assert_eq!(harvest_notice(&open, TODAY), Some(HarvestNotice::ReadyNow));

        let closed = plant_with_window(TODAY - 9.days(), TODAY - 1.day());
        assert_eq!(harvest_notice(&closed, TODAY), None);
    }

    #[test]
    fn relative_due_buckets() {
        assert_eq!(
            relative_due(TODAY - 3.days(), TODAY),
            RelativeDue::Overdue { days: 3 }
        );
        assert_eq!(relative_due(TODAY, TODAY), RelativeDue::Today);
        assert_eq!(relative_due(TODAY + 1.day(), TODAY), RelativeDue::Tomorrow);
        assert_eq!(relative_due(TODAY + 7.days(), TODAY), RelativeDue::InDays(7));
        assert_eq!(relative_due(TODAY + 15.days(), TODAY), RelativeDue::InWeeks(2));
        assert_eq!(relative_due(TODAY + 65.days(), TODAY), RelativeDue::InMonths(2));
    }

    fn phase(weeks: Option<u32>, description: &str, tasks: &[&str]) -> CarePlanPhase {
        CarePlanPhase {
            phase: "Fázis".to_string(),
            weeks_from_planting: weeks,
            description: description.to_string(),
            tasks: tasks.iter().map(|task| task.to_string()).collect(),
        }
    }

    #[test]
    fn next_care_task_picks_first_phase_not_yet_passed() {
        // Planted 2024-04-01, so 2024-06-10 is in week 10.
        let mut plant = plant_with_window(TODAY + 20.days(), TODAY + 40.days());
        assert_eq!(next_care_task(&plant, TODAY), None);

        plant.ai_data.as_mut().unwrap().care_plan = vec![
            phase(None, "Folyamatos öntözés", &["Öntözés"]),
            phase(Some(0), "Ültetés", &["Palánta kiültetése"]),
            phase(Some(4), "Tápoldat", &["Tápoldatozás"]),
            phase(Some(10), "Kötözés", &["Karózás", "Kötözés"]),
            phase(Some(12), "Szüret", &[]),
        ];
        assert_eq!(next_care_task(&plant, TODAY), Some("Karózás"));
        assert_eq!(next_care_task(&plant, TODAY + 7.days()), Some("Szüret"));
        assert_eq!(next_care_task(&plant, TODAY + 21.days()), None);
    }

    #[test]
    fn next_care_task_without_tasks_or_description_is_none() {
        let mut plant = plant_with_window(TODAY + 20.days(), TODAY + 40.days());
        plant.ai_data.as_mut().unwrap().care_plan = vec![phase(Some(11), " ", &[""])];
        assert_eq!(next_care_task(&plant, TODAY), None);
    }

    #[test]
    fn harvest_progress_is_rounded_and_clamped() {
        // 70 days from planting to 2024-06-10.
        let halfway = plant_with_window(TODAY + 70.days(), TODAY + 80.days());
        assert_eq!(harvest_progress(&halfway, TODAY), Some(50));

        let third = plant_with_window(TODAY + 140.days(), TODAY + 150.days());
        assert_eq!(harvest_progress(&third, TODAY), Some(33));

        let started = plant_with_window(TODAY - 5.days(), TODAY + 5.days());
        assert_eq!(harvest_progress(&started, TODAY), Some(100));

        let before_planting = plant_with_window(TODAY, TODAY + 5.days());
        assert_eq!(harvest_progress(&before_planting, date(2024, 3, 1)), Some(0));

        let same_day = plant_with_window(date(2024, 4, 1), date(2024, 4, 30));
        assert_eq!(harvest_progress(&same_day, date(2024, 4, 1)), Some(0));
        assert_eq!(harvest_progress(&same_day, date(2024, 4, 2)), Some(100));

        let bare = Plant::from_draft(PlantDraft::new("Retek", TODAY), Timestamp::UNIX_EPOCH);
        assert_eq!(harvest_progress(&bare, TODAY), None);
    }
}
