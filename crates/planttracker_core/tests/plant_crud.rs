use jiff::civil::date;
use jiff::Timestamp;
use planttracker_core::db::open_db_in_memory;
use planttracker_core::{
    AiData, HarvestWindow, Plant, PlantField, PlantPatch, PlantRepository, RecipeDifficulty,
    RepoError, SqlitePlantRepository, SunCategory, SunNeeds, WaterNeeds,
};
use uuid::Uuid;

#[test]
fn add_and_get_roundtrip() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqlitePlantRepository::new(&conn);

    let mut plant = plant_with_fixed_id("00000000-0000-4000-8000-000000000001", "Paradicsom");
    plant.variety = Some("Cherry".to_string());
    plant.location = Some("Kert".to_string());
    plant.ai_data = Some(sample_ai_data());
    let id = repo.add(&plant).unwrap();

    let loaded = repo.get_by_id(id).unwrap().unwrap();
    assert_eq!(loaded, plant);
}

#[test]
fn get_missing_returns_none() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqlitePlantRepository::new(&conn);

    assert!(repo.get_by_id(Uuid::new_v4()).unwrap().is_none());
}

#[test]
fn add_duplicate_id_returns_duplicate_key() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqlitePlantRepository::new(&conn);

    let plant = plant_with_fixed_id("00000000-0000-4000-8000-000000000001", "Paprika");
    repo.add(&plant).unwrap();

    let err = repo.add(&plant).unwrap_err();
    assert!(matches!(err, RepoError::DuplicateKey(id) if id == plant.id));
    assert_eq!(repo.count().unwrap(), 1);
}

#[test]
fn update_merges_fields_and_reports_count() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqlitePlantRepository::new(&conn);

    let mut plant = plant_with_fixed_id("00000000-0000-4000-8000-000000000001", "Bazsalikom");
    plant.notes = Some("cserépben".to_string());
    repo.add(&plant).unwrap();

    let patch = PlantPatch {
        location: Some(Some("Erkély".to_string())),
        notes: Some(None),
        ..PlantPatch::default()
    };
    assert_eq!(repo.update(plant.id, &patch).unwrap(), 1);

    let loaded = repo.get_by_id(plant.id).unwrap().unwrap();
    assert_eq!(loaded.location.as_deref(), Some("Erkély"));
    assert_eq!(loaded.notes, None);
    assert_eq!(loaded.name, "Bazsalikom");
    assert_eq!(loaded.planted_date, plant.planted_date);

    assert_eq!(repo.update(Uuid::new_v4(), &patch).unwrap(), 0);
}

#[test]
fn update_does_not_validate_merged_record() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqlitePlantRepository::new(&conn);

    let plant = plant_with_fixed_id("00000000-0000-4000-8000-000000000001", "Retek");
    repo.add(&plant).unwrap();

    let patch = PlantPatch {
        planted_date: Some(date(2999, 1, 1)),
        ..PlantPatch::default()
    };
    assert_eq!(repo.update(plant.id, &patch).unwrap(), 1);
    let loaded = repo.get_by_id(plant.id).unwrap().unwrap();
    assert_eq!(loaded.planted_date, date(2999, 1, 1));
}

#[test]
fn delete_is_idempotent() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqlitePlantRepository::new(&conn);

    let plant = plant_with_fixed_id("00000000-0000-4000-8000-000000000001", "Uborka");
    repo.add(&plant).unwrap();

    assert!(repo.delete(plant.id).unwrap());
    assert!(!repo.delete(plant.id).unwrap());
    assert!(repo.get_by_id(plant.id).unwrap().is_none());
}

#[test]
fn get_all_keeps_insertion_order() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqlitePlantRepository::new(&conn);

    let c = plant_with_fixed_id("00000000-0000-4000-8000-000000000003", "C");
    let a = plant_with_fixed_id("00000000-0000-4000-8000-000000000001", "A");
    let b = plant_with_fixed_id("00000000-0000-4000-8000-000000000002", "B");
    repo.add(&c).unwrap();
    repo.add(&a).unwrap();
    repo.add(&b).unwrap();

    let names: Vec<String> = repo.get_all().unwrap().into_iter().map(|p| p.name).collect();
    assert_eq!(names, ["C", "A", "B"]);
}

#[test]
fn query_by_field_matches_exactly() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqlitePlantRepository::new(&conn);

    let mut kert = plant_with_fixed_id("00000000-0000-4000-8000-000000000001", "Hagyma");
    kert.location = Some("Kert".to_string());
    let mut erkely = plant_with_fixed_id("00000000-0000-4000-8000-000000000002", "Hagyma");
    erkely.location = Some("Erkély".to_string());
    repo.add(&kert).unwrap();
    repo.add(&erkely).unwrap();

    let by_location = repo.query_by_field(PlantField::Location, "Kert").unwrap();
    assert_eq!(by_location.len(), 1);
    assert_eq!(by_location[0].id, kert.id);

    assert!(repo
        .query_by_field(PlantField::Location, "kert")
        .unwrap()
        .is_empty());
    assert_eq!(
        repo.query_by_field(PlantField::Name, "Hagyma").unwrap().len(),
        2
    );
}

#[test]
fn query_by_status_uses_snapshot_from_last_write() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqlitePlantRepository::new(&conn);

    // Written on 2024-05-01; harvest window opens in July.
    let mut maturing = plant_with_fixed_id("00000000-0000-4000-8000-000000000001", "Paradicsom");
    maturing.ai_data = Some(sample_ai_data());
    let plain = plant_with_fixed_id("00000000-0000-4000-8000-000000000002", "Saláta");
    repo.add(&maturing).unwrap();
    repo.add(&plain).unwrap();

    let found = repo.query_by_field(PlantField::Status, "maturing").unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].id, maturing.id);

    let planted = repo.query_by_field(PlantField::Status, "planted").unwrap();
    assert_eq!(planted.len(), 1);
    assert_eq!(planted[0].id, plain.id);
}

#[test]
fn distinct_values_skip_empty_and_keep_first_occurrence() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqlitePlantRepository::new(&conn);

    let locations = [Some("Kert"), None, Some("Erkély"), Some("Kert"), Some(" ")];
    for (index, location) in locations.iter().enumerate() {
        let mut plant = plant_with_fixed_id(
            &format!("00000000-0000-4000-8000-00000000000{}", index + 1),
            "Petrezselyem",
        );
        plant.location = location.map(str::to_string);
        repo.add(&plant).unwrap();
    }

    let values = repo.distinct_values(PlantField::Location).unwrap();
    assert_eq!(values, ["Kert", "Erkély"]);
}

#[test]
fn clear_removes_everything() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqlitePlantRepository::new(&conn);

    repo.add(&plant_with_fixed_id("00000000-0000-4000-8000-000000000001", "A"))
        .unwrap();
    repo.add(&plant_with_fixed_id("00000000-0000-4000-8000-000000000002", "B"))
        .unwrap();

    assert_eq!(repo.clear().unwrap(), 2);
    assert_eq!(repo.count().unwrap(), 0);
}

#[test]
fn corrupt_row_is_rejected_on_read() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqlitePlantRepository::new(&conn);

    let plant = plant_with_fixed_id("00000000-0000-4000-8000-000000000001", "Karfiol");
    repo.add(&plant).unwrap();
    conn.execute("UPDATE plants SET planted_date = 'tavasz';", [])
        .unwrap();

    let err = repo.get_all().unwrap_err();
    assert!(matches!(err, RepoError::InvalidData(_)));
}

fn plant_with_fixed_id(id: &str, name: &str) -> Plant {
    let written = Timestamp::from_millisecond(1_714_557_600_000).unwrap(); // 2024-05-01T10:00Z
    Plant {
        id: Uuid::parse_str(id).unwrap(),
        name: name.to_string(),
        variety: None,
        planted_date: date(2024, 4, 15),
        location: None,
        notes: None,
        image_url: None,
        ai_data: None,
        created_at: written,
        updated_at: written,
    }
}

fn sample_ai_data() -> AiData {
    AiData {
        harvest_window: HarvestWindow {
            start: date(2024, 7, 1),
            end: date(2024, 8, 31),
            description: "Nyár közepétől".to_string(),
        },
        water_needs: WaterNeeds {
            frequency: "2-3 naponta".to_string(),
            details: "reggel".to_string(),
        },
        sun_needs: SunNeeds {
            hours: 8.0,
            category: SunCategory::FullSun,
            details: String::new(),
        },
        care_plan: vec![planttracker_core::CarePlanPhase {
            phase: "Kiültetés".to_string(),
            weeks_from_planting: Some(0),
            description: String::new(),
            tasks: vec!["beöntözés".to_string()],
        }],
        recipes: vec![planttracker_core::Recipe {
            name: "Paradicsomleves".to_string(),
            url: "https://example.com/leves".to_string(),
            description: String::new(),
            difficulty: RecipeDifficulty::Easy,
        }],
        fetched_at: Timestamp::from_millisecond(1_714_557_600_000).unwrap(),
    }
}
