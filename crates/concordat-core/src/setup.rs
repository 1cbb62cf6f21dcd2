//! New-game construction: initial nation states and the 1936 starting
//! order of battle.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};

use concordat_protocol::{GameDate, NationCode, NationState, Save, Unit, UnitType};

use crate::registry::NationRegistry;

const DEFAULT_MANPOWER: i64 = 100_000;

const DEFAULT_WORLD_CONTEXT: &str =
    "Historical 1936 start. Europe is on the brink of tension as ideologies clash.";
const DEFAULT_SIMULATION_RULES: &str = "1. Realistic consequences. 2. Diplomatic weight. \
     3. Historical plausibility with player flexibility.";

struct StartingUnit {
    name: &'static str,
    unit_type: UnitType,
    nation: &'static str,
    region: &'static str,
    coords: [f64; 2],
}

/// The seeded 1936 order of battle: the Abyssinian crisis theater plus the
/// core European garrisons.
const STARTING_UNITS: &[StartingUnit] = &[
    StartingUnit {
        name: "1a Divisione Eritrea",
        unit_type: UnitType::Infantry,
        nation: "ITA",
        region: "Asmara",
        coords: [860.0, 460.0],
    },
    StartingUnit {
        name: "2a Divisione Eritrea",
        unit_type: UnitType::Infantry,
        nation: "ITA",
        region: "Massaua",
        coords: [870.0, 450.0],
    },
    StartingUnit {
        name: "Corpo d'Armata Indigeno",
        unit_type: UnitType::Infantry,
        nation: "ITA",
        region: "Eritrea",
        coords: [850.0, 470.0],
    },
    StartingUnit {
        name: "Divisione Gavinana",
        unit_type: UnitType::Infantry,
        nation: "ITA",
        region: "Adigrat",
        coords: [880.0, 490.0],
    },
    StartingUnit {
        name: "Guardia Imperiale Kebur Zabagna",
        unit_type: UnitType::Infantry,
        nation: "ETH",
        region: "Addis Abeba",
        coords: [880.0, 480.0],
    },
    StartingUnit {
        name: "Armata dell'Ogaden",
        unit_type: UnitType::Infantry,
        nation: "ETH",
        region: "Ogaden",
        coords: [920.0, 500.0],
    },
    StartingUnit {
        name: "Armata del Nord",
        unit_type: UnitType::Infantry,
        nation: "ETH",
        region: "Amhara",
        coords: [860.0, 490.0],
    },
    StartingUnit {
        name: "1. Panzer-Division",
        unit_type: UnitType::Armor,
        nation: "GER",
        region: "Berlin",
        coords: [750.0, 120.0],
    },
    StartingUnit {
        name: "1. Infanterie-Division",
        unit_type: UnitType::Infantry,
        nation: "GER",
        region: "East Prussia",
        coords: [800.0, 100.0],
    },
    StartingUnit {
        name: "1ère Division Blindée",
        unit_type: UnitType::Armor,
        nation: "FRA",
        region: "Paris",
        coords: [660.0, 150.0],
    },
    StartingUnit {
        name: "7ème Armée",
        unit_type: UnitType::Infantry,
        nation: "FRA",
        region: "Metz",
        coords: [690.0, 140.0],
    },
    StartingUnit {
        name: "Home Fleet",
        unit_type: UnitType::Naval,
        nation: "ENG",
        region: "Scapa Flow",
        coords: [620.0, 80.0],
    },
    StartingUnit {
        name: "British Expeditionary Force",
        unit_type: UnitType::Infantry,
        nation: "ENG",
        region: "London",
        coords: [640.0, 125.0],
    },
];

/// Build a fresh save: one `NationState` per registry nation plus the seeded
/// starting units. The caller supplies identity and clock so this stays a
/// pure function of its inputs.
pub fn new_save(
    save_id: String,
    player_nation_code: NationCode,
    player_nation_name: &str,
    start_date: GameDate,
    registry: &NationRegistry,
    created_at: DateTime<Utc>,
) -> Save {
    let nations: BTreeMap<NationCode, NationState> = registry
        .iter()
        .map(|info| {
            (
                info.code.clone(),
                NationState::initial(info.code.clone(), info.manpower.unwrap_or(DEFAULT_MANPOWER)),
            )
        })
        .collect();

    let units: Vec<Unit> = STARTING_UNITS
        .iter()
        .enumerate()
        .map(|(index, seed)| Unit {
            id: format!("unit_{save_id}_{index}"),
            name: seed.name.to_string(),
            unit_type: seed.unit_type,
            nation_code: NationCode::new(seed.nation),
            region_id: seed.region.to_string(),
            strength: 100,
            organization: 100,
            experience: 0,
            centroid: Some(seed.coords),
            created_at,
            updated_at: None,
        })
        .collect();

    Save {
        name: format!("{player_nation_name} - {start_date}"),
        id: save_id,
        player_nation_code,
        current_date: start_date,
        turn_number: 1,
        created_at,
        world_context: DEFAULT_WORLD_CONTEXT.to_string(),
        simulation_rules: DEFAULT_SIMULATION_RULES.to_string(),
        nations,
        actions: Vec::new(),
        events: Vec::new(),
        units,
        chats: Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::test_support::small_registry;

    #[test]
    fn every_registry_nation_gets_initial_state() {
        let registry = small_registry();
        let save = new_save(
            "100".to_string(),
            NationCode::new("ITA"),
            "Italy",
            GameDate::from_ymd_opt(1936, 1, 1).unwrap(),
            &registry,
            Utc::now(),
        );

        assert_eq!(save.nations.len(), registry.len());
        let ita = &save.nations[&NationCode::new("ITA")];
        assert_eq!(ita.stability, 70.0);
        assert_eq!(ita.war_support, 20.0);
        assert_eq!(ita.treasury, 1000);
        assert!(!ita.at_war);
    }

    #[test]
    fn starting_units_are_seeded_with_unique_ids() {
        let registry = small_registry();
        let save = new_save(
            "100".to_string(),
            NationCode::new("ITA"),
            "Italy",
            GameDate::from_ymd_opt(1936, 1, 1).unwrap(),
            &registry,
            Utc::now(),
        );

        assert!(!save.units.is_empty());
        let mut ids: Vec<&str> = save.units.iter().map(|u| u.id.as_str()).collect();
        ids.sort();
        ids.dedup();
        assert_eq!(ids.len(), save.units.len());
        assert!(save.units.iter().all(|u| u.strength == 100));
    }

    #[test]
    fn save_name_combines_nation_and_date() {
        let registry = small_registry();
        let save = new_save(
            "100".to_string(),
            NationCode::new("ETH"),
            "Ethiopia",
            GameDate::from_ymd_opt(1936, 1, 1).unwrap(),
            &registry,
            Utc::now(),
        );
        assert_eq!(save.name, "Ethiopia - 1936-01-01");
        assert_eq!(save.turn_number, 1);
    }
}
