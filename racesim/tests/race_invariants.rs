use proptest::prelude::*;
use racesim::core::driver::{DriverEntry, SkillSource};
use racesim::core::race::Race;
use racesim::core::weather::Weather;
use racesim::interfaces::reference_data::{ReferenceData, ReferenceProvider};
use racesim::post::race_result::points_for_rank;
use racesim::pre::sim_config::SimConfig;
use rand::rngs::StdRng;
use rand::SeedableRng;

fn grid(data: &ReferenceData, skills: &[f64]) -> Vec<DriverEntry> {
    let constructors = data.constructor_ids();
    skills
        .iter()
        .enumerate()
        .map(|(i, &skill)| DriverEntry {
            driver_id: format!("driver_{:02}", i + 1),
            constructor_id: constructors[i % constructors.len()].to_owned(),
            skill_rating: skill,
            skill_source: SkillSource::Generated,
            grid_position: i + 1,
        })
        .collect()
}

fn weather_strategy() -> impl Strategy<Value = Weather> {
    prop_oneof![Just(Weather::Dry), Just(Weather::Wet), Just(Weather::Mixed)]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(48))]

    #[test]
    fn race_state_invariants_hold_every_lap(
        seed in any::<u64>(),
        skills in prop::collection::vec(25.0f64..100.0, 2..22),
        tot_no_laps in 1u32..40,
        failure_rate_scale in 0.0f64..3.0,
        weather in weather_strategy(),
        track_idx in 0usize..10,
    ) {
        let data = ReferenceData::builtin();
        let cfg = SimConfig { failure_rate_scale, ..SimConfig::default() };
        let track = &data.tracks[track_idx];
        let grid = grid(&data, &skills);
        let mut race = Race::new(&cfg, track, weather, tot_no_laps, &grid, &data).unwrap();
        let mut rng = StdRng::seed_from_u64(seed);

        let mut prev: Vec<(u32, f64, bool)> = race
            .get_entries()
            .iter()
            .map(|e| (e.laps_completed(), e.total_time(), e.is_running()))
            .collect();

        while !race.get_finished() {
            race.simulate_lap(&mut rng);
            prop_assert!(race.positions_are_consistent());

            for (e, &(laps, time, was_running)) in race.get_entries().iter().zip(prev.iter()) {
                prop_assert!(e.laps_completed() >= laps);
                prop_assert!(e.pit_stops() <= 2);
                if !was_running {
                    prop_assert_eq!(e.laps_completed(), laps);
                    prop_assert_eq!(e.total_time(), time);
                } else if e.laps_completed() > laps {
                    prop_assert_eq!(e.laps_completed(), laps + 1);
                    prop_assert!(e.total_time() > time);
                }
            }

            prev = race
                .get_entries()
                .iter()
                .map(|e| (e.laps_completed(), e.total_time(), e.is_running()))
                .collect();
        }

        prop_assert!(race.get_entries().iter().all(|e| !e.is_running()));
    }

    #[test]
    fn points_only_for_the_top_ten(position in 0usize..40) {
        let points = points_for_rank(position);
        if position >= 1 && position <= 10 {
            prop_assert!(points >= 1);
            if position > 1 {
                prop_assert!(points < points_for_rank(position - 1));
            }
        } else {
            prop_assert_eq!(points, 0);
        }
    }
}
