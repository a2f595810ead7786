use approx::assert_relative_eq;
use is_close::is_close;
use rrtm::reach::{
    downstream_concentration, ReachScenario, SOLUTE_CELL, SOLUTE_INFLOW, STORAGE_REACTION,
    WATER_CELL,
};
use rrtm::sweep::{final_values, run_one, run_sweep, ParameterGrid, RunConfig, SweepConfig};
use rrtm_core::attributes::{Observable, ReactionAttribute, TransportAttribute};
use rrtm_core::cell::CellId;
use rrtm_core::errors::RRTMError;
use rrtm_core::model::ModelBuilder;
use rrtm_core::run::{RunOutcome, StopCondition};
use std::time::Duration;

fn steady() -> StopCondition {
    StopCondition::iterations(100_000).with_steady_state(1e-12)
}

#[test]
fn reference_reach_geometry_and_load() {
    let scenario = ReachScenario::reference();
    assert_relative_eq!(scenario.channel_volume(), 52.5, max_relative = 1e-12);
    assert_relative_eq!(scenario.load(), 1.3317, max_relative = 1e-12);

    let model = scenario.build().unwrap();
    assert_relative_eq!(model.cell(WATER_CELL).unwrap().amount(), 52.5, max_relative = 1e-12);
    let load = model
        .value(&Observable::Transport(SOLUTE_INFLOW, TransportAttribute::Load))
        .unwrap();
    assert!(is_close!(load, 1.3317));
}

#[test]
fn no_reaction_reaches_inflow_concentration() {
    for (alpha, vol_water_in_storage) in [(1.2, 5.0), (1.5, 15.0), (1.8, 100.0)] {
        let scenario = ReachScenario {
            alpha,
            vol_water_in_storage,
            k: 0.0,
            ..ReachScenario::reference()
        };
        let mut model = scenario.build().unwrap();
        let outcome = model.run_until(&steady(), |_| Ok(())).unwrap();

        assert!(matches!(outcome, RunOutcome::SteadyState { .. }));
        assert_relative_eq!(
            model.value(&downstream_concentration()).unwrap(),
            19.3,
            max_relative = 1e-8
        );
        let removed = model
            .value(&Observable::Reaction(
                STORAGE_REACTION,
                ReactionAttribute::FractionRemoved,
            ))
            .unwrap();
        assert_eq!(removed, 0.0);
    }
}

#[test]
fn storage_removal_lowers_downstream_concentration() {
    let mut model = ReachScenario::reference().build().unwrap();
    model.run_until(&steady(), |_| Ok(())).unwrap();

    let concentration = model.value(&downstream_concentration()).unwrap();
    assert!(concentration > 0.0 && concentration < 19.3);
}

#[test]
fn missing_linked_cell_fails_construction() {
    let mut config = ReachScenario::reference().to_model_config();
    config.cells[SOLUTE_CELL.0].linked_cell = Some(CellId(7));

    match ModelBuilder::from_config(config).build() {
        Err(RRTMError::Configuration { issues }) => {
            assert!(
                issues.iter().any(|issue| issue.contains("linked cell 7")),
                "{:?}",
                issues
            );
        }
        other => panic!("expected a configuration error, got {:?}", other),
    }
}

#[test]
fn identical_scenarios_give_identical_trajectories() {
    let scenario = ReachScenario::reference();
    let mut first = scenario.build().unwrap();
    let mut second = scenario.build().unwrap();

    for _ in 0..200 {
        first.iterate().unwrap();
        second.iterate().unwrap();
        assert_eq!(first.cells(), second.cells());
        assert_eq!(
            first.reactions()[0].state(),
            second.reactions()[0].state()
        );
    }
    assert_eq!(first.to_snapshot().unwrap(), second.to_snapshot().unwrap());
}

#[test]
fn sweep_reports_every_combination() {
    let mut grid = ParameterGrid::reference();
    // alpha = 2 is singular, so one slice of the grid fails to build
    grid.alpha[3] = 2.0;
    let config = SweepConfig {
        scenario: ReachScenario::reference(),
        grid,
        run: RunConfig::new("sensitivity", StopCondition::iterations(20)),
    };

    let reports = run_sweep(&config);
    assert_eq!(reports.len(), 75);
    assert!(reports.iter().enumerate().all(|(i, r)| r.point.index == i));

    let (failed, succeeded): (Vec<_>, Vec<_>) = reports.iter().partition(|r| r.point.alpha == 2.0);
    assert_eq!(failed.len(), 15);
    for report in failed {
        assert!(report.recorder.is_none());
        match &report.outcome {
            Err(RRTMError::NumericDomain { entity, parameter, .. }) => {
                assert!(entity.contains("reaction 0 (PowerLawStorage)"), "{}", entity);
                assert_eq!(parameter, "alpha");
            }
            other => panic!("{}: unexpected outcome {:?}", report.label, other),
        }
    }
    for report in succeeded {
        assert_eq!(
            report.outcome.as_ref().unwrap(),
            &RunOutcome::IterationLimit { iterations: 20 }
        );
        // Initial state plus one row per iteration
        assert_eq!(report.recorder.as_ref().unwrap().rows().len(), 21);
    }
}

#[test]
fn concentration_falls_with_rate_constant() {
    let config = SweepConfig {
        scenario: ReachScenario::reference(),
        grid: ParameterGrid {
            alpha: vec![1.5],
            vol_water_in_storage: vec![15.0],
            k: vec![0.0, 1e-5, 1e-4, 1e-3],
        },
        run: RunConfig::new("rates", steady()).with_record_interval(50),
    };

    let reports = run_sweep(&config);
    let finals = final_values(&reports, &downstream_concentration());
    let values: Vec<f64> = finals.values().map(|v| v.unwrap()).collect();

    assert_eq!(values.len(), 4);
    assert_relative_eq!(values[0], 19.3, max_relative = 1e-8);
    for pair in values.windows(2) {
        assert!(pair[1] < pair[0], "{:?}", values);
    }
    assert!(finals.keys().all(|label| label.starts_with("rates_alpha=1.5")));
}

#[test]
fn time_limited_run_keeps_partial_output() {
    let scenario = ReachScenario::reference();
    let point = ParameterGrid::reference().points()[7];
    let run = RunConfig::new(
        "bounded",
        StopCondition::iterations(1_000).with_wall_time(Duration::ZERO),
    );

    let report = run_one(&scenario, &point, &run);
    assert_eq!(
        report.outcome.unwrap(),
        RunOutcome::TimeLimit { iterations: 0 }
    );
    let recorder = report.recorder.unwrap();
    assert_eq!(recorder.rows().len(), 1);
    assert_eq!(recorder.rows()[0].iteration, 0);
}

#[test]
fn sweep_config_from_toml() {
    let config = SweepConfig::from_toml_str(
        r#"
[scenario]
disch = 0.069
reach_len = 250.0
reach_width = 0.7
reach_depth = 0.3
concentration = 19.3
alpha = 1.5
vol_water_in_storage = 15.0
k = 1e-4
tau_min = 60.0
tau_max = { finite = 31536000.0 }

[grid]
alpha = [1.3, 1.7]
vol_water_in_storage = [10.0]
k = [1e-5, 1e-4]

[run]
label = "toml"
record_interval = 10
observables = ["cell[1].concentration", "reaction[0].damkohlerNum"]

[run.stop]
max_iterations = 100
"#,
    )
    .unwrap();

    assert_eq!(config.scenario, ReachScenario::reference());
    assert_eq!(config.grid.len(), 4);
    assert_eq!(config.run.stop, StopCondition::iterations(100));
    assert_eq!(config.run.observables[0], downstream_concentration());

    let reports = run_sweep(&config);
    assert_eq!(reports.len(), 4);
    for report in &reports {
        assert!(report.is_ok());
        // Iterations 0, 10, ..., 100
        assert_eq!(report.recorder.as_ref().unwrap().rows().len(), 11);
    }
}
