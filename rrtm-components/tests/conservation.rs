//! Power-law storage kinetics inside a running model.

use approx::assert_relative_eq;
use rrtm_components::components::{
    FirstOrderDecay, FirstOrderDecayParameters, PowerLawStorage, PowerLawStorageParameters,
};
use rrtm_components::transit_time::TransitTimeBound;
use rrtm_core::attributes::{Observable, ReactionAttribute};
use rrtm_core::cell::{CellId, ReachGeometry};
use rrtm_core::config::{CellTable, ModelConfig, TransportTable};
use rrtm_core::currency::Currency;
use rrtm_core::errors::RRTMError;
use rrtm_core::model::{Model, ModelBuilder};
use rrtm_core::transport::{BoundaryId, TransportRate};
use std::sync::Arc;

fn storage_parameters(k: f64) -> PowerLawStorageParameters {
    PowerLawStorageParameters {
        alpha: 1.4,
        k,
        vol_water_in_storage: 15.0,
        tau_min: 60.0,
        tau_max: TransitTimeBound::Finite(365.0 * 86400.0),
        tau_rxn: 0.0,
    }
}

fn reach(k: f64) -> Model {
    let mut builder = ModelBuilder::new();
    builder.with_time_step(60.0);
    let geometry = ReachGeometry::new(250.0, 0.7, 0.3);
    let water =
        builder.with_cell(CellTable::water(geometry.channel_volume()).with_geometry(geometry));
    let no3 = builder.with_cell(CellTable::solute("NO3", 0.0, water));
    let inflow = builder.with_transport(TransportTable::new(
        Currency::Water,
        None,
        Some(water),
        TransportRate::Discharge { discharge: 0.069 },
    ));
    let outflow = builder.with_transport(TransportTable::new(
        Currency::Water,
        Some(water),
        None,
        TransportRate::Discharge { discharge: 0.069 },
    ));
    builder.with_transport(TransportTable::new(
        Currency::solute("NO3"),
        None,
        Some(no3),
        TransportRate::LinkedConcentration {
            water_boundary: inflow,
            concentration: 19.3,
        },
    ));
    builder.with_transport(TransportTable::new(
        Currency::solute("NO3"),
        Some(no3),
        None,
        TransportRate::Linked {
            water_boundary: outflow,
        },
    ));
    builder.with_reaction(
        no3,
        Arc::new(PowerLawStorage::from_parameters(storage_parameters(k))),
    );
    builder.build().unwrap()
}

#[test]
fn reacted_mass_is_accounted_for() {
    let mut model = reach(1e-4);
    let no3 = Currency::solute("NO3");
    let mut removed = 0.0;

    for _ in 0..500 {
        let before = model.total_amount(&no3);
        model.iterate().unwrap();
        let state = model.reactions()[0].state().unwrap();
        removed += state.amount_to_remove;

        let moved_in = model.transport()[2].amount_moved();
        let moved_out = model.transport()[3].amount_moved();
        assert_relative_eq!(
            model.total_amount(&no3),
            before + moved_in - moved_out - state.amount_to_remove,
            max_relative = 1e-12,
            epsilon = 1e-12
        );
    }

    let ledger = model.ledger().iter().find(|l| l.currency == no3).unwrap();
    assert_relative_eq!(ledger.reacted, removed, max_relative = 1e-12);
    assert!(removed > 0.0);
}

#[test]
fn storage_lowers_outflow_concentration() {
    let mut reacting = reach(1e-4);
    let mut inert = reach(0.0);
    reacting.iterate_n(2000).unwrap();
    inert.iterate_n(2000).unwrap();

    let concentration = "cell[1].concentration".parse::<Observable>().unwrap();
    let c_reacting = reacting.value(&concentration).unwrap();
    let c_inert = inert.value(&concentration).unwrap();
    assert!(c_reacting < c_inert);
    assert!(c_reacting > 0.0);

    // Inert storage never removes anything
    assert_eq!(inert.ledger()[1].reacted, 0.0);
}

#[test]
fn reaction_attributes() {
    let mut model = reach(1e-4);
    model.iterate().unwrap();

    let value = |attribute| {
        model
            .reaction_attribute(BoundaryId(0), attribute)
            .unwrap()
            .as_number()
            .unwrap()
    };
    assert_eq!(value(ReactionAttribute::Alpha), 1.4);
    assert_eq!(value(ReactionAttribute::VolWaterInStorage), 15.0);
    assert!(value(ReactionAttribute::QStorage) > 0.0);
    assert!(value(ReactionAttribute::DamkohlerNumStorage) > 0.0);
    assert_relative_eq!(
        value(ReactionAttribute::FractionRemovedStorage)
            + value(ReactionAttribute::FractionRemainingStorage),
        1.0,
        epsilon = 1e-12
    );
    assert!(
        value(ReactionAttribute::FractionRemoved) < value(ReactionAttribute::FractionRemovedStorage)
    );
}

#[test]
fn invalid_kinetics_name_the_reaction() {
    let mut builder = ModelBuilder::new();
    let water = builder.with_cell(CellTable::water(1.0));
    let no3 = builder.with_cell(CellTable::solute("NO3", 1.0, water));
    builder.with_reaction(
        no3,
        Arc::new(PowerLawStorage::from_parameters(PowerLawStorageParameters {
            alpha: 2.0,
            ..storage_parameters(1e-4)
        })),
    );

    match builder.build() {
        Err(RRTMError::NumericDomain {
            entity, parameter, ..
        }) => {
            assert_eq!(entity, "reaction 0 (PowerLawStorage)");
            assert_eq!(parameter, "alpha");
        }
        other => panic!("unexpected result {:?}", other.map(|_| ())),
    }
}

#[test]
fn kinetics_from_toml_tables() {
    let config = ModelConfig::from_toml_str(
        r#"
time_step = 60.0

[[cells]]
currency = "water"
amount = 52.5

[[cells]]
currency = "NO3"
amount = 10.0
linked_cell = 0

[[cells]]
currency = "PO4"
amount = 1.0
linked_cell = 0

[[reactions]]
cell = 1
kinetics = { type = "PowerLawStorage", parameters = { alpha = 1.5, k = 1e-4, vol_water_in_storage = 10.0, tau_min = 60.0, tau_max = "unbounded" } }

[[reactions]]
cell = 2
kinetics = { type = "FirstOrderDecay", parameters = { k = 1e-3 } }
"#,
    )
    .unwrap();

    let mut model = ModelBuilder::from_config(config).build().unwrap();
    model.iterate().unwrap();

    // Unbounded heavy tail: infinite mean transit time, no exchange
    assert_eq!(model.cell(CellId(1)).unwrap().amount(), 10.0);
    assert_relative_eq!(
        model.cell(CellId(2)).unwrap().amount(),
        (-0.06f64).exp(),
        max_relative = 1e-12
    );

    let snapshot = model.to_snapshot().unwrap();
    assert!(snapshot.contains("\"unbounded\""));
    let restored = Model::from_snapshot(&snapshot).unwrap();
    assert_eq!(restored.cells(), model.cells());

    // Keep the kinetics types referenced so their registrations are linked
    let _ = FirstOrderDecay::from_parameters(FirstOrderDecayParameters { k: 0.0 });
}
