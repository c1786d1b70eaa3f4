//! End-to-end runs from TOML configuration files.

use approx::assert_relative_eq;
use ozrf::{Mode, ResponseError, ResponseModel, RunConfig};
use std::path::Path;
use tempdir::TempDir;

const RUN: &str = r#"
[[scenario]]
name = "tac-ozone"
altitude_km = 16.2
region = "Transatlantic_Corridor"

[scenario.emissions]
NO = 43.2

[[scenario]]
name = "tac-forcing"
altitude_km = 16.2
region = "Transatlantic_Corridor"
mode = "Radiative_Forcing"

[scenario.emissions]
NO = 43.2

[[scenario]]
name = "sas-sulphur"
altitude_km = 20.4
region = "South_Arabian_Sea"

[scenario.emissions]
SO = 2.8224
"#;

#[test]
fn test_run_embedded_tables() {
    let config = RunConfig::from_toml_str(RUN).unwrap();
    let model = ResponseModel::from_config(&config).unwrap();
    let outcomes = model.run(&config).unwrap();

    assert_eq!(outcomes.len(), 3);

    let ozone = &outcomes[0].breakdown;
    assert_eq!(outcomes[0].name, "tac-ozone");
    assert_relative_eq!(ozone.altitude_term, 0.175, epsilon = 1e-3);
    assert_relative_eq!(ozone.emission_term, 0.090, epsilon = 1e-3);

    let forcing = &outcomes[1].breakdown;
    assert_eq!(forcing.mode, Mode::RadiativeForcing);
    assert_relative_eq!(forcing.altitude_term, -1.2415, epsilon = 1e-3);
    assert_relative_eq!(forcing.emission_term, 1.6552, epsilon = 1e-3);

    let sulphur = &outcomes[2].breakdown;
    assert_relative_eq!(sulphur.emission_term, -0.1118, epsilon = 1e-3);
    assert_relative_eq!(sulphur.contributions["SO"], -0.1118, epsilon = 1e-3);
}

fn copy_embedded_tables(dir: &Path) {
    for (name, contents) in [
        (
            "sensitivity_ozone.csv",
            include_str!("../ozrf-core/data/sensitivity_ozone.csv"),
        ),
        (
            "taylor_param_ozone.csv",
            include_str!("../ozrf-core/data/taylor_param_ozone.csv"),
        ),
        (
            "sensitivity_radiative_forcing.csv",
            include_str!("../ozrf-core/data/sensitivity_radiative_forcing.csv"),
        ),
        (
            "taylor_param_radiative_forcing.csv",
            include_str!("../ozrf-core/data/taylor_param_radiative_forcing.csv"),
        ),
    ] {
        std::fs::write(dir.join(name), contents).unwrap();
    }
}

#[test]
fn test_run_from_file_with_relative_data_dir() {
    let tmp_dir = TempDir::new("run_from_file").unwrap();
    let data_dir = tmp_dir.path().join("tables");
    std::fs::create_dir(&data_dir).unwrap();
    copy_embedded_tables(&data_dir);

    let config_path = tmp_dir.path().join("run.toml");
    std::fs::write(&config_path, format!("data_dir = \"tables\"\n{RUN}")).unwrap();

    let config = RunConfig::from_file(&config_path).unwrap();
    assert_eq!(config.data_dir, Some(data_dir));

    let from_disk = ResponseModel::from_config(&config).unwrap();
    let embedded = ResponseModel::embedded().unwrap();
    assert_eq!(from_disk, embedded);
    assert_eq!(
        from_disk.run(&config).unwrap(),
        embedded.run(&config).unwrap()
    );
}

#[test]
fn test_missing_data_dir() {
    let config = RunConfig::from_toml_str("data_dir = \"/nonexistent/ozrf-tables\"").unwrap();
    let err = ResponseModel::from_config(&config).unwrap_err();
    assert!(matches!(err, ResponseError::Io(_)));
}

#[test]
fn test_run_stops_on_unknown_species() {
    let config = RunConfig::from_toml_str(
        r#"
        [[scenario]]
        name = "bad-species"
        altitude_km = 18.0
        region = "Transatlantic_Corridor"

        [scenario.emissions]
        UNKNOWN = 1.0
        "#,
    )
    .unwrap();

    let err = ResponseModel::embedded().unwrap().run(&config).unwrap_err();
    assert!(matches!(err, ResponseError::UnknownSpecies(_)));
}

#[test]
fn test_model_is_shareable_across_threads() {
    let model = ResponseModel::embedded().unwrap();
    let config = RunConfig::from_toml_str(RUN).unwrap();
    let expected = model.run(&config).unwrap();

    std::thread::scope(|scope| {
        let handles: Vec<_> = (0..4)
            .map(|_| scope.spawn(|| model.run(&config).unwrap()))
            .collect();
        for handle in handles {
            assert_eq!(handle.join().unwrap(), expected);
        }
    });
}
