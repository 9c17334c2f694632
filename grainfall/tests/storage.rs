use grainfall::prelude::*;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
struct RunInfo {
    size: usize,
    pile: u64,
    placement: Placement,
    settings: Settings,
    serial: RelaxationReport,
    partitioned: RelaxationReport,
}

fn store_and_reload(priority: [StorageOption; 2]) -> Result<(), Box<dyn std::error::Error>> {
    let mut rng = rand_chacha::ChaCha8Rng::seed_from_u64(1);
    let initial = initial_board(30, 3_000, Placement::Random, &mut rng)?;

    let mut serial = initial.clone();
    let serial_report = SweepRelaxer.relax(&mut serial)?;
    let settings = Settings::new(4, Parallelizer::Rayon)?;
    let (partitioned, partitioned_report) =
        Coordinator::new(initial.clone(), settings.clone())?.run()?;

    let dir = tempfile::tempdir()?;
    let builder = StorageBuilder::new()
        .location(dir.path())
        .priority(priority)
        .init();
    let manager = StorageManager::open_or_create(builder)?;
    manager.store_board("initial", &initial)?;
    manager.store_board("serial", &serial)?;
    manager.store_board("partitioned", &partitioned)?;
    let info = RunInfo {
        size: 30,
        pile: 3_000,
        placement: Placement::Random,
        settings,
        serial: serial_report,
        partitioned: partitioned_report,
    };
    manager.store_metadata(&info)?;

    assert_eq!(
        manager.get_all_labels()?,
        vec!["initial", "partitioned", "serial"]
    );
    assert_eq!(manager.load_board("initial")?, Some(initial));
    assert_eq!(manager.load_board("serial")?, manager.load_board("partitioned")?);
    assert_eq!(manager.load_metadata::<RunInfo>()?, Some(info));
    Ok(())
}

#[test]
fn store_json() -> Result<(), Box<dyn std::error::Error>> {
    store_and_reload([StorageOption::SerdeJson, StorageOption::Ron])
}

#[test]
fn store_ron() -> Result<(), Box<dyn std::error::Error>> {
    store_and_reload([StorageOption::Ron, StorageOption::SerdeJson])
}
