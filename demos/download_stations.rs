use zamg_datahub::{DataHub, DataHubError, DatasetKind, HubConfig, Location, QuerySpec, TimeRange};

#[tokio::main]
async fn main() -> Result<(), DataHubError> {
    let hub = DataHub::new(
        HubConfig::builder()
            .output_dir("data/stations")
            .parallel(true)
            .build(),
    )?;

    let catalog = hub.station_catalog(DatasetKind::Station1H).await?;
    println!("{} stations available", catalog.len());
    let stations = catalog.select(["5925", "11035", "11121"])?;

    let query = QuerySpec::builder()
        .dataset(DatasetKind::Station1H)
        .params(vec!["TL".to_string(), "RR".to_string()])
        .location(Location::Stations(stations))
        .location_label("selection")
        .build()?;

    let range = TimeRange::parse("2018-01-01 00:00", "2021-01-01 00:00")?;
    let report = hub.download().query(&query).range(&range).call().await?;
    for failure in report.failures() {
        println!("Failed: {}", failure.path().display());
    }
    println!("{}", report);

    Ok(())
}
