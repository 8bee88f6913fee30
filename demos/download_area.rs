use zamg_datahub::{
    BoundingBox, DataHub, DataHubError, DatasetKind, HubConfig, Location, QuerySpec, TimeRange,
};

#[tokio::main]
async fn main() -> Result<(), DataHubError> {
    let hub = DataHub::new(
        HubConfig::builder()
            .output_dir("data/spartacus")
            .build(),
    )?;

    let query = QuerySpec::builder()
        .dataset(DatasetKind::Spartacus)
        .params(vec!["TN".to_string(), "TX".to_string(), "RR".to_string()])
        .location(Location::BoundingBox(BoundingBox {
            lat_min: 46.8,
            lon_min: 10.9,
            lat_max: 47.3,
            lon_max: 11.6,
        }))
        .location_label("innsbruck")
        .build()?;
    let saved = hub.save_query(&query).await?;
    println!("Query saved to {}", saved.display());

    let range = TimeRange::parse("2020-01-01 00:00", "2020-12-31 00:00")?;
    let report = hub.download().query(&query).range(&range).call().await?;
    println!("{}", report);

    Ok(())
}
