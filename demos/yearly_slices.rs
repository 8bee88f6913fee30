use std::env;
use std::path::Path;
use zamg_datahub::{
    BoundingBox, DataHub, DataHubError, DatasetKind, HubConfig, Location, QuerySpec,
};

#[tokio::main]
async fn main() -> Result<(), DataHubError> {
    let mut config = HubConfig::builder()
        .output_dir("data/inca")
        .parallel(true)
        .build();
    // Authenticated requests get larger quotas.
    if let Ok(token_file) = env::var("ZAMG_TOKEN_FILE") {
        config = config.with_token_file(token_file).await?;
    }
    let hub = DataHub::new(config)?;

    let query = QuerySpec::builder()
        .dataset(DatasetKind::Inca)
        .params(vec!["T2M".to_string(), "RR".to_string()])
        .location(Location::BoundingBox(BoundingBox {
            lat_min: 46.6,
            lon_min: 10.5,
            lat_max: 47.3,
            lon_max: 11.4,
        }))
        .location_label("oetztal")
        .build()?;

    for year in [2021, 2022] {
        let report = hub
            .download_year()
            .query(&query)
            .year(year)
            .max_days(15)
            .call()
            .await?;
        println!("{}: {}", year, report);
    }

    let merged = hub.merge_years(Path::new("data/inca"), [2021, 2022]).await?;
    println!("{:#?}", merged);

    Ok(())
}
