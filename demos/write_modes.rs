//! Writes tiltmeter points in every supported body mode and times each of them.
//!
//! Reads the server from `INFLUXDB_*` env values, the database from `LOADTEST_DB`.
use std::{sync::Once, time::Instant};

use influxdb_line_client::{
    batch::{DummyPoints, MeasurementBatch},
    model::{Measurement, Precision},
    write::WriteRequest,
    InfluxClient, InfluxResult,
};

static INIT: Once = Once::new();

fn setup() {
    INIT.call_once(|| {
        simple_logger::init_with_level(log::Level::Info).unwrap();
        let _ = dotenvy::dotenv();
    });
}

async fn timed(client: &InfluxClient, label: &str, request: WriteRequest) -> InfluxResult<()> {
    let started = Instant::now();
    client.write(request).send().await?;
    log::info!("{}: {:?}", label, started.elapsed());
    Ok(())
}

#[tokio::main]
async fn main() -> InfluxResult<()> {
    setup();

    let client = InfluxClient::from_env()?;
    let db = std::env::var("LOADTEST_DB").unwrap_or_else(|_| "unittestdb".to_string());
    let dir = std::env::temp_dir();

    client.create_database(&db).send().await?;

    let single = Measurement::new("Tilt")
        .tag("sensor", "1")
        .field_float("X", -100.0)
        .field_float("Y", 720.0)
        .field_float("T", 30.0)
        .timestamp_str("30.12.2015 10:36:43")?;
    log::info!("single point: {}", single.to_line(3)?.trim_end());
    timed(&client, "single measurement", WriteRequest::new(&db).body(single.to_bytes(3)?).precision(Precision::Nanosecond)).await?;

    let raw = &b"Tilt5 X=-22.34,Y=653.8676,T=-4.1 1045513396921781872\n"[..];
    timed(&client, "raw bytes", WriteRequest::new(&db).body(raw)).await?;

    let mut batch = MeasurementBatch::new(3);
    for sensor in 1..=3 {
        batch.append(single.clone().tag("sensor", sensor.to_string()));
    }
    timed(&client, "batch", WriteRequest::new(&db).body(batch)).await?;

    let mut dummies = DummyPoints::new("Tilt5").npoints(10_000).decimals(4).delta_seconds(600);

    timed(&client, "streamed generator", WriteRequest::new(&db).body(dummies.generate())).await?;

    let dumped = dummies.serialize(false)?;
    timed(&client, "in-memory dump", WriteRequest::new(&db).body(dumped)).await?;

    let dumped = dummies.serialize(true)?;
    timed(&client, "in-memory gzip dump", WriteRequest::new(&db).body(dumped).gzipped(true)).await?;

    let dumped = dummies.serialize(false)?;
    timed(&client, "compressed on send", WriteRequest::new(&db).body(dumped).compress(true)).await?;

    let txt = dir.join("influx_dummies.txt");
    dummies.dump(&txt, false)?;
    timed(&client, "file dump", WriteRequest::new(&db).file(&txt)).await?;

    let gz = dir.join("influx_dummies.txt.gz");
    dummies.dump(&gz, true)?;
    timed(&client, "gzip file dump", WriteRequest::new(&db).file(&gz).gzipped(true)).await?;

    for path in [&txt, &gz] {
        if let Err(e) = std::fs::remove_file(path) {
            log::warn!("can not remove {}: {}", path.display(), e);
        }
    }

    client.drop_database(&db).send().await?;

    Ok(())
}
