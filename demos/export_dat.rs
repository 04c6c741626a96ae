use std::{path::PathBuf, pin::pin};

use flowly::Service;
use flowly_epgdat::{EpgDatEncoder, EpgEvent, EpgService, EpgWriter, epgdat::io::EpgDatReader};
use futures::TryStreamExt;
use tokio::io::AsyncWriteExt;

fn demo_services() -> Vec<EpgService> {
    let start = 1_700_000_000;

    vec![
        EpgService::new("1:2:3:0").with_name("News 24").with_events([
            EpgEvent::new(start, 1800, "News"),
            EpgEvent::new(start + 1800, 1800, "Weather").with_description("Forecast for the week"),
        ]),
        EpgService::new("A:B:C:0").with_name("Movies").with_events([EpgEvent::new(
            start,
            5400,
            "Film",
        )
        .with_description("A long evening feature.")]),
        EpgService::new("1:0:1:0:0:0:0:0:0:0:http%3a//example.com/1.ts").with_name("Unset IPTV"),
    ]
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::init();

    let dir = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(std::env::temp_dir);

    let report = EpgWriter::new(dir.join("epg.dat"), demo_services())
        .with_log(|msg| println!("[EPG Export] {msg}"))
        .with_progress(|p| println!("progress: {}/{:?} services", p.services_done, p.services_total))
        .write()?;

    println!("{report:#?}");

    if let Some(path) = report.output {
        let file = EpgDatReader::read_file(&path)?;
        for service in &file.services {
            println!("{}: {} events", service.triple, service.events.len());
        }
    }

    let input = futures::stream::iter(demo_services().into_iter().map(Ok::<_, std::io::Error>));
    let mut stream = pin!(EpgDatEncoder::default().handle(input));

    let mut out = tokio::fs::File::create(dir.join("epg_stream.dat")).await?;
    while let Some(data) = stream.try_next().await? {
        out.write_all(&data).await?;
    }

    Ok(())
}
