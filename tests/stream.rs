use std::pin::pin;

use flowly::Service;
use flowly_epgdat::{
    EpgDatEncoder, EpgEvent, EpgService, Error,
    epgdat::{FORMAT_TAG, io::EpgDatReader},
};
use futures::StreamExt;

fn services() -> Vec<Result<EpgService, std::io::Error>> {
    vec![
        Ok(EpgService::new("1:2:3:0").with_events([EpgEvent::new(1_700_000_000, 1800, "News")])),
        Ok(EpgService::new("4:5:6:0").with_events([
            EpgEvent::new(1_700_000_000, 3600, "Weather"),
            EpgEvent::new(1_700_003_600, 3600, "News"),
        ])),
    ]
}

#[tokio::test]
async fn yields_whole_image_at_end() -> anyhow::Result<()> {
    let stream = EpgDatEncoder::default().handle(futures::stream::iter(services()));
    let items: Vec<_> = pin!(stream).collect().await;

    assert_eq!(items.len(), 1);
    let data = items.into_iter().next().unwrap()?;
    assert_eq!(&data[4..17], FORMAT_TAG);

    let file = EpgDatReader::parse(&mut data.clone())?;
    assert_eq!(file.services.len(), 2);
    assert_eq!(file.event_count(), 3);

    Ok(())
}

#[tokio::test]
async fn matches_in_memory_encoding() -> anyhow::Result<()> {
    let mut encoder = EpgDatEncoder::default();
    for service in services() {
        encoder.push_service(&service?);
    }

    let stream = EpgDatEncoder::default().handle(futures::stream::iter(services()));
    let mut stream = pin!(stream);
    let data = stream.next().await.expect("one item")?;

    assert_eq!(data, encoder.to_bytes());
    assert!(stream.next().await.is_none());

    Ok(())
}

#[tokio::test]
async fn forwards_upstream_errors() {
    let input = vec![
        Err(std::io::Error::other("cache read failed")),
        Ok(EpgService::new("1:2:3:0").with_events([EpgEvent::new(0, 60, "News")])),
    ];

    let stream = EpgDatEncoder::default().handle(futures::stream::iter(input));
    let items: Vec<_> = pin!(stream).collect().await;

    assert_eq!(items.len(), 2);
    assert!(matches!(items[0], Err(Error::Other(_))));
    assert!(items[1].is_ok());
}

#[tokio::test]
async fn nothing_for_empty_input() {
    let input: Vec<Result<EpgService, std::io::Error>> = vec![Ok(EpgService::new("1:2:3:0"))];

    let stream = EpgDatEncoder::default().handle(futures::stream::iter(input));
    let items: Vec<_> = pin!(stream).collect().await;

    assert!(items.is_empty());
}
