use divesim::link::*;
use std::path::PathBuf;
use tokio::io::AsyncReadExt;

#[test]
fn test_device_target_parsing() {
    assert_eq!(
        "tcp://127.0.0.1:7000".parse::<DeviceTarget>().unwrap(),
        DeviceTarget::Tcp("127.0.0.1:7000".to_string())
    );
    assert_eq!(
        "/dev/ttyACM0".parse::<DeviceTarget>().unwrap(),
        DeviceTarget::Path(PathBuf::from("/dev/ttyACM0"))
    );

    assert!("tcp://".parse::<DeviceTarget>().is_err());
    assert!("tcp://localhost".parse::<DeviceTarget>().is_err());
    assert!("".parse::<DeviceTarget>().is_err());
}

#[test]
fn test_device_target_display_round_trips() {
    let target: DeviceTarget = "tcp://localhost:9000".parse().unwrap();
    assert_eq!(target.to_string(), "tcp://localhost:9000");
}

#[test]
fn test_link_error_fatality() {
    assert!(!LinkError::Backpressure.is_fatal());
    assert!(!LinkError::FrameTooLarge(100).is_fatal());
    assert!(LinkError::Closed.is_fatal());
    assert!(LinkError::Io(std::io::Error::new(std::io::ErrorKind::BrokenPipe, "gone")).is_fatal());
}

#[test]
fn test_channel_link_reports_backpressure_when_full() {
    let (mut link, mut rx) = ChannelLink::pair(2);

    assert!(link.send("D 10").is_ok());
    assert!(link.send("D 11").is_ok());
    assert!(matches!(link.send("D 12"), Err(LinkError::Backpressure)));

    assert_eq!(rx.try_recv().unwrap().as_str(), "D 10");
    assert!(link.send("D 13").is_ok());
}

#[test]
fn test_channel_link_reports_closed_when_writer_gone() {
    let (mut link, rx) = ChannelLink::pair(4);
    drop(rx);

    assert!(matches!(link.send("D 10"), Err(LinkError::Closed)));
}

#[test]
fn test_channel_link_rejects_oversized_frames() {
    let (mut link, _rx) = ChannelLink::pair(4);
    let oversized = "D ".to_string() + &"9".repeat(100);

    assert!(matches!(link.send(&oversized), Err(LinkError::FrameTooLarge(102))));
}

#[tokio::test]
async fn test_device_writer_terminates_each_frame() {
    let (mut link, rx) = ChannelLink::pair(8);
    let (writer, mut reader) = tokio::io::duplex(256);

    link.send("T 14 5 9 7 3 2026").unwrap();
    link.send("D 0").unwrap();
    link.send("D 123").unwrap();
    drop(link);

    let frames = run_device_writer(writer, rx).await.unwrap();
    assert_eq!(frames, 3);

    let mut received = String::new();
    reader.read_to_string(&mut received).await.unwrap();
    assert_eq!(received, "T 14 5 9 7 3 2026\nD 0\nD 123\n");
}

#[tokio::test]
async fn test_device_writer_failure_closes_link() {
    let (mut link, rx) = ChannelLink::pair(8);
    let (writer, reader) = tokio::io::duplex(64);
    drop(reader);

    link.send("D 10").unwrap();
    let result = run_device_writer(writer, rx).await;

    assert!(matches!(result, Err(LinkError::Io(_))));
    assert!(matches!(link.send("D 11"), Err(LinkError::Closed)));
}

#[tokio::test]
async fn test_connect_to_missing_device_fails() {
    let target = DeviceTarget::Path(PathBuf::from("/nonexistent/divesim/ttyFAKE"));

    let result = connect(&target).await;

    assert!(matches!(result, Err(LinkError::Io(_))));
}
