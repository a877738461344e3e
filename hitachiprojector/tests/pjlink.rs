use std::time::Duration;

use hitachiprojector::{auth, DeviceInfo, Error, PjlinkConfig, PjlinkConnection, PjlinkError};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpListener;

async fn listener(password: &str) -> (TcpListener, PjlinkConfig) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    let config = PjlinkConfig::new("127.0.0.1", password)
        .with_port(port)
        .with_timeout(Duration::from_millis(500));
    (listener, config)
}

/// Minimal PJLink responder: greets, then answers `%1XXXX ?` queries from
/// `answers`, checking the digest on the first one when `random` is set.
async fn serve(listener: TcpListener, random: Option<&'static str>, password: &'static str) {
    let (stream, _) = listener.accept().await.unwrap();
    let (read, mut write) = stream.into_split();
    let mut read = BufReader::new(read);

    let greeting = match random {
        Some(random) => format!("PJLINK 1 {}\r", random),
        None => "PJLINK 0\r".to_string(),
    };
    write.write_all(greeting.as_bytes()).await.unwrap();

    let mut expected_digest = random.map(|r| auth::digest(r.as_bytes(), password));
    loop {
        let mut line = Vec::new();
        if read.read_until(b'\r', &mut line).await.unwrap() == 0 {
            return;
        }
        let line = String::from_utf8(line).unwrap();
        let mut line = line.trim_end_matches('\r');

        if let Some(digest) = expected_digest.take() {
            match line.strip_prefix(digest.as_str()) {
                Some(rest) => line = rest,
                None => {
                    write.write_all(b"PJLINK ERRA\r").await.unwrap();
                    return;
                }
            }
        }

        let body = &line[2..6];
        let value = match body {
            "NAME" => "Lobby",
            "INF1" => "HITACHI",
            "INF2" => "CP-WU8451",
            "CLSS" => "1",
            _ => "ERR1",
        };
        write
            .write_all(format!("%1{}={}\r", body, value).as_bytes())
            .await
            .unwrap();
    }
}

#[tokio::test]
async fn reads_device_info_without_authentication() {
    let (listener, config) = listener("").await;
    let device = tokio::spawn(serve(listener, None, ""));

    let mut con = PjlinkConnection::connect(&config).await.unwrap();
    assert_eq!(
        con.device_info().await.unwrap(),
        DeviceInfo {
            name: "Lobby".to_string(),
            manufacturer: "HITACHI".to_string(),
            model: "CP-WU8451".to_string(),
        }
    );
    assert_eq!(con.get_class().await.unwrap(), "1");
    con.close().await.unwrap();

    device.await.unwrap();
}

#[tokio::test]
async fn authenticates_first_command() {
    let (listener, config) = listener("letmein").await;
    let device = tokio::spawn(serve(listener, Some("0c7a9f31"), "letmein"));

    let mut con = PjlinkConnection::connect(&config).await.unwrap();
    assert_eq!(con.get_name().await.unwrap(), "Lobby");
    assert_eq!(con.get_model().await.unwrap(), "CP-WU8451");
    con.close().await.unwrap();

    device.await.unwrap();
}

#[tokio::test]
async fn wrong_password_is_rejected() {
    let (listener, config) = listener("wrong").await;
    let device = tokio::spawn(serve(listener, Some("0c7a9f31"), "letmein"));

    let mut con = PjlinkConnection::connect(&config).await.unwrap();
    assert!(matches!(con.get_name().await, Err(Error::AuthRejected)));

    device.await.unwrap();
}

#[tokio::test]
async fn device_error_codes() {
    let (listener, config) = listener("").await;
    let device = tokio::spawn(serve(listener, None, ""));

    let mut con = PjlinkConnection::connect(&config).await.unwrap();
    assert!(matches!(
        con.get_other_info().await,
        Err(Error::Pjlink(PjlinkError::UndefinedCommand))
    ));
    con.close().await.unwrap();

    device.await.unwrap();
}

#[tokio::test]
async fn silent_server_times_out() {
    let (listener, config) = listener("").await;
    let device = tokio::spawn(async move {
        let (stream, _) = listener.accept().await.unwrap();
        tokio::time::sleep(Duration::from_secs(1)).await;
        drop(stream);
    });

    let err = PjlinkConnection::connect(&config).await.err().unwrap();
    assert!(matches!(err, Error::Timeout(_)), "{:?}", err);

    device.await.unwrap();
}
