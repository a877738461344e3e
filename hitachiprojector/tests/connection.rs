use std::sync::Arc;
use std::time::Duration;

use hitachiprojector::{
    auth, command::FRAME_LEN, BlankStatus, Command, EcoModeStatus, Error, InputSource,
    PowerStatus, ProjectorConfig, ProjectorConnection, ReplyType,
};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::oneshot;

const DATA_ON: [u8; 3] = [0x1d, 0x01, 0x00];

async fn listener() -> (TcpListener, ProjectorConfig) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    let config = ProjectorConfig::new("127.0.0.1", "secret")
        .with_port(port)
        .with_timeout(Duration::from_millis(500))
        .with_challenge_timeout(Duration::from_millis(50));
    (listener, config)
}

async fn read_frame(stream: &mut TcpStream) -> [u8; FRAME_LEN] {
    let mut frame = [0u8; FRAME_LEN];
    stream.read_exact(&mut frame).await.unwrap();
    frame
}

async fn is_closed(stream: &mut TcpStream) -> bool {
    let mut buf = [0u8; 1];
    matches!(
        tokio::time::timeout(Duration::from_secs(1), stream.read(&mut buf)).await,
        Ok(Ok(0)) | Ok(Err(_))
    )
}

/// Accepts one connection, expects `command` and answers with `reply`.
async fn serve_once(listener: TcpListener, command: Command, reply: &'static [u8]) {
    let (mut stream, _) = listener.accept().await.unwrap();
    assert_eq!(&read_frame(&mut stream).await, command.frame());
    stream.write_all(reply).await.unwrap();
}

#[tokio::test]
async fn power_status_on() {
    let (listener, config) = listener().await;
    let device = tokio::spawn(serve_once(listener, Command::PowerGet, &DATA_ON));

    let con = ProjectorConnection::new(config);
    let (reply_type, status) = con.get_power_status().await.unwrap();
    assert_eq!(reply_type, ReplyType::Data);
    assert_eq!(status, Some(PowerStatus::On));

    device.await.unwrap();
}

#[tokio::test]
async fn ack_for_power_on() {
    let (listener, config) = listener().await;
    let device = tokio::spawn(serve_once(listener, Command::PowerTurnOn, &[0x06]));

    let con = ProjectorConnection::new(config);
    let (reply_type, payload) = con.send_cmd(Command::PowerTurnOn).await.unwrap();
    assert_eq!(reply_type, ReplyType::Ack);
    assert_eq!(payload, None);

    device.await.unwrap();
}

#[tokio::test]
async fn input_source_and_selection() {
    let (listener, config) = listener().await;
    let device = tokio::spawn(async move {
        let (mut stream, _) = listener.accept().await.unwrap();
        assert_eq!(&read_frame(&mut stream).await, Command::InputSourceGet.frame());
        stream.write_all(&[0x1d, 0x0b, 0x00]).await.unwrap();

        let (mut stream, _) = listener.accept().await.unwrap();
        assert_eq!(&read_frame(&mut stream).await, Command::InputSourceHDMI.frame());
        stream.write_all(&[0x06]).await.unwrap();
    });

    let con = ProjectorConnection::new(config);
    let (_, source) = con.get_input_source().await.unwrap();
    assert_eq!(source, Some(InputSource::LAN));
    assert_eq!(
        con.set_input_source(InputSource::HDMI).await.unwrap(),
        ReplyType::Ack
    );

    device.await.unwrap();
}

#[tokio::test]
async fn rejected_digest_is_auth_reply() {
    let (listener, config) = listener().await;
    let device = tokio::spawn(async move {
        let (mut stream, _) = listener.accept().await.unwrap();
        stream.write_all(b"k3j4h5g6").await.unwrap();

        let mut request = [0u8; 32 + FRAME_LEN];
        stream.read_exact(&mut request).await.unwrap();
        stream.write_all(&[0x1f, 0x04, 0x00]).await.unwrap();
    });

    let con = ProjectorConnection::new(config);
    let (reply_type, status) = con.get_power_status().await.unwrap();
    assert_eq!(reply_type, ReplyType::Auth);
    assert_eq!(status, None);

    device.await.unwrap();
}

#[tokio::test]
async fn challenge_is_answered_with_digest() {
    let (listener, config) = listener().await;
    let device = tokio::spawn(async move {
        let (mut stream, _) = listener.accept().await.unwrap();
        stream.write_all(b"a1b2c3d4").await.unwrap();

        let mut request = [0u8; 32 + FRAME_LEN];
        stream.read_exact(&mut request).await.unwrap();
        assert_eq!(&request[..32], auth::digest(b"a1b2c3d4", "secret").as_bytes());
        assert_eq!(&request[32..], Command::BlankGet.frame());
        stream.write_all(&DATA_ON).await.unwrap();
    });

    let con = ProjectorConnection::new(config);
    let (reply_type, status) = con.get_blank_status().await.unwrap();
    assert_eq!(reply_type, ReplyType::Data);
    assert_eq!(status, Some(BlankStatus::On));

    device.await.unwrap();
}

#[tokio::test]
async fn device_error_and_busy_replies() {
    let (listener, config) = listener().await;
    let device = tokio::spawn(async move {
        for reply in [[0x1c, 0x00, 0x00], [0x1f, 0x01, 0x00]] {
            let (mut stream, _) = listener.accept().await.unwrap();
            read_frame(&mut stream).await;
            stream.write_all(&reply).await.unwrap();
        }
    });

    let con = ProjectorConnection::new(config);
    assert_eq!(
        con.get_eco_mode_status().await.unwrap(),
        (ReplyType::Error, None)
    );
    assert_eq!(
        con.get_eco_mode_status().await.unwrap(),
        (ReplyType::Busy, None)
    );

    device.await.unwrap();
}

#[tokio::test]
async fn lamp_time_combines_high_and_low_words() {
    let (listener, config) = listener().await;
    let device = tokio::spawn(async move {
        let (mut stream, _) = listener.accept().await.unwrap();
        assert_eq!(&read_frame(&mut stream).await, Command::LampTimeHighGet.frame());
        stream.write_all(&[0x1d, 0x01, 0x00]).await.unwrap();
        assert_eq!(&read_frame(&mut stream).await, Command::LampTimeLowGet.frame());
        stream.write_all(&[0x1d, 0xa0, 0x86]).await.unwrap();
    });

    let con = ProjectorConnection::new(config);
    let (reply_type, hours) = con.get_lamp_time().await.unwrap();
    assert_eq!(reply_type, ReplyType::Data);
    assert_eq!(hours, Some(100_000));

    device.await.unwrap();
}

#[tokio::test]
async fn filter_time_stops_after_non_data_reply() {
    let (listener, config) = listener().await;
    let (closed_tx, closed_rx) = oneshot::channel();
    let device = tokio::spawn(async move {
        let (mut stream, _) = listener.accept().await.unwrap();
        assert_eq!(&read_frame(&mut stream).await, Command::FilterTimeHighGet.frame());
        stream.write_all(&[0x15]).await.unwrap();
        // the low word is never requested
        closed_tx.send(is_closed(&mut stream).await).unwrap();
    });

    let con = ProjectorConnection::new(config);
    assert_eq!(con.get_filter_time().await.unwrap(), (ReplyType::Nak, None));
    assert!(closed_rx.await.unwrap());

    device.await.unwrap();
}

#[tokio::test]
async fn unmapped_value_is_a_protocol_error() {
    let (listener, config) = listener().await;
    let device = tokio::spawn(serve_once(listener, Command::PowerGet, &[0x1d, 0x09, 0x00]));

    let con = ProjectorConnection::new(config);
    let err = con.get_power_status().await.unwrap_err();
    assert!(err.is_protocol(), "{:?}", err);
    assert!(matches!(
        err,
        Error::UnmappedValue {
            kind: "PowerStatus",
            value: 9
        }
    ));

    device.await.unwrap();
}

#[tokio::test]
async fn unknown_reply_header_is_a_protocol_error() {
    let (listener, config) = listener().await;
    let device = tokio::spawn(serve_once(listener, Command::PowerGet, &[0x42]));

    let con = ProjectorConnection::new(config);
    let err = con.get_power_status().await.unwrap_err();
    assert!(matches!(err, Error::UnknownReply(0x42)));
    assert!(!err.is_transport());

    device.await.unwrap();
}

#[tokio::test]
async fn silent_projector_times_out_and_next_call_reconnects() {
    let (listener, config) = listener().await;
    let (closed_tx, closed_rx) = oneshot::channel();
    let device = tokio::spawn(async move {
        let (mut silent, _) = listener.accept().await.unwrap();
        read_frame(&mut silent).await;
        closed_tx.send(is_closed(&mut silent).await).unwrap();

        let (mut stream, _) = listener.accept().await.unwrap();
        read_frame(&mut stream).await;
        stream.write_all(&DATA_ON).await.unwrap();
    });

    let con = ProjectorConnection::new(config.with_keep_alive(true));
    let err = con.get_power_status().await.unwrap_err();
    assert!(matches!(err, Error::Timeout(_)), "{:?}", err);
    assert!(err.is_transport());
    assert!(closed_rx.await.unwrap(), "timed out socket left open");

    let (reply_type, status) = con.get_power_status().await.unwrap();
    assert_eq!(reply_type, ReplyType::Data);
    assert_eq!(status, Some(PowerStatus::On));

    device.await.unwrap();
}

#[tokio::test]
async fn cancelled_call_closes_the_socket() {
    let (listener, config) = listener().await;
    let (closed_tx, closed_rx) = oneshot::channel();
    let device = tokio::spawn(async move {
        let (mut stream, _) = listener.accept().await.unwrap();
        read_frame(&mut stream).await;
        closed_tx.send(is_closed(&mut stream).await).unwrap();
    });

    let con = ProjectorConnection::new(config.with_keep_alive(true));
    let cancelled =
        tokio::time::timeout(Duration::from_millis(100), con.get_power_status()).await;
    assert!(cancelled.is_err());
    assert!(closed_rx.await.unwrap());

    device.await.unwrap();
}

#[tokio::test]
async fn projector_closing_without_reply() {
    let (listener, config) = listener().await;
    let device = tokio::spawn(async move {
        let (mut stream, _) = listener.accept().await.unwrap();
        read_frame(&mut stream).await;
    });

    let con = ProjectorConnection::new(config);
    let err = con.get_power_status().await.unwrap_err();
    assert!(matches!(err, Error::ConnectionClosed), "{:?}", err);
    assert!(err.is_transport());

    device.await.unwrap();
}

#[tokio::test]
async fn refused_connection_is_a_transport_error() {
    let (listener, config) = listener().await;
    drop(listener);

    let con = ProjectorConnection::new(config);
    let err = con.get_power_status().await.unwrap_err();
    assert!(err.is_transport(), "{:?}", err);
}

#[tokio::test]
async fn keep_alive_reuses_one_socket() {
    let (listener, config) = listener().await;
    let device = tokio::spawn(async move {
        let (mut stream, _) = listener.accept().await.unwrap();
        for _ in 0..3 {
            read_frame(&mut stream).await;
            stream.write_all(&DATA_ON).await.unwrap();
        }
        assert!(is_closed(&mut stream).await);

        // no second connection was attempted
        let second = tokio::time::timeout(Duration::from_millis(100), listener.accept()).await;
        assert!(second.is_err());
    });

    let con = ProjectorConnection::new(config.with_keep_alive(true));
    for _ in 0..3 {
        assert_eq!(
            con.get_eco_mode_status().await.unwrap(),
            (ReplyType::Data, Some(EcoModeStatus::Eco))
        );
    }
    con.close().await;

    device.await.unwrap();
}

#[tokio::test]
async fn concurrent_calls_never_overlap_on_the_wire() {
    const CALLS: usize = 6;

    let (listener, config) = listener().await;
    let device = tokio::spawn(async move {
        let (mut stream, _) = listener.accept().await.unwrap();
        for _ in 0..CALLS {
            let frame = read_frame(&mut stream).await;
            assert!(Command::ALL.iter().any(|c| c.frame() == &frame));

            // nothing else may arrive before this frame is answered
            let mut extra = [0u8; 1];
            let early =
                tokio::time::timeout(Duration::from_millis(20), stream.read(&mut extra)).await;
            assert!(early.is_err(), "next frame sent before reply");

            stream.write_all(&DATA_ON).await.unwrap();
        }
    });

    let con = Arc::new(ProjectorConnection::new(config.with_keep_alive(true)));
    let calls: Vec<_> = (0..CALLS)
        .map(|i| {
            let con = Arc::clone(&con);
            tokio::spawn(async move {
                if i % 2 == 0 {
                    con.get_power_status().await.map(|(t, _)| t)
                } else {
                    con.get_blank_status().await.map(|(t, _)| t)
                }
            })
        })
        .collect();

    for call in futures::future::join_all(calls).await {
        assert_eq!(call.unwrap().unwrap(), ReplyType::Data);
    }

    device.await.unwrap();
}

#[tokio::test]
async fn keep_alive_reconnects_after_projector_closes_idle_socket() {
    let (listener, config) = listener().await;
    let (closed_tx, closed_rx) = oneshot::channel();
    let device = tokio::spawn(async move {
        let (mut stream, _) = listener.accept().await.unwrap();
        assert_eq!(&read_frame(&mut stream).await, Command::PowerGet.frame());
        stream.write_all(&DATA_ON).await.unwrap();
        drop(stream);
        closed_tx.send(()).unwrap();

        let (mut stream, _) = listener.accept().await.unwrap();
        assert_eq!(&read_frame(&mut stream).await, Command::PowerGet.frame());
        stream.write_all(&DATA_ON).await.unwrap();
    });

    let con = ProjectorConnection::new(config.with_keep_alive(true));
    assert_eq!(
        con.get_power_status().await.unwrap(),
        (ReplyType::Data, Some(PowerStatus::On))
    );

    closed_rx.await.unwrap();
    // let the runtime observe the hangup
    tokio::time::sleep(Duration::from_millis(50)).await;

    assert_eq!(
        con.get_power_status().await.unwrap(),
        (ReplyType::Data, Some(PowerStatus::On))
    );

    device.await.unwrap();
}

#[tokio::test]
async fn keep_alive_waits_for_the_challenge_once() {
    const CALLS: u32 = 4;

    let (listener, config) = listener().await;
    let config = config.with_challenge_timeout(Duration::from_millis(200));
    let device = tokio::spawn(async move {
        let (mut stream, _) = listener.accept().await.unwrap();
        for _ in 0..CALLS {
            read_frame(&mut stream).await;
            stream.write_all(&DATA_ON).await.unwrap();
        }
    });

    let con = ProjectorConnection::new(config.with_keep_alive(true));
    let started = tokio::time::Instant::now();
    for _ in 0..CALLS {
        con.get_blank_status().await.unwrap();
    }
    assert!(started.elapsed() < Duration::from_millis(400));

    device.await.unwrap();
}

#[tokio::test]
async fn late_challenge_is_a_protocol_error() {
    let (listener, config) = listener().await;
    let device = tokio::spawn(async move {
        let (mut stream, _) = listener.accept().await.unwrap();
        read_frame(&mut stream).await;
        stream
            .write_all(&[0x42, 0x9c, 0x11, 0x07, 0x5e, 0x30, 0xa1, 0x6d])
            .await
            .unwrap();
    });

    let con = ProjectorConnection::new(config);
    let err = con.get_power_status().await.unwrap_err();
    assert!(matches!(err, Error::UnknownReply(0x42)), "{:?}", err);
    assert!(err.is_protocol());

    device.await.unwrap();
}
