use std::path::PathBuf;

use clap::Parser;
use futures::{SinkExt, TryStreamExt};
use projectord::*;
use tokio_util::codec::{Framed, LengthDelimitedCodec};

#[derive(Debug, Parser)]
#[command(name = "projector-client", about = "Send a request to projectord")]
struct Args {
    #[arg(long, default_value = DEFAULT_SOCKET)]
    socket: PathBuf,
    #[command(flatten)]
    payload: SocketPayload,
}

fn print_optional<T: std::fmt::Display>(name: &str, value: &Option<T>) {
    match value {
        Some(value) => println!("{}: {}", name, value),
        None => println!("{}: unknown", name),
    }
}

fn print_state(state: &ProjectorState) {
    if !state.available {
        println!("unavailable");
        return;
    }
    print_optional("state", &state.state);
    print_optional("source", &state.source);
    print_optional("blank", &state.blank);
    print_optional("eco mode", &state.eco_mode);
    print_optional("auto eco mode", &state.auto_eco_mode);
    print_optional("lamp hours", &state.lamp_hours);
    print_optional("filter hours", &state.filter_hours);
    print_optional("error", &state.error);
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Error> {
    let args = Args::parse();

    let stream = tokio::net::UnixStream::connect(&args.socket).await?;
    let frames = Framed::new(stream, LengthDelimitedCodec::new());
    let mut payloads: tokio_serde::Framed<_, Response, SocketPayload, _> =
        tokio_serde::Framed::new(frames, tokio_serde::formats::Bincode::default());

    payloads.send(args.payload).await?;
    match payloads.try_next().await? {
        Some(Response::Done) => println!("ok"),
        Some(Response::State(state)) => print_state(&state),
        Some(Response::Info(info)) => {
            println!("name: {}", info.name);
            println!("manufacturer: {}", info.manufacturer);
            println!("model: {}", info.model);
        }
        Some(Response::Error(e)) => {
            eprintln!("error: {}", e);
            std::process::exit(1);
        }
        None => {
            return Err(std::io::Error::new(
                std::io::ErrorKind::UnexpectedEof,
                "projectord closed the connection",
            )
            .into())
        }
    }

    Ok(())
}
