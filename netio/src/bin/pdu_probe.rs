use clap::Parser;
use log::info;
use pdu::enums::{country, kind, platform_domain};
use pdu::{
    decode_header, decode_pdu, encode_pdu, split_pdus, EntityId, EntityStatePdu, EntityTypeCode,
    ForceId, Marking, PduType, ProtocolVersion, Timestamp, Vec3, MAX_PDU_SIZE,
};
use std::net::SocketAddr;
use tokio::net::UdpSocket;
use tokio::time::{timeout, Duration, Instant};

#[derive(Parser, Debug)]
#[command(author, version, about = "Sends one entity-state PDU and dumps what comes back")]
struct Args {
    /// Where to send the probe
    #[arg(short = 'd', long, default_value = "127.0.0.1:3000")]
    destination: SocketAddr,

    /// Local address to listen on
    #[arg(short = 'b', long, default_value = "0.0.0.0:0")]
    bind: SocketAddr,

    #[arg(long, default_value = "1")]
    exercise: u8,

    #[arg(long, default_value = "99")]
    site: u16,

    #[arg(long, default_value = "1")]
    application: u16,

    /// Seconds to keep listening after sending
    #[arg(short = 'w', long, default_value = "5")]
    wait: u64,
}

fn describe(pdu: &[u8]) -> String {
    let header = match decode_header(pdu) {
        Ok((header, _)) => header,
        Err(e) => return format!("undecodable PDU: {}", e),
    };
    if header.pdu_type == PduType::EntityState {
        if let Ok((_, state)) = decode_pdu::<EntityStatePdu>(pdu) {
            return format!(
                "entity state {:?} type {:?} at ({:.1}, {:.1}, {:.1}) marking {:?}",
                state.entity_id,
                state.entity_type,
                state.location.x,
                state.location.y,
                state.location.z,
                state.marking.text
            );
        }
    }
    format!(
        "{:?} v{} exercise {} length {}",
        header.pdu_type,
        header.version.as_u8(),
        header.exercise_id,
        header.length
    )
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    if std::env::var("RUST_LOG").is_err() {
        eprintln!("Set RUST_LOG=info for detailed logging");
    }

    let args = Args::parse();

    let socket = UdpSocket::bind(args.bind).await?;
    socket.set_broadcast(true)?;
    info!("Probe socket bound to {}", socket.local_addr()?);

    let probe = EntityStatePdu {
        entity_id: EntityId::new(args.site, args.application, 1),
        force_id: ForceId::Neutral,
        entity_type: EntityTypeCode::new(
            kind::PLATFORM,
            platform_domain::LAND,
            country::USA,
            1,
            1,
            0,
            0,
        ),
        location: Vec3::new(0.0, 0.0, 0.0),
        marking: Marking::ascii("PROBE"),
        ..Default::default()
    };
    let bytes = encode_pdu(
        ProtocolVersion::Ieee1278_1A,
        args.exercise,
        Timestamp(0),
        &probe,
    )?;
    socket.send_to(&bytes, args.destination).await?;
    println!("Sent {} byte entity state to {}", bytes.len(), args.destination);

    let deadline = Instant::now() + Duration::from_secs(args.wait);
    let mut buf = vec![0u8; MAX_PDU_SIZE];
    let mut received = 0usize;

    while let Some(remaining) = deadline.checked_duration_since(Instant::now()) {
        let (len, from) = match timeout(remaining, socket.recv_from(&mut buf)).await {
            Ok(result) => result?,
            Err(_) => break,
        };
        for pdu in split_pdus(&buf[..len]) {
            received += 1;
            match pdu {
                Ok(pdu) => println!("{} -> {}", from, describe(pdu)),
                Err(e) => println!("{} -> malformed datagram: {}", from, e),
            }
        }
    }

    println!("Probe finished, {} PDUs received", received);
    Ok(())
}
