use clap::Parser;
use log::{info, warn};
use netio::{
    EntityHandle, EntitySnapshot, IoType, Nib, NetIoConfig, Simulation, TypeDescriptor,
    UdpTransport,
};
use pdu::enums::{country, kind, platform_domain};
use pdu::{EntityStatePdu, EntityTypeCode, EulerAngles, ForceId, Vec3};
use rand::Rng;
use std::f64::consts::TAU;
use std::net::SocketAddr;
use tokio::time::{interval, Duration, Instant, MissedTickBehavior};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// TOML configuration file
    #[arg(short = 'c', long)]
    config: Option<String>,

    /// Local address to bind the DIS socket to
    #[arg(short = 'b', long, default_value = "0.0.0.0:3000")]
    bind: SocketAddr,

    /// Destination for outgoing PDUs
    #[arg(short = 'd', long, default_value = "255.255.255.255:3000")]
    destination: SocketAddr,

    /// Send to a unicast destination instead of broadcasting
    #[arg(long)]
    unicast: bool,

    /// Cycles per second
    #[arg(short = 't', long, default_value = "20")]
    tick_rate: u32,

    /// Number of demo aircraft to publish
    #[arg(short = 'n', long, default_value = "3")]
    aircraft: u16,
}

/// Aircraft flying circles around a fixed point
struct Orbit {
    player_id: u16,
    center: Vec3,
    radius: f64,
    speed: f64,
    phase: f64,
}

impl Orbit {
    fn snapshot(&self, time: f64) -> EntitySnapshot {
        let rate = self.speed / self.radius;
        let angle = self.phase + rate * time;
        let mut snapshot = EntitySnapshot::new(self.player_id, "F-16");
        snapshot.force_id = ForceId::Friendly;
        snapshot.marking = format!("VIPER{}", self.player_id);
        snapshot.position = self.center.add(&Vec3::new(
            self.radius * angle.cos(),
            self.radius * angle.sin(),
            0.0,
        ));
        snapshot.velocity = Vec3::new(
            -self.speed * angle.sin(),
            self.speed * angle.cos(),
            0.0,
        );
        snapshot.acceleration = Vec3::new(
            -self.speed * rate * angle.cos(),
            -self.speed * rate * angle.sin(),
            0.0,
        );
        snapshot.orientation = EulerAngles::new(angle + TAU / 4.0, 0.0, 0.0);
        snapshot
    }
}

struct DemoScenario {
    orbits: Vec<Orbit>,
    time: f64,
    next_handle: u64,
}

impl DemoScenario {
    fn new(aircraft: u16) -> Self {
        let mut rng = rand::thread_rng();
        let orbits = (1..=aircraft)
            .map(|player_id| Orbit {
                player_id,
                center: Vec3::new(
                    rng.gen_range(-5000.0..5000.0),
                    rng.gen_range(-5000.0..5000.0),
                    -rng.gen_range(1000.0..8000.0),
                ),
                radius: rng.gen_range(2000.0..6000.0),
                speed: rng.gen_range(150.0..250.0),
                phase: rng.gen_range(0.0..TAU),
            })
            .collect();
        Self {
            orbits,
            time: 0.0,
            next_handle: 1,
        }
    }
}

impl Simulation for DemoScenario {
    fn publishable_entities(&self) -> Vec<EntitySnapshot> {
        self.orbits.iter().map(|o| o.snapshot(self.time)).collect()
    }

    fn ownship_position(&self) -> Option<Vec3> {
        self.orbits.first().map(|o| o.snapshot(self.time).position)
    }

    fn on_entity_state_update(&mut self, nib: &Nib, state: &EntityStatePdu) -> Option<EntityHandle> {
        if nib.handle.is_some() {
            return nib.handle;
        }
        let handle = EntityHandle(self.next_handle);
        self.next_handle += 1;
        info!(
            "New remote entity {:?} ({}) marked {:?}",
            nib.key,
            nib.descriptor
                .as_ref()
                .map_or("unmapped type", |d| d.name.as_str()),
            state.marking.text
        );
        Some(handle)
    }

    fn on_entity_removed(&mut self, nib: &Nib) {
        info!("Remote entity {:?} removed", nib.key);
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    if std::env::var("RUST_LOG").is_err() {
        eprintln!("Set RUST_LOG=info for detailed logging");
    }

    let args = Args::parse();
    let config = match &args.config {
        Some(path) => NetIoConfig::load(path)?,
        None => NetIoConfig::default(),
    };

    let transport = UdpTransport::new(args.bind, args.destination, !args.unicast);
    let mut engine = config.build_engine(transport, DemoScenario::new(args.aircraft))?;
    if engine.ntms().lookup_by_descriptor("F-16").is_none() {
        let f16 = EntityTypeCode::new(
            kind::PLATFORM,
            platform_domain::AIR,
            country::USA,
            1,
            3,
            0,
            0,
        );
        engine.register_ntm(f16, TypeDescriptor::new("F-16"))?;
    }
    engine.start()?;

    info!(
        "Publishing {} aircraft at {} Hz",
        args.aircraft, args.tick_rate
    );

    let mut ticker = interval(Duration::from_secs_f64(1.0 / args.tick_rate.max(1) as f64));
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    let started = Instant::now();
    let mut last_report = 0.0;

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                let now = started.elapsed().as_secs_f64();
                engine.simulation_mut().time = now;
                if let Err(e) = engine.run_cycle(now) {
                    warn!("Cycle failed: {}", e);
                }
                if now - last_report >= 10.0 {
                    last_report = now;
                    info!(
                        "{} remote entities, {} local; {:?}",
                        engine.nibs().len(IoType::Input),
                        engine.nibs().len(IoType::Output),
                        engine.stats()
                    );
                }
            }
            _ = tokio::signal::ctrl_c() => {
                info!("Received Ctrl+C, shutting down");
                break;
            }
        }
    }

    engine.stop();
    Ok(())
}
