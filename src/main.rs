use std::error::Error;
use std::io::ErrorKind;
use std::net::UdpSocket;
use std::path::Path;
use std::time::{Duration, Instant, SystemTime};

use tracing::{debug, info, warn};

use nav_fusion::app_metrics::MetricsLogger;
use nav_fusion::config::{Config, LogConfig};
use nav_fusion::frame_filter::should_process_frame_by_id;
use nav_fusion::udp_broadcaster::UdpBroadcaster;
use nav_fusion::{LogListener, NavigationEngine};

// Import from nmea2k crate
use nmea2k::{CanBus, Identifier, MessageHandler, N2kStreamReader};
use socketcan::CanSocket;

const CONFIG_FILE: &str = "config.json";
const TICK_INTERVAL: Duration = Duration::from_secs(1);
const CAN_READ_TIMEOUT: Duration = Duration::from_millis(50);
const IDLE_SLEEP: Duration = Duration::from_millis(20);

// ========== Logging Setup ==========

fn init_logging(log_config: &LogConfig) -> Result<(), Box<dyn Error>> {
    use tracing_appender::rolling;
    use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

    // Create log directory if it doesn't exist
    std::fs::create_dir_all(&log_config.directory)?;

    // Create daily rolling file appender
    let file_appender = rolling::daily(&log_config.directory, &log_config.file_prefix);

    let timer = || {
        fmt::time::OffsetTime::local_rfc_3339().unwrap_or_else(|_| {
            fmt::time::OffsetTime::new(time::UtcOffset::UTC, time::format_description::well_known::Rfc3339)
        })
    };

    // Build subscriber with both console and file output
    let file_layer = fmt::layer().with_writer(file_appender).with_ansi(false).with_timer(timer());
    let console_layer = fmt::layer().with_writer(std::io::stdout).with_timer(timer());

    // RUST_LOG wins over the configured level
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&log_config.level));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(console_layer)
        .with(file_layer)
        .init();

    Ok(())
}

// ========== Inputs ==========

fn bind_input(name: &str, address: Option<&str>) -> Option<UdpSocket> {
    let address = address?;
    match UdpSocket::bind(address).and_then(|socket| socket.set_nonblocking(true).map(|_| socket)) {
        Ok(socket) => {
            info!("Listening for {} on udp://{}", name, address);
            Some(socket)
        }
        Err(e) => {
            warn!("Cannot listen for {} on {}: {}", name, address, e);
            None
        }
    }
}

/// Hands every pending datagram to `handle`; returns whether anything arrived.
fn drain_datagrams(socket: &UdpSocket, buf: &mut [u8], mut handle: impl FnMut(&str)) -> bool {
    let mut received = false;
    loop {
        match socket.recv_from(buf) {
            Ok((len, _)) => {
                received = true;
                handle(&String::from_utf8_lossy(&buf[..len]));
            }
            Err(e) if e.kind() == ErrorKind::WouldBlock => return received,
            Err(e) => {
                warn!("Error reading UDP input: {}", e);
                return received;
            }
        }
    }
}

fn open_can(interface: &str) -> Result<CanSocket, Box<dyn Error>> {
    info!("Opening CAN interface: {}", interface);
    let mut socket = CanBus::open_can_socket_with_retry(interface);
    CanBus::configure_nmea2k_socket(&mut socket, CAN_READ_TIMEOUT)?;
    Ok(socket)
}

fn modified_at(path: &Path) -> Option<SystemTime> {
    std::fs::metadata(path).and_then(|meta| meta.modified()).ok()
}

fn print_help() {
    println!("Navigation data fusion");
    println!();
    println!("USAGE:");
    println!("    nav_fusion [OPTIONS]");
    println!();
    println!("OPTIONS:");
    println!("    --validate-config, --validate, -v    Validate configuration and exit");
    println!("    --help, -h                           Show this help message");
    println!();
    println!("Configuration file: {} (in current directory)", CONFIG_FILE);
}

fn print_summary(cfg: &Config) {
    println!("✓ Configuration validation successful");
    println!("  CAN interface: {}", cfg.can_interface.as_deref().unwrap_or("none"));
    println!("  NMEA0183 input: {}", cfg.inputs.nmea0183_udp.as_deref().unwrap_or("none"));
    println!("  SignalK input: {}", cfg.inputs.signalk_udp.as_deref().unwrap_or("none"));
    println!(
        "  Dual engine: {}, true wind over ground: {}, depth offset: {} m",
        cfg.fusion.dual_engine, cfg.fusion.true_wind_over_ground, cfg.fusion.depth_offset
    );
    println!(
        "  Watchdogs: navigation {} ticks, ambient {} ticks",
        cfg.fusion.navigation_timeout_ticks, cfg.fusion.ambient_timeout_ticks
    );
    println!("  PGN source filters: {} entries", cfg.source_filter.pgn_source_map.len());
    if cfg.broadcast.enabled {
        println!("  Broadcasting to: {}", cfg.broadcast.destination);
    }
}

// ========== Main Application ==========

fn main() -> Result<(), Box<dyn Error>> {
    let args: Vec<String> = std::env::args().collect();
    let has = |flag: &str| args.iter().any(|arg| arg == flag);

    if has("--help") || has("-h") {
        print_help();
        std::process::exit(0);
    }

    let validate_only = has("--validate-config") || has("--validate") || has("-v");

    let config_path = Path::new(CONFIG_FILE);
    let mut config = match Config::from_file(config_path) {
        Ok(cfg) => {
            if validate_only {
                print_summary(&cfg);
                std::process::exit(0);
            }
            cfg
        }
        Err(e) => {
            if validate_only {
                eprintln!("✗ Configuration validation failed: {}", e);
                std::process::exit(1);
            }
            eprintln!("Warning: Could not load {}: {}", CONFIG_FILE, e);
            eprintln!("Using default configuration");
            Config::default()
        }
    };
    let mut config_mtime = modified_at(config_path);

    init_logging(&config.logging)?;
    info!("Navigation fusion starting...");

    let mut engine = NavigationEngine::new(config.fusion.clone());
    engine.add_listener(Box::new(LogListener));
    if config.broadcast.enabled {
        engine.add_listener(Box::new(UdpBroadcaster::new(config.broadcast.destination.clone(), true)));
    }

    let nmea0183 = bind_input("NMEA0183", config.inputs.nmea0183_udp.as_deref());
    let signalk = bind_input("SignalK", config.inputs.signalk_udp.as_deref());

    let mut can = match &config.can_interface {
        Some(interface) => Some(open_can(interface)?),
        None => {
            info!("No CAN interface configured, NMEA2000 input disabled");
            None
        }
    };
    let mut reader = N2kStreamReader::new();

    let mut metrics_logger = MetricsLogger::new(Duration::from_secs(60));
    let mut last_tick = Instant::now();
    let mut buf = vec![0u8; 65536];

    loop {
        let mut busy = false;

        if let Some(read) = can.as_ref().map(CanBus::read_nmea2k_frame) {
            match read {
                Ok((extended_id, data)) => {
                    busy = true;
                    engine.metrics_mut().can_frames += 1;
                    if should_process_frame_by_id(&config, Identifier::from_can_id(extended_id))
                        && let Some(n2k_frame) = reader.process_frame(extended_id, &data)
                    {
                        engine.handle_message(&n2k_frame, Instant::now());
                    }
                }
                Err(e) if CanBus::is_timeout(&e) => {}
                Err(e) => {
                    engine.metrics_mut().can_errors += 1;
                    warn!("Error reading CAN frame: {}", e);
                    warn!("CAN bus connection lost. Attempting to reconnect...");
                    can = match &config.can_interface {
                        Some(interface) => Some(open_can(interface)?),
                        None => None,
                    };
                    info!("Reconnected to CAN bus. Resuming operation");
                    // Wait before resuming to allow bus to stabilize
                    std::thread::sleep(Duration::from_millis(500));
                }
            }
        }

        if let Some(socket) = &nmea0183 {
            busy |= drain_datagrams(socket, &mut buf, |text| engine.push_nmea0183(text));
        }
        if let Some(socket) = &signalk {
            busy |= drain_datagrams(socket, &mut buf, |text| {
                for line in text.lines().filter(|line| !line.trim().is_empty()) {
                    engine.handle_signalk(line);
                }
            });
        }

        if last_tick.elapsed() >= TICK_INTERVAL {
            last_tick += TICK_INTERVAL;
            engine.tick();

            let mtime = modified_at(config_path);
            if mtime.is_some() && mtime != config_mtime {
                config_mtime = mtime;
                match Config::from_file(config_path) {
                    Ok(reloaded) => {
                        info!("{} changed, reloading", CONFIG_FILE);
                        engine.apply_config(reloaded.fusion.clone());
                        config = reloaded;
                    }
                    Err(e) => warn!("Ignoring changed {}: {}", CONFIG_FILE, e),
                }
            }

            metrics_logger.check_and_log(engine.metrics_mut());
        }

        // the CAN read timeout already paces the loop
        if !busy && can.is_none() {
            std::thread::sleep(IDLE_SLEEP);
        }
        if last_tick.elapsed() > TICK_INTERVAL * 5 {
            debug!("Main loop fell behind, resynchronising the tick clock");
            last_tick = Instant::now();
        }
    }
}
