//! Logging initialisation: terminal output at `info`, a rotating debug
//! file under `logs/`, mirroring the teacher's `simplelog::CombinedLogger`
//! setup.
use std::time::{SystemTime, UNIX_EPOCH};

pub fn init() {
    std::fs::create_dir_all("logs").expect("create logs directory");
    let config = simplelog::ConfigBuilder::new()
        .set_location_level(log::LevelFilter::Off)
        .set_target_level(log::LevelFilter::Off)
        .set_thread_level(log::LevelFilter::Off)
        .build();
    let time = SystemTime::now().duration_since(UNIX_EPOCH).expect("time moves forward").as_secs();
    let file = simplelog::WriteLogger::new(
        log::LevelFilter::Debug,
        config.clone(),
        std::fs::File::create(format!("logs/{time}.log")).expect("create log file"),
    );
    let term =
        simplelog::TermLogger::new(log::LevelFilter::Info, config, simplelog::TerminalMode::Mixed, simplelog::ColorChoice::Auto);
    simplelog::CombinedLogger::init(vec![term, file]).expect("initialise logger");
}
