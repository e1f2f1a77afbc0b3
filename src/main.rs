use inputshift::constants::LOG_ENV;
use log::error;

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().filter_or(LOG_ENV, "info"))
        .format_timestamp_millis()
        .init();

    if let Err(e) = inputshift::run() {
        error!("{e}");
        std::process::exit(1);
    }
}
