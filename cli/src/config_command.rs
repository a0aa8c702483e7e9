use crate::config::Config;
use crate::config::ConfigOverrides;

pub(crate) const EXIT_CODE_INVALID_CONFIG: i32 = 3;

/// Load the configuration or exit with [`EXIT_CODE_INVALID_CONFIG`].
pub(crate) fn load_or_exit(overrides: ConfigOverrides) -> Config {
    match Config::load(overrides) {
        Ok(config) => config,
        Err(err) => {
            eprintln!("Config validation error: {err}");
            std::process::exit(EXIT_CODE_INVALID_CONFIG);
        }
    }
}

pub(crate) fn print_config(config: &Config) {
    println!("Current taskboard settings:");
    println!("---------------------------");
    for (key, value) in config.summary_entries() {
        println!("{key}: {value}");
    }
    println!("---------------------------");
}
