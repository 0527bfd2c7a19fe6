//! Command-line flags and their overlay onto the loaded configuration.
//!
//! A setting comes from the first source that has it: flag, `GEOSCOPE_*`
//! variable, config file, built-in default.

use std::path::PathBuf;

use clap::Parser;

use geoscope_core::config::GeoscopeConfig;

pub const CONFIG_ENV: &str = "GEOSCOPE_CONFIG";
pub const PORT_ENV: &str = "GEOSCOPE_PORT";
pub const HOST_ENV: &str = "GEOSCOPE_HOST";

/// Geoscope - map search, routing, and narrative analysis over HTTP.
#[derive(Parser, Debug)]
#[command(name = "geoscope", version, about)]
pub struct CliArgs {
    /// Configuration file (TOML).
    #[arg(short = 'c', long = "config")]
    pub config: Option<PathBuf>,

    #[arg(short = 'p', long = "port")]
    pub port: Option<u16>,

    /// Address the HTTP server binds to.
    #[arg(long = "host")]
    pub host: Option<String>,

    /// tracing filter directive, e.g. "info" or "geoscope_maps=debug".
    #[arg(short = 'l', long = "log-level")]
    pub log_level: Option<String>,
}

impl CliArgs {
    pub fn config_path(&self) -> PathBuf {
        self.config_path_with(process_env)
    }

    /// Falls back to `~/.geoscope/config.toml`, then `./config.toml` when no
    /// home directory is known.
    pub fn config_path_with<F>(&self, lookup: F) -> PathBuf
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(path) = &self.config {
            return path.clone();
        }
        if let Some(path) = non_blank(lookup(CONFIG_ENV)) {
            return PathBuf::from(path);
        }
        non_blank(lookup("HOME"))
            .or_else(|| non_blank(lookup("USERPROFILE")))
            .map(|home| PathBuf::from(home).join(".geoscope").join("config.toml"))
            .unwrap_or_else(|| PathBuf::from("config.toml"))
    }

    pub fn apply(&self, config: &mut GeoscopeConfig) {
        self.apply_with(config, process_env)
    }

    /// Overlay flags and `GEOSCOPE_PORT` / `GEOSCOPE_HOST` onto `config`.
    ///
    /// Blank variables and an unparsable port are ignored. The log level has
    /// no variable of its own; `RUST_LOG` is read when tracing starts.
    pub fn apply_with<F>(&self, config: &mut GeoscopeConfig, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let env_port = lookup(PORT_ENV).and_then(|raw| raw.trim().parse::<u16>().ok());
        if let Some(port) = self.port.or(env_port) {
            config.server.port = port;
        }

        if let Some(host) = self.host.clone().or_else(|| non_blank(lookup(HOST_ENV))) {
            config.server.host = host;
        }

        if let Some(level) = &self.log_level {
            config.general.log_level = level.clone();
        }
    }
}

fn process_env(name: &str) -> Option<String> {
    std::env::var(name).ok()
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn env(pairs: &'static [(&'static str, &'static str)]) -> impl Fn(&str) -> Option<String> {
        move |name| {
            pairs
                .iter()
                .find(|(k, _)| *k == name)
                .map(|(_, v)| v.to_string())
        }
    }

    #[test]
    fn test_flags_beat_environment() {
        let args = CliArgs::parse_from([
            "geoscope",
            "--config",
            "/tmp/geo.toml",
            "--port",
            "8080",
            "--host",
            "0.0.0.0",
            "-l",
            "debug",
        ]);
        let lookup = env(&[
            (CONFIG_ENV, "/etc/geoscope.toml"),
            (PORT_ENV, "9000"),
            (HOST_ENV, "10.0.0.1"),
        ]);
        assert_eq!(args.config_path_with(&lookup), PathBuf::from("/tmp/geo.toml"));

        let mut config = GeoscopeConfig::default();
        args.apply_with(&mut config, &lookup);
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.general.log_level, "debug");
    }

    #[test]
    fn test_environment_beats_config_file() {
        let args = CliArgs::parse_from(["geoscope"]);
        let mut config = GeoscopeConfig::default();
        config.server.port = 4000;
        config.server.host = "127.0.0.1".to_string();

        args.apply_with(
            &mut config,
            env(&[(PORT_ENV, " 9000 "), (HOST_ENV, "192.168.1.20")]),
        );
        assert_eq!(config.server.port, 9000);
        assert_eq!(config.server.host, "192.168.1.20");
        assert_eq!(config.general.log_level, "info");
    }

    #[test]
    fn test_bad_or_blank_environment_keeps_config() {
        let args = CliArgs::parse_from(["geoscope"]);
        let mut config = GeoscopeConfig::default();
        config.server.port = 4000;

        args.apply_with(&mut config, env(&[(PORT_ENV, "http"), (HOST_ENV, "  ")]));
        assert_eq!(config.server.port, 4000);
        assert_eq!(config.server.host, "127.0.0.1");
    }

    #[test]
    fn test_config_path_fallbacks() {
        let args = CliArgs::parse_from(["geoscope"]);
        assert_eq!(
            args.config_path_with(env(&[(CONFIG_ENV, "/srv/geo.toml"), ("HOME", "/home/ana")])),
            PathBuf::from("/srv/geo.toml")
        );
        assert_eq!(
            args.config_path_with(env(&[("HOME", "/home/ana")])),
            PathBuf::from("/home/ana/.geoscope/config.toml")
        );
        assert_eq!(
            args.config_path_with(env(&[("USERPROFILE", "C:\\Users\\ana")])),
            PathBuf::from("C:\\Users\\ana").join(".geoscope").join("config.toml")
        );
        assert_eq!(args.config_path_with(env(&[])), PathBuf::from("config.toml"));
    }
}
