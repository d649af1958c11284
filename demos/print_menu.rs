use log::kv::Key;
use log::{Level, LevelFilter, Log, Metadata, Record};
use server_features::*;
use std::collections::HashSet;

fn main() {
    // Debug level logging shows every override change and write.
    log::set_max_level(LevelFilter::Debug);
    log::set_logger(&PrintLog {}).unwrap();

    let settings_dir = std::env::temp_dir().join("server-features-demo");
    let plugin = ServerFeatures::builder()
        .settings(Box::new(FileSettings::new(&settings_dir).unwrap()))
        .known_features(KnownFeatures::from([
            "ANIMATED_ICON",
            "BANNER",
            "COMMUNITY",
            "DISCOVERABLE",
            "HUB",
            "NEWS",
            "VANITY_URL",
        ]))
        .menu_host(Box::new(PrintHost {}))
        .build()
        .unwrap();

    let guild_id = "81384788765712384";
    let reported = HashSet::from(["COMMUNITY".to_owned(), "NEWS".to_owned()]);

    plugin.toggle_feature(guild_id, "HUB").unwrap();
    plugin.toggle_feature(guild_id, "NEWS").unwrap();
    print_menu(&plugin, guild_id, &reported);

    plugin.reset(guild_id).unwrap();
    print_menu(&plugin, guild_id, &reported);

    plugin.stop().unwrap();
}

fn print_menu(plugin: &ServerFeatures, guild_id: &str, reported: &HashSet<String>) {
    println!("Server Features of {guild_id}:");
    for entry in plugin.menu(guild_id, reported) {
        let mark = if entry.checked { "x" } else { " " };
        println!("  [{mark}] {} ({})", entry.feature, entry.highlight());
    }
}

struct PrintHost {}

impl MenuHost for PrintHost {
    fn refresh(&self) {
        println!("-- menu refresh requested");
    }
}

// Example log implementation.
pub struct PrintLog {}

impl Log for PrintLog {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= log::max_level() && metadata.target().contains("server_features")
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        let level = match record.level() {
            Level::Error => "ERROR",
            Level::Warn => "WARN",
            Level::Info => "INFO",
            Level::Debug => "DEBUG",
            Level::Trace => "TRACE",
        };
        match record.key_values().get(Key::from("event_id")) {
            Some(event_id) => println!("{level} [{event_id}] {}", record.args()),
            None => println!("{level} {}", record.args()),
        }
    }

    fn flush(&self) {}
}
