//! Fuzz target for the server list parser.
//!
//! Run with: cargo +nightly fuzz run fuzz_config_parser

#![no_main]

use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(s) = std::str::from_utf8(data) {
        if let Ok(config) = clashctl_config::CtlConfig::parse(s) {
            // Anything that parsed must survive a save/load cycle.
            let text = config.to_toml().expect("parsed config serializes");
            let again = clashctl_config::CtlConfig::parse(&text).expect("saved config parses");
            assert_eq!(config, again);
        }
    }
});
