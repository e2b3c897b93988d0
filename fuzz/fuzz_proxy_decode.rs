//! Fuzz target for daemon proxy-map decoding and table building.
//!
//! Run with: cargo +nightly fuzz run fuzz_proxy_decode

#![no_main]

use clashctl_core::selection::SelectionTable;
use clashctl_core::types::ProxiesResponse;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(resp) = serde_json::from_slice::<ProxiesResponse>(data) {
        if let Ok(table) = SelectionTable::from_catalog(&resp.proxies) {
            let rows = table.rows();
            assert!(rows.len() <= clashctl_core::selection::MAX_RENDERED);
            let _ = table.to_text_table().render_plain();
        }
    }
});
