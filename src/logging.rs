//! Optional tracing-subscriber installer for consumers that just want logging
//! for free. The library itself never installs a global subscriber on its
//! own (it only emits `tracing` events, see `rtree::mod`), so this module
//! is behind the `setup_tracing` feature and only runs in binaries/tests that
//! enable it.
//!
//! Controlled by the `GEORTREE_LOG` environment variable: unset, `"0"`,
//! `"false"`, or empty disables logging; anything else enables a debug-level
//! subscriber on load.

use ctor::ctor;
use tracing::Level;

#[ctor]
fn install_subscriber() {
    if std::env::var("GEORTREE_LOG").map_or(true, |v| v == "0" || v == "false" || v.is_empty()) {
        return;
    }

    tracing_subscriber::fmt()
        .with_max_level(Level::DEBUG)
        .init();
}
