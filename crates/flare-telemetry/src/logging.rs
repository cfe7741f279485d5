// Copyright 2025 eraflo
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Installs the process-wide logger.

use env_logger::{Builder, Env};

/// Installs `env_logger`, honoring `RUST_LOG` and falling back to
/// `default_filter` (for example `"info"` or `"flare_data=debug,info"`).
///
/// Returns `false` if a logger was already installed, in which case nothing
/// changes.
pub fn init_logging(default_filter: &str) -> bool {
    Builder::from_env(Env::default().default_filter_or(default_filter))
        .format_timestamp_millis()
        .try_init()
        .is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn second_init_is_harmless() {
        init_logging("warn");
        assert!(!init_logging("debug"));
        log::info!("logger still usable");
    }
}
